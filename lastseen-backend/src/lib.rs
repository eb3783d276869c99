pub mod config;
pub mod dispatcher;
mod error;
pub mod helpers;
pub mod lookup;
pub mod notifier;
pub mod queries;
pub mod refresh;
mod routes;
pub mod scheduler;
pub mod validation;

pub use error::{ConfigError, LookupError, NotifyError};

use axum::{Router, http::StatusCode, routing::get};
use lastseen_store::{LoginCache, SubscriptionStore};
use std::sync::Arc;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::dispatcher::{NotificationDispatcher, Notifier};
use crate::lookup::LoginLookup;
use crate::scheduler::Scheduler;

pub const REFRESH_TASK: &str = "login-refresh";
pub const SWEEP_TASK: &str = "notification-sweep";

/// State shared by the background tasks, the Discord commands and the HTTP server
pub struct AppState {
    pub subscriptions: Arc<SubscriptionStore>,
    pub cache: Arc<LoginCache>,
}

/// Create the keep-alive router
pub fn create_app(state: Arc<AppState>, request_timeout: Duration) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/status", get(routes::status))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .with_state(state)
}

/// Register the cache refresh and the notification sweep on `scheduler`.
pub fn start_watching(
    scheduler: &mut Scheduler,
    state: &AppState,
    lookup: Arc<dyn LoginLookup>,
    notifier: Arc<dyn Notifier>,
    config: &Config,
) {
    let subscriptions = Arc::clone(&state.subscriptions);
    let cache = Arc::clone(&state.cache);
    let concurrency = config.lookup_concurrency;
    scheduler.spawn_recurring(REFRESH_TASK, config.refresh_interval, move || {
        let subscriptions = Arc::clone(&subscriptions);
        let cache = Arc::clone(&cache);
        let lookup = Arc::clone(&lookup);
        async move {
            refresh::refresh_cache(&subscriptions, &cache, lookup.as_ref(), concurrency).await;
        }
    });

    let dispatcher = Arc::new(NotificationDispatcher::new(
        Arc::clone(&state.subscriptions),
        Arc::clone(&state.cache),
        notifier,
        helpers::window(config.notify_window),
    ));
    scheduler.spawn_recurring(SWEEP_TASK, config.sweep_interval, move || {
        let dispatcher = Arc::clone(&dispatcher);
        async move {
            dispatcher.sweep(helpers::now()).await;
        }
    });
}
