mod discord_commands;
use anyhow::Context as _;
use chrono::TimeDelta;
use lastseen_backend::config::Config;
use lastseen_backend::lookup::{HypixelClient, LoginLookup};
use lastseen_backend::notifier::DiscordNotifier;
use lastseen_backend::scheduler::Scheduler;
use lastseen_backend::{AppState, create_app, helpers, start_watching};
use lastseen_store::{LoginCache, SubscriptionStore};
use poise::{Framework, FrameworkOptions, PrefixFrameworkOptions, serenity_prelude as serenity};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

type Context<'a> = poise::Context<'a, crate::Data, crate::discord_commands::Error>;

pub(crate) struct Data {
    pub(crate) state: Arc<AppState>,
    pub(crate) lookup: Arc<dyn LoginLookup>,
    pub(crate) recent_online_window: TimeDelta,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing for structured logging
    #[cfg(debug_assertions)]
    let log_level = tracing::Level::DEBUG;
    #[cfg(not(debug_assertions))]
    let log_level = tracing::Level::INFO;

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();
    tracing::info!("Starting lastseen...");

    let config = Config::from_env()?;
    tracing::info!(
        "Configuration: port={}, subscriptions={}, prefix={}, refresh={}s, sweep={}s, notify_window={}s",
        config.port,
        config.subscriptions_path,
        config.discord_command_prefix,
        config.refresh_interval.as_secs(),
        config.sweep_interval.as_secs(),
        config.notify_window.as_secs()
    );

    let subscriptions = SubscriptionStore::open(&config.subscriptions_path)
        .await
        .with_context(|| format!("cannot use subscription file {}", config.subscriptions_path))?;
    let state = Arc::new(AppState {
        subscriptions: Arc::new(subscriptions),
        cache: Arc::new(LoginCache::new()),
    });
    let lookup: Arc<dyn LoginLookup> =
        Arc::new(HypixelClient::new(&config).context("failed to build HTTP client")?);

    let app = create_app(Arc::clone(&state), config.request_timeout);
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("Keep-alive server listening on {}", addr);

    // DMs, guild messages, and message content for prefix commands
    let intents = serenity::GatewayIntents::non_privileged() | serenity::GatewayIntents::MESSAGE_CONTENT;

    let scheduler = Arc::new(Mutex::new(Scheduler::new()));
    let setup_scheduler = Arc::clone(&scheduler);
    let setup_state = Arc::clone(&state);
    let setup_config = config.clone();

    let framework = Framework::builder()
        .options(FrameworkOptions {
            commands: vec![
                discord_commands::adduser(),
                discord_commands::removeuser(),
                discord_commands::getlogin(),
                discord_commands::recentonline(),
                discord_commands::lastlogin(),
                discord_commands::lastonline(),
                discord_commands::monitored(),
            ],
            prefix_options: PrefixFrameworkOptions {
                prefix: Some(config.discord_command_prefix.clone()),
                ..Default::default()
            },
            pre_command: |ctx| {
                Box::pin(async move {
                    tracing::info!(
                        "Executing command '{}' by user '{}'",
                        ctx.command().name,
                        ctx.author().name
                    );
                })
            },
            post_command: |ctx| {
                Box::pin(async move {
                    tracing::info!(
                        "Finished command '{}' by user '{}'",
                        ctx.command().name,
                        ctx.author().name
                    );
                })
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            let http = Arc::clone(&ctx.http);
            tracing::info!("Bot {} connected", ready.user.name);
            Box::pin(async move {
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;

                // The sweep needs a Discord HTTP handle, so watching starts once connected
                let notifier = Arc::new(DiscordNotifier::new(http));
                start_watching(
                    &mut *setup_scheduler.lock().await,
                    &setup_state,
                    Arc::clone(&lookup),
                    notifier,
                    &setup_config,
                );

                Ok(Data {
                    state: setup_state,
                    lookup,
                    recent_online_window: helpers::window(setup_config.recent_online_window),
                })
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(&config.discord_token, intents)
        .framework(framework)
        .await
        .context("Error creating Discord client")?;
    let shard_manager = Arc::clone(&client.shard_manager);

    tokio::select! {
        result = axum::serve(listener, app) => {
            if let Err(e) = result {
                tracing::error!("Axum server error: {}", e);
            }
        }
        result = client.start() => {
            if let Err(e) = result {
                tracing::error!("Discord client error: {:?}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown requested");
        }
    }

    // Let an in-flight refresh or sweep finish before exiting
    let scheduler = std::mem::take(&mut *scheduler.lock().await);
    scheduler.shutdown().await;
    shard_manager.shutdown_all().await;
    tracing::info!("lastseen stopped");
    Ok(())
}
