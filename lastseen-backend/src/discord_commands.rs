use crate::Context;
use lastseen_backend::helpers::{format_instant, format_time_ago, now};
use lastseen_backend::lookup::LoginLookup;
use lastseen_backend::queries;
use lastseen_backend::validation::validate_player_name;
use lastseen_store::StoreError;
use poise::CreateReply;
use poise::command;
use poise::serenity_prelude::{CreateEmbed, CreateEmbedFooter};

pub(crate) type Error = Box<dyn std::error::Error + Send + Sync>;

/// Embed descriptions are capped at 4096 characters by Discord
const DESCRIPTION_LIMIT: usize = 4000;

/// Add a Minecraft player to your monitored list
#[command(slash_command, prefix_command)]
pub async fn adduser(
    ctx: Context<'_>,
    #[description = "Minecraft username"] player: String,
) -> Result<(), Error> {
    if let Err(e) = validate_player_name(&player) {
        ctx.say(format!("⚠️ {}", e)).await?;
        return Ok(());
    }

    let subscriber = ctx.author().id.to_string();
    match ctx.data().state.subscriptions.add(&subscriber, &player).await {
        Ok(()) => ctx.say(format!("✅ Added **{}** to your monitored list!", player)).await?,
        Err(StoreError::AlreadyExists) => {
            ctx.say(format!("⚠️ **{}** is already in your monitored list.", player))
                .await?
        }
        Err(e) => return Err(e.into()),
    };
    Ok(())
}

/// Remove a Minecraft player from your monitored list
#[command(slash_command, prefix_command)]
pub async fn removeuser(
    ctx: Context<'_>,
    #[description = "Minecraft username"] player: String,
) -> Result<(), Error> {
    let subscriber = ctx.author().id.to_string();
    match ctx.data().state.subscriptions.remove(&subscriber, &player).await {
        Ok(()) => ctx.say(format!("🗑️ Removed **{}** from your monitored list.", player)).await?,
        Err(StoreError::NotFound) => {
            ctx.say(format!("⚠️ **{}** is not in your monitored list.", player))
                .await?
        }
        Err(e) => return Err(e.into()),
    };
    Ok(())
}

/// Look up a player's last Hypixel login right now
#[command(slash_command, prefix_command)]
pub async fn getlogin(
    ctx: Context<'_>,
    #[description = "Minecraft username"] player: String,
) -> Result<(), Error> {
    if let Err(e) = validate_player_name(&player) {
        ctx.say(format!("⚠️ {}", e)).await?;
        return Ok(());
    }

    ctx.defer().await?;
    let reply = match ctx.data().lookup.last_login(&player).await {
        Some(at) => format!(
            "**{}** last logged in at **{}** ({} ago)",
            player,
            format_instant(at),
            format_time_ago(now() - at)
        ),
        None => format!("Could not find last login info for **{}**.", player),
    };
    ctx.say(reply).await?;
    Ok(())
}

/// List cached players who logged in recently
#[command(slash_command, prefix_command)]
pub async fn recentonline(ctx: Context<'_>) -> Result<(), Error> {
    let data = ctx.data();
    let logins = data.state.cache.snapshot().await;
    let recent = queries::recently_online(&logins, now(), data.recent_online_window);

    let embed = CreateEmbed::default()
        .title(format!(
            "Players online in the last {} hours",
            data.recent_online_window.num_hours()
        ))
        .color(0x5865F2);
    let embed = if recent.is_empty() {
        embed.description("No recent logins.")
    } else {
        let current_time = now();
        let lines = recent.iter().map(|(player, at)| {
            format!("- {} ({} ago)", player, format_time_ago(current_time - *at))
        });
        embed.description(join_capped(lines))
    };
    ctx.send(CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Show the last known login of every cached player
#[command(slash_command, prefix_command)]
pub async fn lastlogin(ctx: Context<'_>) -> Result<(), Error> {
    let logins = ctx.data().state.cache.snapshot().await;
    let all = queries::all_last_logins(&logins);

    let embed = CreateEmbed::default()
        .title("Last login times")
        .color(0x5865F2);
    let embed = if all.is_empty() {
        embed.description("No login data available.")
    } else {
        let lines = all
            .iter()
            .map(|(player, at)| format!("- {}: {}", player, format_instant(*at)));
        embed.description(join_capped(lines))
    };
    ctx.send(CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Show the player who logged in most recently
#[command(slash_command, prefix_command)]
pub async fn lastonline(ctx: Context<'_>) -> Result<(), Error> {
    let logins = ctx.data().state.cache.snapshot().await;
    let reply = match queries::most_recently_online(&logins) {
        Some((player, at)) => format!(
            "Most recently online: **{}** at {}",
            player,
            format_instant(at)
        ),
        None => "No login information available.".to_string(),
    };
    ctx.say(reply).await?;
    Ok(())
}

/// List the players you are monitoring
#[command(slash_command, prefix_command)]
pub async fn monitored(ctx: Context<'_>) -> Result<(), Error> {
    let data = ctx.data();
    let subscriber = ctx.author().id.to_string();
    let players = data.state.subscriptions.handles_for(&subscriber).await;
    let logins = data.state.cache.snapshot().await;

    let embed = CreateEmbed::default()
        .title("Your monitored players")
        .color(0x5865F2)
        .footer(CreateEmbedFooter::new(
            "You get a DM when one of them logs into Hypixel",
        ));
    let embed = if players.is_empty() {
        embed.description("You are not monitoring anyone yet. Use `adduser <player>`.")
    } else {
        let lines = players.iter().map(|player| match logins.get(player) {
            Some(at) => format!("- {} (last login {})", player, format_instant(*at)),
            None => format!("- {} (no login data yet)", player),
        });
        embed.description(join_capped(lines))
    };
    ctx.send(CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Join lines until the embed limit, then summarize the rest.
fn join_capped(lines: impl ExactSizeIterator<Item = String>) -> String {
    let total = lines.len();
    let mut out = String::new();
    for (shown, line) in lines.enumerate() {
        if out.len() + line.len() + 1 > DESCRIPTION_LIMIT {
            out.push_str(&format!("…and {} more", total - shown));
            break;
        }
        out.push_str(&line);
        out.push('\n');
    }
    out
}
