//! Telegram front end
//!
//! Anyone who writes to the bot is registered as a notification target on
//! first contact. Besides that the bot only answers a handful of static
//! commands. Change broadcasts go out through [`TelegramBroadcaster`].

use crate::game::{self, Hand};
use crate::gif::GifSource;
use pagewatch::{Broadcaster, LogBroadcaster, ResourceSpec, TargetId, TargetRegistry};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

#[cfg(feature = "telegram")]
use pagewatch::DeliveryError;
#[cfg(feature = "telegram")]
use teloxide::{prelude::*, types::InputFile, utils::command::BotCommands};

pub const TOKEN_ENV: &str = "TELOXIDE_TOKEN";

const WELCOME: &str = "🦢 Hi! You are now subscribed. I'll honk here whenever a watched page changes.\n\
                       Try /help to see what else I can do.";
const ALREADY_SUBSCRIBED: &str = "You're already subscribed 🦢";
const NO_CLIP: &str = "No geese available right now 🪿";
const RPS_USAGE: &str = "Usage: /rps rock | paper | scissors";

/// State shared by all command handlers
#[derive(Clone)]
pub struct CommandContext {
    pub registry: TargetRegistry,
    pub resources: Arc<Vec<ResourceSpec>>,
    pub gifs: Arc<GifSource>,
}

#[cfg(feature = "telegram")]
#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "lowercase", description = "These commands are supported:")]
pub enum Command {
    #[command(description = "subscribe to change alerts.")]
    Start,
    #[command(description = "show this text.")]
    Help,
    #[command(description = "list the watched pages.")]
    List,
    #[command(description = "send a random goose.")]
    Goose,
    #[command(description = "rock-paper-scissors, e.g. /rps rock")]
    Rps(String),
}

pub fn list_text(resources: &[ResourceSpec]) -> String {
    if resources.is_empty() {
        return "No pages are being watched.".to_string();
    }

    let mut text = String::from("👀 Watching:\n");
    for resource in resources {
        text.push_str(&format!("• {} - {}\n", resource.name, resource.url));
    }
    text
}

pub fn rps_reply(arg: &str) -> String {
    if arg.trim().is_empty() {
        return RPS_USAGE.to_string();
    }

    match arg.parse::<Hand>() {
        Ok(player) => game::describe(player, Hand::random()),
        Err(e) => format!("{e}\n{RPS_USAGE}"),
    }
}

/// Registers `chat` and greets it on first contact.
///
/// Returns whether this was the first contact. A greeting that cannot be
/// delivered is only logged, the message that triggered it still gets handled.
pub async fn subscribe(
    registry: &TargetRegistry,
    greeter: &dyn Broadcaster,
    chat: TargetId,
) -> bool {
    if !registry.register(chat) {
        return false;
    }

    info!(chat_id = chat.0, subscribers = registry.len(), "New subscriber");
    if let Err(e) = greeter.deliver(chat, WELCOME).await {
        warn!(chat_id = chat.0, error = %e, "Could not send welcome message");
    }
    true
}

/// Sends change alerts as plain Telegram messages
#[cfg(feature = "telegram")]
#[derive(Clone)]
pub struct TelegramBroadcaster {
    bot: Bot,
}

#[cfg(feature = "telegram")]
#[async_trait::async_trait]
impl Broadcaster for TelegramBroadcaster {
    async fn deliver(&self, target: TargetId, text: &str) -> Result<(), DeliveryError> {
        self.bot
            .send_message(ChatId(target.0), text)
            .await
            .map(|_| ())
            .map_err(|e| DeliveryError {
                target,
                message: e.to_string(),
            })
    }
}

/// The chat front end, or its absence when no token or feature is available
pub struct CommandInterface {
    #[cfg(feature = "telegram")]
    bot: Option<Bot>,
}

impl CommandInterface {
    #[cfg(feature = "telegram")]
    pub fn from_env() -> Self {
        let bot = std::env::var(TOKEN_ENV)
            .ok()
            .filter(|token| !token.is_empty())
            .map(Bot::new);

        if bot.is_none() {
            warn!("{} not set - alerts will only be logged", TOKEN_ENV);
        }
        Self { bot }
    }

    #[cfg(not(feature = "telegram"))]
    pub fn from_env() -> Self {
        warn!("Telegram feature not enabled - alerts will only be logged");
        Self {}
    }

    #[cfg(feature = "telegram")]
    pub fn broadcaster(&self) -> Arc<dyn Broadcaster> {
        match self.bot {
            Some(ref bot) => Arc::new(TelegramBroadcaster { bot: bot.clone() }),
            None => Arc::new(LogBroadcaster),
        }
    }

    #[cfg(not(feature = "telegram"))]
    pub fn broadcaster(&self) -> Arc<dyn Broadcaster> {
        Arc::new(LogBroadcaster)
    }

    #[cfg(feature = "telegram")]
    pub fn spawn(self, context: CommandContext) -> Option<JoinHandle<()>> {
        let bot = self.bot?;
        Some(tokio::spawn(async move {
            if let Err(e) = run_telegram_bot(bot, context).await {
                tracing::error!(error = %e, "Telegram bot error");
            }
        }))
    }

    #[cfg(not(feature = "telegram"))]
    pub fn spawn(self, _context: CommandContext) -> Option<JoinHandle<()>> {
        None
    }
}

#[cfg(feature = "telegram")]
async fn run_telegram_bot(
    bot: Bot,
    context: CommandContext,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let me = bot.get_me().await?;
    let username = me.username().to_string();

    info!(bot = %username, "Telegram bot starting long polling");

    let handler = Update::filter_message().endpoint(move |bot: Bot, msg: Message| {
        let context = context.clone();
        let username = username.clone();

        async move {
            if let Err(e) = handle_message(&bot, &context, &username, &msg).await {
                warn!(chat_id = msg.chat.id.0, error = %e, "Failed to answer message");
            }
            respond(())
        }
    });

    Dispatcher::builder(bot, handler).build().dispatch().await;
    Ok(())
}

#[cfg(feature = "telegram")]
async fn handle_message(
    bot: &Bot,
    context: &CommandContext,
    username: &str,
    msg: &Message,
) -> ResponseResult<()> {
    if msg.from.as_ref().is_some_and(|u| u.is_bot) {
        return Ok(());
    }

    let chat = msg.chat.id;
    let greeter = TelegramBroadcaster { bot: bot.clone() };
    let first_contact = subscribe(&context.registry, &greeter, TargetId(chat.0)).await;

    let Some(text) = msg.text() else {
        return Ok(());
    };

    // Plain chatter only subscribes
    let Ok(command) = Command::parse(text, username) else {
        return Ok(());
    };

    match command {
        Command::Start => {
            if !first_contact {
                bot.send_message(chat, ALREADY_SUBSCRIBED).await?;
            }
        }
        Command::Help => {
            bot.send_message(chat, Command::descriptions().to_string())
                .await?;
        }
        Command::List => {
            bot.send_message(chat, list_text(&context.resources)).await?;
        }
        Command::Goose => {
            let clip = context
                .gifs
                .random_clip()
                .await
                .and_then(|clip| reqwest::Url::parse(&clip).ok());

            match clip {
                Some(url) => {
                    bot.send_animation(chat, InputFile::url(url)).await?;
                }
                None => {
                    bot.send_message(chat, NO_CLIP).await?;
                }
            }
        }
        Command::Rps(arg) => {
            bot.send_message(chat, rps_reply(&arg)).await?;
        }
    }

    Ok(())
}
