//! Discord event handler for serenity.
//!
//! Implements the EventHandler trait to receive and process Discord events.

use std::sync::OnceLock;

use {
    serenity::{
        all::{ActivityData, Context, EventHandler, GatewayIntents, GuildId, Message, Ready},
        async_trait,
    },
    sweeney_common::{Attachment, IncomingMessage},
    sweeney_config::{ActivityConfig, ActivityKind},
    sweeney_reactions::{ClassificationPipeline, ReactionDispatcher},
    tracing::{debug, info, warn},
};

use crate::outbound::MessageReactionSink;

/// Handler for Discord gateway events.
pub struct ReactionHandler {
    pipeline: ClassificationPipeline,
    dispatcher: ReactionDispatcher,
    activity: Option<ActivityData>,
    bot_user_id: OnceLock<u64>,
}

impl ReactionHandler {
    pub fn new(
        pipeline: ClassificationPipeline,
        dispatcher: ReactionDispatcher,
        activity: &ActivityConfig,
    ) -> Self {
        Self {
            pipeline,
            dispatcher,
            activity: activity_data(activity),
            bot_user_id: OnceLock::new(),
        }
    }

    /// Required gateway intents for the bot.
    pub fn intents() -> GatewayIntents {
        GatewayIntents::GUILDS
            | GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::DIRECT_MESSAGES
            | GatewayIntents::MESSAGE_CONTENT
            | GatewayIntents::GUILD_EMOJIS_AND_STICKERS
    }
}

/// Presence for the configured activity. `None` when the text is blank.
pub fn activity_data(config: &ActivityConfig) -> Option<ActivityData> {
    let text = config.text.trim();
    if text.is_empty() {
        return None;
    }
    Some(match config.kind {
        ActivityKind::Playing => ActivityData::playing(text),
        ActivityKind::Listening => ActivityData::listening(text),
        ActivityKind::Watching => ActivityData::watching(text),
        ActivityKind::Competing => ActivityData::competing(text),
        ActivityKind::Custom => ActivityData::custom(text),
    })
}

/// Platform-neutral view of a gateway message.
pub fn incoming_message(msg: &Message) -> IncomingMessage {
    IncomingMessage {
        author_id: msg.author.id.get(),
        author_is_bot: msg.author.bot,
        text: msg.content.clone(),
        attachments: msg
            .attachments
            .iter()
            .map(|a| Attachment {
                id: a.id.get(),
                filename: a.filename.clone(),
                content_type: a.content_type.clone(),
                url: a.url.clone(),
            })
            .collect(),
    }
}

#[async_trait]
impl EventHandler for ReactionHandler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!(
            bot_name = %ready.user.name,
            bot_user_id = ready.user.id.get(),
            guilds = ready.guilds.len(),
            "discord bot ready"
        );

        // Reconnects deliver the same account, keep the first id.
        let _ = self.bot_user_id.set(ready.user.id.get());

        if let Some(activity) = &self.activity {
            ctx.set_activity(Some(activity.clone()));
        }
    }

    async fn message(&self, ctx: Context, msg: Message) {
        let incoming = incoming_message(&msg);
        let message_id = msg.id.get();
        let channel_id = msg.channel_id.get();

        let queue = match self
            .pipeline
            .classify(&incoming, self.bot_user_id.get().copied())
            .await
        {
            Ok(queue) => queue,
            Err(e) => {
                warn!(message_id, channel_id, error = %e, "skipping message");
                return;
            },
        };

        if queue.is_empty() {
            return;
        }

        info!(
            message_id,
            channel_id,
            author_id = incoming.author_id,
            reactions = ?queue.names(),
            "reacting to message"
        );

        let sink = MessageReactionSink::new(ctx.http.clone(), &msg);
        let report = self.dispatcher.dispatch(&queue, &sink).await;
        debug!(
            message_id,
            applied = report.applied,
            failed = report.failed,
            "reactions dispatched"
        );
    }

    async fn cache_ready(&self, _ctx: Context, guilds: Vec<GuildId>) {
        debug!(guild_count = guilds.len(), "discord cache ready");
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest, serenity::all::ActivityType};

    #[rstest]
    #[case(ActivityKind::Playing, ActivityType::Playing)]
    #[case(ActivityKind::Listening, ActivityType::Listening)]
    #[case(ActivityKind::Watching, ActivityType::Watching)]
    #[case(ActivityKind::Competing, ActivityType::Competing)]
    #[case(ActivityKind::Custom, ActivityType::Custom)]
    fn activity_kinds(#[case] kind: ActivityKind, #[case] expected: ActivityType) {
        let config = ActivityConfig {
            kind,
            text: "Epic v Apple".into(),
        };
        let activity = activity_data(&config).unwrap();
        assert_eq!(activity.kind, expected);
    }

    #[test]
    fn default_activity_is_competing() {
        let activity = activity_data(&ActivityConfig::default()).unwrap();
        assert_eq!(activity.kind, ActivityType::Competing);
        assert_eq!(activity.name, "Epic v Apple");
    }

    #[test]
    fn blank_activity_is_skipped() {
        let config = ActivityConfig {
            kind: ActivityKind::Playing,
            text: "  ".into(),
        };
        assert!(activity_data(&config).is_none());
    }

    #[test]
    fn intents_cover_message_content_and_emojis() {
        let intents = ReactionHandler::intents();
        assert!(intents.contains(GatewayIntents::MESSAGE_CONTENT));
        assert!(intents.contains(GatewayIntents::GUILD_MESSAGES));
        assert!(intents.contains(GatewayIntents::GUILD_EMOJIS_AND_STICKERS));
    }
}
