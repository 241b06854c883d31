//! Adding reactions to a Discord message.

use std::{collections::HashMap, sync::Arc};

use {
    serenity::{
        all::{ChannelId, EmojiId, GuildId, Message, MessageId, ReactionType},
        async_trait,
        http::Http,
    },
    sweeney_reactions::{Error, ReactionSink, ReactionSpec, Result},
    tokio::sync::OnceCell,
    tracing::debug,
};

/// Guild emoji by name: id and whether it is animated.
type EmojiIndex = HashMap<String, (EmojiId, bool)>;

/// Reaction sink bound to one message.
///
/// Custom emoji configured by name are looked up in the message's guild the
/// first time one is needed; the list is reused for the rest of the message.
pub struct MessageReactionSink {
    http: Arc<Http>,
    channel_id: ChannelId,
    message_id: MessageId,
    guild_id: Option<GuildId>,
    guild_emojis: OnceCell<EmojiIndex>,
}

impl MessageReactionSink {
    pub fn new(http: Arc<Http>, msg: &Message) -> Self {
        Self {
            http,
            channel_id: msg.channel_id,
            message_id: msg.id,
            guild_id: msg.guild_id,
            guild_emojis: OnceCell::new(),
        }
    }

    async fn guild_emojis(&self) -> Result<&EmojiIndex> {
        let guild_id = self
            .guild_id
            .ok_or_else(|| Error::invalid_input("custom emoji are only available in guilds"))?;

        self.guild_emojis
            .get_or_try_init(|| async {
                let emojis = guild_id
                    .emojis(&self.http)
                    .await
                    .map_err(|e| Error::external("failed to list guild emojis", e))?;
                debug!(guild_id = guild_id.get(), count = emojis.len(), "loaded guild emojis");
                Ok::<_, Error>(
                    emojis
                        .into_iter()
                        .map(|emoji| (emoji.name, (emoji.id, emoji.animated)))
                        .collect(),
                )
            })
            .await
    }

    async fn reaction_type(&self, reaction: &ReactionSpec) -> Result<ReactionType> {
        if let Some(known) = direct_reaction_type(reaction) {
            return Ok(known);
        }
        let name = reaction.resolved_name();
        let emojis = self.guild_emojis().await?;
        lookup_reaction_type(emojis, name)
            .ok_or_else(|| Error::invalid_reaction(name, "no emoji with that name in this guild"))
    }
}

/// Reaction type when no guild lookup is needed.
fn direct_reaction_type(reaction: &ReactionSpec) -> Option<ReactionType> {
    match reaction {
        ReactionSpec::Standard { glyph } => Some(ReactionType::Unicode(glyph.clone())),
        ReactionSpec::Custom {
            name,
            id: Some(id),
            animated,
        } => Some(ReactionType::Custom {
            animated: *animated,
            id: EmojiId::new(id.get()),
            name: Some(name.clone()),
        }),
        ReactionSpec::Custom { id: None, .. } => None,
    }
}

fn lookup_reaction_type(emojis: &EmojiIndex, name: &str) -> Option<ReactionType> {
    emojis.get(name).map(|(id, animated)| ReactionType::Custom {
        animated: *animated,
        id: *id,
        name: Some(name.to_string()),
    })
}

#[async_trait]
impl ReactionSink for MessageReactionSink {
    async fn react(&self, reaction: &ReactionSpec) -> Result<()> {
        let reaction_type = self.reaction_type(reaction).await?;
        self.http
            .create_reaction(self.channel_id, self.message_id, &reaction_type)
            .await
            .map_err(|e| Error::external(format!("failed to add reaction {reaction}"), e))
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_reaction_is_unicode() {
        let reaction = direct_reaction_type(&ReactionSpec::parse(":rocket:", false).unwrap());
        assert_eq!(reaction, Some(ReactionType::Unicode("🚀".into())));
    }

    #[test]
    fn custom_reaction_with_id_needs_no_lookup() {
        let reaction = direct_reaction_type(&ReactionSpec::parse("<a:tim:42>", true).unwrap());
        assert_eq!(
            reaction,
            Some(ReactionType::Custom {
                animated: true,
                id: EmojiId::new(42),
                name: Some("tim".into()),
            })
        );
    }

    #[test]
    fn custom_reaction_by_name_uses_guild_index() {
        assert!(direct_reaction_type(&ReactionSpec::custom("tim")).is_none());

        let mut emojis = EmojiIndex::new();
        emojis.insert("tim".into(), (EmojiId::new(7), false));
        assert_eq!(
            lookup_reaction_type(&emojis, "tim"),
            Some(ReactionType::Custom {
                animated: false,
                id: EmojiId::new(7),
                name: Some("tim".into()),
            })
        );
        assert!(lookup_reaction_type(&emojis, "timato").is_none());
    }
}
