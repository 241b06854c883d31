//! Reaction identifiers.

use std::{
    fmt,
    hash::{Hash, Hasher},
    num::NonZeroU64,
};

use serde::Serialize;

use crate::{Error, Result};

/// An emoji to add to a message.
///
/// Two specs are the same reaction when their [`resolved_name`](Self::resolved_name)
/// matches, so a custom emoji referenced with and without its id collapses
/// to one entry in a [`ReactionQueue`](crate::ReactionQueue).
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ReactionSpec {
    /// A server emoji, looked up by name in the message's guild unless the
    /// id is already known.
    Custom {
        name: String,
        id: Option<NonZeroU64>,
        animated: bool,
    },
    /// A Unicode emoji glyph.
    Standard { glyph: String },
}

impl ReactionSpec {
    #[must_use]
    pub fn custom(name: impl Into<String>) -> Self {
        Self::Custom {
            name: name.into(),
            id: None,
            animated: false,
        }
    }

    /// Unicode glyph, taken verbatim.
    #[must_use]
    pub fn standard(glyph: impl Into<String>) -> Self {
        Self::Standard {
            glyph: glyph.into(),
        }
    }

    /// Parse a configured reaction.
    ///
    /// Custom: `tim`, `:tim:`, `<:tim:123>` or `<a:tim:123>`.
    /// Standard: a glyph such as `🚀` or a shortcode such as `:rocket:`.
    pub fn parse(raw: &str, custom: bool) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Error::invalid_reaction(raw, "reaction is empty"));
        }
        if custom {
            parse_custom(trimmed)
        } else {
            parse_standard(trimmed)
        }
    }

    /// Name used for de-duplication: the emoji name for custom reactions,
    /// the glyph for standard ones.
    #[must_use]
    pub fn resolved_name(&self) -> &str {
        match self {
            Self::Custom { name, .. } => name,
            Self::Standard { glyph } => glyph,
        }
    }

    #[must_use]
    pub fn is_custom(&self) -> bool {
        matches!(self, Self::Custom { .. })
    }
}

fn parse_custom(raw: &str) -> Result<ReactionSpec> {
    if let Some(inner) = raw.strip_prefix('<').and_then(|s| s.strip_suffix('>')) {
        let mut parts = inner.split(':');
        let (animated, name, id) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(flag), Some(name), Some(id), None) if flag.is_empty() || flag == "a" => {
                (flag == "a", name, id)
            },
            _ => return Err(Error::invalid_reaction(raw, "malformed emoji markup")),
        };
        let id = id
            .parse::<NonZeroU64>()
            .map_err(|_| Error::invalid_reaction(raw, "emoji id must be a non-zero number"))?;
        validate_custom_name(raw, name)?;
        return Ok(ReactionSpec::Custom {
            name: name.to_string(),
            id: Some(id),
            animated,
        });
    }

    let name = strip_colons(raw).unwrap_or(raw);
    validate_custom_name(raw, name)?;
    Ok(ReactionSpec::custom(name))
}

fn validate_custom_name(raw: &str, name: &str) -> Result<()> {
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(Error::invalid_reaction(
            raw,
            "custom emoji names use letters, digits and underscores",
        ));
    }
    Ok(())
}

fn parse_standard(raw: &str) -> Result<ReactionSpec> {
    if let Some(code) = strip_colons(raw) {
        return emojis::get_by_shortcode(code)
            .map(|emoji| ReactionSpec::standard(emoji.as_str()))
            .ok_or_else(|| Error::invalid_reaction(raw, "unknown emoji shortcode"));
    }
    if raw.chars().any(char::is_whitespace) || raw.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(Error::invalid_reaction(
            raw,
            "expected an emoji glyph or a :shortcode:",
        ));
    }
    Ok(ReactionSpec::standard(raw))
}

/// `:name:` → `name`.
fn strip_colons(raw: &str) -> Option<&str> {
    raw.strip_prefix(':')
        .and_then(|s| s.strip_suffix(':'))
        .filter(|s| !s.is_empty())
}

impl PartialEq for ReactionSpec {
    fn eq(&self, other: &Self) -> bool {
        self.resolved_name() == other.resolved_name()
    }
}

impl Eq for ReactionSpec {}

impl Hash for ReactionSpec {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.resolved_name().hash(state);
    }
}

impl fmt::Display for ReactionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custom {
                name,
                id: Some(id),
                animated,
            } => write!(f, "<{}:{name}:{id}>", if *animated { "a" } else { "" }),
            Self::Custom { name, id: None, .. } => write!(f, ":{name}:"),
            Self::Standard { glyph } => f.write_str(glyph),
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case("tim", "tim", None, false)]
    #[case(":tim:", "tim", None, false)]
    #[case("<:tim:123456>", "tim", Some(123_456), false)]
    #[case("<a:party_tim:42>", "party_tim", Some(42), true)]
    fn parses_custom(
        #[case] raw: &str,
        #[case] name: &str,
        #[case] id: Option<u64>,
        #[case] animated: bool,
    ) {
        let spec = ReactionSpec::parse(raw, true).unwrap();
        assert_eq!(spec, ReactionSpec::Custom {
            name: name.into(),
            id: id.and_then(NonZeroU64::new),
            animated,
        });
        match spec {
            ReactionSpec::Custom {
                id: parsed_id,
                animated: parsed_animated,
                ..
            } => {
                assert_eq!(parsed_id.map(NonZeroU64::get), id);
                assert_eq!(parsed_animated, animated);
            },
            ReactionSpec::Standard { .. } => panic!("expected a custom reaction"),
        }
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("two words")]
    #[case("<:tim:abc>")]
    #[case("<b:tim:1>")]
    #[case("<:tim>")]
    #[case("<:tim:0>")]
    #[case("<a:tim:-1>")]
    fn rejects_bad_custom(#[case] raw: &str) {
        assert!(ReactionSpec::parse(raw, true).is_err());
    }

    #[rstest]
    #[case(":rocket:", "🚀")]
    #[case("🚀", "🚀")]
    #[case(" 🦀 ", "🦀")]
    fn parses_standard(#[case] raw: &str, #[case] glyph: &str) {
        let spec = ReactionSpec::parse(raw, false).unwrap();
        assert_eq!(spec.resolved_name(), glyph);
        assert!(!spec.is_custom());
    }

    #[rstest]
    #[case(":definitely_not_an_emoji:")]
    #[case("rocket")]
    #[case("")]
    fn rejects_bad_standard(#[case] raw: &str) {
        assert!(ReactionSpec::parse(raw, false).is_err());
    }

    #[test]
    fn equality_ignores_custom_id() {
        let bare = ReactionSpec::custom("tim");
        let full = ReactionSpec::parse("<:tim:99>", true).unwrap();
        assert_eq!(bare, full);
        assert_ne!(bare, ReactionSpec::standard("🚀"));
    }

    #[test]
    fn display_forms() {
        assert_eq!(ReactionSpec::custom("tim").to_string(), ":tim:");
        assert_eq!(
            ReactionSpec::parse("<a:tim:7>", true).unwrap().to_string(),
            "<a:tim:7>"
        );
        assert_eq!(ReactionSpec::standard("🚀").to_string(), "🚀");
    }
}
