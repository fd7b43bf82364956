/// Object reference literals.
///
/// Reference-valued fields designate another object in one of three forms:
///
/// | Form                    | Meaning                                           |
/// |-------------------------|---------------------------------------------------|
/// | `1234.1`                | an object id                                      |
/// | `<archetype>legacyId`   | the object of `archetype` loaded from `legacyId`  |
/// | `<archetype>name=value` | the object of `archetype` whose `name` is `value` |
///
/// Archetypes are opaque here, so wildcarded short names such as
/// `<party.patient*>` pass through untouched for the loader to resolve.
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

static ARCHETYPE_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<([^<>]+)>([^<>]+)$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Reference {
    ById {
        id: String,
    },
    ByLegacyId {
        archetype: String,
        legacy_id: String,
    },
    ByNameValue {
        archetype: String,
        name: String,
        value: String,
    },
}

impl Reference {
    /// Parse a reference literal. Returns `None` for text in none of the
    /// three forms.
    pub fn parse(text: &str) -> Option<Self> {
        if !text.contains(['<', '>']) {
            if text.is_empty() || text.contains('=') {
                return None;
            }
            return Some(Self::ById {
                id: text.to_string(),
            });
        }

        let caps = ARCHETYPE_REF.captures(text)?;
        let archetype = caps[1].to_string();
        let body = &caps[2];

        match body.split_once('=') {
            None => Some(Self::ByLegacyId {
                archetype,
                legacy_id: body.to_string(),
            }),
            Some((name, value)) if !name.is_empty() && !value.is_empty() => {
                Some(Self::ByNameValue {
                    archetype,
                    name: name.to_string(),
                    value: value.to_string(),
                })
            }
            Some(_) => None,
        }
    }

    /// Reference to the object of `archetype` loaded from `legacy_id`.
    pub fn legacy(archetype: impl Into<String>, legacy_id: impl Into<String>) -> Self {
        Self::ByLegacyId {
            archetype: archetype.into(),
            legacy_id: legacy_id.into(),
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ById { id } => write!(f, "{id}"),
            Self::ByLegacyId {
                archetype,
                legacy_id,
            } => write!(f, "<{archetype}>{legacy_id}"),
            Self::ByNameValue {
                archetype,
                name,
                value,
            } => write!(f, "<{archetype}>{name}={value}"),
        }
    }
}
