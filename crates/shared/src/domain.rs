use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Class shared by every card element on the page.
pub const CARD_MARKER_CLASS: &str = "my-cards";

/// Id of the anchor that cards are inserted after while none exist.
pub const PLACEHOLDER_ID: &str = "placeholder";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Directive {
    Add,
    Remove,
}

impl Directive {
    /// Matches the wire value exactly; `"Add"` or `" add"` are not `Add`.
    pub fn parse(raw: &str) -> Result<Self, UnknownDirective> {
        match raw {
            "add" => Ok(Self::Add),
            "remove" => Ok(Self::Remove),
            other => Err(UnknownDirective(other.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Remove => "remove",
        }
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized card directive {0:?}")]
pub struct UnknownDirective(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownDirectivePolicy {
    #[default]
    TreatAsRemove,
    Reject,
}
