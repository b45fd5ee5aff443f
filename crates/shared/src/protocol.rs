use serde::{Deserialize, Serialize};

use crate::{
    domain::{Directive, UnknownDirective},
    error::ApiError,
};

/// Name of the custom message that adds or removes a card.
pub const ADD_REMOVE_CARDS: &str = "add-remove-cards";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ServerEvent {
    CustomMessage {
        name: String,
        message: serde_json::Value,
    },
    Error(ApiError),
}

impl ServerEvent {
    pub fn custom<T: Serialize>(
        name: impl Into<String>,
        payload: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self::CustomMessage {
            name: name.into(),
            message: serde_json::to_value(payload)?,
        })
    }

    pub fn add_remove_cards(card: impl Into<String>, directive: Directive) -> Self {
        Self::CustomMessage {
            name: ADD_REMOVE_CARDS.to_string(),
            message: serde_json::json!({
                "card": card.into(),
                "add_remove": directive.as_str(),
            }),
        }
    }
}

/// Payload of [`ADD_REMOVE_CARDS`]. `add_remove` stays a raw string so that
/// values other than `add`/`remove` reach the handler and its policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddRemoveCards {
    #[serde(default)]
    pub card: String,
    #[serde(default)]
    pub add_remove: String,
}

impl AddRemoveCards {
    pub fn directive(&self) -> Result<Directive, UnknownDirective> {
        Directive::parse(&self.add_remove)
    }

    /// Reads whatever fields are usable from `message`. A missing or
    /// non-string `card` becomes empty markup; a non-string `add_remove`
    /// keeps its JSON text so it can never read as `"add"`. Non-object
    /// messages yield an empty card with an empty directive.
    pub fn from_value_lossy(message: &serde_json::Value) -> Self {
        let card = message
            .get("card")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_string();
        let add_remove = match message.get("add_remove") {
            Some(serde_json::Value::String(raw)) => raw.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        };
        Self { card, add_remove }
    }
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
