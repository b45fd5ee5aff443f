use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use shared::{
    domain::{Directive, UnknownDirectivePolicy},
    protocol::AddRemoveCards,
};
use tracing::{debug, info, warn};

use crate::{
    error::{HandlerError, SyncError},
    markup::parse_fragment,
    page::{Insertion, PageView},
};

pub type SharedPage = Arc<Mutex<PageView>>;

pub(crate) fn lock_page(page: &SharedPage) -> MutexGuard<'_, PageView> {
    page.lock().unwrap_or_else(PoisonError::into_inner)
}

/// What a handler did to the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Added(Insertion),
    Removed,
    Unchanged,
}

impl Applied {
    pub fn changed(self) -> bool {
        !matches!(self, Self::Unchanged | Self::Added(Insertion::Empty))
    }
}

pub trait CustomMessageHandler: Send {
    fn handle(&mut self, message: serde_json::Value) -> Result<Applied, HandlerError>;
}

impl<F> CustomMessageHandler for F
where
    F: FnMut(serde_json::Value) -> Result<Applied, HandlerError> + Send,
{
    fn handle(&mut self, message: serde_json::Value) -> Result<Applied, HandlerError> {
        self(message)
    }
}

#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Box<dyn CustomMessageHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `name`, replacing any earlier one. Returns
    /// `true` when a handler was replaced.
    pub fn add_custom_message_handler(
        &mut self,
        name: impl Into<String>,
        handler: impl CustomMessageHandler + 'static,
    ) -> bool {
        let name = name.into();
        let replaced = self.handlers.insert(name.clone(), Box::new(handler)).is_some();
        if replaced {
            warn!(%name, "handlers: replaced existing custom message handler");
        } else {
            debug!(%name, "handlers: registered custom message handler");
        }
        replaced
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn dispatch(
        &mut self,
        name: &str,
        message: serde_json::Value,
    ) -> Result<Applied, SyncError> {
        let handler = self
            .handlers
            .get_mut(name)
            .ok_or_else(|| SyncError::NoHandler(name.to_string()))?;
        handler.handle(message).map_err(|source| SyncError::Handler {
            name: name.to_string(),
            source,
        })
    }
}

/// Keeps the card collection of a [`PageView`] in step with
/// `add-remove-cards` messages.
pub struct CardListSynchronizer {
    page: SharedPage,
    policy: UnknownDirectivePolicy,
}

impl CardListSynchronizer {
    pub fn new(page: SharedPage, policy: UnknownDirectivePolicy) -> Self {
        Self { page, policy }
    }

    pub fn apply(&self, message: &AddRemoveCards) -> Result<Applied, HandlerError> {
        let directive = match message.directive() {
            Ok(directive) => directive,
            Err(unknown) => match self.policy {
                UnknownDirectivePolicy::TreatAsRemove => {
                    warn!(
                        directive = %unknown.0,
                        "cards: unrecognized directive, treating as remove"
                    );
                    Directive::Remove
                }
                UnknownDirectivePolicy::Reject => {
                    warn!(directive = %unknown.0, "cards: rejected unrecognized directive");
                    return Err(unknown.into());
                }
            },
        };

        match directive {
            Directive::Add => Ok(Applied::Added(self.add(&message.card))),
            Directive::Remove => Ok(self.remove_last()),
        }
    }

    fn add(&self, markup: &str) -> Insertion {
        let nodes = parse_fragment(markup);
        let mut page = lock_page(&self.page);
        let insertion = page.add(nodes);
        match insertion {
            Insertion::Empty => {
                debug!(markup_len = markup.len(), "cards: card markup produced no nodes");
            }
            Insertion::AfterPlaceholder { inserted } | Insertion::AfterLastCard { inserted } => {
                info!(
                    inserted,
                    card_count = page.card_count(),
                    position = ?insertion,
                    "cards: added card"
                );
            }
        }
        insertion
    }

    fn remove_last(&self) -> Applied {
        let mut page = lock_page(&self.page);
        match page.remove_last_card() {
            Some(_) => {
                info!(card_count = page.card_count(), "cards: removed last card");
                Applied::Removed
            }
            None => {
                debug!("cards: remove on empty collection");
                Applied::Unchanged
            }
        }
    }
}

impl CustomMessageHandler for CardListSynchronizer {
    fn handle(&mut self, message: serde_json::Value) -> Result<Applied, HandlerError> {
        let message = match self.policy {
            UnknownDirectivePolicy::Reject => serde_json::from_value(message)?,
            UnknownDirectivePolicy::TreatAsRemove => {
                if !message.is_object() {
                    warn!(payload = %message, "cards: payload is not an object, reading it as remove");
                }
                AddRemoveCards::from_value_lossy(&message)
            }
        };
        self.apply(&message)
    }
}

#[cfg(test)]
#[path = "tests/handler_tests.rs"]
mod tests;
