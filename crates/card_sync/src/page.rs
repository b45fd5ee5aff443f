use shared::domain::{CARD_MARKER_CLASS, PLACEHOLDER_ID};
use tracing::debug;

use crate::markup::{MarkerRemoval, PageNode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLayout {
    pub placeholder_id: String,
    pub marker_class: String,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            placeholder_id: PLACEHOLDER_ID.into(),
            marker_class: CARD_MARKER_CLASS.into(),
        }
    }
}

/// Where an `add` put its nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    AfterPlaceholder { inserted: usize },
    AfterLastCard { inserted: usize },
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSnapshot {
    pub html: String,
    pub cards: Vec<String>,
}

/// The placeholder anchor followed by the region that cards live in.
///
/// The region may also hold non-card nodes that arrived inside a card
/// fragment; they keep their position but never count as cards. A card may
/// sit at any depth inside a region node.
#[derive(Debug, Clone)]
pub struct PageView {
    layout: PageLayout,
    region: Vec<PageNode>,
}

impl PageView {
    pub fn new(layout: PageLayout) -> Self {
        Self {
            layout,
            region: Vec::new(),
        }
    }

    pub fn layout(&self) -> &PageLayout {
        &self.layout
    }

    pub fn nodes(&self) -> &[PageNode] {
        &self.region
    }

    /// Cards in document order, including ones nested inside other nodes.
    pub fn cards(&self) -> Vec<PageNode> {
        self.region
            .iter()
            .flat_map(|node| node.markers(&self.layout.marker_class))
            .collect()
    }

    pub fn card_count(&self) -> usize {
        self.region
            .iter()
            .map(|node| node.marker_count(&self.layout.marker_class))
            .sum()
    }

    /// Region index of the node holding the last card.
    fn last_card_index(&self) -> Option<usize> {
        self.region
            .iter()
            .rposition(|node| node.marker_count(&self.layout.marker_class) > 0)
    }

    /// Inserts `nodes` right after the last card, or right after the
    /// placeholder when there is no card yet. When the last card is nested,
    /// `nodes` go after the region node that holds it.
    pub fn add(&mut self, nodes: Vec<PageNode>) -> Insertion {
        if nodes.is_empty() {
            return Insertion::Empty;
        }
        let inserted = nodes.len();
        match self.last_card_index() {
            None => {
                self.region.splice(0..0, nodes);
                Insertion::AfterPlaceholder { inserted }
            }
            Some(index) => {
                if !self.region[index].has_class(&self.layout.marker_class) {
                    debug!(index, "page: last card is nested, inserting after its wrapper");
                }
                let at = index + 1;
                self.region.splice(at..at, nodes);
                Insertion::AfterLastCard { inserted }
            }
        }
    }

    /// Removes the last card. A nested card is cut out of its wrapper, which
    /// stays in place.
    pub fn remove_last_card(&mut self) -> Option<PageNode> {
        let index = self.last_card_index()?;
        match self.region[index].remove_last_marker(&self.layout.marker_class) {
            MarkerRemoval::WholeNode => Some(self.region.remove(index)),
            MarkerRemoval::Nested { removed, remaining } => {
                self.region[index] = remaining;
                Some(removed)
            }
            MarkerRemoval::NotFound => None,
        }
    }

    pub fn placeholder_html(&self) -> String {
        format!(
            "<div id=\"{}\"></div>",
            html_escape::encode_double_quoted_attribute(&self.layout.placeholder_id)
        )
    }

    pub fn render(&self) -> String {
        let mut html = self.placeholder_html();
        for node in &self.region {
            html.push_str(&node.html());
        }
        html
    }

    pub fn snapshot(&self) -> PageSnapshot {
        PageSnapshot {
            html: self.render(),
            cards: self.cards().iter().map(PageNode::html).collect(),
        }
    }
}

impl Default for PageView {
    fn default() -> Self {
        Self::new(PageLayout::default())
    }
}

#[cfg(test)]
#[path = "tests/page_tests.rs"]
mod tests;
