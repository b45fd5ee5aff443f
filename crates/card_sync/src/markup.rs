use scraper::{ElementRef, Html, Node};

/// A top-level node of a parsed card fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageNode {
    Element {
        tag: String,
        id: Option<String>,
        classes: Vec<String>,
        html: String,
    },
    Text(String),
}

/// Outcome of [`PageNode::remove_last_marker`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerRemoval {
    NotFound,
    /// The node itself is the last marker; the caller drops it whole.
    WholeNode,
    /// A descendant was the last marker. `remaining` is the node without it.
    Nested { removed: PageNode, remaining: PageNode },
}

impl PageNode {
    pub fn has_class(&self, class: &str) -> bool {
        match self {
            Self::Element { classes, .. } => classes.iter().any(|c| c == class),
            Self::Text(_) => false,
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Element { id, .. } => id.as_deref(),
            Self::Text(_) => None,
        }
    }

    /// Number of elements carrying `class`, this node included, at any depth.
    pub fn marker_count(&self, class: &str) -> usize {
        let Self::Element { html, .. } = self else {
            return 0;
        };
        let fragment = Html::parse_fragment(html);
        top_node(&fragment).map_or(0, |top| {
            top.descendants()
                .filter(|node| carries_class(node.value(), class))
                .count()
        })
    }

    /// Every element carrying `class`, in document order.
    pub fn markers(&self, class: &str) -> Vec<PageNode> {
        let Self::Element { html, .. } = self else {
            return Vec::new();
        };
        let fragment = Html::parse_fragment(html);
        let Some(top) = top_node(&fragment) else {
            return Vec::new();
        };
        top.descendants()
            .filter(|node| carries_class(node.value(), class))
            .filter_map(ElementRef::wrap)
            .map(element_node)
            .collect()
    }

    /// Removes the last element carrying `class` in document order.
    pub fn remove_last_marker(&self, class: &str) -> MarkerRemoval {
        let Self::Element { html, .. } = self else {
            return MarkerRemoval::NotFound;
        };
        let mut fragment = Html::parse_fragment(html);
        let (target, removed) = {
            let Some(top) = top_node(&fragment) else {
                return MarkerRemoval::NotFound;
            };
            let Some(last) = top
                .descendants()
                .filter(|node| carries_class(node.value(), class))
                .last()
            else {
                return MarkerRemoval::NotFound;
            };
            if last == *top {
                return MarkerRemoval::WholeNode;
            }
            let Some(removed) = ElementRef::wrap(last).map(element_node) else {
                return MarkerRemoval::NotFound;
            };
            (last.id(), removed)
        };

        if let Some(mut node) = fragment.tree.get_mut(target) {
            node.detach();
        }
        match top_node(&fragment) {
            Some(top) => MarkerRemoval::Nested {
                removed,
                remaining: element_node(top),
            },
            None => MarkerRemoval::NotFound,
        }
    }

    /// Outer markup as it appears in the rendered page.
    pub fn html(&self) -> String {
        match self {
            Self::Element { html, .. } => html.clone(),
            Self::Text(text) => html_escape::encode_text(text).into_owned(),
        }
    }

    /// Concatenated text content, used for logging and snapshots.
    pub fn text(&self) -> String {
        match self {
            Self::Element { html, .. } => Html::parse_fragment(html)
                .root_element()
                .text()
                .collect::<String>(),
            Self::Text(text) => text.clone(),
        }
    }
}

/// Parses `markup` as an HTML fragment in body context.
///
/// Parsing never fails: html5ever recovers what it can from malformed input,
/// comments and whitespace-only text are dropped, and anything that leaves no
/// nodes behind yields an empty vector.
pub fn parse_fragment(markup: &str) -> Vec<PageNode> {
    if markup.trim().is_empty() {
        return Vec::new();
    }

    let fragment = Html::parse_fragment(markup);
    let root = fragment.root_element();

    root.children()
        .filter_map(|child| match child.value() {
            Node::Element(_) => ElementRef::wrap(child).map(element_node),
            Node::Text(text) if !text.trim().is_empty() => Some(PageNode::Text((**text).to_owned())),
            _ => None,
        })
        .collect()
}

/// The single top-level element a stored node's markup re-parses into.
fn top_node(fragment: &Html) -> Option<ElementRef<'_>> {
    fragment.root_element().children().find_map(ElementRef::wrap)
}

fn carries_class(node: &Node, class: &str) -> bool {
    node.as_element()
        .is_some_and(|element| element.classes().any(|c| c == class))
}

fn element_node(element: ElementRef<'_>) -> PageNode {
    let value = element.value();
    PageNode::Element {
        tag: value.name().to_string(),
        id: value.id().map(str::to_string),
        classes: value.classes().map(str::to_string).collect(),
        html: element.html(),
    }
}

#[cfg(test)]
#[path = "tests/markup_tests.rs"]
mod tests;
