use super::*;
use crate::markup::parse_fragment;

fn card(label: &str) -> Vec<PageNode> {
    parse_fragment(&format!("<div class='my-cards'>{label}</div>"))
}

fn card_texts(page: &PageView) -> Vec<String> {
    page.cards().iter().map(PageNode::text).collect()
}

#[test]
fn first_card_goes_right_after_placeholder() {
    let mut page = PageView::default();
    assert_eq!(
        page.add(card("A")),
        Insertion::AfterPlaceholder { inserted: 1 }
    );
    assert_eq!(card_texts(&page), vec!["A"]);
    assert_eq!(
        page.render(),
        "<div id=\"placeholder\"></div><div class=\"my-cards\">A</div>"
    );
}

#[test]
fn second_card_goes_after_the_first() {
    let mut page = PageView::default();
    page.add(card("A"));
    assert_eq!(page.add(card("B")), Insertion::AfterLastCard { inserted: 1 });
    assert_eq!(card_texts(&page), vec!["A", "B"]);
}

#[test]
fn remove_takes_the_most_recent_card() {
    let mut page = PageView::default();
    page.add(card("A"));
    page.add(card("B"));
    let removed = page.remove_last_card().expect("card removed");
    assert_eq!(removed.text(), "B");
    assert_eq!(card_texts(&page), vec!["A"]);
}

#[test]
fn remove_on_empty_page_is_a_no_op() {
    let mut page = PageView::default();
    let before = page.render();
    assert!(page.remove_last_card().is_none());
    assert!(page.remove_last_card().is_none());
    assert_eq!(page.render(), before);
    assert_eq!(page.card_count(), 0);
}

#[test]
fn card_order_follows_arrival_order() {
    let mut page = PageView::default();
    let labels: Vec<String> = (0..25).map(|i| format!("card-{i}")).collect();
    for label in &labels {
        page.add(card(label));
    }
    assert_eq!(card_texts(&page), labels);

    for expected_len in (0..labels.len()).rev() {
        let removed = page.remove_last_card().expect("card");
        assert_eq!(removed.text(), labels[expected_len]);
        assert_eq!(page.card_count(), expected_len);
    }
}

#[test]
fn placeholder_survives_any_sequence() {
    let mut page = PageView::default();
    let placeholder = page.placeholder_html();
    for step in 0..40 {
        if step % 3 == 2 {
            page.remove_last_card();
        } else {
            page.add(card(&step.to_string()));
        }
        assert!(page.render().starts_with(&placeholder));
    }
    while page.remove_last_card().is_some() {}
    assert_eq!(page.render(), placeholder);
}

#[test]
fn empty_fragment_inserts_nothing() {
    let mut page = PageView::default();
    page.add(card("A"));
    let before = page.render();
    assert_eq!(page.add(Vec::new()), Insertion::Empty);
    assert_eq!(page.render(), before);
}

#[test]
fn non_card_nodes_keep_position_but_are_not_cards() {
    let mut page = PageView::default();
    page.add(parse_fragment("<p>note</p>"));
    assert_eq!(page.card_count(), 0);

    // No card yet: the new card lands in front of the stray note.
    page.add(card("A"));
    assert_eq!(
        page.render(),
        "<div id=\"placeholder\"></div><div class=\"my-cards\">A</div><p>note</p>"
    );

    // The note is never picked by remove.
    page.remove_last_card();
    page.remove_last_card();
    assert_eq!(page.render(), "<div id=\"placeholder\"></div><p>note</p>");
}

#[test]
fn multi_node_fragment_is_inserted_contiguously() {
    let mut page = PageView::default();
    page.add(card("A"));
    page.add(card("C"));
    let inserted = page.add(parse_fragment(
        "<div class='my-cards'>B1</div><div class='my-cards'>B2</div>",
    ));
    assert_eq!(inserted, Insertion::AfterLastCard { inserted: 2 });
    assert_eq!(card_texts(&page), vec!["A", "C", "B1", "B2"]);
}

#[test]
fn custom_layout_changes_anchor_and_marker() {
    let mut page = PageView::new(PageLayout {
        placeholder_id: "slot".to_string(),
        marker_class: "tile".to_string(),
    });
    page.add(card("ignored-marker"));
    page.add(parse_fragment("<li class='tile'>T</li>"));
    assert_eq!(page.card_count(), 1);
    assert_eq!(
        page.snapshot(),
        PageSnapshot {
            html: "<div id=\"slot\"></div><li class=\"tile\">T</li><div class=\"my-cards\">ignored-marker</div>"
                .to_string(),
            cards: vec!["<li class=\"tile\">T</li>".to_string()],
        }
    );
}

#[test]
fn wrapped_cards_are_counted_and_removed() {
    let mut page = PageView::default();
    page.add(parse_fragment("<section><div class='my-cards'>A</div></section>"));
    assert_eq!(page.card_count(), 1);
    assert_eq!(card_texts(&page), vec!["A"]);

    // The next card goes after the wrapper holding the last card.
    assert_eq!(page.add(card("B")), Insertion::AfterLastCard { inserted: 1 });
    assert_eq!(card_texts(&page), vec!["A", "B"]);

    assert_eq!(page.remove_last_card().map(|c| c.text()), Some("B".to_string()));
    let removed = page.remove_last_card().expect("wrapped card removed");
    assert_eq!(removed.text(), "A");
    assert_eq!(page.card_count(), 0);
    assert_eq!(
        page.render(),
        "<div id=\"placeholder\"></div><section></section>"
    );
    assert!(page.remove_last_card().is_none());
}
