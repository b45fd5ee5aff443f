use super::*;
use crate::error::ErrorCode;

#[test]
fn custom_message_uses_tagged_envelope() {
    let event = ServerEvent::add_remove_cards("<div class='my-cards'>A</div>", Directive::Add);
    let json = serde_json::to_value(&event).expect("json");
    assert_eq!(
        json,
        serde_json::json!({
            "type": "custom_message",
            "payload": {
                "name": "add-remove-cards",
                "message": {
                    "card": "<div class='my-cards'>A</div>",
                    "add_remove": "add",
                },
            },
        })
    );
}

#[test]
fn decodes_custom_message_frame() {
    let frame = r#"{"type":"custom_message","payload":{"name":"add-remove-cards","message":{"card":"<p>x</p>","add_remove":"remove"}}}"#;
    let event: ServerEvent = serde_json::from_str(frame).expect("decode");
    let ServerEvent::CustomMessage { name, message } = event else {
        panic!("expected custom message");
    };
    assert_eq!(name, ADD_REMOVE_CARDS);
    let payload: AddRemoveCards = serde_json::from_value(message).expect("payload");
    assert_eq!(payload.card, "<p>x</p>");
    assert_eq!(payload.directive(), Ok(Directive::Remove));
}

#[test]
fn decodes_error_frame() {
    let frame = r#"{"type":"error","payload":{"code":"internal","message":"boom"}}"#;
    let event: ServerEvent = serde_json::from_str(frame).expect("decode");
    assert_eq!(
        event,
        ServerEvent::Error(ApiError::new(ErrorCode::Internal, "boom"))
    );
}

#[test]
fn missing_payload_fields_default_to_empty() {
    let payload: AddRemoveCards = serde_json::from_str("{}").expect("payload");
    assert_eq!(payload, AddRemoveCards::default());
    assert_eq!(
        payload.directive(),
        Err(UnknownDirective(String::new()))
    );
}

#[test]
fn directive_parsing_is_exact() {
    assert_eq!(Directive::parse("add"), Ok(Directive::Add));
    assert_eq!(Directive::parse("remove"), Ok(Directive::Remove));
    for raw in ["Add", "ADD", " add", "delete", ""] {
        assert_eq!(
            Directive::parse(raw),
            Err(UnknownDirective(raw.to_string())),
            "{raw:?} must not parse"
        );
    }
}

#[test]
fn custom_builder_serializes_arbitrary_payloads() {
    #[derive(Serialize)]
    struct Ping {
        seq: u32,
    }
    let event = ServerEvent::custom("ping", &Ping { seq: 3 }).expect("event");
    assert_eq!(
        event,
        ServerEvent::CustomMessage {
            name: "ping".to_string(),
            message: serde_json::json!({ "seq": 3 }),
        }
    );
}

#[test]
fn lossy_read_tolerates_mistyped_fields() {
    let payload = AddRemoveCards::from_value_lossy(&serde_json::json!({
        "card": null,
        "add_remove": 1,
    }));
    assert_eq!(payload.card, "");
    assert_eq!(payload.add_remove, "1");
    assert!(payload.directive().is_err());

    let payload = AddRemoveCards::from_value_lossy(&serde_json::json!({ "add_remove": null }));
    assert_eq!(payload.add_remove, "null");

    let payload = AddRemoveCards::from_value_lossy(&serde_json::json!(["add"]));
    assert_eq!(payload, AddRemoveCards::default());

    let payload = AddRemoveCards::from_value_lossy(&serde_json::json!({
        "card": "<p>x</p>",
        "add_remove": "add",
    }));
    assert_eq!(payload.card, "<p>x</p>");
    assert_eq!(payload.directive(), Ok(Directive::Add));
}
