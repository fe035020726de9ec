// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn log_message_round_trips_through_json() {
    let msg = StreamMessage::Log { action_id: "a1".into(), bytes: b"hello\n".to_vec() };
    let json = serde_json::to_string(&msg).unwrap();
    let back: StreamMessage = serde_json::from_str(&json).unwrap();
    assert_eq!(back.action_id(), "a1");
    assert!(!back.is_result());
}

#[test]
fn result_message_carries_map() {
    let mut value = ResultMap::new();
    value.insert("artifact_path".into(), "/tmp/out.tar".into());
    let msg = StreamMessage::Result { action_id: "a2".into(), value };
    assert!(msg.is_result());
}

#[test]
fn approval_message_tags_as_approval() {
    let msg = StreamMessage::Approval { action_id: "a3".into(), approval_id: ApprovalId::new() };
    let json = serde_json::to_value(&msg).unwrap();
    assert_eq!(json["message_type"], "approval");
}

#[test]
fn error_message_preserves_text() {
    let msg = StreamMessage::Error { action_id: "a4".into(), text: "boom".into() };
    if let StreamMessage::Error { text, .. } = &msg {
        assert_eq!(text, "boom");
    } else {
        panic!("expected Error variant");
    }
}

#[test]
fn cancelled_message_action_id_accessor() {
    let msg = StreamMessage::Cancelled { action_id: "a5".into(), text: "user requested".into() };
    assert_eq!(msg.action_id(), "a5");
}

#[test]
fn closed_message_tags_as_closed() {
    let msg = StreamMessage::Closed { action_id: "a6".into() };
    let json = serde_json::to_value(&msg).unwrap();
    assert_eq!(json["message_type"], "closed");
    assert!(!msg.is_result());
}

#[test]
fn approval_id_has_prefix() {
    let id = ApprovalId::new();
    assert!(id.as_str().starts_with("apr-"));
}
