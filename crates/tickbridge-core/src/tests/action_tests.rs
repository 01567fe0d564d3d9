use serde_json::json;

use crate::action::{ActionRequest, ActionResult, ActionStatus};

#[test]
fn wire_objects_are_accepted() {
    let value = json!({"id": "a1", "type": "set_speed", "params": {"speed": 2}});
    let request = ActionRequest::from_wire(&value, "fallback").unwrap();
    assert_eq!(request.id, "a1");
    assert_eq!(request.kind, "set_speed");
    assert_eq!(request.params["speed"], 2);
}

#[test]
fn non_objects_are_not_requests() {
    for value in [json!("set_speed"), json!(3), json!([{"type": "no_op"}]), json!(null)] {
        assert!(ActionRequest::from_wire(&value, "fallback").is_none());
    }
}

#[test]
fn missing_or_blank_id_uses_the_fallback() {
    let no_id = ActionRequest::from_wire(&json!({"type": "no_op"}), "gen_1").unwrap();
    assert_eq!(no_id.id, "gen_1");

    let blank = ActionRequest::from_wire(&json!({"id": "  ", "type": "no_op"}), "gen_2").unwrap();
    assert_eq!(blank.id, "gen_2");

    let padded = ActionRequest::from_wire(&json!({"id": " a ", "type": "no_op"}), "gen_3").unwrap();
    assert_eq!(padded.id, "a");
}

#[test]
fn missing_type_and_params_default_to_empty() {
    let request = ActionRequest::from_wire(&json!({"id": "a"}), "fallback").unwrap();
    assert_eq!(request.kind, "");
    assert!(request.params.is_empty());
}

#[test]
fn results_serialize_with_wire_field_names() {
    let request = ActionRequest::new("a1", "set_speed");
    let result = ActionResult::new(&request, ActionStatus::Rejected, "out of range");
    let wire = serde_json::to_value(&result).unwrap();
    assert_eq!(wire["id"], "a1");
    assert_eq!(wire["type"], "set_speed");
    assert_eq!(wire["status"], "rejected");
    assert_eq!(wire["message"], "out of range");
}

#[test]
fn status_tags_are_snake_case() {
    let tags: Vec<String> = [
        ActionStatus::Applied,
        ActionStatus::Rejected,
        ActionStatus::Unsupported,
        ActionStatus::Ignored,
        ActionStatus::Error,
    ]
    .iter()
    .map(|status| serde_json::to_value(status).unwrap().as_str().unwrap().to_string())
    .collect();
    assert_eq!(tags, ["applied", "rejected", "unsupported", "ignored", "error"]);
}
