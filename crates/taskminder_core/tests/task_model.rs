use taskminder_core::{Priority, Task, TaskValidationError};

const T0: i64 = 1_700_000_000_000;

#[test]
fn new_task_sets_defaults() {
    let task = Task::new("  Buy milk ", Priority::default(), T0).unwrap();

    assert!(!task.id.is_empty());
    assert_eq!(task.text, "Buy milk");
    assert_eq!(task.priority, Priority::Medium);
    assert!(!task.completed);
    assert_eq!(task.created_at, T0);
    assert_eq!(task.completed_at, None);
    assert!(task.is_pending());
}

#[test]
fn new_tasks_get_distinct_ids() {
    let a = Task::new("a", Priority::Low, T0).unwrap();
    let b = Task::new("a", Priority::Low, T0).unwrap();
    assert_ne!(a.id, b.id);
}

#[test]
fn toggle_stamps_and_clears_completion() {
    let task = Task::with_id("t1", "stretch", Priority::High, T0).unwrap();

    let done = task.toggled(T0 + 500);
    assert!(done.completed);
    assert_eq!(done.completed_at, Some(T0 + 500));
    assert_eq!(done.id, task.id);

    let reopened = done.toggled(T0 + 900);
    assert!(!reopened.completed);
    assert_eq!(reopened.completed_at, None);
    assert_eq!(reopened.created_at, T0);
}

#[test]
fn toggle_clamps_clock_running_behind_creation() {
    let task = Task::with_id("t1", "stretch", Priority::High, T0).unwrap();
    let done = task.toggled(T0 - 10_000);
    assert_eq!(done.completed_at, Some(T0));
    done.validate().unwrap();
}

#[test]
fn text_limits_are_enforced() {
    assert_eq!(
        Task::with_id("t1", " \n ", Priority::Low, T0).unwrap_err(),
        TaskValidationError::EmptyText
    );
    let at_limit = "é".repeat(100);
    assert!(Task::with_id("t1", &at_limit, Priority::Low, T0).is_ok());
    assert_eq!(
        Task::with_id("t1", &"é".repeat(101), Priority::Low, T0).unwrap_err(),
        TaskValidationError::TextTooLong { chars: 101 }
    );

    let task = Task::with_id("t1", "ok", Priority::Low, T0).unwrap();
    assert_eq!(task.with_text("").unwrap_err(), TaskValidationError::EmptyText);
}

#[test]
fn empty_id_is_rejected() {
    assert_eq!(
        Task::with_id("  ", "text", Priority::Low, T0).unwrap_err(),
        TaskValidationError::EmptyId
    );
}

#[test]
fn serialization_uses_camel_case_wire_fields() {
    let task = Task::with_id("1697040000000abc123xyz", "Buy milk", Priority::High, T0)
        .unwrap()
        .toggled(T0 + 60_000);

    let json = serde_json::to_value(&task).unwrap();
    assert_eq!(json["id"], "1697040000000abc123xyz");
    assert_eq!(json["text"], "Buy milk");
    assert_eq!(json["priority"], "high");
    assert_eq!(json["completed"], true);
    assert_eq!(json["createdAt"], T0);
    assert_eq!(json["completedAt"], T0 + 60_000);

    let decoded: Task = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, task);
}

#[test]
fn missing_optional_fields_take_defaults() {
    let value = serde_json::json!({
        "id": "t1",
        "text": "legacy record",
        "createdAt": T0
    });

    let task: Task = serde_json::from_value(value).unwrap();
    assert_eq!(task.priority, Priority::Medium);
    assert!(!task.completed);
    assert_eq!(task.completed_at, None);
}

#[test]
fn deserialize_rejects_inconsistent_completion() {
    let value = serde_json::json!({
        "id": "t1",
        "text": "bad record",
        "priority": "low",
        "completed": false,
        "createdAt": T0,
        "completedAt": T0 + 1
    });

    let err = serde_json::from_value::<Task>(value).unwrap_err();
    assert!(
        err.to_string().contains("completedAt is set but task is not completed"),
        "unexpected error: {err}"
    );
}

#[test]
fn priority_parse_is_case_insensitive() {
    assert_eq!(Priority::parse(" HIGH "), Some(Priority::High));
    assert_eq!(Priority::parse("urgent"), None);
    assert_eq!(Priority::Low.to_string(), "low");
}
