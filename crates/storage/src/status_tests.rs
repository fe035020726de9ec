use super::*;

#[test]
fn status_round_trips_through_its_string_form() {
    for status in [
        ExecutionStatus::Pending,
        ExecutionStatus::Running,
        ExecutionStatus::PendingApproval,
        ExecutionStatus::Completed,
        ExecutionStatus::Errored,
        ExecutionStatus::Cancelled,
    ] {
        assert_eq!(parse_status(status_str(status)).unwrap(), status);
    }
}

#[test]
fn trigger_type_round_trips_through_its_string_form() {
    for t in [TriggerType::Manual, TriggerType::Scheduled] {
        assert_eq!(parse_trigger_type(trigger_type_str(t)).unwrap(), t);
    }
}

#[test]
fn parse_status_rejects_unknown_value() {
    assert!(parse_status("not-a-status").is_err());
}

mod live {
    use super::*;
    use crate::migrations;
    use sqlx::postgres::PgPoolOptions;

    async fn pool() -> Option<sqlx::PgPool> {
        let url = std::env::var("DATABASE_URL").ok()?;
        let pool = PgPoolOptions::new().max_connections(5).connect(&url).await.ok()?;
        migrations::run(&pool).await.ok()?;
        Some(pool)
    }

    #[tokio::test]
    #[ignore]
    async fn create_then_transition_through_the_happy_path() {
        let Some(pool) = pool().await else { return };
        let store = StatusStore::new(pool);
        let exec_id = ExecId::new();
        store.create(exec_id, "ns-1", "flow-1", "Deploy", TriggerType::Manual, b"{}").await.unwrap();

        let record = store.get(exec_id).await.unwrap().unwrap();
        assert_eq!(record.status, ExecutionStatus::Pending);

        store.transition(exec_id, ExecutionStatus::Running, None).await.unwrap();
        store.transition(exec_id, ExecutionStatus::Completed, None).await.unwrap();

        let record = store.get(exec_id).await.unwrap().unwrap();
        assert_eq!(record.status, ExecutionStatus::Completed);
    }

    #[tokio::test]
    #[ignore]
    async fn transition_rejects_illegal_jump_from_terminal_state() {
        let Some(pool) = pool().await else { return };
        let store = StatusStore::new(pool);
        let exec_id = ExecId::new();
        store.create(exec_id, "ns-1", "flow-1", "Deploy", TriggerType::Manual, b"{}").await.unwrap();
        store.transition(exec_id, ExecutionStatus::Running, None).await.unwrap();
        store.transition(exec_id, ExecutionStatus::Cancelled, None).await.unwrap();

        let err = store.transition(exec_id, ExecutionStatus::Running, None).await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidTransition { .. }));
    }

    #[tokio::test]
    #[ignore]
    async fn transition_to_errored_records_message() {
        let Some(pool) = pool().await else { return };
        let store = StatusStore::new(pool);
        let exec_id = ExecId::new();
        store.create(exec_id, "ns-1", "flow-1", "Deploy", TriggerType::Manual, b"{}").await.unwrap();
        store.transition(exec_id, ExecutionStatus::Running, None).await.unwrap();
        store.transition(exec_id, ExecutionStatus::Errored, Some("boom")).await.unwrap();

        let record = store.get(exec_id).await.unwrap().unwrap();
        assert_eq!(record.error_message.as_deref(), Some("boom"));
    }
}
