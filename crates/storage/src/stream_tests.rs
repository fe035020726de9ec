use super::*;

#[test]
fn message_type_str_matches_every_variant() {
    assert_eq!(message_type_str(&StreamMessage::Log { action_id: "a".into(), bytes: vec![] }), "log");
    assert_eq!(
        message_type_str(&StreamMessage::Result { action_id: "a".into(), value: ResultMap::new() }),
        "result"
    );
    assert_eq!(message_type_str(&StreamMessage::Error { action_id: "a".into(), text: "x".into() }), "error");
    assert_eq!(
        message_type_str(&StreamMessage::Cancelled { action_id: "a".into(), text: "x".into() }),
        "cancelled"
    );
    assert_eq!(message_type_str(&StreamMessage::Closed { action_id: "a".into() }), "closed");
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
    async fn checkpoint_then_list_preserves_write_order() {
        let Some(pool) = pool().await else { return };
        let stream = EventStream::new(pool);
        let exec_id = ExecId::new();

        stream.write(exec_id, "a1", b"starting\n".to_vec()).await.unwrap();
        let mut result = ResultMap::new();
        result.insert("MESSAGE".into(), "hellothere".into());
        stream.checkpoint(exec_id, StreamMessage::Result { action_id: "a1".into(), value: result }).await.unwrap();
        stream.close(exec_id, "a1").await.unwrap();

        let records = stream.list(exec_id).await.unwrap();
        assert_eq!(records.len(), 3);
        assert!(matches!(records[0], StreamMessage::Log { .. }));
        assert!(records[1].is_result());
        assert!(matches!(records[2], StreamMessage::Closed { .. }));
    }

    #[tokio::test]
    #[ignore]
    async fn result_lookup_supports_checkpoint_resume() {
        let Some(pool) = pool().await else { return };
        let stream = EventStream::new(pool);
        let exec_id = ExecId::new();

        assert!(stream.result(exec_id, "a1").await.unwrap().is_none());

        let mut value = ResultMap::new();
        value.insert("out".into(), "ok".into());
        stream.checkpoint(exec_id, StreamMessage::Result { action_id: "a1".into(), value: value.clone() }).await.unwrap();

        let resumed = stream.result(exec_id, "a1").await.unwrap().unwrap();
        assert_eq!(resumed, value);
    }

    #[tokio::test]
    #[ignore]
    async fn subscriber_receives_checkpoints_written_after_it_subscribes() {
        let Some(pool) = pool().await else { return };
        let stream = EventStream::new(pool);
        let exec_id = ExecId::new();

        let mut rx = stream.subscribe(exec_id).await;
        stream.write(exec_id, "a1", b"hi\n".to_vec()).await.unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received.action_id(), "a1");
    }
}
