//! Message persistence.

use sqlx::{SqliteConnection, SqlitePool};

use crate::models::{MessageRecord, MessageSummary};
use crate::Result;

/// Insert a record unless a row with the same id exists.
///
/// Runs on the caller's connection so several inserts can share one
/// transaction. Returns whether a row was written. Only the id conflict is
/// ignored; every other constraint failure is returned as an error.
pub async fn insert_ignore(conn: &mut SqliteConnection, record: &MessageRecord) -> Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO messages (id, "from", "to", content, media_data, media_filename, timestamp)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO NOTHING
        "#,
    )
    .bind(&record.id)
    .bind(&record.sender)
    .bind(&record.recipient)
    .bind(&record.content)
    .bind(&record.media_data)
    .bind(&record.media_filename)
    .bind(record.timestamp)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Insert records in a single transaction. Returns the number of new rows.
///
/// If any insert fails the whole batch is rolled back.
pub async fn insert_batch(pool: &SqlitePool, records: &[MessageRecord]) -> Result<u64> {
    let mut tx = pool.begin().await?;
    let mut inserted = 0;

    for record in records {
        if insert_ignore(&mut tx, record).await? {
            inserted += 1;
        }
    }

    tx.commit().await?;
    Ok(inserted)
}

/// Get a single message, including its media payload.
pub async fn get_message(pool: &SqlitePool, id: &str) -> Result<Option<MessageRecord>> {
    let record = sqlx::query_as::<_, MessageRecord>(
        r#"
        SELECT id, "from", "to", content, media_data, media_filename, timestamp
        FROM messages
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(record)
}

/// List the newest `limit` messages, newest first.
pub async fn list_recent(pool: &SqlitePool, limit: i64) -> Result<Vec<MessageSummary>> {
    let rows = sqlx::query_as::<_, MessageSummary>(
        r#"
        SELECT id, "from", "to", content, media_filename, timestamp
        FROM messages
        ORDER BY timestamp DESC, id ASC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Count cached messages.
pub async fn count_messages(pool: &SqlitePool) -> Result<i64> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM messages")
        .fetch_one(pool)
        .await?;

    Ok(count.0)
}

/// Delete every cached message. Returns the number of rows removed.
pub async fn purge_all(pool: &SqlitePool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM messages").execute(pool).await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    async fn test_db() -> Database {
        let db = Database::in_memory().await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    fn media(id: &str, ts: i64) -> MessageRecord {
        MessageRecord {
            id: id.to_string(),
            sender: "491701111111".to_string(),
            recipient: "491511234567".to_string(),
            content: None,
            media_data: Some("aGVsbG8=".to_string()),
            media_filename: Some(format!("{}.jpg", id)),
            timestamp: ts,
        }
    }

    #[tokio::test]
    async fn test_insert_ignore_keeps_first_row() {
        let db = test_db().await;
        let mut conn = db.pool().acquire().await.unwrap();

        let first = MessageRecord::text("M1", "4917", "4915", "first", 100);
        let second = MessageRecord::text("M1", "4917", "4915", "second", 200);

        assert!(insert_ignore(&mut conn, &first).await.unwrap());
        assert!(!insert_ignore(&mut conn, &second).await.unwrap());
        drop(conn);

        let stored = get_message(db.pool(), "M1").await.unwrap().unwrap();
        assert_eq!(stored, first);
        assert_eq!(count_messages(db.pool()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_insert_batch_counts_new_rows() {
        let db = test_db().await;

        let batch = vec![
            MessageRecord::text("A", "4917", "4915", "a", 1),
            MessageRecord::text("B", "4917", "4915", "b", 2),
            MessageRecord::text("A", "4917", "4915", "dup", 3),
        ];
        assert_eq!(insert_batch(db.pool(), &batch).await.unwrap(), 2);
        assert_eq!(insert_batch(db.pool(), &batch).await.unwrap(), 0);
        assert_eq!(count_messages(db.pool()).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_dropped_transaction_rolls_back() {
        let db = test_db().await;

        {
            let mut tx = db.begin().await.unwrap();
            insert_ignore(&mut tx, &MessageRecord::text("A", "1", "2", "x", 1))
                .await
                .unwrap();
        }

        assert_eq!(count_messages(db.pool()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_list_recent_orders_and_limits() {
        let db = test_db().await;
        let batch = vec![
            MessageRecord::text("old", "4917", "4915", "old", 100),
            media("new", 300),
            MessageRecord::text("mid", "4917", "4915", "mid", 200),
        ];
        insert_batch(db.pool(), &batch).await.unwrap();

        let all = list_recent(db.pool(), 10).await.unwrap();
        let ids: Vec<_> = all.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
        assert_eq!(all[0].media_filename.as_deref(), Some("new.jpg"));

        let two = list_recent(db.pool(), 2).await.unwrap();
        assert_eq!(two.len(), 2);
        assert_eq!(two[1].id, "mid");
    }

    #[tokio::test]
    async fn test_summary_serializes_from_and_to() {
        let db = test_db().await;
        insert_batch(db.pool(), &[MessageRecord::text("A", "4917", "4915", "hi", 5)])
            .await
            .unwrap();

        let rows = list_recent(db.pool(), 1).await.unwrap();
        let json = serde_json::to_value(&rows[0]).unwrap();
        assert_eq!(json["from"], "4917");
        assert_eq!(json["to"], "4915");
        assert!(json.get("media_data").is_none());
    }

    #[tokio::test]
    async fn test_purge_all() {
        let db = test_db().await;
        insert_batch(db.pool(), &[media("A", 1), media("B", 2)])
            .await
            .unwrap();

        assert_eq!(purge_all(db.pool()).await.unwrap(), 2);
        assert_eq!(count_messages(db.pool()).await.unwrap(), 0);
        assert!(get_message(db.pool(), "A").await.unwrap().is_none());
    }
}
