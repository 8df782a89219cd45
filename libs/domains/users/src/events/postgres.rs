use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, ExprTrait};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

use super::entity::{self, Column, Entity};
use super::error::{EventError, EventResult};
use super::model::PendingEvent;
use super::store::PendingEventStore;

#[derive(Clone)]
pub struct PgPendingEventStore {
    db: DatabaseConnection,
}

impl PgPendingEventStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PendingEventStore for PgPendingEventStore {
    async fn save(&self, event: PendingEvent) -> EventResult<PendingEvent> {
        let Some(id) = event.id else {
            let model = entity::ActiveModel::from(&event).insert(&self.db).await?;
            tracing::debug!(event_id = model.id, title = %model.title, email = %model.email, "Stored pending event");
            return Ok(model.into());
        };

        let result = Entity::update_many()
            .col_expr(Column::RetryCount, Expr::value(event.retry_count))
            .col_expr(Column::Processed, Expr::value(event.processed))
            .filter(Column::Id.eq(id))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(EventError::Storage(format!("Pending event not found: {id}")));
        }
        Ok(event)
    }

    async fn find_retryable(&self, max_retries: i32) -> EventResult<Vec<PendingEvent>> {
        let models = Entity::find()
            .filter(Column::Processed.eq(false))
            .filter(Column::RetryCount.lt(max_retries))
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn mark_processed(&self, id: i64) -> EventResult<bool> {
        let result = Entity::update_many()
            .col_expr(Column::Processed, Expr::value(true))
            .filter(Column::Id.eq(id))
            .filter(Column::Processed.eq(false))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected == 1)
    }

    async fn record_failed_attempt(&self, id: i64, seen_retry_count: i32) -> EventResult<bool> {
        let result = Entity::update_many()
            .col_expr(Column::RetryCount, Expr::col(Column::RetryCount).add(1))
            .filter(Column::Id.eq(id))
            .filter(Column::Processed.eq(false))
            .filter(Column::RetryCount.eq(seen_retry_count))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected == 1)
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> EventResult<u64> {
        let result = Entity::delete_many()
            .filter(Column::CreatedAt.lt(cutoff))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::model::UserEvent;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn exec(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    fn row(id: i64, retry_count: i32) -> entity::Model {
        entity::Model {
            id,
            title: "CREATED".to_string(),
            email: "ada@example.com".to_string(),
            created_at: Utc::now().into(),
            retry_count,
            processed: false,
        }
    }

    #[tokio::test]
    async fn test_save_new_returns_assigned_id() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![row(42, 0)]])
            .into_connection();
        let store = PgPendingEventStore::new(db);

        let saved = store
            .save(PendingEvent::new(&UserEvent::created("ada@example.com")))
            .await
            .unwrap();
        assert_eq!(saved.id, Some(42));
    }

    #[tokio::test]
    async fn test_save_missing_row_is_storage_error() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([exec(0)])
            .into_connection();
        let store = PgPendingEventStore::new(db);

        let mut event = PendingEvent::new(&UserEvent::created("ada@example.com"));
        event.id = Some(7);
        assert!(matches!(store.save(event).await, Err(EventError::Storage(_))));
    }

    #[tokio::test]
    async fn test_conditional_updates_report_rows_changed() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([exec(1), exec(0), exec(1)])
            .into_connection();
        let store = PgPendingEventStore::new(db);

        assert!(store.record_failed_attempt(1, 0).await.unwrap());
        assert!(!store.record_failed_attempt(1, 0).await.unwrap());
        assert!(store.mark_processed(1).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_older_than_counts_rows() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([exec(3)])
            .into_connection();
        let store = PgPendingEventStore::new(db);

        assert_eq!(store.delete_older_than(Utc::now()).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_find_retryable_maps_rows() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![row(1, 0), row(2, 4)]])
            .into_connection();
        let store = PgPendingEventStore::new(db);

        let events = store.find_retryable(5).await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].retry_count, 4);
    }
}
