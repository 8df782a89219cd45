use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::entity::prelude::*;

use super::model::PendingEvent;

/// Sea-ORM Entity for the pending_user_events table
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "pending_user_events")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub title: String,
    pub email: String,
    pub created_at: DateTimeWithTimeZone,
    pub retry_count: i32,
    pub processed: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for PendingEvent {
    fn from(model: Model) -> Self {
        Self {
            id: Some(model.id),
            title: model.title,
            email: model.email,
            created_at: model.created_at.into(),
            retry_count: model.retry_count,
            processed: model.processed,
        }
    }
}

/// Insert shape; the row id is left to the sequence.
impl From<&PendingEvent> for ActiveModel {
    fn from(event: &PendingEvent) -> Self {
        ActiveModel {
            id: NotSet,
            title: Set(event.title.clone()),
            email: Set(event.email.clone()),
            created_at: Set(event.created_at.into()),
            retry_count: Set(event.retry_count),
            processed: Set(event.processed),
        }
    }
}
