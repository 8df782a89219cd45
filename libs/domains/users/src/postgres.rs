use async_trait::async_trait;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryOrder, QuerySelect,
    SqlErr, TransactionTrait,
};
use validator::Validate;

use crate::{
    entity,
    error::{UserError, UserResult},
    models::{NewUser, UpdateUser, User},
    repository::UserRepository,
};

#[derive(Clone)]
pub struct PgUserRepository {
    db: DatabaseConnection,
}

impl PgUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// Unique-index violations on `users.email` become `DuplicateEmail`; the rest
/// pass through as internal errors.
fn map_write_error(err: DbErr, email: &str) -> UserError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            tracing::debug!(%email, %detail, "Unique constraint violated");
            UserError::DuplicateEmail(email.to_string())
        }
        _ => UserError::Internal(err.to_string()),
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, input: NewUser) -> UserResult<User> {
        let email = input.email.clone();
        let active_model: entity::ActiveModel = input.into();

        let model = active_model
            .insert(&self.db)
            .await
            .map_err(|e| map_write_error(e, &email))?;

        tracing::info!(user_id = %model.id, email = %model.email, "Created user");
        Ok(model.into())
    }

    async fn get_by_id(&self, id: i64) -> UserResult<Option<User>> {
        let model = entity::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(Into::into))
    }

    async fn get_by_email(&self, email: &str) -> UserResult<Option<User>> {
        use sea_orm::{ColumnTrait, QueryFilter};

        let model = entity::Entity::find()
            .filter(entity::Column::Email.eq(email))
            .one(&self.db)
            .await?;
        Ok(model.map(Into::into))
    }

    async fn list(&self) -> UserResult<Vec<User>> {
        let models = entity::Entity::find()
            .order_by_asc(entity::Column::Id)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn update(&self, id: i64, input: UpdateUser) -> UserResult<User> {
        let txn = self.db.begin().await?;

        let model = entity::Entity::find_by_id(id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(UserError::NotFound(id))?;

        let mut user: User = model.clone().into();
        user.apply_update(input);
        user.validate()?;

        let mut active_model: entity::ActiveModel = model.into();
        active_model.email = Set(user.email.clone());
        active_model.name = Set(user.name.clone());
        active_model.age = Set(user.age);

        let updated = active_model
            .update(&txn)
            .await
            .map_err(|e| map_write_error(e, &user.email))?;

        // An early return above drops `txn`, which rolls it back
        txn.commit().await?;

        tracing::info!(user_id = %id, "Updated user");
        Ok(updated.into())
    }

    async fn delete(&self, id: i64) -> UserResult<Option<User>> {
        let txn = self.db.begin().await?;

        let Some(model) = entity::Entity::find_by_id(id).lock_exclusive().one(&txn).await? else {
            return Ok(None);
        };

        entity::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        tracing::info!(user_id = %id, "Deleted user");
        Ok(Some(model.into()))
    }

    async fn count(&self) -> UserResult<u64> {
        Ok(entity::Entity::find().count(&self.db).await?)
    }
}
