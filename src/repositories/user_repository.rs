use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    SqlErr,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::observe;
use crate::entities::user::{self, Entity as User, Model as UserModel};
use crate::errors::ServiceError;
use crate::repositories::{BaseRepository, Repository};

pub const DUPLICATE_USERNAME: &str = "Username already exists";

/// Repository for stored credentials
#[derive(Debug, Clone)]
pub struct UserRepository {
    base: BaseRepository,
}

impl UserRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Exact, case-sensitive lookup
    pub async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserModel>, ServiceError> {
        observe("user.find_by_username", async move {
            let user = User::find()
                .filter(user::Column::Username.eq(username))
                .one(self.base.get_db())
                .await?;
            Ok::<_, ServiceError>(user)
        })
        .await
    }

    /// Inserts a user; a clash on the unique username index is a validation failure.
    pub async fn insert(
        &self,
        username: &str,
        password_hash: String,
        role: &str,
    ) -> Result<UserModel, ServiceError> {
        observe("user.insert", async move {
            user::ActiveModel {
                id: Set(Uuid::new_v4()),
                username: Set(username.to_string()),
                password_hash: Set(password_hash),
                role: Set(role.to_string()),
                created_at: Set(Utc::now()),
            }
            .insert(self.base.get_db())
            .await
            .map_err(|err: DbErr| match err.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    ServiceError::ValidationError(DUPLICATE_USERNAME.to_string())
                }
                _ => ServiceError::DatabaseError(err),
            })
        })
        .await
    }
}
