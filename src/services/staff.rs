use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::policy::StaffGroup;
use crate::entities::{user, user_role, User, UserModel, UserRole};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

/// Staff group membership management (manager and delivery-crew roles).
#[derive(Clone)]
pub struct StaffService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl StaffService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Members of the group, ordered by username.
    pub async fn list_members(&self, group: StaffGroup) -> Result<Vec<UserModel>, ServiceError> {
        let member_ids: Vec<Uuid> = UserRole::find()
            .filter(user_role::Column::Role.eq(group.role_name()))
            .select_only()
            .column(user_role::Column::UserId)
            .into_tuple()
            .all(&*self.db)
            .await?;

        if member_ids.is_empty() {
            return Ok(Vec::new());
        }

        let members = User::find()
            .filter(user::Column::Id.is_in(member_ids))
            .order_by_asc(user::Column::Username)
            .all(&*self.db)
            .await?;

        Ok(members)
    }

    /// Grants the group's role to the named user. Adding an existing
    /// member is a no-op success.
    #[instrument(skip(self), fields(group = %group, username = %username))]
    pub async fn add_member(
        &self,
        group: StaffGroup,
        username: &str,
    ) -> Result<UserModel, ServiceError> {
        let account = self.find_by_username(username).await?;

        let membership = user_role::ActiveModel {
            user_id: Set(account.id),
            role: Set(group.role_name().to_string()),
        };

        match membership.insert(&*self.db).await {
            Ok(_) => {
                self.event_sender
                    .send_or_log(Event::RoleGranted {
                        user_id: account.id,
                        role: group.role_name().to_string(),
                    })
                    .await;
                info!(user_id = %account.id, "Added user to group");
            }
            // A concurrent or repeated add hits the composite key; the
            // membership already holds, so report success.
            Err(e) if matches!(e.sql_err(), Some(sea_orm::SqlErr::UniqueConstraintViolation(_))) => {
            }
            Err(e) => return Err(ServiceError::DatabaseError(e)),
        }

        Ok(account)
    }

    /// Revokes the group's role from the named user. Removing a
    /// non-member is a no-op success.
    #[instrument(skip(self), fields(group = %group, username = %username))]
    pub async fn remove_member(
        &self,
        group: StaffGroup,
        username: &str,
    ) -> Result<UserModel, ServiceError> {
        let account = self.find_by_username(username).await?;

        let result = UserRole::delete_many()
            .filter(user_role::Column::UserId.eq(account.id))
            .filter(user_role::Column::Role.eq(group.role_name()))
            .exec(&*self.db)
            .await?;

        if result.rows_affected > 0 {
            self.event_sender
                .send_or_log(Event::RoleRevoked {
                    user_id: account.id,
                    role: group.role_name().to_string(),
                })
                .await;
            info!(user_id = %account.id, "Removed user from group");
        }

        Ok(account)
    }

    async fn find_by_username(&self, username: &str) -> Result<UserModel, ServiceError> {
        User::find()
            .filter(user::Column::Username.eq(username))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("user '{username}' not found")))
    }
}

/// Body for group add/remove requests. The username is mandatory; a
/// missing or blank value is a validation error, not a silent no-op.
#[derive(Debug, Deserialize)]
pub struct GroupMemberInput {
    pub username: Option<String>,
}

impl GroupMemberInput {
    pub fn username(&self) -> Result<&str, ServiceError> {
        match self.username.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => Ok(name),
            _ => Err(ServiceError::ValidationError(
                "username is required".to_string(),
            )),
        }
    }
}
