use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum WorkspaceRole {
    Owner,
    Admin,
    Member,
}

impl WorkspaceRole {
    /// Roles allowed to administer the workspace (invite, update, remove).
    pub fn is_admin(self) -> bool {
        matches!(self, WorkspaceRole::Owner | WorkspaceRole::Admin)
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct WorkspaceMember {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub user_id: Uuid,
    pub role: WorkspaceRole,
    pub invited_by: Uuid,
    pub is_active: bool,
    pub joined_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Member row joined with the user it points at, for member listings.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MemberWithUser {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub user_id: Uuid,
    pub role: WorkspaceRole,
    pub is_active: bool,
    pub joined_at: DateTime<Utc>,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

const MEMBER_COLUMNS: &str =
    "id, workspace_id, user_id, role, invited_by, is_active, joined_at, updated_at";

impl WorkspaceMember {
    pub async fn create<'e, E>(
        executor: E,
        id: Uuid,
        workspace_id: Uuid,
        user_id: Uuid,
        role: WorkspaceRole,
        invited_by: Uuid,
    ) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, WorkspaceMember>(&format!(
            "INSERT INTO workspace_members (id, workspace_id, user_id, role, invited_by, is_active)
             VALUES ($1, $2, $3, $4, $5, 1)
             RETURNING {MEMBER_COLUMNS}"
        ))
        .bind(id)
        .bind(workspace_id)
        .bind(user_id)
        .bind(role)
        .bind(invited_by)
        .fetch_one(executor)
        .await
    }

    /// Active membership for the (workspace, user) pair. The gate for nearly
    /// every authorization decision in the board services.
    pub async fn find_active(
        pool: &SqlitePool,
        workspace_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, WorkspaceMember>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM workspace_members
             WHERE workspace_id = $1 AND user_id = $2 AND is_active = 1"
        ))
        .bind(workspace_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// Membership regardless of active flag, for invite reactivation.
    pub async fn find_pair(
        pool: &SqlitePool,
        workspace_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, WorkspaceMember>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM workspace_members
             WHERE workspace_id = $1 AND user_id = $2"
        ))
        .bind(workspace_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_id(
        pool: &SqlitePool,
        id: Uuid,
        workspace_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, WorkspaceMember>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM workspace_members WHERE id = $1 AND workspace_id = $2"
        ))
        .bind(id)
        .bind(workspace_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn list_active(
        pool: &SqlitePool,
        workspace_id: Uuid,
    ) -> Result<Vec<MemberWithUser>, sqlx::Error> {
        sqlx::query_as::<_, MemberWithUser>(
            "SELECT m.id, m.workspace_id, m.user_id, m.role, m.is_active, m.joined_at,
                    u.email, u.first_name, u.last_name
             FROM workspace_members m
             JOIN users u ON u.id = m.user_id
             WHERE m.workspace_id = $1 AND m.is_active = 1
             ORDER BY m.joined_at ASC",
        )
        .bind(workspace_id)
        .fetch_all(pool)
        .await
    }

    pub async fn update_role(
        pool: &SqlitePool,
        id: Uuid,
        role: WorkspaceRole,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, WorkspaceMember>(&format!(
            "UPDATE workspace_members
             SET role = $2, updated_at = CURRENT_TIMESTAMP
             WHERE id = $1
             RETURNING {MEMBER_COLUMNS}"
        ))
        .bind(id)
        .bind(role)
        .fetch_one(pool)
        .await
    }

    pub async fn reactivate(
        pool: &SqlitePool,
        id: Uuid,
        role: WorkspaceRole,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, WorkspaceMember>(&format!(
            "UPDATE workspace_members
             SET is_active = 1, role = $2, updated_at = CURRENT_TIMESTAMP
             WHERE id = $1
             RETURNING {MEMBER_COLUMNS}"
        ))
        .bind(id)
        .bind(role)
        .fetch_one(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM workspace_members WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
