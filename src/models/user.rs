use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "user" => Some(Role::User),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub role: Role,
    pub email_notifications: bool,
    pub sms_notifications: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub role: Role,
}

/// Self-service profile fields. Anything else in the request body is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub email_notifications: Option<bool>,
    pub sms_notifications: Option<bool>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.phone.is_none()
            && self.email_notifications.is_none()
            && self.sms_notifications.is_none()
    }
}

const USER_COLUMNS: &str = "id, email, password, first_name, last_name, phone, role, \
     email_notifications, sms_notifications, created_at, updated_at";

impl User {
    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"))
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_all(pool: &SqlitePool) -> Result<Vec<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(pool)
        .await
    }

    pub async fn create(pool: &SqlitePool, new: NewUser<'_>) -> Result<User, sqlx::Error> {
        let now = Utc::now();
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO users (email, password, first_name, last_name, phone, role, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING id",
        )
        .bind(new.email)
        .bind(new.password_hash)
        .bind(new.first_name)
        .bind(new.last_name)
        .bind(new.phone)
        .bind(new.role)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await?;

        Self::find_by_id(pool, id).await?.ok_or(sqlx::Error::RowNotFound)
    }

    /// Applies the non-empty fields of `update`. Returns `None` if the user is gone.
    pub async fn update_profile(
        pool: &SqlitePool,
        id: i64,
        update: &ProfileUpdate,
    ) -> Result<Option<User>, sqlx::Error> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE users SET updated_at = ");
        qb.push_bind(Utc::now());
        if let Some(v) = &update.first_name {
            qb.push(", first_name = ").push_bind(v);
        }
        if let Some(v) = &update.last_name {
            qb.push(", last_name = ").push_bind(v);
        }
        if let Some(v) = &update.phone {
            qb.push(", phone = ").push_bind(v);
        }
        if let Some(v) = update.email_notifications {
            qb.push(", email_notifications = ").push_bind(v);
        }
        if let Some(v) = update.sms_notifications {
            qb.push(", sms_notifications = ").push_bind(v);
        }
        qb.push(" WHERE id = ").push_bind(id);
        qb.build().execute(pool).await?;

        Self::find_by_id(pool, id).await
    }

    pub async fn set_role(pool: &SqlitePool, id: i64, role: Role) -> Result<Option<User>, sqlx::Error> {
        let affected = sqlx::query("UPDATE users SET role = ?, updated_at = ? WHERE id = ?")
            .bind(role)
            .bind(Utc::now())
            .bind(id)
            .execute(pool)
            .await?
            .rows_affected();
        if affected == 0 {
            return Ok(None);
        }
        Self::find_by_id(pool, id).await
    }

    pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count(pool: &SqlitePool, role: Option<Role>) -> Result<i64, sqlx::Error> {
        match role {
            Some(role) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = ?")
                    .bind(role)
                    .fetch_one(pool)
                    .await
            }
            None => sqlx::query_scalar("SELECT COUNT(*) FROM users").fetch_one(pool).await,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
