//! PostgreSQL implementation of the UserStore port.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::foundation::{ChatId, Timestamp, UserId};
use crate::domain::subscription::{Entitlement, NewUserRecord, UserRecord};
use crate::ports::{StoreError, UserStore};

/// sqlx-backed user store.
///
/// The entitlement is a single nullable `expires_at` column rather than a
/// JSON blob: one value object, one column, and clearing it is a plain
/// `NULL` write.
///
/// Every query runs under `statement_timeout`, so a stalled connection
/// surfaces as `StoreError::Timeout` instead of suspending the caller; the
/// reconciler relies on this to keep a pass from hanging on one hung call.
pub struct PostgresUserStore {
    pool: PgPool,
    statement_timeout: Duration,
}

impl PostgresUserStore {
    pub fn new(pool: PgPool, statement_timeout: Duration) -> Self {
        Self {
            pool,
            statement_timeout,
        }
    }
}

/// Bounds a query future, mapping an elapsed deadline to `StoreError::Timeout`.
async fn with_deadline<T>(
    deadline: Duration,
    query: impl Future<Output = Result<T, sqlx::Error>>,
) -> Result<T, StoreError> {
    match tokio::time::timeout(deadline, query).await {
        Ok(result) => result.map_err(map_sqlx_error),
        Err(_) => Err(StoreError::Timeout),
    }
}

/// Database row representation of a user.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    chat_id: i64,
    user_id: i64,
    full_name: String,
    username: String,
    email: Option<String>,
    banned: bool,
    in_group: bool,
    lang: String,
    entitlement_expires_at: Option<DateTime<Utc>>,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        UserRecord {
            chat_id: ChatId::new(row.chat_id),
            user_id: UserId::new(row.user_id),
            full_name: row.full_name,
            username: row.username,
            email: row.email,
            banned: row.banned,
            in_group: row.in_group,
            lang: row.lang,
            entitlement: row
                .entitlement_expires_at
                .map(|dt| Entitlement::new(Timestamp::from_datetime(dt))),
        }
    }
}

fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::PoolTimedOut => StoreError::Timeout,
        other => StoreError::Database(other.to_string()),
    }
}

const SELECT_COLUMNS: &str = "chat_id, user_id, full_name, username, email, banned, in_group, lang, entitlement_expires_at";

#[async_trait]
impl UserStore for PostgresUserStore {
    async fn find_by_id(&self, user_id: UserId) -> Result<Option<UserRecord>, StoreError> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM users WHERE user_id = $1");
        let query = sqlx::query_as(&sql)
            .bind(user_id.as_i64())
            .fetch_optional(&self.pool);
        let row: Option<UserRow> = with_deadline(self.statement_timeout, query).await?;
        Ok(row.map(UserRecord::from))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM users WHERE email = $1");
        let query = sqlx::query_as(&sql)
            .bind(email)
            .fetch_optional(&self.pool);
        let row: Option<UserRow> = with_deadline(self.statement_timeout, query).await?;
        Ok(row.map(UserRecord::from))
    }

    async fn set_entitlement(
        &self,
        user_id: UserId,
        entitlement: Option<Entitlement>,
    ) -> Result<(), StoreError> {
        let query = sqlx::query("UPDATE users SET entitlement_expires_at = $2 WHERE user_id = $1")
            .bind(user_id.as_i64())
            .bind(entitlement.map(|e| *e.expires_at.as_datetime()))
            .execute(&self.pool);
        with_deadline(self.statement_timeout, query).await?;
        Ok(())
    }

    async fn set_in_group(&self, user_id: UserId, in_group: bool) -> Result<(), StoreError> {
        let query = sqlx::query("UPDATE users SET in_group = $2 WHERE user_id = $1")
            .bind(user_id.as_i64())
            .bind(in_group)
            .execute(&self.pool);
        with_deadline(self.statement_timeout, query).await?;
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<UserRecord>, StoreError> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM users");
        let query = sqlx::query_as(&sql).fetch_all(&self.pool);
        let rows: Vec<UserRow> = with_deadline(self.statement_timeout, query).await?;
        Ok(rows.into_iter().map(UserRecord::from).collect())
    }

    async fn create(&self, fields: NewUserRecord) -> Result<UserRecord, StoreError> {
        let sql = format!(
            "INSERT INTO users (chat_id, user_id, full_name, username, banned, in_group, lang) \
             VALUES ($1, $2, $3, $4, false, false, $5) \
             RETURNING {SELECT_COLUMNS}"
        );
        let query = sqlx::query_as(&sql)
            .bind(fields.chat_id.as_i64())
            .bind(fields.user_id.as_i64())
            .bind(&fields.full_name)
            .bind(&fields.username)
            .bind(&fields.lang)
            .fetch_one(&self.pool);
        let row: UserRow = with_deadline(self.statement_timeout, query).await?;
        Ok(UserRecord::from(row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_without_expiry_maps_to_no_entitlement() {
        let row = UserRow {
            chat_id: 1,
            user_id: 2,
            full_name: "A".to_string(),
            username: "a".to_string(),
            email: None,
            banned: false,
            in_group: true,
            lang: "en".to_string(),
            entitlement_expires_at: None,
        };
        let rec = UserRecord::from(row);
        assert!(rec.entitlement.is_none());
        assert!(rec.in_group);
    }

    #[test]
    fn row_with_expiry_maps_to_entitlement() {
        let dt = Utc::now();
        let row = UserRow {
            chat_id: 1,
            user_id: 2,
            full_name: "A".to_string(),
            username: "a".to_string(),
            email: Some("a@x.com".to_string()),
            banned: false,
            in_group: false,
            lang: "en".to_string(),
            entitlement_expires_at: Some(dt),
        };
        let rec = UserRecord::from(row);
        assert_eq!(
            rec.entitlement.unwrap().expires_at,
            Timestamp::from_datetime(dt)
        );
    }

    #[tokio::test]
    async fn hung_query_surfaces_as_timeout() {
        let never = std::future::pending::<Result<(), sqlx::Error>>();
        let result = with_deadline(Duration::from_millis(10), never).await;
        assert!(matches!(result, Err(StoreError::Timeout)));
    }

    #[tokio::test]
    async fn completed_query_error_maps_through() {
        let failed = std::future::ready(Err::<(), _>(sqlx::Error::PoolTimedOut));
        let result = with_deadline(Duration::from_secs(1), failed).await;
        assert!(matches!(result, Err(StoreError::Timeout)));

        let ok = std::future::ready(Ok::<_, sqlx::Error>(7));
        assert_eq!(with_deadline(Duration::from_secs(1), ok).await.unwrap(), 7);
    }
}
