use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::repo_types::User;

impl User {
    /// Find a user by email.
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, first_name, last_name, email, password_hash,
                   is_confirmed, confirm_otp, status, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Find a user by primary key.
    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, first_name, last_name, email, password_hash,
                   is_confirmed, confirm_otp, status, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Insert a new unconfirmed user with a pending confirmation code.
    /// A duplicate email surfaces the unique-constraint violation to the
    /// caller (see [`is_unique_violation`]).
    pub async fn create(
        db: &PgPool,
        first_name: &str,
        last_name: &str,
        email: &str,
        password_hash: &str,
        confirm_otp: i32,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (first_name, last_name, email, password_hash, is_confirmed, confirm_otp)
            VALUES ($1, $2, $3, $4, FALSE, $5)
            RETURNING id, first_name, last_name, email, password_hash,
                      is_confirmed, confirm_otp, status, created_at
            "#,
        )
        .bind(first_name)
        .bind(last_name)
        .bind(email)
        .bind(password_hash)
        .bind(confirm_otp)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    /// Mark the user confirmed and clear the pending code.
    pub async fn confirm(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET is_confirmed = TRUE, confirm_otp = NULL
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Store a freshly issued code and drop the user back to unconfirmed.
    pub async fn reset_otp(db: &PgPool, id: Uuid, confirm_otp: i32) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET is_confirmed = FALSE, confirm_otp = $2
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(confirm_otp)
        .execute(db)
        .await?;
        Ok(())
    }
}

/// True when the underlying database error is a unique-constraint violation,
/// i.e. two registrations raced for the same email address.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_violation_is_detected() {
        assert!(is_unique_violation(&test_support::duplicate_key_error()));
    }

    #[test]
    fn non_database_errors_are_not_unique_violations() {
        assert!(!is_unique_violation(&anyhow::anyhow!("connection reset")));
        assert!(!is_unique_violation(&anyhow::Error::from(
            sqlx::Error::RowNotFound
        )));
    }
}
