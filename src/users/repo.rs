use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
    Owner,
}

/// A user record. The password hash and reset-token fields never leave
/// the server: they are skipped on serialization.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: Role,
    pub verified: bool,
    pub approved: bool,
    pub password_changed_at: Option<OffsetDateTime>,
    #[serde(skip_serializing, default)]
    pub password_reset_token: Option<String>,
    #[serde(skip_serializing, default)]
    pub password_reset_expires: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

impl User {
    /// True when the password was changed after the given token
    /// issued-at timestamp (both in whole seconds).
    pub fn changed_password_after(&self, token_iat: i64) -> bool {
        match self.password_changed_at {
            Some(changed_at) => token_iat < changed_at.unix_timestamp(),
            None => false,
        }
    }

    pub async fn count_all(db: &PgPool) -> anyhow::Result<i64> {
        let (count,): (i64,) = sqlx::query_as(r#"SELECT COUNT(*) FROM users"#)
            .fetch_one(db)
            .await?;
        Ok(count)
    }

    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, first_name, last_name, email, password_hash, role, verified, approved,
                   password_changed_at, password_reset_token, password_reset_expires, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, first_name, last_name, email, password_hash, role, verified, approved,
                   password_changed_at, password_reset_token, password_reset_expires, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Look up a user by hashed reset token; the expiry filter lives in
    /// the query so an expired token can never match.
    pub async fn find_by_reset_token(db: &PgPool, token_hash: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, first_name, last_name, email, password_hash, role, verified, approved,
                   password_changed_at, password_reset_token, password_reset_expires, created_at
            FROM users
            WHERE password_reset_token = $1 AND password_reset_expires > now()
            "#,
        )
        .bind(token_hash)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn create(
        db: &PgPool,
        first_name: &str,
        last_name: &str,
        email: &str,
        password_hash: &str,
        role: Role,
        approved: bool,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (first_name, last_name, email, password_hash, role, verified, approved)
            VALUES ($1, $2, $3, $4, $5, FALSE, $6)
            RETURNING id, first_name, last_name, email, password_hash, role, verified, approved,
                      password_changed_at, password_reset_token, password_reset_expires, created_at
            "#,
        )
        .bind(first_name)
        .bind(last_name)
        .bind(email)
        .bind(password_hash)
        .bind(role)
        .bind(approved)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    /// Removes an abandoned signup so the email can be registered again.
    pub async fn delete_unverified_by_email(db: &PgPool, email: &str) -> anyhow::Result<()> {
        sqlx::query(r#"DELETE FROM users WHERE email = $1 AND verified = FALSE"#)
            .bind(email)
            .execute(db)
            .await?;
        Ok(())
    }

    pub async fn set_reset_token(
        db: &PgPool,
        id: Uuid,
        token_hash: &str,
        expires_at: OffsetDateTime,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET password_reset_token = $2, password_reset_expires = $3
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(token_hash)
        .bind(expires_at)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Marks the account verified and consumes the reset token in the
    /// same statement, so a second presentation of the token finds
    /// nothing.
    pub async fn mark_verified(db: &PgPool, id: Uuid) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET verified = TRUE, password_reset_token = NULL, password_reset_expires = NULL
            WHERE id = $1
            RETURNING id, first_name, last_name, email, password_hash, role, verified, approved,
                      password_changed_at, password_reset_token, password_reset_expires, created_at
            "#,
        )
        .bind(id)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    /// Stores a new password hash, stamps `password_changed_at` (which
    /// invalidates session tokens issued earlier) and consumes any
    /// outstanding reset token.
    pub async fn update_password(db: &PgPool, id: Uuid, password_hash: &str) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET password_hash = $2, password_changed_at = now(),
                password_reset_token = NULL, password_reset_expires = NULL
            WHERE id = $1
            RETURNING id, first_name, last_name, email, password_hash, role, verified, approved,
                      password_changed_at, password_reset_token, password_reset_expires, created_at
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    pub async fn set_approved(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET approved = TRUE
            WHERE id = $1
            RETURNING id, first_name, last_name, email, password_hash, role, verified, approved,
                      password_changed_at, password_reset_token, password_reset_expires, created_at
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn list_all(db: &PgPool) -> anyhow::Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, first_name, last_name, email, password_hash, role, verified, approved,
                   password_changed_at, password_reset_token, password_reset_expires, created_at
            FROM users
            ORDER BY created_at
            "#,
        )
        .fetch_all(db)
        .await?;
        Ok(users)
    }

    pub async fn update_profile(
        db: &PgPool,
        id: Uuid,
        first_name: Option<&str>,
        last_name: Option<&str>,
        email: Option<&str>,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                email = COALESCE($4, email)
            WHERE id = $1
            RETURNING id, first_name, last_name, email, password_hash, role, verified, approved,
                      password_changed_at, password_reset_token, password_reset_expires, created_at
            "#,
        )
        .bind(id)
        .bind(first_name)
        .bind(last_name)
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn delete_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query(r#"DELETE FROM users WHERE id = $1"#)
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn sample_user(password_changed_at: Option<OffsetDateTime>) -> User {
        User {
            id: Uuid::new_v4(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            password_hash: "$argon2id$fake".into(),
            role: Role::User,
            verified: true,
            approved: true,
            password_changed_at,
            password_reset_token: None,
            password_reset_expires: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn serialization_hides_credentials() {
        let mut user = sample_user(None);
        user.password_reset_token = Some("deadbeef".into());
        user.password_reset_expires = Some(OffsetDateTime::now_utc());
        let json = serde_json::to_string(&user).expect("serialize");
        assert!(!json.contains("argon2"));
        assert!(!json.contains("passwordHash"));
        assert!(!json.contains("deadbeef"));
        assert!(json.contains(r#""firstName":"Ada""#));
        assert!(json.contains(r#""role":"user""#));
    }

    #[test]
    fn never_changed_password_is_never_stale() {
        let user = sample_user(None);
        assert!(!user.changed_password_after(0));
    }

    #[test]
    fn token_issued_before_change_is_stale() {
        let changed = OffsetDateTime::now_utc();
        let user = sample_user(Some(changed));
        let before = (changed - Duration::hours(1)).unix_timestamp();
        assert!(user.changed_password_after(before));
    }

    #[test]
    fn token_issued_in_the_same_second_is_still_valid() {
        let changed = OffsetDateTime::now_utc();
        let user = sample_user(Some(changed));
        assert!(!user.changed_password_after(changed.unix_timestamp()));
    }

    #[test]
    fn token_issued_after_change_is_valid() {
        let changed = OffsetDateTime::now_utc();
        let user = sample_user(Some(changed));
        let after = (changed + Duration::minutes(5)).unix_timestamp();
        assert!(!user.changed_password_after(after));
    }
}
