use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::{
    AccountStore, ItemKind, ItemSnapshot, NewUser, ProfileUpdate, SaveOutcome, SavedItem,
    SessionRecord, User,
};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("run migrations")?;
        Ok(())
    }
}

#[async_trait]
impl AccountStore for PgStore {
    async fn create_user(&self, new: NewUser) -> anyhow::Result<Option<User>> {
        // The unique index on email serializes racing sign-ups.
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, password_hash, name)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (email) DO NOTHING
            RETURNING id, email, password_hash, name, phone, country, date_of_birth,
                      current_education, target_degree, target_countries,
                      created_at, updated_at, last_login_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(&new.name)
        .fetch_optional(&self.pool)
        .await
        .context("insert user")?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, name, phone, country, date_of_birth,
                   current_education, target_degree, target_countries,
                   created_at, updated_at, last_login_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, name, phone, country, date_of_birth,
                   current_education, target_degree, target_countries,
                   created_at, updated_at, last_login_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    async fn touch_last_login(&self, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET last_login_at = now() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("update last_login_at")?;
        Ok(())
    }

    async fn update_profile(
        &self,
        id: Uuid,
        update: &ProfileUpdate,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                name              = COALESCE($2, name),
                phone             = COALESCE($3, phone),
                country           = COALESCE($4, country),
                date_of_birth     = COALESCE($5, date_of_birth),
                current_education = COALESCE($6, current_education),
                target_degree     = COALESCE($7, target_degree),
                target_countries  = COALESCE($8, target_countries),
                updated_at        = now()
            WHERE id = $1
            RETURNING id, email, password_hash, name, phone, country, date_of_birth,
                      current_education, target_degree, target_countries,
                      created_at, updated_at, last_login_at
            "#,
        )
        .bind(id)
        .bind(update.name.as_deref())
        .bind(update.phone.as_deref())
        .bind(update.country.as_deref())
        .bind(update.date_of_birth.as_deref())
        .bind(update.current_education.as_deref())
        .bind(update.target_degree.as_deref())
        .bind(update.target_countries.clone())
        .fetch_optional(&self.pool)
        .await
        .context("update profile")?;
        Ok(user)
    }

    async fn create_session(
        &self,
        user_id: Uuid,
        expires_at: OffsetDateTime,
    ) -> anyhow::Result<SessionRecord> {
        let session = sqlx::query_as::<_, SessionRecord>(
            r#"
            INSERT INTO sessions (id, user_id, expires_at)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, created_at, expires_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await
        .context("insert session")?;
        Ok(session)
    }

    async fn find_session(&self, id: Uuid) -> anyhow::Result<Option<SessionRecord>> {
        let session = sqlx::query_as::<_, SessionRecord>(
            "SELECT id, user_id, created_at, expires_at FROM sessions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("find session")?;
        Ok(session)
    }

    async fn extend_session(&self, id: Uuid, expires_at: OffsetDateTime) -> anyhow::Result<bool> {
        let res = sqlx::query("UPDATE sessions SET expires_at = $2 WHERE id = $1")
            .bind(id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .context("extend session")?;
        Ok(res.rows_affected() > 0)
    }

    async fn delete_session(&self, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("delete session")?;
        Ok(())
    }

    async fn delete_expired_sessions(
        &self,
        user_id: Uuid,
        now: OffsetDateTime,
    ) -> anyhow::Result<u64> {
        let res = sqlx::query("DELETE FROM sessions WHERE user_id = $1 AND expires_at <= $2")
            .bind(user_id)
            .bind(now)
            .execute(&self.pool)
            .await
            .context("delete expired sessions")?;
        Ok(res.rows_affected())
    }

    async fn save_item(
        &self,
        user_id: Uuid,
        kind: ItemKind,
        snapshot: &ItemSnapshot,
    ) -> anyhow::Result<SaveOutcome> {
        let mut tx = self.pool.begin().await.context("begin tx")?;

        let inserted = sqlx::query_as::<_, SavedItem>(
            r#"
            INSERT INTO saved_items
                (id, user_id, kind, name, country, ranking, tuition, program, amount, deadline, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (user_id, kind, name) DO NOTHING
            RETURNING id, user_id, kind, name, country, ranking, tuition, program,
                      amount, deadline, notes, saved_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(kind)
        .bind(&snapshot.name)
        .bind(&snapshot.country)
        .bind(snapshot.ranking)
        .bind(snapshot.tuition.as_deref())
        .bind(snapshot.program.as_deref())
        .bind(snapshot.amount.as_deref())
        .bind(snapshot.deadline.as_deref())
        .bind(snapshot.notes.as_deref())
        .fetch_optional(&mut *tx)
        .await
        .context("insert saved item")?;

        let outcome = match inserted {
            Some(item) => SaveOutcome {
                item,
                created: true,
            },
            None => {
                let item = sqlx::query_as::<_, SavedItem>(
                    r#"
                    SELECT id, user_id, kind, name, country, ranking, tuition, program,
                           amount, deadline, notes, saved_at
                    FROM saved_items
                    WHERE user_id = $1 AND kind = $2 AND name = $3
                    "#,
                )
                .bind(user_id)
                .bind(kind)
                .bind(&snapshot.name)
                .fetch_one(&mut *tx)
                .await
                .context("load existing saved item")?;
                SaveOutcome {
                    item,
                    created: false,
                }
            }
        };

        tx.commit().await.context("commit tx")?;
        Ok(outcome)
    }

    async fn remove_item(&self, user_id: Uuid, kind: ItemKind, name: &str) -> anyhow::Result<bool> {
        let res = sqlx::query(
            "DELETE FROM saved_items WHERE user_id = $1 AND kind = $2 AND name = $3",
        )
        .bind(user_id)
        .bind(kind)
        .bind(name)
        .execute(&self.pool)
        .await
        .context("delete saved item")?;
        Ok(res.rows_affected() > 0)
    }

    async fn remove_item_by_id(
        &self,
        user_id: Uuid,
        kind: ItemKind,
        item_id: Uuid,
    ) -> anyhow::Result<bool> {
        let res = sqlx::query(
            "DELETE FROM saved_items WHERE id = $1 AND user_id = $2 AND kind = $3",
        )
        .bind(item_id)
        .bind(user_id)
        .bind(kind)
        .execute(&self.pool)
        .await
        .context("delete saved item by id")?;
        Ok(res.rows_affected() > 0)
    }

    async fn find_item(
        &self,
        user_id: Uuid,
        kind: ItemKind,
        name: &str,
    ) -> anyhow::Result<Option<SavedItem>> {
        let item = sqlx::query_as::<_, SavedItem>(
            r#"
            SELECT id, user_id, kind, name, country, ranking, tuition, program,
                   amount, deadline, notes, saved_at
            FROM saved_items
            WHERE user_id = $1 AND kind = $2 AND name = $3
            "#,
        )
        .bind(user_id)
        .bind(kind)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .context("find saved item")?;
        Ok(item)
    }

    async fn list_items(&self, user_id: Uuid, kind: ItemKind) -> anyhow::Result<Vec<SavedItem>> {
        let rows = sqlx::query_as::<_, SavedItem>(
            r#"
            SELECT id, user_id, kind, name, country, ranking, tuition, program,
                   amount, deadline, notes, saved_at
            FROM saved_items
            WHERE user_id = $1 AND kind = $2
            ORDER BY saved_at ASC, id ASC
            "#,
        )
        .bind(user_id)
        .bind(kind)
        .fetch_all(&self.pool)
        .await
        .context("list saved items")?;
        Ok(rows)
    }
}
