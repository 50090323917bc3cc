use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};

use super::{EventId, Store, StoreError, UserId};
use crate::auth::repo_types::{Credential, NewUser, User};
use crate::events::repo_types::{Event, EventChanges, NewEvent};

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect and apply pending migrations.
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("connect to database")?;
        MIGRATOR.run(&pool).await.context("run migrations")?;
        Ok(Self { pool })
    }
}

fn store_err(e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            let what = match db.constraint() {
                Some(c) if c.contains("username") => "username",
                Some(c) if c.contains("email") => "email",
                _ => "record",
            };
            StoreError::AlreadyExists(what)
        }
        sqlx::Error::Database(db) if db.code().as_deref() == Some(FOREIGN_KEY_VIOLATION) => {
            StoreError::NotFound
        }
        other => StoreError::Backend(other.to_string()),
    }
}

#[async_trait]
impl Store for PgStore {
    async fn create_user(&self, user: &NewUser) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, username, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, username, email, password_hash, created_at
            "#,
        )
        .bind(&user.name)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(store_err)
    }

    async fn find_credential(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<Credential>, StoreError> {
        sqlx::query_as::<_, Credential>(
            r#"
            SELECT id AS user_id, email, password_hash
              FROM users
             WHERE username = $1 OR email = $2
             ORDER BY id
             LIMIT 1
            "#,
        )
        .bind(username)
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)
    }

    async fn create_event(&self, event: &NewEvent) -> Result<Event, StoreError> {
        sqlx::query_as::<_, Event>(
            r#"
            INSERT INTO events (title, description, location, date_time, user_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, description, location, date_time, user_id, created_at
            "#,
        )
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.location)
        .bind(event.date_time)
        .bind(event.owner)
        .fetch_one(&self.pool)
        .await
        .map_err(store_err)
    }

    async fn get_event(&self, id: EventId) -> Result<Option<Event>, StoreError> {
        sqlx::query_as::<_, Event>(
            r#"
            SELECT id, title, description, location, date_time, user_id, created_at
              FROM events
             WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)
    }

    async fn list_events(&self) -> Result<Vec<Event>, StoreError> {
        sqlx::query_as::<_, Event>(
            r#"
            SELECT id, title, description, location, date_time, user_id, created_at
              FROM events
             ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)
    }

    async fn update_event(
        &self,
        id: EventId,
        changes: &EventChanges,
    ) -> Result<Event, StoreError> {
        sqlx::query_as::<_, Event>(
            r#"
            UPDATE events
               SET title = $2, description = $3, location = $4, date_time = $5
             WHERE id = $1
            RETURNING id, title, description, location, date_time, user_id, created_at
            "#,
        )
        .bind(id)
        .bind(&changes.title)
        .bind(&changes.description)
        .bind(&changes.location)
        .bind(changes.date_time)
        .fetch_one(&self.pool)
        .await
        .map_err(store_err)
    }

    async fn delete_event(&self, id: EventId) -> Result<(), StoreError> {
        let res = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        if res.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn set_registration(
        &self,
        event: EventId,
        user: UserId,
        registered: bool,
    ) -> Result<bool, StoreError> {
        let query = if registered {
            sqlx::query(
                r#"
                INSERT INTO registrations (event_id, user_id)
                VALUES ($1, $2)
                ON CONFLICT (event_id, user_id) DO NOTHING
                "#,
            )
        } else {
            sqlx::query("DELETE FROM registrations WHERE event_id = $1 AND user_id = $2")
        };
        let res = query
            .bind(event)
            .bind(user)
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(res.rows_affected() > 0)
    }
}
