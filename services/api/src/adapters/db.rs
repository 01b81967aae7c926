//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use outbreak_core::domain::{DayEntry, User, UserCredentials, ZipRecord};
use outbreak_core::ports::{DatabaseService, PortError, PortResult};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// The only entry-list shape this adapter reads or writes.
const ENTRIES_SCHEMA_VERSION: i32 = 1;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct ZipRow {
    zip: String,
    entries: Json<Vec<DayEntry>>,
    population: Option<i64>,
    schema_version: i32,
}
impl ZipRow {
    fn to_domain(self) -> PortResult<ZipRecord> {
        if self.schema_version != ENTRIES_SCHEMA_VERSION {
            return Err(PortError::Unexpected(format!(
                "ZIP {} is stored with unsupported schema version {}",
                self.zip, self.schema_version
            )));
        }
        Ok(ZipRecord {
            zip: self.zip,
            entries: self.entries.0,
            population: self.population,
        })
    }
}

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
}
impl UserRow {
    fn to_domain(self) -> User {
        User {
            id: self.id,
            username: self.username,
            email: self.email,
        }
    }
}

#[derive(FromRow)]
struct CredentialsRow {
    id: Uuid,
    email: String,
    password_hash: String,
}
impl CredentialsRow {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            user_id: self.id,
            email: self.email,
            hashed_password: self.password_hash,
        }
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn get_zip_record(&self, zip: &str) -> PortResult<ZipRecord> {
        let row = sqlx::query_as::<_, ZipRow>(
            "SELECT zip, entries, population, schema_version FROM zips WHERE zip = $1",
        )
        .bind(zip)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("ZIP {} not found", zip)),
            _ => unexpected(e),
        })?;
        row.to_domain()
    }

    async fn save_zip_entries(&self, zip: &str, entries: &[DayEntry]) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE zips SET entries = $1, schema_version = $2, updated_at = now() WHERE zip = $3",
        )
        .bind(Json(entries))
        .bind(ENTRIES_SCHEMA_VERSION)
        .bind(zip)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("ZIP {} not found", zip)));
        }
        Ok(())
    }

    async fn upsert_zip_population(&self, zip: &str, population: Option<i64>) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO zips (zip, population, schema_version) VALUES ($1, $2, $3) \
             ON CONFLICT (zip) DO UPDATE SET population = EXCLUDED.population, updated_at = now()",
        )
        .bind(zip)
        .bind(population)
        .bind(ENTRIES_SCHEMA_VERSION)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn create_user(
        &self,
        username: &str,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            "INSERT INTO users (id, username, email, password_hash) VALUES ($1, $2, $3, $4) \
             RETURNING id, username, email",
        )
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            let duplicate = e
                .as_database_error()
                .is_some_and(|db_err| db_err.is_unique_violation());
            if duplicate {
                PortError::Conflict("User with this email already exists!".to_string())
            } else {
                unexpected(e)
            }
        })?;
        Ok(row.to_domain())
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let row = sqlx::query_as::<_, CredentialsRow>(
            "SELECT id, email, password_hash FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound("User not found!".to_string()),
            _ => unexpected(e),
        })?;
        Ok(row.to_domain())
    }

    async fn ping(&self) -> PortResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }
}
