use anyhow::Context;
use clap::Subcommand;
use serde_json::json;
use sqlx::PgPool;

use crate::cli::utils::output;
use crate::cli::OutputFormat;
use crate::config;
use crate::database::manager::DatabaseManager;

#[derive(Subcommand)]
pub enum InitCommands {
    #[command(about = "Create the application role and database, then the schema")]
    Database,
}

/// Application credentials read from NOTES_APP_USER, NOTES_APP_PASSWORD and NOTES_DB_NAME
#[derive(Debug, Clone)]
pub struct AppDatabase {
    pub user: String,
    pub password: String,
    pub database: String,
}

impl AppDatabase {
    pub fn from_env() -> anyhow::Result<Self> {
        let read = |name: &str| std::env::var(name).with_context(|| format!("{} is not set", name));
        let app = Self {
            user: read("NOTES_APP_USER")?,
            password: read("NOTES_APP_PASSWORD")?,
            database: read("NOTES_DB_NAME")?,
        };
        app.validate()?;
        Ok(app)
    }

    fn validate(&self) -> anyhow::Result<()> {
        for (what, name) in [("role", &self.user), ("database", &self.database)] {
            if !DatabaseManager::is_valid_identifier(name) {
                anyhow::bail!("invalid {} name '{}'", what, name);
            }
        }
        if self.password.is_empty() {
            anyhow::bail!("NOTES_APP_PASSWORD must not be empty");
        }
        Ok(())
    }

    fn create_role_sql(&self) -> String {
        format!(
            "CREATE ROLE {} LOGIN PASSWORD {}",
            DatabaseManager::quote_identifier(&self.user),
            DatabaseManager::quote_literal(&self.password)
        )
    }

    fn create_database_sql(&self) -> String {
        format!(
            "CREATE DATABASE {} OWNER {}",
            DatabaseManager::quote_identifier(&self.database),
            DatabaseManager::quote_identifier(&self.user)
        )
    }

    /// Read/write on the notes tables, nothing else
    fn grant_sql(&self) -> Vec<String> {
        let role = DatabaseManager::quote_identifier(&self.user);
        vec![
            format!("GRANT USAGE ON SCHEMA public TO {}", role),
            format!(
                "GRANT SELECT, INSERT, UPDATE, DELETE ON ALL TABLES IN SCHEMA public TO {}",
                role
            ),
        ]
    }
}

pub async fn handle(cmd: InitCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        InitCommands::Database => {
            let app = AppDatabase::from_env()?;
            let settings = &config::config().database;
            let admin_url = settings
                .url
                .as_deref()
                .context("DATABASE_URL must point at an administrative connection")?;

            let admin_pool = DatabaseManager::connect_url(admin_url, settings).await?;
            let created_role = ensure_role(&admin_pool, &app).await?;
            let created_database = ensure_database(&admin_pool, &app).await?;
            admin_pool.close().await;

            let app_url = DatabaseManager::build_connection_string(admin_url, &app.database)?;
            let app_pool = DatabaseManager::connect_url(&app_url, settings).await?;
            DatabaseManager::ensure_schema(&app_pool).await?;
            for statement in app.grant_sql() {
                sqlx::query(&statement).execute(&app_pool).await?;
            }
            app_pool.close().await;

            output(
                &output_format,
                true,
                &format!("Database '{}' is ready for role '{}'", app.database, app.user),
                Some(json!({
                    "role": app.user,
                    "database": app.database,
                    "created_role": created_role,
                    "created_database": created_database,
                })),
            )
        }
    }
}

async fn ensure_role(pool: &PgPool, app: &AppDatabase) -> anyhow::Result<bool> {
    let exists: Option<(i32,)> = sqlx::query_as("SELECT 1 FROM pg_roles WHERE rolname = $1")
        .bind(&app.user)
        .fetch_optional(pool)
        .await?;
    if exists.is_some() {
        tracing::info!("Role {} already exists", app.user);
        return Ok(false);
    }

    sqlx::query(&app.create_role_sql()).execute(pool).await?;
    tracing::info!("Created role {}", app.user);
    Ok(true)
}

async fn ensure_database(pool: &PgPool, app: &AppDatabase) -> anyhow::Result<bool> {
    let exists: Option<(i32,)> = sqlx::query_as("SELECT 1 FROM pg_database WHERE datname = $1")
        .bind(&app.database)
        .fetch_optional(pool)
        .await?;
    if exists.is_some() {
        tracing::info!("Database {} already exists", app.database);
        return Ok(false);
    }

    // CREATE DATABASE cannot run inside a transaction; a plain execute is autocommit
    sqlx::query(&app.create_database_sql()).execute(pool).await?;
    tracing::info!("Created database {}", app.database);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> AppDatabase {
        AppDatabase {
            user: "notes_app".to_string(),
            password: "pa'ss".to_string(),
            database: "notes".to_string(),
        }
    }

    #[test]
    fn builds_quoted_ddl() {
        let app = app();
        assert_eq!(app.create_role_sql(), "CREATE ROLE \"notes_app\" LOGIN PASSWORD 'pa''ss'");
        assert_eq!(app.create_database_sql(), "CREATE DATABASE \"notes\" OWNER \"notes_app\"");
        assert!(app.grant_sql().iter().all(|s| s.ends_with("TO \"notes_app\"")));
    }

    #[test]
    fn rejects_unsafe_names() {
        let mut bad = app();
        bad.database = "notes; DROP ROLE postgres".to_string();
        assert!(bad.validate().is_err());

        let mut empty_password = app();
        empty_password.password.clear();
        assert!(empty_password.validate().is_err());

        assert!(app().validate().is_ok());
    }
}
