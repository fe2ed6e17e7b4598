use std::sync::Arc;

use crate::auth::password::{Argon2Hasher, Hasher};
use crate::config::{AppConfig, StorageBackend};
use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::memory::{MemoryNoteRepository, MemoryRefreshTokenRepository, MemoryUserRepository};
use crate::database::repository::{
    NoteRepository, PgNoteRepository, PgRefreshTokenRepository, PgUserRepository,
    RefreshTokenRepository, UserRepository,
};
use crate::services::{AuthService, NoteService};

/// Shared handler state: the services over whichever storage backend is configured
#[derive(Clone)]
pub struct AppState {
    pub notes: NoteService,
    pub auth: AuthService,
}

impl AppState {
    pub fn new(
        notes: Arc<dyn NoteRepository>,
        users: Arc<dyn UserRepository>,
        refresh_tokens: Arc<dyn RefreshTokenRepository>,
        hasher: Arc<dyn Hasher>,
    ) -> Self {
        Self {
            notes: NoteService::new(notes),
            auth: AuthService::new(users, refresh_tokens, hasher),
        }
    }

    /// Everything in process memory; nothing survives a restart
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryNoteRepository::new()),
            Arc::new(MemoryUserRepository::new()),
            Arc::new(MemoryRefreshTokenRepository::new()),
            Arc::new(Argon2Hasher::new()),
        )
    }

    /// Build state for the configured backend, connecting and migrating Postgres if selected
    pub async fn from_config(config: &AppConfig) -> Result<Self, DatabaseError> {
        match config.storage.backend {
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory storage; data is lost on shutdown");
                Ok(Self::in_memory())
            }
            StorageBackend::Postgres => {
                let pool = DatabaseManager::connect(&config.database).await?;
                DatabaseManager::ensure_schema(&pool).await?;
                Ok(Self::new(
                    Arc::new(PgNoteRepository::new(pool.clone())),
                    Arc::new(PgUserRepository::new(pool.clone())),
                    Arc::new(PgRefreshTokenRepository::new(pool)),
                    Arc::new(Argon2Hasher::new()),
                ))
            }
        }
    }
}
