use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{Note, RefreshToken, User};
use crate::database::repository::{NoteRepository, RefreshTokenRepository, UserRepository};

/// Process-local note storage, used with `STORAGE_BACKEND=memory` and in tests
#[derive(Default)]
pub struct MemoryNoteRepository {
    notes: RwLock<HashMap<Uuid, Note>>,
}

impl MemoryNoteRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NoteRepository for MemoryNoteRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Note>, DatabaseError> {
        Ok(self.notes.read().await.get(&id).cloned())
    }

    async fn find_by_owner(&self, owner_id: Uuid) -> Result<Vec<Note>, DatabaseError> {
        let notes = self.notes.read().await;
        let mut owned: Vec<Note> = notes
            .values()
            .filter(|note| note.is_owned_by(owner_id))
            .cloned()
            .collect();
        owned.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(owned)
    }

    async fn save(&self, note: &Note) -> Result<Option<Note>, DatabaseError> {
        let mut notes = self.notes.write().await;
        match notes.get_mut(&note.id) {
            Some(existing) if !existing.is_owned_by(note.owner_id) => Ok(None),
            Some(existing) => {
                existing.title = note.title.clone();
                existing.content = note.content.clone();
                existing.color = note.color;
                Ok(Some(existing.clone()))
            }
            None => {
                notes.insert(note.id, note.clone());
                Ok(Some(note.clone()))
            }
        }
    }

    async fn update(&self, note: &Note) -> Result<Option<Note>, DatabaseError> {
        let mut notes = self.notes.write().await;
        Ok(notes
            .get_mut(&note.id)
            .filter(|existing| existing.is_owned_by(note.owner_id))
            .map(|existing| {
                existing.title = note.title.clone();
                existing.content = note.content.clone();
                existing.color = note.color;
                existing.clone()
            }))
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<bool, DatabaseError> {
        Ok(self.notes.write().await.remove(&id).is_some())
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryUserRepository {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let users = self.users.read().await;
        Ok(users.values().find(|user| user.email == email).cloned())
    }

    async fn insert(&self, user: &User) -> Result<User, DatabaseError> {
        let mut users = self.users.write().await;
        if users.values().any(|existing| existing.email == user.email) {
            return Err(DatabaseError::Conflict(format!("email '{}' is taken", user.email)));
        }
        users.insert(user.id, user.clone());
        Ok(user.clone())
    }
}

#[derive(Default)]
pub struct MemoryRefreshTokenRepository {
    tokens: RwLock<Vec<RefreshToken>>,
}

impl MemoryRefreshTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RefreshTokenRepository for MemoryRefreshTokenRepository {
    async fn insert(&self, token: &RefreshToken) -> Result<(), DatabaseError> {
        self.tokens.write().await.push(token.clone());
        Ok(())
    }

    async fn take(&self, user_id: Uuid, hashed_token: &str) -> Result<Option<RefreshToken>, DatabaseError> {
        let mut tokens = self.tokens.write().await;
        let position = tokens
            .iter()
            .position(|t| t.user_id == user_id && t.hashed_token == hashed_token);
        Ok(position.map(|index| tokens.swap_remove(index)))
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, DatabaseError> {
        let mut tokens = self.tokens.write().await;
        let before = tokens.len();
        tokens.retain(|t| t.expires_at >= now);
        Ok((before - tokens.len()) as u64)
    }
}
