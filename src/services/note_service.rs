use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::api::NoteRequest;
use crate::database::manager::DatabaseError;
use crate::database::models::Note;
use crate::database::repository::NoteRepository;

#[derive(Debug, Error)]
pub enum NoteError {
    /// Unknown note, foreign owner or malformed id. Clients see the message.
    #[error("{0}")]
    InvalidArgument(String),
    #[error("Invalid note: {0:?}")]
    Validation(HashMap<String, String>),
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl NoteError {
    fn invalid(message: impl Into<String>) -> Self {
        NoteError::InvalidArgument(message.into())
    }
}

const NOT_AUTHORIZED_TO_UPDATE: &str = "You are not authorized to update this note.";

/// What `delete` did. Both outcomes are success for the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The note belongs to someone else and was left in place
    NotOwner,
}

/// Note operations on behalf of an authenticated owner
#[derive(Clone)]
pub struct NoteService {
    repository: Arc<dyn NoteRepository>,
}

impl NoteService {
    pub fn new(repository: Arc<dyn NoteRepository>) -> Self {
        Self { repository }
    }

    /// Create a note, or update the caller's note when `request.id` names one
    pub async fn save(&self, owner_id: Uuid, request: NoteRequest) -> Result<Note, NoteError> {
        request.validate().map_err(NoteError::Validation)?;

        let id = match request.id.as_deref() {
            Some(raw) => parse_id(raw)?,
            None => Uuid::new_v4(),
        };

        let note = Note {
            id,
            title: request.title,
            content: request.content,
            color: request.color,
            created_at: Utc::now(),
            owner_id,
        };

        match self.repository.save(&note).await? {
            Some(saved) => {
                tracing::debug!("Saved note {} for owner {}", saved.id, owner_id);
                Ok(saved)
            }
            None => {
                tracing::warn!("Owner {} tried to overwrite foreign note {}", owner_id, id);
                Err(NoteError::invalid(NOT_AUTHORIZED_TO_UPDATE))
            }
        }
    }

    /// Replace title, content and color of an existing note owned by the caller
    pub async fn update(&self, owner_id: Uuid, id: &str, request: NoteRequest) -> Result<Note, NoteError> {
        request.validate().map_err(NoteError::Validation)?;

        let note_id = parse_id(id)?;
        let existing = self
            .repository
            .find_by_id(note_id)
            .await?
            .ok_or_else(|| NoteError::invalid(format!("Note with id {} not found", id)))?;

        if !existing.is_owned_by(owner_id) {
            return Err(NoteError::invalid(NOT_AUTHORIZED_TO_UPDATE));
        }

        let updated = Note {
            title: request.title,
            content: request.content,
            color: request.color,
            ..existing
        };

        // A concurrent delete between the read and this write leaves nothing to update
        self.repository
            .update(&updated)
            .await?
            .ok_or_else(|| NoteError::invalid(format!("Note with id {} not found", id)))
    }

    pub async fn list(&self, owner_id: Uuid) -> Result<Vec<Note>, NoteError> {
        Ok(self.repository.find_by_owner(owner_id).await?)
    }

    pub async fn find(&self, owner_id: Uuid, id: &str) -> Result<Note, NoteError> {
        let note = self.load(id).await?;

        if !note.is_owned_by(owner_id) {
            return Err(NoteError::invalid("Invalid Owner Id"));
        }

        Ok(note)
    }

    /// Delete the caller's note. A foreign note is left untouched and the call
    /// still succeeds; only an unknown id is an error.
    pub async fn delete(&self, owner_id: Uuid, id: &str) -> Result<DeleteOutcome, NoteError> {
        let note = self.load(id).await?;

        if !note.is_owned_by(owner_id) {
            tracing::warn!("Owner {} asked to delete foreign note {}; ignoring", owner_id, note.id);
            return Ok(DeleteOutcome::NotOwner);
        }

        self.repository.delete_by_id(note.id).await?;
        tracing::debug!("Deleted note {} for owner {}", note.id, owner_id);
        Ok(DeleteOutcome::Deleted)
    }

    /// Reachability of the underlying storage
    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        self.repository.health_check().await
    }

    async fn load(&self, id: &str) -> Result<Note, NoteError> {
        let note_id = parse_id(id)?;
        self.repository
            .find_by_id(note_id)
            .await?
            .ok_or_else(|| NoteError::invalid("Note not found"))
    }
}

fn parse_id(raw: &str) -> Result<Uuid, NoteError> {
    Uuid::parse_str(raw.trim()).map_err(|_| NoteError::invalid(format!("Invalid note id: {}", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::MemoryNoteRepository;

    fn service() -> NoteService {
        NoteService::new(Arc::new(MemoryNoteRepository::new()))
    }

    fn request(title: &str) -> NoteRequest {
        NoteRequest {
            id: None,
            title: title.to_string(),
            content: format!("{} content", title),
            color: 0x00FF00,
        }
    }

    fn message(err: NoteError) -> String {
        match err {
            NoteError::InvalidArgument(msg) => msg,
            other => panic!("expected invalid argument, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn save_then_find_returns_same_fields() {
        let service = service();
        let owner = Uuid::new_v4();

        let saved = service.save(owner, request("Groceries")).await.unwrap();
        let found = service.find(owner, &saved.id.to_string()).await.unwrap();

        assert_eq!(found, saved);
        assert_eq!(found.owner_id, owner);
        assert_eq!(found.title, "Groceries");
    }

    #[tokio::test]
    async fn save_honors_caller_supplied_id() {
        let service = service();
        let id = Uuid::new_v4();
        let mut body = request("Chosen");
        body.id = Some(id.to_string());

        let saved = service.save(Uuid::new_v4(), body).await.unwrap();
        assert_eq!(saved.id, id);
    }

    #[tokio::test]
    async fn save_with_existing_id_updates_in_place() {
        let service = service();
        let owner = Uuid::new_v4();
        let first = service.save(owner, request("Draft")).await.unwrap();

        let mut body = request("Final");
        body.id = Some(first.id.to_string());
        let second = service.save(owner, body).await.unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.created_at, first.created_at);
        assert_eq!(second.title, "Final");
        assert_eq!(service.list(owner).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn save_cannot_take_over_foreign_note() {
        let service = service();
        let owner = Uuid::new_v4();
        let note = service.save(owner, request("Mine")).await.unwrap();

        let mut body = request("Stolen");
        body.id = Some(note.id.to_string());
        let err = service.save(Uuid::new_v4(), body).await.unwrap_err();

        assert_eq!(message(err), NOT_AUTHORIZED_TO_UPDATE);
        let stored = service.find(owner, &note.id.to_string()).await.unwrap();
        assert_eq!(stored.title, "Mine");
    }

    #[tokio::test]
    async fn save_rejects_blank_title_and_bad_id() {
        let service = service();
        assert!(matches!(
            service.save(Uuid::new_v4(), request("  ")).await,
            Err(NoteError::Validation(_))
        ));

        let mut body = request("Fine");
        body.id = Some("not-an-id".to_string());
        let err = service.save(Uuid::new_v4(), body).await.unwrap_err();
        assert_eq!(message(err), "Invalid note id: not-an-id");
    }

    #[tokio::test]
    async fn update_preserves_id_owner_and_created_at() {
        let service = service();
        let owner = Uuid::new_v4();
        let note = service.save(owner, request("Before")).await.unwrap();

        let mut body = request("After");
        body.id = Some(Uuid::new_v4().to_string());
        body.color = 42;
        let updated = service.update(owner, &note.id.to_string(), body).await.unwrap();

        assert_eq!(updated.id, note.id);
        assert_eq!(updated.owner_id, owner);
        assert_eq!(updated.created_at, note.created_at);
        assert_eq!(updated.title, "After");
        assert_eq!(updated.color, 42);
    }

    #[tokio::test]
    async fn update_rejects_unknown_and_foreign_notes() {
        let service = service();
        let owner = Uuid::new_v4();
        let missing = Uuid::new_v4().to_string();

        let err = service.update(owner, &missing, request("x")).await.unwrap_err();
        assert_eq!(message(err), format!("Note with id {} not found", missing));

        let note = service.save(owner, request("Mine")).await.unwrap();
        let err = service
            .update(Uuid::new_v4(), &note.id.to_string(), request("x"))
            .await
            .unwrap_err();
        assert_eq!(message(err), NOT_AUTHORIZED_TO_UPDATE);
    }

    /// Deletes every note right after handing it out, as a concurrent DELETE would
    struct DeletingReads(MemoryNoteRepository);

    #[async_trait::async_trait]
    impl NoteRepository for DeletingReads {
        async fn find_by_id(&self, id: Uuid) -> Result<Option<Note>, DatabaseError> {
            let note = self.0.find_by_id(id).await?;
            self.0.delete_by_id(id).await?;
            Ok(note)
        }

        async fn find_by_owner(&self, owner_id: Uuid) -> Result<Vec<Note>, DatabaseError> {
            self.0.find_by_owner(owner_id).await
        }

        async fn save(&self, note: &Note) -> Result<Option<Note>, DatabaseError> {
            self.0.save(note).await
        }

        async fn update(&self, note: &Note) -> Result<Option<Note>, DatabaseError> {
            self.0.update(note).await
        }

        async fn delete_by_id(&self, id: Uuid) -> Result<bool, DatabaseError> {
            self.0.delete_by_id(id).await
        }

        async fn health_check(&self) -> Result<(), DatabaseError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn update_does_not_recreate_note_deleted_mid_flight() {
        let repository = Arc::new(DeletingReads(MemoryNoteRepository::new()));
        let service = NoteService::new(repository.clone());
        let owner = Uuid::new_v4();
        let note = service.save(owner, request("Doomed")).await.unwrap();
        let id = note.id.to_string();

        let err = service.update(owner, &id, request("Revived")).await.unwrap_err();
        assert_eq!(message(err), format!("Note with id {} not found", id));
        assert!(repository.0.find_by_id(note.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn find_rejects_unknown_and_foreign_notes() {
        let service = service();
        let owner = Uuid::new_v4();
        let note = service.save(owner, request("Mine")).await.unwrap();

        let err = service.find(Uuid::new_v4(), &note.id.to_string()).await.unwrap_err();
        assert_eq!(message(err), "Invalid Owner Id");

        let err = service.find(owner, &Uuid::new_v4().to_string()).await.unwrap_err();
        assert_eq!(message(err), "Note not found");
    }

    #[tokio::test]
    async fn list_returns_only_callers_notes() {
        let service = service();
        let owner = Uuid::new_v4();
        service.save(owner, request("One")).await.unwrap();
        service.save(owner, request("Two")).await.unwrap();
        service.save(Uuid::new_v4(), request("Other")).await.unwrap();

        let notes = service.list(owner).await.unwrap();
        assert_eq!(notes.len(), 2);
        assert!(notes.iter().all(|n| n.owner_id == owner));
    }

    #[tokio::test]
    async fn delete_by_owner_removes_note() {
        let service = service();
        let owner = Uuid::new_v4();
        let note = service.save(owner, request("Bye")).await.unwrap();
        let id = note.id.to_string();

        assert_eq!(service.delete(owner, &id).await.unwrap(), DeleteOutcome::Deleted);
        assert_eq!(message(service.find(owner, &id).await.unwrap_err()), "Note not found");
    }

    #[tokio::test]
    async fn delete_by_non_owner_is_a_silent_no_op() {
        let service = service();
        let owner = Uuid::new_v4();
        let note = service.save(owner, request("Keep")).await.unwrap();
        let id = note.id.to_string();

        assert_eq!(service.delete(Uuid::new_v4(), &id).await.unwrap(), DeleteOutcome::NotOwner);
        assert!(service.find(owner, &id).await.is_ok());
    }

    #[tokio::test]
    async fn delete_unknown_note_fails() {
        let err = service()
            .delete(Uuid::new_v4(), &Uuid::new_v4().to_string())
            .await
            .unwrap_err();
        assert_eq!(message(err), "Note not found");
    }
}
