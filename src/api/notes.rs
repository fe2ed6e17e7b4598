use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::database::models::Note;

pub const TITLE_BLANK_MESSAGE: &str = "Title can't be blank.";

/// Body of `POST /notes` and `PUT /notes/:id`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteRequest {
    /// Optional caller-chosen id; only honored by `POST /notes`
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    pub content: String,
    pub color: i64,
}

impl NoteRequest {
    pub fn validate(&self) -> Result<(), HashMap<String, String>> {
        let mut field_errors = HashMap::new();
        if self.title.trim().is_empty() {
            field_errors.insert("title".to_string(), TITLE_BLANK_MESSAGE.to_string());
        }

        if field_errors.is_empty() {
            Ok(())
        } else {
            Err(field_errors)
        }
    }
}

/// Note as returned to clients. The owner is never exposed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteResponse {
    pub id: String,
    pub title: String,
    pub content: String,
    pub color: i64,
    pub created_at: DateTime<Utc>,
}

impl From<Note> for NoteResponse {
    fn from(note: Note) -> Self {
        Self {
            id: note.id.to_string(),
            title: note.title,
            content: note.content,
            color: note.color,
            created_at: note.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    fn request(title: &str) -> NoteRequest {
        NoteRequest {
            id: None,
            title: title.to_string(),
            content: "body".to_string(),
            color: 1,
        }
    }

    #[test]
    fn blank_titles_are_rejected() {
        for title in ["", "   ", "\t\n"] {
            let errors = request(title).validate().unwrap_err();
            assert_eq!(errors.get("title").map(String::as_str), Some(TITLE_BLANK_MESSAGE));
        }
        assert!(request(" Groceries ").validate().is_ok());
    }

    #[test]
    fn request_id_is_optional() {
        let parsed: NoteRequest =
            serde_json::from_value(json!({"title": "t", "content": "c", "color": 4278190080i64})).unwrap();
        assert!(parsed.id.is_none());
        assert_eq!(parsed.color, 4278190080);
    }

    #[test]
    fn response_uses_camel_case_and_hides_owner() {
        let note = Note {
            id: Uuid::new_v4(),
            title: "t".to_string(),
            content: "c".to_string(),
            color: 7,
            created_at: Utc::now(),
            owner_id: Uuid::new_v4(),
        };
        let value = serde_json::to_value(NoteResponse::from(note.clone())).unwrap();

        assert_eq!(value["id"], note.id.to_string());
        assert!(value.get("createdAt").is_some());
        assert!(value.get("ownerId").is_none());
        assert!(value.get("owner_id").is_none());
    }
}
