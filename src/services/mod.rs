pub mod auth_service;
pub mod note_service;

pub use auth_service::{AuthError, AuthService};
pub use note_service::{DeleteOutcome, NoteError, NoteService};
