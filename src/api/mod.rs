pub mod auth;
pub mod notes;

pub use auth::{LoginRequest, RefreshRequest, RegisterRequest, TokenPair, UserResponse};
pub use notes::{NoteRequest, NoteResponse};
