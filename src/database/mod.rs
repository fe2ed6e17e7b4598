pub mod manager;
pub mod memory;
pub mod models;
pub mod repository;

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::{MemoryNoteRepository, MemoryRefreshTokenRepository, MemoryUserRepository};
pub use repository::{
    NoteRepository, PgNoteRepository, PgRefreshTokenRepository, PgUserRepository,
    RefreshTokenRepository, UserRepository,
};
