pub mod note;
pub mod refresh_token;
pub mod user;

pub use note::Note;
pub use refresh_token::RefreshToken;
pub use user::User;
