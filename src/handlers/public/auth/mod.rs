// handlers/public/auth - token acquisition, no authentication required
pub mod login;
pub mod refresh;
pub mod register;

pub use login::post as login_post;
pub use refresh::post as refresh_post;
pub use register::post as register_post;
