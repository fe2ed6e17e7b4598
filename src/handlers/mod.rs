// handlers/mod.rs - two security tiers
//
// Public (no auth) → Protected (bearer access token, caller injected as AuthUser)
pub mod protected; // /notes/*
pub mod public; // /, /health, /auth/*
