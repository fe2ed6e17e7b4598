// handlers/protected - bearer access token required
//
// Every route here sits behind jwt_auth_middleware, which injects the caller
// as an AuthUser extension. Ownership checks happen in NoteService.
pub mod notes;
