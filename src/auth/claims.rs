use serde::{Deserialize, Serialize};

/// JWT payload carried by a session credential.
///
/// `sub` stays a raw string here; parsing it into a user id is a separate,
/// fallible step so the gate can tell a malformed subject apart from a bad
/// signature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user ID
    pub iat: usize,  // issued at (unix timestamp)
    pub exp: usize,  // expires at (unix timestamp)
}
