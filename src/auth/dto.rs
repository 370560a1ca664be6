use serde::Deserialize;

/// Registration body. Fields stay optional so missing and null inputs get
/// the same field-specific 400 instead of a deserialization error.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}
