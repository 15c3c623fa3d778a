// src/shared/shared_structs.rs

use serde::Serialize;

/// Envelope shared by every API response.
/// `T` is the body type; error responses carry no body.
#[derive(Debug, Serialize)]
pub struct GenericResponse<T> {
    pub status: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<T>,
}

impl<T> GenericResponse<T> {
    pub fn success(message: impl Into<String>, body: T) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            body: Some(body),
        }
    }
}

impl GenericResponse<()> {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            body: None,
        }
    }
}
