//! JSON result envelope printed by every command.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
}

impl ApiError {
    pub fn status(&self) -> u16 {
        match self {
            ApiError::Validation(_) => 400,
            ApiError::Unauthorized => 401,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
        }
    }
}

/// Status code for any error bubbling out of a command.
pub fn status_of(error: &anyhow::Error) -> u16 {
    error
        .downcast_ref::<ApiError>()
        .map(ApiError::status)
        .unwrap_or(500)
}

#[derive(Serialize, Debug)]
pub struct Envelope {
    pub success: bool,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Envelope {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            status: 200,
            error: None,
            data: Some(data),
        }
    }

    pub fn from_error(error: &anyhow::Error) -> Self {
        Self {
            success: false,
            status: status_of(error),
            error: Some(format!("{:#}", error)),
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn statuses_follow_error_category() {
        let err: anyhow::Error = ApiError::Validation("bad key".to_string()).into();
        assert_eq!(status_of(&err), 400);
        let err: anyhow::Error = ApiError::Unauthorized.into();
        assert_eq!(status_of(&err), 401);
        let err = anyhow::anyhow!("rpc down");
        assert_eq!(status_of(&err), 500);
    }

    #[test]
    fn envelope_shape() {
        let ok = serde_json::to_value(Envelope::ok(json!({"count": 1}))).unwrap();
        assert_eq!(ok, json!({"success": true, "status": 200, "data": {"count": 1}}));

        let err: anyhow::Error = ApiError::NotFound("Stake account not found".to_string()).into();
        let failed = serde_json::to_value(Envelope::from_error(&err)).unwrap();
        assert_eq!(
            failed,
            json!({"success": false, "status": 404, "error": "Stake account not found"})
        );
    }
}
