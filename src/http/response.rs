//! JSON response envelope.
//!
//! Every API response, success or failure, is `{ok, msg?, data?}` with
//! `Content-Type: application/json`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::MojenxError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ApiResponse {
    pub fn message(msg: impl Into<String>) -> Self {
        Self {
            ok: true,
            msg: Some(msg.into()),
            data: None,
        }
    }

    pub fn data(data: impl Into<serde_json::Value>) -> Self {
        Self {
            ok: true,
            msg: None,
            data: Some(data.into()),
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            ok: false,
            msg: Some(msg.into()),
            data: None,
        }
    }

    pub fn with_data(mut self, data: impl Into<serde_json::Value>) -> Self {
        self.data = Some(data.into());
        self
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        let status = if self.ok {
            StatusCode::OK
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, Json(self)).into_response()
    }
}

/// Handler error: maps the crate taxonomy onto HTTP status codes.
#[derive(Debug)]
pub struct ApiError(pub MojenxError);

impl From<MojenxError> for ApiError {
    fn from(e: MojenxError) -> Self {
        Self(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            MojenxError::Validation(_) => StatusCode::BAD_REQUEST,
            MojenxError::Auth => StatusCode::UNAUTHORIZED,
            MojenxError::Io { .. } | MojenxError::ExternalCommand { .. } | MojenxError::Connect(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(kind = self.0.kind(), error = %self.0, "request failed");
        } else {
            tracing::debug!(kind = self.0.kind(), error = %self.0, "request rejected");
        }
        (status, Json(ApiResponse::error(self.0.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_omits_absent_fields() {
        let json = serde_json::to_string(&ApiResponse::message("tor reloaded")).unwrap();
        assert_eq!(json, r#"{"ok":true,"msg":"tor reloaded"}"#);

        let json = serde_json::to_string(&ApiResponse::error("unauthorized")).unwrap();
        assert_eq!(json, r#"{"ok":false,"msg":"unauthorized"}"#);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError(MojenxError::validation("invalid port")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError(MojenxError::Auth).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError(MojenxError::Connect("refused".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
