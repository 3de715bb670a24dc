// SPDX-License-Identifier: MIT

//! Success response envelope shared by all handlers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// JSON success envelope: `{statusCode, data, message, success: true}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub status_code: u16,
    pub data: T,
    pub message: String,
    pub success: bool,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(status: StatusCode, data: T, message: impl Into<String>) -> Self {
        Self {
            status_code: status.as_u16(),
            data,
            message: message.into(),
            success: true,
        }
    }

    /// 200 OK envelope.
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, data, message)
    }

    /// 201 Created envelope.
    pub fn created(data: T, message: impl Into<String>) -> Self {
        Self::new(StatusCode::CREATED, data, message)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shape() {
        let resp = ApiResponse::ok(serde_json::json!({"id": "u1"}), "fetched");
        let json = serde_json::to_value(&resp).unwrap();

        assert_eq!(json["statusCode"], 200);
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "fetched");
        assert_eq!(json["data"]["id"], "u1");
    }

    #[test]
    fn test_created_status() {
        let resp = ApiResponse::created((), "registered");
        assert_eq!(resp.status_code, 201);
    }
}
