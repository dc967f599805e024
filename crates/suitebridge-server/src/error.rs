//! Maps [`GatewayError`] onto HTTP status codes and the compact `{error,
//! detail}` body (`spec.md` §7). This is the only place in the gateway
//! that knows about status codes — everything upstream only deals in
//! [`GatewayError`] kinds.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use suitebridge_core::GatewayError;
use tracing::error;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub detail: String,
}

/// A thin wrapper so [`GatewayError`] can implement [`IntoResponse`]
/// without suitebridge-core taking an axum dependency.
pub struct ApiError(pub GatewayError);

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            GatewayError::Validation(_) => StatusCode::BAD_REQUEST,
            GatewayError::Auth(_) => {
                error!(detail = %self.0.detail(), "ERP authentication failed");
                StatusCode::BAD_GATEWAY
            }
            GatewayError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::Backend(_) => StatusCode::BAD_GATEWAY,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
        };

        let body = Json(ErrorBody {
            error: self.0.kind_tag().to_string(),
            detail: self.0.detail(),
        });

        if matches!(self.0, GatewayError::RateLimited(_)) {
            (status, [(header::RETRY_AFTER, "5")], body).into_response()
        } else {
            (status, body).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn validation_maps_to_400() {
        let response = ApiError(GatewayError::validation("bad input")).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"], "VALIDATION");
        assert_eq!(json["detail"], "bad input");
    }

    #[tokio::test]
    async fn rate_limited_maps_to_429_with_retry_after() {
        let response = ApiError(GatewayError::rate_limited("slow down")).into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(response.headers().contains_key(header::RETRY_AFTER));
    }

    #[tokio::test]
    async fn not_found_maps_to_404() {
        let response = ApiError(GatewayError::not_found("no such account")).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn auth_and_backend_both_map_to_502() {
        assert_eq!(
            ApiError(GatewayError::auth("x")).into_response().status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError(GatewayError::backend("x")).into_response().status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[tokio::test]
    async fn timeout_maps_to_504() {
        let response = ApiError(GatewayError::timeout("x")).into_response();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    }
}
