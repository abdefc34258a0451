//! Core error kinds and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::domain::order::OrderStatus;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("quantity must be at least 1")]
    InvalidQuantity,

    #[error("insufficient stock for {product}: {available} available")]
    InsufficientStock { product: String, available: i32 },

    #[error("cart is empty")]
    EmptyCart,

    #[error("invalid payment proof: {0}")]
    InvalidPaymentProof(String),

    #[error("cannot change order from '{from}' to '{to}'")]
    IllegalTransition { from: OrderStatus, to: OrderStatus },

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Forbidden(String),

    #[error("authentication required")]
    Unauthorized,

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    fn status(&self) -> StatusCode {
        match self {
            Error::InvalidQuantity
            | Error::InsufficientStock { .. }
            | Error::EmptyCart
            | Error::InvalidPaymentProof(_)
            | Error::IllegalTransition { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            Error::Unauthorized => StatusCode::UNAUTHORIZED,
            Error::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Error::InvalidQuantity => "invalid_quantity",
            Error::InsufficientStock { .. } => "insufficient_stock",
            Error::EmptyCart => "empty_cart",
            Error::InvalidPaymentProof(_) => "invalid_payment_proof",
            Error::IllegalTransition { .. } => "illegal_transition",
            Error::NotFound(_) => "not_found",
            Error::Forbidden(_) => "forbidden",
            Error::Unauthorized => "unauthorized",
            Error::Validation(_) => "validation",
            Error::Database(_) => "database",
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        // Database details stay out of responses.
        let message = match &self {
            Error::Database(_) => "internal server error".to_string(),
            other => other.to_string(),
        };

        let mut body = json!({ "error": self.kind(), "message": message });
        match &self {
            Error::InsufficientStock { product, available } => {
                body["product"] = json!(product);
                body["available"] = json!(available);
            }
            Error::IllegalTransition { from, to } => {
                body["from"] = json!(from);
                body["to"] = json!(to);
            }
            _ => {}
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_map_to_400() {
        assert_eq!(Error::EmptyCart.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            Error::InsufficientStock { product: "Merino DK".into(), available: 2 }.status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::IllegalTransition { from: OrderStatus::Completed, to: OrderStatus::Confirmed }
                .status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn lookup_and_access_errors_keep_their_codes() {
        assert_eq!(Error::NotFound("order").status(), StatusCode::NOT_FOUND);
        assert_eq!(Error::Forbidden("not yours".into()).status(), StatusCode::FORBIDDEN);
        assert_eq!(Error::Unauthorized.status(), StatusCode::UNAUTHORIZED);
    }
}
