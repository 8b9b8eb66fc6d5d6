use actix_web::HttpResponse;
use thiserror::Error;

use crate::domain::errors::DomainError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found")]
    NotFound,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Payment unavailable: {0}")]
    PaymentUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::NotFound => AppError::NotFound,
            DomainError::Validation(msg) => AppError::BadRequest(msg),
            e @ DomainError::OrphanPayment { .. } => AppError::BadRequest(e.to_string()),
            DomainError::Conflict(msg) => AppError::Conflict(msg),
            DomainError::PaymentInitiation(msg) => AppError::PaymentUnavailable(msg),
            DomainError::GatewayLookup(msg) | DomainError::Storage(msg) => AppError::Internal(msg),
        }
    }
}

impl actix_web::ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::NotFound => HttpResponse::NotFound().json(serde_json::json!({
                "error": self.to_string()
            })),
            AppError::BadRequest(_) => HttpResponse::BadRequest().json(serde_json::json!({
                "error": self.to_string()
            })),
            AppError::Conflict(_) => HttpResponse::Conflict().json(serde_json::json!({
                "error": self.to_string()
            })),
            AppError::MethodNotAllowed => HttpResponse::MethodNotAllowed().json(serde_json::json!({
                "error": self.to_string()
            })),
            AppError::PaymentUnavailable(_) => {
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": "Payment could not be started, please try again"
                }))
            }
            AppError::Internal(_) => HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Internal server error"
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::ResponseError;

    #[test]
    fn not_found_returns_404() {
        let resp = AppError::NotFound.error_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn internal_error_returns_500() {
        let err = AppError::Internal("something went wrong".to_string());
        assert_eq!(err.error_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn method_not_allowed_returns_405() {
        assert_eq!(
            AppError::MethodNotAllowed.error_response().status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
    }

    #[test]
    fn bad_request_display_is_the_message() {
        assert_eq!(
            AppError::BadRequest("storeId is required".to_string()).to_string(),
            "storeId is required"
        );
    }

    #[test]
    fn domain_validation_maps_to_400() {
        let app_err: AppError = DomainError::validation("total mismatch").into();
        assert!(matches!(app_err, AppError::BadRequest(_)));
        assert_eq!(app_err.error_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn domain_orphan_payment_maps_to_400() {
        let app_err: AppError = DomainError::orphan("tr_1", "no order id").into();
        assert_eq!(app_err.error_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn domain_payment_initiation_maps_to_500() {
        let app_err: AppError = DomainError::PaymentInitiation("timeout".to_string()).into();
        assert!(matches!(app_err, AppError::PaymentUnavailable(_)));
        assert_eq!(app_err.error_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn domain_lookup_and_storage_map_to_500() {
        for err in [
            DomainError::GatewayLookup("502".to_string()),
            DomainError::Storage("pool exhausted".to_string()),
        ] {
            let app_err: AppError = err.into();
            assert!(matches!(app_err, AppError::Internal(_)));
        }
    }

    #[test]
    fn domain_not_found_maps_to_app_not_found() {
        let app_err: AppError = DomainError::NotFound.into();
        assert!(matches!(app_err, AppError::NotFound));
    }

    #[test]
    fn domain_conflict_maps_to_409() {
        let app_err: AppError = DomainError::Conflict("already linked".to_string()).into();
        assert_eq!(app_err.error_response().status(), StatusCode::CONFLICT);
    }
}
