pub mod checkout;
pub mod orders;
pub mod webhook;

use std::str::FromStr;

use actix_web::{error, web, HttpResponse, ResponseError};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::errors::AppError;

/// JSON extraction settings shared by every endpoint: malformed bodies are
/// reported as `400 {error}` like any other invalid input.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(64 * 1024)
        .error_handler(|err, _req| {
            let message = match &err {
                error::JsonPayloadError::ContentType => {
                    "Content-Type must be application/json".to_string()
                }
                other => format!("Invalid request body: {other}"),
            };
            error::InternalError::from_response(err, AppError::BadRequest(message).error_response())
                .into()
        })
}

/// Fallback for known paths called with the wrong method.
pub async fn method_not_allowed() -> Result<HttpResponse, AppError> {
    Err(AppError::MethodNotAllowed)
}

/// Accept a monetary amount as a JSON number (`29.99`) or a decimal string (`"29.99"`).
pub fn deserialize_decimal<'de, D>(deserializer: D) -> Result<BigDecimal, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        other => {
            return Err(serde::de::Error::custom(format!(
                "expected a number or decimal string, got {other}"
            )))
        }
    };
    BigDecimal::from_str(&raw)
        .map_err(|e| serde::de::Error::custom(format!("invalid amount '{raw}': {e}")))
}
