use std::env;
use std::time::Duration;

use thiserror::Error;

use crate::application::order_service::CheckoutSettings;

pub const DEFAULT_MOLLIE_API_URL: &str = "https://api.mollie.com/v2";
pub const DEFAULT_PAYMENT_METHODS: &str = "ideal,creditcard,bancontact,sofort,paypal";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres { database_url: String },
    Memory,
}

#[derive(Debug, Clone)]
pub struct MollieConfig {
    pub api_key: String,
    pub api_url: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub store: StoreBackend,
    pub mollie: MollieConfig,
    pub checkout: CheckoutSettings,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the configuration from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &'static str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &'static str| var(name).ok_or(ConfigError::Missing(name));

        let port = match var("PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                reason: format!("'{raw}' is not a port number"),
            })?,
            None => 8080,
        };

        let store = match var("ORDER_STORE").as_deref().map(str::trim) {
            None | Some("postgres") => StoreBackend::Postgres {
                database_url: required("DATABASE_URL")?,
            },
            Some("memory") => StoreBackend::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "ORDER_STORE",
                    reason: format!("'{other}' is not one of postgres, memory"),
                })
            }
        };

        let timeout = match var("GATEWAY_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "GATEWAY_TIMEOUT_SECS",
                        reason: format!("'{raw}' is not a positive number of seconds"),
                    })
                }
            },
            None => Duration::from_secs(10),
        };

        let public_base_url = required("PUBLIC_BASE_URL")?;
        if !(public_base_url.starts_with("http://") || public_base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                name: "PUBLIC_BASE_URL",
                reason: format!("'{public_base_url}' must be an http(s) URL"),
            });
        }

        let payment_methods = var("PAYMENT_METHODS")
            .unwrap_or_else(|| DEFAULT_PAYMENT_METHODS.to_string())
            .split(',')
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self {
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            store,
            mollie: MollieConfig {
                api_key: required("MOLLIE_API_KEY")?,
                api_url: var("MOLLIE_API_URL").unwrap_or_else(|| DEFAULT_MOLLIE_API_URL.to_string()),
                timeout,
            },
            checkout: CheckoutSettings {
                public_base_url,
                payment_methods,
                gateway_timeout: timeout,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    fn minimal() -> Vec<(&'static str, &'static str)> {
        vec![
            ("DATABASE_URL", "postgres://localhost/storefront"),
            ("MOLLIE_API_KEY", "test_dHar4XY7LxsDOtmnkVtjNVWXLSlXsM"),
            ("PUBLIC_BASE_URL", "https://shop.example"),
        ]
    }

    #[test]
    fn defaults_apply_when_only_required_values_are_set() {
        let config = AppConfig::from_lookup(lookup(&minimal())).unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(
            config.store,
            StoreBackend::Postgres {
                database_url: "postgres://localhost/storefront".to_string()
            }
        );
        assert_eq!(config.mollie.api_url, DEFAULT_MOLLIE_API_URL);
        assert_eq!(config.mollie.timeout, Duration::from_secs(10));
        assert_eq!(config.checkout.gateway_timeout, Duration::from_secs(10));
        assert_eq!(
            config.checkout.payment_methods,
            vec!["ideal", "creditcard", "bancontact", "sofort", "paypal"]
        );
    }

    #[test]
    fn memory_store_does_not_need_a_database() {
        let config = AppConfig::from_lookup(lookup(&[
            ("ORDER_STORE", "memory"),
            ("MOLLIE_API_KEY", "test_key"),
            ("PUBLIC_BASE_URL", "http://localhost:8080"),
        ]))
        .unwrap();
        assert_eq!(config.store, StoreBackend::Memory);
    }

    #[test]
    fn missing_api_key_is_reported() {
        let err = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/storefront"),
            ("PUBLIC_BASE_URL", "https://shop.example"),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::Missing("MOLLIE_API_KEY"));
    }

    #[test]
    fn invalid_values_are_rejected() {
        for (name, value) in [
            ("PORT", "eighty"),
            ("GATEWAY_TIMEOUT_SECS", "0"),
            ("ORDER_STORE", "firestore"),
            ("PUBLIC_BASE_URL", "shop.example"),
        ] {
            let mut vars = minimal();
            vars.retain(|(k, _)| *k != name);
            vars.push((name, value));
            let err = AppConfig::from_lookup(lookup(&vars)).unwrap_err();
            assert!(
                matches!(err, ConfigError::Invalid { name: n, .. } if n == name),
                "{name}={value} should be rejected, got {err:?}"
            );
        }
    }

    #[test]
    fn payment_methods_are_parsed_from_a_list() {
        let mut vars = minimal();
        vars.push(("PAYMENT_METHODS", " ideal , ,paypal"));
        let config = AppConfig::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.checkout.payment_methods, vec!["ideal", "paypal"]);
    }
}
