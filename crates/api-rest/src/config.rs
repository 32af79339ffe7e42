//! Server configuration.
//!
//! Resolved once at startup and shared read-only with every handler.
//!
//! # Environment Variables
//! - `CAREBOOK_REST_ADDR`: listen address (default: `0.0.0.0:8000`)
//! - `CAREBOOK_API_TOKENS`: comma separated `token:provider` pairs; a bare token is
//!   its own provider (default: `dev-token:demo`)
//! - `CAREBOOK_PAGE_SIZE`: list page size (default: 10)
//! - `CAREBOOK_SEED_PATIENTS`: demo patients to create per provider at startup
//!   (default: 0)

use std::net::SocketAddr;

use crate::store::Provider;

pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_PAGE_SIZE: usize = 10;
const DEV_TOKENS: &str = "dev-token:demo";

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    tokens: Vec<(String, Provider)>,
    pub page_size: usize,
    pub seed_patients: usize,
}

impl ServerConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let value = |name: &str| lookup(name).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

        let addr_value = value("CAREBOOK_REST_ADDR").unwrap_or_else(|| DEFAULT_REST_ADDR.into());
        let addr = addr_value.parse().map_err(|e| ConfigError::Invalid {
            name: "CAREBOOK_REST_ADDR",
            reason: format!("{e} ('{addr_value}')"),
        })?;

        let tokens = match value("CAREBOOK_API_TOKENS") {
            Some(raw) => parse_tokens(&raw)?,
            None => {
                tracing::warn!("CAREBOOK_API_TOKENS not set, accepting the development token only");
                parse_tokens(DEV_TOKENS)?
            }
        };

        let page_size = parse_count(value("CAREBOOK_PAGE_SIZE"), "CAREBOOK_PAGE_SIZE", DEFAULT_PAGE_SIZE)?;
        if page_size == 0 {
            return Err(ConfigError::Invalid {
                name: "CAREBOOK_PAGE_SIZE",
                reason: "must be at least 1".into(),
            });
        }
        let seed_patients = parse_count(value("CAREBOOK_SEED_PATIENTS"), "CAREBOOK_SEED_PATIENTS", 0)?;

        Ok(Self {
            addr,
            tokens,
            page_size,
            seed_patients,
        })
    }

    /// Configuration for tests and embedding: the given tokens, default paging, no seeding.
    pub fn with_tokens<I, T, P>(tokens: I) -> Self
    where
        I: IntoIterator<Item = (T, P)>,
        T: Into<String>,
        P: Into<String>,
    {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            tokens: tokens
                .into_iter()
                .map(|(token, provider)| (token.into(), Provider::new(provider)))
                .collect(),
            page_size: DEFAULT_PAGE_SIZE,
            seed_patients: 0,
        }
    }

    /// The provider a bearer token authenticates as.
    pub fn provider_for(&self, token: &str) -> Option<&Provider> {
        self.tokens
            .iter()
            .find(|(known, _)| known == token)
            .map(|(_, provider)| provider)
    }

    /// Distinct providers in configuration order.
    pub fn providers(&self) -> Vec<Provider> {
        let mut providers: Vec<Provider> = Vec::new();
        for (_, provider) in &self.tokens {
            if !providers.contains(provider) {
                providers.push(provider.clone());
            }
        }
        providers
    }
}

fn parse_tokens(raw: &str) -> Result<Vec<(String, Provider)>, ConfigError> {
    let mut tokens = Vec::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (token, provider) = entry.split_once(':').unwrap_or((entry, entry));
        let (token, provider) = (token.trim(), provider.trim());
        if token.is_empty() || provider.is_empty() {
            return Err(ConfigError::Invalid {
                name: "CAREBOOK_API_TOKENS",
                reason: format!("malformed entry '{entry}'"),
            });
        }
        tokens.push((token.to_owned(), Provider::new(provider)));
    }
    if tokens.is_empty() {
        return Err(ConfigError::Invalid {
            name: "CAREBOOK_API_TOKENS",
            reason: "no tokens given".into(),
        });
    }
    Ok(tokens)
}

fn parse_count(value: Option<String>, name: &'static str, default: usize) -> Result<usize, ConfigError> {
    match value {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|e| ConfigError::Invalid {
            name,
            reason: format!("{e} ('{raw}')"),
        }),
    }
}
