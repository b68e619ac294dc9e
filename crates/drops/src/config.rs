//! Content store, chain, and wallet configuration.

use crate::wallet::WalletKind;

/// Sanity query API version the projections are written against.
pub const CONTENT_API_VERSION: &str = "2021-10-21";

/// Content store (Sanity) configuration.
#[derive(Debug, Clone)]
pub struct ContentConfig {
    pub project_id: String,
    /// Dataset name (e.g. `production`).
    pub dataset: String,
    pub api_version: String,
    /// Query through `apicdn.sanity.io` instead of the live API.
    pub use_cdn: bool,
    /// Overrides the derived API host (tests, proxies). `None` uses Sanity.
    pub base_url: Option<String>,
    pub retry: RetryConfig,
}

impl ContentConfig {
    pub fn new(project_id: impl Into<String>, dataset: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            dataset: dataset.into(),
            api_version: CONTENT_API_VERSION.to_string(),
            use_cdn: false,
            base_url: None,
            retry: RetryConfig::default(),
        }
    }

    /// Reads `SANITY_PROJECT_ID` and `SANITY_DATASET` (default `production`),
    /// falling back to the lowercase `sanity_project_id` / `sanity_dataset`.
    /// `NODE_ENV=production` enables the CDN.
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |upper: &str| {
            var(upper)
                .or_else(|| var(upper.to_ascii_lowercase().as_str()))
                .filter(|v| !v.is_empty())
        };
        let project_id = lookup("SANITY_PROJECT_ID").unwrap_or_default();
        let dataset = lookup("SANITY_DATASET").unwrap_or_else(|| "production".to_string());
        let mut config = Self::new(project_id, dataset);
        config.use_cdn = var("NODE_ENV").is_some_and(|v| v == "production");
        config
    }

    /// Query endpoint for the configured project and dataset.
    pub fn query_url(&self) -> String {
        let base = match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => {
                let host = if self.use_cdn { "apicdn.sanity.io" } else { "api.sanity.io" };
                format!("https://{}.{}", self.project_id, host)
            }
        };
        format!("{}/v{}/data/query/{}", base, self.api_version, self.dataset)
    }
}

/// Bounded retry with exponential backoff (initial and max milliseconds).
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts including the first one. 1 disables retry.
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 200,
            max_backoff_ms: 2_000,
        }
    }
}

impl RetryConfig {
    /// Backoff before retry number `attempt` (1-based), without jitter.
    pub fn backoff_ms(&self, attempt: u32) -> u64 {
        let factor = 1u64.checked_shl(attempt.saturating_sub(1)).unwrap_or(u64::MAX);
        self.initial_backoff_ms
            .saturating_mul(factor)
            .min(self.max_backoff_ms)
    }
}

/// Chain node used for contract reads and receipt polling.
#[derive(Debug, Clone)]
pub struct ChainConfig {
    /// HTTP JSON-RPC URL (eth_call, eth_getTransactionReceipt).
    pub rpc_url: String,
    pub receipt_poll_interval_ms: u64,
    pub receipt_timeout_secs: u64,
}

impl ChainConfig {
    pub fn new(rpc_url: impl Into<String>) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            receipt_poll_interval_ms: 1_000,
            receipt_timeout_secs: 120,
        }
    }
}

/// One wallet provider bridge (EIP-1193 over JSON-RPC).
#[derive(Debug, Clone)]
pub struct ProviderEndpoint {
    pub kind: WalletKind,
    pub url: String,
}

/// Wallet providers offered in the header menu, in display order.
#[derive(Debug, Clone, Default)]
pub struct WalletConfig {
    pub providers: Vec<ProviderEndpoint>,
}

impl WalletConfig {
    /// Adds (or replaces) the endpoint for `kind`.
    pub fn with_provider(mut self, kind: WalletKind, url: impl Into<String>) -> Self {
        self.providers.retain(|p| p.kind != kind);
        self.providers.push(ProviderEndpoint { kind, url: url.into() });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_config_default() {
        let c = RetryConfig::default();
        assert_eq!(c.max_attempts, 3);
        assert_eq!(c.initial_backoff_ms, 200);
        assert_eq!(c.max_backoff_ms, 2_000);
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let c = RetryConfig::default();
        assert_eq!(c.backoff_ms(1), 200);
        assert_eq!(c.backoff_ms(2), 400);
        assert_eq!(c.backoff_ms(3), 800);
        assert_eq!(c.backoff_ms(10), 2_000);
        assert_eq!(c.backoff_ms(200), 2_000);
    }

    #[test]
    fn query_url_live_and_cdn() {
        let mut c = ContentConfig::new("abc123", "production");
        assert_eq!(
            c.query_url(),
            "https://abc123.api.sanity.io/v2021-10-21/data/query/production"
        );
        c.use_cdn = true;
        assert_eq!(
            c.query_url(),
            "https://abc123.apicdn.sanity.io/v2021-10-21/data/query/production"
        );
    }

    #[test]
    fn query_url_base_override() {
        let mut c = ContentConfig::new("abc123", "staging");
        c.base_url = Some("http://127.0.0.1:4000/".into());
        assert_eq!(c.query_url(), "http://127.0.0.1:4000/v2021-10-21/data/query/staging");
    }

    fn vars(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |name| pairs.iter().find(|(k, _)| *k == name).map(|(_, v)| v.to_string())
    }

    #[test]
    fn env_names_upper_and_lower() {
        let c = ContentConfig::from_vars(vars(&[("SANITY_PROJECT_ID", "up"), ("sanity_project_id", "low")]));
        assert_eq!(c.project_id, "up");
        assert_eq!(c.dataset, "production");
        assert!(!c.use_cdn);

        let c = ContentConfig::from_vars(vars(&[
            ("sanity_project_id", "low"),
            ("sanity_dataset", "staging"),
            ("NODE_ENV", "production"),
        ]));
        assert_eq!(c.project_id, "low");
        assert_eq!(c.dataset, "staging");
        assert!(c.use_cdn);
    }

    #[test]
    fn wallet_config_replaces_same_kind() {
        let c = WalletConfig::default()
            .with_provider(WalletKind::MetaMask, "http://a")
            .with_provider(WalletKind::CoinbaseWallet, "http://b")
            .with_provider(WalletKind::MetaMask, "http://c");
        assert_eq!(c.providers.len(), 2);
        assert_eq!(c.providers[1].kind, WalletKind::MetaMask);
        assert_eq!(c.providers[1].url, "http://c");
    }
}
