use crate::humanize::HumanDuration;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub github: GitHubConfig,
    #[serde(default)]
    pub card_api: CardApiConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub run: RunConfig,
}

/// GitHub GraphQL search settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GitHubConfig {
    #[serde(default = "default_github_endpoint")]
    pub endpoint: String,
    /// Users requested per search page (GraphQL caps this at 100)
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_search_query")]
    pub search_query: String,
    /// Personal access token (loaded from environment, not from config file)
    #[serde(skip)]
    pub token: Option<String>,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            endpoint: default_github_endpoint(),
            page_size: default_page_size(),
            search_query: default_search_query(),
            token: None,
        }
    }
}

fn default_github_endpoint() -> String {
    "https://api.github.com/graphql".to_string()
}

fn default_page_size() -> u32 {
    100
}

fn default_search_query() -> String {
    "type:user".to_string()
}

/// Card image API settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CardApiConfig {
    pub base_url: Option<String>,
    #[serde(default = "default_jwt_algorithm")]
    pub jwt_algorithm: String,
    pub jwt_issuer: Option<String>,
    /// Lifetime of each minted token
    #[serde(default = "default_token_ttl")]
    pub token_ttl: HumanDuration,
    /// Signing secret or PEM key (loaded from environment, not from config file)
    #[serde(skip)]
    pub jwt_secret: Option<String>,
}

impl Default for CardApiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            jwt_algorithm: default_jwt_algorithm(),
            jwt_issuer: None,
            token_ttl: default_token_ttl(),
            jwt_secret: None,
        }
    }
}

fn default_jwt_algorithm() -> String {
    "HS256".to_string()
}

fn default_token_ttl() -> HumanDuration {
    HumanDuration::from_secs(60 * 60)
}

/// Card generation retry policy
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Flat delay between attempts
    #[serde(default = "default_wait")]
    pub wait: HumanDuration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            wait: default_wait(),
        }
    }
}

fn default_max_attempts() -> u32 {
    2
}

fn default_wait() -> HumanDuration {
    HumanDuration::from_secs(60)
}

/// Outbound HTTP client settings shared by both endpoints
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: HumanDuration,
    #[serde(default = "default_request_timeout")]
    pub request_timeout: HumanDuration,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: default_connect_timeout(),
            request_timeout: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_connect_timeout() -> HumanDuration {
    HumanDuration::from_secs(10)
}

fn default_request_timeout() -> HumanDuration {
    HumanDuration::from_secs(60)
}

fn default_user_agent() -> String {
    format!("booster/{}", env!("CARGO_PKG_VERSION"))
}

/// Per-run discovery settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RunConfig {
    /// New users to collect per run
    #[serde(default = "default_target")]
    pub target: usize,
    #[serde(default = "default_ledger_path")]
    pub ledger_path: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            target: default_target(),
            ledger_path: default_ledger_path(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_target() -> usize {
    10
}

fn default_ledger_path() -> PathBuf {
    PathBuf::from("README.md")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.github.endpoint, "https://api.github.com/graphql");
        assert_eq!(config.github.page_size, 100);
        assert_eq!(config.card_api.jwt_algorithm, "HS256");
        assert_eq!(config.card_api.token_ttl.as_duration(), Duration::from_secs(3600));
        assert_eq!(config.retry.max_attempts, 2);
        assert_eq!(config.retry.wait.as_duration(), Duration::from_secs(60));
        assert_eq!(config.run.target, 10);
        assert_eq!(config.run.ledger_path, PathBuf::from("README.md"));
    }

    #[test]
    fn test_secrets_are_not_serialized() {
        let mut config = Config::default();
        config.github.token = Some("ghp_secret".to_string());
        config.card_api.jwt_secret = Some("shh".to_string());

        let rendered = serde_json::to_string(&config).unwrap();
        assert!(!rendered.contains("ghp_secret"));
        assert!(!rendered.contains("shh"));
    }
}
