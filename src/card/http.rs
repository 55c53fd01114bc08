//! HTTP client for the card image API

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, StatusCode, Url};
use tracing::debug;

use super::token::TokenMinter;
use super::{CardApi, CardError, Result};

/// Issues `GET {base}/user/{username}?number={ordinal}` with a freshly minted
/// bearer token per request
pub struct HttpCardApi {
    client: Client,
    base_url: Url,
    minter: TokenMinter,
}

impl HttpCardApi {
    pub fn new(client: Client, base_url: &str, minter: TokenMinter) -> Result<Self> {
        let base_url =
            Url::parse(base_url).map_err(|e| CardError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(CardError::InvalidUrl(base_url.to_string()));
        }

        Ok(Self {
            client,
            base_url,
            minter,
        })
    }

    /// Card URL for one user; the username is percent-encoded as a path segment
    pub fn card_url(&self, username: &str, ordinal: usize) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| CardError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push("user")
            .push(username);
        url.query_pairs_mut()
            .append_pair("number", &ordinal.to_string());
        Ok(url)
    }
}

#[async_trait]
impl CardApi for HttpCardApi {
    async fn fetch_card(&self, username: &str, ordinal: usize) -> Result<Bytes> {
        let url = self.card_url(username, ordinal)?;
        let token = self.minter.mint()?;

        debug!(%url, "Requesting card");

        let response = self
            .client
            .get(url)
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .send()
            .await?;

        // Only a plain 200 counts; other 2xx codes carry no image
        let status = response.status();
        if status != StatusCode::OK {
            return Err(CardError::Status(status.as_u16()));
        }

        let bytes = response.bytes().await?;
        debug!(username, size = bytes.len(), "Card received");

        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn api(base: &str) -> Result<HttpCardApi> {
        let minter =
            TokenMinter::new("HS256", Some("secret"), None, Duration::from_secs(3600)).unwrap();
        HttpCardApi::new(Client::new(), base, minter)
    }

    #[test]
    fn test_card_url() {
        let api = api("https://cards.example.com").unwrap();
        let url = api.card_url("alice", 3).unwrap();
        assert_eq!(url.as_str(), "https://cards.example.com/user/alice?number=3");
    }

    #[test]
    fn test_card_url_keeps_base_path() {
        let api = api("https://example.com/api/").unwrap();
        let url = api.card_url("bob", 1).unwrap();
        assert_eq!(url.as_str(), "https://example.com/api/user/bob?number=1");
    }

    #[test]
    fn test_card_url_escapes_username() {
        let api = api("https://cards.example.com").unwrap();
        let url = api.card_url("a/b c", 1).unwrap();
        assert_eq!(url.as_str(), "https://cards.example.com/user/a%2Fb%20c?number=1");
    }

    #[test]
    fn test_rejects_invalid_base() {
        assert!(matches!(api("not a url"), Err(CardError::InvalidUrl(_))));
        assert!(matches!(api("data:text/plain,hi"), Err(CardError::InvalidUrl(_))));
    }
}
