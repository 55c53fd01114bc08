//! GitHub GraphQL user search

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use super::{Page, Result, SourceError, UserSource};
use crate::config::GitHubConfig;

const SEARCH_QUERY: &str = r#"
query($cursor: String, $query: String!, $first: Int!) {
  users: search(query: $query, type: USER, first: $first, after: $cursor) {
    edges { node { ... on User { login } } }
    pageInfo { endCursor hasNextPage }
  }
}
"#;

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<SearchData>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct SearchData {
    users: Option<UserConnection>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserConnection {
    #[serde(default)]
    edges: Vec<Edge>,
    page_info: PageInfo,
}

#[derive(Debug, Deserialize)]
struct Edge {
    node: Option<Node>,
}

/// Organizations and other non-user results come back as empty objects
#[derive(Debug, Deserialize)]
struct Node {
    login: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    end_cursor: Option<String>,
    has_next_page: bool,
}

/// [`UserSource`] backed by the GitHub GraphQL search API
pub struct GitHubSource {
    client: Client,
    endpoint: String,
    token: String,
    search_query: String,
    page_size: u32,
}

impl GitHubSource {
    pub fn new(client: Client, config: &GitHubConfig, token: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
            token: token.into(),
            search_query: config.search_query.clone(),
            page_size: config.page_size,
        }
    }
}

#[async_trait]
impl UserSource for GitHubSource {
    async fn fetch_page(&self, cursor: Option<&str>) -> Result<Page> {
        debug!(endpoint = %self.endpoint, cursor, "Fetching user page");

        let body = json!({
            "query": SEARCH_QUERY,
            "variables": {
                "cursor": cursor,
                "query": self.search_query,
                "first": self.page_size,
            },
        });

        let response = self
            .client
            .post(&self.endpoint)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let page = parse_page(&text)?;
        debug!(
            logins = page.logins.len(),
            has_next_page = page.has_next_page,
            "Fetched user page"
        );
        Ok(page)
    }
}

/// Decode a GraphQL search response body into a [`Page`]
pub fn parse_page(body: &str) -> Result<Page> {
    let response: GraphQlResponse =
        serde_json::from_str(body).map_err(|e| SourceError::Malformed(e.to_string()))?;

    let messages = || {
        response
            .errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    };

    let Some(users) = response.data.as_ref().and_then(|d| d.users.as_ref()) else {
        if response.errors.is_empty() {
            return Err(SourceError::Malformed("missing data.users".to_string()));
        }
        return Err(SourceError::GraphQl(messages()));
    };

    if !response.errors.is_empty() {
        warn!(errors = %messages(), "Search returned partial results");
    }

    let logins = users
        .edges
        .iter()
        .filter_map(|edge| edge.node.as_ref()?.login.clone())
        .collect();

    Ok(Page {
        logins,
        end_cursor: users.page_info.end_cursor.clone(),
        has_next_page: users.page_info.has_next_page,
    })
}
