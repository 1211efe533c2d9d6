//! Requests against the content API's entries endpoint.

use std::time::Duration;

use tracing::{info, warn};
use url::Url;

use crate::{config::Config, envelope::Envelope};

/// Deepest link expansion the content API accepts.
pub const MAX_INCLUDE: u8 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub content_type: String,
    pub include: u8,
    pub fields: Vec<(String, String)>,
    pub order: Option<String>,
    pub limit: Option<u32>,
}

impl Query {
    pub fn new(content_type: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            include: 0,
            fields: Vec::new(),
            order: None,
            limit: None,
        }
    }

    pub fn include(mut self, depth: u8) -> Self {
        self.include = depth.min(MAX_INCLUDE);
        self
    }

    /// Adds a `fields.{name}={value}` equality filter.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    pub fn order(mut self, order: impl Into<String>) -> Self {
        self.order = Some(order.into());
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn url(&self, endpoint: &Url) -> Url {
        let mut url = endpoint.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("content_type", &self.content_type)
                .append_pair("include", &self.include.to_string());
            for (name, value) in &self.fields {
                pairs.append_pair(&format!("fields.{name}"), value);
            }
            if let Some(order) = &self.order {
                pairs.append_pair("order", order);
            }
            if let Some(limit) = self.limit {
                pairs.append_pair("limit", &limit.to_string());
            }
        }
        url
    }

    fn error(&self, cause: FetchErrorCause) -> FetchError {
        FetchError {
            content_type: self.content_type.clone(),
            cause,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FetchErrorCause {
    #[error("transport error: {0}")]
    Transport(reqwest::Error),
    #[error("unexpected status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("failed to decode response: {0}")]
    Decode(reqwest::Error),
}

#[derive(Debug, thiserror::Error)]
#[error("failed to fetch {content_type}: {cause}")]
pub struct FetchError {
    pub content_type: String,
    pub cause: FetchErrorCause,
}

impl FetchError {
    pub fn status(content_type: impl Into<String>, status: reqwest::StatusCode) -> Self {
        Self {
            content_type: content_type.into(),
            cause: FetchErrorCause::Status {
                status,
                body: String::new(),
            },
        }
    }
}

pub trait ContentSource {
    /// Fetches one page of entries together with everything they link to.
    fn fetch(&self, query: &Query) -> impl Future<Output = Result<Envelope, FetchError>> + Send;
}

pub struct HttpFetcher {
    endpoint: Url,
    token: String,
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(endpoint: Url, token: impl Into<String>) -> Self {
        Self::with_client(endpoint, token, reqwest::Client::new())
    }

    pub fn with_client(endpoint: Url, token: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            endpoint,
            token: token.into(),
            client,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(Self::with_client(
            config.endpoint.clone(),
            config.token.clone(),
            builder.build()?,
        ))
    }
}

impl ContentSource for HttpFetcher {
    async fn fetch(&self, query: &Query) -> Result<Envelope, FetchError> {
        info!(
            content_type = %query.content_type,
            include = query.include,
            "fetching content"
        );
        let response = self
            .client
            .get(query.url(&self.endpoint))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|error| query.error(FetchErrorCause::Transport(error)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(content_type = %query.content_type, %status, "content api rejected request");
            return Err(query.error(FetchErrorCause::Status { status, body }));
        }
        response
            .json::<Envelope>()
            .await
            .map_err(|error| query.error(FetchErrorCause::Decode(error)))
    }
}
