//! HTTP fetching for remote modules and stylesheets

use async_trait::async_trait;
use hotwidget_kernel::config::HttpConfig;
use hotwidget_kernel::document::StylesheetFetcher;
use hotwidget_kernel::error::{WidgetError, WidgetResult};
use tracing::debug;

/// `reqwest`-backed fetcher
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &HttpConfig) -> WidgetResult<Self> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| WidgetError::Config(format!("HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Wrap an existing client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// GET `url` and return the body as text
    ///
    /// Network errors and non-success statuses both become
    /// [`WidgetError::Fetch`].
    pub async fn fetch_text(&self, url: &str) -> WidgetResult<String> {
        let fetch_error = |reason: String| WidgetError::Fetch {
            url: url.to_string(),
            reason,
        };

        debug!(url, "fetching");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_error(format!("HTTP {}", status)));
        }

        response.text().await.map_err(|e| fetch_error(e.to_string()))
    }
}

#[async_trait]
impl StylesheetFetcher for HttpFetcher {
    async fn fetch(&self, href: &str) -> WidgetResult<String> {
        self.fetch_text(href).await
    }
}
