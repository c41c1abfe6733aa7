use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

// Some channel pages only expose the canonical link when the request
// looks like a browser.
const SCRAPE_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Boundary between the client and the network.
///
/// Production uses [`HttpTransport`]; tests substitute a scripted fake to
/// count and inspect requests.
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET a JSON document. `query` is appended to the URL verbatim.
    async fn get_json(&self, url: &str, query: &[(String, String)]) -> Result<Value>;

    /// GET a page as text (channel-URL scraping).
    async fn get_html(&self, url: &str) -> Result<String>;
}

pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(SCRAPE_USER_AGENT)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_json(&self, url: &str, query: &[(String, String)]) -> Result<Value> {
        let response = self.client.get(url).query(query).send().await?;
        // Quota and key errors come back as JSON bodies with non-2xx
        // statuses, so decode the body regardless of the status code.
        Ok(response.json().await?)
    }

    async fn get_html(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .header("Accept-Language", "en-US,en;q=0.5")
            .send()
            .await?;
        Ok(response.text().await?)
    }
}
