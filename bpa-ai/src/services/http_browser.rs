//! HTTP-backed browser
//!
//! Fetches pages with browser-like headers and exposes the response body as
//! the page content. Scripts are not executed.

use async_trait::async_trait;
use std::time::Duration;
use url::Url;

use crate::types::{Browser, BrowserSession, ExtractionError, NavigationResponse};

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
                                  (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Upper bound on the body kept per page
const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

pub struct HttpBrowser {
    http_client: reqwest::Client,
}

impl HttpBrowser {
    pub fn new() -> Result<Self, ExtractionError> {
        let http_client = reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| ExtractionError::Browser(format!("HTTP client init failed: {}", e)))?;
        Ok(Self { http_client })
    }
}

#[async_trait]
impl Browser for HttpBrowser {
    async fn open_session(&self) -> Result<Box<dyn BrowserSession>, ExtractionError> {
        Ok(Box::new(HttpSession {
            http_client: self.http_client.clone(),
            body: None,
        }))
    }
}

/// Body bytes up to `cap`; the rest of the stream is left unread
async fn read_capped(
    response: &mut reqwest::Response,
    cap: usize,
) -> Result<Vec<u8>, reqwest::Error> {
    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        if append_capped(&mut body, &chunk, cap) {
            break;
        }
    }
    Ok(body)
}

/// Append what fits under `cap`; true once the cap is reached
fn append_capped(body: &mut Vec<u8>, chunk: &[u8], cap: usize) -> bool {
    let room = cap.saturating_sub(body.len());
    body.extend_from_slice(&chunk[..chunk.len().min(room)]);
    body.len() >= cap
}

struct HttpSession {
    http_client: reqwest::Client,
    body: Option<String>,
}

#[async_trait]
impl BrowserSession for HttpSession {
    async fn navigate(
        &mut self,
        url: &Url,
        timeout: Duration,
    ) -> Result<NavigationResponse, ExtractionError> {
        self.body = None;

        let http_client = self.http_client.clone();
        let target = url.clone();
        let fetch = async move {
            let mut response = http_client
                .get(target)
                .header(reqwest::header::ACCEPT, "text/html,application/xhtml+xml")
                .header(reqwest::header::ACCEPT_LANGUAGE, "en;q=0.9,sv;q=0.8")
                .send()
                .await?;
            let status = response.status().as_u16();
            let final_url = response.url().clone();
            let body = read_capped(&mut response, MAX_BODY_BYTES).await?;
            Ok::<_, reqwest::Error>((status, final_url, body))
        };

        let (status, final_url, body) = match tokio::time::timeout(timeout, fetch).await {
            Ok(Ok(parts)) => parts,
            Ok(Err(e)) => {
                return Err(ExtractionError::NavigationFailed(e.without_url().to_string()));
            }
            Err(_) => {
                return Err(ExtractionError::NavigationFailed(format!(
                    "no response within {}s",
                    timeout.as_secs()
                )));
            }
        };

        self.body = Some(String::from_utf8_lossy(&body).into_owned());

        Ok(NavigationResponse { status, final_url })
    }

    async fn content(&mut self) -> Result<String, ExtractionError> {
        self.body
            .clone()
            .ok_or_else(|| ExtractionError::Browser("no page loaded".to_string()))
    }

    async fn close(&mut self) {
        self.body = None;
    }
}
