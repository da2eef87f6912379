//! Content extraction adapter
//!
//! Loads a URL in a browser session and extracts `PageSignals`. Sessions are
//! held through `SessionScope`, which closes them on every exit path: the
//! normal paths release explicitly, and dropping an unreleased scope (task
//! cancelled, panic) hands the session to a background close.

use bpa_common::config::ExtractionConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, warn};
use url::Url;

use super::page_signals::parse_signals;
use crate::types::{Browser, BrowserSession, ExtractionError, PageSignals};

/// Add a scheme when missing and validate the result
pub fn normalize_url(raw: &str) -> Result<Url, ExtractionError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ExtractionError::InvalidUrl("empty URL".to_string()));
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed.trim_start_matches('/'))
    };

    let url = Url::parse(&candidate)
        .map_err(|e| ExtractionError::InvalidUrl(format!("{}: {}", trimmed, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ExtractionError::InvalidUrl(format!(
            "unsupported scheme: {}",
            url.scheme()
        )));
    }
    if url.host_str().map(str::is_empty).unwrap_or(true) {
        return Err(ExtractionError::InvalidUrl(format!("no host in {}", trimmed)));
    }

    Ok(url)
}

/// A browser session bound to a concurrency slot
pub struct SessionScope {
    session: Option<Box<dyn BrowserSession>>,
    permit: Option<OwnedSemaphorePermit>,
}

impl SessionScope {
    /// Wait for a free slot, then open a session
    pub async fn acquire(
        browser: &dyn Browser,
        slots: Arc<Semaphore>,
    ) -> Result<Self, ExtractionError> {
        let permit = slots
            .acquire_owned()
            .await
            .map_err(|_| ExtractionError::Browser("session pool closed".to_string()))?;
        let session = browser.open_session().await?;
        Ok(Self {
            session: Some(session),
            permit: Some(permit),
        })
    }

    pub fn session(&mut self) -> Result<&mut (dyn BrowserSession + 'static), ExtractionError> {
        self.session
            .as_deref_mut()
            .ok_or_else(|| ExtractionError::Browser("session already released".to_string()))
    }

    /// Close the session and free the slot
    pub async fn release(mut self) {
        if let Some(mut session) = self.session.take() {
            session.close().await;
        }
        self.permit.take();
    }
}

impl Drop for SessionScope {
    fn drop(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        let permit = self.permit.take();

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                debug!("Browser session dropped unreleased, closing in background");
                handle.spawn(async move {
                    session.close().await;
                    drop(permit);
                });
            }
            Err(_) => warn!("Browser session dropped outside a runtime, close skipped"),
        }
    }
}

pub struct PageExtractor {
    browser: Arc<dyn Browser>,
    sessions: Arc<Semaphore>,
    navigation_timeout: Duration,
    max_visible_text_chars: usize,
}

impl PageExtractor {
    pub fn new(browser: Arc<dyn Browser>, config: &ExtractionConfig) -> Self {
        Self {
            browser,
            sessions: Arc::new(Semaphore::new(config.max_concurrent_sessions.max(1))),
            navigation_timeout: Duration::from_secs(config.navigation_timeout_secs),
            max_visible_text_chars: config.max_visible_text_chars,
        }
    }

    /// Load `raw_url` and extract its signals
    pub async fn extract(&self, raw_url: &str) -> Result<PageSignals, ExtractionError> {
        let url = normalize_url(raw_url)?;

        let mut scope = SessionScope::acquire(self.browser.as_ref(), self.sessions.clone()).await?;
        let outcome = self.drive(&mut scope, &url).await;
        scope.release().await;

        match &outcome {
            Ok(signals) => debug!(
                url = %url,
                text_chars = signals.visible_text.chars().count(),
                "Page extracted"
            ),
            Err(e) => warn!(url = %url, error = %e, "Page extraction failed"),
        }
        outcome
    }

    async fn drive(
        &self,
        scope: &mut SessionScope,
        url: &Url,
    ) -> Result<PageSignals, ExtractionError> {
        let session = scope.session()?;

        let navigation = session.navigate(url, self.navigation_timeout);
        let response = tokio::time::timeout(self.navigation_timeout, navigation)
            .await
            .map_err(|_| {
                ExtractionError::NavigationFailed(format!(
                    "no response within {}s",
                    self.navigation_timeout.as_secs()
                ))
            })??;

        if !(200..300).contains(&response.status) {
            return Err(ExtractionError::NavigationFailed(format!(
                "status {}",
                response.status
            )));
        }

        let html = session.content().await?;
        Ok(parse_signals(&html, response.final_url.as_str(), self.max_visible_text_chars))
    }
}
