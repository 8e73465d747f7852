//! JSON-over-HTTP item source.
//!
//! Navigating to an item fetches `<base>/events/<id>` and keeps the body for
//! that identifier; extracting decodes the kept body. Bodies are keyed by
//! identifier, so concurrent workflows never read each other's page.

use super::ItemSource;
use crate::errors::BoxError;
use crate::models::RawEventFields;
use crate::utils::truncate_for_log;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;
use tracing::{debug, instrument, warn};
use url::Url;

#[derive(Debug)]
pub struct HttpItemSource {
    client: reqwest::Client,
    base_url: Url,
    pages: Mutex<HashMap<String, String>>,
}

impl HttpItemSource {
    pub fn new(base_url: &str) -> Result<Self, BoxError> {
        let mut base_url = Url::parse(base_url)?;
        // `Url::join` drops the last path segment unless the base ends in '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url,
            pages: Mutex::new(HashMap::new()),
        })
    }

    pub fn event_url(&self, id: &str) -> Result<Url, BoxError> {
        Ok(self
            .base_url
            .join(&format!("events/{}", urlencoding::encode(id)))?)
    }

    fn keep_page(&self, id: &str, body: String) -> Result<(), BoxError> {
        let mut pages = self.pages.lock().map_err(|_| "page cache poisoned")?;
        pages.insert(id.to_string(), body);
        Ok(())
    }

    fn take_page(&self, id: &str) -> Result<Option<String>, BoxError> {
        let mut pages = self.pages.lock().map_err(|_| "page cache poisoned")?;
        Ok(pages.remove(id))
    }
}

impl ItemSource for HttpItemSource {
    #[instrument(level = "debug", skip(self))]
    async fn navigate_to(&self, id: &str) -> Result<(), BoxError> {
        let url = self.event_url(id)?;
        let t0 = Instant::now();
        let resp = self.client.get(url.clone()).send().await?;
        let status = resp.status();
        if !status.is_success() {
            warn!(%url, %status, "Event request rejected");
            return Err(format!("{url} returned HTTP {status}").into());
        }
        let body = resp.text().await?;
        debug!(
            %url,
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched event page"
        );
        self.keep_page(id, body)
    }

    #[instrument(level = "debug", skip(self))]
    async fn extract_current(&self, id: &str) -> Result<RawEventFields, BoxError> {
        let body = self
            .take_page(id)?
            .ok_or_else(|| format!("no page loaded for event {id}"))?;
        let mut fields: RawEventFields = serde_json::from_str(&body).map_err(|e| {
            format!(
                "undecodable event body ({e}): {}",
                truncate_for_log(&body, 200)
            )
        })?;
        if fields.link.is_none() {
            fields.link = Some(self.event_url(id)?.to_string());
        }
        Ok(fields)
    }

    fn forget(&self, id: &str) {
        if let Ok(Some(_)) = self.take_page(id) {
            debug!(id, "Dropped page that was never extracted");
        }
    }
}
