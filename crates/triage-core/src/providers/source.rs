use crate::model::PullRecord;
use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, Utc};
use std::sync::Mutex;

/// Inclusive publication window for the pull stage, expressed in the fixed
/// Asia/Seoul calendar: the last `days_back` whole days up to now.
#[derive(Debug, Clone, Copy)]
pub struct PullWindow {
    pub since: DateTime<FixedOffset>,
    pub until: DateTime<FixedOffset>,
}

impl PullWindow {
    pub fn days_back(days_back: u32) -> Self {
        let now = Utc::now().with_timezone(&crate::config::seoul_offset());
        Self {
            since: now - Duration::days(i64::from(days_back)),
            until: now,
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        let at = at.with_timezone(&self.since.timezone());
        self.since <= at && at <= self.until
    }
}

/// The raw video data source. Implementations return every candidate item
/// in `window` (or everything they have when `window` is `None`).
#[async_trait]
pub trait VideoSource: Send + Sync {
    async fn fetch(&self, window: Option<&PullWindow>) -> anyhow::Result<Vec<PullRecord>>;

    fn source_name(&self) -> &'static str;
}

/// HTTP-backed source: `GET <base_url>/videos?since=..&until=..` returning
/// a JSON array of pull records.
pub struct HttpVideoSource {
    pub base_url: String,
    client: reqwest::Client,
}

impl HttpVideoSource {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl VideoSource for HttpVideoSource {
    async fn fetch(&self, window: Option<&PullWindow>) -> anyhow::Result<Vec<PullRecord>> {
        let url = format!("{}/videos", self.base_url.trim_end_matches('/'));
        let mut req = self.client.get(&url);
        if let Some(window) = window {
            req = req.query(&[
                ("since", window.since.to_rfc3339()),
                ("until", window.until.to_rfc3339()),
            ]);
        }

        let resp = req.send().await?;
        if !resp.status().is_success() {
            anyhow::bail!("video source error (status {})", resp.status());
        }
        let items: Vec<PullRecord> = resp.json().await?;
        Ok(items)
    }

    fn source_name(&self) -> &'static str {
        "http"
    }
}

/// In-memory source for offline runs and tests. Applies the window filter
/// itself, like the real source would server-side.
pub struct FakeSource {
    items: Mutex<Vec<PullRecord>>,
    unavailable: Mutex<bool>,
}

impl FakeSource {
    pub fn new(items: Vec<PullRecord>) -> Self {
        Self {
            items: Mutex::new(items),
            unavailable: Mutex::new(false),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Make subsequent fetches fail, simulating an unreachable source.
    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.lock().unwrap() = unavailable;
    }
}

#[async_trait]
impl VideoSource for FakeSource {
    async fn fetch(&self, window: Option<&PullWindow>) -> anyhow::Result<Vec<PullRecord>> {
        if *self.unavailable.lock().unwrap() {
            anyhow::bail!("fake source is unavailable");
        }
        let items = self.items.lock().unwrap().clone();
        Ok(match window {
            Some(window) => items
                .into_iter()
                .filter(|item| window.contains(item.published_at))
                .collect(),
            None => items,
        })
    }

    fn source_name(&self) -> &'static str {
        "fake"
    }
}
