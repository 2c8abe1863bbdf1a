//! The cache-backed fetch coordinator.
//!
//! One coordinator per page instance. It owns the page's cache lineage and
//! the `Idle -> Loading -> {Success, Failed}` state machine; the view only
//! ever reads state, it never touches the cache directly.
//!
//! The network call runs in a spawned task that reports back over an mpsc
//! channel. Dropping the coordinator while a request is in flight closes
//! the channel: the request still completes in the background and its
//! result is discarded, which is all the cancellation this system has.

use std::time::Instant;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::cache::{is_fresh, CacheManager};
use crate::store::Store;

use super::client::Fetch;
use super::source::DataSource;

/// Buffer for the fetch outcome channel. At most one request is in flight,
/// so one slot would do; the headroom is free.
const CHANNEL_BUFFER_SIZE: usize = 4;

/// Page-level load state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Success,
    /// Holds the user-facing message. Previously displayed data stays
    /// available next to it.
    Failed(String),
}

/// What happened to an explicit refresh request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Started,
    /// A request is already in flight; the trigger was ignored, not
    /// queued.
    AlreadyLoading,
    /// Refresh requested inside the cooldown window.
    Throttled { retry_in_secs: i64 },
}

enum FetchOutcome {
    Ok {
        raw: serde_json::Value,
        duration_secs: f64,
    },
    Err(String),
}

pub struct Coordinator<D, S, F>
where
    D: DataSource,
    S: Store,
    F: Fetch + Clone + 'static,
{
    source: D,
    cache: CacheManager<S>,
    fetch: F,

    state: LoadState,
    data: Option<D::Payload>,
    /// When the displayed data was fetched (local clock).
    last_update: Option<DateTime<Utc>>,
    last_duration_secs: Option<f64>,
    loading_since: Option<Instant>,
    last_forced: Option<DateTime<Utc>>,

    tx: mpsc::Sender<FetchOutcome>,
    rx: mpsc::Receiver<FetchOutcome>,
}

impl<D, S, F> Coordinator<D, S, F>
where
    D: DataSource,
    S: Store,
    F: Fetch + Clone + 'static,
{
    pub fn new(source: D, cache: CacheManager<S>, fetch: F) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        Self {
            source,
            cache,
            fetch,
            state: LoadState::Idle,
            data: None,
            last_update: None,
            last_duration_secs: None,
            loading_since: None,
            last_forced: None,
            tx,
            rx,
        }
    }

    /// Mount the page: read the cache, then fetch unless the entry is
    /// fresh. A stale entry is still displayed while the network call
    /// runs, so going back to a page never shows a blank screen.
    pub fn mount(&mut self) {
        let key = self.source.cache_key();
        if let Some(entry) = self.cache.load::<D::Payload>(&key) {
            let fresh = is_fresh(&entry, Utc::now(), self.source.max_age());
            let age_minutes = entry.age_minutes();
            self.last_update = Some(entry.cached_at);
            self.last_duration_secs = entry.duration_secs;
            self.data = Some(entry.data);
            self.state = LoadState::Success;
            if fresh {
                debug!(key = %key, age_minutes, "using cached data");
                return;
            }
            debug!(key = %key, age_minutes, "cache expired, refetching");
        }
        self.start_fetch();
    }

    /// Explicit user refresh. Bypasses freshness entirely; a throttled
    /// source refuses if the last refresh was too recent.
    pub fn refresh(&mut self) -> RefreshOutcome {
        if self.state == LoadState::Loading {
            return RefreshOutcome::AlreadyLoading;
        }
        let now = Utc::now();
        if let Some(cooldown) = self.source.force_cooldown() {
            if let Some(last) = self.last_forced {
                let since = now - last;
                if since < cooldown {
                    return RefreshOutcome::Throttled {
                        retry_in_secs: (cooldown - since).num_seconds().max(1),
                    };
                }
            }
        }
        self.last_forced = Some(now);
        self.start_fetch();
        RefreshOutcome::Started
    }

    fn start_fetch(&mut self) {
        if self.state == LoadState::Loading {
            debug!("request already in flight, ignoring trigger");
            return;
        }
        self.state = LoadState::Loading;
        self.loading_since = Some(Instant::now());

        let url = self.source.url();
        let fetch = self.fetch.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let started = Instant::now();
            let outcome = match fetch.get_json(&url).await {
                Ok(raw) => FetchOutcome::Ok {
                    raw,
                    duration_secs: started.elapsed().as_secs_f64(),
                },
                Err(e) => FetchOutcome::Err(e.to_string()),
            };
            // The receiver is gone when the page was unmounted; the
            // result is simply discarded.
            if tx.send(outcome).await.is_err() {
                debug!(url = %url, "coordinator dropped, discarding fetch result");
            }
        });
    }

    /// Drain completed fetch outcomes. Returns true if the state changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        while let Ok(outcome) = self.rx.try_recv() {
            self.apply(outcome);
            changed = true;
        }
        changed
    }

    /// Await the in-flight request, if any, and apply its outcome.
    pub async fn wait(&mut self) {
        if self.state != LoadState::Loading {
            return;
        }
        if let Some(outcome) = self.rx.recv().await {
            self.apply(outcome);
        }
    }

    /// The cache write happens here, before the `Success` transition is
    /// visible: a `Success` state always has its entry persisted (or a
    /// logged write failure behind it).
    fn apply(&mut self, outcome: FetchOutcome) {
        self.loading_since = None;
        match outcome {
            FetchOutcome::Ok { raw, duration_secs } => {
                let payload = self.source.normalize(&raw);
                let key = self.source.cache_key();
                if let Err(e) = self.cache.save(&key, &payload, Some(duration_secs)) {
                    warn!(key = %key, error = %e, "failed to cache fetched data");
                }
                self.data = Some(payload);
                self.last_update = Some(Utc::now());
                self.last_duration_secs = Some(duration_secs);
                self.state = LoadState::Success;
            }
            FetchOutcome::Err(message) => {
                error!(error = %message, "fetch failed");
                // Previously displayed data stays on screen
                self.state = LoadState::Failed(message);
            }
        }
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == LoadState::Loading
    }

    pub fn data(&self) -> Option<&D::Payload> {
        self.data.as_ref()
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }

    pub fn last_duration_secs(&self) -> Option<f64> {
        self.last_duration_secs
    }

    /// Seconds since the current request started, for the loading counter.
    pub fn loading_seconds(&self) -> Option<u64> {
        self.loading_since.map(|s| s.elapsed().as_secs())
    }

    pub fn cache(&self) -> &CacheManager<S> {
        &self.cache
    }
}

// ============================================================================
// Tests
// ============================================================================
