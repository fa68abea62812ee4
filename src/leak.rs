//! Leaked-password lookups over a k-anonymity range API.
//!
//! Only the first 5 hex characters of the password's SHA-1 digest leave the
//! process. Results are cached per password for the whole session, and a
//! lookup that has not finished reads as "not leaked".

use crate::meter::MeterEvent;
use sha1::{Digest, Sha1};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;

/// Digest characters sent to the range endpoint.
pub const PREFIX_LEN: usize = 5;
/// Digest characters compared locally.
pub const SUFFIX_LEN: usize = 35;

#[derive(Error, Debug)]
pub enum LeakError {
    #[error("Range request failed: {0}")]
    Http(String),
    #[error("Range endpoint answered with status {0}")]
    Status(u16),
}

pub type RangeFuture = Pin<Box<dyn Future<Output = Result<String, LeakError>> + Send>>;

/// Fetches every known suffix for a digest prefix.
pub trait RangeClient: Send + Sync {
    fn fetch_range(&self, prefix: &str) -> RangeFuture;
}

/// `GET {base}/range/{prefix}` over HTTPS.
#[cfg(feature = "hibp")]
#[derive(Debug, Clone)]
pub struct HttpRangeClient {
    client: reqwest::Client,
    base_url: String,
}

#[cfg(feature = "hibp")]
impl HttpRangeClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.pwnedpasswords.com";

    pub fn new() -> Self {
        Self::with_base_url(Self::DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[cfg(feature = "hibp")]
impl Default for HttpRangeClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "hibp")]
impl RangeClient for HttpRangeClient {
    fn fetch_range(&self, prefix: &str) -> RangeFuture {
        let client = self.client.clone();
        let url = format!("{}/range/{}", self.base_url, prefix);
        Box::pin(async move {
            let response = client
                .get(&url)
                .send()
                .await
                .map_err(|e| LeakError::Http(e.to_string()))?;
            if !response.status().is_success() {
                return Err(LeakError::Status(response.status().as_u16()));
            }
            response.text().await.map_err(|e| LeakError::Http(e.to_string()))
        })
    }
}

/// Splits the uppercase hex SHA-1 digest into the sent prefix and the kept suffix.
pub fn range_key(password: &str) -> (String, String) {
    let mut hasher = Sha1::new();
    hasher.update(password.as_bytes());
    let hash = format!("{:X}", hasher.finalize());
    let (prefix, suffix) = hash.split_at(PREFIX_LEN);
    (prefix.to_string(), suffix.to_string())
}

/// Whether any line of a range response starts with `suffix`.
pub fn suffix_listed(body: &str, suffix: &str) -> bool {
    body.lines()
        .filter_map(|line| line.trim().get(..SUFFIX_LEN))
        .any(|candidate| candidate.eq_ignore_ascii_case(suffix))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeakState {
    Unknown,
    InFlight,
    Leaked,
    NotLeaked,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    state: LeakState,
    elapsed: Option<Duration>,
}

/// Session cache of leak lookups.
///
/// Cloning shares the cache. At most one lookup runs per distinct password.
#[derive(Clone)]
pub struct LeakService {
    client: Arc<dyn RangeClient>,
    entries: Arc<Mutex<HashMap<String, Entry>>>,
    handle: Handle,
    events: Option<UnboundedSender<MeterEvent>>,
}

impl LeakService {
    pub fn new(client: Arc<dyn RangeClient>, handle: Handle) -> Self {
        Self {
            client,
            entries: Arc::new(Mutex::new(HashMap::new())),
            handle,
            events: None,
        }
    }

    /// Announces each finished lookup as [`MeterEvent::Leak`].
    pub fn with_events(mut self, events: UnboundedSender<MeterEvent>) -> Self {
        self.events = Some(events);
        self
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cached state, without scheduling anything.
    pub fn state(&self, password: &str) -> LeakState {
        self.entries()
            .get(password)
            .map_or(LeakState::Unknown, |e| e.state)
    }

    /// How long the finished lookup for `password` took.
    pub fn lookup_time(&self, password: &str) -> Option<Duration> {
        self.entries().get(password).and_then(|e| e.elapsed)
    }

    /// `true` only once a lookup has confirmed the leak. The first call for
    /// a password schedules the lookup and answers `false`.
    pub fn previously_leaked(&self, password: &str) -> bool {
        let mut entries = self.entries();
        match entries.get(password).map(|e| e.state) {
            Some(LeakState::Leaked) => true,
            Some(_) => false,
            None => {
                entries.insert(
                    password.to_string(),
                    Entry {
                        state: LeakState::InFlight,
                        elapsed: None,
                    },
                );
                drop(entries);
                self.spawn_lookup(password.to_string());
                false
            }
        }
    }

    fn spawn_lookup(&self, password: String) {
        let client = Arc::clone(&self.client);
        let entries = Arc::clone(&self.entries);
        let events = self.events.clone();

        #[cfg(feature = "tracing")]
        tracing::debug!("Leak lookup scheduled");

        self.handle.spawn(async move {
            let started = Instant::now();
            let state = match lookup(client.as_ref(), &password).await {
                Ok(true) => LeakState::Leaked,
                Ok(false) => LeakState::NotLeaked,
                Err(_e) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!("Leak lookup failed, treating as not leaked: {}", _e);
                    LeakState::NotLeaked
                }
            };
            let elapsed = started.elapsed();

            #[cfg(feature = "tracing")]
            tracing::debug!("Leak lookup resolved in {:?}", elapsed);

            entries.lock().unwrap_or_else(PoisonError::into_inner).insert(
                password.clone(),
                Entry {
                    state,
                    elapsed: Some(elapsed),
                },
            );
            if let Some(events) = events {
                let _ = events.send(MeterEvent::Leak { password });
            }
        });
    }
}

/// One uncached range lookup.
pub async fn lookup(client: &dyn RangeClient, password: &str) -> Result<bool, LeakError> {
    let (prefix, suffix) = range_key(password);
    let body = client.fetch_range(&prefix).await?;
    Ok(suffix_listed(&body, &suffix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc;

    /// Serves a fixed body and counts requests.
    struct MockRangeClient {
        body: String,
        fail: bool,
        calls: Arc<AtomicUsize>,
    }

    impl MockRangeClient {
        fn listing(passwords: &[&str]) -> Self {
            let body = passwords
                .iter()
                .map(|p| format!("{}:42", range_key(p).1.to_lowercase()))
                .collect::<Vec<_>>()
                .join("\r\n");
            Self {
                body,
                fail: false,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl RangeClient for MockRangeClient {
        fn fetch_range(&self, _prefix: &str) -> RangeFuture {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let result = if self.fail {
                Err(LeakError::Status(503))
            } else {
                Ok(self.body.clone())
            };
            Box::pin(async move { result })
        }
    }

    #[test]
    fn test_range_key_known_digest() {
        // sha1("password") = 5BAA61E4C9B93F3F0682250B6CF8331B7EE68FD8
        let (prefix, suffix) = range_key("password");
        assert_eq!(prefix, "5BAA6");
        assert_eq!(suffix, "1E4C9B93F3F0682250B6CF8331B7EE68FD8");
        assert_eq!(suffix.len(), SUFFIX_LEN);
    }

    #[test]
    fn test_suffix_listed() {
        let body = "0018A45C4D1DEF81644B54AB7F969B88D65:1\n1e4c9b93f3f0682250b6cf8331b7ee68fd8:3861493\nshort";
        assert!(suffix_listed(body, "1E4C9B93F3F0682250B6CF8331B7EE68FD8"));
        assert!(!suffix_listed(body, "FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF"));
        assert!(!suffix_listed("", "1E4C9B93F3F0682250B6CF8331B7EE68FD8"));
    }

    #[tokio::test]
    async fn test_previously_leaked_fails_open_then_caches() {
        let client = MockRangeClient::listing(&["password"]);
        let calls = Arc::clone(&client.calls);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let service = LeakService::new(Arc::new(client), Handle::current()).with_events(tx);

        assert!(!service.previously_leaked("password"));
        assert_eq!(service.state("password"), LeakState::InFlight);
        // in flight, so no second request
        assert!(!service.previously_leaked("password"));

        match rx.recv().await {
            Some(MeterEvent::Leak { password }) => assert_eq!(password, "password"),
            other => panic!("Expected leak event, got {:?}", other),
        }
        assert!(service.previously_leaked("password"));
        assert!(service.previously_leaked("password"));
        assert!(service.lookup_time("password").is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_previously_leaked_not_listed() {
        let client = MockRangeClient::listing(&["password"]);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let service = LeakService::new(Arc::new(client), Handle::current()).with_events(tx);

        assert!(!service.previously_leaked("correct horse"));
        rx.recv().await.expect("lookup finishes");
        assert_eq!(service.state("correct horse"), LeakState::NotLeaked);
        assert!(!service.previously_leaked("correct horse"));
    }

    #[tokio::test]
    async fn test_failed_lookup_reads_not_leaked() {
        let mut client = MockRangeClient::listing(&["password"]);
        client.fail = true;
        let (tx, mut rx) = mpsc::unbounded_channel();
        let service = LeakService::new(Arc::new(client), Handle::current()).with_events(tx);

        assert!(!service.previously_leaked("password"));
        rx.recv().await.expect("lookup finishes");
        assert_eq!(service.state("password"), LeakState::NotLeaked);
    }

    #[tokio::test]
    async fn test_lookup_direct() {
        let client = MockRangeClient::listing(&["123456"]);
        assert!(lookup(&client, "123456").await.unwrap());
        assert!(!lookup(&client, "654321").await.unwrap());
    }
}
