//! ScriptedLookup - deterministic in-process lookup
//!
//! Records come from a generator closure; failures and latencies are keyed by
//! item identifier. A [`ConcurrencyProbe`] tracks how many lookups are
//! mid-flight, so callers can assert admission bounds.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::instrument;

use contracts::{Lookup, LookupError, Record, WorkItem};

type Generator<R> = Arc<dyn Fn(&WorkItem) -> Vec<R> + Send + Sync>;

/// Live and peak count of concurrently executing lookups
#[derive(Debug, Default)]
pub struct ConcurrencyProbe {
    current: AtomicUsize,
    high_water: AtomicUsize,
    entered: AtomicUsize,
}

impl ConcurrencyProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark one body as running until the guard drops
    pub fn enter(self: &Arc<Self>) -> ProbeGuard {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.high_water.fetch_max(now, Ordering::SeqCst);
        self.entered.fetch_add(1, Ordering::SeqCst);
        ProbeGuard {
            probe: Arc::clone(self),
        }
    }

    pub fn current(&self) -> usize {
        self.current.load(Ordering::SeqCst)
    }

    /// Highest concurrent count observed
    pub fn high_water(&self) -> usize {
        self.high_water.load(Ordering::SeqCst)
    }

    /// Total bodies entered
    pub fn entered(&self) -> usize {
        self.entered.load(Ordering::SeqCst)
    }
}

/// Decrements the probe on drop, panics included
pub struct ProbeGuard {
    probe: Arc<ConcurrencyProbe>,
}

impl Drop for ProbeGuard {
    fn drop(&mut self) {
        self.probe.current.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Lookup with scripted records, failures and latency
pub struct ScriptedLookup<R> {
    generator: Generator<R>,
    failures: HashMap<String, String>,
    delays: HashMap<String, Duration>,
    default_delay: Duration,
    probe: Arc<ConcurrencyProbe>,
}

impl<R: Record> ScriptedLookup<R> {
    pub fn new(generator: impl Fn(&WorkItem) -> Vec<R> + Send + Sync + 'static) -> Self {
        Self {
            generator: Arc::new(generator),
            failures: HashMap::new(),
            delays: HashMap::new(),
            default_delay: Duration::ZERO,
            probe: Arc::new(ConcurrencyProbe::new()),
        }
    }

    /// Fail the item with this identifier
    pub fn fail(mut self, identifier: impl Into<String>, message: impl Into<String>) -> Self {
        self.failures.insert(identifier.into(), message.into());
        self
    }

    /// Latency for one identifier
    pub fn delay(mut self, identifier: impl Into<String>, latency: Duration) -> Self {
        self.delays.insert(identifier.into(), latency);
        self
    }

    /// Latency for every identifier without its own delay
    pub fn default_delay(mut self, latency: Duration) -> Self {
        self.default_delay = latency;
        self
    }

    pub fn probe(&self) -> Arc<ConcurrencyProbe> {
        Arc::clone(&self.probe)
    }

    fn latency_for(&self, identifier: &str) -> Duration {
        self.delays
            .get(identifier)
            .copied()
            .unwrap_or(self.default_delay)
    }
}

impl<R: Record> Lookup for ScriptedLookup<R> {
    type Record = R;

    fn name(&self) -> &str {
        "scripted"
    }

    #[instrument(name = "scripted_lookup", skip(self, item), fields(item = item.index))]
    async fn lookup(&self, item: &WorkItem) -> Result<Vec<R>, LookupError> {
        let _guard = self.probe.enter();

        let latency = self.latency_for(&item.identifier);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        if let Some(message) = self.failures.get(&item.identifier) {
            return Err(LookupError::Rejected(message.clone()));
        }
        Ok((self.generator)(item))
    }

    fn synthetic(&self, item: &WorkItem) -> Vec<R> {
        (self.generator)(item)
    }
}
