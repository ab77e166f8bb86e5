//! Catalog store and single-flight sync coordination.
//!
//! Every sync request bumps a generation counter and receives a `SyncTicket`.
//! When a fetch finishes, its ticket is checked against the current generation:
//! results for superseded requests are dropped rather than committed, so the
//! last request issued is the only one that can replace the catalog. The catalog
//! itself is an `Arc<Catalog>` swapped in one assignment; readers never see a
//! partially built catalog.

use crate::catalog::{Catalog, RawTable};
use crate::config::ChooserConfig;
use crate::source::RowSource;
use anyhow::Result;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

/// Why a sync was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncTrigger {
    /// A credential was available at startup
    CredentialPresent,
    /// Explicit refresh request
    Refresh,
    /// The credential changed to a new, non-empty value
    CredentialChanged,
}

/// Proof of a started sync. Consumed by `CatalogStore::complete`, so it commits at most once.
#[derive(Debug)]
pub struct SyncTicket {
    generation: u64,
    trigger: SyncTrigger,
}

impl SyncTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn trigger(&self) -> SyncTrigger {
        self.trigger
    }
}

/// Result of completing a ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// New catalog committed with this many games
    Committed(usize),
    /// Fetch failed; error recorded, catalog unchanged
    Failed(String),
    /// A newer sync was started; result discarded
    Stale,
    /// Source returned no rows at all; catalog unchanged
    Empty,
}

/// Holds the current catalog snapshot.
pub struct CatalogStore {
    config: Arc<ChooserConfig>,
    generation: AtomicU64,
    current: Mutex<Arc<Catalog>>,
}

impl CatalogStore {
    pub fn new(config: Arc<ChooserConfig>) -> Self {
        Self {
            config,
            generation: AtomicU64::new(0),
            current: Mutex::new(Arc::new(Catalog::default())),
        }
    }

    pub fn config(&self) -> &ChooserConfig {
        &self.config
    }

    /// The latest committed catalog (possibly empty).
    pub fn snapshot(&self) -> Arc<Catalog> {
        match self.current.lock() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Start a new sync. Any previously issued ticket becomes stale.
    pub fn begin_sync(&self, trigger: SyncTrigger) -> SyncTicket {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        log::debug!("Sync {} started ({:?})", generation, trigger);
        SyncTicket {
            generation,
            trigger,
        }
    }

    pub fn is_current(&self, ticket: &SyncTicket) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket.generation
    }

    /// Commit the result of a fetch, unless a newer sync has started since.
    pub fn complete(&self, ticket: SyncTicket, result: Result<RawTable>) -> SyncOutcome {
        let mut current = match self.current.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if !self.is_current(&ticket) {
            log::warn!(
                "Discarding result of sync {} ({:?}): superseded",
                ticket.generation,
                ticket.trigger
            );
            return SyncOutcome::Stale;
        }

        match result {
            Err(e) => {
                let message = format!("{:#}", e);
                log::warn!("Sync {} failed: {}", ticket.generation, message);
                let mut failed = Catalog::clone(&current);
                failed.last_error = Some(message.clone());
                *current = Arc::new(failed);
                SyncOutcome::Failed(message)
            }
            Ok(table) if table.is_empty() => {
                log::info!("Sync {} returned no rows; keeping catalog", ticket.generation);
                SyncOutcome::Empty
            }
            Ok(table) => {
                let mut catalog = Catalog::from_table(table, &self.config);
                catalog.sync_count = current.sync_count + 1;
                catalog.last_sync = Some(chrono::Utc::now());
                let count = catalog.len();
                log::info!(
                    "Sync {} committed: {} games from {} rows",
                    ticket.generation,
                    count,
                    catalog.raw.row_count()
                );
                *current = Arc::new(catalog);
                SyncOutcome::Committed(count)
            }
        }
    }

    /// Fetch on a background thread and complete the ticket from there.
    pub fn spawn_sync(
        self: &Arc<Self>,
        source: Arc<dyn RowSource>,
        trigger: SyncTrigger,
    ) -> JoinHandle<SyncOutcome> {
        let ticket = self.begin_sync(trigger);
        let store = Arc::clone(self);
        std::thread::spawn(move || {
            log::debug!("Fetching from {}", source.describe());
            let result = source.fetch();
            store.complete(ticket, result)
        })
    }

    /// Fetch and commit on the calling thread.
    pub fn sync_now(&self, source: &dyn RowSource, trigger: SyncTrigger) -> SyncOutcome {
        let ticket = self.begin_sync(trigger);
        let result = source.fetch();
        self.complete(ticket, result)
    }
}

/// Builds a row source for a credential.
pub type SourceFactory = Box<dyn Fn(&str) -> Result<Arc<dyn RowSource>> + Send + Sync>;

/// Tracks the current credential and starts syncs when it appears, changes, or a refresh is asked for.
pub struct SyncSession {
    store: Arc<CatalogStore>,
    credential: Option<String>,
    make_source: SourceFactory,
}

impl SyncSession {
    pub fn new(store: Arc<CatalogStore>, make_source: SourceFactory) -> Self {
        Self {
            store,
            credential: None,
            make_source,
        }
    }

    pub fn store(&self) -> &Arc<CatalogStore> {
        &self.store
    }

    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }

    /// Set the credential at startup; syncs if one is present.
    pub fn start(&mut self, credential: Option<String>) -> Option<JoinHandle<SyncOutcome>> {
        self.credential = credential.filter(|c| !c.trim().is_empty());
        self.trigger(SyncTrigger::CredentialPresent)
    }

    /// Replace the credential; syncs only when it actually changed to a present value.
    pub fn set_credential(&mut self, credential: Option<String>) -> Option<JoinHandle<SyncOutcome>> {
        let credential = credential.filter(|c| !c.trim().is_empty());
        if credential == self.credential {
            return None;
        }
        self.credential = credential;
        self.trigger(SyncTrigger::CredentialChanged)
    }

    pub fn request_refresh(&self) -> Option<JoinHandle<SyncOutcome>> {
        self.trigger(SyncTrigger::Refresh)
    }

    fn trigger(&self, trigger: SyncTrigger) -> Option<JoinHandle<SyncOutcome>> {
        let credential = self.credential.as_deref()?;
        match (self.make_source)(credential) {
            Ok(source) => Some(self.store.spawn_sync(source, trigger)),
            Err(e) => {
                let ticket = self.store.begin_sync(trigger);
                self.store.complete(ticket, Err(e));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    struct FixedSource(RawTable);

    impl RowSource for FixedSource {
        fn fetch(&self) -> Result<RawTable> {
            Ok(self.0.clone())
        }

        fn describe(&self) -> String {
            "fixed".to_string()
        }
    }

    struct FailingSource;

    impl RowSource for FailingSource {
        fn fetch(&self) -> Result<RawTable> {
            Err(anyhow::anyhow!("Failed to fetch sheet values"))
        }

        fn describe(&self) -> String {
            "failing".to_string()
        }
    }

    /// Blocks until the test releases it.
    struct GatedSource {
        table: RawTable,
        gate: Mutex<mpsc::Receiver<()>>,
    }

    impl RowSource for GatedSource {
        fn fetch(&self) -> Result<RawTable> {
            let gate = self.gate.lock().unwrap();
            gate.recv().unwrap();
            Ok(self.table.clone())
        }

        fn describe(&self) -> String {
            "gated".to_string()
        }
    }

    fn store() -> Arc<CatalogStore> {
        Arc::new(CatalogStore::new(Arc::new(ChooserConfig::default())))
    }

    fn table(names: &[&str]) -> RawTable {
        let mut rows = vec![vec!["name".to_string()]];
        rows.extend(names.iter().map(|n| vec![n.to_string()]));
        RawTable::from_rows(rows)
    }

    #[test]
    fn test_commit_replaces_catalog() {
        let store = store();
        assert!(store.snapshot().is_empty());

        let outcome = store.sync_now(&FixedSource(table(&["Catan", "Azul"])), SyncTrigger::Refresh);
        assert_eq!(outcome, SyncOutcome::Committed(2));

        let snap = store.snapshot();
        assert_eq!(snap.len(), 2);
        assert_eq!(snap.sync_count, 1);
        assert!(snap.last_sync.is_some());
        assert!(snap.last_error.is_none());
    }

    #[test]
    fn test_failure_keeps_games_and_records_error() {
        let store = store();
        store.sync_now(&FixedSource(table(&["Catan"])), SyncTrigger::CredentialPresent);

        let outcome = store.sync_now(&FailingSource, SyncTrigger::Refresh);
        assert!(matches!(outcome, SyncOutcome::Failed(ref m) if m.contains("sheet values")));

        let snap = store.snapshot();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap.sync_count, 1);
        assert!(snap.last_error.is_some());

        store.sync_now(&FixedSource(table(&["Go"])), SyncTrigger::Refresh);
        let snap = store.snapshot();
        assert_eq!(snap.sync_count, 2);
        assert!(snap.last_error.is_none());
    }

    #[test]
    fn test_empty_table_keeps_catalog() {
        let store = store();
        store.sync_now(&FixedSource(table(&["Catan"])), SyncTrigger::Refresh);
        let outcome = store.sync_now(&FixedSource(RawTable::default()), SyncTrigger::Refresh);
        assert_eq!(outcome, SyncOutcome::Empty);
        assert_eq!(store.snapshot().len(), 1);
    }

    #[test]
    fn test_stale_ticket_discarded() {
        let store = store();
        let first = store.begin_sync(SyncTrigger::CredentialPresent);
        let second = store.begin_sync(SyncTrigger::Refresh);
        assert!(!store.is_current(&first));

        assert_eq!(
            store.complete(second, Ok(table(&["New"]))),
            SyncOutcome::Committed(1)
        );
        assert_eq!(store.complete(first, Ok(table(&["Old", "Older"]))), SyncOutcome::Stale);

        let snap = store.snapshot();
        assert_eq!(snap.games[0].name, "New");
        assert_eq!(snap.sync_count, 1);
    }

    #[test]
    fn test_stale_failure_not_recorded() {
        let store = store();
        let first = store.begin_sync(SyncTrigger::Refresh);
        let _second = store.begin_sync(SyncTrigger::Refresh);
        assert_eq!(
            store.complete(first, Err(anyhow::anyhow!("boom"))),
            SyncOutcome::Stale
        );
        assert!(store.snapshot().last_error.is_none());
    }

    #[test]
    fn test_overlapping_background_syncs() {
        let store = store();
        let (release_slow, gate) = mpsc::channel();
        let slow = Arc::new(GatedSource {
            table: table(&["Slow"]),
            gate: Mutex::new(gate),
        });

        let slow_handle = store.spawn_sync(slow, SyncTrigger::CredentialPresent);
        let fast_handle = store.spawn_sync(Arc::new(FixedSource(table(&["Fast"]))), SyncTrigger::Refresh);
        assert_eq!(fast_handle.join().unwrap(), SyncOutcome::Committed(1));

        release_slow.send(()).unwrap();
        assert_eq!(slow_handle.join().unwrap(), SyncOutcome::Stale);
        assert_eq!(store.snapshot().games[0].name, "Fast");
    }

    #[test]
    fn test_session_triggers() {
        let store = store();
        let factory: SourceFactory = Box::new(|key: &str| {
            if key == "bad" {
                Err(anyhow::anyhow!("rejected credential"))
            } else {
                Ok(Arc::new(FixedSource(table(&[key]))) as Arc<dyn RowSource>)
            }
        });
        let mut session = SyncSession::new(Arc::clone(&store), factory);

        assert!(session.start(None).is_none());
        assert!(session.request_refresh().is_none());

        let handle = session.set_credential(Some("first".to_string())).unwrap();
        assert_eq!(handle.join().unwrap(), SyncOutcome::Committed(1));
        assert_eq!(store.snapshot().games[0].name, "first");

        assert!(session.set_credential(Some("first".to_string())).is_none());

        let handle = session.request_refresh().unwrap();
        assert_eq!(handle.join().unwrap(), SyncOutcome::Committed(1));
        assert_eq!(store.snapshot().sync_count, 2);

        assert!(session.set_credential(Some("bad".to_string())).is_none());
        let snap = store.snapshot();
        assert_eq!(snap.games[0].name, "first");
        assert!(snap.last_error.as_deref().unwrap().contains("rejected"));
    }
}
