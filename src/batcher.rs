//! UI string translation batcher.
//!
//! The portal renders ~15–20 of the catalog's strings per screen. Instead of
//! translating the whole catalog up front, `translate(key)` serves whatever
//! is cached (or the source text) synchronously and queues the rest; after a
//! quiet period the queued keys go to the engine as one batch, results merge
//! into the in-memory map, and the whole map is persisted to the remote
//! cache store in the background.
//!
//! All batching state (pending set, in-flight set, debounce deadline) is
//! owned by a single actor task and driven through a serialized command
//! channel. The UI-facing handle only touches a small shared block: the
//! current locale, the translated map, an epoch counter, and a busy flag.
//! Every flush and every bulk cache read is stamped with the epoch at
//! submission time; a locale switch bumps the epoch, so anything that
//! resolves late is discarded instead of merged.

use crate::catalog;
use crate::engine::{EngineError, Localizer};
use crate::locale::Locale;
use crate::metrics::TranslationMetrics;
use crate::store::TranslationStore;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Tuning knobs for the batcher.
#[derive(Debug, Clone)]
pub struct BatcherConfig {
    /// Quiet period after the last newly queued key before a batch is
    /// flushed. One render pass worth of `translate` calls lands well inside
    /// it.
    pub batch_delay: Duration,
}

impl Default for BatcherConfig {
    fn default() -> Self {
        Self {
            batch_delay: Duration::from_millis(200),
        }
    }
}

enum Command {
    /// A rendered key that has no translation yet.
    Request(String),
    /// The user picked a new interface locale.
    LocaleChanged { locale: Locale, epoch: u64 },
    /// An engine batch came back.
    Resolved {
        epoch: u64,
        keys: Vec<String>,
        outcome: Result<String, EngineError>,
    },
    /// The persisted UI map for a locale finished loading.
    Loaded {
        epoch: u64,
        map: HashMap<String, String>,
    },
}

/// State readable synchronously from render-time code.
struct Shared {
    locale: RwLock<Locale>,
    translated: RwLock<HashMap<String, String>>,
    epoch: AtomicU64,
    busy: AtomicBool,
}

/// Handle to the UI translation batcher.
///
/// Cheap to clone; hand one to every rendering surface. `translate` and
/// `translate_original` never block on the network and are safe to call from
/// render-time code.
#[derive(Clone)]
pub struct UiTranslator {
    shared: Arc<Shared>,
    tx: mpsc::UnboundedSender<Command>,
}

impl UiTranslator {
    /// Start the batcher actor and return a handle to it.
    pub fn spawn(
        engine: Arc<dyn Localizer>,
        store: Arc<dyn TranslationStore>,
        config: BatcherConfig,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            locale: RwLock::new(Locale::default_locale()),
            translated: RwLock::new(HashMap::new()),
            epoch: AtomicU64::new(0),
            busy: AtomicBool::new(false),
        });

        let actor = Batcher {
            shared: Arc::clone(&shared),
            tx: tx.clone(),
            engine,
            store,
            config,
            pending: BTreeSet::new(),
            in_flight: HashSet::new(),
            deadline: None,
        };
        tokio::spawn(actor.run(rx));

        Self { shared, tx }
    }

    /// Current text for `key`: the cached translation when one exists, the
    /// catalog source text otherwise.
    ///
    /// Uncached catalog keys are queued for the next debounced batch; the
    /// translated value shows up on a later call once the batch resolves.
    /// Unknown keys are returned unchanged and never queued.
    pub fn translate(&self, key: &str) -> String {
        if self.shared.locale.read().unwrap().is_default() {
            return catalog::text(key).to_string();
        }

        if let Some(value) = self.shared.translated.read().unwrap().get(key) {
            TranslationMetrics::global().record_ui_cache_hit();
            return value.clone();
        }

        if catalog::contains(key) {
            TranslationMetrics::global().record_ui_cache_miss();
            // The actor drops duplicates against its pending/in-flight sets.
            let _ = self.tx.send(Command::Request(key.to_string()));
        }

        catalog::text(key).to_string()
    }

    /// The untranslated source text, for hover and tooltip display.
    pub fn translate_original(&self, key: &str) -> String {
        catalog::text(key).to_string()
    }

    /// The locale currently selected.
    pub fn locale(&self) -> Locale {
        self.shared.locale.read().unwrap().clone()
    }

    /// Whether a batch is currently in flight (for a spinner, not for
    /// correctness).
    pub fn is_busy(&self) -> bool {
        self.shared.busy.load(Ordering::SeqCst)
    }

    /// Switch the interface locale.
    ///
    /// The epoch bump is the cancellation signal for all outstanding work:
    /// any batch or bulk cache read stamped with an older epoch is discarded
    /// when it resolves. The map is cleared before the locale is published,
    /// so no render can pair the new locale with the old locale's strings.
    pub fn set_locale(&self, locale: Locale) {
        if *self.shared.locale.read().unwrap() == locale {
            return;
        }

        let epoch = self.shared.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        self.shared.translated.write().unwrap().clear();
        *self.shared.locale.write().unwrap() = locale.clone();
        self.shared.busy.store(false, Ordering::SeqCst);

        let _ = self.tx.send(Command::LocaleChanged { locale, epoch });
    }
}

/// The actor: sole owner of the batching state.
struct Batcher {
    shared: Arc<Shared>,
    tx: mpsc::UnboundedSender<Command>,
    engine: Arc<dyn Localizer>,
    store: Arc<dyn TranslationStore>,
    config: BatcherConfig,
    pending: BTreeSet<String>,
    in_flight: HashSet<String>,
    deadline: Option<Instant>,
}

impl Batcher {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Command>) {
        loop {
            let command = if let Some(deadline) = self.deadline {
                tokio::select! {
                    command = rx.recv() => match command {
                        Some(command) => Some(command),
                        None => break,
                    },
                    _ = tokio::time::sleep_until(deadline) => None,
                }
            } else {
                match rx.recv().await {
                    Some(command) => Some(command),
                    None => break,
                }
            };

            match command {
                Some(Command::Request(key)) => self.request(key),
                Some(Command::LocaleChanged { locale, epoch }) => {
                    self.locale_changed(locale, epoch);
                }
                Some(Command::Resolved {
                    epoch,
                    keys,
                    outcome,
                }) => self.resolved(epoch, keys, outcome),
                Some(Command::Loaded { epoch, map }) => self.loaded(epoch, map),
                None => {
                    self.deadline = None;
                    self.flush();
                }
            }
        }
    }

    fn request(&mut self, key: String) {
        if !catalog::contains(&key) {
            return;
        }
        if self.pending.contains(&key) || self.in_flight.contains(&key) {
            return;
        }
        // May have resolved between the handle's check and this command.
        if self.shared.translated.read().unwrap().contains_key(&key) {
            return;
        }

        self.pending.insert(key);
        // Fresh quiet period per newly queued key: a burst within one render
        // pass collapses into a single flush.
        self.deadline = Some(Instant::now() + self.config.batch_delay);
    }

    /// Submit the pending keys as one engine batch.
    fn flush(&mut self) {
        // Epoch before locale: if a switch lands between the two reads, the
        // batch carries the older epoch and is discarded on resolution.
        let epoch = self.shared.epoch.load(Ordering::SeqCst);
        let locale = self.shared.locale.read().unwrap().clone();
        if locale.is_default() {
            return;
        }

        let keys: Vec<String> = std::mem::take(&mut self.pending)
            .into_iter()
            .filter(|key| !self.in_flight.contains(key))
            .collect();
        if keys.is_empty() {
            return;
        }

        self.in_flight.extend(keys.iter().cloned());
        self.shared.busy.store(true, Ordering::SeqCst);
        TranslationMetrics::global().record_batch_sent();

        let payload = keys
            .iter()
            .map(|key| catalog::text(key))
            .collect::<Vec<_>>()
            .join("\n");

        debug!(locale = %locale, keys = keys.len(), "flushing translation batch");

        let engine = Arc::clone(&self.engine);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let outcome = engine
                .localize(&payload, Some(&Locale::default_locale()), &locale)
                .await;
            let _ = tx.send(Command::Resolved {
                epoch,
                keys,
                outcome,
            });
        });
    }

    fn resolved(&mut self, epoch: u64, keys: Vec<String>, outcome: Result<String, EngineError>) {
        for key in &keys {
            self.in_flight.remove(key);
        }

        match outcome {
            Ok(batch) => self.merge(epoch, &keys, &batch),
            Err(error) => {
                // The keys are free again; the next render re-queues them.
                TranslationMetrics::global().record_batch_failure();
                warn!("translation batch of {} keys failed: {}", keys.len(), error);
            }
        }

        if self.pending.is_empty() && self.in_flight.is_empty() {
            self.shared.busy.store(false, Ordering::SeqCst);
        }
    }

    fn merge(&mut self, epoch: u64, keys: &[String], batch: &str) {
        let locale = self.shared.locale.read().unwrap().clone();
        let lines: Vec<&str> = batch.split('\n').collect();

        let mut translated = self.shared.translated.write().unwrap();
        // Re-checked under the write lock: a locale switch bumps the epoch
        // before it clears the map, so a stale batch can never leak entries
        // into the new locale's cache.
        if self.shared.epoch.load(Ordering::SeqCst) != epoch {
            TranslationMetrics::global().record_stale_batch_discarded();
            debug!(locale = %locale, "discarding batch resolved after a locale switch");
            return;
        }

        for (index, key) in keys.iter().enumerate() {
            // An empty or missing line falls back to the source string for
            // that key only; one garbled entry must not poison the batch.
            let value = lines
                .get(index)
                .map(|line| line.trim())
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| catalog::text(key).to_string());
            translated.insert(key.clone(), value);
        }
        TranslationMetrics::global().record_keys_translated(keys.len());
        drop(translated);

        // Fire-and-forget persist of the whole current map. The in-memory
        // merge is already visible; a failed write only costs a
        // re-translation in some future session.
        let snapshot = self.shared.translated.read().unwrap().clone();
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            if let Err(error) = store.save_ui_map(&locale, &snapshot).await {
                TranslationMetrics::global().record_store_write_failure();
                warn!(locale = %locale, "failed to persist ui translations: {:#}", error);
            }
        });
    }

    fn locale_changed(&mut self, locale: Locale, epoch: u64) {
        self.pending.clear();
        self.in_flight.clear();
        self.deadline = None;

        if locale.is_default() {
            return;
        }

        // Bulk read of whatever this locale has already paid for. The UI is
        // never blocked on it; entries arrive through a Loaded command.
        let store = Arc::clone(&self.store);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let map = match store.load_ui_map(&locale).await {
                Ok(Some(map)) => map,
                Ok(None) => HashMap::new(),
                Err(error) => {
                    warn!(locale = %locale, "failed to load persisted ui translations: {:#}", error);
                    HashMap::new()
                }
            };
            if !map.is_empty() {
                let _ = tx.send(Command::Loaded { epoch, map });
            }
        });
    }

    fn loaded(&mut self, epoch: u64, map: HashMap<String, String>) {
        let mut translated = self.shared.translated.write().unwrap();
        if self.shared.epoch.load(Ordering::SeqCst) != epoch {
            return;
        }

        // The bulk read races with the first flushes for the new locale;
        // fresh results win, persisted rows only fill the gaps.
        for (key, value) in map {
            translated.entry(key).or_insert(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;
    use tokio::sync::Notify;

    const DELAY: Duration = Duration::from_millis(20);

    fn test_config() -> BatcherConfig {
        BatcherConfig { batch_delay: DELAY }
    }

    fn fr() -> Locale {
        Locale::parse("fr").unwrap()
    }

    fn de() -> Locale {
        Locale::parse("de").unwrap()
    }

    async fn wait_for(what: &str, condition: impl Fn() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(3);
        while !condition() {
            assert!(Instant::now() < deadline, "timed out waiting for {what}");
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    /// Engine that translates each line to `[target] line`, optionally
    /// holding every response until the gate is released.
    struct FakeEngine {
        calls: Mutex<Vec<(String, String)>>,
        gate: Option<Arc<Notify>>,
        fail: AtomicBool,
    }

    impl FakeEngine {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                gate: None,
                fail: AtomicBool::new(false),
            })
        }

        fn gated() -> (Arc<Self>, Arc<Notify>) {
            let gate = Arc::new(Notify::new());
            let engine = Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                gate: Some(Arc::clone(&gate)),
                fail: AtomicBool::new(false),
            });
            (engine, gate)
        }

        fn failing() -> Arc<Self> {
            let engine = Self::new();
            engine.fail.store(true, Ordering::SeqCst);
            engine
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        fn payloads(&self) -> Vec<String> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .map(|(payload, _)| payload.clone())
                .collect()
        }
    }

    #[async_trait]
    impl Localizer for FakeEngine {
        async fn localize(
            &self,
            text: &str,
            _source: Option<&Locale>,
            target: &Locale,
        ) -> Result<String, EngineError> {
            self.calls
                .lock()
                .unwrap()
                .push((text.to_string(), target.to_string()));
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(EngineError::Api {
                    status: 500,
                    body: "engine down".to_string(),
                });
            }
            Ok(text
                .split('\n')
                .map(|line| format!("[{target}] {line}"))
                .collect::<Vec<_>>()
                .join("\n"))
        }
    }

    /// In-memory stand-in for the remote cache store.
    #[derive(Default)]
    struct MemStore {
        ui: Mutex<HashMap<String, HashMap<String, String>>>,
        loads: AtomicUsize,
        saves: AtomicUsize,
        load_gate: Mutex<Option<Arc<Notify>>>,
    }

    impl MemStore {
        fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        fn seeded(locale: &Locale, map: HashMap<String, String>) -> Arc<Self> {
            let store = Self::default();
            store.ui.lock().unwrap().insert(locale.to_string(), map);
            Arc::new(store)
        }

        fn gate_loads(&self) -> Arc<Notify> {
            let gate = Arc::new(Notify::new());
            *self.load_gate.lock().unwrap() = Some(Arc::clone(&gate));
            gate
        }

        fn saved(&self, locale: &Locale) -> Option<HashMap<String, String>> {
            self.ui.lock().unwrap().get(locale.as_str()).cloned()
        }
    }

    #[async_trait]
    impl TranslationStore for MemStore {
        async fn load_ui_map(&self, locale: &Locale) -> Result<Option<HashMap<String, String>>> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            // Snapshot before the gate: a delayed response carries the rows
            // as they were when the read was issued.
            let value = self.ui.lock().unwrap().get(locale.as_str()).cloned();
            let gate = self.load_gate.lock().unwrap().clone();
            if let Some(gate) = gate {
                gate.notified().await;
            }
            Ok(value)
        }

        async fn save_ui_map(
            &self,
            locale: &Locale,
            map: &HashMap<String, String>,
        ) -> Result<()> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            self.ui
                .lock()
                .unwrap()
                .insert(locale.to_string(), map.clone());
            Ok(())
        }

        async fn find_document(
            &self,
            _text_id: &str,
            _target: &Locale,
        ) -> Result<Option<crate::store::CachedDocument>> {
            Ok(None)
        }

        async fn insert_document(&self, _doc: crate::store::NewDocument<'_>) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn default_locale_serves_catalog_without_network() {
        let engine = FakeEngine::new();
        let store = MemStore::new();
        let translator = UiTranslator::spawn(engine.clone(), store.clone(), test_config());

        assert_eq!(translator.translate("nav.dashboard"), "Dashboard");
        assert_eq!(translator.translate("common.save"), "Save");
        assert_eq!(translator.translate("nav.doesNotExist"), "nav.doesNotExist");

        tokio::time::sleep(DELAY * 3).await;
        assert_eq!(engine.call_count(), 0);
        assert_eq!(store.loads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn burst_coalesces_into_one_sorted_batch() {
        let engine = FakeEngine::new();
        let store = MemStore::new();
        let translator = UiTranslator::spawn(engine.clone(), store.clone(), test_config());
        translator.set_locale(fr());

        // Both calls return source text immediately and queue the keys.
        assert_eq!(translator.translate("nav.dashboard"), "Dashboard");
        assert_eq!(translator.translate("nav.calendar"), "Calendar");

        wait_for("merged translations", || {
            translator.translate("nav.dashboard") == "[fr] Dashboard"
        })
        .await;
        assert_eq!(translator.translate("nav.calendar"), "[fr] Calendar");

        // One batch, keys in sorted order, newline-joined.
        assert_eq!(engine.call_count(), 1);
        assert_eq!(engine.payloads(), vec!["Calendar\nDashboard".to_string()]);

        // One whole-map upsert for the locale.
        wait_for("persisted map", || store.saved(&fr()).is_some()).await;
        let saved = store.saved(&fr()).unwrap();
        assert_eq!(saved.get("nav.dashboard").unwrap(), "[fr] Dashboard");
        assert_eq!(saved.get("nav.calendar").unwrap(), "[fr] Calendar");
    }

    #[tokio::test]
    async fn in_flight_keys_are_not_requeued() {
        let (engine, gate) = FakeEngine::gated();
        let store = MemStore::new();
        let translator = UiTranslator::spawn(engine.clone(), store.clone(), test_config());
        translator.set_locale(fr());

        translator.translate("nav.dashboard");
        wait_for("first batch submitted", || engine.call_count() == 1).await;
        assert!(translator.is_busy());

        // Hammer the same key while its batch is in flight.
        for _ in 0..5 {
            assert_eq!(translator.translate("nav.dashboard"), "Dashboard");
        }
        tokio::time::sleep(DELAY * 3).await;
        assert_eq!(engine.call_count(), 1);

        gate.notify_one();
        wait_for("merged translation", || {
            translator.translate("nav.dashboard") == "[fr] Dashboard"
        })
        .await;
        assert_eq!(engine.call_count(), 1);
        assert!(!translator.is_busy());
    }

    #[tokio::test]
    async fn stale_batch_is_discarded_after_locale_switch() {
        let (engine, gate) = FakeEngine::gated();
        let store = MemStore::new();
        let translator = UiTranslator::spawn(engine.clone(), store.clone(), test_config());
        translator.set_locale(fr());

        translator.translate("nav.dashboard");
        wait_for("batch submitted", || engine.call_count() == 1).await;

        // Switch languages while the fr batch is still in flight, then let
        // it resolve.
        translator.set_locale(de());
        gate.notify_one();
        tokio::time::sleep(DELAY * 5).await;

        // The fr results were never merged or persisted.
        assert_eq!(translator.translate("nav.dashboard"), "Dashboard");
        assert!(store.saved(&fr()).is_none());
        assert_eq!(translator.locale(), de());
    }

    #[tokio::test]
    async fn engine_failure_keeps_source_text_and_frees_the_keys() {
        let engine = FakeEngine::failing();
        let store = MemStore::new();
        let translator = UiTranslator::spawn(engine.clone(), store.clone(), test_config());
        translator.set_locale(fr());

        translator.translate("nav.dashboard");
        wait_for("failed batch", || engine.call_count() == 1).await;
        wait_for("batch settled", || !translator.is_busy()).await;

        // Still the source text, nothing persisted.
        assert_eq!(translator.translate("nav.dashboard"), "Dashboard");
        assert!(store.saved(&fr()).is_none());

        // The translate call above re-queued the key.
        wait_for("retry batch", || engine.call_count() == 2).await;
    }

    #[tokio::test]
    async fn locale_switch_adopts_persisted_map() {
        let engine = FakeEngine::new();
        let mut persisted = HashMap::new();
        persisted.insert("nav.dashboard".to_string(), "Tableau de bord".to_string());
        let store = MemStore::seeded(&fr(), persisted);
        let translator = UiTranslator::spawn(engine.clone(), store.clone(), test_config());

        translator.set_locale(fr());
        wait_for("bulk read issued", || {
            store.loads.load(Ordering::SeqCst) == 1
        })
        .await;
        tokio::time::sleep(Duration::from_millis(100)).await;

        // Served from the adopted map; the engine was never consulted.
        assert_eq!(translator.translate("nav.dashboard"), "Tableau de bord");
        assert_eq!(engine.call_count(), 0);
    }

    #[tokio::test]
    async fn bulk_read_does_not_overwrite_fresh_results() {
        let engine = FakeEngine::new();
        let mut persisted = HashMap::new();
        persisted.insert("nav.dashboard".to_string(), "Vieux tableau".to_string());
        let store = MemStore::seeded(&fr(), persisted);
        let load_gate = store.gate_loads();
        let translator = UiTranslator::spawn(engine.clone(), store.clone(), test_config());

        // The bulk read is gated, so the flush resolves first.
        translator.set_locale(fr());
        translator.translate("nav.dashboard");
        wait_for("merged translation", || {
            translator.translate("nav.dashboard") == "[fr] Dashboard"
        })
        .await;

        load_gate.notify_one();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(translator.translate("nav.dashboard"), "[fr] Dashboard");
    }

    #[tokio::test]
    async fn returning_to_default_resets_to_catalog() {
        let engine = FakeEngine::new();
        let store = MemStore::new();
        let translator = UiTranslator::spawn(engine.clone(), store.clone(), test_config());
        translator.set_locale(fr());

        translator.translate("nav.dashboard");
        wait_for("merged translation", || {
            translator.translate("nav.dashboard") == "[fr] Dashboard"
        })
        .await;

        translator.set_locale(Locale::default_locale());
        assert_eq!(translator.translate("nav.dashboard"), "Dashboard");
        assert!(!translator.is_busy());
    }

    #[tokio::test]
    async fn unknown_keys_are_never_queued() {
        let engine = FakeEngine::new();
        let store = MemStore::new();
        let translator = UiTranslator::spawn(engine.clone(), store.clone(), test_config());
        translator.set_locale(fr());

        assert_eq!(translator.translate("panel.noSuchKey"), "panel.noSuchKey");
        tokio::time::sleep(DELAY * 3).await;
        assert_eq!(engine.call_count(), 0);
    }

    #[tokio::test]
    async fn translate_original_ignores_the_cache() {
        let engine = FakeEngine::new();
        let store = MemStore::new();
        let translator = UiTranslator::spawn(engine.clone(), store.clone(), test_config());
        translator.set_locale(fr());

        translator.translate("nav.dashboard");
        wait_for("merged translation", || {
            translator.translate("nav.dashboard") == "[fr] Dashboard"
        })
        .await;

        assert_eq!(translator.translate_original("nav.dashboard"), "Dashboard");
        assert_eq!(
            translator.translate_original("nav.doesNotExist"),
            "nav.doesNotExist"
        );
    }
}
