//! On-demand translation layer for the LinguaLearn education portal.
//!
//! Two subsystems share one goal: minimize calls to an expensive, rate-limited
//! remote translation engine while keeping the UI responsive.
//!
//! - [`batcher`] lazily translates only the interface strings actually
//!   rendered on the current screen. Lookups during one render pass are
//!   coalesced into a single debounced batch call, and every flush is
//!   epoch-tagged so results that resolve after the user switched language
//!   are discarded instead of merged.
//! - [`document`] is a cache-aside wrapper for whole document bodies, keyed
//!   by `(document, target language)`, so the same translation is never
//!   purchased twice.
//!
//! Supporting modules: [`catalog`] (source-language strings), [`engine`]
//! (remote translation engine boundary), [`store`] (remote cache store
//! boundary), [`metrics`] (observability counters), [`prefs`] (local client
//! preferences), [`retry`] (bounded backoff for engine calls).

pub mod batcher;
pub mod catalog;
pub mod config;
pub mod document;
pub mod engine;
pub mod locale;
pub mod metrics;
pub mod prefs;
pub mod retry;
pub mod store;

pub use batcher::{BatcherConfig, UiTranslator};
pub use config::Config;
pub use document::{DocumentRequest, DocumentTranslator, TranslatedDocument};
pub use engine::{EngineError, LingoClient, Localizer};
pub use locale::Locale;
pub use store::{CachedDocument, NewDocument, PgStore, TranslationStore};
