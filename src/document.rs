//! Cache-aside translation of whole document bodies.
//!
//! Invoked explicitly by a user action ("Translate this text"), never from
//! render-time code. The remote cache store is checked first; on a miss the
//! engine is called and the result written back, so the same `(document,
//! target language)` pair is purchased at most once under normal operation.

use crate::engine::{EngineError, Localizer};
use crate::locale::Locale;
use crate::metrics::TranslationMetrics;
use crate::store::{NewDocument, TranslationStore};
use std::sync::Arc;
use tracing::warn;

/// A document translation request.
#[derive(Debug, Clone)]
pub struct DocumentRequest<'a> {
    /// Stable identity of the stored text; `None` skips the cache entirely
    /// (ad-hoc content that has no row to key on).
    pub text_id: Option<&'a str>,
    pub content: &'a str,
    /// `None` lets the engine auto-detect.
    pub source_language: Option<&'a Locale>,
    pub target_language: &'a Locale,
}

/// The outcome handed back to the user action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedDocument {
    pub text: String,
    pub from_cache: bool,
}

/// Cache-aside wrapper around the translation engine for document bodies.
pub struct DocumentTranslator {
    engine: Arc<dyn Localizer>,
    store: Arc<dyn TranslationStore>,
}

impl DocumentTranslator {
    pub fn new(engine: Arc<dyn Localizer>, store: Arc<dyn TranslationStore>) -> Self {
        Self { engine, store }
    }

    /// Translate a document, consulting the cache first.
    ///
    /// Only an engine failure (or a missing credential) reaches the caller;
    /// cache read failures count as misses and cache write failures are
    /// logged without affecting the returned translation.
    ///
    /// Two concurrent misses for the same `(text_id, target)` pair may both
    /// call the engine; the store's unique index makes the double write
    /// harmless.
    pub async fn translate(
        &self,
        request: DocumentRequest<'_>,
    ) -> Result<TranslatedDocument, EngineError> {
        let metrics = TranslationMetrics::global();

        if let Some(text_id) = request.text_id {
            match self
                .store
                .find_document(text_id, request.target_language)
                .await
            {
                Ok(Some(cached)) => {
                    metrics.record_doc_cache_hit();
                    return Ok(TranslatedDocument {
                        text: cached.translated_content,
                        from_cache: true,
                    });
                }
                Ok(None) => metrics.record_doc_cache_miss(),
                Err(error) => {
                    metrics.record_doc_cache_miss();
                    warn!(text_id, "document cache lookup failed: {:#}", error);
                }
            }
        }

        let text = self
            .engine
            .localize(
                request.content,
                request.source_language,
                request.target_language,
            )
            .await?;

        if let Some(text_id) = request.text_id {
            let row = NewDocument {
                text_id,
                target_language: request.target_language,
                source_language: request
                    .source_language
                    .map(Locale::as_str)
                    .unwrap_or("auto"),
                translated_content: &text,
            };
            if let Err(error) = self.store.insert_document(row).await {
                metrics.record_store_write_failure();
                warn!(text_id, "failed to cache document translation: {:#}", error);
            }
        }

        Ok(TranslatedDocument {
            text,
            from_cache: false,
        })
    }
}
