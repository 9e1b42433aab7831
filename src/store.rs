//! Remote cache store boundary.
//!
//! Two key-addressed tables, both written so the same translation is never
//! purchased twice: one row per UI locale holding the whole
//! translated-so-far map, and one row per `(text, target language)` pair
//! holding a translated document body. Reads treat "no row" as a normal
//! miss, never as an error.

use crate::locale::Locale;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use std::collections::HashMap;

/// A cached document translation row.
#[derive(Debug, Clone)]
pub struct CachedDocument {
    pub translated_content: String,
    pub source_language: String,
    pub created_at: DateTime<Utc>,
}

/// A new document translation to persist.
#[derive(Debug, Clone)]
pub struct NewDocument<'a> {
    pub text_id: &'a str,
    pub target_language: &'a Locale,
    pub source_language: &'a str,
    pub translated_content: &'a str,
}

/// Store operations needed by the batcher and the document cache.
#[async_trait]
pub trait TranslationStore: Send + Sync {
    /// Load the persisted UI map for a locale. `Ok(None)` means no row yet.
    async fn load_ui_map(&self, locale: &Locale) -> Result<Option<HashMap<String, String>>>;

    /// Upsert the whole UI map for a locale.
    async fn save_ui_map(&self, locale: &Locale, map: &HashMap<String, String>) -> Result<()>;

    /// Point lookup of a cached document translation.
    async fn find_document(&self, text_id: &str, target: &Locale)
        -> Result<Option<CachedDocument>>;

    /// Persist a freshly purchased document translation. Rows are never
    /// updated or deleted afterwards; a concurrent duplicate insert is a
    /// no-op.
    async fn insert_document(&self, doc: NewDocument<'_>) -> Result<()>;
}

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect and create the schema if it does not exist yet.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .context("Failed to connect to the cache store database")?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS ui_translations (
                language TEXT PRIMARY KEY,
                translations JSONB NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create ui_translations table")?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS document_translations (
                id BIGSERIAL PRIMARY KEY,
                text_id TEXT NOT NULL,
                target_language TEXT NOT NULL,
                source_language TEXT NOT NULL,
                translated_content TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                UNIQUE (text_id, target_language)
            )",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create document_translations table")?;

        Ok(())
    }
}

#[async_trait]
impl TranslationStore for PgStore {
    async fn load_ui_map(&self, locale: &Locale) -> Result<Option<HashMap<String, String>>> {
        let row = sqlx::query("SELECT translations FROM ui_translations WHERE language = $1")
            .bind(locale.as_str())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to read ui_translations")?;

        match row {
            None => Ok(None),
            Some(row) => {
                let value: serde_json::Value = row.try_get("translations")?;
                let map = serde_json::from_value(value)
                    .context("ui_translations row holds malformed JSON")?;
                Ok(Some(map))
            }
        }
    }

    async fn save_ui_map(&self, locale: &Locale, map: &HashMap<String, String>) -> Result<()> {
        let payload = serde_json::to_value(map).context("Failed to encode UI map")?;

        sqlx::query(
            "INSERT INTO ui_translations (language, translations, updated_at)
             VALUES ($1, $2, $3)
             ON CONFLICT (language) DO UPDATE
             SET translations = EXCLUDED.translations, updated_at = EXCLUDED.updated_at",
        )
        .bind(locale.as_str())
        .bind(payload)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .context("Failed to upsert ui_translations")?;

        Ok(())
    }

    async fn find_document(
        &self,
        text_id: &str,
        target: &Locale,
    ) -> Result<Option<CachedDocument>> {
        let row = sqlx::query(
            "SELECT translated_content, source_language, created_at
             FROM document_translations
             WHERE text_id = $1 AND target_language = $2",
        )
        .bind(text_id)
        .bind(target.as_str())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to read document_translations")?;

        match row {
            None => Ok(None),
            Some(row) => Ok(Some(CachedDocument {
                translated_content: row.try_get("translated_content")?,
                source_language: row.try_get("source_language")?,
                created_at: row.try_get("created_at")?,
            })),
        }
    }

    async fn insert_document(&self, doc: NewDocument<'_>) -> Result<()> {
        sqlx::query(
            "INSERT INTO document_translations
                 (text_id, target_language, source_language, translated_content, created_at)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (text_id, target_language) DO NOTHING",
        )
        .bind(doc.text_id)
        .bind(doc.target_language.as_str())
        .bind(doc.source_language)
        .bind(doc.translated_content)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .context("Failed to insert into document_translations")?;

        Ok(())
    }
}
