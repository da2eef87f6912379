//! Analysis persistence
//!
//! The full Analysis is stored as one JSON document; a few columns are
//! lifted out for inspection with plain SQL.

use async_trait::async_trait;
use bpa_common::{Analysis, Result, SubscriptionLevel};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::types::AnalysisStore;

#[derive(Debug, Clone)]
pub struct SqliteAnalysisStore {
    pool: SqlitePool,
}

impl SqliteAnalysisStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Save (insert or replace) an analysis
pub async fn save_analysis(pool: &SqlitePool, analysis: &Analysis) -> Result<()> {
    let analysis_id = analysis.id.to_string();
    let subscription_level = match analysis.subscription_level {
        SubscriptionLevel::Standard => "standard",
        SubscriptionLevel::Premium => "premium",
    };
    let document = serde_json::to_string(analysis)?;
    let generated_at = analysis.generated_at.to_rfc3339();
    let updated_at = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO analyses (
            analysis_id, subscription_level, score, provisional, company,
            document, generated_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(analysis_id) DO UPDATE SET
            subscription_level = excluded.subscription_level,
            score = excluded.score,
            provisional = excluded.provisional,
            company = excluded.company,
            document = excluded.document,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(&analysis_id)
    .bind(subscription_level)
    .bind(i64::from(analysis.score))
    .bind(analysis.provisional)
    .bind(&analysis.company)
    .bind(&document)
    .bind(&generated_at)
    .bind(&updated_at)
    .execute(pool)
    .await?;

    tracing::debug!(analysis_id = %analysis.id, "Analysis saved");
    Ok(())
}

/// Load an analysis by id
pub async fn load_analysis(pool: &SqlitePool, analysis_id: Uuid) -> Result<Option<Analysis>> {
    let row = sqlx::query("SELECT document FROM analyses WHERE analysis_id = ?")
        .bind(analysis_id.to_string())
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => {
            let document: String = row.get("document");
            let analysis: Analysis = serde_json::from_str(&document)?;
            Ok(Some(analysis.normalized()))
        }
        None => Ok(None),
    }
}

#[async_trait]
impl AnalysisStore for SqliteAnalysisStore {
    async fn save(&self, analysis: &Analysis) -> Result<()> {
        save_analysis(&self.pool, analysis).await
    }

    async fn load(&self, id: Uuid) -> Result<Option<Analysis>> {
        load_analysis(&self.pool, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn store() -> (SqliteAnalysisStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let pool = crate::db::init_database_pool(&dir.path().join("bpa.db")).await.unwrap();
        (SqliteAnalysisStore::new(pool), dir)
    }

    fn sample() -> Analysis {
        serde_json::from_value(json!({
            "score": 70,
            "feedback": { "solution": "Quantify the time saved." },
            "answers": { "solution": "AI booking" },
            "company": "Clinicly"
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let (store, _dir) = store().await;
        let analysis = sample();
        store.save(&analysis).await.unwrap();

        let loaded = store.load(analysis.id).await.unwrap().unwrap();
        assert_eq!(loaded.score, 70);
        assert_eq!(loaded.feedback, analysis.feedback);
        assert_eq!(loaded.company.as_deref(), Some("Clinicly"));
    }

    #[tokio::test]
    async fn test_save_twice_updates() {
        let (store, _dir) = store().await;
        let mut analysis = sample();
        store.save(&analysis).await.unwrap();
        analysis.score = 82;
        store.save(&analysis).await.unwrap();

        assert_eq!(store.load(analysis.id).await.unwrap().unwrap().score, 82);
    }

    #[tokio::test]
    async fn test_corrupt_document_is_a_document_error() {
        let (store, _dir) = store().await;
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO analyses
                 (analysis_id, subscription_level, score, document, generated_at, updated_at)
             VALUES (?, 'standard', 0, '{not json', '', '')",
        )
        .bind(id.to_string())
        .execute(&store.pool)
        .await
        .unwrap();

        let err = store.load(id).await.unwrap_err();
        assert!(matches!(err, bpa_common::Error::Document(_)));
    }

    #[tokio::test]
    async fn test_missing_id_is_none() {
        let (store, _dir) = store().await;
        assert!(store.load(Uuid::new_v4()).await.unwrap().is_none());
    }
}
