//! Star intent repository trait and implementation
//!
//! The local intent store: an append-mostly queue of favorite actions that
//! still have to reach the music server. No identity check is performed on
//! write; several intents for the same target may coexist until the startup
//! reconciler resolves them.

use crate::error::{LibraryError, Result};
use crate::models::{StarIntent, StarIntentId, TargetKind};
use async_trait::async_trait;
use sqlx::{query, query_as, query_scalar, FromRow, SqlitePool};
use tracing::debug;

/// Star intent repository interface
#[async_trait]
pub trait StarIntentRepository: Send + Sync {
    /// All persisted intents, in store (insertion) order
    async fn list(&self) -> Result<Vec<StarIntent>>;

    /// Append a pending intent
    ///
    /// Writing an intent whose `id` already exists overwrites that row in
    /// place; intents for the same target are never merged here.
    ///
    /// # Errors
    /// Returns error if the intent fails validation or the database write fails
    async fn upsert(&self, intent: &StarIntent) -> Result<()>;

    /// Remove one persisted intent
    ///
    /// # Returns
    /// - `Ok(true)` if the row was deleted
    /// - `Ok(false)` if it was already gone
    async fn delete(&self, intent: &StarIntent) -> Result<bool>;

    /// Intents queued for one target, in store order
    async fn list_for_target(&self, kind: TargetKind, target_id: &str)
        -> Result<Vec<StarIntent>>;

    /// Count persisted intents
    async fn count(&self) -> Result<i64>;
}

/// SQLite implementation of StarIntentRepository
pub struct SqliteStarIntentRepository {
    pool: SqlitePool,
}

impl SqliteStarIntentRepository {
    /// Create a new SqliteStarIntentRepository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a star intent
#[derive(Debug, FromRow)]
struct StarIntentRow {
    id: String,
    target_kind: String,
    target_id: String,
    desired_starred: bool,
    issued_at: i64,
}

impl TryFrom<StarIntentRow> for StarIntent {
    type Error = LibraryError;

    fn try_from(row: StarIntentRow) -> Result<Self> {
        let id = StarIntentId::from_string(&row.id).map_err(|e| LibraryError::InvalidInput {
            field: "id".to_string(),
            message: e.to_string(),
        })?;

        Ok(StarIntent {
            id,
            target_kind: row.target_kind.parse()?,
            target_id: row.target_id,
            desired_starred: row.desired_starred,
            issued_at: row.issued_at,
        })
    }
}

#[async_trait]
impl StarIntentRepository for SqliteStarIntentRepository {
    async fn list(&self) -> Result<Vec<StarIntent>> {
        let rows = query_as::<_, StarIntentRow>(
            r#"
            SELECT id, target_kind, target_id, desired_starred, issued_at
            FROM star_intents
            ORDER BY rowid ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(StarIntent::try_from).collect()
    }

    async fn upsert(&self, intent: &StarIntent) -> Result<()> {
        intent.validate().map_err(|e| LibraryError::InvalidInput {
            field: "StarIntent".to_string(),
            message: e,
        })?;

        // ON CONFLICT keeps the original rowid, so store order is stable.
        query(
            r#"
            INSERT INTO star_intents (id, target_kind, target_id, desired_starred, issued_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                target_kind = excluded.target_kind,
                target_id = excluded.target_id,
                desired_starred = excluded.desired_starred,
                issued_at = excluded.issued_at
            "#,
        )
        .bind(intent.id.to_string())
        .bind(intent.target_kind.as_str())
        .bind(&intent.target_id)
        .bind(intent.desired_starred)
        .bind(intent.issued_at)
        .execute(&self.pool)
        .await?;

        debug!(
            intent_id = %intent.id,
            target_kind = %intent.target_kind,
            target_id = %intent.target_id,
            desired_starred = intent.desired_starred,
            "Star intent persisted"
        );

        Ok(())
    }

    async fn delete(&self, intent: &StarIntent) -> Result<bool> {
        let result = query("DELETE FROM star_intents WHERE id = ?")
            .bind(intent.id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_for_target(
        &self,
        kind: TargetKind,
        target_id: &str,
    ) -> Result<Vec<StarIntent>> {
        let rows = query_as::<_, StarIntentRow>(
            r#"
            SELECT id, target_kind, target_id, desired_starred, issued_at
            FROM star_intents
            WHERE target_kind = ? AND target_id = ?
            ORDER BY rowid ASC
            "#,
        )
        .bind(kind.as_str())
        .bind(target_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(StarIntent::try_from).collect()
    }

    async fn count(&self) -> Result<i64> {
        let count = query_scalar::<_, i64>("SELECT COUNT(*) FROM star_intents")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;
    use crate::models::TargetRef;

    async fn repo() -> SqliteStarIntentRepository {
        SqliteStarIntentRepository::new(create_test_pool().await.unwrap())
    }

    #[tokio::test]
    async fn test_upsert_and_list_preserve_store_order() {
        let repo = repo().await;
        let song = TargetRef::Song("S1".to_string());

        // issued_at deliberately out of order
        let later = StarIntent::unstar(&song, 200);
        let earlier = StarIntent::star(&song, 100);
        repo.upsert(&later).await.unwrap();
        repo.upsert(&earlier).await.unwrap();

        let all = repo.list().await.unwrap();
        assert_eq!(all, vec![later, earlier]);
    }

    #[tokio::test]
    async fn test_duplicates_for_same_target_are_kept() {
        let repo = repo().await;
        let album = TargetRef::Album("A1".to_string());

        for issued_at in [1, 2, 3] {
            repo.upsert(&StarIntent::star(&album, issued_at)).await.unwrap();
        }

        assert_eq!(repo.count().await.unwrap(), 3);
        assert_eq!(
            repo.list_for_target(TargetKind::Album, "A1").await.unwrap().len(),
            3
        );
        assert!(repo
            .list_for_target(TargetKind::Song, "A1")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_upsert_same_id_overwrites_in_place() {
        let repo = repo().await;
        let artist = TargetRef::Artist("AR1".to_string());

        let first = StarIntent::star(&artist, 10);
        let second = StarIntent::star(&artist, 20);
        repo.upsert(&first).await.unwrap();
        repo.upsert(&second).await.unwrap();

        let mut updated = first.clone();
        updated.desired_starred = false;
        updated.issued_at = 30;
        repo.upsert(&updated).await.unwrap();

        let all = repo.list().await.unwrap();
        assert_eq!(all, vec![updated, second]);
    }

    #[tokio::test]
    async fn test_delete_removes_only_that_intent() {
        let repo = repo().await;
        let song = TargetRef::Song("S1".to_string());

        let keep = StarIntent::star(&song, 1);
        let removed = StarIntent::unstar(&song, 2);
        repo.upsert(&keep).await.unwrap();
        repo.upsert(&removed).await.unwrap();

        assert!(repo.delete(&removed).await.unwrap());
        assert!(!repo.delete(&removed).await.unwrap());
        assert_eq!(repo.list().await.unwrap(), vec![keep]);
    }

    #[tokio::test]
    async fn test_upsert_rejects_blank_target() {
        let repo = repo().await;
        let blank = StarIntent::star(&TargetRef::Song(String::new()), 1);

        let result = repo.upsert(&blank).await;
        assert!(matches!(result, Err(LibraryError::InvalidInput { .. })));
        assert_eq!(repo.count().await.unwrap(), 0);
    }
}
