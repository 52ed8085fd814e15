//! Repository contract for extra files, and its SQLite implementation.

use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::models::ExtraFile;
use crate::models::row::{ExtraFileRow, db_path, timestamp, to_db_id};
use async_trait::async_trait;
use exn::ResultExt;
use sqlx::SqlitePool;
use std::marker::PhantomData;
use std::path::Path;
use tracing::instrument;

/// Durable storage of extra file records, keyed by owning media item and
/// owning media file.
///
/// Lookups signal absence as "no match" (`None` or an empty list), never as an
/// error. Batch writes make no partial-failure promises beyond what the
/// underlying store offers.
#[async_trait]
pub trait ExtraFileRepository<E: ExtraFile>: Send + Sync {
    async fn get_files_by_media_item(&self, media_item_id: u64) -> Result<Vec<E>>;

    async fn get_files_by_sub_group(&self, media_item_id: u64, sub_group: u32) -> Result<Vec<E>>;

    async fn get_files_by_media_file(&self, media_file_id: u64) -> Result<Vec<E>>;

    /// Find the record stored at a relative path.
    ///
    /// Relative paths are only unique per media item; if several media items
    /// share one, the oldest record wins.
    async fn find_by_path(&self, path: &Path) -> Result<Option<E>>;

    /// Persist new records, writing the assigned ids back into `files`.
    async fn insert_many(&self, files: &mut [E]) -> Result<()>;

    async fn update_many(&self, files: &[E]) -> Result<()>;

    async fn delete(&self, id: u64) -> Result<()>;

    async fn delete_many(&self, ids: &[u64]) -> Result<()>;

    /// Returns the number of records removed.
    async fn delete_for_media_item(&self, media_item_id: u64) -> Result<u64>;

    /// Returns the number of records removed.
    async fn delete_for_media_file(&self, media_file_id: u64) -> Result<u64>;
}

/// SQLite-backed [`ExtraFileRepository`] for one kind of extra file.
///
/// All kinds share the `extra_files` table; every query is scoped by
/// [`ExtraFile::KIND`], so a `SqliteRepository<SubtitleFile>` never sees
/// metadata records and vice versa.
///
/// # De-duplication
///
/// A relative path identifies at most one record of a kind per media item.
/// Inserting a record whose path is already indexed updates the existing row
/// (keeping its original `added` timestamp) and hands its id and `added` back
/// to the caller's record. Re-discovering a file before its first insert's id
/// is known therefore never creates a duplicate.
#[derive(Debug)]
pub struct SqliteRepository<E> {
    pool: SqlitePool,
    dry_run: bool,
    kind: PhantomData<fn() -> E>,
}
impl<E> Clone for SqliteRepository<E> {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone(), self.dry_run)
    }
}
impl<E> From<&Database> for SqliteRepository<E> {
    fn from(db: &Database) -> Self {
        Self::new(db.pool().clone(), false)
    }
}
impl<E> SqliteRepository<E> {
    /// Create a new repository with the given connection pool.
    ///
    /// In `dry_run` mode reads go to the database as usual, but writes are
    /// skipped and reported as successful.
    pub fn new(pool: SqlitePool, dry_run: bool) -> Self {
        Self { pool, dry_run, kind: PhantomData }
    }
}
impl<E: ExtraFile> SqliteRepository<E> {
    fn kind(&self) -> &'static str {
        E::KIND.as_str()
    }

    fn into_models(rows: Vec<ExtraFileRow>) -> Result<Vec<E>> {
        rows.into_iter().map(ExtraFileRow::into_model).collect()
    }

    async fn delete_by(&self, query: &'static str, key: i64) -> Result<u64> {
        if self.dry_run {
            return Ok(0);
        }
        let result = sqlx::query(query)
            .bind(self.kind())
            .bind(key)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl<E: ExtraFile> ExtraFileRepository<E> for SqliteRepository<E> {
    async fn get_files_by_media_item(&self, media_item_id: u64) -> Result<Vec<E>> {
        let rows: Vec<ExtraFileRow> = sqlx::query_as(include_str!("../queries/get_by_media_item.sql"))
            .bind(self.kind())
            .bind(to_db_id(media_item_id, "media item id")?)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Self::into_models(rows)
    }

    async fn get_files_by_sub_group(&self, media_item_id: u64, sub_group: u32) -> Result<Vec<E>> {
        let rows: Vec<ExtraFileRow> = sqlx::query_as(include_str!("../queries/get_by_sub_group.sql"))
            .bind(self.kind())
            .bind(to_db_id(media_item_id, "media item id")?)
            .bind(i64::from(sub_group))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Self::into_models(rows)
    }

    async fn get_files_by_media_file(&self, media_file_id: u64) -> Result<Vec<E>> {
        let rows: Vec<ExtraFileRow> = sqlx::query_as(include_str!("../queries/get_by_media_file.sql"))
            .bind(self.kind())
            .bind(to_db_id(media_file_id, "media file id")?)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Self::into_models(rows)
    }

    async fn find_by_path(&self, path: &Path) -> Result<Option<E>> {
        // A path that can't be stored can't have been stored.
        let Ok(path) = db_path(path) else {
            return Ok(None);
        };
        let row: Option<ExtraFileRow> = sqlx::query_as(include_str!("../queries/find_by_path.sql"))
            .bind(self.kind())
            .bind(path)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(ExtraFileRow::into_model).transpose()
    }

    #[instrument(skip_all, fields(kind = self.kind(), count = files.len()))]
    async fn insert_many(&self, files: &mut [E]) -> Result<()> {
        if self.dry_run || files.is_empty() {
            return Ok(());
        }
        let rows = files.iter().map(ExtraFileRow::from_model).collect::<Result<Vec<_>>>()?;
        let mut assigned = Vec::with_capacity(rows.len());
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        for row in rows {
            let stored: (i64, i64, i64) = sqlx::query_as(include_str!("../queries/insert.sql"))
                .bind(row.kind)
                .bind(row.media_item_id)
                .bind(row.media_file_id)
                .bind(row.sub_group)
                .bind(row.relative_path)
                .bind(row.extension)
                .bind(row.details)
                .bind(row.added)
                .bind(row.last_updated)
                .fetch_one(&mut *tx)
                .await
                .or_raise(|| ErrorKind::Database)?;
            assigned.push(stored);
        }
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        // Only touch the caller's records once the batch is committed. The
        // timestamps are read back at the precision they are stored with.
        for (file, (id, added, last_updated)) in files.iter_mut().zip(assigned) {
            file.id = u64::try_from(id).or_raise(|| ErrorKind::InvalidData("id"))?;
            file.added = timestamp(added, "added")?;
            file.last_updated = timestamp(last_updated, "last updated")?;
        }
        Ok(())
    }

    #[instrument(skip_all, fields(kind = self.kind(), count = files.len()))]
    async fn update_many(&self, files: &[E]) -> Result<()> {
        if self.dry_run || files.is_empty() {
            return Ok(());
        }
        let rows = files.iter().map(ExtraFileRow::from_model).collect::<Result<Vec<_>>>()?;
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        for row in rows {
            let result = sqlx::query(include_str!("../queries/update.sql"))
                .bind(row.media_item_id)
                .bind(row.media_file_id)
                .bind(row.sub_group)
                .bind(row.relative_path)
                .bind(row.extension)
                .bind(row.details)
                .bind(row.last_updated)
                .bind(row.kind)
                .bind(row.id)
                .execute(&mut *tx)
                .await
                .or_raise(|| ErrorKind::Database)?;
            if result.rows_affected() == 0 {
                tracing::warn!(kind = self.kind(), id = row.id, "Updated extra file is no longer in the index");
            }
        }
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    async fn delete(&self, id: u64) -> Result<()> {
        self.delete_by(include_str!("../queries/delete.sql"), to_db_id(id, "id")?).await?;
        Ok(())
    }

    #[instrument(skip_all, fields(kind = self.kind(), count = ids.len()))]
    async fn delete_many(&self, ids: &[u64]) -> Result<()> {
        if self.dry_run || ids.is_empty() {
            return Ok(());
        }
        let ids = ids.iter().map(|id| to_db_id(*id, "id")).collect::<Result<Vec<_>>>()?;
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        for id in ids {
            sqlx::query(include_str!("../queries/delete.sql"))
                .bind(self.kind())
                .bind(id)
                .execute(&mut *tx)
                .await
                .or_raise(|| ErrorKind::Database)?;
        }
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    async fn delete_for_media_item(&self, media_item_id: u64) -> Result<u64> {
        let key = to_db_id(media_item_id, "media item id")?;
        self.delete_by(include_str!("../queries/delete_for_media_item.sql"), key).await
    }

    async fn delete_for_media_file(&self, media_file_id: u64) -> Result<u64> {
        let key = to_db_id(media_file_id, "media file id")?;
        self.delete_by(include_str!("../queries/delete_for_media_file.sql"), key).await
    }
}
