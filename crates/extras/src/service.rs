use crate::bus::Handle;
use crate::error::{ErrorKind, Result};
use crate::events::{MediaFileDeleted, MediaItemDeleted};
use crate::lookup::MediaItemLookup;
use async_trait::async_trait;
use exn::ResultExt;
use sidecar_cache::{ExtraFile, ExtraFileRepository};
use sidecar_storage::{DiskHandle, Permanent, SinkHandle, resolve_path};
use std::marker::PhantomData;
use std::path::Path;
use std::sync::Arc;
use time::UtcDateTime;
use tracing::instrument;

/// Lifecycle of one kind of extra file.
///
/// Callers persist discovered extras through [`upsert_many`](Self::upsert_many),
/// which stamps timestamps and routes each record to an insert or an update.
/// Subscribed to the deletion events (see [`EventBus`](crate::EventBus)), the
/// service cascades media item and media file deletions to the index, and for
/// media files to the sidecar files on disk.
///
/// Files removed from disk go through the recycle bin sink, or through a
/// permanent sink when [`permanently_delete`](Self::permanently_delete) is
/// set. The default comes from [`ExtraFile::PERMANENTLY_DELETE`].
pub struct ExtraFileService<E, R> {
    repository: R,
    disk: DiskHandle,
    recycle_bin: SinkHandle,
    permanent: SinkHandle,
    media_items: Arc<dyn MediaItemLookup + Send + Sync>,
    permanently_delete: bool,
    kind: PhantomData<fn() -> E>,
}

impl<E: ExtraFile, R: ExtraFileRepository<E>> ExtraFileService<E, R> {
    pub fn new(
        repository: R,
        disk: DiskHandle,
        recycle_bin: SinkHandle,
        media_items: Arc<dyn MediaItemLookup + Send + Sync>,
    ) -> Self {
        Self {
            repository,
            permanent: Arc::new(Permanent::new(disk.clone())),
            disk,
            recycle_bin,
            media_items,
            permanently_delete: E::PERMANENTLY_DELETE,
            kind: PhantomData,
        }
    }

    /// Override the deletion policy of the kind.
    pub fn with_permanently_delete(mut self, permanently_delete: bool) -> Self {
        self.permanently_delete = permanently_delete;
        self
    }

    pub fn permanently_delete(&self) -> bool {
        self.permanently_delete
    }

    pub async fn get_files_by_media_item(&self, media_item_id: u64) -> Result<Vec<E>> {
        self.repository.get_files_by_media_item(media_item_id).await.or_raise(|| ErrorKind::Storage)
    }

    pub async fn get_files_by_sub_group(&self, media_item_id: u64, sub_group: u32) -> Result<Vec<E>> {
        self.repository.get_files_by_sub_group(media_item_id, sub_group).await.or_raise(|| ErrorKind::Storage)
    }

    pub async fn get_files_by_media_file(&self, media_file_id: u64) -> Result<Vec<E>> {
        self.repository.get_files_by_media_file(media_file_id).await.or_raise(|| ErrorKind::Storage)
    }

    pub async fn find_by_path(&self, path: impl AsRef<Path>) -> Result<Option<E>> {
        self.repository.find_by_path(path.as_ref()).await.or_raise(|| ErrorKind::Storage)
    }

    pub async fn upsert(&self, file: &mut E) -> Result<()> {
        self.upsert_many(std::slice::from_mut(file)).await
    }

    /// Persist a batch of records, new and existing alike.
    ///
    /// Every record gets a fresh `last_updated`; records that were never
    /// persisted (`id == 0`) also get `added`. New records are then inserted
    /// and existing ones updated, each as one batch. On success the new
    /// records in `files` carry the ids the repository assigned.
    ///
    /// Records are not de-duplicated by path here.
    #[instrument(skip_all, fields(kind = %E::KIND, count = files.len()))]
    pub async fn upsert_many(&self, files: &mut [E]) -> Result<()> {
        let now = UtcDateTime::now();
        for file in files.iter_mut() {
            file.last_updated = now;
            if !file.is_persisted() {
                file.added = now;
            }
        }

        let new: Vec<usize> = files.iter().enumerate().filter(|(_, f)| !f.is_persisted()).map(|(i, _)| i).collect();
        let existing: Vec<E> = files.iter().filter(|f| f.is_persisted()).cloned().collect();

        if !new.is_empty() {
            let mut inserted: Vec<E> = new.iter().map(|&i| files[i].clone()).collect();
            self.repository.insert_many(&mut inserted).await.or_raise(|| ErrorKind::Storage)?;
            for (i, file) in new.into_iter().zip(inserted) {
                files[i] = file;
            }
        }
        if !existing.is_empty() {
            self.repository.update_many(&existing).await.or_raise(|| ErrorKind::Storage)?;
        }
        Ok(())
    }

    /// Remove a record from the index. The file on disk is left alone.
    pub async fn delete(&self, id: u64) -> Result<()> {
        self.repository.delete(id).await.or_raise(|| ErrorKind::Storage)
    }

    /// Remove records from the index. The files on disk are left alone.
    pub async fn delete_many(&self, ids: &[u64]) -> Result<()> {
        self.repository.delete_many(ids).await.or_raise(|| ErrorKind::Storage)
    }

    async fn remove_from_disk(&self, root: &Path, file: &E) -> Result<()> {
        let path =
            resolve_path(root, &file.relative_path).or_raise(|| ErrorKind::InvalidPath(file.relative_path.clone()))?;
        if !self.disk.exists(&path).await.or_raise(|| ErrorKind::Disk)? {
            tracing::debug!(id = file.id, path = %path.display(), "Extra file already gone from disk");
            return Ok(());
        }
        let sink = if self.permanently_delete { &self.permanent } else { &self.recycle_bin };
        tracing::info!(id = file.id, path = %path.display(), sink = sink.name(), "Deleting extra file");
        sink.delete_file(&path).await.or_raise(|| ErrorKind::Disk)
    }
}

#[async_trait]
impl<E: ExtraFile, R: ExtraFileRepository<E>> Handle<MediaItemDeleted> for ExtraFileService<E, R> {
    #[instrument(
        skip_all,
        fields(kind = %E::KIND, media_item_id = event.media_item_id, delete_files = event.delete_files)
    )]
    async fn handle(&self, event: &MediaItemDeleted) -> Result<()> {
        // The owning media system removes the item's directory itself, if at all.
        let removed =
            self.repository.delete_for_media_item(event.media_item_id).await.or_raise(|| ErrorKind::Storage)?;
        if event.delete_files {
            tracing::debug!(removed, "Removed extra files of deleted media item");
        } else {
            tracing::info!(removed, "Media item directory kept, its extra files are no longer indexed");
        }
        Ok(())
    }
}

#[async_trait]
impl<E: ExtraFile, R: ExtraFileRepository<E>> Handle<MediaFileDeleted> for ExtraFileService<E, R> {
    #[instrument(
        skip_all,
        fields(kind = %E::KIND, media_file_id = event.media_file_id, reason = %event.reason)
    )]
    async fn handle(&self, event: &MediaFileDeleted) -> Result<()> {
        if event.reason.is_bookkeeping_only() {
            tracing::debug!("Media file is still on disk, keeping its extra files");
        } else {
            let root = self.media_items.media_item_root(event.media_item_id).await?;
            let files = self.get_files_by_media_file(event.media_file_id).await?;
            for file in &files {
                self.remove_from_disk(&root, file).await?;
            }
        }
        let removed =
            self.repository.delete_for_media_file(event.media_file_id).await.or_raise(|| ErrorKind::Storage)?;
        tracing::debug!(removed, "Removed extra files of deleted media file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::EventBus;
    use crate::events::DeleteReason;
    use crate::lookup::StaticMediaItems;
    use rstest::rstest;
    use sidecar_cache::error::{ErrorKind as CacheErrorKind, Result as CacheResult};
    use sidecar_cache::{Database, ExtraFileMeta, MetadataFile, MetadataType, SqliteRepository, SubtitleFile};
    use sidecar_storage::RecycleBin;
    use sidecar_storage::disk::{MockDisk, Operation};
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// In-memory repository that records the batches it is handed.
    struct Recording<E> {
        state: Mutex<RecordingState<E>>,
        faulty: bool,
    }
    impl<E> Default for Recording<E> {
        fn default() -> Self {
            Self { state: Mutex::default(), faulty: false }
        }
    }

    struct RecordingState<E> {
        files: Vec<E>,
        next_id: u64,
        inserts: Vec<usize>,
        updates: Vec<usize>,
    }
    impl<E> Default for RecordingState<E> {
        fn default() -> Self {
            Self { files: Vec::new(), next_id: 1, inserts: Vec::new(), updates: Vec::new() }
        }
    }

    impl<E: ExtraFile> Recording<E> {
        fn faulty() -> Self {
            Self { state: Mutex::default(), faulty: true }
        }

        fn with_files(files: impl IntoIterator<Item = E>) -> Self {
            let repo = Self::default();
            {
                let mut state = repo.state.lock().unwrap();
                for mut file in files {
                    file.id = state.next_id;
                    state.next_id += 1;
                    state.files.push(file);
                }
            }
            repo
        }

        fn inserts(&self) -> Vec<usize> {
            self.state.lock().unwrap().inserts.clone()
        }

        fn updates(&self) -> Vec<usize> {
            self.state.lock().unwrap().updates.clone()
        }

        fn stored(&self) -> Vec<E> {
            self.state.lock().unwrap().files.clone()
        }

        fn check(&self) -> CacheResult<()> {
            if self.faulty {
                exn::bail!(CacheErrorKind::Database);
            }
            Ok(())
        }

        fn filter(&self, predicate: impl Fn(&E) -> bool) -> Vec<E> {
            self.state.lock().unwrap().files.iter().filter(|f| predicate(f)).cloned().collect()
        }

        fn remove(&self, predicate: impl Fn(&E) -> bool) -> u64 {
            let mut state = self.state.lock().unwrap();
            let before = state.files.len();
            state.files.retain(|f| !predicate(f));
            (before - state.files.len()) as u64
        }
    }

    #[async_trait]
    impl<E: ExtraFile> ExtraFileRepository<E> for Recording<E> {
        async fn get_files_by_media_item(&self, media_item_id: u64) -> CacheResult<Vec<E>> {
            self.check()?;
            Ok(self.filter(|f| f.media_item_id == media_item_id))
        }

        async fn get_files_by_sub_group(&self, media_item_id: u64, sub_group: u32) -> CacheResult<Vec<E>> {
            self.check()?;
            Ok(self.filter(|f| f.media_item_id == media_item_id && f.sub_group == Some(sub_group)))
        }

        async fn get_files_by_media_file(&self, media_file_id: u64) -> CacheResult<Vec<E>> {
            self.check()?;
            Ok(self.filter(|f| f.media_file_id == Some(media_file_id)))
        }

        async fn find_by_path(&self, path: &Path) -> CacheResult<Option<E>> {
            self.check()?;
            Ok(self.filter(|f| f.relative_path == path).into_iter().next())
        }

        async fn insert_many(&self, files: &mut [E]) -> CacheResult<()> {
            self.check()?;
            let mut state = self.state.lock().unwrap();
            state.inserts.push(files.len());
            for file in files.iter_mut() {
                file.id = state.next_id;
                state.next_id += 1;
                state.files.push(file.clone());
            }
            Ok(())
        }

        async fn update_many(&self, files: &[E]) -> CacheResult<()> {
            self.check()?;
            let mut state = self.state.lock().unwrap();
            state.updates.push(files.len());
            for file in files {
                if let Some(stored) = state.files.iter_mut().find(|f| f.id == file.id) {
                    *stored = file.clone();
                }
            }
            Ok(())
        }

        async fn delete(&self, id: u64) -> CacheResult<()> {
            self.check()?;
            self.remove(|f| f.id == id);
            Ok(())
        }

        async fn delete_many(&self, ids: &[u64]) -> CacheResult<()> {
            self.check()?;
            self.remove(|f| ids.contains(&f.id));
            Ok(())
        }

        async fn delete_for_media_item(&self, media_item_id: u64) -> CacheResult<u64> {
            self.check()?;
            Ok(self.remove(|f| f.media_item_id == media_item_id))
        }

        async fn delete_for_media_file(&self, media_file_id: u64) -> CacheResult<u64> {
            self.check()?;
            Ok(self.remove(|f| f.media_file_id == Some(media_file_id)))
        }
    }

    fn subtitle(media_item_id: u64, media_file_id: u64, path: &str) -> SubtitleFile {
        SubtitleFile::new(ExtraFileMeta::new(media_item_id, path).with_media_file(media_file_id), Some("en".into()))
    }

    fn nfo(media_item_id: u64, media_file_id: u64, path: &str) -> MetadataFile {
        let meta = ExtraFileMeta::new(media_item_id, path).with_media_file(media_file_id);
        MetadataFile::new(meta, "Kodi", MetadataType::MediaFileMetadata)
    }

    fn media_items() -> Arc<StaticMediaItems> {
        Arc::new(StaticMediaItems::new().with_item(1, "/tv/Show").with_item(2, "/tv/Other"))
    }

    fn service<E: ExtraFile, R: ExtraFileRepository<E>>(repository: R, disk: &Arc<MockDisk>) -> ExtraFileService<E, R> {
        let recycle_bin = RecycleBin::new(disk.clone(), Some(PathBuf::from("/recycle"))).unwrap();
        ExtraFileService::new(repository, disk.clone(), Arc::new(recycle_bin), media_items())
    }

    fn deleted(media_file_id: u64, reason: DeleteReason) -> MediaFileDeleted {
        MediaFileDeleted { media_file_id, media_item_id: 1, reason }
    }

    #[tokio::test]
    async fn test_new_record_is_stamped_and_inserted() {
        let service = service(Recording::<SubtitleFile>::default(), &Arc::new(MockDisk::default()));
        let mut file = subtitle(1, 10, "Show.en.srt");
        service.upsert(&mut file).await.unwrap();
        assert!(file.is_persisted());
        assert_eq!(file.added, file.last_updated);
        assert_ne!(file.added, UtcDateTime::UNIX_EPOCH);
        assert_eq!(service.repository.inserts(), vec![1]);
        assert!(service.repository.updates().is_empty());
    }

    #[tokio::test]
    async fn test_existing_record_keeps_added() {
        let added = UtcDateTime::UNIX_EPOCH;
        let repo = Recording::with_files([subtitle(1, 10, "Show.en.srt")]);
        let service = service(repo, &Arc::new(MockDisk::default()));
        let mut file = service.get_files_by_media_item(1).await.unwrap().remove(0);
        assert_eq!(file.added, added);
        service.upsert(&mut file).await.unwrap();
        assert_eq!(file.added, added);
        assert!(file.last_updated > added);
        assert!(service.repository.inserts().is_empty());
        assert_eq!(service.repository.updates(), vec![1]);
        assert_eq!(service.repository.stored()[0].last_updated, file.last_updated);
    }

    #[rstest]
    #[case(3, 2)]
    #[case(0, 4)]
    #[case(5, 0)]
    #[tokio::test]
    async fn test_mixed_batch_is_partitioned(#[case] new: usize, #[case] existing: usize) {
        let stored = (0..existing).map(|n| subtitle(1, 10, &format!("old{n}.srt")));
        let service = service(Recording::with_files(stored), &Arc::new(MockDisk::default()));
        let mut batch = service.get_files_by_media_item(1).await.unwrap();
        // Interleave new records between the existing ones.
        for n in 0..new {
            let at = (n * 2).min(batch.len());
            batch.insert(at, subtitle(1, 10, &format!("new{n}.srt")));
        }
        service.upsert_many(&mut batch).await.unwrap();
        let expected = |count: usize| if count == 0 { vec![] } else { vec![count] };
        assert_eq!(service.repository.inserts(), expected(new));
        assert_eq!(service.repository.updates(), expected(existing));
        assert!(batch.iter().all(|f| f.is_persisted()));
        assert!(batch.iter().all(|f| f.last_updated == batch[0].last_updated));
    }

    #[tokio::test]
    async fn test_empty_batch_touches_nothing() {
        let service = service(Recording::<SubtitleFile>::default(), &Arc::new(MockDisk::default()));
        service.upsert_many(&mut []).await.unwrap();
        assert!(service.repository.inserts().is_empty());
        assert!(service.repository.updates().is_empty());
    }

    #[tokio::test]
    async fn test_repeated_upsert_keeps_ids() {
        let service = service(Recording::<SubtitleFile>::default(), &Arc::new(MockDisk::default()));
        let mut files = vec![subtitle(1, 10, "a.srt"), subtitle(1, 10, "b.srt")];
        service.upsert_many(&mut files).await.unwrap();
        let ids: Vec<_> = files.iter().map(|f| f.id).collect();
        let added: Vec<_> = files.iter().map(|f| f.added).collect();
        service.upsert_many(&mut files).await.unwrap();
        assert_eq!(files.iter().map(|f| f.id).collect::<Vec<_>>(), ids);
        assert_eq!(files.iter().map(|f| f.added).collect::<Vec<_>>(), added);
        assert_eq!(service.repository.stored().len(), 2);
    }

    #[tokio::test]
    async fn test_repository_fault_propagates() {
        let service = service(Recording::<SubtitleFile>::faulty(), &Arc::new(MockDisk::default()));
        let err = service.upsert(&mut subtitle(1, 10, "a.srt")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Storage));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_reads_and_deletes_pass_through() {
        let repo = Recording::with_files([
            subtitle(1, 10, "a.srt").with_tags(["forced"]),
            subtitle(1, 11, "b.srt"),
            subtitle(2, 12, "c.srt"),
        ]);
        let disk = Arc::new(MockDisk::with_files(["/tv/Show/a.srt"]));
        let service = service(repo, &disk);
        assert_eq!(service.get_files_by_media_file(11).await.unwrap().len(), 1);
        let found = service.find_by_path("a.srt").await.unwrap().unwrap();
        assert_eq!(found.tags, vec!["forced".to_string()]);
        service.delete(found.id).await.unwrap();
        assert!(service.find_by_path("a.srt").await.unwrap().is_none());
        let rest: Vec<_> = service.repository.stored().iter().map(|f| f.id).collect();
        service.delete_many(&rest).await.unwrap();
        assert!(service.repository.stored().is_empty());
        // Record-only corrections never touch the disk.
        assert!(disk.operations().await.is_empty());
    }

    #[rstest]
    #[case(true)]
    #[case(false)]
    #[tokio::test]
    async fn test_media_item_deleted_only_cleans_index(#[case] delete_files: bool) {
        let repo = Recording::with_files([subtitle(1, 10, "a.srt"), subtitle(1, 11, "b.srt"), subtitle(2, 12, "c.srt")]);
        let disk = Arc::new(MockDisk::with_files(["/tv/Show/a.srt", "/tv/Show/b.srt"]));
        let service = service(repo, &disk);
        service.handle(&MediaItemDeleted { media_item_id: 1, delete_files }).await.unwrap();
        let stored = service.repository.stored();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].media_item_id, 2);
        assert!(disk.operations().await.is_empty());
    }

    #[tokio::test]
    async fn test_bookkeeping_only_never_touches_disk() {
        let repo = Recording::with_files([subtitle(1, 10, "a.srt"), subtitle(1, 10, "b.srt")]);
        let disk = Arc::new(MockDisk::with_files(["/tv/Show/a.srt", "/tv/Show/b.srt"]));
        let service = service(repo, &disk);
        service.handle(&deleted(10, DeleteReason::NoLinkedEpisodes)).await.unwrap();
        assert!(service.repository.stored().is_empty());
        assert!(disk.operations().await.is_empty());
        assert_eq!(disk.files().await.len(), 2);
    }

    #[rstest]
    #[case(DeleteReason::Manual)]
    #[case(DeleteReason::Upgrade)]
    #[case(DeleteReason::MissingFromDisk)]
    #[tokio::test]
    async fn test_genuine_delete_recycles(#[case] reason: DeleteReason) {
        let repo = Recording::with_files([
            subtitle(1, 10, "Season 01/a.en.srt"),
            subtitle(1, 10, "Season 01/gone.srt"),
            subtitle(1, 11, "Season 01/b.en.srt"),
        ]);
        let disk = Arc::new(MockDisk::with_files(["/tv/Show/Season 01/a.en.srt", "/tv/Show/Season 01/b.en.srt"]));
        let service = service(repo, &disk);
        assert!(!service.permanently_delete());
        service.handle(&deleted(10, reason)).await.unwrap();
        assert_eq!(
            disk.files().await,
            vec![PathBuf::from("/recycle/Season 01/a.en.srt"), PathBuf::from("/tv/Show/Season 01/b.en.srt")]
        );
        // The absent file was checked, but nothing was done with it.
        let operations = disk.operations().await;
        assert!(operations.contains(&Operation::Exists(PathBuf::from("/tv/Show/Season 01/gone.srt"))));
        assert!(!operations.contains(&Operation::Delete(PathBuf::from("/tv/Show/Season 01/gone.srt"))));
        let stored = service.repository.stored();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].media_file_id, Some(11));
    }

    #[tokio::test]
    async fn test_genuine_delete_of_metadata_is_permanent() {
        let repo = Recording::with_files([nfo(1, 10, "Season 01/a.nfo")]);
        let disk = Arc::new(MockDisk::with_files(["/tv/Show/Season 01/a.nfo"]));
        let service = service(repo, &disk);
        assert!(service.permanently_delete());
        service.handle(&deleted(10, DeleteReason::Manual)).await.unwrap();
        assert!(disk.files().await.is_empty());
        assert!(disk.operations().await.contains(&Operation::Delete(PathBuf::from("/tv/Show/Season 01/a.nfo"))));
        assert!(service.repository.stored().is_empty());
    }

    #[tokio::test]
    async fn test_policy_override() {
        let repo = Recording::with_files([subtitle(1, 10, "a.srt")]);
        let disk = Arc::new(MockDisk::with_files(["/tv/Show/a.srt"]));
        let service = service(repo, &disk).with_permanently_delete(true);
        service.handle(&deleted(10, DeleteReason::Manual)).await.unwrap();
        assert!(disk.files().await.is_empty());
        assert!(!disk.operations().await.iter().any(|op| matches!(op, Operation::Rename(..))));
    }

    #[tokio::test]
    async fn test_disk_fault_aborts_cascade() {
        let repo = Recording::with_files([subtitle(1, 10, "a.srt"), subtitle(1, 10, "b.srt")]);
        let disk = Arc::new(MockDisk::with_files(["/tv/Show/a.srt", "/tv/Show/b.srt"]).with_fault("/tv/Show/a.srt"));
        let service = service(repo, &disk);
        let err = service.handle(&deleted(10, DeleteReason::Manual)).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Disk));
        // Remaining records are not processed, and the index is left alone.
        assert!(!disk.operations().await.contains(&Operation::Exists(PathBuf::from("/tv/Show/b.srt"))));
        assert_eq!(service.repository.stored().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_owner_aborts_cascade() {
        let repo = Recording::with_files([subtitle(3, 10, "a.srt")]);
        let disk = Arc::new(MockDisk::default());
        let service = service(repo, &disk);
        let event = MediaFileDeleted { media_file_id: 10, media_item_id: 3, reason: DeleteReason::Manual };
        let err = service.handle(&event).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::MediaItemNotFound(3)));
        assert_eq!(service.repository.stored().len(), 1);
        assert!(disk.operations().await.is_empty());
    }

    #[tokio::test]
    async fn test_escaping_path_is_refused() {
        let repo = Recording::with_files([subtitle(1, 10, "../Other/a.srt")]);
        let disk = Arc::new(MockDisk::with_files(["/tv/Other/a.srt"]));
        let service = service(repo, &disk);
        let err = service.handle(&deleted(10, DeleteReason::Manual)).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPath(_)));
        assert!(disk.operations().await.is_empty());
    }

    #[tokio::test]
    async fn test_rediscovery_is_deduplicated_by_sqlite() {
        let db = Database::connect_in_memory().await.unwrap();
        let disk = Arc::new(MockDisk::default());
        let service = service(SqliteRepository::<SubtitleFile>::from(&db), &disk);
        let mut first = subtitle(1, 10, "Show.en.srt");
        let mut second = subtitle(1, 10, "Show.en.srt");
        service.upsert(&mut first).await.unwrap();
        service.upsert(&mut second).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(service.get_files_by_media_item(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_on_sqlite_keeps_timestamps_consistent() {
        let db = Database::connect_in_memory().await.unwrap();
        let service = service(SqliteRepository::<SubtitleFile>::from(&db), &Arc::new(MockDisk::default()));
        let mut file = subtitle(7, 10, "a.srt");
        service.upsert(&mut file).await.unwrap();
        assert!(file.is_persisted());
        assert_eq!(file.added, file.last_updated);

        // The second upsert is routed to an update: same record, same `added`.
        let (id, added) = (file.id, file.added);
        file.language = Some("de".into());
        service.upsert(&mut file).await.unwrap();
        assert_eq!((file.id, file.added), (id, added));
        assert!(file.last_updated >= added);
        let stored = service.get_files_by_media_item(7).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].added, added);
        assert_eq!(stored[0].language.as_deref(), Some("de"));
    }

    #[tokio::test]
    async fn test_cascade_through_bus() {
        let disk = Arc::new(MockDisk::with_files(["/tv/Show/a.srt", "/tv/Show/a.nfo"]));
        let subtitles = Arc::new(service(Recording::with_files([subtitle(1, 10, "a.srt")]), &disk));
        let metadata = Arc::new(service(Recording::with_files([nfo(1, 10, "a.nfo")]), &disk));
        let mut bus = EventBus::new();
        bus.subscribe::<MediaFileDeleted, _>(subtitles.clone());
        bus.subscribe::<MediaFileDeleted, _>(metadata.clone());
        bus.subscribe::<MediaItemDeleted, _>(subtitles.clone());
        bus.subscribe::<MediaItemDeleted, _>(metadata.clone());
        bus.publish(&deleted(10, DeleteReason::Upgrade)).await.unwrap();
        assert_eq!(disk.files().await, vec![PathBuf::from("/recycle/Show/a.srt")]);
        assert!(subtitles.repository.stored().is_empty());
        assert!(metadata.repository.stored().is_empty());
    }
}
