use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::task::TaskTracker;
use tracing::{debug, info, instrument, warn};

use dropshare_blob::{BlobError, BlobStore};
use dropshare_core::{
    Clock, CodeGenerator, FileDescriptor, Session, SessionKey, ShareCode, ShareKind, SharePayload,
};
use dropshare_state::SessionStore;

use crate::download::{BlobCleanup, FileDownload, FileUpload, delete_blob};
use crate::error::ShareError;
use crate::metrics::ShareMetrics;

/// Name used for uploads that arrive without a usable file name.
const FALLBACK_FILE_NAME: &str = "download";

/// Creates one-time shares and redeems them.
///
/// Construct with [`ShareServiceBuilder`](crate::ShareServiceBuilder). Every
/// retrieval consumes its session atomically, so a code can be redeemed at
/// most once even under concurrent requests.
pub struct ShareService {
    pub(crate) store: Arc<dyn SessionStore>,
    pub(crate) blobs: Arc<dyn BlobStore>,
    pub(crate) codes: Arc<dyn CodeGenerator>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) metrics: Arc<ShareMetrics>,
    pub(crate) ttl: Duration,
    pub(crate) session_ttl: chrono::Duration,
    pub(crate) max_code_attempts: u32,
    pub(crate) blob_grace: Duration,
    pub(crate) cleanup_tracker: TaskTracker,
}

impl ShareService {
    /// Store `text` and return its code.
    #[instrument(name = "share.share_text", skip_all)]
    pub async fn share_text(&self, text: Option<&str>) -> Result<ShareCode, ShareError> {
        let text = require(text, "Text required")?;
        self.share(SharePayload::Text(text.to_owned())).await
    }

    /// Store `url` and return its code. The URL is not validated.
    #[instrument(name = "share.share_link", skip_all)]
    pub async fn share_link(&self, url: Option<&str>) -> Result<ShareCode, ShareError> {
        let url = require(url, "URL required")?;
        self.share(SharePayload::Link(url.to_owned())).await
    }

    /// Write an uploaded file to the blob store and return its code.
    ///
    /// If no session can be created for the blob, the blob is deleted before
    /// the error is returned.
    #[instrument(name = "share.share_file", skip_all)]
    pub async fn share_file(&self, upload: Option<FileUpload>) -> Result<ShareCode, ShareError> {
        let upload = upload.ok_or_else(|| ShareError::Validation("No file uploaded".into()))?;
        let original_name = display_name(&upload.original_name);

        let stored = self
            .blobs
            .put(upload.reader, &original_name, upload.content_type.as_deref())
            .await?;
        let storage_path = stored.storage_path.clone();

        let payload = SharePayload::File(FileDescriptor {
            storage_path: stored.storage_path,
            original_name,
            size_bytes: stored.size_bytes,
            mime_type: stored.mime_type,
        });

        match self.share(payload).await {
            Ok(code) => Ok(code),
            Err(e) => {
                delete_blob(self.blobs.as_ref(), &storage_path).await;
                Err(e)
            }
        }
    }

    /// Redeem a text share.
    #[instrument(name = "share.retrieve_text", skip(self))]
    pub async fn retrieve_text(&self, code: &str) -> Result<String, ShareError> {
        match self.take(ShareKind::Text, code).await?.payload {
            SharePayload::Text(text) => Ok(text),
            other => Err(self.kind_mismatch(ShareKind::Text, &other)),
        }
    }

    /// Redeem a link share.
    #[instrument(name = "share.retrieve_link", skip(self))]
    pub async fn retrieve_link(&self, code: &str) -> Result<String, ShareError> {
        match self.take(ShareKind::Link, code).await?.payload {
            SharePayload::Link(url) => Ok(url),
            other => Err(self.kind_mismatch(ShareKind::Link, &other)),
        }
    }

    /// Redeem a file share.
    ///
    /// The session is consumed before the blob is opened. If the blob has
    /// vanished the caller sees [`ShareError::NotFound`]. The returned
    /// [`FileDownload`] deletes the blob once it has been read or dropped.
    #[instrument(name = "share.retrieve_file", skip(self))]
    pub async fn retrieve_file(&self, code: &str) -> Result<FileDownload, ShareError> {
        let file = match self.take(ShareKind::File, code).await?.payload {
            SharePayload::File(file) => file,
            other => return Err(self.kind_mismatch(ShareKind::File, &other)),
        };

        let reader = match self.blobs.open(&file.storage_path).await {
            Ok(reader) => reader,
            Err(BlobError::NotFound(_)) => {
                self.metrics.increment_stale_blobs();
                warn!(
                    code,
                    storage_path = %file.storage_path,
                    "file session referenced a missing blob"
                );
                return Err(ShareError::NotFound);
            }
            Err(e) => {
                // The session is gone, so nothing else would ever reclaim it.
                delete_blob(self.blobs.as_ref(), &file.storage_path).await;
                return Err(e.into());
            }
        };

        let cleanup = BlobCleanup::new(
            Arc::clone(&self.blobs),
            file.storage_path,
            self.cleanup_tracker.clone(),
        );
        Ok(FileDownload::new(
            file.original_name,
            file.mime_type,
            file.size_bytes,
            reader,
            cleanup,
        ))
    }

    /// Physically remove expired sessions and delete the blobs of expired
    /// file shares. Returns the number of sessions removed.
    #[instrument(name = "share.purge_expired", skip(self))]
    pub async fn purge_expired(&self) -> Result<usize, ShareError> {
        let purged = self.store.purge_expired(self.clock.now()).await?;

        for session in &purged {
            if let Some(file) = session.payload.file() {
                delete_blob(self.blobs.as_ref(), &file.storage_path).await;
            }
        }

        let count = purged.len();
        if count > 0 {
            self.metrics.add_sessions_purged(count as u64);
            info!(count, "purged expired sessions");
        }
        Ok(count)
    }

    /// Delete blobs older than the TTL plus the grace period.
    ///
    /// No live session can reference such a blob, so anything found is an
    /// orphan left behind by a crash or an interrupted clean-up.
    #[instrument(name = "share.reap_stale_blobs", skip(self))]
    pub async fn reap_stale_blobs(&self) -> Result<u64, ShareError> {
        let removed = self
            .blobs
            .reap_older_than(self.ttl.saturating_add(self.blob_grace))
            .await?;
        if removed > 0 {
            self.metrics.add_blobs_reaped(removed);
            info!(removed, "reaped orphaned blobs");
        }
        Ok(removed)
    }

    /// Number of live sessions.
    pub async fn live_sessions(&self) -> Result<usize, ShareError> {
        Ok(self.store.len().await?)
    }

    pub fn metrics(&self) -> &Arc<ShareMetrics> {
        &self.metrics
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn max_code_attempts(&self) -> u32 {
        self.max_code_attempts
    }

    /// Wait for pending blob clean-ups to finish.
    pub async fn shutdown(&self) {
        self.cleanup_tracker.close();
        self.cleanup_tracker.wait().await;
        info!("share service shutdown complete");
    }

    /// Create a session for `payload` under a fresh code, redrawing on
    /// collision.
    async fn share(&self, payload: SharePayload) -> Result<ShareCode, ShareError> {
        let kind = payload.kind();
        let mut session = Session::new(
            self.codes.generate(),
            payload,
            self.session_ttl,
            self.clock.now(),
        );

        for attempt in 1..=self.max_code_attempts {
            if attempt > 1 {
                session.code = self.codes.generate();
            }
            if self.store.create(&session).await? {
                self.metrics.increment_shared(kind);
                info!(code = %session.code, kind = %kind, "share created");
                return Ok(session.code);
            }
            self.metrics.increment_code_collisions();
            debug!(attempt, kind = %kind, "share code collision");
        }

        warn!(
            attempts = self.max_code_attempts,
            kind = %kind,
            "gave up drawing a free share code"
        );
        Err(ShareError::CodeSpaceExhausted {
            attempts: self.max_code_attempts,
        })
    }

    /// Atomically consume the live session at `(kind, code)`.
    async fn take(&self, kind: ShareKind, code: &str) -> Result<Session, ShareError> {
        let Some(code) = ShareCode::parse(code) else {
            self.metrics.increment_not_found();
            return Err(ShareError::NotFound);
        };

        match self.store.take(&SessionKey::new(kind, code)).await? {
            Some(session) => {
                self.metrics.increment_retrieved(kind);
                info!(code = %session.code, kind = %kind, "share redeemed");
                Ok(session)
            }
            None => {
                self.metrics.increment_not_found();
                debug!(kind = %kind, "share not found");
                Err(ShareError::NotFound)
            }
        }
    }

    fn kind_mismatch(&self, expected: ShareKind, payload: &SharePayload) -> ShareError {
        warn!(
            expected = %expected,
            found = %payload.kind(),
            "session payload does not match its key"
        );
        if let Some(file) = payload.file() {
            let blobs = Arc::clone(&self.blobs);
            let storage_path = file.storage_path.clone();
            self.cleanup_tracker
                .spawn(async move { delete_blob(blobs.as_ref(), &storage_path).await });
        }
        ShareError::NotFound
    }
}

impl fmt::Debug for ShareService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShareService")
            .field("ttl", &self.ttl)
            .field("max_code_attempts", &self.max_code_attempts)
            .field("blob_grace", &self.blob_grace)
            .finish_non_exhaustive()
    }
}

fn require<'a>(value: Option<&'a str>, message: &str) -> Result<&'a str, ShareError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ShareError::Validation(message.to_owned())),
    }
}

/// Last path segment of a client-supplied file name.
fn display_name(raw: &str) -> String {
    raw.rsplit(['/', '\\'])
        .next()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(FALLBACK_FILE_NAME)
        .to_owned()
}

#[cfg(test)]
mod tests {
    use std::pin::Pin;
    use std::sync::Mutex;
    use std::task::{Context, Poll};

    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;
    use dropshare_blob::{BlobReader, LocalBlobStore, StoredBlob};
    use dropshare_core::ManualClock;
    use dropshare_state_memory::MemorySessionStore;
    use futures::StreamExt;
    use tempfile::TempDir;
    use tokio::io::{AsyncRead, ReadBuf};

    use super::*;
    use crate::builder::ShareServiceBuilder;

    struct Harness {
        service: Arc<ShareService>,
        store: Arc<MemorySessionStore>,
        clock: Arc<ManualClock>,
        dir: TempDir,
    }

    impl Harness {
        fn blob_count(&self) -> usize {
            std::fs::read_dir(self.dir.path())
                .map(|entries| entries.count())
                .unwrap_or(0)
        }
    }

    fn harness_with(configure: impl FnOnce(ShareServiceBuilder) -> ShareServiceBuilder) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::default());
        let store = Arc::new(MemorySessionStore::with_clock(clock.clone()));
        let blobs = Arc::new(LocalBlobStore::new(dir.path()).with_clock(clock.clone()));
        let builder = ShareServiceBuilder::new()
            .store(store.clone())
            .blobs(blobs)
            .clock(clock.clone());
        let service = Arc::new(configure(builder).build().unwrap());
        Harness {
            service,
            store,
            clock,
            dir,
        }
    }

    fn harness() -> Harness {
        harness_with(|b| b)
    }

    fn upload(bytes: &'static [u8], name: &str) -> Option<FileUpload> {
        Some(FileUpload::new(Box::new(bytes), name))
    }

    /// Hands out a fixed sequence of codes, repeating the last one.
    struct ScriptedCodes {
        codes: Mutex<Vec<&'static str>>,
    }

    impl ScriptedCodes {
        fn new(mut codes: Vec<&'static str>) -> Self {
            codes.reverse();
            Self {
                codes: Mutex::new(codes),
            }
        }
    }

    impl CodeGenerator for ScriptedCodes {
        fn generate(&self) -> ShareCode {
            let mut codes = self.codes.lock().unwrap();
            let next = if codes.len() > 1 {
                codes.pop().unwrap()
            } else {
                codes[0]
            };
            ShareCode::new(next)
        }
    }

    #[tokio::test]
    async fn text_round_trip_is_one_time() {
        let h = harness();
        let code = h.service.share_text(Some("hello world")).await.unwrap();
        assert_eq!(code.len(), 6);

        let text = h.service.retrieve_text(&code).await.unwrap();
        assert_eq!(text, "hello world");

        let again = h.service.retrieve_text(&code).await;
        assert!(matches!(again, Err(ShareError::NotFound)));
    }

    #[tokio::test]
    async fn link_round_trip_is_one_time() {
        let h = harness();
        let code = h.service.share_link(Some("not even a url")).await.unwrap();
        assert_eq!(h.service.retrieve_link(&code).await.unwrap(), "not even a url");
        assert!(matches!(
            h.service.retrieve_link(&code).await,
            Err(ShareError::NotFound)
        ));
    }

    #[tokio::test]
    async fn missing_input_is_a_validation_error() {
        let h = harness();
        for result in [
            h.service.share_text(None).await,
            h.service.share_text(Some("")).await,
            h.service.share_link(None).await,
            h.service.share_link(Some("")).await,
            h.service.share_file(None).await,
        ] {
            assert!(matches!(result, Err(ShareError::Validation(_))));
        }
        assert_eq!(h.store.raw_len(), 0, "no session should be created");
    }

    #[tokio::test]
    async fn validation_messages() {
        let h = harness();
        let text = h.service.share_text(None).await.unwrap_err();
        let link = h.service.share_link(None).await.unwrap_err();
        let file = h.service.share_file(None).await.unwrap_err();
        assert_eq!(text.to_string(), "Text required");
        assert_eq!(link.to_string(), "URL required");
        assert_eq!(file.to_string(), "No file uploaded");
    }

    #[tokio::test]
    async fn kinds_are_isolated() {
        let h = harness();
        let code = h.service.share_text(Some("secret")).await.unwrap();

        assert!(matches!(
            h.service.retrieve_link(&code).await,
            Err(ShareError::NotFound)
        ));
        assert!(matches!(
            h.service.retrieve_file(&code).await,
            Err(ShareError::NotFound)
        ));
        assert_eq!(h.service.retrieve_text(&code).await.unwrap(), "secret");
    }

    #[tokio::test]
    async fn malformed_codes_are_not_found() {
        let h = harness();
        for code in ["", "../../etc/passwd", "a:b", "   "] {
            assert!(matches!(
                h.service.retrieve_text(code).await,
                Err(ShareError::NotFound)
            ));
        }
        assert_eq!(h.service.metrics().snapshot().not_found, 4);
    }

    #[tokio::test]
    async fn codes_must_match_exactly() {
        let h = harness_with(|b| b.code_generator(Arc::new(ScriptedCodes::new(vec!["ab12cd"]))));
        h.service.share_text(Some("exact")).await.unwrap();

        for near in [" ab12cd", "ab12cd ", "AB12CD"] {
            assert!(matches!(
                h.service.retrieve_text(near).await,
                Err(ShareError::NotFound)
            ));
        }
        assert_eq!(h.service.retrieve_text("ab12cd").await.unwrap(), "exact");
    }

    #[tokio::test]
    async fn expired_sessions_are_unreachable_and_purged() {
        let h = harness();
        let text_code = h.service.share_text(Some("short-lived")).await.unwrap();
        let file_code = h
            .service
            .share_file(upload(b"bytes", "a.txt"))
            .await
            .unwrap();
        assert_eq!(h.blob_count(), 1);

        h.clock.advance(ChronoDuration::seconds(300));
        assert!(matches!(
            h.service.retrieve_text(&text_code).await,
            Err(ShareError::NotFound)
        ));
        assert_eq!(h.service.live_sessions().await.unwrap(), 0);

        let purged = h.service.purge_expired().await.unwrap();
        assert_eq!(purged, 2);
        assert_eq!(h.store.raw_len(), 0);
        assert_eq!(h.blob_count(), 0, "expired file blob should be deleted");
        assert!(matches!(
            h.service.retrieve_file(&file_code).await,
            Err(ShareError::NotFound)
        ));
        assert_eq!(h.service.metrics().snapshot().sessions_purged, 2);
    }

    #[tokio::test]
    async fn file_round_trip_deletes_blob() {
        let h = harness();
        let code = h
            .service
            .share_file(upload(b"hello", "a.txt"))
            .await
            .unwrap();
        assert_eq!(h.blob_count(), 1);

        let download = h.service.retrieve_file(&code).await.unwrap();
        assert_eq!(download.original_name, "a.txt");
        assert_eq!(download.mime_type, "text/plain");
        assert_eq!(download.size_bytes, 5);
        assert_eq!(download.read_to_end().await.unwrap(), b"hello");
        assert_eq!(h.blob_count(), 0);

        assert!(matches!(
            h.service.retrieve_file(&code).await,
            Err(ShareError::NotFound)
        ));
        assert_eq!(h.blob_count(), 0, "no orphan file should remain");
    }

    #[tokio::test]
    async fn streamed_download_deletes_blob_when_finished() {
        let h = harness();
        let code = h
            .service
            .share_file(upload(b"streamed bytes", "notes.md"))
            .await
            .unwrap();

        let mut stream = h.service.retrieve_file(&code).await.unwrap().into_stream();
        let mut body = Vec::new();
        while let Some(chunk) = stream.next().await {
            body.extend_from_slice(&chunk.unwrap());
        }
        assert_eq!(body, b"streamed bytes");

        h.service.shutdown().await;
        assert_eq!(h.blob_count(), 0);
    }

    #[tokio::test]
    async fn dropped_download_still_deletes_blob() {
        let h = harness();
        let code = h
            .service
            .share_file(upload(b"never read", "x.bin"))
            .await
            .unwrap();

        let download = h.service.retrieve_file(&code).await.unwrap();
        drop(download);

        h.service.shutdown().await;
        assert_eq!(h.blob_count(), 0);
        assert!(matches!(
            h.service.retrieve_file(&code).await,
            Err(ShareError::NotFound)
        ));
    }

    #[tokio::test]
    async fn missing_blob_is_not_found_and_consumes_session() {
        let h = harness();
        let code = h
            .service
            .share_file(upload(b"gone", "gone.txt"))
            .await
            .unwrap();
        for entry in std::fs::read_dir(h.dir.path()).unwrap() {
            std::fs::remove_file(entry.unwrap().path()).unwrap();
        }

        assert!(matches!(
            h.service.retrieve_file(&code).await,
            Err(ShareError::NotFound)
        ));
        assert_eq!(h.store.raw_len(), 0, "stale session should be removed");
        assert_eq!(h.service.metrics().snapshot().stale_blobs, 1);
    }

    #[tokio::test]
    async fn file_name_keeps_last_segment() {
        let h = harness();
        let code = h
            .service
            .share_file(upload(b"x", "C:\\Users\\me\\report.pdf"))
            .await
            .unwrap();
        let download = h.service.retrieve_file(&code).await.unwrap();
        assert_eq!(download.original_name, "report.pdf");
        assert_eq!(download.mime_type, "application/pdf");
    }

    #[tokio::test]
    async fn oversized_file_is_rejected_without_session() {
        let dir = tempfile::tempdir().unwrap();
        let service = ShareServiceBuilder::new()
            .store(Arc::new(MemorySessionStore::new()))
            .blobs(Arc::new(LocalBlobStore::new(dir.path()).with_max_bytes(3)))
            .build()
            .unwrap();

        let err = service
            .share_file(upload(b"too big", "big.bin"))
            .await
            .unwrap_err();
        assert!(matches!(err, ShareError::Blob(BlobError::TooLarge { limit: 3 })));
        assert_eq!(service.live_sessions().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn collisions_draw_a_new_code() {
        let h = harness_with(|b| {
            b.code_generator(Arc::new(ScriptedCodes::new(vec![
                "aaaaaa", "aaaaaa", "bbbbbb",
            ])))
        });

        let first = h.service.share_text(Some("one")).await.unwrap();
        let second = h.service.share_text(Some("two")).await.unwrap();
        assert_eq!(first.as_str(), "aaaaaa");
        assert_eq!(second.as_str(), "bbbbbb");
        assert_eq!(h.service.metrics().snapshot().code_collisions, 1);

        assert_eq!(h.service.retrieve_text("aaaaaa").await.unwrap(), "one");
        assert_eq!(h.service.retrieve_text("bbbbbb").await.unwrap(), "two");
    }

    #[tokio::test]
    async fn same_code_may_be_live_under_two_kinds() {
        let h = harness_with(|b| b.code_generator(Arc::new(ScriptedCodes::new(vec!["cccccc"]))));
        let text = h.service.share_text(Some("t")).await.unwrap();
        let link = h.service.share_link(Some("l")).await.unwrap();
        assert_eq!(text, link);
        assert_eq!(h.service.retrieve_link("cccccc").await.unwrap(), "l");
        assert_eq!(h.service.retrieve_text("cccccc").await.unwrap(), "t");
    }

    #[tokio::test]
    async fn exhausted_code_space_discards_the_blob() {
        let h = harness_with(|b| {
            b.code_generator(Arc::new(ScriptedCodes::new(vec!["dddddd"])))
                .max_code_attempts(3)
        });
        h.service.share_file(upload(b"first", "a.txt")).await.unwrap();
        assert_eq!(h.blob_count(), 1);

        let err = h
            .service
            .share_file(upload(b"second", "b.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, ShareError::CodeSpaceExhausted { attempts: 3 }));
        assert_eq!(h.blob_count(), 1, "the unshared blob should be deleted");
        assert_eq!(h.service.metrics().snapshot().code_collisions, 3);
    }

    #[tokio::test]
    async fn expired_code_can_be_reissued() {
        let h = harness_with(|b| b.code_generator(Arc::new(ScriptedCodes::new(vec!["eeeeee"]))));
        h.service.share_text(Some("old")).await.unwrap();
        h.clock.advance(ChronoDuration::seconds(301));

        let code = h.service.share_text(Some("new")).await.unwrap();
        assert_eq!(code.as_str(), "eeeeee");
        assert_eq!(h.service.retrieve_text("eeeeee").await.unwrap(), "new");
    }

    #[tokio::test]
    async fn expired_file_code_is_not_reissued_over_its_blob() {
        let h = harness_with(|b| {
            b.code_generator(Arc::new(ScriptedCodes::new(vec!["ffffff", "ffffff", "gggggg"])))
        });
        h.service
            .share_file(upload(b"first", "a.txt"))
            .await
            .unwrap();
        h.clock.advance(ChronoDuration::seconds(301));

        let code = h
            .service
            .share_file(upload(b"second", "b.txt"))
            .await
            .unwrap();
        assert_eq!(code.as_str(), "gggggg");
        assert_eq!(h.blob_count(), 2);

        assert_eq!(h.service.purge_expired().await.unwrap(), 1);
        assert_eq!(h.blob_count(), 1, "the expired share's blob goes with it");
        let download = h.service.retrieve_file("gggggg").await.unwrap();
        assert_eq!(download.read_to_end().await.unwrap(), b"second");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_retrievals_have_one_winner() {
        let h = harness();
        let code = h.service.share_text(Some("contended")).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let service = Arc::clone(&h.service);
            let code = code.clone();
            handles.push(tokio::spawn(
                async move { service.retrieve_text(&code).await },
            ));
        }

        let mut successes = 0;
        let mut not_found = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(text) => {
                    assert_eq!(text, "contended");
                    successes += 1;
                }
                Err(ShareError::NotFound) => not_found += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!(successes, 1);
        assert_eq!(not_found, 15);
    }

    #[tokio::test]
    async fn reaps_orphaned_blobs_past_ttl_and_grace() {
        let h = harness_with(|b| b.blob_grace(std::time::Duration::from_secs(60)));
        // A blob with no session, as left by a crash between write and create.
        h.service
            .blobs
            .put(Box::new(&b"orphan"[..]), "o.txt", None)
            .await
            .unwrap();

        h.clock.advance(ChronoDuration::seconds(300));
        assert_eq!(h.service.reap_stale_blobs().await.unwrap(), 0);

        h.clock.advance(ChronoDuration::seconds(61));
        assert_eq!(h.service.reap_stale_blobs().await.unwrap(), 1);
        assert_eq!(h.blob_count(), 0);
        assert_eq!(h.service.metrics().snapshot().blobs_reaped, 1);
    }

    /// Upload body that takes `stall` of clock time before yielding its bytes.
    struct SlowUpload {
        clock: Arc<ManualClock>,
        stall: ChronoDuration,
        bytes: Option<&'static [u8]>,
    }

    impl AsyncRead for SlowUpload {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<std::io::Result<()>> {
            if let Some(bytes) = self.bytes.take() {
                self.clock.advance(self.stall);
                buf.put_slice(bytes);
            }
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn slow_upload_survives_reaping_while_live() {
        let h = harness_with(|b| b.blob_grace(std::time::Duration::from_secs(60)));
        let body = SlowUpload {
            clock: h.clock.clone(),
            stall: ChronoDuration::seconds(120),
            bytes: Some(b"took a while"),
        };
        let code = h
            .service
            .share_file(Some(FileUpload::new(Box::new(body), "slow.txt")))
            .await
            .unwrap();

        // The session is 280 s old; the upload began 400 s ago.
        h.clock.advance(ChronoDuration::seconds(280));
        assert_eq!(h.service.reap_stale_blobs().await.unwrap(), 0);
        assert_eq!(h.blob_count(), 1);

        let download = h.service.retrieve_file(&code).await.unwrap();
        assert_eq!(download.read_to_end().await.unwrap(), b"took a while");
    }

    /// Blob store whose writes always succeed but whose reads fail.
    struct UnreadableBlobs;

    #[async_trait]
    impl BlobStore for UnreadableBlobs {
        async fn put(
            &self,
            _reader: BlobReader,
            _original_name: &str,
            _content_type: Option<&str>,
        ) -> Result<StoredBlob, BlobError> {
            Ok(StoredBlob {
                storage_path: "1-x".into(),
                size_bytes: 1,
                mime_type: "application/octet-stream".into(),
            })
        }

        async fn open(&self, _storage_path: &str) -> Result<BlobReader, BlobError> {
            Err(BlobError::Storage("disk on fire".into()))
        }

        async fn exists(&self, _storage_path: &str) -> Result<bool, BlobError> {
            Ok(true)
        }

        async fn delete(&self, _storage_path: &str) -> Result<bool, BlobError> {
            Ok(true)
        }

        async fn reap_older_than(&self, _max_age: Duration) -> Result<u64, BlobError> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn blob_read_failure_surfaces_as_blob_error() {
        let service = ShareServiceBuilder::new()
            .store(Arc::new(MemorySessionStore::new()))
            .blobs(Arc::new(UnreadableBlobs))
            .build()
            .unwrap();
        let code = service.share_file(upload(b"x", "x")).await.unwrap();
        let err = service.retrieve_file(&code).await.unwrap_err();
        assert!(matches!(err, ShareError::Blob(BlobError::Storage(_))));
    }

    #[test]
    fn display_name_strips_paths() {
        assert_eq!(display_name("a.txt"), "a.txt");
        assert_eq!(display_name("dir/sub/a.txt"), "a.txt");
        assert_eq!(display_name("C:\\x\\y.doc"), "y.doc");
        assert_eq!(display_name(""), FALLBACK_FILE_NAME);
        assert_eq!(display_name("trailing/"), FALLBACK_FILE_NAME);
    }
}
