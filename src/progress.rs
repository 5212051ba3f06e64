//! Progress-callback trait for per-page pipeline events.
//!
//! Inject an [`Arc<dyn ProcessProgressCallback>`] via
//! [`crate::config::ProcessConfigBuilder::progress_callback`] to receive
//! real-time events as the pipeline works through the document.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers
//! can forward events to a terminal progress bar, a log record, or a web
//! session — without the library knowing anything about how the host
//! application communicates. Pages are processed strictly in sequence, so
//! events for page N+1 never arrive before page N has completed, but the
//! trait is still `Send + Sync` so implementations can be shared freely.

use crate::fallback::Tier;
use crate::output::{PageResult, Stage};
use std::sync::Arc;

/// Called by the processing pipeline as it advances through the document.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait ProcessProgressCallback: Send + Sync {
    /// Called once after the document has been opened, before any page work.
    fn on_document_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called when a page's pipeline begins.
    ///
    /// # Arguments
    /// * `page_num`    — 1-indexed page number
    /// * `total_pages` — total pages in the document
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called just before each stage of a page runs (render, OCR, translate).
    /// Translation is announced only when it will actually be attempted.
    fn on_stage_start(&self, page_num: usize, total_pages: usize, stage: Stage) {
        let _ = (page_num, total_pages, stage);
    }

    /// Called when a page completes with no stage failure. The page may
    /// still have contributed nothing (empty OCR response).
    fn on_page_complete(&self, page_num: usize, total_pages: usize, result: &PageResult) {
        let _ = (page_num, total_pages, result);
    }

    /// Called when a page completes with a stage failure. The page was still
    /// recorded; processing continues with the next page.
    fn on_page_error(&self, page_num: usize, total_pages: usize, error: &str) {
        let _ = (page_num, total_pages, error);
    }

    /// Called once after the fallback selector has run.
    ///
    /// # Arguments
    /// * `total_pages`      — total pages in the document
    /// * `translated_pages` — pages that contributed a translation
    /// * `tier`             — the tier the selected text came from
    fn on_document_complete(&self, total_pages: usize, translated_pages: usize, tier: Tier) {
        let _ = (total_pages, translated_pages, tier);
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgressCallback;

impl ProcessProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ProcessConfig`].
pub type ProgressCallback = Arc<dyn ProcessProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        stages: Mutex<Vec<Stage>>,
        completes: AtomicUsize,
        errors: AtomicUsize,
        final_tier: Mutex<Option<Tier>>,
    }

    impl ProcessProgressCallback for TrackingCallback {
        fn on_page_start(&self, _page_num: usize, _total_pages: usize) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_stage_start(&self, _page_num: usize, _total_pages: usize, stage: Stage) {
            self.stages.lock().unwrap().push(stage);
        }

        fn on_page_complete(&self, _page_num: usize, _total_pages: usize, _result: &PageResult) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_page_error(&self, _page_num: usize, _total_pages: usize, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_document_complete(&self, _total: usize, _translated: usize, tier: Tier) {
            *self.final_tier.lock().unwrap() = Some(tier);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_document_start(5);
        cb.on_page_start(1, 5);
        cb.on_stage_start(1, 5, Stage::Ocr);
        cb.on_page_error(2, 5, "some error");
        cb.on_document_complete(5, 4, Tier::Translated);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_page_start(1, 2);
        tracker.on_stage_start(1, 2, Stage::Render);
        tracker.on_stage_start(1, 2, Stage::Ocr);
        tracker.on_stage_start(1, 2, Stage::Translate);
        tracker.on_page_complete(
            1,
            2,
            &crate::output::PageResult::translated(0, "o".into(), "t".into(), 1),
        );
        tracker.on_page_start(2, 2);
        tracker.on_page_error(2, 2, "OCR timed out");
        tracker.on_document_complete(2, 1, Tier::Translated);

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
        assert_eq!(
            tracker.stages.lock().unwrap().as_slice(),
            &[Stage::Render, Stage::Ocr, Stage::Translate]
        );
        assert_eq!(*tracker.final_tier.lock().unwrap(), Some(Tier::Translated));
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: Arc<dyn ProcessProgressCallback> = Arc::new(NoopProgressCallback);
        cb.on_document_start(10);
        cb.on_page_start(1, 10);
    }
}
