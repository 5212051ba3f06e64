//! Integration tests for the document pipeline, driven through
//! [`process_with_renderer`] with scripted stage doubles.
//!
//! No PDF backend, no network, no API key: the renderer, OCR engine, and
//! translator are all in-process doubles, so these tests exercise the full
//! aggregation, isolation, and fallback machinery hermetically.

use async_trait::async_trait;
use edgequake_llm::ImageData;
use image::DynamicImage;
use scanlate::{
    process_with_renderer, DocumentMetadata, OcrEngine, PageRenderer, ProcessConfig,
    ProcessProgressCallback, ScanlateError, ServiceError, Stage, Tier, Translator,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ── Stage doubles ────────────────────────────────────────────────────────

/// How one page behaves in the mock renderer.
#[derive(Clone)]
enum PageScript {
    /// Render succeeds with a tiny raster.
    Ok,
    /// Page-local render failure.
    Fail,
    /// Loop-infrastructure failure (aborts the whole OCR tier).
    Catastrophic,
}

struct MockRenderer {
    pages: Vec<PageScript>,
    raw_text: String,
    raw_fails: bool,
}

impl MockRenderer {
    fn new(pages: Vec<PageScript>, raw_text: &str) -> Self {
        Self {
            pages,
            raw_text: raw_text.to_string(),
            raw_fails: false,
        }
    }
}

#[async_trait]
impl PageRenderer for MockRenderer {
    async fn metadata(&self) -> Result<DocumentMetadata, ScanlateError> {
        Ok(DocumentMetadata {
            page_count: self.pages.len(),
            pdf_version: "1.7".to_string(),
            ..Default::default()
        })
    }

    async fn page_count(&self) -> Result<usize, ScanlateError> {
        Ok(self.pages.len())
    }

    async fn render_page(&self, index: usize) -> Result<DynamicImage, ScanlateError> {
        match self.pages.get(index) {
            Some(PageScript::Ok) => Ok(DynamicImage::new_rgb8(4, 4)),
            Some(PageScript::Fail) => Err(ScanlateError::RenderFailed {
                page: index + 1,
                detail: "scripted render failure".to_string(),
            }),
            Some(PageScript::Catastrophic) => {
                Err(ScanlateError::Internal("scripted engine crash".to_string()))
            }
            None => Err(ScanlateError::RenderFailed {
                page: index + 1,
                detail: "page out of range".to_string(),
            }),
        }
    }

    async fn extract_text(&self) -> Result<String, ScanlateError> {
        if self.raw_fails {
            Err(ScanlateError::Internal("scripted extraction failure".to_string()))
        } else {
            Ok(self.raw_text.clone())
        }
    }
}

/// Per-page scripted OCR outcome.
#[derive(Clone)]
enum CallScript {
    Text(&'static str),
    Timeout,
    ApiError(&'static str),
}

impl CallScript {
    fn run(&self) -> Result<String, ServiceError> {
        match self {
            CallScript::Text(t) => Ok(t.to_string()),
            CallScript::Timeout => Err(ServiceError::Timeout { secs: 180 }),
            CallScript::ApiError(d) => Err(ServiceError::Api {
                detail: d.to_string(),
            }),
        }
    }
}

/// OCR double scripted per page number; counts calls.
struct MockOcr {
    scripts: HashMap<usize, CallScript>,
    calls: AtomicUsize,
}

impl MockOcr {
    fn new(scripts: impl IntoIterator<Item = (usize, CallScript)>) -> Arc<Self> {
        Arc::new(Self {
            scripts: scripts.into_iter().collect(),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl OcrEngine for MockOcr {
    async fn recognize(
        &self,
        _image: ImageData,
        page_number: usize,
    ) -> Result<String, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.scripts
            .get(&page_number)
            .map(CallScript::run)
            .unwrap_or_else(|| Ok(String::new()))
    }
}

/// Translator double: prefixes input with "T:" unless scripted otherwise.
struct MockTranslator {
    scripts: HashMap<usize, CallScript>,
    calls: AtomicUsize,
}

impl MockTranslator {
    fn passthrough() -> Arc<Self> {
        Self::new([])
    }

    fn new(scripts: impl IntoIterator<Item = (usize, CallScript)>) -> Arc<Self> {
        Arc::new(Self {
            scripts: scripts.into_iter().collect(),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl Translator for MockTranslator {
    async fn translate(&self, text: &str) -> Result<String, ServiceError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        match self.scripts.get(&call) {
            Some(script) => script.run(),
            None => Ok(format!("T:{text}")),
        }
    }
}

fn config_with(ocr: Arc<MockOcr>, translator: Arc<MockTranslator>) -> ProcessConfig {
    ProcessConfig::builder()
        .ocr(ocr)
        .translator(translator)
        .build()
        .unwrap()
}

// ── Tests ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn zero_page_document_selects_none() {
    let renderer = MockRenderer::new(vec![], "");
    let config = config_with(MockOcr::new([]), MockTranslator::passthrough());

    let result = process_with_renderer(&renderer, &config).await.unwrap();

    assert_eq!(result.tier, Tier::None);
    assert!(result.text.is_empty());
    assert!(result.pages.is_empty());
    assert!(result.aborted.is_none());
    assert_eq!(result.stats.total_pages, 0);
}

#[tokio::test]
async fn happy_path_selects_translated_tier() {
    let renderer = MockRenderer::new(vec![PageScript::Ok, PageScript::Ok], "raw layer");
    let ocr = MockOcr::new([(1, CallScript::Text("page one")), (2, CallScript::Text("page two"))]);
    let config = config_with(Arc::clone(&ocr), MockTranslator::passthrough());

    let result = process_with_renderer(&renderer, &config).await.unwrap();

    // Translated output wins over a non-empty raw layer.
    assert_eq!(result.tier, Tier::Translated);
    assert_eq!(result.text, "T:page one\n\nT:page two");
    assert_eq!(result.raw_text, "raw layer");
    assert_eq!(result.stats.translated_pages, 2);
    assert_eq!(result.stats.failed_pages, 0);
    assert_eq!(ocr.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn empty_ocr_output_skips_translation() {
    let renderer = MockRenderer::new(vec![PageScript::Ok], "fallback");
    let ocr = MockOcr::new([(1, CallScript::Text("   \n"))]);
    let translator = MockTranslator::passthrough();
    let config = config_with(ocr, Arc::clone(&translator));

    let result = process_with_renderer(&renderer, &config).await.unwrap();

    // Blank OCR output is a success that produced nothing: no failure is
    // recorded and the translator is never invoked.
    assert_eq!(translator.calls.load(Ordering::SeqCst), 0);
    assert_eq!(result.pages.len(), 1);
    assert!(result.pages[0].failure.is_none());
    assert!(result.pages[0].ocr_text.is_empty());
    assert!(result.pages[0].translated_text.is_empty());
    assert_eq!(result.tier, Tier::Raw);
    assert_eq!(result.text, "fallback");
}

#[tokio::test]
async fn render_failure_is_page_local() {
    let renderer = MockRenderer::new(vec![PageScript::Fail, PageScript::Ok], "");
    let ocr = MockOcr::new([(2, CallScript::Text("second"))]);
    let config = config_with(ocr, MockTranslator::passthrough());

    let result = process_with_renderer(&renderer, &config).await.unwrap();

    assert_eq!(result.pages.len(), 2);
    let failed = &result.pages[0];
    assert!(failed.ocr_text.is_empty());
    assert!(failed.translated_text.is_empty());
    assert_eq!(failed.failure.as_ref().unwrap().stage(), Stage::Render);

    // The failure did not leak into the neighbouring page.
    assert_eq!(result.pages[1].translated_text, "T:second");
    assert_eq!(result.tier, Tier::Translated);
    assert_eq!(result.text, "T:second");
    assert_eq!(result.stats.failed_pages, 1);
}

#[tokio::test]
async fn mixed_outcomes_keep_page_isolation() {
    // Page 1 translates, page 2 fails OCR, page 3 fails translation.
    let renderer = MockRenderer::new(
        vec![PageScript::Ok, PageScript::Ok, PageScript::Ok],
        "raw",
    );
    let ocr = MockOcr::new([
        (1, CallScript::Text("one")),
        (2, CallScript::ApiError("model unavailable")),
        (3, CallScript::Text("three")),
    ]);
    // The translator sees only pages 1 and 3; its second call is page 3.
    let translator = MockTranslator::new([(2, CallScript::Timeout)]);
    let config = config_with(ocr, translator);

    let result = process_with_renderer(&renderer, &config).await.unwrap();

    assert_eq!(result.pages.len(), 3);
    assert_eq!(result.pages[0].translated_text, "T:one");

    assert_eq!(result.pages[1].failure.as_ref().unwrap().stage(), Stage::Ocr);
    assert!(result.pages[1].ocr_text.is_empty());

    // Translation failure keeps the OCR text it was given.
    let p3 = &result.pages[2];
    assert_eq!(p3.ocr_text, "three");
    assert!(p3.translated_text.is_empty());
    assert_eq!(p3.failure.as_ref().unwrap().stage(), Stage::Translate);

    // Only successful translations reach the candidate.
    assert_eq!(result.tier, Tier::Translated);
    assert_eq!(result.text, "T:one");
    assert_eq!(result.stats.translated_pages, 1);
    assert_eq!(result.stats.ocr_pages, 2);
    assert_eq!(result.stats.failed_pages, 2);
}

#[tokio::test]
async fn translated_text_implies_ocr_text() {
    let renderer = MockRenderer::new(vec![PageScript::Ok, PageScript::Ok], "");
    let ocr = MockOcr::new([(1, CallScript::Text("a")), (2, CallScript::Text(""))]);
    let config = config_with(ocr, MockTranslator::passthrough());

    let result = process_with_renderer(&renderer, &config).await.unwrap();

    for page in &result.pages {
        if !page.translated_text.is_empty() {
            assert!(!page.ocr_text.is_empty());
        }
    }
}

#[tokio::test]
async fn catastrophic_failure_discards_all_results() {
    // Page 1 succeeds, then the engine crashes on page 2.
    let renderer = MockRenderer::new(
        vec![PageScript::Ok, PageScript::Catastrophic, PageScript::Ok],
        "the raw text layer",
    );
    let ocr = MockOcr::new([(1, CallScript::Text("perfectly good page"))]);
    let config = config_with(ocr, MockTranslator::passthrough());

    let result = process_with_renderer(&renderer, &config).await.unwrap();

    // All-or-nothing: page 1's successful translation is gone too, and the
    // run degrades to the raw tier as a warning rather than an error.
    assert!(result.aborted.is_some());
    assert!(result.pages.is_empty());
    assert_eq!(result.tier, Tier::Raw);
    assert_eq!(result.text, "the raw text layer");
    assert_eq!(result.stats.translated_pages, 0);
}

#[tokio::test]
async fn catastrophic_failure_with_blank_raw_selects_none() {
    let renderer = MockRenderer::new(vec![PageScript::Catastrophic], "   ");
    let config = config_with(MockOcr::new([]), MockTranslator::passthrough());

    let result = process_with_renderer(&renderer, &config).await.unwrap();

    assert!(result.aborted.is_some());
    assert_eq!(result.tier, Tier::None);
    assert!(result.text.is_empty());
}

#[tokio::test]
async fn raw_extraction_failure_is_isolated() {
    let mut renderer = MockRenderer::new(vec![PageScript::Ok], "");
    renderer.raw_fails = true;
    let ocr = MockOcr::new([(1, CallScript::Text("content"))]);
    let config = config_with(ocr, MockTranslator::passthrough());

    let result = process_with_renderer(&renderer, &config).await.unwrap();

    // A dead raw pass costs nothing when the translated tier succeeds.
    assert_eq!(result.tier, Tier::Translated);
    assert_eq!(result.text, "T:content");
    assert!(result.raw_text.is_empty());
}

#[tokio::test]
async fn pages_come_back_in_ascending_order() {
    let renderer = MockRenderer::new(
        vec![PageScript::Ok, PageScript::Fail, PageScript::Ok, PageScript::Fail],
        "",
    );
    let ocr = MockOcr::new([(1, CallScript::Text("a")), (3, CallScript::Text("b"))]);
    let config = config_with(ocr, MockTranslator::passthrough());

    let result = process_with_renderer(&renderer, &config).await.unwrap();

    let indices: Vec<usize> = result.pages.iter().map(|p| p.index).collect();
    assert_eq!(indices, vec![0, 1, 2, 3]);
    let numbers: Vec<usize> = result.pages.iter().map(|p| p.page_number()).collect();
    assert_eq!(numbers, vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn same_input_same_config_same_selection() {
    let renderer = MockRenderer::new(vec![PageScript::Ok], "raw");
    let ocr = MockOcr::new([(1, CallScript::Text("stable"))]);
    let config = config_with(ocr, MockTranslator::passthrough());

    let first = process_with_renderer(&renderer, &config).await.unwrap();
    let second = process_with_renderer(&renderer, &config).await.unwrap();

    assert_eq!(first.text, second.text);
    assert_eq!(first.tier, second.tier);
}

#[tokio::test]
async fn translation_output_is_passed_through_verbatim() {
    // Leading/trailing whitespace and OCR-style markers survive selection.
    let renderer = MockRenderer::new(vec![PageScript::Ok], "");
    let ocr = MockOcr::new([(1, CallScript::Text("==Start of OCR for page 1==\nbody"))]);
    let translator = MockTranslator::new([(1, CallScript::Text("  translated body  "))]);
    let config = config_with(ocr, translator);

    let result = process_with_renderer(&renderer, &config).await.unwrap();

    assert_eq!(result.text, "  translated body  ");
    assert_eq!(
        result.pages[0].ocr_text,
        "==Start of OCR for page 1==\nbody"
    );
}

// ── Progress events ──────────────────────────────────────────────────────

#[derive(Default)]
struct RecordingCallback {
    events: Mutex<Vec<String>>,
}

impl ProcessProgressCallback for RecordingCallback {
    fn on_document_start(&self, total: usize) {
        self.events.lock().unwrap().push(format!("start:{total}"));
    }
    fn on_page_start(&self, page: usize, _total: usize) {
        self.events.lock().unwrap().push(format!("page:{page}"));
    }
    fn on_stage_start(&self, page: usize, _total: usize, stage: Stage) {
        self.events.lock().unwrap().push(format!("stage:{page}:{stage}"));
    }
    fn on_page_complete(&self, page: usize, _total: usize, _result: &scanlate::PageResult) {
        self.events.lock().unwrap().push(format!("done:{page}"));
    }
    fn on_page_error(&self, page: usize, _total: usize, _error: &str) {
        self.events.lock().unwrap().push(format!("error:{page}"));
    }
    fn on_document_complete(&self, _total: usize, translated: usize, tier: Tier) {
        self.events
            .lock()
            .unwrap()
            .push(format!("complete:{translated}:{tier}"));
    }
}

#[tokio::test]
async fn progress_events_follow_the_stage_order() {
    let renderer = MockRenderer::new(vec![PageScript::Ok, PageScript::Fail], "");
    let ocr = MockOcr::new([(1, CallScript::Text("x"))]);
    let callback = Arc::new(RecordingCallback::default());

    let config = ProcessConfig::builder()
        .ocr(ocr)
        .translator(MockTranslator::passthrough())
        .progress_callback(callback.clone())
        .build()
        .unwrap();

    process_with_renderer(&renderer, &config).await.unwrap();

    let events = callback.events.lock().unwrap().clone();
    let expected: Vec<String> = [
        "start:2",
        "page:1",
        "stage:1:render",
        "stage:1:ocr",
        "stage:1:translate",
        "done:1",
        "page:2",
        "stage:2:render",
        "error:2",
        "complete:1:translated",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    assert_eq!(events, expected);
}
