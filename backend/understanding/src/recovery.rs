//! Text recovery engine.
//!
//! Turns an uploaded PDF or image into page-ordered text: rasterize (PDFs
//! only), preprocess each page, recognize concurrently, then stitch the pages
//! back together in order.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use futures::future::join_all;
use image::DynamicImage;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use tenantlens_core::{LeaseError, MediaType, PageText, RawDocument, RecoveredText, RecoveryStage};
use tenantlens_logging::{AnalysisEvent, AnalysisEventLogger};

use crate::ocr::{Page, TesseractCli, TextRecognizer};
use crate::preprocess::preprocess;
use crate::rasterize::{PageRasterizer, PdftoppmRasterizer, RenderedPage};

/// Default number of pages recognized at once.
pub const DEFAULT_MAX_CONCURRENT_PAGES: usize = 4;

pub struct TextRecoveryEngine {
    rasterizer: Arc<dyn PageRasterizer>,
    recognizer: Arc<dyn TextRecognizer>,
    max_concurrent_pages: usize,
}

impl TextRecoveryEngine {
    pub fn new(rasterizer: Arc<dyn PageRasterizer>, recognizer: Arc<dyn TextRecognizer>) -> Self {
        Self {
            rasterizer,
            recognizer,
            max_concurrent_pages: DEFAULT_MAX_CONCURRENT_PAGES,
        }
    }

    pub fn with_max_concurrent_pages(mut self, n: usize) -> Self {
        self.max_concurrent_pages = n.max(1);
        self
    }

    /// Recover text from a document.
    ///
    /// A page that cannot be rendered, decoded or recognized is left empty and
    /// listed in `failed_pages`. A [`LeaseError::RecoveryFailure`] is returned
    /// only when nothing usable comes out: an image that does not decode, a
    /// PDF that cannot be rasterized or yields no decodable page, or a
    /// document where every page failed recognition.
    pub async fn recover(&self, document: &RawDocument) -> Result<RecoveredText, LeaseError> {
        info!(
            media_type = %document.media_type,
            bytes = document.bytes.len(),
            recognizer = %self.recognizer.name(),
            "Recovering document text"
        );

        let (pages, page_markers) = match document.media_type {
            MediaType::Pdf => {
                let pages = self
                    .rasterizer
                    .rasterize(&document.bytes)
                    .await
                    .map_err(|e| LeaseError::recovery(RecoveryStage::Rasterize, e))?;
                (pages, true)
            }
            MediaType::Jpeg | MediaType::Png | MediaType::Tiff => {
                let image = decode_image(document)
                    .await
                    .map_err(|e| LeaseError::recovery(RecoveryStage::Decode, e))?;
                (vec![RenderedPage::ok(0, image)], false)
            }
        };

        self.recognize_pages(pages, page_markers).await
    }

    /// Recover text from bytes with a declared MIME type.
    pub async fn recover_declared(
        &self,
        bytes: impl Into<bytes::Bytes>,
        declared: &str,
    ) -> Result<RecoveredText, LeaseError> {
        let document = RawDocument::from_declared(bytes, declared)?;
        self.recover(&document).await
    }

    async fn recognize_pages(
        &self,
        mut pages: Vec<RenderedPage>,
        page_markers: bool,
    ) -> Result<RecoveredText, LeaseError> {
        let total = pages.len();
        if total == 0 {
            return Err(LeaseError::recovery(
                RecoveryStage::Rasterize,
                anyhow!("document has no pages"),
            ));
        }
        if pages.iter().all(|p| p.image.is_err()) {
            let cause = match pages.swap_remove(0).image {
                Err(e) => e,
                Ok(_) => anyhow!("no page could be rendered"),
            };
            return Err(LeaseError::recovery(
                RecoveryStage::Rasterize,
                cause.context(format!("none of {total} page(s) could be rendered")),
            ));
        }

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent_pages));
        let tasks = pages.into_iter().map(|page| {
            let semaphore = Arc::clone(&semaphore);
            let recognizer = Arc::clone(&self.recognizer);
            async move {
                let index = page.index;
                let result = match page.image {
                    Ok(image) => recognize_page(semaphore, recognizer, Page::new(index, image)).await,
                    Err(e) => Err(e),
                };
                (index, result)
            }
        });

        // join_all yields results in input order, which is page order.
        let results = join_all(tasks).await;

        let mut recovered = RecoveredText {
            pages: Vec::with_capacity(total),
            failed_pages: Vec::new(),
            page_markers,
        };
        let mut first_error = None;

        for (index, result) in results {
            match result {
                Ok(text) => {
                    AnalysisEventLogger::log_event(AnalysisEvent::PageRecovered {
                        page: index + 1,
                        chars: text.chars().count(),
                    });
                    recovered.pages.push(PageText { index, text });
                }
                Err(e) => {
                    warn!(page = index + 1, error = %format!("{e:#}"), "Page recovery failed");
                    AnalysisEventLogger::log_event(AnalysisEvent::PageFailed {
                        page: index + 1,
                        error: format!("{e:#}"),
                    });
                    recovered.pages.push(PageText {
                        index,
                        text: String::new(),
                    });
                    recovered.failed_pages.push(index);
                    first_error.get_or_insert(e);
                }
            }
        }

        if recovered.failed_pages.len() == total {
            let cause = first_error.unwrap_or_else(|| anyhow!("no page produced text"));
            return Err(LeaseError::recovery(
                RecoveryStage::Recognize,
                cause.context(format!("all {total} page(s) failed recognition")),
            ));
        }

        info!(
            pages = total,
            failed = recovered.failed_pages.len(),
            "Recovered document text"
        );
        Ok(recovered)
    }
}

impl Default for TextRecoveryEngine {
    fn default() -> Self {
        Self::new(
            Arc::new(PdftoppmRasterizer::new()),
            Arc::new(TesseractCli::new()),
        )
    }
}

async fn recognize_page(
    semaphore: Arc<Semaphore>,
    recognizer: Arc<dyn TextRecognizer>,
    page: Page,
) -> Result<String> {
    let _permit = semaphore
        .acquire_owned()
        .await
        .context("page semaphore closed")?;

    let index = page.index;
    let prepared = tokio::task::spawn_blocking(move || Page::new(index, preprocess(&page.image)))
        .await
        .context("preprocessing task panicked")?;

    recognizer.recognize(&prepared).await
}

async fn decode_image(document: &RawDocument) -> Result<DynamicImage> {
    let bytes = document.bytes.clone();
    let media_type = document.media_type;
    tokio::task::spawn_blocking(move || {
        image::load_from_memory(&bytes)
            .with_context(|| format!("failed to decode {media_type} image"))
    })
    .await
    .context("image decoding task panicked")?
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use image::{GrayImage, ImageFormat, Luma};
    use pretty_assertions::assert_eq;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Produces `n` blank pages without touching a PDF.
    struct FakeRasterizer {
        pages: usize,
    }

    #[async_trait]
    impl PageRasterizer for FakeRasterizer {
        async fn rasterize(&self, _pdf: &[u8]) -> Result<Vec<RenderedPage>> {
            Ok((0..self.pages).map(|i| RenderedPage::ok(i, blank_page())).collect())
        }
    }

    /// Renders `pages` pages; those in `undecodable` come back as failed.
    struct PartialRasterizer {
        pages: usize,
        undecodable: Vec<usize>,
    }

    #[async_trait]
    impl PageRasterizer for PartialRasterizer {
        async fn rasterize(&self, _pdf: &[u8]) -> Result<Vec<RenderedPage>> {
            Ok((0..self.pages)
                .map(|i| {
                    if self.undecodable.contains(&i) {
                        RenderedPage::failed(i, anyhow::anyhow!("truncated PNG for page {}", i + 1))
                    } else {
                        RenderedPage::ok(i, blank_page())
                    }
                })
                .collect())
        }
    }

    fn blank_page() -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_pixel(20, 20, Luma([255])))
    }

    struct BrokenRasterizer;

    #[async_trait]
    impl PageRasterizer for BrokenRasterizer {
        async fn rasterize(&self, _pdf: &[u8]) -> Result<Vec<RenderedPage>> {
            anyhow::bail!("not a PDF")
        }
    }

    /// Returns "page text N", failing on the configured 0-based indices.
    /// Earlier pages sleep longer so completion order differs from page order.
    struct FakeRecognizer {
        fail_on: Vec<usize>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl FakeRecognizer {
        fn failing_on(fail_on: Vec<usize>) -> Self {
            Self {
                fail_on,
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TextRecognizer for FakeRecognizer {
        fn name(&self) -> &str {
            "fake"
        }

        async fn recognize(&self, page: &Page) -> Result<String> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(30u64.saturating_sub(page.index as u64 * 5))).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.fail_on.contains(&page.index) {
                anyhow::bail!("engine crashed on page {}", page.index + 1)
            }
            Ok(format!("  page text {}\n", page.index + 1))
        }
    }

    fn engine(pages: usize, recognizer: Arc<FakeRecognizer>) -> TextRecoveryEngine {
        TextRecoveryEngine::new(Arc::new(FakeRasterizer { pages }), recognizer)
    }

    fn png_bytes() -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageLuma8(GrayImage::from_pixel(16, 16, Luma([200])))
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    #[tokio::test]
    async fn test_three_page_pdf_with_failed_middle_page() {
        let recognizer = Arc::new(FakeRecognizer::failing_on(vec![1]));
        let doc = RawDocument::new(b"%PDF-1.7".to_vec(), MediaType::Pdf);

        let recovered = engine(3, recognizer).recover(&doc).await.unwrap();

        assert_eq!(recovered.failed_pages, vec![1]);
        assert_eq!(
            recovered.render(),
            "--- Page 1 ---\npage text 1\n\n--- Page 2 ---\n\n\n--- Page 3 ---\npage text 3"
        );
    }

    #[tokio::test]
    async fn test_page_order_preserved() {
        let recognizer = Arc::new(FakeRecognizer::failing_on(vec![]));
        let doc = RawDocument::new(b"%PDF".to_vec(), MediaType::Pdf);

        let recovered = engine(5, recognizer).recover(&doc).await.unwrap();

        let indices: Vec<usize> = recovered.pages.iter().map(|p| p.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
        assert!(!recovered.is_degraded());
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let recognizer = Arc::new(FakeRecognizer::failing_on(vec![]));
        let doc = RawDocument::new(b"%PDF".to_vec(), MediaType::Pdf);

        engine(6, Arc::clone(&recognizer))
            .with_max_concurrent_pages(2)
            .recover(&doc)
            .await
            .unwrap();

        assert!(recognizer.max_in_flight.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_all_pages_failing_is_recovery_failure() {
        let recognizer = Arc::new(FakeRecognizer::failing_on(vec![0, 1]));
        let doc = RawDocument::new(b"%PDF".to_vec(), MediaType::Pdf);

        let err = engine(2, recognizer).recover(&doc).await.unwrap_err();
        assert!(matches!(
            err,
            LeaseError::RecoveryFailure {
                stage: RecoveryStage::Recognize,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_rasterization_failure_is_recovery_failure() {
        let engine = TextRecoveryEngine::new(
            Arc::new(BrokenRasterizer),
            Arc::new(FakeRecognizer::failing_on(vec![])),
        );
        let doc = RawDocument::new(b"garbage".to_vec(), MediaType::Pdf);

        let err = engine.recover(&doc).await.unwrap_err();
        assert!(matches!(
            err,
            LeaseError::RecoveryFailure {
                stage: RecoveryStage::Rasterize,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_undecodable_page_is_contained() {
        let recognizer = Arc::new(FakeRecognizer::failing_on(vec![]));
        let engine = TextRecoveryEngine::new(
            Arc::new(PartialRasterizer {
                pages: 3,
                undecodable: vec![1],
            }),
            recognizer,
        );
        let doc = RawDocument::new(b"%PDF-1.4".to_vec(), MediaType::Pdf);

        let recovered = engine.recover(&doc).await.unwrap();

        assert_eq!(recovered.failed_pages, vec![1]);
        assert_eq!(
            recovered.render(),
            "--- Page 1 ---\npage text 1\n\n--- Page 2 ---\n\n\n--- Page 3 ---\npage text 3"
        );
    }

    #[tokio::test]
    async fn test_no_decodable_page_is_recovery_failure() {
        let engine = TextRecoveryEngine::new(
            Arc::new(PartialRasterizer {
                pages: 2,
                undecodable: vec![0, 1],
            }),
            Arc::new(FakeRecognizer::failing_on(vec![])),
        );
        let doc = RawDocument::new(b"%PDF-1.4".to_vec(), MediaType::Pdf);

        let err = engine.recover(&doc).await.unwrap_err();
        assert!(matches!(
            err,
            LeaseError::RecoveryFailure {
                stage: RecoveryStage::Rasterize,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_image_has_no_page_marker() {
        let recognizer = Arc::new(FakeRecognizer::failing_on(vec![]));
        let doc = RawDocument::new(png_bytes(), MediaType::Png);

        let recovered = engine(0, recognizer).recover(&doc).await.unwrap();
        assert_eq!(recovered.render(), "page text 1");
    }

    #[tokio::test]
    async fn test_corrupt_image_is_decode_failure() {
        let recognizer = Arc::new(FakeRecognizer::failing_on(vec![]));
        let doc = RawDocument::new(b"not really a jpeg".to_vec(), MediaType::Jpeg);

        let err = engine(0, recognizer).recover(&doc).await.unwrap_err();
        assert!(matches!(
            err,
            LeaseError::RecoveryFailure {
                stage: RecoveryStage::Decode,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_unsupported_declared_type() {
        let recognizer = Arc::new(FakeRecognizer::failing_on(vec![]));
        let err = engine(1, recognizer)
            .recover_declared(b"GIF89a".to_vec(), "image/gif")
            .await
            .unwrap_err();
        assert!(matches!(err, LeaseError::UnsupportedMediaType(_)));
    }
}
