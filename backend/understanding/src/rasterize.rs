//! PDF rasterization.
//!
//! Renders every page of a PDF to an image via `pdftoppm` (poppler-utils).

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use image::DynamicImage;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Default rendering resolution.
pub const DEFAULT_DPI: u32 = 300;

/// One page of a rasterized PDF, or why that page could not be produced.
#[derive(Debug)]
pub struct RenderedPage {
    pub index: usize,
    pub image: Result<DynamicImage>,
}

impl RenderedPage {
    pub fn ok(index: usize, image: DynamicImage) -> Self {
        Self {
            index,
            image: Ok(image),
        }
    }

    pub fn failed(index: usize, error: anyhow::Error) -> Self {
        Self {
            index,
            image: Err(error),
        }
    }
}

/// Renders the pages of a PDF, in document order.
///
/// An `Err` means the document could not be rasterized at all. Pages that
/// fail individually are returned as failed [`RenderedPage`]s.
#[async_trait]
pub trait PageRasterizer: Send + Sync {
    async fn rasterize(&self, pdf: &[u8]) -> Result<Vec<RenderedPage>>;
}

pub struct PdftoppmRasterizer {
    binary: PathBuf,
    dpi: u32,
    timeout: Duration,
}

impl PdftoppmRasterizer {
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from("pdftoppm"),
            dpi: DEFAULT_DPI,
            timeout: Duration::from_secs(300),
        }
    }

    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for PdftoppmRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageRasterizer for PdftoppmRasterizer {
    async fn rasterize(&self, pdf: &[u8]) -> Result<Vec<RenderedPage>> {
        let dir = tempfile::tempdir().context("failed to create temp dir for rasterization")?;
        let input = dir.path().join("document.pdf");
        tokio::fs::write(&input, pdf)
            .await
            .context("failed to stage PDF for rasterization")?;

        let prefix = dir.path().join("page");
        let output = tokio::time::timeout(
            self.timeout,
            Command::new(&self.binary)
                .arg("-r")
                .arg(self.dpi.to_string())
                .arg("-png")
                .arg(&input)
                .arg(&prefix)
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| anyhow!("pdftoppm timed out after {:?}", self.timeout))?
        .with_context(|| format!("failed to run {}", self.binary.display()))?;

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let files = rendered_pages(dir.path())?;
        if files.is_empty() {
            if output.status.success() {
                bail!("pdftoppm produced no pages");
            }
            bail!("pdftoppm exited with {}: {}", output.status, stderr);
        }
        if !output.status.success() {
            // Damaged PDFs often render most pages before pdftoppm gives up.
            warn!(
                status = %output.status,
                stderr = %stderr,
                rendered = files.len(),
                "pdftoppm failed part way; keeping rendered pages"
            );
        }
        debug!(pages = files.len(), dpi = self.dpi, "Rendered PDF pages");

        let pages = tokio::task::spawn_blocking(move || decode_pages(files))
            .await
            .context("page decoding task panicked")?;

        let failed = pages.iter().filter(|p| p.image.is_err()).count();
        info!(pages = pages.len(), failed, "Rasterized PDF");
        Ok(pages)
    }
}

/// Decode rendered page files. Gaps in the numbering become failed pages.
fn decode_pages(files: Vec<(usize, PathBuf)>) -> Vec<RenderedPage> {
    let last = files.last().map(|(n, _)| *n).unwrap_or(0);
    let mut files = files.into_iter().peekable();
    let mut pages = Vec::with_capacity(last);

    for number in 1..=last {
        let index = number - 1;
        match files.next_if(|(n, _)| *n == number) {
            Some((_, path)) => match image::open(&path) {
                Ok(image) => pages.push(RenderedPage::ok(index, image)),
                Err(e) => pages.push(RenderedPage::failed(
                    index,
                    anyhow::Error::new(e)
                        .context(format!("failed to decode rendered page {}", path.display())),
                )),
            },
            None => pages.push(RenderedPage::failed(
                index,
                anyhow!("page {number} was not rendered"),
            )),
        }
    }
    pages
}

/// Collect `page-N.png` files from `dir` with their page numbers, ordered by
/// page number.
///
/// pdftoppm zero-pads the number to the width of the page count, so a plain
/// lexical sort is not enough once documents mix widths.
fn rendered_pages(dir: &Path) -> Result<Vec<(usize, PathBuf)>> {
    let mut numbered = Vec::new();
    for entry in std::fs::read_dir(dir).context("failed to list rendered pages")? {
        let path = entry?.path();
        if let Some(n) = page_number(&path) {
            numbered.push((n, path));
        }
    }
    numbered.sort_by_key(|(n, _)| *n);
    Ok(numbered)
}

fn page_number(path: &Path) -> Option<usize> {
    if path.extension().and_then(|e| e.to_str()) != Some("png") {
        return None;
    }
    path.file_stem()?
        .to_str()?
        .strip_prefix("page-")?
        .parse()
        .ok()
}
