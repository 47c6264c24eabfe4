//! Optical Character Recognition (OCR)
//!
//! Turns a single page image into plain text. The default engine shells out to
//! the `tesseract` CLI, feeding the page as PNG over stdin.

use std::io::Cursor;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use image::{DynamicImage, ImageFormat};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// One page of a document as an image, tagged with its 0-based position.
#[derive(Debug, Clone)]
pub struct Page {
    pub index: usize,
    pub image: DynamicImage,
}

impl Page {
    pub fn new(index: usize, image: DynamicImage) -> Self {
        Self { index, image }
    }
}

/// Recognizes the text on one page image.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    fn name(&self) -> &str;

    async fn recognize(&self, page: &Page) -> Result<String>;
}

/// Tesseract invoked as a subprocess.
pub struct TesseractCli {
    binary: PathBuf,
    language: String,
    page_seg_mode: u8,
    timeout: Duration,
}

impl TesseractCli {
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from("tesseract"),
            language: "eng".to_string(),
            // Assume a single uniform block of text.
            page_seg_mode: 6,
            timeout: Duration::from_secs(120),
        }
    }

    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_page_seg_mode(mut self, psm: u8) -> Self {
        self.page_seg_mode = psm;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("stdin")
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .arg("--psm")
            .arg(self.page_seg_mode.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

impl Default for TesseractCli {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextRecognizer for TesseractCli {
    fn name(&self) -> &str {
        "tesseract"
    }

    async fn recognize(&self, page: &Page) -> Result<String> {
        let start = Instant::now();
        let png = encode_png(&page.image)?;

        let mut child = self
            .command()
            .spawn()
            .with_context(|| format!("failed to spawn {}", self.binary.display()))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| anyhow!("tesseract stdin was not captured"))?;
        let writer = tokio::spawn(async move {
            stdin.write_all(&png).await?;
            stdin.shutdown().await
        });

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| anyhow!("tesseract timed out after {:?} on page {}", self.timeout, page.index + 1))?
            .context("failed to wait for tesseract")?;

        writer
            .await
            .context("tesseract stdin writer panicked")?
            .context("failed to write page image to tesseract")?;

        if !output.status.success() {
            bail!(
                "tesseract exited with {} on page {}: {}",
                output.status,
                page.index + 1,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!(
            page = page.index + 1,
            chars = text.len(),
            latency_ms = start.elapsed().as_millis() as u64,
            "Tesseract recognized page"
        );
        Ok(text)
    }
}

/// Encode an image as PNG in memory.
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    image
        .write_to(&mut buf, ImageFormat::Png)
        .context("failed to encode page image as PNG")?;
    Ok(buf.into_inner())
}
