//! Text recovery for scanned and photographed lease documents.
//!
//! Pages are rasterized (PDF), cleaned up, and run through OCR; the result is
//! checked for whether it plausibly is a lease at all.

pub mod mime_detect;
pub mod ocr;
pub mod preprocess;
pub mod rasterize;
pub mod recovery;
pub mod validate;

pub use mime_detect::{detect, detect_media_type, sniff_media_type};
pub use ocr::{Page, TesseractCli, TextRecognizer};
pub use preprocess::preprocess;
pub use rasterize::{PageRasterizer, PdftoppmRasterizer, RenderedPage};
pub use recovery::TextRecoveryEngine;
pub use validate::{keyword_hits, looks_like_lease};
