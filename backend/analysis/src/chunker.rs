//! Overlapping text chunker.
//!
//! Splits recovered lease text into windows small enough for one model call,
//! preferring paragraph, line, sentence and word boundaries over hard cuts.

use tenantlens_core::TextChunk;

pub const DEFAULT_CHUNK_SIZE: usize = 2000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Split points in order of preference. The split lands just after the separator.
const SEPARATORS: &[&[&str]] = &[&["\n\n"], &["\n"], &[". ", "! ", "? "], &[" "]];

/// Split `text` into chunks of at most `chunk_size` chars, each sharing
/// `overlap` chars with its predecessor.
///
/// `overlap` is clamped below `chunk_size`, and shrinks further when a split
/// lands early enough that honoring it would stall progress.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<TextChunk> {
    if text.is_empty() {
        return Vec::new();
    }

    let chunk_size = chunk_size.max(1);
    let overlap = overlap.min(chunk_size - 1);

    // bounds[k] is the byte offset of char k; the last entry is text.len().
    let bounds: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let total = bounds.len() - 1;

    let mut chunks = Vec::new();
    let mut start = 0;
    let mut core_start = 0;

    loop {
        let window_end = (start + chunk_size).min(total);
        let end = if window_end == total {
            total
        } else {
            split_point(text, &bounds, start, window_end)
        };

        chunks.push(TextChunk {
            index: chunks.len(),
            text: text[bounds[start]..bounds[end]].to_string(),
            start: bounds[start],
            core_start: bounds[core_start],
            end: bounds[end],
        });

        if end == total {
            break;
        }

        core_start = end;
        start = end.saturating_sub(overlap).max(start + 1);
    }

    chunks
}

/// Char index just after the best separator in the second half of the window,
/// or `window_end` for a hard cut.
fn split_point(text: &str, bounds: &[usize], start: usize, window_end: usize) -> usize {
    let search_from = start + (window_end - start) / 2;
    let region = &text[bounds[search_from]..bounds[window_end]];

    for group in SEPARATORS {
        let best = group
            .iter()
            .filter_map(|sep| region.rfind(sep).map(|pos| pos + sep.len()))
            .max();
        if let Some(offset) = best {
            let byte = bounds[search_from] + offset;
            // Separators are ASCII, so `byte` is always a char boundary.
            return bounds.partition_point(|&b| b < byte);
        }
    }

    window_end
}
