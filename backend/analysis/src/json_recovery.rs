//! Structured-output recovery for model responses.
//!
//! Models asked for "JSON only" still sometimes wrap it in prose or a
//! Markdown fence. Parsing is two-stage: the whole trimmed response, then the
//! first fenced block. Anything else is reported as unparseable.

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static FENCED_JSON_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").unwrap());

/// Which stage produced the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonSource {
    Strict,
    Fenced,
}

/// Parse a model response as a JSON value.
pub fn recover_json(response: &str) -> Result<(Value, JsonSource)> {
    let trimmed = response.trim();

    let strict_err = match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => return Ok((value, JsonSource::Strict)),
        Err(e) => e,
    };

    let block = fenced_json_block(trimmed)
        .ok_or_else(|| anyhow!("response is not JSON ({strict_err}) and has no fenced JSON block"))?;

    let value = serde_json::from_str(block).context("fenced JSON block is malformed")?;
    Ok((value, JsonSource::Fenced))
}

/// The object inside the first ```` ```json ```` (or bare ```` ``` ````) fence.
pub fn fenced_json_block(text: &str) -> Option<&str> {
    FENCED_JSON_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}
