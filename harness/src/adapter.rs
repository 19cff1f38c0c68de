//! Parsing of the client's textual output.
//!
//! The external client prints for humans, not machines: mapping queries
//! echo context around the value and executions render output records as
//! bullet-pointed plaintext blocks. Everything that knows about that shape
//! lives here, so the drivers stay format-agnostic.

use std::sync::OnceLock;

use regex::Regex;

use leodev_common::error::HarnessError;

fn numeric_literal() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([0-9]+)u[0-9]+").expect("hard-coded pattern"))
}

fn record_block() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)•\s*\{\n.*?\n\}").expect("hard-coded pattern"))
}

/// Extract the numeric value from a mapping-query output.
///
/// Empty and `null` outputs read as 0 (the mapping has no entry for the
/// key). Otherwise the value is the last `<digits>u<width>` literal in the
/// text, because the client echoes the queried key ahead of the value.
/// Non-empty output without any literal is unexpected and an error.
pub fn parse_numeric_plaintext(text: &str) -> Result<u128, HarnessError> {
    if text.trim().is_empty() || text.contains("null") {
        return Ok(0);
    }

    let last = numeric_literal()
        .captures_iter(text)
        .last()
        .ok_or_else(|| HarnessError::UnexpectedOutput {
            output: text.to_string(),
        })?;
    last[1]
        .parse::<u128>()
        .map_err(|_| HarnessError::UnexpectedOutput {
            output: text.to_string(),
        })
}

/// Pull the emitted record plaintexts out of an execution's stdout.
///
/// Records are the `• { ... }` blocks carrying `_nonce:` and `_version:`
/// fields; other bullet blocks (futures, plain outputs) are skipped. The
/// returned strings are ready to feed back into a transition as inputs.
pub fn extract_record_plaintexts(stdout: &str) -> Vec<String> {
    record_block()
        .find_iter(stdout)
        .map(|block| block.as_str().trim_start_matches('•').trim().to_string())
        .filter(|block| block.contains("_nonce:") && block.contains("_version:"))
        .collect()
}
