//! Message input: hex text from the command line or raw bytes from a file

use anyhow::{bail, Context, Result};
use std::path::Path;

/// Decode hex, ignoring whitespace, `:` separators and a leading `0x`
pub fn parse_hex(text: &str) -> Result<Vec<u8>> {
    let trimmed = text.trim();
    let trimmed = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let digits: String = trimmed
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':')
        .collect();
    if digits.is_empty() {
        bail!("empty message");
    }
    hex::decode(&digits).with_context(|| format!("invalid hex message {text:?}"))
}

/// Raw bytes; a `.hex` file is read as hex text instead
pub fn read_message(path: &Path) -> Result<Vec<u8>> {
    if path.extension().and_then(|e| e.to_str()) == Some("hex") {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        return parse_hex(&text);
    }
    std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}
