//! Variant-token configuration.
//!
//! The active variant set starts from the built-in list or a token file and
//! can be extended with extra words from the command line.

use anyhow::{Context, Result};
use std::path::Path;

use crate::normalize::VariantTokens;

/// Parse a token list: one token per line, `#` starts a comment, blank
/// lines are ignored.
pub fn parse_token_list(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.split('#').next().unwrap_or("").trim())
        .filter(|line| !line.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Split a comma-separated list like "rusty, worn,old".
pub fn parse_token_csv(list: &str) -> Vec<String> {
    list.split(',')
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Build the active variant set.
///
/// `token_file` replaces the built-in set; `extra` is added on top of
/// whichever base set is in effect.
pub fn load_variant_tokens(token_file: Option<&Path>, extra: Option<&str>) -> Result<VariantTokens> {
    let mut tokens = match token_file {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read variant token file {:?}", path))?;
            VariantTokens::from_tokens(parse_token_list(&text))
        }
        None => VariantTokens::builtin(),
    };
    if let Some(list) = extra {
        tokens.extend(parse_token_csv(list));
    }
    Ok(tokens)
}
