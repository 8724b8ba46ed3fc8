use std::sync::OnceLock;

use regex::Regex;

use super::DiffGranularity;

/// Split `text` into diff tokens. Concatenating the tokens yields `text`.
///
/// Word granularity alternates whitespace runs and non-whitespace runs, so
/// spacing changes show up as their own tokens instead of sticking to words.
pub fn tokenize(text: &str, granularity: DiffGranularity) -> Vec<&str> {
    match granularity {
        DiffGranularity::Word => {
            static TOKEN_REGEX: OnceLock<Regex> = OnceLock::new();
            let token_regex =
                TOKEN_REGEX.get_or_init(|| Regex::new(r"\s+|\S+").expect("Invalid token regex"));
            token_regex.find_iter(text).map(|m| m.as_str()).collect()
        }
        DiffGranularity::Character => text
            .char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect(),
    }
}
