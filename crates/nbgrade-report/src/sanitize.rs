//! Text cleanup for PDF output and report file names.
//!
//! The PDF uses the standard Type1 fonts, which only cover WinAnsi, so
//! feedback text loses its marker glyphs and markdown emphasis and
//! anything outside printable ASCII is replaced before it is written.

use std::sync::LazyLock;

use regex::Regex;

/// Marker glyphs used in feedback strings that carry no meaning in print.
const MARKER_GLYPHS: &[char] = &[
    '📋', '📈', '🗂', '📦', '🔍', '📚', '✅', '❌', '🔧', '💭', '📝', '👍', '⚠', '■', '▪', '▫',
    '●', '○', '\u{FE0F}', '🌟', '💪', '💡', '📄', '📊', 'ℹ',
];

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Remove marker glyphs and markdown emphasis, then collapse whitespace.
pub fn clean_text(text: &str) -> String {
    let stripped: String = text
        .chars()
        .filter(|c| !MARKER_GLYPHS.contains(c))
        .collect();
    let stripped = stripped.replace("**", "").replace('*', "");
    WHITESPACE.replace_all(&stripped, " ").trim().to_string()
}

/// Map text onto printable ASCII. Common typographic characters get an
/// ASCII stand-in; everything else becomes `?`.
pub fn pdf_safe(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            ' '..='~' => c,
            '\u{2018}' | '\u{2019}' => '\'',
            '\u{201C}' | '\u{201D}' => '"',
            '\u{2013}' | '\u{2014}' => '-',
            '\u{2022}' => '-',
            '\t' | '\n' | '\r' => ' ',
            _ => '?',
        })
        .collect()
}

/// Turn a student or assignment name into a file-system token.
///
/// Characters outside `[A-Za-z0-9_\s-]` are dropped and spaces become
/// underscores. Returns `fallback` when nothing is left.
pub fn filename_token(name: &str, fallback: &str) -> String {
    let token: String = name
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
        .map(|c| if c == ' ' { '_' } else { c })
        .filter(|c| !c.is_whitespace())
        .collect();
    if token.is_empty() {
        fallback.to_string()
    } else {
        token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_markers_and_emphasis() {
        assert_eq!(
            clean_text("✅ **Working Directory (2/2 points)**: getwd() executed"),
            "Working Directory (2/2 points): getwd() executed"
        );
        assert_eq!(clean_text("⚠️ *check*   this\n\n  out"), "check this out");
        assert_eq!(clean_text("ℹ️ Tidyverse conflicts"), "Tidyverse conflicts");
    }

    #[test]
    fn pdf_safe_replaces_non_ascii() {
        assert_eq!(pdf_safe("it\u{2019}s \u{201C}fine\u{201D}"), "it's \"fine\"");
        assert_eq!(pdf_safe("naïve 🚀"), "na?ve ?");
        assert_eq!(pdf_safe("plain (text)"), "plain (text)");
    }

    #[test]
    fn filename_tokens() {
        assert_eq!(filename_token("Ada Lovelace", "Unknown_Student"), "Ada_Lovelace");
        assert_eq!(filename_token("O'Brien, Pat", "Unknown_Student"), "OBrien_Pat");
        assert_eq!(filename_token("HW 1: Data/Import", "x"), "HW_1_DataImport");
        assert_eq!(filename_token("  ", "Unknown_Student"), "Unknown_Student");
        assert_eq!(filename_token("✅", "Unknown_Student"), "Unknown_Student");
    }
}
