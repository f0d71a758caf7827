//! Reflection response extraction.
//!
//! Markdown is split into heading sections. A section answers every
//! unclaimed question whose indicators it mentions often enough; the answer
//! is cut out of it with a small list of introduction patterns. Anything
//! still unresolved goes through a coarser block scan.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::questions::{is_placeholder, QuestionKey, ANSWER_MARKERS, QUESTIONS};

/// Indicator overlap a section needs before it is considered.
const MIN_SECTION_MATCHES: usize = 2;
/// Shortest cleaned answer accepted from a section.
const MIN_ANSWER_LEN: usize = 15;
const MIN_BLOCK_LEN: usize = 20;
const MIN_FALLBACK_LEN: usize = 30;

static SECTION_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)(?:^|\n)#{1,4}\s+").expect("section split pattern"));

static BLOCK_SPLIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\n\s*\n|\*\*.*?\*\*|#{1,4}").expect("block split pattern")
});

/// Prefixes that introduce an answer. The answer runs from the end of the
/// match to the first terminator.
static ANSWER_INTROS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?is)answer[:\s]+",
        r"(?is)response[:\s]+",
        r"(?is)your answer[:\s]+",
        r"(?is)\[.*?\]",
        r"(?is)(?:question \d+|analysis|assessment).*?\n\n",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("answer intro pattern"))
    .collect()
});

static LEADING_BRACKET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^\[.*?\]").expect("bracket pattern"));

const TERMINATORS: &[&str] = &["\n\n", "**", "###"];

/// Extracted responses keyed by question, in full (untruncated) form.
pub type Responses = BTreeMap<QuestionKey, String>;

/// Extract reflection responses from concatenated markdown.
pub fn extract_responses(markdown: &str) -> Responses {
    let mut responses = Responses::new();

    for section in SECTION_SPLIT.split(markdown) {
        let lower = section.to_lowercase();
        // Cut at most once per section.
        let mut answer: Option<Option<String>> = None;

        for q in QUESTIONS {
            if responses.contains_key(&q.key)
                || count_matches(&lower, q.indicators) < MIN_SECTION_MATCHES
            {
                continue;
            }
            if let Some(text) = answer.get_or_insert_with(|| find_answer(section)) {
                tracing::debug!(question = %q.key, "response found in section");
                responses.insert(q.key, text.clone());
            }
        }
    }

    if responses.len() < QUESTIONS.len() {
        fallback_blocks(markdown, &mut responses);
    }

    responses
}

fn count_matches(lower: &str, phrases: &[&str]) -> usize {
    phrases.iter().filter(|p| lower.contains(*p)).count()
}

/// Try each introduction pattern in order; the first valid answer wins.
fn find_answer(section: &str) -> Option<String> {
    ANSWER_INTROS.iter().find_map(|intro| {
        let m = intro.find(section)?;
        let answer = clean_answer(cut_at_terminator(&section[m.end()..]));
        is_valid_answer(&answer).then_some(answer)
    })
}

fn cut_at_terminator(text: &str) -> &str {
    let end = TERMINATORS
        .iter()
        .filter_map(|t| text.find(t))
        .min()
        .unwrap_or(text.len());
    &text[..end]
}

fn clean_answer(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_bracket = LEADING_BRACKET.replace(trimmed, "");
    without_bracket
        .trim()
        .trim_start_matches(|c: char| c == ':' || c == '-' || c.is_whitespace())
        .trim()
        .to_string()
}

fn is_valid_answer(answer: &str) -> bool {
    answer.chars().count() > MIN_ANSWER_LEN && !is_placeholder(answer)
}

fn fallback_blocks(markdown: &str, responses: &mut Responses) {
    for block in BLOCK_SPLIT.split(markdown) {
        let block = block.trim();
        if block.chars().count() < MIN_BLOCK_LEN || is_placeholder(block) {
            continue;
        }

        let lower = block.to_lowercase();
        let looks_like_answer = block.chars().count() > MIN_FALLBACK_LEN
            && ANSWER_MARKERS.iter().any(|m| lower.contains(m));
        if !looks_like_answer {
            continue;
        }

        for q in QUESTIONS {
            if !responses.contains_key(&q.key) && count_matches(&lower, q.indicators) >= 1 {
                tracing::debug!(question = %q.key, "response found by block scan");
                responses.insert(q.key, block.to_string());
            }
        }
    }
}

/// Shorten a response for display, keeping the first 200 characters.
pub fn truncate_response(text: &str) -> String {
    const LIMIT: usize = 200;
    if text.chars().count() > LIMIT {
        let head: String = text.chars().take(LIMIT).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}
