//! Normalization of stored feedback into an [`AnalysisResult`].
//!
//! Older records kept only the flat list of feedback strings. Those are
//! scraped once, here, so the renderer only ever sees the structured form.

use std::sync::LazyLock;

use regex::Regex;

use nbgrade_core::aggregate::AnalysisResult;
use nbgrade_core::questions::QuestionKey;
use nbgrade_core::report::FeedbackRecord;
use nbgrade_core::rubric::{ElementKey, TOTAL_POINTS};
use nbgrade_core::scoring::{QualityLabel, QuestionResponse};

static ELEMENT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[^A-Za-z0-9*]*\*\*(Working Directory|Package Loading|CSV Import|Excel Import|Data Inspection|Reflection Questions)\s*\((\d+(?:\.\d+)?)/(\d+(?:\.\d+)?) points\)",
    )
    .expect("valid element regex")
});

static FINAL_SCORE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Final Score:\s*(\d+(?:\.\d+)?)\s*/\s*(\d+(?:\.\d+)?)\s*points")
        .expect("valid final score regex")
});

static QUESTION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(Data Types|Data Quality|Analysis Readiness):\s*(Excellent|Good|Satisfactory|Needs Improvement|Incomplete|Missing)\s*\((\d+(?:\.\d+)?)/(\d+(?:\.\d+)?) points\)",
    )
    .expect("valid question regex")
});

static HEADLINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\*\*(Excellent Work!|Good Job!|Nice Progress!|Keep Working!|Let's Regroup)\*\*")
        .expect("valid headline regex")
});

/// Resolve any stored feedback shape to an analysis.
pub fn resolve(record: FeedbackRecord) -> AnalysisResult {
    match record {
        FeedbackRecord::Record(record) => record.analysis,
        FeedbackRecord::Structured(analysis) => *analysis,
        FeedbackRecord::Legacy(lines) => normalize_legacy(&lines),
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Section {
    Breakdown,
    Missing,
    Issues,
    Reflection,
    Other,
}

/// Rebuild an analysis from the flat list-of-strings form.
pub fn normalize_legacy(lines: &[String]) -> AnalysisResult {
    let mut result = AnalysisResult::default();
    let mut final_score: Option<(f64, f64)> = None;
    let mut section = Section::Other;

    for line in lines {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if section != Section::Breakdown {
                section = Section::Other;
            }
            continue;
        }

        match trimmed {
            "**DETAILED BREAKDOWN:**" => {
                section = Section::Breakdown;
                continue;
            }
            "**MISSING ELEMENTS:**" => {
                section = Section::Missing;
                continue;
            }
            "**CODE ISSUES TO FIX:**" => {
                section = Section::Issues;
                continue;
            }
            "**REFLECTION QUESTIONS ANALYSIS:**" => {
                section = Section::Reflection;
                continue;
            }
            _ => {}
        }

        if let Some(caps) = FINAL_SCORE.captures(trimmed) {
            final_score = Some((parse_num(&caps[1]), parse_num(&caps[2])));
            continue;
        }

        if let Some(caps) = ELEMENT_LINE.captures(trimmed) {
            if let Some(key) = element_key(&caps[1]) {
                result.element_scores.insert(key, parse_num(&caps[2]));
                result.detailed_feedback.push(line.clone());
            }
            continue;
        }

        if HEADLINE.is_match(trimmed) {
            result.overall_assessment = line.clone();
            continue;
        }

        let item = strip_bullet(trimmed);

        if item.contains("ERROR:") {
            push_unique(&mut result.code_issues, item);
            continue;
        }

        if let Some(caps) = QUESTION_LINE.captures(item) {
            if let Some(key) = question_key(&caps[1]) {
                result.question_analysis.insert(
                    key,
                    QuestionResponse {
                        extracted_text: String::new(),
                        quality: quality_label(&caps[2]),
                        score: parse_num(&caps[3]),
                        max_score: parse_num(&caps[4]),
                        feedback: String::new(),
                        remarks: Vec::new(),
                    },
                );
            }
            continue;
        }

        match section {
            Section::Missing => push_unique(&mut result.missing_elements, item),
            Section::Issues => push_unique(&mut result.code_issues, item),
            Section::Breakdown => result.notes.push(line.clone()),
            Section::Reflection | Section::Other => {}
        }
    }

    result.total_score = if result.element_scores.is_empty() {
        final_score.map(|(total, _)| total).unwrap_or(0.0)
    } else {
        result.element_scores.values().sum()
    };
    result.max_score = final_score
        .map(|(_, max)| max)
        .filter(|max| *max > 0.0)
        .unwrap_or(TOTAL_POINTS);

    tracing::debug!(
        elements = result.element_scores.len(),
        issues = result.code_issues.len(),
        "legacy feedback normalized"
    );
    result
}

fn element_key(title: &str) -> Option<ElementKey> {
    nbgrade_core::rubric::RUBRIC
        .iter()
        .find(|el| el.title == title)
        .map(|el| el.key)
}

fn question_key(label: &str) -> Option<QuestionKey> {
    [
        QuestionKey::DataTypes,
        QuestionKey::DataQuality,
        QuestionKey::AnalysisReadiness,
    ]
    .into_iter()
    .find(|k| k.label() == label)
}

fn quality_label(s: &str) -> QualityLabel {
    match s {
        "Excellent" => QualityLabel::Excellent,
        "Good" => QualityLabel::Good,
        "Satisfactory" => QualityLabel::Satisfactory,
        "Needs Improvement" => QualityLabel::NeedsImprovement,
        "Incomplete" => QualityLabel::Incomplete,
        _ => QualityLabel::Missing,
    }
}

fn strip_bullet(s: &str) -> &str {
    s.trim_start_matches(['•', '-', '*', ' ']).trim()
}

fn push_unique(list: &mut Vec<String>, item: &str) {
    if !item.is_empty() && !list.iter().any(|existing| existing == item) {
        list.push(item.to_string());
    }
}

fn parse_num(s: &str) -> f64 {
    s.parse().unwrap_or(0.0)
}
