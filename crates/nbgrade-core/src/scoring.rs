//! Reflection response scoring.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::questions::{is_placeholder, Condition, Question};

/// Quality label attached to a scored (or missing) response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualityLabel {
    Excellent,
    Good,
    Satisfactory,
    #[serde(rename = "Needs Improvement")]
    NeedsImprovement,
    Incomplete,
    Missing,
}

impl QualityLabel {
    pub fn from_fraction(fraction: f64) -> Self {
        if fraction >= 0.9 {
            QualityLabel::Excellent
        } else if fraction >= 0.7 {
            QualityLabel::Good
        } else if fraction >= 0.5 {
            QualityLabel::Satisfactory
        } else {
            QualityLabel::NeedsImprovement
        }
    }
}

impl fmt::Display for QualityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QualityLabel::Excellent => "Excellent",
            QualityLabel::Good => "Good",
            QualityLabel::Satisfactory => "Satisfactory",
            QualityLabel::NeedsImprovement => "Needs Improvement",
            QualityLabel::Incomplete => "Incomplete",
            QualityLabel::Missing => "Missing",
        };
        f.write_str(s)
    }
}

pub const PLACEHOLDER_SCORE: f64 = 0.5;
pub const PLACEHOLDER_FEEDBACK: &str = "⚠️ Please replace the placeholder text with your own analysis.";

/// Result of scoring a single response.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredResponse {
    pub score: f64,
    pub quality: QualityLabel,
    /// Tier remarks and hints in criterion order.
    pub remarks: Vec<String>,
    /// Remarks joined with the question's instructional paragraph.
    pub feedback: String,
}

/// A scored response as stored in the analysis result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionResponse {
    /// The response, shortened for display.
    pub extracted_text: String,
    pub quality: QualityLabel,
    pub score: f64,
    pub max_score: f64,
    pub feedback: String,
    #[serde(default)]
    pub remarks: Vec<String>,
}

/// Score a response against the question's criteria.
pub fn score_response(question: &Question, response: &str) -> ScoredResponse {
    if is_placeholder(response) {
        return ScoredResponse {
            score: PLACEHOLDER_SCORE,
            quality: QualityLabel::Incomplete,
            remarks: vec![PLACEHOLDER_FEEDBACK.to_string()],
            feedback: PLACEHOLDER_FEEDBACK.to_string(),
        };
    }

    let probe = Probe::new(question, response);
    let mut score = 0.0;
    let mut remarks = Vec::new();

    for criterion in question.criteria {
        match criterion.tiers.iter().find(|t| probe.holds(&t.when)) {
            Some(tier) => {
                score += question.max_points * tier.fraction;
                remarks.push(tier.remark.to_string());
            }
            None => {
                if let Some(hint) = criterion.hint {
                    remarks.push(hint.to_string());
                }
            }
        }
    }

    let score = score.min(question.max_points);
    let quality = QualityLabel::from_fraction(score / question.max_points);
    let feedback = format!("{}\n\n{}", remarks.join(" | "), question.looking_for);

    ScoredResponse {
        score,
        quality,
        remarks,
        feedback,
    }
}

/// Precomputed views of a response used to evaluate conditions.
struct Probe<'a> {
    lower: String,
    words: usize,
    question: &'a Question,
}

impl<'a> Probe<'a> {
    fn new(question: &'a Question, response: &str) -> Self {
        Self {
            lower: response.to_lowercase(),
            words: response.split_whitespace().count(),
            question,
        }
    }

    fn holds(&self, cond: &Condition) -> bool {
        match cond {
            Condition::Mentions(terms) => terms.iter().any(|t| self.lower.contains(t)),
            Condition::All(parts) => parts.iter().all(|c| self.holds(c)),
            Condition::AnyOf(parts) => parts.iter().any(|c| self.holds(c)),
            Condition::KeywordCount(n) => {
                self.question
                    .keywords
                    .iter()
                    .filter(|k| self.lower.contains(*k))
                    .count()
                    >= *n
            }
            Condition::MinWords(n) => self.words >= *n,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::questions::QuestionKey;

    #[test]
    fn placeholder_scores_half_point() {
        let q = QuestionKey::DataTypes.question();
        let scored = score_response(q, "[Your answer here] about the date column");
        assert_eq!(scored.score, 0.5);
        assert_eq!(scored.quality, QualityLabel::Incomplete);
        assert_eq!(scored.feedback, PLACEHOLDER_FEEDBACK);
    }

    #[test]
    fn full_data_types_answer() {
        let q = QuestionKey::DataTypes.question();
        let response = "The Date column is stored as character text, which is not appropriate because we cannot sort it \
            chronologically or compute the days between orders. The Amount column is numeric, which is good for \
            business analytics since we can sum and average it for any sales report or calculation we need to run.";
        let scored = score_response(q, response);
        assert!((scored.score - 4.0).abs() < 1e-9);
        assert_eq!(scored.quality, QualityLabel::Excellent);
        assert_eq!(scored.remarks.len(), 3);
        assert!(scored.feedback.contains("What I'm looking for"));
    }

    #[test]
    fn hints_when_nothing_matches() {
        let q = QuestionKey::DataTypes.question();
        let scored = score_response(q, "I did the homework and it was fine.");
        assert_eq!(scored.score, 0.0);
        assert_eq!(scored.quality, QualityLabel::NeedsImprovement);
        assert!(scored.remarks[0].starts_with("💡 Focus on the Date"));
        assert!(scored.remarks[1].starts_with("💡 Think about this"));
        // Effort has no hint.
        assert_eq!(scored.remarks.len(), 2);
    }

    #[test]
    fn partial_quality_answer() {
        let q = QuestionKey::DataQuality.question();
        // missing only: 0.35; no impact words: hint; 8 words: 0.10
        let scored = score_response(q, "Several rows have blank values in the Region field");
        assert!((scored.score - 4.0 * 0.45).abs() < 1e-9);
        assert_eq!(scored.quality, QualityLabel::NeedsImprovement);
    }

    #[test]
    fn score_never_exceeds_max() {
        for q in crate::questions::QUESTIONS {
            let text = "compare because clean first missing pattern impact date amount appropriate business ".repeat(10);
            let scored = score_response(q, &text);
            assert!(scored.score <= q.max_points);
        }
    }

    #[test]
    fn quality_label_serde() {
        let json = serde_json::to_string(&QualityLabel::NeedsImprovement).unwrap();
        assert_eq!(json, "\"Needs Improvement\"");
    }
}
