//! Reflection question table.
//!
//! Everything the extractor and scorer know about the three reflection
//! questions lives here as data: indicator phrases, keyword groups, tiered
//! criteria and the fixed instructional text.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKey {
    DataTypes,
    DataQuality,
    AnalysisReadiness,
}

impl QuestionKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionKey::DataTypes => "data_types",
            QuestionKey::DataQuality => "data_quality",
            QuestionKey::AnalysisReadiness => "analysis_readiness",
        }
    }

    /// Short human label used in summaries ("Data Types").
    pub fn label(&self) -> &'static str {
        match self {
            QuestionKey::DataTypes => "Data Types",
            QuestionKey::DataQuality => "Data Quality",
            QuestionKey::AnalysisReadiness => "Analysis Readiness",
        }
    }

    pub fn question(&self) -> &'static Question {
        &QUESTIONS[*self as usize]
    }
}

impl fmt::Display for QuestionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A predicate over a lowercased response.
#[derive(Debug)]
pub enum Condition {
    /// Any of the terms appears as a substring.
    Mentions(&'static [&'static str]),
    All(&'static [Condition]),
    AnyOf(&'static [Condition]),
    /// At least this many of the question's basic keywords appear.
    KeywordCount(usize),
    /// At least this many whitespace-separated words.
    MinWords(usize),
}

/// One scoring tier: when `when` holds, award `fraction` of the question's
/// points and emit `remark`.
#[derive(Debug)]
pub struct Tier {
    pub when: Condition,
    pub fraction: f64,
    pub remark: &'static str,
}

/// A first-match list of tiers plus the hint shown when none match.
#[derive(Debug)]
pub struct Criterion {
    pub tiers: &'static [Tier],
    pub hint: Option<&'static str>,
}

#[derive(Debug)]
pub struct Question {
    pub key: QuestionKey,
    pub title: &'static str,
    pub max_points: f64,
    /// Phrases that identify a markdown section as belonging to this question.
    pub indicators: &'static [&'static str],
    /// Basic vocabulary counted by [`Condition::KeywordCount`].
    pub keywords: &'static [&'static str],
    pub criteria: &'static [Criterion],
    pub looking_for: &'static str,
    pub missing_guidance: &'static str,
}

/// Template text that marks an unanswered response.
pub const PLACEHOLDER_PHRASES: &[&str] = &[
    "write your response here",
    "your answer here",
    "add your",
    "todo",
    "write your",
    "insert your",
    "fill in",
    "complete this",
    "[write",
    "[your",
    "[add",
    "[insert",
];

pub fn is_placeholder(text: &str) -> bool {
    let lower = text.to_lowercase();
    PLACEHOLDER_PHRASES.iter().any(|p| lower.contains(p))
}

/// Words that suggest a block is an answer rather than the prompt itself.
pub const ANSWER_MARKERS: &[&str] = &[
    "because",
    "since",
    "the",
    "this",
    "these",
    "i think",
    "i believe",
    "appears",
    "seems",
];

const DATE_TERMS: &[&str] = &["date", "datetime", "time"];
const AMOUNT_TERMS: &[&str] = &["amount", "numeric", "number", "currency", "dollar"];
const APPROPRIATE_TERMS: &[&str] = &["appropriate", "suitable", "good", "bad", "better", "should"];
const BUSINESS_TERMS: &[&str] = &["business", "analytics", "analysis", "calculation", "report"];

const MISSING_TERMS: &[&str] = &["missing", "null", "na", "blank", "empty"];
const PATTERN_TERMS: &[&str] = &["pattern", "unusual", "strange", "consistent", "inconsistent"];
const SPECIFIC_ISSUE_TERMS: &[&str] = &["duplicate", "outlier", "error", "format", "spelling"];
const IMPACT_TERMS: &[&str] = &["impact", "affect", "problem", "issue", "concern"];
const ANALYTIC_TERMS: &[&str] = &["analysis", "problem", "issue", "affect"];

const COMPARE_TERMS: &[&str] = &["compare", "versus", "vs", "between", "different"];
const REASONING_TERMS: &[&str] = &["because", "since", "due to", "reason", "therefore"];
const DATASET_TERMS: &[&str] = &["sales", "rating", "comment", "dataset"];
const PREPROCESSING_TERMS: &[&str] = &["clean", "prepare", "process", "transform", "fix"];
const STEP_TERMS: &[&str] = &["first", "next", "then", "step", "need to"];
const PREP_TERMS: &[&str] = &["clean", "fix", "prepare", "ready"];

pub static QUESTIONS: &[Question] = &[
    Question {
        key: QuestionKey::DataTypes,
        title: "Data Types Analysis",
        max_points: 4.0,
        indicators: &[
            "data type",
            "date",
            "amount",
            "column",
            "appropriate",
            "business analytics",
        ],
        keywords: &[
            "data type",
            "date",
            "amount",
            "character",
            "numeric",
            "integer",
            "appropriate",
            "business",
            "analytics",
        ],
        criteria: &[
            Criterion {
                tiers: &[
                    Tier {
                        when: Condition::All(&[
                            Condition::Mentions(DATE_TERMS),
                            Condition::Mentions(AMOUNT_TERMS),
                        ]),
                        fraction: 0.40,
                        remark: "✅ Great - you identified both Date and Amount columns",
                    },
                    Tier {
                        when: Condition::AnyOf(&[
                            Condition::Mentions(DATE_TERMS),
                            Condition::Mentions(AMOUNT_TERMS),
                        ]),
                        fraction: 0.25,
                        remark: "👍 Good start - you mentioned data types, but try to discuss both Date and Amount columns",
                    },
                    Tier {
                        when: Condition::KeywordCount(1),
                        fraction: 0.15,
                        remark: "👍 You're thinking about data types - now focus on the specific Date and Amount columns",
                    },
                ],
                hint: Some("💡 Focus on the Date and Amount columns from sales_df - what data types are they?"),
            },
            Criterion {
                tiers: &[
                    Tier {
                        when: Condition::All(&[
                            Condition::Mentions(APPROPRIATE_TERMS),
                            Condition::Mentions(BUSINESS_TERMS),
                        ]),
                        fraction: 0.40,
                        remark: "✅ Excellent - you connected data types to business analytics!",
                    },
                    Tier {
                        when: Condition::Mentions(APPROPRIATE_TERMS),
                        fraction: 0.30,
                        remark: "✅ Good thinking about appropriateness - try connecting this to business needs",
                    },
                    Tier {
                        when: Condition::Mentions(BUSINESS_TERMS),
                        fraction: 0.20,
                        remark: "👍 Nice business context - now discuss if the data types support your analysis goals",
                    },
                ],
                hint: Some("💡 Think about this: can you do math with these data types? Can you sort dates chronologically?"),
            },
            Criterion {
                tiers: &[
                    Tier {
                        when: Condition::MinWords(40),
                        fraction: 0.20,
                        remark: "✅ Good detail in your response",
                    },
                    Tier {
                        when: Condition::MinWords(20),
                        fraction: 0.15,
                        remark: "👍 Nice effort - you could expand a bit more",
                    },
                    Tier {
                        when: Condition::MinWords(10),
                        fraction: 0.10,
                        remark: "👍 You answered the question - try adding more detail next time",
                    },
                ],
                hint: None,
            },
        ],
        looking_for: "**What I'm looking for:** Data types matter more than you might think. If your dates are stored as text (\"2023-01-15\"), you can't calculate time differences or trends. If amounts have dollar signs (\"$1,234.56\"), you can't do math with them.\n\nWhen I see dates stored properly as date objects, I know you can calculate things like \"days between orders\" or \"monthly sales patterns.\" When amounts are numeric (1234.56), you can sum, average, and analyze them.\n\nThis isn't just technical nitpicking - it's about what analysis you can actually do with your data. Check this first, always. It'll save you headaches later.",
        missing_guidance: "**What you should address:** Look at your `str()` output for sales_df. What data type is the Date column? What about Amount? Are these appropriate for business calculations? For example, if dates are stored as text, you can't easily calculate \"days between\" or group by month. If amounts have dollar signs, you can't sum them up. Think about what analyses you'd want to do and whether the current data types support that.",
    },
    Question {
        key: QuestionKey::DataQuality,
        title: "Data Quality Assessment",
        max_points: 4.0,
        indicators: &[
            "data quality",
            "quality",
            "missing",
            "issue",
            "problem",
            "unusual",
            "pattern",
        ],
        keywords: &[
            "missing", "quality", "unusual", "pattern", "issue", "problem", "clean", "null", "na",
        ],
        criteria: &[
            Criterion {
                tiers: &[
                    Tier {
                        when: Condition::All(&[
                            Condition::Mentions(MISSING_TERMS),
                            Condition::AnyOf(&[
                                Condition::Mentions(PATTERN_TERMS),
                                Condition::Mentions(SPECIFIC_ISSUE_TERMS),
                            ]),
                        ]),
                        fraction: 0.50,
                        remark: "✅ Excellent - you identified multiple types of data quality issues",
                    },
                    Tier {
                        when: Condition::AnyOf(&[
                            Condition::Mentions(MISSING_TERMS),
                            Condition::Mentions(PATTERN_TERMS),
                            Condition::Mentions(SPECIFIC_ISSUE_TERMS),
                        ]),
                        fraction: 0.35,
                        remark: "✅ Good job identifying quality issues",
                    },
                    Tier {
                        when: Condition::KeywordCount(1),
                        fraction: 0.20,
                        remark: "👍 You're thinking about data quality - try to be more specific about what issues you see",
                    },
                ],
                hint: Some("💡 Look at your data outputs - do you see any missing values (NA's) or unusual patterns?"),
            },
            Criterion {
                tiers: &[
                    Tier {
                        when: Condition::Mentions(IMPACT_TERMS),
                        fraction: 0.30,
                        remark: "✅ Great analytical thinking about impact on analysis",
                    },
                    Tier {
                        when: Condition::Mentions(ANALYTIC_TERMS),
                        fraction: 0.20,
                        remark: "👍 You're thinking analytically - expand on how these issues affect analysis",
                    },
                ],
                hint: Some("💡 Think about this: how would missing data or errors affect your business conclusions?"),
            },
            Criterion {
                tiers: &[
                    Tier {
                        when: Condition::MinWords(30),
                        fraction: 0.20,
                        remark: "✅ Good detail in your assessment",
                    },
                    Tier {
                        when: Condition::MinWords(15),
                        fraction: 0.15,
                        remark: "👍 Nice response - you could add more specific examples",
                    },
                    Tier {
                        when: Condition::MinWords(8),
                        fraction: 0.10,
                        remark: "👍 You addressed the question - try expanding your observations",
                    },
                ],
                hint: None,
            },
        ],
        looking_for: "**What I'm looking for:** Look for problems that will mess up your analysis. Missing values can throw off your totals. Inconsistent formatting (like \"North\" vs \"NORTH\" vs \"north\") will split your data when you try to group it.\n\nWatch for things that don't make business sense - negative sales amounts, future dates, or someone buying 999,999 keyboards (probably a data entry error).\n\nI also want to see you think about impact. If 5% of values are missing, that's different from 50% missing. If you have weird outliers, will they skew your averages?\n\nThis isn't busy work - bad data leads to bad decisions. Spend time here and your analysis will be much more reliable.",
        missing_guidance: "**What you should address:** Look at your `summary()` and `head()` outputs. Do you see any missing values (NA's)? Any unusual patterns in the data? Are there inconsistencies in how things are formatted? For example, are company names spelled consistently? Do the numbers look reasonable? Think about what might cause problems if you tried to analyze this data.",
    },
    Question {
        key: QuestionKey::AnalysisReadiness,
        title: "Analysis Readiness",
        max_points: 4.5,
        indicators: &[
            "analysis readiness",
            "ready",
            "preprocessing",
            "prepare",
            "dataset",
            "most ready",
        ],
        keywords: &[
            "ready",
            "analysis",
            "preprocessing",
            "prepare",
            "clean",
            "dataset",
            "transform",
        ],
        criteria: &[
            Criterion {
                tiers: &[
                    Tier {
                        when: Condition::All(&[
                            Condition::Mentions(COMPARE_TERMS),
                            Condition::Mentions(REASONING_TERMS),
                        ]),
                        fraction: 0.45,
                        remark: "✅ Excellent - you compared datasets and explained your reasoning",
                    },
                    Tier {
                        when: Condition::Mentions(COMPARE_TERMS),
                        fraction: 0.30,
                        remark: "✅ Good job comparing datasets - try explaining WHY one is more ready",
                    },
                    Tier {
                        when: Condition::Mentions(DATASET_TERMS),
                        fraction: 0.20,
                        remark: "👍 You mentioned the datasets - now compare which is most ready for analysis",
                    },
                ],
                hint: Some("💡 Compare the three datasets (sales_df, ratings_df, comments_df) - which looks cleanest?"),
            },
            Criterion {
                tiers: &[
                    Tier {
                        when: Condition::All(&[
                            Condition::Mentions(PREPROCESSING_TERMS),
                            Condition::Mentions(STEP_TERMS),
                        ]),
                        fraction: 0.35,
                        remark: "✅ Excellent understanding of data preparation needs",
                    },
                    Tier {
                        when: Condition::Mentions(PREPROCESSING_TERMS),
                        fraction: 0.25,
                        remark: "✅ Good - you understand data needs preparation",
                    },
                    Tier {
                        when: Condition::Mentions(PREP_TERMS),
                        fraction: 0.15,
                        remark: "👍 You're thinking about data preparation - what specific steps are needed?",
                    },
                ],
                hint: Some("💡 Think about what you'd need to do to make the messiest dataset analysis-ready"),
            },
            Criterion {
                tiers: &[
                    Tier {
                        when: Condition::MinWords(40),
                        fraction: 0.20,
                        remark: "✅ Thoughtful and detailed response",
                    },
                    Tier {
                        when: Condition::MinWords(20),
                        fraction: 0.15,
                        remark: "✅ Good effort - nice reasoning",
                    },
                    Tier {
                        when: Condition::MinWords(10),
                        fraction: 0.10,
                        remark: "👍 You answered thoughtfully - could expand a bit more",
                    },
                ],
                hint: None,
            },
        ],
        looking_for: "**What I'm looking for:** Compare the datasets and tell me which one you'd start analyzing first. Think practically - which has fewer missing values? Which has cleaner, more consistent formatting? Which one can answer your most important business questions?\n\nFor example, if your sales data is mostly complete but your feedback data has lots of gaps and messy text, you'd probably start with sales data to get quick insights, then clean up the feedback data later.\n\nIn real work, you rarely get perfect data. You have to prioritize where to spend your time. Show me you can think strategically about this - it's a key skill.",
        missing_guidance: "**What you should address:** Compare all three datasets (sales_df, ratings_df, comments_df). Which one looks cleanest and most ready to analyze right away? Which one would need the most work before you could use it? Consider factors like missing data, consistent formatting, appropriate data types, and overall organization. Explain your reasoning!",
    },
];

/// Closing paragraph for the reflection element, picked by percentage.
pub fn reflection_overview(percentage: f64) -> &'static str {
    if percentage >= 85.0 {
        "🌟 **Overall Reflection Quality: Excellent!** Your responses show strong analytical thinking and good understanding of data management concepts. You're thinking like a business analyst should - considering practical implications and being thorough in your observations. Keep up this level of critical thinking!"
    } else if percentage >= 70.0 {
        "👍 **Overall Reflection Quality: Good!** You're on the right track with your analytical thinking. Your responses show you understand the key concepts, but there's room to go deeper. Try to connect your observations more explicitly to business implications and provide more specific examples from the data."
    } else if percentage >= 50.0 {
        "📈 **Overall Reflection Quality: Developing** You're starting to think analytically about data, which is great! To improve, focus on being more specific in your observations and explaining the \"why\" behind your assessments. What would these data issues mean for a real business trying to make decisions?"
    } else {
        "💡 **Overall Reflection Quality: Needs Development** The reflection questions are where you really develop your analytical thinking skills. Take more time with these - they're not just busy work! Look carefully at your data outputs, think about what you observe, and explain your reasoning. This kind of thinking is what separates good analysts from great ones."
    }
}
