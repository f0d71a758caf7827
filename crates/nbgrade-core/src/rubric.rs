//! The static grading rubric.
//!
//! Six elements, each with a point ceiling, a recommendation threshold and
//! the rule the analyzer applies. The table order is the order elements are
//! scored, reported and recommended.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies a rubric element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKey {
    WorkingDirectory,
    PackageLoading,
    CsvImport,
    ExcelImport,
    DataInspection,
    ReflectionQuestions,
}

impl ElementKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKey::WorkingDirectory => "working_directory",
            ElementKey::PackageLoading => "package_loading",
            ElementKey::CsvImport => "csv_import",
            ElementKey::ExcelImport => "excel_import",
            ElementKey::DataInspection => "data_inspection",
            ElementKey::ReflectionQuestions => "reflection_questions",
        }
    }

    /// The rubric entry for this key.
    pub fn element(&self) -> &'static RubricElement {
        // RUBRIC is laid out in declaration order of the enum.
        &RUBRIC[*self as usize]
    }
}

impl fmt::Display for ElementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A variable that must be assigned from a reader call.
#[derive(Debug)]
pub struct ImportCheck {
    pub variable: &'static str,
    pub function: &'static str,
    pub points: f64,
    /// Expected file name and the bonus for naming it.
    pub file: Option<(&'static str, f64)>,
}

/// How an element is scored.
#[derive(Debug)]
pub enum ScoringRule {
    /// A single call whose first occurrence must have run and shown output.
    CallWithOutput {
        pattern: &'static str,
        call: &'static str,
    },
    /// `library(<pkg>)` for each package, in order.
    PackageLoads {
        packages: &'static [&'static str],
        points_each: f64,
    },
    /// Variable/reader pairs anywhere in the code.
    DataImport { imports: &'static [ImportCheck] },
    /// Inspection calls plus per-dataset coverage.
    Inspection {
        functions: &'static [&'static str],
        datasets: &'static [&'static str],
    },
    /// Free-text reflection answers scored by the question table.
    Reflection,
}

/// Recommendation text emitted when the element scores below `below`.
#[derive(Debug)]
pub struct Recommendation {
    pub below: f64,
    pub text: &'static str,
}

#[derive(Debug)]
pub struct RubricElement {
    pub key: ElementKey,
    pub title: &'static str,
    pub description: &'static str,
    pub max_points: f64,
    pub recommend_below: f64,
    /// Candidate recommendations; the first whose `below` exceeds the score wins.
    pub recommendations: &'static [Recommendation],
    pub rule: ScoringRule,
}

impl RubricElement {
    /// The recommendation for `score`, if the element fell short.
    pub fn recommendation_for(&self, score: f64) -> Option<&'static str> {
        if score >= self.recommend_below {
            return None;
        }
        self.recommendations
            .iter()
            .find(|r| score < r.below)
            .map(|r| r.text)
    }
}

pub const TOTAL_POINTS: f64 = 37.5;

pub static RUBRIC: &[RubricElement] = &[
    RubricElement {
        key: ElementKey::WorkingDirectory,
        title: "Working Directory",
        description: "Check current working directory",
        max_points: 2.0,
        recommend_below: 2.0,
        recommendations: &[Recommendation {
            below: 2.0,
            text: "**Working Directory:** Run your `getwd()` command and make sure you can see the output. You need to know where R is looking for your files.",
        }],
        rule: ScoringRule::CallWithOutput {
            pattern: r"getwd\s*\(",
            call: "getwd()",
        },
    },
    RubricElement {
        key: ElementKey::PackageLoading,
        title: "Package Loading",
        description: "Load required packages",
        max_points: 4.0,
        recommend_below: 4.0,
        recommendations: &[Recommendation {
            below: 4.0,
            text: "**Package Loading:** Check that both `tidyverse` and `readxl` load without errors. If you get error messages, you might need to install them first.",
        }],
        rule: ScoringRule::PackageLoads {
            packages: &["tidyverse", "readxl"],
            points_each: 2.0,
        },
    },
    RubricElement {
        key: ElementKey::CsvImport,
        title: "CSV Import",
        description: "Import CSV data into sales_df",
        max_points: 5.0,
        recommend_below: 5.0,
        recommendations: &[Recommendation {
            below: 5.0,
            text: "**CSV Import:** Make sure sales_df loads successfully with `read_csv()`. Pay attention to the file path - the file is `data/sales_data.csv`.",
        }],
        rule: ScoringRule::DataImport {
            imports: &[ImportCheck {
                variable: "sales_df",
                function: "read_csv",
                points: 3.0,
                file: Some(("sales_data.csv", 2.0)),
            }],
        },
    },
    RubricElement {
        key: ElementKey::ExcelImport,
        title: "Excel Import",
        description: "Import Excel data into ratings_df and comments_df",
        max_points: 6.0,
        recommend_below: 6.0,
        recommendations: &[Recommendation {
            below: 6.0,
            text: "**Excel Import:** Make sure both ratings_df and comments_df load successfully with `read_excel()`. Pay attention to file paths and sheet names for the Excel file.",
        }],
        rule: ScoringRule::DataImport {
            imports: &[
                ImportCheck {
                    variable: "ratings_df",
                    function: "read_excel",
                    points: 3.0,
                    file: None,
                },
                ImportCheck {
                    variable: "comments_df",
                    function: "read_excel",
                    points: 3.0,
                    file: None,
                },
            ],
        },
    },
    RubricElement {
        key: ElementKey::DataInspection,
        title: "Data Inspection",
        description: "Perform data inspection on all datasets",
        max_points: 8.0,
        recommend_below: 6.0,
        recommendations: &[Recommendation {
            below: 6.0,
            text: "**Data Inspection:** Run `head()`, `str()`, and `summary()` on each dataset. Make sure you can see the outputs - this tells you what your data actually looks like.",
        }],
        rule: ScoringRule::Inspection {
            functions: &["head(", "str(", "summary("],
            datasets: &["sales_df", "ratings_df", "comments_df"],
        },
    },
    RubricElement {
        key: ElementKey::ReflectionQuestions,
        title: "Reflection Questions",
        description: "Answer reflection questions with thoughtful responses",
        max_points: 12.5,
        recommend_below: 10.0,
        recommendations: &[
            Recommendation {
                below: 5.0,
                text: "**Reflection Questions:** Take more time with these. Look at your data outputs and explain what you see. These aren't just busy work - they help you think analytically.",
            },
            Recommendation {
                below: 10.0,
                text: "**Reflection Questions:** Good start, but go deeper. Connect what you observe to business implications. What would these data patterns mean for real decision-making?",
            },
        ],
        rule: ScoringRule::Reflection,
    },
];

/// Print whole points without decimals and anything else with one.
pub fn fmt_points(points: f64) -> String {
    if points.fract() == 0.0 {
        format!("{points:.0}")
    } else {
        format!("{points:.1}")
    }
}
