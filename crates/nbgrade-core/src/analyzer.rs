//! Rubric analyzer.
//!
//! Walks the rubric table and scores each element against the notebook's
//! cells. Code presence is matched on cell source; credit beyond the minimum
//! requires evidence that the cell actually ran (outputs or a counter).

use std::collections::BTreeMap;

use regex::Regex;

use crate::extract::{extract_responses, truncate_response};
use crate::model::{Cell, Notebook, OutputKind};
use crate::questions::{reflection_overview, QuestionKey, QUESTIONS};
use crate::rubric::{fmt_points, ElementKey, ImportCheck, RubricElement, ScoringRule, RUBRIC};
use crate::scoring::{score_response, QuestionResponse};

/// Score and feedback for one rubric element.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementResult {
    pub key: ElementKey,
    pub score: f64,
    pub feedback: String,
    /// Entries for the missing-elements list.
    pub missing: Vec<String>,
    /// Entries for the code-issues list.
    pub issues: Vec<String>,
}

impl ElementResult {
    fn new(key: ElementKey, score: f64, feedback: String) -> Self {
        Self {
            key,
            score,
            feedback,
            missing: Vec::new(),
            issues: Vec::new(),
        }
    }
}

/// How a stderr stream should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StderrClass {
    /// The tidyverse attach banner listing masked functions.
    ConflictsNotice,
    Error,
    Benign,
}

const ERROR_TERMS: &[&str] = &[
    "does not exist",
    "path does not exist",
    "object",
    "not found",
    "could not find function",
    "no such file",
];

const BENIGN_TERMS: &[&str] = &[
    "warning:",
    "note:",
    "info:",
    "deprecated",
    "package startup",
    "conflicts",
];

pub fn classify_stderr(text: &str) -> StderrClass {
    if text.contains("tidyverse_conflicts()") && text.contains("Conflicts") {
        return StderrClass::ConflictsNotice;
    }
    let lower = text.to_lowercase();
    if ERROR_TERMS.iter().any(|t| lower.contains(t)) {
        StderrClass::Error
    } else if !BENIGN_TERMS.iter().any(|t| lower.contains(t)) && lower.contains("error") {
        StderrClass::Error
    } else {
        StderrClass::Benign
    }
}

/// A cell failed if it raised an error record or wrote an error to stderr.
pub fn cell_failed(cell: &Cell) -> bool {
    cell.has_error_record()
        || cell
            .outputs
            .iter()
            .filter_map(|o| o.stderr_text())
            .any(|t| classify_stderr(t) == StderrClass::Error)
}

pub const CONFLICTS_NOTE: &str = "ℹ️ Tidyverse conflicts detected - this is normal and expected";

/// Errors found across all code-cell outputs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IssueScan {
    /// Issue strings in first-seen order, without duplicates.
    pub issues: Vec<String>,
    pub conflicts_seen: bool,
}

impl IssueScan {
    fn push(&mut self, issue: String) {
        if !self.issues.contains(&issue) {
            self.issues.push(issue);
        }
    }
}

pub fn detect_code_issues(notebook: &Notebook) -> IssueScan {
    let mut scan = IssueScan::default();
    for output in notebook.code_cells().flat_map(|c| c.outputs.iter()) {
        if output.kind == OutputKind::Error {
            let name = output.error_name.as_deref().unwrap_or("Unknown Error");
            let detail = output.error_detail.as_deref().unwrap_or("No details");
            scan.push(format!("ERROR: {name}: {detail}"));
            continue;
        }
        let Some(text) = output.stderr_text() else {
            continue;
        };
        match classify_stderr(text) {
            StderrClass::ConflictsNotice => scan.conflicts_seen = true,
            StderrClass::Error => scan.push(format!("ERROR: {}", text.trim())),
            StderrClass::Benign => {}
        }
    }
    if !scan.issues.is_empty() {
        tracing::debug!(count = scan.issues.len(), "code issues detected");
    }
    scan
}

/// Everything the analyzer learned about a notebook.
#[derive(Debug, Clone, PartialEq)]
pub struct RubricAnalysis {
    /// One result per rubric element, in table order.
    pub elements: Vec<ElementResult>,
    pub questions: BTreeMap<QuestionKey, QuestionResponse>,
    pub scan: IssueScan,
}

/// Score every rubric element.
pub fn analyze(notebook: &Notebook) -> RubricAnalysis {
    let scan = detect_code_issues(notebook);
    let mut questions = BTreeMap::new();
    let mut elements = Vec::with_capacity(RUBRIC.len());

    for element in RUBRIC {
        let result = match &element.rule {
            ScoringRule::CallWithOutput { pattern, call } => {
                score_call(element, notebook, pattern, call)
            }
            ScoringRule::PackageLoads {
                packages,
                points_each,
            } => score_packages(element, notebook, packages, *points_each),
            ScoringRule::DataImport { imports } => score_imports(element, notebook, imports),
            ScoringRule::Inspection {
                functions,
                datasets,
            } => score_inspection(element, notebook, functions, datasets),
            ScoringRule::Reflection => {
                let (result, scored) = score_reflection(element, notebook);
                questions = scored;
                result
            }
        };
        tracing::debug!(element = %result.key, score = result.score, "element scored");
        elements.push(result);
    }

    RubricAnalysis {
        elements,
        questions,
        scan,
    }
}

fn score_call(el: &RubricElement, nb: &Notebook, pattern: &str, call: &str) -> ElementResult {
    let re = Regex::new(pattern).expect("static rubric pattern");
    let title = el.title;
    let max = fmt_points(el.max_points);

    // Only the first cell containing the call counts.
    let Some(cell) = nb.code_cells().find(|c| re.is_match(&c.source)) else {
        let mut result = ElementResult::new(
            el.key,
            0.0,
            format!("❌ **{title} (0/{max} points)**: Missing {call} function call"),
        );
        result.missing.push(format!("{call} function call"));
        return result;
    };

    let (fraction, icon, detail) = if cell.has_output() {
        (1.0, "✅", format!("Correctly used {call} and showed output"))
    } else if cell.was_executed() {
        (
            0.75,
            "👍",
            format!("Used {call} and ran the cell - output may not be visible in this format"),
        )
    } else {
        (
            0.25,
            "⚠️",
            "Code is there but you need to RUN the cell to see the output".to_string(),
        )
    };
    let score = el.max_points * fraction;
    let feedback = format!(
        "{icon} **{title} ({}/{max} points)**: {detail}",
        fmt_points(score)
    );
    ElementResult::new(el.key, score, feedback)
}

#[derive(Default)]
struct Usage {
    found: bool,
    executed: bool,
    failed: bool,
}

fn score_packages(
    el: &RubricElement,
    nb: &Notebook,
    packages: &[&str],
    points_each: f64,
) -> ElementResult {
    let mut score = 0.0;
    let mut parts = Vec::new();
    let mut missing = Vec::new();
    let mut issues = Vec::new();

    for pkg in packages {
        let re = Regex::new(&format!(r"library\s*\(\s*{}\s*\)", regex::escape(pkg)))
            .expect("escaped package pattern");
        let mut usage = Usage::default();
        for cell in nb.code_cells().filter(|c| re.is_match(&c.source)) {
            usage.found = true;
            usage.executed |= cell.was_executed();
            usage.failed |= cell_failed(cell);
        }

        if usage.executed && !usage.failed {
            score += points_each;
            parts.push(format!("✅ {pkg} loaded and executed successfully"));
        } else if usage.executed {
            score += points_each * 0.25;
            parts.push(format!("⚠️ {pkg} attempted but has errors"));
            issues.push(format!("{pkg} loading error"));
        } else if usage.found {
            score += points_each * 0.5;
            parts.push(format!("⚠️ {pkg} code written but not executed"));
        } else {
            parts.push(format!("❌ {pkg} not loaded"));
            missing.push(format!("library({pkg})"));
        }
    }

    let feedback = format!(
        "📦 **{} ({}/{} points)**: {}",
        el.title,
        fmt_points(score),
        fmt_points(el.max_points),
        parts.join(" | ")
    );
    ElementResult {
        key: el.key,
        score,
        feedback,
        missing,
        issues,
    }
}

fn score_imports(el: &RubricElement, nb: &Notebook, imports: &[ImportCheck]) -> ElementResult {
    let code = nb.code_text();
    let mut score = 0.0;
    let mut parts = Vec::new();
    let mut missing = Vec::new();

    for check in imports {
        if !(code.contains(check.variable) && code.contains(check.function)) {
            parts.push(format!(
                "❌ Missing {} <- {}() assignment",
                check.variable, check.function
            ));
            missing.push(format!("{} data import", check.variable));
            continue;
        }
        score += check.points;
        parts.push(format!("✅ {} created with {}", check.variable, check.function));
        if let Some((file, bonus)) = check.file {
            if code.contains(file) {
                score += bonus;
                parts.push(format!("✅ Correct filename ({file})"));
            } else {
                parts.push("⚠️ Filename may be incorrect".to_string());
            }
        }
    }

    let icon = if el.key == ElementKey::CsvImport {
        "📄"
    } else {
        "📊"
    };
    let feedback = format!(
        "{icon} **{} ({}/{} points)**: {}",
        el.title,
        fmt_points(score),
        fmt_points(el.max_points),
        parts.join(" | ")
    );
    ElementResult {
        key: el.key,
        score: score.min(el.max_points),
        feedback,
        missing,
        issues: Vec::new(),
    }
}

const FUNCTION_EXECUTED: f64 = 2.0;
const FUNCTION_WRITTEN: f64 = 0.5;
const DATASET_EXECUTED: f64 = 1.0;
const DATASET_WRITTEN: f64 = 0.3;

fn score_inspection(
    el: &RubricElement,
    nb: &Notebook,
    functions: &[&str],
    datasets: &[&str],
) -> ElementResult {
    let mut score = 0.0;
    let mut parts = Vec::new();
    let mut missing = Vec::new();
    let mut executed = 0usize;

    for func in functions {
        let name = func.trim_end_matches('(');
        match nb.code_cells().find(|c| c.source.contains(func)) {
            Some(cell) if cell.was_executed() => {
                score += FUNCTION_EXECUTED;
                executed += 1;
                parts.push(format!("✅ {name}() used and executed"));
            }
            Some(_) => {
                score += FUNCTION_WRITTEN;
                parts.push(format!("⚠️ {name}() code written but not executed"));
            }
            None => {
                parts.push(format!("❌ {name}() missing"));
                missing.push(format!("{name}() function"));
            }
        }
    }

    for dataset in datasets {
        let mut usage = Usage::default();
        for cell in nb.code_cells().filter(|c| {
            c.source.contains(dataset) && functions.iter().any(|f| c.source.contains(f))
        }) {
            usage.found = true;
            usage.executed |= cell.was_executed();
        }
        if usage.executed {
            score += DATASET_EXECUTED;
            parts.push(format!("✅ {dataset} properly analyzed"));
        } else if usage.found {
            score += DATASET_WRITTEN;
            parts.push(format!("⚠️ {dataset} code written but not run"));
        } else {
            parts.push(format!("❌ {dataset} not analyzed"));
        }
    }

    let score = score.min(el.max_points);
    if executed == 0 {
        parts.push("💡 Remember to RUN your code cells to see the outputs!".to_string());
    } else if executed < functions.len() {
        parts.push("💡 Make sure to run ALL inspection functions (head, str, summary)".to_string());
    }

    let feedback = format!(
        "🔍 **{} ({score:.1}/{} points)**: {}",
        el.title,
        fmt_points(el.max_points),
        parts.join(" | ")
    );
    ElementResult {
        key: el.key,
        score,
        feedback,
        missing,
        issues: Vec::new(),
    }
}

/// Responses shorter than this are treated as unanswered.
const MIN_RESPONSE_LEN: usize = 15;

fn score_reflection(
    el: &RubricElement,
    nb: &Notebook,
) -> (ElementResult, BTreeMap<QuestionKey, QuestionResponse>) {
    let responses = extract_responses(&nb.markdown_text());
    let mut scored = BTreeMap::new();
    let mut lines = Vec::new();
    let mut missing = Vec::new();
    let mut total = 0.0;

    for q in QUESTIONS {
        let response = responses
            .get(&q.key)
            .map(|r| r.trim())
            .filter(|r| r.chars().count() > MIN_RESPONSE_LEN);

        match response {
            Some(text) => {
                let result = score_response(q, text);
                lines.push(format!(
                    "📝 **{}** ({:.1}/{} points)",
                    q.title,
                    result.score,
                    fmt_points(q.max_points)
                ));
                lines.push(result.feedback.clone());
                total += result.score;
                scored.insert(
                    q.key,
                    QuestionResponse {
                        extracted_text: truncate_response(text),
                        quality: result.quality,
                        score: result.score,
                        max_score: q.max_points,
                        feedback: result.feedback,
                        remarks: result.remarks,
                    },
                );
            }
            None => {
                lines.push(format!(
                    "❌ **{}** (0/{} points)",
                    q.title,
                    fmt_points(q.max_points)
                ));
                lines.push(q.missing_guidance.to_string());
                missing.push(format!("{} response", q.title));
            }
        }
    }

    let total = total.min(el.max_points);
    lines.push(String::new());
    lines.push(reflection_overview(total / el.max_points * 100.0).to_string());

    let body = lines
        .iter()
        .map(|l| format!("   {l}"))
        .collect::<Vec<_>>()
        .join("\n");
    let feedback = format!(
        "💭 **{} ({total:.1}/{} points)**:\n{body}",
        el.title,
        fmt_points(el.max_points)
    );

    let result = ElementResult {
        key: el.key,
        score: total,
        feedback,
        missing,
        issues: Vec::new(),
    };
    (result, scored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OutputRecord;

    fn element(analysis: &RubricAnalysis, key: ElementKey) -> &ElementResult {
        analysis.elements.iter().find(|e| e.key == key).unwrap()
    }

    #[test]
    fn getwd_with_output_scores_full() {
        let nb = Notebook::new(vec![
            Cell::code("getwd()").with_output(OutputRecord::result("'/home/student'"))
        ]);
        let r = element(&analyze(&nb), ElementKey::WorkingDirectory).clone();
        assert_eq!(r.score, 2.0);
        assert!(r.feedback.starts_with("✅ **Working Directory (2/2 points)**"));
    }

    #[test]
    fn getwd_counter_only_and_unrun() {
        let counted = Notebook::new(vec![Cell::code("getwd ()").with_execution_index(1)]);
        assert_eq!(
            element(&analyze(&counted), ElementKey::WorkingDirectory).score,
            1.5
        );

        let unrun = Notebook::new(vec![Cell::code("getwd()")]);
        let r = element(&analyze(&unrun), ElementKey::WorkingDirectory).clone();
        assert_eq!(r.score, 0.5);
        assert!(r.feedback.contains("(0.5/2 points)"));
    }

    #[test]
    fn only_first_getwd_cell_counts() {
        let nb = Notebook::new(vec![
            Cell::code("getwd()"),
            Cell::code("getwd()").with_output(OutputRecord::result("/tmp")),
        ]);
        assert_eq!(element(&analyze(&nb), ElementKey::WorkingDirectory).score, 0.5);
    }

    #[test]
    fn missing_getwd() {
        let nb = Notebook::new(vec![Cell::code("x <- 1")]);
        let r = element(&analyze(&nb), ElementKey::WorkingDirectory).clone();
        assert_eq!(r.score, 0.0);
        assert_eq!(r.missing, vec!["getwd() function call".to_string()]);
    }

    #[test]
    fn both_packages_loaded() {
        let nb = Notebook::new(vec![
            Cell::code("library(tidyverse)").with_output(OutputRecord::stream(
                "stderr",
                "── Conflicts ──── tidyverse_conflicts() ──\n✖ dplyr::filter() masks stats::filter()",
            )),
            Cell::code("library( readxl )").with_execution_index(2),
        ]);
        let analysis = analyze(&nb);
        let r = element(&analysis, ElementKey::PackageLoading);
        assert_eq!(r.score, 4.0);
        assert!(r.issues.is_empty());
        assert!(analysis.scan.conflicts_seen);
        assert!(analysis.scan.issues.is_empty());
    }

    #[test]
    fn one_package_only() {
        let nb = Notebook::new(vec![Cell::code("library(tidyverse)").with_execution_index(1)]);
        let r = element(&analyze(&nb), ElementKey::PackageLoading).clone();
        assert_eq!(r.score, 2.0);
        assert_eq!(r.missing, vec!["library(readxl)".to_string()]);
    }

    #[test]
    fn package_error_and_unrun() {
        let nb = Notebook::new(vec![
            Cell::code("library(tidyverse)").with_output(OutputRecord::error(
                "packageNotFoundError",
                "there is no package called 'tidyverse'",
            )),
            Cell::code("library(readxl)"),
        ]);
        let r = element(&analyze(&nb), ElementKey::PackageLoading).clone();
        assert_eq!(r.score, 1.5);
        assert_eq!(r.issues, vec!["tidyverse loading error".to_string()]);
        assert!(r.feedback.starts_with("📦 **Package Loading (1.5/4 points)**"));
    }

    #[test]
    fn imports_scored_on_all_code() {
        let nb = Notebook::new(vec![
            Cell::code("sales_df <- read_csv(\"data/sales_data.csv\")"),
            Cell::code("ratings_df <- read_excel(\"data/customer_feedback.xlsx\")"),
        ]);
        let analysis = analyze(&nb);
        assert_eq!(element(&analysis, ElementKey::CsvImport).score, 5.0);
        let excel = element(&analysis, ElementKey::ExcelImport);
        assert_eq!(excel.score, 3.0);
        assert_eq!(excel.missing, vec!["comments_df data import".to_string()]);
    }

    #[test]
    fn csv_without_expected_filename() {
        let nb = Notebook::new(vec![Cell::code("sales_df <- read_csv('sales.csv')")]);
        let r = element(&analyze(&nb), ElementKey::CsvImport).clone();
        assert_eq!(r.score, 3.0);
        assert!(r.feedback.contains("Filename may be incorrect"));
    }

    #[test]
    fn inspection_caps_and_guidance() {
        let nb = Notebook::new(vec![
            Cell::code("head(sales_df)\nhead(ratings_df)\nhead(comments_df)")
                .with_execution_index(1),
            Cell::code("str(sales_df)").with_execution_index(2),
            Cell::code("summary(sales_df)").with_execution_index(3),
        ]);
        let r = element(&analyze(&nb), ElementKey::DataInspection).clone();
        // 3 * 2 + 3 * 1 = 9, capped
        assert_eq!(r.score, 8.0);
        assert!(r.feedback.starts_with("🔍 **Data Inspection (8.0/8 points)**"));
        assert!(!r.feedback.contains("💡"));
    }

    #[test]
    fn inspection_written_only() {
        let nb = Notebook::new(vec![Cell::code("head(sales_df)")]);
        let r = element(&analyze(&nb), ElementKey::DataInspection).clone();
        assert!((r.score - 0.8).abs() < 1e-9);
        assert!(r.feedback.contains("Remember to RUN"));
        assert_eq!(
            r.missing,
            vec!["str() function".to_string(), "summary() function".to_string()]
        );
    }

    #[test]
    fn stderr_classification() {
        assert_eq!(
            classify_stderr("Error: 'sales.csv' does not exist in current working directory"),
            StderrClass::Error
        );
        assert_eq!(
            classify_stderr("Warning: package 'readxl' was built under R version 4.3"),
            StderrClass::Benign
        );
        assert_eq!(
            classify_stderr("Error in parse: unexpected symbol"),
            StderrClass::Error
        );
        assert_eq!(classify_stderr("Rows: 100 Columns: 5"), StderrClass::Benign);
    }

    #[test]
    fn issues_are_deduplicated() {
        let err = OutputRecord::error("simpleError", "object 'sales_df' not found");
        let nb = Notebook::new(vec![
            Cell::code("head(sales_df)").with_output(err.clone()),
            Cell::code("str(sales_df)").with_output(err),
            Cell::code("x").with_output(OutputRecord::stream("stderr", "no such file 'a.csv'")),
        ]);
        let scan = detect_code_issues(&nb);
        assert_eq!(
            scan.issues,
            vec![
                "ERROR: simpleError: object 'sales_df' not found".to_string(),
                "ERROR: no such file 'a.csv'".to_string(),
            ]
        );
    }

    #[test]
    fn short_reflection_is_missing() {
        let nb = Notebook::new(vec![Cell::markdown(
            "## Data quality\nAny missing values or unusual patterns?\n\nAnswer: too short",
        )]);
        let analysis = analyze(&nb);
        let r = element(&analysis, ElementKey::ReflectionQuestions);
        assert_eq!(r.score, 0.0);
        assert!(r
            .missing
            .contains(&"Data Quality Assessment response".to_string()));
        assert!(analysis.questions.is_empty());
        assert!(r.feedback.contains("Needs Development"));
    }

    #[test]
    fn scores_stay_in_bounds() {
        let nb = Notebook::new(vec![
            Cell::code("getwd()\nlibrary(tidyverse)\nlibrary(readxl)")
                .with_output(OutputRecord::result("x")),
            Cell::code("head(sales_df); str(ratings_df); summary(comments_df)")
                .with_execution_index(4),
        ]);
        for r in analyze(&nb).elements {
            let max = r.key.element().max_points;
            assert!(r.score >= 0.0 && r.score <= max, "{} = {}", r.key, r.score);
        }
    }
}
