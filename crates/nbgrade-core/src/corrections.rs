//! Code-fix snippets for common student mistakes.
//!
//! Two lookups: one keyed by rubric element (issued when an element fell
//! short and the notebook also had errors), one keyed by the text of a
//! detected error. Both return [`CodeFix`] values the aggregator dedups by
//! title.

use serde::{Deserialize, Serialize};

use crate::rubric::ElementKey;

/// A titled remediation snippet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeFix {
    pub title: String,
    /// R code to show; empty for purely explanatory entries.
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub explanation: String,
}

impl CodeFix {
    fn from_static(fix: &StaticFix) -> Self {
        Self {
            title: fix.title.to_string(),
            code: fix.code.to_string(),
            explanation: fix.explanation.to_string(),
        }
    }

    /// Markdown rendering used in the written assessment.
    pub fn to_markdown(&self) -> String {
        if self.code.is_empty() {
            format!("**ℹ️ {}:**\n{}", self.title, self.explanation)
        } else if self.explanation.is_empty() {
            format!("**🔧 {}:**\n```r\n{}\n```", self.title, self.code)
        } else {
            format!(
                "**🔧 {}:**\n```r\n{}\n```\n{}",
                self.title, self.code, self.explanation
            )
        }
    }
}

struct StaticFix {
    title: &'static str,
    code: &'static str,
    explanation: &'static str,
}

/// What an error message is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueKind {
    CsvNotFound,
    ExcelNotFound,
    ObjectNotFound(Option<&'static str>),
    FunctionNotFound(Option<&'static str>),
}

const DATASETS: &[&str] = &["sales_df", "ratings_df", "comments_df"];
const READERS: &[&str] = &["read_csv", "read_excel"];

/// Classify an issue string. Specific matches are checked before generic ones.
pub fn classify_issue(issue: &str) -> Option<IssueKind> {
    let lower = issue.to_lowercase();
    if lower.contains("does not exist") && lower.contains(".csv") {
        Some(IssueKind::CsvNotFound)
    } else if lower.contains("path does not exist") && lower.contains(".xlsx") {
        Some(IssueKind::ExcelNotFound)
    } else if lower.contains("object") && lower.contains("not found") {
        let name = DATASETS.iter().copied().find(|d| lower.contains(d));
        Some(IssueKind::ObjectNotFound(name))
    } else if lower.contains("could not find function") {
        let name = READERS.iter().copied().find(|r| lower.contains(r));
        Some(IssueKind::FunctionNotFound(name))
    } else {
        None
    }
}

/// The fix snippet for a detected error, if one is known.
pub fn fix_for_issue(issue: &str) -> Option<CodeFix> {
    let fix = match classify_issue(issue)? {
        IssueKind::CsvNotFound => &CSV_NOT_FOUND,
        IssueKind::ExcelNotFound => &EXCEL_NOT_FOUND,
        IssueKind::ObjectNotFound(Some("sales_df")) => &SALES_DF_MISSING,
        IssueKind::ObjectNotFound(Some("ratings_df")) => &RATINGS_DF_MISSING,
        IssueKind::ObjectNotFound(Some(_)) => &COMMENTS_DF_MISSING,
        IssueKind::ObjectNotFound(None) => &OBJECT_MISSING,
        IssueKind::FunctionNotFound(Some("read_csv")) => &READ_CSV_MISSING,
        IssueKind::FunctionNotFound(Some(_)) => &READ_EXCEL_MISSING,
        IssueKind::FunctionNotFound(None) => &FUNCTION_MISSING,
    };
    Some(CodeFix::from_static(fix))
}

/// The fix snippet for an element that scored below its threshold.
pub fn fix_for_element(key: ElementKey, score: f64) -> Option<CodeFix> {
    let fix = match key {
        ElementKey::WorkingDirectory => &WORKING_DIRECTORY_FIX,
        ElementKey::PackageLoading if score < 2.0 => &PACKAGE_INSTALL_FIX,
        ElementKey::PackageLoading => &PACKAGE_LOAD_FIX,
        ElementKey::CsvImport | ElementKey::ExcelImport => &DATA_IMPORT_FIX,
        ElementKey::DataInspection => &DATA_INSPECTION_FIX,
        ElementKey::ReflectionQuestions => return None,
    };
    Some(CodeFix::from_static(fix))
}

/// Explanation shown when the tidyverse startup conflicts notice was seen.
pub fn tidyverse_conflicts_note() -> CodeFix {
    CodeFix::from_static(&TIDYVERSE_CONFLICTS)
}

static WORKING_DIRECTORY_FIX: StaticFix = StaticFix {
    title: "Working Directory Fix",
    code: "# Make sure to run this cell and see the output\ngetwd()",
    explanation: "The output should show your current folder path. If you're not in the right folder, use:\n```r\nsetwd(\"path/to/your/assignment/folder\")\n```",
};

static PACKAGE_INSTALL_FIX: StaticFix = StaticFix {
    title: "Package Loading Fix",
    code: "# Install packages first (only need to do this once)\ninstall.packages(\"tidyverse\")\ninstall.packages(\"readxl\")\n\n# Then load them (do this every time you restart R)\nlibrary(tidyverse)\nlibrary(readxl)",
    explanation: "If you get errors, try installing one at a time and restart R between installations.",
};

static PACKAGE_LOAD_FIX: StaticFix = StaticFix {
    title: "Package Loading Fix",
    code: "# Make sure both packages are loaded\nlibrary(tidyverse)\nlibrary(readxl)",
    explanation: "If you get \"package not found\" errors, install first:\n```r\ninstall.packages(\"package_name\")\n```",
};

static DATA_IMPORT_FIX: StaticFix = StaticFix {
    title: "Data Import Fix",
    code: "# For CSV files\nsales_df <- read_csv(\"data/sales_data.csv\")\n\n# For Excel files with multiple sheets\nratings_df <- read_excel(\"data/customer_feedback.xlsx\", sheet = \"ratings\")\ncomments_df <- read_excel(\"data/customer_feedback.xlsx\", sheet = \"customer_feedback\")",
    explanation: "Common fixes:\n- Check file paths: make sure \"data/\" folder exists\n- Check sheet names: they're case-sensitive\n- Use forward slashes (/) not backslashes (\\) in file paths",
};

static DATA_INSPECTION_FIX: StaticFix = StaticFix {
    title: "Data Inspection Fix",
    code: "# Run these for each dataset\nhead(sales_df)      # First 6 rows\nstr(sales_df)       # Structure and data types\nsummary(sales_df)   # Statistical summary\n\n# Do the same for other datasets\nhead(ratings_df)\nstr(ratings_df)\nsummary(ratings_df)\n\nhead(comments_df)\nstr(comments_df)\nsummary(comments_df)",
    explanation: "Make sure to RUN each cell - you should see output below each command.",
};

static TIDYVERSE_CONFLICTS: StaticFix = StaticFix {
    title: "About Tidyverse Conflicts (This is Normal!)",
    code: "",
    explanation: "The message about `dplyr::filter()` masking `stats::filter()` is just R telling you that tidyverse functions will be used instead of base R functions with the same names. This is expected and not an error.\n\nIf you ever need the base R version, you can use `stats::filter()` explicitly, but for this class, the tidyverse versions are what we want.",
};

static CSV_NOT_FOUND: StaticFix = StaticFix {
    title: "Data Import Fix - CSV File Not Found",
    code: "# Check your working directory and file location\ngetwd()  # See where R is currently looking\nlist.files()  # See what files are in current directory\nlist.files(\"data/\")  # See what's in the data folder\n\n# For CSV files, use:\nsales_df <- read_csv(\"data/sales_data.csv\")\n# NOT: read_csv(\"../data/sales.csv\") or read_csv(\"sales.csv\")\n\n# Make sure:\n# 1. File is named exactly \"sales_data.csv\" (check spelling!)\n# 2. File is in a \"data\" folder in your project\n# 3. You're running from the correct working directory",
    explanation: "",
};

static EXCEL_NOT_FOUND: StaticFix = StaticFix {
    title: "Data Import Fix - Excel File Not Found",
    code: "# For Excel files, use:\nratings_df <- read_excel(\"data/ratings_data.xlsx\", sheet = \"ratings\")\ncomments_df <- read_excel(\"data/ratings_data.xlsx\", sheet = \"comments\")\n\n# Common fixes:\n# 1. Check file name spelling: \"ratings_data.xlsx\" not \"ratings.xlsx\"\n# 2. Make sure file is in \"data\" folder\n# 3. Check sheet names are correct: \"ratings\" and \"comments\"\n\n# To see sheet names in an Excel file:\nexcel_sheets(\"data/ratings_data.xlsx\")",
    explanation: "",
};

static SALES_DF_MISSING: StaticFix = StaticFix {
    title: "Variable Fix - sales_df not found",
    code: "# You're trying to use sales_df before creating it\n# Make sure you run this cell first:\nsales_df <- read_csv(\"data/sales_data.csv\")\n\n# Then you can use it:\nhead(sales_df)\nstr(sales_df)\nsummary(sales_df)",
    explanation: "",
};

static RATINGS_DF_MISSING: StaticFix = StaticFix {
    title: "Variable Fix - ratings_df not found",
    code: "# You're trying to use ratings_df before creating it\n# Make sure you run this cell first:\nratings_df <- read_excel(\"data/ratings_data.xlsx\", sheet = \"ratings\")\n\n# Then you can use it:\nhead(ratings_df)",
    explanation: "",
};

static COMMENTS_DF_MISSING: StaticFix = StaticFix {
    title: "Variable Fix - comments_df not found",
    code: "# You're trying to use comments_df before creating it\n# Make sure you run this cell first:\ncomments_df <- read_excel(\"data/ratings_data.xlsx\", sheet = \"comments\")\n\n# Then you can use it:\nhead(comments_df)",
    explanation: "",
};

static OBJECT_MISSING: StaticFix = StaticFix {
    title: "Variable Fix - Object Not Found",
    code: "# This error means you're using a variable before creating it\n# Common causes:\n# 1. Typo in variable name (check spelling!)\n# 2. Didn't run the cell that creates the variable\n# 3. Variables are case-sensitive: sales_df ≠ Sales_df\n\n# Solution: Run cells in order from top to bottom",
    explanation: "",
};

static READ_CSV_MISSING: StaticFix = StaticFix {
    title: "Function Fix - read_csv not found",
    code: "# read_csv comes from the tidyverse package\n# Make sure you load it first:\nlibrary(tidyverse)\n\n# Then you can use:\nsales_df <- read_csv(\"data/sales_data.csv\")",
    explanation: "",
};

static READ_EXCEL_MISSING: StaticFix = StaticFix {
    title: "Function Fix - read_excel not found",
    code: "# read_excel comes from the readxl package\n# Make sure you load it first:\nlibrary(readxl)\n\n# Then you can use:\nratings_df <- read_excel(\"data/ratings_data.xlsx\", sheet = \"ratings\")",
    explanation: "",
};

static FUNCTION_MISSING: StaticFix = StaticFix {
    title: "Function Fix - Function Not Found",
    code: "# This function isn't available - you probably need to load a package\nlibrary(tidyverse)  # For data manipulation functions\nlibrary(readxl)     # For Excel import functions\n\n# If you get \"package not found\", install first:\ninstall.packages(\"tidyverse\")\ninstall.packages(\"readxl\")",
    explanation: "",
};
