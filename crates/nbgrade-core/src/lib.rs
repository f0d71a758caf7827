//! nbgrade-core: notebook loading, rubric analysis, and scoring.
//!
//! This crate defines the notebook data model, the static grading rubric,
//! and the rule engine that turns a list of cells into an `AnalysisResult`.

pub mod aggregate;
pub mod analyzer;
pub mod config;
pub mod corrections;
pub mod engine;
pub mod error;
pub mod extract;
pub mod model;
pub mod notebook;
pub mod questions;
pub mod report;
pub mod rubric;
pub mod scoring;
pub mod traits;
