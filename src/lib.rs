//! Strata - extract code structure and classify files into architectural roles
//!
//! Reads Python sources through a tree-sitter grammar and C# sources through
//! tiered text heuristics, producing one `SourceModel` per file together with
//! an architectural role and a processing priority.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod parser;

// Re-export main types
pub use analysis::{
    classify, classify_explained, rank, Analyzer, Priority, ProjectSurvey, Role, ScanReport,
    ScanStats,
};
pub use config::Config;
pub use error::{Error, FailureKind, FileFailure, Result};
pub use parser::{
    read_source, ClassSignature, Completeness, Extractor, FunctionSignature, SourceFile,
    SourceLanguage, SourceModel, Tier,
};
