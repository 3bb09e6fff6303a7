// Parser module: turns source files into `SourceModel`s
//
// Python goes through tree-sitter; C# goes through text heuristics. The
// `Extractor` picks the front end from the file extension.

pub mod ast;
pub mod braces;
mod csharp;
pub mod mask;
mod python;

pub use ast::*;
pub use csharp::CSharpExtractor;
pub use python::PythonParser;

use crate::config::HeuristicConfig;
use crate::error::{FailureKind, Result};
use std::path::Path;
use std::time::SystemTime;
use tracing::trace;

/// Routes files to the extractor for their language
pub struct Extractor {
    python: PythonParser,
    csharp: CSharpExtractor,
}

impl Extractor {
    /// Create an extractor with the given heuristic limits
    pub fn new(limits: HeuristicConfig) -> Result<Self> {
        Ok(Self {
            python: PythonParser::new()?,
            csharp: CSharpExtractor::new(limits),
        })
    }

    /// Extract the structure of one file.
    ///
    /// `tier` only applies to C#; `None` picks the tier from the file size.
    pub fn extract(
        &mut self,
        file: &SourceFile,
        tier: Option<Tier>,
    ) -> std::result::Result<SourceModel, FailureKind> {
        match file.language() {
            Some(SourceLanguage::Python) => self.python.parse_source(file),
            Some(SourceLanguage::CSharp) => Ok(self.csharp.extract(file, tier)),
            None => {
                trace!(path = %file.path.display(), "skipping unsupported file");
                Err(FailureKind::UnsupportedExtension)
            }
        }
    }
}

/// Read a file as UTF-8 text, keeping its modification time
pub fn read_source(path: &Path) -> std::result::Result<SourceFile, FailureKind> {
    let bytes = std::fs::read(path).map_err(|e| FailureKind::io(e.to_string()))?;
    let content = String::from_utf8(bytes).map_err(|_| FailureKind::Decode)?;
    let content = match content.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => content,
    };
    let modified = std::fs::metadata(path)
        .and_then(|m| m.modified())
        .unwrap_or_else(|_| SystemTime::now());

    Ok(SourceFile::with_modified(path, content, modified))
}
