// Structural model shared by every front end
//
// Both the tree-sitter Python extractor and the C# text heuristics produce a
// `SourceModel`. Downstream consumers only ever see this shape, so every field
// is always present; "not extracted" and "extracted as empty" are
// distinguished by `Option` and by `completeness`, never by a missing field.

use crate::analysis::metrics::FileMetrics;
use crate::analysis::roles::Role;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Which front end produced a model, and therefore how far it can be trusted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceLanguage {
    /// Parsed with a real grammar; structure is exact
    Python,
    /// Recovered from raw text with regex and brace matching; best effort
    CSharp,
}

impl SourceLanguage {
    /// Detect the language from a path's extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("py") | Some("pyi") => Some(SourceLanguage::Python),
            Some("cs") => Some(SourceLanguage::CSharp),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceLanguage::Python => "python",
            SourceLanguage::CSharp => "csharp",
        }
    }
}

/// Accuracy/cost level for heuristic extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Class names and lines only
    Minimal,
    /// Class names, a handful of unscoped methods, capped constants
    Partial,
    /// Brace-scoped methods, properties, usings, namespace, constants
    Full,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Minimal => "minimal",
            Tier::Partial => "partial",
            Tier::Full => "full",
        }
    }
}

impl std::str::FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "minimal" => Ok(Tier::Minimal),
            "partial" => Ok(Tier::Partial),
            "full" => Ok(Tier::Full),
            other => Err(format!("unknown tier: {}", other)),
        }
    }
}

/// Whether a model covers the whole file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Completeness {
    #[default]
    Complete,
    /// Input was cut at the line limit of the cheapest tier
    Truncated,
    /// The soft time budget ran out; the model holds what was found so far
    TimedOut,
}

impl Completeness {
    pub fn is_partial(&self) -> bool {
        !matches!(self, Completeness::Complete)
    }
}

/// A file handed to an extractor: identity, text and the time it was read
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub content: String,
    pub last_modified: SystemTime,
}

impl SourceFile {
    /// Wrap in-memory content; the timestamp is taken now
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            last_modified: SystemTime::now(),
        }
    }

    /// Wrap content with a known modification time
    pub fn with_modified(
        path: impl Into<PathBuf>,
        content: impl Into<String>,
        last_modified: SystemTime,
    ) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            last_modified,
        }
    }

    pub fn language(&self) -> Option<SourceLanguage> {
        SourceLanguage::from_path(&self.path)
    }
}

/// Structural summary of one analyzed file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceModel {
    /// File identity, unique key in scan results
    pub path: PathBuf,
    pub language: SourceLanguage,
    /// File-level documentation summary
    pub doc_comment: Option<String>,
    /// Top-level functions only; methods live on their class
    pub functions: Vec<FunctionSignature>,
    /// Top-level classes (and other type declarations) only
    pub classes: Vec<ClassSignature>,
    /// Raw import/using declarations in source order
    pub imports: Vec<String>,
    /// Constant names in order of first appearance
    pub constants: Vec<String>,
    /// Enclosing namespace (C# only)
    pub namespace: Option<String>,
    /// Architectural role, absent until classification runs
    pub role: Option<Role>,
    /// Heuristic tier actually used (C# only)
    pub tier: Option<Tier>,
    pub completeness: Completeness,
    pub metrics: FileMetrics,
    last_modified: SystemTime,
}

impl SourceModel {
    /// Create an empty model for a file read at `last_modified`
    pub fn new(path: PathBuf, language: SourceLanguage, last_modified: SystemTime) -> Self {
        Self {
            path,
            language,
            doc_comment: None,
            functions: Vec::new(),
            classes: Vec::new(),
            imports: Vec::new(),
            constants: Vec::new(),
            namespace: None,
            role: None,
            tier: None,
            completeness: Completeness::Complete,
            metrics: FileMetrics::default(),
            last_modified,
        }
    }

    /// When the file was read; fixed for the lifetime of the model
    pub fn last_modified(&self) -> SystemTime {
        self.last_modified
    }

    /// Check if file has any content
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.functions.is_empty() && self.constants.is_empty()
    }

    pub fn is_partial(&self) -> bool {
        self.completeness.is_partial()
    }

    /// Record a constant name once
    pub fn add_constant(&mut self, name: &str) {
        if !self.constants.iter().any(|c| c == name) {
            self.constants.push(name.to_string());
        }
    }

    /// Find a top-level class by name
    pub fn class(&self, name: &str) -> Option<&ClassSignature> {
        self.classes.iter().find(|c| c.name == name)
    }

    /// Find a top-level function by name
    pub fn function(&self, name: &str) -> Option<&FunctionSignature> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// Total methods across all top-level classes
    pub fn method_count(&self) -> usize {
        self.classes.iter().map(|c| c.methods.len()).sum()
    }
}

/// Kind of type declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    #[default]
    Class,
    Interface,
    Struct,
    Record,
    Enum,
}

impl TypeKind {
    pub fn from_keyword(keyword: &str) -> Self {
        match keyword.split_whitespace().next().unwrap_or(keyword) {
            "interface" => TypeKind::Interface,
            "struct" => TypeKind::Struct,
            "record" => TypeKind::Record,
            "enum" => TypeKind::Enum,
            _ => TypeKind::Class,
        }
    }
}

/// A class or other type declaration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassSignature {
    pub name: String,
    pub kind: TypeKind,
    /// Base classes/interfaces as written
    pub base_types: Vec<String>,
    pub doc_comment: Option<String>,
    /// 1-based declaration line
    pub line: usize,
    /// Decorators (Python) or attributes (C#), free text
    pub decorators: Vec<String>,
    /// Methods declared directly in this class body
    pub methods: Vec<FunctionSignature>,
    /// Attribute names (Python) or property names (C#) declared in the body
    pub fields: Vec<String>,
}

impl ClassSignature {
    pub fn new(name: &str, line: usize) -> Self {
        Self {
            name: name.to_string(),
            kind: TypeKind::Class,
            base_types: Vec::new(),
            doc_comment: None,
            line,
            decorators: Vec::new(),
            methods: Vec::new(),
            fields: Vec::new(),
        }
    }

    /// Record a field name once
    pub fn add_field(&mut self, name: &str) {
        if !self.fields.iter().any(|f| f == name) {
            self.fields.push(name.to_string());
        }
    }

    pub fn method(&self, name: &str) -> Option<&FunctionSignature> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Check if this appears to be an exception class
    pub fn is_exception(&self) -> bool {
        self.base_types
            .iter()
            .any(|b| b.contains("Exception") || b.contains("Error"))
    }
}

/// A function, method or constructor
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionSignature {
    pub name: String,
    /// Parameter names in declaration order
    pub parameters: Vec<String>,
    pub return_type: Option<String>,
    pub is_async: bool,
    pub doc_comment: Option<String>,
    /// 1-based line of the definition
    pub line: usize,
    /// Decorators (Python) or attributes (C#), free text
    pub decorators: Vec<String>,
    /// Parameter name -> annotation text; empty on the heuristic path
    pub type_hints: BTreeMap<String, String>,
    /// Default value source text, in parameter order (Python only)
    pub defaults: Vec<String>,
}

impl FunctionSignature {
    pub fn new(name: &str, line: usize) -> Self {
        Self {
            name: name.to_string(),
            parameters: Vec::new(),
            return_type: None,
            is_async: false,
            doc_comment: None,
            line,
            decorators: Vec::new(),
            type_hints: BTreeMap::new(),
            defaults: Vec::new(),
        }
    }

    /// Get the signature as a single line of text
    pub fn signature(&self) -> String {
        let params: Vec<String> = self
            .parameters
            .iter()
            .map(|p| match self.type_hints.get(p.trim_start_matches('*')) {
                Some(hint) => format!("{}: {}", p, hint),
                None => p.clone(),
            })
            .collect();
        let ret = self
            .return_type
            .as_ref()
            .map(|r| format!(" -> {}", r))
            .unwrap_or_default();
        let prefix = if self.is_async { "async " } else { "" };
        format!("{}{}({}){}", prefix, self.name, params.join(", "), ret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_model_new() {
        let model = SourceModel::new(
            PathBuf::from("app/main.py"),
            SourceLanguage::Python,
            SystemTime::UNIX_EPOCH,
        );
        assert!(model.is_empty());
        assert!(model.role.is_none());
        assert!(!model.is_partial());
        assert_eq!(model.last_modified(), SystemTime::UNIX_EPOCH);
    }

    #[test]
    fn test_language_from_path() {
        assert_eq!(
            SourceLanguage::from_path(Path::new("a/b.py")),
            Some(SourceLanguage::Python)
        );
        assert_eq!(
            SourceLanguage::from_path(Path::new("Api/OrderController.cs")),
            Some(SourceLanguage::CSharp)
        );
        assert_eq!(SourceLanguage::from_path(Path::new("README.md")), None);
        assert_eq!(SourceLanguage::from_path(Path::new("Makefile")), None);
    }

    #[test]
    fn test_add_constant_dedups() {
        let mut model = SourceModel::new(
            PathBuf::from("x.py"),
            SourceLanguage::Python,
            SystemTime::UNIX_EPOCH,
        );
        model.add_constant("MAX");
        model.add_constant("MIN");
        model.add_constant("MAX");
        assert_eq!(model.constants, vec!["MAX", "MIN"]);
    }

    #[test]
    fn test_tier_parsing_and_order() {
        assert_eq!("FULL".parse::<Tier>(), Ok(Tier::Full));
        assert_eq!("minimal".parse::<Tier>(), Ok(Tier::Minimal));
        assert!("deep".parse::<Tier>().is_err());
        assert!(Tier::Minimal < Tier::Partial);
        assert!(Tier::Partial < Tier::Full);
    }

    #[test]
    fn test_type_kind_from_keyword() {
        assert_eq!(TypeKind::from_keyword("interface"), TypeKind::Interface);
        assert_eq!(TypeKind::from_keyword("record struct"), TypeKind::Record);
        assert_eq!(TypeKind::from_keyword("class"), TypeKind::Class);
    }

    #[test]
    fn test_class_is_exception() {
        let mut class = ClassSignature::new("MyError", 1);
        assert!(!class.is_exception());
        class.base_types.push("Exception".to_string());
        assert!(class.is_exception());
    }

    #[test]
    fn test_class_fields_dedup() {
        let mut class = ClassSignature::new("User", 1);
        class.add_field("name");
        class.add_field("name");
        assert_eq!(class.fields, vec!["name"]);
    }

    #[test]
    fn test_function_signature() {
        let mut func = FunctionSignature::new("greet", 1);
        func.parameters.push("name".to_string());
        func.type_hints.insert("name".to_string(), "str".to_string());
        func.return_type = Some("str".to_string());
        assert_eq!(func.signature(), "greet(name: str) -> str");

        func.is_async = true;
        assert!(func.signature().starts_with("async "));
    }

    #[test]
    fn test_serialization() {
        let mut model = SourceModel::new(
            PathBuf::from("Api/Foo.cs"),
            SourceLanguage::CSharp,
            SystemTime::UNIX_EPOCH,
        );
        model.tier = Some(Tier::Full);
        model.role = Some(Role::Repository);
        let json = serde_json::to_string(&model).expect("serialize");
        assert!(json.contains("\"language\":\"csharp\""));
        assert!(json.contains("\"role\":\"repository\""));
        let parsed: SourceModel = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, model);
    }
}
