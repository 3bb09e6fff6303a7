// Python extractor using tree-sitter
//
// Python files go through a real grammar. Anything the grammar rejects is a
// parse failure for the whole file; there is no fallback to text heuristics.
// A single traversal visits every node once while carrying the lexical scope,
// so methods are attached to their class and never reported as top-level
// functions.

use crate::analysis::metrics::{CommentStyle, FileMetrics};
use crate::error::{Error, FailureKind, Result};
use crate::parser::ast::*;
use tracing::trace;
use tree_sitter::{Node, Parser};

/// Node kinds that add a decision point to the complexity estimate
const DECISION_KINDS: &[&str] = &[
    "if_statement",
    "elif_clause",
    "while_statement",
    "for_statement",
    "except_clause",
    "boolean_operator",
    "conditional_expression",
];

/// Parser for Python source files
pub struct PythonParser {
    parser: Parser,
}

impl PythonParser {
    /// Create a new Python parser
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        let language = tree_sitter_python::language();
        parser
            .set_language(&language)
            .map_err(|e| Error::parser(format!("Failed to set Python language: {}", e)))?;
        Ok(Self { parser })
    }

    /// Extract the structural model of a Python file
    pub fn parse_source(&mut self, file: &SourceFile) -> std::result::Result<SourceModel, FailureKind> {
        let source = file.content.as_str();
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| FailureKind::parse(1, 1, "parser produced no tree"))?;

        let root = tree.root_node();
        if let Some(bad) = first_error(root) {
            let pos = bad.start_position();
            return Err(FailureKind::parse(
                pos.row + 1,
                pos.column + 1,
                describe_error(bad, source.as_bytes()),
            ));
        }

        let mut model = SourceModel::new(file.path.clone(), SourceLanguage::Python, file.last_modified);
        model.metrics = FileMetrics::from_source(source, CommentStyle::Hash);
        model.doc_comment = block_docstring(root, source.as_bytes());

        let mut visitor = Visitor {
            source: source.as_bytes(),
            model: &mut model,
            decisions: 0,
        };
        visitor.visit(root, Scope::Module);
        let decisions = visitor.decisions;
        model.metrics.add_decisions(decisions);

        trace!(
            path = %file.path.display(),
            classes = model.classes.len(),
            functions = model.functions.len(),
            "parsed python file"
        );

        Ok(model)
    }
}

/// Where the node being visited sits lexically
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Module,
    /// Directly in a class body; the index is set only for top-level classes
    ClassBody(Option<usize>),
    /// Inside a function, a nested block or an expression
    Nested,
}

struct Visitor<'a> {
    source: &'a [u8],
    model: &'a mut SourceModel,
    decisions: usize,
}

impl<'a> Visitor<'a> {
    fn visit(&mut self, node: Node, scope: Scope) {
        if DECISION_KINDS.contains(&node.kind()) {
            self.decisions += 1;
        }

        match node.kind() {
            "class_definition" => return self.visit_class(node, scope, Vec::new()),
            "function_definition" => return self.visit_function(node, scope, Vec::new()),
            "decorated_definition" => return self.visit_decorated(node, scope),
            "import_statement" => self.record_import(node),
            "import_from_statement" | "future_import_statement" => self.record_from_import(node),
            "expression_statement" => self.record_assignments(node, scope),
            _ => {}
        }

        let child_scope = if node.kind() == "module" {
            Scope::Module
        } else {
            Scope::Nested
        };
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.visit(child, child_scope);
        }
    }

    fn visit_decorated(&mut self, node: Node, scope: Scope) {
        let mut decorators = decorator_texts(node, self.source);
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "class_definition" => {
                    self.visit_class(child, scope, std::mem::take(&mut decorators))
                }
                "function_definition" => {
                    self.visit_function(child, scope, std::mem::take(&mut decorators))
                }
                _ => self.visit(child, Scope::Nested),
            }
        }
    }

    fn visit_class(&mut self, node: Node, scope: Scope, decorators: Vec<String>) {
        let index = if scope == Scope::Module {
            let name = self.field_text(node, "name").unwrap_or_default();
            let mut class = ClassSignature::new(name, node.start_position().row + 1);
            class.decorators = decorators;
            class.base_types = base_classes(node, self.source);
            class.doc_comment = node
                .child_by_field_name("body")
                .and_then(|body| block_docstring(body, self.source));
            self.model.classes.push(class);
            Some(self.model.classes.len() - 1)
        } else {
            None
        };

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "block" {
                let mut body_cursor = child.walk();
                for statement in child.children(&mut body_cursor) {
                    self.visit(statement, Scope::ClassBody(index));
                }
            } else {
                self.visit(child, Scope::Nested);
            }
        }
    }

    fn visit_function(&mut self, node: Node, scope: Scope, decorators: Vec<String>) {
        let target = match scope {
            Scope::Module => Some(None),
            Scope::ClassBody(Some(index)) => Some(Some(index)),
            _ => None,
        };

        if let Some(class_index) = target {
            let mut function = self.function_signature(node);
            function.decorators = decorators;
            match class_index {
                Some(index) => self.model.classes[index].methods.push(function),
                None => self.model.functions.push(function),
            }
        }

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.visit(child, Scope::Nested);
        }
    }

    fn function_signature(&self, node: Node) -> FunctionSignature {
        let name = self.field_text(node, "name").unwrap_or_default();
        let mut function = FunctionSignature::new(name, node.start_position().row + 1);

        let mut cursor = node.walk();
        function.is_async = node.children(&mut cursor).any(|c| c.kind() == "async");
        function.return_type = self.field_text(node, "return_type").map(str::to_string);
        function.doc_comment = node
            .child_by_field_name("body")
            .and_then(|body| block_docstring(body, self.source));

        if let Some(params) = node.child_by_field_name("parameters") {
            self.collect_parameters(params, &mut function);
        }

        function
    }

    fn collect_parameters(&self, params: Node, function: &mut FunctionSignature) {
        let mut cursor = params.walk();
        for param in params.named_children(&mut cursor) {
            match param.kind() {
                "identifier" | "list_splat_pattern" | "dictionary_splat_pattern" => {
                    function.parameters.push(self.text(param).to_string());
                }
                "typed_parameter" => {
                    let Some(inner) = param.named_child(0) else {
                        continue;
                    };
                    let name = self.text(inner).to_string();
                    if let Some(hint) = self.field_text(param, "type") {
                        function
                            .type_hints
                            .insert(name.trim_start_matches('*').to_string(), hint.to_string());
                    }
                    function.parameters.push(name);
                }
                "default_parameter" | "typed_default_parameter" => {
                    let Some(name) = self.field_text(param, "name") else {
                        continue;
                    };
                    if let Some(hint) = self.field_text(param, "type") {
                        function.type_hints.insert(name.to_string(), hint.to_string());
                    }
                    if let Some(value) = self.field_text(param, "value") {
                        function.defaults.push(value.to_string());
                    }
                    function.parameters.push(name.to_string());
                }
                _ => {}
            }
        }
    }

    /// `import a.b, c as d` becomes `import a.b` and `import c`
    fn record_import(&mut self, node: Node) {
        let mut cursor = node.walk();
        let names: Vec<String> = node
            .children_by_field_name("name", &mut cursor)
            .map(|name| self.imported_name(name).to_string())
            .collect();
        for name in names {
            self.model.imports.push(format!("import {}", name));
        }
    }

    /// `from m import a, b as c` becomes `from m import a` and `from m import b`
    fn record_from_import(&mut self, node: Node) {
        let module = if node.kind() == "future_import_statement" {
            "__future__"
        } else {
            self.field_text(node, "module_name").unwrap_or_default()
        };

        let mut names: Vec<String> = {
            let mut cursor = node.walk();
            node.children_by_field_name("name", &mut cursor)
                .map(|name| self.imported_name(name).to_string())
                .collect()
        };
        let mut cursor = node.walk();
        if node.children(&mut cursor).any(|c| c.kind() == "wildcard_import") {
            names.push("*".to_string());
        }

        for name in names {
            self.model.imports.push(format!("from {} import {}", module, name));
        }
    }

    fn imported_name(&self, node: Node) -> &'a str {
        if node.kind() == "aliased_import" {
            self.field_text(node, "name").unwrap_or_default()
        } else {
            self.text(node)
        }
    }

    /// Module-level uppercase targets become constants; class-body targets become fields
    fn record_assignments(&mut self, node: Node, scope: Scope) {
        let mut targets = Vec::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if child.kind() == "assignment" {
                self.assignment_targets(child, &mut targets);
            }
        }

        for target in targets {
            match scope {
                Scope::Module if is_constant_name(&target) => self.model.add_constant(&target),
                Scope::ClassBody(Some(index)) => self.model.classes[index].add_field(&target),
                _ => {}
            }
        }
    }

    /// Plain identifier targets, following chains like `A = B = 1`
    fn assignment_targets(&self, assignment: Node, targets: &mut Vec<String>) {
        if let Some(left) = assignment.child_by_field_name("left") {
            if left.kind() == "identifier" {
                targets.push(self.text(left).to_string());
            }
        }
        if let Some(right) = assignment.child_by_field_name("right") {
            if right.kind() == "assignment" {
                self.assignment_targets(right, targets);
            }
        }
    }

    fn field_text(&self, node: Node, field: &str) -> Option<&'a str> {
        node.child_by_field_name(field).map(|n| self.text(n))
    }

    fn text(&self, node: Node) -> &'a str {
        node.utf8_text(self.source).unwrap_or_default()
    }
}

/// First ERROR or MISSING node in document order
fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.has_error() || child.is_missing() {
            if let Some(found) = first_error(child) {
                return Some(found);
            }
        }
    }
    None
}

fn describe_error(node: Node, source: &[u8]) -> String {
    if node.is_missing() {
        return format!("missing {}", node.kind());
    }
    let text = node.utf8_text(source).unwrap_or_default();
    let snippet: String = text.lines().next().unwrap_or_default().chars().take(40).collect();
    if snippet.trim().is_empty() {
        "invalid syntax".to_string()
    } else {
        format!("invalid syntax near `{}`", snippet.trim())
    }
}

/// Decorator expressions without the leading `@`
fn decorator_texts(node: Node, source: &[u8]) -> Vec<String> {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .filter(|c| c.kind() == "decorator")
        .filter_map(|c| c.utf8_text(source).ok())
        .map(|text| text.trim_start_matches('@').trim().to_string())
        .collect()
}

fn base_classes(node: Node, source: &[u8]) -> Vec<String> {
    let Some(args) = node.child_by_field_name("superclasses") else {
        return Vec::new();
    };
    let mut cursor = args.walk();
    args.named_children(&mut cursor)
        .filter(|c| !matches!(c.kind(), "keyword_argument" | "comment"))
        .filter_map(|c| c.utf8_text(source).ok())
        .map(str::to_string)
        .collect()
}

/// Docstring of a module or block: its first statement, if that is a string
fn block_docstring(block: Node, source: &[u8]) -> Option<String> {
    let mut cursor = block.walk();
    let first = block
        .named_children(&mut cursor)
        .find(|c| c.kind() != "comment")?;
    if first.kind() != "expression_statement" {
        return None;
    }
    let expr = first.named_child(0)?;
    if expr.kind() != "string" {
        return None;
    }
    clean_docstring(expr.utf8_text(source).ok()?)
}

/// Strip prefix and quotes, then dedent the way Python's `inspect.cleandoc` does
fn clean_docstring(literal: &str) -> Option<String> {
    let unprefixed = literal.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    let body = ["\"\"\"", "'''", "\"", "'"]
        .iter()
        .find(|q| unprefixed.starts_with(**q) && unprefixed.len() >= 2 * q.len())
        .map(|q| &unprefixed[q.len()..unprefixed.len() - q.len()])?;

    let mut lines = body.lines();
    let first = lines.next().unwrap_or_default().trim().to_string();
    let rest: Vec<&str> = lines.collect();
    let indent = rest
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);

    let mut cleaned: Vec<String> = std::iter::once(first)
        .chain(rest.iter().map(|l| l.get(indent..).unwrap_or("").trim_end().to_string()))
        .collect();
    while cleaned.first().is_some_and(|l| l.is_empty()) {
        cleaned.remove(0);
    }
    while cleaned.last().is_some_and(|l| l.is_empty()) {
        cleaned.pop();
    }

    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.join("\n"))
    }
}

/// At least one letter, and every letter uppercase
fn is_constant_name(name: &str) -> bool {
    name.chars().any(char::is_alphabetic) && !name.chars().any(char::is_lowercase)
}
