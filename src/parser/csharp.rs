// C# extractor using text heuristics
//
// There is no grammar on this path. Declarations are found with regexes over
// comment/string-masked text and scoped by brace balancing. Results are best
// effort and the cost is bounded by picking a tier from the file size:
//
// - Minimal: type names and lines, over a line-capped prefix of the file
// - Partial: adds a few unscoped methods and capped `const` names
// - Full: brace-scoped members, usings, namespace and top-level functions

use crate::analysis::metrics::{csharp_decisions, CommentStyle, FileMetrics};
use crate::config::HeuristicConfig;
use crate::parser::ast::*;
use crate::parser::braces::{
    brace_balance, find_balanced_block, find_closing, split_top_level, BlockSpan,
};
use crate::parser::mask::mask_non_code;
use regex::{Captures, Regex};
use std::ops::Range;
use std::sync::LazyLock;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

static TYPE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:^|[\s{};\]])((?:(?:public|private|protected|internal|static|abstract|sealed|partial|readonly|unsafe|new|file|ref)\s+)*)(class|interface|struct|enum|record(?:\s+(?:class|struct))?)\s+([A-Za-z_]\w*)",
    )
    .unwrap()
});

static METHOD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:^|[\s{};\]])((?:(?:public|private|protected|internal|static|virtual|override|abstract|sealed|async|extern|unsafe|new|partial|readonly)\s+)*)(?:(\([^;{}()]*\)\??|[A-Za-z_][\w.]*(?:<[^;{}()=]*?>)?(?:\[[\s,]*\])*\??)\s+)?([A-Za-z_]\w*)\s*(?:<[^;{}()=]*?>)?\s*\(",
    )
    .unwrap()
});

static PROPERTY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:^|[\s{};\]])(?:(?:public|private|protected|internal|static|virtual|override|abstract|sealed|new|required|readonly)\s+)*([A-Za-z_][\w.]*(?:<[^;{}()=]*?>)?(?:\[[\s,]*\])*\??)\s+([A-Za-z_]\w*)\s*\{\s*(?:(?:public|private|protected|internal)\s+)*(?:get|set|init)\b",
    )
    .unwrap()
});

static CONST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bconst\s+[A-Za-z_][\w.]*(?:<[^;{}()=]*?>)?\??\s+([A-Za-z_]\w*)\s*=").unwrap()
});

static STATIC_READONLY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:static\s+readonly|readonly\s+static)\s+[A-Za-z_][\w.]*(?:<[^;{}()=]*?>)?(?:\[[\s,]*\])*\??\s+([A-Za-z_]\w*)\s*[=;]",
    )
    .unwrap()
});

static USING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^[ \t]*(?:global[ \t]+)?using[ \t]+(?:static[ \t]+)?[A-Za-z_][\w.]*(?:[ \t]*=[ \t]*[A-Za-z_][\w.<>, ]*)?[ \t]*;",
    )
    .unwrap()
});

static NAMESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bnamespace\s+([A-Za-z_][\w.]*)").unwrap());

static WHERE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bwhere\b").unwrap());

static XML_TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

/// Words that can precede `(` but never name a method or its return type
const KEYWORDS: &[&str] = &[
    "as", "await", "base", "case", "catch", "checked", "class", "default", "delegate", "do",
    "else", "enum", "event", "finally", "fixed", "for", "foreach", "get", "goto", "if", "in",
    "init", "interface", "is", "lock", "nameof", "namespace", "new", "operator", "out", "record",
    "ref", "return", "set", "sizeof", "stackalloc", "struct", "switch", "this", "throw", "try",
    "typeof", "unchecked", "using", "var", "when", "where", "while", "with", "yield",
];

fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

/// Heuristic extractor for C# source files
#[derive(Debug, Clone, Default)]
pub struct CSharpExtractor {
    limits: HeuristicConfig,
}

impl CSharpExtractor {
    pub fn new(limits: HeuristicConfig) -> Self {
        Self { limits }
    }

    /// Extract a model at `tier`, or at the tier chosen from the file size.
    ///
    /// Never fails: whatever could be recovered is returned, tagged with the
    /// tier used and whether the result was cut short.
    pub fn extract(&self, file: &SourceFile, tier: Option<Tier>) -> SourceModel {
        let tier = tier.unwrap_or_else(|| self.limits.tier_for_size(file.content.len()));
        let budget = Budget::start(self.limits.time_budget());

        let mut model = SourceModel::new(file.path.clone(), SourceLanguage::CSharp, file.last_modified);
        model.tier = Some(tier);
        model.metrics = FileMetrics::from_source(&file.content, CommentStyle::CFamily);

        let text = if tier == Tier::Minimal {
            let (head, truncated) = truncate_lines(&file.content, self.limits.minimal_line_limit);
            if truncated {
                model.completeness = Completeness::Truncated;
            }
            head
        } else {
            file.content.as_str()
        };

        let scan = Scan::new(text);
        model.metrics.add_decisions(csharp_decisions(&scan.masked));
        model.doc_comment = file_doc_comment(&file.content);

        let types = scan.top_level_types();
        let finished = match tier {
            Tier::Minimal => self.extract_minimal(&scan, &types, &mut model, &budget),
            Tier::Partial => self.extract_partial(&scan, &types, &mut model, &budget),
            Tier::Full => self.extract_full(&scan, &types, &mut model, &budget),
        };

        if !finished {
            warn!(
                path = %file.path.display(),
                budget_ms = self.limits.time_budget_ms,
                "time budget exceeded, returning partial model"
            );
            model.completeness = Completeness::TimedOut;
        }

        debug!(
            path = %file.path.display(),
            tier = tier.as_str(),
            classes = model.classes.len(),
            methods = model.method_count(),
            "extracted csharp file"
        );

        model
    }

    fn extract_minimal(&self, scan: &Scan, types: &[TypeDecl], model: &mut SourceModel, budget: &Budget) -> bool {
        for decl in types {
            if budget.exhausted() {
                return false;
            }
            model.classes.push(decl.signature(scan));
        }
        true
    }

    /// Unscoped scan: methods go to the nearest preceding type, not brace-verified
    fn extract_partial(&self, scan: &Scan, types: &[TypeDecl], model: &mut SourceModel, budget: &Budget) -> bool {
        if !self.extract_minimal(scan, types, model, budget) {
            return false;
        }

        let mut found = 0;
        for candidate in scan.method_candidates(0..scan.masked.len()) {
            if found >= self.limits.partial_method_limit {
                break;
            }
            if budget.exhausted() {
                return false;
            }
            if candidate.return_type.is_none() {
                continue;
            }

            let owner = types.partition_point(|t| t.start < candidate.start);
            let function = candidate.into_signature(Vec::new(), None);
            match owner.checked_sub(1) {
                Some(index) => model.classes[index].methods.push(function),
                None => model.functions.push(function),
            }
            found += 1;
        }

        for caps in CONST_RE.captures_iter(&scan.masked) {
            if model.constants.len() >= self.limits.partial_constant_limit {
                break;
            }
            model.add_constant(&caps[1]);
        }

        true
    }

    fn extract_full(&self, scan: &Scan, types: &[TypeDecl], model: &mut SourceModel, budget: &Budget) -> bool {
        model.namespace = NAMESPACE_RE
            .captures(&scan.masked)
            .map(|caps| caps[1].to_string());

        for m in USING_RE.find_iter(&scan.masked) {
            if scan.inside_type(types, m.start()) {
                continue;
            }
            let directive = scan.text[m.range()].trim().trim_end_matches(';');
            model.imports.push(directive.split_whitespace().collect::<Vec<_>>().join(" "));
        }

        for decl in types {
            if budget.exhausted() {
                return false;
            }
            let mut class = decl.signature(scan);
            class.base_types = decl.base_types(scan);
            let (decorators, doc) = scan.annotations(decl.start);
            class.decorators = decorators;
            class.doc_comment = doc;

            if let Some(body) = decl.body {
                if !self.collect_members(scan, decl, body, &mut class, model, budget) {
                    model.classes.push(class);
                    return false;
                }
            }
            model.classes.push(class);
        }

        self.collect_top_level_functions(scan, types, model, budget)
    }

    /// Members declared directly in `body`, at brace depth 1
    fn collect_members(
        &self,
        scan: &Scan,
        decl: &TypeDecl,
        body: BlockSpan,
        class: &mut ClassSignature,
        model: &mut SourceModel,
        budget: &Budget,
    ) -> bool {
        let range = body.body();
        let direct = |offset: usize| brace_balance(&scan.masked, range.start, offset) == 0;

        for candidate in scan.method_candidates(range.clone()) {
            if budget.exhausted() {
                return false;
            }
            if !direct(candidate.start) {
                continue;
            }
            // no return type: only a constructor of this class
            if candidate.return_type.is_none() && candidate.name != decl.name {
                continue;
            }
            let (decorators, doc) = scan.annotations(candidate.start);
            class.methods.push(candidate.into_signature(decorators, doc));
        }

        let slice = &scan.masked[range.clone()];
        for caps in PROPERTY_RE.captures_iter(slice) {
            let (Some(ty), Some(name)) = (caps.get(1), caps.get(2)) else {
                continue;
            };
            if is_keyword(ty.as_str()) || is_keyword(name.as_str()) {
                continue;
            }
            if direct(range.start + ty.start()) {
                class.add_field(name.as_str());
            }
        }

        for re in [&*CONST_RE, &*STATIC_READONLY_RE] {
            for caps in re.captures_iter(slice) {
                if let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) {
                    if direct(range.start + whole.start()) {
                        model.add_constant(name.as_str());
                    }
                }
            }
        }

        true
    }

    /// Functions outside every type body (top-level statements files)
    fn collect_top_level_functions(
        &self,
        scan: &Scan,
        types: &[TypeDecl],
        model: &mut SourceModel,
        budget: &Budget,
    ) -> bool {
        let mut bodies: Vec<BlockSpan> = Vec::new();

        for candidate in scan.method_candidates(0..scan.masked.len()) {
            if budget.exhausted() {
                return false;
            }
            if candidate.return_type.is_none()
                || scan.inside_type(types, candidate.start)
                || bodies.iter().any(|b| b.contains(candidate.start))
            {
                continue;
            }
            if let Some(body) = candidate.body {
                bodies.push(body);
            }
            model.functions.push(candidate.into_signature(Vec::new(), None));
        }

        true
    }
}

/// Soft per-file time limit, checked between units of work
struct Budget {
    started: Instant,
    limit: Duration,
}

impl Budget {
    fn start(limit: Duration) -> Self {
        Self {
            started: Instant::now(),
            limit,
        }
    }

    fn exhausted(&self) -> bool {
        self.started.elapsed() >= self.limit
    }
}

/// A type declaration found in masked text
#[derive(Debug, Clone)]
struct TypeDecl {
    name: String,
    kind: TypeKind,
    /// Start of the modifiers, or of the keyword when there are none
    start: usize,
    /// Text between the name and the `{` or `;`
    header: Range<usize>,
    body: Option<BlockSpan>,
}

impl TypeDecl {
    fn signature(&self, scan: &Scan) -> ClassSignature {
        let mut class = ClassSignature::new(&self.name, scan.lines.line_number(self.start));
        class.kind = self.kind;
        class
    }

    /// Base list after `:`, skipping generic parameters and a primary constructor
    fn base_types(&self, scan: &Scan) -> Vec<String> {
        let header = &scan.masked[self.header.clone()];
        let mut rest = header.trim_start();

        for (open, close) in [(b'<', b'>'), (b'(', b')')] {
            if rest.as_bytes().first() == Some(&open) {
                match find_closing(rest, 0, open, close) {
                    Some(end) => rest = rest[end + 1..].trim_start(),
                    None => return Vec::new(),
                }
            }
        }

        let Some(list) = rest.strip_prefix(':') else {
            return Vec::new();
        };
        let list = match WHERE_RE.find(list) {
            Some(m) => &list[..m.start()],
            None => list,
        };
        split_top_level(list)
            .into_iter()
            .map(|base| base.split_whitespace().collect::<Vec<_>>().join(" "))
            .collect()
    }
}

/// A method-shaped match that passed the syntactic checks
#[derive(Debug, Clone)]
struct MethodCandidate {
    start: usize,
    name: String,
    return_type: Option<String>,
    is_async: bool,
    parameters: Vec<String>,
    line: usize,
    body: Option<BlockSpan>,
}

impl MethodCandidate {
    fn into_signature(self, decorators: Vec<String>, doc_comment: Option<String>) -> FunctionSignature {
        let mut function = FunctionSignature::new(&self.name, self.line);
        function.parameters = self.parameters;
        function.return_type = self.return_type;
        function.is_async = self.is_async;
        function.decorators = decorators;
        function.doc_comment = doc_comment;
        function
    }
}

/// Byte offsets of line starts
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(text: &str) -> Self {
        let starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { starts }
    }

    /// 0-based line containing `offset`
    fn line_of(&self, offset: usize) -> usize {
        self.starts.partition_point(|&s| s <= offset).saturating_sub(1)
    }

    /// 1-based line number
    fn line_number(&self, offset: usize) -> usize {
        self.line_of(offset) + 1
    }

    fn line<'t>(&self, text: &'t str, index: usize) -> &'t str {
        let start = self.starts[index];
        let end = self.starts.get(index + 1).copied().unwrap_or(text.len());
        &text[start..end]
    }
}

/// Original and masked text of one file, with line offsets
struct Scan<'a> {
    text: &'a str,
    masked: String,
    lines: LineIndex,
}

impl<'a> Scan<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            masked: mask_non_code(text),
            lines: LineIndex::new(text),
        }
    }

    /// Type declarations not nested in an earlier top-level type
    fn top_level_types(&self) -> Vec<TypeDecl> {
        let mut top: Vec<TypeDecl> = Vec::new();

        for caps in TYPE_RE.captures_iter(&self.masked) {
            let (Some(modifiers), Some(keyword), Some(name)) = (caps.get(1), caps.get(2), caps.get(3)) else {
                continue;
            };
            if is_keyword(name.as_str()) {
                continue;
            }
            let start = modifiers.start().min(keyword.start());
            // `where T : class` in a header, or a member of the previous type
            let nested = top.last().is_some_and(|prev| {
                prev.header.contains(&start) || brace_balance(&self.masked, prev.start, start) > 0
            });
            if nested {
                continue;
            }

            let name_end = name.end();
            // `record` is also an ordinary identifier
            if keyword.as_str().starts_with("record") {
                let next = self.masked[name_end..].trim_start().bytes().next();
                if !matches!(next, Some(b'(' | b'{' | b':' | b'<' | b';')) {
                    continue;
                }
            }
            let terminator = self.masked[name_end..]
                .find(['{', ';'])
                .map(|i| name_end + i);
            let (header_end, body) = match terminator {
                Some(at) if self.masked.as_bytes()[at] == b'{' => {
                    (at, find_balanced_block(&self.masked, at))
                }
                Some(at) => (at, None),
                None => (self.masked.len(), None),
            };

            top.push(TypeDecl {
                name: name.as_str().to_string(),
                kind: TypeKind::from_keyword(keyword.as_str()),
                start,
                header: name_end..header_end,
                body,
            });
        }

        top
    }

    /// Whether `offset` is inside the body of the nearest preceding type
    fn inside_type(&self, types: &[TypeDecl], offset: usize) -> bool {
        let preceding = types.partition_point(|t| t.start < offset);
        match preceding.checked_sub(1) {
            Some(index) => brace_balance(&self.masked, types[index].start, offset) > 0,
            None => false,
        }
    }

    fn method_candidates(&self, range: Range<usize>) -> impl Iterator<Item = MethodCandidate> + '_ {
        let base = range.start;
        METHOD_RE
            .captures_iter(&self.masked[range])
            .filter_map(move |caps| self.method_candidate(&caps, base))
    }

    fn method_candidate(&self, caps: &Captures, base: usize) -> Option<MethodCandidate> {
        let whole = caps.get(0)?;
        let modifiers = caps.get(1)?;
        let name = caps.get(3)?;
        let return_type = caps.get(2).map(|t| t.as_str().trim().to_string());
        let start = base + modifiers.start();

        if is_keyword(name.as_str()) || return_type.as_deref().is_some_and(is_keyword) {
            return None;
        }

        // must begin a member or statement, not sit inside an expression
        let before = self.masked[..start].trim_end();
        if !matches!(before.as_bytes().last().copied(), None | Some(b'{' | b'}' | b';' | b']')) {
            return None;
        }

        let open = base + whole.end() - 1;
        let close = find_closing(&self.masked, open, b'(', b')')?;
        let after = self.masked[close + 1..].trim_start();
        let body = if after.starts_with('{') {
            find_balanced_block(&self.masked, close + 1)
        } else {
            None
        };

        let accepted = match return_type {
            Some(_) => {
                body.is_some()
                    || after.starts_with("=>")
                    || after.starts_with(';')
                    || WHERE_RE.find(after).is_some_and(|m| m.start() == 0)
            }
            // constructor: body, expression body or `: base(...)` chaining
            None => {
                body.is_some()
                    || after.starts_with("=>")
                    || (after.starts_with(':') && !after.starts_with("::"))
            }
        };
        if !accepted {
            return None;
        }

        let parameters = split_top_level(&self.masked[open + 1..close])
            .into_iter()
            .filter_map(parameter_name)
            .collect();

        Some(MethodCandidate {
            start,
            name: name.as_str().to_string(),
            is_async: modifiers.as_str().split_whitespace().any(|m| m == "async"),
            return_type,
            parameters,
            line: self.lines.line_number(base + name.start()),
            body,
        })
    }

    /// Attributes and `///` docs attached to the declaration at `start`
    fn annotations(&self, start: usize) -> (Vec<String>, Option<String>) {
        let line = self.lines.line_of(start);
        let line_start = self.lines.starts[line];

        let Some(mut decorators) = attribute_groups(&self.text[line_start..start]) else {
            return (Vec::new(), None);
        };

        let mut above: Vec<Vec<String>> = Vec::new();
        let mut doc_lines: Vec<&str> = Vec::new();
        for index in (0..line).rev() {
            let trimmed = self.lines.line(self.text, index).trim();
            if let Some(doc) = trimmed.strip_prefix("///") {
                doc_lines.push(doc);
            } else if trimmed.starts_with('[') {
                match attribute_groups(trimmed) {
                    Some(groups) => above.push(groups),
                    None => break,
                }
            } else {
                break;
            }
        }

        above.reverse();
        let mut all: Vec<String> = above.into_iter().flatten().collect();
        all.append(&mut decorators);
        doc_lines.reverse();

        (all, clean_xml_doc(&doc_lines))
    }
}

/// Split `[A, B(x)] [C]` into attribute texts; `None` if anything else is present
fn attribute_groups(text: &str) -> Option<Vec<String>> {
    let mut rest = text.trim();
    let mut groups = Vec::new();

    while !rest.is_empty() {
        if !rest.starts_with('[') {
            return None;
        }
        let close = find_closing(rest, 0, b'[', b']')?;
        groups.extend(split_top_level(&rest[1..close]).into_iter().map(str::to_string));
        rest = rest[close + 1..].trim_start();
    }

    Some(groups)
}

/// `this ILogger<T> logger = null` -> `logger`
fn parameter_name(param: &str) -> Option<String> {
    let mut rest = param.trim();
    while rest.starts_with('[') {
        let close = find_closing(rest, 0, b'[', b']')?;
        rest = rest[close + 1..].trim_start();
    }
    let declaration = rest.split('=').next().unwrap_or(rest);
    declaration
        .split_whitespace()
        .last()
        .map(|name| name.trim_start_matches('@').to_string())
        .filter(|name| !name.is_empty())
}

/// Keep the first `limit` lines; the flag is set when text was cut
fn truncate_lines(text: &str, limit: usize) -> (&str, bool) {
    match text.match_indices('\n').nth(limit.max(1) - 1) {
        Some((at, _)) if at + 1 < text.len() => (&text[..at + 1], true),
        _ => (text, false),
    }
}

/// File documentation: the first `///` run or `/** */` block anywhere,
/// otherwise the `//` lines at the very top of the file
fn file_doc_comment(text: &str) -> Option<String> {
    let lines: Vec<&str> = text.lines().collect();

    for (index, line) in lines.iter().enumerate() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("///") {
            let run: Vec<&str> = lines[index..]
                .iter()
                .map(|l| l.trim_start())
                .take_while(|l| l.starts_with("///"))
                .map(|l| &l[3..])
                .collect();
            return clean_xml_doc(&run);
        }
        if trimmed.starts_with("/**") {
            let mut block = Vec::new();
            for l in &lines[index..] {
                let l = l.trim();
                let done = l.contains("*/");
                let content = l
                    .trim_start_matches("/**")
                    .split("*/")
                    .next()
                    .unwrap_or_default()
                    .trim_start_matches('*');
                block.push(content);
                if done {
                    break;
                }
            }
            return clean_xml_doc(&block);
        }
    }

    let header: Vec<&str> = lines
        .iter()
        .map(|l| l.trim())
        .skip_while(|l| l.is_empty())
        .take_while(|l| l.starts_with("//"))
        .map(|l| l.trim_start_matches('/').trim())
        .filter(|l| !l.is_empty())
        .collect();
    if header.is_empty() {
        None
    } else {
        Some(header.join("\n"))
    }
}

/// Doc text with XML tags removed; `<summary>` content wins when present
fn clean_xml_doc(lines: &[&str]) -> Option<String> {
    if lines.is_empty() {
        return None;
    }
    let joined = lines.join("\n");
    let focus = match (joined.find("<summary>"), joined.find("</summary>")) {
        (Some(open), Some(close)) if open < close => &joined[open + "<summary>".len()..close],
        _ => joined.as_str(),
    };
    let stripped = XML_TAG_RE.replace_all(focus, "");
    let cleaned: Vec<&str> = stripped
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.join("\n"))
    }
}
