// SPDX-License-Identifier: Apache-2.0

//! Static inspection of `noxfile.py`: syntax tree, shebang and the
//! `# /// script` inline metadata block. Nothing is executed.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};
use tree_sitter::{Node, Parser, Point, Tree, TreeCursor};

use crate::error::ScriptError;

const BLOCK_PATTERN: &str =
    r"(?m)^# /// (?P<type>[a-zA-Z0-9-]+)$\s(?P<content>(^#(| .*)$\s)+)^# ///$";

static BLOCK_REGEX: OnceLock<Result<Regex, String>> = OnceLock::new();

fn block_regex() -> Result<&'static Regex, ScriptError> {
    BLOCK_REGEX
        .get_or_init(|| Regex::new(BLOCK_PATTERN).map_err(|err| err.to_string()))
        .as_ref()
        .map_err(|detail| ScriptError::Metadata {
            detail: detail.clone(),
        })
}

/// Interior text of the single `# /// {kind}` block, comment leaders removed.
pub fn extract_script_block(source: &str, kind: &str) -> Result<Option<String>, ScriptError> {
    let matches = block_regex()?
        .captures_iter(source)
        .filter(|caps| caps.name("type").is_some_and(|found| found.as_str() == kind))
        .collect::<Vec<_>>();
    match matches.as_slice() {
        [] => Ok(None),
        [only] => {
            let content = only.name("content").map_or("", |found| found.as_str());
            let stripped = content
                .split_inclusive('\n')
                .map(|line| line.strip_prefix("# ").unwrap_or_else(|| &line[1..]))
                .collect::<String>();
            Ok(Some(stripped))
        }
        _ => Err(ScriptError::MultipleBlocks {
            kind: kind.to_string(),
        }),
    }
}

pub fn parse_script_block(text: &str) -> Result<Value, ScriptError> {
    toml::from_str::<Value>(text).map_err(|err| ScriptError::Metadata {
        detail: err.to_string(),
    })
}

/// The first line, when it is a `#!` line terminated by a newline.
fn shebang_line(source: &str) -> String {
    match source.split_once('\n') {
        Some((first, _)) if first.starts_with("#!") => first.trim().to_string(),
        _ => String::new(),
    }
}

fn first_error_position(root: Node<'_>) -> Point {
    let mut cursor = root.walk();
    loop {
        let node = cursor.node();
        if node.is_error() || node.is_missing() {
            return node.start_position();
        }
        if node.has_error() && cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return root.start_position();
            }
        }
    }
}

fn parse_python(source: &str) -> Result<Tree, ScriptError> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|err| ScriptError::Grammar {
            detail: err.to_string(),
        })?;
    let tree = parser
        .parse(source, None)
        .ok_or_else(|| ScriptError::Grammar {
            detail: "parser returned no tree".to_string(),
        })?;
    let root = tree.root_node();
    let invalid = if root.has_error() {
        Some(first_error_position(root))
    } else {
        first_invalid_construct(root)
    };
    if let Some(at) = invalid {
        return Err(ScriptError::Syntax {
            line: at.row + 1,
            column: at.column + 1,
        });
    }
    Ok(tree)
}

/// Constructs the grammar accepts but Python 3 rejects: Python 2 `print`
/// and `exec` statements, a bare `:=` statement, and call arguments out of
/// order.
fn first_invalid_construct(node: Node<'_>) -> Option<Point> {
    match node.kind() {
        "print_statement" | "exec_statement" => return Some(node.start_position()),
        "named_expression"
            if node
                .parent()
                .is_some_and(|parent| parent.kind() == "expression_statement") =>
        {
            return Some(node.start_position());
        }
        "argument_list" => {
            if let Some(at) = misordered_argument(node) {
                return Some(at);
            }
        }
        _ => {}
    }
    let mut cursor = node.walk();
    let children = node.named_children(&mut cursor).collect::<Vec<_>>();
    children.into_iter().find_map(first_invalid_construct)
}

fn misordered_argument(arguments: Node<'_>) -> Option<Point> {
    let mut seen_keyword = false;
    let mut seen_double_splat = false;
    let mut cursor = arguments.walk();
    for argument in arguments.named_children(&mut cursor) {
        match argument.kind() {
            "comment" => {}
            "keyword_argument" => seen_keyword = true,
            "dictionary_splat" => seen_double_splat = true,
            "list_splat" if seen_double_splat => return Some(argument.start_position()),
            "list_splat" => {}
            _ if seen_keyword || seen_double_splat => return Some(argument.start_position()),
            _ => {}
        }
    }
    None
}

/// Parsed view of an automation script.
///
/// Equality is structural: same shebang, same metadata block, and the same
/// syntax tree including every node position.
#[derive(Clone)]
pub struct ScriptInfo {
    source: String,
    tree: Tree,
    shebang: String,
    script: Value,
}

pub fn analyze_script(source: &str) -> Result<ScriptInfo, ScriptError> {
    let tree = parse_python(source)?;
    let script = match extract_script_block(source, "script")? {
        Some(block) => parse_script_block(&block)?,
        None => Value::Object(Map::new()),
    };
    Ok(ScriptInfo {
        source: source.to_string(),
        tree,
        shebang: shebang_line(source),
        script,
    })
}

fn node_text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    source.get(node.byte_range()).unwrap_or_default()
}

fn unwrap_parens(mut node: Node<'_>) -> Node<'_> {
    while node.kind() == "parenthesized_expression" {
        match node.named_child(0) {
            Some(inner) => node = inner,
            None => break,
        }
    }
    node
}

fn dotted_path<'s>(node: Node<'_>, source: &'s str) -> Option<Vec<&'s str>> {
    match node.kind() {
        "identifier" => Some(vec![node_text(node, source)]),
        "attribute" => {
            let mut path = dotted_path(node.child_by_field_name("object")?, source)?;
            path.push(node_text(node.child_by_field_name("attribute")?, source));
            Some(path)
        }
        _ => None,
    }
}

/// Decodes the backslash escapes of a non-raw string body.
///
/// `\N{...}` names are not resolved and make the literal unreadable.
fn decode_escapes(raw: &str) -> Option<String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(escape) = chars.next() else {
            out.push('\\');
            break;
        };
        match escape {
            '\n' => {}
            '\\' | '\'' | '"' => out.push(escape),
            'a' => out.push('\u{7}'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'v' => out.push('\u{b}'),
            '0'..='7' => {
                let mut code = escape.to_digit(8)?;
                for _ in 0..2 {
                    match chars.peek().and_then(|next| next.to_digit(8)) {
                        Some(digit) => {
                            code = code * 8 + digit;
                            chars.next();
                        }
                        None => break,
                    }
                }
                out.push(char::from_u32(code)?);
            }
            'x' | 'u' | 'U' => {
                let width = match escape {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                let digits = (0..width).map(|_| chars.next()).collect::<Option<String>>()?;
                out.push(char::from_u32(u32::from_str_radix(&digits, 16).ok()?)?);
            }
            'N' => return None,
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }
    Some(out)
}

/// Value of a plain (non f-, non bytes) string literal, adjacent literals joined.
fn string_literal(node: Node<'_>, source: &str) -> Option<String> {
    if node.kind() == "concatenated_string" {
        let mut value = String::new();
        let mut cursor = node.walk();
        for part in node.named_children(&mut cursor) {
            if part.kind() != "comment" {
                value.push_str(&string_literal(part, source)?);
            }
        }
        return Some(value);
    }
    if node.kind() != "string" {
        return None;
    }
    let mut body = String::new();
    let mut is_raw = false;
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "string_start" => {
                let prefix = node_text(child, source).trim_end_matches(['"', '\'']);
                if prefix.chars().any(|c| !matches!(c, 'r' | 'R' | 'u' | 'U')) {
                    return None;
                }
                is_raw = prefix.contains(['r', 'R']);
            }
            "string_content" | "escape_sequence" => body.push_str(node_text(child, source)),
            "string_end" => {}
            _ => return None,
        }
    }
    if is_raw {
        Some(body)
    } else {
        decode_escapes(&body)
    }
}

fn assignment_targets(statement: Node<'_>) -> Vec<Node<'_>> {
    let mut targets = Vec::new();
    if statement.kind() != "expression_statement" {
        return targets;
    }
    let mut cursor = statement.walk();
    for child in statement.named_children(&mut cursor) {
        let mut current = Some(child);
        while let Some(node) = current {
            if node.kind() != "assignment" || node.child_by_field_name("type").is_some() {
                break;
            }
            if let Some(left) = node.child_by_field_name("left") {
                targets.push(left);
            }
            current = node.child_by_field_name("right");
        }
    }
    targets
}

fn is_main_guard(statement: Node<'_>, source: &str) -> bool {
    if statement.kind() != "if_statement" {
        return false;
    }
    let Some(condition) = statement.child_by_field_name("condition").map(unwrap_parens) else {
        return false;
    };
    if condition.kind() != "comparison_operator" {
        return false;
    }
    let mut cursor = condition.walk();
    let mut operands = Vec::new();
    let mut operators = Vec::new();
    for child in condition.children(&mut cursor) {
        if child.is_named() {
            if child.kind() != "comment" {
                operands.push(unwrap_parens(child));
            }
        } else {
            operators.push(child.kind());
        }
    }
    match (operands.as_slice(), operators.as_slice()) {
        ([left, right], ["=="]) => {
            left.kind() == "identifier"
                && node_text(*left, source) == "__name__"
                && string_literal(*right, source).as_deref() == Some("__main__")
        }
        _ => false,
    }
}

fn dump_node(cursor: &mut TreeCursor<'_>, source: &str, depth: usize, out: &mut String) {
    let node = cursor.node();
    out.push_str(&"  ".repeat(depth));
    if let Some(field) = cursor.field_name() {
        out.push_str(field);
        out.push_str(": ");
    }
    let start = node.start_position();
    let end = node.end_position();
    out.push_str(&format!(
        "{} [{}..{}] ({}:{}-{}:{})",
        node.kind(),
        node.start_byte(),
        node.end_byte(),
        start.row,
        start.column,
        end.row,
        end.column
    ));
    if node.child_count() == 0 {
        out.push_str(&format!(" {:?}", node_text(node, source)));
    }
    out.push('\n');
    if cursor.goto_first_child() {
        loop {
            dump_node(cursor, source, depth + 1, out);
            if !cursor.goto_next_sibling() {
                break;
            }
        }
        cursor.goto_parent();
    }
}

impl ScriptInfo {
    pub fn shebang(&self) -> &str {
        &self.shebang
    }

    /// Parsed `# /// script` block, an empty table when absent.
    pub fn script(&self) -> &Value {
        &self.script
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    fn top_level_statements(&self) -> Vec<Node<'_>> {
        let root = self.tree.root_node();
        let mut cursor = root.walk();
        let statements = root
            .named_children(&mut cursor)
            .filter(|node| node.kind() != "comment")
            .collect();
        statements
    }

    /// True when a module-level statement assigns to `dotted`, e.g. `nox.options.sessions`.
    pub fn assigns_attribute(&self, dotted: &str) -> bool {
        let wanted = dotted.split('.').collect::<Vec<_>>();
        self.top_level_statements().into_iter().any(|statement| {
            assignment_targets(statement)
                .into_iter()
                .filter_map(|target| dotted_path(target, &self.source))
                .any(|path| path == wanted)
        })
    }

    /// True when a module-level `if __name__ == "__main__":` exists.
    pub fn has_main_guard(&self) -> bool {
        self.top_level_statements()
            .into_iter()
            .any(|statement| is_main_guard(statement, &self.source))
    }

    /// Indented dump of every node with field names, positions and leaf text.
    pub fn syntax_dump(&self) -> String {
        let mut out = String::new();
        let mut cursor = self.tree.walk();
        dump_node(&mut cursor, &self.source, 0, &mut out);
        out
    }
}

impl PartialEq for ScriptInfo {
    fn eq(&self, other: &Self) -> bool {
        self.shebang == other.shebang
            && self.script == other.script
            && self.syntax_dump() == other.syntax_dump()
    }
}

impl fmt::Debug for ScriptInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptInfo")
            .field("shebang", &self.shebang)
            .field("script", &self.script)
            .field("tree", &self.tree.root_node().to_sexp())
            .finish()
    }
}
