//! Python structure via tree-sitter.
//!
//! A tree containing error or missing nodes is reported as a parse failure so callers can fall
//! back the same way they would for a hard syntax error.

use std::collections::VecDeque;

use tree_sitter::{Language, Node, Parser, Tree};

use crate::error::{Error, Result};

/// Imports and declared names of one source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outline {
    pub imports: Vec<String>,
    pub type_names: Vec<String>,
    pub callable_names: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    /// An import statement, or a module-level `try`/`if`/`with` block guarding imports
    Import,
    Type,
    Callable,
}

/// A declaration with its 0-based, inclusive line span (decorators included).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub kind: DeclarationKind,
    pub name: String,
    pub start_line: usize,
    pub end_line: usize,
    /// Direct child of the module node
    pub top_level: bool,
}

impl Declaration {
    pub fn lines(&self) -> std::ops::RangeInclusive<usize> {
        self.start_line..=self.end_line
    }

    /// Whether `other` lies entirely inside this declaration's span.
    pub fn contains(&self, other: &Declaration) -> bool {
        self.start_line <= other.start_line && other.end_line <= self.end_line
    }
}

fn parse(source: &str) -> Result<Tree> {
    let language: Language = tree_sitter_python::LANGUAGE.into();
    let mut parser = Parser::new();
    parser
        .set_language(&language)
        .map_err(|e| Error::malformed("python grammar", format!("{:?}", e)))?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| Error::malformed("python source", "parser produced no tree"))?;

    let root = tree.root_node();
    if root.has_error() {
        let line = first_error_line(root).map(|l| l + 1).unwrap_or(0);
        return Err(Error::malformed(
            "python source",
            format!("syntax error near line {}", line),
        ));
    }
    // the grammar tolerates an indented module body, the interpreter does not
    if let Some(line) = first_indented_statement(root, source) {
        return Err(Error::malformed(
            "python source",
            format!("unexpected indent at line {}", line + 1),
        ));
    }
    Ok(tree)
}

/// Row of the first module-level statement that opens its line with whitespace.
fn first_indented_statement(root: Node<'_>, source: &str) -> Option<usize> {
    let mut cursor = root.walk();
    root.named_children(&mut cursor)
        .filter(|child| child.kind() != "comment" && child.start_position().column > 0)
        .find(|child| {
            let start = child.start_byte();
            let line_start = source[..start].rfind('\n').map_or(0, |i| i + 1);
            source[line_start..start].trim().is_empty()
        })
        .map(|child| child.start_position().row)
}

fn first_error_line(node: Node<'_>) -> Option<usize> {
    if node.is_error() || node.is_missing() {
        return Some(node.start_position().row);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.has_error() {
            if let Some(line) = first_error_line(child) {
                return Some(line);
            }
        }
    }
    None
}

/// Parse-only validity check.
pub fn is_valid(source: &str) -> bool {
    parse(source).is_ok()
}

/// Extracts imports, class names and function names, walking the tree breadth first so
/// module-level names come before nested ones.
pub fn outline(source: &str) -> Result<Outline> {
    let tree = parse(source)?;
    let mut outline = Outline::default();

    let mut queue = VecDeque::new();
    queue.push_back(tree.root_node());
    while let Some(node) = queue.pop_front() {
        match node.kind() {
            "import_statement" | "import_from_statement" | "future_import_statement" => {
                outline.imports.extend(import_names(node, source));
            }
            "class_definition" => {
                if let Some(name) = declared_name(node, source) {
                    outline.type_names.push(name);
                }
            }
            "function_definition" => {
                if let Some(name) = declared_name(node, source) {
                    outline.callable_names.push(name);
                }
            }
            _ => {}
        }

        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            queue.push_back(child);
        }
    }

    Ok(outline)
}

/// Lists every import, class and function declaration with its line span, in source order.
pub fn declarations(source: &str) -> Result<Vec<Declaration>> {
    let tree = parse(source)?;
    let mut out = Vec::new();
    collect_declarations(tree.root_node(), source, true, &mut out);
    Ok(out)
}

/// `top_level` is set only for the children of the module node itself.
fn collect_declarations(
    node: Node<'_>,
    source: &str,
    top_level: bool,
    out: &mut Vec<Declaration>,
) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "import_statement" | "import_from_statement" | "future_import_statement" => {
                out.push(Declaration {
                    kind: DeclarationKind::Import,
                    name: text(child, source).to_string(),
                    start_line: child.start_position().row,
                    end_line: end_line(child),
                    top_level,
                });
            }
            "decorated_definition" => {
                if let Some(definition) = child.child_by_field_name("definition") {
                    push_definition(child, definition, source, top_level, out);
                    collect_declarations(definition, source, false, out);
                }
            }
            "class_definition" | "function_definition" => {
                push_definition(child, child, source, top_level, out);
                collect_declarations(child, source, false, out);
            }
            "try_statement" | "if_statement" | "with_statement"
                if top_level && contains_import(child) =>
            {
                out.push(Declaration {
                    kind: DeclarationKind::Import,
                    name: text(child, source).to_string(),
                    start_line: child.start_position().row,
                    end_line: end_line(child),
                    top_level,
                });
                collect_declarations(child, source, false, out);
            }
            _ => collect_declarations(child, source, false, out),
        }
    }
}

/// Whether an import appears in `node` outside any nested class or function.
fn contains_import(node: Node<'_>) -> bool {
    let mut cursor = node.walk();
    let found = node.named_children(&mut cursor).any(|child| match child.kind() {
        "import_statement" | "import_from_statement" | "future_import_statement" => true,
        "class_definition" | "function_definition" | "decorated_definition" => false,
        _ => contains_import(child),
    });
    found
}

/// `span` carries the line range (the decorated wrapper when present), `definition` the name.
fn push_definition(
    span: Node<'_>,
    definition: Node<'_>,
    source: &str,
    top_level: bool,
    out: &mut Vec<Declaration>,
) {
    let kind = match definition.kind() {
        "class_definition" => DeclarationKind::Type,
        "function_definition" => DeclarationKind::Callable,
        _ => return,
    };
    let Some(name) = declared_name(definition, source) else {
        return;
    };
    out.push(Declaration {
        kind,
        name,
        start_line: span.start_position().row,
        end_line: end_line(span),
        top_level,
    });
}

fn end_line(node: Node<'_>) -> usize {
    let start = node.start_position().row;
    let end = node.end_position();
    if end.column == 0 && end.row > start {
        end.row - 1
    } else {
        end.row
    }
}

fn declared_name(node: Node<'_>, source: &str) -> Option<String> {
    node.child_by_field_name("name")
        .map(|name| text(name, source).to_string())
}

fn text<'a>(node: Node<'_>, source: &'a str) -> &'a str {
    &source[node.byte_range()]
}

/// Flattens an import statement into dotted names (`from a import b` -> `a.b`).
fn import_names(node: Node<'_>, source: &str) -> Vec<String> {
    let module = match node.kind() {
        "import_from_statement" => node
            .child_by_field_name("module_name")
            .map(|m| text(m, source).trim_start_matches('.').to_string())
            .unwrap_or_default(),
        "future_import_statement" => "__future__".to_string(),
        _ => String::new(),
    };

    let mut names = Vec::new();
    let mut cursor = node.walk();
    for name_node in node.children_by_field_name("name", &mut cursor) {
        let name = match name_node.kind() {
            "aliased_import" => name_node
                .child_by_field_name("name")
                .map(|n| text(n, source).to_string()),
            _ => Some(text(name_node, source).to_string()),
        };
        if let Some(name) = name {
            names.push(name);
        }
    }

    let mut cursor = node.walk();
    if node
        .named_children(&mut cursor)
        .any(|c| c.kind() == "wildcard_import")
    {
        names.push("*".to_string());
    }

    if module.is_empty() {
        names
    } else {
        names
            .into_iter()
            .map(|name| format!("{}.{}", module, name))
            .collect()
    }
}
