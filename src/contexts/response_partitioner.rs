//! Splits raw generated text into imports, a page object section and a test section.
//!
//! Three strategies are tried in a fixed order and the first one that yields a non-empty page
//! object or test section wins:
//!
//! 1. delimiter markers, authoritative whenever they produce a section
//! 2. declarations from the parsed syntax tree, attributed by line span
//! 3. a line scan that tracks column-0 declarations and indentation
//!
//! When all three come up empty the whole input is returned as the test section, so content is
//! never dropped silently.

use std::collections::HashMap;

use tracing::debug;

use crate::config::PartitionConfig;
use crate::data::{Partition, PartitionTier, SectionKind};
use crate::syntax::{self, Declaration, DeclarationKind};

#[derive(Debug, Clone, Default)]
pub struct ResponsePartitioner {
    config: PartitionConfig,
}

impl ResponsePartitioner {
    pub fn new(config: PartitionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PartitionConfig {
        &self.config
    }

    /// Never fails; the degenerate result is the whole input as the test section.
    pub fn partition(&self, raw: &str) -> Partition {
        let result = self
            .by_markers(raw)
            .or_else(|| self.by_structure(raw))
            .or_else(|| self.by_indentation(raw))
            .unwrap_or_else(|| Partition {
                imports: String::new(),
                component: String::new(),
                test: raw.to_string(),
                tier: PartitionTier::Passthrough,
            });
        debug!(
            tier = ?result.tier,
            imports = result.imports.lines().count(),
            page_object = result.component.lines().count(),
            test = result.test.lines().count(),
            "response partitioned"
        );
        result
    }

    fn marker_at(&self, line: &str) -> Option<SectionKind> {
        if line.contains(&self.config.component_marker) {
            Some(SectionKind::Component)
        } else if line.contains(&self.config.test_marker) {
            Some(SectionKind::Test)
        } else {
            None
        }
    }

    fn by_markers(&self, raw: &str) -> Option<Partition> {
        if !raw.lines().any(|line| self.marker_at(line).is_some()) {
            return None;
        }

        let mut sections = Sections::default();
        let mut imports = ImportScanner::default();
        let mut current: Option<SectionKind> = None;

        for line in raw.lines() {
            if let Some(kind) = self.marker_at(line) {
                current = Some(kind);
                continue;
            }
            match current {
                // before the first marker only import statements are kept
                None => {
                    if imports.accepts(line) {
                        sections.imports.push(line);
                    }
                }
                Some(kind) => sections.push(kind, line),
            }
        }

        sections.finish(PartitionTier::Markers)
    }

    fn by_structure(&self, raw: &str) -> Option<Partition> {
        let declarations = match syntax::declarations(raw) {
            Ok(declarations) => declarations,
            Err(e) => {
                debug!(error = %e, "structural split unavailable");
                return None;
            }
        };
        let lines: Vec<&str> = raw.lines().collect();
        let mut claims: Vec<Option<SectionKind>> = vec![None; lines.len()];

        // nested declarations travel with whatever encloses them
        for declared in declarations.iter().filter(|d| d.top_level) {
            let kind = match declared.kind {
                DeclarationKind::Import => SectionKind::Imports,
                DeclarationKind::Type if has_prefix(&declared.name, &self.config.test_type_prefix) => {
                    SectionKind::Test
                }
                DeclarationKind::Type if declared.name.contains(&self.config.component_type_hint) => {
                    SectionKind::Component
                }
                DeclarationKind::Callable
                    if has_prefix(&declared.name, &self.config.test_callable_prefix) =>
                {
                    SectionKind::Test
                }
                _ => continue,
            };
            claim(&mut claims, declared, kind);
        }

        let mut sections = Sections::default();
        let mut last_line: HashMap<SectionKind, usize> = HashMap::new();
        for (at, (line, owner)) in lines.iter().zip(&claims).enumerate() {
            let Some(kind) = *owner else {
                continue;
            };
            // keep one blank line between declarations that were not adjacent
            if let Some(previous) = last_line.insert(kind, at) {
                if at > previous + 1 {
                    sections.push(kind, "");
                }
            }
            sections.push(kind, *line);
        }
        sections.finish(PartitionTier::Structural)
    }

    fn by_indentation(&self, raw: &str) -> Option<Partition> {
        let lines: Vec<&str> = raw.lines().collect();
        let mut sections = Sections::default();
        let mut imports = ImportScanner::default();
        let mut decorators: Vec<&str> = Vec::new();
        let mut decorator_depth: i32 = 0;
        let mut active: Option<SectionKind> = None;

        let mut i = 0;
        while i < lines.len() {
            let line = lines[i];
            let trimmed = line.trim();

            if let Some(kind) = active {
                if trimmed.is_empty() {
                    // a blank line only closes the block when what follows is back at column 0
                    let next = lines[i + 1..].iter().find(|l| !l.trim().is_empty());
                    match next {
                        Some(next) if indent_of(next) > 0 => sections.push(kind, line),
                        _ => active = None,
                    }
                    i += 1;
                    continue;
                }
                if indent_of(line) > 0 {
                    sections.push(kind, line);
                    i += 1;
                    continue;
                }
                // back at column 0: the block is over, look at this line again
                active = None;
                continue;
            }

            if !decorators.is_empty() && decorator_depth > 0 {
                decorators.push(line);
                decorator_depth += paren_balance(line);
                i += 1;
                continue;
            }

            if indent_of(line) == 0 && trimmed.starts_with('@') {
                decorators.push(line);
                decorator_depth = paren_balance(line);
                i += 1;
                continue;
            }

            if indent_of(line) == 0 {
                if let Some(kind) = self.opens_section(trimmed) {
                    for decorator in decorators.drain(..) {
                        sections.push(kind, decorator);
                    }
                    sections.push(kind, line);
                    active = Some(kind);
                    i += 1;
                    continue;
                }
            }

            decorators.clear();
            decorator_depth = 0;
            if imports.accepts(line) {
                sections.imports.push(line);
            }
            i += 1;
        }

        sections.finish(PartitionTier::Indentation)
    }

    /// Section opened by a column-0 declaration line, if any.
    fn opens_section(&self, line: &str) -> Option<SectionKind> {
        if let Some(rest) = line.strip_prefix("class ") {
            let name = identifier(rest);
            if has_prefix(name, &self.config.test_type_prefix) {
                return Some(SectionKind::Test);
            }
            if name.contains(&self.config.component_type_hint) {
                return Some(SectionKind::Component);
            }
            return None;
        }

        let def = line.strip_prefix("async ").map(str::trim_start).unwrap_or(line);
        let rest = def.strip_prefix("def ")?;
        has_prefix(identifier(rest), &self.config.test_callable_prefix).then_some(SectionKind::Test)
    }
}

/// `prefix` must end at a word boundary: `test` takes `testLogin` and `test2` but not `testing`.
/// A prefix already ending in `_` only needs to match.
fn has_prefix(name: &str, prefix: &str) -> bool {
    let Some(rest) = name.strip_prefix(prefix) else {
        return false;
    };
    prefix.ends_with('_') || !rest.starts_with(|c: char| c.is_lowercase())
}

fn claim(claims: &mut [Option<SectionKind>], declaration: &Declaration, kind: SectionKind) {
    for line in declaration.lines() {
        if let Some(slot) = claims.get_mut(line) {
            if slot.is_none() {
                *slot = Some(kind);
            }
        }
    }
}

fn identifier(text: &str) -> &str {
    let text = text.trim_start();
    let end = text
        .char_indices()
        .find(|(_, c)| !(c.is_alphanumeric() || *c == '_'))
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    &text[..end]
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

fn paren_balance(line: &str) -> i32 {
    line.chars().fold(0, |depth, c| match c {
        '(' | '[' | '{' => depth + 1,
        ')' | ']' | '}' => depth - 1,
        _ => depth,
    })
}

/// Whether a line starts an import statement.
pub fn is_import_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("import ") || (trimmed.starts_with("from ") && trimmed.contains(" import"))
}

/// Recognises import statements line by line, including parenthesized continuations.
#[derive(Debug, Default)]
struct ImportScanner {
    open_parens: i32,
}

impl ImportScanner {
    fn accepts(&mut self, line: &str) -> bool {
        if self.open_parens > 0 {
            self.open_parens += paren_balance(line);
            return true;
        }
        if is_import_line(line) {
            self.open_parens = paren_balance(line).max(0);
            return true;
        }
        false
    }
}

#[derive(Debug, Default)]
struct Sections<'a> {
    imports: Vec<&'a str>,
    component: Vec<&'a str>,
    test: Vec<&'a str>,
}

impl<'a> Sections<'a> {
    fn push(&mut self, kind: SectionKind, line: &'a str) {
        match kind {
            SectionKind::Imports => self.imports.push(line),
            SectionKind::Component => self.component.push(line),
            SectionKind::Test => self.test.push(line),
        }
    }

    fn finish(self, tier: PartitionTier) -> Option<Partition> {
        let partition = Partition {
            imports: tidy(&self.imports),
            component: tidy(&self.component),
            test: tidy(&self.test),
            tier,
        };
        partition.has_sections().then_some(partition)
    }
}

/// Joins lines, dropping leading and trailing blank lines.
fn tidy(lines: &[&str]) -> String {
    let start = lines.iter().position(|l| !l.trim().is_empty());
    let end = lines.iter().rposition(|l| !l.trim().is_empty());
    match (start, end) {
        (Some(start), Some(end)) => lines[start..=end]
            .iter()
            .map(|l| l.trim_end())
            .collect::<Vec<_>>()
            .join("\n"),
        _ => String::new(),
    }
}
