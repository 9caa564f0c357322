use std::collections::HashSet;

use tracing::{debug, warn};

use super::response_partitioner::is_import_line;
use crate::config::ImportGroups;
use crate::data::SectionKind;
use crate::error::{Error, Result};
use crate::syntax;

/// Parse-only syntax check of a Python blob. Nothing is executed.
pub fn validate_syntax(text: &str) -> bool {
    syntax::is_valid(text)
}

/// Deduplicates and groups the leading import block using the default module roots.
pub fn normalize_imports(text: &str) -> String {
    ContentNormalizer::default().normalize_imports(text)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum ImportGroup {
    StandardLibrary,
    ThirdParty,
    Local,
}

/// Syntax checks and import normalization for generated sections.
#[derive(Debug, Clone, Default)]
pub struct ContentNormalizer {
    groups: ImportGroups,
}

impl ContentNormalizer {
    pub fn new(groups: ImportGroups) -> Self {
        Self { groups }
    }

    /// Rejects a section that does not parse.
    pub fn validate(&self, section: SectionKind, text: &str) -> Result<()> {
        if validate_syntax(text) {
            Ok(())
        } else {
            warn!(section = %section, "generated section failed the syntax check");
            Err(Error::SyntaxInvalid { section })
        }
    }

    /// Rewrites the leading import block of `text`.
    ///
    /// The block is every import, blank and comment line before the first other statement.
    /// Exact duplicate statements are dropped (first wins) and the rest are ordered standard
    /// library, third party, local, keeping their relative order within each group. Comments
    /// above the first import stay on top; comments between imports move below the block. One
    /// blank line separates the imports from the untouched remainder. Text without a leading
    /// import is returned as is.
    pub fn normalize_imports(&self, text: &str) -> String {
        let segments: Vec<&str> = text.split_inclusive('\n').collect();
        let mut header: Vec<&str> = Vec::new();
        let mut moved: Vec<&str> = Vec::new();
        let mut statements: Vec<String> = Vec::new();

        let mut i = 0;
        while i < segments.len() {
            let line = segments[i].trim_end();
            let trimmed = line.trim_start();

            if trimmed.is_empty() {
                i += 1;
            } else if trimmed.starts_with('#') {
                if statements.is_empty() {
                    header.push(line);
                } else {
                    moved.push(line);
                }
                i += 1;
            } else if is_import_line(trimmed) {
                let (statement, next) = take_statement(&segments, i);
                statements.push(statement);
                i = next;
            } else {
                break;
            }
        }

        if statements.is_empty() {
            return text.to_string();
        }

        let mut seen = HashSet::new();
        let mut unique: Vec<(ImportGroup, String)> = Vec::new();
        for statement in statements {
            if seen.insert(statement.trim().to_string()) {
                unique.push((self.group_of(&statement), statement));
            }
        }
        // stable, so each group keeps its original order
        unique.sort_by_key(|(group, _)| *group);

        let mut out = String::new();
        for line in header {
            out.push_str(line);
            out.push('\n');
        }
        for (_, statement) in &unique {
            out.push_str(statement);
            out.push('\n');
        }

        let mut body = String::new();
        for line in moved {
            body.push_str(line);
            body.push('\n');
        }
        body.push_str(&segments[i..].concat());

        debug!(imports = unique.len(), "imports normalized");

        if body.is_empty() {
            if !text.ends_with('\n') {
                out.pop();
            }
            out
        } else {
            out.push('\n');
            out.push_str(&body);
            out
        }
    }

    fn group_of(&self, statement: &str) -> ImportGroup {
        let trimmed = statement.trim_start();
        let module = if let Some(rest) = trimmed.strip_prefix("from ") {
            rest.split_whitespace().next().unwrap_or_default()
        } else {
            trimmed
                .strip_prefix("import ")
                .unwrap_or_default()
                .split(|c: char| c == ',' || c.is_whitespace())
                .find(|part| !part.is_empty())
                .unwrap_or_default()
        };

        if module.starts_with('.') {
            return ImportGroup::Local;
        }
        let root = module.split('.').next().unwrap_or_default();
        if self.groups.stdlib_roots.iter().any(|r| r == root) {
            ImportGroup::StandardLibrary
        } else if self.groups.local_roots.iter().any(|r| r == root) {
            ImportGroup::Local
        } else {
            ImportGroup::ThirdParty
        }
    }
}

/// One import statement starting at `start`, following parentheses and backslash continuations.
/// Returns the statement text and the index of the first segment after it.
fn take_statement(segments: &[&str], start: usize) -> (String, usize) {
    let mut lines = Vec::new();
    let mut depth = 0i32;
    let mut i = start;
    while i < segments.len() {
        let line = segments[i].trim_end();
        lines.push(line);
        depth += line
            .chars()
            .map(|c| match c {
                '(' => 1,
                ')' => -1,
                _ => 0,
            })
            .sum::<i32>();
        i += 1;
        if depth <= 0 && !line.ends_with('\\') {
            break;
        }
    }
    (lines.join("\n"), i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_import_is_removed_keeping_first_seen_order() {
        let text = "import pytest\nimport pytest\nimport allure\n";
        assert_eq!(normalize_imports(text), "import pytest\nimport allure\n");
    }

    #[test]
    fn test_imports_are_grouped() {
        let text = "from pages.login_page import LoginPage\nimport pytest\nimport os\nfrom .helpers import wait\nimport allure\nfrom typing import Optional\n\n\ndef test_x():\n    pass\n";
        let expected = "import os\nfrom typing import Optional\nimport pytest\nimport allure\nfrom pages.login_page import LoginPage\nfrom .helpers import wait\n\ndef test_x():\n    pass\n";
        assert_eq!(normalize_imports(text), expected);
    }

    #[test]
    fn test_comments_and_multiline_imports() {
        let text = "# generated\nimport pytest\n# page objects\nfrom pages.base import (\n    BasePage,\n    Locator,\n)\nimport pytest\nfrom pages.base import (\n    BasePage,\n    Locator,\n)\nVALUE = 1\n";
        let expected = "# generated\nimport pytest\nfrom pages.base import (\n    BasePage,\n    Locator,\n)\n\n# page objects\nVALUE = 1\n";
        assert_eq!(normalize_imports(text), expected);
    }

    #[test]
    fn test_text_without_imports_is_unchanged() {
        let text = "\n\nclass LoginPage:\n    import os\n";
        assert_eq!(normalize_imports(text), text);
        assert_eq!(normalize_imports(""), "");
    }

    #[test]
    fn test_imports_only_blob_keeps_its_ending() {
        assert_eq!(normalize_imports("import sys\nimport sys"), "import sys");
        assert_eq!(normalize_imports("import sys\nimport os\n"), "import sys\nimport os\n");
    }

    #[test]
    fn test_later_imports_in_body_are_left_alone() {
        let text = "import os\nx = 1\nimport os\n";
        assert_eq!(normalize_imports(text), "import os\n\nx = 1\nimport os\n");
    }

    #[test]
    fn test_custom_groups() {
        let groups = ImportGroups {
            stdlib_roots: vec!["os".to_string()],
            local_roots: vec!["myapp".to_string()],
        };
        let normalizer = ContentNormalizer::new(groups);
        let text = "import myapp.pages\nimport typing\nimport os\n";
        assert_eq!(
            normalizer.normalize_imports(text),
            "import os\nimport typing\nimport myapp.pages\n"
        );
    }

    #[test]
    fn test_validation_rejects_broken_sections() {
        let normalizer = ContentNormalizer::default();
        assert!(normalizer.validate(SectionKind::Test, "def test_x():\n    pass\n").is_ok());
        assert!(matches!(
            normalizer.validate(SectionKind::Component, "class LoginPage(:\n"),
            Err(Error::SyntaxInvalid {
                section: SectionKind::Component
            })
        ));
        assert!(validate_syntax(""));
    }
}
