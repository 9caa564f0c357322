use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::config::TemplateLimits;
use crate::data::{Category, RepositoryIndex, TemplateInfo};

/// Picks bounded exemplars from an indexed repository.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateSelector {
    limits: TemplateLimits,
}

impl TemplateSelector {
    pub fn new(limits: TemplateLimits) -> Self {
        Self { limits }
    }

    /// Returns `index` with `templates` replaced by exemplars re-read from `root`.
    ///
    /// A category with no file leaves its template unset. A file that can no longer be read is
    /// logged and treated the same way.
    pub fn select(&self, mut index: RepositoryIndex, root: &Path) -> RepositoryIndex {
        let limits = self.limits;
        let mut templates = TemplateInfo {
            component_template: self.first_of(&index, root, Category::ReusableComponent, limits.component_lines),
            test_template: self.first_of(&index, root, Category::Test, limits.test_lines),
            fixture_template: self.first_of(&index, root, Category::Fixture, limits.fixture_lines),
            snippets: Vec::new(),
        };

        for category in [Category::Test, Category::ReusableComponent] {
            for relative in index.example_paths(category, limits.snippets_per_category) {
                if let Some(snippet) = read_head(root, &relative, limits.snippet_lines) {
                    templates.snippets.push(snippet);
                }
            }
        }

        debug!(
            page_object = templates.component_template.is_some(),
            test = templates.test_template.is_some(),
            fixture = templates.fixture_template.is_some(),
            snippets = templates.snippets.len(),
            "templates selected"
        );
        index.templates = templates;
        index
    }

    fn first_of(
        &self,
        index: &RepositoryIndex,
        root: &Path,
        category: Category,
        max_lines: usize,
    ) -> Option<String> {
        let file = index.files_in(category).next()?;
        read_head(root, &file.path, max_lines)
    }
}

fn read_head(root: &Path, relative: &Path, max_lines: usize) -> Option<String> {
    let path = root.join(relative);
    match fs::read(&path) {
        Ok(bytes) => Some(first_lines(&String::from_utf8_lossy(&bytes), max_lines)),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "template source unreadable");
            None
        }
    }
}

/// The first `max_lines` lines of `text`, joined with `\n`.
pub fn first_lines(text: &str, max_lines: usize) -> String {
    text.lines().take(max_lines).collect::<Vec<_>>().join("\n")
}
