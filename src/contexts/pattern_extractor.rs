use std::collections::HashMap;

use tracing::{debug, info};

use crate::config::PatternVocabulary;
use crate::data::{CodePatterns, NamingPattern, NamingStyle, RepositoryIndex};

/// Infers naming conventions and framework usage from an index.
///
/// Casing styles are read from a single sample per kind (the first file, class and function
/// in index order), not from a vote over all names. Mixed-style repositories can therefore
/// report whichever style happens to come first.
#[derive(Debug, Clone, Default)]
pub struct PatternExtractor {
    vocabulary: PatternVocabulary,
}

impl PatternExtractor {
    pub fn new(vocabulary: PatternVocabulary) -> Self {
        Self { vocabulary }
    }

    /// Returns `index` with `naming_patterns` and `code_patterns` replaced.
    pub fn extract(&self, mut index: RepositoryIndex) -> RepositoryIndex {
        info!("extracting repository patterns");
        index.naming_patterns = self.naming_patterns(&index);
        index.code_patterns = self.code_patterns(&index);
        debug!(
            test_prefix = %index.naming_patterns.test_prefix,
            page_suffix = %index.naming_patterns.component_suffix,
            uses_ui_helpers = index.code_patterns.uses_ui_helpers,
            uses_reporting = index.code_patterns.uses_reporting,
            "patterns extracted"
        );
        index
    }

    fn naming_patterns(&self, index: &RepositoryIndex) -> NamingPattern {
        let mut patterns = NamingPattern::default();

        if let Some(name) = index.files.iter().find_map(|f| f.file_name()) {
            patterns.file_naming = file_naming_style(name);
        }

        if let Some(name) = index.files.iter().flat_map(|f| &f.type_names).next() {
            patterns.class_naming = class_naming_style(name);
        }

        if let Some(name) = index.files.iter().flat_map(|f| &f.callable_names).next() {
            patterns.function_naming = function_naming_style(name);
        }

        let test_callables: Vec<&String> = index
            .test_files()
            .flat_map(|f| &f.callable_names)
            .filter(|name| name.to_lowercase().contains("test"))
            .collect();
        if let Some(prefix) = self
            .vocabulary
            .test_prefix_candidates
            .iter()
            .find(|prefix| test_callables.iter().any(|name| name.starts_with(prefix.as_str())))
        {
            patterns.test_prefix = prefix.clone();
        }

        let component_types: Vec<&String> = index
            .component_files()
            .flat_map(|f| &f.type_names)
            .collect();
        if let Some(suffix) = self
            .vocabulary
            .component_suffix_candidates
            .iter()
            .find(|suffix| component_types.iter().any(|name| name.ends_with(suffix.as_str())))
        {
            patterns.component_suffix = suffix.clone();
        }

        patterns
    }

    fn code_patterns(&self, index: &RepositoryIndex) -> CodePatterns {
        let mut patterns = CodePatterns::default();
        let vocab = &self.vocabulary;

        patterns.uses_ui_helpers = index
            .files
            .iter()
            .flat_map(|f| &f.imports)
            .any(|imp| vocab.ui_helper_markers.iter().any(|m| imp.contains(m.as_str())));

        patterns.uses_reporting = index
            .files
            .iter()
            .flat_map(|f| &f.imports)
            .any(|imp| vocab.reporting_markers.iter().any(|m| imp.contains(m.as_str())));

        for file in &index.files {
            let joined = file.imports.join(" ");
            if patterns.base_component_type.is_none() {
                patterns.base_component_type = first_contained(&joined, &vocab.base_type_candidates);
            }
            if patterns.browser_launcher.is_none() {
                patterns.browser_launcher = first_contained(&joined, &vocab.launcher_candidates);
            }
        }

        patterns.common_imports = most_common_imports(index, vocab.common_import_limit);
        patterns
    }
}

fn first_contained(haystack: &str, candidates: &[String]) -> Option<String> {
    candidates
        .iter()
        .find(|c| haystack.contains(c.as_str()))
        .cloned()
}

/// Imports ordered by frequency, ties broken by first appearance.
fn most_common_imports(index: &RepositoryIndex, limit: usize) -> Vec<String> {
    let mut order: Vec<(&str, usize)> = Vec::new();
    let mut slots: HashMap<&str, usize> = HashMap::new();

    for imp in index.files.iter().flat_map(|f| &f.imports) {
        match slots.get(imp.as_str()) {
            Some(&slot) => order[slot].1 += 1,
            None => {
                slots.insert(imp.as_str(), order.len());
                order.push((imp.as_str(), 1));
            }
        }
    }

    // stable sort keeps first-seen order among equal counts
    order.sort_by(|a, b| b.1.cmp(&a.1));
    order
        .into_iter()
        .take(limit)
        .map(|(imp, _)| imp.to_string())
        .collect()
}

pub fn file_naming_style(name: &str) -> NamingStyle {
    if name.contains('_') {
        NamingStyle::SnakeCase
    } else if name.contains('-') {
        NamingStyle::KebabCase
    } else if name.chars().any(|c| c.is_alphabetic()) && !name.chars().any(|c| c.is_uppercase()) {
        NamingStyle::Lowercase
    } else {
        NamingStyle::Mixed
    }
}

pub fn class_naming_style(name: &str) -> NamingStyle {
    match name.chars().next() {
        Some(first) if first.is_uppercase() && !name.contains('_') => NamingStyle::PascalCase,
        Some(first) if first.is_uppercase() => NamingStyle::PascalSnakeCase,
        _ => NamingStyle::Mixed,
    }
}

pub fn function_naming_style(name: &str) -> NamingStyle {
    if name.contains('_') {
        NamingStyle::SnakeCase
    } else if name.chars().next().is_some_and(|c| c.is_uppercase()) {
        NamingStyle::PascalCase
    } else {
        NamingStyle::CamelCase
    }
}
