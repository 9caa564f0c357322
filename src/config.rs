//! Explicit configuration handed to each component.
//!
//! Every struct carries the fixed vocabularies as its `Default`, so callers only override what
//! differs in their repository.

use serde::{Deserialize, Serialize};

use crate::data::NamingPattern;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Vocabulary used by the file classifier and the structure analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationRules {
    /// A file name starting with one of these is a test
    pub test_name_prefixes: Vec<String>,
    /// A file name containing one of these is a test
    pub test_name_substrings: Vec<String>,
    /// Directory name fragments marking page object directories
    pub component_dir_hints: Vec<String>,
    /// Base classes whose presence marks a page object
    pub component_base_types: Vec<String>,
    pub fixture_file_name: String,
    pub fixture_name_substrings: Vec<String>,
    pub config_file_names: Vec<String>,
    /// Directory name fragments marking test directories
    pub test_dir_names: Vec<String>,
}

impl Default for ClassificationRules {
    fn default() -> Self {
        Self {
            test_name_prefixes: strings(&["test"]),
            test_name_substrings: strings(&["test_", "_test"]),
            component_dir_hints: strings(&["page"]),
            component_base_types: strings(&["BasePage"]),
            fixture_file_name: "conftest.py".to_string(),
            fixture_name_substrings: strings(&["fixture"]),
            config_file_names: strings(&[
                "pytest.ini",
                "setup.cfg",
                "pyproject.toml",
                "requirements.txt",
            ]),
            test_dir_names: strings(&["tests", "test", "autotests"]),
        }
    }
}

/// Settings for one repository walk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
    /// Recorded in the index as the repository identity
    pub repository_url: Option<String>,
    /// Read and parse files on the rayon pool
    pub parallel: bool,
    pub rules: ClassificationRules,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            include_patterns: strings(&["**/*.py"]),
            exclude_patterns: strings(&[
                "**/__pycache__/**",
                "**/.git/**",
                "**/node_modules/**",
                "**/venv/**",
                "**/.venv/**",
            ]),
            repository_url: None,
            parallel: true,
            rules: ClassificationRules::default(),
        }
    }
}

/// Markers the pattern extractor looks for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternVocabulary {
    pub ui_helper_markers: Vec<String>,
    pub reporting_markers: Vec<String>,
    pub base_type_candidates: Vec<String>,
    pub launcher_candidates: Vec<String>,
    /// Checked in order, first hit wins
    pub test_prefix_candidates: Vec<String>,
    /// Checked in order, first hit wins
    pub component_suffix_candidates: Vec<String>,
    pub common_import_limit: usize,
}

impl Default for PatternVocabulary {
    fn default() -> Self {
        Self {
            ui_helper_markers: strings(&[
                "gpn_qa_utils",
                "qautils",
                "gpn_qa_utils.ui",
                "gpn_qa_utils.ui.pages",
                "gpn_qa_utils.ui.page_factory",
            ]),
            reporting_markers: strings(&["allure", "allure_commons"]),
            base_type_candidates: strings(&["BasePage"]),
            launcher_candidates: strings(&["BrowserLauncher"]),
            test_prefix_candidates: strings(&["test_", "test"]),
            component_suffix_candidates: strings(&["Page", "PageObject", "PO"]),
            common_import_limit: 10,
        }
    }
}

/// Line bounds for exemplar code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateLimits {
    pub component_lines: usize,
    pub test_lines: usize,
    pub fixture_lines: usize,
    pub snippets_per_category: usize,
    pub snippet_lines: usize,
}

impl Default for TemplateLimits {
    fn default() -> Self {
        Self {
            component_lines: 500,
            test_lines: 300,
            fixture_lines: 200,
            snippets_per_category: 2,
            snippet_lines: 100,
        }
    }
}

/// Names and markers that steer the response partitioner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionConfig {
    pub component_marker: String,
    pub test_marker: String,
    /// Classes starting with this are tests
    pub test_type_prefix: String,
    /// Functions starting with this are tests
    pub test_callable_prefix: String,
    /// Classes whose name contains this are page objects
    pub component_type_hint: String,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            component_marker: "=== PAGE OBJECT ===".to_string(),
            test_marker: "=== TEST FUNCTION ===".to_string(),
            test_type_prefix: "Test".to_string(),
            test_callable_prefix: "test_".to_string(),
            component_type_hint: "Page".to_string(),
        }
    }
}

impl PartitionConfig {
    /// Uses the conventions inferred for a repository instead of the defaults.
    pub fn from_naming(naming: &NamingPattern) -> Self {
        let defaults = Self::default();
        Self {
            test_callable_prefix: non_empty_or(&naming.test_prefix, defaults.test_callable_prefix),
            component_type_hint: non_empty_or(
                &naming.component_suffix,
                defaults.component_type_hint,
            ),
            ..Self::default()
        }
    }
}

fn non_empty_or(value: &str, fallback: String) -> String {
    if value.is_empty() {
        fallback
    } else {
        value.to_string()
    }
}

/// Module roots used to bucket imports during normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportGroups {
    pub stdlib_roots: Vec<String>,
    pub local_roots: Vec<String>,
}

impl Default for ImportGroups {
    fn default() -> Self {
        Self {
            stdlib_roots: strings(&[
                "__future__",
                "abc",
                "argparse",
                "asyncio",
                "base64",
                "collections",
                "contextlib",
                "copy",
                "csv",
                "dataclasses",
                "datetime",
                "decimal",
                "enum",
                "functools",
                "glob",
                "hashlib",
                "http",
                "inspect",
                "io",
                "itertools",
                "json",
                "logging",
                "math",
                "os",
                "pathlib",
                "random",
                "re",
                "shutil",
                "string",
                "subprocess",
                "sys",
                "tempfile",
                "textwrap",
                "threading",
                "time",
                "traceback",
                "typing",
                "unittest",
                "urllib",
                "uuid",
                "warnings",
            ]),
            local_roots: strings(&["src", "pages", "page_objects", "tests", "fixtures", "conftest"]),
        }
    }
}
