use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::portable_path;

/// Schema version written into every persisted index.
pub const INDEX_SCHEMA_VERSION: &str = "1.0";

/// Role a file plays in the indexed test repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "test")]
    Test,
    /// A page object: reusable code wrapping one UI surface.
    #[serde(rename = "page_object")]
    ReusableComponent,
    #[serde(rename = "fixture")]
    Fixture,
    #[serde(rename = "config")]
    Configuration,
    #[serde(rename = "other")]
    Other,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Category::Test => "test",
            Category::ReusableComponent => "page object",
            Category::Fixture => "fixture",
            Category::Configuration => "config",
            Category::Other => "other",
        };
        write!(f, "{}", name)
    }
}

/// One source file as seen by the indexer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedFile {
    /// Path relative to the repository root
    #[serde(with = "portable_path")]
    pub path: PathBuf,
    #[serde(rename = "file_type")]
    pub category: Category,
    /// Hex SHA-256 of the raw bytes
    #[serde(rename = "content_hash")]
    pub fingerprint: String,
    pub size_bytes: u64,
    pub last_modified: Option<DateTime<Utc>>,
    pub imports: Vec<String>,
    #[serde(rename = "classes")]
    pub type_names: Vec<String>,
    #[serde(rename = "functions")]
    pub callable_names: Vec<String>,
}

impl IndexedFile {
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }
}

/// Directories and well-known files found under the repository root.
///
/// All paths are relative to `root_path`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProjectStructure {
    #[serde(with = "portable_path")]
    pub root_path: PathBuf,
    #[serde(with = "portable_path::list")]
    pub test_directories: Vec<PathBuf>,
    #[serde(rename = "page_object_directories", with = "portable_path::list")]
    pub component_directories: Vec<PathBuf>,
    #[serde(with = "portable_path::list")]
    pub fixture_files: Vec<PathBuf>,
    #[serde(with = "portable_path::list")]
    pub config_files: Vec<PathBuf>,
}

/// Identifier casing styles recognised by the pattern extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NamingStyle {
    #[serde(rename = "snake_case")]
    SnakeCase,
    #[serde(rename = "kebab-case")]
    KebabCase,
    #[serde(rename = "lowercase")]
    Lowercase,
    #[serde(rename = "PascalCase")]
    PascalCase,
    #[serde(rename = "Pascal_Case")]
    PascalSnakeCase,
    #[serde(rename = "camelCase")]
    CamelCase,
    #[serde(rename = "mixed")]
    Mixed,
}

impl fmt::Display for NamingStyle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            NamingStyle::SnakeCase => "snake_case",
            NamingStyle::KebabCase => "kebab-case",
            NamingStyle::Lowercase => "lowercase",
            NamingStyle::PascalCase => "PascalCase",
            NamingStyle::PascalSnakeCase => "Pascal_Case",
            NamingStyle::CamelCase => "camelCase",
            NamingStyle::Mixed => "mixed",
        };
        write!(f, "{}", name)
    }
}

/// Naming conventions inferred from the repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamingPattern {
    pub file_naming: NamingStyle,
    pub class_naming: NamingStyle,
    pub function_naming: NamingStyle,
    /// Prefix shared by test functions (e.g. `test_`)
    pub test_prefix: String,
    /// Suffix shared by page object classes (e.g. `Page`)
    #[serde(rename = "page_suffix")]
    pub component_suffix: String,
}

impl Default for NamingPattern {
    fn default() -> Self {
        Self {
            file_naming: NamingStyle::SnakeCase,
            class_naming: NamingStyle::PascalCase,
            function_naming: NamingStyle::SnakeCase,
            test_prefix: "test_".to_string(),
            component_suffix: "Page".to_string(),
        }
    }
}

/// Framework usage detected from imports.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CodePatterns {
    /// Whether a UI helper library (page factory, base pages) is imported anywhere
    #[serde(rename = "uses_qautils")]
    pub uses_ui_helpers: bool,
    /// Whether a reporting/annotation library is imported anywhere
    #[serde(rename = "uses_allure")]
    pub uses_reporting: bool,
    #[serde(rename = "base_page_class")]
    pub base_component_type: Option<String>,
    pub browser_launcher: Option<String>,
    /// Most frequent imports, most common first
    pub common_imports: Vec<String>,
}

/// Exemplar code used to steer generation toward house style.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TemplateInfo {
    #[serde(rename = "page_object_template")]
    pub component_template: Option<String>,
    pub test_template: Option<String>,
    pub fixture_template: Option<String>,
    #[serde(rename = "common_code_snippets")]
    pub snippets: Vec<String>,
}

/// Aggregate result of indexing one repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryIndex {
    pub repository_url: Option<String>,
    #[serde(with = "portable_path::option")]
    pub repository_path: Option<PathBuf>,
    pub indexed_at: DateTime<Utc>,
    pub version: String,
    pub structure: ProjectStructure,
    pub files: Vec<IndexedFile>,
    pub naming_patterns: NamingPattern,
    pub code_patterns: CodePatterns,
    pub templates: TemplateInfo,
    pub total_files: usize,
    pub test_files_count: usize,
    #[serde(rename = "page_object_files_count")]
    pub component_files_count: usize,
}

impl RepositoryIndex {
    /// Builds a fresh index with default patterns, no templates and counts derived from `files`.
    pub fn new(
        repository_url: Option<String>,
        repository_path: Option<PathBuf>,
        structure: ProjectStructure,
        files: Vec<IndexedFile>,
    ) -> Self {
        let mut index = Self {
            repository_url,
            repository_path,
            indexed_at: Utc::now(),
            version: INDEX_SCHEMA_VERSION.to_string(),
            structure,
            files,
            naming_patterns: NamingPattern::default(),
            code_patterns: CodePatterns::default(),
            templates: TemplateInfo::default(),
            total_files: 0,
            test_files_count: 0,
            component_files_count: 0,
        };
        index.recount();
        index
    }

    pub fn files_in(&self, category: Category) -> impl Iterator<Item = &IndexedFile> {
        self.files.iter().filter(move |f| f.category == category)
    }

    pub fn test_files(&self) -> impl Iterator<Item = &IndexedFile> {
        self.files_in(Category::Test)
    }

    pub fn component_files(&self) -> impl Iterator<Item = &IndexedFile> {
        self.files_in(Category::ReusableComponent)
    }

    /// Relative paths of up to `limit` files of a category, in index order.
    pub fn example_paths(&self, category: Category, limit: usize) -> Vec<PathBuf> {
        self.files_in(category)
            .take(limit)
            .map(|f| f.path.clone())
            .collect()
    }

    /// Recomputes the summary counts from `files`.
    pub fn recount(&mut self) {
        self.total_files = self.files.len();
        self.test_files_count = self.test_files().count();
        self.component_files_count = self.component_files().count();
    }

    pub fn counts_consistent(&self) -> bool {
        self.total_files == self.files.len()
            && self.test_files_count == self.test_files().count()
            && self.component_files_count == self.component_files().count()
    }

    /// Short human-readable summary.
    pub fn summary(&self) -> String {
        let source = self
            .repository_url
            .clone()
            .or_else(|| {
                self.repository_path
                    .as_ref()
                    .map(|p| p.display().to_string())
            })
            .unwrap_or_else(|| "<unknown>".to_string());

        let mut lines = Vec::new();
        lines.push(format!("Repository: {}", source));
        lines.push(format!(
            "Indexed at: {} (schema {})",
            self.indexed_at.to_rfc3339(),
            self.version
        ));
        lines.push(format!("Files:        {}", self.total_files));
        lines.push(format!("Tests:        {}", self.test_files_count));
        lines.push(format!("Page objects: {}", self.component_files_count));
        lines.push(format!(
            "Test dirs: {}, page object dirs: {}, fixture files: {}, config files: {}",
            self.structure.test_directories.len(),
            self.structure.component_directories.len(),
            self.structure.fixture_files.len(),
            self.structure.config_files.len()
        ));
        lines.join("\n")
    }
}
