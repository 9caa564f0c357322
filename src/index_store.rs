//! Durable storage for [`RepositoryIndex`].
//!
//! The index is written as pretty JSON. Paths are stored with forward slashes and timestamps as
//! RFC 3339 text, both reversed on load, so a saved index loads back equal to the original.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::data::{INDEX_SCHEMA_VERSION, RepositoryIndex};
use crate::error::{Error, Result};

/// Writes `index` to `path`, replacing any existing file.
///
/// Parent directories are created as needed. The JSON is written to a sibling temporary file
/// and renamed into place, so readers never observe a partial index.
pub fn save(index: &RepositoryIndex, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| Error::filesystem(parent, e))?;
    }

    let content = serde_json::to_string_pretty(index)
        .map_err(|e| Error::malformed("repository index", e.to_string()))?;

    let staging = staging_path(path);
    fs::write(&staging, content).map_err(|e| Error::filesystem(&staging, e))?;
    if let Err(e) = fs::rename(&staging, path) {
        let _ = fs::remove_file(&staging);
        return Err(Error::filesystem(path, e));
    }

    debug!(path = %path.display(), files = index.total_files, "index saved");
    Ok(())
}

/// Loads the index at `path`, or `None` when it is missing or unusable.
///
/// A corrupt index is logged and treated exactly like one that was never written.
pub fn load(path: &Path) -> Option<RepositoryIndex> {
    match try_load(path) {
        Ok(index) => index,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring stored index");
            None
        }
    }
}

/// Like [`load`], but reports why a present index was rejected.
///
/// `Ok(None)` means there is no file at `path`.
pub fn try_load(path: &Path) -> Result<Option<RepositoryIndex>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(Error::storage_corrupt(path, e.to_string())),
    };

    let index: RepositoryIndex = serde_json::from_str(&content)
        .map_err(|e| Error::storage_corrupt(path, e.to_string()))?;

    if index.version != INDEX_SCHEMA_VERSION {
        return Err(Error::storage_corrupt(
            path,
            format!(
                "schema version {} does not match {}",
                index.version, INDEX_SCHEMA_VERSION
            ),
        ));
    }

    if !index.counts_consistent() {
        return Err(Error::storage_corrupt(
            path,
            "summary counts do not match the file list",
        ));
    }

    Ok(Some(index))
}

/// Whether an index file is present at `path`. Says nothing about whether it is loadable.
pub fn exists(path: &Path) -> bool {
    path.is_file()
}

fn staging_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "index".to_string());
    path.with_file_name(format!(".{}.tmp", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{
        Category, CodePatterns, IndexedFile, NamingPattern, NamingStyle, ProjectStructure,
        TemplateInfo,
    };
    use chrono::{TimeZone, Utc};

    fn sample_index() -> RepositoryIndex {
        let structure = ProjectStructure {
            root_path: PathBuf::from("/work/repo"),
            test_directories: vec![PathBuf::from("tests")],
            component_directories: vec![PathBuf::from("src/pages")],
            fixture_files: vec![PathBuf::from("conftest.py")],
            config_files: vec![PathBuf::from("pytest.ini")],
        };
        let files = vec![
            IndexedFile {
                path: PathBuf::from("tests/test_login.py"),
                category: Category::Test,
                fingerprint: "ab".repeat(32),
                size_bytes: 120,
                last_modified: Some(Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 5).unwrap()),
                imports: vec!["pytest".to_string(), "allure".to_string()],
                type_names: vec!["TestLogin".to_string()],
                callable_names: vec!["test_ok".to_string()],
            },
            IndexedFile {
                path: PathBuf::from("src/pages/login_page.py"),
                category: Category::ReusableComponent,
                fingerprint: "cd".repeat(32),
                size_bytes: 300,
                last_modified: None,
                imports: vec!["gpn_qa_utils.ui.pages.BasePage".to_string()],
                type_names: vec!["LoginPage".to_string()],
                callable_names: vec![],
            },
        ];
        let mut index = RepositoryIndex::new(
            Some("https://git.example.com/qa/ui-tests.git".to_string()),
            Some(PathBuf::from("/work/repo")),
            structure,
            files,
        );
        index.naming_patterns = NamingPattern {
            file_naming: NamingStyle::SnakeCase,
            class_naming: NamingStyle::PascalCase,
            function_naming: NamingStyle::SnakeCase,
            test_prefix: "test_".to_string(),
            component_suffix: "Page".to_string(),
        };
        index.code_patterns = CodePatterns {
            uses_ui_helpers: true,
            uses_reporting: true,
            base_component_type: Some("BasePage".to_string()),
            browser_launcher: None,
            common_imports: vec!["pytest".to_string()],
        };
        index.templates = TemplateInfo {
            component_template: Some("class LoginPage(BasePage):\n    pass".to_string()),
            test_template: None,
            fixture_template: Some("import pytest".to_string()),
            snippets: vec!["def test_ok():\n    pass".to_string()],
        };
        index
    }

    #[test]
    fn test_save_then_load_is_lossless() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/index.json");
        let index = sample_index();

        save(&index, &path).unwrap();
        assert!(exists(&path));
        assert_eq!(load(&path), Some(index));
    }

    #[test]
    fn test_empty_index_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        let index = RepositoryIndex::new(None, None, ProjectStructure::default(), Vec::new());

        save(&index, &path).unwrap();
        assert_eq!(load(&path), Some(index));
    }

    #[test]
    fn test_paths_are_stored_with_forward_slashes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        save(&sample_index(), &path).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"tests/test_login.py\""));
        assert!(raw.contains("\"page_object_files_count\": 1"));
        assert!(raw.contains("2024-03-01T12:30:05Z"));
    }

    #[test]
    fn test_save_overwrites_and_leaves_no_staging_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        fs::write(&path, "x".repeat(100_000)).unwrap();

        let index = RepositoryIndex::new(None, None, ProjectStructure::default(), Vec::new());
        save(&index, &path).unwrap();

        assert_eq!(load(&path), Some(index));
        assert!(!staging_path(&path).exists());
    }

    #[test]
    fn test_missing_file_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        assert!(!exists(&path));
        assert_eq!(load(&path), None);
        assert!(matches!(try_load(&path), Ok(None)));
    }

    #[test]
    fn test_corrupt_file_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(exists(&path));
        assert_eq!(load(&path), None);
        assert!(matches!(try_load(&path), Err(Error::StorageCorrupt { .. })));
    }

    #[test]
    fn test_wrong_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        let mut index = sample_index();
        index.version = "0.9".to_string();
        save(&index, &path).unwrap();

        assert_eq!(load(&path), None);
    }

    #[test]
    fn test_drifted_counts_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        let mut index = sample_index();
        index.test_files_count = 7;
        save(&index, &path).unwrap();

        assert!(matches!(try_load(&path), Err(Error::StorageCorrupt { .. })));
    }
}
