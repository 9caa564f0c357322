use std::fs;
use std::path::Path;

use tracing::{debug, warn};
use walkdir::WalkDir;

use super::classifier::contains_any;
use super::path_filter::PathFilter;
use crate::config::{ClassificationRules, IndexerConfig};
use crate::data::ProjectStructure;
use crate::error::{Error, Result};

/// Finds test directories, page object directories, fixture files and config files.
#[derive(Debug, Clone, Default)]
pub struct StructureAnalyzer {
    rules: ClassificationRules,
}

impl StructureAnalyzer {
    pub fn new(rules: ClassificationRules) -> Self {
        Self { rules }
    }

    /// Walks `root` read-only. Directory names match by case-insensitive substring; files match
    /// by exact name. Returned paths are relative to `root`.
    pub fn analyze(&self, root: &Path, filter: &PathFilter) -> Result<ProjectStructure> {
        fs::read_dir(root).map_err(|e| Error::filesystem(root, e))?;

        let mut structure = ProjectStructure {
            root_path: root.to_path_buf(),
            ..ProjectStructure::default()
        };

        let walker = WalkDir::new(root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                !entry.file_type().is_dir()
                    || entry
                        .path()
                        .strip_prefix(root)
                        .map(|rel| !filter.prunes_dir(rel))
                        .unwrap_or(true)
            });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable entry during structure scan");
                    continue;
                }
            };
            let Ok(relative) = entry.path().strip_prefix(root) else {
                continue;
            };
            let name = entry.file_name().to_string_lossy().to_lowercase();

            if entry.file_type().is_dir() {
                if contains_any(&name, &self.rules.test_dir_names) {
                    structure.test_directories.push(relative.to_path_buf());
                }
                if contains_any(&name, &self.rules.component_dir_hints) {
                    structure.component_directories.push(relative.to_path_buf());
                }
            } else if entry.file_type().is_file() {
                if name == self.rules.fixture_file_name.to_lowercase() {
                    structure.fixture_files.push(relative.to_path_buf());
                } else if self
                    .rules
                    .config_file_names
                    .iter()
                    .any(|c| c.to_lowercase() == name)
                {
                    structure.config_files.push(relative.to_path_buf());
                }
            }
        }

        debug!(
            test_dirs = structure.test_directories.len(),
            page_dirs = structure.component_directories.len(),
            fixtures = structure.fixture_files.len(),
            configs = structure.config_files.len(),
            "project structure analyzed"
        );
        Ok(structure)
    }
}

/// Analyzes `root` with the default vocabulary and exclusions.
pub fn analyze_structure(root: &Path) -> Result<ProjectStructure> {
    let config = IndexerConfig::default();
    let filter = PathFilter::new(&[], &config.exclude_patterns)?;
    StructureAnalyzer::new(config.rules).analyze(root, &filter)
}
