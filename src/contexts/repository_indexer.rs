use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::classifier::FileClassifier;
use super::path_filter::PathFilter;
use super::structure_analyzer::StructureAnalyzer;
use crate::config::IndexerConfig;
use crate::data::{IndexedFile, RepositoryIndex};
use crate::error::{Error, Result};
use crate::syntax;

/// Walks a repository root and builds a [`RepositoryIndex`].
///
/// Files are read and parsed independently (optionally on the rayon pool) and then assembled
/// in path order, so "first matching file" lookups downstream never depend on thread timing.
#[derive(Debug, Clone)]
pub struct RepositoryIndexer {
    config: IndexerConfig,
    classifier: FileClassifier,
    filter: PathFilter,
}

impl RepositoryIndexer {
    pub fn new(config: IndexerConfig) -> Result<Self> {
        let filter = PathFilter::new(&config.include_patterns, &config.exclude_patterns)?;
        let classifier = FileClassifier::new(config.rules.clone());
        Ok(Self {
            config,
            classifier,
            filter,
        })
    }

    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    /// Indexes every accepted file under `root`.
    ///
    /// Fails only when `root` itself cannot be read. Unreadable files are skipped and files
    /// that do not parse are kept with empty import/name lists.
    pub fn index(&self, root: &Path) -> Result<RepositoryIndex> {
        fs::read_dir(root).map_err(|e| Error::filesystem(root, e))?;
        info!(root = %root.display(), "indexing repository");

        let structure = StructureAnalyzer::new(self.config.rules.clone()).analyze(root, &self.filter)?;
        let candidates = self.collect_candidates(root);
        debug!(candidates = candidates.len(), "files selected for indexing");

        let indexed: Vec<Option<IndexedFile>> = if self.config.parallel {
            candidates
                .par_iter()
                .map(|relative| self.index_file(root, relative))
                .collect()
        } else {
            candidates
                .iter()
                .map(|relative| self.index_file(root, relative))
                .collect()
        };
        let files: Vec<IndexedFile> = indexed.into_iter().flatten().collect();

        let index = RepositoryIndex::new(
            self.config.repository_url.clone(),
            Some(root.to_path_buf()),
            structure,
            files,
        );

        info!(
            files = index.total_files,
            tests = index.test_files_count,
            page_objects = index.component_files_count,
            "indexing finished"
        );
        Ok(index)
    }

    /// Relative paths of accepted files, sorted.
    fn collect_candidates(&self, root: &Path) -> Vec<PathBuf> {
        let walker = WalkDir::new(root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                !entry.file_type().is_dir()
                    || entry
                        .path()
                        .strip_prefix(root)
                        .map(|rel| !self.filter.prunes_dir(rel))
                        .unwrap_or(true)
            });

        let mut candidates = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(root) else {
                continue;
            };
            if self.filter.accepts(relative) {
                candidates.push(relative.to_path_buf());
            }
        }
        candidates.sort();
        candidates
    }

    /// Reads, classifies, fingerprints and outlines one file. `None` when it cannot be read.
    pub fn index_file(&self, root: &Path, relative: &Path) -> Option<IndexedFile> {
        let full_path = root.join(relative);
        let bytes = match fs::read(&full_path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(path = %full_path.display(), error = %e, "skipping unreadable file");
                return None;
            }
        };

        let content = decode_ignoring_invalid(&bytes);
        let category = self.classifier.classify(relative, &content);
        let last_modified = fs::metadata(&full_path)
            .and_then(|m| m.modified())
            .ok()
            .map(DateTime::<Utc>::from);

        let outline = match syntax::outline(&content) {
            Ok(outline) => outline,
            Err(e) => {
                warn!(path = %relative.display(), error = %e, "could not parse file, indexing without names");
                syntax::Outline::default()
            }
        };

        Some(IndexedFile {
            path: relative.to_path_buf(),
            category,
            fingerprint: fingerprint(&bytes),
            size_bytes: bytes.len() as u64,
            last_modified,
            imports: outline.imports,
            type_names: outline.type_names,
            callable_names: outline.callable_names,
        })
    }
}

/// Indexes `root` with the given include/exclude globs and default rules.
pub fn index_repository(
    root: &Path,
    include_patterns: &[String],
    exclude_patterns: &[String],
) -> Result<RepositoryIndex> {
    let config = IndexerConfig {
        include_patterns: include_patterns.to_vec(),
        exclude_patterns: exclude_patterns.to_vec(),
        ..IndexerConfig::default()
    };
    RepositoryIndexer::new(config)?.index(root)
}

/// Hex SHA-256 of raw file bytes.
pub fn fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Decodes UTF-8, dropping invalid byte sequences instead of failing.
pub fn decode_ignoring_invalid(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    let mut rest = bytes;
    loop {
        match std::str::from_utf8(rest) {
            Ok(valid) => {
                out.push_str(valid);
                return out;
            }
            Err(e) => {
                let (valid, after) = rest.split_at(e.valid_up_to());
                // valid_up_to guarantees this prefix decodes
                out.push_str(std::str::from_utf8(valid).unwrap_or_default());
                match e.error_len() {
                    Some(len) => rest = &after[len..],
                    None => return out,
                }
            }
        }
    }
}
