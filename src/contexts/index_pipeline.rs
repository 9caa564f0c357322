use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::pattern_extractor::PatternExtractor;
use super::repository_indexer::RepositoryIndexer;
use super::template_selector::TemplateSelector;
use crate::config::{IndexerConfig, PatternVocabulary, TemplateLimits};
use crate::data::RepositoryIndex;
use crate::error::{Error, Result};
use crate::index_store;

/// Supplies a local checkout for a repository and cleans it up afterwards.
pub trait RepositorySource {
    /// Repository identity recorded in the index (URL or similar).
    fn identity(&self) -> Option<String> {
        None
    }

    /// Makes the repository available on disk and returns its root.
    fn acquire(&self) -> Result<PathBuf>;

    /// Releases whatever `acquire` set up.
    fn release(&self) -> Result<()> {
        Ok(())
    }
}

/// A repository that already lives on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalRepository {
    root: PathBuf,
}

impl LocalRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl RepositorySource for LocalRepository {
    fn acquire(&self) -> Result<PathBuf> {
        let metadata = fs::metadata(&self.root).map_err(|e| Error::filesystem(&self.root, e))?;
        if !metadata.is_dir() {
            return Err(Error::filesystem(
                &self.root,
                std::io::Error::new(std::io::ErrorKind::NotADirectory, "not a directory"),
            ));
        }
        Ok(self.root.clone())
    }
}

/// Walk, pattern extraction and template selection, reusing a stored index when possible.
#[derive(Debug, Clone, Default)]
pub struct IndexPipeline {
    pub indexer: IndexerConfig,
    pub vocabulary: PatternVocabulary,
    pub limits: TemplateLimits,
    /// Build the index but never write it
    pub dry_run: bool,
}

impl IndexPipeline {
    pub fn new(indexer: IndexerConfig) -> Self {
        Self {
            indexer,
            ..Self::default()
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Returns the index for `source`.
    ///
    /// Unless `force` is set, a loadable index at `index_path` is returned as is and the
    /// repository is never touched. A fresh index is saved to `index_path`; a failed save is
    /// logged and the index is still returned.
    pub fn run(
        &self,
        source: &dyn RepositorySource,
        index_path: &Path,
        force: bool,
    ) -> Result<RepositoryIndex> {
        if !force {
            if let Some(index) = index_store::load(index_path) {
                info!(path = %index_path.display(), files = index.total_files, "reusing stored index");
                return Ok(index);
            }
        }

        let root = source.acquire()?;
        let result = self.build(source, &root);
        if let Err(e) = source.release() {
            warn!(error = %e, "failed to release repository");
        }
        let index = result?;

        if self.dry_run {
            info!(path = %index_path.display(), "dry run, index not saved");
        } else if let Err(e) = index_store::save(&index, index_path) {
            warn!(path = %index_path.display(), error = %e, "failed to save index");
        } else {
            info!(path = %index_path.display(), "index saved");
        }
        Ok(index)
    }

    fn build(&self, source: &dyn RepositorySource, root: &Path) -> Result<RepositoryIndex> {
        let mut config = self.indexer.clone();
        if config.repository_url.is_none() {
            config.repository_url = source.identity();
        }

        let index = RepositoryIndexer::new(config)?.index(root)?;
        let index = PatternExtractor::new(self.vocabulary.clone()).extract(index);
        Ok(TemplateSelector::new(self.limits).select(index, root))
    }
}

/// Whether an index file is present at `index_path`.
pub fn is_indexed(index_path: &Path) -> bool {
    index_store::exists(index_path)
}

/// The stored index at `index_path`, if it is present and loadable.
pub fn load_existing(index_path: &Path) -> Option<RepositoryIndex> {
    index_store::load(index_path)
}
