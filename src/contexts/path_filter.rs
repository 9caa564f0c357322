use std::path::Path;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::data::portable_path::to_portable;
use crate::error::{Error, Result};

/// Include/exclude glob filter over repository-relative paths.
///
/// `*` stays inside one path segment and `**` spans any number of directories, so the default
/// `**/*.py` matches Python files at every depth including the root.
#[derive(Debug, Clone)]
pub struct PathFilter {
    include: Option<GlobSet>,
    exclude: GlobSet,
}

impl PathFilter {
    /// An empty include list accepts every path.
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self> {
        let include = if include.is_empty() {
            None
        } else {
            Some(build_globset(include)?)
        };
        Ok(Self {
            include,
            exclude: build_globset(exclude)?,
        })
    }

    pub fn accepts(&self, relative: &Path) -> bool {
        let portable = to_portable(relative);
        let included = self
            .include
            .as_ref()
            .map(|set| set.is_match(&portable))
            .unwrap_or(true);
        included && !self.exclude.is_match(&portable)
    }

    pub fn is_excluded(&self, relative: &Path) -> bool {
        self.exclude.is_match(to_portable(relative))
    }

    /// Whether a directory can be skipped because anything below it is excluded.
    pub fn prunes_dir(&self, relative: &Path) -> bool {
        self.is_excluded(&relative.join("__any__"))
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let normalized = pattern.replace('\\', "/");
        let glob = GlobBuilder::new(&normalized)
            .literal_separator(true)
            .build()
            .map_err(|source| Error::Pattern {
                pattern: pattern.clone(),
                source,
            })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| Error::Pattern {
        pattern: patterns.join(", "),
        source,
    })
}
