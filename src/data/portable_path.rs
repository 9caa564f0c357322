//! Serde adapters that store paths as forward-slash strings.
//!
//! Use with `#[serde(with = "...")]` on `PathBuf`, `Option<PathBuf>` and `Vec<PathBuf>` fields so a
//! persisted index reads the same on every platform.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serializer};

/// Renders a path with `/` separators.
pub fn to_portable(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

pub fn serialize<S: Serializer>(path: &Path, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&to_portable(path))
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<PathBuf, D::Error> {
    let raw = String::deserialize(deserializer)?;
    Ok(PathBuf::from(raw))
}

pub mod option {
    use super::*;

    pub fn serialize<S: Serializer>(path: &Option<PathBuf>, serializer: S) -> Result<S::Ok, S::Error> {
        match path {
            Some(p) => serializer.serialize_some(&to_portable(p)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<PathBuf>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.map(PathBuf::from))
    }
}

pub mod list {
    use serde::ser::SerializeSeq;

    use super::*;

    pub fn serialize<S: Serializer>(paths: &[PathBuf], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(paths.len()))?;
        for path in paths {
            seq.serialize_element(&to_portable(path))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<PathBuf>, D::Error> {
        let raw = Vec::<String>::deserialize(deserializer)?;
        Ok(raw.into_iter().map(PathBuf::from).collect())
    }
}
