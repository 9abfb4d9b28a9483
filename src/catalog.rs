use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::archive::{Archive, ClassSource};
use crate::name::ClassName;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveCatalog {
    pub archive: String,
    pub classes: Vec<ClassName>,
}

/// Every loadable class in one archive, sorted. Inner classes are included;
/// `META-INF/` entries are not.
pub fn catalog(archive_path: &Path) -> Result<Vec<ClassName>> {
    let mut archive = Archive::open(archive_path)?;
    archive
        .class_names()
        .with_context(|| format!("Failed to list classes in {}", archive_path.display()))
}

/// Catalogs archives in parallel and returns them in the given order.
pub fn catalog_all(paths: &[PathBuf]) -> Result<Vec<ArchiveCatalog>> {
    paths
        .par_iter()
        .map(|path| {
            let classes = catalog(path)?;
            tracing::debug!(archive = %path.display(), classes = classes.len(), "cataloged");
            Ok(ArchiveCatalog {
                archive: path.display().to_string(),
                classes,
            })
        })
        .collect()
}
