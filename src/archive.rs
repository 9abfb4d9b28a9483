//! Class lookup inside jars and exploded class directories.

use std::fs::File;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use memmap2::Mmap;
use zip::ZipArchive;
use zip::result::ZipError;

use crate::classfile::parse_class;
use crate::error::CheckError;
use crate::model::ClassModel;
use crate::name::{ClassName, class_path_to_class_name};

/// Somewhere classes can be looked up by name.
pub trait ClassSource {
    /// Human-readable identity used in logs and reports.
    fn label(&self) -> String;

    /// Decodes `name` if this source defines it.
    fn resolve_class(&mut self, name: &ClassName) -> Result<Option<ClassModel>, CheckError>;

    /// Every class this source defines, sorted.
    fn class_names(&mut self) -> Result<Vec<ClassName>, CheckError>;
}

impl<T: ClassSource + ?Sized> ClassSource for Box<T> {
    fn label(&self) -> String {
        (**self).label()
    }

    fn resolve_class(&mut self, name: &ClassName) -> Result<Option<ClassModel>, CheckError> {
        (**self).resolve_class(name)
    }

    fn class_names(&mut self) -> Result<Vec<ClassName>, CheckError> {
        (**self).class_names()
    }
}

/// An opened archive: a memory-mapped jar or a directory of class files.
pub enum Archive {
    Jar {
        path: PathBuf,
        zip: ZipArchive<Cursor<Mmap>>,
    },
    Directory {
        root: PathBuf,
    },
}

impl Archive {
    pub fn open(path: &Path) -> Result<Self, CheckError> {
        let meta = std::fs::metadata(path).map_err(|e| CheckError::unavailable(path, e))?;

        if meta.is_dir() {
            return Ok(Archive::Directory {
                root: path.to_path_buf(),
            });
        }
        if !meta.is_file() {
            return Err(CheckError::unavailable(path, "not a regular file"));
        }

        let file = File::open(path).map_err(|e| CheckError::unavailable(path, e))?;
        // SAFETY: The file is opened read-only and the mapping is owned by the
        // archive, so it outlives every read through the zip reader.
        let mmap = unsafe { Mmap::map(&file) }.map_err(|e| CheckError::unavailable(path, e))?;
        let zip = ZipArchive::new(Cursor::new(mmap)).map_err(|e| CheckError::unavailable(path, e))?;

        Ok(Archive::Jar {
            path: path.to_path_buf(),
            zip,
        })
    }

    pub fn path(&self) -> &Path {
        match self {
            Archive::Jar { path, .. } => path,
            Archive::Directory { root } => root,
        }
    }

    fn read_entry(&mut self, entry: &str) -> Result<Option<Vec<u8>>, CheckError> {
        match self {
            Archive::Jar { path, zip } => {
                let mut file = match zip.by_name(entry) {
                    Ok(file) => file,
                    Err(ZipError::FileNotFound) => return Ok(None),
                    Err(e) => return Err(read_error(path, entry, e)),
                };
                let mut buf = Vec::with_capacity(file.size() as usize);
                file.read_to_end(&mut buf)
                    .map_err(|e| read_error(path, entry, e))?;
                Ok(Some(buf))
            }
            Archive::Directory { root } => {
                if !is_contained_entry(entry) {
                    tracing::warn!(
                        archive = %root.display(),
                        entry,
                        "ignoring entry outside the class directory"
                    );
                    return Ok(None);
                }
                let candidate = root.join(entry);
                if !candidate.is_file() {
                    return Ok(None);
                }
                std::fs::read(&candidate)
                    .map(Some)
                    .map_err(|e| read_error(root, entry, e))
            }
        }
    }
}

/// Entry paths must stay under the archive root: relative, with no empty,
/// `.` or `..` components.
fn is_contained_entry(entry: &str) -> bool {
    !entry.is_empty()
        && !Path::new(entry).is_absolute()
        && entry
            .split(['/', '\\'])
            .all(|part| !part.is_empty() && part != "." && part != "..")
}

fn read_error(
    archive: &Path,
    entry: &str,
    source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
) -> CheckError {
    CheckError::ArchiveRead {
        archive: archive.display().to_string(),
        entry: entry.to_string(),
        source: source.into(),
    }
}

impl ClassSource for Archive {
    fn label(&self) -> String {
        self.path().display().to_string()
    }

    fn resolve_class(&mut self, name: &ClassName) -> Result<Option<ClassModel>, CheckError> {
        let entry = name.entry_path();
        let Some(bytes) = self.read_entry(&entry)? else {
            return Ok(None);
        };

        let decoded = parse_class(&bytes).map_err(|source| CheckError::ClassDecode {
            class: name.clone(),
            archive: self.label(),
            source,
        })?;

        if ClassName::from_internal(&decoded.this_class) != *name {
            tracing::warn!(
                archive = %self.label(),
                entry = %entry,
                declared = %decoded.this_class,
                "class file declares a different name than its location"
            );
        }

        Ok(Some(decoded.model))
    }

    fn class_names(&mut self) -> Result<Vec<ClassName>, CheckError> {
        let mut names: Vec<ClassName> = match self {
            Archive::Jar { zip, .. } => zip
                .file_names()
                .filter(|n| !n.starts_with("META-INF/"))
                .filter_map(class_path_to_class_name)
                .collect(),
            Archive::Directory { root } => directory_class_names(root),
        };
        names.sort();
        names.dedup();
        Ok(names)
    }
}

fn directory_class_names(root: &Path) -> Vec<ClassName> {
    let walker = WalkBuilder::new(root)
        .hidden(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .build();

    walker
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
        .filter_map(|entry| {
            let rel = entry.path().strip_prefix(root).ok()?;
            let rel = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            if rel.starts_with("META-INF/") {
                return None;
            }
            class_path_to_class_name(&rel)
        })
        .collect()
}

/// Opens every archive up front, in order.
///
/// The first path that cannot be opened aborts with
/// [`CheckError::ArchiveUnavailable`] before any class is examined.
pub fn open_all<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<Archive>, CheckError> {
    paths.iter().map(|p| Archive::open(p.as_ref())).collect()
}
