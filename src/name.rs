use serde::Serialize;
use std::borrow::Borrow;
use std::fmt;

/// A fully-qualified, dot-separated class name such as `a.b.C`.
///
/// Equality is exact string equality. The only normalization ever applied is
/// turning the class-file internal form (`a/b/C`) into dotted form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ClassName(String);

impl ClassName {
    pub fn new(dotted: impl Into<String>) -> Self {
        Self(dotted.into())
    }

    pub fn from_internal(internal: &str) -> Self {
        Self(internal.replace('/', "."))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn entry_path(&self) -> String {
        class_name_to_class_path(&self.0)
    }

    pub fn starts_with(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }
}

impl fmt::Display for ClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ClassName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ClassName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ClassName {
    fn from(value: String) -> Self {
        Self(value)
    }
}

pub fn class_name_to_class_path(class_name: &str) -> String {
    format!("{}.class", class_name.replace('.', "/"))
}

/// Maps an archive entry such as `a/b/C.class` back to `a.b.C`.
///
/// Returns `None` for non-class entries and for `module-info.class`, which
/// does not name a loadable class.
pub fn class_path_to_class_name(entry: &str) -> Option<ClassName> {
    let stem = entry.strip_suffix(".class")?;
    if stem.is_empty() || stem.ends_with("module-info") {
        return None;
    }
    Some(ClassName(stem.replace(['/', '\\'], ".")))
}
