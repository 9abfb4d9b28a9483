use std::collections::HashSet;

use crate::descriptor::{return_type, signature_class_names, type_operand_class, unwrap_object_type};
use crate::model::{AnnotationRef, ClassModel, Field, Instruction, Method};
use crate::name::ClassName;

pub type ClassReferenceSet = HashSet<ClassName>;

pub const DEFAULT_PLATFORM_PREFIXES: [&str; 5] = ["java.", "javax.", "jdk.", "sun.", "com.sun."];

/// Name prefixes of classes that every target runtime provides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformFilter {
    prefixes: Vec<String>,
}

impl PlatformFilter {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut prefixes: Vec<String> = prefixes
            .into_iter()
            .map(Into::into)
            .filter(|p| !p.is_empty())
            .collect();
        prefixes.sort();
        prefixes.dedup();
        Self { prefixes }
    }

    pub fn none() -> Self {
        Self {
            prefixes: Vec::new(),
        }
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    pub fn is_platform(&self, name: &ClassName) -> bool {
        self.prefixes.iter().any(|p| name.starts_with(p))
    }
}

impl Default for PlatformFilter {
    fn default() -> Self {
        Self::new(DEFAULT_PLATFORM_PREFIXES)
    }
}

/// Computes the classes a decoded class depends on.
#[derive(Debug, Clone, Default)]
pub struct ReferenceExtractor {
    filter: PlatformFilter,
}

impl ReferenceExtractor {
    pub fn new(filter: PlatformFilter) -> Self {
        Self { filter }
    }

    pub fn filter(&self) -> &PlatformFilter {
        &self.filter
    }

    pub fn extract(&self, model: &ClassModel) -> ClassReferenceSet {
        let mut refs = ClassReferenceSet::new();

        for method in &model.methods {
            collect_method(method, &mut refs);
        }
        for field in &model.fields {
            collect_field(field, &mut refs);
        }
        collect_annotations(&model.annotations, &mut refs);

        refs.retain(|name| !self.filter.is_platform(name));
        refs
    }
}

fn collect_method(method: &Method, refs: &mut ClassReferenceSet) {
    for insn in &method.instructions {
        match insn {
            Instruction::Type { operand, .. } => {
                if let Some(name) = type_operand_class(operand) {
                    refs.insert(name);
                }
            }
            Instruction::MethodOwner { owner, .. } | Instruction::FieldOwner { owner, .. } => {
                refs.insert(ClassName::from_internal(owner));
            }
            Instruction::Plain { .. } => {}
        }
    }

    for local in &method.local_variables {
        refs.extend(signature_class_names(&local.descriptor));
        if let Some(sig) = &local.signature {
            refs.extend(signature_class_names(sig));
        }
    }

    match return_type(&method.descriptor) {
        Some(ret) => refs.extend(signature_class_names(ret)),
        None => tracing::warn!(
            method = %method.name,
            descriptor = %method.descriptor,
            "skipping malformed method descriptor"
        ),
    }

    collect_annotations(&method.annotations, refs);
    for params in &method.parameter_annotations {
        collect_annotations(params, refs);
    }
    collect_annotations(&method.local_variable_annotations, refs);
}

fn collect_field(field: &Field, refs: &mut ClassReferenceSet) {
    refs.extend(signature_class_names(&field.descriptor));
    if let Some(sig) = &field.signature {
        refs.extend(signature_class_names(sig));
    }
    collect_annotations(&field.annotations, refs);
}

fn collect_annotations(annotations: &[AnnotationRef], refs: &mut ClassReferenceSet) {
    for ann in annotations {
        let name = unwrap_object_type(&ann.type_descriptor);
        if !name.is_empty() {
            refs.insert(ClassName::from_internal(name));
        }
    }
}
