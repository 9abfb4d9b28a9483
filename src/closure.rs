//! Transitive class reachability across an ordered list of sources.
//!
//! The walk is a FIFO worklist seeded with the entry class. Each class is
//! resolved at most once, against the sources in order, and the first
//! source that defines it wins. The first class no source defines ends the
//! walk.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info};

use crate::archive::{ClassSource, open_all};
use crate::error::CheckError;
use crate::extract::ReferenceExtractor;
use crate::model::ClassModel;
use crate::name::ClassName;

/// Result of a completed walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Satisfied(ClosureReport),
    Missing(MissingDependency),
}

impl Outcome {
    pub fn is_satisfied(&self) -> bool {
        matches!(self, Outcome::Satisfied(_))
    }

    pub fn missing_class(&self) -> Option<&ClassName> {
        match self {
            Outcome::Satisfied(_) => None,
            Outcome::Missing(missing) => Some(&missing.class),
        }
    }

    /// Collapses the outcome to `Ok(())` or the name of the missing class.
    pub fn into_result(self) -> Result<(), ClassName> {
        match self {
            Outcome::Satisfied(_) => Ok(()),
            Outcome::Missing(missing) => Err(missing.class),
        }
    }
}

/// The first class that no source defines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingDependency {
    pub class: ClassName,
    /// Entry class first, `class` last; each element was first referenced by
    /// the one before it.
    pub chain: Vec<ClassName>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClosureReport {
    /// Classes in resolution order.
    pub resolved: Vec<ResolvedClass>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedClass {
    pub class: ClassName,
    /// Index into the source list of the archive that supplied the class.
    pub source: usize,
}

#[derive(Debug, Clone, Default)]
pub struct DependencyClosure {
    extractor: ReferenceExtractor,
}

impl DependencyClosure {
    pub fn new(extractor: ReferenceExtractor) -> Self {
        Self { extractor }
    }

    pub fn extractor(&self) -> &ReferenceExtractor {
        &self.extractor
    }

    pub fn check<S: ClassSource>(
        &self,
        entry: &ClassName,
        sources: &mut [S],
    ) -> Result<Outcome, CheckError> {
        info!(entry = %entry, sources = sources.len(), "checking dependency closure");

        let mut visited: HashSet<ClassName> = HashSet::from([entry.clone()]);
        let mut worklist: VecDeque<ClassName> = VecDeque::from([entry.clone()]);
        let mut referrers: HashMap<ClassName, ClassName> = HashMap::new();
        let mut report = ClosureReport::default();

        while let Some(name) = worklist.pop_front() {
            let Some((source, model)) = resolve_first(&name, sources)? else {
                info!(missing = %name, resolved = report.resolved.len(), "class not found in any source");
                let chain = reference_chain(&name, &referrers);
                return Ok(Outcome::Missing(MissingDependency { class: name, chain }));
            };
            debug!(class = %name, source, "resolved");

            // HashSet order is unstable across runs; sort to keep FIFO order
            // and therefore the reported class reproducible.
            let mut refs: Vec<ClassName> = self.extractor.extract(&model).into_iter().collect();
            refs.sort();

            for referenced in refs {
                if visited.insert(referenced.clone()) {
                    referrers.insert(referenced.clone(), name.clone());
                    worklist.push_back(referenced);
                }
            }

            report.resolved.push(ResolvedClass { class: name, source });
        }

        info!(resolved = report.resolved.len(), "all dependencies satisfied");
        Ok(Outcome::Satisfied(report))
    }

    /// Opens every path, then checks. No class is examined unless all
    /// archives open.
    pub fn check_paths<P: AsRef<Path>>(
        &self,
        entry: &ClassName,
        paths: &[P],
    ) -> Result<Outcome, CheckError> {
        let mut archives = open_all(paths)?;
        self.check(entry, &mut archives)
    }
}

fn resolve_first<S: ClassSource>(
    name: &ClassName,
    sources: &mut [S],
) -> Result<Option<(usize, ClassModel)>, CheckError> {
    for (index, source) in sources.iter_mut().enumerate() {
        if let Some(model) = source.resolve_class(name)? {
            return Ok(Some((index, model)));
        }
    }
    Ok(None)
}

fn reference_chain(missing: &ClassName, referrers: &HashMap<ClassName, ClassName>) -> Vec<ClassName> {
    let mut chain = vec![missing.clone()];
    let mut current = missing;
    while let Some(parent) = referrers.get(current) {
        chain.push(parent.clone());
        current = parent;
    }
    chain.reverse();
    chain
}
