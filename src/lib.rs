//! # class-closure
//!
//! Static check that every class reachable from a Java entry class is present
//! in an ordered list of jars, without loading or running any of them.
//!
//! ## Architecture
//!
//! - **classfile**: Class-file decoding into the reduced model below
//! - **model**: Methods, fields, instructions and annotations of one class
//! - **descriptor**: Type descriptor and generic signature tokenizing
//! - **extract**: Dependency rules and platform-prefix filtering
//! - **archive**: Memory-mapped jars and class directories as class sources
//! - **closure**: FIFO worklist walk, first source wins, stops at the first missing class
//! - **catalog**: Parallel class listing per archive
//! - **config**: JSON config with platform prefixes
//! - **cli**: Command line definition

pub mod archive;
pub mod catalog;
pub mod classfile;
pub mod cli;
pub mod closure;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod extract;
pub mod model;
pub mod name;

pub use closure::{DependencyClosure, Outcome};
pub use error::CheckError;
pub use name::ClassName;
