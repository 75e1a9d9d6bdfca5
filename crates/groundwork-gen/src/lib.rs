//! # groundwork-gen
//!
//! Template-driven code generation from a ground model.
//!
//! - **Templates**: `${slot}` text templates, built in or overridden from disk
//!   ([`cache`])
//! - **Code units**: one header per action and per constraint instantiation ([`codegen`])
//! - **Data listings**: symbols, variables, objects, initial values and static
//!   extensions ([`data`])
//! - **Artifacts**: rendered in memory, then written with a manifest ([`artifact`])
//!
//! [`compile`] runs the whole pipeline for one task.

pub mod artifact;
pub mod cache;
pub mod codegen;
pub mod data;
pub mod error;
pub mod pipeline;
pub mod template;

pub use artifact::{Artifact, ArtifactSet, MANIFEST_FILE, Manifest};
pub use cache::TemplateCache;
pub use error::{GenError, GenResult};
pub use pipeline::{CompileOutput, CompileSummary, compile};
