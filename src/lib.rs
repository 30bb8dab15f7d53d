//! Parley: Dialogue Template Compilation
//!
//! Compiles hierarchical field schemas into runtime dialogue trees: planned
//! generation units, a sequential resumable generation run against an
//! external content generator, and deterministic assembly into steps,
//! escalations, tasks, and a translation table.

pub mod artifact;
pub mod assemble;
pub mod compile;
pub mod config;
pub mod error;
pub mod generate;
pub mod logging;
pub mod plan;
pub mod schema;
pub mod types;
