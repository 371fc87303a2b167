//! Two-Stage Synthesis
//!
//! Stage one turns a content basis (video reference) into an activity spec; stage two
//! turns a committed spec into a single self-contained HTML document. Each stage is a
//! prompt build, one service call, and an extraction step. Neither stage keeps state
//! between calls; sequencing and commits belong to the orchestrator.

pub mod code;
pub mod spec;

pub use code::CodeSynthesizer;
pub use spec::SpecSynthesizer;
