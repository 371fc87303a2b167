//! Config sources, lowest to highest precedence: global file, workspace files, environment.

pub mod environment;
pub mod global_file;
pub mod workspace_file;
