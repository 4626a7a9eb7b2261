//! Artifact output and the dashboard view.

pub mod generator;
pub mod writer;

pub use generator::{render_dashboard, DEFAULT_TOP};
pub use writer::{generate_json, load_document, write_document};
