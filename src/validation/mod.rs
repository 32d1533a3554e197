//! Post-tool-use validation: the lint pipeline and fixer delegation

pub mod delegate;
pub mod pipeline;

pub use delegate::{FixerDelegate, SubprocessDelegate, DELEGATE_ENV};
pub use pipeline::LintPipeline;
