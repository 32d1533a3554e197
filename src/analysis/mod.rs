/// File classification by suffix and basename
pub mod file_classifier;

pub use file_classifier::{classify, LanguageTag};
