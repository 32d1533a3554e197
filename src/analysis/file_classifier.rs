use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Logical language of a touched file, used to pick its formatter and checker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LanguageTag {
    Python,
    Shell,
    Yaml,
    Json,
    Toml,
    Dockerfile,
    Markdown,
    Unknown,
}

impl LanguageTag {
    /// Every tag that has tooling behind it (excludes `Unknown`)
    pub const KNOWN: [LanguageTag; 7] = [
        LanguageTag::Python,
        LanguageTag::Shell,
        LanguageTag::Yaml,
        LanguageTag::Json,
        LanguageTag::Toml,
        LanguageTag::Dockerfile,
        LanguageTag::Markdown,
    ];

    /// Key used for this language in the `languages` config object
    pub fn as_str(self) -> &'static str {
        match self {
            LanguageTag::Python => "python",
            LanguageTag::Shell => "shell",
            LanguageTag::Yaml => "yaml",
            LanguageTag::Json => "json",
            LanguageTag::Toml => "toml",
            LanguageTag::Dockerfile => "dockerfile",
            LanguageTag::Markdown => "markdown",
            LanguageTag::Unknown => "unknown",
        }
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LanguageTag {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = LanguageTag::KNOWN
            .into_iter()
            .find(|tag| tag.as_str().eq_ignore_ascii_case(s.trim()))
            .unwrap_or(LanguageTag::Unknown);
        Ok(tag)
    }
}

/// Classify a path by suffix or basename only. File content is never read.
pub fn classify(path: impl AsRef<Path>) -> LanguageTag {
    let path = path.as_ref();
    let file_name = match path.file_name() {
        Some(name) => name.to_string_lossy().to_string(),
        None => return LanguageTag::Unknown,
    };

    // Dockerfile, Dockerfile.dev, Dockerfile.prod ...
    if file_name == "Dockerfile" || file_name.starts_with("Dockerfile.") {
        return LanguageTag::Dockerfile;
    }

    let extension = match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext.to_ascii_lowercase(),
        _ => return LanguageTag::Unknown,
    };

    match extension.as_str() {
        "py" | "pyi" => LanguageTag::Python,
        "sh" | "bash" => LanguageTag::Shell,
        "yaml" | "yml" => LanguageTag::Yaml,
        "json" => LanguageTag::Json,
        "toml" => LanguageTag::Toml,
        "dockerfile" => LanguageTag::Dockerfile,
        "md" | "markdown" => LanguageTag::Markdown,
        _ => LanguageTag::Unknown,
    }
}
