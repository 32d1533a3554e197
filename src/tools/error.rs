use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{0} is not installed or not on PATH")]
    NotFound(String),

    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("i/o error while running {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exceeded the {secs}s timeout")]
    Timeout { program: String, secs: u64 },

    #[error("{program} exited with unexpected status {code:?}")]
    ExitStatus { program: String, code: Option<i32> },

    #[error("could not parse {program} output: {reason}")]
    Parse { program: String, reason: String },
}
