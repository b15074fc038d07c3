use thiserror::Error;

/// Fatal configuration problems, raised before any network I/O.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read source registry at {path}: {source}")]
    RegistryIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse source registry: {0}")]
    RegistryParse(#[from] serde_yaml::Error),

    #[error("invalid source registry: {0}")]
    Validation(String),
}
