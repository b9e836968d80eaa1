use std::fmt;

/// Config-boundary failure (unreadable file, bad YAML, invalid values).
/// Fatal: the CLI maps this to its config-error exit code.
#[derive(Debug)]
pub struct ConfigError(pub String);

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {}", self.0)
    }
}

impl std::error::Error for ConfigError {}
