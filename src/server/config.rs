//! Server Configuration

use std::path::PathBuf;

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Bind address
    pub bind: String,

    /// Port number
    pub port: u16,

    /// Vector file loaded at startup (text or binary table)
    pub vectors_path: PathBuf,

    /// Largest `topn` a query may ask for
    pub max_topn: usize,

    /// Longest accepted query word, in characters
    pub max_word_len: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 8000,
            vectors_path: PathBuf::from("data/glove.6B.50d.txt"),
            max_topn: 20,
            max_word_len: 32,
        }
    }
}

/// Configuration validation error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("bind address cannot be empty")]
    EmptyBind,

    #[error("vectors path cannot be empty")]
    EmptyVectorsPath,

    #[error("max_topn must be at least 1")]
    InvalidMaxTopn,

    #[error("max_word_len must be at least 1")]
    InvalidMaxWordLen,
}

impl Config {
    /// Create a new config with custom port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Create a new config with custom bind address
    pub fn with_bind(mut self, bind: impl Into<String>) -> Self {
        self.bind = bind.into();
        self
    }

    /// Set the vector file
    pub fn with_vectors_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.vectors_path = path.into();
        self
    }

    pub fn with_max_topn(mut self, max_topn: usize) -> Self {
        self.max_topn = max_topn;
        self
    }

    pub fn with_max_word_len(mut self, max_word_len: usize) -> Self {
        self.max_word_len = max_word_len;
        self
    }

    /// Socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bind.trim().is_empty() {
            return Err(ConfigError::EmptyBind);
        }
        if self.vectors_path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyVectorsPath);
        }
        if self.max_topn == 0 {
            return Err(ConfigError::InvalidMaxTopn);
        }
        if self.max_word_len == 0 {
            return Err(ConfigError::InvalidMaxWordLen);
        }
        Ok(())
    }
}
