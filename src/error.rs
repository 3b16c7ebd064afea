//! Error types and handling for the `CineSky` application

use thiserror::Error;

/// Main error type for the `CineSky` application
#[derive(Error, Debug)]
pub enum CineSkyError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// API communication errors
    #[error("API error: {message}")]
    Api { message: String },

    /// Authentication and session errors
    #[error("Authentication error: {message}")]
    Auth { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Lookup of a stored entity that does not exist
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// Cache operation errors
    #[error("Cache error: {message}")]
    Cache { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// General application errors
    #[error("Application error: {message}")]
    General { message: String },
}

impl CineSkyError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Create a new authentication error
    pub fn auth<S: Into<String>>(message: S) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new not-found error
    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a new cache error
    pub fn cache<S: Into<String>>(message: S) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    /// Create a new general error
    pub fn general<S: Into<String>>(message: S) -> Self {
        Self::General {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            CineSkyError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            CineSkyError::Api { .. } => {
                "Unable to connect to the weather service. Please try again later.".to_string()
            }
            CineSkyError::Auth { message } => message.clone(),
            CineSkyError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            CineSkyError::NotFound { message } => message.clone(),
            CineSkyError::Cache { .. } => {
                "Storage operation failed. You may need to clear the cache directory.".to_string()
            }
            CineSkyError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
            CineSkyError::General { message } => message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_err = CineSkyError::config("missing API key");
        assert!(matches!(config_err, CineSkyError::Config { .. }));

        let api_err = CineSkyError::api("connection failed");
        assert!(matches!(api_err, CineSkyError::Api { .. }));

        let auth_err = CineSkyError::auth("invalid credentials");
        assert!(matches!(auth_err, CineSkyError::Auth { .. }));

        let validation_err = CineSkyError::validation("invalid coordinates");
        assert!(matches!(validation_err, CineSkyError::Validation { .. }));
    }

    #[test]
    fn test_user_messages() {
        let config_err = CineSkyError::config("test");
        assert!(config_err.user_message().contains("Configuration error"));

        let api_err = CineSkyError::api("test");
        assert!(api_err.user_message().contains("Unable to connect"));

        let auth_err = CineSkyError::auth("Invalid email or password.");
        assert_eq!(auth_err.user_message(), "Invalid email or password.");

        let validation_err = CineSkyError::validation("test input");
        assert!(validation_err.user_message().contains("test input"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let cinesky_err: CineSkyError = io_err.into();
        assert!(matches!(cinesky_err, CineSkyError::Io { .. }));
    }
}
