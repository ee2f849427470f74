/*!
 * Error types for the doctranslate application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when calling a translation backend
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Too many requests in a short period
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Character or request quota of the account is used up
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    /// The backend does not support the requested target language
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

impl ProviderError {
    /// Whether the dispatcher should back off and try the same backend again.
    ///
    /// Only throttling conditions qualify. Transport, auth and language errors
    /// will not be fixed by waiting, so they go straight to the fallback.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimitExceeded(_) | Self::QuotaExceeded(_))
    }
}

/// Errors that abort the processing of a whole document
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The input file does not exist
    #[error("Input file not found: {0}")]
    NotFound(PathBuf),

    /// The file extension is not one of the supported formats
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    /// The document container or one of its parts could not be parsed
    #[error("Failed to parse {path}: {message}")]
    Parse {
        /// Document path
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// Text extraction of a PDF or legacy document failed
    #[error("Failed to extract text from {path}: {message}")]
    Extraction {
        /// Document path
        path: PathBuf,
        /// Extractor message
        message: String,
    },

    /// Writing the translated document failed
    #[error("Failed to save {path}: {message}")]
    Save {
        /// Output path
        path: PathBuf,
        /// Writer message
        message: String,
    },
}

impl DocumentError {
    /// Whether this error came from text extraction rather than setup
    pub fn is_extraction(&self) -> bool {
        matches!(self, Self::Extraction { .. })
    }
}

/// Errors that can occur when writing a translation back into a fragment
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FragmentApplyError {
    /// No fragment with this id exists in the document
    #[error("Unknown fragment id: {0}")]
    UnknownFragment(usize),

    /// The fragment has already received its translation
    #[error("Fragment {0} was already translated")]
    AlreadyApplied(usize),

    /// The document structure changed and the fragment can no longer be written
    #[error("Fragment {id} cannot be written: {message}")]
    Unwritable {
        /// Fragment id
        id: usize,
        /// Reason
        message: String,
    },
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a backend
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from document handling
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    /// Error from writing a fragment
    #[error("Fragment error: {0}")]
    Fragment(#[from] FragmentApplyError),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
