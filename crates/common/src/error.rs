//! Error types for Quest

use thiserror::Error;

/// Result type alias using Quest Error
pub type Result<T> = std::result::Result<T, Error>;

/// Quest error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Element not found: {criterion}")]
    NotFound { criterion: String },

    #[error("Stale element reference: {0}")]
    StaleElement(String),

    #[error("Element click intercepted: {0}")]
    ClickIntercepted(String),

    #[error("Element not interactable: {0}")]
    NotInteractable(String),

    #[error("Timed out after {millis} ms waiting for {what}")]
    Timeout { what: String, millis: u64 },

    #[error("Script error: {0}")]
    Script(String),

    #[error("Illegal argument: {0}")]
    IllegalArgument(String),

    #[error("Illegal state: {0}")]
    IllegalState(String),

    #[error("Assertion failed: {0}")]
    Assertion(String),

    #[error("WebDriver transport error: {0}")]
    Transport(String),

    #[error("WebDriver error '{error}': {message}")]
    WebDriver { error: String, message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification of an [`Error`], used by call sites to decide
/// whether a failure gets a substitute result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    StaleElement,
    ClickIntercepted,
    NotInteractable,
    Timeout,
    Script,
    IllegalArgument,
    IllegalState,
    Configuration,
    Assertion,
    Transport,
    Io,
    Serialization,
    Database,
    Internal,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io(_) => ErrorKind::Io,
            Error::Database(_) => ErrorKind::Database,
            Error::Serialization(_) | Error::Yaml(_) => ErrorKind::Serialization,
            Error::Configuration(_) => ErrorKind::Configuration,
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::StaleElement(_) => ErrorKind::StaleElement,
            Error::ClickIntercepted(_) => ErrorKind::ClickIntercepted,
            Error::NotInteractable(_) => ErrorKind::NotInteractable,
            Error::Timeout { .. } => ErrorKind::Timeout,
            Error::Script(_) => ErrorKind::Script,
            Error::IllegalArgument(_) => ErrorKind::IllegalArgument,
            Error::IllegalState(_) => ErrorKind::IllegalState,
            Error::Assertion(_) => ErrorKind::Assertion,
            Error::Transport(_) | Error::WebDriver { .. } => ErrorKind::Transport,
            Error::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Shorthand for a lookup failure naming what was searched for
    pub fn not_found(criterion: impl Into<String>) -> Self {
        Error::NotFound {
            criterion: criterion.into(),
        }
    }

    /// Map a W3C WebDriver error code onto the matching variant
    pub fn from_webdriver(error: &str, message: &str) -> Self {
        let message = message.to_string();
        match error {
            "no such element" | "no such alert" | "no such shadow root" => {
                Error::NotFound { criterion: message }
            }
            "stale element reference" => Error::StaleElement(message),
            "element click intercepted" => Error::ClickIntercepted(message),
            "element not interactable" => Error::NotInteractable(message),
            "timeout" | "script timeout" => Error::Timeout {
                what: message,
                millis: 0,
            },
            "javascript error" => Error::Script(message),
            "invalid argument" | "invalid selector" => Error::IllegalArgument(message),
            other => Error::WebDriver {
                error: other.to_string(),
                message,
            },
        }
    }
}

/// Per-call substitution of results for selected error kinds
pub trait ResultExt<T> {
    /// Replace an error of `kind` with `fallback`
    fn recover(self, kind: ErrorKind, fallback: T) -> Result<T>;

    /// Replace an error of `kind` with the value produced by `f`
    fn recover_with<F: FnOnce(&Error) -> T>(self, kind: ErrorKind, f: F) -> Result<T>;

    /// Turn an error of `kind` into `Ok(None)`
    fn ignore(self, kind: ErrorKind) -> Result<Option<T>>;
}

impl<T> ResultExt<T> for Result<T> {
    fn recover(self, kind: ErrorKind, fallback: T) -> Result<T> {
        match self {
            Err(e) if e.kind() == kind => {
                tracing::debug!("Recovered {:?}: {}", kind, e);
                Ok(fallback)
            }
            other => other,
        }
    }

    fn recover_with<F: FnOnce(&Error) -> T>(self, kind: ErrorKind, f: F) -> Result<T> {
        match self {
            Err(e) if e.kind() == kind => Ok(f(&e)),
            other => other,
        }
    }

    fn ignore(self, kind: ErrorKind) -> Result<Option<T>> {
        match self {
            Ok(v) => Ok(Some(v)),
            Err(e) if e.kind() == kind => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webdriver_codes_map_to_kinds() {
        assert_eq!(
            Error::from_webdriver("no such element", "#missing").kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            Error::from_webdriver("element click intercepted", "overlay").kind(),
            ErrorKind::ClickIntercepted
        );
        assert_eq!(
            Error::from_webdriver("unknown command", "nope").kind(),
            ErrorKind::Transport
        );
    }

    #[test]
    fn test_recover_only_matching_kind() {
        let missing: Result<bool> = Err(Error::not_found("button 'Save'"));
        assert!(!missing.recover(ErrorKind::NotFound, false).unwrap());

        let illegal: Result<bool> = Err(Error::IllegalArgument("ALL".into()));
        assert!(illegal.recover(ErrorKind::NotFound, false).is_err());
    }

    #[test]
    fn test_ignore() {
        let missing: Result<u32> = Err(Error::not_found("row"));
        assert_eq!(missing.ignore(ErrorKind::NotFound).unwrap(), None);

        let found: Result<u32> = Ok(3);
        assert_eq!(found.ignore(ErrorKind::NotFound).unwrap(), Some(3));
    }

    #[test]
    fn test_not_found_message_embeds_criterion() {
        let err = Error::not_found("By.css(\"#save\")");
        assert!(err.to_string().contains("#save"));
    }
}
