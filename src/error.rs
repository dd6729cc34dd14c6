/// The error type for everything in this crate's library.
///
/// Each variant corresponds to a distinct failure policy. Load failures
/// (`ResourceLoad`) are fatal to the bundle being loaded. Missing messages
/// (`MissingMessage`) only occur in strict mode and are recoverable by the
/// caller. Construction failures (`FormatConstruction`) are never cached, so
/// retrying with a corrected key works.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A message bundle source could not be read or contains malformed data.
    #[error(
        "failed to load message bundle `{base_name}` from {location}: \
         {message}"
    )]
    ResourceLoad {
        base_name: String,
        location: String,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },
    /// No message pattern was found for a key in the full fallback chain.
    #[error(
        "no message for key `{key}` in locale `{locale}` \
         or any of its fallbacks"
    )]
    MissingMessage { locale: String, key: String },
    /// A formatter could not be built from its key.
    #[error("invalid format pattern `{pattern}`: {message}")]
    FormatConstruction { pattern: String, message: String },
    /// A value handed to a formatter is not of a type it can format.
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },
    /// A renderer failed to find, parse or evaluate a template.
    #[error("template `{id}`: {message}")]
    Template { id: String, message: String },
    /// Writing to an output sink failed.
    #[error("failed to write rendered output")]
    Output(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn load(
        base_name: &str,
        location: impl std::fmt::Display,
        message: impl Into<String>,
    ) -> Error {
        Error::ResourceLoad {
            base_name: base_name.to_string(),
            location: location.to_string(),
            message: message.into(),
            source: None,
        }
    }

    pub(crate) fn load_io(
        base_name: &str,
        location: impl std::fmt::Display,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Error {
        Error::ResourceLoad {
            base_name: base_name.to_string(),
            location: location.to_string(),
            message: message.into(),
            source: Some(source),
        }
    }

    pub(crate) fn construction(
        pattern: &str,
        message: impl Into<String>,
    ) -> Error {
        Error::FormatConstruction {
            pattern: pattern.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn argument(message: impl Into<String>) -> Error {
        Error::InvalidArgument { message: message.into() }
    }

    pub(crate) fn template(id: &str, message: impl Into<String>) -> Error {
        Error::Template { id: id.to_string(), message: message.into() }
    }

    /// Returns true when this is a strict-mode missing message.
    pub fn is_missing_message(&self) -> bool {
        matches!(*self, Error::MissingMessage { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
