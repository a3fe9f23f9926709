//! Purpose: Single error type shared by the decoder core, the C ABI, and the CLI.
//! Exports: `Error`, `ErrorKind`, `to_exit_code`.
//! Role: Every failure path returns one of these; nothing in the crate aborts.
//! Invariants: Kind codes are stable; they double as CLI exit codes and C ABI kinds.
use std::error::Error as StdError;
use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    Internal,
    Usage,
    Initialization,
    Invocation,
    NonTextKey,
    UnsupportedValueType,
    UseAfterDestroy,
    Busy,
    Io,
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    key: Option<String>,
    type_name: Option<String>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            key: None,
            type_name: None,
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Record key the failure is attached to, for conversion errors.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Foreign type name that could not be represented.
    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    /// True for the two conversion subkinds (`NonTextKey`, `UnsupportedValueType`).
    pub fn is_conversion(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::NonTextKey | ErrorKind::UnsupportedValueType
        )
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        if let Some(key) = &self.key {
            write!(f, " (key: {key})")?;
        }
        if let Some(type_name) = &self.type_name {
            write!(f, " (type: {type_name})")?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}

pub fn to_exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::Internal => 1,
        ErrorKind::Usage => 2,
        ErrorKind::Initialization => 3,
        ErrorKind::Invocation => 4,
        ErrorKind::NonTextKey => 5,
        ErrorKind::UnsupportedValueType => 6,
        ErrorKind::UseAfterDestroy => 7,
        ErrorKind::Busy => 8,
        ErrorKind::Io => 9,
    }
}

#[cfg(test)]
mod tests {
    use super::{Error, ErrorKind, to_exit_code};

    #[test]
    fn exit_code_mapping_is_stable() {
        let cases = [
            (ErrorKind::Internal, 1),
            (ErrorKind::Usage, 2),
            (ErrorKind::Initialization, 3),
            (ErrorKind::Invocation, 4),
            (ErrorKind::NonTextKey, 5),
            (ErrorKind::UnsupportedValueType, 6),
            (ErrorKind::UseAfterDestroy, 7),
            (ErrorKind::Busy, 8),
            (ErrorKind::Io, 9),
        ];

        for (kind, code) in cases {
            assert_eq!(to_exit_code(kind), code);
        }
    }

    #[test]
    fn display_includes_key_and_type() {
        let err = Error::new(ErrorKind::UnsupportedValueType)
            .with_message("value has no json form")
            .with_key("a")
            .with_type_name("list");
        assert_eq!(
            err.to_string(),
            "UnsupportedValueType: value has no json form (key: a) (type: list)"
        );
        assert!(err.is_conversion());
        assert!(!Error::new(ErrorKind::Invocation).is_conversion());
    }
}
