use crate::value::TypeTag;
use thiserror::Error;

/// Result type alias using the structured `ExError`
pub type Result<T> = std::result::Result<T, ExError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code so that a host validation hook can
/// translate failures into its own response format without string matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Call shape
    /// A call was made with arguments of the wrong shape (e.g. diffing a non-mapping)
    InvalidArgument,
    /// A rule definition is missing its key or one of its guides
    IncompleteRule,
    /// A rule's from/to guides are the same literal and can never describe a change
    NoOpRule,

    // Wire codec
    /// A wire value carries a tag the codec does not recognise
    Encoding,
    /// A predicate guide names a predicate that is not registered
    UnknownPredicate,
    /// A regular expression guide could not be compiled
    InvalidPattern,

    // Evaluation
    /// An assertion-style evaluation found a change or rule that did not match
    PolicyViolation,

    // Configuration
    InvalidConfig,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidArgument => "ERR_INVALID_ARGUMENT",
            ExErrorKind::IncompleteRule => "ERR_INCOMPLETE_RULE",
            ExErrorKind::NoOpRule => "ERR_NO_OP_RULE",
            ExErrorKind::Encoding => "ERR_ENCODING",
            ExErrorKind::UnknownPredicate => "ERR_UNKNOWN_PREDICATE",
            ExErrorKind::InvalidPattern => "ERR_INVALID_PATTERN",
            ExErrorKind::PolicyViolation => "ERR_POLICY_VIOLATION",
            ExErrorKind::InvalidConfig => "ERR_INVALID_CONFIG",
        }
    }

    /// True for the kinds that signal a malformed call rather than a failed check
    pub fn is_argument_error(&self) -> bool {
        matches!(
            self,
            ExErrorKind::InvalidArgument | ExErrorKind::IncompleteRule | ExErrorKind::NoOpRule
        )
    }
}

/// Canonical structured error type
///
/// Carries the classification plus the context a host needs to build a
/// user-facing "forbidden" response: the offending path, the rule's reason
/// and the wire form of the from/to values involved.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    key: Option<String>,
    reason: Option<String>,
    from: Option<serde_json::Value>,
    to: Option<serde_json::Value>,
    message: String,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            key: None,
            reason: None,
            from: None,
            to: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add the diff path or rule key involved
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Add the human-readable reason attached to the rule
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Add the wire form of the from/to values
    pub fn with_change(mut self, from: serde_json::Value, to: serde_json::Value) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the path or rule key, if any
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Get the rule's reason, if any
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// Get the wire form of the from value, if any
    pub fn from_value(&self) -> Option<&serde_json::Value> {
        self.from.as_ref()
    }

    /// Get the wire form of the to value, if any
    pub fn to_value(&self) -> Option<&serde_json::Value> {
        self.to.as_ref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(key) = &self.key {
            write!(f, " (key: {})", key)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Domain error taxonomy for the diff and policy engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DiffError {
    /// Top-level diff input is not a mapping
    #[error("{side} argument is not an object (found {found})")]
    NotAMapping { side: &'static str, found: String },

    /// Two distinct fields flatten to the same diff path
    #[error("ambiguous path {path}: more than one field changes under this name")]
    AmbiguousPath { path: String },

    /// A rule is missing its key or guides
    #[error("{message}")]
    IncompleteRule { message: String },

    /// A rule whose from/to literals are identical
    #[error("This indicates no change at all: {key}")]
    NoOpRule { key: String },

    /// A wire tag the codec does not know
    #[error("Unknown type \"{tag}\"")]
    UnknownType { tag: String },

    /// A wire value with a known tag but the wrong shape
    #[error("Unknown object to decode: {wire}")]
    MalformedWire { wire: String },

    /// A predicate name with no registered implementation
    #[error("Unknown predicate: {name}")]
    UnknownPredicate { name: String },

    /// A regular expression that does not compile
    #[error("Invalid pattern /{pattern}/{flags}: {message}")]
    InvalidPattern {
        pattern: String,
        flags: String,
        message: String,
    },

    /// A failed assertion-style evaluation
    #[error("{message}")]
    Violation {
        op: &'static str,
        key: String,
        reason: Option<String>,
        from: serde_json::Value,
        to: serde_json::Value,
        message: String,
    },

    /// Configuration could not be parsed
    #[error("Invalid configuration: {message}")]
    Config { message: String },
}

impl DiffError {
    /// Build a `NotAMapping` error for the given argument position.
    pub(crate) fn not_a_mapping(side: &'static str, found: Option<TypeTag>) -> Self {
        DiffError::NotAMapping {
            side,
            found: found.map_or_else(|| "nothing".to_string(), |t| t.name().to_string()),
        }
    }
}

impl From<DiffError> for ExError {
    fn from(err: DiffError) -> Self {
        let message = err.to_string();
        match err {
            DiffError::NotAMapping { .. } => ExError::new(ExErrorKind::InvalidArgument)
                .with_op("diff")
                .with_message(message),

            DiffError::AmbiguousPath { path } => ExError::new(ExErrorKind::InvalidArgument)
                .with_op("diff")
                .with_key(path)
                .with_message(message),

            DiffError::IncompleteRule { .. } => {
                ExError::new(ExErrorKind::IncompleteRule).with_message(message)
            }

            DiffError::NoOpRule { key } => ExError::new(ExErrorKind::NoOpRule)
                .with_key(key)
                .with_message(message),

            DiffError::UnknownType { .. } | DiffError::MalformedWire { .. } => {
                ExError::new(ExErrorKind::Encoding)
                    .with_op("decode")
                    .with_message(message)
            }

            DiffError::UnknownPredicate { .. } => ExError::new(ExErrorKind::UnknownPredicate)
                .with_op("decode")
                .with_message(message),

            DiffError::InvalidPattern { .. } => {
                ExError::new(ExErrorKind::InvalidPattern).with_message(message)
            }

            DiffError::Violation {
                op,
                key,
                reason,
                from,
                to,
                message,
            } => {
                let err = ExError::new(ExErrorKind::PolicyViolation)
                    .with_op(op)
                    .with_key(key)
                    .with_change(from, to)
                    .with_message(message);
                match reason {
                    Some(reason) => err.with_reason(reason),
                    None => err,
                }
            }

            DiffError::Config { .. } => {
                ExError::new(ExErrorKind::InvalidConfig).with_message(message)
            }
        }
    }
}
