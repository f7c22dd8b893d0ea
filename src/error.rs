//! Error type shared by the marshaller and the expression engine.
//!
//! Every error is raised where it is detected and carries the attribute or
//! property name together with the offending value, so a failure can be
//! diagnosed without walking the stack.

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised while marshalling values or building expressions.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No mapper is registered for the value's runtime or declared type.
    #[error("no mapper available for `{name}` of type {type_name}")]
    UnmappableType {
        /// Property or attribute name.
        name: String,
        /// Runtime or declared type that could not be mapped.
        type_name: String,
    },
    /// A scalar mapper received a value of the wrong shape.
    #[error("invalid value for `{name}`: expected {expected}, found {found}")]
    InvalidScalarValue {
        /// Property or attribute name.
        name: String,
        /// Expected type.
        expected: &'static str,
        /// Rendering of the offending value.
        found: String,
    },
    /// A key property marshalled to a non-scalar attribute value.
    #[error("key attribute `{name}` must be of type S, N or B, found {found}")]
    InvalidKeyType {
        /// Property name.
        name: String,
        /// Attribute type descriptor produced by the mapper.
        found: &'static str,
    },
    /// A required partition or sort key has no value.
    #[error("missing value for key attribute `{name}`")]
    MissingKeyValue {
        /// Property name.
        name: String,
    },
    /// An operator received the wrong number of operands.
    #[error("operator {operator} on `{path}` expects {expected} operand(s), found {found}")]
    InvalidOperandCount {
        /// Attribute path the operator is applied to.
        path: String,
        /// Operator name.
        operator: String,
        /// Expected operand count.
        expected: usize,
        /// Supplied operand count.
        found: usize,
    },
    /// An operand has a type the operator cannot accept.
    #[error("invalid operand for {operator} on `{path}`: {message}")]
    InvalidOperandType {
        /// Attribute path the operator is applied to.
        path: String,
        /// Operator name.
        operator: String,
        /// Description of the mismatch.
        message: String,
    },
    /// An update statement contains a clause keyword outside SET, REMOVE, ADD and DELETE.
    #[error("unknown update action keyword `{keyword}` in `{statement}`")]
    UnknownActionKeyword {
        /// Offending token.
        keyword: String,
        /// Statement being parsed.
        statement: String,
    },
    /// An enum ordinal is not part of the declared enum.
    #[error("invalid value {value} for enum `{name}`")]
    InvalidEnumValue {
        /// Enum or property name.
        name: String,
        /// Rendering of the offending value.
        value: String,
    },
    /// Model metadata violates a structural invariant.
    #[error("invalid metadata for model `{model}`: {message}")]
    InvalidMetadata {
        /// Model name.
        model: String,
        /// Description of the violation.
        message: String,
    },
    /// An attribute path could not be parsed.
    #[error("invalid attribute path `{path}`")]
    InvalidAttributePath {
        /// Offending path.
        path: String,
    },
    /// A JSON document does not follow the attribute value wire shape.
    #[error("invalid attribute value wire format: {0}")]
    InvalidWireFormat(String),
    /// Conversion between a serde type and a host value failed.
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
    /// A store request could not be assembled.
    #[error(transparent)]
    Build(#[from] aws_sdk_dynamodb::error::BuildError),
}

impl Error {
    pub(crate) fn invalid_scalar(
        name: Option<&str>,
        expected: &'static str,
        found: impl std::fmt::Debug,
    ) -> Self {
        Self::InvalidScalarValue {
            name: name.unwrap_or_default().to_string(),
            expected,
            found: format!("{found:?}"),
        }
    }
}
