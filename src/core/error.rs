use thiserror::Error;

/// Failure to parse or validate a single scalar field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum FieldError {
    /// A mandatory value is absent or blank.
    #[error("value is required")]
    Missing,

    /// The value is longer than the protocol allows.
    #[error("must be at most {max} characters, got {actual}")]
    TooLong { max: usize, actual: usize },

    /// The value contains a character outside the permitted set.
    #[error("character '{0}' is not allowed")]
    InvalidCharacter(char),

    /// The value does not follow the expected textual layout.
    #[error("invalid format: {0}")]
    Format(String),

    /// The value is well-formed but its check digit does not match.
    #[error("checksum mismatch")]
    Checksum,

    /// The value lies outside the accepted range.
    #[error("out of range: {0}")]
    OutOfRange(String),

    /// A decimal carries more fractional digits than allowed.
    #[error("at most {max} decimal places allowed, got {actual}")]
    Precision { max: u32, actual: u32 },
}

/// A single validation error with field path and message.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ValidationError {
    /// Request field the error belongs to (e.g. "cash_register_id").
    pub field: String,
    /// Human-readable error description.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Tag a field-level failure with the field it was found on.
    pub fn from_field(field: impl Into<String>, err: &FieldError) -> Self {
        Self::new(field, err.to_string())
    }
}

/// The taxpayer key cannot produce a security code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SigningError {
    /// The key is smaller than the 2048-bit modulus the protocol requires.
    #[error("RSA key has {bits} bits, at least 2048 required")]
    KeyTooSmall { bits: usize },

    /// The key material could not be decoded.
    #[error("invalid private key: {0}")]
    InvalidKey(String),

    /// The RSA primitive rejected the operation.
    #[error("RSA signing failed: {0}")]
    Rsa(#[from] rsa::Error),
}

/// The request envelope could not be produced.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EncodeError {
    /// Security codes must be computed before the envelope is built.
    #[error("transaction has no security codes")]
    MissingSecurityCodes,

    /// The signing certificate is not usable.
    #[error("invalid certificate: {0}")]
    Certificate(String),

    /// Writing the XML failed.
    #[error("XML write error: {0}")]
    Xml(String),

    /// Signing the SOAP body failed.
    #[error("envelope signature: {0}")]
    Signing(#[from] SigningError),
}

/// An envelope could not be read back.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DecodeError {
    /// Not decodable as XML/SOAP.
    #[error("malformed envelope: {0}")]
    Malformed(String),

    /// A section the protocol mandates is absent.
    #[error("missing element <{0}>")]
    MissingElement(&'static str),

    #[error("<{element}> is missing attribute {name}")]
    MissingAttribute {
        element: &'static str,
        name: &'static str,
    },

    /// An attribute carries a value of the wrong shape.
    #[error("invalid attribute {name}='{value}': {reason}")]
    InvalidAttribute {
        name: String,
        value: String,
        reason: String,
    },

    /// The response belongs to a different submission.
    #[error("response {field} '{received}' does not match request '{expected}'")]
    Mismatch {
        field: &'static str,
        expected: String,
        received: String,
    },
}

impl From<quick_xml::Error> for DecodeError {
    fn from(e: quick_xml::Error) -> Self {
        Self::Malformed(e.to_string())
    }
}
