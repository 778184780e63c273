use alloc::string::{String, ToString};

use thiserror::Error;

// -----------------------------------------------------------------------------
// ConvertError

/// The failure of a single conversion.
///
/// Every variant names the offending value or token and the type it was
/// converted from or into. When a converter runs inside a serde call the
/// error is turned into the format's error with `Error::custom`, so the
/// message below is what the caller of `serde_json::to_string` and friends
/// sees.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConvertError {
    #[error("Unable to convert \"{value}\" to string for enum \"{enum_type}\".")]
    UnmappedValue {
        value: String,
        enum_type: &'static str,
    },

    #[error("Unable to convert \"{label}\" to enum \"{enum_type}\".")]
    UnknownLabel {
        label: String,
        enum_type: &'static str,
    },

    #[error("Unable to convert {token} to enum \"{enum_type}\", expected a string.")]
    InvalidToken {
        token: String,
        enum_type: &'static str,
    },

    #[error("Duplicate label \"{label}\" in enum \"{enum_type}\" (members `{first}` and `{second}`).")]
    DuplicateLabel {
        label: &'static str,
        enum_type: &'static str,
        first: &'static str,
        second: &'static str,
    },

    #[error("Member `{member}` is declared twice in enum \"{enum_type}\".")]
    DuplicateMember {
        member: &'static str,
        enum_type: &'static str,
    },

    #[error("No converter is registered for `{type_name}`.")]
    UnsupportedType { type_name: String },

    #[error("Deserialization of `{implementation}` returned no value.")]
    NoValue { implementation: &'static str },

    #[error("The `{capability}` value is not a `{implementation}`.")]
    MismatchedImplementation {
        capability: &'static str,
        implementation: &'static str,
    },

    #[error("Missing type discriminator \"Type\" for `{capability}`.")]
    MissingDiscriminator { capability: &'static str },

    #[error("Invalid type discriminator {found} for `{capability}`, expected a string.")]
    InvalidDiscriminator {
        found: String,
        capability: &'static str,
    },

    #[error("Unknown type: {type_path}")]
    UnknownType {
        type_path: String,
        capability: &'static str,
    },

    #[error("Incompatible type: `{type_path}` is not a registered implementation of `{capability}`.")]
    IncompatibleType {
        type_path: String,
        capability: &'static str,
    },

    #[error("The concrete type {type_id} of a `{capability}` value is not registered.")]
    UnregisteredType {
        type_id: String,
        capability: &'static str,
    },

    #[error("`{type_path}` must be a JSON object, found {found}.")]
    NotAnObject {
        type_path: String,
        found: String,
    },

    #[error("`{type_path}` serializes a field named \"Type\", which is reserved for the discriminator.")]
    ReservedField { type_path: &'static str },

    #[error("Type path `{type_path}` is already registered for another type.")]
    DuplicateTypePath { type_path: &'static str },

    #[error("Failed to convert `{type_path}`: {message}")]
    Delegate {
        type_path: &'static str,
        message: String,
    },

    #[error("JSON error: {0}")]
    Json(String),
}

impl From<serde_json::Error> for ConvertError {
    #[inline]
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value.to_string())
    }
}

// -----------------------------------------------------------------------------
// Helpers

/// Short description of a JSON value for error messages.
pub(crate) fn describe(value: &serde_json::Value) -> String {
    use alloc::format;
    use serde_json::Value;

    match value {
        Value::Null => String::from("null"),
        Value::Bool(b) => format!("boolean `{b}`"),
        Value::Number(n) => format!("number `{n}`"),
        Value::String(s) => format!("string \"{s}\""),
        Value::Array(_) => String::from("an array"),
        Value::Object(_) => String::from("an object"),
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{ConvertError, describe};

    #[test]
    fn messages_name_token_and_type() {
        let err = ConvertError::UnknownLabel {
            label: "bogus".into(),
            enum_type: "demo::TestEnum",
        };
        let msg = err.to_string();
        assert!(msg.starts_with("Unable to convert"));
        assert!(msg.contains("bogus"));
        assert!(msg.contains("demo::TestEnum"));

        let err = ConvertError::MissingDiscriminator { capability: "dyn Animal" };
        assert!(err.to_string().contains("Missing type discriminator"));

        let err = ConvertError::UnknownType {
            type_path: "Unknown.Type".into(),
            capability: "dyn Animal",
        };
        assert!(err.to_string().contains("Unknown type"));
    }

    #[test]
    fn describe_json_tokens() {
        assert_eq!(describe(&serde_json::json!(null)), "null");
        assert_eq!(describe(&serde_json::json!(7)), "number `7`");
        assert_eq!(describe(&serde_json::json!("x")), "string \"x\"");
        assert_eq!(describe(&serde_json::json!({})), "an object");
    }
}
