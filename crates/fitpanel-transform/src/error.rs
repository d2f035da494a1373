use thiserror::Error;

/// No configured pattern accepted the value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized date/time value: {value:?}")]
pub struct DateTimeParseError {
    pub value: String,
}
