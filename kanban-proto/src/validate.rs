//! Input validation shared by the server and the client.

use thiserror::Error;

/// Maximum allowed title length in characters.
pub const MAX_TITLE_LENGTH: usize = 256;

/// Errors produced when a payload fails validation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Title is empty or whitespace only.
    #[error("title cannot be empty")]
    TitleEmpty,
    /// Title exceeds [`MAX_TITLE_LENGTH`].
    #[error("title too long (max {MAX_TITLE_LENGTH} characters)")]
    TitleTooLong,
    /// Color is not a `#RRGGBB` hex string.
    #[error("invalid color {0:?}: expected #RRGGBB")]
    InvalidColor(String),
    /// Target index of a move request is negative.
    #[error("target index must be non-negative, got {0}")]
    NegativeIndex(i64),
    /// An identifier could not be parsed.
    #[error("malformed id: {0}")]
    MalformedId(String),
    /// The destination column belongs to a different board than the task.
    #[error("cannot move a task to a column on another board")]
    CrossBoardMove,
}

/// Checks that a title is non-blank and within the length limit.
///
/// # Errors
///
/// Returns [`ValidationError::TitleEmpty`] or [`ValidationError::TitleTooLong`].
pub fn title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::TitleEmpty);
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(ValidationError::TitleTooLong);
    }
    Ok(())
}

/// Checks that a color is `#` followed by exactly six hex digits.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidColor`] otherwise.
pub fn hex_color(color: &str) -> Result<(), ValidationError> {
    let valid = color
        .strip_prefix('#')
        .is_some_and(|hex| hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()));
    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidColor(color.to_string()))
    }
}

/// Maps blank descriptions to `None`.
#[must_use]
pub fn normalize_description(description: Option<String>) -> Option<String> {
    description.filter(|d| !d.trim().is_empty())
}
