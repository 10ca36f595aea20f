//! Property-based tests for the name format validator.

use crate::workspace::validation::{validate_format, ValidationError};
use proptest::prelude::*;

proptest! {
    #[test]
    fn test_any_text_with_both_markers_is_accepted(
        before in ".*",
        middle in ".*",
        after in ".*",
        close_first in any::<bool>(),
    ) {
        let format = if close_first {
            format!("{}}}{}${{{}", before, middle, after)
        } else {
            format!("{}${{{}}}{}", before, middle, after)
        };
        prop_assert!(validate_format(&format).is_ok());
    }

    #[test]
    fn test_text_without_open_marker_is_rejected(format in "[^$]+") {
        prop_assert_eq!(validate_format(&format), Err(ValidationError::MalformedFormat));
    }

    #[test]
    fn test_text_without_close_marker_is_rejected(format in "[^}]+") {
        prop_assert_eq!(validate_format(&format), Err(ValidationError::MalformedFormat));
    }
}

#[test]
fn test_empty_format_is_missing() {
    assert_eq!(validate_format(""), Err(ValidationError::MissingFormat));
}
