//! Comment validation for approval threads.
//!
//! Used by the review service before anything is written, so a rejected
//! comment never leaves a partial approval update behind.

use crate::error::CoreError;

/// Maximum length for a comment's text content.
pub const MAX_COMMENT_LENGTH: usize = 10_000;

/// Validate and trim the text of a comment.
pub fn normalize_comment(content: &str) -> Result<String, CoreError> {
    let trimmed = content.trim();

    if trimmed.is_empty() {
        return Err(CoreError::Validation(
            "Comment content must not be empty".to_string(),
        ));
    }

    if trimmed.chars().count() > MAX_COMMENT_LENGTH {
        return Err(CoreError::Validation(format!(
            "Comment exceeds maximum length of {MAX_COMMENT_LENGTH} characters"
        )));
    }

    Ok(trimmed.to_string())
}

/// Like [`normalize_comment`], but a missing or blank comment is simply absent.
pub fn normalize_optional_comment(content: Option<&str>) -> Result<Option<String>, CoreError> {
    match content {
        Some(text) if !text.trim().is_empty() => normalize_comment(text).map(Some),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn comment_is_trimmed() {
        assert_eq!(normalize_comment("  looks good \n").unwrap(), "looks good");
    }

    #[test]
    fn blank_comment_rejected() {
        assert_matches!(normalize_comment("   "), Err(CoreError::Validation(_)));
    }

    #[test]
    fn overlong_comment_rejected() {
        let text = "x".repeat(MAX_COMMENT_LENGTH + 1);
        assert_matches!(normalize_comment(&text), Err(CoreError::Validation(_)));
    }

    #[test]
    fn comment_at_limit_accepted() {
        let text = "x".repeat(MAX_COMMENT_LENGTH);
        assert!(normalize_comment(&text).is_ok());
    }

    #[test]
    fn optional_blank_comment_is_absent() {
        assert_eq!(normalize_optional_comment(None).unwrap(), None);
        assert_eq!(normalize_optional_comment(Some(" ")).unwrap(), None);
        assert_eq!(
            normalize_optional_comment(Some(" ok ")).unwrap(),
            Some("ok".to_string())
        );
    }
}
