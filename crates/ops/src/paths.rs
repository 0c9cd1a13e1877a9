//! File-path validation for save batches.
//!
//! Paths arrive from the client relative to a skill directory and are joined
//! onto repository paths verbatim, so traversal must be rejected up front.
//! Validation is all-or-nothing: one bad path fails the whole batch before
//! anything is written.

use skilldock_common::{Error, Result};

/// Validate one client-supplied relative path.
pub fn validate_relative_path(path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(Error::invalid("empty file path"));
    }
    if path.starts_with('/') || path.contains('\\') || path.contains(':') {
        return Err(Error::invalid(format!("'{path}' must be a relative path")));
    }
    for component in path.split('/') {
        match component {
            "" => return Err(Error::invalid(format!("'{path}' has an empty component"))),
            "." | ".." => {
                return Err(Error::invalid(format!("'{path}' contains path traversal")));
            },
            _ => {},
        }
    }
    Ok(())
}

/// Validate every path in a batch before any write happens.
pub fn validate_batch<'a>(paths: impl IntoIterator<Item = &'a str>) -> Result<()> {
    for path in paths {
        validate_relative_path(path)?;
    }
    Ok(())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_relative_paths() {
        assert!(validate_relative_path("SKILL.md").is_ok());
        assert!(validate_relative_path("scripts/run.py").is_ok());
        assert!(validate_relative_path("assets/logo.png").is_ok());
    }

    #[test]
    fn rejects_traversal_and_absolutes() {
        assert!(validate_relative_path("../../etc/passwd").is_err());
        assert!(validate_relative_path("a/../b").is_err());
        assert!(validate_relative_path("/etc/passwd").is_err());
        assert!(validate_relative_path("").is_err());
        assert!(validate_relative_path("a//b").is_err());
        assert!(validate_relative_path("c:\\windows").is_err());
        assert!(validate_relative_path("./sneaky").is_err());
    }

    #[test]
    fn batch_fails_on_first_bad_path() {
        assert!(validate_batch(["good.md", "also/fine.txt"]).is_ok());
        assert!(validate_batch(["good.md", "../bad"]).is_err());
    }
}
