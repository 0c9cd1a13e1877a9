//! SKILL.md declaration parsing.
//!
//! A declaration starts with a YAML frontmatter block delimited by `---`
//! lines; `name` and `description` come from there (multi-line `>`-folded
//! values are handled by the YAML parser). The markdown body after the block
//! is the skill's instructions.

use {
    serde::Deserialize,
    skilldock_common::{Error, Result},
};

/// Frontmatter fields of a skill declaration. Both are optional at parse
/// time; the index falls back to the directory name when `name` is absent,
/// and save-time validation requires both for new skills.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SkillFrontmatter {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Parsed declaration: frontmatter plus markdown body.
#[derive(Debug, Clone)]
pub struct Declaration {
    pub frontmatter: SkillFrontmatter,
    pub body: String,
}

/// Parse a full SKILL.md document.
pub fn parse_declaration(content: &str) -> Result<Declaration> {
    let (frontmatter, body) = split_frontmatter(content)?;
    let frontmatter: SkillFrontmatter = serde_yaml::from_str(&frontmatter)
        .map_err(|e| Error::invalid(format!("invalid SKILL.md frontmatter: {e}")))?;
    Ok(Declaration { frontmatter, body })
}

/// Validate a skill or package name: lowercase ASCII, digits, hyphens,
/// 1-64 chars, no leading/trailing/double hyphen.
#[must_use]
pub fn validate_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 64
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !name.starts_with('-')
        && !name.ends_with('-')
        && !name.contains("--")
}

/// Split content at `---` delimiters into (frontmatter, body).
fn split_frontmatter(content: &str) -> Result<(String, String)> {
    let trimmed = content.trim_start();
    if !trimmed.starts_with("---") {
        return Err(Error::invalid(
            "SKILL.md must start with YAML frontmatter delimited by ---",
        ));
    }

    let after_open = &trimmed[3..];
    let close_pos = after_open
        .find("\n---")
        .ok_or_else(|| Error::invalid("SKILL.md missing closing --- for frontmatter"))?;

    let frontmatter = after_open[..close_pos].trim().to_string();
    let body = after_open[close_pos + 4..].trim().to_string();
    Ok((frontmatter, body))
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_name_and_description() {
        let decl = parse_declaration(
            "---\nname: soil-analyzer\ndescription: Analyzes soil samples\n---\n\n# Usage\nDo things.\n",
        )
        .unwrap();
        assert_eq!(decl.frontmatter.name.as_deref(), Some("soil-analyzer"));
        assert_eq!(
            decl.frontmatter.description.as_deref(),
            Some("Analyzes soil samples")
        );
        assert!(decl.body.contains("# Usage"));
    }

    #[test]
    fn folded_multiline_description() {
        let decl = parse_declaration(
            "---\nname: demo\ndescription: >\n  A long description\n  folded over lines.\n---\nbody\n",
        )
        .unwrap();
        let description = decl.frontmatter.description.unwrap();
        assert!(description.contains("A long description"));
        assert!(description.contains("folded over lines."));
    }

    #[test]
    fn missing_frontmatter_is_invalid() {
        let err = parse_declaration("# Just markdown\n").unwrap_err();
        assert!(matches!(err, Error::Invalid(_)));
    }

    #[test]
    fn unclosed_frontmatter_is_invalid() {
        assert!(parse_declaration("---\nname: x\nno closing\n").is_err());
    }

    #[test]
    fn malformed_yaml_inside_delimiters_is_invalid() {
        let err = parse_declaration("---\nname: [unclosed\n---\nbody\n").unwrap_err();
        assert!(matches!(err, Error::Invalid(_)));
        assert_eq!(err.kind(), skilldock_common::ErrorKind::Invalid);
    }

    #[test]
    fn missing_fields_parse_as_none() {
        let decl = parse_declaration("---\nname: only-name\n---\nbody\n").unwrap();
        assert!(decl.frontmatter.description.is_none());
    }

    #[test]
    fn name_validation() {
        assert!(validate_name("my-skill"));
        assert!(validate_name("skill123"));
        assert!(!validate_name(""));
        assert!(!validate_name("-bad"));
        assert!(!validate_name("bad-"));
        assert!(!validate_name("Bad"));
        assert!(!validate_name("has space"));
        assert!(!validate_name("has--double"));
        assert!(!validate_name(&"a".repeat(65)));
    }
}
