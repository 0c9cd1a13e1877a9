use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A user reference in the policy document. `id` is the stable
/// `provider:uid` key; `label` is informational only (typically an email)
/// and never consulted for decisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: String,
    #[serde(default)]
    pub label: String,
}

impl UserRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: String::new(),
        }
    }
}

/// Keyword rules: `"*"` (everyone) or `"editors"` (the global editor set).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleKeyword {
    #[serde(rename = "*")]
    Everyone,
    #[serde(rename = "editors")]
    Editors,
}

/// One access rule: a keyword or an explicit identity list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AccessRule {
    Keyword(RuleKeyword),
    Users(Vec<UserRef>),
}

impl AccessRule {
    #[must_use]
    pub fn everyone() -> Self {
        Self::Keyword(RuleKeyword::Everyone)
    }

    #[must_use]
    pub fn editors() -> Self {
        Self::Keyword(RuleKeyword::Editors)
    }
}

/// Per-skill overrides. A missing field falls through to the defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkillAccess {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read: Option<AccessRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write: Option<AccessRule>,
}

/// Rules applied when no per-skill override exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultRules {
    pub read: AccessRule,
    pub write: AccessRule,
}

/// The access policy document. [`AccessPolicy::default`] is also the policy
/// in force when the document is absent: everyone reads, only editors write,
/// and the editor set is empty, so nobody writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessPolicy {
    #[serde(default = "default_policy_version")]
    pub version: String,
    #[serde(default)]
    pub editors: Vec<UserRef>,
    #[serde(default)]
    pub skills: HashMap<String, SkillAccess>,
    #[serde(default = "default_rules")]
    pub defaults: DefaultRules,
}

fn default_policy_version() -> String {
    "1.0".into()
}

fn default_rules() -> DefaultRules {
    DefaultRules {
        read: AccessRule::everyone(),
        write: AccessRule::editors(),
    }
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self {
            version: default_policy_version(),
            editors: Vec::new(),
            skills: HashMap::new(),
            defaults: default_rules(),
        }
    }
}

/// Evaluates read/write questions for one user against one policy snapshot.
pub struct AccessEvaluator<'a> {
    policy: &'a AccessPolicy,
    user_id: String,
}

impl<'a> AccessEvaluator<'a> {
    #[must_use]
    pub fn new(policy: &'a AccessPolicy, user_id: impl Into<String>) -> Self {
        Self {
            policy,
            user_id: user_id.into(),
        }
    }

    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Is this user in the global editor set?
    #[must_use]
    pub fn is_editor(&self) -> bool {
        self.policy.editors.iter().any(|e| e.id == self.user_id)
    }

    /// Can this user read the named skill? Per-skill override takes
    /// precedence over the default read rule.
    #[must_use]
    pub fn can_read(&self, skill: &str) -> bool {
        let rule = self
            .policy
            .skills
            .get(skill)
            .and_then(|s| s.read.as_ref())
            .unwrap_or(&self.policy.defaults.read);
        self.eval(rule)
    }

    /// Can this user write the named skill? Per-skill override takes
    /// precedence over the default write rule.
    #[must_use]
    pub fn can_write(&self, skill: &str) -> bool {
        let rule = self
            .policy
            .skills
            .get(skill)
            .and_then(|s| s.write.as_ref())
            .unwrap_or(&self.policy.defaults.write);
        self.eval(rule)
    }

    fn eval(&self, rule: &AccessRule) -> bool {
        match rule {
            AccessRule::Keyword(RuleKeyword::Everyone) => true,
            AccessRule::Keyword(RuleKeyword::Editors) => self.is_editor(),
            AccessRule::Users(users) => users.iter().any(|u| u.id == self.user_id),
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn policy_from(json: &str) -> AccessPolicy {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn absent_document_defaults() {
        let policy = AccessPolicy::default();
        let eval = AccessEvaluator::new(&policy, "google:123");
        assert!(eval.can_read("anything"));
        assert!(!eval.can_write("anything"));
        assert!(!eval.is_editor());
    }

    #[test]
    fn editors_can_write_by_default() {
        let policy = policy_from(
            r#"{"editors":[{"id":"google:123","label":"a@b.com"}]}"#,
        );
        let eval = AccessEvaluator::new(&policy, "google:123");
        assert!(eval.is_editor());
        assert!(eval.can_write("any-skill"));

        let outsider = AccessEvaluator::new(&policy, "github:999");
        assert!(!outsider.can_write("any-skill"));
    }

    #[test]
    fn per_skill_read_list_overrides_default() {
        let policy = policy_from(
            r#"{
                "skills": {"secret": {"read": [{"id": "google:123"}]}},
                "defaults": {"read": "*", "write": "editors"}
            }"#,
        );
        let insider = AccessEvaluator::new(&policy, "google:123");
        let outsider = AccessEvaluator::new(&policy, "github:999");
        assert!(insider.can_read("secret"));
        assert!(!outsider.can_read("secret"));
        // No override on other skills: default read is everyone.
        assert!(outsider.can_read("public"));
    }

    #[test]
    fn per_skill_editors_override_beats_restrictive_default_list() {
        let policy = policy_from(
            r#"{
                "editors": [{"id": "google:123"}],
                "skills": {"locked": {"write": "editors"}},
                "defaults": {"read": "*", "write": [{"id": "github:999"}]}
            }"#,
        );
        // Default write list excludes the editor, but the per-skill
        // "editors" override wins for this skill.
        let editor = AccessEvaluator::new(&policy, "google:123");
        assert!(editor.can_write("locked"));
        assert!(!editor.can_write("other"));

        let listed = AccessEvaluator::new(&policy, "github:999");
        assert!(!listed.can_write("locked"));
        assert!(listed.can_write("other"));
    }

    #[test]
    fn wildcard_read_override() {
        let policy = policy_from(
            r#"{
                "skills": {"open": {"read": "*"}},
                "defaults": {"read": [{"id": "google:123"}], "write": "editors"}
            }"#,
        );
        let anyone = AccessEvaluator::new(&policy, "github:unknown");
        assert!(anyone.can_read("open"));
        assert!(!anyone.can_read("other"));
    }

    #[test]
    fn email_never_grants_access() {
        let policy = policy_from(
            r#"{"editors":[{"id":"google:123","label":"shared@corp.com"}]}"#,
        );
        // Same label, different stable id: not an editor.
        let imposter = AccessEvaluator::new(&policy, "github:456");
        assert!(!imposter.is_editor());
    }

    #[test]
    fn policy_roundtrips_keywords_and_lists() {
        let policy = policy_from(
            r#"{
                "version": "1.0",
                "editors": [],
                "skills": {"s": {"read": "*", "write": [{"id": "x:1"}]}},
                "defaults": {"read": "*", "write": "editors"}
            }"#,
        );
        let json = serde_json::to_value(&policy).unwrap();
        assert_eq!(json["defaults"]["write"], "editors");
        assert_eq!(json["skills"]["s"]["read"], "*");
        assert_eq!(json["skills"]["s"]["write"][0]["id"], "x:1");
    }
}
