//! Resource-level access control.
//!
//! One policy document per repository declares global editors, per-skill
//! read/write overrides, and defaults. Evaluation is a pure function over
//! `(policy, user id, skill name)`; decisions are never cached, so a policy
//! edit takes effect within one policy-cache TTL window.

pub mod policy;

pub use policy::{AccessEvaluator, AccessPolicy, AccessRule, RuleKeyword, SkillAccess, UserRef};
