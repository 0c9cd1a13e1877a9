//! Typed argument and reply shapes for the marketplace operations.

use {
    base64::{Engine, engine::general_purpose::STANDARD},
    serde::{Deserialize, Serialize},
    skilldock_catalog::{Author, SkillRecord},
    skilldock_common::Failure,
    skilldock_remote::{FileContent, TreeFile},
};

/// One catalog entry as seen by a specific user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillSummary {
    pub name: String,
    pub package: String,
    pub description: String,
    pub version: String,
    #[serde(default)]
    pub author: Option<Author>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub published: bool,
    /// Whether the requesting user may write this skill.
    pub editable: bool,
}

impl SkillSummary {
    #[must_use]
    pub fn from_record(record: &SkillRecord, editable: bool) -> Self {
        Self {
            name: record.name.clone(),
            package: record.package.clone(),
            description: record.description.clone(),
            version: record.version.clone(),
            author: record.author.clone(),
            category: record.category.clone(),
            tags: record.tags.clone(),
            published: record.published,
            editable,
        }
    }
}

/// Full detail view, including the declaration body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillDetails {
    #[serde(flatten)]
    pub summary: SkillSummary,
    pub dir_name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub license: Option<String>,
    /// Markdown body of the declaration file, frontmatter stripped.
    pub body: String,
}

/// How a file's `content` string is encoded on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileEncoding {
    Utf8,
    Base64,
}

/// One file of a skill tree, wire-safe for JSON replies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillFile {
    /// Path relative to the skill directory.
    pub path: String,
    pub encoding: FileEncoding,
    pub content: String,
}

impl From<TreeFile> for SkillFile {
    fn from(file: TreeFile) -> Self {
        let (encoding, content) = match file.content {
            FileContent::Text(text) => (FileEncoding::Utf8, text),
            FileContent::Binary(bytes) => (FileEncoding::Base64, STANDARD.encode(bytes)),
        };
        Self {
            path: file.path,
            encoding,
            content,
        }
    }
}

/// One edit in a save batch. Empty content means "delete this file".
/// Content for binary-extension paths must be base64.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEdit {
    pub path: String,
    pub content: String,
}

/// Save a batch of files into one skill, creating the skill (and its
/// package) when it does not exist yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveRequest {
    pub skill: String,
    /// Package to place a brand-new skill in; defaults to a package named
    /// after the skill. Existing skills stay in their package.
    #[serde(default)]
    pub group: Option<String>,
    pub files: Vec<FileEdit>,
}

/// Per-file failure inside a partially applied batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileFailure {
    pub path: String,
    pub failure: Failure,
}

/// Outcome of a save. Partial failure is reported, never rolled back.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaveReport {
    pub skill: String,
    pub package: String,
    /// True when this save created the skill.
    pub created: bool,
    pub written: Vec<String>,
    pub deleted: Vec<String>,
    /// Files whose remote content already matched; no write was issued.
    pub unchanged: Vec<String>,
    pub failed: Vec<FileFailure>,
}

impl SaveReport {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Outcome of a skill delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteReport {
    pub skill: String,
    pub package: String,
    /// True when this was the package's last skill and the whole package
    /// directory was removed.
    pub package_removed: bool,
    pub registry_entry_removed: bool,
    pub deleted: Vec<String>,
    /// `(path, reason)` for leaves that could not be deleted.
    pub failed: Vec<(String, String)>,
}

/// Publish a skill's package to the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishRequest {
    pub skill: String,
    pub description: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Outcome of a version bump. Manifest and registry are updated
/// independently; either flag can be false when that document had no
/// version to update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BumpReport {
    pub skill: String,
    pub package: String,
    pub previous: String,
    pub version: String,
    pub manifest_updated: bool,
    pub registry_updated: bool,
}

/// One locally installed skill, for update checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstalledSkill {
    pub name: String,
    pub version: String,
}

/// Update-check verdict for one installed skill.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCheck {
    pub name: String,
    pub installed: String,
    /// Marketplace version, when the skill is still listed and readable.
    #[serde(default)]
    pub available: Option<String>,
    pub update_available: bool,
}

/// Identity echo with the resolved editor flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Whoami {
    pub user_id: String,
    pub provider: String,
    pub email: String,
    pub name: String,
    pub editor: bool,
}

/// A freshly issued redemption token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenGrant {
    pub token: String,
    pub expires_in_secs: u64,
    /// Ready-to-run shell one-liner for install tokens.
    #[serde(default)]
    pub command: Option<String>,
}

/// Bulk content payload returned by install/edit token redemption.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillBundle {
    pub skill: String,
    pub package: String,
    pub version: String,
    pub files: Vec<SkillFile>,
}

/// Payload bound into install and edit tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillTokenPayload {
    pub user_id: String,
    pub skill: String,
    pub package: String,
    pub dir: String,
    pub version: String,
}
