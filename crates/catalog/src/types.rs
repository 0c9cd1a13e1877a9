use serde::{Deserialize, Serialize};

/// Fallback version when neither manifest nor registry supply one.
pub const DEFAULT_VERSION: &str = "1.0.0";

/// Package author, shared by manifests and registry entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Per-package manifest (`packages/{pkg}/package.json`), the authoritative
/// source for version, description, author, and license. Loose fields are
/// default-filled on parse rather than carried as raw maps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageManifest {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub author: Option<Author>,
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Discoverability metadata for one published package.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub name: String,
    /// Path of the package root relative to the repository root.
    pub source: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub author: Option<Author>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// The registry document: catalog of all published packages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryDoc {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub owner: Option<Author>,
    #[serde(default)]
    pub packages: Vec<RegistryEntry>,
}

impl Default for RegistryDoc {
    fn default() -> Self {
        Self {
            name: "marketplace".into(),
            owner: None,
            packages: Vec::new(),
        }
    }
}

impl RegistryDoc {
    pub fn find(&self, package: &str) -> Option<&RegistryEntry> {
        self.packages.iter().find(|e| e.name == package)
    }

    pub fn find_mut(&mut self, package: &str) -> Option<&mut RegistryEntry> {
        self.packages.iter_mut().find(|e| e.name == package)
    }

    pub fn remove(&mut self, package: &str) -> bool {
        let before = self.packages.len();
        self.packages.retain(|e| e.name != package);
        self.packages.len() != before
    }
}

/// One installable skill in the flattened catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillRecord {
    /// Unique display name across the whole catalog.
    pub name: String,
    /// Directory name under the package's `skills/` (may differ from `name`).
    pub dir_name: String,
    /// Owning package.
    pub package: String,
    #[serde(default)]
    pub description: String,
    /// Inherited: manifest version, else registry version, else default.
    pub version: String,
    #[serde(default)]
    pub author: Option<Author>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    /// True when the owning package has a registry entry.
    pub published: bool,
}
