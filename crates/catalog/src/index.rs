//! Flattened skill index built by walking the remote package tree.

use {
    serde::{Deserialize, Serialize},
    skilldock_common::{Error, Result},
    skilldock_remote::RemoteStore,
    tracing::{debug, warn},
};

use crate::{
    frontmatter,
    layout,
    types::{DEFAULT_VERSION, PackageManifest, RegistryDoc, SkillRecord},
};

/// The full catalog, built (and cached) as one unit: rebuilding costs one
/// listing plus a manifest read per package and a declaration read per skill.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    pub skills: Vec<SkillRecord>,
}

impl Catalog {
    pub fn find(&self, name: &str) -> Option<&SkillRecord> {
        self.skills.iter().find(|s| s.name == name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.skills.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }
}

/// Read and parse the registry document. Absent ⇒ empty default.
pub async fn load_registry(store: &dyn RemoteStore, registry_path: &str) -> Result<RegistryDoc> {
    let content = match store.read_file(registry_path).await {
        Ok(content) => content,
        Err(e) if e.is_not_found() => {
            debug!(path = registry_path, "no registry document, using empty");
            return Ok(RegistryDoc::default());
        },
        Err(e) => return Err(e),
    };
    let text = content
        .as_text()
        .ok_or_else(|| Error::invalid(format!("registry at '{registry_path}' is binary")))?;
    serde_json::from_str(text)
        .map_err(|e| Error::invalid(format!("malformed registry document: {e}")))
}

/// Build the flattened skill catalog.
///
/// Package directories are scanned in lexicographic order so the
/// first-discovered-wins duplicate rule is deterministic regardless of the
/// remote store's listing order. A directory without a parseable manifest is
/// not a package; a skill directory without a parseable declaration is
/// skipped. Neither is fatal to the build.
pub async fn build_catalog(store: &dyn RemoteStore, registry_path: &str) -> Result<Catalog> {
    let registry = load_registry(store, registry_path).await?;

    let mut package_dirs = match store.list_directory(layout::PACKAGES_ROOT).await {
        Ok(entries) => entries,
        Err(e) if e.is_not_found() => return Ok(Catalog::default()),
        Err(e) => return Err(e),
    };
    package_dirs.retain(|e| e.is_dir());
    package_dirs.sort_by(|a, b| a.name.cmp(&b.name));

    let mut catalog = Catalog::default();
    for package_dir in &package_dirs {
        let package = &package_dir.name;
        let Some(manifest) = read_manifest(store, package).await? else {
            continue;
        };
        index_package_skills(store, &registry, package, &manifest, &mut catalog).await?;
    }

    debug!(skills = catalog.len(), "catalog build complete");
    Ok(catalog)
}

/// Read a package manifest; `None` when absent or unparseable (the directory
/// is then not a package).
async fn read_manifest(
    store: &dyn RemoteStore,
    package: &str,
) -> Result<Option<PackageManifest>> {
    let path = layout::manifest_path(package);
    let content = match store.read_file(&path).await {
        Ok(content) => content,
        Err(e) if e.is_not_found() => {
            debug!(package, "no manifest, skipping directory");
            return Ok(None);
        },
        Err(e) => return Err(e),
    };
    let Some(text) = content.as_text() else {
        debug!(package, "manifest is binary, skipping directory");
        return Ok(None);
    };
    match serde_json::from_str(text) {
        Ok(manifest) => Ok(Some(manifest)),
        Err(e) => {
            debug!(package, %e, "unparseable manifest, skipping directory");
            Ok(None)
        },
    }
}

async fn index_package_skills(
    store: &dyn RemoteStore,
    registry: &RegistryDoc,
    package: &str,
    manifest: &PackageManifest,
    catalog: &mut Catalog,
) -> Result<()> {
    let mut skill_dirs = match store.list_directory(&layout::skills_dir(package)).await {
        Ok(entries) => entries,
        Err(e) if e.is_not_found() => return Ok(()),
        Err(e) => return Err(e),
    };
    skill_dirs.retain(|e| e.is_dir());
    skill_dirs.sort_by(|a, b| a.name.cmp(&b.name));

    let entry = registry.find(package);
    let version = manifest
        .version
        .clone()
        .or_else(|| entry.and_then(|e| e.version.clone()))
        .unwrap_or_else(|| DEFAULT_VERSION.to_string());
    let author = manifest
        .author
        .clone()
        .or_else(|| entry.and_then(|e| e.author.clone()));

    for skill_dir in skill_dirs {
        let declaration_path = layout::declaration_path(package, &skill_dir.name);
        let content = match store.read_file(&declaration_path).await {
            Ok(content) => content,
            Err(e) if e.is_not_found() => {
                warn!(package, dir = %skill_dir.name, "skill directory has no declaration, skipping");
                continue;
            },
            Err(e) => return Err(e),
        };
        let declaration = match content.as_text().map(frontmatter::parse_declaration) {
            Some(Ok(declaration)) => declaration,
            Some(Err(e)) => {
                warn!(package, dir = %skill_dir.name, %e, "unparseable declaration, skipping skill");
                continue;
            },
            None => {
                warn!(package, dir = %skill_dir.name, "binary declaration, skipping skill");
                continue;
            },
        };

        let name = declaration
            .frontmatter
            .name
            .unwrap_or_else(|| skill_dir.name.clone());
        if let Some(existing) = catalog.find(&name) {
            warn!(
                skill = %name,
                kept = %existing.package,
                dropped = package,
                "duplicate skill display name, keeping first"
            );
            continue;
        }

        catalog.skills.push(SkillRecord {
            name,
            dir_name: skill_dir.name.clone(),
            package: package.to_string(),
            description: declaration.frontmatter.description.unwrap_or_default(),
            version: version.clone(),
            author: author.clone(),
            category: entry.and_then(|e| e.category.clone()),
            tags: entry.map(|e| e.tags.clone()).unwrap_or_default(),
            keywords: entry
                .map(|e| e.keywords.clone())
                .filter(|k| !k.is_empty())
                .unwrap_or_else(|| manifest.keywords.clone()),
            published: entry.is_some(),
        });
    }

    Ok(())
}

/// Structural count of skill directories in a package. Tolerates (and
/// counts) directories with malformed declarations, so deleting the last
/// valid skill of a package does not orphan broken siblings.
pub async fn count_skill_dirs(store: &dyn RemoteStore, package: &str) -> Result<usize> {
    match store.list_directory(&layout::skills_dir(package)).await {
        Ok(entries) => Ok(entries.iter().filter(|e| e.is_dir()).count()),
        Err(e) if e.is_not_found() => Ok(0),
        Err(e) => Err(e),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, skilldock_remote::MemoryStore};

    const REGISTRY: &str = ".marketplace/registry.json";

    fn seed_skill(store: &MemoryStore, package: &str, dir: &str, name: &str, description: &str) {
        store.seed(
            &layout::declaration_path(package, dir),
            &format!("---\nname: {name}\ndescription: {description}\n---\nInstructions.\n"),
        );
    }

    fn seed_manifest(store: &MemoryStore, package: &str, version: Option<&str>) {
        let manifest = match version {
            Some(v) => format!(r#"{{"name":"{package}","version":"{v}"}}"#),
            None => format!(r#"{{"name":"{package}"}}"#),
        };
        store.seed(&layout::manifest_path(package), &manifest);
    }

    #[tokio::test]
    async fn builds_flat_catalog() {
        let store = MemoryStore::new();
        seed_manifest(&store, "toolbox", Some("2.1.0"));
        seed_skill(&store, "toolbox", "csv", "csv-toolkit", "Wrangle CSVs");
        seed_skill(&store, "toolbox", "soil", "soil-analyzer", "Analyze soil");

        let catalog = build_catalog(&store, REGISTRY).await.unwrap();
        assert_eq!(catalog.len(), 2);
        let skill = catalog.find("csv-toolkit").unwrap();
        assert_eq!(skill.package, "toolbox");
        assert_eq!(skill.dir_name, "csv");
        assert_eq!(skill.version, "2.1.0");
        assert!(!skill.published);
    }

    #[tokio::test]
    async fn directory_without_manifest_is_not_a_package() {
        let store = MemoryStore::new();
        store.seed("packages/junk/README.md", "not a package");
        seed_manifest(&store, "real", None);
        seed_skill(&store, "real", "s", "s", "d");

        let catalog = build_catalog(&store, REGISTRY).await.unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.skills[0].package, "real");
    }

    #[tokio::test]
    async fn unparseable_declaration_skips_skill_only() {
        let store = MemoryStore::new();
        seed_manifest(&store, "pkg", None);
        seed_skill(&store, "pkg", "good", "good", "fine");
        store.seed(
            &layout::declaration_path("pkg", "bad"),
            "no frontmatter here",
        );

        let catalog = build_catalog(&store, REGISTRY).await.unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.skills[0].name, "good");
    }

    #[tokio::test]
    async fn duplicate_display_name_first_package_wins() {
        let store = MemoryStore::new();
        seed_manifest(&store, "alpha", None);
        seed_manifest(&store, "beta", None);
        seed_skill(&store, "alpha", "x", "x", "from alpha");
        seed_skill(&store, "beta", "x", "x", "from beta");

        let catalog = build_catalog(&store, REGISTRY).await.unwrap();
        let matches: Vec<_> = catalog.skills.iter().filter(|s| s.name == "x").collect();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].package, "alpha");
    }

    #[tokio::test]
    async fn display_name_falls_back_to_dir_name() {
        let store = MemoryStore::new();
        seed_manifest(&store, "pkg", None);
        store.seed(
            &layout::declaration_path("pkg", "dir-named"),
            "---\ndescription: no name field\n---\nbody\n",
        );

        let catalog = build_catalog(&store, REGISTRY).await.unwrap();
        assert_eq!(catalog.skills[0].name, "dir-named");
    }

    #[tokio::test]
    async fn registry_entry_marks_published_and_fills_metadata() {
        let store = MemoryStore::new();
        store.seed(
            REGISTRY,
            r#"{"name":"mkt","packages":[{"name":"pkg","source":"packages/pkg","version":"3.0.0","category":"data","tags":["etl"]}]}"#,
        );
        seed_manifest(&store, "pkg", None);
        seed_skill(&store, "pkg", "s", "s", "d");

        let catalog = build_catalog(&store, REGISTRY).await.unwrap();
        let skill = catalog.find("s").unwrap();
        assert!(skill.published);
        // Manifest has no version, registry supplies it.
        assert_eq!(skill.version, "3.0.0");
        assert_eq!(skill.category.as_deref(), Some("data"));
        assert_eq!(skill.tags, vec!["etl"]);
    }

    #[tokio::test]
    async fn empty_tree_is_empty_catalog() {
        let store = MemoryStore::new();
        let catalog = build_catalog(&store, REGISTRY).await.unwrap();
        assert!(catalog.is_empty());
    }

    #[tokio::test]
    async fn count_skill_dirs_is_structural() {
        let store = MemoryStore::new();
        seed_manifest(&store, "pkg", None);
        seed_skill(&store, "pkg", "good", "good", "fine");
        store.seed(&layout::declaration_path("pkg", "broken"), "garbage");
        store.seed("packages/pkg/skills/empty-ish/notes.txt", "x");

        assert_eq!(count_skill_dirs(&store, "pkg").await.unwrap(), 3);
        assert_eq!(count_skill_dirs(&store, "ghost").await.unwrap(), 0);
    }
}
