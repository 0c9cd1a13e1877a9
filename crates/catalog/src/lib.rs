//! Marketplace catalog: package manifests, the published-package registry,
//! SKILL.md declaration parsing, semantic versions, and the flattened skill
//! index built from the remote tree.

pub mod frontmatter;
pub mod index;
pub mod layout;
pub mod semver;
pub mod types;

pub use {
    index::{Catalog, build_catalog, count_skill_dirs},
    semver::{Version, VersionBump},
    types::{Author, PackageManifest, RegistryDoc, RegistryEntry, SkillRecord},
};
