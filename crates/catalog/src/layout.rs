//! Fixed paths of the persisted marketplace tree, relative to the repository
//! root.

/// Directory holding one subdirectory per package.
pub const PACKAGES_ROOT: &str = "packages";

/// Per-package manifest file name.
pub const MANIFEST_FILE: &str = "package.json";

/// Subdirectory of a package holding one directory per skill.
pub const SKILLS_DIR: &str = "skills";

/// Per-skill declaration file name.
pub const DECLARATION_FILE: &str = "SKILL.md";

/// Path to a package's root directory.
#[must_use]
pub fn package_dir(package: &str) -> String {
    format!("{PACKAGES_ROOT}/{package}")
}

/// Path to a package's manifest file.
#[must_use]
pub fn manifest_path(package: &str) -> String {
    format!("{PACKAGES_ROOT}/{package}/{MANIFEST_FILE}")
}

/// Path to a package's skills directory.
#[must_use]
pub fn skills_dir(package: &str) -> String {
    format!("{PACKAGES_ROOT}/{package}/{SKILLS_DIR}")
}

/// Path to a skill's directory within a package.
#[must_use]
pub fn skill_dir(package: &str, dir_name: &str) -> String {
    format!("{PACKAGES_ROOT}/{package}/{SKILLS_DIR}/{dir_name}")
}

/// Path to a skill's declaration file.
#[must_use]
pub fn declaration_path(package: &str, dir_name: &str) -> String {
    format!("{PACKAGES_ROOT}/{package}/{SKILLS_DIR}/{dir_name}/{DECLARATION_FILE}")
}
