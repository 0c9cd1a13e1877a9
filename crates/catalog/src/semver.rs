//! Semantic versions for update checks and version bumps.
//!
//! `major.minor.patch[-prerelease]`; missing components are zero, so
//! `"1.2"` equals `"1.2.0"`. A prerelease sorts strictly below the same
//! triple without one; two prereleases compare as plain strings.

use std::{cmp::Ordering, fmt, str::FromStr};

use {
    serde::{Deserialize, Serialize},
    skilldock_common::Error,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub prerelease: Option<String>,
}

/// Which field a version bump increments. Everything below it zeroes out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionBump {
    Major,
    Minor,
    Patch,
}

impl Version {
    #[must_use]
    pub fn bumped(&self, bump: VersionBump) -> Self {
        match bump {
            VersionBump::Major => Self {
                major: self.major + 1,
                minor: 0,
                patch: 0,
                prerelease: None,
            },
            VersionBump::Minor => Self {
                major: self.major,
                minor: self.minor + 1,
                patch: 0,
                prerelease: None,
            },
            VersionBump::Patch => Self {
                major: self.major,
                minor: self.minor,
                patch: self.patch + 1,
                prerelease: None,
            },
        }
    }
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::invalid("empty version string"));
        }

        let (triple, prerelease) = match s.split_once('-') {
            Some((triple, pre)) if !pre.is_empty() => (triple, Some(pre.to_string())),
            Some(_) => return Err(Error::invalid(format!("dangling prerelease in '{s}'"))),
            None => (s, None),
        };

        let mut parts = triple.split('.');
        let mut component = |name: &str| -> Result<u64, Error> {
            match parts.next() {
                None => Ok(0),
                Some(raw) => raw
                    .parse()
                    .map_err(|_| Error::invalid(format!("bad {name} component in version '{s}'"))),
            }
        };

        let major = component("major")?;
        let minor = component("minor")?;
        let patch = component("patch")?;
        if parts.next().is_some() {
            return Err(Error::invalid(format!(
                "too many components in version '{s}'"
            )));
        }

        Ok(Self {
            major,
            minor,
            patch,
            prerelease,
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.prerelease {
            write!(f, "-{pre}")?;
        }
        Ok(())
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| match (&self.prerelease, &other.prerelease) {
                (None, None) => Ordering::Equal,
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (Some(a), Some(b)) => a.cmp(b),
            })
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// "Update available" ⇔ `available` compares strictly greater than
/// `installed`. Unparseable versions mean no update signal.
#[must_use]
pub fn update_available(installed: &str, available: &str) -> bool {
    match (Version::from_str(installed), Version::from_str(available)) {
        (Ok(installed), Ok(available)) => available > installed,
        _ => false,
    }
}
