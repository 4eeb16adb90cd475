use crate::error::{ModuleBuilderError, Result};
use semver::{BuildMetadata, Prerelease, Version};
use std::cmp::Ordering;

/// Pre-release qualifier attached to every development build.
pub const DEVELOPMENT_TAG: &str = "dev";

/// Version component to increment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionBump {
    Major,
    Minor,
    Patch,
}

/// Parse a declared module version (e.g. "1.2.3" or "1.2.3-dev")
pub fn parse(version: &str) -> Result<Version> {
    Version::parse(version.trim()).map_err(|e| {
        ModuleBuilderError::version(format!("Invalid semantic version '{}': {}", version, e))
    })
}

/// Increment one component of a version.
///
/// Build metadata is always dropped. A patch increment on a pre-release only
/// clears the qualifier, since `1.2.3-dev` already precedes `1.2.3`; minor and
/// major increments always advance and clear the qualifier.
pub fn bump(version: &Version, bump_type: VersionBump) -> Version {
    let mut next = version.clone();
    next.build = BuildMetadata::EMPTY;

    match bump_type {
        VersionBump::Major => {
            next.major += 1;
            next.minor = 0;
            next.patch = 0;
            next.pre = Prerelease::EMPTY;
        }
        VersionBump::Minor => {
            next.minor += 1;
            next.patch = 0;
            next.pre = Prerelease::EMPTY;
        }
        VersionBump::Patch => {
            if next.pre.is_empty() {
                next.patch += 1;
            } else {
                next.pre = Prerelease::EMPTY;
            }
        }
    }

    next
}

/// Attach the development qualifier, replacing any existing one
pub fn with_development_tag(version: &Version) -> Version {
    let mut next = version.clone();
    // "dev" is a valid identifier, parsing cannot fail
    next.pre = Prerelease::new(DEVELOPMENT_TAG).unwrap_or(Prerelease::EMPTY);
    next
}

/// True when the version carries exactly the development qualifier
pub fn is_development(version: &Version) -> bool {
    version.pre.as_str() == DEVELOPMENT_TAG
}

/// Order two versions by semver precedence, ignoring build metadata
pub fn cmp_precedence(a: &Version, b: &Version) -> Ordering {
    (a.major, a.minor, a.patch, &a.pre).cmp(&(b.major, b.minor, b.patch, &b.pre))
}
