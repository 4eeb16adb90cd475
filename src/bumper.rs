//! Next-version computation for one module
//!
//! [next_version] is the pure transition; [bump_module] applies it to a
//! module's metadata file.

use semver::Version;

use crate::domain::version::{self, VersionBump};
use crate::domain::{NameVersion, PromotionDirective};
use crate::error::{ModuleBuilderError, Result};
use crate::events::BuildEvent;
use crate::report::Reporter;
use crate::workspace::ModuleWorkspace;

/// Compute the version a module moves to, or `None` when it stays put.
///
/// 1. Promotion of a pre-release bumps minor or major, dropping the
///    qualifier. Released versions are left alone.
/// 2. Content changes advance patch by one, or by two when the current
///    version is a pre-release, then attach the `dev` qualifier.
pub fn next_version(
    current: &Version,
    has_changes: bool,
    directive: PromotionDirective,
) -> Option<Version> {
    let has_prerelease = !current.pre.is_empty();
    let mut next = current.clone();
    let mut moved = false;

    if let Some(bump) = directive.bump() {
        if has_prerelease {
            next = version::bump(&next, bump);
            moved = true;
        }
    }

    if has_changes {
        if !next.pre.is_empty() {
            // The first patch step only clears the qualifier
            next = version::bump(&next, VersionBump::Patch);
            next = version::bump(&next, VersionBump::Patch);
        }
        next = version::bump(&next, VersionBump::Patch);
        next = version::with_development_tag(&next);
        moved = true;
    }

    moved.then_some(next)
}

/// Read a module's declaration, advance its version and persist the change.
///
/// Returns the declaration as it stands after the bump.
pub fn bump_module(
    module: &mut ModuleWorkspace,
    directive: PromotionDirective,
    reporter: &dyn Reporter,
) -> Result<NameVersion> {
    let mut declared = module.metadata.read_declaration()?;

    let current = version::parse(&declared.version).map_err(|e| {
        ModuleBuilderError::version(format!("module {}: {}", module.base_name, e))
    })?;

    match next_version(&current, module.has_changes, directive) {
        Some(next) => {
            let next = next.to_string();
            module.metadata.rewrite_version(&next)?;

            reporter.report(BuildEvent::VersionBumped {
                module: declared.name.clone(),
                from: declared.version.clone(),
                to: next.clone(),
                path: module.metadata.path().to_path_buf(),
            });
            declared.version = next;
        }
        None if directive.is_promotion() => {
            reporter.report(BuildEvent::AlreadyReleased {
                module: declared.name.clone(),
                version: declared.version.clone(),
            });
        }
        None => {}
    }

    Ok(declared)
}
