//! Promotion directive for a single invocation

use crate::domain::version::VersionBump;
use crate::error::{ModuleBuilderError, Result};
use std::fmt;
use std::str::FromStr;

/// How pre-release modules are treated in this run.
///
/// `None` is an ordinary development iteration. `Minor` and `Major` cut a
/// release by bumping that component of every module carrying a pre-release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromotionDirective {
    #[default]
    None,
    Minor,
    Major,
}

impl PromotionDirective {
    /// True for `Minor` and `Major`
    pub fn is_promotion(&self) -> bool {
        !matches!(self, PromotionDirective::None)
    }

    /// Version component a promotion increments, if any
    pub fn bump(&self) -> Option<VersionBump> {
        match self {
            PromotionDirective::None => None,
            PromotionDirective::Minor => Some(VersionBump::Minor),
            PromotionDirective::Major => Some(VersionBump::Major),
        }
    }
}

impl FromStr for PromotionDirective {
    type Err = ModuleBuilderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "none" => Ok(PromotionDirective::None),
            "minor" => Ok(PromotionDirective::Minor),
            "major" => Ok(PromotionDirective::Major),
            other => Err(ModuleBuilderError::config(format!(
                "Promotion must be one of [<empty>, none, minor, major], given '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for PromotionDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromotionDirective::None => write!(f, "none"),
            PromotionDirective::Minor => write!(f, "minor"),
            PromotionDirective::Major => write!(f, "major"),
        }
    }
}
