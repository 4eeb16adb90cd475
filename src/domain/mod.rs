//! Domain logic - pure data and version rules independent of files and git

pub mod index;
pub mod module;
pub mod promotion;
pub mod version;

pub use index::{IndexChannel, IndexDocument, IndexTarget};
pub use module::{ModuleRecord, NameVersion};
pub use promotion::PromotionDirective;
pub use version::{VersionBump, DEVELOPMENT_TAG};
