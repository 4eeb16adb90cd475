use std::cmp::Ordering;
use std::path::Path;

use crate::domain::version::{self, cmp_precedence};
use crate::domain::ModuleRecord;
use crate::error::Result;
use crate::events::BuildEvent;
use crate::index::IndexFile;
use crate::report::Reporter;

/// Sort an index by module name, then version.
///
/// Missing or empty indexes are left alone. The file is only rewritten when
/// the order changes. Returns whether it was rewritten.
pub fn sort_index(path: &Path, reporter: &dyn Reporter) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }

    let mut file = IndexFile::open(path)?;
    let Some(mut document) = file.load()? else {
        return Ok(false);
    };

    let before = document.spec.modules.clone();
    document.spec.modules.sort_by(cmp_records);

    if document.spec.modules == before {
        return Ok(false);
    }

    file.store(&document)?;
    reporter.report(BuildEvent::IndexSorted {
        path: path.to_path_buf(),
        modules: document.modules().len(),
    });
    Ok(true)
}

/// Name first, then semver precedence; unparsable versions compare as text
pub fn cmp_records(a: &ModuleRecord, b: &ModuleRecord) -> Ordering {
    a.name.cmp(&b.name).then_with(|| {
        match (version::parse(&a.version), version::parse(&b.version)) {
            (Ok(va), Ok(vb)) => cmp_precedence(&va, &vb),
            _ => a.version.cmp(&b.version),
        }
    })
}
