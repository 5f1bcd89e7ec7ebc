//! Published table download. Not implemented: tables are built locally with
//! `preprocess`.

use std::path::Path;

use tracing::{info, warn};

use crate::tables::table_paths;

/// Leaves `dir` untouched. Only reports whether the tables are already there.
pub fn fetch_published_tables(dir: &Path) {
    let missing: Vec<_> = table_paths(dir)
        .into_iter()
        .filter(|path| !path.exists())
        .collect();

    if missing.is_empty() {
        info!(dir = %dir.display(), "Canonical tables present");
    } else {
        for path in &missing {
            warn!(file = %path.display(), "Table missing, run `preprocess` to build it");
        }
    }
}
