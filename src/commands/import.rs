//! Import posts from source/_posts into the store

use anyhow::{Context, Result};

use crate::content::loader::{ContentLoader, ImportReport};
use crate::store::Store;
use crate::Blog;

/// Import every source post whose canonical path is not taken yet
pub fn run(blog: &Blog) -> Result<ImportReport> {
    let store = Store::open(&blog.db_path, &blog.config)
        .with_context(|| format!("Failed to open {:?}", blog.db_path))?;
    let report = ContentLoader::new(blog).import_posts(&store)?;
    store.save()?;

    println!(
        "Imported {} posts ({} already present, {} skipped)",
        report.imported, report.existing, report.skipped
    );
    Ok(report)
}
