//! blog-ng: a small personal blog
//!
//! Posts, categories and tags live in a JSON-backed store, are rendered
//! from Markdown with syntect highlighting, and are served over axum
//! together with an RSS feed, flat pages and an authenticated admin API.

pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod feed;
pub mod server;
pub mod store;
pub mod templates;
pub mod views;

pub use error::{Error, Result};

use anyhow::Context;
use std::path::{Path, PathBuf};

use content::loader::ContentLoader;
use store::Store;

/// The main blog application
#[derive(Clone, Debug)]
pub struct Blog {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Markdown posts and flat pages
    pub source_dir: PathBuf,
    /// Files served under /static/
    pub static_dir: PathBuf,
    /// The store snapshot
    pub db_path: PathBuf,
}

impl Blog {
    /// Create a blog from a directory, reading `_config.yml` if present
    pub fn new<P: AsRef<Path>>(base_dir: P) -> anyhow::Result<Self> {
        let base_dir = base_dir.as_ref();
        let config_path = base_dir.join("_config.yml");

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            tracing::debug!("No _config.yml in {:?}, using defaults", base_dir);
            config::SiteConfig::default()
        };

        Ok(Self::with_config(base_dir, config))
    }

    /// Create a blog from an already loaded configuration
    pub fn with_config<P: AsRef<Path>>(base_dir: P, config: config::SiteConfig) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let source_dir = base_dir.join(&config.source_dir);
        let static_dir = base_dir.join(&config.static_dir);
        let db_path = base_dir.join(&config.database);

        Self {
            config,
            base_dir,
            source_dir,
            static_dir,
            db_path,
        }
    }

    /// Open the store and load flat pages.
    ///
    /// A store without posts is seeded from `source/_posts`.
    pub fn open_store(&self) -> anyhow::Result<Store> {
        let store = Store::open(&self.db_path, &self.config)
            .with_context(|| format!("Failed to open {:?}", self.db_path))?;
        let loader = ContentLoader::new(self);

        if store.post_count() == 0 {
            loader.import_posts(&store)?;
        }

        let pages = loader.load_pages()?;
        tracing::debug!("Loaded {} flat pages", pages.len());
        store.set_flat_pages(pages);

        store.save()?;
        Ok(store)
    }
}
