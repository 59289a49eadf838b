//! Content loader - imports posts and flat pages from the source directory

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use super::permalink::PostPath;
use super::{derive_slug, FlatPage, FrontMatter, PostInput, POST_SLUG_MAX_LEN};
use crate::store::Store;
use crate::Blog;

/// A post read from `source/_posts`, before its terms are resolved
#[derive(Debug, Clone)]
pub struct SourcePost {
    /// Source file path (relative to the source dir)
    pub source: String,
    pub input: PostInput,
    pub category: Option<String>,
    pub tags: Vec<String>,
}

/// Outcome of an import run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: usize,
    pub existing: usize,
    pub skipped: usize,
}

/// Loads content from the source directory
pub struct ContentLoader<'a> {
    blog: &'a Blog,
}

impl<'a> ContentLoader<'a> {
    pub fn new(blog: &'a Blog) -> Self {
        Self { blog }
    }

    /// Read every published post under source/_posts
    pub fn load_posts(&self) -> Result<Vec<SourcePost>> {
        let posts_dir = self.blog.source_dir.join("_posts");
        if !posts_dir.exists() {
            return Ok(Vec::new());
        }

        let mut posts = Vec::new();
        for entry in WalkDir::new(&posts_dir)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() || !is_markdown_file(path) {
                continue;
            }
            match self.load_post(path) {
                Ok(Some(post)) => posts.push(post),
                Ok(None) => tracing::debug!("Skipping unpublished post {:?}", path),
                Err(e) => tracing::warn!("Failed to load post {:?}: {:#}", path, e),
            }
        }

        Ok(posts)
    }

    fn load_post(&self, path: &Path) -> Result<Option<SourcePost>> {
        let content = fs::read_to_string(path)?;
        let (fm, body) = FrontMatter::parse(&content)?;
        if !fm.published {
            return Ok(None);
        }

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("untitled")
            .to_string();

        let tz = self.blog.config.tz();
        let pub_date = match fm.parse_date(&tz) {
            Some(date) => date,
            None => {
                if let Some(raw) = &fm.date {
                    tracing::warn!("Unrecognised date '{}' in {:?}, using mtime", raw, path);
                }
                file_modified(path)?
            }
        };

        let author = match fm.author {
            Some(author) => author,
            None => self
                .blog
                .config
                .authors
                .first()
                .map(|a| a.username.clone())
                .context("post has no author and no authors are configured")?,
        };

        let input = PostInput {
            title: fm.title.unwrap_or_else(|| stem.clone()),
            text: body.to_string(),
            slug: Some(
                fm.slug
                    .unwrap_or_else(|| derive_slug(&stem, POST_SLUG_MAX_LEN)),
            ),
            pub_date: Some(pub_date),
            author: Some(author),
            ..Default::default()
        };

        Ok(Some(SourcePost {
            source: relative_source(&self.blog.source_dir, path),
            input,
            category: fm.category,
            tags: fm.tags,
        }))
    }

    /// Import source posts into the store.
    ///
    /// Posts whose canonical path is already taken are counted as existing
    /// and left untouched, so running the import twice is harmless.
    pub fn import_posts(&self, store: &Store) -> Result<ImportReport> {
        let mut report = ImportReport::default();
        let tz = store.tz();

        for post in self.load_posts()? {
            let slug = post.input.resolved_slug();
            let exists = post
                .input
                .pub_date
                .map(|date| store.post_by_path(&PostPath::new(&date, &slug, &tz)).is_some())
                .unwrap_or(false);
            if exists {
                report.existing += 1;
                continue;
            }

            let imported =
                store.create_post_with_terms(post.input, post.category.as_deref(), &post.tags);
            match imported {
                Ok(_) => report.imported += 1,
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", post.source, e);
                    report.skipped += 1;
                }
            }
        }

        tracing::info!(
            "Imported {} posts ({} already present, {} skipped)",
            report.imported,
            report.existing,
            report.skipped
        );
        Ok(report)
    }

    /// Load flat pages: markdown or HTML files outside `_` directories
    pub fn load_pages(&self) -> Result<Vec<FlatPage>> {
        let source_dir = &self.blog.source_dir;
        if !source_dir.exists() {
            return Ok(Vec::new());
        }

        let mut pages = Vec::new();
        for entry in WalkDir::new(source_dir)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('_')
            })
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if path.is_file() && (is_markdown_file(path) || is_html_file(path)) {
                match self.load_page(path) {
                    Ok(page) => pages.push(page),
                    Err(e) => tracing::warn!("Failed to load page {:?}: {:#}", path, e),
                }
            }
        }

        Ok(pages)
    }

    fn load_page(&self, path: &Path) -> Result<FlatPage> {
        let content = fs::read_to_string(path)?;
        let (fm, body) = FrontMatter::parse(&content)?;
        let source = relative_source(&self.blog.source_dir, path);

        let url = match fm.url {
            Some(url) => normalize_url(&url),
            None => url_for_source(&source),
        };

        let title = fm.title.unwrap_or_else(|| {
            path.file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("Untitled")
                .to_string()
        });

        Ok(FlatPage {
            url,
            title,
            content: body.to_string(),
            source,
        })
    }
}

fn file_modified(path: &Path) -> Result<DateTime<Utc>> {
    let modified = fs::metadata(path)?.modified()?;
    Ok(DateTime::<Utc>::from(modified))
}

fn relative_source(source_dir: &Path, path: &Path) -> String {
    path.strip_prefix(source_dir)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

/// `about.md` -> `/about/`, `docs/index.md` -> `/docs/`, `index.html` -> `/`
fn url_for_source(source: &str) -> String {
    let without_ext = source
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(source);
    let without_index = without_ext
        .strip_suffix("index")
        .filter(|rest| rest.is_empty() || rest.ends_with('/'))
        .unwrap_or(without_ext);
    normalize_url(without_index)
}

/// Ensure a leading and trailing slash
fn normalize_url(url: &str) -> String {
    let trimmed = url.trim().trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{}/", trimmed)
    }
}

fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e == "md" || e == "markdown")
        .unwrap_or(false)
}

fn is_html_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e == "html" || e == "htm")
        .unwrap_or(false)
}
