//! Entity store
//!
//! Posts, categories, tags, authors and sites live in memory behind a lock
//! and are persisted to a JSON snapshot (`db.json`) after every write.
//! Writes are applied to a copy of the tables; the copy replaces the live
//! tables only once it has been validated and saved.

mod terms;

use chrono::Utc;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

use crate::config::SiteConfig;
use crate::content::permalink::PostPath;
use crate::content::{Author, Category, FlatPage, Post, PostInput, Site, Tag, TermInput};
use crate::error::{Error, Result};

use terms::Term;

/// Snapshot format version
const VERSION: u32 = 1;

/// All tables, as serialized to the snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Database {
    pub version: u32,
    next_post_id: u64,
    next_category_id: u64,
    next_tag_id: u64,
    pub posts: BTreeMap<u64, Post>,
    pub categories: BTreeMap<u64, Category>,
    pub tags: BTreeMap<u64, Tag>,
    pub authors: BTreeMap<String, Author>,
    pub sites: BTreeMap<u64, Site>,
    /// Loaded from the source directory, never persisted
    #[serde(skip)]
    pub flat_pages: BTreeMap<String, FlatPage>,
}

impl Database {
    fn new() -> Self {
        Self {
            version: VERSION,
            ..Default::default()
        }
    }

    /// Load a snapshot from disk
    fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let db: Database = serde_json::from_str(&content)?;
        if db.version != VERSION {
            return Err(Error::Config(format!(
                "{} has snapshot version {}, expected {}",
                path.display(),
                db.version,
                VERSION
            )));
        }
        Ok(db)
    }

    /// Write the snapshot next to its final location, then move it into place
    fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(self)?)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Replace sites and authors with the configured ones
    fn sync_config(&mut self, config: &SiteConfig) {
        self.sites = config
            .sites
            .iter()
            .map(|s| {
                let site = Site {
                    id: s.id,
                    name: s.name.clone(),
                    domain: s.domain.clone(),
                };
                (s.id, site)
            })
            .collect();

        self.authors = config
            .authors
            .iter()
            .map(|a| {
                let author = Author {
                    username: a.username.clone(),
                    name: a.name.clone(),
                    email: a.email.clone(),
                };
                (a.username.clone(), author)
            })
            .collect();

        for post in self.posts.values() {
            if !self.authors.contains_key(&post.author) {
                tracing::warn!(
                    "Post {} belongs to unknown author '{}'",
                    post.id,
                    post.author
                );
            }
        }
    }

    fn post_mut(&mut self, id: u64) -> Result<&mut Post> {
        self.posts
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("post {}", id)))
    }

    /// Check references and path uniqueness of a post about to be stored
    fn check_post(&self, post: &Post, tz: &Tz) -> Result<()> {
        if !self.authors.contains_key(&post.author) {
            return Err(Error::Validation(format!("unknown author '{}'", post.author)));
        }
        if !self.sites.contains_key(&post.site) {
            return Err(Error::Validation(format!("unknown site {}", post.site)));
        }
        if let Some(category) = post.category {
            if !self.categories.contains_key(&category) {
                return Err(Error::Validation(format!("unknown category {}", category)));
            }
        }
        if let Some(tag) = post.tags.iter().find(|t| !self.tags.contains_key(t)) {
            return Err(Error::Validation(format!("unknown tag {}", tag)));
        }

        let path = post.canonical_path(tz);
        let taken = self
            .posts
            .values()
            .any(|other| other.id != post.id && other.canonical_path(tz) == path);
        if taken {
            return Err(Error::Conflict(format!(
                "another post is already published at {}",
                path
            )));
        }

        Ok(())
    }

    /// Build a new post from `input` and insert it
    fn insert_post(&mut self, input: PostInput, site: u64, tz: &Tz) -> Result<Post> {
        input.validate()?;
        let author = input
            .author
            .clone()
            .ok_or_else(|| Error::Validation("author is required".to_string()))?;

        self.next_post_id += 1;
        let post = Post {
            id: self.next_post_id,
            title: input.title.trim().to_string(),
            slug: input.resolved_slug(),
            text: input.text,
            pub_date: input.pub_date.unwrap_or_else(Utc::now),
            author,
            site: input.site.unwrap_or(site),
            category: input.category,
            tags: input.tags,
        };
        self.check_post(&post, tz)?;
        self.posts.insert(post.id, post.clone());
        Ok(post)
    }
}

/// Newest first; posts published at the same instant keep insertion order
pub fn sort_newest_first(posts: &mut [Post]) {
    posts.sort_by(|a, b| b.pub_date.cmp(&a.pub_date).then(a.id.cmp(&b.id)));
}

/// Shared handle to the entity store
#[derive(Clone, Debug)]
pub struct Store {
    db: Arc<RwLock<Database>>,
    path: Option<PathBuf>,
    tz: Tz,
    site_id: u64,
}

impl Store {
    /// A store that is never written to disk
    pub fn in_memory(config: &SiteConfig) -> Self {
        let mut db = Database::new();
        db.sync_config(config);
        Self::from_parts(db, None, config)
    }

    /// Open the snapshot at `path`, starting empty if it does not exist yet
    pub fn open<P: AsRef<Path>>(path: P, config: &SiteConfig) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut db = if path.exists() {
            let db = Database::load(&path)?;
            tracing::debug!("Loaded {} posts from {:?}", db.posts.len(), path);
            db
        } else {
            tracing::info!("No snapshot at {:?}, starting with an empty store", path);
            Database::new()
        };
        db.sync_config(config);
        Ok(Self::from_parts(db, Some(path), config))
    }

    fn from_parts(db: Database, path: Option<PathBuf>, config: &SiteConfig) -> Self {
        Self {
            db: Arc::new(RwLock::new(db)),
            path,
            tz: config.tz(),
            site_id: config.site_id,
        }
    }

    /// Time zone canonical paths are computed in
    pub fn tz(&self) -> Tz {
        self.tz
    }

    /// Persist the current tables
    pub fn save(&self) -> Result<()> {
        match &self.path {
            Some(path) => self.read().save(path),
            None => Ok(()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Database> {
        self.db.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `op` to a copy of the tables, persist it, then publish it
    fn write<T>(&self, op: impl FnOnce(&mut Database) -> Result<T>) -> Result<T> {
        let mut live = self.db.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = live.clone();
        let value = op(&mut next)?;
        if let Some(path) = &self.path {
            next.save(path)?;
        }
        *live = next;
        Ok(value)
    }

    // Posts

    /// All posts, newest first
    pub fn posts(&self) -> Vec<Post> {
        self.posts_where(|_| true)
    }

    /// Posts matching `pred`, newest first
    pub fn posts_where(&self, pred: impl Fn(&Post) -> bool) -> Vec<Post> {
        let mut posts: Vec<Post> = self
            .read()
            .posts
            .values()
            .filter(|p| pred(p))
            .cloned()
            .collect();
        sort_newest_first(&mut posts);
        posts
    }

    pub fn post_count(&self) -> usize {
        self.read().posts.len()
    }

    pub fn post(&self, id: u64) -> Result<Post> {
        self.read()
            .posts
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("post {}", id)))
    }

    /// The post published at a canonical path
    pub fn post_by_path(&self, path: &PostPath) -> Option<Post> {
        self.read()
            .posts
            .values()
            .find(|p| path.matches(&p.pub_date, &p.slug, &self.tz))
            .cloned()
    }

    /// Create a post; missing site and date default to the current site and now
    pub fn create_post(&self, input: PostInput) -> Result<Post> {
        let post = self.write(|db| db.insert_post(input, self.site_id, &self.tz))?;
        tracing::info!("Created post {} at {}", post.id, post.canonical_path(&self.tz));
        Ok(post)
    }

    /// Create a post together with its category and tags, given by name.
    ///
    /// Terms are matched by slug and created when missing. Nothing is stored
    /// unless the post itself is accepted.
    pub fn create_post_with_terms(
        &self,
        mut input: PostInput,
        category: Option<&str>,
        tags: &[String],
    ) -> Result<Post> {
        let post = self.write(|db| {
            if let Some(name) = category {
                let category: Category = terms::find_or_create(db, &TermInput::new(name))?;
                input.category = Some(category.id);
            }
            for name in tags {
                let tag: Tag = terms::find_or_create(db, &TermInput::new(name))?;
                input.tags.insert(tag.id);
            }
            db.insert_post(input, self.site_id, &self.tz)
        })?;
        tracing::info!("Created post {} at {}", post.id, post.canonical_path(&self.tz));
        Ok(post)
    }

    /// Replace a post's fields; missing slug, date, author and site are kept
    pub fn update_post(&self, id: u64, input: PostInput) -> Result<Post> {
        let post = self.write(|db| {
            let current = db.post_mut(id)?.clone();
            let slug = match &input.slug {
                Some(s) if !s.trim().is_empty() => s.trim().to_string(),
                _ => current.slug.clone(),
            };
            let input = PostInput {
                slug: Some(slug),
                ..input
            };
            input.validate()?;

            let post = Post {
                id,
                title: input.title.trim().to_string(),
                slug: input.resolved_slug(),
                text: input.text,
                pub_date: input.pub_date.unwrap_or(current.pub_date),
                author: input.author.unwrap_or(current.author),
                site: input.site.unwrap_or(current.site),
                category: input.category,
                tags: input.tags,
            };
            db.check_post(&post, &self.tz)?;
            *db.post_mut(id)? = post.clone();
            Ok(post)
        })?;

        tracing::info!("Updated post {}", id);
        Ok(post)
    }

    /// Delete a post; its category and tags are left alone
    pub fn delete_post(&self, id: u64) -> Result<Post> {
        let post = self.write(|db| {
            db.posts
                .remove(&id)
                .ok_or_else(|| Error::NotFound(format!("post {}", id)))
        })?;
        tracing::info!("Deleted post {}", id);
        Ok(post)
    }

    // Categories

    pub fn categories(&self) -> Vec<Category> {
        Category::table(&self.read()).values().cloned().collect()
    }

    pub fn category(&self, id: u64) -> Result<Category> {
        terms::get(&self.read(), id)
    }

    pub fn category_by_slug(&self, slug: &str) -> Option<Category> {
        terms::by_slug(&self.read(), slug)
    }

    pub fn create_category(&self, input: TermInput) -> Result<Category> {
        self.write(|db| terms::create(db, &input))
    }

    pub fn update_category(&self, id: u64, input: TermInput) -> Result<Category> {
        self.write(|db| terms::update(db, id, &input))
    }

    /// Delete a category; posts in it become uncategorized
    pub fn delete_category(&self, id: u64) -> Result<Category> {
        self.write(|db| terms::delete(db, id))
    }

    // Tags

    pub fn tags(&self) -> Vec<Tag> {
        Tag::table(&self.read()).values().cloned().collect()
    }

    pub fn tag(&self, id: u64) -> Result<Tag> {
        terms::get(&self.read(), id)
    }

    pub fn tag_by_slug(&self, slug: &str) -> Option<Tag> {
        terms::by_slug(&self.read(), slug)
    }

    pub fn create_tag(&self, input: TermInput) -> Result<Tag> {
        self.write(|db| terms::create(db, &input))
    }

    pub fn update_tag(&self, id: u64, input: TermInput) -> Result<Tag> {
        self.write(|db| terms::update(db, id, &input))
    }

    /// Delete a tag and remove it from every post
    pub fn delete_tag(&self, id: u64) -> Result<Tag> {
        self.write(|db| terms::delete(db, id))
    }

    // Authors & sites

    pub fn author(&self, username: &str) -> Option<Author> {
        self.read().authors.get(username).cloned()
    }

    pub fn authors(&self) -> Vec<Author> {
        self.read().authors.values().cloned().collect()
    }

    pub fn site(&self, id: u64) -> Option<Site> {
        self.read().sites.get(&id).cloned()
    }

    /// The site this instance serves
    pub fn current_site(&self) -> Option<Site> {
        self.site(self.site_id)
    }

    // Flat pages

    /// Replace the flat pages; they are not part of the snapshot
    pub fn set_flat_pages(&self, pages: Vec<FlatPage>) {
        let mut db = self.db.write().unwrap_or_else(PoisonError::into_inner);
        db.flat_pages = pages.into_iter().map(|p| (p.url.clone(), p)).collect();
    }

    pub fn flat_page(&self, url: &str) -> Option<FlatPage> {
        self.read().flat_pages.get(url).cloned()
    }

    pub fn flat_pages(&self) -> Vec<FlatPage> {
        self.read().flat_pages.values().cloned().collect()
    }
}
