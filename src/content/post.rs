//! Post, taxonomy and site models

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::permalink;
use crate::error::{Error, Result};

/// Longest allowed post title
pub const TITLE_MAX_LEN: usize = 200;
/// Longest allowed post slug
pub const POST_SLUG_MAX_LEN: usize = 50;
/// Longest allowed category or tag slug
pub const TERM_SLUG_MAX_LEN: usize = 40;

lazy_static! {
    static ref SLUG_RE: Regex = Regex::new(r"^[-a-zA-Z0-9_]+$").unwrap();
}

/// Whether `s` is shaped like a slug (letters, digits, hyphens, underscores)
pub fn is_slug(s: &str) -> bool {
    SLUG_RE.is_match(s)
}

/// Validate a slug against the shape and a length limit
pub fn validate_slug(slug: &str, max_len: usize) -> Result<()> {
    if !is_slug(slug) {
        return Err(Error::Validation(format!(
            "'{}' is not a valid slug (letters, numbers, underscores or hyphens)",
            slug
        )));
    }
    if slug.chars().count() > max_len {
        return Err(Error::Validation(format!(
            "slug '{}' is longer than {} characters",
            slug, max_len
        )));
    }
    Ok(())
}

/// Slugify `source`, cut to at most `max_len` characters
pub fn derive_slug(source: &str, max_len: usize) -> String {
    let slug: String = slug::slugify(source).chars().take(max_len).collect();
    slug.trim_end_matches('-').to_string()
}

/// Validate a required name or title
fn validate_name(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Validation(format!("{} must not be empty", field)));
    }
    if value.chars().count() > TITLE_MAX_LEN {
        return Err(Error::Validation(format!(
            "{} is longer than {} characters",
            field, TITLE_MAX_LEN
        )));
    }
    Ok(())
}

/// A blog post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// Store-assigned id, increasing in insertion order
    pub id: u64,

    /// Post title
    pub title: String,

    /// Raw markdown content
    pub text: String,

    /// URL-friendly name, unique within its publish month
    pub slug: String,

    /// Publication date
    pub pub_date: DateTime<Utc>,

    /// Username of the owning author
    pub author: String,

    /// Owning site id
    pub site: u64,

    /// Optional category id
    pub category: Option<u64>,

    /// Tag ids
    pub tags: BTreeSet<u64>,
}

impl Post {
    /// Canonical path of this post, e.g. `/2013/12/my-first-post/`
    pub fn canonical_path(&self, tz: &Tz) -> String {
        permalink::canonical_path(&self.pub_date, &self.slug, tz)
    }
}

/// A category; many posts may reference one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub slug: String,
}

impl Category {
    pub fn path(&self) -> String {
        format!("/category/{}/", self.slug)
    }
}

/// A tag; many-to-many with posts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub slug: String,
}

impl Tag {
    pub fn path(&self) -> String {
        format!("/tag/{}/", self.slug)
    }
}

/// An author known to the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub username: String,
    pub name: String,
    pub email: String,
}

/// A site posts belong to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub id: u64,
    pub name: String,
    pub domain: String,
}

/// A static page served verbatim at a fixed URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatPage {
    /// URL path, always with leading and trailing slash
    pub url: String,
    pub title: String,
    /// Content, served as-is
    pub content: String,
    /// Source file path (relative to the source dir)
    pub source: String,
}

/// Fields accepted when creating or updating a post
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PostInput {
    pub title: String,
    pub text: String,
    /// Derived from the title when missing
    pub slug: Option<String>,
    /// Defaults to now on create
    pub pub_date: Option<DateTime<Utc>>,
    /// Defaults to the authenticated author
    pub author: Option<String>,
    /// Defaults to the current site
    pub site: Option<u64>,
    pub category: Option<u64>,
    pub tags: BTreeSet<u64>,
}

impl PostInput {
    pub fn new(title: &str, text: &str) -> Self {
        Self {
            title: title.to_string(),
            text: text.to_string(),
            ..Default::default()
        }
    }

    /// The slug to store: explicit, or derived from the title
    pub fn resolved_slug(&self) -> String {
        match &self.slug {
            Some(slug) if !slug.trim().is_empty() => slug.trim().to_string(),
            _ => derive_slug(&self.title, POST_SLUG_MAX_LEN),
        }
    }

    /// Field-level checks that need no store access
    pub fn validate(&self) -> Result<()> {
        validate_name("title", &self.title)?;
        validate_slug(&self.resolved_slug(), POST_SLUG_MAX_LEN)
    }
}

/// Fields accepted when creating or updating a category or tag
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TermInput {
    pub name: String,
    pub description: String,
    /// Derived from the name when missing
    pub slug: Option<String>,
}

impl TermInput {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn resolved_slug(&self) -> String {
        match &self.slug {
            Some(slug) if !slug.trim().is_empty() => slug.trim().to_string(),
            _ => derive_slug(&self.name, TERM_SLUG_MAX_LEN),
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_name("name", &self.name)?;
        validate_slug(&self.resolved_slug(), TERM_SLUG_MAX_LEN)
    }
}
