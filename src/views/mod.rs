//! List and detail views over the store
//!
//! Everything here only reads from the store.

use crate::content::{is_slug, permalink, Post};
use crate::error::{Error, Result};
use crate::store::Store;

/// Which posts a listing shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    All,
    Category(String),
    Tag(String),
}

impl Filter {
    /// Posts in the category with `slug`
    pub fn category(slug: &str) -> Result<Self> {
        Self::checked(slug).map(Filter::Category)
    }

    /// Posts tagged with `slug`
    pub fn tag(slug: &str) -> Result<Self> {
        Self::checked(slug).map(Filter::Tag)
    }

    fn checked(slug: &str) -> Result<String> {
        if is_slug(slug) {
            Ok(slug.to_string())
        } else {
            Err(Error::InvalidFilter(format!("'{}' is not a slug", slug)))
        }
    }
}

/// Posts matching `filter`, newest first.
///
/// An unknown category or tag is not an error: it simply has no posts.
pub fn list_posts(store: &Store, filter: &Filter) -> Result<Vec<Post>> {
    let posts = match filter {
        Filter::All => store.posts(),
        Filter::Category(slug) => match store.category_by_slug(slug) {
            Some(category) => store.posts_where(|p| p.category == Some(category.id)),
            None => Vec::new(),
        },
        Filter::Tag(slug) => match store.tag_by_slug(slug) {
            Some(tag) => store.posts_where(|p| p.tags.contains(&tag.id)),
            None => Vec::new(),
        },
    };
    Ok(posts)
}

/// Resolve a canonical path to its post
pub fn get_post(store: &Store, path: &str) -> Result<Post> {
    permalink::parse(path)
        .and_then(|p| store.post_by_path(&p))
        .ok_or_else(|| Error::NotFound(format!("no post at {}", path)))
}

/// One page of a listing
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page number
    pub number: usize,
    pub num_pages: usize,
    pub total: usize,
}

impl<T> Page<T> {
    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }
}

/// Cut `items` into pages of `per_page` and return page `number`.
///
/// Page 1 always exists, even when empty; any other page past the end
/// is NotFound.
pub fn paginate<T>(items: Vec<T>, number: usize, per_page: usize) -> Result<Page<T>> {
    let per_page = per_page.max(1);
    let total = items.len();
    let num_pages = total.div_ceil(per_page).max(1);

    if number == 0 || number > num_pages {
        return Err(Error::NotFound(format!("page {} of {}", number, num_pages)));
    }

    let items = items
        .into_iter()
        .skip((number - 1) * per_page)
        .take(per_page)
        .collect();

    Ok(Page {
        items,
        number,
        num_pages,
        total,
    })
}

/// A listing page: heading plus one page of posts
#[derive(Debug, Clone)]
pub struct Listing {
    /// Category or tag name
    pub title: Option<String>,
    pub description: Option<String>,
    pub page: Page<Post>,
}

impl Listing {
    /// An empty first page, for filters that cannot match anything
    pub fn empty() -> Self {
        Self {
            title: None,
            description: None,
            page: Page {
                items: Vec::new(),
                number: 1,
                num_pages: 1,
                total: 0,
            },
        }
    }
}

/// Build a listing page for `filter`
pub fn listing(store: &Store, filter: Filter, page: usize, per_page: usize) -> Result<Listing> {
    let (title, description) = match &filter {
        Filter::All => (None, None),
        Filter::Category(slug) => store
            .category_by_slug(slug)
            .map(|c| (Some(c.name), Some(c.description)))
            .unwrap_or_default(),
        Filter::Tag(slug) => store
            .tag_by_slug(slug)
            .map(|t| (Some(t.name), Some(t.description)))
            .unwrap_or_default(),
    };

    let posts = list_posts(store, &filter)?;
    let page = paginate(posts, page, per_page)?;

    Ok(Listing {
        title,
        description: description.filter(|d| !d.is_empty()),
        page,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AuthorEntry, SiteConfig};
    use crate::content::{PostInput, TermInput};
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeSet;

    fn store() -> Store {
        let config = SiteConfig {
            authors: vec![AuthorEntry {
                username: "admin".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };
        Store::in_memory(&config)
    }

    fn add(store: &Store, slug: &str, day: u32, category: Option<u64>, tags: &[u64]) -> Post {
        store
            .create_post(PostInput {
                slug: Some(slug.to_string()),
                pub_date: Some(Utc.with_ymd_and_hms(2014, 3, day, 9, 0, 0).unwrap()),
                author: Some("admin".to_string()),
                category,
                tags: tags.iter().copied().collect::<BTreeSet<_>>(),
                ..PostInput::new(slug, "text")
            })
            .unwrap()
    }

    #[test]
    fn test_list_all_newest_first() {
        let store = store();
        add(&store, "b", 2, None, &[]);
        add(&store, "c", 3, None, &[]);
        add(&store, "a", 1, None, &[]);

        let posts = list_posts(&store, &Filter::All).unwrap();
        let slugs: Vec<_> = posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["c", "b", "a"]);
        assert!(posts.windows(2).all(|w| w[0].pub_date >= w[1].pub_date));
    }

    #[test]
    fn test_filter_by_category_and_tag() {
        let store = store();
        let python = store.create_category(TermInput::new("Python")).unwrap();
        let django = store.create_tag(TermInput::new("Django")).unwrap();
        add(&store, "in-python", 1, Some(python.id), &[]);
        add(&store, "tagged", 2, None, &[django.id]);
        add(&store, "both", 3, Some(python.id), &[django.id]);

        let in_category = list_posts(&store, &Filter::category("python").unwrap()).unwrap();
        let slugs: Vec<_> = in_category.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["both", "in-python"]);

        let tagged = list_posts(&store, &Filter::tag("django").unwrap()).unwrap();
        let slugs: Vec<_> = tagged.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["both", "tagged"]);
    }

    #[test]
    fn test_unknown_category_is_empty_not_error() {
        let store = store();
        add(&store, "a", 1, None, &[]);
        let posts = list_posts(&store, &Filter::category("blah").unwrap()).unwrap();
        assert!(posts.is_empty());
    }

    #[test]
    fn test_malformed_filter_is_invalid() {
        assert!(matches!(Filter::category("no spaces"), Err(Error::InvalidFilter(_))));
        assert!(matches!(Filter::tag(""), Err(Error::InvalidFilter(_))));
        assert_eq!(Filter::tag("x-1").unwrap(), Filter::Tag("x-1".to_string()));
        assert!(Error::InvalidFilter(String::new()).is_not_found());
    }

    #[test]
    fn test_get_post_roundtrip() {
        let store = store();
        let post = add(&store, "my-first-post", 28, None, &[]);
        let path = post.canonical_path(&store.tz());
        assert_eq!(path, "/2014/3/my-first-post/");
        assert_eq!(get_post(&store, &path).unwrap(), post);
        assert!(matches!(get_post(&store, "/2014/4/my-first-post/"), Err(Error::NotFound(_))));
        assert!(get_post(&store, "/nonsense/").is_err());
    }

    #[test]
    fn test_paginate() {
        let page = paginate((1..=12).collect::<Vec<_>>(), 1, 5).unwrap();
        assert_eq!(page.items, vec![1, 2, 3, 4, 5]);
        assert_eq!(page.num_pages, 3);
        assert!(!page.has_previous());
        assert!(page.has_next());

        let last = paginate((1..=12).collect::<Vec<_>>(), 3, 5).unwrap();
        assert_eq!(last.items, vec![11, 12]);
        assert!(!last.has_next());

        assert!(paginate((1..=12).collect::<Vec<_>>(), 4, 5).is_err());
        assert!(paginate((1..=12).collect::<Vec<_>>(), 0, 5).is_err());

        let empty = paginate(Vec::<u8>::new(), 1, 5).unwrap();
        assert!(empty.items.is_empty());
        assert_eq!(empty.num_pages, 1);
    }

    #[test]
    fn test_listing_heading() {
        let store = store();
        let category = store
            .create_category(TermInput {
                description: "Snakes".to_string(),
                ..TermInput::new("Python")
            })
            .unwrap();
        add(&store, "a", 1, Some(category.id), &[]);

        let listing = listing(&store, Filter::category("python").unwrap(), 1, 5).unwrap();
        assert_eq!(listing.title.as_deref(), Some("Python"));
        assert_eq!(listing.description.as_deref(), Some("Snakes"));
        assert_eq!(listing.page.items.len(), 1);

        let missing = super::listing(&store, Filter::tag("nope").unwrap(), 1, 5).unwrap();
        assert!(missing.title.is_none());
        assert!(missing.page.items.is_empty());
    }
}
