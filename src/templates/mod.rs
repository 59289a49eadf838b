//! Built-in page templates using the Tera template engine
//!
//! The templates are embedded in the binary; the data structs below are
//! what they see.

use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::config::SiteConfig;
use crate::content::{Category, FlatPage, MarkdownRenderer, Post, Tag};
use crate::error::Result;
use crate::store::Store;
use crate::views::{Listing, Page};

/// Template renderer with the embedded blog templates
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("blog/layout.html")),
            ("post_list.html", include_str!("blog/post_list.html")),
            ("post_detail.html", include_str!("blog/post_detail.html")),
            ("flatpage.html", include_str!("blog/flatpage.html")),
            ("404.html", include_str!("blog/404.html")),
            (
                "partials/meta.html",
                include_str!("blog/partials/meta.html"),
            ),
        ])?;

        tera.register_filter("strip_html", strip_html_filter);
        tera.register_filter("truncate_chars", truncate_chars_filter);
        tera.register_filter("date_format", date_format_filter);

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }

    /// A listing: the index or a category/tag page
    pub fn render_listing(
        &self,
        site: &SiteData,
        listing: &Listing,
        posts: &[PostData],
        base_path: &str,
    ) -> Result<String> {
        let mut context = Context::new();
        context.insert("site", site);
        context.insert("heading", &listing.title);
        context.insert("description", &listing.description);
        context.insert("posts", posts);
        context.insert("pagination", &PaginationData::new(&listing.page, base_path));
        self.render("post_list.html", &context)
    }

    pub fn render_post(&self, site: &SiteData, post: &PostData) -> Result<String> {
        let mut context = Context::new();
        context.insert("site", site);
        context.insert("post", post);
        self.render("post_detail.html", &context)
    }

    pub fn render_flat_page(&self, site: &SiteData, page: &FlatPage) -> Result<String> {
        let mut context = Context::new();
        context.insert("site", site);
        context.insert(
            "page",
            &PageData {
                title: page.title.clone(),
                url: page.url.clone(),
                content: page.content.clone(),
            },
        );
        self.render("flatpage.html", &context)
    }

    pub fn render_not_found(&self, site: &SiteData, path: &str) -> Result<String> {
        let mut context = Context::new();
        context.insert("site", site);
        context.insert("path", path);
        self.render("404.html", &context)
    }
}

/// Tera filter: strip HTML tags
fn strip_html_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("strip_html", "value", String, value);
    let mut result = String::with_capacity(s.len());
    let mut in_tag = false;
    for c in s.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(c),
            _ => {}
        }
    }
    Ok(tera::Value::String(result.trim().to_string()))
}

/// Tera filter: truncate by character count
fn truncate_chars_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("truncate_chars", "value", String, value);
    let length = match args.get("length") {
        Some(val) => tera::try_get_value!("truncate_chars", "length", usize, val),
        None => 150,
    };
    let omission = match args.get("omission") {
        Some(val) => tera::try_get_value!("truncate_chars", "omission", String, val),
        None => "...".to_string(),
    };

    if s.chars().count() <= length {
        Ok(tera::Value::String(s))
    } else {
        let truncated: String = s.chars().take(length).collect();
        Ok(tera::Value::String(format!(
            "{}{}",
            truncated.trim_end(),
            omission
        )))
    }
}

/// Tera filter: reformat an RFC 3339 timestamp with a strftime pattern
fn date_format_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("date_format", "value", String, value);
    let format = match args.get("format") {
        Some(val) => tera::try_get_value!("date_format", "format", String, val),
        None => "%B %-d, %Y".to_string(),
    };

    match chrono::DateTime::parse_from_rfc3339(&s) {
        Ok(date) => Ok(tera::Value::String(date.format(&format).to_string())),
        // Not a timestamp: leave it alone
        Err(_) => Ok(tera::Value::String(s)),
    }
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub description: String,
    pub language: String,
    pub categories: Vec<TermData>,
}

impl SiteData {
    pub fn new(config: &SiteConfig, store: &Store) -> Self {
        Self {
            title: config.title.clone(),
            description: config.description.clone(),
            language: config.language.clone(),
            categories: store.categories().iter().map(TermData::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TermData {
    pub name: String,
    pub slug: String,
    pub path: String,
}

impl From<&Category> for TermData {
    fn from(category: &Category) -> Self {
        Self {
            name: category.name.clone(),
            slug: category.slug.clone(),
            path: category.path(),
        }
    }
}

impl From<&Tag> for TermData {
    fn from(tag: &Tag) -> Self {
        Self {
            name: tag.name.clone(),
            slug: tag.slug.clone(),
            path: tag.path(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PostData {
    pub id: u64,
    pub title: String,
    pub path: String,
    /// RFC 3339, in the blog's time zone
    pub date: String,
    pub author: String,
    pub category: Option<TermData>,
    pub tags: Vec<TermData>,
    /// Rendered HTML
    pub content: String,
}

impl PostData {
    pub fn new(post: &Post, store: &Store, renderer: &MarkdownRenderer) -> Self {
        let tz = store.tz();
        let author = store
            .author(&post.author)
            .map(|a| if a.name.is_empty() { a.username } else { a.name })
            .unwrap_or_else(|| post.author.clone());

        Self {
            id: post.id,
            title: post.title.clone(),
            path: post.canonical_path(&tz),
            date: post.pub_date.with_timezone(&tz).to_rfc3339(),
            author,
            category: post
                .category
                .and_then(|id| store.category(id).ok())
                .map(|c| TermData::from(&c)),
            tags: post
                .tags
                .iter()
                .filter_map(|id| store.tag(*id).ok())
                .map(|t| TermData::from(&t))
                .collect(),
            content: renderer.render(&post.text),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PageData {
    pub title: String,
    pub url: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaginationData {
    pub current: usize,
    pub num_pages: usize,
    pub total: usize,
    pub prev_link: Option<String>,
    pub next_link: Option<String>,
}

impl PaginationData {
    pub fn new<T>(page: &Page<T>, base_path: &str) -> Self {
        let link = |number: usize| {
            if number == 1 {
                base_path.to_string()
            } else {
                format!("{}?page={}", base_path, number)
            }
        };

        Self {
            current: page.number,
            num_pages: page.num_pages,
            total: page.total,
            prev_link: page.has_previous().then(|| link(page.number - 1)),
            next_link: page.has_next().then(|| link(page.number + 1)),
        }
    }
}
