//! Content module - entities, markdown rendering, permalinks and loading

mod frontmatter;
pub mod loader;
mod markdown;
pub mod permalink;
mod post;

pub use frontmatter::FrontMatter;
pub use markdown::MarkdownRenderer;
pub use post::{
    derive_slug, is_slug, Author, Category, FlatPage, Post, PostInput, Site, Tag, TermInput,
    POST_SLUG_MAX_LEN, TERM_SLUG_MAX_LEN, TITLE_MAX_LEN,
};
