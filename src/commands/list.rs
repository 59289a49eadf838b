//! List blog content

use anyhow::Result;

use crate::Blog;

/// List store content by type
pub fn run(blog: &Blog, content_type: &str) -> Result<()> {
    let store = blog.open_store()?;
    let tz = store.tz();

    match content_type {
        "post" | "posts" => {
            let posts = store.posts();
            println!("Posts ({}):", posts.len());
            for post in posts {
                println!(
                    "  {:>4}  {} - {} [{}]",
                    post.id,
                    post.pub_date.with_timezone(&tz).format("%Y-%m-%d"),
                    post.title,
                    post.canonical_path(&tz)
                );
            }
        }
        "page" | "pages" => {
            let pages = store.flat_pages();
            println!("Pages ({}):", pages.len());
            for page in pages {
                println!("  {} - {} [{}]", page.url, page.title, page.source);
            }
        }
        "tag" | "tags" => {
            let mut tags: Vec<_> = store
                .tags()
                .into_iter()
                .map(|tag| {
                    let count = store.posts_where(|p| p.tags.contains(&tag.id)).len();
                    (tag, count)
                })
                .collect();
            tags.sort_by(|a, b| b.1.cmp(&a.1));
            println!("Tags ({}):", tags.len());
            for (tag, count) in tags {
                println!("  {} ({}) [{}]", tag.name, count, tag.path());
            }
        }
        "category" | "categories" => {
            let mut categories: Vec<_> = store
                .categories()
                .into_iter()
                .map(|category| {
                    let count = store
                        .posts_where(|p| p.category == Some(category.id))
                        .len();
                    (category, count)
                })
                .collect();
            categories.sort_by(|a, b| b.1.cmp(&a.1));
            println!("Categories ({}):", categories.len());
            for (category, count) in categories {
                println!("  {} ({}) [{}]", category.name, count, category.path());
            }
        }
        _ => {
            anyhow::bail!(
                "Unknown type: {}. Available: post, page, tag, category",
                content_type
            );
        }
    }

    Ok(())
}
