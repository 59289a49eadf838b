//! Initialize a new blog

use anyhow::Result;
use std::fs;
use std::path::Path;

/// Initialize a new blog in the given directory.
///
/// `password_hash` is written for the first author; without it the admin
/// API stays locked until one is added to `_config.yml`.
pub fn init_site(target_dir: &Path, author: &str, password_hash: Option<&str>) -> Result<()> {
    if target_dir.join("_config.yml").exists() {
        anyhow::bail!("{:?} already contains a _config.yml", target_dir);
    }

    fs::create_dir_all(target_dir.join("source/_posts"))?;
    fs::create_dir_all(target_dir.join("static"))?;

    let config_content = format!(
        r#"# blog-ng configuration

# Site
title: My Blog
description: ''
language: en-us
timezone: UTC

# Sites & authors
site_id: 1
sites:
  - id: 1
    name: My Blog
    domain: example.com
authors:
  - username: {author}
    name: {author}
    email: ''
    # blog-ng hash-password <password>
    password_hash: '{hash}'

# Directory
source_dir: source
static_dir: static
database: db.json

# Listing
per_page: 5

feed:
  title: Recent posts
  description: ''
  limit: 5

highlight:
  theme: base16-ocean.dark
  line_number: false
"#,
        author = serde_yaml::to_string(author)?.trim_end(),
        hash = password_hash.unwrap_or(""),
    );
    fs::write(target_dir.join("_config.yml"), config_content)?;

    let now = chrono::Utc::now();
    let sample_post = format!(
        r#"---
title: My first post
date: {}
slug: my-first-post
category: General
tags: [welcome]
---

This is [my first blog post](http://127.0.0.1:8000/).

## Quick Start

```bash
$ blog-ng new "My New Post"
$ blog-ng server
```
"#,
        now.format("%Y-%m-%d %H:%M:%S")
    );
    fs::write(target_dir.join("source/_posts/my-first-post.md"), sample_post)?;

    let about = r#"---
title: About
---
<p>This blog is served by blog-ng.</p>
"#;
    fs::write(target_dir.join("source/about.md"), about)?;

    let style = r#"body { max-width: 42rem; margin: 0 auto; padding: 1rem; font-family: sans-serif; line-height: 1.6; }
.post-meta { color: #777; font-size: 0.9rem; }
.tags li { display: inline; margin-right: 0.5rem; }
figure.highlight pre { padding: 0.75rem; overflow-x: auto; }
"#;
    fs::write(target_dir.join("static/style.css"), style)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Blog;

    #[test]
    fn test_init_creates_a_usable_blog() {
        let dir = tempfile::tempdir().unwrap();
        init_site(dir.path(), "admin", None).unwrap();

        let blog = Blog::new(dir.path()).unwrap();
        assert_eq!(blog.config.authors[0].username, "admin");

        let store = blog.open_store().unwrap();
        assert_eq!(store.post_count(), 1);
        assert_eq!(store.posts()[0].slug, "my-first-post");
        assert!(store.flat_page("/about/").is_some());
        assert!(blog.db_path.exists());

        assert!(init_site(dir.path(), "admin", None).is_err());
    }

    #[test]
    fn test_init_quotes_author_names() {
        for author in ["yes", "123", "null"] {
            let dir = tempfile::tempdir().unwrap();
            init_site(dir.path(), author, None).unwrap();

            let blog = Blog::new(dir.path()).unwrap();
            assert_eq!(blog.config.authors[0].username, author);
            assert_eq!(blog.config.authors[0].name, author);
        }
    }
}
