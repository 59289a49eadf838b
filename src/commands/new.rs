//! Create a new post source file

use anyhow::Result;
use std::fs;
use std::path::PathBuf;

use crate::content::{derive_slug, is_slug, POST_SLUG_MAX_LEN};
use crate::Blog;

/// Write `source/_posts/<slug>.md` with a front-matter scaffold
pub fn create_post(blog: &Blog, title: &str, slug: Option<&str>) -> Result<PathBuf> {
    let slug = match slug {
        Some(slug) => slug.to_string(),
        None => derive_slug(title, POST_SLUG_MAX_LEN),
    };
    if !is_slug(&slug) {
        anyhow::bail!("'{}' is not a valid slug", slug);
    }

    let target_dir = blog.source_dir.join("_posts");
    fs::create_dir_all(&target_dir)?;

    let file_path = target_dir.join(format!("{}.md", slug));
    if file_path.exists() {
        anyhow::bail!("File already exists: {:?}", file_path);
    }

    let now = chrono::Utc::now().with_timezone(&blog.config.tz());
    let content = format!(
        "---\ntitle: {}\ndate: {}\nslug: {}\ncategory:\ntags: []\n---\n",
        serde_yaml::to_string(title)?.trim_end(),
        now.format("%Y-%m-%d %H:%M:%S"),
        slug
    );
    fs::write(&file_path, content)?;

    println!("Created: {:?}", file_path);
    Ok(file_path)
}

/// Run the new command
pub fn run(blog: &Blog, title: &str, slug: Option<&str>) -> Result<()> {
    create_post(blog, title, slug)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::loader::ContentLoader;
    use crate::config::{AuthorEntry, SiteConfig};

    #[test]
    fn test_new_post_is_loadable() {
        let dir = tempfile::tempdir().unwrap();
        let config = SiteConfig {
            authors: vec![AuthorEntry {
                username: "admin".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let blog = Blog::with_config(dir.path(), config);

        let path = create_post(&blog, "Hello: World", None).unwrap();
        assert!(path.ends_with("_posts/hello-world.md"));
        assert!(create_post(&blog, "Hello: World", None).is_err());
        assert!(create_post(&blog, "x", Some("bad slug")).is_err());

        let posts = ContentLoader::new(&blog).load_posts().unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].input.title, "Hello: World");
        assert_eq!(posts[0].input.resolved_slug(), "hello-world");
        assert!(posts[0].category.is_none());
    }
}
