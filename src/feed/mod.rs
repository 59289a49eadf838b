//! RSS 2.0 feed of the most recent posts

use chrono::{DateTime, Utc};

use crate::config::SiteConfig;
use crate::content::Post;
use crate::store::Store;

pub const CONTENT_TYPE: &str = "application/rss+xml; charset=utf-8";

/// One `<item>` of the feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    pub title: String,
    /// Absolute link, also used as the guid
    pub link: String,
    /// The post's raw, unrendered text
    pub description: String,
    pub pub_date: DateTime<Utc>,
}

/// A feed document ready to be serialized
#[derive(Debug, Clone)]
pub struct FeedDocument {
    pub title: String,
    pub link: String,
    pub description: String,
    pub language: String,
    pub items: Vec<FeedItem>,
}

/// Build a feed from the `n` most recent posts.
///
/// `n` defaults to `feed.limit` and is capped by it.
pub fn generate_feed(store: &Store, config: &SiteConfig, n: Option<usize>) -> FeedDocument {
    let limit = n.unwrap_or(config.feed.limit).min(config.feed.limit);
    let base = base_url(store);
    let tz = store.tz();

    let items = store
        .posts()
        .into_iter()
        .take(limit)
        .map(|post| item_for(&post, &base, &tz))
        .collect();

    FeedDocument {
        title: config.feed.title.clone(),
        link: format!("{}/", base),
        description: config.feed.description.clone(),
        language: config.language.clone(),
        items,
    }
}

fn item_for(post: &Post, base: &str, tz: &chrono_tz::Tz) -> FeedItem {
    FeedItem {
        title: post.title.clone(),
        link: format!("{}{}", base, post.canonical_path(tz)),
        description: post.text.clone(),
        pub_date: post.pub_date,
    }
}

/// `http://<domain>` of the current site, without a trailing slash
fn base_url(store: &Store) -> String {
    let domain = store
        .current_site()
        .map(|site| site.domain)
        .unwrap_or_else(|| "localhost".to_string());
    format!("http://{}", domain.trim_end_matches('/'))
}

impl FeedDocument {
    /// Serialize as RSS 2.0
    pub fn to_rss(&self) -> String {
        let mut feed = String::new();
        feed.push_str(r#"<?xml version="1.0" encoding="utf-8"?>"#);
        feed.push('\n');
        feed.push_str(r#"<rss version="2.0">"#);
        feed.push('\n');
        feed.push_str("  <channel>\n");
        feed.push_str(&format!("    <title>{}</title>\n", escape_xml(&self.title)));
        feed.push_str(&format!("    <link>{}</link>\n", escape_xml(&self.link)));
        feed.push_str(&format!(
            "    <description>{}</description>\n",
            escape_xml(&self.description)
        ));
        feed.push_str(&format!(
            "    <language>{}</language>\n",
            escape_xml(&self.language)
        ));
        if let Some(latest) = self.items.first() {
            feed.push_str(&format!(
                "    <lastBuildDate>{}</lastBuildDate>\n",
                latest.pub_date.to_rfc2822()
            ));
        }

        for item in &self.items {
            feed.push_str("    <item>\n");
            feed.push_str(&format!("      <title>{}</title>\n", escape_xml(&item.title)));
            feed.push_str(&format!("      <link>{}</link>\n", escape_xml(&item.link)));
            feed.push_str(&format!(
                "      <description>{}</description>\n",
                escape_xml(&item.description)
            ));
            feed.push_str(&format!(
                "      <pubDate>{}</pubDate>\n",
                item.pub_date.to_rfc2822()
            ));
            feed.push_str(&format!("      <guid>{}</guid>\n", escape_xml(&item.link)));
            feed.push_str("    </item>\n");
        }

        feed.push_str("  </channel>\n");
        feed.push_str("</rss>\n");
        feed
    }
}

/// Escape XML special characters, dropping characters XML 1.0 forbids
fn escape_xml(s: &str) -> String {
    strip_invalid_xml_chars(s)
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// XML 1.0 only allows: #x9 | #xA | #xD | [#x20-#xD7FF] | [#xE000-#xFFFD] | [#x10000-#x10FFFF]
fn strip_invalid_xml_chars(s: &str) -> String {
    s.chars()
        .filter(|&c| {
            c == '\t'
                || c == '\n'
                || c == '\r'
                || ('\u{0020}'..='\u{D7FF}').contains(&c)
                || ('\u{E000}'..='\u{FFFD}').contains(&c)
                || ('\u{10000}'..='\u{10FFFF}').contains(&c)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AuthorEntry, SiteEntry};
    use crate::content::PostInput;
    use chrono::TimeZone;

    fn config() -> SiteConfig {
        SiteConfig {
            authors: vec![AuthorEntry {
                username: "admin".to_string(),
                ..Default::default()
            }],
            sites: vec![SiteEntry {
                id: 1,
                name: "Blog".to_string(),
                domain: "blog.example.org".to_string(),
            }],
            ..Default::default()
        }
    }

    fn add(store: &Store, title: &str, text: &str, day: u32) {
        store
            .create_post(PostInput {
                pub_date: Some(Utc.with_ymd_and_hms(2013, 12, day, 12, 0, 0).unwrap()),
                author: Some("admin".to_string()),
                ..PostInput::new(title, text)
            })
            .unwrap();
    }

    #[test]
    fn test_single_post_feed() {
        let config = config();
        let store = Store::in_memory(&config);
        add(
            &store,
            "My first post",
            "This is [my first blog post](http://127.0.0.1:8000/)",
            28,
        );

        let feed = generate_feed(&store, &config, None);
        assert_eq!(feed.items.len(), 1);
        let item = &feed.items[0];
        assert_eq!(item.title, "My first post");
        assert_eq!(
            item.description,
            "This is [my first blog post](http://127.0.0.1:8000/)"
        );
        assert_eq!(item.link, "http://blog.example.org/2013/12/my-first-post/");

        let rss = feed.to_rss();
        assert_eq!(rss.matches("<item>").count(), 1);
        assert!(rss.contains("<title>My first post</title>"));
        assert!(rss.contains("<pubDate>Sat, 28 Dec 2013 12:00:00 +0000</pubDate>"));
    }

    #[test]
    fn test_feed_order_and_cap() {
        let config = config();
        let store = Store::in_memory(&config);
        for day in 1..=8 {
            add(&store, &format!("Post {}", day), "text", day);
        }

        let feed = generate_feed(&store, &config, None);
        assert_eq!(feed.items.len(), config.feed.limit);
        let titles: Vec<_> = feed.items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["Post 8", "Post 7", "Post 6", "Post 5", "Post 4"]);

        assert_eq!(generate_feed(&store, &config, Some(2)).items.len(), 2);
        assert_eq!(
            generate_feed(&store, &config, Some(100)).items.len(),
            config.feed.limit
        );
    }

    #[test]
    fn test_empty_feed() {
        let config = config();
        let store = Store::in_memory(&config);
        let rss = generate_feed(&store, &config, None).to_rss();
        assert!(rss.contains("<channel>"));
        assert!(!rss.contains("<item>"));
    }

    #[test]
    fn test_escaping() {
        assert_eq!(escape_xml("a < b & \"c\""), "a &lt; b &amp; &quot;c&quot;");
        assert_eq!(strip_invalid_xml_chars("ok\u{0}\u{8}\n"), "ok\n");

        let config = config();
        let store = Store::in_memory(&config);
        add(&store, "Tom & Jerry", "<b>bold</b>", 1);
        let rss = generate_feed(&store, &config, None).to_rss();
        assert!(rss.contains("<title>Tom &amp; Jerry</title>"));
        assert!(rss.contains("&lt;b&gt;bold&lt;/b&gt;"));
    }
}
