//! Site configuration (_config.yml)

use anyhow::Result;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::error::Error;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,
    pub language: String,
    pub timezone: String,

    // Sites & authors
    pub site_id: u64,
    pub sites: Vec<SiteEntry>,
    pub authors: Vec<AuthorEntry>,

    // Directory
    pub source_dir: String,
    pub static_dir: String,
    pub database: String,

    // Listing
    pub per_page: usize,

    #[serde(default)]
    pub feed: FeedConfig,

    #[serde(default)]
    pub highlight: HighlightConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "My Blog".to_string(),
            description: String::new(),
            language: "en-us".to_string(),
            timezone: "UTC".to_string(),

            site_id: 1,
            sites: vec![SiteEntry::default()],
            authors: Vec::new(),

            source_dir: "source".to_string(),
            static_dir: "static".to_string(),
            database: "db.json".to_string(),

            per_page: 5,

            feed: FeedConfig::default(),
            highlight: HighlightConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file and validate it
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the values serde cannot check on its own
    pub fn validate(&self) -> Result<(), Error> {
        if self.timezone.parse::<Tz>().is_err() {
            return Err(Error::Config(format!(
                "unknown timezone '{}'",
                self.timezone
            )));
        }

        if self.per_page == 0 {
            return Err(Error::Config("per_page must be at least 1".to_string()));
        }

        if self.feed.limit == 0 {
            return Err(Error::Config("feed.limit must be at least 1".to_string()));
        }

        let mut site_ids = HashSet::new();
        for site in &self.sites {
            if !site_ids.insert(site.id) {
                return Err(Error::Config(format!("duplicate site id {}", site.id)));
            }
        }
        if !site_ids.contains(&self.site_id) {
            return Err(Error::Config(format!(
                "site_id {} is not listed in sites",
                self.site_id
            )));
        }

        let mut usernames = HashSet::new();
        for author in &self.authors {
            if author.username.trim().is_empty() {
                return Err(Error::Config("author username is empty".to_string()));
            }
            if !usernames.insert(author.username.as_str()) {
                return Err(Error::Config(format!(
                    "duplicate author '{}'",
                    author.username
                )));
            }
        }

        Ok(())
    }

    /// Time zone used for publish dates and canonical paths
    pub fn tz(&self) -> Tz {
        self.timezone.parse().unwrap_or(Tz::UTC)
    }

    /// The site this instance serves
    pub fn current_site(&self) -> Option<&SiteEntry> {
        self.sites.iter().find(|s| s.id == self.site_id)
    }

    /// Look up an author by username
    pub fn author(&self, username: &str) -> Option<&AuthorEntry> {
        self.authors.iter().find(|a| a.username == username)
    }
}

/// A site this blog can be served under
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteEntry {
    pub id: u64,
    pub name: String,
    pub domain: String,
}

impl Default for SiteEntry {
    fn default() -> Self {
        Self {
            id: 1,
            name: "example.com".to_string(),
            domain: "example.com".to_string(),
        }
    }
}

/// An author allowed to log in to the admin API
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorEntry {
    pub username: String,
    pub name: String,
    pub email: String,
    /// Argon2 PHC string, see `blog-ng hash-password`
    pub password_hash: String,
}

/// Feed configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub title: String,
    pub description: String,
    /// Maximum number of items in the feed
    pub limit: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            title: "Recent posts".to_string(),
            description: String::new(),
            limit: 5,
        }
    }
}

/// Code highlighting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    pub theme: String,
    pub line_number: bool,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            theme: "base16-ocean.dark".to_string(),
            line_number: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SiteConfig::default();
        assert_eq!(config.title, "My Blog");
        assert_eq!(config.per_page, 5);
        assert_eq!(config.tz(), Tz::UTC);
        assert!(config.validate().is_ok());
        assert_eq!(config.current_site().unwrap().domain, "example.com");
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
title: Matthew's Blog
timezone: Europe/London
per_page: 10
sites:
  - id: 2
    name: blog
    domain: blog.example.org
site_id: 2
authors:
  - username: matthew
    name: Matthew
"#;
        let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.title, "Matthew's Blog");
        assert_eq!(config.tz(), chrono_tz::Europe::London);
        assert_eq!(config.per_page, 10);
        assert_eq!(config.current_site().unwrap().domain, "blog.example.org");
        assert_eq!(config.author("matthew").unwrap().name, "Matthew");
        assert_eq!(config.feed.limit, 5);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = SiteConfig {
            timezone: "Mars/Olympus".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let config = SiteConfig {
            per_page: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = SiteConfig {
            site_id: 7,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let author = AuthorEntry {
            username: "me".to_string(),
            ..Default::default()
        };
        let config = SiteConfig {
            authors: vec![author.clone(), author],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
