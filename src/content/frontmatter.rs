//! Front-matter parsing

use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{de::Error as _, Deserialize, Deserializer, Serialize};
use serde_yaml::Value;

/// Numbers and booleans are kept as their text, so `tags: [2014]` works
fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Accept `tags: rust` as well as `tags: [rust, web]`
fn string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let scalar = |value: Value| {
        scalar_to_string(value)
            .ok_or_else(|| D::Error::custom("expected a string or a list of strings"))
    };

    match Value::deserialize(deserializer)? {
        Value::Null => Ok(Vec::new()),
        Value::Sequence(items) => items.into_iter().map(scalar).collect(),
        other => scalar(other).map(|s| vec![s]),
    }
}

/// Front-matter of a post or flat page
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    pub title: Option<String>,
    pub date: Option<String>,
    pub slug: Option<String>,
    pub category: Option<String>,
    #[serde(deserialize_with = "string_or_vec")]
    pub tags: Vec<String>,
    pub author: Option<String>,
    /// Flat pages only: explicit URL
    pub url: Option<String>,
    pub published: bool,
}

impl Default for FrontMatter {
    fn default() -> Self {
        Self {
            title: None,
            date: None,
            slug: None,
            category: None,
            tags: Vec::new(),
            author: None,
            url: None,
            published: true,
        }
    }
}

impl FrontMatter {
    /// Split a document into front-matter and body
    pub fn parse(content: &str) -> Result<(Self, &str)> {
        let content = content.trim_start();

        if content.starts_with("---") {
            return Self::parse_yaml(content);
        }

        if content.starts_with(";;;") || content.starts_with('{') {
            return Self::parse_json(content);
        }

        Ok((FrontMatter::default(), content))
    }

    /// YAML between `---` fences. A block that does not look like
    /// `key: value` pairs is a markdown rule, not front-matter.
    fn parse_yaml(content: &str) -> Result<(Self, &str)> {
        let rest = content[3..].trim_start_matches(['\n', '\r']);

        let Some(end) = rest.find("\n---") else {
            return Ok((FrontMatter::default(), content));
        };
        let yaml = &rest[..end];
        let body = rest[end + 4..].trim_start_matches(['\n', '\r']);

        if yaml.trim().is_empty() {
            return Ok((FrontMatter::default(), body));
        }

        if !yaml.lines().any(looks_like_yaml_key) {
            return Ok((FrontMatter::default(), content));
        }

        let fm = serde_yaml::from_str::<FrontMatter>(yaml)
            .map_err(|e| anyhow!("Failed to parse YAML front-matter: {}", e))?;
        Ok((fm, body))
    }

    /// JSON, either fenced by `;;;` or as a leading object
    fn parse_json(content: &str) -> Result<(Self, &str)> {
        if let Some(rest) = content.strip_prefix(";;;") {
            let end = rest
                .find(";;;")
                .ok_or_else(|| anyhow!("Unterminated JSON front-matter"))?;
            let fm: FrontMatter = serde_json::from_str(&rest[..end])
                .map_err(|e| anyhow!("Failed to parse JSON front-matter: {}", e))?;
            return Ok((fm, rest[end + 3..].trim_start_matches(['\n', '\r'])));
        }

        let mut depth = 0usize;
        for (i, c) in content.char_indices() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        let fm: FrontMatter = serde_json::from_str(&content[..=i])
                            .map_err(|e| anyhow!("Failed to parse JSON front-matter: {}", e))?;
                        return Ok((fm, content[i + 1..].trim_start_matches(['\n', '\r'])));
                    }
                }
                _ => {}
            }
        }

        Err(anyhow!("Invalid JSON front-matter"))
    }

    /// Publish date, with naive values read as local time in `tz`
    pub fn parse_date(&self, tz: &Tz) -> Option<DateTime<Utc>> {
        self.date.as_deref().and_then(|s| parse_date_string(s, tz))
    }
}

/// `key:` or `key: value`, where key is a plain identifier and not a URL scheme
fn looks_like_yaml_key(line: &str) -> bool {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return false;
    }
    let Some((key, value)) = line.split_once(':') else {
        return false;
    };
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        && !matches!(key, "http" | "https" | "ftp")
        && (value.is_empty() || value.starts_with(' '))
}

/// Parse a date string in the formats people write by hand
fn parse_date_string(s: &str, tz: &Tz) -> Option<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    const DATETIME_FORMATS: [&str; 6] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
    ];
    const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

    let naive = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;

    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_yaml_frontmatter() {
        let content = r#"---
title: My first post
date: 2013-12-28 10:30:00
slug: my-first-post
category: python
tags:
  - django
  - tdd
---

This is [my first blog post](http://127.0.0.1:8000/)
"#;

        let (fm, body) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.title.as_deref(), Some("My first post"));
        assert_eq!(fm.slug.as_deref(), Some("my-first-post"));
        assert_eq!(fm.category.as_deref(), Some("python"));
        assert_eq!(fm.tags, vec!["django", "tdd"]);
        assert!(fm.published);
        assert!(body.starts_with("This is [my first blog post]"));
    }

    #[test]
    fn test_parse_json_frontmatter() {
        let content = r#";;;
{"title": "Test Post", "tags": ["a", "b"], "published": false}
;;;
Body.
"#;
        let (fm, body) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.title.as_deref(), Some("Test Post"));
        assert_eq!(fm.tags, vec!["a", "b"]);
        assert!(!fm.published);
        assert_eq!(body.trim(), "Body.");

        let (fm, body) = FrontMatter::parse("{\"title\": \"Bare\"}\nText").unwrap();
        assert_eq!(fm.title.as_deref(), Some("Bare"));
        assert_eq!(body, "Text");
    }

    #[test]
    fn test_single_string_tags() {
        let content = "---\ntitle: One\ntags: notes\n---\nbody";
        let (fm, _) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.tags, vec!["notes"]);
    }

    #[test]
    fn test_scalar_tags() {
        let content =
            "---\ntitle: Plans\ntags: [2014, rust, true]\npublished: false\n---\nsecret\n";
        let (fm, body) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.tags, vec!["2014", "rust", "true"]);
        assert!(!fm.published);
        assert_eq!(body, "secret\n");

        let (fm, _) = FrontMatter::parse("---\ntags: 2014\n---\n").unwrap();
        assert_eq!(fm.tags, vec!["2014"]);
    }

    #[test]
    fn test_malformed_yaml_is_an_error() {
        let content = "---\ntitle: Draft\npublished: maybe\n---\nsecret\n";
        assert!(FrontMatter::parse(content).is_err());

        let nested = "---\ntitle: Draft\ntags: [[a, b]]\n---\nsecret\n";
        assert!(FrontMatter::parse(nested).is_err());
    }

    #[test]
    fn test_no_frontmatter() {
        let (fm, body) = FrontMatter::parse("Just text").unwrap();
        assert!(fm.title.is_none());
        assert_eq!(body, "Just text");
    }

    #[test]
    fn test_markdown_rule_is_not_yaml() {
        let content = "---\nCheck out https://example.com and http://test.com\n---\nMore.";
        let (fm, body) = FrontMatter::parse(content).unwrap();
        assert!(fm.title.is_none());
        assert!(body.contains("https://example.com"));
    }

    #[test]
    fn test_parse_date_in_timezone() {
        let fm = FrontMatter {
            date: Some("2013-12-28 10:30:00".to_string()),
            ..Default::default()
        };

        let utc = fm.parse_date(&Tz::UTC).unwrap();
        assert_eq!((utc.year(), utc.month(), utc.day()), (2013, 12, 28));
        assert_eq!(utc.hour(), 10);

        let london_summer = FrontMatter {
            date: Some("2014-07-01 10:00".to_string()),
            ..Default::default()
        };
        let dt = london_summer.parse_date(&chrono_tz::Europe::London).unwrap();
        assert_eq!(dt.hour(), 9);

        let date_only = FrontMatter {
            date: Some("2013/12/28".to_string()),
            ..Default::default()
        };
        assert_eq!(date_only.parse_date(&Tz::UTC).unwrap().day(), 28);

        let rfc = FrontMatter {
            date: Some("2013-12-28T10:30:00+01:00".to_string()),
            ..Default::default()
        };
        assert_eq!(rfc.parse_date(&Tz::UTC).unwrap().hour(), 9);

        let bad = FrontMatter {
            date: Some("yesterday".to_string()),
            ..Default::default()
        };
        assert!(bad.parse_date(&Tz::UTC).is_none());
    }
}
