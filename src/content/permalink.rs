//! Canonical post paths: `/<year>/<month>/<slug>/`

use chrono::{DateTime, Datelike, Utc};
use chrono_tz::Tz;
use std::fmt;

use super::post::is_slug;

/// The parts of a canonical post path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostPath {
    pub year: i32,
    pub month: u32,
    pub slug: String,
}

impl PostPath {
    /// The path a post published at `date` with `slug` lives at
    pub fn new(date: &DateTime<Utc>, slug: &str, tz: &Tz) -> Self {
        let local = date.with_timezone(tz);
        Self {
            year: local.year(),
            month: local.month(),
            slug: slug.to_string(),
        }
    }

    /// Whether a post published at `date` with `slug` lives at this path
    pub fn matches(&self, date: &DateTime<Utc>, slug: &str, tz: &Tz) -> bool {
        let local = date.with_timezone(tz);
        local.year() == self.year && local.month() == self.month && slug == self.slug
    }
}

impl fmt::Display for PostPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}/{}/", self.year, self.month, self.slug)
    }
}

/// Build the canonical path from a publish date and slug.
///
/// Year and month come from the date as seen in `tz`. The month is not
/// zero padded.
pub fn canonical_path(date: &DateTime<Utc>, slug: &str, tz: &Tz) -> String {
    PostPath::new(date, slug, tz).to_string()
}

/// Parse a canonical path back into its parts.
///
/// Accepts a zero-padded month (`/2013/01/x/`) and a missing trailing
/// slash; returns `None` for anything that is not a post path.
pub fn parse(path: &str) -> Option<PostPath> {
    let trimmed = path.strip_prefix('/')?;
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);

    let mut parts = trimmed.split('/');
    let year = parts.next()?;
    let month = parts.next()?;
    let slug = parts.next()?;
    if parts.next().is_some() {
        return None;
    }

    if year.len() != 4 || !year.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    if month.is_empty() || month.len() > 2 || !month.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let year: i32 = year.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    if !(1..=12).contains(&month) || !is_slug(slug) {
        return None;
    }

    Some(PostPath {
        year,
        month,
        slug: slug.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_canonical_path_format() {
        assert_eq!(
            canonical_path(&date(2013, 12, 28, 12), "my-first-post", &Tz::UTC),
            "/2013/12/my-first-post/"
        );
        assert_eq!(
            canonical_path(&date(2014, 1, 5, 12), "new-year", &Tz::UTC),
            "/2014/1/new-year/"
        );
    }

    #[test]
    fn test_same_slug_different_month() {
        let a = canonical_path(&date(2013, 11, 1, 12), "hello", &Tz::UTC);
        let b = canonical_path(&date(2013, 12, 1, 12), "hello", &Tz::UTC);
        let c = canonical_path(&date(2014, 11, 1, 12), "hello", &Tz::UTC);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_timezone_shifts_month() {
        // 23:00 UTC on Dec 31 is already January in Tokyo
        let d = date(2013, 12, 31, 23);
        assert_eq!(canonical_path(&d, "x", &Tz::UTC), "/2013/12/x/");
        assert_eq!(canonical_path(&d, "x", &chrono_tz::Asia::Tokyo), "/2014/1/x/");
    }

    #[test]
    fn test_parse_roundtrip() {
        let d = date(2013, 12, 28, 12);
        let path = canonical_path(&d, "my-first-post", &Tz::UTC);
        let parsed = parse(&path).unwrap();
        assert_eq!(parsed.year, 2013);
        assert_eq!(parsed.month, 12);
        assert_eq!(parsed.slug, "my-first-post");
        assert!(parsed.matches(&d, "my-first-post", &Tz::UTC));
    }

    #[test]
    fn test_parse_lenient_and_invalid() {
        assert_eq!(parse("/2014/01/x/").unwrap().month, 1);
        assert!(parse("/2014/1/x").is_some());
        assert!(parse("/2014/13/x/").is_none());
        assert!(parse("/2014/0/x/").is_none());
        assert!(parse("/14/1/x/").is_none());
        assert!(parse("/category/python/").is_none());
        assert!(parse("/2014/1/x/extra/").is_none());
        assert!(parse("/2014/1/bad slug/").is_none());
        assert!(parse("2014/1/x/").is_none());
    }
}
