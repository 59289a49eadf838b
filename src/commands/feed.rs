//! Print the RSS feed

use anyhow::Result;

use crate::feed::generate_feed;
use crate::Blog;

/// Write the feed of the `limit` most recent posts to stdout
pub fn run(blog: &Blog, limit: Option<usize>) -> Result<()> {
    let store = blog.open_store()?;
    let document = generate_feed(&store, &blog.config, limit);
    print!("{}", document.to_rss());
    Ok(())
}
