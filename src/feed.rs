//! RSS feed generation.
//!
//! When `[feed] enabled = true`, `feed.xml` lists the `feed.limit` most
//! recently created pages with their preview text as description. Links
//! are absolute: `feed.site_url` joined with the page's web path under the
//! webroot.

use crate::build::{Aggregate, RecentEntry};
use crate::site::Site;
use chrono::{DateTime, Utc};
use rss::{ChannelBuilder, GuidBuilder, ItemBuilder, validation::Validate};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name of the feed below the output root.
pub const FEED_FILE: &str = "feed.xml";

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("feed.site_url is not set")]
    MissingSiteUrl,
    #[error("RSS validation failed: {0}")]
    Validation(String),
}

/// Render the feed XML.
pub fn feed_xml(site: &Site, aggregate: &Aggregate) -> Result<String, FeedError> {
    let feed = &site.config.feed;
    let base = feed
        .site_url
        .as_deref()
        .filter(|u| !u.is_empty())
        .ok_or(FeedError::MissingSiteUrl)?;
    let base = base.trim_end_matches('/');

    let items: Vec<rss::Item> = aggregate
        .recent
        .iter()
        .take(feed.limit)
        .map(|entry| to_item(entry, &absolute_url(base, &site.href(&entry.web_path))))
        .collect();

    let channel = ChannelBuilder::default()
        .title(site.config.site_title.clone())
        .link(absolute_url(base, &site.config.webroot))
        .description(feed.description.clone())
        .generator(Some(format!("notegarden {}", env!("CARGO_PKG_VERSION"))))
        .items(items)
        .build();

    channel
        .validate()
        .map_err(|e| FeedError::Validation(e.to_string()))?;
    Ok(channel.to_string())
}

/// Write `feed.xml`. Returns the number of items.
pub fn write_feed(site: &Site, aggregate: &Aggregate, output: &Path) -> Result<usize, FeedError> {
    let xml = feed_xml(site, aggregate)?;
    fs::create_dir_all(output)?;
    fs::write(output.join(FEED_FILE), xml)?;
    Ok(aggregate.recent.len().min(site.config.feed.limit))
}

fn absolute_url(base: &str, path: &str) -> String {
    format!("{base}/{}", path.trim_start_matches('/'))
}

fn to_item(entry: &RecentEntry, link: &str) -> rss::Item {
    let pub_date = DateTime::<Utc>::from(entry.created).to_rfc2822();
    ItemBuilder::default()
        .title(Some(entry.title.clone()))
        .link(Some(link.to_string()))
        .guid(Some(
            GuidBuilder::default()
                .permalink(true)
                .value(link.to_string())
                .build(),
        ))
        .description((!entry.preview.is_empty()).then(|| entry.preview.clone()))
        .pub_date(Some(pub_date))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use std::path::PathBuf;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn site(limit: usize) -> Site {
        let mut config = SiteConfig::default();
        config.webroot = "/garden/".to_string();
        config.feed.enabled = true;
        config.feed.site_url = Some("https://example.com/".to_string());
        config.feed.limit = limit;
        Site::new(config, PathBuf::from("/vault"))
    }

    fn aggregate() -> Aggregate {
        let entry = |title: &str, secs: u64, preview: &str| RecentEntry {
            title: title.to_string(),
            web_path: format!("notes/{title}.html"),
            created: SystemTime::UNIX_EPOCH + Duration::from_secs(secs),
            preview: preview.to_string(),
        };
        Aggregate {
            tags: Default::default(),
            recent: vec![entry("new", 86_400, "Fresh <thoughts>"), entry("old", 0, "")],
        }
    }

    #[test]
    fn feed_lists_recent_pages_with_absolute_links() {
        let xml = feed_xml(&site(20), &aggregate()).unwrap();
        let channel = rss::Channel::read_from(xml.as_bytes()).unwrap();

        assert_eq!(channel.title(), "Notes");
        assert_eq!(channel.link(), "https://example.com/garden/");
        assert_eq!(channel.items().len(), 2);

        let first = &channel.items()[0];
        assert_eq!(first.title(), Some("new"));
        assert_eq!(first.link(), Some("https://example.com/garden/notes/new.html"));
        assert_eq!(first.description(), Some("Fresh <thoughts>"));
        let date = DateTime::parse_from_rfc2822(first.pub_date().unwrap()).unwrap();
        assert_eq!(date.timestamp(), 86_400);
        assert!(channel.items()[1].description().is_none());
    }

    #[test]
    fn feed_respects_limit() {
        let xml = feed_xml(&site(1), &aggregate()).unwrap();
        let channel = rss::Channel::read_from(xml.as_bytes()).unwrap();
        assert_eq!(channel.items().len(), 1);
    }

    #[test]
    fn missing_site_url_is_error() {
        let mut site = site(20);
        site.config.feed.site_url = None;
        assert!(matches!(
            feed_xml(&site, &aggregate()),
            Err(FeedError::MissingSiteUrl)
        ));
    }

    #[test]
    fn write_feed_creates_file() {
        let out = TempDir::new().unwrap();
        let items = write_feed(&site(20), &aggregate(), out.path()).unwrap();
        assert_eq!(items, 2);
        assert!(out.path().join(FEED_FILE).exists());
    }
}
