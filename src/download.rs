use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tokio::fs;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::model::{archive_file_name, Match, Outcome, Summary, ARCHIVE_EXTENSION};
use crate::service::MatchSource;

pub const NO_DEMO: &str = "No Demo File Yet";

pub struct ReplayDownloader<'a> {
    source: &'a dyn MatchSource,
    team: &'a str,
    directory: &'a Path,
}

impl<'a> ReplayDownloader<'a> {
    pub fn new(source: &'a dyn MatchSource, team: &'a str, directory: &'a Path) -> Self {
        ReplayDownloader { source, team, directory }
    }

    /// Prints date, demo url and slug of every match to stdout.
    pub async fn list(&self, matches: &[Match]) -> Summary {
        let mut summary = Summary::default();
        for hltv_match in matches {
            let result = self.list_match(hltv_match).await;
            summary.record(hltv_match.path(), result);
        }
        summary
    }

    async fn list_match(&self, hltv_match: &Match) -> Result<Outcome> {
        let date = self.source.match_date(hltv_match).await?;
        let demo_link = self.source.demo_link(hltv_match).await?;

        println!(
            "{date}\t{link}\t{slug}",
            link = demo_link.as_deref().unwrap_or(NO_DEMO),
            slug = hltv_match.slug()
        );
        Ok(Outcome::Completed)
    }

    /// Downloads the archives of the first `max_count` matches that are neither on disk yet nor
    /// unpublished. A failing match is recorded and the next one is attempted.
    pub async fn process(&self, matches: &[Match], max_count: usize) -> Summary {
        let mut summary = Summary::default();
        for hltv_match in matches.iter().take(max_count) {
            let result = self.download(hltv_match).await;
            summary.record(hltv_match.path(), result);
        }
        summary
    }

    async fn download(&self, hltv_match: &Match) -> Result<Outcome> {
        let slug = hltv_match.slug();

        if let Some(existing) = self.downloaded_archive(slug).await? {
            info!(match_slug = slug, file = %existing.display(), "[Skip] {slug} has already been downloaded, skipping.");
            return Ok(Outcome::Skipped);
        }

        let date = self.source.match_date(hltv_match).await?;
        let Some(demo_link) = self.source.demo_link(hltv_match).await? else {
            warn!(match_slug = slug, "[Skip] Skipping download for {slug}. Demo file not available yet.");
            return Ok(Outcome::Skipped);
        };

        fs::create_dir_all(self.directory)
            .await
            .map_err(|e| Error::filesystem(self.directory, e))?;

        let file_name = archive_file_name(self.team, &date, slug);
        let destination = self.directory.join(&file_name);

        info!(match_slug = slug, url = %demo_link, "[Download] Downloading {slug}...");
        let bytes = self.source.download_archive(&demo_link, &destination).await?;
        info!(file = %file_name, bytes, "[Download] {file_name} has finished downloading.");

        Ok(Outcome::Completed)
    }

    /// Archive of this team and match already in the directory, whatever date it was named with.
    /// Looking at the directory alone keeps a re-run free of requests for matches already fetched.
    async fn downloaded_archive(&self, slug: &str) -> Result<Option<PathBuf>> {
        let mut entries = match fs::read_dir(self.directory).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::filesystem(self.directory, e)),
        };

        let prefix = format!("{team}_", team = self.team);
        let suffix = format!("_{slug}.{ARCHIVE_EXTENSION}");

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Error::filesystem(self.directory, e))?
        {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };

            let date = name
                .strip_prefix(&prefix)
                .and_then(|rest| rest.strip_suffix(&suffix));
            if let Some(date) = date {
                if NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok() {
                    return Ok(Some(entry.path()));
                }
            }
        }
        Ok(None)
    }
}
