use reqwest::Client;
use tracing::info;

use crate::config::{Config, Stage};
use crate::download::ReplayDownloader;
use crate::error::Result;
use crate::extract::{ArchiveExtractor, ArchiveReader, RarReader};
use crate::markup::HtmlQuery;
use crate::model::{Match, Summary};
use crate::service::{http_client, HltvService, MatchSource};
use crate::upload::ReplayUploader;

/// Runs the stages requested in `config` against hltv.org and the configured upload service.
pub async fn run(config: &Config) -> Result<Summary> {
    let client = http_client(config)?;
    let source = HltvService::with_client(client.clone(), config, HtmlQuery)?;

    Ok(Pipeline::new(config, &source, &RarReader, client)?.run().await)
}

pub struct Pipeline<'a> {
    config: &'a Config,
    source: &'a dyn MatchSource,
    reader: &'a dyn ArchiveReader,
    client: Client,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        config: &'a Config,
        source: &'a dyn MatchSource,
        reader: &'a dyn ArchiveReader,
        client: Client,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Pipeline { config, source, reader, client })
    }

    /// List and download share one bounded match list, then extraction and upload scan the
    /// directory. A failing item never stops the run, it ends up in the returned summary.
    pub async fn run(&self) -> Summary {
        let mut summary = Summary::default();

        if let Some(team) = self.config.team.as_deref().filter(|_| self.config.wants_matches()) {
            summary.merge(self.run_matches(team).await);
        }

        if self.config.wants(Stage::Extract) {
            summary.merge(ArchiveExtractor::new(self.reader).run(&self.config.directory));
        }

        if let Some(upload_url) = self.config.upload_url.as_deref().filter(|_| self.config.wants(Stage::Upload)) {
            let uploader = ReplayUploader::new(self.client.clone(), upload_url);
            summary.merge(uploader.run(&self.config.directory).await);
        }

        let (completed, skipped, failed) = (summary.completed, summary.skipped, summary.failures.len());
        info!(completed, skipped, failed, "[Done] {completed} completed, {skipped} skipped, {failed} failed.");
        summary
    }

    async fn run_matches(&self, team: &str) -> Summary {
        let mut summary = Summary::default();

        let matches: Vec<Match> = match self.source.discover(team).await {
            Ok(matches) => matches.into_iter().take(self.config.replays).collect(),
            Err(error) => {
                summary.record(team, Err(error));
                return summary;
            }
        };
        if matches.is_empty() {
            info!(team, "No matches found for team {team}.");
            return summary;
        }

        let downloader = ReplayDownloader::new(self.source, team, &self.config.directory);
        if self.config.wants(Stage::List) {
            summary.merge(downloader.list(&matches).await);
        }
        if self.config.wants(Stage::Download) {
            summary.merge(downloader.process(&matches, self.config.replays).await);
        }
        summary
    }
}
