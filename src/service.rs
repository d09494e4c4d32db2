use std::path::Path;

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::markup::{HtmlQuery, MarkupQuery, DATA_UNIX, DEMO_LINKS, HREF, MATCH_DATE, MATCH_LINKS};
use crate::model::{self, Match};
use crate::progress::SpinnerHelper;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Everything the download stage needs to know about matches on the site.
#[async_trait]
pub trait MatchSource: Send + Sync {
    /// Match links on the results page of `team`, in page order. A team without results yields
    /// an empty list.
    async fn discover(&self, team: &str) -> Result<Vec<Match>>;

    /// Absolute url of the demo archive of a match, `None` while it is not published.
    async fn demo_link(&self, hltv_match: &Match) -> Result<Option<String>>;

    /// Day the match was played on, `YYYY-MM-DD`.
    async fn match_date(&self, hltv_match: &Match) -> Result<String>;

    /// Streams the archive at `url` into `destination` and returns the number of bytes written.
    async fn download_archive(&self, url: &str, destination: &Path) -> Result<u64>;
}

pub struct HltvService<Q = HtmlQuery> {
    client: Client,
    base_url: Url,
    results_path: String,
    query: Q,
}

impl HltvService<HtmlQuery> {
    pub fn new(config: &Config) -> Result<Self> {
        HltvService::with_client(http_client(config)?, config, HtmlQuery)
    }
}

impl<Q: MarkupQuery> HltvService<Q> {
    pub fn with_client(client: Client, config: &Config, query: Q) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| Error::Config(format!("Invalid base url `{}`: {e}", config.base_url)))?;

        Ok(HltvService { client, base_url, results_path: config.results_path.clone(), query })
    }

    /// Resolves a link scraped from the site against the base url, like a browser would.
    pub fn url_for(&self, href: &str) -> Result<Url> {
        self.base_url
            .join(href)
            .map_err(|e| Error::Parse(format!("Invalid link `{href}`: {e}")))
    }

    async fn get_page(&self, url: &str, query: &[(&str, &str)]) -> Result<String> {
        let response = self.get(url, query).await?;
        Ok(response.text().await?)
    }

    async fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<Response> {
        debug!(url, "GET");
        let response = self.client.get(url).query(query).send().await?;

        match response.status() {
            status if status.is_success() => Ok(response),
            status => Err(Error::Fetch { url: url.to_string(), status }),
        }
    }

    async fn match_page(&self, hltv_match: &Match) -> Result<String> {
        let url = self.url_for(hltv_match.path())?;
        self.get_page(url.as_str(), &[]).await
    }
}

#[async_trait]
impl<Q: MarkupQuery> MatchSource for HltvService<Q> {
    async fn discover(&self, team: &str) -> Result<Vec<Match>> {
        let results_url = self.url_for(&self.results_path)?;
        let page = self
            .get_page(results_url.as_str(), &[("team", team)])
            .await?;

        Ok(self
            .query
            .attribute_values(&page, MATCH_LINKS, HREF)?
            .into_iter()
            .map(Match::new)
            .collect())
    }

    async fn demo_link(&self, hltv_match: &Match) -> Result<Option<String>> {
        let page = self.match_page(hltv_match).await?;

        self.query
            .attribute_values(&page, DEMO_LINKS, HREF)?
            .first()
            .map(|href| self.url_for(href).map(String::from))
            .transpose()
    }

    async fn match_date(&self, hltv_match: &Match) -> Result<String> {
        let page = self.match_page(hltv_match).await?;
        let timestamps = self.query.attribute_values(&page, MATCH_DATE, DATA_UNIX)?;

        match timestamps.first() {
            Some(timestamp) => model::match_date(timestamp),
            None => Err(Error::Parse(format!(
                "No match date found on {path}",
                path = hltv_match.path()
            ))),
        }
    }

    async fn download_archive(&self, url: &str, destination: &Path) -> Result<u64> {
        let mut response = self.get(url, &[]).await?;

        // Written under a temporary name so an aborted transfer never passes the dedupe check.
        let partial = destination.with_extension("part");
        let mut out = File::create(&partial)
            .await
            .map_err(|e| Error::filesystem(&partial, e))?;

        let spinner = SpinnerHelper::create(format!("Downloading {url}"));
        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            out.write_all(&chunk)
                .await
                .map_err(|e| Error::filesystem(&partial, e))?;
            written += chunk.len() as u64;
            spinner.inc(chunk.len() as u64);
        }
        out.flush().await.map_err(|e| Error::filesystem(&partial, e))?;
        drop(out);
        spinner.finish_and_clear();

        fs::rename(&partial, destination)
            .await
            .map_err(|e| Error::filesystem(destination, e))?;

        Ok(written)
    }
}

pub fn http_client(config: &Config) -> Result<Client> {
    Ok(Client::builder()
        .user_agent(USER_AGENT)
        .timeout(config.timeout)
        .build()?)
}
