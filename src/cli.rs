use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, ArgGroup, Parser};
use demo_scraper::config::HLTV_URL;
use demo_scraper::{Config, Stage};

/// Finds the latest matches of a team on hltv.org, downloads their demo archives, extracts the
/// replays and uploads them to a replay store. Every stage skips what it has already done, so
/// running it again only picks up new matches, archives and replays.
#[derive(Parser, Debug)]
#[clap(group(
  ArgGroup::new("mode")
    .required(true)
    .multiple(true)
    .args(&["team", "extract", "upload"])
))]
pub(crate) struct Cli {
  /// Team id on hltv.org, as found in the team page url (e.g. `6667` for
  /// `hltv.org/team/6667/faze`). Needed for `--list` and `--download`.
  #[clap(long)]
  pub(crate) team: Option<String>,
  /// Directory the archives are downloaded to and extracted in. `--extract` and `--upload` scan
  /// it for archives and replays downloaded earlier.
  #[clap(long)]
  pub(crate) directory: PathBuf,
  /// Number of the team's most recent matches to list or download.
  #[clap(long, default_value = "1")]
  pub(crate) replays: usize,
  /// Print date, demo link and name of the matches.
  #[clap(long, requires = "team")]
  pub(crate) list: bool,
  /// Download the demo archives of the matches.
  #[clap(long, requires = "team")]
  pub(crate) download: bool,
  /// Extract all archives in the directory.
  #[clap(long)]
  pub(crate) extract: bool,
  /// Upload all replays in the directory.
  #[clap(long, requires = "upload_url")]
  pub(crate) upload: bool,
  /// Endpoint that checks replay hashes and hands out temporary upload urls.
  #[clap(long = "upload_url", env = "DEMO_UPLOAD_URL")]
  pub(crate) upload_url: Option<String>,
  /// Root of the site the matches are scraped from.
  #[clap(long, env = "HLTV_BASE_URL", default_value = HLTV_URL)]
  pub(crate) base_url: String,
  /// Seconds a single request may take.
  #[clap(long, default_value = "30")]
  pub(crate) timeout: u64,
  /// More output (`-v` debug, `-vv` trace). `RUST_LOG` takes precedence.
  #[clap(short, long, action = ArgAction::Count)]
  pub(crate) verbose: u8,
  /// Only report errors.
  #[clap(short, long, conflicts_with = "verbose")]
  pub(crate) quiet: bool,
}

impl Cli {
  pub(crate) fn log_level(&self) -> &'static str {
    if self.quiet {
      return "error";
    }
    match self.verbose {
      0 => "info",
      1 => "debug",
      _ => "trace",
    }
  }

  pub(crate) fn into_config(self) -> Config {
    let requested = [
      (self.list, Stage::List),
      (self.download, Stage::Download),
      (self.extract, Stage::Extract),
      (self.upload, Stage::Upload),
    ];

    let mut config = Config::new(self.directory);
    config.base_url = self.base_url;
    config.team = self.team;
    config.replays = self.replays;
    config.upload_url = self.upload_url;
    config.timeout = Duration::from_secs(self.timeout);
    config.stages = requested
      .into_iter()
      .filter_map(|(wanted, stage)| wanted.then_some(stage))
      .collect();
    config
  }
}
