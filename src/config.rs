use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};

pub const HLTV_URL: &str = "https://www.hltv.org";
pub const RESULTS_PATH: &str = "/results";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Pipeline stages. The derived order is the order they run in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    List,
    Download,
    Extract,
    Upload,
}

impl Stage {
    /// Stages that need the match list of a team.
    pub fn needs_matches(self) -> bool {
        matches!(self, Stage::List | Stage::Download)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub results_path: String,
    pub team: Option<String>,
    pub directory: PathBuf,
    pub replays: usize,
    pub upload_url: Option<String>,
    pub timeout: Duration,
    pub stages: BTreeSet<Stage>,
}

impl Config {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Config {
            base_url: HLTV_URL.to_string(),
            results_path: RESULTS_PATH.to_string(),
            team: None,
            directory: directory.into(),
            replays: 1,
            upload_url: None,
            timeout: DEFAULT_TIMEOUT,
            stages: BTreeSet::new(),
        }
    }

    /// Rejects a stage selection that lacks the settings it runs on.
    pub fn validate(&self) -> Result<()> {
        if self.wants_matches() && self.team.is_none() {
            return Err(Error::Config("Listing or downloading needs a team".to_string()));
        }
        if self.wants(Stage::Upload) && self.upload_url.is_none() {
            return Err(Error::Config("Uploading needs an upload url".to_string()));
        }
        Ok(())
    }

    pub fn wants(&self, stage: Stage) -> bool {
        self.stages.contains(&stage)
    }

    pub fn wants_matches(&self) -> bool {
        self.stages.iter().any(|stage| stage.needs_matches())
    }
}
