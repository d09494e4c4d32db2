use std::str::FromStr;

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};

pub const ARCHIVE_EXTENSION: &str = "rar";
pub const REPLAY_EXTENSION: &str = "dem";

/// Game tag sent along with every dedupe check.
pub const GAME: &str = "cs:go";
/// Body the upload service answers with when it already stores a replay.
pub const ALREADY_EXISTS: &str = "Replay sha1 already exists";

/// A match as linked from a team's results page, e.g. `/matches/2365271/faze-vs-navi-major`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    path: String,
}

impl Match {
    pub fn new(path: impl Into<String>) -> Self {
        Match { path: path.into() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Last path segment of the match link.
    pub fn slug(&self) -> &str {
        self.path
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
    }
}

/// Name under which the archive of a match is stored. Doubles as the download dedupe key, so it
/// must only depend on its inputs.
pub fn archive_file_name(team: &str, date: &str, match_slug: &str) -> String {
    format!("{team}_{date}_{match_slug}.{ARCHIVE_EXTENSION}")
}

/// Converts the millisecond timestamp found on a match page into `YYYY-MM-DD` (UTC).
pub fn match_date(timestamp: &str) -> Result<String> {
    let millis = timestamp
        .trim()
        .parse::<i64>()
        .map_err(|e| Error::Parse(format!("Invalid match timestamp `{timestamp}`: {e}")))?;

    DateTime::from_timestamp_millis(millis)
        .map(|date| date.format("%Y-%m-%d").to_string())
        .ok_or_else(|| Error::Parse(format!("Match timestamp `{timestamp}` is out of range")))
}

#[derive(Debug, Serialize)]
pub struct ReplayCheck<'a> {
    pub(crate) game: &'a str,
    pub(crate) replay_sha1sum: &'a str,
}

impl ReplayCheck<'_> {
    pub(crate) fn from(sha1: &str) -> ReplayCheck<'_> {
        ReplayCheck { game: GAME, replay_sha1sum: sha1 }
    }
}

#[derive(Debug, Deserialize)]
pub struct TempUrl {
    pub(crate) tempurl: String,
}

/// Answer to a dedupe check.
#[derive(Debug, PartialEq, Eq)]
pub enum UploadCheck {
    AlreadyExists,
    TempUrl(String),
}

impl FromStr for UploadCheck {
    type Err = Error;

    fn from_str(body: &str) -> Result<Self> {
        if body == ALREADY_EXISTS {
            return Ok(UploadCheck::AlreadyExists);
        }

        serde_json::from_str::<TempUrl>(body)
            .map(|temp_url| UploadCheck::TempUrl(temp_url.tempurl))
            .map_err(|e| Error::Protocol(format!("Unexpected dedupe check answer `{body}`: {e}")))
    }
}

/// How a single match, archive member or replay file was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Skipped,
}

#[derive(Debug)]
pub struct Failure {
    pub item: String,
    pub error: Error,
}

/// Tally of a run. Items that failed are kept so the caller can decide on the exit code.
#[derive(Debug, Default)]
pub struct Summary {
    pub completed: usize,
    pub skipped: usize,
    pub failures: Vec<Failure>,
}

impl Summary {
    pub fn record(&mut self, item: &str, result: Result<Outcome>) {
        match result {
            Ok(Outcome::Completed) => self.completed += 1,
            Ok(Outcome::Skipped) => self.skipped += 1,
            Err(error) => {
                warn!(item, %error, "[Error] {item} failed");
                self.failures.push(Failure { item: item.to_string(), error });
            }
        }
    }

    pub fn merge(&mut self, other: Summary) {
        self.completed += other.completed;
        self.skipped += other.skipped;
        self.failures.extend(other.failures);
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_match_path_when_slug_then_last_segment() {
        let hltv_match = Match::new("/matches/2365271/faze-vs-navi-major");

        assert_eq!(hltv_match.slug(), "faze-vs-navi-major");
        assert_eq!(Match::new("/matches/1-a/").slug(), "1-a");
    }

    #[test]
    fn given_same_inputs_when_archive_file_name_then_same_name() {
        let first = archive_file_name("teamX", "2023-05-01", "1-a");
        let second = archive_file_name("teamX", "2023-05-01", "1-a");

        assert_eq!(first, "teamX_2023-05-01_1-a.rar");
        assert_eq!(first, second);
    }

    #[test]
    fn given_millis_when_match_date_then_utc_calendar_date() {
        // 2023-05-01T12:00:00Z
        assert_eq!(match_date("1682942400000").unwrap(), "2023-05-01");
        // 2023-05-01T23:59:59.999Z stays on the same day
        assert_eq!(match_date("1682985599999").unwrap(), "2023-05-01");
    }

    #[test]
    fn given_garbage_when_match_date_then_parse_error() {
        assert!(matches!(match_date("tomorrow"), Err(Error::Parse(_))));
    }

    #[test]
    fn given_sentinel_when_parse_upload_check_then_already_exists() {
        assert_eq!(ALREADY_EXISTS.parse::<UploadCheck>().unwrap(), UploadCheck::AlreadyExists);
    }

    #[test]
    fn given_tempurl_json_when_parse_upload_check_then_temp_url() {
        let check = r#"{"tempurl": "https://swift.example/v1/demos/abc?temp_url_sig=1"}"#
            .parse::<UploadCheck>()
            .unwrap();

        assert_eq!(
            check,
            UploadCheck::TempUrl("https://swift.example/v1/demos/abc?temp_url_sig=1".to_string())
        );
    }

    #[test]
    fn given_unknown_body_when_parse_upload_check_then_protocol_error() {
        assert!(matches!("Internal error".parse::<UploadCheck>(), Err(Error::Protocol(_))));
        assert!(matches!(r#"{"url": "x"}"#.parse::<UploadCheck>(), Err(Error::Protocol(_))));
    }

    #[test]
    fn given_mixed_results_when_record_then_tally_and_keep_failures() {
        let mut summary = Summary::default();

        summary.record("a", Ok(Outcome::Completed));
        summary.record("b", Ok(Outcome::Skipped));
        summary.record("c", Err(Error::Parse("missing".to_string())));

        assert_eq!(summary.completed, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].item, "c");
        assert!(summary.has_failures());
    }
}
