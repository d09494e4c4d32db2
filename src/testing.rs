//! In-memory stand-ins for the site and the archive library.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::extract::{ArchiveMember, ArchiveReader, MemberAction, MemberVisitor};
use crate::model::Match;
use crate::service::MatchSource;

/// Matches in discovery order with their date and optional demo link. Every call counts as one
/// request; downloaded archives contain their url.
#[derive(Default)]
pub(crate) struct FakeSource {
    matches: Vec<String>,
    dates: HashMap<String, String>,
    demos: HashMap<String, String>,
    requests: AtomicUsize,
}

impl FakeSource {
    pub(crate) fn with_match(mut self, path: &str, date: &str, demo: Option<&str>) -> Self {
        self.matches.push(path.to_string());
        self.dates.insert(path.to_string(), date.to_string());
        if let Some(demo) = demo {
            self.demos.insert(path.to_string(), demo.to_string());
        }
        self
    }

    pub(crate) fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    fn count(&self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl MatchSource for FakeSource {
    async fn discover(&self, _team: &str) -> Result<Vec<Match>> {
        self.count();
        Ok(self.matches.iter().map(Match::new).collect())
    }

    async fn demo_link(&self, hltv_match: &Match) -> Result<Option<String>> {
        self.count();
        Ok(self.demos.get(hltv_match.path()).cloned())
    }

    async fn match_date(&self, hltv_match: &Match) -> Result<String> {
        self.count();
        self.dates
            .get(hltv_match.path())
            .cloned()
            .ok_or_else(|| Error::Parse(format!("No match date found on {}", hltv_match.path())))
    }

    async fn download_archive(&self, url: &str, destination: &Path) -> Result<u64> {
        self.count();
        fs::write(destination, url).map_err(|e| Error::filesystem(destination, e))?;
        Ok(url.len() as u64)
    }
}

/// Archives keyed by file name, each a list of (member path, content).
#[derive(Default)]
pub(crate) struct FakeReader {
    archives: HashMap<String, Vec<(&'static str, &'static str)>>,
}

impl FakeReader {
    pub(crate) fn with_archive(mut self, name: &str, members: Vec<(&'static str, &'static str)>) -> Self {
        self.archives.insert(name.to_string(), members);
        self
    }
}

impl ArchiveReader for FakeReader {
    fn extract_members(
        &self,
        archive: &Path,
        destination: &Path,
        visitor: &mut dyn MemberVisitor,
    ) -> Result<()> {
        let name = archive
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default();
        let members = self
            .archives
            .get(name)
            .ok_or_else(|| Error::Archive(format!("{name}: not a RAR archive")))?;

        for (path, content) in members {
            let member = ArchiveMember { path: PathBuf::from(path), is_directory: false };
            if visitor.decide(&member)? == MemberAction::Extract {
                let target = destination.join(path);
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent).map_err(|e| Error::filesystem(parent, e))?;
                }
                fs::write(&target, content).map_err(|e| Error::filesystem(&target, e))?;
                visitor.extracted(&member);
            }
        }
        Ok(())
    }
}

/// Relative path and content of every file below `directory`, sorted.
pub(crate) fn file_set(directory: &Path) -> Vec<(String, Vec<u8>)> {
    let mut files = Vec::new();
    let mut pending = vec![directory.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                pending.push(path);
            } else {
                let relative = path.strip_prefix(directory).unwrap().display().to_string();
                files.push((relative, fs::read(&path).unwrap()));
            }
        }
    }
    files.sort();
    files
}
