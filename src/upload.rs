use std::path::Path;

use reqwest::header::CONTENT_LENGTH;
use reqwest::{Body, Client, StatusCode, Url};
use sha1::{Digest, Sha1};
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::extract::files_with_extension;
use crate::model::{Outcome, ReplayCheck, Summary, UploadCheck, ALREADY_EXISTS, REPLAY_EXTENSION};

pub const CHUNK_SIZE: usize = 1024;

/// Hex SHA-1 of a file, read `CHUNK_SIZE` bytes at a time.
pub async fn content_hash(path: &Path) -> Result<String> {
    let mut file = File::open(path)
        .await
        .map_err(|e| Error::filesystem(path, e))?;

    let mut hasher = Sha1::new();
    let mut chunk = [0u8; CHUNK_SIZE];
    loop {
        let read = file
            .read(&mut chunk)
            .await
            .map_err(|e| Error::filesystem(path, e))?;
        if read == 0 {
            break;
        }
        hasher.update(&chunk[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}

pub struct ReplayUploader {
    client: Client,
    upload_url: String,
}

impl ReplayUploader {
    pub fn new(client: Client, upload_url: impl Into<String>) -> Self {
        ReplayUploader { client, upload_url: upload_url.into() }
    }

    /// Offers every replay in `directory` to the upload service. Replays it already knows are
    /// skipped, the others are sent to the temporary url it hands out.
    pub async fn run(&self, directory: &Path) -> Summary {
        let mut summary = Summary::default();

        let replays = match files_with_extension(directory, REPLAY_EXTENSION) {
            Ok(replays) => replays,
            Err(error) => {
                summary.record(&directory.display().to_string(), Err(error));
                return summary;
            }
        };

        for replay in replays {
            let name = replay
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            let result = self.upload(&replay, &name).await;
            summary.record(&name, result);
        }
        summary
    }

    async fn upload(&self, replay: &Path, name: &str) -> Result<Outcome> {
        let sha1 = content_hash(replay).await?;

        info!(file = name, sha1 = %sha1, "[Check] if {name} already exists.");
        match self.check(&sha1).await? {
            UploadCheck::AlreadyExists => {
                info!(file = name, "[Skip] {name}. {ALREADY_EXISTS}.");
                Ok(Outcome::Skipped)
            }
            UploadCheck::TempUrl(temp_url) => {
                info!(file = name, "[Tempurl] Swift tempurl created for {name}.");
                debug!(file = name, temp_url = %temp_url);
                self.put(replay, name, &temp_url).await
            }
        }
    }

    async fn check(&self, sha1: &str) -> Result<UploadCheck> {
        let response = self
            .client
            .post(&self.upload_url)
            .form(&ReplayCheck::from(sha1))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        match body.parse::<UploadCheck>() {
            Ok(UploadCheck::AlreadyExists) => Ok(UploadCheck::AlreadyExists),
            _ if !status.is_success() => Err(Error::Fetch { url: self.upload_url.clone(), status }),
            check => check,
        }
    }

    async fn put(&self, replay: &Path, name: &str, temp_url: &str) -> Result<Outcome> {
        let temp_url = Url::parse(temp_url)
            .map_err(|e| Error::Protocol(format!("Invalid tempurl from upload service: {e}")))?;
        let file = File::open(replay)
            .await
            .map_err(|e| Error::filesystem(replay, e))?;
        let length = file
            .metadata()
            .await
            .map_err(|e| Error::filesystem(replay, e))?
            .len();

        info!(file = name, bytes = length, "[Upload] Uploading {name} to swift.");
        let response = self
            .client
            .put(temp_url.clone())
            .header(CONTENT_LENGTH, length)
            .body(Body::from(file))
            .send()
            .await?;

        match response.status() {
            StatusCode::CREATED => {
                info!(file = name, "[Upload] Upload for {name} succeeded.");
                Ok(Outcome::Completed)
            }
            status => {
                warn!(file = name, status = status.as_u16(), "[Upload] Upload for {name} was not successful.");
                Err(Error::Fetch { url: without_signature(temp_url), status })
            }
        }
    }
}

/// Temporary urls carry their signature in the query, which should not end up in logs.
fn without_signature(mut url: Url) -> String {
    url.set_query(None);
    url.into()
}
