use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use reqwest::header::LAST_MODIFIED;
use reqwest::redirect::Policy;
use reqwest::{Client, Response};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::RetryIf;
use tracing::{debug, warn};
use url::Url;

const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Downloads a remote file to a local path.
///
/// Implementations must fail on any non-success HTTP status, follow redirects, stay quiet
/// apart from errors, and give `dest` the remote modification time when the server reports one.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url, dest: &Path) -> Result<()>;
}

pub struct HttpFetcher {
    client: Client,
    retries: usize,
}

impl HttpFetcher {
    pub fn new(retries: usize) -> Result<Self> {
        let client = Client::builder()
            .redirect(Policy::limited(10))
            .user_agent(concat!("flutter-installer/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build http client")?;
        Ok(Self { client, retries })
    }

    async fn fetch_once(&self, url: &Url, dest: &Path) -> Result<()> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .context("failed to initiate download")?
            .error_for_status()
            .context("download request failed")?;

        let modified = last_modified(&response);

        let mut file = tokio::fs::File::create(dest)
            .await
            .with_context(|| format!("failed to create {}", dest.display()))?;
        let mut stream = response.bytes_stream();
        let mut written = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.context("download interrupted")?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        drop(file);

        debug!(bytes = written, path = %dest.display(), "download complete");

        if let Some(modified) = modified {
            if let Err(err) = set_modified(dest, modified) {
                warn!("could not set modification time on {}: {err:#}", dest.display());
            }
        }

        Ok(())
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url, dest: &Path) -> Result<()> {
        let mut attempt = 0;

        RetryIf::spawn(
            backoff().map(jitter).take(self.retries),
            || self.fetch_once(url, dest),
            |err: &anyhow::Error| {
                attempt += 1;
                let retry = should_retry(err, attempt, self.retries);
                if retry {
                    warn!(
                        "download of {url} failed (attempt {attempt} of {}), retrying: {err:#}",
                        self.retries + 1
                    );
                }
                retry
            },
        )
        .await
    }
}

/// 500ms, 1s, 2s, ... capped at `MAX_RETRY_DELAY`.
fn backoff() -> ExponentialBackoff {
    ExponentialBackoff::from_millis(2)
        .factor(250)
        .max_delay(MAX_RETRY_DELAY)
}

/// `attempt` counts failures so far; only the first `retries` of them are followed by another try.
fn should_retry(err: &anyhow::Error, attempt: usize, retries: usize) -> bool {
    attempt <= retries && is_transient(err)
}

/// Connection problems and server errors may go away; everything else will not.
fn is_transient(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<reqwest::Error>())
        .any(|err| {
            err.is_connect()
                || err.is_timeout()
                || err.status().is_some_and(|status| status.is_server_error())
        })
}

fn last_modified(response: &Response) -> Option<DateTime<Utc>> {
    let value = response.headers().get(LAST_MODIFIED)?.to_str().ok()?;
    parse_http_date(value)
}

fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value)
        .ok()
        .map(|date| date.with_timezone(&Utc))
}

fn set_modified(path: &Path, modified: DateTime<Utc>) -> Result<()> {
    let file = std::fs::File::options().write(true).open(path)?;
    file.set_modified(SystemTime::from(modified))?;
    Ok(())
}

/// Delegates to the host's `curl`.
pub struct CurlFetcher {
    curl: PathBuf,
    retries: usize,
}

impl CurlFetcher {
    pub fn locate(retries: usize) -> Result<Self> {
        let curl = which::which("curl").context("curl was not found on PATH")?;
        Ok(Self { curl, retries })
    }
}

#[async_trait]
impl Fetcher for CurlFetcher {
    async fn fetch(&self, url: &Url, dest: &Path) -> Result<()> {
        let mut command = Command::new(&self.curl);
        command
            .arg("--fail")
            .arg("--remote-time")
            .arg("--silent")
            .arg("--show-error")
            .arg("--location");
        if self.retries > 0 {
            command.arg("--retry").arg(self.retries.to_string());
        }
        command.arg("--output").arg(dest).arg(url.as_str());

        debug!(?command, "running curl");
        let output = command
            .output()
            .await
            .with_context(|| format!("failed to run {}", self.curl.display()))?;

        if !output.status.success() {
            bail!(
                "curl exited with status {}: {}",
                output
                    .status
                    .code()
                    .map_or_else(|| "unknown".to_string(), |code| code.to_string()),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }
}
