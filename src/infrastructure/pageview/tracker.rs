//! Daily page-view log with salted, hashed visitor fingerprints.
//!
//! Lines look like:
//!
//! ```text
//! https://example.com/page 2025-01-31 14:05:09 9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08
//! ```
//!
//! The hash covers `ip + user_agent + salt`. The salt rotates once per day,
//! so fingerprints can be correlated within a day but not across days. It is
//! kept in its own file outside the log directory; whoever holds both can
//! recompute the day's fingerprints.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tokio_retry::Retry;
use tokio_retry::strategy::FixedInterval;
use tracing::{debug, info};

use crate::domain::pageview_event::{PageViewEvent, PageViewSink};

/// Length of the daily salt.
pub const SALT_LENGTH: usize = 32;

/// Stand-in user agent for requests that did not send one.
pub const FALLBACK_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/87.0.4280.88 Safari/537.36";

/// Default location of the daily salt, relative to the working directory.
pub const DEFAULT_SALT_FILE: &str = "salt.txt";

const WRITE_RETRY_INTERVAL_MS: u64 = 100;
const WRITE_RETRY_ATTEMPTS: usize = 10;

#[derive(Debug)]
struct DailySalt {
    value: String,
    day: NaiveDate,
}

/// [`PageViewSink`] appending to `pageviews.YYYY-MM-DD.log` files.
pub struct FilePageViewTracker {
    log_dir: PathBuf,
    salt_path: PathBuf,
    salt: Mutex<Option<DailySalt>>,
}

impl FilePageViewTracker {
    /// Creates the log directory and the salt file's parent if needed.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if a directory cannot be created, or
    /// `InvalidInput` if `salt_path` lies inside `log_dir`.
    pub async fn new(
        log_dir: impl Into<PathBuf>,
        salt_path: impl Into<PathBuf>,
    ) -> io::Result<Self> {
        let log_dir = log_dir.into();
        let salt_path = salt_path.into();

        if salt_path.starts_with(&log_dir) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "salt file {} must not be inside the log directory {}",
                    salt_path.display(),
                    log_dir.display()
                ),
            ));
        }

        fs::create_dir_all(&log_dir).await?;
        if let Some(parent) = salt_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        info!(
            dir = %log_dir.display(),
            salt = %salt_path.display(),
            "Page-view log directory ready"
        );

        Ok(Self {
            log_dir,
            salt_path,
            salt: Mutex::new(None),
        })
    }

    /// Path of the log file for `day`.
    pub fn log_path(&self, day: NaiveDate) -> PathBuf {
        self.log_dir
            .join(format!("pageviews.{}.log", day.format("%Y-%m-%d")))
    }

    /// Returns the salt for `now`'s day, loading or rotating it as needed.
    async fn salt_for(&self, now: DateTime<Utc>) -> io::Result<String> {
        let today = now.date_naive();
        let mut guard = self.salt.lock().await;

        if let Some(salt) = guard.as_ref()
            && salt.day == today
        {
            return Ok(salt.value.clone());
        }

        let salt = match load_salt(&self.salt_path, today).await? {
            Some(existing) => existing,
            None => {
                let fresh = generate_salt();
                fs::write(&self.salt_path, &fresh).await?;
                debug!(day = %today, "Rotated page-view salt");
                fresh
            }
        };

        *guard = Some(DailySalt {
            value: salt.clone(),
            day: today,
        });
        Ok(salt)
    }

    /// Formats the log line for an event under the given salt.
    pub fn format_line(event: &PageViewEvent, salt: &str) -> String {
        let ip = event.ip.as_deref().unwrap_or_default();
        let user_agent = match event.user_agent.as_deref() {
            Some(ua) if !ua.trim().is_empty() => ua,
            _ => FALLBACK_USER_AGENT,
        };

        format!(
            "{} {} {}\n",
            event.long_url,
            event.at.format("%Y-%m-%d %H:%M:%S"),
            fingerprint(ip, user_agent, salt)
        )
    }
}

#[async_trait]
impl PageViewSink for FilePageViewTracker {
    async fn record(&self, event: &PageViewEvent) -> io::Result<()> {
        let salt = self.salt_for(event.at).await?;
        let line = Self::format_line(event, &salt);
        let path = self.log_path(event.at.date_naive());

        let strategy = FixedInterval::from_millis(WRITE_RETRY_INTERVAL_MS).take(WRITE_RETRY_ATTEMPTS);
        Retry::start(strategy, || append_line(&path, &line)).await
    }
}

/// Lowercase hex SHA-256 of `ip + user_agent + salt`.
pub fn fingerprint(ip: &str, user_agent: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(ip.as_bytes());
    hasher.update(user_agent.as_bytes());
    hasher.update(salt.as_bytes());
    hex::encode(hasher.finalize())
}

/// Generates a salt of printable ASCII characters (codes 33..126).
pub fn generate_salt() -> String {
    let mut rng = rand::rng();
    (0..SALT_LENGTH)
        .map(|_| rng.random_range(33u8..126u8) as char)
        .collect()
}

/// Reads the persisted salt if it is well-formed and was written on `today`.
async fn load_salt(path: &Path, today: NaiveDate) -> io::Result<Option<String>> {
    let metadata = match fs::metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };

    let written: DateTime<Utc> = metadata.modified()?.into();
    if written.date_naive() != today {
        return Ok(None);
    }

    let salt = fs::read_to_string(path).await?;
    Ok((salt.len() == SALT_LENGTH).then_some(salt))
}

async fn append_line(path: &Path, line: &str) -> io::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(line.as_bytes()).await?;
    file.flush().await
}
