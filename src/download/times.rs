//! Restoring server timestamps on downloaded files.

use std::fs::FileTimes;
use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, NaiveDateTime, Utc};

/// Format of `created_at` / `updated_at` in API responses.
pub const SERVER_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Parses a server timestamp as UTC.
///
/// Returns `None` for anything not in [`SERVER_TIME_FORMAT`].
#[must_use]
pub fn parse_server_time(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, SERVER_TIME_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Timestamps to apply to one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileTimestamps {
    /// Creation time, applied where the platform supports it.
    pub created: Option<DateTime<Utc>>,
    /// Modification (and access) time.
    pub modified: Option<DateTime<Utc>>,
}

/// Applies `timestamps` to the file at `path`.
///
/// Modification and access time are set everywhere. Creation time is only
/// settable on Windows and macOS; on other platforms it is skipped.
///
/// # Errors
///
/// Returns the IO error from opening the file or setting its times.
pub fn apply_timestamps(path: &Path, timestamps: FileTimestamps) -> std::io::Result<()> {
    let mut times = FileTimes::new();
    let mut touched = false;

    if let Some(modified) = timestamps.modified {
        let modified = SystemTime::from(modified);
        times = times.set_modified(modified).set_accessed(modified);
        touched = true;
    }
    if let Some(created) = timestamps.created {
        touched |= set_created(&mut times, SystemTime::from(created));
    }

    if !touched {
        return Ok(());
    }

    let file = std::fs::File::options().write(true).open(path)?;
    file.set_times(times)
}

#[cfg(windows)]
fn set_created(times: &mut FileTimes, created: SystemTime) -> bool {
    use std::os::windows::fs::FileTimesExt;
    *times = times.set_created(created);
    true
}

#[cfg(target_os = "macos")]
fn set_created(times: &mut FileTimes, created: SystemTime) -> bool {
    use std::os::macos::fs::FileTimesExt;
    *times = times.set_created(created);
    true
}

#[cfg(not(any(windows, target_os = "macos")))]
fn set_created(_times: &mut FileTimes, _created: SystemTime) -> bool {
    tracing::debug!("creation time is not settable on this platform; skipping");
    false
}
