//! Configuration: optional config file, CLI overrides and resolved settings.
//!
//! The file lives at `$XDG_CONFIG_HOME/neat-mirror/config.toml` (falling back
//! to `$HOME/.config/neat-mirror/config.toml`) and holds simple
//! `key = value` lines:
//!
//! ```text
//! api_base = "https://duge.neat.com/cloud/"
//! max_attempts = 5              # 1..=20
//! download_connect_timeout_secs = 1
//! download_read_timeout_secs = 1
//! api_timeout_secs = 60
//! retry_base_delay_ms = 1000    # 0 disables backoff
//! state_dir = "/var/lib/neat-mirror"
//! ```
//!
//! Precedence is CLI flag, then file value, then built-in default.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::api::DEFAULT_API_BASE;
use crate::download::{DOWNLOAD_CONNECT_TIMEOUT_SECS, DOWNLOAD_READ_TIMEOUT_SECS};
use crate::sync::{DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS};

/// Name of the state directory created inside the destination by default.
pub const STATE_DIR_NAME: &str = ".neat-mirror";

/// Ledger file name inside the state directory.
const LEDGER_FILE_NAME: &str = "ledger.txt";

/// Run log directory name inside the state directory.
const LOG_DIR_NAME: &str = "logs";

/// Errors from loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    #[error("failed to read config file '{path}': {source}")]
    Read {
        /// Config file path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A line is not of the form `key = value`.
    #[error("invalid config syntax on line {line}: expected key = value")]
    Syntax {
        /// 1-indexed line number.
        line: usize,
    },

    /// The key is not a known setting.
    #[error("unknown configuration key '{key}' on line {line}")]
    UnknownKey {
        /// The unrecognized key.
        key: String,
        /// 1-indexed line number.
        line: usize,
    },

    /// The value could not be parsed for its key.
    #[error("invalid `{key}` value on line {line}: {message}")]
    InvalidValue {
        /// The key whose value is invalid.
        key: &'static str,
        /// 1-indexed line number.
        line: usize,
        /// What was expected.
        message: String,
    },

    /// The value parsed but lies outside the accepted range.
    #[error("invalid config value for `{key}`: {value}. Expected range: {range}")]
    OutOfRange {
        /// The key whose value is out of range.
        key: &'static str,
        /// The rejected value.
        value: u64,
        /// The accepted range, e.g. `1..=20`.
        range: &'static str,
    },
}

/// Values read from the config file. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    /// API base URL.
    pub api_base: Option<String>,
    /// Attempts per run (1..=20).
    pub max_attempts: Option<u32>,
    /// Payload connect timeout in seconds (1..=3600).
    pub download_connect_timeout_secs: Option<u64>,
    /// Payload idle read timeout in seconds (1..=3600).
    pub download_read_timeout_secs: Option<u64>,
    /// Listing call timeout in seconds (1..=3600); unset means no timeout.
    pub api_timeout_secs: Option<u64>,
    /// Backoff base delay in milliseconds (0..=60000).
    pub retry_base_delay_ms: Option<u64>,
    /// State directory holding the ledger and run logs.
    pub state_dir: Option<PathBuf>,
}

impl FileConfig {
    /// Parses config file contents.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for syntax errors, unknown keys, unparseable
    /// values and values outside their range.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let mut cfg = Self::default();
        for (index, raw_line) in raw.lines().enumerate() {
            let line = index + 1;
            let text = strip_inline_comment(raw_line).trim();
            if text.is_empty() {
                continue;
            }

            let Some((raw_key, raw_value)) = text.split_once('=') else {
                return Err(ConfigError::Syntax { line });
            };
            let value = raw_value.trim();

            match raw_key.trim() {
                "api_base" => cfg.api_base = Some(parse_string_literal("api_base", line, value)?),
                "max_attempts" => {
                    let parsed = parse_integer("max_attempts", line, value)?;
                    let attempts = u32::try_from(parsed).map_err(|_| ConfigError::OutOfRange {
                        key: "max_attempts",
                        value: parsed,
                        range: "1..=20",
                    })?;
                    cfg.max_attempts = Some(attempts);
                }
                "download_connect_timeout_secs" => {
                    cfg.download_connect_timeout_secs =
                        Some(parse_integer("download_connect_timeout_secs", line, value)?);
                }
                "download_read_timeout_secs" => {
                    cfg.download_read_timeout_secs =
                        Some(parse_integer("download_read_timeout_secs", line, value)?);
                }
                "api_timeout_secs" => {
                    cfg.api_timeout_secs = Some(parse_integer("api_timeout_secs", line, value)?);
                }
                "retry_base_delay_ms" => {
                    cfg.retry_base_delay_ms =
                        Some(parse_integer("retry_base_delay_ms", line, value)?);
                }
                "state_dir" => {
                    let parsed = parse_string_literal("state_dir", line, value)?;
                    cfg.state_dir = Some(PathBuf::from(parsed));
                }
                unknown => {
                    return Err(ConfigError::UnknownKey {
                        key: unknown.to_string(),
                        line,
                    });
                }
            }
        }
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validates every set value against its range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::OutOfRange`] for the first offending value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(attempts) = self.max_attempts {
            check_range("max_attempts", u64::from(attempts), 1, 20, "1..=20")?;
        }
        for (key, value) in [
            (
                "download_connect_timeout_secs",
                self.download_connect_timeout_secs,
            ),
            ("download_read_timeout_secs", self.download_read_timeout_secs),
            ("api_timeout_secs", self.api_timeout_secs),
        ] {
            if let Some(value) = value {
                check_range(key, value, 1, 3600, "1..=3600")?;
            }
        }
        if let Some(delay) = self.retry_base_delay_ms {
            check_range("retry_base_delay_ms", delay, 0, 60_000, "0..=60000")?;
        }
        Ok(())
    }

    /// Reads and parses the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read, otherwise
    /// whatever [`FileConfig::parse`] reports.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw)
    }

    /// Loads the file at the default location; a missing file (or no known
    /// home directory) yields the empty config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file exists but is unreadable or invalid.
    pub fn load_default() -> Result<Self, ConfigError> {
        match resolve_default_config_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }
}

/// Resolves the default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/neat-mirror/config.toml`
/// 2. `$HOME/.config/neat-mirror/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("neat-mirror")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("neat-mirror")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Values given on the command line; they win over the file.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    /// `--api-base`.
    pub api_base: Option<String>,
    /// `--max-attempts`.
    pub max_attempts: Option<u32>,
}

/// Fully resolved settings for one sync run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    /// API base URL.
    pub api_base: String,
    /// Local destination root.
    pub dest: PathBuf,
    /// Directory holding the ledger and run logs.
    pub state_dir: PathBuf,
    /// Attempts per run.
    pub max_attempts: u32,
    /// Payload connect timeout.
    pub download_connect_timeout: Duration,
    /// Payload idle read timeout.
    pub download_read_timeout: Duration,
    /// Listing call timeout; `None` waits indefinitely.
    pub api_timeout: Option<Duration>,
    /// Backoff base delay between attempts.
    pub retry_base_delay: Duration,
}

impl SyncSettings {
    /// Default settings for mirroring into `dest`.
    #[must_use]
    pub fn new(dest: impl Into<PathBuf>) -> Self {
        let dest = dest.into();
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            state_dir: dest.join(STATE_DIR_NAME),
            dest,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            download_connect_timeout: Duration::from_secs(DOWNLOAD_CONNECT_TIMEOUT_SECS),
            download_read_timeout: Duration::from_secs(DOWNLOAD_READ_TIMEOUT_SECS),
            api_timeout: None,
            retry_base_delay: DEFAULT_BASE_DELAY,
        }
    }

    /// Layers `file` and then `cli` over the defaults for `dest`.
    ///
    /// A relative `state_dir` from the file is taken relative to `dest`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::OutOfRange`] when a CLI value is out of range.
    pub fn resolve(
        dest: impl Into<PathBuf>,
        file: &FileConfig,
        cli: &CliOverrides,
    ) -> Result<Self, ConfigError> {
        let mut settings = Self::new(dest);

        if let Some(api_base) = &file.api_base {
            settings.api_base.clone_from(api_base);
        }
        if let Some(attempts) = file.max_attempts {
            settings.max_attempts = attempts;
        }
        if let Some(secs) = file.download_connect_timeout_secs {
            settings.download_connect_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = file.download_read_timeout_secs {
            settings.download_read_timeout = Duration::from_secs(secs);
        }
        settings.api_timeout = file.api_timeout_secs.map(Duration::from_secs);
        if let Some(ms) = file.retry_base_delay_ms {
            settings.retry_base_delay = Duration::from_millis(ms);
        }
        if let Some(state_dir) = &file.state_dir {
            settings.state_dir = settings.dest.join(state_dir);
        }

        if let Some(api_base) = &cli.api_base {
            settings.api_base.clone_from(api_base);
        }
        if let Some(attempts) = cli.max_attempts {
            check_range("max_attempts", u64::from(attempts), 1, 20, "1..=20")?;
            settings.max_attempts = attempts;
        }

        Ok(settings)
    }

    /// Path of the ledger file.
    #[must_use]
    pub fn ledger_path(&self) -> PathBuf {
        self.state_dir.join(LEDGER_FILE_NAME)
    }

    /// Directory of the run logs.
    #[must_use]
    pub fn log_dir(&self) -> PathBuf {
        self.state_dir.join(LOG_DIR_NAME)
    }
}

fn check_range(
    key: &'static str,
    value: u64,
    min: u64,
    max: u64,
    range: &'static str,
) -> Result<(), ConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { key, value, range })
    }
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(key: &'static str, line: usize, raw: &str) -> Result<String, ConfigError> {
    if raw.len() < 2 || !raw.starts_with('"') || !raw.ends_with('"') {
        return Err(ConfigError::InvalidValue {
            key,
            line,
            message: "expected double-quoted string".to_string(),
        });
    }
    Ok(raw[1..raw.len() - 1].to_string())
}

fn parse_integer(key: &'static str, line: usize, raw: &str) -> Result<u64, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|error| ConfigError::InvalidValue {
            key,
            line,
            message: format!("expected non-negative integer ({error})"),
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config_partial_fields() {
        let cfg = FileConfig::parse(
            r#"
max_attempts = 8
api_base = "http://localhost:8080/cloud/"
"#,
        )
        .expect("partial config should parse");
        assert_eq!(cfg.max_attempts, Some(8));
        assert_eq!(cfg.api_base.as_deref(), Some("http://localhost:8080/cloud/"));
        assert!(cfg.state_dir.is_none());
    }

    #[test]
    fn test_parse_config_all_fields() {
        let cfg = FileConfig::parse(
            r#"
api_base = "https://example.test/"
max_attempts = 3
download_connect_timeout_secs = 5
download_read_timeout_secs = 30
api_timeout_secs = 60
retry_base_delay_ms = 0
state_dir = "/var/lib/neat"
"#,
        )
        .unwrap();
        assert_eq!(cfg.download_connect_timeout_secs, Some(5));
        assert_eq!(cfg.download_read_timeout_secs, Some(30));
        assert_eq!(cfg.api_timeout_secs, Some(60));
        assert_eq!(cfg.retry_base_delay_ms, Some(0));
        assert_eq!(cfg.state_dir, Some(PathBuf::from("/var/lib/neat")));
    }

    #[test]
    fn test_parse_config_supports_inline_comments() {
        let cfg = FileConfig::parse(
            r#"
# whole-line comment
max_attempts = 4 # a few more
api_base = "http://host/#fragment" # hash inside the string stays
"#,
        )
        .expect("config with comments should parse");
        assert_eq!(cfg.max_attempts, Some(4));
        assert_eq!(cfg.api_base.as_deref(), Some("http://host/#fragment"));
    }

    #[test]
    fn test_parse_config_rejects_out_of_range_attempts() {
        let err = FileConfig::parse("max_attempts = 0").unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { key: "max_attempts", .. }));
        let err = FileConfig::parse("max_attempts = 21").unwrap_err();
        assert!(err.to_string().contains("1..=20"));
    }

    #[test]
    fn test_parse_config_rejects_out_of_range_timeout() {
        let err = FileConfig::parse("download_read_timeout_secs = 3601").unwrap_err();
        assert!(err.to_string().contains("download_read_timeout_secs"));
    }

    #[test]
    fn test_parse_config_rejects_large_backoff() {
        let err = FileConfig::parse("retry_base_delay_ms = 60001").unwrap_err();
        assert!(err.to_string().contains("retry_base_delay_ms"));
    }

    #[test]
    fn test_parse_config_rejects_trailing_tokens() {
        let err = FileConfig::parse("max_attempts = 4 trailing").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "max_attempts", line: 1, .. }));
    }

    #[test]
    fn test_parse_config_rejects_unquoted_string() {
        let err = FileConfig::parse("state_dir = /tmp/x").unwrap_err();
        assert!(err.to_string().contains("state_dir"));
    }

    #[test]
    fn test_parse_config_rejects_unknown_keys() {
        let err = FileConfig::parse("\nunknown_key = 123").unwrap_err();
        assert!(err.to_string().contains("unknown_key"));
        assert!(matches!(err, ConfigError::UnknownKey { line: 2, .. }));
    }

    #[test]
    fn test_parse_config_rejects_missing_equals() {
        let err = FileConfig::parse("max_attempts 3").unwrap_err();
        assert!(matches!(err, ConfigError::Syntax { line: 1 }));
    }

    #[test]
    fn test_load_reads_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "max_attempts = 2\n").unwrap();
        assert_eq!(FileConfig::load(&path).unwrap().max_attempts, Some(2));
    }

    #[test]
    fn test_load_missing_file_is_read_error() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let err = FileConfig::load(&temp_dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_settings_defaults() {
        let settings = SyncSettings::new("/data");
        assert_eq!(settings.api_base, DEFAULT_API_BASE);
        assert_eq!(settings.max_attempts, 5);
        assert_eq!(settings.download_connect_timeout, Duration::from_secs(1));
        assert_eq!(settings.download_read_timeout, Duration::from_secs(1));
        assert_eq!(settings.api_timeout, None);
        assert_eq!(settings.retry_base_delay, Duration::from_secs(1));
        assert_eq!(settings.ledger_path(), PathBuf::from("/data/.neat-mirror/ledger.txt"));
        assert_eq!(settings.log_dir(), PathBuf::from("/data/.neat-mirror/logs"));
    }

    #[test]
    fn test_resolve_cli_overrides_file_overrides_defaults() {
        let file = FileConfig {
            api_base: Some("http://file/".to_string()),
            max_attempts: Some(3),
            api_timeout_secs: Some(10),
            retry_base_delay_ms: Some(0),
            ..FileConfig::default()
        };
        let cli = CliOverrides {
            api_base: Some("http://cli/".to_string()),
            max_attempts: None,
        };

        let settings = SyncSettings::resolve("/data", &file, &cli).unwrap();
        assert_eq!(settings.api_base, "http://cli/");
        assert_eq!(settings.max_attempts, 3);
        assert_eq!(settings.api_timeout, Some(Duration::from_secs(10)));
        assert_eq!(settings.retry_base_delay, Duration::ZERO);
        assert_eq!(settings.download_read_timeout, Duration::from_secs(1));
    }

    #[test]
    fn test_resolve_relative_state_dir_is_under_dest() {
        let file = FileConfig {
            state_dir: Some(PathBuf::from("state")),
            ..FileConfig::default()
        };
        let settings = SyncSettings::resolve("/data", &file, &CliOverrides::default()).unwrap();
        assert_eq!(settings.ledger_path(), PathBuf::from("/data/state/ledger.txt"));

        let file = FileConfig {
            state_dir: Some(PathBuf::from("/abs/state")),
            ..FileConfig::default()
        };
        let settings = SyncSettings::resolve("/data", &file, &CliOverrides::default()).unwrap();
        assert_eq!(settings.state_dir, PathBuf::from("/abs/state"));
    }

    #[test]
    fn test_resolve_rejects_out_of_range_cli_attempts() {
        let cli = CliOverrides {
            max_attempts: Some(0),
            ..CliOverrides::default()
        };
        let err = SyncSettings::resolve("/data", &FileConfig::default(), &cli).unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { key: "max_attempts", .. }));
    }
}
