use crate::error::{Error, Result};
use config::{Config, ConfigError, Environment, File};
use std::fmt;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_SSH_PORT: u16 = 22;
pub const DEFAULT_PRIVKEY_FILE: &str = "~/.ssh/id_rsa";
pub const DEFAULT_LOCAL_DEST: &str = "/tmp/backup";
pub const DEFAULT_BACKUP_LIMIT: i64 = 10;
pub const DEFAULT_CONNECT_TIMEOUT_MS: i64 = 5000;

/// Everything needed to open one SSH session. Immutable once built.
#[derive(Clone)]
pub struct ConnectionProfile {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: Option<String>,
    pub private_key: Option<PathBuf>,
    pub connect_timeout: Duration,
}

impl ConnectionProfile {
    /// `user@host:port`, used in log lines and connection errors.
    pub fn target(&self) -> String {
        format!("{}@{}:{}", self.username, self.host, self.port)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::Config("remote host must not be empty".into()));
        }
        if self.username.trim().is_empty() {
            return Err(Error::Config("remote user must not be empty".into()));
        }
        if self.port == 0 {
            return Err(Error::Config("remote port must be between 1 and 65535".into()));
        }
        Ok(())
    }
}

impl fmt::Debug for ConnectionProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionProfile")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "********"))
            .field("private_key", &self.private_key)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

/// Maximum number of files kept in the local destination after pruning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionThreshold(NonZeroUsize);

impl RetentionThreshold {
    pub fn new(limit: usize) -> Result<Self> {
        NonZeroUsize::new(limit)
            .map(RetentionThreshold)
            .ok_or_else(|| Error::Config("retention threshold must be a positive integer".into()))
    }

    pub fn get(self) -> usize {
        self.0.get()
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub profile: ConnectionProfile,
    pub remote_cwd: String,
    pub local_dest: PathBuf,
    pub extra_path_suffix: String,
    pub local_backup_limit: RetentionThreshold,
}

impl Settings {
    pub fn from_config(settings: &Config) -> Result<Self> {
        let port = settings
            .get::<i64>("remote_port")
            .or_else(|e| default_on_missing(e, i64::from(DEFAULT_SSH_PORT)))?;
        let port = u16::try_from(port)
            .map_err(|_| Error::Config(format!("remote port {port} is out of range")))?;

        let private_key = match optional_string(settings, "privkey_file")? {
            Some(raw) if raw.trim().is_empty() => None,
            Some(raw) => Some(expand_home(&raw)?),
            None => default_private_key(dirs::home_dir()),
        };

        let timeout_ms = settings
            .get::<i64>("connect_timeout_ms")
            .or_else(|e| default_on_missing(e, DEFAULT_CONNECT_TIMEOUT_MS))?;
        if timeout_ms <= 0 {
            return Err(Error::Config("connect_timeout_ms must be positive".into()));
        }

        let profile = ConnectionProfile {
            host: required_string(settings, "remote_host")?,
            port,
            username: required_string(settings, "remote_user")?,
            password: optional_string(settings, "remote_password")?.filter(|p| !p.is_empty()),
            private_key,
            connect_timeout: Duration::from_millis(timeout_ms as u64),
        };
        profile.validate()?;

        let local_dest = optional_string(settings, "local_dest_path")?
            .unwrap_or_else(|| DEFAULT_LOCAL_DEST.to_string());

        let limit = settings
            .get::<i64>("local_backup_limit")
            .or_else(|e| default_on_missing(e, DEFAULT_BACKUP_LIMIT))?;
        let local_backup_limit = usize::try_from(limit)
            .map_err(|_| Error::Config(format!("local_backup_limit must be positive, got {limit}")))
            .and_then(RetentionThreshold::new)?;

        Ok(Settings {
            profile,
            remote_cwd: required_string(settings, "remote_cwd")?,
            local_dest: expand_home(&local_dest)?,
            extra_path_suffix: optional_string(settings, "extra_path_suffix")?.unwrap_or_default(),
            local_backup_limit,
        })
    }

    /// Remote directory holding the `<year>/<month>` tree. The suffix is
    /// appended verbatim, no separator is inserted.
    pub fn remote_backup_dir(&self) -> String {
        format!("{}{}", self.remote_cwd, self.extra_path_suffix).replace('\\', "/")
    }

    /// Flat local directory the downloads land in.
    pub fn local_backup_dir(&self) -> PathBuf {
        let mut dir = self.local_dest.clone().into_os_string();
        dir.push(&self.extra_path_suffix);
        PathBuf::from(dir)
    }
}

/// Reads the optional config file, then overlays `SSH_*` environment variables
/// (`SSH_REMOTE_HOST` -> `remote_host`).
pub fn load_config(config_path: &Path) -> Result<Settings> {
    let settings = Config::builder()
        .add_source(File::from(config_path).required(false))
        .add_source(Environment::with_prefix("SSH"))
        .build()?;

    Settings::from_config(&settings)
}

/// Expands a leading `~` to the current user's home directory.
pub fn expand_home(raw: &str) -> Result<PathBuf> {
    let rest = match raw.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') || rest.starts_with('\\') => rest,
        _ => return Ok(PathBuf::from(raw)),
    };

    let home = dirs::home_dir()
        .ok_or_else(|| Error::Config(format!("cannot expand '{raw}': home directory is unknown")))?;
    let rest = rest.trim_start_matches(|c: char| c == '/' || c == '\\');
    if rest.is_empty() {
        Ok(home)
    } else {
        Ok(home.join(rest))
    }
}

/// `~/.ssh/id_rsa` under `home`, or no key when the home directory is unknown.
fn default_private_key(home: Option<PathBuf>) -> Option<PathBuf> {
    match home {
        Some(home) => Some(home.join(".ssh").join("id_rsa")),
        None => {
            log::debug!("Home directory unknown, no default private key ({})", DEFAULT_PRIVKEY_FILE);
            None
        }
    }
}

fn required_string(settings: &Config, key: &str) -> Result<String> {
    match optional_string(settings, key)? {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(Error::Config(format!("missing required setting '{key}'"))),
    }
}

fn optional_string(settings: &Config, key: &str) -> Result<Option<String>> {
    match settings.get::<String>(key) {
        Ok(value) => Ok(Some(value)),
        Err(ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn default_on_missing<T>(err: ConfigError, default: T) -> std::result::Result<T, ConfigError> {
    match err {
        ConfigError::NotFound(_) => Ok(default),
        other => Err(other),
    }
}
