use crate::config::ConnectionProfile;
use crate::error::{Error, Result};
use crate::remote::{RemoteEntry, RemoteFs};
use ssh2::{HashType, Session, Sftp};
use std::fs;
use std::io;
use std::net::{TcpStream, ToSocketAddrs};
use std::path::Path;

/// An authenticated SSH session and its lazily opened SFTP channel.
///
/// Both are released by [`SshSession::close`], which also runs on drop.
pub struct SshSession {
    target: String,
    session: Option<Session>,
    sftp: Option<Sftp>,
}

impl SshSession {
    pub fn open(profile: &ConnectionProfile) -> Result<Self> {
        profile.validate()?;
        let target = profile.target();
        log::info!("Connecting to {}", target);

        let tcp = connect_tcp(profile).map_err(|source| Error::Connection {
            target: target.clone(),
            source,
        })?;

        let mut sess = Session::new().map_err(|e| Error::Connection {
            target: target.clone(),
            source: e.into(),
        })?;

        if let Err(source) = establish(&mut sess, tcp, profile) {
            // The handshake may have got far enough to need a clean disconnect.
            if let Err(e) = sess.disconnect(None, "connection setup failed", None) {
                log::debug!("Disconnect after failed setup also failed: {}", e);
            }
            return Err(Error::Connection { target, source });
        }

        log::info!("Connected to {}", target);
        Ok(SshSession {
            target,
            session: Some(sess),
            sftp: None,
        })
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// The SFTP sub-session, opened on first use.
    pub fn sftp(&mut self) -> Result<&Sftp> {
        let session = self
            .session
            .as_ref()
            .ok_or(Error::InvalidState("SFTP requested on a closed SSH session"))?;

        if self.sftp.is_none() {
            log::debug!("Opening SFTP channel to {}", self.target);
            let sftp = session.sftp().map_err(|e| Error::Connection {
                target: self.target.clone(),
                source: e.into(),
            })?;
            self.sftp = Some(sftp);
        }

        self.sftp
            .as_ref()
            .ok_or(Error::InvalidState("SFTP channel is not available"))
    }

    /// Closes the SFTP channel and the SSH session. Safe to call repeatedly.
    pub fn close(&mut self) {
        if self.sftp.take().is_some() {
            log::debug!("SFTP channel to {} closed", self.target);
        }
        if let Some(sess) = self.session.take() {
            match sess.disconnect(None, "session finished", None) {
                Ok(()) => log::info!("Disconnected from {}", self.target),
                Err(e) => log::warn!("Failed to disconnect cleanly from {}: {}", self.target, e),
            }
        }
    }
}

impl Drop for SshSession {
    fn drop(&mut self) {
        self.close();
    }
}

/// Opens a session, hands it to `f`, and closes it on every exit path.
pub fn with_session<T, F>(profile: &ConnectionProfile, f: F) -> Result<T>
where
    F: FnOnce(&mut SshSession) -> Result<T>,
{
    let mut session = SshSession::open(profile)?;
    let result = f(&mut session);
    session.close();
    result
}

fn connect_tcp(profile: &ConnectionProfile) -> io::Result<TcpStream> {
    let mut last_err = None;
    for addr in (profile.host.as_str(), profile.port).to_socket_addrs()? {
        match TcpStream::connect_timeout(&addr, profile.connect_timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                log::debug!("Connecting to {} failed: {}", addr, e);
                last_err = Some(e);
            }
        }
    }

    Err(last_err.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, "host name resolved to no addresses")
    }))
}

fn establish(sess: &mut Session, tcp: TcpStream, profile: &ConnectionProfile) -> io::Result<()> {
    let timeout_ms = u32::try_from(profile.connect_timeout.as_millis()).unwrap_or(u32::MAX);
    sess.set_timeout(timeout_ms);
    sess.set_tcp_stream(tcp);
    sess.handshake()?;

    // Host keys are trusted on first sight; this tool talks to one known server.
    if let Some(hash) = sess.host_key_hash(HashType::Sha256) {
        let fingerprint: Vec<String> = hash.iter().map(|b| format!("{b:02x}")).collect();
        log::debug!("Host key SHA256 fingerprint: {}", fingerprint.join(":"));
    }

    authenticate(sess, profile)?;

    // Only the connect phase is bounded; transfers may take as long as they need.
    sess.set_timeout(0);
    Ok(())
}

fn authenticate(sess: &Session, profile: &ConnectionProfile) -> io::Result<()> {
    if let Some(key) = &profile.private_key {
        if key.exists() {
            log::debug!("Trying public key authentication with {}", key.display());
            if let Err(e) = sess.userauth_pubkey_file(&profile.username, None, key, None) {
                log::warn!("Public key authentication with {} failed: {}", key.display(), e);
            }
        } else {
            log::warn!("Private key {} does not exist, skipping", key.display());
        }
    }

    if !sess.authenticated() {
        if let Some(password) = &profile.password {
            log::debug!("Trying password authentication");
            if let Err(e) = sess.userauth_password(&profile.username, password) {
                log::warn!("Password authentication failed: {}", e);
            }
        }
    }

    if !sess.authenticated() {
        return Err(io::Error::new(
            io::ErrorKind::PermissionDenied,
            "SSH authentication failed: no private key or password was accepted",
        ));
    }

    Ok(())
}

impl RemoteFs for Sftp {
    fn list_dir(&self, path: &str) -> io::Result<Vec<RemoteEntry>> {
        let entries = self.readdir(Path::new(path))?;

        Ok(entries
            .into_iter()
            .filter_map(|(entry_path, stat)| {
                let name = entry_path.file_name()?.to_string_lossy().into_owned();
                Some(RemoteEntry {
                    name,
                    is_dir: stat.is_dir(),
                })
            })
            .filter(|entry| entry.name != "." && entry.name != "..")
            .collect())
    }

    fn download(&self, remote_path: &str, local_path: &Path) -> io::Result<u64> {
        let mut remote_file = self.open(Path::new(remote_path))?;
        let mut local_file = fs::File::create(local_path)?;
        io::copy(&mut remote_file, &mut local_file)
    }
}
