//! Persisted known-hosts state: one pinned fingerprint per `host:port`.
//!
//! File format, UTF-8 text:
//!
//! ```text
//! # comment
//! localhost:9001 3c5f...e2
//! 10.0.0.7:8080 91ab...0d
//! ```
//!
//! The file is read once at startup and appended to when TOFU pins a new
//! host. It is never rewritten in place; appends happen one full line at a
//! time under a single mutex so concurrent handshakes cannot interleave
//! partial lines.

use crate::error::TrustError;
use crate::fingerprint::{Fingerprint, HostPort};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// In-memory view of the known-hosts file, shared by whitelist reads and
/// TOFU pinning.
pub struct KnownHostsStore {
    path: PathBuf,
    entries: Mutex<HashMap<HostPort, Fingerprint>>,
}

impl KnownHostsStore {
    /// Load the file at `path`. A missing file is an empty store; the file
    /// is created on the first pin.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, TrustError> {
        let path = path.into();
        let entries = match File::open(&path) {
            Ok(file) => Self::parse(&path, file)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(TrustError::Io(e)),
        };
        debug!(path = %path.display(), entries = entries.len(), "loaded known hosts");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    fn parse(path: &Path, file: File) -> Result<HashMap<HostPort, Fingerprint>, TrustError> {
        let mut entries = HashMap::new();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let mut fields = trimmed.split_whitespace();
            let entry = match (fields.next(), fields.next(), fields.next()) {
                (Some(host_port), Some(fingerprint), None) => HostPort::parse(host_port)
                    .and_then(|hp| Ok((hp, Fingerprint::parse(fingerprint)?))),
                _ => Err(TrustError::MalformedKnownHosts {
                    path: path.to_path_buf(),
                    line: index + 1,
                }),
            };
            let (host_port, fingerprint) = entry.map_err(|_| TrustError::MalformedKnownHosts {
                path: path.to_path_buf(),
                line: index + 1,
            })?;
            // First-seen wins if the file repeats a host.
            entries.entry(host_port).or_insert(fingerprint);
        }
        Ok(entries)
    }

    /// The fingerprint pinned for `host_port`, if any.
    pub fn lookup(&self, host_port: &HostPort) -> Option<Fingerprint> {
        self.entries.lock().get(host_port).cloned()
    }

    /// Pin a fingerprint for a previously unknown `host_port`, appending it
    /// to the file.
    ///
    /// First-seen wins: if a fingerprint is already recorded the call is a
    /// no-op and returns `false`. Returns `true` when a new pin was
    /// persisted.
    pub fn pin(&self, host_port: HostPort, fingerprint: Fingerprint) -> Result<bool, TrustError> {
        let mut entries = self.entries.lock();
        if entries.contains_key(&host_port) {
            return Ok(false);
        }

        // Holding the lock across the append is the single-writer
        // discipline: one full line reaches the file at a time.
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{host_port} {fingerprint}")?;

        info!(host = %host_port, fingerprint = %fingerprint, "pinned new host");
        entries.insert(host_port, fingerprint);
        Ok(true)
    }
}

impl std::fmt::Debug for KnownHostsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnownHostsStore")
            .field("path", &self.path)
            .field("entries", &self.entries.lock().len())
            .finish()
    }
}
