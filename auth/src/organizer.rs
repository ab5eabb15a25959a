//! Organizer identities and the token directory.

use crate::error::{AuthError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;

/// An authenticated dashboard user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Organizer {
    /// Display name, recorded as `markedBy` on check-ins.
    pub name: String,
}

/// Base64-encoded SHA-256 digest of a bearer token.
///
/// This is the form tokens take in configuration, so plaintext tokens
/// never need to be stored server-side.
#[must_use]
pub fn token_digest(token: &str) -> String {
    STANDARD.encode(Sha256::digest(token.as_bytes()))
}

struct Entry {
    digest: [u8; 32],
    organizer: Organizer,
}

/// The set of organizers allowed to use the dashboard.
#[derive(Default)]
pub struct OrganizerDirectory {
    entries: Vec<Entry>,
}

impl OrganizerDirectory {
    /// Parse a comma-separated list of `name:base64(sha256(token))` entries.
    ///
    /// Blank entries are skipped, so an empty string yields an empty
    /// directory (which rejects every request).
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidEntry`] for an entry without a name, or
    /// whose digest is not valid base64 of exactly 32 bytes.
    pub fn parse(config: &str) -> Result<Self> {
        let mut directory = Self::default();

        for raw in config.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let invalid = |reason: &str| AuthError::InvalidEntry {
                entry: raw.to_string(),
                reason: reason.to_string(),
            };

            let (name, digest) = raw
                .rsplit_once(':')
                .ok_or_else(|| invalid("expected name:digest"))?;
            let name = name.trim();
            if name.is_empty() {
                return Err(invalid("organizer name is empty"));
            }

            let bytes = STANDARD
                .decode(digest.trim())
                .map_err(|e| invalid(&format!("digest is not base64: {e}")))?;
            let digest: [u8; 32] = bytes
                .try_into()
                .map_err(|_| invalid("digest must be a SHA-256 hash"))?;

            directory.entries.push(Entry {
                digest,
                organizer: Organizer {
                    name: name.to_string(),
                },
            });
        }

        Ok(directory)
    }

    /// Register an organizer with a plaintext token (tests and tooling).
    #[must_use]
    pub fn with_token(mut self, name: impl Into<String>, token: &str) -> Self {
        self.entries.push(Entry {
            digest: Sha256::digest(token.as_bytes()).into(),
            organizer: Organizer { name: name.into() },
        });
        self
    }

    /// Number of configured organizers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no organizer is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve a bearer token to an organizer.
    ///
    /// Every entry is compared, so timing does not reveal which one matched.
    ///
    /// # Errors
    ///
    /// - [`AuthError::MissingToken`] for a blank token
    /// - [`AuthError::InvalidCredentials`] if no entry matches
    pub fn authenticate(&self, token: &str) -> Result<Organizer> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }

        let presented: [u8; 32] = Sha256::digest(token.as_bytes()).into();
        let mut matched = None;
        for entry in &self.entries {
            if constant_time_eq::constant_time_eq(&presented, &entry.digest) && matched.is_none() {
                matched = Some(&entry.organizer);
            }
        }

        matched.cloned().ok_or_else(|| {
            tracing::warn!("Rejected organizer token");
            AuthError::InvalidCredentials
        })
    }
}

impl fmt::Debug for OrganizerDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Digests stay out of logs.
        f.debug_struct("OrganizerDirectory")
            .field(
                "organizers",
                &self
                    .entries
                    .iter()
                    .map(|e| e.organizer.name.as_str())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}
