//! # Tails Storage
//!
//! Tails files hold the precomputed data a holder needs to build a
//! non-revocation witness. A registry definition names them by
//! `tailsHash` (hex SHA-256 of the file) and `tailsLocation`.
//!
//! [`TailsStorage`] is the collaborator contract: issuers upload, holders
//! download. [`LocalTailsStorage`] serves both sides from the filesystem;
//! a published directory stands in for the public tails server and
//! locations are `file://` URLs into it. Every download is verified
//! against `tailsHash` before it is handed out.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use thiserror::Error;

use ancr_core::RevocationRegistryDefinition;
use ancr_crypto::sha256_raw;

/// Tails retrieval and publication failures.
#[derive(Error, Debug)]
pub enum TailsError {
    /// The tails location uses a scheme this storage cannot fetch.
    #[error("unsupported tails location {location}")]
    UnsupportedLocation {
        /// Location from the registry definition.
        location: String,
    },

    /// The tails hash is not a plain hex digest.
    #[error("invalid tails hash {hash:?}")]
    InvalidHash {
        /// Hash from the registry definition.
        hash: String,
    },

    /// Downloaded data does not hash to `tailsHash`.
    #[error("tails file from {location} hashes to {actual}, expected {expected}")]
    HashMismatch {
        /// Where the data came from.
        location: String,
        /// Hash from the registry definition.
        expected: String,
        /// Hash of the data.
        actual: String,
    },

    /// Filesystem failure.
    #[error("tails io error at {path}: {source}")]
    Io {
        /// Path being read or written.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> TailsError + '_ {
    move |source| TailsError::Io { path: path.display().to_string(), source }
}

/// Tails file collaborator.
pub trait TailsStorage: Send + Sync {
    /// A local path holding the verified tails file of `definition`.
    fn get_tails_file(&self, definition: &RevocationRegistryDefinition) -> Result<PathBuf, TailsError>;

    /// Publish the tails file at the definition's (local) `tailsLocation`
    /// and return its public location.
    fn upload_tails_file(&self, definition: &RevocationRegistryDefinition) -> Result<String, TailsError>;
}

/// Filesystem tails storage.
#[derive(Debug)]
pub struct LocalTailsStorage {
    download_directory: PathBuf,
    publish_directory: PathBuf,
    verified: RwLock<HashSet<String>>,
}

const FILE_SCHEME: &str = "file://";

impl LocalTailsStorage {
    /// Storage downloading into `download_directory` and publishing into
    /// `publish_directory`.
    pub fn new(download_directory: impl Into<PathBuf>, publish_directory: impl Into<PathBuf>) -> Self {
        Self {
            download_directory: download_directory.into(),
            publish_directory: publish_directory.into(),
            verified: RwLock::new(HashSet::new()),
        }
    }

    /// Where downloaded tails files are kept.
    pub fn download_directory(&self) -> &Path {
        &self.download_directory
    }

    fn check_hash(hash: &str) -> Result<(), TailsError> {
        if hash.is_empty() || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TailsError::InvalidHash { hash: hash.to_string() });
        }
        Ok(())
    }

    fn source_path(location: &str) -> Result<PathBuf, TailsError> {
        if let Some(path) = location.strip_prefix(FILE_SCHEME) {
            return Ok(PathBuf::from(path));
        }
        if location.contains("://") {
            return Err(TailsError::UnsupportedLocation { location: location.to_string() });
        }
        Ok(PathBuf::from(location))
    }

    fn verify(location: &str, data: &[u8], expected: &str) -> Result<(), TailsError> {
        let actual = sha256_raw(data).to_hex();
        if actual != expected {
            return Err(TailsError::HashMismatch {
                location: location.to_string(),
                expected: expected.to_string(),
                actual,
            });
        }
        Ok(())
    }
}

impl TailsStorage for LocalTailsStorage {
    fn get_tails_file(&self, definition: &RevocationRegistryDefinition) -> Result<PathBuf, TailsError> {
        let hash = definition.tails_hash();
        Self::check_hash(hash)?;
        let target = self.download_directory.join(hash);
        if self.verified.read().contains(hash) && target.exists() {
            return Ok(target);
        }

        if target.exists() {
            let data = std::fs::read(&target).map_err(io_error(&target))?;
            if Self::verify(&target.display().to_string(), &data, hash).is_ok() {
                self.verified.write().insert(hash.to_string());
                return Ok(target);
            }
            tracing::warn!(path = %target.display(), "discarding tails file with wrong hash");
        }

        let location = definition.tails_location();
        let source = Self::source_path(location)?;
        let data = std::fs::read(&source).map_err(io_error(&source))?;
        Self::verify(location, &data, hash)?;
        std::fs::create_dir_all(&self.download_directory).map_err(io_error(&self.download_directory))?;
        std::fs::write(&target, &data).map_err(io_error(&target))?;
        self.verified.write().insert(hash.to_string());
        tracing::debug!(tails_hash = hash, location, path = %target.display(), "tails file downloaded");
        Ok(target)
    }

    fn upload_tails_file(&self, definition: &RevocationRegistryDefinition) -> Result<String, TailsError> {
        let hash = definition.tails_hash();
        Self::check_hash(hash)?;
        let location = definition.tails_location();
        let source = Self::source_path(location)?;
        let data = std::fs::read(&source).map_err(io_error(&source))?;
        Self::verify(location, &data, hash)?;
        std::fs::create_dir_all(&self.publish_directory).map_err(io_error(&self.publish_directory))?;
        let published = self.publish_directory.join(hash);
        std::fs::write(&published, &data).map_err(io_error(&published))?;
        let url = format!("{FILE_SCHEME}{}", published.display());
        tracing::info!(tails_hash = hash, url = %url, "tails file published");
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ancr_core::RevocationRegistryDefinitionValue;

    fn definition(location: &str, hash: &str) -> RevocationRegistryDefinition {
        RevocationRegistryDefinition {
            issuer_id: "LjgpST2rjsoxYegQDRm7EL".into(),
            revoc_def_type: "CL_ACCUM".into(),
            cred_def_id: "LjgpST2rjsoxYegQDRm7EL:3:CL:15:default".into(),
            tag: "0".into(),
            value: RevocationRegistryDefinitionValue {
                public_keys: serde_json::Value::Null,
                max_cred_num: 1,
                tails_location: location.into(),
                tails_hash: hash.into(),
            },
        }
    }

    fn write_tails(dir: &Path, data: &[u8]) -> (PathBuf, String) {
        let hash = sha256_raw(data).to_hex();
        let path = dir.join("generated");
        std::fs::write(&path, data).unwrap();
        (path, hash)
    }

    #[test]
    fn upload_then_download_round_trip() {
        let issuer = tempfile::tempdir().unwrap();
        let server = tempfile::tempdir().unwrap();
        let holder = tempfile::tempdir().unwrap();
        let (path, hash) = write_tails(issuer.path(), b"tails-bytes");

        let issuer_storage = LocalTailsStorage::new(issuer.path(), server.path());
        let url = issuer_storage.upload_tails_file(&definition(&path.display().to_string(), &hash)).unwrap();
        assert!(url.starts_with("file://"));

        let holder_storage = LocalTailsStorage::new(holder.path().join("tails"), server.path());
        let local = holder_storage.get_tails_file(&definition(&url, &hash)).unwrap();
        assert_eq!(local, holder.path().join("tails").join(&hash));
        assert_eq!(std::fs::read(local).unwrap(), b"tails-bytes");
    }

    #[test]
    fn hash_mismatch_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (path, _) = write_tails(dir.path(), b"tails-bytes");
        let wrong = sha256_raw(b"other").to_hex();
        let storage = LocalTailsStorage::new(dir.path().join("dl"), dir.path().join("pub"));
        let err = storage.get_tails_file(&definition(&path.display().to_string(), &wrong)).unwrap_err();
        assert!(matches!(err, TailsError::HashMismatch { .. }));
        assert!(!dir.path().join("dl").join(&wrong).exists());
    }

    #[test]
    fn corrupted_download_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let (path, hash) = write_tails(dir.path(), b"good");
        let download = dir.path().join("dl");
        std::fs::create_dir_all(&download).unwrap();
        std::fs::write(download.join(&hash), b"bad").unwrap();

        let storage = LocalTailsStorage::new(&download, dir.path().join("pub"));
        let local = storage.get_tails_file(&definition(&path.display().to_string(), &hash)).unwrap();
        assert_eq!(std::fs::read(local).unwrap(), b"good");
    }

    #[test]
    fn remote_locations_are_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalTailsStorage::new(dir.path(), dir.path());
        let hash = sha256_raw(b"x").to_hex();
        let err = storage.get_tails_file(&definition("https://tails.example.com/abc", &hash)).unwrap_err();
        assert!(matches!(err, TailsError::UnsupportedLocation { .. }));
    }

    #[test]
    fn path_traversal_hash_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalTailsStorage::new(dir.path(), dir.path());
        let err = storage.get_tails_file(&definition("/tmp/x", "../../etc/passwd")).unwrap_err();
        assert!(matches!(err, TailsError::InvalidHash { .. }));
    }
}
