//! Profile snapshots: pretty JSON on disk, with email/phone optionally encrypted.
//!
//! Encryption is ChaCha20-Poly1305 with a random nonce per value; stored form is
//! base64(nonce ‖ ciphertext). Asking for encryption without a usable key is a
//! hard error so PII is never written in the clear by accident.

use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chacha20poly1305::aead::{Aead, AeadCore, KeyInit, OsRng};
use chacha20poly1305::ChaCha20Poly1305;
use chrono::Utc;
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::info;
use uuid::Uuid;

use crate::config::Config;
use crate::errors::AppError;
use crate::intake::profile::CandidateProfile;

const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

/// Profile keys whose values are encrypted when encryption is on.
const ENCRYPTED_FIELDS: &[&str] = &["email", "phone"];

#[derive(Debug, Error)]
pub enum CipherError {
    #[error("encryption key must be base64: {0}")]
    KeyEncoding(#[from] base64::DecodeError),

    #[error("encryption key must decode to 32 bytes, got {0}")]
    KeyLength(usize),

    #[cfg(test)]
    #[error("ciphertext is malformed")]
    Malformed,

    #[error("encryption failed")]
    Aead,
}

/// Reversible field cipher built from a base64-encoded 32-byte key.
#[derive(Clone)]
pub struct PiiCipher {
    cipher: ChaCha20Poly1305,
}

impl PiiCipher {
    pub fn from_base64_key(key: &str) -> Result<Self, CipherError> {
        let bytes = BASE64.decode(key.trim())?;
        if bytes.len() != KEY_LEN {
            return Err(CipherError::KeyLength(bytes.len()));
        }
        let cipher = ChaCha20Poly1305::new_from_slice(&bytes)
            .map_err(|_| CipherError::KeyLength(bytes.len()))?;
        Ok(Self { cipher })
    }

    /// Fresh random key, base64-encoded, suitable for `ENCRYPTION_KEY`.
    /// Printed by `talentscout generate-key`.
    pub fn generate_key() -> String {
        BASE64.encode(ChaCha20Poly1305::generate_key(&mut OsRng))
    }

    pub fn encrypt_field(&self, plaintext: &str) -> Result<String, CipherError> {
        let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| CipherError::Aead)?;
        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(out))
    }

    /// Inverse of `encrypt_field`; snapshots are only read back in tests.
    #[cfg(test)]
    pub fn decrypt_field(&self, encoded: &str) -> Result<String, CipherError> {
        let bytes = BASE64.decode(encoded).map_err(|_| CipherError::Malformed)?;
        if bytes.len() <= NONCE_LEN {
            return Err(CipherError::Malformed);
        }
        let (nonce, ciphertext) = bytes.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(chacha20poly1305::Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CipherError::Malformed)?;
        String::from_utf8(plaintext).map_err(|_| CipherError::Malformed)
    }
}

/// Where and how snapshots are written.
#[derive(Clone)]
pub struct SnapshotSettings {
    pub dir: PathBuf,
    /// `None` = write in the clear.
    pub cipher: Option<PiiCipher>,
}

impl SnapshotSettings {
    /// Fails when encryption is enabled but the key is missing or unusable.
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let cipher = if config.encryption_enabled {
            let key = config.encryption_key.as_deref().ok_or_else(|| {
                AppError::Misconfiguration(
                    "ENABLE_ENCRYPTION is set but ENCRYPTION_KEY is missing \
                     (create one with `talentscout generate-key`)"
                        .to_string(),
                )
            })?;
            Some(PiiCipher::from_base64_key(key).map_err(|e| {
                AppError::Misconfiguration(format!("ENCRYPTION_KEY is unusable: {e}"))
            })?)
        } else {
            None
        };

        Ok(Self {
            dir: PathBuf::from(&config.snapshot_dir),
            cipher,
        })
    }
}

/// Profile as a flat key/value JSON object, PII fields encrypted when a cipher is given.
pub fn snapshot_value(
    profile: &CandidateProfile,
    cipher: Option<&PiiCipher>,
) -> Result<Map<String, Value>, AppError> {
    let mut map = match serde_json::to_value(profile)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize profile: {e}")))?
    {
        Value::Object(map) => map,
        _ => return Err(AppError::Internal(anyhow::anyhow!("Profile is not an object"))),
    };

    if let Some(cipher) = cipher {
        for key in ENCRYPTED_FIELDS {
            if let Some(Value::String(plain)) = map.get(*key) {
                let sealed = cipher.encrypt_field(plain).map_err(|e| {
                    AppError::Internal(anyhow::anyhow!("Failed to encrypt {key}: {e}"))
                })?;
                map.insert((*key).to_string(), Value::String(sealed));
            }
        }
    }

    Ok(map)
}

/// Writes `candidate_<YYYYMMDDHHMMSS>_<session_id>.json` under `settings.dir` and
/// returns its path. An existing file is never replaced; a name collision is an I/O error.
/// The in-memory profile is never modified.
pub async fn save_snapshot(
    profile: &CandidateProfile,
    session_id: Uuid,
    settings: &SnapshotSettings,
) -> Result<PathBuf, AppError> {
    let map = snapshot_value(profile, settings.cipher.as_ref())?;
    let body = serde_json::to_string_pretty(&Value::Object(map))
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize snapshot: {e}")))?;

    tokio::fs::create_dir_all(&settings.dir).await?;
    let path = snapshot_path(&settings.dir, session_id);
    write_new(&path, &body).await?;

    info!(
        session_id = %session_id,
        "Profile snapshot written to {} (encrypted: {})",
        path.display(),
        settings.cipher.is_some()
    );
    Ok(path)
}

/// Creates `path` and writes `body`; fails if the file already exists.
async fn write_new(path: &Path, body: &str) -> Result<(), AppError> {
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;
    file.write_all(body.as_bytes()).await?;
    file.flush().await?;
    Ok(())
}

fn snapshot_path(dir: &Path, session_id: Uuid) -> PathBuf {
    let timestamp = Utc::now().format("%Y%m%d%H%M%S");
    dir.join(format!("candidate_{timestamp}_{session_id}.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intake::profile::tests::complete_profile;

    fn config_with(enabled: bool, key: Option<&str>, dir: &str) -> Config {
        Config {
            encryption_enabled: enabled,
            encryption_key: key.map(str::to_string),
            snapshot_dir: dir.to_string(),
            ..Config::for_tests()
        }
    }

    #[test]
    fn test_cipher_round_trip() {
        let cipher = PiiCipher::from_base64_key(&PiiCipher::generate_key()).unwrap();
        let sealed = cipher.encrypt_field("john@x.com").unwrap();
        assert_ne!(sealed, "john@x.com");
        assert_eq!(cipher.decrypt_field(&sealed).unwrap(), "john@x.com");
    }

    #[test]
    fn test_cipher_uses_fresh_nonce_per_value() {
        let cipher = PiiCipher::from_base64_key(&PiiCipher::generate_key()).unwrap();
        let a = cipher.encrypt_field("14155558899").unwrap();
        let b = cipher.encrypt_field("14155558899").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_wrong_key_cannot_decrypt() {
        let a = PiiCipher::from_base64_key(&PiiCipher::generate_key()).unwrap();
        let b = PiiCipher::from_base64_key(&PiiCipher::generate_key()).unwrap();
        let sealed = a.encrypt_field("secret").unwrap();
        assert!(matches!(b.decrypt_field(&sealed), Err(CipherError::Malformed)));
    }

    #[test]
    fn test_short_key_rejected() {
        let short = BASE64.encode([7u8; 16]);
        assert!(matches!(
            PiiCipher::from_base64_key(&short),
            Err(CipherError::KeyLength(16))
        ));
        assert!(matches!(
            PiiCipher::from_base64_key("not base64!!"),
            Err(CipherError::KeyEncoding(_))
        ));
    }

    #[test]
    fn test_encryption_without_key_is_misconfiguration() {
        let result = SnapshotSettings::from_config(&config_with(true, None, "data"));
        assert!(matches!(result, Err(AppError::Misconfiguration(_))));

        let result = SnapshotSettings::from_config(&config_with(true, Some("abc"), "data"));
        assert!(matches!(result, Err(AppError::Misconfiguration(_))));
    }

    #[test]
    fn test_encryption_disabled_needs_no_key() {
        let settings = SnapshotSettings::from_config(&config_with(false, None, "data")).unwrap();
        assert!(settings.cipher.is_none());
        assert_eq!(settings.dir, PathBuf::from("data"));
    }

    #[test]
    fn test_snapshot_value_encrypts_only_pii() {
        let cipher = PiiCipher::from_base64_key(&PiiCipher::generate_key()).unwrap();
        let profile = complete_profile();
        let map = snapshot_value(&profile, Some(&cipher)).unwrap();

        let email = map["email"].as_str().unwrap();
        assert_eq!(cipher.decrypt_field(email).unwrap(), "john@x.com");
        let phone = map["phone"].as_str().unwrap();
        assert_eq!(cipher.decrypt_field(phone).unwrap(), "14155558899");
        assert_eq!(map["full_name"], "John Doe");
        assert_eq!(map["experience"], 2.5);
        assert_eq!(map.len(), 7);
    }

    #[tokio::test]
    async fn test_save_snapshot_writes_plain_json() {
        let dir = tempfile::tempdir().unwrap();
        let settings = SnapshotSettings {
            dir: dir.path().join("snapshots"),
            cipher: None,
        };
        let profile = complete_profile();

        let path = save_snapshot(&profile, Uuid::new_v4(), &settings).await.unwrap();

        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("candidate_") && name.ends_with(".json"));
        let written: CandidateProfile =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, profile);
    }

    #[tokio::test]
    async fn test_save_snapshot_leaves_profile_untouched_when_encrypting() {
        let dir = tempfile::tempdir().unwrap();
        let cipher = PiiCipher::from_base64_key(&PiiCipher::generate_key()).unwrap();
        let settings = SnapshotSettings {
            dir: dir.path().to_path_buf(),
            cipher: Some(cipher),
        };
        let profile = complete_profile();

        let path = save_snapshot(&profile, Uuid::new_v4(), &settings).await.unwrap();

        let written: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_ne!(written["email"], "john@x.com");
        assert_eq!(profile.email.as_deref(), Some("john@x.com"));
    }

    #[tokio::test]
    async fn test_back_to_back_snapshots_keep_both_candidates() {
        let dir = tempfile::tempdir().unwrap();
        let settings = SnapshotSettings {
            dir: dir.path().to_path_buf(),
            cipher: None,
        };
        let first = complete_profile();
        let second = CandidateProfile {
            full_name: Some("Other Person".to_string()),
            ..complete_profile()
        };

        let first_path = save_snapshot(&first, Uuid::new_v4(), &settings).await.unwrap();
        let second_path = save_snapshot(&second, Uuid::new_v4(), &settings).await.unwrap();

        assert_ne!(first_path, second_path);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
        let on_disk: CandidateProfile =
            serde_json::from_str(&std::fs::read_to_string(&first_path).unwrap()).unwrap();
        assert_eq!(on_disk.full_name.as_deref(), Some("John Doe"));
    }

    #[tokio::test]
    async fn test_existing_snapshot_is_never_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let id = Uuid::new_v4();
        let path = snapshot_path(dir.path(), id);
        std::fs::write(&path, "keep me").unwrap();

        let result = write_new(&path, "{}").await;
        assert!(matches!(result, Err(AppError::Io(_))));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "keep me");
    }

    #[test]
    fn test_snapshot_name_carries_session_id() {
        let id = Uuid::new_v4();
        let path = snapshot_path(Path::new("data"), id);
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("candidate_"));
        assert!(name.ends_with(&format!("_{id}.json")));
    }
}
