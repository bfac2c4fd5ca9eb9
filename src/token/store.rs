//! Durable token-record storage, one JSON file per account.

use std::path::{Path, PathBuf};

use super::error::TokenError;
use super::record::TokenRecord;

/// A record together with the file name that identifies it.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredToken {
    pub file_name: String,
    pub record: TokenRecord,
}

/// Directory-backed collection of token records.
///
/// The directory is injected so callers (and tests) choose where records
/// live; nothing here touches global state.
#[derive(Debug, Clone)]
pub struct TokenStore {
    dir: PathBuf,
}

impl TokenStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// All readable records, sorted by file name.
    ///
    /// Unreadable or malformed files are logged and skipped; a single bad
    /// record never hides the rest.
    pub fn list(&self) -> Vec<StoredToken> {
        let mut tokens = Vec::new();
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return tokens,
            Err(err) => {
                tracing::warn!(dir = %self.dir.display(), %err, "cannot read tokens directory");
                return tokens;
            }
        };
        for entry in entries.filter_map(|entry| entry.ok()) {
            let file_name = entry.file_name().to_string_lossy().to_string();
            if !is_record_file_name(&file_name) {
                continue;
            }
            match self.load(&file_name) {
                Ok(token) => tokens.push(token),
                Err(err) => {
                    tracing::warn!(file = %file_name, %err, "skipping unreadable token record");
                }
            }
        }
        tokens.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        tokens
    }

    /// Load one record by file name.
    pub fn load(&self, file_name: &str) -> Result<StoredToken, TokenError> {
        let path = self.dir.join(file_name);
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(TokenError::NotFound(file_name.to_string()));
            }
            Err(err) => return Err(TokenError::Io(err)),
        };
        let record: TokenRecord = serde_json::from_str(&text).map_err(|err| {
            TokenError::Invalid(format!("failed to parse `{}`: {err}", path.display()))
        })?;
        Ok(StoredToken {
            file_name: file_name.to_string(),
            record,
        })
    }

    /// Persist a record to an existing file name.
    pub fn save(&self, file_name: &str, record: &TokenRecord) -> Result<(), TokenError> {
        std::fs::create_dir_all(&self.dir)?;
        let text = serde_json::to_string_pretty(record)
            .map_err(|err| TokenError::Invalid(format!("failed to serialize record: {err}")))?;
        std::fs::write(self.dir.join(file_name), text)?;
        Ok(())
    }

    /// Persist a brand-new record under a collision-free generated name.
    pub fn save_new(&self, record: &TokenRecord) -> Result<String, TokenError> {
        let millis = chrono::Utc::now().timestamp_millis();
        let file_name = record_file_name(
            &record.provider,
            &record.auth_method,
            &record.account_name,
            millis,
        );
        self.save(&file_name, record)?;
        Ok(file_name)
    }

    /// Delete one record file. Missing files report `NotFound`.
    pub fn delete(&self, file_name: &str) -> Result<(), TokenError> {
        match std::fs::remove_file(self.dir.join(file_name)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(TokenError::NotFound(file_name.to_string()))
            }
            Err(err) => Err(TokenError::Io(err)),
        }
    }
}

fn is_record_file_name(name: &str) -> bool {
    name.starts_with("token-") && name.ends_with(".json")
}

/// Build a record file name from identity fields plus a millisecond stamp.
///
/// Non-alphanumeric characters (other than `_`/`-`) in the account name are
/// normalized to `_` so the name is always a valid path component; the
/// timestamp guarantees uniqueness.
pub fn record_file_name(provider: &str, auth_method: &str, account_name: &str, millis: i64) -> String {
    let safe_name: String = account_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("token-{provider}-{auth_method}-{safe_name}-{millis}.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::testutil::{sample_record, temp_tokens_dir};

    // Verifies generated names normalize unsafe characters and embed the stamp.
    #[test]
    fn record_file_name_sanitizes_account_name() {
        let name = record_file_name("BuilderId", "IdC", "user@mail.test", 1772300000123);
        assert_eq!(name, "token-BuilderId-IdC-user_mail_test-1772300000123.json");
    }

    // Verifies save/load round-trips through a real file.
    #[test]
    fn save_new_then_load_round_trips() {
        let store = TokenStore::new(temp_tokens_dir());
        let record = sample_record("auto", "refresh-1", "2026-03-01T10:00:00Z");
        let file_name = store.save_new(&record).expect("save record");
        assert!(file_name.starts_with("token-BuilderId-IdC-auto-"));

        let loaded = store.load(&file_name).expect("load record");
        assert_eq!(loaded.record, record);
    }

    // Verifies a corrupt file is skipped by list but still reported by load.
    #[test]
    fn list_skips_corrupt_files() {
        let dir = temp_tokens_dir();
        let store = TokenStore::new(&dir);
        store
            .save_new(&sample_record("good", "refresh-1", "2026-03-01T10:00:00Z"))
            .expect("save record");
        std::fs::write(dir.join("token-BuilderId-IdC-bad-1.json"), "{broken").unwrap();
        std::fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let tokens = store.list();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].record.account_name, "good");

        let err = store.load("token-BuilderId-IdC-bad-1.json").unwrap_err();
        assert!(matches!(err, TokenError::Invalid(_)));
    }

    // Verifies an empty or missing directory lists as empty, not an error.
    #[test]
    fn list_on_missing_directory_is_empty() {
        let store = TokenStore::new(temp_tokens_dir().join("never-created"));
        assert!(store.list().is_empty());
    }

    // Verifies delete distinguishes missing records at the single call site.
    #[test]
    fn delete_missing_record_is_not_found() {
        let store = TokenStore::new(temp_tokens_dir());
        let err = store.delete("token-BuilderId-IdC-gone-1.json").unwrap_err();
        assert!(matches!(err, TokenError::NotFound(_)));
    }
}
