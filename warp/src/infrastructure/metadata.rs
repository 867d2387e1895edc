// /////////////////////////////////////////////////////////////////////////////
// WARP
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Pipe Metadata Recording
//!
//! Every build writes three files under `HOME/<session>/<pipe_hash>/`:
//! a CSV row recording when the pipe last built, a YAML snapshot of its
//! parameter values, and a plain copy of its source file. The directory
//! key is the SHA-1 hex of the pipe's declared source path (or of the
//! pipe's own name for a source pipe, which has no source file).

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use sha1::{Digest, Sha1};
use warp_domain::value_objects::ParameterValue;
use warp_domain::WarpError;

const METADATA_FILE: &str = "metadata.csv";
const PARAMETERS_FILE: &str = "parameters.yml";
const SOURCE_FILE: &str = "source.txt";

/// Hashes a pipe's cache-directory key per §3: SHA-1 hex of its source
/// path, or of its own name if it has none (source pipes).
pub fn pipe_cache_key(source_path: Option<&str>, pipe_name: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(source_path.unwrap_or(pipe_name).as_bytes());
    hex::encode(hasher.finalize())
}

fn pipe_dir(session_dir: &Path, cache_key: &str) -> PathBuf {
    session_dir.join(cache_key)
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetadataRecord {
    pub pipe_name: String,
    pub last_build_time: u64,
    pub time_elapsed_secs: f64,
    pub git_commit_hash: Option<String>,
}

impl MetadataRecord {
    fn to_csv_row(&self) -> String {
        format!(
            "{},{},{},{}\n",
            self.pipe_name,
            self.last_build_time,
            self.time_elapsed_secs,
            self.git_commit_hash.as_deref().unwrap_or("")
        )
    }

    fn from_csv_row(row: &str) -> Option<Self> {
        let mut fields = row.splitn(4, ',');
        let pipe_name = fields.next()?.to_string();
        let last_build_time = fields.next()?.parse().ok()?;
        let time_elapsed_secs = fields.next()?.parse().ok()?;
        let commit = fields.next()?.trim();
        let git_commit_hash = if commit.is_empty() { None } else { Some(commit.to_string()) };

        Some(Self {
            pipe_name,
            last_build_time,
            time_elapsed_secs,
            git_commit_hash,
        })
    }
}

/// Appends a metadata row for `pipe_name` under `session_dir`. A CSV
/// file (not a single overwritten row) so build history accumulates;
/// readers take the last row.
pub fn write_metadata(session_dir: &Path, cache_key: &str, record: &MetadataRecord) -> Result<(), WarpError> {
    let dir = pipe_dir(session_dir, cache_key);
    fs::create_dir_all(&dir)?;

    use std::io::Write;
    let mut file = fs::OpenOptions::new().create(true).append(true).open(dir.join(METADATA_FILE))?;
    file.write_all(record.to_csv_row().as_bytes())?;
    Ok(())
}

/// Returns the most recent metadata row, if any build has happened yet.
pub fn read_latest_metadata(session_dir: &Path, cache_key: &str) -> Result<Option<MetadataRecord>, WarpError> {
    let path = pipe_dir(session_dir, cache_key).join(METADATA_FILE);
    if !path.exists() {
        return Ok(None);
    }
    let contents = fs::read_to_string(path)?;
    Ok(contents.lines().rev().find_map(MetadataRecord::from_csv_row))
}

/// Writes a flat parameter-value snapshot as YAML.
pub fn write_parameters_snapshot(
    session_dir: &Path,
    cache_key: &str,
    values: &BTreeMap<String, ParameterValue>,
) -> Result<(), WarpError> {
    let dir = pipe_dir(session_dir, cache_key);
    fs::create_dir_all(&dir)?;
    let yaml = serde_yaml::to_string(values).map_err(|e| WarpError::Serialization(e.to_string()))?;
    fs::write(dir.join(PARAMETERS_FILE), yaml)?;
    Ok(())
}

/// Reads a previously written parameter-value snapshot, if any.
pub fn read_parameters_snapshot(
    session_dir: &Path,
    cache_key: &str,
) -> Result<Option<BTreeMap<String, ParameterValue>>, WarpError> {
    let path = pipe_dir(session_dir, cache_key).join(PARAMETERS_FILE);
    if !path.exists() {
        return Ok(None);
    }
    let contents = fs::read_to_string(path)?;
    let values = serde_yaml::from_str(&contents).map_err(|e| WarpError::Serialization(e.to_string()))?;
    Ok(Some(values))
}

/// Copies a pipe's declared source file into its metadata directory, if
/// the pipe has one.
pub fn write_source_snapshot(session_dir: &Path, cache_key: &str, source_path: Option<&str>) -> Result<(), WarpError> {
    let Some(source_path) = source_path else {
        return Ok(());
    };
    let dir = pipe_dir(session_dir, cache_key);
    fs::create_dir_all(&dir)?;
    match fs::read_to_string(source_path) {
        Ok(contents) => fs::write(dir.join(SOURCE_FILE), contents)?,
        Err(_) => {
            tracing::warn!(source_path, "could not read pipe source for snapshotting");
        }
    }
    Ok(())
}

/// Looks up the current HEAD commit hash of the repository containing
/// `path`. Returns `None` (and a warning, per `MissingGitVersioning`)
/// rather than failing the build if no repository is found.
pub fn git_commit_hash(path: &Path) -> Option<String> {
    match git2::Repository::discover(path) {
        Ok(repo) => match repo.head().and_then(|h| h.peel_to_commit()) {
            Ok(commit) => Some(commit.id().to_string()),
            Err(_) => {
                tracing::warn!("repository has no commits yet; recording null commit hash");
                None
            }
        },
        Err(_) => {
            tracing::warn!("not inside a git repository; recording null commit hash");
            None
        }
    }
}

pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn cache_key_is_stable_sha1_of_source_path() {
        let a = pipe_cache_key(Some("pipes/a.rs"), "A");
        let b = pipe_cache_key(Some("pipes/a.rs"), "A");
        assert_eq!(a, b);
        assert_eq!(a.len(), 40);
    }

    #[test]
    fn source_pipe_key_uses_name_when_no_source_path() {
        let a = pipe_cache_key(None, "__source__A0");
        let b = pipe_cache_key(None, "__source__A0");
        assert_eq!(a, b);
    }

    #[test]
    fn write_then_read_latest_metadata_round_trips() {
        let dir = tempdir().unwrap();
        let key = "deadbeef";

        write_metadata(
            dir.path(),
            key,
            &MetadataRecord {
                pipe_name: "A".into(),
                last_build_time: 100,
                time_elapsed_secs: 1.5,
                git_commit_hash: Some("abc123".into()),
            },
        )
        .unwrap();

        write_metadata(
            dir.path(),
            key,
            &MetadataRecord {
                pipe_name: "A".into(),
                last_build_time: 200,
                time_elapsed_secs: 0.5,
                git_commit_hash: None,
            },
        )
        .unwrap();

        let latest = read_latest_metadata(dir.path(), key).unwrap().unwrap();
        assert_eq!(latest.last_build_time, 200);
        assert!(latest.git_commit_hash.is_none());
    }

    #[test]
    fn read_latest_metadata_returns_none_when_absent() {
        let dir = tempdir().unwrap();
        assert!(read_latest_metadata(dir.path(), "nope").unwrap().is_none());
    }

    #[test]
    fn parameters_snapshot_round_trips() {
        let dir = tempdir().unwrap();
        let mut values = BTreeMap::new();
        values.insert("x".to_string(), ParameterValue::Integer(7));
        values.insert("name".to_string(), ParameterValue::String("hi".into()));

        write_parameters_snapshot(dir.path(), "key", &values).unwrap();
        let read_back = read_parameters_snapshot(dir.path(), "key").unwrap().unwrap();
        assert_eq!(read_back, values);
    }
}
