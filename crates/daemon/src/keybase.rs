//! [`RemoteStore`] backed by the `keybase` command line client.
//!
//! Logical paths land under `/keybase/<scope>/<owner>/<base_path>/...` in the
//! KBFS mount. Every call shells out once; nothing is cached here.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use common::store::{RemoteStore, StoreError, StorePath};

const KBFS_ROOT: &str = "/keybase";
const NOT_FOUND_MARKER: &str = "file does not exist";

#[derive(Debug, thiserror::Error)]
pub enum KeybaseError {
    #[error("could not locate `{0}` executable, make sure keybase is installed and on your $PATH")]
    NotInstalled(String),
    #[error("please login to keybase first using `keybase login`")]
    NotLoggedIn,
    #[error("\"keybase {args}\" exited with code {code:?}: {stderr}")]
    Cli {
        args: String,
        code: Option<i32>,
        stderr: String,
    },
    #[error("io error talking to keybase: {0}")]
    Io(#[from] std::io::Error),
}

impl KeybaseError {
    fn is_not_found(&self) -> bool {
        matches!(self, KeybaseError::Cli { stderr, .. } if stderr.contains(NOT_FOUND_MARKER))
    }

    fn into_store_error(self, path: &StorePath) -> StoreError {
        if self.is_not_found() {
            StoreError::NotFound(path.clone())
        } else {
            StoreError::Backend(self.into())
        }
    }
}

#[derive(Deserialize)]
struct KeybaseId {
    username: Option<String>,
}

#[derive(Debug, Clone)]
pub struct KeybaseClient {
    binary: PathBuf,
    base_path: String,
    username: String,
}

impl KeybaseClient {
    /// Build a client, resolving the logged in user once.
    pub async fn connect(
        binary: impl Into<PathBuf>,
        base_path: impl Into<String>,
    ) -> Result<Self, KeybaseError> {
        let binary = binary.into();
        let base_path = base_path.into();

        let out = run(&binary, &["id", "--json"], None)
            .await
            .map_err(|e| match e {
                KeybaseError::Cli { .. } => KeybaseError::NotLoggedIn,
                e => e,
            })?;
        let username = parse_username(&out).ok_or(KeybaseError::NotLoggedIn)?;

        tracing::info!(username = %username, base_path = %base_path, "connected to keybase");
        Ok(Self {
            binary,
            base_path,
            username,
        })
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Where `path` lives in the KBFS mount
    pub fn physical_path(&self, path: &StorePath) -> String {
        physical_path(&self.username, &self.base_path, path)
    }

    async fn run(&self, args: &[&str], input: Option<&[u8]>) -> Result<Vec<u8>, KeybaseError> {
        run(&self.binary, args, input).await
    }
}

fn physical_path(username: &str, base_path: &str, path: &StorePath) -> String {
    let owner = path.owner().unwrap_or(username);
    let mut full = format!("{}/{}/{}", KBFS_ROOT, path.scope(), owner);
    if !base_path.is_empty() {
        full.push('/');
        full.push_str(base_path.trim_matches('/'));
    }
    for segment in path.segments() {
        full.push('/');
        full.push_str(segment);
    }
    full
}

/// Recipients follow `--` so none of them can be read as an option.
fn encrypt_args<'a>(full: &'a str, recipients: &'a [String]) -> Vec<&'a str> {
    let mut args = vec!["encrypt", "-o", full, "--"];
    args.extend(recipients.iter().map(String::as_str));
    args
}

fn chat_send_args<'a>(username: &'a str, message: &'a str) -> [&'a str; 5] {
    ["chat", "send", "--", username, message]
}

fn parse_username(out: &[u8]) -> Option<String> {
    let id: KeybaseId = serde_json::from_slice(out).ok()?;
    id.username.filter(|u| !u.is_empty())
}

async fn run(
    binary: &Path,
    args: &[&str],
    input: Option<&[u8]>,
) -> Result<Vec<u8>, KeybaseError> {
    tracing::trace!(args = ?args, "keybase");

    let mut child = Command::new(binary)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                KeybaseError::NotInstalled(binary.display().to_string())
            }
            _ => KeybaseError::Io(e),
        })?;

    if let Some(mut stdin) = child.stdin.take() {
        if let Some(input) = input {
            stdin.write_all(input).await?;
        }
        // Closing stdin signals end of input
        drop(stdin);
    }

    let output = child.wait_with_output().await?;
    if !output.status.success() {
        return Err(KeybaseError::Cli {
            args: args.join(" "),
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(output.stdout)
}

#[async_trait]
impl RemoteStore for KeybaseClient {
    async fn exists(&self, path: &StorePath) -> Result<bool, StoreError> {
        let full = self.physical_path(path);
        match self.run(&["fs", "stat", full.as_str()], None).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(StoreError::Backend(e.into())),
        }
    }

    async fn list_dir(
        &self,
        path: &StorePath,
        pattern: Option<&str>,
    ) -> Result<Vec<String>, StoreError> {
        let full = self.physical_path(path);
        let out = self
            .run(&["fs", "ls", full.as_str(), "-1", "--nocolor"], None)
            .await
            .map_err(|e| e.into_store_error(path))?;

        let pattern = pattern
            .map(glob::Pattern::new)
            .transpose()
            .map_err(|e| StoreError::Backend(e.into()))?;

        let names = String::from_utf8_lossy(&out)
            .lines()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .filter(|name| pattern.as_ref().map_or(true, |p| p.matches(name)))
            .map(str::to_string)
            .collect();
        Ok(names)
    }

    async fn read_file(&self, path: &StorePath) -> Result<Vec<u8>, StoreError> {
        let full = self.physical_path(path);
        self.run(&["fs", "read", full.as_str()], None)
            .await
            .map_err(|e| e.into_store_error(path))
    }

    async fn write_file(&self, path: &StorePath, data: &[u8]) -> Result<(), StoreError> {
        let full = self.physical_path(path);
        self.run(&["fs", "write", full.as_str()], Some(data))
            .await
            .map_err(|e| e.into_store_error(path))?;
        Ok(())
    }

    async fn mkdir(&self, path: &StorePath) -> Result<(), StoreError> {
        let full = self.physical_path(path);
        self.run(&["fs", "mkdir", full.as_str()], None)
            .await
            .map_err(|e| e.into_store_error(path))?;
        Ok(())
    }

    async fn encrypt_for(
        &self,
        path: &StorePath,
        data: &[u8],
        recipients: &[String],
    ) -> Result<(), StoreError> {
        let full = self.physical_path(path);
        self.run(&encrypt_args(&full, recipients), Some(data))
            .await
            .map_err(|e| e.into_store_error(path))?;
        Ok(())
    }

    async fn decrypt(&self, path: &StorePath) -> Result<Option<Vec<u8>>, StoreError> {
        let full = self.physical_path(path);
        match self.run(&["decrypt", "-i", full.as_str()], None).await {
            Ok(data) => Ok(Some(data)),
            Err(KeybaseError::Cli { stderr, .. }) => {
                tracing::debug!(path = %full, stderr = %stderr, "keybase could not decrypt");
                Ok(None)
            }
            Err(e) => Err(StoreError::Backend(e.into())),
        }
    }

    fn current_username(&self) -> &str {
        &self.username
    }

    async fn notify(&self, username: &str, message: &str) -> Result<(), StoreError> {
        self.run(&chat_send_args(username, message), None)
            .await
            .map_err(|e| StoreError::Backend(e.into()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_physical_path() {
        let path = StorePath::private()
            .join("services")
            .join("http@a.com@80")
            .join("info.json");
        assert_eq!(
            physical_path("irvin", "paranoid", &path),
            "/keybase/private/irvin/paranoid/services/http@a.com@80/info.json"
        );

        let foreign = StorePath::public().owned_by("malte").join("ids").join("ab12");
        assert_eq!(
            physical_path("irvin", "paranoid", &foreign),
            "/keybase/public/malte/paranoid/ids/ab12"
        );

        assert_eq!(
            physical_path("irvin", "", &StorePath::public()),
            "/keybase/public/irvin"
        );
    }

    #[test]
    fn test_positional_arguments_follow_separator() {
        let recipients = vec!["--infile=/home/alice/.ssh/id_rsa".to_string(), "bob".to_string()];
        assert_eq!(
            encrypt_args("/keybase/public/alice/paranoid/ids/ab", &recipients),
            vec![
                "encrypt",
                "-o",
                "/keybase/public/alice/paranoid/ids/ab",
                "--",
                "--infile=/home/alice/.ssh/id_rsa",
                "bob",
            ]
        );
        assert_eq!(
            chat_send_args("--help", "hi"),
            ["chat", "send", "--", "--help", "hi"]
        );
    }

    #[test]
    fn test_parse_username() {
        assert_eq!(
            parse_username(br#"{"username": "irvin", "uid": "abc"}"#),
            Some("irvin".to_string())
        );
        assert_eq!(parse_username(br#"{"username": ""}"#), None);
        assert_eq!(parse_username(b"not json"), None);
    }

    #[test]
    fn test_not_found_classification() {
        let path = StorePath::private().join("services");
        let err = KeybaseError::Cli {
            args: "fs read".into(),
            code: Some(1),
            stderr: "ERROR file does not exist".into(),
        };
        assert!(err.into_store_error(&path).is_not_found());

        let err = KeybaseError::Cli {
            args: "fs read".into(),
            code: Some(1),
            stderr: "ERROR permission denied".into(),
        };
        assert!(!err.into_store_error(&path).is_not_found());
    }

    #[tokio::test]
    async fn test_missing_binary_has_hint() {
        let err = KeybaseClient::connect("/nonexistent/keybase", "paranoid")
            .await
            .unwrap_err();
        assert!(matches!(err, KeybaseError::NotInstalled(_)));
        assert!(err.to_string().contains("make sure keybase is installed"));
    }
}
