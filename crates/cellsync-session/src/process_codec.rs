// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! [`SourceCodec`] backed by an external command.
//!
//! One child process per call. The request is a single JSON object on stdin:
//!
//! ```json
//! {"op": "serialize", "ir": { ... }}
//! {"op": "deserialize", "source": "..."}
//! ```
//!
//! The command answers with `{"ok": <value>}` or `{"error": "<message>"}` on
//! stdout. The child is spawned with `kill_on_drop`, so a cancelled call
//! takes the process down with it.

use crate::codec::{CodecError, SourceCodec};
use cellsync_app_core::prefs::CodecPrefs;
use cellsync_core::NotebookIr;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

#[derive(Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum CodecRequest<'a> {
    Serialize { ir: &'a NotebookIr },
    Deserialize { source: &'a str },
}

#[derive(Deserialize)]
struct CodecResponse<T> {
    ok: Option<T>,
    error: Option<String>,
}

/// Codec that shells out to a configured command.
#[derive(Debug, Clone)]
pub struct CommandCodec {
    program: String,
    args: Vec<String>,
}

impl CommandCodec {
    /// Codec running `program args...`.
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Codec configured from saved prefs.
    pub fn from_prefs(prefs: &CodecPrefs) -> Self {
        Self::new(prefs.program.clone(), prefs.args.iter().cloned())
    }

    /// Program that will be spawned.
    pub fn program(&self) -> &str {
        &self.program
    }

    async fn call<T: DeserializeOwned>(&self, request: &CodecRequest<'_>) -> Result<T, CodecError> {
        let payload = serde_json::to_vec(request)?;
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| CodecError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        // stdin is fed while stdout/stderr drain, so neither side can block
        // on a full pipe.
        let writer = child.stdin.take().map(|mut stdin| {
            tokio::spawn(async move {
                stdin.write_all(&payload).await?;
                stdin.shutdown().await
            })
        });
        let output = child.wait_with_output().await?;
        let written = match writer {
            Some(task) => task
                .await
                .map_err(|e| CodecError::Other(format!("codec stdin writer failed: {e}")))?,
            None => Ok(()),
        };
        debug!(
            program = %self.program,
            status = %output.status,
            stdout_len = output.stdout.len(),
            "codec call finished"
        );

        if !output.status.success() {
            return Err(CodecError::Exit {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }
        written?;

        let response: CodecResponse<T> = serde_json::from_slice(&output.stdout)?;
        match (response.ok, response.error) {
            (_, Some(message)) => Err(CodecError::Rejected(message)),
            (Some(value), None) => Ok(value),
            (None, None) => Err(CodecError::Other("codec returned neither `ok` nor `error`".into())),
        }
    }
}

impl SourceCodec for CommandCodec {
    fn serialize(&self, ir: &NotebookIr) -> impl Future<Output = Result<String, CodecError>> + Send {
        async move { self.call(&CodecRequest::Serialize { ir }).await }
    }

    fn deserialize(&self, source: &str) -> impl Future<Output = Result<NotebookIr, CodecError>> + Send {
        async move { self.call(&CodecRequest::Deserialize { source }).await }
    }
}
