//! Time-boxed external process execution.

use crate::core::CommandRunner;
use crate::sensors::SourceError;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, trace};

/// Runs commands with `tokio::process`, killing the child when the budget
/// runs out.
#[derive(Debug, Clone, Default)]
pub struct TokioCommandRunner;

impl TokioCommandRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
    ) -> Result<String, SourceError> {
        trace!(program, ?args, "Spawning command");
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SourceError::Io {
                program: program.to_string(),
                source,
            })?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => {
                return Err(SourceError::Io {
                    program: program.to_string(),
                    source,
                })
            }
            Err(_) => return Err(SourceError::Timeout(timeout)),
        };

        let stderr = decode_output(&output.stderr);
        if !stderr.trim().is_empty() {
            debug!(program, stderr = %stderr.trim(), "Command wrote diagnostics");
        }

        if !output.status.success() {
            return Err(SourceError::Failed {
                program: program.to_string(),
                status: output.status.to_string(),
            });
        }

        Ok(decode_output(&output.stdout))
    }
}

/// Decodes console output, which Windows tools sometimes emit as UTF-16LE.
pub fn decode_output(bytes: &[u8]) -> String {
    let looks_utf16 = bytes.starts_with(&[0xFF, 0xFE])
        || (bytes.len() >= 4 && bytes.len() % 2 == 0 && bytes[1] == 0 && bytes[3] == 0);
    if looks_utf16 {
        let body = bytes.strip_prefix(&[0xFF, 0xFE]).unwrap_or(bytes);
        let units: Vec<u16> = body
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    String::from_utf8_lossy(bytes).into_owned()
}
