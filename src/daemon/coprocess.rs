//! The persistent bash child process behind `daemon`, per spec.md §5, §9:
//! "a single reader thread consumes the coprocess's stdout while the main
//! thread writes commands; the protocol serializes one command at a
//! time."
//!
//! Grounded on [`crate::passthrough`]'s sentinel-delimited snapshot
//! protocol, extended to run inside one long-lived `bash -i`-less process
//! instead of spawning a fresh subprocess per command — the whole point of
//! the daemon is that shell state (cwd, exported vars, shopts) persists
//! between calls without a state file. Stdout and stderr are merged at
//! the point each command is sent (`{ ...; } 2>&1`), matching the spec's
//! singular "the coprocess's stdout."

use std::io::{Read, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::thread;

use crate::error::ExecError;
use crate::passthrough::Sentinel;

/// Bytes read from the coprocess's stdout, forwarded from the background
/// reader thread to whichever call to [`Coprocess::run`] is waiting.
enum ReaderEvent {
    Chunk(Vec<u8>),
    Eof,
    Err(String),
}

pub struct Coprocess {
    child: Child,
    stdin: ChildStdin,
    rx: Receiver<ReaderEvent>,
}

/// Outcome of one command run through the coprocess.
pub struct CoprocessOutcome {
    /// Merged stdout/stderr bytes produced by the command itself (protocol
    /// markers stripped out).
    pub output: Vec<u8>,
    pub exit_code: i32,
    pub env_delta_script: Vec<u8>,
}

impl Coprocess {
    /// Spawns `bash` with piped stdin/stdout and starts the background
    /// reader thread. stderr is left merged per-command (see module docs)
    /// rather than piped here, since each command redirects its own.
    pub fn spawn() -> Result<Self, ExecError> {
        let mut child = Command::new("bash")
            .arg("--norc")
            .arg("--noprofile")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        let stdin = child.stdin.take().expect("piped stdin");
        let mut stdout = child.stdout.take().expect("piped stdout");

        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut buf = [0u8; 8192];
            loop {
                match stdout.read(&mut buf) {
                    Ok(0) => {
                        let _ = tx.send(ReaderEvent::Eof);
                        break;
                    }
                    Ok(n) => {
                        if tx.send(ReaderEvent::Chunk(buf[..n].to_vec())).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        let _ = tx.send(ReaderEvent::Err(e.to_string()));
                        break;
                    }
                }
            }
        });

        Ok(Coprocess { child, stdin, rx })
    }

    /// Runs one command in the coprocess, blocking until its output,
    /// exit code, and env delta are fully captured.
    ///
    /// Sends a script that (1) runs `input` with stderr folded into
    /// stdout, (2) records `$?`, (3) prints an exit sentinel carrying the
    /// status, (4) dumps `env -0` and `pwd` bracketed by a second
    /// sentinel — the same shape [`crate::passthrough::bash_exec`] writes
    /// to a temp file, inlined onto the shared stdout stream instead.
    pub fn run(&mut self, input: &str, before_env: &crate::passthrough::EnvSnapshot) -> Result<CoprocessOutcome, ExecError> {
        let exit_sentinel = Sentinel::next();
        let snap_sentinel = Sentinel::next();

        let script = format!(
            "{{ {input}\n}} 2>&1\n__REEF_STATUS=$?\nprintf '\\n%s %d\\n' '{exit_sentinel}' \"$__REEF_STATUS\"\nprintf '%s' '{snap_sentinel}'\nenv -0\nprintf '%s' '{snap_sentinel}'\npwd\n"
        );
        self.stdin
            .write_all(script.as_bytes())
            .map_err(|e| ExecError::Io(e.to_string()))?;
        self.stdin.flush().map_err(|e| ExecError::Io(e.to_string()))?;

        let mut buf: Vec<u8> = Vec::new();
        loop {
            if let Some(outcome) = try_parse(&buf, &exit_sentinel, &snap_sentinel, before_env)? {
                return Ok(outcome);
            }
            match self.rx.recv() {
                Ok(ReaderEvent::Chunk(mut bytes)) => buf.append(&mut bytes),
                Ok(ReaderEvent::Eof) => {
                    return Err(ExecError::Io("bash coprocess closed stdout unexpectedly".to_string()))
                }
                Ok(ReaderEvent::Err(msg)) => return Err(ExecError::Io(msg)),
                Err(_) => return Err(ExecError::Io("bash coprocess reader thread exited".to_string())),
            }
        }
    }

    /// Captures the current state of the coprocess's shell as an
    /// [`crate::passthrough::EnvSnapshot`], without running a caller
    /// command — used to seed `before_env` for the first `run` and to
    /// refresh it between calls.
    pub fn snapshot(&mut self) -> Result<crate::passthrough::EnvSnapshot, ExecError> {
        let snap_sentinel = Sentinel::next();
        let script = format!("printf '%s' '{snap_sentinel}'\nenv -0\nprintf '%s' '{snap_sentinel}'\npwd\n");
        self.stdin
            .write_all(script.as_bytes())
            .map_err(|e| ExecError::Io(e.to_string()))?;
        self.stdin.flush().map_err(|e| ExecError::Io(e.to_string()))?;

        let mut buf: Vec<u8> = Vec::new();
        loop {
            if let Some(snap) = try_parse_snapshot_only(&buf, &snap_sentinel) {
                return Ok(snap);
            }
            match self.rx.recv() {
                Ok(ReaderEvent::Chunk(mut bytes)) => buf.append(&mut bytes),
                Ok(ReaderEvent::Eof) => {
                    return Err(ExecError::Io("bash coprocess closed stdout unexpectedly".to_string()))
                }
                Ok(ReaderEvent::Err(msg)) => return Err(ExecError::Io(msg)),
                Err(_) => return Err(ExecError::Io("bash coprocess reader thread exited".to_string())),
            }
        }
    }

    /// Terminates the coprocess. Best-effort: a process that refuses to
    /// exit on EOF of its stdin is killed outright.
    pub fn shutdown(mut self) {
        drop(self.stdin);
        if self.child.wait().is_err() {
            let _ = self.child.kill();
        }
    }
}

/// Byte-level subslice search — sentinels and the framing text around them
/// are always plain ASCII, but the buffer they're searched in may carry
/// arbitrary (including invalid-UTF-8) command output or env values, so
/// this never decodes the buffer through `String` first.
fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn try_parse_snapshot_only(buf: &[u8], snap_sentinel: &str) -> Option<crate::passthrough::EnvSnapshot> {
    let sentinel = snap_sentinel.as_bytes();
    let after_first = buf.strip_prefix(sentinel)?;
    let split_at = find_subslice(after_first, sentinel)?;
    let env_block = &after_first[..split_at];
    let rest = &after_first[split_at + sentinel.len()..];
    if !rest.contains(&b'\n') {
        return None;
    }
    let mut cwd = rest.to_vec();
    while cwd.last() == Some(&b'\n') {
        cwd.pop();
    }
    let mut vars = std::collections::BTreeMap::new();
    for entry in env_block.split(|&b| b == 0) {
        if entry.is_empty() {
            continue;
        }
        if let Some(eq) = entry.iter().position(|&b| b == b'=') {
            vars.insert(entry[..eq].to_vec(), entry[eq + 1..].to_vec());
        }
    }
    Some(crate::passthrough::EnvSnapshot { vars, cwd })
}

/// Attempts to parse a complete response out of the accumulated buffer;
/// returns `None` when more bytes are needed.
fn try_parse(
    buf: &[u8],
    exit_sentinel: &str,
    snap_sentinel: &str,
    before_env: &crate::passthrough::EnvSnapshot,
) -> Result<Option<CoprocessOutcome>, ExecError> {
    let exit_marker = format!("\n{exit_sentinel} ").into_bytes();
    let Some(exit_pos) = find_subslice(buf, &exit_marker) else {
        return Ok(None);
    };
    let output = buf[..exit_pos].to_vec();
    let after_marker = &buf[exit_pos + exit_marker.len()..];
    let Some(newline_pos) = after_marker.iter().position(|&b| b == b'\n') else {
        return Ok(None);
    };
    let status_bytes = &after_marker[..newline_pos];
    let status_str = String::from_utf8_lossy(status_bytes);
    let exit_code: i32 = status_str
        .trim()
        .parse()
        .map_err(|_| ExecError::Io(format!("malformed exit status {status_str:?}")))?;

    let rest = &after_marker[newline_pos + 1..];
    let Some(snap_tail) = try_parse_snapshot_only(rest, snap_sentinel) else {
        return Ok(None);
    };

    let env_delta_script = crate::passthrough::render_delta(before_env, &snap_tail);

    Ok(Some(CoprocessOutcome {
        output,
        exit_code,
        env_delta_script,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passthrough::EnvSnapshot;

    #[test]
    fn try_parse_returns_none_on_partial_buffer() {
        let before = EnvSnapshot::default();
        let result = try_parse(b"partial output without markers", "SENT1", "SENT2", &before).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn try_parse_extracts_output_status_and_snapshot() {
        let before = EnvSnapshot::default();
        let buf = b"hello world\nSENT1 0\nSENT2FOO=bar\0SENT2/tmp\n".to_vec();
        let outcome = try_parse(&buf, "SENT1", "SENT2", &before).unwrap().unwrap();
        assert_eq!(outcome.output, b"hello world");
        assert_eq!(outcome.exit_code, 0);
        assert!(outcome.env_delta_script.windows(3).any(|w| w == b"FOO"));
    }

    #[test]
    fn try_parse_handles_nonzero_exit() {
        let before = EnvSnapshot::default();
        let buf = b"\nSENT1 7\nSENT2SENT2/tmp\n".to_vec();
        let outcome = try_parse(&buf, "SENT1", "SENT2", &before).unwrap().unwrap();
        assert_eq!(outcome.exit_code, 7);
    }

    #[test]
    fn real_bash_coprocess_runs_sequential_commands() {
        let mut proc = Coprocess::spawn().unwrap();
        let before = proc.snapshot().unwrap();
        let outcome = proc.run("echo hi; export REEF_DAEMON_TEST=1", &before).unwrap();
        assert_eq!(outcome.exit_code, 0);
        assert_eq!(String::from_utf8_lossy(&outcome.output).trim(), "hi");
        assert!(outcome.env_delta_script.windows(16).any(|w| w == b"REEF_DAEMON_TEST"));

        let after = proc.snapshot().unwrap();
        let outcome2 = proc.run("pwd", &after).unwrap();
        assert_eq!(outcome2.exit_code, 0);
        proc.shutdown();
    }

    #[test]
    fn real_bash_coprocess_preserves_cwd_across_commands() {
        let mut proc = Coprocess::spawn().unwrap();
        let before = proc.snapshot().unwrap();
        proc.run("cd /tmp", &before).unwrap();
        let after = proc.snapshot().unwrap();
        assert_eq!(after.cwd, b"/tmp".to_vec());
        proc.shutdown();
    }
}
