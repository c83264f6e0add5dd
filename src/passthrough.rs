//! Bash subprocess execution with before/after environment-diff capture,
//! per spec.md §4.5. This is tier 3: the fallback used whenever the
//! emitter refuses a construct, or when the caller asks for it directly.
//!
//! Grounded on the teacher's `installer::executor::StepExecutor::run_command`
//! (a thin `std::process::Command` wrapper returning captured `Output`),
//! generalized here to (a) stream the real command's stdout/stderr straight
//! to the parent rather than capturing them, and (b) run a second,
//! file-redirected snapshot script in the *same* bash process as the real
//! command, since env mutations don't survive past one `bash -c` process's
//! exit.
//!
//! Every byte of variable state is carried as raw `Vec<u8>`, never as
//! `String`: spec.md §1 names correctness "across arbitrary values
//! including binary and newline-bearing strings" as the hard requirement
//! the whole state-diffing protocol exists to satisfy, and spec.md §3
//! defines `EnvSnapshot` as a mapping of bytes to bytes plus a bytes cwd.
//! Decoding through `String::from_utf8_lossy` would silently replace
//! invalid-UTF-8 bytes with U+FFFD wherever a caller exported one.

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fs;
use std::os::unix::ffi::{OsStrExt, OsStringExt};
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::emitter::control::is_pathlist_var;
use crate::emitter::quoting;
use crate::error::ExecError;

/// Bash-internal variables never carried across a passthrough invocation —
/// per spec.md §4.5, these describe the subprocess's own identity or
/// ephemeral shell state, not anything the caller's session should adopt.
const BLOCKLIST: &[&[u8]] = &[
    b"_",
    b"SHLVL",
    b"BASHOPTS",
    b"BASH_VERSINFO",
    b"BASH_VERSION",
    b"SHELLOPTS",
    b"PWD",
    b"OLDPWD",
    b"PPID",
    b"RANDOM",
    b"SECONDS",
    b"LINENO",
    b"BASH",
    b"BASH_ARGC",
    b"BASH_ARGV",
    b"BASH_LINENO",
    b"BASH_SOURCE",
    b"BASH_SUBSHELL",
    b"FUNCNAME",
    b"GROUPS",
    b"DIRSTACK",
    b"HISTCMD",
];

/// `__REEF_<n>__` markers delimiting captured state from real command
/// output, shared between this module's snapshot protocol and the
/// daemon's persistent-bash framing (see `crate::daemon`).
static SENTINEL_COUNTER: AtomicU64 = AtomicU64::new(0);

pub struct Sentinel;

impl Sentinel {
    /// A marker unlikely to appear in ordinary command output: an
    /// incrementing counter, deterministic per process, not randomness —
    /// spec.md §4.5 only requires "unlikely to appear in values", and a
    /// counter is simpler to reason about in tests than random bytes. The
    /// marker itself is plain ASCII, so it's searched for as a byte
    /// subslice rather than requiring the surrounding capture to be valid
    /// UTF-8.
    pub fn next() -> String {
        let n = SENTINEL_COUNTER.fetch_add(1, Ordering::Relaxed);
        format!("__REEF_{n}__")
    }
}

/// A point-in-time snapshot of exported environment variables plus the
/// working directory, per spec.md §3's `EnvSnapshot`: bytes to bytes,
/// since an exported value (or, in principle, the cwd) is not guaranteed
/// to be valid UTF-8.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    pub vars: BTreeMap<Vec<u8>, Vec<u8>>,
    pub cwd: Vec<u8>,
}

/// Options accepted by [`bash_exec`], mirroring the `bash-exec` CLI
/// subcommand's flags (spec.md §6).
#[derive(Debug, Clone, Default)]
pub struct BashExecOptions<'a> {
    /// Emit an env-delta script after the command's own output.
    pub env_diff: bool,
    /// Seed/persist variable state across invocations via a file in the
    /// `env -0` snapshot format (spec.md §4.5's state-file variant).
    pub state_file: Option<&'a Path>,
}

/// Result of a [`bash_exec`] call.
#[derive(Debug, Clone)]
pub struct BashExecResult {
    pub exit_code: i32,
    pub env_delta_script: Vec<u8>,
}

/// Runs `input` under a real bash subprocess, streaming its stdout/stderr
/// straight to this process's own, and returns the exit code plus (when
/// requested) a host-shell env-delta script reflecting what the command
/// changed.
pub fn bash_exec(input: &str, options: &BashExecOptions<'_>) -> Result<BashExecResult, ExecError> {
    let seed = match options.state_file {
        Some(path) => read_state_file(path)?,
        None => BTreeMap::new(),
    };

    let before = match options.state_file {
        Some(_) => EnvSnapshot {
            vars: seed.clone(),
            cwd: std::env::current_dir()
                .map(|p| p.into_os_string().into_vec())
                .unwrap_or_default(),
        },
        None => capture_snapshot(&seed)?,
    };

    let want_delta = options.env_diff || options.state_file.is_some();

    if !want_delta {
        let status = Command::new("bash")
            .arg("-c")
            .arg(input)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()?;
        return Ok(BashExecResult {
            exit_code: status.code().unwrap_or(1),
            env_delta_script: Vec::new(),
        });
    }

    let dump_file = tempfile::NamedTempFile::new().map_err(|e| ExecError::Io(e.to_string()))?;
    let dump_path = dump_file.path().display().to_string();
    let sentinel = Sentinel::next();
    let script = format!(
        "{input}; {{ printf '%s' '{sentinel}'; env -0; printf '%s' '{sentinel}'; pwd; }} > {}",
        quoting::single_quote(&dump_path)
    );

    let mut cmd = Command::new("bash");
    cmd.arg("-c")
        .arg(&script)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());
    for (key, value) in &seed {
        cmd.env(bytes_as_os_str(key), bytes_as_os_str(value));
    }
    let status = cmd.status()?;

    let raw = fs::read(dump_file.path()).map_err(|e| ExecError::Io(e.to_string()))?;
    let after = parse_snapshot(&raw, sentinel.as_bytes())?;

    if let Some(path) = options.state_file {
        write_state_file(path, &after.vars)?;
    }

    let env_delta_script = render_delta(&before, &after);

    Ok(BashExecResult {
        exit_code: status.code().unwrap_or(1),
        env_delta_script,
    })
}

/// Runs a bare snapshot-only bash invocation (no real command), used to
/// obtain the "before" state when no state file seeds it.
fn capture_snapshot(seed: &BTreeMap<Vec<u8>, Vec<u8>>) -> Result<EnvSnapshot, ExecError> {
    let sentinel = Sentinel::next();
    let script = format!("printf '%s' '{sentinel}'; env -0; printf '%s' '{sentinel}'; pwd");
    let mut cmd = Command::new("bash");
    cmd.arg("-c").arg(&script).stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::null());
    for (key, value) in seed {
        cmd.env(bytes_as_os_str(key), bytes_as_os_str(value));
    }
    let output = cmd.output()?;
    parse_snapshot(&output.stdout, sentinel.as_bytes())
}

/// Views a byte slice as an `OsStr` for handing to [`Command::env`] — sound
/// on Unix, where `OsStr` is just bytes (the daemon's use of
/// `std::os::unix::net` already ties this crate to Unix).
fn bytes_as_os_str(bytes: &[u8]) -> &OsStr {
    OsStr::from_bytes(bytes)
}

/// Splits `sentinel{env-dump}sentinel{pwd}\n` into an [`EnvSnapshot`], at
/// the byte level throughout so a binary-valued export survives intact.
fn parse_snapshot(raw: &[u8], sentinel: &[u8]) -> Result<EnvSnapshot, ExecError> {
    let after_first = raw
        .strip_prefix(sentinel)
        .ok_or_else(|| ExecError::Io("snapshot output missing leading sentinel".to_string()))?;
    let split_at = find_subslice(after_first, sentinel)
        .ok_or_else(|| ExecError::Io("snapshot output missing trailing sentinel".to_string()))?;
    let env_block = &after_first[..split_at];
    let mut cwd = after_first[split_at + sentinel.len()..].to_vec();
    while cwd.last() == Some(&b'\n') {
        cwd.pop();
    }
    let mut vars = BTreeMap::new();
    for entry in env_block.split(|&b| b == 0) {
        if entry.is_empty() {
            continue;
        }
        if let Some(eq) = entry.iter().position(|&b| b == b'=') {
            vars.insert(entry[..eq].to_vec(), entry[eq + 1..].to_vec());
        }
    }
    Ok(EnvSnapshot { vars, cwd })
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Builds the host-shell env-delta script for the diff of `before`→`after`,
/// per spec.md §4.5's ordering: added/modified assignments, then removed
/// unsets, then a directory change. Returned as raw bytes, not `String`:
/// an added/modified value may contain bytes that aren't valid UTF-8.
/// Variable *names*, unlike values, are assumed to be bash identifiers
/// (ASCII letters, digits, underscore) — the only shapes `export`/`env -0`
/// ever produce for a name — so they're safely rendered through `&str`.
pub(crate) fn render_delta(before: &EnvSnapshot, after: &EnvSnapshot) -> Vec<u8> {
    let mut lines: Vec<Vec<u8>> = Vec::new();

    for (name, value) in &after.vars {
        if BLOCKLIST.contains(&name.as_slice()) {
            continue;
        }
        if before.vars.get(name) != Some(value) {
            let name_str = String::from_utf8_lossy(name);
            let mut line = if is_pathlist_var(&name_str) {
                format!("set -gx {name_str} (string split ':' -- ").into_bytes()
            } else {
                format!("set -gx {name_str} ").into_bytes()
            };
            line.extend(quoting::single_quote_bytes(value));
            if is_pathlist_var(&name_str) {
                line.push(b')');
            }
            lines.push(line);
        }
    }

    for name in before.vars.keys() {
        if BLOCKLIST.contains(&name.as_slice()) {
            continue;
        }
        if !after.vars.contains_key(name) {
            let name_str = String::from_utf8_lossy(name);
            lines.push(format!("set -e {name_str}").into_bytes());
        }
    }

    if !before.cwd.is_empty() && before.cwd != after.cwd {
        let mut line = b"cd ".to_vec();
        line.extend(quoting::single_quote_bytes(&after.cwd));
        lines.push(line);
    }

    let mut out = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            out.push(b'\n');
        }
        out.extend_from_slice(line);
    }
    out
}

/// Reads a caller-supplied state file in `env -0` format (spec.md §4.5's
/// state-file variant). A missing file seeds an empty environment rather
/// than erroring — first use of a fresh state file is expected.
fn read_state_file(path: &Path) -> Result<BTreeMap<Vec<u8>, Vec<u8>>, ExecError> {
    match fs::read(path) {
        Ok(bytes) => {
            let mut vars = BTreeMap::new();
            for entry in bytes.split(|&b| b == 0) {
                if entry.is_empty() {
                    continue;
                }
                if let Some(eq) = entry.iter().position(|&b| b == b'=') {
                    vars.insert(entry[..eq].to_vec(), entry[eq + 1..].to_vec());
                }
            }
            Ok(vars)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
        Err(e) => Err(ExecError::Io(e.to_string())),
    }
}

/// Overwrites the state file with the post-execution snapshot, in the
/// same `env -0` NUL-separated format it's read back in.
fn write_state_file(path: &Path, vars: &BTreeMap<Vec<u8>, Vec<u8>>) -> Result<(), ExecError> {
    let mut buf = Vec::new();
    for (key, value) in vars {
        buf.extend_from_slice(key);
        buf.push(b'=');
        buf.extend_from_slice(value);
        buf.push(0);
    }
    fs::write(path, buf).map_err(|e| ExecError::Io(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_increments() {
        let a = Sentinel::next();
        let b = Sentinel::next();
        assert_ne!(a, b);
        assert!(a.starts_with("__REEF_"));
    }

    #[test]
    fn parse_snapshot_splits_env_and_cwd() {
        let sentinel = b"__REEF_TEST__";
        let raw = [sentinel.as_slice(), b"FOO=bar\0BAZ=qux\0", sentinel.as_slice(), b"/tmp\n"].concat();
        let snap = parse_snapshot(&raw, sentinel).unwrap();
        assert_eq!(snap.vars.get(b"FOO".as_slice()), Some(&b"bar".to_vec()));
        assert_eq!(snap.vars.get(b"BAZ".as_slice()), Some(&b"qux".to_vec()));
        assert_eq!(snap.cwd, b"/tmp".to_vec());
    }

    #[test]
    fn parse_snapshot_preserves_invalid_utf8_in_values() {
        let sentinel = b"__REEF_TEST__";
        let mut raw = sentinel.to_vec();
        raw.extend_from_slice(b"FOO=a\xFFb\0");
        raw.extend_from_slice(sentinel);
        raw.extend_from_slice(b"/tmp\n");
        let snap = parse_snapshot(&raw, sentinel).unwrap();
        assert_eq!(snap.vars.get(b"FOO".as_slice()), Some(&vec![b'a', 0xFF, b'b']));
    }

    #[test]
    fn render_delta_emits_added_modified_removed_and_cd() {
        let mut before = EnvSnapshot::default();
        before.vars.insert(b"KEEP".to_vec(), b"1".to_vec());
        before.vars.insert(b"GONE".to_vec(), b"1".to_vec());
        before.cwd = b"/start".to_vec();

        let mut after = EnvSnapshot::default();
        after.vars.insert(b"KEEP".to_vec(), b"2".to_vec());
        after.vars.insert(b"NEW".to_vec(), b"3".to_vec());
        after.cwd = b"/end".to_vec();

        let out = render_delta(&before, &after);
        let out_str = String::from_utf8(out).unwrap();
        assert!(out_str.contains("set -gx KEEP '2'"));
        assert!(out_str.contains("set -gx NEW '3'"));
        assert!(out_str.contains("set -e GONE"));
        assert!(out_str.contains("cd '/end'"));
    }

    #[test]
    fn render_delta_filters_blocklisted_names() {
        let before = EnvSnapshot::default();
        let mut after = EnvSnapshot::default();
        after.vars.insert(b"SHLVL".to_vec(), b"2".to_vec());
        let out = render_delta(&before, &after);
        assert!(out.is_empty());
    }

    #[test]
    fn render_delta_splits_pathlist_vars() {
        let before = EnvSnapshot::default();
        let mut after = EnvSnapshot::default();
        after.vars.insert(b"CUSTOM_PATH".to_vec(), b"/a:/b".to_vec());
        let out = render_delta(&before, &after);
        let out_str = String::from_utf8(out).unwrap();
        assert!(out_str.contains("string split ':'"));
    }

    #[test]
    fn render_delta_preserves_binary_value_bytes() {
        let before = EnvSnapshot::default();
        let mut after = EnvSnapshot::default();
        after.vars.insert(b"BINVAL".to_vec(), vec![b'a', 0xFF, b'b']);
        let out = render_delta(&before, &after);
        assert!(out.windows(3).any(|w| w == [b'a', 0xFF, b'b']));
    }

    #[test]
    fn bash_exec_streams_without_diff_by_default() {
        let result = bash_exec("exit 7", &BashExecOptions::default()).unwrap();
        assert_eq!(result.exit_code, 7);
        assert!(result.env_delta_script.is_empty());
    }

    #[test]
    fn bash_exec_captures_env_diff() {
        let options = BashExecOptions { env_diff: true, state_file: None };
        let result = bash_exec("export REEF_TEST_VAR=hello", &options).unwrap();
        assert_eq!(result.exit_code, 0);
        let out_str = String::from_utf8(result.env_delta_script).unwrap();
        assert!(out_str.contains("REEF_TEST_VAR"));
        assert!(out_str.contains("hello"));
    }
}
