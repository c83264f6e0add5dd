//! `daemon exec` client half: sends one request frame to a running daemon
//! and relays the response back to the caller, per spec.md §6: "`exec`
//! sends the input to the daemon and reads back streamed output plus
//! env-delta script."

use std::io::BufReader;
use std::os::unix::net::UnixStream;
use std::path::Path;

use crate::daemon::protocol::{read_frame, write_frame, FrameTag};
use crate::error::ExecError;

/// Result of one `daemon exec` round trip.
#[derive(Debug, Clone)]
pub struct DaemonExecResult {
    pub output: Vec<u8>,
    pub exit_code: i32,
    pub env_delta_script: Vec<u8>,
}

/// Sends `input` to the daemon listening at `socket_path` and waits for
/// its full response. Returns [`ExecError::Io`] if no daemon is
/// listening — callers (see `cli`) treat that the same as any other
/// `bash-exec` failure and may choose to fall back to a one-shot
/// [`crate::passthrough::bash_exec`].
pub fn exec(socket_path: &Path, input: &str) -> Result<DaemonExecResult, ExecError> {
    let mut stream = UnixStream::connect(socket_path).map_err(|e| ExecError::Io(e.to_string()))?;
    write_frame(&mut stream, FrameTag::Request, input.as_bytes()).map_err(|e| ExecError::Io(e.to_string()))?;
    stream
        .shutdown(std::net::Shutdown::Write)
        .map_err(|e| ExecError::Io(e.to_string()))?;

    let mut reader = BufReader::new(stream);
    let mut output = Vec::new();
    let mut env_delta_script = Vec::new();
    let mut exit_code = None;

    while let Some((tag, payload)) = read_frame(&mut reader).map_err(|e| ExecError::Io(e.to_string()))? {
        match tag {
            FrameTag::Output => output.extend_from_slice(&payload),
            FrameTag::EnvDelta => env_delta_script = payload,
            FrameTag::End => {
                let bytes: [u8; 4] = payload
                    .try_into()
                    .map_err(|_| ExecError::Io("malformed exit-code frame".to_string()))?;
                exit_code = Some(i32::from_le_bytes(bytes));
                break;
            }
            other => return Err(ExecError::Io(format!("unexpected frame {other:?} from daemon"))),
        }
    }

    let exit_code = exit_code.ok_or_else(|| ExecError::Io("daemon closed connection without an End frame".to_string()))?;

    Ok(DaemonExecResult {
        output,
        exit_code,
        env_delta_script,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::daemon::protocol::{write_frame, FrameTag};
    use std::os::unix::net::UnixListener;

    #[test]
    fn exec_relays_frames_from_a_fake_daemon() {
        let dir = tempfile::tempdir().unwrap();
        let socket_path = dir.path().join("reef-test.sock");
        let listener = UnixListener::bind(&socket_path).unwrap();

        let server_socket = socket_path.clone();
        let handle = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let (tag, payload) = read_frame(&mut stream).unwrap().unwrap();
            assert_eq!(tag, FrameTag::Request);
            assert_eq!(payload, b"echo hi");
            write_frame(&mut stream, FrameTag::Output, b"hi\n").unwrap();
            write_frame(&mut stream, FrameTag::EnvDelta, b"").unwrap();
            write_frame(&mut stream, FrameTag::End, &0i32.to_le_bytes()).unwrap();
            let _ = server_socket;
        });

        let result = exec(&socket_path, "echo hi").unwrap();
        assert_eq!(result.output, b"hi\n");
        assert_eq!(result.exit_code, 0);
        assert!(result.env_delta_script.is_empty());
        handle.join().unwrap();
    }

    #[test]
    fn exec_fails_cleanly_when_no_daemon_is_listening() {
        let dir = tempfile::tempdir().unwrap();
        let socket_path = dir.path().join("no-daemon.sock");
        let err = exec(&socket_path, "echo hi").unwrap_err();
        assert!(matches!(err, ExecError::Io(_)));
    }
}
