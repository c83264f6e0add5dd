//! Accept loop for `daemon start`: binds a Unix-domain socket and serves
//! `daemon exec`/`daemon stop` requests against one shared [`Coprocess`],
//! per spec.md §6's `daemon {start|stop|exec} --socket PATH` surface.
//!
//! One coprocess, one command at a time: spec.md §5 requires the protocol
//! to serialize command execution, so the accept loop itself — not a
//! lock — provides that serialization by handling connections one at a
//! time on the main thread.

use std::fs;
use std::io::{BufReader, BufWriter};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::Path;

use tracing::{info, warn};

use crate::daemon::coprocess::Coprocess;
use crate::daemon::protocol::{read_frame, write_frame, FrameTag};
use crate::error::ExecError;
use crate::passthrough::EnvSnapshot;

/// Runs the daemon's accept loop until a `Shutdown` frame is received or
/// the socket is removed out from under it. Binds `socket_path`, removing
/// a stale socket file left behind by an unclean previous exit.
pub fn start(socket_path: &Path) -> Result<(), ExecError> {
    if socket_path.exists() {
        fs::remove_file(socket_path).map_err(|e| ExecError::Io(e.to_string()))?;
    }
    let listener = UnixListener::bind(socket_path).map_err(|e| ExecError::Io(e.to_string()))?;
    info!(socket = %socket_path.display(), "daemon listening");

    let mut coprocess = Coprocess::spawn()?;
    let mut last_env = coprocess.snapshot()?;

    for conn in listener.incoming() {
        let stream = match conn {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "failed to accept daemon connection");
                continue;
            }
        };
        match handle_connection(stream, &mut coprocess, &mut last_env) {
            Ok(ConnectionOutcome::Continue) => {}
            Ok(ConnectionOutcome::Shutdown) => break,
            Err(e) => warn!(error = %e, "error serving daemon connection"),
        }
    }

    coprocess.shutdown();
    let _ = fs::remove_file(socket_path);
    Ok(())
}

enum ConnectionOutcome {
    Continue,
    Shutdown,
}

fn handle_connection(
    stream: UnixStream,
    coprocess: &mut Coprocess,
    last_env: &mut EnvSnapshot,
) -> Result<ConnectionOutcome, ExecError> {
    let mut reader = BufReader::new(stream.try_clone().map_err(|e| ExecError::Io(e.to_string()))?);
    let mut writer = BufWriter::new(stream);

    let Some((tag, payload)) = read_frame(&mut reader).map_err(|e| ExecError::Io(e.to_string()))? else {
        return Ok(ConnectionOutcome::Continue);
    };

    match tag {
        FrameTag::Shutdown => Ok(ConnectionOutcome::Shutdown),
        FrameTag::Request => {
            let input = String::from_utf8_lossy(&payload).into_owned();
            let outcome = coprocess.run(&input, last_env)?;
            *last_env = coprocess.snapshot()?;

            write_frame(&mut writer, FrameTag::Output, &outcome.output).map_err(|e| ExecError::Io(e.to_string()))?;
            write_frame(&mut writer, FrameTag::EnvDelta, &outcome.env_delta_script)
                .map_err(|e| ExecError::Io(e.to_string()))?;
            write_frame(&mut writer, FrameTag::End, &outcome.exit_code.to_le_bytes())
                .map_err(|e| ExecError::Io(e.to_string()))?;
            Ok(ConnectionOutcome::Continue)
        }
        other => Err(ExecError::Io(format!("unexpected frame {other:?} from client"))),
    }
}

/// Connects to a running daemon and asks it to stop serving. Returns
/// `Ok(false)` (not an error) when no daemon is listening at `socket_path`
/// — `daemon stop` on an already-stopped daemon is a no-op, not a failure.
pub fn stop(socket_path: &Path) -> Result<bool, ExecError> {
    let Ok(mut stream) = UnixStream::connect(socket_path) else {
        return Ok(false);
    };
    write_frame(&mut stream, FrameTag::Shutdown, &[]).map_err(|e| ExecError::Io(e.to_string()))?;
    Ok(true)
}
