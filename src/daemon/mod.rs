//! Persistent bash coprocess manager, addressed by a Unix-domain socket,
//! per spec.md §6: `daemon {start|stop|exec} --socket PATH`.
//!
//! Daemon *internals* are explicitly out of scope for the core's
//! correctness proofs (spec.md §1 lists "the optional persistent-bash
//! coprocess lifecycle" among the external collaborators), but the
//! protocol and a working implementation live here since spec.md §6
//! names `daemon` as one of the four subcommands the binary exposes.
//! Process supervision (backgrounding `start`, restart policy) is left to
//! the external collaborator that invokes this binary — `start` simply
//! runs the accept loop on the calling thread until `stop` or signal.

pub mod client;
pub mod coprocess;
pub mod protocol;
pub mod server;

pub use client::{exec, DaemonExecResult};
pub use server::{start, stop};
