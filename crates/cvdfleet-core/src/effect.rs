//! Side effects requested by the reducer
//!
//! Effects are plain data; executing them is the dispatcher's job.
//! Payloads are self-contained so the executor never has to read state.

use crate::config::RuntimeEndpoint;
use crate::state::{Environment, Wait};

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Validate a control-plane endpoint; feeds back
    /// `runtime-register-complete` or `runtime-register-error`.
    ProbeRuntime { alias: String, url: String },
    /// Re-probe every known endpoint; feeds back one `runtime-load` per
    /// item followed by `runtime-load-complete`.
    LoadRuntimes { endpoints: Vec<RuntimeEndpoint> },
    /// Issue the backend create for an environment. No completion action:
    /// settlement is observed via a later refresh.
    CreateEnvironment { env: Environment },
    /// Issue the backend delete for an environment.
    DeleteEnvironment { env: Environment },
    /// Poll the wait's URL until terminal status or timeout; feeds back
    /// `host-create-complete` or `host-create-error`.
    PollWait { wait: Wait },
}
