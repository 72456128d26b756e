use std::time::Instant;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::Engine;
use crate::outcome::{Outcome, STATUS_UNKNOWN};
use crate::staging::StagingArea;

/// Unique identifier of one engine invocation.
pub type InvocationId = Uuid;

/// Record of a single engine call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invocation {
    pub id: InvocationId,
    /// Raw status as reported by the engine adapter.
    pub status: i32,
    pub outcome: Outcome,
    pub elapsed_ms: u64,
}

impl Invocation {
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }
}

/// Performs exactly one blocking engine call per [`invoke`](Self::invoke).
pub struct ComputationInvoker<E> {
    engine: E,
}

impl<E: Engine> ComputationInvoker<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    /// Run the engine against the staged input and classify its status.
    ///
    /// Artifacts from an earlier run are removed first, so after a failed
    /// invocation nothing stale can be read back as if it were current.
    pub fn invoke(&mut self, staging: &StagingArea) -> Invocation {
        let id = Uuid::new_v4();
        let start = Instant::now();

        if let Err(e) = staging.clear_artifacts() {
            log::warn!("invocation {id}: could not clear previous artifacts: {e}");
        }

        log::info!("invocation {id}: calling engine '{}'", self.engine.name());
        let status = match self.engine.compute(staging) {
            Ok(status) => status,
            Err(e) => {
                log::error!("invocation {id}: {e}");
                STATUS_UNKNOWN
            }
        };

        let outcome = Outcome::from_status(status);
        if !Outcome::is_documented_status(status) {
            log::warn!("invocation {id}: undocumented engine status {status}, treated as {outcome}");
        }

        let elapsed_ms = start.elapsed().as_millis() as u64;
        if outcome.is_success() {
            log::info!("invocation {id}: {outcome} in {elapsed_ms} ms");
        } else {
            log::warn!("invocation {id}: {outcome} (status {status}) in {elapsed_ms} ms");
        }

        Invocation {
            id,
            status,
            outcome,
            elapsed_ms,
        }
    }
}
