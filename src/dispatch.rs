//! Sequential, paced delivery of one command to a list of targets.
//!
//! The bridge's controller rejects bursts, so requests go out one at a
//! time with a fixed pause in between. Targets fail independently; a
//! refused or unreachable target never stops the rest of the batch.

use std::time::Duration;

use crate::bridge::{BridgeApi, CommandLight};
use crate::resolver::Target;

const PACING_DELAY: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub succeeded: usize,
    pub failed: usize,
}

pub struct Dispatcher {
    pacing: Duration,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Dispatcher {
            pacing: PACING_DELAY,
        }
    }
}

impl Dispatcher {
    pub fn new() -> Dispatcher {
        Dispatcher::default()
    }

    #[cfg(test)]
    fn with_pacing(pacing: Duration) -> Dispatcher {
        Dispatcher { pacing }
    }

    /// Issues one PUT per target, strictly in order, pausing between
    /// requests regardless of the previous outcome. An empty target list
    /// incurs neither requests nor delay.
    pub async fn dispatch<B: BridgeApi>(
        &self,
        bridge: &B,
        targets: &[Target],
        command: &CommandLight,
    ) -> DispatchOutcome {
        let mut outcome = DispatchOutcome::default();
        for (index, target) in targets.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.pacing).await;
            }
            match bridge.put_command(target.kind, &target.id, command).await {
                Ok(()) => {
                    log::info!("updated {}/{}", target.kind, target.id);
                    outcome.succeeded += 1;
                }
                Err(e) => {
                    log::error!("update of {}/{} failed: {e}", target.kind, target.id);
                    outcome.failed += 1;
                }
            }
        }
        outcome
    }
}
