// SPDX-License-Identifier: MIT

//! Opcode `\1`: wake a queue's scheduler (spec §4.8 table).

use crate::error::DaemonError;
use crate::state::DaemonState;

pub async fn handle(line: &str, state: &DaemonState) -> Result<(), DaemonError> {
    let queue = line.split_whitespace().next().unwrap_or_default();
    if queue.is_empty() {
        return Ok(());
    }
    state.wake_queue(queue).await;
    Ok(())
}
