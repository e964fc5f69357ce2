//! Pod event to task event translation

use chrono::DateTime;
use kestrel_core::{PodEvent, TaskEvent};
use tracing::debug;

use crate::error::BridgeError;
use crate::state::schedule_status_from_pod_state;

/// Scheduler name stamped on every translated event
pub const SCHEDULER_NAME: &str = "peloton";

/// Translate a pod event into a compatibility-API task event
///
/// The timestamp keeps whole seconds only; sub-second precision is dropped.
pub fn new_task_event(event: &PodEvent) -> Result<TaskEvent, BridgeError> {
    let timestamp =
        DateTime::parse_from_rfc3339(&event.timestamp).map_err(|e| BridgeError::Format {
            timestamp: event.timestamp.clone(),
            reason: e.to_string(),
        })?;
    let status = schedule_status_from_pod_state(&event.actual_state)?;

    debug!(
        pod = %event.pod_name,
        state = %event.actual_state,
        status = %status,
        "Translated pod event"
    );

    Ok(TaskEvent {
        timestamp_ms: timestamp.timestamp() * 1000,
        status,
        message: event.message.clone(),
        scheduler: SCHEDULER_NAME.to_string(),
    })
}
