//! Pending cluster task extraction.

use serde::{Deserialize, Serialize};

use super::Doc;
use crate::bundle::{Artifact, Bundle};
use crate::error::Result;

/// The master's pending task queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PendingTasks {
    /// Tasks waiting in the queue.
    pub count: u64,
    /// Longest time any task has waited, if reported.
    pub max_time_in_queue_millis: Option<u64>,
}

/// Extracts pending tasks; `None` when the bundle does not carry them.
pub fn extract(bundle: &impl Bundle) -> Result<Option<PendingTasks>> {
    bundle
        .load_json(Artifact::PendingTasks)?
        .map(|value| parse(&value))
        .transpose()
}

pub(crate) fn parse(value: &serde_json::Value) -> Result<PendingTasks> {
    let doc = Doc::root(Artifact::PendingTasks, value);
    let tasks = doc.require("tasks")?;
    let mut max_wait: Option<u64> = None;

    let rows = tasks.as_array()?;
    for (i, row) in rows.iter().enumerate() {
        if let Some(wait) = tasks.element(i, row).opt_u64_at("time_in_queue_millis")? {
            max_wait = Some(max_wait.map_or(wait, |m| m.max(wait)));
        }
    }

    Ok(PendingTasks {
        count: rows.len() as u64,
        max_time_in_queue_millis: max_wait,
    })
}
