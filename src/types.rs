use std::str::FromStr;

use serde::Deserialize;

/// Behaviour when a watch trigger arrives while a rebuild is already running.
///
/// - `Queue`: remember the trigger and start another rebuild when the current
///   one finishes (default).
/// - `Drop`: ignore the trigger.
/// - `Cancel`: abort the running rebuild and start a fresh one right away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TriggerWhileRunningBehaviour {
    #[default]
    Queue,
    Drop,
    Cancel,
}

impl FromStr for TriggerWhileRunningBehaviour {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "queue" => Ok(TriggerWhileRunningBehaviour::Queue),
            "drop" => Ok(TriggerWhileRunningBehaviour::Drop),
            "cancel" => Ok(TriggerWhileRunningBehaviour::Cancel),
            other => Err(format!(
                "invalid triggered_while_running_behaviour: {other} (expected \"queue\", \"drop\" or \"cancel\")"
            )),
        }
    }
}
