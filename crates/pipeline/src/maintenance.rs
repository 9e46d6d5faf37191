//! Maintenance Advice

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const NORMAL: &str = "Normal";

/// Scheduling priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Urgent,
    Medium,
    NextWeek,
}

impl Priority {
    fn for_rank(rank: usize) -> Self {
        match rank {
            0 => Priority::Urgent,
            1 => Priority::Medium,
            _ => Priority::NextWeek,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceTask {
    pub fault_type: String,
    pub action: String,
    pub priority: Priority,
    pub occurrences: usize,
}

/// Recommended action for a fault label
pub fn recommended_action(fault_type: &str) -> &'static str {
    match fault_type {
        "Bearing Fault" => "Lubricate bearings and inspect for wear",
        "Misalignment" => "Realign shaft and coupling",
        "Imbalance" => "Run a vibration check and balance the impeller",
        "Cavitation" => "Check suction head and inlet for blockage",
        _ => "Inspect pump and review sensor readings",
    }
}

/// Tasks for every non-normal label, most frequent first (ties by label)
pub fn plan_maintenance(summary: &BTreeMap<String, usize>) -> Vec<MaintenanceTask> {
    let mut faults: Vec<(&String, usize)> = summary
        .iter()
        .filter(|(label, _)| label.as_str() != NORMAL)
        .map(|(label, count)| (label, *count))
        .collect();
    // BTreeMap iteration is already label-ordered; the sort is stable
    faults.sort_by(|a, b| b.1.cmp(&a.1));

    faults
        .into_iter()
        .enumerate()
        .map(|(rank, (label, occurrences))| MaintenanceTask {
            fault_type: label.clone(),
            action: recommended_action(label).to_string(),
            priority: Priority::for_rank(rank),
            occurrences,
        })
        .collect()
}
