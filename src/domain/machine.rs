// Machine domain model
use serde::{Deserialize, Serialize};

use crate::domain::sensor::SensorProfile;

/// Overall machine health as shown in the machine selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MachineStatus {
    Healthy,
    Warning,
    Critical,
}

/// One monitored machine and its sensor reference data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Machine {
    pub id: String,
    pub name: String,
    pub status: MachineStatus,
    pub online: bool,
    pub sensors: SensorProfile,
}
