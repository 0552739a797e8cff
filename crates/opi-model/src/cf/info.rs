use serde::{Deserialize, Serialize};

/// Scheduling summary of one desired app, as returned by list.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredLrpSchedulingInfo {
    pub process_guid: String,
}

/// Desired state of one app, as returned by get.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredLrp {
    pub process_guid: String,
    pub instances: u32,
}
