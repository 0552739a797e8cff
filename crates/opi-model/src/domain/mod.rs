use std::collections::BTreeMap;

mod constants;
pub use constants::*;

mod lrp;
pub use lrp::{Lrp, LrpUpdate};

mod task;
pub use task::Task;

mod vcap;
pub use vcap::VcapApp;

/// Environment of a container.
///
/// Keys are unique; ordered so that rendered env lists are stable.
pub type Env = BTreeMap<String, String>;

/// Cross-cutting identifiers that travel with an LRP or Task through orchestrator annotations.
pub type Metadata = BTreeMap<String, String>;
