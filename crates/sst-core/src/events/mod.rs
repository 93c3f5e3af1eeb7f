mod correlate;
mod group;

pub use correlate::{Invocations, correlate};
pub use group::{EventGroup, EventGroups, group_by_type};
