//! Graph surgery primitives. Each takes the current graph and returns a new
//! version, or an error and no change at all.

mod add_midpoint;
mod change_tags;
mod merge_nodes;
mod split;
mod sync_crossing_tags;

pub use add_midpoint::add_midpoint;
pub use change_tags::change_tags;
pub use merge_nodes::{delete_way, merge_nodes};
pub use split::split;
pub use sync_crossing_tags::sync_crossing_tags;
