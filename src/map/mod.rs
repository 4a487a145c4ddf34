//! The map pipeline: marker construction, clustering, the displayed marker set,
//! filtering and the controller that ties them to user actions.

mod cluster;
mod controls;
mod filter;
mod marker;
mod marker_set;

pub use cluster::*;
pub use controls::*;
pub use filter::*;
pub use marker::*;
pub use marker_set::*;
