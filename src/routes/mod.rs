//! Console routes: the role rules for each route and the navigation port.

pub mod navigator;
pub mod table;

pub use navigator::{History, Navigator};
pub use table::RouteTable;
