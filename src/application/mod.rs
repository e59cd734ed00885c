//! Application services layer: the post synchronization store and its seams.

pub mod error;
pub mod notify;
pub mod remote;
pub mod store;

mod sync;
