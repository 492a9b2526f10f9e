//! Data models for autotag.
//!
//! Document nodes as seen through the host, and the normalized tag set
//! produced by one pipeline run.

mod node;
mod tags;

pub use node::{ContentNode, NodeId, PageRef};
pub use tags::{TagSet, normalize};
