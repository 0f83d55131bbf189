//! Message types for the descriptor set and the code-generator-plugin wire
//! protocol, plus the handful of well-known types the generator references
//! directly. Every type here implements [`protokit::Message`] by hand, in
//! the same shape a generator driven by `protokit-gen` would emit —
//! `protokit-link` and `protokit-gen` both operate on these types rather
//! than on `.proto` source.

pub mod descriptor;
pub mod plugin;
pub mod well_known;

pub use descriptor::*;
pub use plugin::*;
pub use well_known::{Duration, Timestamp};
