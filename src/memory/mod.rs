//! Memory structure

pub mod address;
pub mod cache;
pub mod inclusive;
pub mod outcome;

pub use cache::Geometry;
pub use inclusive::InclusiveHierarchy;
pub use outcome::{AccessOutcome, LevelState, MemoryState};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessType {
    Read,
    Write,
}
