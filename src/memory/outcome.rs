//! Access classification codes

use std::fmt;

/// What happened at one cache level during an access
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LevelState {
    #[default]
    NoAction,
    ReadHit,
    ReadMiss,
    WriteHit,
    WriteMiss,
}

impl LevelState {
    pub fn code(self) -> u8 {
        match self {
            LevelState::NoAction => 0,
            LevelState::ReadHit => 1,
            LevelState::ReadMiss => 2,
            LevelState::WriteHit => 3,
            LevelState::WriteMiss => 4,
        }
    }
}

/// Whether an access caused a write to main memory
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MemoryState {
    #[default]
    NoWriteToMemory,
    WriteToMemory,
}

impl MemoryState {
    pub fn code(self) -> u8 {
        match self {
            MemoryState::NoWriteToMemory => 5,
            MemoryState::WriteToMemory => 6,
        }
    }

    pub fn from_dirty(dirty: bool) -> Self {
        if dirty {
            MemoryState::WriteToMemory
        } else {
            MemoryState::NoWriteToMemory
        }
    }
}

/// The three state codes reported for every access
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AccessOutcome {
    pub l1: LevelState,
    pub l2: LevelState,
    pub memory: MemoryState,
}

impl AccessOutcome {
    pub fn new(l1: LevelState, l2: LevelState, memory: MemoryState) -> Self {
        Self { l1, l2, memory }
    }

    /// (L1, L2, memory) codes, in output order
    pub fn codes(&self) -> [u8; 3] {
        [self.l1.code(), self.l2.code(), self.memory.code()]
    }
}

impl fmt::Display for AccessOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [l1, l2, memory] = self.codes();
        write!(f, "{} {} {}", l1, l2, memory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_outcome() {
        let outcome = AccessOutcome::default();
        assert_eq!(outcome.codes(), [0, 0, 5]);
    }

    #[test]
    fn test_codes() {
        let outcome = AccessOutcome::new(
            LevelState::WriteMiss,
            LevelState::ReadHit,
            MemoryState::WriteToMemory,
        );
        assert_eq!(outcome.codes(), [4, 1, 6]);
        assert_eq!(outcome.to_string(), "4 1 6");
        assert_eq!(LevelState::ReadMiss.code(), 2);
        assert_eq!(LevelState::WriteHit.code(), 3);
    }
}
