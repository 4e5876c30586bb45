//! Two-level cache hierarchy with promote-on-read-hit inclusion.
//!
//! A block read from L2 moves up into L1 and leaves L2; it only comes
//! back to L2 when L1 evicts it. Writes never allocate: they mark a hit
//! block dirty, or go to memory when both levels miss.

use log::debug;

use super::cache::{Cache, Geometry, Lookup};
use super::outcome::{AccessOutcome, LevelState, MemoryState};
use super::AccessType;
use crate::error::{ConfigError, MemoryError, SimulatorResult};

/// L1 and L2 together with the outcome of the latest access
#[derive(Clone, Debug)]
pub struct InclusiveHierarchy {
    pub l1: Cache,
    pub l2: Cache,

    state: AccessOutcome,

    pub memory_writes: u64,
}

impl InclusiveHierarchy {
    /// Create the hierarchy from the geometry of each level.
    /// Both levels must share one block size so that a block
    /// address rebuilt from L1 decodes consistently in L2.
    pub fn make(l1: Geometry, l2: Geometry) -> Result<Self, ConfigError> {
        if l1.block_size != l2.block_size {
            return Err(ConfigError::BlockSizeMismatch {
                l1: l1.block_size,
                l2: l2.block_size,
            });
        }
        Ok(Self {
            l1: Cache::make(l1),
            l2: Cache::make(l2),
            state: AccessOutcome::default(),
            memory_writes: 0,
        })
    }

    /// Outcome of the most recent access
    pub fn state(&self) -> AccessOutcome {
        self.state
    }

    pub fn access(&mut self, access_type: AccessType, address: u32) -> AccessOutcome {
        let outcome = match access_type {
            AccessType::Read => self.read(address),
            AccessType::Write => self.write(address),
        };
        if outcome.memory == MemoryState::WriteToMemory {
            self.memory_writes += 1;
        }
        self.state = outcome;
        outcome
    }

    fn write(&mut self, address: u32) -> AccessOutcome {
        if self.l1.write_lookup(address).is_hit() {
            return AccessOutcome::new(
                LevelState::WriteHit,
                LevelState::NoAction,
                MemoryState::NoWriteToMemory,
            );
        }

        if self.l2.write_lookup(address).is_hit() {
            AccessOutcome::new(
                LevelState::WriteMiss,
                LevelState::WriteHit,
                MemoryState::NoWriteToMemory,
            )
        } else {
            // No allocation on a write miss, the write goes straight to memory
            AccessOutcome::new(
                LevelState::WriteMiss,
                LevelState::WriteMiss,
                MemoryState::WriteToMemory,
            )
        }
    }

    fn read(&mut self, address: u32) -> AccessOutcome {
        let l1_lookup = self.l1.read_lookup(address);
        if l1_lookup.is_hit() {
            return AccessOutcome::new(
                LevelState::ReadHit,
                LevelState::NoAction,
                MemoryState::NoWriteToMemory,
            );
        }

        let l2_lookup = self.l2.read_lookup(address);
        let (l2_state, dirty) = match l2_lookup.way {
            Some(way) => {
                // Promote: the block leaves L2 and carries its dirty bit up
                let promoted = self.l2.invalidate(l2_lookup.set_index, way);
                debug!(
                    "promote {:#010x} from L2 (dirty = {})",
                    address, promoted.dirty
                );
                (LevelState::ReadHit, promoted.dirty)
            }
            // Freshly read from memory, hence clean
            None => (LevelState::ReadMiss, false),
        };

        let memory = self.fill_l1(&l1_lookup, dirty);
        AccessOutcome::new(LevelState::ReadMiss, l2_state, memory)
    }

    /// Place a block into L1, spilling the round-robin victim
    /// into L2 when the target set is full
    fn fill_l1(&mut self, lookup: &Lookup, dirty: bool) -> MemoryState {
        let set_index = lookup.set_index;
        if let Some(way) = self.l1.find_empty_slot(set_index) {
            self.l1.install(set_index, way, lookup.tag, dirty);
            return MemoryState::NoWriteToMemory;
        }

        let (_, evicted) = self.l1.replace_victim(set_index, lookup.tag, dirty);
        let evicted_address = self.l1.get_address(set_index, &evicted);
        debug!(
            "evict {:#010x} from L1 set {} (dirty = {})",
            evicted_address, set_index, evicted.dirty
        );
        self.spill_to_l2(evicted_address, evicted.dirty)
    }

    /// Place a block evicted from L1 into L2. Only a dirty block
    /// pushed out of a full L2 set reaches memory.
    fn spill_to_l2(&mut self, address: u32, dirty: bool) -> MemoryState {
        let decoded = self.l2.decode(address);
        if let Some(way) = self.l2.find_empty_slot(decoded.set_index) {
            self.l2.install(decoded.set_index, way, decoded.tag, dirty);
            return MemoryState::NoWriteToMemory;
        }

        let (_, evicted) =
            self.l2.replace_victim(decoded.set_index, decoded.tag, dirty);
        if evicted.dirty {
            debug!(
                "write back {:#010x} from L2 set {}",
                self.l2.get_address(decoded.set_index, &evicted),
                decoded.set_index
            );
        }
        MemoryState::from_dirty(evicted.dirty)
    }

    /// Check that no block is valid in both levels at once
    pub fn verify_inclusion(&self) -> SimulatorResult<()> {
        for address in self.l1.resident_addresses() {
            if self.l2.is_in_cache(address) {
                return Err(MemoryError::CacheInconsistency(
                    2,
                    format!(
                        "address {:#010x} is valid in both L1 and L2",
                        address
                    ),
                )
                .into());
            }
        }
        Ok(())
    }
}
