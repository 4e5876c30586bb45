//! Cache implementation

use super::address::{get_log_2, is_pow_2, AddressLayout, DecodedAddress, ADDRESS_BITS};
use crate::error::ConfigError;

/// Shape of one cache level
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Geometry {
    pub block_size: u32,
    /// Blocks per set, 0 for fully associative
    pub associativity: u32,
    pub size_bytes: u32,
}

impl Geometry {
    /// Make a geometry from a total size given in KiB,
    /// the unit used by config files
    pub fn make(
        block_size: u32,
        associativity: u32,
        size_kib: u32,
    ) -> Result<Self, ConfigError> {
        let size_bytes = size_kib.checked_mul(1024).ok_or_else(|| {
            ConfigError::InvalidGeometry(format!(
                "cache size of {} KiB does not fit a 32-bit address space",
                size_kib
            ))
        })?;
        Self::with_size_bytes(block_size, associativity, size_bytes)
    }

    pub fn with_size_bytes(
        block_size: u32,
        associativity: u32,
        size_bytes: u32,
    ) -> Result<Self, ConfigError> {
        let geometry = Self { block_size, associativity, size_bytes };
        geometry.validate()?;
        Ok(geometry)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: String| Err(ConfigError::InvalidGeometry(reason));

        // Block size must be a power of 2
        if !is_pow_2(self.block_size) {
            return invalid(format!(
                "block size {} is not a power of two",
                self.block_size
            ));
        }
        // Cache size must be a non-zero multiple of block size
        if self.size_bytes == 0 || self.size_bytes % self.block_size != 0 {
            return invalid(format!(
                "cache size of {} bytes is not a multiple of the {}-byte block size",
                self.size_bytes, self.block_size
            ));
        }
        // Block number must be a multiple of associativity
        if self.associativity > self.num_blocks()
            || self.num_blocks() % self.ways() != 0
        {
            return invalid(format!(
                "{} blocks cannot be grouped into {}-way sets",
                self.num_blocks(),
                self.associativity
            ));
        }
        if !is_pow_2(self.num_sets() as u32) {
            return invalid(format!(
                "set count {} is not a power of two",
                self.num_sets()
            ));
        }
        if self.offset_bits() + self.index_bits() > ADDRESS_BITS {
            return invalid(format!(
                "offset and index need more than {} address bits",
                ADDRESS_BITS
            ));
        }
        Ok(())
    }

    pub fn num_blocks(&self) -> u32 {
        self.size_bytes / self.block_size
    }

    /// Resolved associativity, fully associative
    /// caches put every block into one set
    pub fn ways(&self) -> u32 {
        if self.associativity == 0 {
            self.num_blocks()
        } else {
            self.associativity
        }
    }

    pub fn num_sets(&self) -> usize {
        (self.num_blocks() / self.ways()) as usize
    }

    pub fn offset_bits(&self) -> usize {
        get_log_2(self.block_size)
    }

    pub fn index_bits(&self) -> usize {
        get_log_2(self.num_sets() as u32)
    }

    pub fn layout(&self) -> AddressLayout {
        AddressLayout::make(self.offset_bits(), self.index_bits())
    }
}

/// Block metadata. No payload is modeled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Block {
    pub valid: bool,
    pub dirty: bool,
    pub tag: u32,
}

/// A group of blocks sharing a set index,
/// with its round-robin eviction cursor
#[derive(Clone, Debug)]
pub struct Set {
    blocks: Vec<Block>,
    cursor: usize,
}

impl Set {
    pub fn make(ways: usize) -> Self {
        Self { blocks: vec![Block::default(); ways], cursor: 0 }
    }

    /// First valid slot holding the tag
    pub fn find(&self, tag: u32) -> Option<usize> {
        self.blocks.iter().position(|block| block.valid && block.tag == tag)
    }

    /// First invalid slot, `None` if the set is full
    pub fn find_empty_slot(&self) -> Option<usize> {
        self.blocks.iter().position(|block| !block.valid)
    }

    /// The slot the cursor points at, valid or not
    pub fn evict_slot(&self) -> usize {
        self.cursor
    }

    fn advance_cursor(&mut self) {
        self.cursor = (self.cursor + 1) % self.blocks.len();
    }
}

/// Result of looking an address up in one level
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Lookup {
    pub set_index: usize,
    pub tag: u32,
    /// Matching slot on a hit
    pub way: Option<usize>,
}

impl Lookup {
    pub fn is_hit(&self) -> bool {
        self.way.is_some()
    }
}

#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct CacheHistory {
    pub num_hit: u64,
    pub num_miss: u64,
}

impl CacheHistory {
    /// Computes the current miss rate, 0 before any lookup
    pub fn get_miss_rate(&self) -> f64 {
        let total = self.num_hit + self.num_miss;
        if total == 0 {
            0.
        } else {
            self.num_miss as f64 / total as f64
        }
    }
}

/// One cache level
#[derive(Clone, Debug)]
pub struct Cache {
    pub geometry: Geometry,
    pub layout: AddressLayout,

    pub history: CacheHistory,

    sets: Vec<Set>,
}

impl Cache {
    pub fn make(geometry: Geometry) -> Self {
        let ways = geometry.ways() as usize;
        Self {
            geometry,
            layout: geometry.layout(),
            history: CacheHistory::default(),
            sets: vec![Set::make(ways); geometry.num_sets()],
        }
    }

    pub fn decode(&self, address: u32) -> DecodedAddress {
        self.layout.decode(address)
    }

    pub fn block(&self, set_index: usize, way: usize) -> &Block {
        &self.sets[set_index].blocks[way]
    }

    pub fn find(&self, set_index: usize, tag: u32) -> Option<usize> {
        self.sets[set_index].find(tag)
    }

    pub fn find_empty_slot(&self, set_index: usize) -> Option<usize> {
        self.sets[set_index].find_empty_slot()
    }

    pub fn evict_slot(&self, set_index: usize) -> usize {
        self.sets[set_index].evict_slot()
    }

    fn lookup(&mut self, address: u32) -> Lookup {
        let decoded = self.decode(address);
        let way = self.find(decoded.set_index, decoded.tag);
        if way.is_some() {
            self.history.num_hit += 1;
        } else {
            self.history.num_miss += 1;
        }
        Lookup { set_index: decoded.set_index, tag: decoded.tag, way }
    }

    /// Read hits never touch block state
    pub fn read_lookup(&mut self, address: u32) -> Lookup {
        self.lookup(address)
    }

    /// A write hit marks the block dirty.
    /// Misses allocate nothing at this level.
    pub fn write_lookup(&mut self, address: u32) -> Lookup {
        let lookup = self.lookup(address);
        if let Some(way) = lookup.way {
            self.sets[lookup.set_index].blocks[way].dirty = true;
        }
        lookup
    }

    /// Fill a slot, leaving the cursor alone
    pub fn install(&mut self, set_index: usize, way: usize, tag: u32, dirty: bool) {
        self.sets[set_index].blocks[way] = Block { valid: true, dirty, tag };
    }

    /// Invalidate a slot and return what it held
    pub fn invalidate(&mut self, set_index: usize, way: usize) -> Block {
        let block = &mut self.sets[set_index].blocks[way];
        let previous = *block;
        block.valid = false;
        previous
    }

    /// Install over the round-robin victim, advance the cursor,
    /// and return the victim slot with the block it held
    pub fn replace_victim(
        &mut self,
        set_index: usize,
        tag: u32,
        dirty: bool,
    ) -> (usize, Block) {
        let way = self.evict_slot(set_index);
        let evicted = self.sets[set_index].blocks[way];
        self.install(set_index, way, tag, dirty);
        self.sets[set_index].advance_cursor();
        (way, evicted)
    }

    /// Block-aligned address of a block stored in the given set
    pub fn get_address(&self, set_index: usize, block: &Block) -> u32 {
        self.layout.reconstruct(block.tag, set_index)
    }

    pub fn is_in_cache(&self, address: u32) -> bool {
        let decoded = self.decode(address);
        self.find(decoded.set_index, decoded.tag).is_some()
    }

    /// Addresses of every valid block
    pub fn resident_addresses(&self) -> impl Iterator<Item = u32> + '_ {
        self.sets.iter().enumerate().flat_map(move |(set_index, set)| {
            set.blocks
                .iter()
                .filter(|block| block.valid)
                .map(move |block| self.get_address(set_index, block))
        })
    }
}
