//! Address decomposition

/// Width of every simulated address
pub const ADDRESS_BITS: usize = 32;

pub fn get_log_2(value: u32) -> usize {
    assert!(value > 0);
    31 - value.leading_zeros() as usize
}

pub fn is_pow_2(value: u32) -> bool {
    value != 0 && value & (value - 1) == 0
}

/// Mask of the low `bits` bits, valid for `bits` in `0..=32`
pub fn get_mask(bits: usize) -> u32 {
    ((1u64 << bits) - 1) as u32
}

/// An address split into its three fields
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodedAddress {
    pub tag: u32,
    pub set_index: usize,
    pub offset: u32,
}

/// Bit widths of the offset and index fields of one cache level.
///
/// Addresses look like this:
/// | tag | index | offset |
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AddressLayout {
    pub offset_bits: usize,
    pub index_bits: usize,
}

impl AddressLayout {
    pub fn make(offset_bits: usize, index_bits: usize) -> Self {
        assert!(offset_bits + index_bits <= ADDRESS_BITS);
        Self { offset_bits, index_bits }
    }

    fn tag_shift(&self) -> u32 {
        (self.offset_bits + self.index_bits) as u32
    }

    pub fn get_offset(&self, address: u32) -> u32 {
        address & get_mask(self.offset_bits)
    }

    pub fn get_index(&self, address: u32) -> usize {
        let shifted = address.checked_shr(self.offset_bits as u32).unwrap_or(0);
        (shifted & get_mask(self.index_bits)) as usize
    }

    pub fn get_tag(&self, address: u32) -> u32 {
        // A shift by the full width leaves no tag bits at all
        address.checked_shr(self.tag_shift()).unwrap_or(0)
    }

    pub fn decode(&self, address: u32) -> DecodedAddress {
        DecodedAddress {
            tag: self.get_tag(address),
            set_index: self.get_index(address),
            offset: self.get_offset(address),
        }
    }

    /// Rebuild the block-aligned address of a block
    /// from its tag and the set it lives in
    pub fn reconstruct(&self, tag: u32, set_index: usize) -> u32 {
        let tag_part = tag.checked_shl(self.tag_shift()).unwrap_or(0);
        let index_part = ((set_index as u32) & get_mask(self.index_bits))
            .checked_shl(self.offset_bits as u32)
            .unwrap_or(0);
        tag_part | index_part
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_get_log_2() {
        for n in 1..1234567 {
            let expected = {
                let mut count = 0;
                let mut t = n;
                while t > 1 {
                    count += 1;
                    t >>= 1;
                }
                count
            };
            assert_eq!(expected, get_log_2(n));
        }
    }

    #[test]
    fn test_get_mask_edges() {
        assert_eq!(get_mask(0), 0);
        assert_eq!(get_mask(4), 0xf);
        assert_eq!(get_mask(32), u32::MAX);
    }

    #[test]
    fn test_decode_by_hand() {
        // 64-byte blocks, 128 sets
        let layout = AddressLayout::make(6, 7);
        let decoded = layout.decode(0x1234_5678);
        assert_eq!(decoded.offset, 0x38);
        assert_eq!(decoded.set_index, 0x59);
        assert_eq!(decoded.tag, 0x1234_5678 >> 13);
    }

    #[test]
    fn test_full_width_layout_has_no_tag() {
        let layout = AddressLayout::make(2, 30);
        assert_eq!(layout.get_tag(u32::MAX), 0);
        assert_eq!(layout.reconstruct(0, layout.get_index(u32::MAX)), !0b11);
    }

    #[test]
    fn test_fully_associative_layout() {
        let layout = AddressLayout::make(4, 0);
        let decoded = layout.decode(0xdead_beef);
        assert_eq!(decoded.set_index, 0);
        assert_eq!(decoded.tag, 0x0dea_dbee);
        assert_eq!(decoded.offset, 0xf);
    }

    proptest! {
        #[test]
        fn reconstruct_clears_offset(
            address in any::<u32>(),
            offset_bits in 0usize..=16,
            index_bits in 0usize..=16,
        ) {
            let layout = AddressLayout::make(offset_bits, index_bits);
            let decoded = layout.decode(address);
            let rebuilt = layout.reconstruct(decoded.tag, decoded.set_index);
            prop_assert_eq!(rebuilt, address & !get_mask(offset_bits));
            prop_assert_eq!(rebuilt | decoded.offset, address);
        }
    }
}
