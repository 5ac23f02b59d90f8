//! Source tags and the combined signal mask.
//!
//! Every registered source owns exactly one bit of a 64-bit word. Producers
//! OR their bit into the shared receiver; the waiting side gets the combined
//! word back and splits it into tags again with [`Tags`].

use core::fmt;
use core::iter::FusedIterator;
use core::ops::{BitOr, BitOrAssign};

use bit_field::BitField;

/// Width of the signal word.
pub const MASK_BITS: u32 = u64::BITS;

/// A single power-of-two bit identifying one registered source.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct SourceTag(u64);

impl SourceTag {
    /// Tag for bit `bit`, `None` past the word width.
    #[inline]
    #[must_use]
    pub const fn from_bit(bit: u32) -> Option<Self> {
        if bit < MASK_BITS {
            Some(Self(1 << bit))
        } else {
            None
        }
    }

    /// Accepts only non-zero powers of two.
    #[inline]
    #[must_use]
    pub const fn new(value: u64) -> Option<Self> {
        if value.is_power_of_two() {
            Some(Self(value))
        } else {
            None
        }
    }

    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Bit index of this tag (0 for the lowest tag).
    #[inline]
    #[must_use]
    pub const fn bit(self) -> u32 {
        self.0.trailing_zeros()
    }
}

impl fmt::Debug for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SourceTag({:#x})", self.0)
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// OR-combination of source tags, as delivered by a wait.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct Mask(u64);

impl Mask {
    pub const EMPTY: Self = Self(0);

    #[inline]
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[inline]
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// 包含的tag数量
    #[inline]
    #[must_use]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    #[inline]
    #[must_use]
    pub fn contains(self, tag: SourceTag) -> bool {
        self.0.get_bit(tag.bit() as usize)
    }

    #[inline]
    pub fn insert(&mut self, tag: SourceTag) {
        self.0.set_bit(tag.bit() as usize, true);
    }

    #[inline]
    pub fn remove(&mut self, tag: SourceTag) {
        self.0.set_bit(tag.bit() as usize, false);
    }

    /// Tags in this mask, lowest bit first.
    #[inline]
    #[must_use]
    pub const fn iter(self) -> Tags {
        Tags { remaining: self.0 }
    }
}

impl fmt::Debug for Mask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mask({:#x})", self.0)
    }
}

impl From<SourceTag> for Mask {
    fn from(tag: SourceTag) -> Self {
        Self(tag.0)
    }
}

impl BitOr for Mask {
    type Output = Mask;

    fn bitor(self, rhs: Mask) -> Mask {
        Mask(self.0 | rhs.0)
    }
}

impl BitOr<SourceTag> for Mask {
    type Output = Mask;

    fn bitor(self, rhs: SourceTag) -> Mask {
        Mask(self.0 | rhs.0)
    }
}

impl BitOr for SourceTag {
    type Output = Mask;

    fn bitor(self, rhs: SourceTag) -> Mask {
        Mask(self.0 | rhs.0)
    }
}

impl BitOrAssign<SourceTag> for Mask {
    fn bitor_assign(&mut self, rhs: SourceTag) {
        self.0 |= rhs.0;
    }
}

impl FromIterator<SourceTag> for Mask {
    fn from_iter<I: IntoIterator<Item = SourceTag>>(iter: I) -> Self {
        iter.into_iter().fold(Mask::EMPTY, |mask, tag| mask | tag)
    }
}

impl IntoIterator for Mask {
    type Item = SourceTag;
    type IntoIter = Tags;

    fn into_iter(self) -> Tags {
        self.iter()
    }
}

/// Iterator over the tags of a [`Mask`] in ascending bit order.
///
/// Ascending order is the dispatch order: when several sources fire in the
/// same wake-up, the lowest tag is serviced first. A clone is an independent
/// copy of the remaining bits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tags {
    remaining: u64,
}

impl Iterator for Tags {
    type Item = SourceTag;

    fn next(&mut self) -> Option<SourceTag> {
        if self.remaining == 0 {
            return None;
        }
        let lowest = self.remaining & self.remaining.wrapping_neg();
        self.remaining &= self.remaining - 1;
        Some(SourceTag(lowest))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining.count_ones() as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for Tags {}

impl FusedIterator for Tags {}
