// SPDX-License-Identifier: MIT

//! CPU affinity bit-sets.
//!
//! Windows reports the affinity as a single machine word, while Linux uses a
//! `cpu_set_t` that can describe far more CPUs.  The mask here stores 64-bit
//! words so both can be represented without loss.

const WORD_BITS: usize = u64::BITS as usize;

/// Set of logical CPUs a process may run on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AffinityMask {
    words: Vec<u64>,
}

impl AffinityMask {
    /// The mask with no CPU allowed.
    pub fn empty() -> Self {
        Self { words: vec![] }
    }

    /// Build the mask from a native machine word, as returned by
    /// `GetProcessAffinityMask`.
    pub fn from_native(bits: usize) -> Self {
        Self { words: vec![bits as u64] }
    }

    /// Build the mask from the listed CPU indexes.
    #[cfg(test)]
    pub fn from_indexes<I: IntoIterator<Item = usize>>(indexes: I) -> Self {
        let mut ret = Self::empty();
        for i in indexes {
            ret.set(i);
        }
        ret
    }

    /// A mask with exactly one CPU allowed.
    pub fn single(index: usize) -> Self {
        let mut ret = Self::empty();
        ret.set(index);
        ret
    }

    pub fn set(&mut self, index: usize) {
        let word = index / WORD_BITS;
        if self.words.len() <= word {
            self.words.resize(word + 1, 0);
        }
        self.words[word] |= 1u64 << (index % WORD_BITS);
    }

    #[cfg(test)]
    pub fn is_set(&self, index: usize) -> bool {
        match self.words.get(index / WORD_BITS) {
            None => false,
            Some(w) => w & (1u64 << (index % WORD_BITS)) != 0,
        }
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|w| *w == 0)
    }

    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// The lowest-numbered CPU in the set.
    pub fn lowest(&self) -> Option<usize> {
        self.words
            .iter()
            .enumerate()
            .find(|(_, w)| **w != 0)
            .map(|(i, w)| i * WORD_BITS + w.trailing_zeros() as usize)
    }

    /// Reduce the set to only its lowest CPU.
    /// Returns None if no CPU is set.
    pub fn first_cpu_only(&self) -> Option<Self> {
        self.lowest().map(Self::single)
    }

    /// All CPU indexes in the set, lowest first.
    pub fn indexes(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(i, w)| {
            (0..WORD_BITS)
                .filter(move |b| w & (1u64 << b) != 0)
                .map(move |b| i * WORD_BITS + b)
        })
    }

    /// Convert into the native machine word.
    /// Returns None when a set CPU doesn't fit in the word.
    pub fn to_native(&self) -> Option<usize> {
        let mut ret: usize = 0;
        for i in self.indexes() {
            if i >= usize::BITS as usize {
                return None;
            }
            ret |= 1usize << i;
        }
        Some(ret)
    }
}
