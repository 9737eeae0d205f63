//! Word-aligned byte storage.
//!
//! Transports hand out frames with no alignment guarantee, and their receive
//! buffers may be recycled as soon as the receive call returns. Frames are
//! therefore copied into storage backed by `u64` words before they are read.
//!
//! This module is the only place in the crate that reinterprets memory.

#![allow(unsafe_code)]

/// Growable, reusable, 8-byte aligned copy of one frame.
#[derive(Debug, Clone, Default)]
pub struct AlignedBuffer {
    words: Vec<u64>,
    len: usize,
}

impl AlignedBuffer {
    /// Copy `data` into aligned storage and return the aligned view.
    ///
    /// The allocation is kept across calls and only grows, so a reader that is
    /// reset with frames of similar size stops allocating after warm-up.
    pub fn align(&mut self, data: &[u8]) -> &[u8] {
        let words = data.len() / 8 + 1;
        if self.words.len() < words {
            self.words.resize(words, 0);
        }
        words_as_bytes_mut(&mut self.words)[..data.len()].copy_from_slice(data);
        self.len = data.len();
        self.as_bytes()
    }

    /// The aligned copy of the last frame.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &words_as_bytes(&self.words)[..self.len]
    }

    /// Length of the last frame in bytes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Check if no frame has been copied in.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Allocated capacity in words.
    #[must_use]
    pub fn capacity_words(&self) -> usize {
        self.words.len()
    }
}

fn words_as_bytes(words: &[u64]) -> &[u8] {
    // SAFETY: u8 has alignment 1 and every bit pattern is a valid u8; the byte
    // length covers exactly the words' memory and the borrow is tied to `words`.
    unsafe { std::slice::from_raw_parts(words.as_ptr().cast::<u8>(), std::mem::size_of_val(words)) }
}

fn words_as_bytes_mut(words: &mut [u64]) -> &mut [u8] {
    // SAFETY: as above; any byte pattern written is a valid u64.
    unsafe {
        std::slice::from_raw_parts_mut(words.as_mut_ptr().cast::<u8>(), std::mem::size_of_val(words))
    }
}
