/// Fixed-capacity byte storage with an explicit used length.
///
/// The backing storage is allocated once and never grows. Appends past the
/// capacity are silently dropped, which is what the radio protocol expects
/// from its receive buffers: a runaway frame is truncated, not reallocated.
///
/// Ownership of the storage is exclusive. [`BoundedBuffer::take`] moves the
/// storage out and leaves an empty, zero-capacity buffer behind. `clone`
/// copies only the used bytes, so the copy's capacity equals the source's
/// length. Equality compares the used bytes only.
#[derive(Debug, Default)]
pub struct BoundedBuffer {
    data: Box<[u8]>,
    len: usize,
}

impl BoundedBuffer {
    /// Create an empty buffer with `capacity` zeroed bytes of storage.
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![0u8; capacity].into_boxed_slice(),
            len: 0,
        }
    }

    /// Create a full buffer where every byte is `fill`.
    pub fn filled(capacity: usize, fill: u8) -> Self {
        Self {
            data: vec![fill; capacity].into_boxed_slice(),
            len: capacity,
        }
    }

    /// Take ownership of caller-supplied storage.
    ///
    /// The capacity is the length of `storage`; `len` (clamped to that
    /// capacity) says how many leading bytes are in use. The storage is moved
    /// in, there is no borrowing variant.
    pub fn wrap(storage: Box<[u8]>, len: usize) -> Self {
        let len = len.min(storage.len());
        Self { data: storage, len }
    }

    /// Move the storage out, leaving `self` empty with zero capacity.
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }

    /// Append one byte. Returns `false` (and changes nothing) when full.
    pub fn append(&mut self, byte: u8) -> bool {
        if self.len < self.data.len() {
            self.data[self.len] = byte;
            self.len += 1;
            true
        } else {
            false
        }
    }

    /// Append `byte` up to `count` times. Returns how many were appended.
    pub fn append_repeated(&mut self, byte: u8, count: usize) -> usize {
        let n = count.min(self.remaining());
        self.data[self.len..self.len + n].fill(byte);
        self.len += n;
        n
    }

    /// Append as much of `bytes` as fits. Returns how many were appended.
    pub fn extend_from_slice(&mut self, bytes: &[u8]) -> usize {
        let n = bytes.len().min(self.remaining());
        self.data[self.len..self.len + n].copy_from_slice(&bytes[..n]);
        self.len += n;
        n
    }

    /// Byte at `index`, or `0` when `index` is beyond the capacity.
    ///
    /// The bound is the capacity, not the length: slots past the used length
    /// return whatever they last held. Use [`BoundedBuffer::get`] for a
    /// length-checked read.
    pub fn byte_at(&self, index: usize) -> u8 {
        self.data.get(index).copied().unwrap_or(0)
    }

    /// Byte at `index` if it lies within the used length.
    pub fn get(&self, index: usize) -> Option<u8> {
        self.as_slice().get(index).copied()
    }

    /// Number of bytes in use.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no bytes are in use.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Size of the backing storage.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Bytes that can still be appended.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.len
    }

    /// Whether every byte of storage is in use.
    pub fn is_full(&self) -> bool {
        self.len == self.data.len()
    }

    /// Forget the contents. Capacity is unchanged and bytes are not wiped.
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Set the used length after the storage was filled externally.
    /// Clamped to the capacity; returns the resulting length.
    pub fn set_len(&mut self, len: usize) -> usize {
        self.len = len.min(self.data.len());
        self.len
    }

    /// Drop `count` bytes from the end (clamped at zero).
    pub fn truncate_from_end(&mut self, count: usize) {
        self.len = self.len.saturating_sub(count);
    }

    /// Copy of `len` bytes starting at `start`, or of everything from
    /// `start` to the end when `len` is `None`. Out-of-range requests are
    /// clipped to the used length.
    pub fn sub_range(&self, start: usize, len: Option<usize>) -> Self {
        let start = start.min(self.len);
        let end = match len {
            Some(len) => start.saturating_add(len).min(self.len),
            None => self.len,
        };
        Self::from(&self.data[start..end])
    }

    /// Decode ASCII hex pairs into bytes.
    ///
    /// Each pair of characters yields one byte. Characters that are not hex
    /// digits count as `0` for their nibble; a trailing odd character becomes
    /// the high nibble of a final byte. Never fails.
    pub fn decode_hex_pairs(&self) -> Self {
        let hex = self.as_slice();
        let mut out = Self::new(hex.len().div_ceil(2));
        for pair in hex.chunks(2) {
            let high = hex_nibble(pair[0]);
            let low = pair.get(1).copied().map(hex_nibble).unwrap_or(0);
            out.append((high << 4) | low);
        }
        out
    }

    /// The used bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// The used bytes, mutably.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data[..self.len]
    }

    /// The whole backing storage, including bytes past the used length.
    /// Pair with [`BoundedBuffer::set_len`] after writing into it.
    pub fn storage_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl Clone for BoundedBuffer {
    fn clone(&self) -> Self {
        Self::from(self.as_slice())
    }
}

impl PartialEq for BoundedBuffer {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl Eq for BoundedBuffer {}

impl From<&[u8]> for BoundedBuffer {
    fn from(bytes: &[u8]) -> Self {
        Self {
            data: bytes.to_vec().into_boxed_slice(),
            len: bytes.len(),
        }
    }
}

impl From<Vec<u8>> for BoundedBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        let len = bytes.len();
        Self {
            data: bytes.into_boxed_slice(),
            len,
        }
    }
}

impl AsRef<[u8]> for BoundedBuffer {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

fn hex_nibble(c: u8) -> u8 {
    match c {
        b'0'..=b'9' => c - b'0',
        b'a'..=b'f' => c - b'a' + 10,
        b'A'..=b'F' => c - b'A' + 10,
        _ => 0,
    }
}
