use std::borrow::Cow;
use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::buffer::BoundedBuffer;

/// Default storage for decoded results.
pub const DEFAULT_CAPACITY: usize = 256;

const NUL: u8 = 0;

/// Ordered key/value records packed into a fixed buffer.
///
/// Each record is stored as `key 0x00 value 0x00`. Keys and values never
/// contain `0x00`: input is cut at its first NUL. Lookups and removals are
/// linear scans, which is fine for the few dozen fields a decoded radio
/// message carries.
///
/// When the buffer fills up the last stored byte is forced to `0x00`, so a
/// truncated value stays terminated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValueStore {
    buf: BoundedBuffer,
    records: usize,
}

/// One record borrowed from a [`KeyValueStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record<'a> {
    pub key: &'a [u8],
    pub value: &'a [u8],
}

impl<'a> Record<'a> {
    pub fn key_str(&self) -> Cow<'a, str> {
        String::from_utf8_lossy(self.key)
    }

    pub fn value_str(&self) -> Cow<'a, str> {
        String::from_utf8_lossy(self.value)
    }
}

impl KeyValueStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: BoundedBuffer::new(capacity),
            records: 0,
        }
    }

    /// Append a record and return the new stored length.
    ///
    /// Nothing is added if the key and its terminator do not fit. A value
    /// that does not fit is truncated; the record still counts.
    pub fn append(&mut self, key: impl AsRef<[u8]>, value: impl AsRef<[u8]>) -> usize {
        let key = until_nul(key.as_ref());
        let value = until_nul(value.as_ref());

        if self.buf.remaining() < key.len() + 1 {
            return self.buf.len();
        }

        self.buf.extend_from_slice(key);
        self.buf.append(NUL);
        self.buf.extend_from_slice(value);
        self.buf.append(NUL);
        self.records += 1;

        if self.buf.is_full() {
            if let Some(last) = self.buf.storage_mut().last_mut() {
                *last = NUL;
            }
        }
        self.buf.len()
    }

    /// Copy every record of `other` under `prefix.key`.
    pub fn append_nested(&mut self, prefix: &str, other: &KeyValueStore) -> usize {
        let mut key = Vec::new();
        for record in other.iter() {
            key.clear();
            key.extend_from_slice(prefix.as_bytes());
            key.push(b'.');
            key.extend_from_slice(record.key);
            self.append(&key, record.value);
        }
        self.buf.len()
    }

    /// Value of the first record with this key.
    pub fn contains(&self, key: impl AsRef<[u8]>) -> Option<&[u8]> {
        self.find(key.as_ref()).map(|(_, _, record)| record.value)
    }

    /// Lossy UTF-8 view of [`KeyValueStore::contains`].
    pub fn get_str(&self, key: impl AsRef<[u8]>) -> Option<Cow<'_, str>> {
        self.contains(key).map(String::from_utf8_lossy)
    }

    /// Byte offset of the value stored under `key`.
    pub fn position(&self, key: impl AsRef<[u8]>) -> Option<usize> {
        self.find(key.as_ref())
            .map(|(start, _, record)| start + record.key.len() + 1)
    }

    /// Remove the first record with this key, returning the bytes freed.
    pub fn remove(&mut self, key: impl AsRef<[u8]>) -> usize {
        let Some((start, end, _)) = self.find(key.as_ref()) else {
            return 0;
        };

        let len = self.buf.len();
        let removed = end - start;
        if removed >= len {
            self.clear();
            return len;
        }

        self.buf.storage_mut().copy_within(end..len, start);
        self.buf.set_len(len - removed);
        self.records -= 1;
        removed
    }

    pub fn clear(&mut self) {
        self.buf.clear();
        self.records = 0;
    }

    pub fn record_count(&self) -> usize {
        self.records
    }

    pub fn key_at(&self, n: usize) -> Option<&[u8]> {
        self.iter().nth(n).map(|record| record.key)
    }

    pub fn value_at(&self, n: usize) -> Option<&[u8]> {
        self.iter().nth(n).map(|record| record.value)
    }

    /// Length of the n-th key without its terminator (0 if absent).
    pub fn key_length(&self, n: usize) -> usize {
        self.key_at(n).map_or(0, <[u8]>::len)
    }

    /// Length of the n-th value without its terminator (0 if absent).
    pub fn value_length(&self, n: usize) -> usize {
        self.value_at(n).map_or(0, <[u8]>::len)
    }

    /// Stored bytes, terminators included.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records == 0
    }

    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.buf.as_slice()
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter {
            bytes: self.buf.as_slice(),
            pos: 0,
            left: self.records,
        }
    }

    /// Aligned `key : value` lines for the listed keys only, or for every
    /// key except those listed when `exclude` is set.
    pub fn display_selected<'a>(&'a self, keys: &'a [&'a str], exclude: bool) -> Selected<'a> {
        Selected {
            store: self,
            keys,
            exclude,
        }
    }

    fn find(&self, key: &[u8]) -> Option<(usize, usize, Record<'_>)> {
        let key = until_nul(key);
        if key.is_empty() {
            return None;
        }
        let mut iter = self.iter();
        loop {
            let start = iter.pos;
            let record = iter.next()?;
            if record.key == key {
                return Some((start, iter.pos.min(self.buf.len()), record));
            }
        }
    }
}

impl Default for KeyValueStore {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// Iterator over stored records in insertion order.
pub struct Iter<'a> {
    bytes: &'a [u8],
    pos: usize,
    left: usize,
}

impl<'a> Iterator for Iter<'a> {
    type Item = Record<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.left == 0 || self.pos >= self.bytes.len() {
            return None;
        }
        self.left -= 1;
        let key = segment(self.bytes, self.pos);
        self.pos += key.len() + 1;
        let value = segment(self.bytes, self.pos);
        self.pos += value.len() + 1;
        Some(Record { key, value })
    }
}

impl<'a> IntoIterator for &'a KeyValueStore {
    type Item = Record<'a>;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Serialize for KeyValueStore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.records))?;
        for record in self.iter() {
            map.serialize_entry(&record.key_str(), &record.value_str())?;
        }
        map.end()
    }
}

impl fmt::Display for KeyValueStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.iter().map(|r| r.key_str().len()).max().unwrap_or(0);
        for record in self.iter() {
            writeln!(f, "{:<width$} : {}", record.key_str(), record.value_str())?;
        }
        Ok(())
    }
}

/// See [`KeyValueStore::display_selected`].
pub struct Selected<'a> {
    store: &'a KeyValueStore,
    keys: &'a [&'a str],
    exclude: bool,
}

impl fmt::Display for Selected<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.exclude {
            let (store, keys) = (self.store, self.keys);
            let shown = move || {
                store
                    .iter()
                    .filter(move |r| !keys.iter().any(|k| k.as_bytes() == r.key))
            };
            let width = shown().map(|r| r.key_str().len()).max().unwrap_or(0);
            for record in shown() {
                writeln!(f, "{:<width$} : {}", record.key_str(), record.value_str())?;
            }
        } else {
            // Listed keys are shown even when missing, with an empty value.
            let width = self.keys.iter().map(|k| k.len()).max().unwrap_or(0);
            for key in self.keys {
                let value = self.store.get_str(key).unwrap_or_default();
                writeln!(f, "{key:<width$} : {value}")?;
            }
        }
        Ok(())
    }
}

fn until_nul(bytes: &[u8]) -> &[u8] {
    segment(bytes, 0)
}

fn segment(bytes: &[u8], start: usize) -> &[u8] {
    let rest = bytes.get(start..).unwrap_or(&[]);
    let end = rest.iter().position(|&b| b == NUL).unwrap_or(rest.len());
    &rest[..end]
}
