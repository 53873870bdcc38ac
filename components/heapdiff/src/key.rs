//! Grouping keys for object type names
//!
//! A `GroupKey` caches a hash of the name it was built from so that lookups in
//! an ordered map almost always resolve on the hash alone. Full byte
//! comparisons only happen when two keys share both hash and length.
//!
//! Short names, the overwhelmingly common case, are stored inline. Longer
//! names get an owned buffer grown by doubling up to a hard ceiling; a name
//! that would need more than that is rejected instead of allocated.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::KeyError;

/// Size of the inline key buffer in bytes
pub const INLINE_KEY_CAPACITY: usize = 32;

/// Default ceiling for the grown key buffer in bytes
pub const DEFAULT_MAX_KEY_LEN: usize = 4096;

#[derive(Clone)]
enum KeyData {
    Inline {
        buf: [u8; INLINE_KEY_CAPACITY],
        len: usize,
    },
    Heap(Vec<u8>),
}

/// Canonical grouping identity of a type name
///
/// Ordering is by hash, then length, then raw bytes. This is an internal
/// canonical order and not alphabetical.
#[derive(Clone)]
pub struct GroupKey {
    hash: u32,
    data: KeyData,
}

impl GroupKey {
    /// Build a key from a type name
    ///
    /// Fails with [`KeyError::NameTooLong`] when the name would need a buffer
    /// larger than `max_len` bytes, and with [`KeyError::EmptyName`] for an
    /// empty name. Callers drop such nodes from scoring.
    pub fn new(name: &str, max_len: usize) -> Result<Self, KeyError> {
        let bytes = name.as_bytes();
        if bytes.is_empty() {
            return Err(KeyError::EmptyName);
        }

        let data = if bytes.len() <= INLINE_KEY_CAPACITY {
            let mut buf = [0u8; INLINE_KEY_CAPACITY];
            buf[..bytes.len()].copy_from_slice(bytes);
            KeyData::Inline {
                buf,
                len: bytes.len(),
            }
        } else {
            let capacity = grown_capacity(bytes.len(), max_len).ok_or(KeyError::NameTooLong {
                len: bytes.len(),
                max: max_len,
            })?;
            let mut buf = Vec::with_capacity(capacity);
            buf.extend_from_slice(bytes);
            KeyData::Heap(buf)
        };

        Ok(Self {
            hash: jenkins_hash(bytes),
            data,
        })
    }

    /// Cached content hash
    pub fn hash_value(&self) -> u32 {
        self.hash
    }

    /// Length of the name in bytes
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// Always false; empty names never produce a key
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the name fits the inline buffer
    pub fn is_inline(&self) -> bool {
        matches!(self.data, KeyData::Inline { .. })
    }

    /// Raw name bytes
    pub fn as_bytes(&self) -> &[u8] {
        match &self.data {
            KeyData::Inline { buf, len } => &buf[..*len],
            KeyData::Heap(buf) => buf,
        }
    }

    /// The type name this key was built from
    pub fn type_name(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.as_bytes())
    }
}

/// Capacity reached by doubling the inline buffer until `len` fits
///
/// Returns `None` once doubling would pass `max_len`.
fn grown_capacity(len: usize, max_len: usize) -> Option<usize> {
    let mut capacity = INLINE_KEY_CAPACITY;
    while capacity < len {
        capacity = capacity.checked_mul(2)?;
        if capacity > max_len {
            return None;
        }
    }
    Some(capacity)
}

/// Jenkins one-at-a-time hash
pub fn jenkins_hash(data: &[u8]) -> u32 {
    let mut hash: u32 = 0;
    for &byte in data {
        hash = hash.wrapping_add(u32::from(byte));
        hash = hash.wrapping_add(hash << 10);
        hash ^= hash >> 6;
    }
    hash = hash.wrapping_add(hash << 3);
    hash ^= hash >> 11;
    hash = hash.wrapping_add(hash << 15);
    hash
}

impl Ord for GroupKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.hash
            .cmp(&other.hash)
            .then_with(|| self.len().cmp(&other.len()))
            .then_with(|| self.as_bytes().cmp(other.as_bytes()))
    }
}

impl PartialOrd for GroupKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for GroupKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for GroupKey {}

impl Hash for GroupKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(self.hash);
        self.as_bytes().hash(state);
    }
}

impl fmt::Debug for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupKey")
            .field("name", &self.type_name())
            .field("hash", &format_args!("{:#010x}", self.hash))
            .finish()
    }
}
