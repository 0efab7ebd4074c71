//! Length-prefixed resource strings and string table blocks.
//!
//! String table resources (`RT_STRING`) group strings in blocks of 16: the string with id `n` lives in
//! block `(n >> 4) + 1` at slot `n & 0xf`. A block is the concatenation of 16 records, each a 16 bit
//! character count followed by that many UTF-16 characters. Empty slots are stored as a zero count.
//! See <https://learn.microsoft.com/en-us/windows/win32/menurc/stringtable-resource>.

use alloc::{format, string::String, vec::Vec};
use core::{cmp::Ordering, fmt};

use debug_ignore::DebugIgnore;
use log::{debug, trace};

use crate::{constants::*, errors::*, util::*};

/// Length-prefixed string as stored in the resource section.
///
/// The character count is authoritative, characters are kept as stored without any terminator.
#[derive(Clone, Eq, PartialEq, Hash, Default)]
pub struct ResourceString {
    data: Vec<u16>,
}
impl ResourceString {
    /// Create a string from UTF-16 characters.
    ///
    /// # Returns
    /// Returns an error if the string has more characters than a 16 bit count can describe.
    pub fn new(data: Vec<u16>) -> Result<Self, ResourceError> {
        if data.len() > u16::MAX as usize {
            return Err(ResourceError::StringTooLong(data.len()));
        }
        Ok(Self { data })
    }

    /// Create a string from text, stored as its UTF-16 characters.
    pub fn from_text<S: AsRef<str>>(text: S) -> Result<Self, ResourceError> {
        Self::new(text.as_ref().encode_utf16().collect())
    }

    pub(crate) fn parse(data: &[u8], offset: usize) -> Result<Self, ReadError> {
        let length = read_at::<u16>(data, offset)? as usize;
        let bytes = slice_at(data, offset + 2, length * 2)?;
        Ok(Self {
            data: bytes.chunks_exact(2).map(|c| u16::from_le_bytes([c[0], c[1]])).collect(),
        })
    }

    pub(crate) fn write(&self, target: &mut Vec<u8>) {
        target.extend_from_slice(&(self.data.len() as u16).to_le_bytes());
        target.extend(self.data.iter().flat_map(|c| c.to_le_bytes()));
    }

    /// Returns the number of characters.
    pub fn len(&self) -> usize { self.data.len() }

    /// Returns whether the string has no characters.
    pub fn is_empty(&self) -> bool { self.data.is_empty() }

    /// Returns the raw UTF-16 characters.
    pub fn data(&self) -> &[u16] { &self.data }

    /// Returns the size of the string including its length prefix in bytes.
    pub fn size(&self) -> u32 { 2 + self.data.len() as u32 * 2 }

    /// Returns the string as text, replacing invalid characters.
    pub fn to_string_lossy(&self) -> String { String::from_utf16_lossy(&self.data) }
}
impl Ord for ResourceString {
    // case-insensitive first, as the loader searches names that way
    fn cmp(&self, other: &Self) -> Ordering {
        let folded = |c: &u16| match *c {
            c @ 0x61..=0x7a => c - 0x20,
            c => c,
        };
        self.data
            .iter()
            .map(folded)
            .cmp(other.data.iter().map(folded))
            .then_with(|| self.data.cmp(&other.data))
    }
}
impl PartialOrd for ResourceString {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}
impl fmt::Debug for ResourceString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.to_string_lossy(), f)
    }
}
impl fmt::Display for ResourceString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

/// String together with the codepage of the resource it was read from.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct EncString<'a> {
    pub codepage: u32,
    pub string:   &'a ResourceString,
}

/// Decoded string table block.
///
/// Bytes following the 16 records inside the resource data are kept and written back after them.
#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct StringBlock {
    strings:  [Option<ResourceString>; STRING_BLOCK_SLOTS],
    trailing: DebugIgnore<Vec<u8>>,
}
impl StringBlock {
    /// Parse a string table block.
    ///
    /// # Returns
    /// Returns an error if a record extends past the end of the data.
    pub fn parse(data: &[u8]) -> Result<Self, ResourceError> {
        let mut block = Self::default();
        let mut offset = 0;
        for (slot, string) in block.strings.iter_mut().enumerate() {
            let parsed = ResourceString::parse(data, offset).map_err(|e| {
                ResourceError::InvalidStringBlock(format!("slot {}: {}", slot, e.0))
            })?;
            offset += parsed.size() as usize;
            trace!("string block slot {}: {:?}", slot, parsed);
            if !parsed.is_empty() {
                *string = Some(parsed);
            }
        }
        if let Some(trailing) = data.get(offset..).filter(|trailing| !trailing.is_empty()) {
            debug!("keeping {} trailing bytes after string block", trailing.len());
            block.trailing = trailing.to_vec().into();
        }
        Ok(block)
    }

    /// Build the block into raw bytes to be included in a resource directory.
    pub fn build(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.size() as usize);
        for string in &self.strings {
            match string {
                Some(string) => string.write(&mut data),
                None => data.extend_from_slice(&[0, 0]),
            }
        }
        data.extend_from_slice(&self.trailing);
        data
    }

    /// Returns the size of the built block in bytes.
    pub fn size(&self) -> u32 {
        self.strings.iter().map(|string| string.as_ref().map_or(2, ResourceString::size)).sum::<u32>()
            + self.trailing.len() as u32
    }

    /// Returns the bytes following the 16 records.
    pub fn trailing(&self) -> &[u8] { &self.trailing }

    /// Returns the string in the slot, or `None` if the slot is empty or out of range.
    pub fn get(&self, slot: usize) -> Option<&ResourceString> {
        self.strings.get(slot).and_then(Option::as_ref)
    }

    /// Set the string in the slot. Empty strings clear the slot.
    ///
    /// # Returns
    /// The replaced string.
    ///
    /// # Panics
    /// Panics if the slot is not below 16.
    pub fn set(&mut self, slot: usize, string: ResourceString) -> Option<ResourceString> {
        let string = if string.is_empty() { None } else { Some(string) };
        core::mem::replace(&mut self.strings[slot], string)
    }

    /// Clear the slot.
    ///
    /// # Returns
    /// The removed string.
    ///
    /// # Panics
    /// Panics if the slot is not below 16.
    pub fn remove(&mut self, slot: usize) -> Option<ResourceString> { self.strings[slot].take() }

    /// Returns whether all slots are empty.
    pub fn is_empty(&self) -> bool { self.strings.iter().all(Option::is_none) }

    /// Returns the non-empty slots with their strings.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &ResourceString)> {
        self.strings.iter().enumerate().filter_map(|(slot, string)| string.as_ref().map(|s| (slot, s)))
    }
}
