//! Data types for parsing and building the resource section.
//! The resource section contains the resource directory and the resource data.
//! See <https://learn.microsoft.com/en-us/windows/win32/debug/pe-format#the-rsrc-section> for more information.

use alloc::{collections::BTreeSet, format, string::String, vec::Vec};
use core::{borrow::Borrow, fmt};

use ahash::RandomState;
use debug_ignore::DebugIgnore;
use indexmap::IndexMap;
use log::{debug, trace, warn};
use zerocopy::IntoBytes;

use crate::{constants::*, errors::*, strings::*, types::*, util::*};

/// Maximum nesting of resource tables accepted when parsing.
/// Regular images use three levels: type, name and language.
pub const MAX_RESOURCE_DEPTH: usize = 32;

/// Resolves resource data addresses into bytes while parsing.
/// Data has to be located in the bytes, which are mapped at the virtual address.
#[derive(Clone, Copy)]
struct DataSource<'a> {
    data:            &'a [u8],
    virtual_address: u32,
}
impl<'a> DataSource<'a> {
    fn resolve(&self, rva: u32, size: u32) -> Result<&'a [u8], ResourceError> {
        let offset = rva
            .checked_sub(self.virtual_address)
            .filter(|&offset| (offset as usize) < self.data.len())
            .ok_or(ResourceError::UnmappedAddress(rva))?;
        Ok(slice_at(self.data, offset as usize, size as usize)?)
    }
}

/// Recursive resource table parser state.
struct Parser<'a> {
    directory: &'a [u8],
    source:    DataSource<'a>,
    visited:   BTreeSet<u32>,
}
impl<'a> Parser<'a> {
    fn table(
        &mut self, offset: u32, level: usize, resource_type: u32,
    ) -> Result<ResourceTable, ResourceError> {
        if level > MAX_RESOURCE_DEPTH {
            return Err(ResourceError::TooDeep(MAX_RESOURCE_DEPTH));
        }
        if !self.visited.insert(offset) {
            return Err(ResourceError::CyclicTable(offset));
        }

        let data = read_at::<ResourceDirectoryTable>(self.directory, offset as usize)?;
        trace!("{} {:#x?}", "--".repeat(level + 1), data);

        let mut table = ResourceTable {
            data,
            ..ResourceTable::default()
        };

        let number_of_name_entries = data.number_of_name_entries as u32;
        let number_of_entries = number_of_name_entries + data.number_of_id_entries as u32;
        for index in 0..number_of_entries {
            let entry_offset = offset as usize
                + (RESOURCE_DIRECTORY_TABLE_SIZE + index * RESOURCE_DIRECTORY_ENTRY_SIZE) as usize;
            let entry = read_at::<ResourceDirectoryEntry>(self.directory, entry_offset)?;
            trace!("{} {:#x?}", "--".repeat(level + 1), entry);

            let name = if index < number_of_name_entries {
                let name_offset = entry.name_offset_or_integer_id & !RESOURCE_NAME_FLAG;
                ResourceEntryName::Name(ResourceString::parse(self.directory, name_offset as usize)?)
            } else if entry.name_offset_or_integer_id & RESOURCE_NAME_FLAG != 0 {
                return Err(ResourceError::InvalidTable(format!(
                    "id entry {:#x} has the name flag set",
                    entry.name_offset_or_integer_id
                )));
            } else {
                ResourceEntryName::ID(entry.name_offset_or_integer_id)
            };

            // the type of a subtree is the id of its entry in the root table
            let entry_type = match (level, &name) {
                (0, ResourceEntryName::ID(id)) => *id,
                (0, ResourceEntryName::Name(_)) => RT_UNKNOWN as u32,
                _ => resource_type,
            };

            let target = entry.data_entry_or_subdirectory_offset;
            let child = if target & RESOURCE_SUBDIRECTORY_FLAG != 0 {
                ResourceEntry::Table(self.table(
                    target & !RESOURCE_SUBDIRECTORY_FLAG,
                    level + 1,
                    entry_type,
                )?)
            } else {
                ResourceEntry::Data(self.data(target, level, entry_type)?)
            };

            let (replaced, name) = table.insert_parsed(name, child);
            if replaced {
                warn!("{} duplicate resource entry {:?}", "--".repeat(level + 1), name);
            }
        }
        Ok(table)
    }

    fn data(
        &mut self, offset: u32, level: usize, resource_type: u32,
    ) -> Result<ResourceData, ResourceError> {
        let data_entry = read_at::<ResourceDataEntry>(self.directory, offset as usize)?;
        trace!("{} {:#x?}", "--".repeat(level + 1), data_entry);
        if data_entry.reserved != 0 {
            return Err(ResourceError::ReservedNotZero(data_entry.reserved));
        }

        let data = self.source.resolve(data_entry.data_rva, data_entry.size)?;
        let content = if resource_type == RT_STRING as u32 {
            ResourceContent::Strings(StringBlock::parse(data)?)
        } else {
            ResourceContent::Raw(Vec::from(data).into())
        };
        Ok(ResourceData {
            data_entry,
            content,
        })
    }
}

/// Portable executable resource directory.
#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct ResourceDirectory {
    pub(crate) virtual_address: u32,
    pub(crate) root:            ResourceTable,
}
impl ResourceDirectory {
    /// Create an empty resource directory.
    pub fn new() -> Self { Self::default() }

    /// Parse a resource directory built with [`ResourceDirectory::build`].
    /// The data has to start with the root table and contain all resource data, the virtual address is the address the data was built for.
    ///
    /// # Returns
    /// Returns an error if the resource directory is invalid.
    pub fn parse(data: &[u8], virtual_address: u32) -> Result<Self, ResourceError> {
        let source = DataSource {
            data,
            virtual_address,
        };
        Self::parse_with(data, source, virtual_address)
    }

    /// Parse the resource directory located at the given virtual address of an image.
    /// The directory data is the section data starting at the resource directory.
    /// Resource data has to be contained in the raw data of the same section.
    ///
    /// # Returns
    /// Returns an error if the resource directory at the given address is invalid.
    pub fn parse_image(
        image: &[u8], section_table: &[SectionHeader], virtual_address: u32,
    ) -> Result<Self, ResourceError> {
        let section = section_table
            .iter()
            .find(|section| section.contains_rva(virtual_address))
            .ok_or(ResourceError::UnmappedAddress(virtual_address))?;
        let section_start = section.pointer_to_raw_data as usize;
        let section_end = (section_start + section.size_of_raw_data as usize).min(image.len());
        let section_data = image.get(section_start..section_end).ok_or_else(|| {
            ResourceError::InvalidTable(format!(
                "resource section at {:#x} outside of {:#x} bytes",
                section_start,
                image.len()
            ))
        })?;
        let directory_offset = (virtual_address - section.virtual_address) as usize;
        let directory = section_data.get(directory_offset..).ok_or_else(|| {
            ResourceError::InvalidTable(format!(
                "resource directory at {:#x} outside of {:#x} bytes of section data",
                directory_offset,
                section_data.len()
            ))
        })?;
        let source = DataSource {
            data:            section_data,
            virtual_address: section.virtual_address,
        };
        Self::parse_with(directory, source, virtual_address)
    }

    fn parse_with(
        directory: &[u8], source: DataSource<'_>, virtual_address: u32,
    ) -> Result<Self, ResourceError> {
        let mut parser = Parser {
            directory,
            source,
            visited: BTreeSet::new(),
        };
        let root = parser.table(0, 0, RT_UNKNOWN as u32)?;
        debug!("parsed resource directory with {} tables", parser.visited.len());
        Ok(Self {
            virtual_address,
            root,
        })
    }

    /// Returns the virtual address of the resource directory in the source image.
    pub fn virtual_address(&self) -> u32 { self.virtual_address }

    /// Returns the root resource table.
    /// The root resource table contains one table per resource type.
    pub fn root(&self) -> &ResourceTable { &self.root }

    /// Returns the mutable root resource table.
    pub fn root_mut(&mut self) -> &mut ResourceTable { &mut self.root }

    /// Returns the size of the resulting resource directory in bytes.
    pub fn size(&self) -> u32 { self.root.size() }

    /// Build the resource directory into raw bytes to be included in an image.
    /// The virtual address is used to compute the resource data addresses and has to correspond to the address the directory is placed at in the target image.
    ///
    /// Entries are written sorted: names first, then ids in ascending order.
    ///
    /// # Returns
    /// Returns an error if a table has too many entries or the directory exceeds the addressable size.
    pub fn build(&self, virtual_address: u32) -> Result<Vec<u8>, ResourceError> {
        let mut data = Vec::with_capacity(self.size() as usize);
        self.root.build_table(&mut data, virtual_address)?;
        Ok(data)
    }

    /// Get a string from the string table.
    ///
    /// The language is currently not taken into account: the first language entry of the string block is used.
    ///
    /// # Returns
    /// The string with the codepage of its block, or `None` if the string does not exist.
    pub fn get_string(&self, id: u32, language: u32) -> Option<EncString<'_>> {
        let (block_id, slot) = string_location(id);
        let block = self.root.get(ResourceEntryName::ID(RT_STRING as u32))?.as_table()?;
        let languages = block.get(ResourceEntryName::ID(block_id))?.as_table()?;
        let data = select_language(languages, language)?.as_data()?;
        let string = data.strings()?.get(slot)?;
        Some(EncString {
            codepage: data.codepage(),
            string,
        })
    }

    /// Set a string in the string table.
    /// Missing string tables are created, new blocks use [`DEFAULT_CODEPAGE`] and the given language.
    ///
    /// The text is stored as is without conversion to the codepage of the block.
    /// The language is currently not taken into account for existing blocks: the first language entry of the string block is used.
    ///
    /// # Returns
    /// The replaced string, or an error if the text is too long or the string table has an unexpected layout.
    pub fn set_string(
        &mut self, id: u32, language: u32, text: &str,
    ) -> Result<Option<ResourceString>, ResourceError> {
        let string = ResourceString::from_text(text)?;
        let (block_id, slot) = string_location(id);
        let data = self.string_block_data(block_id, language)?;
        match &mut data.content {
            ResourceContent::Strings(block) => Ok(block.set(slot, string)),
            ResourceContent::Raw(_) => Err(ResourceError::InvalidTable(format!(
                "string block {} is not decoded",
                block_id
            ))),
        }
    }

    /// Remove a string from the string table.
    /// The string block is kept, the slot is stored with zero length.
    ///
    /// # Returns
    /// The removed string.
    pub fn remove_string(&mut self, id: u32, language: u32) -> Option<ResourceString> {
        let (block_id, slot) = string_location(id);
        let block = self.root.get_mut(ResourceEntryName::ID(RT_STRING as u32))?.as_table_mut()?;
        let languages = block.get_mut(ResourceEntryName::ID(block_id))?.as_table_mut()?;
        select_language_mut(languages, language)?.as_data_mut()?.strings_mut()?.remove(slot)
    }

    /// Returns all strings in the string table with their ids.
    /// Only the first language entry of each block is considered.
    pub fn strings(&self) -> Vec<(u32, EncString<'_>)> {
        let mut strings = Vec::new();
        let Some(blocks) =
            self.root.get(ResourceEntryName::ID(RT_STRING as u32)).and_then(ResourceEntry::as_table)
        else {
            return strings;
        };
        for (&block_id, entry) in blocks.id_entries.iter() {
            if block_id == 0 {
                continue;
            }
            let Some(data) = entry
                .as_table()
                .and_then(|languages| select_language(languages, 0))
                .and_then(ResourceEntry::as_data)
            else {
                continue;
            };
            if let Some(block) = data.strings() {
                for (slot, string) in block.iter() {
                    let id = ((block_id - 1) << 4) | slot as u32;
                    strings.push((id, EncString {
                        codepage: data.codepage(),
                        string,
                    }));
                }
            }
        }
        strings.sort_by_key(|(id, _)| *id);
        strings
    }

    /// Get the resource data of the given type and name.
    /// The language is currently not taken into account: the first language entry is used.
    pub fn get_data<T: Borrow<ResourceEntryName>, N: Borrow<ResourceEntryName>>(
        &self, resource_type: T, name: N, language: u32,
    ) -> Option<&ResourceData> {
        let names = self.root.get(resource_type)?.as_table()?;
        let languages = names.get(name)?.as_table()?;
        select_language(languages, language)?.as_data()
    }

    fn string_block_data(
        &mut self, block_id: u32, language: u32,
    ) -> Result<&mut ResourceData, ResourceError> {
        let string_type = ResourceEntryName::ID(RT_STRING as u32);
        if self.root.get(&string_type).is_none() {
            debug!("adding string table");
            self.root.insert(&string_type, ResourceEntry::Table(ResourceTable::default()));
        }
        let blocks = self
            .root
            .get_mut(&string_type)
            .and_then(ResourceEntry::as_table_mut)
            .ok_or_else(|| ResourceError::InvalidTable("string table is not a table".into()))?;

        let block_name = ResourceEntryName::ID(block_id);
        if blocks.get(&block_name).is_none() {
            debug!("adding string block {}", block_id);
            blocks.insert(&block_name, ResourceEntry::Table(ResourceTable::default()));
        }
        let languages = blocks
            .get_mut(&block_name)
            .and_then(ResourceEntry::as_table_mut)
            .ok_or_else(|| {
                ResourceError::InvalidTable(format!("string block {} is not a table", block_id))
            })?;

        if languages.is_empty() {
            debug!("adding string block {} language {}", block_id, language);
            languages.insert(
                ResourceEntryName::ID(language),
                ResourceEntry::Data(ResourceData::strings_with_codepage(
                    StringBlock::default(),
                    DEFAULT_CODEPAGE,
                )),
            );
        }
        select_language_mut(languages, language)
            .and_then(ResourceEntry::as_data_mut)
            .ok_or_else(|| {
                ResourceError::InvalidTable(format!(
                    "string block {} language entry is not data",
                    block_id
                ))
            })
    }

    fn fmt_table(
        f: &mut fmt::Formatter<'_>, table: &ResourceTable, level: usize, resource_type: u32,
    ) -> fmt::Result {
        let indent = "  ".repeat(level + 1);
        for (name, entry) in table.iter() {
            let entry_type = match (level, &name) {
                (0, ResourceEntryName::ID(id)) => *id,
                (0, ResourceEntryName::Name(_)) => RT_UNKNOWN as u32,
                _ => resource_type,
            };
            match (level, &name) {
                (0, ResourceEntryName::ID(id)) => match resource_type_name(*id) {
                    Some(type_name) => writeln!(f, "{}{} ({})", indent, type_name, id)?,
                    None => writeln!(f, "{}{}", indent, id)?,
                },
                (_, ResourceEntryName::ID(id)) => writeln!(f, "{}{}", indent, id)?,
                (_, ResourceEntryName::Name(name)) => writeln!(f, "{}{:?}", indent, name)?,
            }
            match entry {
                ResourceEntry::Table(table) => Self::fmt_table(f, table, level + 1, entry_type)?,
                ResourceEntry::Data(data) => {
                    let indent = "  ".repeat(level + 2);
                    match &data.content {
                        ResourceContent::Strings(block) => {
                            writeln!(f, "{}codepage {}, string block", indent, data.codepage())?;
                            for (slot, string) in block.iter() {
                                writeln!(f, "{}  [{}] {:?}", indent, slot, string)?;
                            }
                        }
                        ResourceContent::Raw(raw) => writeln!(
                            f,
                            "{}codepage {}, {} bytes",
                            indent,
                            data.codepage(),
                            raw.len()
                        )?,
                    }
                }
            }
        }
        Ok(())
    }
}
impl fmt::Display for ResourceDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "resource directory at {:#x}", self.virtual_address)?;
        Self::fmt_table(f, &self.root, 0, RT_UNKNOWN as u32)
    }
}

/// Returns the block id and slot of a string id.
fn string_location(id: u32) -> (u32, usize) { ((id >> 4) + 1, (id & 0xf) as usize) }

/// Select the language entry of a resource.
///
/// Language selection is not implemented: the first entry of the table is used regardless of the requested language.
fn select_language(table: &ResourceTable, _language: u32) -> Option<&ResourceEntry> {
    table.name_entries.values().next().or_else(|| table.id_entries.values().next())
}

/// Mutable variant of [`select_language`] with the same limitation.
fn select_language_mut(table: &mut ResourceTable, _language: u32) -> Option<&mut ResourceEntry> {
    match table.name_entries.values_mut().next() {
        Some(entry) => Some(entry),
        None => table.id_entries.values_mut().next(),
    }
}

fn to_offset(offset: usize) -> Result<u32, ResourceError> {
    if offset > (RESOURCE_SUBDIRECTORY_FLAG - 1) as usize {
        return Err(ResourceError::TooLarge(offset));
    }
    Ok(offset as u32)
}

fn pad_to_dword(data: &mut Vec<u8>) { data.resize(aligned_to(data.len(), 4), 0); }

/// Portable executable resource table.
///
/// Entries keyed by name and entries keyed by id are kept separately in their parsed or inserted order, they are sorted when building.
#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct ResourceTable {
    pub(crate) data:         ResourceDirectoryTable,
    pub(crate) name_entries: IndexMap<ResourceString, ResourceEntry, RandomState>,
    pub(crate) id_entries:   IndexMap<u32, ResourceEntry, RandomState>,
}
impl ResourceTable {
    fn insert_parsed(
        &mut self, name: ResourceEntryName, entry: ResourceEntry,
    ) -> (bool, ResourceEntryName) {
        match name {
            ResourceEntryName::Name(name) => {
                let replaced = self.name_entries.insert(name.clone(), entry).is_some();
                (replaced, ResourceEntryName::Name(name))
            }
            ResourceEntryName::ID(id) => {
                (self.id_entries.insert(id, entry).is_some(), ResourceEntryName::ID(id))
            }
        }
    }

    fn build_table(&self, target: &mut Vec<u8>, virtual_address: u32) -> Result<u32, ResourceError> {
        let table_offset = to_offset(target.len())?;

        let mut name_entries = self.name_entries.iter().collect::<Vec<_>>();
        name_entries.sort_by(|(a, _), (b, _)| a.cmp(b));
        let mut id_entries = self.id_entries.iter().collect::<Vec<_>>();
        id_entries.sort_by_key(|(id, _)| **id);

        let too_many =
            |count: usize| ResourceError::InvalidTable(format!("{} entries in one table", count));
        let data = ResourceDirectoryTable {
            number_of_name_entries: u16::try_from(name_entries.len())
                .map_err(|_| too_many(name_entries.len()))?,
            number_of_id_entries: u16::try_from(id_entries.len())
                .map_err(|_| too_many(id_entries.len()))?,
            ..self.data
        };
        target.extend_from_slice(data.as_bytes());

        let entries_offset = target.len();
        let number_of_entries = name_entries.len() + id_entries.len();
        target.resize(entries_offset + number_of_entries * RESOURCE_DIRECTORY_ENTRY_SIZE as usize, 0);

        let mut entries = Vec::with_capacity(number_of_entries);
        for (name, _) in &name_entries {
            entries.push(ResourceDirectoryEntry {
                name_offset_or_integer_id: to_offset(target.len())? | RESOURCE_NAME_FLAG,
                data_entry_or_subdirectory_offset: 0,
            });
            name.write(target);
        }
        pad_to_dword(target);
        for (id, _) in &id_entries {
            let id = **id;
            if id & RESOURCE_NAME_FLAG != 0 {
                return Err(ResourceError::InvalidTable(format!("invalid resource id {:#x}", id)));
            }
            entries.push(ResourceDirectoryEntry {
                name_offset_or_integer_id:         id,
                data_entry_or_subdirectory_offset: 0,
            });
        }

        let children =
            name_entries.iter().map(|(_, entry)| *entry).chain(id_entries.iter().map(|(_, entry)| *entry));
        for (entry, child) in entries.iter_mut().zip(children) {
            entry.data_entry_or_subdirectory_offset = match child {
                ResourceEntry::Table(table) => {
                    table.build_table(target, virtual_address)? | RESOURCE_SUBDIRECTORY_FLAG
                }
                ResourceEntry::Data(data) => data.build_data(target, virtual_address)?,
            };
        }

        for (index, entry) in entries.iter().enumerate() {
            let offset = entries_offset + index * RESOURCE_DIRECTORY_ENTRY_SIZE as usize;
            target[offset..offset + RESOURCE_DIRECTORY_ENTRY_SIZE as usize]
                .copy_from_slice(entry.as_bytes());
        }

        Ok(table_offset)
    }

    /// Get a resource entry from the table.
    /// # Returns
    /// The resource entry.
    pub fn get<N: Borrow<ResourceEntryName>>(&self, name: N) -> Option<&ResourceEntry> {
        match name.borrow() {
            ResourceEntryName::ID(id) => self.id_entries.get(id),
            ResourceEntryName::Name(name) => self.name_entries.get(name),
        }
    }

    /// Get a mutable resource entry from the table.
    /// # Returns
    /// The resource entry.
    pub fn get_mut<N: Borrow<ResourceEntryName>>(&mut self, name: N) -> Option<&mut ResourceEntry> {
        match name.borrow() {
            ResourceEntryName::ID(id) => self.id_entries.get_mut(id),
            ResourceEntryName::Name(name) => self.name_entries.get_mut(name),
        }
    }

    /// Insert a resource entry into the table.
    /// If an entry with the given name already exists, it will be replaced.
    /// # Returns
    /// The replaced entry.
    pub fn insert<N: Borrow<ResourceEntryName>>(
        &mut self, name: N, entry: ResourceEntry,
    ) -> Option<ResourceEntry> {
        let entry = match name.borrow() {
            ResourceEntryName::ID(id) => self.id_entries.insert(*id, entry),
            ResourceEntryName::Name(name) => self.name_entries.insert(name.clone(), entry),
        };
        self.update_counts();
        entry
    }

    /// Remove a resource entry from the table.
    /// The order of the remaining entries is kept.
    /// # Returns
    /// The removed entry.
    pub fn remove<N: Borrow<ResourceEntryName>>(&mut self, name: N) -> Option<ResourceEntry> {
        let entry = match name.borrow() {
            ResourceEntryName::ID(id) => self.id_entries.shift_remove(id),
            ResourceEntryName::Name(name) => self.name_entries.shift_remove(name),
        };
        self.update_counts();
        entry
    }

    fn update_counts(&mut self) {
        self.data.number_of_name_entries =
            u16::try_from(self.name_entries.len()).unwrap_or(u16::MAX);
        self.data.number_of_id_entries = u16::try_from(self.id_entries.len()).unwrap_or(u16::MAX);
    }

    /// Returns the names of the entries in the table, names first.
    pub fn entries(&self) -> Vec<ResourceEntryName> {
        self.iter().map(|(name, _)| name).collect()
    }

    /// Returns the entries in the table with their names, names first.
    pub fn iter(&self) -> impl Iterator<Item = (ResourceEntryName, &ResourceEntry)> {
        self.name_entries
            .iter()
            .map(|(name, entry)| (ResourceEntryName::Name(name.clone()), entry))
            .chain(self.id_entries.iter().map(|(&id, entry)| (ResourceEntryName::ID(id), entry)))
    }

    /// Returns the entries keyed by name.
    pub fn name_entries(&self) -> &IndexMap<ResourceString, ResourceEntry, RandomState> {
        &self.name_entries
    }

    /// Returns the entries keyed by id.
    pub fn id_entries(&self) -> &IndexMap<u32, ResourceEntry, RandomState> { &self.id_entries }

    /// Returns the directory table header as parsed.
    pub fn header(&self) -> &ResourceDirectoryTable { &self.data }

    /// Returns the number of entries in the table.
    pub fn len(&self) -> usize { self.name_entries.len() + self.id_entries.len() }

    /// Returns whether the table has no entries.
    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// Returns the complete size of the table, its names and its children in the resource directory.
    pub fn size(&self) -> u32 {
        let names_size = self.name_entries.keys().map(ResourceString::size).sum::<u32>();
        RESOURCE_DIRECTORY_TABLE_SIZE
            + self.len() as u32 * RESOURCE_DIRECTORY_ENTRY_SIZE
            + aligned_to(names_size, 4)
            + self.name_entries.values().chain(self.id_entries.values()).map(ResourceEntry::size).sum::<u32>()
    }
}

/// Resource data content.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ResourceContent {
    /// Decoded string table block, stored for `RT_STRING` resources.
    Strings(StringBlock),
    /// Raw data, stored unmodified for all other resource types.
    Raw(DebugIgnore<Vec<u8>>),
}

/// Resource data leaf.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ResourceData {
    data_entry: ResourceDataEntry,
    content:    ResourceContent,
}
impl ResourceData {
    /// Create raw resource data.
    pub fn raw(data: Vec<u8>, codepage: u32) -> Self {
        Self {
            data_entry: ResourceDataEntry {
                size: data.len() as u32,
                codepage,
                ..ResourceDataEntry::default()
            },
            content:    ResourceContent::Raw(data.into()),
        }
    }

    /// Create string table block data.
    pub fn strings_with_codepage(block: StringBlock, codepage: u32) -> Self {
        Self {
            data_entry: ResourceDataEntry {
                size: block.size(),
                codepage,
                ..ResourceDataEntry::default()
            },
            content:    ResourceContent::Strings(block),
        }
    }

    fn build_data(&self, target: &mut Vec<u8>, virtual_address: u32) -> Result<u32, ResourceError> {
        let entry_offset = to_offset(target.len())?;
        let payload = match &self.content {
            ResourceContent::Strings(block) => block.build(),
            ResourceContent::Raw(data) => data.to_vec(),
        };
        let data_offset = entry_offset + RESOURCE_DATA_ENTRY_SIZE;
        let data_entry = ResourceDataEntry {
            data_rva: virtual_address
                .checked_add(data_offset)
                .ok_or(ResourceError::TooLarge(data_offset as usize))?,
            size:     payload.len() as u32,
            codepage: self.data_entry.codepage,
            reserved: 0,
        };
        target.extend_from_slice(data_entry.as_bytes());
        target.extend_from_slice(&payload);
        pad_to_dword(target);
        Ok(entry_offset)
    }

    /// Returns the data entry as read from the source image.
    pub fn data_entry(&self) -> &ResourceDataEntry { &self.data_entry }

    /// Returns the content.
    pub fn content(&self) -> &ResourceContent { &self.content }

    /// Returns the raw data, or `None` for string table blocks.
    pub fn data(&self) -> Option<&[u8]> {
        match &self.content {
            ResourceContent::Raw(data) => Some(data.as_slice()),
            ResourceContent::Strings(_) => None,
        }
    }

    /// Returns the string table block, or `None` for raw data.
    pub fn strings(&self) -> Option<&StringBlock> {
        match &self.content {
            ResourceContent::Strings(block) => Some(block),
            ResourceContent::Raw(_) => None,
        }
    }

    /// Returns the mutable string table block, or `None` for raw data.
    pub fn strings_mut(&mut self) -> Option<&mut StringBlock> {
        match &mut self.content {
            ResourceContent::Strings(block) => Some(block),
            ResourceContent::Raw(_) => None,
        }
    }

    /// Returns the codepage of the data.
    pub fn codepage(&self) -> u32 { self.data_entry.codepage }

    /// Set the raw data, replacing any content.
    pub fn set_data(&mut self, data: Vec<u8>) { self.content = ResourceContent::Raw(data.into()); }

    /// Set the codepage of the data.
    pub fn set_codepage(&mut self, codepage: u32) { self.data_entry.codepage = codepage; }

    /// Returns the size of the built content in bytes.
    pub fn content_size(&self) -> u32 {
        match &self.content {
            ResourceContent::Strings(block) => block.size(),
            ResourceContent::Raw(data) => data.len() as u32,
        }
    }
}

/// Resource entry in a resource table.
/// This can be either a child table or data.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ResourceEntry {
    Table(ResourceTable),
    Data(ResourceData),
}
impl ResourceEntry {
    /// Returns the child table, or `None` if the entry is data.
    pub fn as_table(&self) -> Option<&ResourceTable> {
        match self {
            ResourceEntry::Table(table) => Some(table),
            ResourceEntry::Data(_) => None,
        }
    }

    /// Returns the mutable child table, or `None` if the entry is data.
    pub fn as_table_mut(&mut self) -> Option<&mut ResourceTable> {
        match self {
            ResourceEntry::Table(table) => Some(table),
            ResourceEntry::Data(_) => None,
        }
    }

    /// Returns the data, or `None` if the entry is a table.
    pub fn as_data(&self) -> Option<&ResourceData> {
        match self {
            ResourceEntry::Data(data) => Some(data),
            ResourceEntry::Table(_) => None,
        }
    }

    /// Returns the mutable data, or `None` if the entry is a table.
    pub fn as_data_mut(&mut self) -> Option<&mut ResourceData> {
        match self {
            ResourceEntry::Data(data) => Some(data),
            ResourceEntry::Table(_) => None,
        }
    }

    /// Returns the size of the built entry target and its children in bytes.
    pub fn size(&self) -> u32 {
        match self {
            ResourceEntry::Table(table) => table.size(),
            // description + padded data
            ResourceEntry::Data(data) => {
                RESOURCE_DATA_ENTRY_SIZE + aligned_to(data.content_size(), 4)
            }
        }
    }
}

/// Resource directory entry name.
/// This can either be a raw id or a name.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum ResourceEntryName {
    ID(u32),
    Name(ResourceString),
}
impl ResourceEntryName {
    /// Create a name entry from text.
    ///
    /// # Returns
    /// Returns an error if the text has more than 65535 UTF-16 characters.
    pub fn from_string<S: AsRef<str>>(string: S) -> Result<Self, ResourceError> {
        ResourceString::from_text(string).map(Self::Name)
    }

    /// Returns the name as text, or `None` for ids.
    pub fn to_string(&self) -> Option<String> {
        match self {
            Self::ID(_) => None,
            Self::Name(name) => Some(name.to_string_lossy()),
        }
    }
}
impl From<u32> for ResourceEntryName {
    fn from(id: u32) -> Self { Self::ID(id) }
}
impl From<ResourceString> for ResourceEntryName {
    fn from(name: ResourceString) -> Self { Self::Name(name) }
}
