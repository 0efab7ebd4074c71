//! Portable executable data types.
//!
//! These types are a one-to-one mapping of the data described in <https://docs.microsoft.com/en-us/windows/win32/debug/pe-format>
//! for 32-bit images.

use alloc::string::{String, ToString};

use zerocopy::{FromBytes, Immutable, IntoBytes};

use crate::constants::*;

#[repr(C, packed(2))]
#[derive(Debug, Clone, Copy, Eq, PartialEq, FromBytes, IntoBytes, Immutable, Default)]
pub struct DosHeader {
    pub e_magic:    u16,
    pub e_cblp:     u16,
    pub e_cp:       u16,
    pub e_crlc:     u16,
    pub e_cparhdr:  u16,
    pub e_minalloc: u16,
    pub e_maxalloc: u16,
    pub e_ss:       u16,
    pub e_sp:       u16,
    pub e_csum:     u16,
    pub e_ip:       u16,
    pub e_cs:       u16,
    pub e_lfarlc:   u16,
    pub e_ovno:     u16,
    pub e_res:      [u16; 4],
    pub e_oemid:    u16,
    pub e_oeminfo:  u16,
    pub e_res2:     [u16; 10],
    pub e_lfanew:   u32,
}

#[repr(C, packed(2))]
#[derive(
    Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, FromBytes, IntoBytes, Immutable, Default,
)]
pub struct CoffHeader {
    pub machine:                 u16,
    pub number_of_sections:      u16,
    pub time_date_stamp:         u32,
    pub pointer_to_symbol_table: u32,
    pub number_of_symbols:       u32,
    pub size_of_optional_header: u16,
    pub characteristics:         u16,
}

#[repr(C, packed(4))]
#[derive(
    Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, FromBytes, IntoBytes, Immutable, Default,
)]
pub struct ImageDataDirectory {
    pub virtual_address: u32,
    pub size:            u32,
}

#[repr(C, packed(4))]
#[derive(Debug, Clone, Copy, Eq, PartialEq, FromBytes, IntoBytes, Immutable)]
pub struct OptionalHeader32 {
    pub magic:                          u16,
    pub major_linker_version:           u8,
    pub minor_linker_version:           u8,
    pub size_of_code:                   u32,
    pub size_of_initialized_data:       u32,
    pub size_of_uninitialized_data:     u32,
    pub address_of_entry_point:         u32,
    pub base_of_code:                   u32,
    pub base_of_data:                   u32,
    pub image_base:                     u32,
    pub section_alignment:              u32,
    pub file_alignment:                 u32,
    pub major_operating_system_version: u16,
    pub minor_operating_system_version: u16,
    pub major_image_version:            u16,
    pub minor_image_version:            u16,
    pub major_subsystem_version:        u16,
    pub minor_subsystem_version:        u16,
    pub win32_version_value:            u32,
    pub size_of_image:                  u32,
    pub size_of_headers:                u32,
    pub check_sum:                      u32,
    pub subsystem:                      u16,
    pub dll_characteristics:            u16,
    pub size_of_stack_reserve:          u32,
    pub size_of_stack_commit:           u32,
    pub size_of_heap_reserve:           u32,
    pub size_of_heap_commit:            u32,
    pub loader_flags:                   u32,
    pub number_of_rva_and_sizes:        u32,
    pub data_directory:                 [ImageDataDirectory; DATA_DIRECTORY_COUNT],
}
impl Default for OptionalHeader32 {
    fn default() -> Self {
        Self {
            magic:                          PE_32_MAGIC,
            major_linker_version:           0,
            minor_linker_version:           0,
            size_of_code:                   0,
            size_of_initialized_data:       0,
            size_of_uninitialized_data:     0,
            address_of_entry_point:         0,
            base_of_code:                   0,
            base_of_data:                   0,
            image_base:                     0x00400000,
            section_alignment:              0x1000,
            file_alignment:                 0x200,
            major_operating_system_version: 4,
            minor_operating_system_version: 0,
            major_image_version:            0,
            minor_image_version:            0,
            major_subsystem_version:        4,
            minor_subsystem_version:        0,
            win32_version_value:            0,
            size_of_image:                  0,
            size_of_headers:                0,
            check_sum:                      0,
            subsystem:                      0,
            dll_characteristics:            0,
            size_of_stack_reserve:          0x100000,
            size_of_stack_commit:           0x1000,
            size_of_heap_reserve:           0x100000,
            size_of_heap_commit:            0x1000,
            loader_flags:                   0,
            number_of_rva_and_sizes:        DATA_DIRECTORY_COUNT as u32,
            data_directory:                 [ImageDataDirectory::default(); DATA_DIRECTORY_COUNT],
        }
    }
}

#[repr(C, packed(4))]
#[derive(
    Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, FromBytes, IntoBytes, Immutable, Default,
)]
pub struct SectionHeader {
    pub name:                   [u8; 8],
    pub virtual_size:           u32,
    pub virtual_address:        u32,
    pub size_of_raw_data:       u32,
    pub pointer_to_raw_data:    u32,
    pub pointer_to_relocations: u32,
    pub pointer_to_linenumbers: u32,
    pub number_of_relocations:  u16,
    pub number_of_linenumbers:  u16,
    pub characteristics:        u32,
}

impl SectionHeader {
    /// Returns the section name, or `None` if it is not valid utf8.
    ///
    /// Names longer than 8 characters are stored as `/` followed by a decimal string table offset.
    /// Such names are returned as stored, see [`SectionHeader::has_long_name`].
    pub fn name(&self) -> Option<String> {
        let name = &self.name[0..self.name.iter().position(|&c| c == b'\0').unwrap_or(8)];
        core::str::from_utf8(name).ok().map(|name| name.to_string())
    }

    /// Returns whether the name refers to an entry in the COFF string table instead of holding the name itself.
    pub fn has_long_name(&self) -> bool {
        let name = self.name;
        name[0] == b'/'
            && name[1].is_ascii_digit()
            && name[1..].iter().take_while(|&&c| c != 0).all(u8::is_ascii_digit)
    }

    /// Returns whether the virtual range of the section contains the rva.
    pub fn contains_rva(&self, rva: u32) -> bool {
        let start = self.virtual_address;
        let size = self.virtual_size;
        rva >= start && (rva as u64) < start as u64 + size as u64
    }
}

#[repr(C, packed(2))]
#[derive(
    Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, FromBytes, IntoBytes, Immutable, Default,
)]
pub struct ResourceDirectoryTable {
    pub characteristics:        u32,
    pub time_date_stamp:        u32,
    pub major_version:          u16,
    pub minor_version:          u16,
    pub number_of_name_entries: u16,
    pub number_of_id_entries:   u16,
}

#[repr(C, packed(4))]
#[derive(
    Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, FromBytes, IntoBytes, Immutable, Default,
)]
pub struct ResourceDirectoryEntry {
    pub name_offset_or_integer_id:         u32,
    pub data_entry_or_subdirectory_offset: u32,
}

#[repr(C, packed(4))]
#[derive(
    Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, FromBytes, IntoBytes, Immutable, Default,
)]
pub struct ResourceDataEntry {
    pub data_rva: u32,
    pub size:     u32,
    pub codepage: u32,
    pub reserved: u32,
}
