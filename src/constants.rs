//! Windows API and binary constants.

#![allow(non_upper_case_globals)]

pub type DWORD = u32;
pub type UINT = u32;
pub type WORD = u16;
pub type LANGID = WORD;


// https://docs.microsoft.com/en-us/openspecs/windows_protocols/ms-lcid/a9eac961-e77d-41a6-90a5-ce1a8b0cdb9c
pub const LANGUAGE_ID_NEUTRAL: LANGID = 0; // 0x0000, LANG_NEUTRAL
pub const LANGUAGE_ID_EN_US: LANGID = 1033; // 0x0409, en-US
// https://docs.microsoft.com/en-us/windows/win32/intl/code-page-identifiers
pub const CODE_PAGE_ID_WINDOWS_1252: DWORD = 1252; // Western European (Windows)
pub const CODE_PAGE_ID_UTF16LE: DWORD = 1200;

/// Codepage assigned to string table blocks that are created from scratch.
pub const DEFAULT_CODEPAGE: DWORD = CODE_PAGE_ID_WINDOWS_1252;


// https://docs.microsoft.com/en-us/windows/win32/debug/pe-format

pub const PE_DOS_MAGIC: WORD = 0x5a4d; // MZ
pub const PE_PTR_OFFSET: DWORD = 0x03c;
pub const PE_NT_SIGNATURE: [u8; 4] = *b"PE\0\0";
pub const PE_32_MAGIC: WORD = 0x010b;
pub const PE_64_MAGIC: WORD = 0x020b;

pub const DOS_HEADER_SIZE: usize = 64;
pub const COFF_HEADER_SIZE: usize = 20;
pub const OPTIONAL_HEADER32_SIZE: usize = 224;
pub const SECTION_HEADER_SIZE: usize = 40;

pub const DATA_DIRECTORY_COUNT: usize = 16;
pub const IMAGE_DIRECTORY_ENTRY_RESOURCE: usize = 2;


// https://learn.microsoft.com/en-us/windows/win32/debug/pe-format#the-rsrc-section

pub const RESOURCE_DIRECTORY_TABLE_SIZE: u32 = 16;
pub const RESOURCE_DIRECTORY_ENTRY_SIZE: u32 = 8;
pub const RESOURCE_DATA_ENTRY_SIZE: u32 = 16;
/// High bit of an entry's name field, set when the entry is keyed by a name string.
pub const RESOURCE_NAME_FLAG: DWORD = 0x80000000;
/// High bit of an entry's offset field, set when the entry points to a subdirectory.
pub const RESOURCE_SUBDIRECTORY_FLAG: DWORD = 0x80000000;

/// Number of strings held by a single string table block.
pub const STRING_BLOCK_SLOTS: usize = 16;


// https://docs.microsoft.com/en-us/windows/win32/menurc/resource-types

pub const RT_UNKNOWN: WORD = 0x00;
pub const RT_CURSOR: WORD = 0x01;
pub const RT_BITMAP: WORD = 0x02;
pub const RT_ICON: WORD = 0x03;
pub const RT_MENU: WORD = 0x04;
pub const RT_DIALOG: WORD = 0x05;
pub const RT_STRING: WORD = 0x06;
pub const RT_FONTDIR: WORD = 0x07;
pub const RT_FONT: WORD = 0x08;
pub const RT_ACCELERATOR: WORD = 0x09;
pub const RT_RCDATA: WORD = 0x0A;
pub const RT_MESSAGETABLE: WORD = 0x0B;
pub const RT_GROUP_CURSOR: WORD = 0x0C;
pub const RT_GROUP_ICON: WORD = 0x0E;
pub const RT_VERSION: WORD = 0x10;
pub const RT_DLGINCLUDE: WORD = 0x11;
pub const RT_PLUGPLAY: WORD = 0x13;
pub const RT_VXD: WORD = 0x14;
pub const RT_ANICURSOR: WORD = 0x15;
pub const RT_ANIICON: WORD = 0x16;
pub const RT_HTML: WORD = 0x17;
pub const RT_MANIFEST: WORD = 0x18;

/// Returns the symbolic name of a predefined resource type.
pub const fn resource_type_name(id: u32) -> Option<&'static str> {
    if id > WORD::MAX as u32 {
        return None;
    }
    match id as WORD {
        RT_CURSOR => Some("CURSOR"),
        RT_BITMAP => Some("BITMAP"),
        RT_ICON => Some("ICON"),
        RT_MENU => Some("MENU"),
        RT_DIALOG => Some("DIALOG"),
        RT_STRING => Some("STRING"),
        RT_FONTDIR => Some("FONTDIR"),
        RT_FONT => Some("FONT"),
        RT_ACCELERATOR => Some("ACCELERATOR"),
        RT_RCDATA => Some("RCDATA"),
        RT_MESSAGETABLE => Some("MESSAGETABLE"),
        RT_GROUP_CURSOR => Some("GROUP_CURSOR"),
        RT_GROUP_ICON => Some("GROUP_ICON"),
        RT_VERSION => Some("VERSION"),
        RT_DLGINCLUDE => Some("DLGINCLUDE"),
        RT_PLUGPLAY => Some("PLUGPLAY"),
        RT_VXD => Some("VXD"),
        RT_ANICURSOR => Some("ANICURSOR"),
        RT_ANIICON => Some("ANIICON"),
        RT_HTML => Some("HTML"),
        RT_MANIFEST => Some("MANIFEST"),
        _ => None,
    }
}


// https://docs.microsoft.com/en-us/windows/win32/debug/pe-format#section-flags

pub const IMAGE_SCN_CNT_CODE: DWORD = 0x00000020;
pub const IMAGE_SCN_CNT_INITIALIZED_DATA: DWORD = 0x00000040;
pub const IMAGE_SCN_CNT_UNINITIALIZED_DATA: DWORD = 0x00000080;
pub const IMAGE_SCN_MEM_EXECUTE: DWORD = 0x20000000;
pub const IMAGE_SCN_MEM_READ: DWORD = 0x40000000;
pub const IMAGE_SCN_MEM_WRITE: DWORD = 0x80000000;
