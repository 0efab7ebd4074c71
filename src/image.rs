//! Portable executable image representation.
//!
//! See <https://learn.microsoft.com/en-us/windows/win32/debug/pe-format> for more information.

use alloc::{
    collections::TryReserveError,
    string::{String, ToString},
    vec::Vec,
};
use core::fmt;

use debug_ignore::DebugIgnore;
use log::{debug, info, warn};
use zerocopy::IntoBytes;

use crate::{constants::*, errors::*, resource::*, strings::*, types::*, util::*};

/// Name of the section added when an image without resource section receives resources.
const RESOURCE_SECTION_NAME: [u8; 8] = *b".rsrc\0\0\0";

/// Index of the certificate table, the only data directory holding a file offset instead of an rva.
const CERTIFICATE_TABLE_INDEX: usize = 4;

fn copy_bytes(data: &[u8]) -> Result<DebugIgnore<Vec<u8>>, TryReserveError> {
    let mut copy = Vec::new();
    copy.try_reserve_exact(data.len())?;
    copy.extend_from_slice(data);
    Ok(copy.into())
}

/// Portable executable image representation.
///
/// This struct is the main entry point for parsing, querying and updating a 32-bit portable executable image.
/// It owns all headers, the data of every section and the decoded resource directory.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Image {
    pub(crate) dos_header:            DosHeader,
    pub(crate) dos_stub:              DebugIgnore<Vec<u8>>,
    pub(crate) signature:             [u8; 4],
    pub(crate) coff_header:           CoffHeader,
    pub(crate) optional_header:       OptionalHeader32,
    pub(crate) optional_header_extra: DebugIgnore<Vec<u8>>,
    pub(crate) section_table:         Vec<SectionHeader>,
    pub(crate) header_padding:        DebugIgnore<Vec<u8>>,
    pub(crate) section_data:          Vec<DebugIgnore<Vec<u8>>>,
    pub(crate) overlay:               DebugIgnore<Vec<u8>>,

    pub(crate) resource_directory: Option<ResourceDirectory>,
}

impl Image {
    /// Parse a portable executable image from a byte slice.
    ///
    /// # Returns
    /// Returns the `Image`, or an error if the byte slice is not a valid 32-bit portable executable image.
    pub fn parse(image: &[u8]) -> Result<Self, ImageReadError> {
        let dos_header = read::<DosHeader>(image)?;
        let pe_dos_magic = dos_header.e_magic;
        debug!("pe_dos_magic: {:#x?}", pe_dos_magic);
        if pe_dos_magic != PE_DOS_MAGIC {
            return Err(ImageReadError::InvalidSignature("no dos magic".into()));
        }

        let pe_signature_offset = dos_header.e_lfanew as usize;
        debug!("pe_signature_offset: {:#x?}", pe_signature_offset);
        if pe_signature_offset < DOS_HEADER_SIZE || pe_signature_offset + 4 > image.len() {
            return Err(ImageReadError::InvalidHeader(
                "pe signature offset outside image".into(),
            ));
        }
        let dos_stub = copy_bytes(&image[DOS_HEADER_SIZE..pe_signature_offset])?;

        let signature = read_at::<[u8; 4]>(image, pe_signature_offset)?;
        debug!("pe_signature: {:x?}", signature);
        if signature != PE_NT_SIGNATURE {
            return Err(ImageReadError::InvalidSignature("no pe signature".into()));
        }

        let coff_header_offset = pe_signature_offset + 4;
        let coff_header = read_at::<CoffHeader>(image, coff_header_offset)?;
        debug!("{:#x?}: {:#x?}", coff_header_offset, coff_header);

        let optional_header_offset = coff_header_offset + COFF_HEADER_SIZE;
        let magic = read_at::<u16>(image, optional_header_offset)?;
        match magic {
            PE_32_MAGIC => {}
            PE_64_MAGIC => {
                return Err(ImageReadError::Unsupported("64-bit optional header".into()));
            }
            magic => {
                return Err(ImageReadError::InvalidHeader(alloc::format!(
                    "invalid optional header magic {:#x}",
                    magic
                )));
            }
        }
        let size_of_optional_header = coff_header.size_of_optional_header as usize;
        if size_of_optional_header < OPTIONAL_HEADER32_SIZE {
            return Err(ImageReadError::Unsupported(alloc::format!(
                "optional header of {} bytes without all data directories",
                size_of_optional_header
            )));
        }
        let optional_header = read_at::<OptionalHeader32>(image, optional_header_offset)?;
        debug!("{:#x?}: {:#x?}", optional_header_offset, optional_header);
        let optional_header_extra = copy_bytes(slice_at(
            image,
            optional_header_offset + OPTIONAL_HEADER32_SIZE,
            size_of_optional_header - OPTIONAL_HEADER32_SIZE,
        )?)?;

        let section_table_offset = optional_header_offset + size_of_optional_header;
        let mut section_table = Vec::new();
        for index in 0..coff_header.number_of_sections as usize {
            let offset = section_table_offset + index * SECTION_HEADER_SIZE;
            let section_header = read_at::<SectionHeader>(image, offset)?;
            debug!(
                "{:#x?}: {}: {:#x?}",
                offset,
                section_header.name().unwrap_or("?".to_string()),
                section_header
            );
            if section_header.has_long_name() {
                warn!(
                    "section {} refers to a string table name, keeping the name as stored",
                    section_header.name().unwrap_or("?".to_string())
                );
            }
            section_table.push(section_header);
        }
        let section_table_end = section_table_offset + section_table.len() * SECTION_HEADER_SIZE;

        let mut section_data = Vec::with_capacity(section_table.len());
        let mut first_section_start: Option<usize> = None;
        let mut last_section_end = section_table_end;
        for (index, section_header) in section_table.iter().enumerate() {
            let size = section_header.size_of_raw_data as usize;
            if size == 0 {
                section_data.push(Vec::new().into());
                continue;
            }
            let start = section_header.pointer_to_raw_data as usize;
            if start < section_table_end {
                return Err(ImageReadError::InvalidSection(alloc::format!(
                    "section {} overlaps the headers",
                    index
                )));
            }
            let data = slice_at(image, start, size).map_err(|_| {
                ImageReadError::InvalidSection(alloc::format!(
                    "section {} data at {:#x} with size {:#x} outside image ({:#x})",
                    index,
                    start,
                    size,
                    image.len()
                ))
            })?;
            section_data.push(copy_bytes(data)?);
            first_section_start = Some(first_section_start.map_or(start, |first| first.min(start)));
            last_section_end = last_section_end.max(start + size);
        }
        // without section data everything after the section table is overlay
        let first_section_start = first_section_start.unwrap_or(section_table_end);
        let header_padding = copy_bytes(&image[section_table_end..first_section_start])?;
        let overlay = copy_bytes(image.get(last_section_end..).unwrap_or_default())?;
        if !overlay.is_empty() {
            debug!("overlay: {:#x?} bytes at {:#x?}", overlay.len(), last_section_end);
        }

        let mut resource_directory = None;
        let resource_data = optional_header.data_directory[IMAGE_DIRECTORY_ENTRY_RESOURCE];
        let number_of_rva_and_sizes = optional_header.number_of_rva_and_sizes as usize;
        if number_of_rva_and_sizes > IMAGE_DIRECTORY_ENTRY_RESOURCE
            && resource_data.virtual_address > 0
            && resource_data.size > 0
        {
            let virtual_address = resource_data.virtual_address;
            debug!("resource directory at {:#x?}", virtual_address);
            resource_directory =
                Some(ResourceDirectory::parse_image(image, &section_table, virtual_address)?);
        }

        Ok(Self {
            dos_header,
            dos_stub,
            signature,
            coff_header,
            optional_header,
            optional_header_extra,
            section_table,
            header_padding,
            section_data,
            overlay,
            resource_directory,
        })
    }

    #[cfg(feature = "std")]
    /// Parse a portable executable image from a file.
    ///
    /// # Returns
    /// Returns the `Image`, or an error if the file could not be read or is not a valid portable executable image.
    pub fn parse_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ImageReadError> {
        let data = std::fs::read(path)?;
        Self::parse(&data)
    }

    #[cfg(feature = "std")]
    /// Parse a portable executable image from a reader.
    ///
    /// # Returns
    /// Returns the `Image`, or an error if the reader could not be read or is not a valid portable executable image.
    pub fn parse_reader<R: std::io::Read>(reader: &mut R) -> Result<Self, ImageReadError> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::parse(&data)
    }

    #[cfg(feature = "std")]
    /// Build the image and write it to a file.
    ///
    /// # Returns
    /// Returns an error if the image could not be built or the file could not be written.
    pub fn write_file<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), ImageWriteError> {
        let data = self.build()?;
        std::fs::write(path, data).map_err(|e| e.into())
    }

    #[cfg(feature = "std")]
    /// Build the image and write it to a writer.
    ///
    /// # Returns
    /// Returns an error if the image could not be built or the writer could not be written.
    pub fn write_writer<W: std::io::Write>(&self, writer: &mut W) -> Result<(), ImageWriteError> {
        let data = self.build()?;
        writer.write_all(&data).map_err(|e| e.into())
    }

    /// Build the image with all changes applied.
    ///
    /// The resource directory is rebuilt into the section containing it, or into a new `.rsrc` section if the image has none.
    /// Section file offsets are recomputed in section table order and every section is padded to the file alignment.
    /// A coff symbol table in the overlay is moved along with it.
    ///
    /// # Returns
    /// Returns the raw image data, or an error in the following cases:
    /// - The resource section is shared with another data directory.
    /// - The rebuilt resource section would overlap the following section.
    /// - A new resource section is needed and there is not enough space in the header.
    /// - The coff symbol table is located in section data and the section layout changed.
    pub fn build(&self) -> Result<Vec<u8>, ImageWriteError> {
        // copy to-be-modified data to allow erroring out without invalidating the image
        let mut coff_header = self.coff_header;
        let mut optional_header = self.optional_header;
        let mut section_table = self.section_table.clone();
        let mut header_padding = self.header_padding.as_slice();

        let resource_section = match &self.resource_directory {
            Some(resource_directory) => {
                optional_header.check_sum = 0;
                Some(self.build_resource_section(
                    resource_directory,
                    &mut coff_header,
                    &mut optional_header,
                    &mut section_table,
                    &mut header_padding,
                )?)
            }
            None => None,
        };
        let mut section_data = self.section_data.iter().map(|data| data.as_slice()).collect::<Vec<_>>();
        if let Some((index, data)) = &resource_section {
            if *index == section_data.len() {
                section_data.push(data.as_slice());
            } else {
                section_data[*index] = data.as_slice();
            }
        }

        let file_alignment = optional_header.file_alignment;
        let section_alignment = optional_header.section_alignment;
        let headers_size = self.headers_size(section_table.len()) + header_padding.len();
        let mut pointer = headers_size as u64;
        let mut size_of_image = aligned_to(optional_header.size_of_headers, section_alignment);
        for (section_header, data) in section_table.iter_mut().zip(section_data.iter()) {
            if !data.is_empty() {
                let pointer_to_raw_data = aligned_to(pointer, file_alignment as u64);
                let size_of_raw_data = aligned_to(data.len() as u64, file_alignment as u64);
                section_header.pointer_to_raw_data =
                    u32::try_from(pointer_to_raw_data).map_err(|_| ImageWriteError::TooLarge)?;
                section_header.size_of_raw_data =
                    u32::try_from(size_of_raw_data).map_err(|_| ImageWriteError::TooLarge)?;
                pointer = pointer_to_raw_data + size_of_raw_data;
            } else {
                section_header.size_of_raw_data = 0;
            }
            let virtual_end = section_header.virtual_address as u64
                + aligned_to(section_header.virtual_size as u64, section_alignment as u64);
            size_of_image = size_of_image
                .max(u32::try_from(virtual_end).map_err(|_| ImageWriteError::TooLarge)?);
        }
        optional_header.size_of_image = size_of_image;
        debug!("size of image: {:#x?}", size_of_image);

        let sections_end = self.sections_end();
        let pointer_to_symbol_table = coff_header.pointer_to_symbol_table;
        if pointer_to_symbol_table != 0 && pointer as usize != sections_end {
            if pointer_to_symbol_table as usize >= sections_end {
                // the symbol table is part of the overlay and moves with it
                let moved = pointer_to_symbol_table as u64 + pointer - sections_end as u64;
                coff_header.pointer_to_symbol_table =
                    u32::try_from(moved).map_err(|_| ImageWriteError::TooLarge)?;
                debug!(
                    "moved symbol table from {:#x?} to {:#x?}",
                    pointer_to_symbol_table, moved
                );
            } else {
                return Err(ImageWriteError::SymbolTableInSections(pointer_to_symbol_table));
            }
        }

        let certificate_table = optional_header.data_directory[CERTIFICATE_TABLE_INDEX];
        if certificate_table.size > 0 && pointer as usize != sections_end {
            warn!("image layout changed, the certificate table is no longer valid");
        }

        let mut image = Vec::with_capacity(pointer as usize + self.overlay.len());
        image.extend_from_slice(self.dos_header.as_bytes());
        image.extend_from_slice(&self.dos_stub);
        image.extend_from_slice(&self.signature);
        image.extend_from_slice(coff_header.as_bytes());
        image.extend_from_slice(optional_header.as_bytes());
        image.extend_from_slice(&self.optional_header_extra);
        for section_header in section_table.iter() {
            image.extend_from_slice(section_header.as_bytes());
        }
        image.extend_from_slice(header_padding);
        for (section_header, data) in section_table.iter().zip(section_data.iter()) {
            if data.is_empty() {
                continue;
            }
            image.resize(section_header.pointer_to_raw_data as usize, 0);
            image.extend_from_slice(data);
            image.resize(
                section_header.pointer_to_raw_data as usize
                    + section_header.size_of_raw_data as usize,
                0,
            );
        }
        image.extend_from_slice(&self.overlay);

        Ok(image)
    }

    /// Rebuild the resource directory into its section.
    /// Returns the index of the section and its new data, which is one past the last section if a section was added.
    fn build_resource_section(
        &self, resource_directory: &ResourceDirectory, coff_header: &mut CoffHeader,
        optional_header: &mut OptionalHeader32, section_table: &mut Vec<SectionHeader>,
        header_padding: &mut &[u8],
    ) -> Result<(usize, Vec<u8>), ImageWriteError> {
        let section_alignment = optional_header.section_alignment;
        let resource_dd = optional_header.data_directory[IMAGE_DIRECTORY_ENTRY_RESOURCE];
        let existing = section_table
            .iter()
            .position(|section| {
                resource_dd.virtual_address > 0 && section.contains_rva(resource_dd.virtual_address)
            });

        let Some(index) = existing else {
            let virtual_address = aligned_to(
                section_table
                    .iter()
                    .map(|section| section.virtual_address.saturating_add(section.virtual_size))
                    .max()
                    .unwrap_or(optional_header.size_of_headers),
                section_alignment,
            );
            debug!("adding new resource section at {:#x?}", virtual_address);
            let padding: &[u8] = *header_padding;
            if padding.len() < SECTION_HEADER_SIZE
                || padding[..SECTION_HEADER_SIZE].iter().any(|&b| b != 0)
            {
                return Err(ImageWriteError::NotEnoughSpaceInHeader);
            }
            *header_padding = &padding[SECTION_HEADER_SIZE..];

            let data = resource_directory.build(virtual_address)?;
            section_table.push(SectionHeader {
                name: RESOURCE_SECTION_NAME,
                virtual_size: data.len() as u32,
                virtual_address,
                characteristics: IMAGE_SCN_CNT_INITIALIZED_DATA | IMAGE_SCN_MEM_READ,
                ..SectionHeader::default()
            });
            coff_header.number_of_sections += 1;
            let number_of_rva_and_sizes = optional_header.number_of_rva_and_sizes;
            optional_header.number_of_rva_and_sizes =
                number_of_rva_and_sizes.max(IMAGE_DIRECTORY_ENTRY_RESOURCE as u32 + 1);
            optional_header.data_directory[IMAGE_DIRECTORY_ENTRY_RESOURCE] = ImageDataDirectory {
                virtual_address,
                size: data.len() as u32,
            };
            return Ok((section_table.len() - 1, data));
        };

        let section = section_table[index];
        let section_start = section.virtual_address;
        let section_end = section_start.saturating_add(section.virtual_size);
        debug!(
            "found resource directory in {} section: {:#x?}",
            section.name().unwrap_or("?".to_string()),
            section
        );
        let number_of_rva_and_sizes = optional_header.number_of_rva_and_sizes as usize;
        for (directory_index, directory) in optional_header
            .data_directory
            .iter()
            .enumerate()
            .take(number_of_rva_and_sizes.min(DATA_DIRECTORY_COUNT))
        {
            let virtual_address = directory.virtual_address;
            if directory_index != IMAGE_DIRECTORY_ENTRY_RESOURCE
                && directory_index != CERTIFICATE_TABLE_INDEX
                && directory.size > 0
                && virtual_address >= section_start
                && virtual_address < section_end
            {
                info!("resource section also used by data directory {}", directory_index);
                return Err(ImageWriteError::SharedSection(directory_index));
            }
        }

        // keep data in front of the directory, replace everything after it
        let directory_offset = (resource_dd.virtual_address - section_start) as usize;
        let existing_data = &self.section_data[index];
        let mut data = Vec::new();
        data.extend_from_slice(&existing_data[..directory_offset.min(existing_data.len())]);
        data.resize(directory_offset, 0);
        let directory = resource_directory.build(resource_dd.virtual_address)?;
        data.extend_from_slice(&directory);
        debug!(
            "new resource data size: {:#x?} (previous: {:#x?})",
            directory.len(),
            resource_dd.size
        );

        let virtual_size = u32::try_from(data.len()).map_err(|_| ImageWriteError::TooLarge)?;
        let virtual_end = section_start as u64 + aligned_to(virtual_size, section_alignment) as u64;
        for following in section_table.iter() {
            let following_start = following.virtual_address;
            if following_start > section_start && (following_start as u64) < virtual_end {
                return Err(ImageWriteError::SectionOverlap(index));
            }
        }

        section_table[index].virtual_size = virtual_size;
        optional_header.data_directory[IMAGE_DIRECTORY_ENTRY_RESOURCE].size =
            directory.len() as u32;
        Ok((index, data))
    }

    /// Returns the size of all headers up to the end of a section table with the given number of sections.
    fn headers_size(&self, number_of_sections: usize) -> usize {
        DOS_HEADER_SIZE
            + self.dos_stub.len()
            + 4
            + COFF_HEADER_SIZE
            + OPTIONAL_HEADER32_SIZE
            + self.optional_header_extra.len()
            + number_of_sections * SECTION_HEADER_SIZE
    }

    /// Returns the offset of the overlay in the source image.
    fn sections_end(&self) -> usize {
        self.section_table
            .iter()
            .filter(|section| section.size_of_raw_data > 0)
            .map(|section| section.pointer_to_raw_data as usize + section.size_of_raw_data as usize)
            .max()
            .unwrap_or(self.headers_size(self.section_table.len()) + self.header_padding.len())
    }

    /// Get a string from the string table.
    ///
    /// The language is currently not taken into account: the first language entry of the string block is used.
    ///
    /// # Returns
    /// The string with the codepage of its block, or `None` if the image has no such string.
    pub fn get_string(&self, id: u32, language: u32) -> Option<EncString<'_>> {
        self.resource_directory.as_ref()?.get_string(id, language)
    }

    /// Set a string in the string table, creating the resource directory and string table if needed.
    ///
    /// The text is stored as is. It has to match the codepage of the string block, see [`Image::get_string`].
    /// The language is currently not taken into account for existing blocks: the first language entry of the string block is used.
    ///
    /// # Returns
    /// The replaced string, or an error if the text is too long or the string table has an unexpected layout.
    pub fn set_string(
        &mut self, id: u32, language: u32, text: &str,
    ) -> Result<Option<ResourceString>, ResourceError> {
        self.resource_directory.get_or_insert_with(ResourceDirectory::new).set_string(id, language, text)
    }

    /// Remove a string from the string table.
    ///
    /// # Returns
    /// The removed string.
    pub fn remove_string(&mut self, id: u32, language: u32) -> Option<ResourceString> {
        self.resource_directory.as_mut()?.remove_string(id, language)
    }

    /// Set the resource directory of the image.
    /// The directory is built into the image by [`Image::build`].
    ///
    /// # Returns
    /// Returns the previous resource directory.
    pub fn set_resource_directory(
        &mut self, resource_directory: ResourceDirectory,
    ) -> Option<ResourceDirectory> {
        self.resource_directory.replace(resource_directory)
    }

    /// Returns the current resource directory or `None` if the image does not contain a resource directory.
    pub fn resource_directory(&self) -> Option<&ResourceDirectory> {
        self.resource_directory.as_ref()
    }

    /// Returns the mutable resource directory or `None` if the image does not contain a resource directory.
    pub fn resource_directory_mut(&mut self) -> Option<&mut ResourceDirectory> {
        self.resource_directory.as_mut()
    }

    /// Returns the parsed dos header.
    pub fn dos_header(&self) -> &DosHeader { &self.dos_header }

    /// Returns the real-mode stub program between the dos header and the pe signature.
    pub fn dos_stub(&self) -> &[u8] { &self.dos_stub }

    /// Returns the parsed coff header.
    pub fn coff_header(&self) -> &CoffHeader { &self.coff_header }

    /// Returns the parsed optional header.
    pub fn optional_header(&self) -> &OptionalHeader32 { &self.optional_header }

    /// Returns the data directory at the index.
    pub fn data_directory(&self, index: usize) -> Option<ImageDataDirectory> {
        if index >= self.optional_header.number_of_rva_and_sizes as usize {
            return None;
        }
        self.optional_header.data_directory.get(index).copied()
    }

    /// Returns the section header for the section at the index.
    pub fn section_header(&self, index: usize) -> Option<&SectionHeader> {
        self.section_table.get(index)
    }

    /// Returns the raw data of the section at the index as read from the source image.
    pub fn section_data(&self, index: usize) -> Option<&[u8]> {
        self.section_data.get(index).map(|data| data.as_slice())
    }

    /// Returns the section header containing the resource directory.
    pub fn resource_section_header(&self) -> Option<&SectionHeader> {
        let resource_dd = self.data_directory(IMAGE_DIRECTORY_ENTRY_RESOURCE)?;
        let virtual_address = resource_dd.virtual_address;
        if virtual_address == 0 {
            return None;
        }
        self.section_table.iter().find(|section| section.contains_rva(virtual_address))
    }

    /// Returns all section headers of the image.
    pub fn section_table(&self) -> &[SectionHeader] { &self.section_table }

    /// Returns the data following the last section.
    pub fn overlay(&self) -> &[u8] { &self.overlay }

    /// Translate an rva into a file offset of the source image.
    ///
    /// # Returns
    /// Returns an error if no section contains the rva.
    pub fn rva_to_file_offset(&self, rva: u32) -> Result<u32, ResourceError> {
        rva_to_file_offset(&self.section_table, rva)
    }
}

impl fmt::Display for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let machine = self.coff_header.machine;
        let image_base = self.optional_header.image_base;
        let size_of_image = self.optional_header.size_of_image;
        writeln!(
            f,
            "machine {:#06x}, image base {:#x}, size of image {:#x}",
            machine, image_base, size_of_image
        )?;
        for section in &self.section_table {
            let name = section.name().unwrap_or_else(|| String::from("?"));
            let virtual_address = section.virtual_address;
            let virtual_size = section.virtual_size;
            let pointer_to_raw_data = section.pointer_to_raw_data;
            let size_of_raw_data = section.size_of_raw_data;
            writeln!(
                f,
                "section {:<8} va {:#010x} vsize {:#010x} raw {:#010x} rsize {:#010x}",
                name, virtual_address, virtual_size, pointer_to_raw_data, size_of_raw_data
            )?;
        }
        match &self.resource_directory {
            Some(resource_directory) => write!(f, "{}", resource_directory),
            None => writeln!(f, "no resource directory"),
        }
    }
}
