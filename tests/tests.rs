use rsrcedit::{constants::*, types::*, *};
use std::sync::Once;
use zerocopy::IntoBytes;

const TEXT_VA: u32 = 0x1000;
const RSRC_VA: u32 = 0x2000;
const OPTIONAL_HEADER_OFFSET: usize = 0x98;
const TEXT_CODE: [u8; 7] = [0x55, 0x8b, 0xec, 0x33, 0xc0, 0x5d, 0xc3];

static INIT_LOGGER: Once = Once::new();
fn init_logger() {
    INIT_LOGGER.call_once(|| {
        env_logger::builder()
            .is_test(false)
            .filter_level(log::LevelFilter::Info)
            .format_timestamp(None)
            .format_module_path(false)
            .format_level(true)
            .format_target(false)
            .write_style(env_logger::WriteStyle::Auto)
            .init();
    });
}

fn aligned(value: usize, alignment: usize) -> usize { value.div_ceil(alignment) * alignment }

/// Resource directory with string 19 ("OK", codepage 1252), a version resource and a named resource type.
fn sample_directory() -> ResourceDirectory {
    let mut directory = ResourceDirectory::new();

    let mut block = StringBlock::default();
    block.set(3, ResourceString::from_text("OK").unwrap());
    let mut languages = ResourceTable::default();
    languages.insert(
        ResourceEntryName::ID(LANGUAGE_ID_EN_US as u32),
        ResourceEntry::Data(ResourceData::strings_with_codepage(
            block,
            CODE_PAGE_ID_WINDOWS_1252,
        )),
    );
    let mut blocks = ResourceTable::default();
    blocks.insert(ResourceEntryName::ID(2), ResourceEntry::Table(languages));
    directory
        .root_mut()
        .insert(ResourceEntryName::ID(RT_STRING as u32), ResourceEntry::Table(blocks));

    let mut languages = ResourceTable::default();
    languages.insert(
        ResourceEntryName::ID(LANGUAGE_ID_EN_US as u32),
        ResourceEntry::Data(ResourceData::raw(vec![1, 2, 3, 4, 5], CODE_PAGE_ID_UTF16LE)),
    );
    let mut names = ResourceTable::default();
    names.insert(ResourceEntryName::ID(1), ResourceEntry::Table(languages));
    directory
        .root_mut()
        .insert(ResourceEntryName::ID(RT_VERSION as u32), ResourceEntry::Table(names));

    let mut languages = ResourceTable::default();
    languages.insert(
        ResourceEntryName::ID(LANGUAGE_ID_NEUTRAL as u32),
        ResourceEntry::Data(ResourceData::raw(b"payload".to_vec(), 0)),
    );
    let mut names = ResourceTable::default();
    names.insert(ResourceEntryName::ID(1), ResourceEntry::Table(languages));
    directory.root_mut().insert(
        ResourceEntryName::from_string("CONFIG").unwrap(),
        ResourceEntry::Table(names),
    );

    directory
}

/// Build a minimal 32-bit image with a code section and, if given, a resource section at `RSRC_VA`.
fn build_image(resources: Option<Vec<u8>>) -> Vec<u8> {
    let number_of_sections = if resources.is_some() { 2 } else { 1 };

    let mut data = Vec::new();
    let dos_header = DosHeader {
        e_magic: PE_DOS_MAGIC,
        e_lfanew: 0x80,
        ..Default::default()
    };
    data.extend_from_slice(dos_header.as_bytes());
    data.resize(0x80, 0);
    data.extend_from_slice(&PE_NT_SIGNATURE);

    let coff_header = CoffHeader {
        machine: 0x14c,
        number_of_sections,
        size_of_optional_header: OPTIONAL_HEADER32_SIZE as u16,
        characteristics: 0x102,
        ..Default::default()
    };
    data.extend_from_slice(coff_header.as_bytes());
    assert_eq!(data.len(), OPTIONAL_HEADER_OFFSET);

    let mut optional_header = OptionalHeader32 {
        size_of_code: 0x200,
        address_of_entry_point: TEXT_VA,
        base_of_code: TEXT_VA,
        size_of_headers: 0x200,
        size_of_image: 0x2000,
        subsystem: 2,
        ..Default::default()
    };
    let mut section_table = vec![SectionHeader {
        name: *b".text\0\0\0",
        virtual_size: 0x10,
        virtual_address: TEXT_VA,
        size_of_raw_data: 0x200,
        pointer_to_raw_data: 0x200,
        characteristics: IMAGE_SCN_CNT_CODE | IMAGE_SCN_MEM_EXECUTE | IMAGE_SCN_MEM_READ,
        ..Default::default()
    }];
    if let Some(resources) = &resources {
        section_table.push(SectionHeader {
            name: *b".rsrc\0\0\0",
            virtual_size: resources.len() as u32,
            virtual_address: RSRC_VA,
            size_of_raw_data: aligned(resources.len(), 0x200) as u32,
            pointer_to_raw_data: 0x400,
            characteristics: IMAGE_SCN_CNT_INITIALIZED_DATA | IMAGE_SCN_MEM_READ,
            ..Default::default()
        });
        optional_header.data_directory[IMAGE_DIRECTORY_ENTRY_RESOURCE] = ImageDataDirectory {
            virtual_address: RSRC_VA,
            size:            resources.len() as u32,
        };
        optional_header.size_of_image = RSRC_VA + aligned(resources.len(), 0x1000) as u32;
    }
    data.extend_from_slice(optional_header.as_bytes());
    for section_header in &section_table {
        data.extend_from_slice(section_header.as_bytes());
    }

    data.resize(0x200, 0);
    data.extend_from_slice(&TEXT_CODE);
    data.resize(0x400, 0);
    if let Some(resources) = resources {
        data.extend_from_slice(&resources);
        data.resize(aligned(data.len(), 0x200), 0);
    }
    data
}

fn sample_image() -> Vec<u8> { build_image(Some(sample_directory().build(RSRC_VA).unwrap())) }

fn text(string: EncString<'_>) -> String { string.string.to_string_lossy() }

#[test]
fn parse_image() {
    init_logger();

    let data = sample_image();
    let image = Image::parse(&data[..]);
    assert!(image.is_ok(), "image successfully parsed");

    let image = image.unwrap();
    assert_eq!(image.section_table().len(), 2);
    assert_eq!(image.section_table()[0].name().unwrap(), ".text");
    assert_eq!(&image.section_data(0).unwrap()[..TEXT_CODE.len()], &TEXT_CODE);
    assert_eq!(image.resource_section_header().unwrap().name().unwrap(), ".rsrc");
    assert!(image.overlay().is_empty());

    let directory = image.resource_directory().unwrap();
    assert_eq!(directory.virtual_address(), RSRC_VA);
    assert_eq!(directory.root().len(), 3);
}

#[test]
fn parse_reader() {
    init_logger();

    let data = sample_image();
    let image = Image::parse_reader(&mut std::io::Cursor::new(&data)).unwrap();
    assert_eq!(image, Image::parse(&data).unwrap());
}

#[test]
fn get_string() {
    init_logger();

    let data = sample_image();
    let image = Image::parse(&data).unwrap();

    let string = image.get_string(19, LANGUAGE_ID_EN_US as u32).unwrap();
    assert_eq!(text(string), "OK");
    assert_eq!(string.codepage, CODE_PAGE_ID_WINDOWS_1252);

    for id in (16..32).filter(|&id| id != 19) {
        assert!(image.get_string(id, LANGUAGE_ID_EN_US as u32).is_none(), "string {} empty", id);
    }
    assert!(image.get_string(3, LANGUAGE_ID_EN_US as u32).is_none());
    assert!(image.get_string(1000, LANGUAGE_ID_EN_US as u32).is_none());
}

#[test]
fn get_string_without_resources() {
    init_logger();

    let data = build_image(None);
    let image = Image::parse(&data).unwrap();
    assert!(image.resource_directory().is_none());
    assert!(image.get_string(19, LANGUAGE_ID_EN_US as u32).is_none());
}

#[test]
fn rebuild_unmodified_image() {
    init_logger();

    let data = sample_image();
    let image = Image::parse(&data).unwrap();
    let rebuilt = image.build().unwrap();
    assert_eq!(rebuilt.len(), data.len());
    assert!(rebuilt == data, "unmodified image rebuilt identically");
    assert_eq!(Image::parse(&rebuilt).unwrap(), image);
}

#[test]
fn set_string_in_existing_block() {
    init_logger();

    let data = sample_image();
    let mut image = Image::parse(&data).unwrap();

    let replaced = image.set_string(20, LANGUAGE_ID_EN_US as u32, "Hello").unwrap();
    assert!(replaced.is_none());
    assert_eq!(text(image.get_string(20, LANGUAGE_ID_EN_US as u32).unwrap()), "Hello");

    let replaced = image.set_string(19, LANGUAGE_ID_EN_US as u32, "Cancel").unwrap();
    assert_eq!(replaced.unwrap().to_string_lossy(), "OK");

    let rebuilt = image.build().unwrap();
    let image = Image::parse(&rebuilt).unwrap();
    let string = image.get_string(19, LANGUAGE_ID_EN_US as u32).unwrap();
    assert_eq!(text(string), "Cancel");
    assert_eq!(string.codepage, CODE_PAGE_ID_WINDOWS_1252);
    assert_eq!(text(image.get_string(20, LANGUAGE_ID_EN_US as u32).unwrap()), "Hello");
    for id in (16..32).filter(|&id| id != 19 && id != 20) {
        assert!(image.get_string(id, LANGUAGE_ID_EN_US as u32).is_none(), "string {} empty", id);
    }

    let directory = image.resource_directory().unwrap();
    let version = directory
        .get_data(ResourceEntryName::ID(RT_VERSION as u32), ResourceEntryName::ID(1), 0)
        .unwrap();
    assert_eq!(version.data().unwrap(), &[1, 2, 3, 4, 5]);
    assert_eq!(version.codepage(), CODE_PAGE_ID_UTF16LE);
    let config = directory
        .get_data(
            ResourceEntryName::from_string("CONFIG").unwrap(),
            ResourceEntryName::ID(1),
            0,
        )
        .unwrap();
    assert_eq!(config.data().unwrap(), b"payload");
}

#[test]
fn set_string_in_new_block() {
    init_logger();

    let data = sample_image();
    let mut image = Image::parse(&data).unwrap();

    image.set_string(100, LANGUAGE_ID_EN_US as u32, "New block").unwrap();

    let rebuilt = image.build().unwrap();
    let image = Image::parse(&rebuilt).unwrap();
    let string = image.get_string(100, LANGUAGE_ID_EN_US as u32).unwrap();
    assert_eq!(text(string), "New block");
    assert_eq!(string.codepage, DEFAULT_CODEPAGE);
    assert_eq!(text(image.get_string(19, LANGUAGE_ID_EN_US as u32).unwrap()), "OK");

    let blocks = image
        .resource_directory()
        .unwrap()
        .root()
        .get(ResourceEntryName::ID(RT_STRING as u32))
        .unwrap()
        .as_table()
        .unwrap();
    assert_eq!(blocks.entries(), vec![ResourceEntryName::ID(2), ResourceEntryName::ID(7)]);
    let languages = blocks.get(ResourceEntryName::ID(7)).unwrap().as_table().unwrap();
    assert_eq!(languages.entries(), vec![ResourceEntryName::ID(LANGUAGE_ID_EN_US as u32)]);
}

#[test]
fn set_string_adds_resource_section() {
    init_logger();

    let data = build_image(None);
    let mut image = Image::parse(&data).unwrap();

    image.set_string(1, LANGUAGE_ID_EN_US as u32, "Created").unwrap();
    let rebuilt = image.build().unwrap();

    let image = Image::parse(&rebuilt).unwrap();
    assert_eq!(image.section_table().len(), 2);
    assert_eq!(image.section_table()[1].name().unwrap(), ".rsrc");
    assert_eq!(&image.section_data(0).unwrap()[..TEXT_CODE.len()], &TEXT_CODE);

    let string = image.get_string(1, LANGUAGE_ID_EN_US as u32).unwrap();
    assert_eq!(text(string), "Created");
    assert_eq!(string.codepage, DEFAULT_CODEPAGE);

    let size_of_image = image.optional_header().size_of_image;
    assert_eq!(size_of_image, 0x3000);
}

#[test]
fn remove_string() {
    init_logger();

    let data = sample_image();
    let mut image = Image::parse(&data).unwrap();

    let removed = image.remove_string(19, LANGUAGE_ID_EN_US as u32).unwrap();
    assert_eq!(removed.to_string_lossy(), "OK");
    assert!(image.get_string(19, LANGUAGE_ID_EN_US as u32).is_none());
    assert!(image.remove_string(19, LANGUAGE_ID_EN_US as u32).is_none());

    let rebuilt = image.build().unwrap();
    let image = Image::parse(&rebuilt).unwrap();
    assert!(image.get_string(19, LANGUAGE_ID_EN_US as u32).is_none());
    assert!(image.resource_directory().unwrap().strings().is_empty());
}

#[test]
fn list_strings() {
    init_logger();

    let mut directory = sample_directory();
    directory.set_string(5, LANGUAGE_ID_EN_US as u32, "five").unwrap();
    directory.set_string(40, LANGUAGE_ID_EN_US as u32, "forty").unwrap();

    let strings = directory
        .strings()
        .into_iter()
        .map(|(id, string)| (id, string.string.to_string_lossy()))
        .collect::<Vec<_>>();
    assert_eq!(strings, vec![
        (5, "five".to_string()),
        (19, "OK".to_string()),
        (40, "forty".to_string())
    ]);
}

#[test]
fn write_and_read_file() {
    init_logger();

    let data = sample_image();
    let mut image = Image::parse(&data).unwrap();
    image.set_string(21, LANGUAGE_ID_EN_US as u32, "Written").unwrap();

    let path = std::env::temp_dir().join(format!("rsrcedit-test-{}.exe", std::process::id()));
    image.write_file(&path).unwrap();
    let read = Image::parse_file(&path);
    std::fs::remove_file(&path).unwrap();

    let read = read.unwrap();
    assert_eq!(text(read.get_string(21, LANGUAGE_ID_EN_US as u32).unwrap()), "Written");
    assert_eq!(text(read.get_string(19, LANGUAGE_ID_EN_US as u32).unwrap()), "OK");

    let mut target = Vec::new();
    image.write_writer(&mut target).unwrap();
    assert!(target == image.build().unwrap());
}

#[test]
fn preserve_overlay() {
    init_logger();

    let mut data = sample_image();
    data.extend_from_slice(b"OVERLAY DATA");
    let mut image = Image::parse(&data).unwrap();
    assert_eq!(image.overlay(), b"OVERLAY DATA");

    image.set_string(22, LANGUAGE_ID_EN_US as u32, "A longer string to grow the section").unwrap();
    let rebuilt = image.build().unwrap();
    assert!(rebuilt.ends_with(b"OVERLAY DATA"));
    assert_eq!(Image::parse(&rebuilt).unwrap().overlay(), b"OVERLAY DATA");
}

#[test]
fn build_resource_directory() {
    init_logger();

    let directory = sample_directory();
    let data = directory.build(RSRC_VA).unwrap();
    assert_eq!(
        data.len(),
        directory.size() as usize,
        "built resource size equals computed size"
    );
    assert_eq!(data.len() % 4, 0);

    let parsed = ResourceDirectory::parse(&data, RSRC_VA).unwrap();
    assert_eq!(parsed.size(), directory.size());
    assert_eq!(parsed.build(RSRC_VA).unwrap(), data);

    // data addresses follow the virtual address
    let moved = ResourceDirectory::parse(&directory.build(0x5000).unwrap(), 0x5000).unwrap();
    assert_eq!(moved.build(RSRC_VA).unwrap(), data);
}

#[test]
fn build_sorted_entries() {
    init_logger();

    let mut directory = ResourceDirectory::new();
    let leaf = || ResourceEntry::Data(ResourceData::raw(vec![0xff], 0));
    directory.root_mut().insert(ResourceEntryName::from_string("b").unwrap(), leaf());
    directory.root_mut().insert(ResourceEntryName::ID(10), leaf());
    directory.root_mut().insert(ResourceEntryName::from_string("A").unwrap(), leaf());
    directory.root_mut().insert(ResourceEntryName::ID(3), leaf());
    directory.root_mut().insert(ResourceEntryName::from_string("a").unwrap(), leaf());

    let data = directory.build(RSRC_VA).unwrap();
    assert_eq!(data.len(), directory.size() as usize);
    assert_eq!(u16::from_le_bytes([data[12], data[13]]), 3, "name entries");
    assert_eq!(u16::from_le_bytes([data[14], data[15]]), 2, "id entries");

    let parsed = ResourceDirectory::parse(&data, RSRC_VA).unwrap();
    let names = parsed
        .root()
        .entries()
        .iter()
        .map(|name| match name {
            ResourceEntryName::ID(id) => id.to_string(),
            ResourceEntryName::Name(_) => name.to_string().unwrap(),
        })
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["A", "a", "b", "3", "10"]);
}

#[test]
fn modify_resource_table() {
    init_logger();

    let mut directory = sample_directory();
    let root = directory.root_mut();
    assert_eq!(root.name_entries().len(), 1);
    assert_eq!(root.id_entries().len(), 2);

    let removed = root.remove(ResourceEntryName::ID(RT_VERSION as u32));
    assert!(removed.unwrap().as_table().is_some());
    assert!(root.get(ResourceEntryName::ID(RT_VERSION as u32)).is_none());
    assert_eq!(root.header().number_of_id_entries, 1);

    let data = directory.build(RSRC_VA).unwrap();
    let parsed = ResourceDirectory::parse(&data, RSRC_VA).unwrap();
    assert_eq!(parsed.root().len(), 2);
    assert_eq!(text(parsed.get_string(19, 0).unwrap()), "OK");
}

#[test]
fn string_block_bijection() {
    init_logger();

    let empty = vec![0u8; 32];
    let block = StringBlock::parse(&empty).unwrap();
    assert!(block.is_empty());
    assert_eq!(block.size(), 32);
    assert_eq!(block.build(), empty);

    let mut full = Vec::new();
    for slot in 0..16u16 {
        let string = format!("string {}", slot);
        full.extend_from_slice(&(string.len() as u16).to_le_bytes());
        for c in string.encode_utf16() {
            full.extend_from_slice(&c.to_le_bytes());
        }
    }
    let block = StringBlock::parse(&full).unwrap();
    assert_eq!(block.iter().count(), 16);
    assert_eq!(block.get(11).unwrap().to_string_lossy(), "string 11");
    assert_eq!(block.size() as usize, full.len());
    assert_eq!(block.build(), full);
}

#[test]
fn string_block_truncated() {
    init_logger();

    let mut data = vec![0u8; 30];
    data.extend_from_slice(&[5, 0, b'a', 0]);
    let error = StringBlock::parse(&data).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::CorruptFile);

    let error = StringBlock::parse(&[0, 0, 0, 0]).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::CorruptFile);
}

#[test]
fn string_too_long() {
    init_logger();

    let mut directory = ResourceDirectory::new();
    let text = "x".repeat(u16::MAX as usize + 1);
    let error = directory.set_string(1, 0, &text).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Unsupported);
    assert!(directory.get_string(1, 0).is_none());
}

#[test]
fn read_invalid_signature() {
    init_logger();

    let mut data = sample_image();
    data[0] = b'X';
    let error = Image::parse(&data).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::InvalidSignature);

    let mut data = sample_image();
    data[0x81] = b'X';
    let error = Image::parse(&data).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::InvalidSignature);
}

#[test]
fn read_truncated_optional_header() {
    init_logger();

    let data = sample_image();
    let error = Image::parse(&data[..OPTIONAL_HEADER_OFFSET + 100]).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::CorruptFile);

    let error = Image::parse(&data[..0x40]).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::CorruptFile);
}

#[test]
fn read_64_bit_image() {
    init_logger();

    let mut data = sample_image();
    data[OPTIONAL_HEADER_OFFSET..OPTIONAL_HEADER_OFFSET + 2]
        .copy_from_slice(&PE_64_MAGIC.to_le_bytes());
    let error = Image::parse(&data).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Unsupported);
}

#[test]
fn read_resource_outside_sections() {
    init_logger();

    // data addresses built for a different virtual address point outside all sections
    let data = build_image(Some(sample_directory().build(0x9000).unwrap()));
    let error = Image::parse(&data).unwrap_err();
    assert!(matches!(
        error,
        ImageReadError::InvalidResource(ResourceError::UnmappedAddress(_))
    ));
    assert_eq!(error.kind(), ErrorKind::CorruptFile);
}

/// Root table with a single id entry pointing to the given offset.
fn single_entry_directory(target: u32) -> Vec<u8> {
    let mut data = Vec::new();
    let table = ResourceDirectoryTable {
        number_of_id_entries: 1,
        ..Default::default()
    };
    data.extend_from_slice(table.as_bytes());
    let entry = ResourceDirectoryEntry {
        name_offset_or_integer_id:         RT_RCDATA as u32,
        data_entry_or_subdirectory_offset: target,
    };
    data.extend_from_slice(entry.as_bytes());
    data
}

#[test]
fn read_reserved_not_zero() {
    init_logger();

    let mut data = single_entry_directory(24);
    let data_entry = ResourceDataEntry {
        data_rva: RSRC_VA + 40,
        size:     4,
        codepage: 0,
        reserved: 1,
    };
    data.extend_from_slice(data_entry.as_bytes());
    data.extend_from_slice(&[1, 2, 3, 4]);

    let error = ResourceDirectory::parse(&data, RSRC_VA).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::CorruptFile);

    let error = Image::parse(&build_image(Some(data))).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::CorruptFile);
}

#[test]
fn read_cyclic_table() {
    init_logger();

    let data = single_entry_directory(RESOURCE_SUBDIRECTORY_FLAG);
    let error = ResourceDirectory::parse(&data, RSRC_VA).unwrap_err();
    assert!(matches!(error, ResourceError::CyclicTable(0)));
    assert_eq!(error.kind(), ErrorKind::CorruptFile);

    let error = Image::parse(&build_image(Some(data))).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::CorruptFile);
}

#[test]
fn read_deep_table() {
    init_logger();

    let mut data = Vec::new();
    for level in 0..40u32 {
        data.extend_from_slice(&single_entry_directory((level + 1) * 24 | RESOURCE_SUBDIRECTORY_FLAG));
    }
    data.extend_from_slice(ResourceDirectoryTable::default().as_bytes());

    let error = ResourceDirectory::parse(&data, RSRC_VA).unwrap_err();
    assert!(matches!(error, ResourceError::TooDeep(MAX_RESOURCE_DEPTH)));
    assert_eq!(error.kind(), ErrorKind::CorruptFile);
}

#[test]
fn write_shared_resource_section() {
    init_logger();

    let mut data = sample_image();
    // import table inside the resource section
    let import_table = OPTIONAL_HEADER_OFFSET + 96 + 8;
    data[import_table..import_table + 4].copy_from_slice(&(RSRC_VA + 0x100).to_le_bytes());
    data[import_table + 4..import_table + 8].copy_from_slice(&8u32.to_le_bytes());

    let image = Image::parse(&data).unwrap();
    let error = image.build().unwrap_err();
    assert!(matches!(error, ImageWriteError::SharedSection(1)));
    assert_eq!(error.kind(), ErrorKind::Unsupported);
}

#[test]
fn error_messages() {
    let kinds = [
        ErrorKind::BadAlloc,
        ErrorKind::Read,
        ErrorKind::Write,
        ErrorKind::CorruptFile,
        ErrorKind::InvalidSignature,
        ErrorKind::Unsupported,
    ];
    for (index, kind) in kinds.iter().enumerate() {
        assert!(!error_message(*kind).is_empty());
        assert_eq!(kind.to_string(), error_message(*kind));
        for other in &kinds[index + 1..] {
            assert_ne!(error_message(*kind), error_message(*other));
        }
    }

    let error = Image::parse_file("./does/not/exist.exe").unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Read);
}

#[test]
fn display_image() {
    init_logger();

    let data = sample_image();
    let image = Image::parse(&data).unwrap();
    let listing = image.to_string();
    println!("{}", listing);

    assert!(listing.contains(".text"));
    assert!(listing.contains("STRING (6)"));
    assert!(listing.contains("VERSION (16)"));
    assert!(listing.contains("\"CONFIG\""));
    assert!(listing.contains("[3] \"OK\""));
}

#[test]
fn read_resource_past_raw_data() {
    init_logger();

    let mut directory = single_entry_directory(24);
    let data_entry = ResourceDataEntry {
        data_rva: RSRC_VA + 0x200,
        size:     8,
        codepage: 0,
        reserved: 0,
    };
    directory.extend_from_slice(data_entry.as_bytes());

    let mut data = build_image(Some(directory));
    // virtual range of the resource section extends past its 0x200 bytes of raw data
    let resource_section = OPTIONAL_HEADER_OFFSET + OPTIONAL_HEADER32_SIZE + 40;
    data[resource_section + 8..resource_section + 12].copy_from_slice(&0x400u32.to_le_bytes());
    data.extend_from_slice(b"OVERLAY!");

    let error = Image::parse(&data).unwrap_err();
    assert!(matches!(
        error,
        ImageReadError::InvalidResource(ResourceError::UnmappedAddress(0x2200))
    ));
    assert_eq!(error.kind(), ErrorKind::CorruptFile);
}

#[test]
fn rebuild_image_without_section_data() {
    init_logger();

    let mut data = build_image(None);
    let text_section = OPTIONAL_HEADER_OFFSET + OPTIONAL_HEADER32_SIZE;
    data[text_section + 16..text_section + 20].copy_from_slice(&0u32.to_le_bytes());

    let image = Image::parse(&data).unwrap();
    assert!(image.section_data(0).unwrap().is_empty());
    assert_eq!(image.overlay().len(), data.len() - (text_section + 40));

    let rebuilt = image.build().unwrap();
    assert_eq!(rebuilt.len(), data.len());
    assert!(rebuilt == data, "image without section data rebuilt identically");
}

fn set_symbol_table(data: &mut [u8], pointer: u32) {
    let offset = OPTIONAL_HEADER_OFFSET - COFF_HEADER_SIZE + 8;
    data[offset..offset + 4].copy_from_slice(&pointer.to_le_bytes());
}

#[test]
fn move_symbol_table_with_overlay() {
    init_logger();

    let mut data = sample_image();
    let symbol_table = data.len() as u32;
    set_symbol_table(&mut data, symbol_table);
    data.extend_from_slice(b"SYMBOLS\0");

    let image = Image::parse(&data).unwrap();
    assert!(image.build().unwrap() == data, "unmoved symbol table kept");

    let mut image = image;
    image.set_string(23, LANGUAGE_ID_EN_US as u32, &"x".repeat(400)).unwrap();
    let rebuilt = image.build().unwrap();
    let image = Image::parse(&rebuilt).unwrap();

    let pointer_to_symbol_table = image.coff_header().pointer_to_symbol_table;
    assert_eq!(pointer_to_symbol_table, 0xa00);
    assert_eq!(pointer_to_symbol_table as usize, rebuilt.len() - 8);
    assert_eq!(&rebuilt[pointer_to_symbol_table as usize..], b"SYMBOLS\0");
    assert_eq!(text(image.get_string(23, LANGUAGE_ID_EN_US as u32).unwrap()).len(), 400);
}

#[test]
fn write_symbol_table_in_sections() {
    init_logger();

    let mut data = sample_image();
    set_symbol_table(&mut data, 0x210);

    let mut image = Image::parse(&data).unwrap();
    image.set_string(23, LANGUAGE_ID_EN_US as u32, &"x".repeat(400)).unwrap();
    let error = image.build().unwrap_err();
    assert!(matches!(error, ImageWriteError::SymbolTableInSections(0x210)));
    assert_eq!(error.kind(), ErrorKind::Unsupported);
}

#[test]
fn parse_unsorted_entries() {
    init_logger();

    let mut data = Vec::new();
    let table = ResourceDirectoryTable {
        number_of_id_entries: 2,
        ..Default::default()
    };
    data.extend_from_slice(table.as_bytes());
    for (id, target) in [(10u32, 32u32), (3, 48)] {
        let entry = ResourceDirectoryEntry {
            name_offset_or_integer_id:         id,
            data_entry_or_subdirectory_offset: target,
        };
        data.extend_from_slice(entry.as_bytes());
    }
    for data_offset in [64u32, 68] {
        let data_entry = ResourceDataEntry {
            data_rva: RSRC_VA + data_offset,
            size: 4,
            ..Default::default()
        };
        data.extend_from_slice(data_entry.as_bytes());
    }
    data.extend_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);

    let directory = ResourceDirectory::parse(&data, RSRC_VA).unwrap();
    assert_eq!(directory.root().entries(), vec![
        ResourceEntryName::ID(10),
        ResourceEntryName::ID(3)
    ]);
    let rcdata = directory.root().get(ResourceEntryName::ID(10)).unwrap().as_data().unwrap();
    assert_eq!(rcdata.data().unwrap(), &[1, 2, 3, 4]);

    let built = directory.build(RSRC_VA).unwrap();
    assert_eq!(u32::from_le_bytes(built[16..20].try_into().unwrap()), 3);
    assert_eq!(u32::from_le_bytes(built[24..28].try_into().unwrap()), 10);

    let parsed = ResourceDirectory::parse(&built, RSRC_VA).unwrap();
    assert_eq!(parsed.root().entries(), vec![
        ResourceEntryName::ID(3),
        ResourceEntryName::ID(10)
    ]);
    let icon = parsed.root().get(ResourceEntryName::ID(3)).unwrap().as_data().unwrap();
    assert_eq!(icon.data().unwrap(), &[5, 6, 7, 8]);
}

#[test]
fn string_block_trailing_bytes() {
    init_logger();

    let mut data = vec![0u8; 30];
    data.extend_from_slice(&[2, 0, b'h', 0, b'i', 0]);
    data.extend_from_slice(&[0, 0]);

    let mut block = StringBlock::parse(&data).unwrap();
    assert_eq!(block.trailing(), &[0, 0]);
    assert_eq!(block.size() as usize, data.len());
    assert_eq!(block.build(), data);

    block.set(0, ResourceString::from_text("a").unwrap());
    let built = block.build();
    assert_eq!(built.len(), data.len() + 2);
    assert!(built.ends_with(&[b'h', 0, b'i', 0, 0, 0]));
}

#[test]
fn entry_counts_saturate() {
    init_logger();

    let mut table = ResourceTable::default();
    for id in 0..=u16::MAX as u32 {
        table.insert(ResourceEntryName::ID(id), ResourceEntry::Data(ResourceData::raw(Vec::new(), 0)));
    }
    assert_eq!(table.len(), u16::MAX as usize + 1);
    assert_eq!(table.header().number_of_id_entries, u16::MAX);

    let mut directory = ResourceDirectory::new();
    directory.root_mut().insert(ResourceEntryName::ID(RT_RCDATA as u32), ResourceEntry::Table(table));
    let error = directory.build(RSRC_VA).unwrap_err();
    assert!(matches!(error, ResourceError::InvalidTable(_)));
}
