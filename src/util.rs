use alloc::{format, string::ToString};
use core::{
    any::type_name,
    ops::{Add, Rem, Sub},
};

use zerocopy::FromBytes;

use crate::{errors::*, types::SectionHeader};

pub fn read<T: FromBytes>(resource: &[u8]) -> Result<T, ReadError> {
    T::read_from_prefix(resource)
        .map_err(|_| ReadError(type_name::<T>().to_string()))
        .map(|(value, _)| value)
}

pub fn read_at<T: FromBytes>(resource: &[u8], offset: usize) -> Result<T, ReadError> {
    match resource.get(offset..) {
        Some(data) => read(data),
        None => Err(ReadError(format!(
            "{} at {:#x} outside of {:#x} bytes",
            type_name::<T>(),
            offset,
            resource.len()
        ))),
    }
}

pub fn slice_at(resource: &[u8], offset: usize, size: usize) -> Result<&[u8], ReadError> {
    offset
        .checked_add(size)
        .and_then(|end| resource.get(offset..end))
        .ok_or_else(|| {
            ReadError(format!("{:#x} bytes at {:#x} outside of {:#x} bytes", size, offset, resource.len()))
        })
}

pub fn aligned_to<T: Add<Output = T> + Sub<Output = T> + Rem<Output = T> + Eq + Copy + Default>(
    value: T, alignment: T,
) -> T {
    if alignment == T::default() || value % alignment == T::default() {
        return value;
    }
    value + alignment - (value % alignment)
}

/// Translate an rva into a file offset using the first section whose virtual range contains it.
pub fn rva_to_file_offset(section_table: &[SectionHeader], rva: u32) -> Result<u32, ResourceError> {
    section_table
        .iter()
        .find(|section| section.contains_rva(rva))
        .and_then(|section| {
            let virtual_address = section.virtual_address;
            let pointer_to_raw_data = section.pointer_to_raw_data;
            pointer_to_raw_data.checked_add(rva - virtual_address)
        })
        .ok_or(ResourceError::UnmappedAddress(rva))
}
