//! **R**e**s**ou**rc**e string **edit**or for 32-bit portable executables.
//!
//! Supports:
//! * Parsing and introspection of 32-bit portable executables
//! * Decoding and rebuilding of the complete resource directory
//! * Reading, replacing and adding string table entries
//!
//! See [`Image`] for the main entry point for parsing, querying and updating a portable executable image.
//!
//! # Examples
//!
//! ### String replacement
//! ```no_run
//! use rsrcedit::{constants::LANGUAGE_ID_EN_US, Image};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // parse the executable image
//! let mut image = Image::parse_file("app.exe")?;
//!
//! // read string 19 with the codepage of its block
//! if let Some(string) = image.get_string(19, LANGUAGE_ID_EN_US) {
//!     println!("{} (codepage {})", string.string, string.codepage);
//! }
//!
//! // replace the string, creating its block if needed
//! image.set_string(19, LANGUAGE_ID_EN_US, "Hello")?;
//!
//! // build and write an executable image with all changes applied
//! image.write_file("app-patched.exe")?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Resource listing
//! ```no_run
//! use rsrcedit::Image;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let data = std::fs::read("app.exe")?;
//! let image = Image::parse(&data)?;
//!
//! // print headers, sections and the resource tree
//! println!("{}", image);
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![cfg_attr(docsrs, feature(doc_auto_cfg, doc_cfg_hide))]
#![cfg_attr(docsrs, doc(cfg_hide(doc)))]

extern crate alloc;

pub(crate) mod errors;
pub(crate) mod image;
pub(crate) mod resource;
pub(crate) mod strings;
pub(crate) mod util;

pub mod constants;
pub mod types;

pub use crate::{errors::*, image::*, resource::*, strings::*, util::rva_to_file_offset};
