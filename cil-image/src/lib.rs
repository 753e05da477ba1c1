//! Reader for the PE container that carries CIL method bodies.
//!
//! Parses the MS-DOS header, PE and optional headers, section table and CLI
//! header, then hands method code to [`cil_isa::Decoder`]:
//!
//! ```no_run
//! use cil_image::{Image, ImageOptions};
//!
//! let image = Image::open("app.exe", &ImageOptions::default())?;
//! let body = image.method_body(0x2050)?;
//! for insn in body.decoder() {
//!     println!("{}", insn?);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cli_header;
pub mod dos;
pub mod error;
pub mod method;
pub mod optional;
pub mod pe;
mod read;
pub mod section;

use std::fs::File;
use std::path::Path;

use log::debug;
use memmap2::Mmap;

pub use cli_header::{CliHeader, CorFlags};
pub use dos::DosHeader;
pub use error::{Error, Result};
pub use method::{BodyFormat, MethodBody, MethodFlags};
pub use optional::{DataDirectory, OptionalHeader, OptionalMagic};
pub use pe::{Characteristics, FileHeader, Machine};
pub use section::SectionHeader;

/// How much of the container layout is validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageOptions {
    /// Require the exact header values and DOS stub a standard linker
    /// writes, and an I386 machine. When off, only signatures and sizes are
    /// checked and deviations are logged.
    pub strict: bool,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self { strict: true }
    }
}

enum Data {
    Owned(Vec<u8>),
    Mapped(Mmap),
}

impl Data {
    fn as_slice(&self) -> &[u8] {
        match self {
            Data::Owned(v) => v.as_slice(),
            Data::Mapped(m) => &m[..],
        }
    }
}

/// A parsed image. Headers are decoded eagerly, method bodies on request.
pub struct Image {
    data: Data,
    dos_header: DosHeader,
    file_header: FileHeader,
    optional_header: OptionalHeader,
    sections: Vec<SectionHeader>,
    cli_header: Option<CliHeader>,
}

impl Image {
    /// Parse an image held in memory.
    pub fn parse(data: Vec<u8>, options: &ImageOptions) -> Result<Self> {
        Self::from_data(Data::Owned(data), options)
    }

    /// Map the file at `path` read-only and parse it.
    pub fn open(path: impl AsRef<Path>, options: &ImageOptions) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        // SAFETY: the mapping is read-only and lives as long as `Image`.
        // Concurrent modification of the file by another process is outside
        // what this reader can guard against.
        let map = unsafe { Mmap::map(&file)? };
        Self::from_data(Data::Mapped(map), options)
    }

    fn from_data(data: Data, options: &ImageOptions) -> Result<Self> {
        let bytes = data.as_slice();
        let dos_header = DosHeader::parse(bytes, options.strict)?;
        let pe_offset = dos_header.e_lfanew as usize;
        let file_header = FileHeader::parse(bytes, pe_offset, options.strict)?;
        let optional_offset = pe_offset + 4 + FileHeader::SIZE;
        let optional_header =
            OptionalHeader::parse(bytes, optional_offset, file_header.size_of_optional_header)?;
        let sections = SectionHeader::parse_table(
            bytes,
            optional_offset + usize::from(file_header.size_of_optional_header),
            file_header.number_of_sections,
        )?;

        let cli_header = match optional_header.data_directory(optional::CLI_HEADER_DIRECTORY) {
            Some(dir) if !dir.is_empty() => {
                let offset = section::resolve_rva(
                    &sections,
                    optional_header.size_of_headers,
                    dir.virtual_address,
                )
                .ok_or(Error::UnmappedRva(dir.virtual_address))?;
                Some(CliHeader::parse(bytes, offset, options.strict)?)
            }
            _ => {
                debug!("No CLI header directory");
                None
            }
        };

        Ok(Self {
            data,
            dos_header,
            file_header,
            optional_header,
            sections,
            cli_header,
        })
    }

    /// Get the raw file data.
    pub fn data(&self) -> &[u8] {
        self.data.as_slice()
    }

    pub fn dos_header(&self) -> &DosHeader {
        &self.dos_header
    }

    pub fn file_header(&self) -> &FileHeader {
        &self.file_header
    }

    pub fn optional_header(&self) -> &OptionalHeader {
        &self.optional_header
    }

    pub fn sections(&self) -> &[SectionHeader] {
        &self.sections
    }

    /// The CLI header, or [`Error::MissingCliHeader`] for native images.
    pub fn cli_header(&self) -> Result<&CliHeader> {
        self.cli_header.as_ref().ok_or(Error::MissingCliHeader)
    }

    pub fn is_managed(&self) -> bool {
        self.cli_header.is_some()
    }

    /// The section whose file-backed range contains `rva`.
    pub fn section_for_rva(&self, rva: u32) -> Option<&SectionHeader> {
        self.sections.iter().find(|s| s.contains_rva(rva))
    }

    /// Translate an RVA to a file offset.
    pub fn rva_to_offset(&self, rva: u32) -> Result<usize> {
        section::resolve_rva(&self.sections, self.optional_header.size_of_headers, rva)
            .ok_or(Error::UnmappedRva(rva))
    }

    /// `len` bytes of file data starting at `rva`.
    pub fn slice_at_rva(&self, rva: u32, len: usize) -> Result<&[u8]> {
        let offset = self.rva_to_offset(rva)?;
        read::bytes(self.data(), offset, len)
    }

    /// Locate and parse the method body at `rva`.
    pub fn method_body(&self, rva: u32) -> Result<MethodBody<'_>> {
        if self.cli_header.is_none() {
            return Err(Error::MissingCliHeader);
        }
        let offset = self.rva_to_offset(rva)?;
        MethodBody::parse(self.data(), offset, rva)
    }
}

impl std::fmt::Debug for Image {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Image")
            .field("size", &self.data().len())
            .field("machine", &self.file_header.machine())
            .field("sections", &self.sections.len())
            .field("managed", &self.is_managed())
            .finish()
    }
}
