#![allow(dead_code)]

use cil_image::dos::DOS_STUB;

pub const PE_OFFSET: usize = 0x80;
pub const COFF_OFFSET: usize = PE_OFFSET + 4;
pub const OPTIONAL_OFFSET: usize = COFF_OFFSET + 20;
pub const HEADERS_SIZE: u32 = 0x200;
pub const TEXT_RVA: u32 = 0x2000;
pub const CLI_HEADER_SIZE: usize = 0x48;

/// A small counting loop.
pub const SAMPLE_CODE: [u8; 30] = [
    0x02, 0x4a, 0x14, 0x28, 0x3a, 0x00, 0x00, 0x0a, 0x14, 0x28, 0x10, 0x00, 0x00, 0x0a, 0x00,
    0x00, 0x06, 0x17, 0x58, 0x0a, 0x06, 0x1f, 0x0a, 0xfe, 0x04, 0x0b, 0x07, 0x2d, 0xdb, 0x2a,
];

fn put_u16(buf: &mut [u8], at: usize, v: u16) {
    buf[at..at + 2].copy_from_slice(&v.to_le_bytes());
}

fn put_u32(buf: &mut [u8], at: usize, v: u32) {
    buf[at..at + 4].copy_from_slice(&v.to_le_bytes());
}

fn put_u64(buf: &mut [u8], at: usize, v: u64) {
    buf[at..at + 8].copy_from_slice(&v.to_le_bytes());
}

pub fn patch_u16(image: &mut [u8], at: usize, v: u16) {
    put_u16(image, at, v);
}

pub fn patch_u32(image: &mut [u8], at: usize, v: u32) {
    put_u32(image, at, v);
}

/// Tiny header followed by `code` (at most 63 bytes).
pub fn tiny_body(code: &[u8]) -> Vec<u8> {
    assert!(code.len() < 64);
    let mut body = vec![((code.len() as u8) << 2) | 0x2];
    body.extend_from_slice(code);
    body
}

/// Fat header with `INIT_LOCALS` followed by `code`.
pub fn fat_body(code: &[u8], max_stack: u16, local_var_sig_token: u32) -> Vec<u8> {
    let mut body = vec![0; 12];
    put_u16(&mut body, 0, 0x3000 | 0x10 | 0x3);
    put_u16(&mut body, 2, max_stack);
    put_u32(&mut body, 4, code.len() as u32);
    put_u32(&mut body, 8, local_var_sig_token);
    body.extend_from_slice(code);
    body
}

/// Builds a minimal single-section managed image in memory.
///
/// Layout: DOS header and stub, PE headers at 0x80, one `.text` section at
/// RVA 0x2000 / file offset 0x200 holding the CLI header followed by method
/// bodies.
pub struct ImageBuilder {
    machine: u16,
    pe32_plus: bool,
    cli_header: bool,
    cor_flags: u32,
    text: Vec<u8>,
}

impl Default for ImageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageBuilder {
    pub fn new() -> Self {
        Self {
            machine: 0x14c,
            pe32_plus: false,
            cli_header: true,
            cor_flags: 0x1,
            text: vec![0; CLI_HEADER_SIZE],
        }
    }

    pub fn machine(mut self, machine: u16) -> Self {
        self.machine = machine;
        self
    }

    pub fn pe32_plus(mut self) -> Self {
        self.pe32_plus = true;
        self
    }

    pub fn native(mut self) -> Self {
        self.cli_header = false;
        self
    }

    pub fn cor_flags(mut self, flags: u32) -> Self {
        self.cor_flags = flags;
        self
    }

    /// Appends a method body and returns its RVA. Bodies are 4-byte aligned.
    pub fn add_method(&mut self, body: &[u8]) -> u32 {
        while self.text.len() % 4 != 0 {
            self.text.push(0);
        }
        let rva = TEXT_RVA + self.text.len() as u32;
        self.text.extend_from_slice(body);
        rva
    }

    pub fn build(mut self) -> Vec<u8> {
        let optional_size: usize = if self.pe32_plus { 0xf0 } else { 0xe0 };
        let raw_size = self.text.len().next_multiple_of(0x200);
        let text_offset = HEADERS_SIZE as usize;
        let mut image = vec![0u8; text_offset + raw_size];

        // DOS header
        put_u16(&mut image, 0x00, 0x5a4d);
        put_u16(&mut image, 0x02, 0x0090);
        put_u16(&mut image, 0x04, 0x0003);
        put_u16(&mut image, 0x08, 0x0004);
        put_u16(&mut image, 0x0c, 0xffff);
        put_u16(&mut image, 0x10, 0x00b8);
        put_u16(&mut image, 0x18, 0x0040);
        put_u32(&mut image, 0x3c, PE_OFFSET as u32);
        image[0x40..0x80].copy_from_slice(&DOS_STUB);

        // PE signature and COFF header
        image[PE_OFFSET..PE_OFFSET + 4].copy_from_slice(b"PE\0\0");
        put_u16(&mut image, COFF_OFFSET, self.machine);
        put_u16(&mut image, COFF_OFFSET + 2, 1);
        put_u32(&mut image, COFF_OFFSET + 4, 0x5f00_0000);
        put_u16(&mut image, COFF_OFFSET + 16, optional_size as u16);
        put_u16(&mut image, COFF_OFFSET + 18, 0x0102);

        // Optional header
        let opt = OPTIONAL_OFFSET;
        let (magic, count_at) = if self.pe32_plus { (0x20b, 108) } else { (0x10b, 92) };
        put_u16(&mut image, opt, magic);
        put_u32(&mut image, opt + 16, 0);
        if self.pe32_plus {
            put_u64(&mut image, opt + 24, 0x1_4000_0000);
        } else {
            put_u32(&mut image, opt + 28, 0x40_0000);
        }
        put_u32(&mut image, opt + 32, 0x2000);
        put_u32(&mut image, opt + 36, 0x200);
        put_u32(&mut image, opt + 56, TEXT_RVA + raw_size.next_multiple_of(0x2000) as u32);
        put_u32(&mut image, opt + 60, HEADERS_SIZE);
        put_u16(&mut image, opt + 68, 3);
        put_u32(&mut image, opt + count_at, 16);
        if self.cli_header {
            let dir = opt + count_at + 4 + 14 * 8;
            put_u32(&mut image, dir, TEXT_RVA);
            put_u32(&mut image, dir + 4, CLI_HEADER_SIZE as u32);
        }

        // Section table
        let sec = opt + optional_size;
        image[sec..sec + 8].copy_from_slice(b".text\0\0\0");
        put_u32(&mut image, sec + 8, self.text.len() as u32);
        put_u32(&mut image, sec + 12, TEXT_RVA);
        put_u32(&mut image, sec + 16, raw_size as u32);
        put_u32(&mut image, sec + 20, text_offset as u32);
        put_u32(&mut image, sec + 36, 0x6000_0020);

        // CLI header
        if self.cli_header {
            put_u32(&mut self.text, 0, CLI_HEADER_SIZE as u32);
            put_u16(&mut self.text, 4, 2);
            put_u16(&mut self.text, 6, 5);
            put_u32(&mut self.text, 16, self.cor_flags);
            put_u32(&mut self.text, 20, 0x0600_0001);
        }
        image[text_offset..text_offset + self.text.len()].copy_from_slice(&self.text);
        image
    }
}
