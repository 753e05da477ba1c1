use std::fmt::Display;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use cil_image::{Image, ImageOptions, MethodBody};
use cil_isa::{DEFAULT_MAX_SWITCH_TARGETS, Decoder, DecoderOptions, Instruction};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[cfg(target_env = "msvc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "cil", about = "CIL bytecode decoder for managed PE images")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show PE and CLI header information
    Info {
        /// Path to the .exe or .dll
        input: PathBuf,
        /// Accept non-standard header values instead of rejecting them
        #[arg(long)]
        lenient: bool,
    },
    /// Disassemble the method body at an RVA
    Disasm {
        /// Path to the .exe or .dll
        input: PathBuf,
        /// RVA of the method header (decimal or 0x hex)
        #[arg(long, value_parser = parse_number::<u32>)]
        rva: u32,
        /// Accept non-standard header values instead of rejecting them
        #[arg(long)]
        lenient: bool,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
        /// Largest switch table accepted
        #[arg(long, value_parser = parse_number::<u32>, default_value_t = DEFAULT_MAX_SWITCH_TARGETS)]
        max_switch_targets: u32,
    },
    /// Decode raw IL bytes from any file
    Decode {
        /// File holding the IL stream
        input: PathBuf,
        /// Byte offset to start at (decimal or 0x hex)
        #[arg(long, value_parser = parse_number::<u64>, default_value_t = 0)]
        offset: u64,
        /// Number of bytes to decode (default: to end of file)
        #[arg(long, value_parser = parse_number::<u64>)]
        length: Option<u64>,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
        /// Largest switch table accepted
        #[arg(long, value_parser = parse_number::<u32>, default_value_t = DEFAULT_MAX_SWITCH_TARGETS)]
        max_switch_targets: u32,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// One listing line per instruction
    Text,
    /// Structured YAML document
    Yaml,
}

#[derive(Serialize)]
struct MethodListing<'a> {
    rva: u32,
    header: &'static str,
    max_stack: u16,
    local_var_sig_token: u32,
    code_size: usize,
    instructions: &'a [Instruction],
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Info { input, lenient } => cmd_info(&input, image_options(lenient)),
        Commands::Disasm {
            input,
            rva,
            lenient,
            format,
            max_switch_targets,
        } => cmd_disasm(
            &input,
            rva,
            image_options(lenient),
            format,
            DecoderOptions { max_switch_targets },
        ),
        Commands::Decode {
            input,
            offset,
            length,
            format,
            max_switch_targets,
        } => cmd_decode(
            &input,
            offset,
            length,
            format,
            DecoderOptions { max_switch_targets },
        ),
    }
}

fn image_options(lenient: bool) -> ImageOptions {
    ImageOptions { strict: !lenient }
}

/// Accepts `1234` or `0x4d2`.
fn parse_number<T: TryFrom<u64>>(s: &str) -> Result<T, String> {
    let s = s.trim();
    let value = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse(),
    }
    .map_err(|e| format!("invalid number '{s}': {e}"))?;
    T::try_from(value).map_err(|_| format!("{s} is out of range"))
}

fn or_exit<T, E: Display>(result: Result<T, E>) -> T {
    match result {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_info(path: &Path, options: ImageOptions) {
    let image = or_exit(Image::open(path, &options));

    let coff = image.file_header();
    let opt = image.optional_header();
    println!("=== CIL Image Info ===");
    println!("File size:        {} bytes", image.data().len());
    match coff.machine() {
        Some(machine) => println!("Machine:          {machine:?} ({:#06x})", coff.machine_raw),
        None => println!("Machine:          unknown ({:#06x})", coff.machine_raw),
    }
    println!("Timestamp:        {:#010x}", coff.time_date_stamp);
    println!("Characteristics:  {:?}", coff.characteristics);
    println!("Optional header:  {:?}", opt.magic);
    println!("Image base:       {:#x}", opt.image_base);
    println!("Entry point RVA:  {:#x}", opt.address_of_entry_point);
    println!("Subsystem:        {}", opt.subsystem);
    println!("Sections:         {}", image.sections().len());
    for s in image.sections() {
        println!(
            "  {:<8} rva {:#010x}  vsize {:#08x}  raw {:#08x} @ {:#08x}",
            s.name(),
            s.virtual_address,
            s.virtual_size,
            s.size_of_raw_data,
            s.pointer_to_raw_data
        );
    }

    let Ok(cli) = image.cli_header() else {
        println!("CLI header:       none (native image)");
        return;
    };
    println!(
        "Runtime version:  {}.{}",
        cli.major_runtime_version, cli.minor_runtime_version
    );
    println!("CLI flags:        {:?}", cli.flags);
    println!(
        "Metadata:         rva {:#x}, {} bytes",
        cli.metadata.virtual_address, cli.metadata.size
    );
    match cli.entry_point_method() {
        Some(token) => println!("Entry point:      {token:#010x}"),
        None => println!("Entry point:      none"),
    }
}

fn cmd_disasm(
    path: &Path,
    rva: u32,
    image_options: ImageOptions,
    format: Format,
    decoder_options: DecoderOptions,
) {
    let image = or_exit(Image::open(path, &image_options));
    let body = or_exit(image.method_body(rva));
    log::debug!("Method at RVA {rva:#x}: {} code bytes", body.code().len());

    match format {
        Format::Text => {
            println!(
                "// method at RVA {rva:#x}: {:?} header, max_stack {}, {} code bytes",
                body.format,
                body.max_stack,
                body.code().len()
            );
            print_stream(body.decoder_with(decoder_options));
        }
        Format::Yaml => {
            let instructions = or_exit(
                body.decoder_with(decoder_options)
                    .collect::<Result<Vec<_>, _>>(),
            );
            let listing = method_listing(&body, &instructions);
            print!("{}", or_exit(serde_yaml::to_string(&listing)));
        }
    }
}

fn method_listing<'a>(body: &MethodBody<'_>, instructions: &'a [Instruction]) -> MethodListing<'a> {
    MethodListing {
        rva: body.rva,
        header: match body.format {
            cil_image::BodyFormat::Tiny => "tiny",
            cil_image::BodyFormat::Fat => "fat",
        },
        max_stack: body.max_stack,
        local_var_sig_token: body.local_var_sig_token,
        code_size: body.code().len(),
        instructions,
    }
}

fn cmd_decode(
    path: &Path,
    offset: u64,
    length: Option<u64>,
    format: Format,
    options: DecoderOptions,
) {
    let mut file = or_exit(File::open(path));
    or_exit(file.seek(SeekFrom::Start(offset)));
    log::debug!("Decoding {} from offset {offset:#x}", path.display());
    let reader = BufReader::new(file).take(length.unwrap_or(u64::MAX));
    let decoder = Decoder::with_options(reader, options);

    match format {
        Format::Text => print_stream(decoder),
        Format::Yaml => {
            let instructions = or_exit(decoder.collect::<Result<Vec<_>, _>>());
            print!("{}", or_exit(serde_yaml::to_string(&instructions)));
        }
    }
}

/// Prints each instruction as soon as it is decoded.
fn print_stream<R: Read>(decoder: Decoder<R>) {
    for insn in decoder {
        println!("{}", or_exit(insn));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_in_decimal_and_hex() {
        assert_eq!(parse_number::<u32>("8272"), Ok(8272));
        assert_eq!(parse_number::<u32>("0x2050"), Ok(0x2050));
        assert_eq!(parse_number::<u32>("0X2050"), Ok(0x2050));
        assert_eq!(parse_number::<u64>(" 16 "), Ok(16));
    }

    #[test]
    fn bad_numbers_are_rejected() {
        assert!(parse_number::<u32>("").is_err());
        assert!(parse_number::<u32>("0x").is_err());
        assert!(parse_number::<u32>("12ab").is_err());
        assert!(parse_number::<u32>("0x1_0000_0000").is_err());
        assert!(parse_number::<u32>("4294967296").is_err());
    }

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn disasm_arguments() {
        let cli = Cli::try_parse_from([
            "cil", "disasm", "app.dll", "--rva", "0x2050", "--format", "yaml", "--lenient",
        ])
        .unwrap();
        match cli.command {
            Commands::Disasm {
                rva,
                lenient,
                format,
                max_switch_targets,
                ..
            } => {
                assert_eq!(rva, 0x2050);
                assert!(lenient);
                assert!(format == Format::Yaml);
                assert_eq!(max_switch_targets, DEFAULT_MAX_SWITCH_TARGETS);
            }
            _ => panic!("expected disasm"),
        }
    }
}
