use anyasm::assembler::Assembler;
use anyasm::cpu::Cpu;
use anyasm::opcodes::MOS6502;
use anyhow::{bail, Context, Result};
use clap::Parser;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::Path;

/// Assembler for any processor a TOML description can spell out.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Assemble the instructions given on this file. The standard input is used
    /// when this argument is not given.
    file: Option<String>,

    /// Path to a TOML processor description. The built-in MOS 6502 description
    /// is used when this argument is not given.
    #[arg(short = 'c', long)]
    cpu: Option<String>,

    /// Place the output into the given <OUT> file. Ignored if the `stdout` flag
    /// is provided. Defaults to `out.bin`.
    #[arg(short = 'o', long)]
    out: Option<String>,

    /// Spit the output into the standard output instead. This ignores any given
    /// `out` flag. Disabled by default.
    #[arg(long, default_value_t = false)]
    stdout: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Select the input stream.
    let input: Box<dyn Read> = match &args.file {
        Some(file) => {
            if !Path::new(file).is_file() {
                bail!("Input file must be a valid file");
            }
            Box::new(File::open(file)?)
        }
        None => Box::new(io::stdin()),
    };

    // Select the processor description.
    let owned;
    let cpu: &Cpu = match &args.cpu {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Could not read '{}'", path))?;
            owned = match Cpu::from_toml(&text) {
                Ok(cpu) => cpu,
                Err(e) => {
                    eprintln!("error: {}", e);
                    std::process::exit(1);
                }
            };
            &owned
        }
        None => &MOS6502,
    };

    // Select the output stream.
    let mut output: Box<dyn Write> = if args.stdout {
        Box::new(io::stdout())
    } else {
        Box::new(File::create(args.out.unwrap_or(String::from("out.bin")))?)
    };

    // And assemble.
    match Assembler::new(cpu).assemble(input) {
        Ok(encoded) => {
            for chunk in encoded {
                output.write_all(&chunk.bytes)?;
            }
            Ok(())
        }
        Err(errors) => {
            let mut error_count = 0;
            for err in errors {
                eprintln!("error: {}", err);
                error_count += 1;
            }
            std::process::exit(error_count);
        }
    }
}
