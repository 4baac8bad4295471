//! fgmetric CLI - read, check and rewrite metric files
//!
//! Record types are given as JSON schema descriptions (see
//! `fgmetric::schema::description`).
//!
//! ```bash
//! fgmetric header  --schema s.json              # Print the header a writer would emit
//! fgmetric check   --schema s.json              # Validate a schema description
//! fgmetric read    --schema s.json input.tsv    # Decode rows to JSON lines
//! fgmetric convert --schema s.json in.tsv out.tsv   # Decode and re-encode rows
//! ```
//!
//! Logging goes to stderr. The level is read from `FGMETRIC_LOG`, then
//! `RUST_LOG`, and defaults to `info`. A `.env` file is loaded first.

use clap::{Parser, Subcommand};
use fgmetric::{
    LineTerminator, ReaderOptions, RecordReader, RecordType, RecordWriter, SchemaDescription,
    WriterOptions,
};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fgmetric")]
#[command(about = "Read and write typed delimited metric files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the column header for a schema
    Header {
        /// Schema description (JSON)
        #[arg(short, long)]
        schema: PathBuf,

        /// Row delimiter ("tab", "\t" or a single character)
        #[arg(short, long, default_value = "tab", value_parser = parse_delimiter)]
        delimiter: u8,
    },

    /// Validate a schema description and show how its fields are handled
    Check {
        /// Schema description (JSON)
        #[arg(short, long)]
        schema: PathBuf,
    },

    /// Decode a metric file and output one JSON object per record
    Read {
        /// Schema description (JSON)
        #[arg(short, long)]
        schema: PathBuf,

        /// Input metric file
        input: PathBuf,

        /// Row delimiter ("tab", "\t" or a single character)
        #[arg(short, long, default_value = "tab", value_parser = parse_delimiter)]
        delimiter: u8,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Decode a metric file and write it back out, normalized
    Convert {
        /// Schema description (JSON)
        #[arg(short, long)]
        schema: PathBuf,

        /// Input metric file
        input: PathBuf,

        /// Output metric file
        output: PathBuf,

        /// Input row delimiter
        #[arg(long, default_value = "tab", value_parser = parse_delimiter)]
        in_delimiter: u8,

        /// Output row delimiter
        #[arg(long, default_value = "tab", value_parser = parse_delimiter)]
        out_delimiter: u8,

        /// Write CRLF line endings
        #[arg(long)]
        crlf: bool,
    },
}

fn main() {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_env("FGMETRIC_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::info!(
        "Executing: {}",
        std::env::args().collect::<Vec<_>>().join(" ")
    );

    let result = match cli.command {
        Commands::Header { schema, delimiter } => cmd_header(&schema, delimiter),

        Commands::Check { schema } => cmd_check(&schema),

        Commands::Read {
            schema,
            input,
            delimiter,
            output,
        } => cmd_read(&schema, &input, delimiter, output.as_deref()),

        Commands::Convert {
            schema,
            input,
            output,
            in_delimiter,
            out_delimiter,
            crlf,
        } => cmd_convert(&schema, &input, &output, in_delimiter, out_delimiter, crlf),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
    tracing::info!("Finished executing successfully.");
}

fn load_record_type(path: &Path) -> Result<RecordType, Box<dyn std::error::Error>> {
    let record_type = SchemaDescription::from_path(path)?.into_record_type()?;
    tracing::debug!(schema = %path.display(), fields = record_type.fields().len(), "loaded schema");
    Ok(record_type)
}

fn cmd_header(schema: &Path, delimiter: u8) -> Result<(), Box<dyn std::error::Error>> {
    let record_type = load_record_type(schema)?;
    let separator = char::from(delimiter).to_string();
    println!("{}", record_type.header_fieldnames().join(&separator));
    Ok(())
}

fn cmd_check(schema: &Path) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("✔️  Checking: {}", schema.display());
    let record_type = load_record_type(schema)?;

    println!("Fields:");
    for field in record_type.fields() {
        let default = match &field.default {
            Some(value) => format!(" (default: {})", value),
            None => String::new(),
        };
        println!("  {}: {}{}", field.name, field.field_type, default);
    }

    println!("List delimiter: '{}'", record_type.list_delimiter());
    println!("Unknown fields: {:?}", record_type.unknown_fields());
    println!("List fields: {}", or_none(&record_type.list_fields()));
    println!(
        "Lists with optional elements: {}",
        or_none(&record_type.optional_element_list_fields())
    );
    match record_type.accumulator() {
        Some(acc) => println!(
            "Counter: {} over {} ({})",
            acc.name,
            acc.key.name(),
            acc.key.members().join(", ")
        ),
        None => println!("Counter: none"),
    }
    println!("Header: {}", record_type.header_fieldnames().join(", "));
    println!("Hooks: {}", record_type.hook_names().join(" → "));

    eprintln!("✅ Schema is valid");
    Ok(())
}

fn cmd_read(
    schema: &Path,
    input: &Path,
    delimiter: u8,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let record_type = load_record_type(schema)?;
    eprintln!("📄 Reading: {}", input.display());

    let options = ReaderOptions {
        delimiter,
        ..ReaderOptions::default()
    };
    let reader = RecordReader::open(input, &record_type, &options)?;
    eprintln!("   Columns: {}", reader.headers().join(", "));

    let mut out: Box<dyn Write> = match output {
        Some(p) => Box::new(BufWriter::new(File::create(p)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let mut count = 0usize;
    for record in reader {
        let record = record?;
        serde_json::to_writer(&mut out, &record)?;
        out.write_all(b"\n")?;
        count += 1;
    }
    out.flush()?;

    eprintln!("✅ Read {} records", count);
    if let Some(p) = output {
        eprintln!("💾 Output written to: {}", p.display());
    }
    Ok(())
}

fn cmd_convert(
    schema: &Path,
    input: &Path,
    output: &Path,
    in_delimiter: u8,
    out_delimiter: u8,
    crlf: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let record_type = load_record_type(schema)?;
    eprintln!("📄 Converting: {} → {}", input.display(), output.display());
    eprintln!(
        "   Delimiter: '{}' → '{}'",
        format_delimiter(in_delimiter),
        format_delimiter(out_delimiter)
    );

    let reader_options = ReaderOptions {
        delimiter: in_delimiter,
        ..ReaderOptions::default()
    };
    let writer_options = WriterOptions {
        delimiter: out_delimiter,
        line_terminator: if crlf {
            LineTerminator::CrLf
        } else {
            LineTerminator::Lf
        },
    };

    let reader = RecordReader::open(input, &record_type, &reader_options)?;
    let mut writer = RecordWriter::create(output, &record_type, &writer_options)?;

    let mut count = 0usize;
    for record in reader {
        writer.write(&record?)?;
        count += 1;
    }
    writer.finish()?;

    eprintln!("✅ Converted {} records", count);
    Ok(())
}

/// Parse a row delimiter argument.
fn parse_delimiter(s: &str) -> Result<u8, String> {
    match s {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        _ => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii() => Ok(c as u8),
                _ => Err(format!(
                    "delimiter must be 'tab' or a single ASCII character, got '{}'",
                    s
                )),
            }
        }
    }
}

fn format_delimiter(d: u8) -> String {
    match d {
        b'\t' => "\\t".to_string(),
        c => char::from(c).to_string(),
    }
}

fn or_none(names: &[&str]) -> String {
    if names.is_empty() {
        "none".to_string()
    } else {
        names.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_delimiter() {
        assert_eq!(parse_delimiter("tab").unwrap(), b'\t');
        assert_eq!(parse_delimiter("\\t").unwrap(), b'\t');
        assert_eq!(parse_delimiter(",").unwrap(), b',');
        assert_eq!(parse_delimiter(";").unwrap(), b';');
        assert!(parse_delimiter("").is_err());
        assert!(parse_delimiter(";;").is_err());
        assert!(parse_delimiter("¦").is_err());
    }

    #[test]
    fn test_format_delimiter() {
        assert_eq!(format_delimiter(b'\t'), "\\t");
        assert_eq!(format_delimiter(b','), ",");
    }
}
