//! # fast-iconv CLI - Character Encoding Converter
//!
//! Command-line front end for streaming conversions between the encodings
//! bundled with the library.

#[cfg(feature = "cli")]
use std::fs::{self, File};
#[cfg(feature = "cli")]
use std::io::{self, BufWriter, Read, Write};
#[cfg(feature = "cli")]
use std::path::{Path, PathBuf};

#[cfg(feature = "cli")]
use anyhow::{Context, Result};
#[cfg(feature = "cli")]
use clap::{Args, Parser, Subcommand, ValueEnum};
#[cfg(feature = "cli")]
use serde::Serialize;
#[cfg(feature = "cli")]
use tracing::{debug, info};
#[cfg(feature = "cli")]
use tracing_subscriber::EnvFilter;

#[cfg(feature = "cli")]
use fast_iconv::{
    ConversionOptions, ConversionState, Converter, Error as ConvertError, Registry,
    StreamingConverter,
};

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI features disabled. Enable with --features cli");
    std::process::exit(1);
}

/// fast-iconv: stateful character encoding converter
#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "fast-iconv")]
#[command(version, about, long_about = None)]
#[command(author = "FastEncode Contributors")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Convert a file between character encodings
    Convert(ConvertArgs),

    /// List all registered encodings
    List,

    /// Check that input is well formed in an encoding
    Validate(ValidateArgs),
}

#[cfg(feature = "cli")]
#[derive(Args)]
struct ConvertArgs {
    /// Source encoding
    #[arg(short = 'f', long = "from")]
    from: String,

    /// Target encoding, optionally suffixed with //TRANSLIT and //IGNORE
    #[arg(short = 't', long = "to")]
    to: String,

    /// Input file (stdin if not specified)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Approximate characters the target cannot represent
    #[arg(long)]
    translit: bool,

    /// Skip illegal input and drop unrepresentable characters
    #[arg(long)]
    discard: bool,

    /// JSON file with conversion options
    #[arg(long)]
    options: Option<PathBuf>,

    /// Read and output buffer size (KB)
    #[arg(long, default_value = "64")]
    buffer_size: usize,
}

#[cfg(feature = "cli")]
#[derive(Args)]
struct ValidateArgs {
    /// Input file (stdin if not specified)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Expected encoding
    #[arg(short, long)]
    encoding: String,
}

#[cfg(feature = "cli")]
#[derive(Clone, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[cfg(feature = "cli")]
#[derive(Serialize)]
struct ConversionReport {
    success: bool,
    from: String,
    to: String,
    bytes_read: usize,
    bytes_written: usize,
    options: ConversionOptions,
    processing_time_ms: u64,
}

#[cfg(feature = "cli")]
#[derive(Serialize)]
struct EncodingInfo<'a> {
    name: &'a str,
    decode: bool,
    encode: bool,
    unit_len: usize,
}

#[cfg(feature = "cli")]
#[derive(Serialize)]
struct ValidationReport {
    encoding: String,
    valid: bool,
    bytes: usize,
    error_offset: Option<usize>,
    error: Option<String>,
}

#[cfg(feature = "cli")]
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Convert(ref args) => convert_command(args, &cli)?,
        Commands::List => list_command(&cli)?,
        Commands::Validate(ref args) => validate_command(args, &cli)?,
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn init_tracing(verbose: bool) {
    let default = if verbose { "fast_iconv=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

#[cfg(feature = "cli")]
fn open_input(path: Option<&Path>) -> Result<Box<dyn Read>> {
    match path {
        Some(path) => {
            debug!(path = %path.display(), "reading input file");
            let file = File::open(path)
                .with_context(|| format!("Failed to open input file: {}", path.display()))?;
            Ok(Box::new(file))
        }
        None => {
            debug!("reading stdin");
            Ok(Box::new(io::stdin().lock()))
        }
    }
}

#[cfg(feature = "cli")]
fn load_options(path: &Path) -> Result<ConversionOptions> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read options file: {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Invalid options file: {}", path.display()))
}

#[cfg(feature = "cli")]
fn convert_command(args: &ConvertArgs, cli: &Cli) -> Result<()> {
    let start_time = std::time::Instant::now();

    let mut converter = Converter::new(&args.from, &args.to).with_context(|| {
        format!("Failed to open converter from {} to {}", args.from, args.to)
    })?;

    let mut options = converter.options().merge(ConversionOptions {
        transliterate: args.translit,
        discard_illegal: args.discard,
    });
    if let Some(ref path) = args.options {
        options = options.merge(load_options(path)?);
    }
    converter.set_options(options);

    info!(
        from = converter.source_name(),
        to = converter.target_name(),
        ?options,
        "converting"
    );

    let buffer_size = args.buffer_size.max(1) * 1024;
    let mut input = open_input(args.input.as_deref())?;
    let mut output: Box<dyn Write> = match args.output {
        Some(ref path) => Box::new(BufWriter::new(File::create(path).with_context(|| {
            format!("Failed to create output file: {}", path.display())
        })?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let mut stream = StreamingConverter::with_buffer_size(converter, buffer_size);
    let mut chunk = vec![0u8; buffer_size];
    let mut bytes_read = 0;
    let mut bytes_written = 0;

    loop {
        let n = input.read(&mut chunk).context("Failed to read input")?;
        if n == 0 {
            break;
        }
        bytes_read += n;

        let converted = stream
            .process_chunk(&chunk[..n])
            .context("Conversion failed")?;
        output
            .write_all(&converted)
            .context("Failed to write output")?;
        bytes_written += converted.len();
    }

    let tail = stream.finish().context("Conversion failed")?;
    output.write_all(&tail).context("Failed to write output")?;
    output.flush().context("Failed to write output")?;
    bytes_written += tail.len();

    let processing_time = start_time.elapsed();
    debug!(bytes_read, bytes_written, ?processing_time, "conversion finished");

    match cli.format {
        OutputFormat::Json => {
            let report = ConversionReport {
                success: true,
                from: args.from.clone(),
                to: args.to.clone(),
                bytes_read,
                bytes_written,
                options,
                processing_time_ms: processing_time.as_millis() as u64,
            };
            eprintln!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            if cli.verbose {
                eprintln!(
                    "Converted {} bytes -> {} bytes in {:?}",
                    bytes_read, bytes_written, processing_time
                );
            }
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn list_command(cli: &Cli) -> Result<()> {
    let registry = Registry::builtin();
    let encodings: Vec<_> = registry
        .entries()
        .map(|(_, entry)| EncodingInfo {
            name: entry.name(),
            decode: entry.directions().decode,
            encode: entry.directions().encode,
            unit_len: entry.decoder().unit_len(ConversionState::INITIAL),
        })
        .collect();

    match cli.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&encodings)?);
        }
        OutputFormat::Text => {
            println!("Supported Encodings ({} total):", encodings.len());
            println!();
            for info in &encodings {
                let directions = match (info.decode, info.encode) {
                    (true, true) => "decode/encode",
                    (true, false) => "decode only",
                    (false, true) => "encode only",
                    (false, false) => "unusable",
                };
                println!("{:15} {}", info.name, directions);
            }
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn validate_command(args: &ValidateArgs, cli: &Cli) -> Result<()> {
    let mut input_data = Vec::new();
    open_input(args.input.as_deref())?
        .read_to_end(&mut input_data)
        .context("Failed to read input")?;

    // every scalar value is representable in UTF-8, so only decoding can fail
    let mut converter = Converter::new(&args.encoding, "UTF-8")
        .with_context(|| format!("Failed to open decoder for {}", args.encoding))?;

    let outcome = converter.convert_all(&input_data);
    let error_offset = match &outcome {
        Err(
            ConvertError::IllegalSequence { offset } | ConvertError::IncompleteSequence { offset },
        ) => Some(*offset),
        _ => None,
    };
    let report = ValidationReport {
        encoding: converter.source_name().to_string(),
        valid: outcome.is_ok(),
        bytes: input_data.len(),
        error_offset,
        error: outcome.as_ref().err().map(ToString::to_string),
    };

    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => {
            if report.valid {
                println!("✓ Input is valid {}", report.encoding);
            } else {
                println!("✗ Input is not valid {}", report.encoding);
                if let Some(ref error) = report.error {
                    println!("  {}", error);
                }
            }
        }
    }

    if !report.valid {
        std::process::exit(1);
    }
    Ok(())
}
