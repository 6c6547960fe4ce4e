//! csvsql CLI - Turn CSV files into SQL INSERT scripts
//!
//! # Main Commands
//!
//! ```bash
//! csvsql serve                          # Start HTTP server (port 10000)
//! csvsql convert people.csv -t people   # Write output/people.sql
//! csvsql convert people.csv --stdout    # Print the statements
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! csvsql classify 42 "O'Brien" ""       # Show literal encodings
//! csvsql sniff input.csv                # Show encoding, delimiter, columns
//! ```

use clap::{Parser, Subcommand};
use csvsql::{
    classify, convert, generate_sql_bytes, generate_sql_file, parser::format_delimiter, sniff,
    ConvertOptions, ConvertSummary, ServerConfig, DEFAULT_BATCH_SIZE,
};
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "csvsql")]
#[command(about = "Turn CSV files into batched SQL INSERT scripts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a CSV file into an INSERT script
    Convert {
        /// Input CSV file
        input: PathBuf,

        /// Destination table name
        #[arg(short, long, default_value = csvsql::config::DEFAULT_TABLE)]
        table: String,

        /// Directory for the generated <table>.sql
        #[arg(short, long, default_value = "output")]
        output_dir: PathBuf,

        /// Print statements to stdout instead of writing a file
        #[arg(long)]
        stdout: bool,

        /// Rows per INSERT statement
        #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
        batch_size: usize,

        /// CSV delimiter (default: comma)
        #[arg(short, long, conflicts_with = "auto_delimiter")]
        delimiter: Option<char>,

        /// Detect encoding and delimiter from the file content
        #[arg(long)]
        auto_delimiter: bool,
    },

    /// Show how values are encoded as SQL literals
    Classify {
        /// Raw field values
        values: Vec<String>,
    },

    /// Detect encoding, delimiter and columns of a CSV file
    Sniff {
        /// Input CSV file
        input: PathBuf,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on (default: CSVSQL_PORT or 10000)
        #[arg(short, long)]
        port: Option<u16>,

        /// Address to bind (default: CSVSQL_HOST or 0.0.0.0)
        #[arg(long)]
        host: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Convert {
            input,
            table,
            output_dir,
            stdout,
            batch_size,
            delimiter,
            auto_delimiter,
        } => convert_options(batch_size, delimiter).and_then(|options| {
            cmd_convert(
                &input,
                &table,
                &output_dir,
                stdout,
                &options,
                auto_delimiter,
            )
        }),

        Commands::Classify { values } => cmd_classify(&values),

        Commands::Sniff { input } => cmd_sniff(&input),

        Commands::Serve { port, host } => cmd_serve(port, host).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn convert_options(
    batch_size: usize,
    delimiter: Option<char>,
) -> Result<ConvertOptions, Box<dyn std::error::Error>> {
    let mut options = ConvertOptions::default().with_batch_size(batch_size);
    if let Some(d) = delimiter {
        if !d.is_ascii() {
            return Err(format!("Delimiter must be a single ASCII character, got '{}'", d).into());
        }
        options = options.with_delimiter(d as u8);
    }
    Ok(options)
}

fn cmd_convert(
    input: &Path,
    table: &str,
    output_dir: &Path,
    stdout: bool,
    options: &ConvertOptions,
    auto_delimiter: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Converting: {} -> table `{}`", input.display(), table);

    if stdout {
        let out = BufWriter::new(io::stdout().lock());
        let summary = if auto_delimiter {
            let bytes = fs::read(input)?;
            let sniffed = sniff(&bytes);
            eprintln!("   Encoding: {}", sniffed.encoding);
            let options = options.clone().with_delimiter(sniffed.delimiter);
            convert(sniffed.content.as_bytes(), table, out, &options)?
        } else {
            convert(File::open(input)?, table, out, options)?
        };
        print_summary(&summary);
        return Ok(());
    }

    let generated = if auto_delimiter {
        let bytes = fs::read(input)?;
        generate_sql_bytes(&bytes, table, output_dir, options, true)?
    } else {
        generate_sql_file(input, table, output_dir, options)?
    };

    eprintln!("   Encoding: {}", generated.encoding);
    eprintln!("   Delimiter: '{}'", format_delimiter(generated.delimiter));
    print_summary(&generated.summary);
    eprintln!("💾 Output written to: {}", generated.path.display());

    Ok(())
}

fn print_summary(summary: &ConvertSummary) {
    eprintln!("   Columns: {}", summary.columns.join(", "));
    if summary.row_count == 0 {
        eprintln!("⚠️  Header only, no INSERT statements written");
    } else {
        eprintln!(
            "✅ {} rows -> {} INSERT statements",
            summary.row_count, summary.batch_count
        );
    }
}

fn cmd_classify(values: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    for value in values {
        let encoded = classify(value);
        println!("{:?}\t{}\t{}", value, encoded.kind(), encoded);
    }
    Ok(())
}

fn cmd_sniff(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("🔍 Sniffing: {}", input.display());

    let bytes = fs::read(input)?;
    let sniffed = sniff(&bytes);
    let options = ConvertOptions::default().with_delimiter(sniffed.delimiter);
    let summary = convert(sniffed.content.as_bytes(), "sniff", io::sink(), &options)?;

    println!("Encoding:  {}", sniffed.encoding);
    println!("Delimiter: '{}'", format_delimiter(sniffed.delimiter));
    println!("Rows:      {}", summary.row_count);
    println!("Columns:   {}", summary.columns.join(", "));

    Ok(())
}

async fn cmd_serve(
    port: Option<u16>,
    host: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = ServerConfig::from_env()?;
    if let Some(port) = port {
        config.port = port;
    }
    if let Some(host) = host {
        config.host = host;
    }
    csvsql::server::start_server(config).await
}
