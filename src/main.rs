use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use orgmark::{Document, HtmlRenderer, RenderOptions, Result};

#[derive(Parser)]
#[command(name = "orgmark", version, about = "Convert org files to HTML")]
struct Cli {
    /// Input org file (reads stdin when omitted or "-")
    input: Option<PathBuf>,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Remove empty paragraphs
    #[arg(long)]
    no_empty_text: bool,

    /// Shift every heading level by this amount
    #[arg(long, allow_hyphen_values = true)]
    heading_offset: Option<i32>,

    /// TOML file with render options; flags override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Html)]
    format: Format,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Html,
    Org,
    Json,
}

fn main() {
    let cli = Cli::parse();

    // --verbose forces debug, otherwise RUST_LOG or warn
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    if let Err(err) = run(&cli) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let options = render_options(cli)?;
    let doc = read_document(cli.input.as_ref())?;

    let output = match cli.format {
        Format::Html => HtmlRenderer::with_options(options).render(&doc),
        Format::Org => doc.to_org(),
        Format::Json => serde_json::to_string_pretty(&doc)?,
    };

    match &cli.output {
        Some(path) => fs::write(path, output)?,
        None => io::stdout().write_all(output.as_bytes())?,
    }
    Ok(())
}

fn render_options(cli: &Cli) -> Result<RenderOptions> {
    let mut options = match &cli.config {
        Some(path) => RenderOptions::load(path)?,
        None => RenderOptions::default(),
    };
    if cli.no_empty_text {
        options.suppress_empty_paragraphs = true;
    }
    if let Some(offset) = cli.heading_offset {
        options.heading_level_offset = offset;
    }
    tracing::debug!(?options, "render options");
    Ok(options)
}

fn read_document(input: Option<&PathBuf>) -> Result<Document> {
    match input {
        Some(path) if path.as_os_str() != "-" => {
            let text = fs::read_to_string(path)?;
            Ok(orgmark::parse(&text))
        }
        _ => orgmark::parse_reader(io::stdin().lock()),
    }
}
