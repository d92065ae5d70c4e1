//! CLI tool for generating donation tax receipts from a ledger spreadsheet.

use anyhow::{Context, Result};
use clap::Parser;
use receipt_core::ledger::PREVIEW_COLUMNS;
use receipt_core::{
    BatchProcessor, CollisionPolicy, LedgerTable, OrganizationProfile, RowRange,
    ARCHIVE_FILENAME,
};
use receipt_pdf::PdfRenderer;
use receipt_xlsx::{XlsxReader, DEFAULT_HEADER_ROW, DEFAULT_SHEET_NAME};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Generate tax-exempt donation receipts (one PDF per ledger entry) as a ZIP.
#[derive(Parser, Debug)]
#[command(name = "receipt-gen")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Ledger workbook (.xlsx)
    input: PathBuf,

    /// Worksheet holding the ledger
    #[arg(long, default_value = DEFAULT_SHEET_NAME)]
    sheet: String,

    /// Number of title rows above the column header row
    #[arg(long, default_value_t = DEFAULT_HEADER_ROW)]
    header_row: usize,

    /// Only keep entries whose Consignee/Party Address contains this text
    #[arg(short, long)]
    filter: Option<String>,

    /// First entry to generate (0-based, after filtering)
    #[arg(short, long, default_value_t = 0)]
    start: usize,

    /// Last entry to generate, inclusive (default: same as --start)
    #[arg(short, long)]
    end: Option<usize>,

    /// Output directory for the archive (default: current directory)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON file with the organization profile printed on receipts
    #[arg(short, long)]
    profile: Option<PathBuf>,

    /// Let later entries replace earlier ones with the same filename
    #[arg(long)]
    overwrite_duplicates: bool,

    /// List the (filtered) entries with their indices instead of generating
    #[arg(short, long)]
    list: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let profile = match &args.profile {
        Some(path) => load_profile(path)?,
        None => OrganizationProfile::default(),
    };

    let file = File::open(&args.input)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;
    let raw = XlsxReader::new()
        .with_sheet(args.sheet.as_str())
        .with_header_row(args.header_row)
        .read(BufReader::new(file))
        .with_context(|| format!("Error reading file {}", args.input.display()))?;

    let table = LedgerTable::from_raw(&raw)?;
    eprintln!("Loaded {} entries.", table.len());

    let processor = BatchProcessor::new(PdfRenderer::new(profile));
    let selected = processor.select(&table, args.filter.as_deref())?;
    if args.filter.as_deref().is_some_and(|f| !f.trim().is_empty()) {
        eprintln!("Found {} matching entries.", selected.len());
    }

    if args.list {
        print!("{}", format_preview(&selected));
        return Ok(());
    }

    let range = RowRange::new(args.start, args.end.unwrap_or(args.start));
    let policy = if args.overwrite_duplicates {
        CollisionPolicy::Overwrite
    } else {
        CollisionPolicy::Disambiguate
    };
    let archive = processor.generate(&selected, range, policy)?;

    let output_path = get_output_path(args.output.as_ref())?;
    let writer = BufWriter::new(
        File::create(&output_path)
            .with_context(|| format!("Failed to create {}", output_path.display()))?,
    );
    archive
        .write_zip(writer)?
        .flush()
        .with_context(|| format!("Failed to write to {}", output_path.display()))?;

    eprintln!("Generated {} receipts.", range.count());
    if args.verbose {
        for name in archive.filenames() {
            eprintln!("  {}", name);
        }
    }
    println!("{}", output_path.display());

    Ok(())
}

/// Load and validate an organization profile from a JSON file.
fn load_profile(path: &Path) -> Result<OrganizationProfile> {
    let mut content = String::new();
    File::open(path)
        .and_then(|mut f| f.read_to_string(&mut content))
        .with_context(|| format!("Failed to read profile {}", path.display()))?;

    parse_profile(&content).with_context(|| format!("Invalid profile {}", path.display()))
}

/// Parse a profile; fields left out keep their default values.
fn parse_profile(json: &str) -> Result<OrganizationProfile> {
    let profile: OrganizationProfile = serde_json::from_str(json)?;
    profile.validate()?;
    Ok(profile)
}

/// Determine where the archive is written.
fn get_output_path(output_dir: Option<&PathBuf>) -> Result<PathBuf> {
    let output_path = match output_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
            dir.join(ARCHIVE_FILENAME)
        }
        None => PathBuf::from(ARCHIVE_FILENAME),
    };

    Ok(output_path)
}

/// Shorten `text` to at most `max` characters.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut short: String = text.chars().take(max.saturating_sub(3)).collect();
        short.push_str("...");
        short
    }
}

/// Render the table preview with row indices for range selection.
fn format_preview(table: &LedgerTable) -> String {
    let mut out = format!(
        "{:>5}  {:<10}  {:<40}  {:>10}  {:<10}  {}\n",
        "#", PREVIEW_COLUMNS[0], PREVIEW_COLUMNS[1], PREVIEW_COLUMNS[2], PREVIEW_COLUMNS[3], PREVIEW_COLUMNS[4]
    );
    for (index, [date, address, donation, pan, voucher]) in table.preview() {
        out.push_str(&format!(
            "{:>5}  {:<10}  {:<40}  {:>10}  {:<10}  {}\n",
            index,
            date,
            truncate(&address, 40),
            donation,
            pan,
            voucher
        ));
    }
    out
}
