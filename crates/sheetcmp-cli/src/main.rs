//! sheetcmp CLI
//!
//! Command-line tool for comparing the rows of two spreadsheets or CSV files.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use log::info;
use sheetcmp_core::parser::SourceFormat;
use sheetcmp_core::{
    load_table, pair_directories, sheet_names, write_csv_dir, BatchJob, CompareJob, GridView,
    LoadOptions, NormalizeOptions, ReportLog, ResultBundle, RunReport, Session, Side, SqliteSink,
    TableKind, ViewOptions,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "sheetcmp")]
#[command(about = "Compare the rows of two spreadsheets", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the sheets, columns and first rows of a file
    Inspect {
        /// Path to a CSV, TSV or workbook file
        #[arg(short, long)]
        file: PathBuf,

        /// Sheet to read from a workbook
        #[arg(short, long)]
        sheet: Option<String>,
    },

    /// Compare two files
    Compare {
        /// First file
        #[arg(short, long)]
        left: PathBuf,

        /// Second file
        #[arg(short, long)]
        right: PathBuf,

        /// Sheet to read from the first file
        #[arg(long)]
        sheet_left: Option<String>,

        /// Sheet to read from the second file
        #[arg(long)]
        sheet_right: Option<String>,

        /// Write all tables to this XLSX workbook
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write one CSV per table into this directory
        #[arg(long)]
        csv_dir: Option<PathBuf>,

        /// Store all tables in this SQLite database
        #[arg(long)]
        database: Option<PathBuf>,

        /// Save a JSON run report here
        #[arg(long)]
        report: Option<PathBuf>,

        /// Append the run report to this history file
        #[arg(long)]
        history: Option<PathBuf>,

        /// Lay exported sheets out left to right
        #[arg(long)]
        no_rtl: bool,

        /// Tables to print
        #[arg(long, value_enum)]
        show: Option<ShowTables>,

        /// Maximum number of rows to print per table
        #[arg(long)]
        limit: Option<usize>,

        /// Treat missing cells and empty strings as different
        #[arg(long)]
        strict_missing: bool,

        /// Ignore leading and trailing whitespace
        #[arg(long)]
        trim: bool,

        /// Compare text case-insensitively
        #[arg(long)]
        ignore_case: bool,
    },

    /// Run a comparison described by a job file
    Run {
        /// Path to job file (JSON)
        #[arg(short, long)]
        job: PathBuf,

        /// Tables to print
        #[arg(long, value_enum)]
        show: Option<ShowTables>,

        /// Maximum number of rows to print per table
        #[arg(long)]
        limit: Option<usize>,

        /// Append the run report to this history file
        #[arg(long)]
        history: Option<PathBuf>,
    },

    /// Create a job file template
    CreateJob {
        /// Output path for the job file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Create a batch file template
    CreateBatch {
        /// Output path for the batch file
        #[arg(short, long)]
        output: PathBuf,

        /// Directory holding the first set of files
        #[arg(long)]
        left_root: PathBuf,

        /// Directory holding the second set of files
        #[arg(long)]
        right_root: PathBuf,

        /// Output directory for workbooks
        #[arg(long)]
        export_dir: PathBuf,
    },

    /// Compare every matching file in two directories
    Batch {
        /// Path to batch file (JSON)
        #[arg(short, long)]
        job: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ShowTables {
    Common,
    Unique1,
    Unique2,
    All,
}

impl ShowTables {
    fn kinds(self) -> &'static [TableKind] {
        match self {
            ShowTables::Common => &[TableKind::Common],
            ShowTables::Unique1 => &[TableKind::UniqueA],
            ShowTables::Unique2 => &[TableKind::UniqueB],
            ShowTables::All => &TableKind::ALL,
        }
    }
}

/// What to print after a comparison
struct ShowOptions {
    show: Option<ShowTables>,
    limit: Option<usize>,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn run(command: Commands) -> sheetcmp_core::Result<()> {
    match command {
        Commands::Inspect { file, sheet } => cmd_inspect(&file, sheet),
        Commands::Compare {
            left,
            right,
            sheet_left,
            sheet_right,
            output,
            csv_dir,
            database,
            report,
            history,
            no_rtl,
            show,
            limit,
            strict_missing,
            trim,
            ignore_case,
        } => {
            let job = CompareJob {
                sheet_left,
                sheet_right,
                normalize: NormalizeOptions {
                    missing_matches_empty: !strict_missing,
                    trim_strings: trim,
                    case_insensitive: ignore_case,
                },
                output_xlsx: output,
                output_csv_dir: csv_dir,
                right_to_left: !no_rtl,
                database,
                report,
                ..CompareJob::new(left, right)
            };
            cmd_compare(&job, &ShowOptions { show, limit }, history.as_deref())
        }
        Commands::Run {
            job,
            show,
            limit,
            history,
        } => {
            let job = CompareJob::load(&job)?;
            cmd_compare(&job, &ShowOptions { show, limit }, history.as_deref())
        }
        Commands::CreateJob { output } => cmd_create_job(&output),
        Commands::CreateBatch {
            output,
            left_root,
            right_root,
            export_dir,
        } => cmd_create_batch(&output, left_root, right_root, export_dir),
        Commands::Batch { job } => cmd_batch(&job),
    }
}

fn cmd_inspect(file: &Path, sheet: Option<String>) -> sheetcmp_core::Result<()> {
    println!("File: {}", file.display());

    if SourceFormat::from_path(file) == Some(SourceFormat::Workbook) {
        let names = sheet_names(file)?;
        println!("Sheets: {}", names.join(", "));
    }

    let table = load_table(file, &LoadOptions { sheet })?;
    println!("Columns: {}", table.column_count());
    println!("Rows: {}", table.row_count());
    println!();

    let view = GridView::from_table(
        &table,
        &ViewOptions {
            max_rows: Some(10),
            rtl: false,
        },
    );
    print!("{}", view.to_text());

    Ok(())
}

fn cmd_compare(
    job: &CompareJob,
    display: &ShowOptions,
    history: Option<&Path>,
) -> sheetcmp_core::Result<()> {
    let mut session = Session::new(job.normalize);
    session.load(Side::Left, &job.left, &job.left_options())?;
    session.load(Side::Right, &job.right, &job.right_options())?;

    let Some(bundle) = session.reconcile()? else {
        return Ok(());
    };
    print_summary(bundle);
    let report = RunReport::from_bundle(bundle, &job.normalize);

    if let Some(show) = display.show {
        let options = ViewOptions {
            max_rows: display.limit.or(ViewOptions::default().max_rows),
            rtl: false,
        };
        for &kind in show.kinds() {
            if let Some(table) = session.table(kind) {
                println!();
                println!("{} ({} rows)", kind.title(), table.row_count());
                print!("{}", GridView::from_table(table, &options).to_text());
            }
        }
    }

    if let Some(path) = &job.output_xlsx {
        let summary = session.export_workbook(path, &job.export_options())?;
        println!(
            "Exported {} sheets ({} rows) to {}",
            summary.written.len(),
            summary.rows_written,
            path.display()
        );
    }

    if let Some(dir) = &job.output_csv_dir {
        let summary = write_csv_dir(dir, &session.sections())?;
        println!("Exported {} CSV files to {}", summary.written.len(), dir.display());
    }

    if let Some(path) = &job.database {
        let mut sink = SqliteSink::open(path)?;
        let stored = session.persist(&mut sink)?;
        println!("Stored {} tables in {}", stored, path.display());
    }

    if let Some(path) = &job.report {
        report.save(path)?;
        println!("Saved report to {}", path.display());
    }

    if let Some(path) = history {
        let mut log = ReportLog::load(path)?;
        log.add(report);
        log.save(path)?;
        info!("appended run to {}", path.display());
    }

    Ok(())
}

fn print_summary(bundle: &ResultBundle) {
    let counts = bundle.counts();
    let diff = bundle.schema_diff();

    println!("File 1: {} ({} rows)", bundle.source_a().name, counts.source_a);
    println!("File 2: {} ({} rows)", bundle.source_b().name, counts.source_b);
    println!();
    println!("Columns: {}", bundle.schema().columns().join(", "));
    if !diff.only_left.is_empty() {
        println!("  only in file 1: {}", diff.only_left.join(", "));
    }
    if !diff.only_right.is_empty() {
        println!("  only in file 2: {}", diff.only_right.join(", "));
    }
    println!();
    println!("Common rows:          {}", counts.common);
    println!("Unique rows (file 1): {}", counts.unique_a);
    println!("Unique rows (file 2): {}", counts.unique_b);
}

fn cmd_create_job(output: &Path) -> sheetcmp_core::Result<()> {
    let job = CompareJob::template();

    job.save(output)?;
    println!("Created job file: {}", output.display());
    println!();
    println!("Edit the file to point at your inputs, then run:");
    println!("  sheetcmp run --job {}", output.display());

    Ok(())
}

fn cmd_create_batch(
    output: &Path,
    left_root: PathBuf,
    right_root: PathBuf,
    export_dir: PathBuf,
) -> sheetcmp_core::Result<()> {
    let batch = BatchJob {
        left_root,
        right_root,
        output_dir: export_dir,
        normalize: NormalizeOptions::default(),
        right_to_left: true,
    };

    batch.save(output)?;
    println!("Created batch file: {}", output.display());
    println!();
    println!("Edit the file to configure your batch, then run:");
    println!("  sheetcmp batch --job {}", output.display());

    Ok(())
}

fn cmd_batch(batch_path: &Path) -> sheetcmp_core::Result<()> {
    let batch = BatchJob::load(batch_path)?;
    let scan = pair_directories(&batch.left_root, &batch.right_root)?;

    println!(
        "Comparing {} file pairs from {} and {}",
        scan.pairs.len(),
        batch.left_root.display(),
        batch.right_root.display()
    );
    println!("Output: {}", batch.output_dir.display());
    println!();

    fs::create_dir_all(&batch.output_dir)?;
    let history_path = batch.output_dir.join("history.json");
    let mut history = ReportLog::load(&history_path)?;

    let mut matched = 0;
    let mut errors = Vec::new();

    for pair in &scan.pairs {
        let output = batch.output_dir.join(format!("{}.xlsx", pair.key));
        let mut job = CompareJob::new(&pair.left, &pair.right);
        job.normalize = batch.normalize;
        job.right_to_left = batch.right_to_left;

        match compare_pair(&job, &output) {
            Ok(report) => {
                println!(
                    "  {}: {} common, {} / {} unique",
                    pair.key, report.counts.common, report.counts.unique_a, report.counts.unique_b
                );
                if report.is_match() {
                    matched += 1;
                }
                history.add(report);
            }
            Err(e) => errors.push((pair.key.clone(), e.to_string())),
        }
    }

    history.save(&history_path)?;

    println!();
    println!("Batch complete:");
    println!("  {} of {} pairs identical", matched, scan.pairs.len());

    if !scan.left_only.is_empty() || !scan.right_only.is_empty() {
        println!("\nUnpaired files:");
        for path in scan.left_only.iter().chain(&scan.right_only) {
            println!("  {}", path.display());
        }
    }

    if !scan.ambiguous.is_empty() {
        println!("\nSkipped (same name as another file):");
        for path in &scan.ambiguous {
            println!("  {}", path.display());
        }
    }

    if !errors.is_empty() {
        println!("\nErrors ({}):", errors.len());
        for (key, err) in &errors {
            println!("  {}: {}", key, err);
        }
    }

    Ok(())
}

fn compare_pair(job: &CompareJob, output: &Path) -> sheetcmp_core::Result<RunReport> {
    let mut session = Session::new(job.normalize);
    session.load(Side::Left, &job.left, &job.left_options())?;
    session.load(Side::Right, &job.right, &job.right_options())?;

    let report = match session.reconcile()? {
        Some(bundle) => RunReport::from_bundle(bundle, &job.normalize),
        None => return Err(sheetcmp_core::Error::NoData(job.left.clone())),
    };

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    session.export_workbook(output, &job.export_options())?;
    Ok(report)
}
