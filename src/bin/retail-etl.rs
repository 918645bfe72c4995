//! retail-etl CLI: run configured ETL jobs or clean a single file.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use retail_etl::cleaning::{rules_for, CardNumberCheck, CleaningOptions, DatasetKind};
use retail_etl::config::EtlConfig;
use retail_etl::etl::{EtlJob, JobReport, Orchestrator};
use retail_etl::ingestion::FileSource;
use retail_etl::loading::CsvDirSink;
use retail_etl::observability::StdErrObserver;
use retail_etl::EtlResult;

/// Extract, clean and load retail datasets
#[derive(Parser)]
#[command(name = "retail-etl")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log every cleaning step with its dropped row count
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the jobs described in a YAML config file
    Run {
        /// Path to the config file
        #[arg(short, long, value_name = "FILE")]
        config: PathBuf,

        /// Run jobs concurrently
        #[arg(long)]
        parallel: bool,

        /// Only run jobs of these kinds (repeatable)
        #[arg(long, value_name = "KIND")]
        only: Vec<DatasetKind>,
    },

    /// Clean one CSV/JSON file and write the result as CSV
    Clean {
        /// Dataset kind (users, card_details, store_details, product_details, orders, events)
        #[arg(short, long)]
        kind: DatasetKind,

        /// Input file (.csv, .json or .ndjson)
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Directory the cleaned table is written to
        #[arg(short, long, value_name = "DIR")]
        output_dir: PathBuf,

        /// Table name (default: the kind's target table)
        #[arg(short, long)]
        table: Option<String>,

        /// Drop card numbers that are not all digits instead of those that are
        #[arg(long)]
        reject_non_numeric_cards: bool,
    },

    /// List dataset kinds with their source and target names
    Kinds,

    /// List the tables of a Postgres database, per schema
    #[cfg(feature = "postgres")]
    Tables {
        /// Credentials file (RDS_HOST, RDS_PORT, RDS_DATABASE, RDS_USER, RDS_PASSWORD)
        #[arg(short, long, value_name = "FILE")]
        credentials: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            config,
            parallel,
            only,
        } => run(config, parallel, only, cli.verbose),

        Commands::Clean {
            kind,
            input,
            output_dir,
            table,
            reject_non_numeric_cards,
        } => clean(kind, input, output_dir, table, reject_non_numeric_cards, cli.verbose),

        Commands::Kinds => {
            kinds();
            Ok(())
        }

        #[cfg(feature = "postgres")]
        Commands::Tables { credentials } => tables(credentials),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(config: PathBuf, parallel: bool, only: Vec<DatasetKind>, verbose: bool) -> EtlResult<()> {
    let mut config = EtlConfig::from_path(&config)?;
    config.retain_kinds(&only);

    let jobs = config.build_jobs()?;
    let options = config.cleaning_options(Some(config.observer(verbose)));
    let orchestrator = Orchestrator::new(config.sink()?, options);

    let reports = if parallel {
        orchestrator.run_all_parallel(&jobs)?
    } else {
        orchestrator.run_all(&jobs)?
    };
    print_reports(&reports);
    Ok(())
}

fn clean(
    kind: DatasetKind,
    input: PathBuf,
    output_dir: PathBuf,
    table: Option<String>,
    reject_non_numeric_cards: bool,
    verbose: bool,
) -> EtlResult<()> {
    let mut job = EtlJob::new(kind, FileSource::new(&input));
    if let Some(table) = table {
        job = job.with_table(table);
    }

    let options = CleaningOptions {
        card_number_check: if reject_non_numeric_cards {
            CardNumberCheck::RejectNonNumeric
        } else {
            CardNumberCheck::default()
        },
        observer: Some(Arc::new(StdErrObserver { verbose })),
        ..Default::default()
    };
    let sink = CsvDirSink::new(&output_dir);
    let report = Orchestrator::new(Arc::new(sink.clone()), options).run_job(&job)?;
    print_reports(std::slice::from_ref(&report));
    println!("wrote {}", sink.table_path(&report.table).display());
    Ok(())
}

fn kinds() {
    println!("{:<16} {:<14} {:<18} columns", "kind", "source", "table");
    for kind in DatasetKind::ALL {
        println!(
            "{:<16} {:<14} {:<18} {}",
            kind.as_str(),
            kind.source_name(),
            kind.target_table(),
            rules_for(kind).columns.len()
        );
    }
}

#[cfg(feature = "postgres")]
fn tables(credentials: PathBuf) -> EtlResult<()> {
    use retail_etl::database::{DbCredentials, PgClient};

    let client = PgClient::connect(&DbCredentials::from_path(&credentials)?)?;
    for (schema, tables) in client.list_tables()? {
        println!("schema: {schema}");
        for table in tables {
            println!("  {table}");
        }
    }
    Ok(())
}

fn print_reports(reports: &[JobReport]) {
    for r in reports {
        println!(
            "{:<16} -> {:<18} extracted={} loaded={} dropped={}",
            r.kind.as_str(),
            r.table,
            r.rows_extracted,
            r.rows_loaded,
            r.rows_dropped()
        );
    }
}
