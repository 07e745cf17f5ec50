use std::io::Read;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use scout_core::{session::export_csv, CandidatePipeline, CoreConfig, Rubric, ScoringMode};

#[derive(Parser)]
#[command(name = "scout")]
#[command(about = "Offline candidate parsing and scoring (rubric only, no network)")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a raw batch into scored records
    Parse {
        /// File holding the raw batch (`-` for stdin)
        file: PathBuf,
        /// Print CSV instead of a table
        #[arg(long)]
        csv: bool,
        /// Fragment delimiter
        #[arg(long, default_value = scout_core::constants::DEFAULT_DELIMITER)]
        delimiter: String,
        /// Minimum fragment length, in characters after trimming
        #[arg(long, default_value_t = scout_core::constants::DEFAULT_MIN_FRAGMENT_LEN)]
        min_len: usize,
    },
    /// Score a single biography with the keyword rubric
    Score {
        /// Biography text
        text: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Parse {
            file,
            csv,
            delimiter,
            min_len,
        }) => {
            let raw = if file.as_os_str() == "-" {
                let mut raw = String::new();
                std::io::stdin().read_to_string(&mut raw)?;
                raw
            } else {
                std::fs::read_to_string(&file)?
            };

            let defaults = CoreConfig::default();
            let cfg = CoreConfig::new(
                delimiter,
                min_len,
                ScoringMode::Rubric,
                defaults.fallback_score(),
                defaults.generation_timeout(),
                defaults.commit_timeout(),
            )?;
            let pipeline = CandidatePipeline::new(&cfg, None);
            let runtime = tokio::runtime::Builder::new_current_thread().build()?;
            let report = runtime.block_on(pipeline.process_batch(&raw));

            if csv {
                print!("{}", export_csv(&report.records)?);
            } else if report.records.is_empty() {
                println!("No records found.");
            } else {
                for record in &report.records {
                    println!(
                        "Name: {}, Category: {}, Identifier: {}, Score: {} ({})",
                        record.name,
                        record.category,
                        record.identifier,
                        record.score(),
                        record.tier()
                    );
                }
            }
        }
        Some(Commands::Score { text }) => {
            let assessment = Rubric::default().assess(&text);
            println!("{} ({})", assessment.score, assessment.tier);
        }
        None => {
            println!("Use --help for available commands");
        }
    }

    Ok(())
}
