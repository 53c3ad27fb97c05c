use clap::Parser;
use itertools::Itertools;
use kwiz::bank::{LoadOptions, QuestionBank, SizeRule};
use std::path::PathBuf;
use std::process::ExitCode;

const DEFAULT_EXACT_COUNT: usize = 200;

/// check a question bank before shipping it
#[derive(Parser, Debug)]
#[clap(version, about)]
struct Args {
    /// question bank JSON file
    path: PathBuf,

    /// required number of questions
    #[clap(long, conflicts_with = "min_count")]
    exact_count: Option<usize>,

    /// accept any bank with at least this many questions
    #[clap(long)]
    min_count: Option<usize>,

    /// synthesize missing ids instead of rejecting the record
    #[clap(long)]
    allow_missing_ids: bool,
}

impl Args {
    fn load_options(&self) -> LoadOptions {
        let size = match (self.exact_count, self.min_count) {
            (Some(n), _) => SizeRule::Exact(n),
            (None, Some(n)) => SizeRule::AtLeast(n),
            (None, None) => SizeRule::Exact(DEFAULT_EXACT_COUNT),
        };
        LoadOptions {
            size,
            require_ids: !self.allow_missing_ids,
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    match QuestionBank::from_path(&args.path, args.load_options()) {
        Ok(bank) => {
            let breakdown = bank
                .difficulty_counts()
                .into_iter()
                .map(|(difficulty, n)| format!("{difficulty} {n}"))
                .join(", ");
            println!("OK: {} questions valid, ids unique, explanations present.", bank.size());
            println!("    {breakdown}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
