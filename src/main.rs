use std::io::Read;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use essay_lens::{analyze, simulate, AnalyzeOptions, EssayType, RubricConfig};

#[derive(Parser)]
#[command(
    name = "essay-lens",
    about = "Score narrative essays against a multi-dimensional rubric",
    version
)]
struct Cli {
    /// File paths to analyze (reads stdin if none provided)
    files: Vec<String>,

    /// Rubric weight table to use
    #[arg(long, default_value = "personal-statement")]
    essay_type: EssayType,

    /// Word limit; exceeding it only attaches an over-length flag
    #[arg(long)]
    max_words: Option<usize>,

    /// Also print the delta-index simulation, ranked by marginal gain
    #[arg(long)]
    simulate: bool,
}

fn report_text(text: &str, cli: &Cli) {
    let options = AnalyzeOptions {
        max_words: cli.max_words,
        essay_type: cli.essay_type,
    };
    let report = analyze(text, &options);
    println!("{}", serde_json::to_string_pretty(&report).unwrap());
    if cli.simulate {
        let config = RubricConfig::for_essay_type(options.essay_type);
        let results = simulate(&report, config);
        println!("{}", serde_json::to_string_pretty(&results).unwrap());
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.files.is_empty() {
        let mut input = String::new();
        std::io::stdin()
            .read_to_string(&mut input)
            .expect("Failed to read stdin");
        report_text(&input, &cli);
    } else {
        for path in &cli.files {
            let text = std::fs::read_to_string(path).unwrap_or_else(|e| {
                eprintln!("Error reading {path}: {e}");
                std::process::exit(1);
            });
            report_text(&text, &cli);
        }
    }
}
