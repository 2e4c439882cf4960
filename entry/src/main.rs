/// topictools: convert topic-model region assignments into
/// trainable sequence/label datasets
///
/// This is the entry point for the topictools CLI.
/// It is responsible for parsing the CLI arguments
/// and executing the appropriate subcommand [topic-tool].
///
/// This wrapper offers 3 different subcommands:
/// - topic-binarize
/// - topic-split
/// - run
///
/// 'topic-binarize' inverts a topic model's per-topic region
/// selections into a validated region x topic 0/1 matrix and
/// materializes the aligned (regions, sequences, labels) triple
/// from a .2bit reference genome. 'topic-split' partitions those
/// artifacts into train/test/val sets by held-out chromosome.
/// 'run' chains both stages over a single dataset. The shared
/// 'config' submodule holds universal constants and the region
/// identifier type for the whole pipeline.
///
/// To get help on the subcommands, you can run:
///
/// ```shell
/// topictools topic-binarize -- --help
/// ```
///
use clap::{Args, Parser, Subcommand};
use log::{error, info, Level};
use simple_logger::init_with_level;

use topic_binarize::lib_topic_binarize;
use topic_split::lib_topic_split;
use topictools::lib;

const HELP: &str = r#"
Usage: topictools run --topics <PATH> --universe <PATH> --twobit <PATH> --dataset <NAME> --outdir <DIR>

 Options:
  --topics <PATH>             JSON file mapping TopicK -> selected region ids
  --universe <PATH>           File with all model-scored region ids, one per line
  --twobit <PATH>             .2bit reference genome
  --dataset <NAME>            Dataset name used as prefix for output artifacts
  --outdir <DIR>              Output directory for the aligned artifacts
  -h, --help                  Print help
"#;

#[derive(Parser)]
#[command(name = "topictools")]
#[command(about = "topictools: topic-model output to trainable sequence datasets")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(name = "topic-binarize")]
    Binarize(ToolArgs),
    #[command(name = "topic-split")]
    Split(ToolArgs),
    #[command(name = "run")]
    Run(ToolArgs),
}

#[derive(Args)]
struct ToolArgs {
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, help = HELP)]
    args: Vec<String>,
}

fn main() {
    let start = std::time::Instant::now();
    init_with_level(Level::Info).unwrap();

    let cli = Cli::parse();
    init();

    let result = match cli.command {
        Commands::Binarize(args) => lib_topic_binarize(args.args),
        Commands::Split(args) => lib_topic_split(args.args),
        Commands::Run(args) => lib(args.args),
    };

    result.unwrap_or_else(|e| {
        error!("{}", e);
        std::process::exit(1);
    });

    let elapsed = start.elapsed();
    info!("Elapsed time: {:?}", elapsed);
}

fn init() {
    let message = format!(
        r#"

        topictools: topic-model output to trainable sequence datasets

        this is the entry point for the topictools CLI
        and it is responsible for parsing the CLI arguments
        for each topic-tool:

        - topic-binarize
        - topic-split

        > version: {}

        * to get help on the subcommands, run:
            topictools <SUBCOMMAND> -- --help

        "#,
        env!("CARGO_PKG_VERSION")
    );

    println!("{}", message);
}
