use clap::Parser;
use config::ArgCheck;
use std::path::PathBuf;

#[derive(Debug, Parser)]
pub struct Args {
    #[arg(
        short = 'T',
        long = "topics",
        required = true,
        value_name = "PATH",
        help = "Path to JSON file mapping TopicK -> selected region ids"
    )]
    pub topics: PathBuf,

    #[arg(
        short = 'u',
        long = "universe",
        required = true,
        value_name = "PATH",
        help = "Path to file with all model-scored region ids, one per line"
    )]
    pub universe: PathBuf,

    #[arg(
        short = 'g',
        long = "twobit",
        required = true,
        value_name = "PATH",
        help = "Path to .2bit reference genome"
    )]
    pub twobit: PathBuf,

    #[arg(
        short = 'n',
        long = "num-topics",
        required = false,
        value_name = "N",
        help = "Number of topics in the model [default: highest topic label seen]"
    )]
    pub num_topics: Option<usize>,

    #[arg(
        short = 'd',
        long = "dataset",
        required = true,
        value_name = "NAME",
        help = "Dataset name used as prefix for output artifacts"
    )]
    pub dataset: String,

    #[arg(
        short = 'o',
        long = "outdir",
        required = false,
        value_name = "PATH",
        help = "Output directory path",
        default_value(".")
    )]
    pub outdir: PathBuf,

    #[arg(
        short = 't',
        long = "threads",
        help = "Number of threads",
        value_name = "THREADS",
        default_value_t = num_cpus::get()
    )]
    pub threads: usize,
}

impl Args {
    pub fn from(args: Vec<String>) -> Self {
        let mut full_args = vec![env!("CARGO_PKG_NAME").to_string()];
        full_args.extend(args);

        Args::parse_from(full_args)
    }
}

impl ArgCheck for Args {
    fn get_inputs(&self) -> Vec<(PathBuf, &'static [&'static str])> {
        vec![
            (self.topics.clone(), &["json"]),
            (self.universe.clone(), &["txt", "tsv"]),
            (self.twobit.clone(), &["2bit"]),
        ]
    }
}
