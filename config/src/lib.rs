use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// numeric values
pub const MIN_THREADS: usize = 1;
pub const TOPIC_OFFSET: usize = 1; // Topic labels are 1-indexed, columns are 0-indexed

// artifact suffixes
pub const LABELS: &str = "labels.npy";
pub const REGIONS: &str = "regions.txt";
pub const SEQS: &str = "seqs.txt";

// naming conventions
pub const TOPIC_PREFIX: &str = "Topic";
pub const REGION_NEEDLE: &str = "chr";
pub const AMBIGUOUS_BASE: u8 = b'N';

// held-out chromosomes for splitting
pub const TEST_CHROM: &str = "chr2";
pub const VAL_CHROM: &str = "chr3";

// split names
pub const TRAIN: &str = "train";
pub const TEST: &str = "test";
pub const VAL: &str = "val";

// os
#[cfg(not(windows))]
const TICK_SETTINGS: (&str, u64) = ("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ", 80);
#[cfg(windows)]
const TICK_SETTINGS: (&str, u64) = (r"+-x| ", 200);

/// return a pre-configured progress bar
pub fn get_progress_bar(length: u64, msg: &str) -> ProgressBar {
    let progressbar_style = ProgressStyle::default_spinner()
        .tick_chars(TICK_SETTINGS.0)
        .template(" {spinner} {msg:<30} {wide_bar} ETA {eta_precise} ")
        .expect("no template error");

    let progress_bar = ProgressBar::new(length);

    progress_bar.set_style(progressbar_style);
    progress_bar.enable_steady_tick(Duration::from_millis(TICK_SETTINGS.1));
    progress_bar.set_message(msg.to_owned());

    progress_bar
}

/// A genomic interval parsed from a region identifier.
///
/// Region ids come from the topic model as `chrom:start-end` or
/// `chrom-start-end`; coordinates are 0-based half-open and passed
/// through untouched.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Region {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
}

impl Region {
    pub fn parse(id: &str) -> Result<Region, &'static str> {
        if id.is_empty() {
            return Err("Empty region id");
        }

        // normalize the chrom separator, then split from the right so
        // chrom names carrying '-' or '_' stay intact
        let id = id.replacen(':', "-", 1);
        let mut fields = id.rsplitn(3, '-');
        let get = |field: &str| field.parse::<u64>().map_err(|_| "Cannot parse coordinate");

        let end = get(fields.next().ok_or("Cannot parse end")?)?;
        let start = get(fields.next().ok_or("Cannot parse start")?)?;
        let chrom = fields.next().ok_or("Cannot parse chrom")?;

        if start >= end {
            return Err("Region start is not below end");
        }

        Ok(Region {
            chrom: chrom.to_string(),
            start,
            end,
        })
    }

    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}-{}", self.chrom, self.start, self.end)
    }
}

/// write a collection of lines to a file
pub fn write_lines<T: AsRef<str>>(data: &[T], fname: &PathBuf) {
    log::info!("Records in {:?}: {}. Writing...", fname, data.len());
    let f = match File::create(fname) {
        Ok(f) => f,
        Err(e) => panic!("Error creating file: {}", e),
    };
    let mut writer = BufWriter::new(f);

    for line in data.iter() {
        writeln!(writer, "{}", line.as_ref()).unwrap_or_else(|e| {
            panic!("Error writing to file: {}", e);
        });
    }
}

/// read a file into a collection of lines
pub fn read_lines(fname: &PathBuf) -> Result<Vec<String>, CliError> {
    let f = File::open(fname)?;
    let reader = BufReader::new(f);

    reader
        .lines()
        .map(|line| line.map_err(CliError::IoError))
        .collect()
}

/// argument checker for all subcommands
pub trait ArgCheck {
    fn check(&self) -> Result<(), CliError> {
        self.validate_args()
    }

    fn validate_args(&self) -> Result<(), CliError> {
        let inputs = self.get_inputs();

        if inputs.is_empty() {
            let err = "No input files provided".to_string();
            return Err(CliError::InvalidInput(err));
        }
        for (input, exts) in inputs {
            validate(&input, exts)?;
        }

        Ok(())
    }

    /// input paths paired with their accepted extensions
    fn get_inputs(&self) -> Vec<(PathBuf, &'static [&'static str])>;
}

/// error handling for CLI
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// argument validation
pub fn validate(arg: &PathBuf, exts: &[&str]) -> Result<(), CliError> {
    if !arg.exists() {
        return Err(CliError::InvalidInput(format!("{:?} does not exist", arg)));
    }

    if !arg.is_file() {
        return Err(CliError::InvalidInput(format!("{:?} is not a file", arg)));
    }

    match arg.extension() {
        Some(ext) if exts.iter().any(|e| ext == *e) => (),
        _ => {
            return Err(CliError::InvalidInput(format!(
                "file {:?} is not one of {:?}",
                arg, exts
            )))
        }
    }

    match std::fs::metadata(arg) {
        Ok(metadata) if metadata.len() == 0 => {
            Err(CliError::InvalidInput(format!("file {:?} is empty", arg)))
        }
        Ok(_) => Ok(()),
        Err(e) => Err(CliError::IoError(e)),
    }
}
