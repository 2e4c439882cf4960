use clap::Parser;
use config::{ArgCheck, CliError, LABELS, REGIONS, SEQS, TEST_CHROM, VAL_CHROM};
use std::path::PathBuf;

#[derive(Debug, Parser)]
pub struct Args {
    #[arg(
        short = 'd',
        long = "dataset",
        required = true,
        value_name = "NAME",
        help = "Dataset name prefix of the aligned artifacts"
    )]
    pub dataset: String,

    #[arg(
        short = 'i',
        long = "datadir",
        required = true,
        value_name = "PATH",
        help = "Directory holding <dataset>.{regions.txt,seqs.txt,labels.npy}"
    )]
    pub datadir: PathBuf,

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
        long = "test-chrom",
        required = false,
        value_name = "CHROM",
        help = "Chromosome held out as the test set",
        default_value(TEST_CHROM)
    )]
    pub test_chrom: String,

    #[arg(
        long = "val-chrom",
        required = false,
        value_name = "CHROM",
        help = "Chromosome held out of train as the validation set",
        default_value(VAL_CHROM)
    )]
    pub val_chrom: String,
}

impl Args {
    pub fn from(args: Vec<String>) -> Self {
        let mut full_args = vec![env!("CARGO_PKG_NAME").to_string()];
        full_args.extend(args);

        Args::parse_from(full_args)
    }

    /// The three aligned artifact paths for this dataset
    pub fn artifacts(&self) -> (PathBuf, PathBuf, PathBuf) {
        (
            self.datadir.join(format!("{}.{}", self.dataset, REGIONS)),
            self.datadir.join(format!("{}.{}", self.dataset, SEQS)),
            self.datadir.join(format!("{}.{}", self.dataset, LABELS)),
        )
    }
}

impl ArgCheck for Args {
    fn validate_args(&self) -> Result<(), CliError> {
        if self.test_chrom == self.val_chrom {
            return Err(CliError::InvalidInput(format!(
                "test and validation chromosomes are both {}",
                self.test_chrom
            )));
        }

        for (input, exts) in self.get_inputs() {
            config::validate(&input, exts)?;
        }

        Ok(())
    }

    fn get_inputs(&self) -> Vec<(PathBuf, &'static [&'static str])> {
        let (regions, seqs, labels) = self.artifacts();

        vec![(regions, &["txt"]), (seqs, &["txt"]), (labels, &["npy"])]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_rejects_equal_holdout_chroms() {
        let args = Args::from(vec![
            "--dataset".to_string(),
            "melanoma".to_string(),
            "--datadir".to_string(),
            ".".to_string(),
            "--test-chrom".to_string(),
            "chr2".to_string(),
            "--val-chrom".to_string(),
            "chr2".to_string(),
        ]);

        assert!(args.check().is_err());
    }

    #[test]
    fn test_artifact_paths_carry_dataset_prefix() {
        let args = Args::from(vec![
            "--dataset".to_string(),
            "melanoma".to_string(),
            "--datadir".to_string(),
            "data".to_string(),
        ]);

        let (regions, seqs, labels) = args.artifacts();

        assert_eq!(regions, PathBuf::from("data/melanoma.regions.txt"));
        assert_eq!(seqs, PathBuf::from("data/melanoma.seqs.txt"));
        assert_eq!(labels, PathBuf::from("data/melanoma.labels.npy"));
    }
}
