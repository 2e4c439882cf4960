//! Core module for chromosome-held-out splitting of aligned
//! sequence/label artifacts
//!
//! Regions on the test chromosome become the test set, regions on
//! the validation chromosome become the validation set, and every
//! other region is train. The split is positional: the three
//! artifacts stay in lockstep, and held-out chromosomes guarantee
//! no sequence overlap between splits.

use anyhow::{bail, Context, Result};
use log::info;
use ndarray::{Array2, Axis};
use ndarray_npy::ReadNpyExt;

use std::fs::File;

use config::{read_lines, Region};
use topic_binarize::utils::save_artifacts;

use crate::cli::Args;

/// Which split a region lands in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    Train,
    Test,
    Val,
}

impl std::fmt::Display for Split {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Split::Train => write!(f, "{}", config::TRAIN),
            Split::Test => write!(f, "{}", config::TEST),
            Split::Val => write!(f, "{}", config::VAL),
        }
    }
}

/// Splits one dataset's aligned artifacts into train/test/val by
/// held-out chromosome
///
/// # Arguments
///
/// * `args` - The command line arguments
///
/// # Returns
///
/// * `Result<()>` - The result of the operation
pub fn split(args: Args) -> Result<()> {
    let (regions_path, seqs_path, labels_path) = args.artifacts();

    let regions = read_lines(&regions_path)?;
    let seqs = read_lines(&seqs_path)?;
    let labels = Array2::<u8>::read_npy(File::open(&labels_path)?)
        .with_context(|| format!("ERROR: Cannot read {:?}", labels_path))?;

    if regions.len() != seqs.len() || regions.len() != labels.nrows() {
        bail!(
            "ERROR: Misaligned artifacts: {} regions, {} seqs, {} label rows",
            regions.len(),
            seqs.len(),
            labels.nrows()
        );
    }

    let assignments = assign_splits(&regions, &args.test_chrom, &args.val_chrom)?;

    for split in [Split::Train, Split::Test, Split::Val] {
        let keep = assignments
            .iter()
            .enumerate()
            .filter(|(_, s)| **s == split)
            .map(|(i, _)| i)
            .collect::<Vec<_>>();

        info!("{}: {} regions", split, keep.len());

        let sub_regions = take(&regions, &keep);
        let sub_seqs = take(&seqs, &keep);
        let sub_labels = labels.select(Axis(0), &keep);

        save_artifacts(
            &args.outdir,
            &format!("{}.{}", args.dataset, split),
            &sub_regions,
            &sub_seqs,
            &sub_labels,
        )?;
    }

    Ok(())
}

/// Assigns every region to a split by its chromosome
pub fn assign_splits(
    regions: &[String],
    test_chrom: &str,
    val_chrom: &str,
) -> Result<Vec<Split>> {
    regions
        .iter()
        .map(|id| {
            let region = Region::parse(id)
                .map_err(|e| anyhow::anyhow!("ERROR: Cannot parse region {}: {}", id, e))?;

            if region.chrom == test_chrom {
                Ok(Split::Test)
            } else if region.chrom == val_chrom {
                Ok(Split::Val)
            } else {
                Ok(Split::Train)
            }
        })
        .collect()
}

fn take(data: &[String], keep: &[usize]) -> Vec<String> {
    keep.iter().map(|&i| data[i].clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn regions() -> Vec<String> {
        vec![
            "chr1:0-10".to_string(),
            "chr2:0-10".to_string(),
            "chr3:0-10".to_string(),
            "chr1:20-30".to_string(),
        ]
    }

    #[test]
    fn test_assign_splits() {
        let assignments = assign_splits(&regions(), "chr2", "chr3").unwrap();

        assert_eq!(
            assignments,
            vec![Split::Train, Split::Test, Split::Val, Split::Train]
        );
    }

    #[test]
    fn test_assign_splits_rejects_bad_ids() {
        let regions = vec!["not-a-region".to_string()];

        assert!(assign_splits(&regions, "chr2", "chr3").is_err());
    }

    #[test]
    fn test_split_selection_stays_in_lockstep() {
        let regions = regions();
        let labels = array![[1, 0], [0, 1], [1, 1], [0, 0]];
        let assignments = assign_splits(&regions, "chr2", "chr3").unwrap();

        let keep = assignments
            .iter()
            .enumerate()
            .filter(|(_, s)| **s == Split::Train)
            .map(|(i, _)| i)
            .collect::<Vec<_>>();

        let sub_regions = take(&regions, &keep);
        let sub_labels = labels.select(Axis(0), &keep);

        assert_eq!(sub_regions, vec!["chr1:0-10", "chr1:20-30"]);
        assert_eq!(sub_labels, array![[1, 0], [0, 0]]);
    }
}
