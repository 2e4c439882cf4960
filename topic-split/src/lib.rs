//! Core module for splitting aligned sequence/label artifacts
//! into train/test/val sets by held-out chromosome
//!
//! In short, the module reads the three positionally-aligned
//! artifacts written by topic-binarize, assigns every region to a
//! split based on its chromosome, and writes one aligned triple per
//! split. Held-out chromosomes keep test and validation sequences
//! disjoint from training.

use anyhow::Result;

pub mod cli;
pub mod core;

pub fn lib_topic_split(args: Vec<String>) -> Result<()> {
    let args = cli::Args::from(args);

    crate::core::split(args)
}
