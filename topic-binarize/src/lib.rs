//! Core module for binarizing topic-region assignments into
//! aligned sequence/label training artifacts
//!
//! This module inverts a topic model's per-topic region selections
//! into a region x topic 0/1 membership matrix over the full region
//! universe, validates the matrix against the non-topic complement,
//! extracts the DNA sequence of every region from a .2bit reference,
//! and persists the three positionally-aligned artifacts consumed by
//! downstream model training.

use anyhow::Result;

pub mod cli;
pub mod core;
pub mod utils;

pub fn lib_topic_binarize(args: Vec<String>) -> Result<()> {
    let args = cli::Args::from(args);

    crate::core::binarize(args)
}
