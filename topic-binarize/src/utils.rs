use anyhow::{Context, Result};
use dashmap::DashMap;
use ndarray::Array2;
use ndarray_npy::WriteNpyExt;
use serde::Deserialize;
use twobit::TwoBitFile;

use std::collections::HashMap;
use std::fs::{create_dir_all, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use config::{read_lines, write_lines, LABELS, REGIONS, REGION_NEEDLE, SEQS, TOPIC_PREFIX};

/// Parses the numeric part of a 1-indexed `TopicK` label
pub fn parse_topic_label(label: &str) -> Result<usize> {
    let num = label
        .strip_prefix(TOPIC_PREFIX)
        .with_context(|| {
            format!(
                "ERROR: Topic label '{}' does not start with '{}'",
                label, TOPIC_PREFIX
            )
        })?
        .parse::<usize>()
        .with_context(|| format!("ERROR: Cannot parse topic number from '{}'", label))?;

    if num == 0 {
        anyhow::bail!("ERROR: Topic labels are 1-indexed, got '{}'", label);
    }

    Ok(num)
}

/// The topic model's binarized output: TopicK -> selected region ids
#[derive(Debug, Deserialize)]
pub struct TopicRegions(pub HashMap<String, Vec<String>>);

/// Reads the topic model's per-topic selected regions from a JSON file
/// and returns them ordered by ascending topic number.
///
/// The upstream binarization emits `Topic1..TopicN` in order; re-sorting
/// numerically makes the result independent of JSON object key order.
pub fn read_topics(path: &PathBuf) -> Result<Vec<(usize, Vec<String>)>> {
    let f = File::open(path).with_context(|| format!("ERROR: Cannot open {:?}", path))?;
    let raw: TopicRegions = serde_json::from_reader(f)
        .with_context(|| format!("ERROR: Cannot parse topic regions from {:?}", path))?;

    sort_topics(raw.0)
}

pub fn sort_topics(raw: HashMap<String, Vec<String>>) -> Result<Vec<(usize, Vec<String>)>> {
    let mut topics = raw
        .into_iter()
        .map(|(label, regions)| Ok((parse_topic_label(&label)?, regions)))
        .collect::<Result<Vec<_>>>()?;

    topics.sort_by_key(|(num, _)| *num);

    Ok(topics)
}

/// Reads the region universe, one id per line (first TSV column),
/// dropping any row that does not look like a genomic region.
pub fn read_universe(path: &PathBuf) -> Result<Vec<String>> {
    let lines = read_lines(path).with_context(|| format!("ERROR: Cannot read {:?}", path))?;

    Ok(filter_universe(lines))
}

pub fn filter_universe(lines: Vec<String>) -> Vec<String> {
    lines
        .into_iter()
        .filter_map(|line| {
            let id = line.split('\t').next().unwrap_or_default().trim();
            if id.contains(REGION_NEEDLE) {
                Some(id.to_string())
            } else {
                None
            }
        })
        .collect()
}

/// Loads the whole reference genome from a .2bit file into a
/// chromosome -> sequence map
pub fn get_sequences(twobit: &PathBuf) -> Result<DashMap<String, Vec<u8>>> {
    let mut genome = TwoBitFile::open_and_read(twobit)
        .with_context(|| format!("ERROR: Cannot open 2bit file {:?}", twobit))?;

    let sequences = DashMap::new();
    for chr in genome.chrom_names() {
        let seq = genome
            .read_sequence(&chr, ..)
            .with_context(|| format!("ERROR: Could not read {} from .2bit!", chr))?
            .into_bytes();
        sequences.insert(chr, seq);
    }

    Ok(sequences)
}

/// Persists the aligned (regions, seqs, labels) triple under
/// `<outdir>/<dataset>.{regions.txt,seqs.txt,labels.npy}`
pub fn save_artifacts(
    outdir: &Path,
    dataset: &str,
    regions: &[String],
    seqs: &[String],
    labels: &Array2<u8>,
) -> Result<()> {
    create_dir_all(outdir)?;

    let labels_path = outdir.join(format!("{}.{}", dataset, LABELS));
    log::info!("Records in {:?}: {}. Writing...", labels_path, labels.nrows());
    let writer = BufWriter::new(File::create(&labels_path)?);
    labels
        .write_npy(writer)
        .with_context(|| format!("ERROR: Cannot write {:?}", labels_path))?;

    write_lines(regions, &outdir.join(format!("{}.{}", dataset, REGIONS)));
    write_lines(seqs, &outdir.join(format!("{}.{}", dataset, SEQS)));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_topic_label() {
        assert_eq!(parse_topic_label("Topic1").unwrap(), 1);
        assert_eq!(parse_topic_label("Topic42").unwrap(), 42);
    }

    #[test]
    fn test_parse_topic_label_rejects_bad_labels() {
        assert!(parse_topic_label("Topic0").is_err());
        assert!(parse_topic_label("topic1").is_err());
        assert!(parse_topic_label("TopicX").is_err());
        assert!(parse_topic_label("1").is_err());
    }

    #[test]
    fn test_sort_topics_is_numeric() {
        let mut raw = HashMap::new();
        raw.insert("Topic10".to_string(), vec!["chr1:0-10".to_string()]);
        raw.insert("Topic2".to_string(), vec!["chr1:10-20".to_string()]);

        let topics = sort_topics(raw).unwrap();

        assert_eq!(topics[0].0, 2);
        assert_eq!(topics[1].0, 10);
    }

    #[test]
    fn test_filter_universe() {
        let lines = vec![
            "chr1:0-10\t0.3".to_string(),
            "GL000195.1:5-25".to_string(),
            "chr2:40-90".to_string(),
            "".to_string(),
        ];

        let universe = filter_universe(lines);

        assert_eq!(universe, vec!["chr1:0-10", "chr2:40-90"]);
    }
}
