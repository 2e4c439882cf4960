//! Core module for converting binarized topic-region assignments
//! into aligned sequence/label training artifacts
//!
//! In short, the per-topic region selections of an upstream topic
//! model are inverted into a region -> topics membership map, turned
//! into a dense region x topic 0/1 matrix over the full region
//! universe, cross-validated against the non-topic complement, and
//! finally zipped with reference-genome sequences. Regions carrying
//! ambiguous bases are dropped from all three artifacts in lockstep
//! before anything is written. Any invariant violation aborts the
//! run: a broken matrix must never reach a training set.

use anyhow::{bail, Context, Result};
use dashmap::DashMap;
use hashbrown::{HashMap, HashSet};
use log::{info, warn};
use ndarray::{Array2, Axis};
use rayon::prelude::*;

use config::{get_progress_bar, Region, AMBIGUOUS_BASE, TOPIC_OFFSET};

use crate::cli::Args;
use crate::utils::{get_sequences, read_topics, read_universe, save_artifacts};

/// Per-region topic membership, inverted from the topic model's
/// per-topic region selections.
///
/// # Fields
///
/// * `topic_regions`: set-union of all region ids across topics
/// * `map`: region id -> topic numbers it belongs to, ascending
/// * `occurrences`: flat (region, topic) list with duplicates kept,
///   used for the total-count invariant
#[derive(Debug, Default)]
pub struct Membership {
    pub topic_regions: HashSet<String>,
    pub map: HashMap<String, Vec<usize>>,
    pub occurrences: Vec<(String, usize)>,
}

/// Converts a topic model's binarized output into aligned
/// (regions, sequences, labels) artifacts
///
/// # Arguments
///
/// * `args` - The command line arguments
///
/// # Returns
///
/// * `Result<()>` - The result of the operation
///
/// # Example
///
/// ```rust, no_run
/// use topic_binarize::{cli::Args, core::binarize};
///
/// let args = Args::from(vec![
///     "--topics".to_string(),
///     "topics.json".to_string(),
///     "--universe".to_string(),
///     "regions.txt".to_string(),
///     "--twobit".to_string(),
///     "hg38.2bit".to_string(),
///     "--dataset".to_string(),
///     "melanoma".to_string(),
/// ]);
///
/// binarize(args).unwrap();
/// ```
pub fn binarize(args: Args) -> Result<()> {
    info!("Loading topic regions...");
    let topics = read_topics(&args.topics)?;
    if topics.is_empty() {
        bail!("ERROR: No topics found in {:?}", args.topics);
    }

    let universe = read_universe(&args.universe)?;
    if universe.is_empty() {
        bail!("ERROR: No regions found in {:?}", args.universe);
    }

    // topics are sorted ascending, so the last label is the highest
    let num_topics = args
        .num_topics
        .unwrap_or_else(|| topics.last().map(|(num, _)| *num).unwrap_or_default());

    info!(
        "Universe of {} regions over {} topics",
        universe.len(),
        num_topics
    );

    let membership = resolve_membership(&topics);
    let non_topic = nontopic_regions(&universe, &membership.topic_regions);

    info!(
        "Topic regions: {}, non-topic regions: {}",
        membership.topic_regions.len(),
        non_topic.len()
    );

    let matrix = build_matrix(&universe, &membership.map, num_topics)?;

    info!("Checking binarized matrix...");
    check_binarization(&topics, &matrix, &universe, &non_topic, &membership)?;

    info!("Reading genome from {:?}...", args.twobit);
    let genome = get_sequences(&args.twobit)?;
    let seqs = extract_sequences(&universe, &genome)?;

    let (regions, seqs, labels) = filter_ambiguous(universe, seqs, matrix);

    save_artifacts(&args.outdir, &args.dataset, &regions, &seqs, &labels)?;
    info!(
        "Wrote {} aligned regions x {} topics to {:?}",
        regions.len(),
        labels.ncols(),
        args.outdir
    );

    Ok(())
}

/// Inverts per-topic region selections into per-region topic memberships
///
/// # Arguments
///
/// * `topics` - (topic number, selected region ids) pairs, ascending
///
/// # Returns
///
/// * `Membership` - the inverted map plus the flat occurrence list
///
/// # Example
///
/// ```rust, no_run
/// use topic_binarize::core::resolve_membership;
///
/// let topics = vec![(1, vec!["chr1:0-10".to_string()])];
/// let membership = resolve_membership(&topics);
///
/// assert_eq!(membership.map["chr1:0-10"], vec![1]);
/// ```
pub fn resolve_membership(topics: &[(usize, Vec<String>)]) -> Membership {
    let mut membership = Membership::default();

    for (topic, regions) in topics {
        for region in regions {
            membership.topic_regions.insert(region.clone());
            membership
                .map
                .entry(region.clone())
                .or_default()
                .push(*topic);
            membership.occurrences.push((region.clone(), *topic));
        }
    }

    membership
}

/// Regions of the universe that no topic selected
pub fn nontopic_regions(universe: &[String], topic_regions: &HashSet<String>) -> HashSet<String> {
    universe
        .iter()
        .filter(|region| !topic_regions.contains(region.as_str()))
        .cloned()
        .collect()
}

/// Builds the dense region x topic 0/1 matrix
///
/// Row order is exactly the caller-supplied universe order; it is
/// later re-zipped with sequence extraction by position. Topic labels
/// are 1-indexed while columns are 0-indexed: column = label - 1.
///
/// # Arguments
///
/// * `universe` - all model-scored region ids, in canonical order
/// * `map` - region id -> topic numbers from [resolve_membership]
/// * `num_topics` - the model's topic count N
///
/// # Returns
///
/// * `Result<Array2<u8>>` - matrix of shape (|universe|, N)
pub fn build_matrix(
    universe: &[String],
    map: &HashMap<String, Vec<usize>>,
    num_topics: usize,
) -> Result<Array2<u8>> {
    let mut matrix = Array2::<u8>::zeros((universe.len(), num_topics));

    for (i, region) in universe.iter().enumerate() {
        // regions absent from the map are non-topic: the row stays zero
        if let Some(topics) = map.get(region.as_str()) {
            for topic in topics {
                if *topic < TOPIC_OFFSET || *topic > num_topics {
                    bail!(
                        "ERROR: Topic{} assigned to {} is outside 1..={}",
                        topic,
                        region,
                        num_topics
                    );
                }
                matrix[[i, topic - TOPIC_OFFSET]] = 1;
            }
        }
    }

    Ok(matrix)
}

/// Cross-validates the resolver output against the matrix and the
/// non-topic complement
///
/// A violation means an upstream resolver/builder bug, not data noise,
/// so each check is fatal and names the offending topic or region.
///
/// # Arguments
///
/// * `topics` - the raw (topic number, region ids) input pairs
/// * `matrix` - the binarized matrix from [build_matrix]
/// * `universe` - all region ids, in matrix row order
/// * `non_topic` - the complement set from [nontopic_regions]
/// * `membership` - the resolver output
///
/// # Returns
///
/// * `Result<()>` - Ok only if all four invariants hold
pub fn check_binarization(
    topics: &[(usize, Vec<String>)],
    matrix: &Array2<u8>,
    universe: &[String],
    non_topic: &HashSet<String>,
    membership: &Membership,
) -> Result<()> {
    // 1. no non-topic region appears in any topic's selection
    for (topic, regions) in topics {
        if let Some(region) = regions.iter().find(|r| non_topic.contains(r.as_str())) {
            bail!(
                "ERROR: Topic{} contains non-topic region {}",
                topic,
                region
            );
        }
    }

    // 2. per-topic input cardinality == column sum
    for (topic, regions) in topics {
        if *topic < TOPIC_OFFSET || *topic > matrix.ncols() {
            bail!(
                "ERROR: Topic{} is outside the matrix's {} columns",
                topic,
                matrix.ncols()
            );
        }

        let col_sum: usize = matrix
            .column(topic - TOPIC_OFFSET)
            .iter()
            .map(|&v| v as usize)
            .sum();

        if regions.len() != col_sum {
            bail!(
                "ERROR: Topic{} has {} selected regions but column sum is {}",
                topic,
                regions.len(),
                col_sum
            );
        }
    }

    // 3. row sum == 0 <=> region is non-topic, both directions
    for (region, row) in universe.iter().zip(matrix.rows()) {
        let row_sum: usize = row.iter().map(|&v| v as usize).sum();

        match (row_sum == 0, non_topic.contains(region.as_str())) {
            (true, false) => bail!(
                "ERROR: {} has an all-zero row but is not a non-topic region",
                region
            ),
            (false, true) => bail!(
                "ERROR: non-topic region {} has a non-zero row",
                region
            ),
            _ => {}
        }
    }

    // 4. total 1-entries == total (region, topic) occurrences
    let total: usize = matrix.iter().map(|&v| v as usize).sum();
    if total != membership.occurrences.len() {
        bail!(
            "ERROR: matrix has {} ones but input has {} (region, topic) pairs",
            total,
            membership.occurrences.len()
        );
    }

    Ok(())
}

/// Extracts the DNA sequence for every universe region from the
/// in-memory genome map, in universe order
///
/// # Arguments
///
/// * `universe` - region ids in canonical order
/// * `genome` - chromosome -> sequence map from the .2bit reference
///
/// # Returns
///
/// * `Result<Vec<String>>` - one sequence per region, aligned by position
pub fn extract_sequences(
    universe: &[String],
    genome: &DashMap<String, Vec<u8>>,
) -> Result<Vec<String>> {
    let pb = get_progress_bar(universe.len() as u64, "Extracting sequences...");

    let seqs = universe
        .par_iter()
        .map(|id| {
            let region = Region::parse(id)
                .map_err(|e| anyhow::anyhow!("ERROR: Cannot parse region {}: {}", id, e))?;

            let chrom = genome.get(&region.chrom).with_context(|| {
                format!("ERROR: Chromosome {} not found in genome", region.chrom)
            })?;

            if region.end as usize > chrom.len() {
                bail!(
                    "ERROR: Region {} exceeds {} length ({})",
                    region,
                    region.chrom,
                    chrom.len()
                );
            }

            let seq = chrom[region.start as usize..region.end as usize].to_vec();
            pb.inc(1);

            String::from_utf8(seq).with_context(|| format!("ERROR: Non-ASCII sequence in {}", id))
        })
        .collect::<Result<Vec<_>>>()?;

    pb.finish_and_clear();

    Ok(seqs)
}

/// Drops regions whose sequence carries an ambiguous base from all
/// three artifacts in lockstep, preserving relative order
pub fn filter_ambiguous(
    regions: Vec<String>,
    seqs: Vec<String>,
    labels: Array2<u8>,
) -> (Vec<String>, Vec<String>, Array2<u8>) {
    let keep = seqs
        .iter()
        .enumerate()
        .filter(|(_, seq)| !seq.as_bytes().contains(&AMBIGUOUS_BASE))
        .map(|(i, _)| i)
        .collect::<Vec<_>>();

    let removed = seqs.len() - keep.len();
    if removed > 0 {
        warn!("Removed {} sequences with ambiguous bases", removed);
    }

    let labels = labels.select(Axis(0), &keep);
    let mask = {
        let mut mask = vec![false; seqs.len()];
        keep.iter().for_each(|&i| mask[i] = true);
        mask
    };

    let regions = regions
        .into_iter()
        .zip(&mask)
        .filter_map(|(region, &keep)| keep.then_some(region))
        .collect();
    let seqs = seqs
        .into_iter()
        .zip(&mask)
        .filter_map(|(seq, &keep)| keep.then_some(seq))
        .collect();

    (regions, seqs, labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn worked_example() -> (Vec<(usize, Vec<String>)>, Vec<String>) {
        let topics = vec![
            (1, vec!["A".to_string(), "B".to_string()]),
            (2, vec!["B".to_string(), "C".to_string()]),
        ];
        let universe = vec![
            "A".to_string(),
            "B".to_string(),
            "C".to_string(),
            "D".to_string(),
        ];

        (topics, universe)
    }

    #[test]
    fn test_resolve_membership() {
        let (topics, _) = worked_example();
        let membership = resolve_membership(&topics);

        assert_eq!(membership.map["A"], vec![1]);
        assert_eq!(membership.map["B"], vec![1, 2]);
        assert_eq!(membership.map["C"], vec![2]);
        assert!(!membership.map.contains_key("D"));
        assert_eq!(membership.topic_regions.len(), 3);
        assert_eq!(membership.occurrences.len(), 4);
    }

    #[test]
    fn test_nontopic_regions_is_complement() {
        let (topics, universe) = worked_example();
        let membership = resolve_membership(&topics);
        let non_topic = nontopic_regions(&universe, &membership.topic_regions);

        assert_eq!(non_topic.len(), 1);
        assert!(non_topic.contains("D"));
    }

    #[test]
    fn test_build_matrix() {
        let (topics, universe) = worked_example();
        let membership = resolve_membership(&topics);
        let matrix = build_matrix(&universe, &membership.map, 2).unwrap();

        assert_eq!(
            matrix,
            array![[1, 0], [1, 1], [0, 1], [0, 0]]
        );
    }

    #[test]
    fn test_column_is_label_minus_one() {
        let topics = vec![(3, vec!["A".to_string()])];
        let universe = vec!["A".to_string()];
        let membership = resolve_membership(&topics);
        let matrix = build_matrix(&universe, &membership.map, 3).unwrap();

        assert_eq!(matrix, array![[0, 0, 1]]);
    }

    #[test]
    fn test_build_matrix_rejects_out_of_range_label() {
        let topics = vec![(5, vec!["A".to_string()])];
        let universe = vec!["A".to_string()];
        let membership = resolve_membership(&topics);

        assert!(build_matrix(&universe, &membership.map, 2).is_err());
    }

    #[test]
    fn test_check_binarization_passes_worked_example() {
        let (topics, universe) = worked_example();
        let membership = resolve_membership(&topics);
        let non_topic = nontopic_regions(&universe, &membership.topic_regions);
        let matrix = build_matrix(&universe, &membership.map, 2).unwrap();

        assert!(
            check_binarization(&topics, &matrix, &universe, &non_topic, &membership).is_ok()
        );
    }

    #[test]
    fn test_check_binarization_catches_tampered_matrix() {
        let (topics, universe) = worked_example();
        let membership = resolve_membership(&topics);
        let non_topic = nontopic_regions(&universe, &membership.topic_regions);
        let mut matrix = build_matrix(&universe, &membership.map, 2).unwrap();

        // flip the non-topic row: the per-topic column sum breaks first
        matrix[[3, 0]] = 1;

        let err = check_binarization(&topics, &matrix, &universe, &non_topic, &membership)
            .unwrap_err()
            .to_string();

        assert!(err.contains("Topic1"));
        assert!(err.contains("column sum"));
    }

    #[test]
    fn test_check_binarization_catches_incomplete_complement() {
        let (topics, universe) = worked_example();
        let membership = resolve_membership(&topics);
        let matrix = build_matrix(&universe, &membership.map, 2).unwrap();

        // a complement that misses D: only the zero-row invariant can catch it
        let non_topic = HashSet::new();

        let err = check_binarization(&topics, &matrix, &universe, &non_topic, &membership)
            .unwrap_err()
            .to_string();

        assert!(err.contains("D"));
        assert!(err.contains("all-zero"));
    }

    #[test]
    fn test_check_binarization_catches_dropped_entry() {
        let (topics, universe) = worked_example();
        let membership = resolve_membership(&topics);
        let non_topic = nontopic_regions(&universe, &membership.topic_regions);
        let mut matrix = build_matrix(&universe, &membership.map, 2).unwrap();

        matrix[[1, 1]] = 0;

        assert!(
            check_binarization(&topics, &matrix, &universe, &non_topic, &membership).is_err()
        );
    }

    #[test]
    fn test_total_ones_with_duplicate_memberships() {
        let (topics, universe) = worked_example();
        let membership = resolve_membership(&topics);
        let matrix = build_matrix(&universe, &membership.map, 2).unwrap();

        let total: usize = matrix.iter().map(|&v| v as usize).sum();

        // B belongs to both topics: 4 ones, matching the flat list
        assert_eq!(total, 4);
        assert_eq!(total, membership.occurrences.len());
    }

    #[test]
    fn test_filter_ambiguous_keeps_lockstep() {
        let regions = vec!["r1".to_string(), "r2".to_string(), "r3".to_string()];
        let seqs = vec!["ACGT".to_string(), "ANGT".to_string(), "GGCC".to_string()];
        let labels = array![[1, 0], [0, 1], [1, 1]];

        let (regions, seqs, labels) = filter_ambiguous(regions, seqs, labels);

        assert_eq!(regions, vec!["r1", "r3"]);
        assert_eq!(seqs, vec!["ACGT", "GGCC"]);
        assert_eq!(labels, array![[1, 0], [1, 1]]);
    }

    #[test]
    fn test_filter_ambiguous_noop_without_n() {
        let regions = vec!["r1".to_string()];
        let seqs = vec!["ACGT".to_string()];
        let labels = array![[1, 0]];

        let (regions, seqs, labels) = filter_ambiguous(regions, seqs, labels);

        assert_eq!(regions.len(), 1);
        assert_eq!(seqs.len(), 1);
        assert_eq!(labels.nrows(), 1);
    }

    #[test]
    fn test_extract_sequences() {
        let genome = DashMap::new();
        genome.insert("chr1".to_string(), b"ACGTACGTAC".to_vec());

        let universe = vec!["chr1:0-4".to_string(), "chr1:4-8".to_string()];
        let seqs = extract_sequences(&universe, &genome).unwrap();

        assert_eq!(seqs, vec!["ACGT", "ACGT"]);
    }

    #[test]
    fn test_extract_sequences_fails_on_missing_chrom() {
        let genome = DashMap::new();
        genome.insert("chr1".to_string(), b"ACGT".to_vec());

        let universe = vec!["chr2:0-2".to_string()];

        assert!(extract_sequences(&universe, &genome).is_err());
    }

    #[test]
    fn test_extract_sequences_fails_out_of_range() {
        let genome = DashMap::new();
        genome.insert("chr1".to_string(), b"ACGT".to_vec());

        let universe = vec!["chr1:2-10".to_string()];

        assert!(extract_sequences(&universe, &genome).is_err());
    }
}
