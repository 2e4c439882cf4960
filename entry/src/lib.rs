use anyhow::Result;

use topic_binarize::lib_topic_binarize;
use topic_split::lib_topic_split;

const KEYS: [&str; 5] = ["--topics", "--universe", "--twobit", "--dataset", "--outdir"];

/// Runs the whole dataset-preparation pipeline: binarize the topic
/// assignments into aligned artifacts, then split them by held-out
/// chromosome
///
/// # Arguments
///
/// * `args` - A vector of strings representing the command line arguments
///
/// # Returns
///
/// * `Result<()>` - The result of the operation
///
/// # Example
///
/// ```rust, no_run
/// use topictools::lib;
///
/// let args = vec![
///     "--topics".to_string(),
///     "topics.json".to_string(),
///     "--universe".to_string(),
///     "regions.txt".to_string(),
///     "--twobit".to_string(),
///     "hg38.2bit".to_string(),
///     "--dataset".to_string(),
///     "melanoma".to_string(),
///     "--outdir".to_string(),
///     "out".to_string(),
/// ];
///
/// lib(args).unwrap();
/// ```
pub fn lib(args: Vec<String>) -> Result<()> {
    __check_args(&args);

    let dataset = value_of(&args, "--dataset");
    let outdir = value_of(&args, "--outdir");

    lib_topic_binarize(args.clone())?;

    // the split stage reads the artifacts binarize just wrote
    lib_topic_split(vec![
        "--dataset".to_string(),
        dataset,
        "--datadir".to_string(),
        outdir.clone(),
        "--outdir".to_string(),
        outdir,
    ])?;

    Ok(())
}

/// Check if all required arguments are present
fn __check_args(args: &Vec<String>) {
    for key in KEYS.iter() {
        if !args.contains(&key.to_string()) {
            log::error!("Missing required argument: {}", key);
            std::process::exit(1);
        }
    }
}

/// Value following a flag; __check_args already guaranteed the flag exists
fn value_of(args: &[String], key: &str) -> String {
    args.iter()
        .position(|arg| arg == key)
        .and_then(|i| args.get(i + 1))
        .cloned()
        .unwrap_or_else(|| {
            log::error!("Missing value for argument: {}", key);
            std::process::exit(1);
        })
}
