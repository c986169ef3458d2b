//! Run command implementation

use anyhow::{Context, Result, bail};
use keyprobe::{HarnessConfig, KeyEncoding, harness::Harness};

pub struct RunArgs {
    pub config: Option<String>,
    pub docs: Option<u64>,
    pub payload_len: Option<usize>,
    pub seed: Option<u64>,
    pub encodings: Vec<KeyEncoding>,
    pub max_buffered_docs: Option<usize>,
    pub json: bool,
}

pub fn run(args: RunArgs) -> Result<()> {
    let config = resolve_config(&args)?;
    let mut harness = Harness::new(config).context("Invalid harness configuration")?;
    let report = match harness.run() {
        Ok(report) => report,
        Err(e) if e.is_verification_failure() => bail!("Lookup verification failed: {e}"),
        Err(e) => {
            return Err(e).with_context(|| match harness.state() {
                Some(state) => format!("Harness failed during {state}"),
                None => "Harness failed".to_string(),
            });
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{report}");
    }
    Ok(())
}

fn resolve_config(args: &RunArgs) -> Result<HarnessConfig> {
    let mut config = match &args.config {
        Some(path) => HarnessConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config from {path}"))?,
        None => HarnessConfig::default(),
    };
    if let Some(docs) = args.docs {
        config.doc_count = docs;
    }
    if let Some(payload_len) = args.payload_len {
        config.payload_len = payload_len;
    }
    if args.seed.is_some() {
        config.payload_seed = args.seed;
    }
    if !args.encodings.is_empty() {
        config.encodings = args.encodings.clone();
    }
    if let Some(max_buffered_docs) = args.max_buffered_docs {
        config.max_buffered_docs = max_buffered_docs;
    }
    Ok(config)
}
