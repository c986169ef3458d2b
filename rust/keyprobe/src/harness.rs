//! Trial sequencing: build, search and verify each configured key encoding in
//! its own temporary directory.

use std::{
    fmt,
    path::{Path, PathBuf},
};

use serde::Serialize;

use keyprobe_common::{Result, error::Error};

use crate::{
    build::build_index,
    codec::{KeyCodec, NumericKeyCodec, StringKeyCodec, candidate_keys},
    config::HarnessConfig,
    key::KeyEncoding,
    lookup::lookup,
    payload::PayloadGenerator,
    verify::verify_and_time,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarnessState {
    Init,
    Build(KeyEncoding),
    Search(KeyEncoding),
    Cleanup,
    Done,
}

impl fmt::Display for HarnessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HarnessState::Init => f.write_str("init"),
            HarnessState::Build(encoding) => write!(f, "build {encoding}"),
            HarnessState::Search(encoding) => write!(f, "search {encoding}"),
            HarnessState::Cleanup => f.write_str("cleanup"),
            HarnessState::Done => f.write_str("done"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TrialReport {
    pub encoding: KeyEncoding,
    pub doc_count: u64,
    pub hits: u64,
    pub segment_count: usize,
    pub index_bytes: u64,
    pub build_secs: f64,
    pub search_secs: f64,
}

impl fmt::Display for TrialReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Indexing start {}", self.encoding)?;
        writeln!(
            f,
            "Indexing complete {} ({} segments, {} bytes, {:.3} secs)",
            self.encoding, self.segment_count, self.index_bytes, self.build_secs
        )?;
        write!(
            f,
            "search {} complete in {} secs",
            self.encoding, self.search_secs
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HarnessReport {
    pub doc_count: u64,
    pub trials: Vec<TrialReport>,
}

impl fmt::Display for HarnessReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} docs", self.doc_count)?;
        for trial in &self.trials {
            write!(f, "\n***********\n{trial}")?;
        }
        Ok(())
    }
}

/// Runs the configured trials strictly one after another.
///
/// All trial directories live under one temporary root that is removed on every
/// exit path; a build or search failure is returned after that cleanup.
pub struct Harness {
    config: HarnessConfig,
    transitions: Vec<HarnessState>,
}

impl Harness {
    pub fn new(config: HarnessConfig) -> Result<Harness> {
        config.validate()?;
        Ok(Harness {
            config,
            transitions: Vec::new(),
        })
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// States entered so far, in order.
    pub fn transitions(&self) -> &[HarnessState] {
        &self.transitions
    }

    pub fn state(&self) -> Option<HarnessState> {
        self.transitions.last().copied()
    }

    pub fn run(&mut self) -> Result<HarnessReport> {
        self.transitions.clear();
        self.enter(HarnessState::Init);
        let root = tempfile::Builder::new()
            .prefix(&self.config.temp_prefix)
            .tempdir()
            .map_err(|e| Error::io("create temporary index root", e))?;
        log::info!("{} docs", self.config.doc_count);

        let result = self.run_trials(root.path());

        self.enter(HarnessState::Cleanup);
        let root_path = root.path().to_path_buf();
        let cleanup = root
            .close()
            .map_err(|e| Error::io(format!("remove {}", root_path.display()), e));
        let report = result?;
        cleanup?;
        self.enter(HarnessState::Done);
        Ok(report)
    }

    fn run_trials(&mut self, root: &Path) -> Result<HarnessReport> {
        let mut payloads = PayloadGenerator::new(self.config.payload_seed, self.config.payload_len);
        let mut trials = Vec::with_capacity(self.config.encodings.len());
        for encoding in self.config.encodings.clone() {
            let trial = match encoding {
                KeyEncoding::String => self.run_trial(root, &StringKeyCodec, &mut payloads)?,
                KeyEncoding::Numeric => self.run_trial(root, &NumericKeyCodec, &mut payloads)?,
            };
            trials.push(trial);
        }
        Ok(HarnessReport {
            doc_count: self.config.doc_count,
            trials,
        })
    }

    fn run_trial<C: KeyCodec>(
        &mut self,
        root: &Path,
        codec: &C,
        payloads: &mut PayloadGenerator,
    ) -> Result<TrialReport> {
        let encoding = codec.encoding();
        let doc_count = self.config.doc_count;
        let trial_dir = TrialDir::create(root, encoding)?;

        self.enter(HarnessState::Build(encoding));
        log::info!("Indexing start {encoding}");
        let summary = build_index(
            trial_dir.path(),
            doc_count,
            codec,
            payloads,
            &self.config.writer_config(),
        )?;
        log::info!("Indexing complete {encoding}");

        self.enter(HarnessState::Search(encoding));
        let candidates = candidate_keys(codec, doc_count);
        let elapsed = verify_and_time(encoding.name(), doc_count, || {
            lookup(trial_dir.path(), candidates, codec)
        })?;
        let search_secs = elapsed.as_secs_f64();
        log::info!("search {encoding} complete in {search_secs} secs");

        trial_dir.remove()?;
        Ok(TrialReport {
            encoding,
            doc_count,
            hits: doc_count,
            segment_count: summary.segment_count,
            index_bytes: summary.index_bytes,
            build_secs: summary.elapsed.as_secs_f64(),
            search_secs,
        })
    }

    fn enter(&mut self, state: HarnessState) {
        log::debug!("harness state: {state}");
        self.transitions.push(state);
    }
}

/// Runs the harness once with `config`.
pub fn run(config: HarnessConfig) -> Result<HarnessReport> {
    Harness::new(config)?.run()
}

/// Per-trial index directory, removed when the guard goes away.
struct TrialDir {
    path: Option<PathBuf>,
}

impl TrialDir {
    fn create(root: &Path, encoding: KeyEncoding) -> Result<TrialDir> {
        let path = root.join(encoding.name());
        std::fs::create_dir(&path)
            .map_err(|e| Error::io(format!("create {}", path.display()), e))?;
        Ok(TrialDir { path: Some(path) })
    }

    fn path(&self) -> &Path {
        self.path.as_deref().unwrap_or(Path::new(""))
    }

    fn remove(mut self) -> Result<()> {
        match self.path.take() {
            Some(path) => std::fs::remove_dir_all(&path)
                .map_err(|e| Error::io(format!("remove {}", path.display()), e)),
            None => Ok(()),
        }
    }
}

impl Drop for TrialDir {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            if let Err(e) = std::fs::remove_dir_all(&path) {
                log::warn!("failed to remove {}: {e}", path.display());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> HarnessConfig {
        HarnessConfig {
            doc_count: 300,
            payload_len: 16,
            payload_seed: Some(5),
            max_buffered_docs: 128,
            ..Default::default()
        }
    }

    #[test]
    fn test_state_sequence() {
        let mut harness = Harness::new(small_config()).unwrap();
        assert_eq!(harness.state(), None);
        let report = harness.run().unwrap();
        assert_eq!(
            harness.transitions(),
            &[
                HarnessState::Init,
                HarnessState::Build(KeyEncoding::String),
                HarnessState::Search(KeyEncoding::String),
                HarnessState::Build(KeyEncoding::Numeric),
                HarnessState::Search(KeyEncoding::Numeric),
                HarnessState::Cleanup,
                HarnessState::Done,
            ]
        );
        assert_eq!(report.doc_count, 300);
        assert_eq!(report.trials.len(), 2);
        for trial in &report.trials {
            assert_eq!(trial.hits, 300);
            assert_eq!(trial.segment_count, 3);
            assert!(trial.index_bytes > 0);
        }
    }

    #[test]
    fn test_report_rendering() {
        let report = run(HarnessConfig {
            encodings: vec![KeyEncoding::Numeric],
            ..small_config()
        })
        .unwrap();
        let text = report.to_string();
        assert!(text.starts_with("300 docs\n***********\nIndexing start numeric\n"));
        assert!(text.contains("search numeric complete in "));
        assert!(!text.contains("string"));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["trials"][0]["encoding"], "numeric");
        assert_eq!(json["trials"][0]["hits"], 300);
    }

    #[test]
    fn test_trial_dir_guard() {
        let tempdir = tempfile::tempdir().unwrap();
        let dir = TrialDir::create(tempdir.path(), KeyEncoding::String).unwrap();
        let path = dir.path().to_path_buf();
        std::fs::write(path.join("file"), b"x").unwrap();
        drop(dir);
        assert!(!path.exists());

        let dir = TrialDir::create(tempdir.path(), KeyEncoding::String).unwrap();
        assert!(TrialDir::create(tempdir.path(), KeyEncoding::String).is_err());
        dir.remove().unwrap();
        assert!(std::fs::read_dir(tempdir.path()).unwrap().next().is_none());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = HarnessConfig {
            encodings: Vec::new(),
            ..small_config()
        };
        assert!(Harness::new(config).is_err());
    }
}
