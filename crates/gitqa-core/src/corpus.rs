//! Static corpus: task catalog plus reference answers, loaded once per run.
//!
//! Layout of a dataset directory:
//!
//! ```text
//! <dataset>/questions.json
//! <dataset>/source_answers/<task_id>.md
//! ```

use crate::catalog::{TaskCatalog, CATALOG_FILE};
use crate::errors::{EvalError, EvalResult};
use crate::model::{ReferenceAnswer, Task};
use lazy_static::lazy_static;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const SOURCE_ANSWERS_DIR: &str = "source_answers";

lazy_static! {
    static ref URL: Regex = Regex::new(r#"https?://[^\s<>()\[\]"'`]+"#).unwrap();
    /// `#123` not glued to a preceding word (skips `foo#1` and HTML entities).
    static ref ISSUE_REF: Regex = Regex::new(r"(?:^|[^\w&/])(#\d+)\b").unwrap();
    static ref HEX_WORD: Regex = Regex::new(r"\b[0-9a-f]{7,40}\b").unwrap();
}

/// Citations in `body`, in order of first appearance, without duplicates.
pub fn extract_evidence_links(body: &str) -> Vec<String> {
    let mut found: Vec<(usize, String)> = Vec::new();
    let mut url_spans = Vec::new();

    for m in URL.find_iter(body) {
        let url = m.as_str().trim_end_matches(['.', ',', ';', ':', '!', '?']);
        url_spans.push(m.start()..m.end());
        found.push((m.start(), url.to_string()));
    }
    let inside_url = |pos: usize| url_spans.iter().any(|span| span.contains(&pos));

    for caps in ISSUE_REF.captures_iter(body) {
        if let Some(m) = caps.get(1) {
            if !inside_url(m.start()) {
                found.push((m.start(), m.as_str().to_string()));
            }
        }
    }
    for m in HEX_WORD.find_iter(body) {
        let word = m.as_str();
        let has_digit = word.bytes().any(|b| b.is_ascii_digit());
        let has_letter = word.bytes().any(|b| b.is_ascii_alphabetic());
        if has_digit && has_letter && !inside_url(m.start()) {
            found.push((m.start(), word.to_string()));
        }
    }

    found.sort_by_key(|(pos, _)| *pos);
    let mut seen = HashSet::new();
    found
        .into_iter()
        .filter_map(|(_, link)| seen.insert(link.clone()).then_some(link))
        .collect()
}

/// Mapping from task id to reference answer. Keys are unique by construction.
#[derive(Debug, Clone, Default)]
pub struct ReferenceIndex {
    answers: BTreeMap<String, ReferenceAnswer>,
}

impl ReferenceIndex {
    /// Load every `<task_id>.md` in `dir`. A missing directory yields an empty index.
    pub fn load_dir(dir: &Path) -> EvalResult<Self> {
        let mut index = Self::default();
        if !dir.is_dir() {
            warn!(dir = %dir.display(), "reference answer directory not found");
            return Ok(index);
        }
        let entries = std::fs::read_dir(dir).map_err(|e| EvalError::io(dir, e))?;
        for entry in entries {
            let path = entry.map_err(|e| EvalError::io(dir, e))?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("md") {
                continue;
            }
            let Some(task_id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let body = std::fs::read_to_string(&path).map_err(|e| EvalError::io(&path, e))?;
            index.insert(task_id.to_string(), body);
        }
        debug!(count = index.len(), dir = %dir.display(), "loaded reference answers");
        Ok(index)
    }

    pub fn insert(&mut self, task_id: String, body: String) {
        let evidence_links = extract_evidence_links(&body);
        self.answers.insert(
            task_id.clone(),
            ReferenceAnswer {
                task_id,
                body,
                evidence_links,
            },
        );
    }

    pub fn resolve(&self, task_id: &str) -> EvalResult<&ReferenceAnswer> {
        self.answers
            .get(task_id)
            .ok_or_else(|| EvalError::reference_not_found(task_id))
    }

    pub fn contains(&self, task_id: &str) -> bool {
        self.answers.contains_key(task_id)
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    fn iter(&self) -> impl Iterator<Item = &ReferenceAnswer> {
        self.answers.values()
    }
}

/// Immutable snapshot of a dataset, shared by every task of a run.
#[derive(Debug, Clone)]
pub struct Corpus {
    pub root: PathBuf,
    pub catalog: TaskCatalog,
    pub references: ReferenceIndex,
    digest: String,
}

impl Corpus {
    pub fn load(root: &Path) -> EvalResult<Self> {
        let catalog_path = root.join(CATALOG_FILE);
        let catalog_raw =
            std::fs::read_to_string(&catalog_path).map_err(|e| EvalError::io(&catalog_path, e))?;
        let catalog = TaskCatalog::from_json_str(&catalog_raw).map_err(|e| match e {
            EvalError::Config { message } => {
                EvalError::config(format!("{}: {}", catalog_path.display(), message))
            }
            other => other,
        })?;
        let references = ReferenceIndex::load_dir(&root.join(SOURCE_ANSWERS_DIR))?;
        Ok(Self::from_parts(root, catalog_raw.as_bytes(), catalog, references))
    }

    pub fn from_parts(
        root: &Path,
        catalog_bytes: &[u8],
        catalog: TaskCatalog,
        references: ReferenceIndex,
    ) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(catalog_bytes);
        for reference in references.iter() {
            hasher.update(reference.task_id.as_bytes());
            hasher.update([0u8]);
            hasher.update(reference.body.as_bytes());
        }
        Self {
            root: root.to_path_buf(),
            catalog,
            references,
            digest: format!("sha256:{}", hex::encode(hasher.finalize())),
        }
    }

    pub fn task(&self, task_id: &str) -> EvalResult<&Task> {
        self.catalog.get(task_id)
    }

    pub fn resolve(&self, task_id: &str) -> EvalResult<&ReferenceAnswer> {
        self.references.resolve(task_id)
    }

    /// Tasks that have no reference answer on disk.
    pub fn missing_references(&self) -> Vec<&str> {
        self.catalog
            .iter()
            .filter(|t| !self.references.contains(&t.task_id))
            .map(|t| t.task_id.as_str())
            .collect()
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn evidence_links_keep_order_and_dedup() {
        let body = "Seen in #1059 and #1116 (see https://github.com/stanfordnlp/dspy/issues/386).\n\
                    Fixed by commit 3f2a9c1d; #1059 again.";
        assert_eq!(
            extract_evidence_links(body),
            vec![
                "#1059",
                "#1116",
                "https://github.com/stanfordnlp/dspy/issues/386",
                "3f2a9c1d"
            ]
        );
    }

    #[test]
    fn evidence_links_ignore_plain_words_and_numbers() {
        let body = "Release 2024123 added a decade of facade fixes; see notes#12 and &#39;";
        assert!(extract_evidence_links(body).is_empty());
    }

    #[test]
    fn resolve_missing_reference_is_not_found() {
        let index = ReferenceIndex::default();
        let err = index.resolve("bug_patterns_x").unwrap_err();
        assert_eq!(err.task_id(), Some("bug_patterns_x"));
        assert_eq!(err.kind(), crate::errors::RunErrorKind::NotFound);
    }

    #[test]
    fn loads_dataset_directory() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(CATALOG_FILE),
            r#"[
                {"task_id": "bug_patterns_a", "task": "q a"},
                {"task_id": "bug_patterns_b", "task": "q b"}
            ]"#,
        )
        .unwrap();
        let answers = dir.path().join(SOURCE_ANSWERS_DIR);
        std::fs::create_dir(&answers).unwrap();
        std::fs::write(answers.join("bug_patterns_a.md"), "Root cause in #12.").unwrap();
        std::fs::write(answers.join("notes.txt"), "ignored").unwrap();

        let corpus = Corpus::load(dir.path()).unwrap();
        assert_eq!(corpus.catalog.len(), 2);
        assert_eq!(corpus.references.len(), 1);
        assert_eq!(
            corpus.resolve("bug_patterns_a").unwrap().evidence_links,
            vec!["#12"]
        );
        assert_eq!(corpus.missing_references(), vec!["bug_patterns_b"]);
        assert!(corpus.digest().starts_with("sha256:"));
    }

    #[test]
    fn digest_changes_with_reference_content() {
        let catalog = TaskCatalog::default();
        let mut a = ReferenceIndex::default();
        a.insert("t".into(), "one".into());
        let mut b = ReferenceIndex::default();
        b.insert("t".into(), "two".into());

        let root = Path::new(".");
        let da = Corpus::from_parts(root, b"[]", catalog.clone(), a);
        let db = Corpus::from_parts(root, b"[]", catalog, b);
        assert_ne!(da.digest(), db.digest());
    }
}
