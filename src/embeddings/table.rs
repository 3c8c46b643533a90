// table.rs — In-memory GloVe table: word index plus an [n + 1, dim] vector matrix.
//
// Row n (one past the last word) is reserved for unknown words and is all zeros.
// Parsed text tables are cached next to the text file as safetensors + a word list,
// which loads much faster than re-parsing several hundred MB of text.

use std::collections::HashMap;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Instant;

use anyhow::{bail, Context};
use candle_core::{DType, Device, Tensor};

use crate::config;
use crate::embeddings::download::{self, FetchParams};
use crate::error::{Result, VocabError};

/// Immutable word → vector table.
#[derive(Debug, Clone)]
pub struct EmbeddingTable {
    words: Vec<String>,
    index: HashMap<String, usize>,
    vectors: Tensor,
    dim: usize,
    unk_label: String,
}

impl EmbeddingTable {
    /// Build a table from in-memory `(word, vector)` pairs.
    ///
    /// Every vector must have exactly `dim` components. Duplicate words keep
    /// their first vector.
    pub fn from_entries<I>(entries: I, dim: usize, unk_label: &str) -> Result<Self>
    where
        I: IntoIterator<Item = (String, Vec<f32>)>,
    {
        let mut words = Vec::new();
        let mut data = Vec::new();
        let mut seen = HashMap::new();
        for (word, vector) in entries {
            if vector.len() != dim {
                return Err(VocabError::unavailable(
                    dim,
                    anyhow::anyhow!("vector for {word:?} has {} components, expected {dim}", vector.len()),
                ));
            }
            if seen.contains_key(&word) {
                continue;
            }
            seen.insert(word.clone(), words.len());
            words.push(word);
            data.extend_from_slice(&vector);
        }
        Ok(Self::from_parts(words, data, dim, unk_label)?)
    }

    /// Load the table for `p.dim`, preferring the binary cache, then the text
    /// table (fetching it if needed). A fresh text parse refreshes the binary cache.
    pub fn load(p: &FetchParams<'_>, unk_label: &str) -> anyhow::Result<Self> {
        match Self::load_cache(p.cache_dir, p.dim, unk_label) {
            Ok(Some(table)) => return Ok(table),
            Ok(None) => {}
            Err(e) => log::warn!("Ignoring unreadable table cache (re-parsing text): {:#}", e),
        }

        let text_path = download::ensure_text_table(p)?;
        let table = Self::parse_text(&text_path, p.dim, unk_label)?;

        if let Err(e) = table.save_cache(p.cache_dir) {
            log::warn!("Could not write table cache to {}: {:#}", p.cache_dir.display(), e);
        }
        Ok(table)
    }

    /// Parse a GloVe text table (`word v1 .. vdim` per line).
    pub fn parse_text(path: &Path, dim: usize, unk_label: &str) -> anyhow::Result<Self> {
        let started = Instant::now();
        let file = fs::File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        let reader = BufReader::new(file);

        let mut words = Vec::new();
        let mut data = Vec::new();
        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut duplicates = 0usize;

        for (i, raw) in reader.split(b'\n').enumerate() {
            let line_no = i + 1;
            let raw = raw.with_context(|| format!("failed reading {} at line {line_no}", path.display()))?;
            let line = match std::str::from_utf8(&raw) {
                Ok(s) => s.trim_end(),
                Err(_) => {
                    log::warn!("Skipping non UTF-8 line {} in {}", line_no, path.display());
                    continue;
                }
            };
            if line.is_empty() {
                continue;
            }

            let fields: Vec<&str> = line.split(' ').collect();
            // A bare count, or a word2vec-style "count dim" header
            if fields.len() <= 2 && fields.len() < dim + 1 {
                log::warn!("Skipping header-like line {} in {}", line_no, path.display());
                continue;
            }
            if fields.len() < dim + 1 {
                bail!(
                    "malformed line {} in {}: {} fields, expected at least {}",
                    line_no,
                    path.display(),
                    fields.len(),
                    dim + 1
                );
            }

            // Trailing `dim` fields are the vector; anything before is the word (may contain spaces).
            let split = fields.len() - dim;
            let word = fields[..split].join(" ");
            if seen.contains_key(&word) {
                duplicates += 1;
                log::debug!("Skipping duplicate word {:?} at line {}", word, line_no);
                continue;
            }

            for field in &fields[split..] {
                let v: f32 = field.parse().with_context(|| {
                    format!("malformed line {} in {}: bad float {field:?}", line_no, path.display())
                })?;
                data.push(v);
            }
            seen.insert(word.clone(), words.len());
            words.push(word);
        }

        log::info!(
            "Parsed {} words (dim={}, {} duplicates skipped) from {} in {:?}",
            words.len(),
            dim,
            duplicates,
            path.display(),
            started.elapsed()
        );

        Ok(Self::from_parts(words, data, dim, unk_label)?)
    }

    fn from_parts(words: Vec<String>, mut data: Vec<f32>, dim: usize, unk_label: &str) -> candle_core::Result<Self> {
        let rows = words.len();
        // Reserved unknown-word row
        data.extend(std::iter::repeat(0.0f32).take(dim));
        let vectors = Tensor::from_vec(data, (rows + 1, dim), &Device::Cpu)?;
        let index = words.iter().enumerate().map(|(i, w)| (w.clone(), i)).collect();
        Ok(Self {
            words,
            index,
            vectors,
            dim,
            unk_label: unk_label.to_string(),
        })
    }

    fn load_cache(cache_dir: &Path, dim: usize, unk_label: &str) -> anyhow::Result<Option<Self>> {
        let tensor_path = cache_dir.join(config::glove::tensor_cache_file_name(dim));
        let words_path = cache_dir.join(config::glove::words_cache_file_name(dim));
        if !tensor_path.exists() || !words_path.exists() {
            return Ok(None);
        }

        let started = Instant::now();
        let listing = fs::read_to_string(&words_path).with_context(|| format!("read {}", words_path.display()))?;
        // Split on '\n' only: a word may legitimately end in '\r'
        let words: Vec<String> = listing
            .strip_suffix('\n')
            .unwrap_or(&listing)
            .split('\n')
            .map(str::to_string)
            .collect();

        let mut tensors = candle_core::safetensors::load(&tensor_path, &Device::Cpu)
            .with_context(|| format!("load {}", tensor_path.display()))?;
        let vectors = tensors
            .remove(config::glove::VECTORS_TENSOR_NAME)
            .with_context(|| format!("{} has no {:?} tensor", tensor_path.display(), config::glove::VECTORS_TENSOR_NAME))?;

        let (rows, cols) = vectors.dims2()?;
        if rows != words.len() || cols != dim {
            bail!(
                "table cache shape mismatch: tensor [{rows}, {cols}], {} words, dim {dim}",
                words.len()
            );
        }

        let data = vectors.to_dtype(DType::F32)?.flatten_all()?.to_vec1::<f32>()?;
        let table = Self::from_parts(words, data, dim, unk_label)?;
        log::info!(
            "Loaded {} words (dim={}) from cache {} in {:?}",
            table.len(),
            dim,
            tensor_path.display(),
            started.elapsed()
        );
        Ok(Some(table))
    }

    fn save_cache(&self, cache_dir: &Path) -> anyhow::Result<()> {
        if self.words.is_empty() {
            return Ok(());
        }
        let tensor_path = cache_dir.join(config::glove::tensor_cache_file_name(self.dim));
        let words_path = cache_dir.join(config::glove::words_cache_file_name(self.dim));

        let known = self.vectors.narrow(0, 0, self.words.len())?;
        let tensors = HashMap::from([(config::glove::VECTORS_TENSOR_NAME.to_string(), known)]);
        candle_core::safetensors::save(&tensors, &tensor_path)
            .with_context(|| format!("write {}", tensor_path.display()))?;

        let mut listing = self.words.join("\n");
        listing.push('\n');
        fs::write(&words_path, listing).with_context(|| format!("write {}", words_path.display()))?;

        log::info!("Wrote table cache {}", tensor_path.display());
        Ok(())
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of real words (the reserved unknown row is not counted).
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Row holding the shared unknown-word vector.
    pub fn unk_index(&self) -> usize {
        self.words.len()
    }

    pub fn index_of(&self, word: &str) -> Option<usize> {
        self.index.get(word).copied()
    }

    /// Exact lookup, falling back to the unknown row.
    pub fn lookup(&self, word: &str) -> usize {
        self.index_of(word).unwrap_or_else(|| self.unk_index())
    }

    /// Word stored at `index`; the unknown row reports the unknown-word label.
    pub fn word(&self, index: usize) -> Option<&str> {
        if index == self.unk_index() {
            return Some(&self.unk_label);
        }
        self.words.get(index).map(String::as_str)
    }

    /// Words in table order.
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }

    /// Vector for a row index, shape `[dim]`.
    pub fn vector(&self, index: usize) -> candle_core::Result<Tensor> {
        self.vectors.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(word: &str, seed: f32, dim: usize) -> String {
        let values: Vec<String> = (0..dim).map(|i| format!("{}", seed + i as f32 * 0.01)).collect();
        format!("{word} {}", values.join(" "))
    }

    #[test]
    fn test_from_entries_reserves_zero_unknown_row() {
        let table = EmbeddingTable::from_entries(
            vec![("a".to_string(), vec![1.0, 2.0]), ("b".to_string(), vec![3.0, 4.0])],
            2,
            "UNK",
        )
        .unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.unk_index(), 2);
        assert_eq!(table.lookup("b"), 1);
        assert_eq!(table.lookup("zzz"), 2);
        assert_eq!(table.word(2), Some("UNK"));
        assert_eq!(table.vector(1).unwrap().to_vec1::<f32>().unwrap(), vec![3.0, 4.0]);
        assert_eq!(table.vector(2).unwrap().to_vec1::<f32>().unwrap(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_from_entries_rejects_wrong_length() {
        let err = EmbeddingTable::from_entries(vec![("a".to_string(), vec![1.0])], 2, "UNK").unwrap_err();
        assert!(matches!(err, VocabError::EmbeddingUnavailable { dim: 2, .. }));
    }

    #[test]
    fn test_parse_text_handles_header_duplicates_and_spaces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.txt");
        let body = [
            "400000 3".to_string(),
            line("the", 0.5, 3),
            line("the", 9.0, 3),
            line("new york", 1.0, 3),
            String::new(),
        ]
        .join("\n");
        fs::write(&path, body).unwrap();

        let table = EmbeddingTable::parse_text(&path, 3, "UNK").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.index_of("new york"), Some(1));
        let the = table.vector(0).unwrap().to_vec1::<f32>().unwrap();
        assert!((the[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_parse_text_skips_count_only_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.txt");
        fs::write(&path, "2\nthe 0.1 0.2 0.3\ndog 0.4 0.5 0.6\n").unwrap();

        let table = EmbeddingTable::parse_text(&path, 3, "UNK").unwrap();
        assert_eq!(table.words().collect::<Vec<_>>(), vec!["the", "dog"]);
    }

    #[test]
    fn test_parse_text_skips_invalid_utf8_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.txt");
        let mut body = b"the 0.1 0.2 0.3\n".to_vec();
        body.extend_from_slice(b"\xff\xfe 0.7 0.8 0.9\n");
        body.extend_from_slice(b"dog 0.4 0.5 0.6\n");
        fs::write(&path, body).unwrap();

        let table = EmbeddingTable::parse_text(&path, 3, "UNK").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.index_of("dog"), Some(1));
        let dog = table.vector(1).unwrap().to_vec1::<f32>().unwrap();
        assert!((dog[0] - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_parse_text_rejects_short_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.txt");
        fs::write(&path, "cat 0.1 0.2\n").unwrap();

        let err = EmbeddingTable::parse_text(&path, 3, "UNK").unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_parse_text_rejects_bad_float() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.txt");
        fs::write(&path, "cat 0.1 nope 0.3\n").unwrap();

        let err = EmbeddingTable::parse_text(&path, 3, "UNK").unwrap_err();
        assert!(format!("{err:#}").contains("bad float"));
    }

    #[test]
    fn test_load_writes_and_reuses_cache() {
        let dir = tempfile::tempdir().unwrap();
        let text = dir.path().join("glove.6B.50d.txt");
        fs::write(&text, [line("dog", 0.1, 50), line("cat", 0.2, 50)].join("\n")).unwrap();

        let params = FetchParams {
            cache_dir: dir.path(),
            dim: 50,
            archive_url: "http://127.0.0.1:9/unused.zip",
            archive_sha256: None,
            allow_download: false,
        };
        let first = EmbeddingTable::load(&params, "UNK").unwrap();
        assert!(dir.path().join("glove.6B.50d.safetensors").exists());
        assert!(dir.path().join("glove.6B.50d.words.txt").exists());

        // Second load must come from the cache alone.
        fs::remove_file(&text).unwrap();
        let second = EmbeddingTable::load(&params, "UNK").unwrap();
        assert_eq!(second.len(), first.len());
        assert_eq!(second.index_of("cat"), Some(1));
        assert_eq!(
            second.vector(1).unwrap().to_vec1::<f32>().unwrap(),
            first.vector(1).unwrap().to_vec1::<f32>().unwrap()
        );
    }

    #[test]
    fn test_cache_round_trips_word_ending_in_carriage_return() {
        let dir = tempfile::tempdir().unwrap();
        let text = dir.path().join("glove.6B.50d.txt");
        fs::write(&text, [line("cr\r", 0.1, 50), line("dog", 0.2, 50)].join("\n")).unwrap();

        let params = FetchParams {
            cache_dir: dir.path(),
            dim: 50,
            archive_url: "http://127.0.0.1:9/unused.zip",
            archive_sha256: None,
            allow_download: false,
        };
        let parsed = EmbeddingTable::load(&params, "UNK").unwrap();
        assert_eq!(parsed.index_of("cr\r"), Some(0));

        fs::remove_file(&text).unwrap();
        let cached = EmbeddingTable::load(&params, "UNK").unwrap();
        assert_eq!(cached.words().collect::<Vec<_>>(), vec!["cr\r", "dog"]);
    }

    #[test]
    fn test_corrupt_cache_falls_back_to_text() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("glove.6B.50d.txt"), line("dog", 0.1, 50)).unwrap();
        fs::write(dir.path().join("glove.6B.50d.safetensors"), b"garbage").unwrap();
        fs::write(dir.path().join("glove.6B.50d.words.txt"), "dog\n").unwrap();

        let params = FetchParams {
            cache_dir: dir.path(),
            dim: 50,
            archive_url: "http://127.0.0.1:9/unused.zip",
            archive_sha256: None,
            allow_download: false,
        };
        let table = EmbeddingTable::load(&params, "UNK").unwrap();
        assert_eq!(table.len(), 1);
    }
}
