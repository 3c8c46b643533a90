// vocab.rs — Word + character vocabulary over a pretrained GloVe table.
//
// Construction loads the table (cache or download) and derives the character alphabet
// from its words. After that everything is read-only.

use std::path::PathBuf;

use candle_core::{Device, Tensor};
use serde::Deserialize;

use crate::alphabet::CharAlphabet;
use crate::config;
use crate::embeddings::download::{self, FetchParams};
use crate::embeddings::table::EmbeddingTable;
use crate::error::{Result, VocabError};

/// A word-vector dimension validated against `config::glove::SUPPORTED_DIMS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WordVecDim(usize);

impl WordVecDim {
    pub fn get(self) -> usize {
        self.0
    }

    /// Every supported dimension, smallest first.
    pub fn all() -> impl Iterator<Item = Self> {
        config::glove::SUPPORTED_DIMS.into_iter().map(Self)
    }
}

impl TryFrom<usize> for WordVecDim {
    type Error = VocabError;

    fn try_from(dim: usize) -> Result<Self> {
        if config::glove::SUPPORTED_DIMS.contains(&dim) {
            Ok(Self(dim))
        } else {
            Err(VocabError::UnsupportedDimension(dim))
        }
    }
}

/// Construction options. Deserializable so the CLI can read them from a JSON file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VocabOptions {
    pub unk_word: String,
    pub unk_char: String,
    pub word_vec_dim: usize,
    /// Vector cache directory; `.vector_cache` when unset.
    pub cache_dir: Option<PathBuf>,
    pub allow_download: bool,
    pub archive_url: String,
    pub archive_sha256: Option<String>,
}

impl Default for VocabOptions {
    fn default() -> Self {
        Self {
            unk_word: config::vocab::DEFAULT_UNK_WORD.to_string(),
            unk_char: config::vocab::DEFAULT_UNK_CHAR.to_string(),
            word_vec_dim: config::glove::DEFAULT_DIM,
            cache_dir: None,
            allow_download: true,
            archive_url: config::glove::ARCHIVE_URL.to_string(),
            archive_sha256: None,
        }
    }
}

/// Tensors produced for one sentence, one entry per token in token order.
#[derive(Debug, Clone)]
pub struct SentenceEncoding {
    /// `[token chars, alphabet_size]` one-hot matrices.
    pub chars: Vec<Tensor>,
    /// `[word_vec_dim]` embedding vectors.
    pub words: Vec<Tensor>,
}

impl SentenceEncoding {
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Word vectors stacked into `[tokens, word_vec_dim]`; `None` for an empty sentence.
    pub fn word_matrix(&self) -> Result<Option<Tensor>> {
        if self.words.is_empty() {
            return Ok(None);
        }
        Ok(Some(Tensor::stack(&self.words, 0)?))
    }
}

/// The vocabulary: embedding table + character alphabet.
#[derive(Debug, Clone)]
pub struct Vocab {
    unk_word: String,
    word_vec_dim: WordVecDim,
    table: EmbeddingTable,
    alphabet: CharAlphabet,
}

impl Vocab {
    /// Load (or download) the table for `opts.word_vec_dim` and build the alphabet.
    pub fn new(opts: &VocabOptions) -> Result<Self> {
        let dim = WordVecDim::try_from(opts.word_vec_dim)?;
        let cache_dir = download::resolve_cache_dir(opts.cache_dir.as_deref());

        let params = FetchParams {
            cache_dir: &cache_dir,
            dim: dim.get(),
            archive_url: &opts.archive_url,
            archive_sha256: opts.archive_sha256.as_deref(),
            allow_download: opts.allow_download,
        };
        let table = EmbeddingTable::load(&params, &opts.unk_word)
            .map_err(|e| VocabError::unavailable(dim.get(), e))?;

        Self::from_table(table, &opts.unk_word, &opts.unk_char)
    }

    /// Build from an already loaded table.
    pub fn from_table(table: EmbeddingTable, unk_word: &str, unk_char: &str) -> Result<Self> {
        let word_vec_dim = WordVecDim::try_from(table.dim())?;
        let alphabet = CharAlphabet::from_words(table.words(), unk_char);

        log::info!(
            "Vocabulary ready: {} words, dim={}, alphabet size={}",
            table.len(),
            word_vec_dim.get(),
            alphabet.len()
        );

        Ok(Self {
            unk_word: unk_word.to_string(),
            word_vec_dim,
            table,
            alphabet,
        })
    }

    pub fn word_vec_dim(&self) -> usize {
        self.word_vec_dim.get()
    }

    pub fn alphabet_size(&self) -> usize {
        self.alphabet.len()
    }

    /// Feature width when character and word features are concatenated.
    pub fn total_dim(&self) -> usize {
        self.alphabet_size() + self.word_vec_dim()
    }

    pub fn unk_word(&self) -> &str {
        &self.unk_word
    }

    pub fn alphabet(&self) -> &CharAlphabet {
        &self.alphabet
    }

    pub fn table(&self) -> &EmbeddingTable {
        &self.table
    }

    /// Table row for `token`, looked up case-insensitively.
    pub fn word_index(&self, token: &str) -> usize {
        self.table.lookup(&token.to_lowercase())
    }

    pub fn is_known(&self, token: &str) -> bool {
        self.word_index(token) != self.table.unk_index()
    }

    pub fn char_id(&self, ch: char) -> usize {
        self.alphabet.id(ch)
    }

    /// One-hot matrix `[chars, alphabet_size]` for a token.
    pub fn encode_chars(&self, token: &str) -> Result<Tensor> {
        let rows = token.chars().count();
        let data = self.alphabet.one_hot_rows(token);
        Ok(Tensor::from_vec(data, (rows, self.alphabet_size()), &Device::Cpu)?)
    }

    /// Embedding vector `[word_vec_dim]` for a token.
    pub fn encode_word(&self, token: &str) -> Result<Tensor> {
        Ok(self.table.vector(self.word_index(token))?)
    }

    /// Encode a pre-tokenized sentence.
    pub fn encode_sentence<S: AsRef<str>>(&self, tokens: &[S]) -> Result<SentenceEncoding> {
        let mut chars = Vec::with_capacity(tokens.len());
        let mut words = Vec::with_capacity(tokens.len());
        for tok in tokens {
            let tok = tok.as_ref();
            words.push(self.encode_word(tok)?);
            chars.push(self.encode_chars(tok)?);
        }
        Ok(SentenceEncoding { chars, words })
    }
}
