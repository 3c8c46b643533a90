//! Word and character vocabulary over pretrained GloVe embeddings.
//!
//! [`Vocab`] loads a GloVe table (from a local cache, downloading it if needed),
//! derives a character alphabet from the table's words, and encodes
//! pre-tokenized sentences into one-hot character matrices and word vectors.

pub mod alphabet;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod vocab;

pub use alphabet::{AlphabetBuilder, CharAlphabet};
pub use embeddings::table::EmbeddingTable;
pub use error::VocabError;
pub use vocab::{SentenceEncoding, Vocab, VocabOptions, WordVecDim};
