// embeddings/ — Pretrained GloVe word vectors.
//
// Provides:
// - Archive download + SHA256 verification + member extraction
// - Text table parsing with a safetensors cache

pub mod download;
pub mod table;
