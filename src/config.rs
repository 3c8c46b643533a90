// IMPORTANT:
// Keep ALL numeric values and file naming centralized here (no hardcoded values scattered around).

// NOTE: TOOL_VERSION must stay in sync with the `version` field in Cargo.toml.
pub const TOOL_VERSION: &str = "0.3.0";

pub mod glove {
    /// Word-vector dimensions published for the 6B corpus.
    pub const SUPPORTED_DIMS: [usize; 4] = [50, 100, 200, 300];
    pub const DEFAULT_DIM: usize = 300;

    pub const CORPUS_NAME: &str = "6B";

    // Stanford's canonical mirror. The archive holds all four dimensions (~822 MB).
    pub const ARCHIVE_URL: &str = "https://nlp.stanford.edu/data/glove.6B.zip";

    // Relative to the current directory, same default location other GloVe loaders use.
    pub const DEFAULT_CACHE_DIR: &str = ".vector_cache";

    pub fn archive_file_name() -> String {
        format!("glove.{CORPUS_NAME}.zip")
    }

    pub fn text_file_name(dim: usize) -> String {
        format!("glove.{CORPUS_NAME}.{dim}d.txt")
    }

    pub fn tensor_cache_file_name(dim: usize) -> String {
        format!("glove.{CORPUS_NAME}.{dim}d.safetensors")
    }

    pub fn words_cache_file_name(dim: usize) -> String {
        format!("glove.{CORPUS_NAME}.{dim}d.words.txt")
    }

    /// Tensor name used inside the safetensors cache.
    pub const VECTORS_TENSOR_NAME: &str = "vectors";
}

pub mod download {
    pub const DOWNLOAD_TIMEOUT_SECS: u64 = 30 * 60;
}

pub mod vocab {
    pub const DEFAULT_UNK_WORD: &str = "UNK";
    pub const DEFAULT_UNK_CHAR: &str = "UNK";

    /// Alphabet id reserved for characters never seen while building.
    pub const UNK_CHAR_ID: usize = 0;
}

pub mod logging {
    pub const LOG_DIR_REL: &str = ".glove_vocab/logs";
    pub const LOG_DIR_ENV: &str = "GLOVE_VOCAB_LOG_DIR";
    pub const LOG_FILE_NAME: &str = "vocab_tool";

    pub const LOG_ROTATE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
    pub const LOG_ROTATE_KEEP_FILES: usize = 5;
}
