mod logging;

use std::io::{stdin, stdout, BufRead, Write};
use std::path::PathBuf;

use anyhow::{bail, Context};
use serde_json::Value;

use glove_vocab::{Vocab, VocabOptions};

fn main() {
    if let Err(e) = real_main() {
        eprintln!("[vocab_tool] fatal error: {e:?}");
        log::error!("Fatal error: {:?}", e);
        std::process::exit(1);
    }
}

#[derive(Debug, Default, PartialEq)]
struct CliArgs {
    dim: Option<usize>,
    cache: Option<PathBuf>,
    config: Option<PathBuf>,
    offline: bool,
    unk_word: Option<String>,
    unk_char: Option<String>,
    info: bool,
    vectors: bool,
}

fn real_main() -> anyhow::Result<()> {
    let _logger = logging::init_logging()?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let cli = parse_args(&args)?;
    let opts = build_options(&cli)?;

    log::info!(
        "Options: dim={}, cache={:?}, allow_download={}",
        opts.word_vec_dim,
        opts.cache_dir,
        opts.allow_download
    );
    let vocab = Vocab::new(&opts)?;

    let mut out = stdout().lock();
    if cli.info {
        let info = serde_json::json!({
            "wordVecDim": vocab.word_vec_dim(),
            "alphabetSize": vocab.alphabet_size(),
            "totalDim": vocab.total_dim(),
            "words": vocab.table().len(),
        });
        writeln!(out, "{info}")?;
        return Ok(());
    }

    let mut line_count: u64 = 0;
    for line in stdin().lock().lines() {
        let line = line.context("failed reading stdin")?;
        if line.trim().is_empty() {
            continue;
        }
        line_count += 1;

        let resp = match encode_line(&vocab, &line, cli.vectors) {
            Ok(v) => v,
            Err(e) => {
                log::warn!("Line {} rejected: {:#}", line_count, e);
                serde_json::json!({ "error": format!("{e:#}") })
            }
        };
        writeln!(out, "{resp}")?;
    }
    out.flush()?;

    log::info!("Encoded {} sentences", line_count);
    Ok(())
}

fn parse_args(args: &[String]) -> anyhow::Result<CliArgs> {
    let mut cli = CliArgs::default();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--dim" => {
                let v = read_arg_value(args, i).context("missing value for --dim")?;
                cli.dim = Some(v.parse().with_context(|| format!("invalid --dim {v:?}"))?);
                i += 1;
            }
            "--cache" => {
                cli.cache = Some(PathBuf::from(read_arg_value(args, i).context("missing value for --cache")?));
                i += 1;
            }
            "--config" => {
                cli.config = Some(PathBuf::from(read_arg_value(args, i).context("missing value for --config")?));
                i += 1;
            }
            "--unk-word" => {
                cli.unk_word = Some(read_arg_value(args, i).context("missing value for --unk-word")?);
                i += 1;
            }
            "--unk-char" => {
                cli.unk_char = Some(read_arg_value(args, i).context("missing value for --unk-char")?);
                i += 1;
            }
            "--offline" => cli.offline = true,
            "--info" => cli.info = true,
            "--vectors" => cli.vectors = true,
            other => bail!("unknown argument: {other}"),
        }
        i += 1;
    }
    Ok(cli)
}

fn read_arg_value(args: &[String], flag_pos: usize) -> Option<String> {
    args.get(flag_pos + 1).filter(|v| !v.starts_with("--")).cloned()
}

/// Config file first (if any), then command-line overrides.
fn build_options(cli: &CliArgs) -> anyhow::Result<VocabOptions> {
    let mut opts = match &cli.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
            serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))?
        }
        None => VocabOptions::default(),
    };

    if let Some(dim) = cli.dim {
        opts.word_vec_dim = dim;
    }
    if let Some(cache) = &cli.cache {
        opts.cache_dir = Some(cache.clone());
    }
    if cli.offline {
        opts.allow_download = false;
    }
    if let Some(s) = &cli.unk_word {
        opts.unk_word = s.clone();
    }
    if let Some(s) = &cli.unk_char {
        opts.unk_char = s.clone();
    }
    Ok(opts)
}

/// One JSON array of tokens in, one JSON object out.
fn encode_line(vocab: &Vocab, line: &str, include_vectors: bool) -> anyhow::Result<Value> {
    let tokens: Vec<String> = serde_json::from_str(line).context("expected a JSON array of token strings")?;
    let enc = vocab.encode_sentence(tokens.as_slice())?;

    let char_ids: Vec<Vec<usize>> = tokens
        .iter()
        .map(|t| t.chars().map(|c| vocab.char_id(c)).collect())
        .collect();
    let char_shapes: Vec<Vec<usize>> = enc.chars.iter().map(|t| t.dims().to_vec()).collect();
    let word_indices: Vec<usize> = tokens.iter().map(|t| vocab.word_index(t)).collect();
    let known: Vec<bool> = tokens.iter().map(|t| vocab.is_known(t)).collect();

    let mut resp = serde_json::json!({
        "tokens": tokens,
        "charIds": char_ids,
        "charShapes": char_shapes,
        "wordIndices": word_indices,
        "knownWords": known,
    });

    if include_vectors {
        let vectors = enc
            .words
            .iter()
            .map(|t| t.to_vec1::<f32>())
            .collect::<candle_core::Result<Vec<_>>>()?;
        resp["wordVectors"] = serde_json::json!(vectors);
    }

    Ok(resp)
}
