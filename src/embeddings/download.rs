// download.rs — GloVe archive download, SHA256 verification and member extraction.
//
// Downloads the corpus archive on first use and caches it in the vector cache dir
// (default ./.vector_cache). Only the member for the requested dimension is extracted.

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use sha2::{Digest, Sha256};

use crate::config;

/// Where to look for (and, if allowed, fetch) the table for one dimension.
pub struct FetchParams<'a> {
    pub cache_dir: &'a Path,
    pub dim: usize,
    pub archive_url: &'a str,
    pub archive_sha256: Option<&'a str>,
    pub allow_download: bool,
}

/// Resolve the cache directory: explicit path if given, the default otherwise.
pub fn resolve_cache_dir(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(config::glove::DEFAULT_CACHE_DIR))
}

/// Path of the extracted text table for `dim` inside `cache_dir`.
pub fn text_table_path(cache_dir: &Path, dim: usize) -> PathBuf {
    cache_dir.join(config::glove::text_file_name(dim))
}

/// Make sure the text table for the requested dimension exists locally.
/// Returns its path.
///
/// Order: extracted text file, then a cached archive, then a download (when allowed).
pub fn ensure_text_table(p: &FetchParams<'_>) -> anyhow::Result<PathBuf> {
    let text_path = text_table_path(p.cache_dir, p.dim);
    if text_path.exists() {
        log::info!("GloVe table already cached at {}", text_path.display());
        return Ok(text_path);
    }

    let archive_path = p.cache_dir.join(config::glove::archive_file_name());
    if !archive_path.exists() {
        if !p.allow_download {
            bail!(
                "{} not found in {} and downloads are disabled",
                config::glove::text_file_name(p.dim),
                p.cache_dir.display()
            );
        }

        log::info!("Downloading GloVe {} archive to {}", config::glove::CORPUS_NAME, p.cache_dir.display());
        fs::create_dir_all(p.cache_dir)
            .with_context(|| format!("failed to create cache dir {}", p.cache_dir.display()))?;
        download_and_verify(p.archive_url, &archive_path, p.archive_sha256)?;
    } else {
        log::info!("Using cached archive {}", archive_path.display());
    }

    extract_member(&archive_path, &config::glove::text_file_name(p.dim), &text_path)?;
    Ok(text_path)
}

/// Stream a file from `url` to `dest`, hashing as it goes.
/// When `expected_sha256` is set, a mismatch fails and nothing is left at `dest`.
fn download_and_verify(url: &str, dest: &Path, expected_sha256: Option<&str>) -> anyhow::Result<()> {
    let filename = dest.file_name().unwrap_or_default().to_string_lossy().into_owned();
    log::info!("Downloading {} from {}", filename, url);

    let resp = ureq::get(url)
        .timeout(std::time::Duration::from_secs(config::download::DOWNLOAD_TIMEOUT_SECS))
        .call()
        .with_context(|| format!("failed to download {url}"))?;

    let status = resp.status();
    if status != 200 {
        bail!("HTTP {status} downloading {url}");
    }

    // Write to .tmp, rename once complete and verified
    let tmp_path = dest.with_extension("tmp");
    let (actual_hash, total) = match stream_to_file(resp.into_reader(), &tmp_path) {
        Ok(v) => v,
        Err(e) => {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.context(format!("failed to download {url}")));
        }
    };
    log::info!("Downloaded {} bytes for {} (sha256 {})", total, filename, &actual_hash[..12]);

    if let Some(expected) = expected_sha256 {
        if !actual_hash.eq_ignore_ascii_case(expected) {
            let _ = fs::remove_file(&tmp_path);
            bail!(
                "SHA256 mismatch for {}: expected {}, got {}",
                filename,
                expected,
                actual_hash
            );
        }
        log::info!("SHA256 verified for {}", filename);
    }

    fs::rename(&tmp_path, dest)
        .with_context(|| format!("failed to rename {} -> {}", tmp_path.display(), dest.display()))?;

    Ok(())
}

/// Copy `reader` into a fresh file at `path`. Returns the hex SHA256 and byte count.
fn stream_to_file(mut reader: impl Read, path: &Path) -> anyhow::Result<(String, u64)> {
    let mut file = fs::File::create(path).with_context(|| format!("failed to create {}", path.display()))?;

    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 64 * 1024];
    let mut total: u64 = 0;
    loop {
        let n = reader.read(&mut buf).context("failed to read response body")?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        file.write_all(&buf[..n])
            .with_context(|| format!("failed to write {}", path.display()))?;
        total += n as u64;
    }
    file.flush()?;

    Ok((hex::encode(hasher.finalize()), total))
}

/// Extract a single member of a zip archive to `dest`.
fn extract_member(archive_path: &Path, member: &str, dest: &Path) -> anyhow::Result<()> {
    log::info!("Extracting {} from {}", member, archive_path.display());

    let file = fs::File::open(archive_path)
        .with_context(|| format!("failed to open {}", archive_path.display()))?;
    let mut archive = zip::ZipArchive::new(file)
        .with_context(|| format!("failed to read {} as zip", archive_path.display()))?;
    let mut entry = archive
        .by_name(member)
        .with_context(|| format!("{} has no member {member}", archive_path.display()))?;

    let tmp_path = dest.with_extension("tmp");
    let mut out = fs::File::create(&tmp_path)
        .with_context(|| format!("failed to create {}", tmp_path.display()))?;
    let written = std::io::copy(&mut entry, &mut out)
        .with_context(|| format!("failed to extract {member}"))?;
    out.flush()?;
    drop(out);

    fs::rename(&tmp_path, dest)
        .with_context(|| format!("failed to rename {} -> {}", tmp_path.display(), dest.display()))?;

    log::info!("Extracted {} ({} bytes)", member, written);
    Ok(())
}
