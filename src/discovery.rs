//! Reads token files from a configured directory.

use crate::api::{analyze, ParsedTokensResult, TokenSource};
use crate::config::EngineConfig;
use crate::error::TokenError;
use crate::resolver::ResolutionSummary;
use std::fs;
use std::path::{Path, PathBuf};

/// Collects every `*.json` file below `dir`, recursively, sorted by path so
/// that later files override earlier ones deterministically.
///
/// # Errors
/// Returns [`TokenError::DirectoryNotFound`], [`TokenError::NotADirectory`] or
/// [`TokenError::Io`] when the directory cannot be read.
pub fn discover_sources(dir: &Path) -> Result<Vec<TokenSource>, TokenError> {
    if !dir.exists() {
        return Err(TokenError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }
    if !dir.is_dir() {
        return Err(TokenError::NotADirectory {
            path: dir.to_path_buf(),
        });
    }

    let mut paths = Vec::new();
    collect_json_files(dir, &mut paths)?;
    paths.sort();

    paths
        .into_iter()
        .map(|path| {
            let contents = fs::read_to_string(&path).map_err(|source| TokenError::Io {
                path: path.clone(),
                source,
            })?;
            let name = path
                .strip_prefix(dir)
                .unwrap_or(&path)
                .to_string_lossy()
                .to_string();
            Ok(TokenSource::new(name, contents))
        })
        .collect()
}

fn collect_json_files(dir: &Path, paths: &mut Vec<PathBuf>) -> Result<(), TokenError> {
    let io_error = |source: std::io::Error| TokenError::Io {
        path: dir.to_path_buf(),
        source,
    };
    for entry in fs::read_dir(dir).map_err(io_error)? {
        let path = entry.map_err(io_error)?.path();
        if path.is_dir() {
            collect_json_files(&path, paths)?;
        } else if path.extension().is_some_and(|ext| ext == "json") {
            paths.push(path);
        }
    }
    Ok(())
}

/// Discovers and analyzes the token files under the configured directory.
/// With `resolve_references` set, every alias is resolved once up front; the
/// counts land in [`ParsedTokensResult::resolution`] and flagged tokens are
/// reported through the log.
///
/// # Errors
/// Fails only if the directory itself cannot be read; problems inside
/// individual files are reported in [`ParsedTokensResult::errors`].
pub fn load(config: &EngineConfig) -> Result<ParsedTokensResult, TokenError> {
    let sources = discover_sources(&config.token_dir)?;
    log::debug!(
        "discovered {} token files in {}",
        sources.len(),
        config.token_dir.display()
    );
    let mut result = analyze(&sources, config.mode);
    if config.resolve_references {
        let summary = ResolutionSummary::from_tokens(&result.resolve_all());
        if summary.flagged > 0 {
            log::warn!("{summary}");
        } else {
            log::debug!("{summary}");
        }
        result.resolution = Some(summary);
    }
    Ok(result)
}
