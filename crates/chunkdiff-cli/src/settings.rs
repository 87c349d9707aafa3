use std::path::Path;

use anyhow::Context;
use chunkdiff_core::ChunkerConfig;
use serde::{Deserialize, Serialize};

use crate::cli::ChunkingArgs;

/// Contents of a chunkdiff TOML file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub chunker: ChunkerConfig,
}

impl Settings {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }
}

/// Resolve the chunker configuration: file values first, then flags.
pub fn chunker_config(args: &ChunkingArgs) -> anyhow::Result<ChunkerConfig> {
    let mut config = match &args.config {
        Some(path) => Settings::load(path)?.chunker,
        None => ChunkerConfig::default(),
    };
    if let Some(window) = args.window {
        config.window_size = window;
    }
    if let Some(mask_bits) = args.mask_bits {
        config.mask_bits = mask_bits;
    }
    if let Some(sample_size) = args.sample_size {
        config.sample_size = sample_size;
    }
    config.validate().context("invalid chunker configuration")?;
    tracing::debug!(
        window_size = config.window_size,
        mask_bits = config.mask_bits,
        sample_size = config.sample_size,
        "resolved chunker configuration"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(dir: &tempfile::TempDir, text: &str) -> std::path::PathBuf {
        let path = dir.path().join("chunkdiff.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(text.as_bytes()).unwrap();
        path
    }

    #[test]
    fn defaults_without_file_or_flags() {
        let config = chunker_config(&ChunkingArgs::default()).unwrap();
        assert_eq!(config, ChunkerConfig::default());
    }

    #[test]
    fn file_values_are_used() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "[chunker]\nwindow_size = 32\nmask_bits = 12\n");
        let args = ChunkingArgs {
            config: Some(path),
            ..Default::default()
        };
        let config = chunker_config(&args).unwrap();
        assert_eq!(config.window_size, 32);
        assert_eq!(config.mask_bits, 12);
    }

    #[test]
    fn flags_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "[chunker]\nwindow_size = 32\nsample_size = 2\n");
        let args = ChunkingArgs {
            window: Some(4),
            mask_bits: Some(7),
            sample_size: Some(4),
            config: Some(path),
        };
        let config = chunker_config(&args).unwrap();
        assert_eq!(config.window_size, 4);
        assert_eq!(config.mask_bits, 7);
        assert_eq!(config.sample_size, 4);
    }

    #[test]
    fn empty_file_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "");
        assert_eq!(Settings::load(&path).unwrap(), Settings::default());
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let args = ChunkingArgs {
            config: Some(dir.path().join("absent.toml")),
            ..Default::default()
        };
        let err = chunker_config(&args).unwrap_err();
        assert!(err.to_string().contains("reading config"));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let args = ChunkingArgs {
            window: Some(0),
            ..Default::default()
        };
        assert!(chunker_config(&args).is_err());

        let args = ChunkingArgs {
            sample_size: Some(0),
            ..Default::default()
        };
        assert!(chunker_config(&args).is_err());

        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "[chunker]\nmask_bits = \"five\"\n");
        let args = ChunkingArgs {
            config: Some(path),
            ..Default::default()
        };
        let err = chunker_config(&args).unwrap_err();
        assert!(err.to_string().contains("parsing config"));
    }
}
