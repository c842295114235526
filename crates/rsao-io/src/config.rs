//! TOML encoder configuration.
//!
//! Every key is optional; missing keys take the encoder defaults.
//!
//! ```toml
//! n_discrete = 12
//! discrete_mode = "strongest"
//! use_lpc = false
//! boundary = "zero_pad"
//! decay_region_db = [-5.0, -25.0]
//! ```

use std::path::Path;

use rsao_analysis::EncoderConfig;

use crate::{Error, Result};

/// Load and validate an encoder configuration file.
pub fn load_config(path: impl AsRef<Path>) -> Result<EncoderConfig> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| Error::read_file(path, e))?;
    let config = parse_config(&content)?;
    tracing::debug!(path = %path.display(), "loaded encoder configuration");
    Ok(config)
}

/// Parse and validate an encoder configuration from TOML text.
pub fn parse_config(toml_str: &str) -> Result<EncoderConfig> {
    let config: EncoderConfig = toml::from_str(toml_str)?;
    config.validate()?;
    Ok(config)
}

/// Write an encoder configuration as TOML.
pub fn save_config(path: impl AsRef<Path>, config: &EncoderConfig) -> Result<()> {
    let path = path.as_ref();
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|e| Error::write_file(path, e))
}
