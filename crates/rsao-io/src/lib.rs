//! File I/O for the rsao encoder.
//!
//! This crate provides:
//!
//! - **B-format WAV I/O**: [`read_bformat`] and [`write_bformat`] for 4-channel impulse responses
//! - **Configuration**: [`load_config`] for TOML encoder settings
//! - **Renderer output**: [`RoomObject`] and [`write_room_object`] for the JSON room object
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use rsao_analysis::{Encoder, RoomDimensions};
//! use rsao_io::{RoomObject, load_config, read_bformat, write_room_object};
//!
//! let signal = read_bformat("room.wav")?;
//! let config = load_config("encoder.toml")?;
//! let room = RoomDimensions::new(8.0, 6.0, 3.0)?;
//! let params = Encoder::new(config)?.encode(&signal, Some(&room))?;
//!
//! let object = RoomObject::from_parameters(&params, "room", "extent")?;
//! write_room_object("room.json", &object)?;
//! ```

mod config;
mod room_object;
mod wav;

pub use config::{load_config, parse_config, save_config};
pub use room_object::{
    BiquadEntry, DirectPosition, LateReverbEntry, ReflectionEntry, ReflectionPosition, Room,
    RoomObject, format_exponent, write_room_object,
};
pub use wav::{read_bformat, write_bformat};

use std::path::PathBuf;

/// Error types for rsao file operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// Failed to read a file.
    #[error("failed to read file '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a file.
    #[error("failed to write file '{path}': {source}")]
    WriteFile {
        /// Path of the file that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML.
    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to serialize TOML.
    #[error("failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// Failed to serialize JSON.
    #[error("failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The loaded data was rejected by the analysis layer.
    #[error(transparent)]
    Analysis(#[from] rsao_analysis::Error),

    /// The parameter set lacks a block the room object needs.
    #[error("parameter set has no {0}")]
    MissingParameters(String),
}

impl Error {
    /// Create a read file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Create a write file error.
    pub fn write_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::WriteFile {
            path: path.into(),
            source,
        }
    }
}

/// Convenience result type for rsao file operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_file_display() {
        let err = Error::read_file(
            "/missing/encoder.toml",
            std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        );
        let msg = err.to_string();
        assert!(msg.contains("/missing/encoder.toml"), "got: {msg}");
        assert!(msg.contains("not found"), "got: {msg}");
    }

    #[test]
    fn test_analysis_error_is_transparent() {
        let err: Error = rsao_analysis::Error::configuration("expected 4 channels, got 2").into();
        assert_eq!(
            err.to_string(),
            "configuration error: expected 4 channels, got 2"
        );
    }
}
