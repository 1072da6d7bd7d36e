//! JSON configuration grouping generator and cipher parameters.
//!
//! Every section is optional; missing sections fall back to
//! [`LcgParams::REFERENCE`] and [`CipherConfig::default`].  Parsing does not
//! validate: ranges are checked when a generator or cipher is built.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cipher::CipherConfig;
use crate::error::Result;
use crate::prng::LcgParams;

/// Top-level configuration document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabConfig {
    /// Generator used for sequences and IV derivation.
    pub prng: LcgParams,
    /// Block cipher parameters.
    pub cipher: CipherConfig,
}

impl LabConfig {
    /// Parses a configuration from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reads and parses the JSON file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }
}
