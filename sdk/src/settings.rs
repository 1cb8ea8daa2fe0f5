// Copyright 2022 Adobe. All rights reserved.
// This file is licensed to you under the Apache License,
// Version 2.0 (http://www.apache.org/licenses/LICENSE-2.0)
// or the MIT license (http://opensource.org/licenses/MIT),
// at your option.

// Unless required by applicable law or agreed to in writing,
// this software is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR REPRESENTATIONS OF ANY KIND, either express or
// implied. See the LICENSE-MIT and LICENSE-APACHE files for the
// specific language governing permissions and limitations under
// each license.

//! Library-wide tunables, layered the same way a host application layers
//! its own config: a baked-in default document merged with an optional
//! caller-supplied override document.

use config::{Config, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const BASE_SETTINGS: &str = r#"{
    "core": {
        "hash_alg": "sha256"
    },
    "trust": {
        "verify_timestamp_trust": false,
        "trust_anchors_path": null
    }
}"#;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreSettings {
    pub hash_alg: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustSettings {
    /// Attempt OCSP / timestamp-token cryptographic validation during
    /// certificate-profile checks. Requires the `ocsp` feature; ignored
    /// otherwise. See Open Question #3.
    pub verify_timestamp_trust: bool,
    pub trust_anchors_path: Option<String>,
}

/// Top level settings object. Construct with [`Settings::default`] or load
/// an override document with [`Settings::from_json`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub core: CoreSettings,
    pub trust: TrustSettings,
}

impl Settings {
    /// Parse a JSON settings document, merged on top of the built-in
    /// defaults (unset fields in `json` keep the default value).
    pub fn from_json(json: &str) -> Result<Self> {
        let cfg = Config::builder()
            .add_source(File::from_str(BASE_SETTINGS, FileFormat::Json))
            .add_source(File::from_str(json, FileFormat::Json))
            .build()
            .map_err(|e| Error::Settings(e.to_string()))?;

        cfg.try_deserialize()
            .map_err(|e| Error::Settings(e.to_string()))
    }
}

impl Default for Settings {
    fn default() -> Self {
        // BASE_SETTINGS is a constant we control; a parse failure here
        // would be a programming fault, not a recoverable condition.
        Self::from_json("{}").expect("built-in settings document is valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_use_sha256() {
        let s = Settings::default();
        assert_eq!(s.core.hash_alg, "sha256");
        assert!(!s.trust.verify_timestamp_trust);
    }

    #[test]
    fn override_changes_only_named_fields() {
        let s = Settings::from_json(r#"{"core": {"hash_alg": "sha512"}}"#).unwrap();
        assert_eq!(s.core.hash_alg, "sha512");
        assert!(!s.trust.verify_timestamp_trust);
    }
}
