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

//! `stds.schema-org.CreativeWork`: an opaque schema.org JSON-LD document
//! the caller supplies (author, copyright, ...). This crate passes it
//! through unmodified — it has no fields of its own to validate beyond
//! well-formed JSON, which `jumbf::content::decode_json` already
//! enforces on read.

use serde_json::Value;

pub const LABEL: &str = "stds.schema-org.CreativeWork";

/// Wraps a caller-supplied creative-work document, checking only that
/// it declares the expected `@context`/`@type` pair a reader would look
/// for.
#[derive(Debug, Clone, PartialEq)]
pub struct CreativeWork(pub Value);

impl CreativeWork {
    pub fn new(document: Value) -> Self {
        Self(document)
    }

    pub fn is_well_formed(&self) -> bool {
        self.0.get("@context").is_some() && self.0.get("@type").is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_missing_type() {
        let cw = CreativeWork::new(serde_json::json!({"@context": "http://schema.org"}));
        assert!(!cw.is_well_formed());
    }

    #[test]
    fn accepts_minimal_document() {
        let cw = CreativeWork::new(serde_json::json!({
            "@context": "http://schema.org",
            "@type": "CreativeWork",
            "author": [{"@type": "Person", "name": "Jane Doe"}],
        }));
        assert!(cw.is_well_formed());
    }
}
