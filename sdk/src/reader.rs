// Copyright 2024 Adobe. All rights reserved.
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

//! Read and verify a manifest embedded in a JPEG file. Single-threaded
//! and synchronous throughout — no suspension points, no internal
//! buffering beyond what's needed to walk the JPEG once.

use std::io::Cursor;

use crate::error::Result;
use crate::jpeg_io;
use crate::jumbf::GenericBox;
use crate::manifest::Manifest;
use crate::status_tracker::{DetailedStatusTracker, StatusTracker};
use crate::store::Store;
use crate::validation_status::ValidationStatus;

/// A verified (or verification-attempted) view of a JPEG's manifest.
pub struct Reader {
    store: Store,
    statuses: Vec<ValidationStatus>,
}

impl Reader {
    /// Extract and verify the manifest embedded in `jpeg_bytes`.
    ///
    /// Never fails just because validation found problems — those are
    /// reported through [`Reader::validation_status`]. It fails only
    /// when there is no manifest to read at all, or the JUMBF/CBOR
    /// framing itself is unparseable.
    pub fn from_jpeg_bytes(jpeg_bytes: &[u8]) -> Result<Self> {
        let jumbf_bytes = jpeg_io::read_jumbf_from_jpeg(jpeg_bytes)?;
        let root = GenericBox::read(&mut Cursor::new(jumbf_bytes))?;
        let store = Store::from_jumbf_box(&root)?;

        let mut tracker = DetailedStatusTracker::new();
        // A hard verification error (e.g. no signature at all) still
        // leaves a Reader the caller can inspect via validation_status;
        // only truly unreadable input reaches the caller as Err.
        if let Err(e) = store.verify_active_manifest(Some(jpeg_bytes), &mut tracker) {
            tracker.push(
                ValidationStatus::error(crate::validation_status::codes::GENERAL_ERROR)
                    .with_message(e.to_string()),
            );
        }

        Ok(Self {
            store,
            statuses: tracker.into_statuses(),
        })
    }

    /// The accumulated validation statuses from the verification pass.
    pub fn validation_status(&self) -> &[ValidationStatus] {
        &self.statuses
    }

    /// `true` if every status in [`Reader::validation_status`] is a
    /// success (or, there were none — only possible for an unsigned,
    /// unverified store built in-process).
    pub fn is_valid(&self) -> bool {
        !self.statuses.iter().any(|s| s.is_error)
    }

    pub fn active_manifest(&self) -> Option<&Manifest> {
        self.store.active_manifest()
    }

    pub fn json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.store.to_json()?)?)
    }
}

impl std::fmt::Display for Reader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.json() {
            Ok(s) => f.write_str(&s),
            Err(e) => write!(f, "<error rendering manifest: {e}>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assertion::Assertion;
    use crate::claim::Claim;
    use crate::hash_utils::HashAlg;
    use crate::signature::Signature;

    fn minimal_jpeg() -> Vec<u8> {
        let mut data = vec![0xFF, 0xD8];
        data.extend_from_slice(&[0xFF, 0xDA, 0x00, 0x02]);
        data.extend_from_slice(&[0xFF, 0xD9]);
        data
    }

    #[test]
    fn reads_back_a_store_embedded_by_jpeg_io() {
        let asset = minimal_jpeg();
        let claim = Claim::new("test/1.0", "image/jpeg", "xmp:iid:1234");
        let mut manifest = Manifest::new("urn:uuid:reader-test", claim);

        let mut dh = crate::assertions::DataHash::new(Some("jpeg manifest".into()), vec![]);
        dh.compute(HashAlg::Sha256, &asset).unwrap();
        manifest
            .add_assertion(Assertion::new_cbor("c2pa.hash.data", dh.to_cbor()))
            .unwrap();
        manifest.signature = Some(Signature::new(vec![0xAA; 8]));

        let mut store = Store::new();
        store.add_manifest(manifest).unwrap();
        let jumbf_bytes = store.to_jumbf_box().unwrap().to_bytes().unwrap();

        let mut jpeg = asset.clone();
        let mut pos = 2;
        for seg in jpeg_io::build_app11_segments(&jumbf_bytes, 1) {
            jpeg.splice(pos..pos, seg.iter().cloned());
            pos += seg.len();
        }

        // The signature above is a fake one (not a real COSE_Sign1), so
        // verification is expected to fail — this test only exercises
        // extraction and that the failure is reported as a status, not
        // a hard Err.
        let reader = Reader::from_jpeg_bytes(&jpeg).unwrap();
        assert!(!reader.is_valid());
        assert!(reader.active_manifest().is_some());
    }
}
