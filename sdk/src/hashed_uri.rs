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

//! The hashed-URI cross-reference: a `self#jumbf=...` URL plus the digest
//! of the box it points at, used by claims to bind assertions and by
//! assertions (ingredient, data-hash) to bind other structures without
//! duplicating their bytes.
//!
//! The digest covers a target `jumb` box's *children* (its `jumd`
//! description plus its content box(es)), not the four/eight byte
//! superbox header — re-framing the same bytes in an extended-length box
//! must not change the hash.

use serde::{Deserialize, Serialize};
use sha2::Digest as _;

use crate::error::{Error, Result};
use crate::hash_utils::HashAlg;
use crate::jumbf::GenericBox;
use crate::url::JumbfUrl;

/// A `self#jumbf=` URL plus the digest of the box it names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HashedUri {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    #[serde(with = "serde_bytes")]
    pub hash: Vec<u8>,
}

impl HashedUri {
    pub fn new(url: impl Into<String>, alg: Option<String>, hash: Vec<u8>) -> Self {
        Self {
            url: url.into(),
            alg,
            hash,
        }
    }

    pub fn parsed_url(&self) -> Option<JumbfUrl> {
        JumbfUrl::parse(&self.url)
    }

    /// Resolve the algorithm this reference actually hashed with:
    /// its own `alg` field if present, else `default_alg` (the nearest
    /// CBOR ancestor's algorithm, or ultimately the claim's algorithm —
    /// the caller supplies the already-resolved fallback).
    pub fn effective_alg(&self, default_alg: HashAlg) -> Result<HashAlg> {
        match &self.alg {
            Some(s) => HashAlg::from_str(s).ok_or_else(|| Error::BadParam(format!("unsupported hash alg {s}"))),
            None => Ok(default_alg),
        }
    }
}

/// Digest the children of `target` (its description box plus its
/// content box(es)) under `alg`, in child order, as one continuous
/// digest input.
pub fn hash_target_box(target: &GenericBox, alg: HashAlg) -> Result<Vec<u8>> {
    let child_bytes = target.child_bytes()?;
    Ok(hash_concatenated(alg, &child_bytes))
}

fn hash_concatenated(alg: HashAlg, chunks: &[Vec<u8>]) -> Vec<u8> {
    match alg {
        HashAlg::Sha256 => {
            let mut d = sha2::Sha256::new();
            for c in chunks {
                d.update(c);
            }
            d.finalize().to_vec()
        }
        HashAlg::Sha384 => {
            let mut d = sha2::Sha384::new();
            for c in chunks {
                d.update(c);
            }
            d.finalize().to_vec()
        }
        HashAlg::Sha512 => {
            let mut d = sha2::Sha512::new();
            for c in chunks {
                d.update(c);
            }
            d.finalize().to_vec()
        }
    }
}

/// Build a [`HashedUri`] pointing at `target`, addressed by `url`.
pub fn make_hashed_uri(
    url: impl Into<String>,
    alg: HashAlg,
    target: &GenericBox,
    explicit_alg: bool,
) -> Result<HashedUri> {
    let hash = hash_target_box(target, alg)?;
    Ok(HashedUri::new(
        url,
        explicit_alg.then(|| alg.as_str().to_owned()),
        hash,
    ))
}

/// Recompute `target`'s digest and compare against `reference.hash`.
pub fn verify_hashed_uri(reference: &HashedUri, default_alg: HashAlg, target: &GenericBox) -> Result<bool> {
    let alg = reference.effective_alg(default_alg)?;
    let actual = hash_target_box(target, alg)?;
    Ok(actual == reference.hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_box() -> GenericBox {
        let desc = GenericBox::leaf(*b"jumd", b"description-bytes".to_vec());
        let content = GenericBox::leaf(*b"cbor", b"\xa1\x01\x02".to_vec());
        GenericBox::container(*b"jumb", vec![desc, content])
    }

    #[test]
    fn hash_changes_with_children_not_header() {
        let b = sample_box();
        let h1 = hash_target_box(&b, HashAlg::Sha256).unwrap();

        // Re-wrap the same children under a different box type (simulating
        // a different superbox framing): hash must be identical, since it
        // only covers the children's own encoded bytes.
        let rewrapped = GenericBox::container(*b"uuid", b.children().to_vec());
        let h2 = hash_target_box(&rewrapped, HashAlg::Sha256).unwrap();

        assert_eq!(h1, h2);
    }

    #[test]
    fn verify_detects_mutation() {
        let b = sample_box();
        let reference = make_hashed_uri("self#jumbf=/c2pa/urn:foo", HashAlg::Sha256, &b, true).unwrap();
        assert!(verify_hashed_uri(&reference, HashAlg::Sha256, &b).unwrap());

        let mut mutated = b.clone();
        if let Some(children) = mutated.children_mut() {
            children.push(GenericBox::leaf(*b"pad ", vec![0]));
        }
        assert!(!verify_hashed_uri(&reference, HashAlg::Sha256, &mutated).unwrap());
    }

    #[test]
    fn effective_alg_falls_back_to_default() {
        let h = HashedUri::new("self#jumbf=/x", None, vec![0; 32]);
        assert_eq!(h.effective_alg(HashAlg::Sha384).unwrap(), HashAlg::Sha384);

        let h2 = HashedUri::new("self#jumbf=/x", Some("sha512".into()), vec![0; 64]);
        assert_eq!(h2.effective_alg(HashAlg::Sha256).unwrap(), HashAlg::Sha512);
    }
}
