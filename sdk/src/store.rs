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

//! The root of the C2PA tree: an ordered list of manifests, one of
//! which is "active" (the last one added, matching the convention that
//! the most recently appended manifest describes the current state of
//! the asset). `Store` is the only type that can see every manifest at
//! once, so cross-manifest/cross-assertion checks live here: the
//! hard-binding count is enforced before signing (`sign_active_manifest`
//! fails before any key is touched), while `claim.multiple` and
//! `manifest.multipleParents` are verify-time statuses reported by
//! `verify_active_manifest` rather than hard errors at construction
//! time — a store should still be able to load and report on a
//! malformed manifest, not just refuse to hold one.

use crate::assertion::AssertionData;
use crate::assertions::ingredient::Relationship;
use crate::cert_profile::{check_certificate_profile, CertPurpose};
use crate::claim;
use crate::cose_sign;
use crate::cose_validator::verify_cose;
use crate::error::{Error, Result};
use crate::hash_utils::HashAlg;
use crate::hashed_uri::verify_hashed_uri;
use crate::jumbf::description::ExtensionSubtype;
use crate::jumbf::{self, content, Description, GenericBox};
use crate::manifest::Manifest;
use crate::signature::Signature;
use crate::signer::Signer;
use crate::status_tracker::StatusTracker;
use crate::url::JumbfUrl;
use crate::validation_status::{codes, ValidationStatus};

pub const STORE_LABEL: &str = "c2pa";

#[derive(Debug, Clone, Default)]
pub struct Store {
    manifests: Vec<Manifest>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn manifests(&self) -> &[Manifest] {
        &self.manifests
    }

    pub fn active_manifest(&self) -> Option<&Manifest> {
        self.manifests.last()
    }

    pub fn active_manifest_mut(&mut self) -> Option<&mut Manifest> {
        self.manifests.last_mut()
    }

    /// Append a manifest. Whether it's actually well-formed — at most
    /// one `parentOf` ingredient, exactly one `c2pa.claim` box — is
    /// reported by [`Store::verify_active_manifest`], not enforced here:
    /// a reader needs to be able to load a malformed manifest in order
    /// to report what's wrong with it.
    pub fn add_manifest(&mut self, manifest: Manifest) -> Result<()> {
        self.manifests.push(manifest);
        Ok(())
    }

    pub fn to_jumbf_box(&self) -> Result<GenericBox> {
        let desc = Description::new(ExtensionSubtype::from_alias(b"c2pa"))
            .requestable(true)
            .with_label(STORE_LABEL)?;
        let desc_box = GenericBox::leaf(*b"jumd", desc.write()?);

        let mut children = vec![desc_box];
        for m in &self.manifests {
            children.push(m.to_jumbf_box()?);
        }
        Ok(GenericBox::container(*b"jumb", children))
    }

    pub fn from_jumbf_box(b: &GenericBox) -> Result<Self> {
        let manifests = b
            .children()
            .iter()
            .filter(|c| &c.box_type == b"jumb")
            .map(Manifest::from_jumbf_box)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { manifests })
    }

    /// Resolve a `self#jumbf=` URL against this store's encoded tree.
    pub fn find(&self, url: &str) -> Result<GenericBox> {
        let parsed = JumbfUrl::parse(url).ok_or_else(|| Error::NotFound(url.to_string()))?;
        let root = self.to_jumbf_box()?;

        let mut segments = parsed.path.iter();
        match segments.next() {
            Some(seg) if jumbf::label_of(&root).as_deref() == Some(seg.as_str()) => {}
            _ => return Err(Error::NotFound(url.to_string())),
        }

        let mut current = root;
        for seg in segments {
            let child = jumbf::find_child_by_label(&current, seg)
                .ok_or_else(|| Error::NotFound(url.to_string()))?
                .clone();
            current = child;
        }
        Ok(current)
    }

    /// Sign the active manifest's claim, reserving `signer.reserve_size()`
    /// bytes for the `COSE_Sign1` structure, and attach the result as
    /// that manifest's signature. Scans the claim's hard-binding count
    /// first and fails before `signer` is ever asked to sign anything:
    /// a claim with zero or more than one hard binding can never be
    /// made valid by signing it.
    pub fn sign_active_manifest(&mut self, signer: &dyn Signer) -> Result<()> {
        let box_size = signer.reserve_size();
        let manifest = self
            .active_manifest()
            .ok_or(Error::ClaimMissingField("no active manifest"))?;
        manifest.claim.build()?;

        match manifest.claim.hard_binding_indices().len() {
            0 => return Err(Error::ClaimHardBindingsMissing),
            1 => {}
            _ => return Err(Error::MultipleHardBindings),
        }

        let claim_bytes = content::encode_cbor(&manifest.claim.to_cbor())?;
        let cose = cose_sign::sign_claim(&claim_bytes, signer, box_size)?;

        self.active_manifest_mut().unwrap().signature = Some(Signature::new(cose));
        Ok(())
    }

    /// Full verification of the active manifest: claim structure,
    /// signature, certificate chain (leaf via `verify_cose`, every
    /// intermediate here), every assertion's hashed-URI binding, every
    /// ingredient's hashed-URI binding, and (if `asset` is supplied) the
    /// hard-binding data-hash against the asset bytes. Accumulates every
    /// outcome on `tracker` rather than stopping at the first failure —
    /// only a structurally missing active manifest aborts with `Err`.
    pub fn verify_active_manifest(&self, asset: Option<&[u8]>, tracker: &mut dyn StatusTracker) -> Result<()> {
        let manifest = self
            .active_manifest()
            .ok_or(Error::ClaimMissingField("no active manifest"))?;

        if manifest.claim_box_count > 1 {
            tracker.push(ValidationStatus::error(codes::CLAIM_MULTIPLE));
        }

        let Some(signature) = manifest.signature.as_ref() else {
            tracker.push(ValidationStatus::error(codes::CLAIM_SIGNATURE_MISSING));
            return Ok(());
        };

        let claim_bytes = content::encode_cbor(&manifest.claim.to_cbor())?;
        let chain = verify_cose(&signature.cose_sign1, &claim_bytes, b"", false, tracker)?;

        // `verify_cose` already profiled the leaf (chain[0]) against the
        // COSE header's claimed algorithm; every certificate behind it
        // is only ever acting as a CA, so it's checked without an
        // expected signing algorithm of its own.
        for (i, cert_der) in chain.iter().enumerate().skip(1) {
            match check_certificate_profile(cert_der, None, CertPurpose::Ca, i, chrono::Utc::now()) {
                Ok(statuses) => {
                    for status in statuses {
                        tracker.push(status);
                    }
                }
                Err(e) => tracker.push(ValidationStatus::error(codes::GENERAL_ERROR).with_message(e.to_string())),
            }
        }

        let default_alg = manifest.claim.hash_alg().unwrap_or(HashAlg::Sha256);
        for (i, href) in manifest.claim.assertions.iter().enumerate() {
            match self.find(&href.url) {
                Ok(target) => match verify_hashed_uri(href, default_alg, &target) {
                    Ok(true) => tracker.push(ValidationStatus::ok(codes::ASSERTION_HASHEDURI_MATCH)),
                    Ok(false) => tracker.push(
                        ValidationStatus::error(codes::ASSERTION_HASHEDURI_MISMATCH)
                            .with_url(href.url.clone()),
                    ),
                    Err(e) => tracker.push(
                        ValidationStatus::error(codes::GENERAL_ERROR).with_message(e.to_string()),
                    ),
                },
                Err(_) => tracker.push(
                    ValidationStatus::error(codes::ASSERTION_MISSING)
                        .with_url(href.url.clone())
                        .with_message(format!("assertion {i} referenced by claim could not be resolved")),
                ),
            }
        }

        if let (Some(asset), Some(hard_binding)) = (asset, manifest.hard_binding_assertion()) {
            if let AssertionData::Cbor(v) = &hard_binding.data {
                match crate::assertions::DataHash::from_cbor(v) {
                    Ok(dh) => match dh.verify(default_alg, asset) {
                        Ok(true) => tracker.push(ValidationStatus::ok(codes::ASSERTION_DATAHASH_MATCH)),
                        Ok(false) => tracker.push(ValidationStatus::error(codes::ASSERTION_DATAHASH_MISMATCH)),
                        Err(e) => tracker.push(ValidationStatus::error(codes::GENERAL_ERROR).with_message(e.to_string())),
                    },
                    Err(e) => tracker.push(ValidationStatus::error(codes::GENERAL_ERROR).with_message(e.to_string())),
                }
            }
        }

        let ingredients: Vec<crate::assertions::Ingredient> = manifest
            .ingredient_assertions()
            .iter()
            .filter_map(|a| match &a.data {
                AssertionData::Json(v) => serde_json::from_value::<crate::assertions::Ingredient>(v.clone()).ok(),
                _ => None,
            })
            .collect();

        for ingredient in &ingredients {
            let Some(href) = &ingredient.c2pa_manifest else { continue };
            match self.find(&href.url) {
                Ok(target) => match verify_hashed_uri(href, default_alg, &target) {
                    Ok(true) => tracker.push(ValidationStatus::ok(codes::INGREDIENT_HASHEDURI_MATCH)),
                    Ok(false) => tracker.push(
                        ValidationStatus::error(codes::INGREDIENT_HASHEDURI_MISMATCH).with_url(href.url.clone()),
                    ),
                    Err(e) => tracker.push(ValidationStatus::error(codes::GENERAL_ERROR).with_message(e.to_string())),
                },
                Err(_) => tracker.push(
                    ValidationStatus::error(codes::INGREDIENT_HASHEDURI_MISMATCH)
                        .with_url(href.url.clone())
                        .with_message("ingredient's manifest reference could not be resolved"),
                ),
            }
        }

        let parent_count = ingredients
            .iter()
            .filter(|i| i.relationship == Relationship::ParentOf)
            .count();
        if parent_count > 1 {
            tracker.push(ValidationStatus::error(codes::MANIFEST_MULTIPLE_PARENTS));
        }

        Ok(())
    }

    pub fn to_json(&self) -> Result<serde_json::Value> {
        let manifests = self
            .manifests
            .iter()
            .map(|m| {
                serde_json::json!({
                    "label": m.label,
                    "claim_generator": m.claim.claim_generator,
                    "format": m.claim.format,
                    "instance_id": m.claim.instance_id,
                    "assertions": m.assertions.iter().map(|a| a.label_with_instance()).collect::<Vec<_>>(),
                    "signed": m.signature.is_some(),
                })
            })
            .collect::<Vec<_>>();

        Ok(serde_json::json!({
            "active_manifest": self.active_manifest().map(|m| m.label.clone()),
            "manifests": manifests,
        }))
    }
}

/// Re-exported so callers constructing a claim don't need to import
/// `claim` directly just to name its label constant.
pub use claim::LABEL as CLAIM_LABEL;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assertion::Assertion;
    use crate::claim::Claim;

    fn manifest_with_hard_binding(label: &str, asset: &[u8]) -> Manifest {
        let claim = Claim::new("test/1.0", "image/jpeg", "xmp:iid:1234");
        let mut m = Manifest::new(label, claim);

        let mut dh = crate::assertions::DataHash::new(Some("jpeg manifest".into()), vec![]);
        dh.compute(HashAlg::Sha256, asset).unwrap();
        m.add_assertion(Assertion::new_cbor("c2pa.hash.data", dh.to_cbor())).unwrap();
        m
    }

    #[test]
    fn find_resolves_assertion_by_absolute_url() {
        let mut store = Store::new();
        let mut m = manifest_with_hard_binding("urn:uuid:1", b"asset-bytes");
        m.signature = Some(Signature::new(vec![0; 8]));
        let href = m.claim.assertions[0].url.clone();
        store.add_manifest(m).unwrap();

        assert!(store.find(&href).is_ok());
    }

    #[test]
    fn reports_multiple_parents_at_verify_time() {
        let claim = Claim::new("test/1.0", "image/jpeg", "xmp:iid:1234");
        let mut m = Manifest::new("urn:uuid:2", claim);

        for _ in 0..2 {
            let ingredient = crate::assertions::Ingredient {
                title: "parent.jpg".into(),
                format: "image/jpeg".into(),
                relationship: Relationship::ParentOf,
                c2pa_manifest: None,
            };
            let v = serde_json::to_value(&ingredient).unwrap();
            m.add_assertion(Assertion::new_json("c2pa.ingredient", v)).unwrap();
        }

        let mut store = Store::new();
        store.add_manifest(m).unwrap();

        let mut tracker = crate::status_tracker::DetailedStatusTracker::new();
        store.verify_active_manifest(None, &mut tracker).unwrap();

        assert!(tracker
            .statuses()
            .iter()
            .any(|s| s.code == codes::MANIFEST_MULTIPLE_PARENTS));
    }

    #[test]
    fn reports_missing_signature_without_aborting() {
        let claim = Claim::new("test/1.0", "image/jpeg", "xmp:iid:1234");
        let m = Manifest::new("urn:uuid:4", claim);

        let mut store = Store::new();
        store.add_manifest(m).unwrap();

        let mut tracker = crate::status_tracker::DetailedStatusTracker::new();
        store.verify_active_manifest(None, &mut tracker).unwrap();

        assert!(tracker
            .statuses()
            .iter()
            .any(|s| s.code == codes::CLAIM_SIGNATURE_MISSING));
    }

    #[test]
    fn sign_active_manifest_fails_without_a_hard_binding() {
        struct NoopSigner;
        impl Signer for NoopSigner {
            fn sign(&self, _data: &[u8]) -> Result<Vec<u8>> {
                Ok(vec![0u8; 8])
            }
            fn alg(&self) -> crate::signer::SigningAlg {
                crate::signer::SigningAlg::Es256
            }
            fn cert_chain(&self) -> Result<Vec<Vec<u8>>> {
                Ok(vec![vec![0x30, 0x03, 0x02, 0x01, 0x00]])
            }
            fn reserve_size(&self) -> usize {
                2048
            }
        }

        let claim = Claim::new("test/1.0", "image/jpeg", "xmp:iid:1234");
        let m = Manifest::new("urn:uuid:5", claim);
        let mut store = Store::new();
        store.add_manifest(m).unwrap();

        let err = store.sign_active_manifest(&NoopSigner).unwrap_err();
        assert!(matches!(err, Error::ClaimHardBindingsMissing));
    }

    #[test]
    fn to_json_reports_active_manifest() {
        let mut store = Store::new();
        let m = manifest_with_hard_binding("urn:uuid:3", b"asset");
        store.add_manifest(m).unwrap();

        let json = store.to_json().unwrap();
        assert_eq!(json["active_manifest"], "urn:uuid:3");
    }
}
