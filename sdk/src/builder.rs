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

//! Assembles a manifest from host-supplied assertions and signs it into
//! a JPEG. This is the facade the CLI drives; the SDK types underneath
//! (`Manifest`, `Store`, `jpeg_io`) stay free of any notion of "the
//! current build in progress".

use crate::assertion::Assertion;
use crate::assertions::{actions, creative_work, ingredient, Action, Actions, CreativeWork, Ingredient, Relationship};
use crate::claim::Claim;
use crate::error::{Error, Result};
use crate::hash_utils::HashAlg;
use crate::hashed_uri::make_hashed_uri;
use crate::jpeg_io;
use crate::manifest::Manifest;
use crate::signer::Signer;
use crate::store::Store;

pub struct Builder {
    manifest: Manifest,
    prior_manifests: Vec<Manifest>,
}

impl Builder {
    pub fn new(claim_generator: impl Into<String>, format: impl Into<String>, instance_id: impl Into<String>) -> Self {
        let manifest_label = format!("urn:uuid:{}", uuid::Uuid::new_v4());
        let claim = Claim::new(claim_generator, format, instance_id);
        Self {
            manifest: Manifest::new(manifest_label, claim),
            prior_manifests: Vec::new(),
        }
    }

    /// Override the default hash algorithm (sha256) before any
    /// assertions are added.
    pub fn with_hash_alg(mut self, alg: HashAlg) -> Self {
        self.manifest.claim.alg = alg.as_str().to_owned();
        self
    }

    pub fn add_creative_work(&mut self, document: serde_json::Value) -> Result<()> {
        let cw = CreativeWork::new(document);
        if !cw.is_well_formed() {
            return Err(Error::BadParam(
                "creative work document is missing @context/@type".into(),
            ));
        }
        self.manifest.add_assertion(Assertion::new_json(creative_work::LABEL, cw.0))
    }

    pub fn add_action(&mut self, action: Action) -> Result<()> {
        self.push_actions(vec![action])
    }

    fn push_actions(&mut self, new_actions: Vec<Action>) -> Result<()> {
        let actions = Actions { actions: new_actions };
        self.manifest
            .add_assertion(Assertion::new_json(actions::LABEL, serde_json::to_value(&actions)?))
    }

    /// Wrap `prior`'s active manifest as a `parentOf` ingredient of the
    /// manifest under construction, record a `c2pa.repackaged` action,
    /// and carry every one of `prior`'s manifests into the new store
    /// ahead of this one — the `--repackage` flow.
    pub fn repackage(&mut self, prior: &Store) -> Result<()> {
        let prior_manifest = prior
            .active_manifest()
            .ok_or(Error::NotFound("no prior manifest to repackage".into()))?
            .clone();

        let url = format!("self#jumbf=/c2pa/{}", prior_manifest.label);
        let alg = self.manifest.claim.hash_alg().unwrap_or(HashAlg::Sha256);
        let boxed = prior_manifest.to_jumbf_box()?;
        let c2pa_manifest = make_hashed_uri(url, alg, &boxed, true)?;

        let ingredient = Ingredient {
            title: prior_manifest.claim.instance_id.clone(),
            format: prior_manifest.claim.format.clone(),
            relationship: Relationship::ParentOf,
            c2pa_manifest: Some(c2pa_manifest),
        };
        self.manifest
            .add_assertion(Assertion::new_json(ingredient::LABEL, serde_json::to_value(&ingredient)?))?;
        self.push_actions(vec![Action::new("c2pa.repackaged")])?;

        self.prior_manifests.push(prior_manifest);
        Ok(())
    }

    /// Sign the manifest under construction and embed it into `asset`,
    /// a JPEG file's bytes.
    pub fn sign_into_jpeg(&self, asset: &[u8], signer: &dyn Signer) -> Result<Vec<u8>> {
        jpeg_io::embed_manifest_in_jpeg(asset, &self.prior_manifests, &self.manifest, signer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assertion::AssertionData;
    use crate::signature::Signature;

    fn store_with_signed_manifest(label: &str) -> Store {
        let claim = Claim::new("test/1.0", "image/jpeg", "xmp:iid:1234");
        let mut manifest = Manifest::new(label, claim);

        let mut dh = crate::assertions::DataHash::new(Some("jpeg manifest".into()), vec![]);
        dh.compute(HashAlg::Sha256, b"asset bytes").unwrap();
        manifest
            .add_assertion(Assertion::new_cbor(crate::assertions::data_hash::LABEL, dh.to_cbor()))
            .unwrap();
        manifest.signature = Some(Signature::new(vec![0xAA; 8]));

        let mut store = Store::new();
        store.add_manifest(manifest).unwrap();
        store
    }

    #[test]
    fn add_creative_work_rejects_malformed_document() {
        let mut builder = Builder::new("test/1.0", "image/jpeg", "xmp:iid:1234");
        assert!(builder.add_creative_work(serde_json::json!({"foo": "bar"})).is_err());
    }

    #[test]
    fn add_action_registers_an_assertion_and_claim_reference() {
        let mut builder = Builder::new("test/1.0", "image/jpeg", "xmp:iid:1234");
        builder.add_action(Action::new("c2pa.created")).unwrap();

        assert_eq!(builder.manifest.assertions.len(), 1);
        assert_eq!(builder.manifest.assertions[0].label, actions::LABEL);
        assert_eq!(builder.manifest.claim.assertions.len(), 1);
    }

    #[test]
    fn repackage_adds_ingredient_and_carries_prior_manifest_forward() {
        let prior = store_with_signed_manifest("urn:uuid:prior");
        let prior_label = prior.active_manifest().unwrap().label.clone();

        let mut builder = Builder::new("test/1.0", "image/jpeg", "xmp:iid:1234");
        builder.repackage(&prior).unwrap();

        assert_eq!(builder.prior_manifests.len(), 1);
        assert_eq!(builder.prior_manifests[0].label, prior_label);

        let ingredient_assertion = builder
            .manifest
            .assertions
            .iter()
            .find(|a| a.label == ingredient::LABEL)
            .unwrap();
        let AssertionData::Json(v) = &ingredient_assertion.data else {
            panic!("ingredient assertion should be JSON");
        };
        assert_eq!(v["relationship"], "parentOf");

        assert!(builder
            .manifest
            .assertions
            .iter()
            .any(|a| a.label == actions::LABEL));
    }
}
