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

//! A single manifest: one assertion store, one claim, and (once signed)
//! one signature, all nested under a `jumb` box labeled with the
//! manifest's own URN. `store::Store` owns the cross-manifest
//! invariants (active manifest, hard-binding count before signing,
//! `parentOf`-ingredient count at verify time); `Manifest` only knows
//! how to assemble and parse its own subtree, and refuses to add a
//! second hard-binding assertion to a single claim outright since that
//! can never be a valid thing to build.

use crate::assertion::{Assertion, AssertionKind};
use crate::claim::Claim;
use crate::error::{Error, Result};
use crate::hash_utils::HashAlg;
use crate::hashed_uri::make_hashed_uri;
use crate::jumbf::description::ExtensionSubtype;
use crate::jumbf::{self, Description, GenericBox};
use crate::signature::Signature;

pub const ASSERTIONS_LABEL: &str = "c2pa.assertions";

#[derive(Debug, Clone)]
pub struct Manifest {
    pub label: String,
    pub assertions: Vec<Assertion>,
    pub claim: Claim,
    pub signature: Option<Signature>,
    /// How many `c2pa.claim`-labeled children this manifest's box
    /// actually had when it was parsed. A freshly built manifest always
    /// has exactly one; a malformed parsed one may have more, which
    /// `store::Store::verify_active_manifest` reports as `claim.multiple`.
    pub claim_box_count: usize,
}

impl Manifest {
    pub fn new(label: impl Into<String>, claim: Claim) -> Self {
        Self {
            label: label.into(),
            assertions: Vec::new(),
            claim,
            signature: None,
            claim_box_count: 1,
        }
    }

    /// Append an assertion, auto-assigning the next instance number if
    /// another assertion with the same label is already present, and
    /// wire a hashed-URI reference to it into the claim. Rejects a
    /// second hard-binding assertion immediately: a claim with two hard
    /// bindings is never valid, so there is no reason to let it through
    /// to `store::Store::sign_active_manifest`'s pre-sign scan.
    pub fn add_assertion(&mut self, mut assertion: Assertion) -> Result<()> {
        if assertion.kind() == AssertionKind::HardBinding && !self.hard_binding_assertions().is_empty() {
            return Err(Error::MultipleHardBindings);
        }

        let instance = self
            .assertions
            .iter()
            .filter(|a| a.label == assertion.label)
            .count() as u32
            + 1;
        assertion.instance = instance;

        let boxed = assertion.to_jumbf_box()?;
        let alg = self.claim.hash_alg().unwrap_or(HashAlg::Sha256);
        let url = format!(
            "self#jumbf=/c2pa/{}/{}/{}",
            self.label,
            ASSERTIONS_LABEL,
            assertion.label_with_instance()
        );
        let href = make_hashed_uri(url, alg, &boxed, false)?;

        self.assertions.push(assertion);
        self.claim.add_assertion(href);
        Ok(())
    }

    fn build_assertion_store(&self) -> Result<GenericBox> {
        let desc = Description::new(ExtensionSubtype::from_alias(b"c2pa"))
            .requestable(true)
            .with_label(ASSERTIONS_LABEL)?;
        let desc_box = GenericBox::leaf(*b"jumd", desc.write()?);

        let mut children = vec![desc_box];
        for a in &self.assertions {
            children.push(a.to_jumbf_box()?);
        }
        Ok(GenericBox::container(*b"jumb", children))
    }

    pub fn to_jumbf_box(&self) -> Result<GenericBox> {
        self.claim.build()?;
        let signature = self
            .signature
            .as_ref()
            .ok_or(Error::ClaimMissingField("manifest has not been signed"))?;

        let desc = Description::new(ExtensionSubtype::from_alias(b"c2pa"))
            .requestable(true)
            .with_label(self.label.clone())?;
        let desc_box = GenericBox::leaf(*b"jumd", desc.write()?);

        Ok(GenericBox::container(
            *b"jumb",
            vec![
                desc_box,
                self.build_assertion_store()?,
                self.claim.to_jumbf_box()?,
                signature.to_jumbf_box()?,
            ],
        ))
    }

    pub fn from_jumbf_box(b: &GenericBox) -> Result<Self> {
        let label = jumbf::label_of(b)
            .ok_or_else(|| Error::JumbfParse("manifest box missing label".into()))?;

        let assertion_store = jumbf::find_child_by_label(b, ASSERTIONS_LABEL)
            .ok_or_else(|| Error::JumbfParse("manifest missing assertion store".into()))?;
        let assertions = assertion_store
            .children()
            .iter()
            .filter(|c| &c.box_type == b"jumb")
            .map(Assertion::from_jumbf_box)
            .collect::<Result<Vec<_>>>()?;

        let claim_box_count = b
            .children()
            .iter()
            .filter(|c| jumbf::label_of(c).as_deref() == Some(crate::claim::LABEL))
            .count();
        let claim_box = jumbf::find_child_by_label(b, crate::claim::LABEL)
            .ok_or_else(|| Error::JumbfParse("manifest missing claim".into()))?;
        let claim = Claim::from_jumbf_box(claim_box)?;

        let signature = jumbf::find_child_by_label(b, crate::signature::LABEL)
            .map(Signature::from_jumbf_box)
            .transpose()?;

        Ok(Self {
            label,
            assertions,
            claim,
            signature,
            claim_box_count,
        })
    }

    /// Every assertion whose own label marks it as a hard binding (see
    /// `claim::HARD_BINDING_LABELS`), in store order. A signable
    /// manifest has exactly one.
    pub fn hard_binding_assertions(&self) -> Vec<&Assertion> {
        self.assertions
            .iter()
            .filter(|a| a.kind() == AssertionKind::HardBinding)
            .collect()
    }

    /// The manifest's unique hard-binding assertion, if it has exactly
    /// one. `None` both when there isn't one yet and when there's more
    /// than one — callers that need to tell those apart should use
    /// [`Manifest::hard_binding_assertions`] directly.
    pub fn hard_binding_assertion(&self) -> Option<&Assertion> {
        let mut found = self.hard_binding_assertions().into_iter();
        let first = found.next()?;
        if found.next().is_some() {
            None
        } else {
            Some(first)
        }
    }

    /// Every assertion whose own label marks it as a `c2pa.ingredient`.
    pub fn ingredient_assertions(&self) -> Vec<&Assertion> {
        self.assertions
            .iter()
            .filter(|a| a.kind() == AssertionKind::Ingredient)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use ciborium::value::Value as CborValue;

    use super::*;

    fn sample_manifest() -> Manifest {
        let claim = Claim::new("test/1.0", "image/jpeg", "xmp:iid:1234");
        Manifest::new("urn:uuid:00000000-0000-0000-0000-000000000000", claim)
    }

    #[test]
    fn round_trips_with_assertions_and_signature() {
        let mut m = sample_manifest();
        m.add_assertion(Assertion::new_cbor(
            "c2pa.hash.data",
            CborValue::Map(vec![(CborValue::Text("hash".into()), CborValue::Bytes(vec![0; 32]))]),
        ))
        .unwrap();
        m.signature = Some(Signature::new(vec![0xAA; 16]));

        let boxed = m.to_jumbf_box().unwrap();
        let parsed = Manifest::from_jumbf_box(&boxed).unwrap();

        assert_eq!(parsed.label, m.label);
        assert_eq!(parsed.assertions.len(), 1);
        assert_eq!(parsed.signature, m.signature);
        assert_eq!(parsed.claim_box_count, 1);
        assert!(parsed.hard_binding_assertion().is_some());
    }

    #[test]
    fn to_jumbf_box_requires_signature() {
        let mut m = sample_manifest();
        m.add_assertion(Assertion::new_json("c2pa.hash.data", serde_json::json!({})))
            .unwrap();
        assert!(m.to_jumbf_box().is_err());
    }

    #[test]
    fn rejects_a_second_hard_binding_assertion() {
        let mut m = sample_manifest();
        m.add_assertion(Assertion::new_cbor("c2pa.hash.data", CborValue::Map(vec![])))
            .unwrap();
        let err = m
            .add_assertion(Assertion::new_cbor("c2pa.hash.bmff", CborValue::Map(vec![])))
            .unwrap_err();
        assert!(matches!(err, Error::MultipleHardBindings));
    }
}
