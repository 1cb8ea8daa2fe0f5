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

//! `c2pa.claim`: the CBOR document a manifest signs. It never carries
//! assertion payloads itself — only hashed-URI references into the
//! sibling assertion store. Which of those references is the hard
//! binding is derived from the referenced assertion's own label (see
//! [`HARD_BINDING_LABELS`]) rather than stored separately, so it can't
//! drift out of sync with the assertion store across a CBOR round trip.

use ciborium::value::Value as CborValue;

use crate::error::{Error, Result};
use crate::hash_utils::HashAlg;
use crate::hashed_uri::HashedUri;
use crate::jumbf::description::ExtensionSubtype;
use crate::jumbf::{content, Description, GenericBox};

pub const LABEL: &str = "c2pa.claim";

/// Assertion labels that mark a hard (data-hash) binding. A claim never
/// stores "which assertion is the hard binding" as a separate field —
/// that bit of state didn't survive a CBOR round trip when it was one —
/// so [`Claim::hard_binding_indices`] derives it by matching this list
/// against the label segment of each assertion's own hashed-URI.
pub const HARD_BINDING_LABELS: &[&str] = &[
    crate::assertions::data_hash::LABEL,
    crate::assertions::bmff_hash::LABEL,
];

#[derive(Debug, Clone, PartialEq)]
pub struct Claim {
    pub claim_generator: String,
    pub claim_generator_info: Option<serde_json::Value>,
    pub alg: String,
    pub format: String,
    pub instance_id: String,
    /// Hashed-URI references to every assertion this claim covers, in
    /// the order they were added.
    pub assertions: Vec<HashedUri>,
    /// Set once the claim has been wrapped in a COSE_Sign1 and boxed;
    /// empty before signing.
    pub signature_ref: Option<HashedUri>,
}

impl Claim {
    pub fn new(
        claim_generator: impl Into<String>,
        format: impl Into<String>,
        instance_id: impl Into<String>,
    ) -> Self {
        Self {
            claim_generator: claim_generator.into(),
            claim_generator_info: None,
            alg: HashAlg::Sha256.as_str().to_owned(),
            format: format.into(),
            instance_id: instance_id.into(),
            assertions: Vec::new(),
            signature_ref: None,
        }
    }

    pub fn hash_alg(&self) -> Result<HashAlg> {
        HashAlg::from_str(&self.alg).ok_or_else(|| Error::BadParam(format!("unsupported hash alg {}", self.alg)))
    }

    /// Add a reference to an assertion already placed in the assertion
    /// store.
    pub fn add_assertion(&mut self, href: HashedUri) {
        self.assertions.push(href);
    }

    /// Indices into `assertions` whose referenced assertion label is a
    /// hard binding label (see [`HARD_BINDING_LABELS`]), in the order
    /// they were added. A well-formed, signable claim has exactly one;
    /// `store::Store` is what enforces that — this only reports what's
    /// actually there so both the zero and the too-many case can be
    /// told apart at the call site.
    pub fn hard_binding_indices(&self) -> Vec<usize> {
        self.assertions
            .iter()
            .enumerate()
            .filter(|(_, href)| {
                href.parsed_url()
                    .and_then(|u| u.path.last().cloned())
                    .map(|label| {
                        let base = crate::jumbf::registry::strip_instance_suffix(&label)
                            .unwrap_or(&label)
                            .to_owned();
                        HARD_BINDING_LABELS.contains(&base.as_str())
                    })
                    .unwrap_or(false)
            })
            .map(|(i, _)| i)
            .collect()
    }

    /// Assemble the claim ready to be signed. Hard-binding-count
    /// enforcement lives in `store::Store::sign_active_manifest`, which
    /// can report `claim.hardBindings.missing` vs
    /// `assertion.multipleHardBindings` as distinct failures; this only
    /// checks the claim's own required fields are present.
    pub fn build(&self) -> Result<()> {
        if self.claim_generator.is_empty() {
            return Err(Error::ClaimMissingField("claim_generator"));
        }
        if self.format.is_empty() {
            return Err(Error::ClaimMissingField("dc:format"));
        }
        if self.instance_id.is_empty() {
            return Err(Error::ClaimMissingField("instanceID"));
        }
        Ok(())
    }

    pub fn to_cbor(&self) -> CborValue {
        let mut entries = vec![
            (
                CborValue::Text("claim_generator".into()),
                CborValue::Text(self.claim_generator.clone()),
            ),
            (CborValue::Text("alg".into()), CborValue::Text(self.alg.clone())),
            (
                CborValue::Text("dc:format".into()),
                CborValue::Text(self.format.clone()),
            ),
            (
                CborValue::Text("instanceID".into()),
                CborValue::Text(self.instance_id.clone()),
            ),
            (
                CborValue::Text("assertions".into()),
                CborValue::Array(
                    self.assertions
                        .iter()
                        .map(|h| {
                            let mut m = vec![
                                (CborValue::Text("url".into()), CborValue::Text(h.url.clone())),
                                (CborValue::Text("hash".into()), CborValue::Bytes(h.hash.clone())),
                            ];
                            if let Some(alg) = &h.alg {
                                m.push((CborValue::Text("alg".into()), CborValue::Text(alg.clone())));
                            }
                            CborValue::Map(m)
                        })
                        .collect(),
                ),
            ),
        ];
        if let Some(info) = &self.claim_generator_info {
            if let Ok(v) = serde_json::to_vec(info) {
                if let Ok(cbor) = content::decode_json(&v) {
                    entries.push((
                        CborValue::Text("claim_generator_info".into()),
                        CborValue::Text(cbor.to_string()),
                    ));
                }
            }
        }
        if let Some(sig) = &self.signature_ref {
            entries.push((
                CborValue::Text("signature".into()),
                CborValue::Text(sig.url.clone()),
            ));
        }
        CborValue::Map(entries)
    }

    pub fn from_cbor(value: &CborValue) -> Result<Self> {
        let map = value
            .as_map()
            .ok_or_else(|| Error::JumbfParse("c2pa.claim is not a CBOR map".into()))?;
        let get = |key: &str| map.iter().find(|(k, _)| k.as_text() == Some(key)).map(|(_, v)| v);
        let text = |key: &str| -> Result<String> {
            get(key)
                .and_then(CborValue::as_text)
                .map(str::to_owned)
                .ok_or(Error::ClaimMissingField("missing required claim field"))
        };

        let assertions: Vec<HashedUri> = get("assertions")
            .and_then(CborValue::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(|item| {
                        let m = item.as_map()?;
                        let url = m
                            .iter()
                            .find(|(k, _)| k.as_text() == Some("url"))?
                            .1
                            .as_text()?
                            .to_owned();
                        let hash = m
                            .iter()
                            .find(|(k, _)| k.as_text() == Some("hash"))?
                            .1
                            .as_bytes()?
                            .clone();
                        let alg = m
                            .iter()
                            .find(|(k, _)| k.as_text() == Some("alg"))
                            .and_then(|(_, v)| v.as_text())
                            .map(str::to_owned);
                        Some(HashedUri::new(url, alg, hash))
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            claim_generator: text("claim_generator")?,
            claim_generator_info: None,
            alg: text("alg")?,
            format: text("dc:format")?,
            instance_id: text("instanceID")?,
            assertions,
            signature_ref: get("signature")
                .and_then(CborValue::as_text)
                .map(|u| HashedUri::new(u, None, Vec::new())),
        })
    }

    pub fn to_jumbf_box(&self) -> Result<GenericBox> {
        let desc = Description::new(ExtensionSubtype::from_alias(b"cbor"))
            .requestable(true)
            .with_label(LABEL)?;
        let desc_box = GenericBox::leaf(*b"jumd", desc.write()?);
        let content_box = GenericBox::leaf(*b"cbor", content::encode_cbor(&self.to_cbor())?);
        Ok(GenericBox::container(*b"jumb", vec![desc_box, content_box]))
    }

    pub fn from_jumbf_box(b: &GenericBox) -> Result<Self> {
        let content_box = b
            .children()
            .iter()
            .find(|c| &c.box_type == b"cbor")
            .ok_or_else(|| Error::JumbfParse("claim box missing cbor content".into()))?;
        let payload = content_box
            .raw()
            .ok_or_else(|| Error::JumbfParse("claim content box must be a leaf".into()))?;
        Self::from_cbor(&content::decode_cbor(payload)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_requires_claim_fields() {
        let claim = Claim::new("", "image/jpeg", "xmp:iid:1234");
        assert!(claim.build().is_err());
    }

    #[test]
    fn round_trips_through_jumbf_box() {
        let mut claim = Claim::new("test/1.0", "image/jpeg", "xmp:iid:1234");
        claim.add_assertion(HashedUri::new(
            "self#jumbf=/c2pa.assertions/c2pa.hash.data",
            None,
            vec![1; 32],
        ));
        claim.build().unwrap();

        let boxed = claim.to_jumbf_box().unwrap();
        let parsed = Claim::from_jumbf_box(&boxed).unwrap();
        assert_eq!(parsed.claim_generator, claim.claim_generator);
        assert_eq!(parsed.assertions, claim.assertions);
    }

    #[test]
    fn hard_binding_indices_matches_by_label() {
        let mut claim = Claim::new("test/1.0", "image/jpeg", "xmp:iid:1234");
        claim.add_assertion(HashedUri::new(
            "self#jumbf=/c2pa.assertions/c2pa.actions",
            None,
            vec![1; 32],
        ));
        claim.add_assertion(HashedUri::new(
            "self#jumbf=/c2pa.assertions/c2pa.hash.data",
            None,
            vec![2; 32],
        ));
        assert_eq!(claim.hard_binding_indices(), vec![1]);
    }
}
