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

//! A single assertion: a labeled `jumb` box inside the assertion store,
//! carrying either a CBOR or JSON content box. Typed assertion kinds
//! (data-hash, actions, ingredient, creative-work) live under
//! `assertions/` and convert to/from this generic shape; `Assertion`
//! itself only knows the JUMBF wire shape, not what a label means.

use ciborium::value::Value as CborValue;

use crate::error::{Error, Result};
use crate::jumbf::description::ExtensionSubtype;
use crate::jumbf::registry::Registry;
use crate::jumbf::{content, Content, Description, GenericBox};

#[derive(Debug, Clone, PartialEq)]
pub enum AssertionData {
    Cbor(CborValue),
    Json(serde_json::Value),
}

/// What an assertion's `type.subtype.label` says it actually is. This is
/// the dispatch [`Assertion::kind`] resolves through [`Registry`] —
/// the same classification applies whether the assertion was just built
/// in memory or parsed back out of a `jumb` box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssertionKind {
    /// A hard (data-hash) binding: `c2pa.hash.data` or `c2pa.hash.bmff`.
    HardBinding,
    /// `c2pa.ingredient`.
    Ingredient,
    Generic,
}

fn assertion_kind_registry() -> Registry<AssertionKind> {
    let mut r = Registry::new();
    r.register(
        format!("jumb.cbor.{}", crate::assertions::data_hash::LABEL),
        AssertionKind::HardBinding,
    );
    r.register(
        format!("jumb.cbor.{}", crate::assertions::bmff_hash::LABEL),
        AssertionKind::HardBinding,
    );
    r.register(
        format!("jumb.json.{}", crate::assertions::ingredient::LABEL),
        AssertionKind::Ingredient,
    );
    r.set_default(AssertionKind::Generic);
    r
}

/// A parsed or constructed assertion: a label (without its `__N`
/// dedup suffix), the instance number that produced the suffix, and its
/// content.
#[derive(Debug, Clone, PartialEq)]
pub struct Assertion {
    pub label: String,
    pub instance: u32,
    pub data: AssertionData,
}

impl Assertion {
    pub fn new_cbor(label: impl Into<String>, value: CborValue) -> Self {
        Self {
            label: label.into(),
            instance: 1,
            data: AssertionData::Cbor(value),
        }
    }

    pub fn new_json(label: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            label: label.into(),
            instance: 1,
            data: AssertionData::Json(value),
        }
    }

    /// The label as it appears on the wire: `label` for the first
    /// instance, `label__N` for later ones (see `jumbf::registry`).
    pub fn label_with_instance(&self) -> String {
        if self.instance <= 1 {
            self.label.clone()
        } else {
            format!("{}__{}", self.label, self.instance)
        }
    }

    /// Classify this assertion by `box_type.subtype.label`, the same
    /// longest-prefix lookup a reader applies when deciding what a
    /// freshly parsed `jumb` box actually is.
    pub fn kind(&self) -> AssertionKind {
        let subtype = match &self.data {
            AssertionData::Cbor(_) => "cbor",
            AssertionData::Json(_) => "json",
        };
        assertion_kind_registry()
            .resolve("jumb", Some(subtype), Some(&self.label))
            .copied()
            .unwrap_or(AssertionKind::Generic)
    }

    pub fn to_jumbf_box(&self) -> Result<GenericBox> {
        let (subtype_alias, content_type, payload): ([u8; 4], [u8; 4], Vec<u8>) = match &self.data {
            AssertionData::Cbor(v) => (*b"cbor", *b"cbor", content::encode_cbor(v)?),
            AssertionData::Json(v) => (*b"json", *b"json", content::encode_json(v)?),
        };

        let desc = Description::new(ExtensionSubtype::from_alias(&subtype_alias))
            .requestable(true)
            .with_label(self.label_with_instance())?;
        let desc_box = GenericBox::leaf(*b"jumd", desc.write()?);
        let content_box = GenericBox::leaf(content_type, payload);

        Ok(GenericBox::container(*b"jumb", vec![desc_box, content_box]))
    }

    pub fn from_jumbf_box(b: &GenericBox) -> Result<Self> {
        if &b.box_type != b"jumb" {
            return Err(Error::JumbfParse("assertion box is not a jumb container".into()));
        }
        let children = b.children();
        let desc_box = children
            .iter()
            .find(|c| &c.box_type == b"jumd")
            .ok_or_else(|| Error::JumbfParse("assertion missing jumd description".into()))?;
        let desc = Description::read(desc_box.raw().ok_or(Error::JumbfParse(
            "jumd box must be a leaf".into(),
        ))?)?;

        let full_label = desc
            .label
            .clone()
            .ok_or_else(|| Error::JumbfParse("assertion description missing label".into()))?;
        let (label, instance) = match crate::jumbf::registry::strip_instance_suffix(&full_label) {
            Some(base) => {
                let n: u32 = full_label[base.len() + 2..]
                    .parse()
                    .map_err(|_| Error::JumbfParse("bad instance suffix".into()))?;
                (base.to_owned(), n)
            }
            None => (full_label, 1),
        };

        let content_box = children
            .iter()
            .find(|c| !matches!(c.content, Content::Boxes(_)) && &c.box_type != b"jumd")
            .ok_or_else(|| Error::JumbfParse("assertion missing content box".into()))?;
        let payload = content_box
            .raw()
            .ok_or(Error::JumbfParse("assertion content must be a leaf".into()))?;

        let data = match &content_box.box_type {
            b"cbor" => AssertionData::Cbor(content::decode_cbor(payload)?),
            b"json" => AssertionData::Json(content::decode_json(payload)?),
            other => {
                return Err(Error::Unsupported(format!(
                    "assertion content box type {:?} not supported",
                    String::from_utf8_lossy(other)
                )))
            }
        };

        Ok(Self {
            label,
            instance,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_cbor_assertion() {
        let v = CborValue::Map(vec![(
            CborValue::Text("alg".into()),
            CborValue::Text("sha256".into()),
        )]);
        let a = Assertion::new_cbor("c2pa.hash.data", v);
        let boxed = a.to_jumbf_box().unwrap();
        let parsed = Assertion::from_jumbf_box(&boxed).unwrap();
        assert_eq!(parsed, a);
    }

    #[test]
    fn kind_classifies_hard_binding_and_ingredient_labels() {
        let hash = Assertion::new_cbor("c2pa.hash.data", CborValue::Map(vec![]));
        assert_eq!(hash.kind(), AssertionKind::HardBinding);

        let ingredient = Assertion::new_json("c2pa.ingredient", serde_json::json!({}));
        assert_eq!(ingredient.kind(), AssertionKind::Ingredient);

        let actions = Assertion::new_json("c2pa.actions", serde_json::json!({}));
        assert_eq!(actions.kind(), AssertionKind::Generic);
    }

    #[test]
    fn dedup_instance_round_trips_through_label_suffix() {
        let mut a = Assertion::new_json("c2pa.actions", serde_json::json!({"actions": []}));
        a.instance = 2;
        let boxed = a.to_jumbf_box().unwrap();
        let parsed = Assertion::from_jumbf_box(&boxed).unwrap();
        assert_eq!(parsed.label, "c2pa.actions");
        assert_eq!(parsed.instance, 2);
    }
}
