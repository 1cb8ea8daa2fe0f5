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

//! `c2pa.signature`: the box carrying the raw `COSE_Sign1` bytes over
//! the claim. This module only knows the JUMBF wire shape; constructing
//! and verifying the COSE structure itself is `cose_sign`/`cose_validator`.

use crate::error::{Error, Result};
use crate::jumbf::description::ExtensionSubtype;
use crate::jumbf::{Description, GenericBox};

pub const LABEL: &str = "c2pa.signature";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub cose_sign1: Vec<u8>,
}

impl Signature {
    pub fn new(cose_sign1: Vec<u8>) -> Self {
        Self { cose_sign1 }
    }

    pub fn to_jumbf_box(&self) -> Result<GenericBox> {
        let desc = Description::new(ExtensionSubtype::from_alias(b"cbor"))
            .requestable(true)
            .with_label(LABEL)?;
        let desc_box = GenericBox::leaf(*b"jumd", desc.write()?);
        let content_box = GenericBox::leaf(*b"cbor", self.cose_sign1.clone());
        Ok(GenericBox::container(*b"jumb", vec![desc_box, content_box]))
    }

    pub fn from_jumbf_box(b: &GenericBox) -> Result<Self> {
        let content_box = b
            .children()
            .iter()
            .find(|c| &c.box_type == b"cbor")
            .ok_or_else(|| Error::JumbfParse("signature box missing cbor content".into()))?;
        let cose_sign1 = content_box
            .raw()
            .ok_or_else(|| Error::JumbfParse("signature content box must be a leaf".into()))?
            .to_vec();
        Ok(Self { cose_sign1 })
    }

    /// Overwrite the reserved signature box's content in place, keeping
    /// the overall byte length identical. Used by the two-pass JPEG
    /// embed: the dummy pass reserves space sized for `reserved_len`,
    /// the real pass must produce a signature that exactly fills it.
    pub fn pad_to(&mut self, reserved_len: usize) -> Result<()> {
        if self.cose_sign1.len() > reserved_len {
            return Err(Error::CoseSigboxTooSmall(reserved_len));
        }
        self.cose_sign1.resize(reserved_len, 0);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_jumbf_box() {
        let sig = Signature::new(vec![1, 2, 3, 4]);
        let boxed = sig.to_jumbf_box().unwrap();
        let parsed = Signature::from_jumbf_box(&boxed).unwrap();
        assert_eq!(parsed, sig);
    }

    #[test]
    fn pad_to_rejects_oversized_signature() {
        let mut sig = Signature::new(vec![0; 10]);
        assert!(sig.pad_to(5).is_err());
        sig.pad_to(20).unwrap();
        assert_eq!(sig.cose_sign1.len(), 20);
    }
}
