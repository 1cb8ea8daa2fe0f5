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

//! `c2pa.hash.data`: the hard binding of a claim to the bytes of the
//! asset it describes, modulo an exclusion list (the manifest's own
//! reserved placement inside the asset, which can't hash itself).
//!
//! `pad` exists purely so the two-pass embed in `jpeg_io` can pre-size
//! the reserved manifest slot: the first pass signs over a dummy asset
//! to measure the manifest's serialized size with a fixed-size pad
//! filled, then the real pass re-signs with the real exclusion range and
//! an adjusted pad so the final manifest is byte-identical in size to
//! the reservation.

use ciborium::value::Value as CborValue;

use crate::error::{Error, Result};
use crate::hash_utils::{self, Exclusion, HashAlg};

pub const LABEL: &str = "c2pa.hash.data";

/// The pad is sized in 80-byte units; embedding re-sizes it (not the
/// exclusion range itself) when the real vs. dummy asset sizes diverge.
pub const PAD_UNIT: usize = 80;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataHash {
    pub name: Option<String>,
    pub exclusions: Vec<Exclusion>,
    pub alg: Option<String>,
    pub hash: Vec<u8>,
    pub pad: Vec<u8>,
}

impl DataHash {
    pub fn new(name: Option<String>, exclusions: Vec<Exclusion>) -> Self {
        Self {
            name,
            exclusions,
            alg: None,
            hash: Vec::new(),
            pad: vec![0u8; PAD_UNIT],
        }
    }

    /// Grow or shrink `pad` to the nearest whole `PAD_UNIT` multiple so
    /// the overall assertion's encoded size matches `target_len`. Errors
    /// if `target_len` is smaller than the assertion's size with an
    /// empty pad (there's nothing left to shrink).
    pub fn resize_pad(&mut self, current_without_pad: usize, target_len: usize) -> Result<()> {
        if target_len < current_without_pad {
            return Err(Error::CoseSigboxTooSmall(target_len));
        }
        let needed = target_len - current_without_pad;
        let rounded = needed.div_ceil(PAD_UNIT) * PAD_UNIT;
        self.pad = vec![0u8; rounded];
        Ok(())
    }

    pub fn compute(&mut self, alg: HashAlg, asset: &[u8]) -> Result<()> {
        hash_utils::validate_exclusions(&self.exclusions)?;
        self.hash = hash_utils::hash_by_alg(alg, asset, &self.exclusions);
        self.alg = Some(alg.as_str().to_owned());
        Ok(())
    }

    pub fn verify(&self, default_alg: HashAlg, asset: &[u8]) -> Result<bool> {
        let alg = match &self.alg {
            Some(s) => HashAlg::from_str(s).ok_or_else(|| Error::BadParam(format!("unsupported hash alg {s}")))?,
            None => default_alg,
        };
        Ok(hash_utils::verify_by_alg(alg, &self.hash, asset, &self.exclusions))
    }

    pub fn to_cbor(&self) -> CborValue {
        let mut entries = vec![
            (
                CborValue::Text("exclusions".into()),
                CborValue::Array(
                    self.exclusions
                        .iter()
                        .map(|e| {
                            CborValue::Map(vec![
                                (CborValue::Text("start".into()), CborValue::Integer(e.start.into())),
                                (CborValue::Text("length".into()), CborValue::Integer(e.length.into())),
                            ])
                        })
                        .collect(),
                ),
            ),
            (
                CborValue::Text("hash".into()),
                CborValue::Bytes(self.hash.clone()),
            ),
            (
                CborValue::Text("pad".into()),
                CborValue::Bytes(self.pad.clone()),
            ),
        ];
        if let Some(name) = &self.name {
            entries.push((CborValue::Text("name".into()), CborValue::Text(name.clone())));
        }
        if let Some(alg) = &self.alg {
            entries.push((CborValue::Text("alg".into()), CborValue::Text(alg.clone())));
        }
        CborValue::Map(entries)
    }

    pub fn from_cbor(value: &CborValue) -> Result<Self> {
        let map = value
            .as_map()
            .ok_or_else(|| Error::JumbfParse("c2pa.hash.data assertion is not a CBOR map".into()))?;
        let get = |key: &str| map.iter().find(|(k, _)| k.as_text() == Some(key)).map(|(_, v)| v);

        let exclusions = get("exclusions")
            .and_then(CborValue::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(|item| {
                        let m = item.as_map()?;
                        let start = m.iter().find(|(k, _)| k.as_text() == Some("start"))?.1.as_integer()?;
                        let length = m.iter().find(|(k, _)| k.as_text() == Some("length"))?.1.as_integer()?;
                        Some(Exclusion {
                            start: i128::from(start) as u64,
                            length: i128::from(length) as u64,
                        })
                    })
                    .collect::<Vec<Exclusion>>()
            })
            .unwrap_or_default();

        let hash = get("hash")
            .and_then(CborValue::as_bytes)
            .cloned()
            .ok_or_else(|| Error::JumbfParse("c2pa.hash.data missing hash".into()))?;
        let pad = get("pad").and_then(CborValue::as_bytes).cloned().unwrap_or_default();
        let name = get("name").and_then(CborValue::as_text).map(str::to_owned);
        let alg = get("alg").and_then(CborValue::as_text).map(str::to_owned);

        hash_utils::validate_exclusions(&exclusions)?;

        Ok(Self {
            name,
            exclusions,
            alg,
            hash,
            pad,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_cbor() {
        let mut dh = DataHash::new(Some("jpeg manifest".into()), vec![Exclusion { start: 2, length: 4 }]);
        dh.compute(HashAlg::Sha256, b"0123456789").unwrap();

        let value = dh.to_cbor();
        let back = DataHash::from_cbor(&value).unwrap();
        assert_eq!(back, dh);
        assert!(back.verify(HashAlg::Sha256, b"0123456789").unwrap());
    }

    #[test]
    fn ignores_changes_inside_exclusions_only() {
        let mut dh = DataHash::new(None, vec![Exclusion { start: 0, length: 2 }]);
        dh.compute(HashAlg::Sha256, b"AAxxxxxxxx").unwrap();

        // Changing only the excluded prefix still verifies.
        assert!(dh.verify(HashAlg::Sha256, b"BBxxxxxxxx").unwrap());
        // Changing anything outside it does not.
        assert!(!dh.verify(HashAlg::Sha256, b"AAyyyyyyyy").unwrap());
    }

    #[test]
    fn resize_pad_rounds_up_to_unit() {
        let mut dh = DataHash::new(None, vec![]);
        dh.resize_pad(1000, 1050).unwrap();
        assert_eq!(dh.pad.len(), PAD_UNIT);

        dh.resize_pad(1000, 1171).unwrap();
        assert_eq!(dh.pad.len(), PAD_UNIT * 3);
    }
}
