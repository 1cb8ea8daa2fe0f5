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

//! Digest algorithm dispatch and exclusion-aware streaming hash, shared by
//! the hashed-URI engine and the data-hash assertion.

use std::io::Read;

use sha2::{Digest, Sha256, Sha384, Sha512};

use crate::error::{Error, Result};

/// The three algorithms the spec permits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlg {
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlg {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "sha256" => Some(Self::Sha256),
            "sha384" => Some(Self::Sha384),
            "sha512" => Some(Self::Sha512),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
        }
    }
}

/// A [start, start+length) byte range excluded from a streaming hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exclusion {
    pub start: u64,
    pub length: u64,
}

impl Exclusion {
    pub fn end(&self) -> u64 {
        self.start + self.length
    }
}

/// Validates that exclusions are strictly increasing and non-overlapping,
/// per the data-hash assertion invariant.
pub fn validate_exclusions(exclusions: &[Exclusion]) -> Result<()> {
    for pair in exclusions.windows(2) {
        if pair[1].start < pair[0].end() {
            return Err(Error::BadParam(
                "data hash exclusions must be strictly increasing and non-overlapping".into(),
            ));
        }
    }
    Ok(())
}

enum AnyDigest {
    Sha256(Sha256),
    Sha384(Sha384),
    Sha512(Sha512),
}

impl AnyDigest {
    fn new(alg: HashAlg) -> Self {
        match alg {
            HashAlg::Sha256 => Self::Sha256(Sha256::new()),
            HashAlg::Sha384 => Self::Sha384(Sha384::new()),
            HashAlg::Sha512 => Self::Sha512(Sha512::new()),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Sha256(d) => d.update(data),
            Self::Sha384(d) => d.update(data),
            Self::Sha512(d) => d.update(data),
        }
    }

    fn finalize(self) -> Vec<u8> {
        match self {
            Self::Sha256(d) => d.finalize().to_vec(),
            Self::Sha384(d) => d.finalize().to_vec(),
            Self::Sha512(d) => d.finalize().to_vec(),
        }
    }
}

/// Hash an in-memory byte slice, skipping `exclusions`. Exclusions must
/// already be validated (strictly increasing, non-overlapping).
pub fn hash_by_alg(alg: HashAlg, data: &[u8], exclusions: &[Exclusion]) -> Vec<u8> {
    let mut digest = AnyDigest::new(alg);
    let mut cursor: u64 = 0;

    for ex in exclusions {
        let start = ex.start.min(data.len() as u64);
        if cursor < start {
            digest.update(&data[cursor as usize..start as usize]);
        }
        cursor = cursor.max(ex.end().min(data.len() as u64));
    }

    if (cursor as usize) < data.len() {
        digest.update(&data[cursor as usize..]);
    }

    digest.finalize()
}

pub fn verify_by_alg(alg: HashAlg, expected: &[u8], data: &[u8], exclusions: &[Exclusion]) -> bool {
    hash_by_alg(alg, data, exclusions) == expected
}

/// Stream `reader` through `alg`, skipping byte ranges named by
/// `exclusions` (which must be sorted and non-overlapping; see
/// [`validate_exclusions`]). Used for the data-hash assertion's asset-sized
/// verification path so the whole asset never needs to be resident in
/// memory at once.
pub fn stream_hash_by_alg(
    alg: HashAlg,
    reader: &mut dyn Read,
    exclusions: &[Exclusion],
) -> Result<Vec<u8>> {
    validate_exclusions(exclusions)?;

    let mut digest = AnyDigest::new(alg);
    let mut cursor: u64 = 0;
    let mut buf = [0u8; 8192];

    for ex in exclusions {
        feed_range(reader, &mut digest, &mut cursor, ex.start, &mut buf)?;
        skip_bytes(reader, ex.length)?;
        cursor += ex.length;
    }

    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        digest.update(&buf[..n]);
    }

    Ok(digest.finalize())
}

fn feed_range(
    reader: &mut dyn Read,
    digest: &mut AnyDigest,
    cursor: &mut u64,
    up_to: u64,
    buf: &mut [u8],
) -> Result<()> {
    let mut remaining = up_to.saturating_sub(*cursor);
    while remaining > 0 {
        let want = remaining.min(buf.len() as u64) as usize;
        let n = reader.read(&mut buf[..want])?;
        if n == 0 {
            return Err(Error::UnexpectedEof);
        }
        digest.update(&buf[..n]);
        remaining -= n as u64;
        *cursor += n as u64;
    }
    Ok(())
}

fn skip_bytes(reader: &mut dyn Read, mut length: u64) -> Result<()> {
    let mut buf = [0u8; 8192];
    while length > 0 {
        let want = length.min(buf.len() as u64) as usize;
        let n = reader.read(&mut buf[..want])?;
        if n == 0 {
            return Err(Error::UnexpectedEof);
        }
        length -= n as u64;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn excludes_named_range() {
        let data = b"0123456789";
        let excl = [Exclusion { start: 2, length: 3 }]; // excludes "234"
        let with_excl = hash_by_alg(HashAlg::Sha256, data, &excl);

        let mut spliced = Vec::new();
        spliced.extend_from_slice(b"01");
        spliced.extend_from_slice(b"56789");
        let direct = hash_by_alg(HashAlg::Sha256, &spliced, &[]);

        assert_eq!(with_excl, direct);
    }

    #[test]
    fn stream_matches_in_memory() {
        let data = b"the quick brown fox jumps over the lazy dog";
        let excl = [Exclusion { start: 4, length: 5 }];

        let in_mem = hash_by_alg(HashAlg::Sha256, data, &excl);

        let mut cursor = Cursor::new(data.to_vec());
        let streamed = stream_hash_by_alg(HashAlg::Sha256, &mut cursor, &excl).unwrap();

        assert_eq!(in_mem, streamed);
    }

    #[test]
    fn rejects_overlapping_exclusions() {
        let bad = [
            Exclusion { start: 0, length: 10 },
            Exclusion { start: 5, length: 10 },
        ];
        assert!(validate_exclusions(&bad).is_err());
    }
}
