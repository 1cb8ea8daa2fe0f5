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

//! The signer collaborator: anything that can produce a raw signature
//! over a byte buffer and name its own certificate chain and algorithm.
//! Concrete signers (PKCS12-backed, hardware-backed) live in the `cli`
//! crate or a host application; this crate only defines the seam.

use crate::error::Result;

/// The signature algorithms a [`Signer`] may report. Matches the COSE
/// algorithm identifiers `cose_sign` maps these onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningAlg {
    Es256,
    Es384,
    Es512,
    Ps256,
    Ps384,
    Ps512,
    Ed25519,
}

impl SigningAlg {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "es256" => Some(Self::Es256),
            "es384" => Some(Self::Es384),
            "es512" => Some(Self::Es512),
            "ps256" => Some(Self::Ps256),
            "ps384" => Some(Self::Ps384),
            "ps512" => Some(Self::Ps512),
            "ed25519" => Some(Self::Ed25519),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Es256 => "es256",
            Self::Es384 => "es384",
            Self::Es512 => "es512",
            Self::Ps256 => "ps256",
            Self::Ps384 => "ps384",
            Self::Ps512 => "ps512",
            Self::Ed25519 => "ed25519",
        }
    }
}

/// Implemented by anything that can sign claim bytes and present a
/// certificate chain for them. `sign` takes the exact bytes to be
/// signed (the claim's CBOR encoding) and returns a raw signature —
/// `cose_sign` is responsible for wrapping that in a `COSE_Sign1`
/// structure with the right headers.
pub trait Signer {
    fn sign(&self, data: &[u8]) -> Result<Vec<u8>>;
    fn alg(&self) -> SigningAlg;
    /// DER-encoded certificates, signer first, in chain order.
    fn cert_chain(&self) -> Result<Vec<Vec<u8>>>;
    /// Upper bound on the signature size this signer can produce,
    /// including the certificate chain — used to reserve room for the
    /// COSE signature box before the final byte length is known.
    fn reserve_size(&self) -> usize;
    /// Whether this signer supports requesting an RFC 3161 timestamp
    /// countersignature. Default is no: timestamping is gated behind
    /// the `ocsp` feature's trust infrastructure.
    fn time_authority_url(&self) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alg_round_trips_through_str() {
        for alg in [SigningAlg::Es256, SigningAlg::Ps384, SigningAlg::Ed25519] {
            assert_eq!(SigningAlg::from_str(alg.as_str()), Some(alg));
        }
    }
}
