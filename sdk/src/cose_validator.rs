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

//! Verifies a `COSE_Sign1` structure over a detached payload (the
//! claim's CBOR bytes): parses the `x5chain` header, checks the
//! certificate profile, and checks the cryptographic signature itself.

use ciborium::value::Value;
use coset::{CoseSign1, TaggedCborSerializable};

use crate::cert_profile::{check_certificate_profile, CertPurpose};
use crate::error::{Error, Result};
use crate::signer::SigningAlg;
use crate::status_tracker::StatusTracker;
use crate::validation_status::{codes, ValidationStatus};

/// Verify `cose_bytes` (a tagged `COSE_Sign1`) over the detached
/// `payload`. Pushes every outcome (signature match, cert profile,
/// trust) onto `tracker` rather than stopping at the first problem,
/// and returns the full `x5chain` (DER, leaf first) on success so a
/// caller can profile intermediates too, not just the leaf.
pub fn verify_cose(
    cose_bytes: &[u8],
    payload: &[u8],
    aad: &[u8],
    verify_trust: bool,
    tracker: &mut dyn StatusTracker,
) -> Result<Vec<Vec<u8>>> {
    let mut sign1 = CoseSign1::from_tagged_slice(cose_bytes).map_err(|_| Error::CoseSignature)?;
    sign1.payload = Some(payload.to_vec());

    let certs = extract_cert_chain(&sign1)?;
    let leaf = certs.first().ok_or(Error::EmptyCertChain)?.clone();

    let alg = alg_from_protected_header(&sign1)?;

    let sig_ok = verify_signature_bytes(alg, &leaf, &sign1, aad);
    match sig_ok {
        Ok(true) => tracker.push(ValidationStatus::ok(codes::CLAIM_SIGNATURE_VALIDATED)),
        Ok(false) => {
            tracker.push(ValidationStatus::error(codes::CLAIM_SIGNATURE_MISMATCH));
            return Err(Error::CoseSignature);
        }
        Err(e) => {
            log::warn!("signature could not be cryptographically verified: {e}");
            tracker.push(
                ValidationStatus::error(codes::ALGORITHM_UNSUPPORTED)
                    .with_message("signature verification requires the openssl_sign feature"),
            );
        }
    }

    for status in check_certificate_profile(&leaf, Some(alg), CertPurpose::Signing, 0, chrono::Utc::now())? {
        tracker.push(status);
    }

    if verify_trust {
        // Trust-anchor chain validation is gated behind the `ocsp`
        // feature (see DESIGN.md, Open Question #3); without it we can
        // only report that trust was not evaluated.
        tracker.push(
            ValidationStatus::new(codes::SIGNING_CREDENTIAL_UNTRUSTED, false)
                .with_message("trust anchor validation was not performed"),
        );
    }

    Ok(certs)
}

fn extract_cert_chain(sign1: &CoseSign1) -> Result<Vec<Vec<u8>>> {
    for (label, value) in &sign1.unprotected.rest {
        if matches!(label, coset::Label::Text(s) if s == "x5chain") {
            return match value {
                Value::Bytes(b) => Ok(vec![b.clone()]),
                Value::Array(arr) => arr
                    .iter()
                    .map(|v| match v {
                        Value::Bytes(b) => Ok(b.clone()),
                        _ => Err(Error::JumbfParse("x5chain entry is not a byte string".into())),
                    })
                    .collect(),
                _ => Err(Error::JumbfParse("x5chain header has an unexpected shape".into())),
            };
        }
    }
    Err(Error::EmptyCertChain)
}

fn alg_from_protected_header(sign1: &CoseSign1) -> Result<SigningAlg> {
    use coset::iana::Algorithm;
    let alg = sign1
        .protected
        .header
        .alg
        .as_ref()
        .ok_or(Error::CoseSignature)?;
    let coset::Algorithm::Assigned(assigned) = alg else {
        return Err(Error::CoseSignature);
    };
    Ok(match assigned {
        Algorithm::PS256 => SigningAlg::Ps256,
        Algorithm::PS384 => SigningAlg::Ps384,
        Algorithm::PS512 => SigningAlg::Ps512,
        Algorithm::ES256 => SigningAlg::Es256,
        Algorithm::ES384 => SigningAlg::Es384,
        Algorithm::ES512 => SigningAlg::Es512,
        Algorithm::EdDSA => SigningAlg::Ed25519,
        _ => return Err(Error::CoseSignature),
    })
}

#[cfg(feature = "openssl_sign")]
fn verify_signature_bytes(alg: SigningAlg, cert_der: &[u8], sign1: &CoseSign1, aad: &[u8]) -> Result<bool> {
    use openssl::hash::MessageDigest;
    use openssl::pkey::PKey;
    use openssl::sign::Verifier;
    use openssl::x509::X509;

    let cert = X509::from_der(cert_der).map_err(|e| Error::BadParam(e.to_string()))?;
    let pkey = cert.public_key().map_err(|e| Error::BadParam(e.to_string()))?;

    let tbs = coset::sig_structure_data(
        coset::SignatureContext::CoseSign1,
        sign1.protected.clone(),
        None,
        aad,
        sign1.payload.as_deref().unwrap_or(&[]),
    );

    let digest = match alg {
        SigningAlg::Es256 | SigningAlg::Ps256 => MessageDigest::sha256(),
        SigningAlg::Es384 | SigningAlg::Ps384 => MessageDigest::sha384(),
        SigningAlg::Es512 | SigningAlg::Ps512 => MessageDigest::sha512(),
        SigningAlg::Ed25519 => {
            let pkey = PKey::public_key_from_der(cert_der).unwrap_or(pkey);
            let mut verifier = Verifier::new_without_digest(&pkey).map_err(|e| Error::BadParam(e.to_string()))?;
            return Ok(verifier.verify_oneshot(&sign1.signature, &tbs).unwrap_or(false));
        }
    };

    let mut verifier = Verifier::new(digest, &pkey).map_err(|e| Error::BadParam(e.to_string()))?;
    if matches!(alg, SigningAlg::Ps256 | SigningAlg::Ps384 | SigningAlg::Ps512) {
        verifier
            .set_rsa_padding(openssl::rsa::Padding::PKCS1_PSS)
            .map_err(|e| Error::BadParam(e.to_string()))?;
    }
    verifier.update(&tbs).map_err(|e| Error::BadParam(e.to_string()))?;
    Ok(verifier.verify(&sign1.signature).unwrap_or(false))
}

#[cfg(not(feature = "openssl_sign"))]
fn verify_signature_bytes(_alg: SigningAlg, _cert_der: &[u8], _sign1: &CoseSign1, _aad: &[u8]) -> Result<bool> {
    Err(Error::Unsupported(
        "cryptographic signature verification requires the openssl_sign feature".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_untagged_garbage() {
        let mut tracker = crate::status_tracker::OneShotStatusTracker::new();
        let result = verify_cose(b"not cose", b"data", b"", false, &mut tracker);
        assert!(result.is_err());
    }
}
