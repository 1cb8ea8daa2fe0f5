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

//! Builds the `COSE_Sign1` structure over a claim's CBOR bytes and pads
//! it to the reserved `c2pa.signature` box size.

use ciborium::value::Value;
use coset::{iana, CoseSign1, CoseSign1Builder, Header, HeaderBuilder, Label, TaggedCborSerializable};

use crate::claim::Claim;
use crate::cose_validator::verify_cose;
use crate::error::{Error, Result};
use crate::jumbf::content;
use crate::signer::{Signer, SigningAlg};
use crate::status_tracker::OneShotStatusTracker;
use crate::time_stamp::{cose_timestamp_countersign, make_cose_timestamp};

/// Sign `claim_bytes` (the claim's CBOR encoding) and pad the result to
/// exactly `box_size` bytes, then verify the freshly produced signature
/// before returning it — a signer that silently produces garbage should
/// never reach the manifest.
pub fn sign_claim(claim_bytes: &[u8], signer: &dyn Signer, box_size: usize) -> Result<Vec<u8>> {
    // Require that this really is a well-formed claim before spending
    // time signing it.
    Claim::from_cbor(&content::decode_cbor(claim_bytes)?)?;

    let cose = cose_sign(signer, claim_bytes, box_size)?;

    let mut tracker = OneShotStatusTracker::new();
    verify_cose(&cose, claim_bytes, b"", false, &mut tracker)?;

    Ok(cose)
}

pub(crate) fn cose_sign(signer: &dyn Signer, data: &[u8], box_size: usize) -> Result<Vec<u8>> {
    let alg = signer.alg();
    let certs = signer.cert_chain()?;
    if certs.is_empty() {
        return Err(Error::EmptyCertChain);
    }

    let (protected, unprotected) = build_headers(data, alg, certs, signer.time_authority_url())?;

    let aad: &[u8] = b"";
    let sign1_builder = CoseSign1Builder::new()
        .protected(protected)
        .unprotected(unprotected)
        .payload(data.to_vec())
        .try_create_signature(aad, |bytes| signer.sign(bytes))?;

    let mut sign1 = sign1_builder.build();
    sign1.payload = None;

    pad_cose_sig(&mut sign1, box_size)
}

fn build_headers(
    data: &[u8],
    alg: SigningAlg,
    certs: Vec<Vec<u8>>,
    ta_url: Option<String>,
) -> Result<(Header, Header)> {
    let protected = match alg {
        SigningAlg::Ps256 => HeaderBuilder::new().algorithm(iana::Algorithm::PS256).build(),
        SigningAlg::Ps384 => HeaderBuilder::new().algorithm(iana::Algorithm::PS384).build(),
        SigningAlg::Ps512 => HeaderBuilder::new().algorithm(iana::Algorithm::PS512).build(),
        SigningAlg::Es256 => HeaderBuilder::new().algorithm(iana::Algorithm::ES256).build(),
        SigningAlg::Es384 => HeaderBuilder::new().algorithm(iana::Algorithm::ES384).build(),
        SigningAlg::Es512 => HeaderBuilder::new().algorithm(iana::Algorithm::ES512).build(),
        SigningAlg::Ed25519 => HeaderBuilder::new().algorithm(iana::Algorithm::EdDSA).build(),
    };

    let x5chain = match certs.len() {
        1 => Value::Bytes(certs[0].clone()),
        _ => Value::Array(certs.into_iter().map(Value::Bytes).collect()),
    };

    let mut unprotected = HeaderBuilder::new().text_value("x5chain".to_string(), x5chain);

    if let Some(url) = ta_url {
        let cts = cose_timestamp_countersign(data, alg, &url)?;
        unprotected = unprotected.text_value("sigTst".to_string(), make_cose_timestamp(&cts));
    }

    Ok((protected, unprotected.build()))
}

const PAD: &str = "pad";
const PAD2: &str = "pad2";
const PAD_OFFSET: usize = 7;

/// Pad the `CoseSign1` structure with zero bytes to exactly match
/// `end_size`. Some target sizes can't be hit with a single pad header
/// (the length prefix of the pad bytes themselves shifts by a byte at
/// certain boundaries), so a second pad header is added when needed.
fn pad_cose_sig(sign1: &mut CoseSign1, end_size: usize) -> Result<Vec<u8>> {
    let cur_vec = sign1.clone().to_tagged_vec().map_err(|_| Error::CoseSignature)?;
    let cur_size = cur_vec.len();

    if cur_size == end_size {
        return Ok(cur_vec);
    }
    if cur_size + PAD_OFFSET > end_size {
        return Err(Error::CoseSigboxTooSmall(end_size));
    }

    let mut padding_found = false;
    let mut last_pad = 0;
    let mut target_guess = end_size - cur_size - PAD_OFFSET;

    loop {
        let mut sign1_clone = sign1.clone();

        for header_pair in &mut sign1_clone.unprotected.rest {
            if header_pair.0 == Label::Text(PAD.to_string()) {
                if let Value::Bytes(b) = &header_pair.1 {
                    last_pad = b.len();
                }
                header_pair.1 = Value::Bytes(vec![0u8; target_guess]);
                padding_found = true;
                break;
            }
        }

        if !padding_found {
            sign1_clone
                .unprotected
                .rest
                .push((Label::Text(PAD.to_string()), Value::Bytes(vec![0u8; target_guess])));
            return pad_cose_sig(&mut sign1_clone, end_size);
        }

        let new_cbor = sign1_clone.to_tagged_vec().map_err(|_| Error::CoseSignature)?;
        match new_cbor.len().cmp(&end_size) {
            std::cmp::Ordering::Less => target_guess += 1,
            std::cmp::Ordering::Equal => return Ok(new_cbor),
            std::cmp::Ordering::Greater => break,
        }
    }

    sign1
        .unprotected
        .rest
        .push((Label::Text(PAD2.to_string()), Value::Bytes(vec![0u8; last_pad.saturating_sub(10)])));
    pad_cose_sig(sign1, end_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    // A fake signature, not a real one: `cose_sign`'s padding loop is the
    // thing under test here. Cryptographic verification is covered by
    // `cose_validator`'s tests under the `openssl_sign` feature.
    struct TestSigner;

    impl Signer for TestSigner {
        fn sign(&self, _data: &[u8]) -> Result<Vec<u8>> {
            Ok(vec![0u8; 64])
        }

        fn alg(&self) -> SigningAlg {
            SigningAlg::Es256
        }

        fn cert_chain(&self) -> Result<Vec<Vec<u8>>> {
            Ok(vec![vec![0x30, 0x03, 0x02, 0x01, 0x00]])
        }

        fn reserve_size(&self) -> usize {
            2048
        }
    }

    #[test]
    fn pads_signature_to_exact_box_size() {
        let box_size = 1024;
        let cose = cose_sign(&TestSigner, b"claim bytes to sign", box_size).unwrap();
        assert_eq!(cose.len(), box_size);
    }

    // The fake signer above only exercises `pad_cose_sig`'s arithmetic
    // against a fixed-length signature; this drives the same padding
    // loop with a real EC signature and self-signed certificate, and
    // confirms the padded result still verifies end to end.
    #[cfg(feature = "openssl_sign")]
    #[test]
    fn openssl_signed_claim_round_trips_through_padding_and_verify() {
        use openssl::bn::BigNum;
        use openssl::ec::{EcGroup, EcKey};
        use openssl::hash::MessageDigest;
        use openssl::nid::Nid;
        use openssl::pkey::{PKey, Private};
        use openssl::sign::Signer as OpensslSigner;
        use openssl::x509::extension::{BasicConstraints, KeyUsage};
        use openssl::x509::{X509NameBuilder, X509};

        use crate::hashed_uri::HashedUri;

        let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
        let ec_key = EcKey::generate(&group).unwrap();
        let pkey = PKey::from_ec_key(ec_key).unwrap();

        let mut name_builder = X509NameBuilder::new().unwrap();
        name_builder.append_entry_by_text("CN", "c2pa test signer").unwrap();
        let name = name_builder.build();

        let mut builder = X509::builder().unwrap();
        builder.set_version(2).unwrap();
        builder.set_subject_name(&name).unwrap();
        builder.set_issuer_name(&name).unwrap();
        builder.set_pubkey(&pkey).unwrap();
        builder
            .set_serial_number(&BigNum::from_u32(1).unwrap().to_asn1_integer().unwrap())
            .unwrap();
        builder
            .set_not_before(&openssl::asn1::Asn1Time::days_from_now(0).unwrap())
            .unwrap();
        builder
            .set_not_after(&openssl::asn1::Asn1Time::days_from_now(365).unwrap())
            .unwrap();
        builder
            .append_extension(BasicConstraints::new().critical().build().unwrap())
            .unwrap();
        builder
            .append_extension(KeyUsage::new().critical().digital_signature().build().unwrap())
            .unwrap();
        builder.sign(&pkey, MessageDigest::sha256()).unwrap();
        let cert_der = builder.build().to_der().unwrap();

        struct OpensslTestSigner {
            pkey: PKey<Private>,
            cert_der: Vec<u8>,
        }

        impl Signer for OpensslTestSigner {
            fn sign(&self, data: &[u8]) -> Result<Vec<u8>> {
                let mut signer =
                    OpensslSigner::new(MessageDigest::sha256(), &self.pkey).map_err(|e| Error::BadParam(e.to_string()))?;
                signer.update(data).map_err(|e| Error::BadParam(e.to_string()))?;
                signer.sign_to_vec().map_err(|e| Error::BadParam(e.to_string()))
            }

            fn alg(&self) -> SigningAlg {
                SigningAlg::Es256
            }

            fn cert_chain(&self) -> Result<Vec<Vec<u8>>> {
                Ok(vec![self.cert_der.clone()])
            }

            fn reserve_size(&self) -> usize {
                4096
            }
        }

        let signer = OpensslTestSigner { pkey, cert_der };

        let mut claim = Claim::new("c2pa-test/1.0", "image/jpeg", "xmp:iid:test");
        claim.add_assertion(HashedUri::new(
            "self#jumbf=/c2pa.assertions/c2pa.hash.data",
            None,
            vec![0u8; 32],
        ));
        let claim_bytes = content::encode_cbor(&claim.to_cbor()).unwrap();

        let box_size = signer.reserve_size();
        let cose = sign_claim(&claim_bytes, &signer, box_size).unwrap();
        assert_eq!(cose.len(), box_size);

        let mut tracker = crate::status_tracker::OneShotStatusTracker::new();
        let chain = crate::cose_validator::verify_cose(&cose, &claim_bytes, b"", false, &mut tracker).unwrap();
        assert_eq!(chain.len(), 1);
    }
}
