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

//! The C2PA certificate profile: validity window, X.509 version, the
//! signature-algorithm and key-size requirements, and the extensions a
//! certificate must carry for its role in the chain (signing leaf vs.
//! intermediate/root CA). Checked on every verify pass regardless of
//! whether trust anchor validation (a stronger, optional check) is
//! enabled.

use x509_parser::prelude::*;

use crate::error::{Error, Result};
use crate::signer::SigningAlg;
use crate::validation_status::{codes, ValidationStatus};

const MIN_RSA_MODULUS_BITS: usize = 2048;

const OID_EC_PUBLIC_KEY: &str = "1.2.840.10045.2.1";
const OID_RSA_ENCRYPTION: &str = "1.2.840.113549.1.1.1";
const OID_RSASSA_PSS: &str = "1.2.840.113549.1.1.10";
const OID_ED25519: &str = "1.3.101.112";

const OID_EC_P256: &str = "1.2.840.10045.3.1.7";
const OID_EC_P384: &str = "1.3.132.0.34";
const OID_EC_P521: &str = "1.3.132.0.35";

/// Signature-algorithm OIDs the profile allows in a certificate's own
/// `signatureAlgorithm` field, independent of which alg the COSE header
/// claims — a certificate signed with an unapproved algorithm is
/// rejected even if the COSE signature itself verifies.
const ALLOWED_SIGNATURE_ALG_OIDS: &[&str] = &[
    "1.2.840.113549.1.1.11", // sha256WithRSAEncryption
    "1.2.840.113549.1.1.12", // sha384WithRSAEncryption
    "1.2.840.113549.1.1.13", // sha512WithRSAEncryption
    OID_RSASSA_PSS,
    "1.2.840.10045.4.3.2", // ecdsa-with-SHA256
    "1.2.840.10045.4.3.3", // ecdsa-with-SHA384
    "1.2.840.10045.4.3.4", // ecdsa-with-SHA512
    OID_ED25519,
];

const OID_SHA256_DER: &[u8] = &[0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x01];
const OID_SHA384_DER: &[u8] = &[0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x02];
const OID_SHA512_DER: &[u8] = &[0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x03];

/// Which role a certificate plays in the chain being profiled — the
/// profile's extension requirements differ between the signing leaf
/// and an intermediate/root CA.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertPurpose {
    Signing,
    Ca,
    Timestamp,
    Ocsp,
}

fn invalid(message: impl Into<String>, chain_index: usize) -> ValidationStatus {
    ValidationStatus::error(codes::SIGNING_CREDENTIAL_INVALID)
        .with_message(message)
        .with_referenced(format!("Cose_Sign1.x5chain[{chain_index}]"))
}

/// Checks a single certificate in the chain against the C2PA profile.
/// `expected_alg` is the COSE header's claimed algorithm, checked
/// against the certificate's own key — pass `None` for a CA certificate
/// which has no COSE algorithm to agree with. `chain_index` is this
/// certificate's position in `Cose_Sign1.x5chain`, used to build the
/// `referenced` pointer on every status this function emits.
///
/// Chain-of-trust validation against a trust anchor list is a separate,
/// optional step (`trust::verify_timestamp_trust` / the `ocsp`
/// feature); this only checks properties of the single certificate.
pub fn check_certificate_profile(
    cert_der: &[u8],
    expected_alg: Option<SigningAlg>,
    purpose: CertPurpose,
    chain_index: usize,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<Vec<ValidationStatus>> {
    let (_, cert) =
        parse_x509_certificate(cert_der).map_err(|e| Error::BadParam(format!("invalid certificate: {e}")))?;

    let mut statuses = Vec::new();

    let validity = cert.validity();
    let now_secs = now.timestamp();
    if now_secs < validity.not_before.timestamp() || now_secs > validity.not_after.timestamp() {
        statuses.push(invalid("certificate is outside its validity window", chain_index));
        return Ok(statuses);
    }

    check_x509_version(&cert, chain_index, &mut statuses);
    check_signature_algorithm(&cert, chain_index, &mut statuses);
    if let Some(alg) = expected_alg {
        check_key_strength(&cert, alg, chain_index, &mut statuses);
        check_rsassa_pss_params(&cert, alg, chain_index, &mut statuses);
    }
    check_basic_constraints(&cert, purpose, chain_index, &mut statuses);
    check_key_usage(&cert, purpose, chain_index, &mut statuses);
    check_authority_key_identifier(&cert, purpose, chain_index, &mut statuses);
    if purpose == CertPurpose::Signing {
        check_extended_key_usage(&cert, chain_index, &mut statuses);
    }

    if statuses.is_empty() {
        statuses.push(ValidationStatus::ok(codes::SIGNING_CREDENTIAL_TRUSTED));
    }

    Ok(statuses)
}

fn check_x509_version(cert: &X509Certificate, chain_index: usize, statuses: &mut Vec<ValidationStatus>) {
    if cert.tbs_certificate.version != X509Version::V3 {
        statuses.push(invalid("certificate must be X.509 v3", chain_index));
    }
    if cert.tbs_certificate.issuer_uid.is_some() || cert.tbs_certificate.subject_uid.is_some() {
        statuses.push(invalid(
            "certificate must not carry issuerUniqueID or subjectUniqueID",
            chain_index,
        ));
    }
}

fn check_signature_algorithm(cert: &X509Certificate, chain_index: usize, statuses: &mut Vec<ValidationStatus>) {
    let oid = cert.signature_algorithm.algorithm.to_id_string();
    if !ALLOWED_SIGNATURE_ALG_OIDS.contains(&oid.as_str()) {
        statuses.push(invalid(
            format!("certificate signature algorithm {oid} is not in the C2PA allow-list"),
            chain_index,
        ));
    }
}

fn check_key_strength(cert: &X509Certificate, alg: SigningAlg, chain_index: usize, statuses: &mut Vec<ValidationStatus>) {
    let spki = cert.public_key();
    let key_oid = spki.algorithm.algorithm.to_id_string();

    let ok = match alg {
        SigningAlg::Ps256 | SigningAlg::Ps384 | SigningAlg::Ps512 => {
            if key_oid != OID_RSA_ENCRYPTION && key_oid != OID_RSASSA_PSS {
                statuses.push(invalid("signing key is not an RSA key", chain_index));
                return;
            }
            match rsa_modulus_bit_len(spki.subject_public_key.data.as_ref()) {
                Some(bits) => bits >= MIN_RSA_MODULUS_BITS,
                None => false,
            }
        }
        SigningAlg::Es256 | SigningAlg::Es384 | SigningAlg::Es512 => {
            if key_oid != OID_EC_PUBLIC_KEY {
                statuses.push(invalid("signing key is not an EC key", chain_index));
                return;
            }
            let curve_oid = spki
                .algorithm
                .parameters
                .as_ref()
                .and_then(|p| p.as_oid().ok())
                .map(|o| o.to_id_string())
                .unwrap_or_default();
            let expected = match alg {
                SigningAlg::Es256 => OID_EC_P256,
                SigningAlg::Es384 => OID_EC_P384,
                SigningAlg::Es512 => OID_EC_P521,
                _ => unreachable!(),
            };
            curve_oid == expected
        }
        SigningAlg::Ed25519 => key_oid == OID_ED25519,
    };

    if !ok {
        statuses.push(invalid(
            "signing key does not meet the minimum size or curve for its algorithm",
            chain_index,
        ));
    }
}

/// Parse the DER `SEQUENCE { INTEGER modulus, INTEGER publicExponent }`
/// that an RSA `subjectPublicKey` bit string carries, and return the
/// modulus's bit length. A hand-rolled minimal reader rather than a
/// typed RSA-key API: only the modulus length is needed here, and this
/// is the one part of the SPKI whose shape is fixed regardless of
/// x509-parser's typed support for it.
fn rsa_modulus_bit_len(spki_bytes: &[u8]) -> Option<usize> {
    let mut pos = 0;
    if *spki_bytes.get(pos)? != 0x30 {
        return None;
    }
    pos += 1;
    let (_, new_pos) = read_der_length(spki_bytes, pos)?;
    pos = new_pos;

    if *spki_bytes.get(pos)? != 0x02 {
        return None;
    }
    pos += 1;
    let (len, new_pos) = read_der_length(spki_bytes, pos)?;
    pos = new_pos;

    let mut modulus = spki_bytes.get(pos..pos + len)?;
    while modulus.first() == Some(&0) && modulus.len() > 1 {
        modulus = &modulus[1..];
    }
    let mut bits = modulus.len() * 8;
    if let Some(&first) = modulus.first() {
        bits -= first.leading_zeros() as usize;
    }
    Some(bits)
}

/// Read a DER length (short or long form) starting at `pos`, returning
/// `(length, position of the first content byte)`.
fn read_der_length(data: &[u8], pos: usize) -> Option<(usize, usize)> {
    let first = *data.get(pos)?;
    let mut pos = pos + 1;
    if first & 0x80 == 0 {
        Some((first as usize, pos))
    } else {
        let n = (first & 0x7f) as usize;
        if n == 0 || n > 4 {
            return None;
        }
        let mut len = 0usize;
        for _ in 0..n {
            len = (len << 8) | (*data.get(pos)? as usize);
            pos += 1;
        }
        Some((len, pos))
    }
}

/// For an RSASSA-PSS certificate, check that the hash OID named in
/// `hashAlgorithm` matches the one nested inside `maskGenAlgorithm`'s
/// MGF1 parameters, and that it agrees with the COSE header's claimed
/// algorithm. A full ASN.1 parse of the PSS-params SEQUENCE is more
/// machinery than this needs: the three SHA-2 OIDs are fixed-length DER
/// encodings, so counting their raw occurrences tells the same story —
/// a consistent PSS-params block contains the expected OID exactly
/// twice and no other SHA-2 OID at all.
fn check_rsassa_pss_params(cert: &X509Certificate, alg: SigningAlg, chain_index: usize, statuses: &mut Vec<ValidationStatus>) {
    let key_oid = cert.public_key().algorithm.algorithm.to_id_string();
    if key_oid != OID_RSASSA_PSS {
        return;
    }
    let expected_oid = match alg {
        SigningAlg::Ps256 => OID_SHA256_DER,
        SigningAlg::Ps384 => OID_SHA384_DER,
        SigningAlg::Ps512 => OID_SHA512_DER,
        _ => return,
    };

    let Some(params) = cert.signature_algorithm.parameters.as_ref() else {
        statuses.push(invalid("RSASSA-PSS signature is missing its parameters", chain_index));
        return;
    };
    let raw = params.data;

    let hits = count_occurrences(raw, expected_oid);
    let other_hits: usize = [OID_SHA256_DER, OID_SHA384_DER, OID_SHA512_DER]
        .iter()
        .filter(|&&oid| oid != expected_oid)
        .map(|oid| count_occurrences(raw, oid))
        .sum();

    if hits != 2 || other_hits != 0 {
        statuses.push(invalid(
            "RSASSA-PSS parameters do not consistently use the expected hash algorithm",
            chain_index,
        ));
    }
}

fn count_occurrences(haystack: &[u8], needle: &[u8]) -> usize {
    if needle.is_empty() || haystack.len() < needle.len() {
        return 0;
    }
    (0..=haystack.len() - needle.len())
        .filter(|&i| &haystack[i..i + needle.len()] == needle)
        .count()
}

fn check_basic_constraints(cert: &X509Certificate, purpose: CertPurpose, chain_index: usize, statuses: &mut Vec<ValidationStatus>) {
    let bc = cert.extensions().iter().find_map(|ext| match ext.parsed_extension() {
        ParsedExtension::BasicConstraints(bc) => Some(bc),
        _ => None,
    });
    match (purpose, bc) {
        (CertPurpose::Signing, Some(bc)) if bc.ca => {
            statuses.push(invalid("signing certificate must not be a CA certificate", chain_index));
        }
        (CertPurpose::Ca, None) => {
            statuses.push(invalid("CA certificate is missing the basicConstraints extension", chain_index));
        }
        (CertPurpose::Ca, Some(bc)) if !bc.ca => {
            statuses.push(invalid("certificate in a CA role does not set the CA flag", chain_index));
        }
        _ => {}
    }
}

fn check_key_usage(cert: &X509Certificate, purpose: CertPurpose, chain_index: usize, statuses: &mut Vec<ValidationStatus>) {
    let ku_ext = cert
        .extensions()
        .iter()
        .find(|ext| matches!(ext.parsed_extension(), ParsedExtension::KeyUsage(_)));

    let Some(ku_ext) = ku_ext else {
        statuses.push(invalid("certificate is missing the keyUsage extension", chain_index));
        return;
    };
    if !ku_ext.critical {
        statuses.push(invalid("keyUsage extension must be marked critical", chain_index));
    }
    let ParsedExtension::KeyUsage(ku) = ku_ext.parsed_extension() else {
        unreachable!("already matched as KeyUsage above")
    };

    match purpose {
        CertPurpose::Signing => {
            if !ku.digital_signature() {
                statuses.push(invalid(
                    "signing certificate key usage does not include digitalSignature",
                    chain_index,
                ));
            }
        }
        CertPurpose::Ca => {
            if !ku.key_cert_sign() {
                statuses.push(invalid("CA certificate key usage does not include keyCertSign", chain_index));
            }
        }
        CertPurpose::Timestamp | CertPurpose::Ocsp => {
            if !ku.digital_signature() {
                statuses.push(invalid("certificate key usage does not include digitalSignature", chain_index));
            }
        }
    }
}

fn check_authority_key_identifier(cert: &X509Certificate, purpose: CertPurpose, chain_index: usize, statuses: &mut Vec<ValidationStatus>) {
    if purpose != CertPurpose::Signing {
        return;
    }
    if cert.issuer().to_string() == cert.subject().to_string() {
        // self-signed, nothing else in the chain to point an AKI at.
        return;
    }
    let has_aki = cert
        .extensions()
        .iter()
        .any(|ext| matches!(ext.parsed_extension(), ParsedExtension::AuthorityKeyIdentifier(_)));
    if !has_aki {
        statuses.push(invalid(
            "signing certificate is missing the authorityKeyIdentifier extension",
            chain_index,
        ));
    }
}

fn check_extended_key_usage(cert: &X509Certificate, chain_index: usize, statuses: &mut Vec<ValidationStatus>) {
    let eku = cert.extensions().iter().find_map(|ext| match ext.parsed_extension() {
        ParsedExtension::ExtendedKeyUsage(eku) => Some(eku),
        _ => None,
    });
    let Some(eku) = eku else {
        statuses.push(invalid("signing certificate is missing the extKeyUsage extension", chain_index));
        return;
    };
    if eku.any {
        statuses.push(invalid(
            "signing certificate extKeyUsage must not assert anyExtendedKeyUsage",
            chain_index,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_der() {
        let result = check_certificate_profile(
            b"not a certificate",
            Some(SigningAlg::Es256),
            CertPurpose::Signing,
            0,
            chrono::Utc::now(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn rsa_modulus_bit_len_strips_leading_sign_byte() {
        // SEQUENCE { INTEGER (00 || 2048-bit modulus), INTEGER 65537 }
        let mut modulus = vec![0u8]; // sign byte
        modulus.extend(std::iter::repeat(0xFFu8).take(256));
        let mut seq_content = Vec::new();
        seq_content.push(0x02);
        seq_content.push(0x82);
        seq_content.push((modulus.len() >> 8) as u8);
        seq_content.push((modulus.len() & 0xff) as u8);
        seq_content.extend_from_slice(&modulus);
        seq_content.extend_from_slice(&[0x02, 0x03, 0x01, 0x00, 0x01]);

        let mut der = vec![0x30, 0x82];
        der.push((seq_content.len() >> 8) as u8);
        der.push((seq_content.len() & 0xff) as u8);
        der.extend_from_slice(&seq_content);

        assert_eq!(rsa_modulus_bit_len(&der), Some(2048));
    }
}
