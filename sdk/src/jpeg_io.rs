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

//! JPEG embedding: walks marker segments to find/remove existing
//! `APP11` JUMBF segments and `APP1` XMP, and implements the two-pass
//! embed that sizes the `c2pa.hash.data` exclusion range and the COSE
//! signature box before committing to a final layout.

use byteorder::{BigEndian, ByteOrder};

use crate::assertion::Assertion;
use crate::assertions::data_hash::{self, DataHash, PAD_UNIT};
use crate::error::{Error, Result};
use crate::hash_utils::{Exclusion, HashAlg};
use crate::manifest::Manifest;
use crate::signer::Signer;
use crate::store::Store;

const SOI: u16 = 0xFFD8;
const EOI: u16 = 0xFFD9;
const SOS: u16 = 0xFFDA;
const APP1: u16 = 0xFFE1;
const APP11: u16 = 0xFFEB;

/// Markers with no payload (not followed by a length field).
fn is_standalone_marker(marker: u16) -> bool {
    matches!(marker, 0xFFD0..=0xFFD9 | 0xFF01)
}

const JUMBF_CI: [u8; 4] = *b"JP\x1A\x2A";
const APP11_HEADER_LEN: usize = 4 + 2 + 4 + 4 + 4; // CI + En + Z + LBox + TBox
const MAX_SEGMENT_PAYLOAD: usize = 65535 - 2 - APP11_HEADER_LEN;

const XMP_SIGNATURE: &[u8] = b"http://ns.adobe.com/xap/1.0/\0";

struct Segment {
    marker: u16,
    /// Byte offset of the 0xFF marker byte itself.
    offset: usize,
    /// Payload, excluding the 2-byte length field (present only for
    /// non-standalone markers).
    payload_start: usize,
    payload_len: usize,
}

/// Walk every marker segment from just after SOI up to (but not
/// including) the scan data, in order.
fn walk_segments(data: &[u8]) -> Result<Vec<Segment>> {
    if data.len() < 4 || BigEndian::read_u16(&data[0..2]) != SOI {
        return Err(Error::JumbfParse("not a JPEG file (missing SOI)".into()));
    }

    let mut segments = Vec::new();
    let mut pos = 2;

    while pos + 1 < data.len() {
        if data[pos] != 0xFF {
            return Err(Error::JumbfParse("expected marker byte while scanning JPEG".into()));
        }
        let marker = BigEndian::read_u16(&data[pos..pos + 2]);
        if marker == SOS || marker == EOI {
            break;
        }
        if is_standalone_marker(marker) {
            pos += 2;
            continue;
        }

        let len = BigEndian::read_u16(&data[pos + 2..pos + 4]) as usize;
        if len < 2 || pos + 2 + len > data.len() {
            return Err(Error::JumbfParse("JPEG segment length out of range".into()));
        }

        segments.push(Segment {
            marker,
            offset: pos,
            payload_start: pos + 4,
            payload_len: len - 2,
        });
        pos += 2 + len;
    }

    Ok(segments)
}

/// Byte offset to insert new segments at: immediately after SOI, before
/// any existing markers, matching where the reference embedder places
/// the JUMBF store.
fn insert_offset(data: &[u8]) -> Result<usize> {
    if data.len() < 2 || BigEndian::read_u16(&data[0..2]) != SOI {
        return Err(Error::JumbfParse("not a JPEG file (missing SOI)".into()));
    }
    Ok(2)
}

/// Split `jumbf_bytes` into one or more `APP11` segment payloads (each
/// including its own 2-byte length field and the 20-byte box header),
/// ready to be spliced into a JPEG byte stream back to back.
pub(crate) fn build_app11_segments(jumbf_bytes: &[u8], instance: u16) -> Vec<Vec<u8>> {
    let total_len = jumbf_bytes.len();
    let chunks: Vec<&[u8]> = jumbf_bytes.chunks(MAX_SEGMENT_PAYLOAD).collect();
    let mut segments = Vec::with_capacity(chunks.len());

    for (i, chunk) in chunks.iter().enumerate() {
        let mut payload = Vec::with_capacity(APP11_HEADER_LEN + chunk.len());
        payload.extend_from_slice(&JUMBF_CI);
        payload.extend_from_slice(&instance.to_be_bytes());
        payload.extend_from_slice(&((i + 1) as u32).to_be_bytes());
        payload.extend_from_slice(&(total_len as u32).to_be_bytes());
        payload.extend_from_slice(b"jumb");
        payload.extend_from_slice(chunk);

        let mut segment = Vec::with_capacity(4 + payload.len());
        segment.extend_from_slice(&APP11.to_be_bytes());
        segment.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
        segment.extend_from_slice(&payload);
        segments.push(segment);
    }

    segments
}

/// Reassemble the JUMBF bytes spread across every `APP11` segment in
/// `data`, in packet-sequence-number order.
pub fn read_jumbf_from_jpeg(data: &[u8]) -> Result<Vec<u8>> {
    let segments = walk_segments(data)?;
    let mut parts: Vec<(u32, &[u8])> = Vec::new();

    for seg in &segments {
        if seg.marker != APP11 {
            continue;
        }
        let payload = &data[seg.payload_start..seg.payload_start + seg.payload_len];
        if payload.len() < APP11_HEADER_LEN || payload[..4] != JUMBF_CI {
            continue;
        }
        let seq = BigEndian::read_u32(&payload[6..10]);
        parts.push((seq, &payload[APP11_HEADER_LEN..]));
    }

    if parts.is_empty() {
        return Err(Error::NotFound("no c2pa manifest found in this JPEG".into()));
    }

    parts.sort_by_key(|(seq, _)| *seq);
    Ok(parts.into_iter().flat_map(|(_, p)| p.to_vec()).collect())
}

/// First embedded XMP packet, if any (`APP1` with the XMP signature).
pub fn read_xmp_from_jpeg(data: &[u8]) -> Option<String> {
    let segments = walk_segments(data).ok()?;
    for seg in segments {
        if seg.marker != APP1 {
            continue;
        }
        let payload = &data[seg.payload_start..seg.payload_start + seg.payload_len];
        if let Some(rest) = payload.strip_prefix(XMP_SIGNATURE) {
            return std::str::from_utf8(rest).ok().map(str::to_owned);
        }
    }
    None
}

/// Remove every existing `APP11` JUMBF segment from `data`, returning
/// the spliced result. Used before re-embedding (`--repackage`-style
/// flows) so stale manifests aren't left behind.
pub fn remove_jumbf_from_jpeg(data: &[u8]) -> Result<Vec<u8>> {
    let segments = walk_segments(data)?;
    let mut out = Vec::with_capacity(data.len());
    let mut cursor = 0;
    for seg in &segments {
        if seg.marker == APP11 {
            out.extend_from_slice(&data[cursor..seg.offset]);
            cursor = seg.payload_start + seg.payload_len;
        }
    }
    out.extend_from_slice(&data[cursor..]);
    Ok(out)
}

fn assertion_box_len(assertion: &Assertion) -> Result<usize> {
    Ok(assertion.to_jumbf_box()?.to_bytes()?.len())
}

/// Embed `manifest` (with every non-binding assertion already added by
/// the caller) into `asset`, computing and signing the hard binding in
/// two passes. `prior_manifests` are carried along unchanged (oldest
/// first) ahead of the new active manifest — this is how `--repackage`
/// keeps an earlier signed manifest in the store as history.
///
/// 1. A dummy `c2pa.hash.data` assertion is added and the manifest is
///    fully signed to learn its exact reserved byte size.
/// 2. That many bytes are spliced into the asset, the real data hash is
///    computed over the result (excluding the reserved range), and the
///    manifest is rebuilt and re-signed with the real hash — adjusting
///    the assertion's `pad` in `PAD_UNIT` steps if needed so the final
///    manifest is byte-identical in size to the reservation.
pub fn embed_manifest_in_jpeg(
    asset: &[u8],
    prior_manifests: &[Manifest],
    manifest: &Manifest,
    signer: &dyn Signer,
) -> Result<Vec<u8>> {
    let offset = insert_offset(asset)?;
    let alg = manifest.claim.hash_alg().unwrap_or(HashAlg::Sha256);
    let digest_len = match alg {
        HashAlg::Sha256 => 32,
        HashAlg::Sha384 => 48,
        HashAlg::Sha512 => 64,
    };

    // Pass 1: placeholder, sized to roughly the final exclusion's
    // magnitude so its CBOR integer encoding doesn't change length.
    let mut placeholder_dh = DataHash::new(
        Some("jpeg manifest".into()),
        vec![Exclusion {
            start: offset as u64,
            length: u32::MAX as u64,
        }],
    );
    placeholder_dh.hash = vec![0u8; digest_len];
    placeholder_dh.alg = Some(alg.as_str().to_owned());

    let mut dummy_manifest = manifest.clone();
    dummy_manifest.add_assertion(Assertion::new_cbor(data_hash::LABEL, placeholder_dh.to_cbor()))?;

    let mut dummy_store = Store::new();
    for prior in prior_manifests {
        dummy_store.add_manifest(prior.clone())?;
    }
    dummy_store.add_manifest(dummy_manifest)?;
    dummy_store.sign_active_manifest(signer)?;
    let jumbf_bytes = dummy_store.to_jumbf_box()?.to_bytes()?;

    let segments = build_app11_segments(&jumbf_bytes, 1);
    let spliced_len: usize = segments.iter().map(Vec::len).sum();

    let mut working = Vec::with_capacity(asset.len() + spliced_len);
    working.extend_from_slice(&asset[..offset]);
    for seg in &segments {
        working.extend_from_slice(seg);
    }
    working.extend_from_slice(&asset[offset..]);

    // Pass 2: the real hash, with the real (now-known) exclusion range.
    let real_exclusion = Exclusion {
        start: offset as u64,
        length: spliced_len as u64,
    };
    let mut real_dh = DataHash::new(Some("jpeg manifest".into()), vec![real_exclusion]);
    real_dh.compute(alg, &working)?;

    let placeholder_len = assertion_box_len(&Assertion::new_cbor(data_hash::LABEL, placeholder_dh.to_cbor()))?;
    settle_pad(&mut real_dh, placeholder_len)?;

    let mut final_manifest = manifest.clone();
    final_manifest.add_assertion(Assertion::new_cbor(data_hash::LABEL, real_dh.to_cbor()))?;

    let mut final_store = Store::new();
    for prior in prior_manifests {
        final_store.add_manifest(prior.clone())?;
    }
    final_store.add_manifest(final_manifest)?;
    final_store.sign_active_manifest(signer)?;
    let final_jumbf_bytes = final_store.to_jumbf_box()?.to_bytes()?;
    let final_segments = build_app11_segments(&final_jumbf_bytes, 1);
    let final_spliced_len: usize = final_segments.iter().map(Vec::len).sum();

    if final_spliced_len != spliced_len {
        return Err(Error::CoseSigboxTooSmall(spliced_len));
    }

    let mut out = Vec::with_capacity(asset.len() + final_spliced_len);
    out.extend_from_slice(&asset[..offset]);
    for seg in &final_segments {
        out.extend_from_slice(seg);
    }
    out.extend_from_slice(&asset[offset..]);

    Ok(out)
}

/// Nudge `dh.pad` in [`PAD_UNIT`] steps until its assertion box encodes
/// to exactly `target_len` bytes, mirroring `cose_sign::pad_cose_sig`'s
/// retry loop for the same reason: a byte count near a CBOR length
/// encoding boundary can overshoot a single adjustment.
fn settle_pad(dh: &mut DataHash, target_len: usize) -> Result<()> {
    for _ in 0..8 {
        let current_len = assertion_box_len(&Assertion::new_cbor(data_hash::LABEL, dh.to_cbor()))?;
        if current_len == target_len {
            return Ok(());
        }
        let without_pad = current_len - dh.pad.len();
        dh.resize_pad(without_pad, target_len)?;
    }
    let current_len = assertion_box_len(&Assertion::new_cbor(data_hash::LABEL, dh.to_cbor()))?;
    if current_len == target_len {
        Ok(())
    } else {
        Err(Error::CoseSigboxTooSmall(target_len))
    }
}

/// Placeholder pad constant re-exported for callers that want to
/// reserve headroom before the first embed (e.g. the CLI estimating
/// output size for progress reporting).
pub const DEFAULT_PAD_UNIT: usize = PAD_UNIT;

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_jpeg() -> Vec<u8> {
        let mut data = vec![0xFF, 0xD8]; // SOI
        data.extend_from_slice(&[0xFF, 0xE0, 0x00, 0x04, 0x4A, 0x46]); // tiny APP0-ish filler
        data.extend_from_slice(&[0xFF, 0xDA, 0x00, 0x02]); // SOS (no scan payload, fine for this test)
        data.extend_from_slice(&[0x00, 0x00]);
        data.extend_from_slice(&[0xFF, 0xD9]); // EOI
        data
    }

    #[test]
    fn round_trips_jumbf_through_app11_segments() {
        let jumbf = vec![0xAB; 200_000]; // forces multiple segments
        let segments = build_app11_segments(&jumbf, 7);
        assert!(segments.len() > 1);

        let mut jpeg = minimal_jpeg();
        let mut pos = insert_offset(&jpeg).unwrap();
        for seg in &segments {
            jpeg.splice(pos..pos, seg.iter().cloned());
            pos += seg.len();
        }

        let recovered = read_jumbf_from_jpeg(&jpeg).unwrap();
        assert_eq!(recovered, jumbf);
    }

    #[test]
    fn finds_xmp_packet() {
        let mut payload = XMP_SIGNATURE.to_vec();
        payload.extend_from_slice(b"<x:xmpmeta/>");
        let mut segment = vec![0xFF, 0xE1];
        segment.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
        segment.extend_from_slice(&payload);

        let mut jpeg = minimal_jpeg();
        let offset = insert_offset(&jpeg).unwrap();
        jpeg.splice(offset..offset, segment);

        assert_eq!(read_xmp_from_jpeg(&jpeg).unwrap(), "<x:xmpmeta/>");
    }

    #[test]
    fn remove_strips_app11_but_keeps_other_segments() {
        let jumbf = vec![1, 2, 3, 4];
        let segments = build_app11_segments(&jumbf, 1);
        let mut jpeg = minimal_jpeg();
        let offset = insert_offset(&jpeg).unwrap();
        jpeg.splice(offset..offset, segments[0].iter().cloned());

        let cleaned = remove_jumbf_from_jpeg(&jpeg).unwrap();
        assert!(read_jumbf_from_jpeg(&cleaned).is_err());
        assert_eq!(cleaned, minimal_jpeg());
    }
}
