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

//! The `jumd` description box: every JUMBF (`jumb`) box's first child,
//! carrying the extension subtype, toggle flags, label, and optional
//! id/signature/salt.

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{Error, Result};

/// The fixed 12-byte suffix that turns a 4-byte ASCII tag into a 16-byte
/// extension subtype UUID (the standard ISOBMFF "four-cc to UUID" trick).
const ALIAS_SUFFIX: [u8; 12] = [
    0x00, 0x11, 0x00, 0x10, 0x80, 0x00, 0x00, 0xaa, 0x00, 0x38, 0x9b, 0x71,
];

/// A 16-byte extension subtype, optionally aliased by a 4-character
/// printable ASCII tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtensionSubtype(pub [u8; 16]);

impl ExtensionSubtype {
    pub fn from_alias(tag: &[u8; 4]) -> Self {
        let mut bytes = [0u8; 16];
        bytes[..4].copy_from_slice(tag);
        bytes[4..].copy_from_slice(&ALIAS_SUFFIX);
        Self(bytes)
    }

    /// The canonical string key used for registry lookups: the 4-char
    /// alias if the legacy suffix is present and the first 4 bytes are
    /// printable ASCII, otherwise the full 32 hex digit subtype.
    pub fn key(&self) -> String {
        if self.0[4..] == ALIAS_SUFFIX && self.0[..4].iter().all(|b| b.is_ascii_graphic()) {
            String::from_utf8_lossy(&self.0[..4]).into_owned()
        } else {
            hex::encode(self.0)
        }
    }

    pub fn read(reader: &mut dyn std::io::Read) -> Result<Self> {
        let mut bytes = [0u8; 16];
        reader.read_exact(&mut bytes)?;
        Ok(Self(bytes))
    }

    pub fn write(&self, writer: &mut dyn std::io::Write) -> Result<()> {
        writer.write_all(&self.0)?;
        Ok(())
    }
}

const REQUESTABLE: u8 = 0x01;
const LABEL_PRESENT: u8 = 0x02;
const ID_PRESENT: u8 = 0x04;
const SIGNATURE_PRESENT: u8 = 0x08;
const SALT_PRESENT: u8 = 0x10;

/// Characters forbidden anywhere in a label, per spec.md §4.C.
fn label_char_is_forbidden(c: char) -> bool {
    let cp = c as u32;
    cp < 0x1F
        || (0x7F..=0x9F).contains(&cp)
        || matches!(c, '/' | ';' | '?' | '#')
        || (0xD800..=0xDFFF).contains(&cp) // surrogates (unreachable for a valid `char`, kept for clarity)
        || is_noncharacter(cp)
        || is_format_category(c)
}

fn is_noncharacter(cp: u32) -> bool {
    (0xFDD0..=0xFDEF).contains(&cp) || (cp & 0xFFFE) == 0xFFFE
}

/// A tiny approximation of Unicode's "Cf" (format) general category,
/// covering the codepoints a label would plausibly contain.
fn is_format_category(c: char) -> bool {
    matches!(
        c as u32,
        0x00AD | 0x200B..=0x200F | 0x202A..=0x202E | 0x2060..=0x2064 | 0xFEFF
    )
}

pub fn validate_label(label: &str) -> Result<()> {
    if let Some(c) = label.chars().find(|c| label_char_is_forbidden(*c)) {
        return Err(Error::InvalidLabel(format!(
            "label {label:?} contains forbidden character {c:?}"
        )));
    }
    Ok(())
}

/// A parsed/constructed `jumd` description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Description {
    pub subtype: ExtensionSubtype,
    pub requestable: bool,
    pub label: Option<String>,
    pub id: Option<u16>,
    pub signature: Option<[u8; 32]>,
    pub salt: Option<Vec<u8>>,
}

impl Description {
    pub fn new(subtype: ExtensionSubtype) -> Self {
        Self {
            subtype,
            requestable: false,
            label: None,
            id: None,
            signature: None,
            salt: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Result<Self> {
        let label = label.into();
        validate_label(&label)?;
        self.label = Some(label);
        Ok(self)
    }

    pub fn requestable(mut self, requestable: bool) -> Self {
        self.requestable = requestable;
        self
    }

    /// A requestable box with a present label is addressable by that
    /// label, per spec.md §3.
    pub fn is_requestable(&self) -> bool {
        self.requestable && self.label.is_some()
    }

    /// The dotted registry key fragment this description contributes:
    /// the subtype's alias or hex key.
    pub fn subtype_key(&self) -> String {
        self.subtype.key()
    }

    pub fn read(bytes: &[u8]) -> Result<Self> {
        let mut cursor = std::io::Cursor::new(bytes);
        let subtype = ExtensionSubtype::read(&mut cursor)?;
        let toggles = cursor.read_u8()?;

        let requestable = toggles & REQUESTABLE != 0;

        let label = if toggles & LABEL_PRESENT != 0 {
            Some(read_cstring(&mut cursor)?)
        } else {
            None
        };

        let id = if toggles & ID_PRESENT != 0 {
            Some(cursor.read_u16::<BigEndian>()?)
        } else {
            None
        };

        let signature = if toggles & SIGNATURE_PRESENT != 0 {
            let mut sig = [0u8; 32];
            std::io::Read::read_exact(&mut cursor, &mut sig)?;
            Some(sig)
        } else {
            None
        };

        let salt = if toggles & SALT_PRESENT != 0 {
            let salt_len = cursor.read_u32::<BigEndian>()?;
            let mut tag = [0u8; 4];
            std::io::Read::read_exact(&mut cursor, &mut tag)?;
            if &tag != b"c2sh" {
                return Err(Error::JumbfParse(
                    "salt structure missing c2sh tag".into(),
                ));
            }
            let mut salt = vec![0u8; (salt_len as usize).saturating_sub(8)];
            std::io::Read::read_exact(&mut cursor, &mut salt)?;
            Some(salt)
        } else {
            None
        };

        if let Some(label) = &label {
            validate_label(label)?;
        }

        Ok(Self {
            subtype,
            requestable,
            label,
            id,
            signature,
            salt,
        })
    }

    pub fn write(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.subtype.write(&mut buf)?;

        let mut toggles = 0u8;
        if self.requestable {
            toggles |= REQUESTABLE;
        }
        if self.label.is_some() {
            toggles |= LABEL_PRESENT;
        }
        if self.id.is_some() {
            toggles |= ID_PRESENT;
        }
        if self.signature.is_some() {
            toggles |= SIGNATURE_PRESENT;
        }
        if self.salt.is_some() {
            toggles |= SALT_PRESENT;
        }
        buf.write_u8(toggles)?;

        if let Some(label) = &self.label {
            validate_label(label)?;
            buf.extend_from_slice(label.as_bytes());
            buf.push(0);
        }
        if let Some(id) = self.id {
            buf.write_u16::<BigEndian>(id)?;
        }
        if let Some(sig) = &self.signature {
            buf.extend_from_slice(sig);
        }
        if let Some(salt) = &self.salt {
            buf.write_u32::<BigEndian>(salt.len() as u32 + 8)?;
            buf.extend_from_slice(b"c2sh");
            buf.extend_from_slice(salt);
        }

        Ok(buf)
    }
}

fn read_cstring(cursor: &mut std::io::Cursor<&[u8]>) -> Result<String> {
    let buf = cursor.get_ref();
    let start = cursor.position() as usize;
    let nul = buf[start..]
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| Error::JumbfParse("label missing NUL terminator".into()))?;
    let s = std::str::from_utf8(&buf[start..start + nul])
        .map_err(|e| Error::JumbfParse(e.to_string()))?
        .to_owned();
    cursor.set_position((start + nul + 1) as u64);
    Ok(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_round_trips_through_key() {
        let s = ExtensionSubtype::from_alias(b"c2pa");
        assert_eq!(s.key(), "c2pa");
    }

    #[test]
    fn non_alias_subtype_uses_hex_key() {
        let s = ExtensionSubtype([0xAB; 16]);
        assert_eq!(s.key(), hex::encode([0xABu8; 16]));
    }

    #[test]
    fn description_round_trips_with_label_and_id() {
        let d = Description::new(ExtensionSubtype::from_alias(b"cbor"))
            .requestable(true)
            .with_label("c2pa.hash.data")
            .unwrap();
        let mut d = d;
        d.id = Some(7);

        let bytes = d.write().unwrap();
        let parsed = Description::read(&bytes).unwrap();
        assert_eq!(parsed, d);
        assert!(parsed.is_requestable());
    }

    #[test]
    fn description_round_trips_with_salt() {
        let mut d = Description::new(ExtensionSubtype::from_alias(b"c2pa"));
        d.salt = Some(vec![1, 2, 3, 4]);
        let bytes = d.write().unwrap();
        let parsed = Description::read(&bytes).unwrap();
        assert_eq!(parsed.salt.as_deref(), Some(&[1u8, 2, 3, 4][..]));
    }

    #[test]
    fn rejects_label_with_forbidden_characters() {
        assert!(validate_label("c2pa/hash").is_err());
        assert!(validate_label("c2pa#hash").is_err());
        assert!(validate_label("c2pa.hash.data").is_ok());
    }
}
