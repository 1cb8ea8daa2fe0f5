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

//! Content-carrying JUMBF box bodies: CBOR, JSON, and the embedded-file
//! pair (`bfdb` + `bidb`). These operate purely on bytes — the semantic
//! meaning of a given content box (which assertion type it is) is
//! decided by `store`/`claim` using the sibling `jumd` description.

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use ciborium::value::Value as CborValue;

use crate::error::{Error, Result};

/// `cbor` box: payload is a single canonical CBOR item.
pub fn decode_cbor(payload: &[u8]) -> Result<CborValue> {
    ciborium::de::from_reader(payload).map_err(Error::from)
}

pub fn encode_cbor(value: &CborValue) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::ser::into_writer(value, &mut buf).map_err(Error::from)?;
    Ok(buf)
}

/// `json` box: payload is UTF-8 JSON text.
pub fn decode_json(payload: &[u8]) -> Result<serde_json::Value> {
    let s = std::str::from_utf8(payload).map_err(|e| Error::JumbfParse(e.to_string()))?;
    serde_json::from_str(s).map_err(Error::from)
}

pub fn encode_json(value: &serde_json::Value) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

/// `bfdb` — embedded-file description box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescription {
    pub media_type: String,
    pub file_name: Option<String>,
    pub external: bool,
}

const FILENAME_PRESENT: u8 = 0x01;
const EXTERNAL: u8 = 0x02;

impl FileDescription {
    pub fn read(payload: &[u8]) -> Result<Self> {
        let mut cursor = std::io::Cursor::new(payload);
        let toggle = cursor.read_u8()?;
        let media_type = read_cstring(&mut cursor)?;
        let file_name = if toggle & FILENAME_PRESENT != 0 {
            Some(read_cstring(&mut cursor)?)
        } else {
            None
        };
        Ok(Self {
            media_type,
            file_name,
            external: toggle & EXTERNAL != 0,
        })
    }

    pub fn write(&self) -> Result<Vec<u8>> {
        let mut toggle = 0u8;
        if self.file_name.is_some() {
            toggle |= FILENAME_PRESENT;
        }
        if self.external {
            toggle |= EXTERNAL;
        }

        let mut buf = Vec::new();
        buf.write_u8(toggle)?;
        buf.extend_from_slice(self.media_type.as_bytes());
        buf.push(0);
        if let Some(name) = &self.file_name {
            buf.extend_from_slice(name.as_bytes());
            buf.push(0);
        }
        Ok(buf)
    }
}

/// `bidb` — embedded-file data box: either the raw file bytes (internal)
/// or a NUL-terminated URL (external), per the sibling `bfdb`'s toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileData {
    Internal(Vec<u8>),
    External(String),
}

impl FileData {
    pub fn read(payload: &[u8], external: bool) -> Result<Self> {
        if external {
            let mut cursor = std::io::Cursor::new(payload);
            Ok(Self::External(read_cstring(&mut cursor)?))
        } else {
            Ok(Self::Internal(payload.to_vec()))
        }
    }

    pub fn write(&self) -> Vec<u8> {
        match self {
            Self::Internal(bytes) => bytes.clone(),
            Self::External(url) => {
                let mut buf = url.as_bytes().to_vec();
                buf.push(0);
                buf
            }
        }
    }
}

fn read_cstring(cursor: &mut std::io::Cursor<&[u8]>) -> Result<String> {
    let buf = cursor.get_ref();
    let start = cursor.position() as usize;
    let nul = buf[start..]
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| Error::JumbfParse("missing NUL terminator".into()))?;
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
    fn cbor_round_trip() {
        let v = CborValue::Map(vec![(
            CborValue::Text("alg".into()),
            CborValue::Text("sha256".into()),
        )]);
        let bytes = encode_cbor(&v).unwrap();
        assert_eq!(decode_cbor(&bytes).unwrap(), v);
    }

    #[test]
    fn json_round_trip() {
        let v = serde_json::json!({"dc:format": "image/jpeg"});
        let bytes = encode_json(&v).unwrap();
        assert_eq!(decode_json(&bytes).unwrap(), v);
    }

    #[test]
    fn file_description_round_trip_with_filename() {
        let fd = FileDescription {
            media_type: "image/jpeg".into(),
            file_name: Some("thumbnail.jpg".into()),
            external: false,
        };
        let bytes = fd.write().unwrap();
        assert_eq!(FileDescription::read(&bytes).unwrap(), fd);
    }

    #[test]
    fn file_data_external_round_trip() {
        let fd = FileData::External("https://example.com/thumb.jpg".into());
        let bytes = fd.write();
        match FileData::read(&bytes, true).unwrap() {
            FileData::External(url) => assert_eq!(url, "https://example.com/thumb.jpg"),
            _ => panic!("expected external"),
        }
    }
}
