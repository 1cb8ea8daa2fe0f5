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

//! The stream traits `jpeg_io` embeds/extracts through. Kept narrow to
//! what a single asset format needs: a per-format `AssetIO`/`AssetPatch`
//! abstraction made sense in a multi-format SDK, but this implementation
//! only ever talks to `jpeg_io` directly, so those layers are dropped.

use std::fmt;
use std::io::{Read, Seek, Write};

use tempfile::NamedTempFile;

/// What kind of reserved byte range a [`HashObjectPositions`] entry
/// describes, for the data-hash exclusion list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HashBlockObjectType {
    Cai,
    Xmp,
    Other,
}

impl fmt::Display for HashBlockObjectType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

#[derive(Debug, Clone, Copy)]
pub struct HashObjectPositions {
    pub offset: usize,
    pub length: usize,
    pub htype: HashBlockObjectType,
}

/// A seekable source of asset bytes.
pub trait CAIRead: Read + Seek {}

impl CAIRead for std::fs::File {}
impl CAIRead for std::io::Cursor<&[u8]> {}
impl CAIRead for std::io::Cursor<&mut [u8]> {}
impl CAIRead for std::io::Cursor<Vec<u8>> {}
impl CAIRead for NamedTempFile {}

/// A seekable, writable asset destination.
pub trait CAIReadWrite: CAIRead + Write {}

impl CAIReadWrite for std::fs::File {}
impl CAIReadWrite for std::io::Cursor<&mut [u8]> {}
impl CAIReadWrite for std::io::Cursor<Vec<u8>> {}
impl CAIReadWrite for NamedTempFile {}
