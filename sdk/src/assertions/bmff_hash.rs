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

//! `c2pa.hash.bmff` assertions are recognized on read but never built or
//! verified: BMFF/video container exclusion resolution needs a full
//! ISOBMFF box walker this implementation doesn't carry (JPEG is the
//! only supported asset format). A manifest naming this label is
//! reported as an unsupported hard binding rather than silently ignored.

pub const LABEL: &str = "c2pa.hash.bmff";

use crate::error::{Error, Result};

/// Always rejects: constructing a real BMFF hash assertion would require
/// resolving exclusions against an ISOBMFF box tree, which is out of
/// scope for this implementation.
pub fn reject_unsupported() -> Result<()> {
    Err(Error::Unsupported(
        "c2pa.hash.bmff assertions are not supported; only JPEG data-hash bindings are".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn always_rejects() {
        assert!(reject_unsupported().is_err());
    }
}
