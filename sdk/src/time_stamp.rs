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

//! RFC 3161 timestamp countersignature support for the COSE `sigTst`
//! header. A real implementation would POST a TimeStampReq to `url` and
//! parse the TimeStampResp; that network round trip, and parsing the
//! ASN.1 response, are out of this implementation's scope (see
//! DESIGN.md, Open Question #3) — `cose_timestamp_countersign` always
//! reports unsupported rather than silently skipping the countersign,
//! so a caller that asked for one finds out.

use crate::error::{Error, Result};
use crate::signer::SigningAlg;

/// A raw RFC 3161 `TimeStampToken`, opaque to this crate.
pub struct CounterSignature(pub Vec<u8>);

pub fn cose_timestamp_countersign(_data: &[u8], _alg: SigningAlg, _url: &str) -> Result<CounterSignature> {
    Err(Error::Unsupported(
        "RFC 3161 timestamp countersigning is not implemented; omit signer.time_authority_url()".into(),
    ))
}

/// Wrap a countersignature token in the CBOR shape the `sigTst` header
/// expects: `{ "tstTokens": [ { "val": <token bytes> } ] }`.
pub fn make_cose_timestamp(cts: &CounterSignature) -> ciborium::value::Value {
    use ciborium::value::Value;
    Value::Map(vec![(
        Value::Text("tstTokens".into()),
        Value::Array(vec![Value::Map(vec![(
            Value::Text("val".into()),
            Value::Bytes(cts.0.clone()),
        )])]),
    )])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn countersign_is_unsupported() {
        assert!(cose_timestamp_countersign(b"data", SigningAlg::Es256, "https://tsa.example").is_err());
    }
}
