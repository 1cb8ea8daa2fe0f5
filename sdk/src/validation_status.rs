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

//! Validation status codes: the "normal channel" of the error-handling
//! design. Every sign/verify pass returns a list of these instead of
//! aborting on the first problem; successes are recorded explicitly so a
//! caller can tell "checked and passed" from "not checked".

use serde::{Deserialize, Serialize};

/// A single validation outcome.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationStatus {
    /// One of the c2pa status code strings, e.g. `claimSignature.validated`.
    pub code: String,
    #[serde(rename = "isError")]
    pub is_error: bool,
    pub message: Option<String>,
    pub url: Option<String>,
    pub cause: Option<String>,
    /// A pointer into the structure that produced this status, e.g.
    /// `Cose_Sign1.x5chain[0]` for a certificate-profile failure on the
    /// leaf certificate. Distinct from `url`, which names a JUMBF
    /// resource rather than a position within one.
    pub referenced: Option<String>,
}

impl ValidationStatus {
    pub fn new(code: impl Into<String>, is_error: bool) -> Self {
        Self {
            code: code.into(),
            is_error,
            message: None,
            url: None,
            cause: None,
            referenced: None,
        }
    }

    pub fn ok(code: impl Into<String>) -> Self {
        Self::new(code, false)
    }

    pub fn error(code: impl Into<String>) -> Self {
        Self::new(code, true)
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    pub fn with_referenced(mut self, referenced: impl Into<String>) -> Self {
        self.referenced = Some(referenced.into());
        self
    }

    pub fn is_ok(&self) -> bool {
        !self.is_error
    }
}

/// The c2pa status code enumeration (a subset sufficient for this
/// implementation's scope). Kept as string constants rather than a
/// closed enum: the full c2pa registry is "approximately 40 values" and
/// hosts are expected to match on the string, not a Rust variant.
pub mod codes {
    pub const CLAIM_SIGNATURE_VALIDATED: &str = "claimSignature.validated";
    pub const CLAIM_SIGNATURE_MISMATCH: &str = "claimSignature.mismatch";
    pub const CLAIM_SIGNATURE_MISSING: &str = "claimSignature.missing";

    pub const CLAIM_MISSING: &str = "claim.missing";
    pub const CLAIM_MULTIPLE: &str = "claim.multiple";
    pub const CLAIM_HARD_BINDINGS_MISSING: &str = "claim.hardBindings.missing";

    pub const ASSERTION_MISSING: &str = "assertion.missing";
    pub const ASSERTION_HASHEDURI_MATCH: &str = "assertion.hashedURI.match";
    pub const ASSERTION_HASHEDURI_MISMATCH: &str = "assertion.hashedURI.mismatch";
    pub const ASSERTION_DATAHASH_MATCH: &str = "assertion.dataHash.match";
    pub const ASSERTION_DATAHASH_MISMATCH: &str = "assertion.dataHash.mismatch";
    pub const ASSERTION_MULTIPLE_HARD_BINDINGS: &str = "assertion.multipleHardBindings";

    pub const INGREDIENT_HASHEDURI_MATCH: &str = "ingredient.hashedURI.match";
    pub const INGREDIENT_HASHEDURI_MISMATCH: &str = "ingredient.hashedURI.mismatch";

    pub const MANIFEST_MULTIPLE_PARENTS: &str = "manifest.multipleParents";

    pub const SIGNING_CREDENTIAL_TRUSTED: &str = "signingCredential.trusted";
    pub const SIGNING_CREDENTIAL_UNTRUSTED: &str = "signingCredential.untrusted";
    pub const SIGNING_CREDENTIAL_INVALID: &str = "signingCredential.invalid";
    pub const SIGNING_CREDENTIAL_EXPIRED: &str = "signingCredential.expired";

    pub const TIMESTAMP_OUTSIDE_VALIDITY: &str = "timeStamp.outsideValidity";

    pub const ALGORITHM_UNSUPPORTED: &str = "algorithm.unsupported";
    pub const GENERAL_ERROR: &str = "general.error";
}
