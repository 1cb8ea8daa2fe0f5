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

//! The single error type for the crate.
//!
//! Per the validation model, failures that can be reported to a caller as a
//! list of status records (see [`crate::status::ValidationStatus`]) are
//! *not* represented here: those are accumulated on a status tracker and
//! never abort a sign/verify pass. `Error` is reserved for programming
//! faults and I/O faults, the two kinds that do abort the call.

use std::io;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    // -- programming faults --
    #[error("no signer has been installed")]
    MissingSigner,

    #[error("signer has an empty certificate chain")]
    EmptyCertChain,

    #[error("box is already parented, remove it before re-inserting")]
    AlreadyParented,

    #[error("box is not parented")]
    NotParented,

    #[error("index {0} out of range")]
    IndexOutOfRange(usize),

    #[error("claim is missing required field {0}")]
    ClaimMissingField(&'static str),

    #[error("claim.hardBindings.missing: no hard binding assertion was added before signing")]
    ClaimHardBindingsMissing,

    #[error("assertion.multipleHardBindings: a claim may have at most one hard binding assertion")]
    MultipleHardBindings,

    #[error("invalid jumbf box label: {0}")]
    InvalidLabel(String),

    // -- I/O faults --
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("unexpected end of stream while reading a jumbf box")]
    UnexpectedEof,

    // -- decode/encode faults (may also surface as validation outcomes) --
    #[error("box is sparse and cannot be re-encoded")]
    SparseBox,

    #[error("jumbf parse error: {0}")]
    JumbfParse(String),

    #[error("cbor decoding error: {0}")]
    CborDecoding(String),

    #[error("cbor encoding error: {0}")]
    CborEncoding(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cose signature error")]
    CoseSignature,

    #[error("reserved signature box of {0} bytes is too small for the generated signature")]
    CoseSigboxTooSmall(usize),

    #[error("hash mismatch: {0}")]
    HashMismatch(String),

    #[error("bad parameter: {0}")]
    BadParam(String),

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("settings error: {0}")]
    Settings(String),

    #[error("not found: {0}")]
    NotFound(String),
}

impl From<ciborium::de::Error<io::Error>> for Error {
    fn from(e: ciborium::de::Error<io::Error>) -> Self {
        Error::CborDecoding(e.to_string())
    }
}

impl From<ciborium::ser::Error<io::Error>> for Error {
    fn from(e: ciborium::ser::Error<io::Error>) -> Self {
        Error::CborEncoding(e.to_string())
    }
}

impl From<serde_cbor::Error> for Error {
    fn from(e: serde_cbor::Error) -> Self {
        Error::CborDecoding(e.to_string())
    }
}

pub(crate) fn wrap_io_err(e: io::Error) -> Error {
    Error::Io(e)
}
