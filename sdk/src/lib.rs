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

//! Rust SDK for [C2PA](https://c2pa.org) (Coalition for Content Provenance
//! and Authenticity): build, embed, and verify content-provenance
//! manifests carried as JUMBF boxes inside a JPEG file.
//!
//! A manifest is an ordered tree: [`store::Store`] holds every
//! [`manifest::Manifest`] signed against an asset (the most recently
//! added is active), a manifest's [`claim::Claim`] lists hashed-URI
//! references to its [`assertion::Assertion`]s (typed kinds under
//! [`assertions`]), and exactly one assertion is named as the claim's
//! hard binding — normally a [`assertions::DataHash`] over the asset
//! bytes.
//!
//! [`builder::Builder`] assembles and signs a new manifest into a JPEG;
//! [`reader::Reader`] extracts and verifies one back out. Both work
//! purely against in-memory byte buffers — this crate does not open
//! files itself, matching [`asset_io`]'s narrowed-to-JPEG stream seam.

pub mod assertion;
pub mod assertions;
pub mod asset_io;
pub mod builder;
pub mod cert_profile;
pub mod claim;
pub mod cose_sign;
pub mod cose_validator;
pub mod error;
pub mod hash_utils;
pub mod hashed_uri;
pub mod jpeg_io;
pub mod jumbf;
pub mod manifest;
pub mod reader;
pub mod settings;
pub mod signature;
pub mod signer;
pub mod status_tracker;
pub mod store;
pub mod time_stamp;
pub mod url;
pub mod validation_status;

pub use asset_io::{CAIRead, CAIReadWrite};
pub use builder::Builder;
pub use error::{Error, Result};
pub use hash_utils::HashAlg;
pub use manifest::Manifest;
pub use reader::Reader;
pub use settings::Settings;
pub use signer::{Signer, SigningAlg};
pub use store::Store;
pub use validation_status::ValidationStatus;
