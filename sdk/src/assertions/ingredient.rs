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

//! `c2pa.ingredient`: a hashed-URI reference to a manifest this claim
//! treats as an input, plus its relationship (`parentOf`/`componentOf`).
//!
//! `parentOf` uniqueness — at most one ingredient may claim to be the
//! parent of the current claim — is a verify-time check
//! (`manifest.multipleParents`), made by `store::Store::verify_active_manifest`
//! once it can see every ingredient assertion in the manifest at once;
//! this type only carries one ingredient's own fields.
//!
//! Recursive validation of an ingredient's own manifest store is out of
//! scope: `Ingredient` carries the `c2pa_manifest` hashed-URI as an
//! opaque reference and this crate never walks into it.

use serde::{Deserialize, Serialize};

use crate::hashed_uri::HashedUri;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Relationship {
    #[serde(rename = "parentOf")]
    ParentOf,
    #[serde(rename = "componentOf")]
    ComponentOf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ingredient {
    pub title: String,
    pub format: String,
    pub relationship: Relationship,
    #[serde(rename = "c2pa_manifest", skip_serializing_if = "Option::is_none")]
    pub c2pa_manifest: Option<HashedUri>,
}

pub const LABEL: &str = "c2pa.ingredient";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relationship_serializes_lowercase() {
        let i = Ingredient {
            title: "source.jpg".into(),
            format: "image/jpeg".into(),
            relationship: Relationship::ParentOf,
            c2pa_manifest: None,
        };
        let json = serde_json::to_value(&i).unwrap();
        assert_eq!(json["relationship"], "parentOf");
    }
}
