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

//! `c2pa.actions`: the ordered list of edit actions a claim records
//! (`c2pa.created`, `c2pa.edited`, ...). Structural only — this crate
//! doesn't interpret individual action semantics beyond carrying them.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Action {
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub when: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub software_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "parameters")]
    pub parameters: Option<serde_json::Value>,
}

impl Action {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            when: None,
            software_agent: None,
            parameters: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Actions {
    pub actions: Vec<Action>,
}

pub const LABEL: &str = "c2pa.actions";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_minimal_action() {
        let actions = Actions {
            actions: vec![Action::new("c2pa.created")],
        };
        let json = serde_json::to_value(&actions).unwrap();
        assert_eq!(json["actions"][0]["action"], "c2pa.created");
        assert!(json["actions"][0].get("when").is_none());
    }
}
