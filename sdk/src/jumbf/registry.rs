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

//! The `type[.subtype[.label]]` registry and its longest-prefix-match
//! factory, used by `store`/`claim` to decide how to interpret a parsed
//! `jumb` box's description (its subtype and label) as a typed C2PA
//! construct.
//!
//! The matching algorithm — generic over the registered value type — is
//! kept separate from any particular table of assertion constructors so
//! it can be unit tested against the exact truncation order the spec
//! describes (full key, `__N` suffix stripped, `type.subtype`, `type`,
//! default).

use std::collections::HashMap;

/// A registry of dotted keys to values of type `V`.
#[derive(Debug, Default)]
pub struct Registry<V> {
    entries: HashMap<String, V>,
    default: Option<V>,
}

impl<V> Registry<V> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            default: None,
        }
    }

    pub fn register(&mut self, key: impl Into<String>, value: V) -> &mut Self {
        self.entries.insert(key.into(), value);
        self
    }

    pub fn set_default(&mut self, value: V) -> &mut Self {
        self.default = Some(value);
        self
    }

    /// Resolve `box_type[.subtype[.label]]` by trying, in order:
    /// 1. `type.subtype.label`
    /// 2. `type.subtype.label` with any trailing `__N` digit suffix on
    ///    the label stripped (deduplicated labels, e.g. `foo__2`).
    /// 3. `type.subtype`
    /// 4. `type`
    /// 5. the registry default, if any.
    pub fn resolve(&self, box_type: &str, subtype: Option<&str>, label: Option<&str>) -> Option<&V> {
        for key in candidate_keys(box_type, subtype, label) {
            if let Some(v) = self.entries.get(&key) {
                return Some(v);
            }
        }
        self.default.as_ref()
    }
}

/// Strip a trailing `__<digits>` suffix from a label, if present.
pub fn strip_instance_suffix(label: &str) -> Option<&str> {
    let idx = label.rfind("__")?;
    let suffix = &label[idx + 2..];
    if !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()) {
        Some(&label[..idx])
    } else {
        None
    }
}

fn candidate_keys<'a>(
    box_type: &'a str,
    subtype: Option<&'a str>,
    label: Option<&'a str>,
) -> Vec<String> {
    let mut keys = Vec::new();

    if let (Some(subtype), Some(label)) = (subtype, label) {
        keys.push(format!("{box_type}.{subtype}.{label}"));
        if let Some(stripped) = strip_instance_suffix(label) {
            keys.push(format!("{box_type}.{subtype}.{stripped}"));
        }
    }
    if let Some(subtype) = subtype {
        keys.push(format!("{box_type}.{subtype}"));
    }
    keys.push(box_type.to_string());
    keys
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_full_key_first() {
        let mut r: Registry<&str> = Registry::new();
        r.register("jumb.cbor.c2pa.hash.data", "data-hash");
        r.register("jumb.cbor", "generic-cbor");
        r.set_default("unknown");

        assert_eq!(
            r.resolve("jumb", Some("cbor"), Some("c2pa.hash.data")),
            Some(&"data-hash")
        );
    }

    #[test]
    fn strips_instance_suffix_before_falling_back() {
        let mut r: Registry<&str> = Registry::new();
        r.register("jumb.cbor.c2pa.actions", "actions");

        assert_eq!(
            r.resolve("jumb", Some("cbor"), Some("c2pa.actions__2")),
            Some(&"actions")
        );
    }

    #[test]
    fn falls_back_to_type_then_default() {
        let mut r: Registry<&str> = Registry::new();
        r.register("jumb", "generic-jumbf");
        r.set_default("fallback");

        assert_eq!(r.resolve("jumb", Some("weird"), Some("x")), Some(&"generic-jumbf"));
        assert_eq!(r.resolve("uuid", None, None), Some(&"fallback"));
    }

    #[test]
    fn strip_instance_suffix_rejects_non_numeric() {
        assert_eq!(strip_instance_suffix("c2pa.actions__v2"), None);
        assert_eq!(strip_instance_suffix("c2pa.actions__2"), Some("c2pa.actions"));
        assert_eq!(strip_instance_suffix("c2pa.actions"), None);
    }
}
