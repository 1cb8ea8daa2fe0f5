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

//! C2PA JUMBF URL syntax: `self#jumbf=[/]label1/label2/...`.
//!
//! These are not general URLs (no scheme/host/query) so this is a small
//! bespoke parser rather than a dependency on the `url` crate, which the
//! reference project pulls in only for unrelated remote-manifest
//! fetching (out of this implementation's scope; see DESIGN.md).

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JumbfUrl {
    pub absolute: bool,
    pub path: Vec<String>,
}

impl JumbfUrl {
    pub fn parse(url: &str) -> Option<Self> {
        let rest = url.strip_prefix("self#jumbf=").unwrap_or(url);
        let (absolute, rest) = match rest.strip_prefix('/') {
            Some(r) => (true, r),
            None => (false, rest),
        };
        if rest.is_empty() {
            return Some(Self {
                absolute,
                path: Vec::new(),
            });
        }
        let path = rest.split('/').map(str::to_owned).collect();
        Some(Self { absolute, path })
    }

    pub fn to_url_string(&self) -> String {
        let mut s = String::from("self#jumbf=");
        if self.absolute {
            s.push('/');
        }
        s.push_str(&self.path.join("/"));
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_absolute_path() {
        let u = JumbfUrl::parse("self#jumbf=/c2pa/urn:foo/c2pa.assertions/c2pa.hash.data").unwrap();
        assert!(u.absolute);
        assert_eq!(
            u.path,
            vec!["c2pa", "urn:foo", "c2pa.assertions", "c2pa.hash.data"]
        );
    }

    #[test]
    fn parses_relative_path() {
        let u = JumbfUrl::parse("self#jumbf=c2pa.assertions/c2pa.actions").unwrap();
        assert!(!u.absolute);
        assert_eq!(u.path, vec!["c2pa.assertions", "c2pa.actions"]);
    }

    #[test]
    fn round_trips_to_string() {
        let original = "self#jumbf=/c2pa/urn:foo";
        let u = JumbfUrl::parse(original).unwrap();
        assert_eq!(u.to_url_string(), original);
    }
}
