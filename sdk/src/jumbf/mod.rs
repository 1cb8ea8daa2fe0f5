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

//! The JUMBF/BMFF box codec: generic framing (`boxes`), the `jumd`
//! description (`description`), content-carrying leaf boxes
//! (`content`), and the type/subtype/label registry (`registry`).
//!
//! Nothing in this module knows what a claim, manifest, or assertion is
//! — that's `store`/`claim`/`manifest`/`assertion`, which interpret a
//! `GenericBox` tree built here.

pub mod boxes;
pub mod content;
pub mod description;
pub mod registry;

pub use boxes::{Content, GenericBox};
pub use description::{Description, ExtensionSubtype};

/// The label a `jumb` box's `jumd` description names, if it has one.
/// Used throughout `store`/`manifest`/`claim` to find a specific child
/// by its well-known label rather than by position.
pub fn label_of(b: &GenericBox) -> Option<String> {
    let desc_box = b.children().iter().find(|c| &c.box_type == b"jumd")?;
    Description::read(desc_box.raw()?).ok()?.label
}

/// Find the first child of `b` whose `jumd` label equals `label`.
pub fn find_child_by_label<'a>(b: &'a GenericBox, label: &str) -> Option<&'a GenericBox> {
    b.children().iter().find(|c| label_of(c).as_deref() == Some(label))
}
