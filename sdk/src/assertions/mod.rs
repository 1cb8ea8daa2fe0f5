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

//! Typed assertion kinds. Each submodule only knows its own label and
//! payload shape; [`crate::assertion::Assertion::kind`] is what maps a
//! generic assertion to one of these by label via
//! [`crate::jumbf::registry::Registry`].

pub mod actions;
pub mod bmff_hash;
pub mod creative_work;
pub mod data_hash;
pub mod ingredient;

pub use actions::{Action, Actions};
pub use creative_work::CreativeWork;
pub use data_hash::DataHash;
pub use ingredient::{Ingredient, Relationship};
