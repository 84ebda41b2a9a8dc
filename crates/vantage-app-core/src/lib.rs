// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Application services shared by Vantage tools: a storage-agnostic config
//! service and the persisted receiver preferences.

pub mod config;
pub mod prefs;
