// SPDX-FileCopyrightText: 2026 Vaultplug Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Folder semantics shared by the store implementations.

use std::collections::BTreeSet;

/// Immediate children of `prefix` among `keys`.
///
/// Leaf keys are returned as their suffix; deeper keys collapse to their
/// first segment with a trailing `/`. Output is sorted and deduplicated.
pub fn list_children<'a, I>(keys: I, prefix: &str) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut children = BTreeSet::new();
    for key in keys {
        let Some(rest) = key.strip_prefix(prefix) else {
            continue;
        };
        if rest.is_empty() {
            continue;
        }
        match rest.find('/') {
            Some(idx) => children.insert(rest[..=idx].to_string()),
            None => children.insert(rest.to_string()),
        };
    }
    children.into_iter().collect()
}
