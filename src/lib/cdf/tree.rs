/*
cdfreader library & toolset
Copyright (C) 2018 Steve Muller <steve.muller@outlook.com>

This program is free software: you can redistribute it and/or modify
it under the terms of the GNU General Public License as published by
the Free Software Foundation, either version 3 of the License, or
(at your option) any later version.

This program is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
GNU General Public License for more details.

You should have received a copy of the GNU General Public License
along with this program.  If not, see <http://www.gnu.org/licenses/>.
*/

use tracing::{debug, trace};
use crate::error::{Error, Result};
use super::directory::DirectoryEntry;

/// Walks the binary tree of the root storage, starting at the root's tree node,
/// and keeps only the entries reached, in visiting order.
/// If the root storage has no tree node, all entries are returned unchanged.
///
/// Each node is visited before its right subtree, which is visited before its left subtree.
/// `entries` must be the complete, unfiltered directory in ID order, unused slots included,
/// so that only IDs beyond the directory are dangling.
pub fn resolve_root_storage_descendants(mut entries: Vec<DirectoryEntry>) -> Result<Vec<DirectoryEntry>> {
	let start = match entries.first().and_then(|root| root.root_node()) {
		Some(start) => start,
		None => {
			debug!("[resolve_root_storage_descendants] Root storage has no tree, keeping all entries.");
			return Ok(entries);
		},
	};

	let mut visit_order = 0u32;
	// Explicit stack instead of recursion, so that degenerate trees cannot exhaust the call stack
	let mut pending: Vec<usize> = vec![start];
	while let Some(id) = pending.pop() {
		let position = entries.binary_search_by_key(&id, |entry| entry.id)
			.map_err(|_| Error::ReferredChildDirectoryEntryMissing(id))?;
		let entry = &mut entries[position];
		if entry.visit_order.is_some() {
			debug!("[resolve_root_storage_descendants] Entry #{} is reachable twice!", id);
			return Err(Error::CyclicChildDirectoryEntryReference);
		}

		visit_order += 1;
		entry.visit_order = Some(visit_order);
		entry.is_root_storage_descendant = true;
		trace!("[resolve_root_storage_descendants] Visited #{} as {}th.", id, visit_order);

		// The left subtree is pushed first so that the right one is popped (and visited) first
		if let Some(left) = entry.left_child() {
			pending.push(left);
		}
		if let Some(right) = entry.right_child() {
			pending.push(right);
		}
	}

	entries.retain(|entry| entry.is_root_storage_descendant);
	entries.sort_by_key(|entry| entry.visit_order);
	debug!("[resolve_root_storage_descendants] Root storage has {} descendants.", entries.len());
	Ok(entries)
}
