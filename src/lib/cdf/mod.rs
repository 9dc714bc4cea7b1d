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

//! Decoder for the Compound File Binary Format (also known as OLE file, COM file, or Structured Storage file).
//!
//! The whole document is held in memory. Decoding runs header, SAT, SSAT, directory stream
//! and directory entries in this order, and materializes the content of every kept stream.

mod directory;
mod document;
mod header;
mod stream;
mod structures;
mod table;
mod tree;

use std::collections::BTreeMap;
use tracing::debug;
use crate::error::Result;
use crate::io::ByteReader;
use self::directory::{read_directory_entries, read_directory_stream, EntryFilter, EntrySources};
use self::header::read_header;
use self::stream::AddressSpace;
use self::table::{build_sat, build_ssat};
use self::tree::resolve_root_storage_descendants;

pub use self::directory::{DirectoryEntry, EntryType};
pub use self::document::{open_bytes, open_path, open_reader, read_stream, read_stream_from_path, read_streams, read_streams_from_path, Document};
pub use self::structures::SecId;

/// Stream contents by entry name. Entries that carry no content map to `None`.
/// If several entries share a name, the last one decoded wins.
pub type StreamMap = BTreeMap<String, Option<Vec<u8>>>;

/// Which entries a decode returns.
#[derive(Clone, Copy)]
pub enum Selection<'a> {
	/// All entries, as a list.
	Everything,
	/// The first entry whose name satisfies the predicate.
	FirstMatch(&'a dyn Fn(&str) -> bool),
	/// All entries whose names satisfy the predicate.
	AllMatches(&'a dyn Fn(&str) -> bool),
}

#[derive(Clone, Copy)]
pub struct DecodeOptions<'a> {
	pub selection: Selection<'a>,
	/// Only keep entries that are reachable from the root storage's tree, in tree order.
	pub descendants_only: bool,
}

impl<'a> Default for DecodeOptions<'a> {
	fn default() -> DecodeOptions<'a> {
		DecodeOptions { selection: Selection::Everything, descendants_only: false }
	}
}

#[derive(Debug)]
pub enum Decoded {
	Entries(Vec<DirectoryEntry>),
	Streams(StreamMap),
}

/// Decodes a complete compound document held in memory.
pub fn decode(data: &[u8], options: &DecodeOptions) -> Result<Decoded> {
	let entries = decode_entries(data, options.selection, options.descendants_only)?;
	Ok(match options.selection {
		Selection::Everything => Decoded::Entries(entries),
		Selection::FirstMatch(name_match) => Decoded::Streams(collect_streams(entries, name_match, true)),
		Selection::AllMatches(name_match) => Decoded::Streams(collect_streams(entries, name_match, false)),
	})
}

fn is_match(entry: &DirectoryEntry, name_match: &dyn Fn(&str) -> bool) -> bool {
	entry.name().map_or(false, |name| name_match(name))
}

fn collect_streams(entries: Vec<DirectoryEntry>, name_match: &dyn Fn(&str) -> bool, first_only: bool) -> StreamMap {
	let mut streams = StreamMap::new();
	for entry in entries.into_iter().filter(|entry| is_match(entry, name_match)) {
		let name = entry.name().unwrap_or_default().to_owned();
		streams.insert(name, entry.into_stream());
		if first_only {
			break;
		}
	}
	streams
}

/// Runs the decoding pipeline and returns the kept entries.
/// Unless `descendants_only` is set, entries rejected by the selection are never materialized.
pub(crate) fn decode_entries(data: &[u8], selection: Selection, descendants_only: bool) -> Result<Vec<DirectoryEntry>> {
	debug!("[decode] Decoding compound document ({} bytes) ...", data.len());
	let mut reader = ByteReader::new(data);
	let header = read_header(&mut reader)?;
	let sat = build_sat(&mut reader, &header)?;
	let ssat = build_ssat(&mut reader, &header, &sat)?;
	let directory = read_directory_stream(&mut reader, &header, &sat)?;

	let sources = EntrySources {
		header: &header,
		standard: AddressSpace::standard(data, &header, &sat),
		ssat: ssat.as_ref(),
	};

	if descendants_only {
		// The tree can only be resolved on the complete directory, unused slots included;
		// selection happens afterwards
		let filter = EntryFilter { keep_unused: true, ..EntryFilter::everything() };
		let mut entries = resolve_root_storage_descendants(read_directory_entries(&directory, &sources, &filter)?)?;
		entries.retain(|entry| entry.is_root_storage_descendant() || entry.entry_type() != EntryType::Empty);
		return Ok(entries);
	}

	let filter = match selection {
		Selection::Everything => EntryFilter::everything(),
		Selection::FirstMatch(name_match) => EntryFilter { name_match: Some(name_match), first_only: true, keep_unused: false },
		Selection::AllMatches(name_match) => EntryFilter { name_match: Some(name_match), first_only: false, keep_unused: false },
	};
	read_directory_entries(&directory, &sources, &filter)
}
