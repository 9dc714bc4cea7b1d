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

use std::char::{decode_utf16, REPLACEMENT_CHARACTER};
use std::cmp::min;
use std::fmt;
use byteorder::{ByteOrder, LittleEndian};
use tracing::{debug, trace};
use crate::error::{Error, Result};
use crate::io::ByteReader;
use super::stream::{AddressSpace, ShortStreamContainer};
use super::structures::{Header, SecId, DIRECTORY_ENTRY_SIZE};
use super::table::{read_sector, AllocationTable};

const NAME_STORAGE_SIZE: usize = 64;
/// 31 UTF-16 code units, excluding the terminating NUL.
const MAX_NAME_SIZE: i32 = 62;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EntryType {
	/// An unused directory slot.
	Empty,
	/// A folder.
	Storage,
	/// A file.
	Stream,
	/// The root folder; always entry #0.
	RootStorage,
}

impl EntryType {
	fn from_tag(tag: u8) -> Option<EntryType> {
		match tag {
			0 => Some(EntryType::Empty),
			1 => Some(EntryType::Storage),
			2 => Some(EntryType::Stream),
			5 => Some(EntryType::RootStorage),
			_ => None,
		}
	}
}

/// One node of the storage/stream tree.
#[derive(Debug, Clone)]
pub struct DirectoryEntry {
	pub(crate) id: usize,
	pub(crate) name: Option<String>,
	pub(crate) entry_type: EntryType,
	/// The ID of the left sibling in the binary tree (in this storage).
	pub(crate) left_child_id: i32,
	/// The ID of the right sibling in the binary tree (in this storage).
	pub(crate) right_child_id: i32,
	/// If this entry is a storage: the ID of the root of its own binary tree. Otherwise undefined.
	pub(crate) root_node_id: i32,
	pub(crate) first_sector: SecId,
	pub(crate) stream_size: u32,
	pub(crate) stream: Option<Vec<u8>>,
	pub(crate) visit_order: Option<u32>,
	pub(crate) is_root_storage_descendant: bool,
}

/// Tree links are plain entry IDs; anything that is not a positive ID means "no entry".
/// Entry #0 is the root storage and can never be linked to.
fn link(raw: i32) -> Option<usize> {
	if raw > 0 { Some(raw as usize) } else { None }
}

impl DirectoryEntry {
	/// Position of the record in the directory stream.
	pub fn id(&self) -> usize {
		self.id
	}

	/// `None` for unnamed (empty) slots.
	pub fn name(&self) -> Option<&str> {
		self.name.as_ref().map(|name| name.as_str())
	}

	pub fn entry_type(&self) -> EntryType {
		self.entry_type
	}

	pub fn left_child(&self) -> Option<usize> {
		link(self.left_child_id)
	}

	pub fn right_child(&self) -> Option<usize> {
		link(self.right_child_id)
	}

	pub fn root_node(&self) -> Option<usize> {
		link(self.root_node_id)
	}

	pub fn first_sector(&self) -> SecId {
		self.first_sector
	}

	/// The stream size as declared in the directory record.
	pub fn stream_size(&self) -> u32 {
		self.stream_size
	}

	/// The materialized content. Only entries with a nonzero declared size carry one
	/// (and the root storage only if the document has short streams).
	pub fn stream(&self) -> Option<&[u8]> {
		self.stream.as_ref().map(|stream| stream.as_slice())
	}

	pub fn into_stream(self) -> Option<Vec<u8>> {
		self.stream
	}

	pub fn is_root_storage_descendant(&self) -> bool {
		self.is_root_storage_descendant
	}

	/// Position in the traversal of the root storage, starting at 1. Only set in descendants-only mode.
	pub fn visit_order(&self) -> Option<u32> {
		self.visit_order
	}
}

impl fmt::Display for DirectoryEntry {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{}", self.name().unwrap_or("<empty>"))?;
		if self.entry_type == EntryType::Storage {
			return write!(f, " <STORAGE>");
		}
		match self.stream {
			Some(ref stream) if stream.len() == 1 => write!(f, " | 1 byte"),
			Some(ref stream) => write!(f, " | {} bytes", stream.len()),
			None => write!(f, " | <empty>"),
		}
	}
}

/// Concatenates all sectors of the directory stream.
/// The chain is walked twice: once with a tortoise and a hare to count its sectors
/// (and to detect cycles), once more to copy the sectors.
pub fn read_directory_stream(reader: &mut ByteReader, header: &Header, sat: &AllocationTable) -> Result<Vec<u8>> {
	let first_sector = header.first_directory_sector;
	debug!("[read_directory_stream] Measuring directory stream starting at {} ...", first_sector);

	let mut sector_count = 0usize;
	let mut slow = first_sector;
	let mut fast = first_sector;
	while slow != SecId::EndOfChain {
		slow = sat.next(slow)?;
		sector_count += 1;

		if fast != SecId::EndOfChain {
			let step = sat.next(fast)?;
			if step != SecId::EndOfChain {
				fast = sat.next(step)?;
				if slow == fast && slow.sector().is_some() {
					debug!("[read_directory_stream] Chain loops back to {}!", slow);
					return Err(Error::CyclicSecIdChain);
				}
			}
		}
	}
	debug!("[read_directory_stream] Directory stream spans {} sectors.", sector_count);

	let mut directory: Vec<u8> = Vec::with_capacity(min(sector_count.saturating_mul(header.sector_size), reader.len()));
	let mut current_sector = first_sector;
	for _ in 0..sector_count {
		trace!("[read_directory_stream] Copying directory sector {} ...", current_sector);
		directory.extend_from_slice(read_sector(reader, header, current_sector)?);
		current_sector = sat.next(current_sector)?;
	}
	Ok(directory)
}

/// Everything the entry decoder needs to resolve entry streams.
pub struct EntrySources<'a> {
	pub header: &'a Header,
	/// The standard sectors of the document.
	pub standard: AddressSpace<'a>,
	pub ssat: Option<&'a AllocationTable>,
}

/// Which entries to keep while decoding.
pub struct EntryFilter<'a> {
	pub name_match: Option<&'a dyn Fn(&str) -> bool>,
	/// Stop right after the first entry whose name matches.
	pub first_only: bool,
	/// Also return unused (`Empty`) slots, so that tree links into them can be followed.
	pub keep_unused: bool,
}

impl<'a> EntryFilter<'a> {
	pub fn everything() -> EntryFilter<'a> {
		EntryFilter { name_match: None, first_only: false, keep_unused: false }
	}

	fn matches(&self, name: Option<&str>) -> bool {
		match (self.name_match, name) {
			(Some(name_match), Some(name)) => name_match(name),
			_ => false,
		}
	}
}

fn decode_name(bytes: &[u8]) -> String {
	decode_utf16(bytes.chunks_exact(2).map(LittleEndian::read_u16))
		.map(|r| r.unwrap_or(REPLACEMENT_CHARACTER))
		.collect::<String>()
}

/// Decodes the directory stream into entries, materializing the stream of each kept entry.
/// The root storage (#0) is always decoded, since it holds the short-stream container.
/// Unused slots and entries rejected by the filter are skipped without touching their streams;
/// the IDs of the remaining entries are still their record positions.
pub fn read_directory_entries(directory: &[u8], sources: &EntrySources, filter: &EntryFilter) -> Result<Vec<DirectoryEntry>> {
	let record_count = directory.len() / DIRECTORY_ENTRY_SIZE;
	debug!("[read_directory_entries] Decoding {} directory records ...", record_count);
	if record_count == 0 {
		return Err(Error::FirstDirectoryEntryMustBeRootStorage);
	}

	let mut reader = ByteReader::new(directory);
	let mut entries: Vec<DirectoryEntry> = Vec::with_capacity(record_count);
	let mut container: Option<ShortStreamContainer> = None;

	for id in 0..record_count {
		reader.seek(id * DIRECTORY_ENTRY_SIZE);

		let name_storage = reader.read_bytes(NAME_STORAGE_SIZE)?;
		// The stored length includes the trailing NUL character
		let name_size = reader.read_u16()? as i32 - 2;
		if name_size > MAX_NAME_SIZE {
			return Err(Error::DirectoryEntryNameTooLong);
		}
		let tag = reader.read_u8()?;
		let entry_type = EntryType::from_tag(tag).ok_or(Error::UnknownDirectoryEntryType(tag))?;
		if id > 0 && entry_type == EntryType::Empty && !filter.keep_unused {
			trace!("[read_directory_entries] #{} is an unused slot.", id);
			continue;
		}
		let name = if name_size < 2 { None } else { Some(decode_name(&name_storage[..name_size as usize])) };

		let matched = filter.matches(name.as_ref().map(|name| name.as_str()));
		if id > 0 && filter.name_match.is_some() && !matched {
			trace!("[read_directory_entries] Skipping #{} ({:?}).", id, name);
			continue;
		}

		// skip color flag (1 byte)
		reader.skip(1);
		let left_child_id = reader.read_i32()?;
		let right_child_id = reader.read_i32()?;
		let root_node_id = reader.read_i32()?;
		// skip CLSID (16 bytes), state bits (4 bytes), creation and modification time (8 bytes each)
		reader.skip(36);
		let first_sector = SecId::from(reader.read_i32()?);
		let stream_size = reader.read_u32()?;

		let stream = if id == 0 {
			if entry_type != EntryType::RootStorage {
				return Err(Error::FirstDirectoryEntryMustBeRootStorage);
			}
			match sources.ssat {
				Some(ssat) => {
					if stream_size == 0 {
						return Err(Error::ShortStreamContainerStreamSizeIsZero);
					}
					debug!("[read_directory_entries] Reading short-stream container ({} bytes) ...", stream_size);
					let data = sources.standard.read_stream(first_sector, stream_size as usize)?;
					container = Some(ShortStreamContainer::new(data, ssat, sources.header));
					// handed over to the root entry once all short streams are read
					None
				},
				None => None,
			}
		}
		else if stream_size > 0 {
			if stream_size < sources.header.short_stream_threshold {
				trace!("[read_directory_entries] Reading #{} from short sectors ({} bytes) ...", id, stream_size);
				let container = container.as_ref().ok_or(Error::NoShortStreamContainerStreamDefined)?;
				Some(container.address_space().read_stream(first_sector, stream_size as usize)?)
			}
			else {
				trace!("[read_directory_entries] Reading #{} from standard sectors ({} bytes) ...", id, stream_size);
				Some(sources.standard.read_stream(first_sector, stream_size as usize)?)
			}
		}
		else {
			None
		};

		entries.push(DirectoryEntry {
			id,
			name,
			entry_type,
			left_child_id,
			right_child_id,
			root_node_id,
			first_sector,
			stream_size,
			stream,
			visit_order: None,
			is_root_storage_descendant: false,
		});

		if matched && filter.first_only {
			debug!("[read_directory_entries] Found first match #{}.", id);
			break;
		}
	}

	if let Some(container) = container {
		if let Some(root) = entries.first_mut() {
			root.stream = Some(container.into_data());
		}
	}

	debug!("[read_directory_entries] Decoded {} entries.", entries.len());
	Ok(entries)
}
