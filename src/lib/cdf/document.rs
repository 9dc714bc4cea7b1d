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

use std::fmt;
use std::fs;
use std::io::Read;
use std::path::Path;
use tracing::debug;
use crate::error::{Error, Result};
use crate::io::read_all;
use super::directory::DirectoryEntry;
use super::{collect_streams, decode_entries, is_match, Selection, StreamMap};

const MEMORY_LABEL: &str = "stream";

/// A decoded compound document: its directory entries, each with its stream content.
#[derive(Debug, Clone)]
pub struct Document {
	name: String,
	entries: Vec<DirectoryEntry>,
}

impl Document {
	/// Decodes a document held in memory.
	/// With `descendants_only`, only the entries of the root storage's tree are kept, in tree order.
	pub fn decode(data: &[u8], descendants_only: bool) -> Result<Document> {
		check_not_empty(data)?;
		let entries = decode_entries(data, Selection::Everything, descendants_only)?;
		Ok(Document { name: MEMORY_LABEL.to_owned(), entries })
	}

	/// File name of the document, or "stream" if it was not read from a file.
	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn entries(&self) -> &[DirectoryEntry] {
		&self.entries
	}

	/// Looks up an entry by its position in the directory stream.
	pub fn entry(&self, id: usize) -> Option<&DirectoryEntry> {
		self.entries.iter().find(|entry| entry.id() == id)
	}

	/// The first entry with exactly this name.
	pub fn find(&self, name: &str) -> Option<&DirectoryEntry> {
		self.entries.iter().find(|entry| entry.name() == Some(name))
	}

	pub fn into_entries(self) -> Vec<DirectoryEntry> {
		self.entries
	}
}

impl fmt::Display for Document {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{}", self.name)
	}
}

fn check_not_empty(data: &[u8]) -> Result<()> {
	if data.is_empty() {
		return Err(Error::EmptyDataStream);
	}
	Ok(())
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
	if !path.is_file() {
		return Err(Error::FileDoesNotExist(path.to_path_buf()));
	}
	debug!("[read_file] Reading {:?} ...", path);
	Ok(fs::read(path)?)
}

/// Opens a compound document from a file.
pub fn open_path(path: impl AsRef<Path>) -> Result<Document> {
	let path = path.as_ref();
	let mut document = Document::decode(&read_file(path)?, false)?;
	if let Some(file_name) = path.file_name() {
		document.name = file_name.to_string_lossy().into_owned();
	}
	Ok(document)
}

/// Opens a compound document from a byte buffer.
pub fn open_bytes(data: &[u8]) -> Result<Document> {
	Document::decode(data, false)
}

/// Opens a compound document from any byte source; the source is read to its end first.
pub fn open_reader(read: impl Read) -> Result<Document> {
	Document::decode(&read_all(read)?, false)
}

/// Extracts the content of the first stream whose name satisfies `name_match`.
/// Returns `None` if no entry matches or the matching entry has no content.
pub fn read_stream(data: &[u8], name_match: impl Fn(&str) -> bool) -> Result<Option<Vec<u8>>> {
	check_not_empty(data)?;
	let entries = decode_entries(data, Selection::FirstMatch(&name_match), false)?;
	Ok(entries.into_iter()
		.find(|entry| is_match(entry, &name_match))
		.and_then(|entry| entry.into_stream()))
}

/// Extracts all streams whose names satisfy `name_match`.
pub fn read_streams(data: &[u8], name_match: impl Fn(&str) -> bool) -> Result<StreamMap> {
	check_not_empty(data)?;
	let entries = decode_entries(data, Selection::AllMatches(&name_match), false)?;
	Ok(collect_streams(entries, &name_match, false))
}

pub fn read_stream_from_path(path: impl AsRef<Path>, name_match: impl Fn(&str) -> bool) -> Result<Option<Vec<u8>>> {
	read_stream(&read_file(path.as_ref())?, name_match)
}

pub fn read_streams_from_path(path: impl AsRef<Path>, name_match: impl Fn(&str) -> bool) -> Result<StreamMap> {
	read_streams(&read_file(path.as_ref())?, name_match)
}
