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

use std::io::Read;
use byteorder::{ByteOrder, LittleEndian};
use crate::error::{Error, Result};

/// Reads the given source to its end and returns everything as one buffer.
pub fn read_all(mut read: impl Read) -> Result<Vec<u8>> {
	let mut data: Vec<u8> = Vec::new();
	read.read_to_end(&mut data)?;
	Ok(data)
}

/// A little-endian cursor over an in-memory buffer.
/// Every read that would leave the buffer fails with `Error::UnexpectedEndOfStream`.
pub struct ByteReader<'a> {
	data: &'a [u8],
	position: usize,
}

impl<'a> ByteReader<'a> {
	pub fn new(data: &'a [u8]) -> ByteReader<'a> {
		ByteReader { data, position: 0 }
	}

	pub fn position(&self) -> usize {
		self.position
	}

	/// Moves the cursor to an absolute offset. Seeking past the end is allowed; the next read fails.
	pub fn seek(&mut self, position: usize) {
		self.position = position;
	}

	pub fn skip(&mut self, count: usize) {
		self.position = self.position.saturating_add(count);
	}

	pub fn len(&self) -> usize {
		self.data.len()
	}

	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}

	pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
		let end = self.position.checked_add(count).ok_or(Error::UnexpectedEndOfStream)?;
		if end > self.data.len() {
			return Err(Error::UnexpectedEndOfStream);
		}
		let bytes = &self.data[self.position..end];
		self.position = end;
		Ok(bytes)
	}

	pub fn read_u8(&mut self) -> Result<u8> {
		Ok(self.read_bytes(1)?[0])
	}

	pub fn read_u16(&mut self) -> Result<u16> {
		Ok(LittleEndian::read_u16(self.read_bytes(2)?))
	}

	pub fn read_u32(&mut self) -> Result<u32> {
		Ok(LittleEndian::read_u32(self.read_bytes(4)?))
	}

	pub fn read_i32(&mut self) -> Result<i32> {
		Ok(LittleEndian::read_i32(self.read_bytes(4)?))
	}
}
