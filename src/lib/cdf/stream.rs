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

use std::cmp::min;
use tracing::trace;
use crate::error::{Error, Result};
use crate::io::ByteReader;
use super::structures::{Header, SecId, HEADER_SIZE};
use super::table::AllocationTable;

/// A sector address space: a buffer cut into equally sized sectors starting at `base`,
/// chained together by an allocation table.
pub struct AddressSpace<'a> {
	data: &'a [u8],
	base: usize,
	sector_size: usize,
	table: &'a AllocationTable,
}

impl<'a> AddressSpace<'a> {
	pub fn new(data: &'a [u8], base: usize, sector_size: usize, table: &'a AllocationTable) -> AddressSpace<'a> {
		AddressSpace { data, base, sector_size, table }
	}

	/// The standard sectors of the document, chained by the SAT.
	pub fn standard(data: &'a [u8], header: &Header, sat: &'a AllocationTable) -> AddressSpace<'a> {
		AddressSpace::new(data, HEADER_SIZE, header.sector_size, sat)
	}

	/// Materializes `size` bytes of the stream starting at `first_sector`.
	pub fn read_stream(&self, first_sector: SecId, size: usize) -> Result<Vec<u8>> {
		// A stream can never be larger than the buffer it is stored in
		if size > self.data.len() {
			return Err(Error::UnexpectedEndOfStream);
		}

		let sector_count = (size + self.sector_size - 1) / self.sector_size;
		trace!("[read_stream] Reading {} bytes from {} sectors starting at {} ...", size, sector_count, first_sector);

		let mut reader = ByteReader::new(self.data);
		let mut stream: Vec<u8> = Vec::with_capacity(size);
		let mut size_remaining = size;
		let mut current_sector = first_sector;
		for _ in 0..sector_count {
			let index = current_sector.sector().ok_or(Error::UnexpectedEndOfStream)?;

			// Don't copy more bytes than there are left in this stream
			let num_bytes = min(self.sector_size, size_remaining);
			reader.seek(index.saturating_mul(self.sector_size).saturating_add(self.base));
			stream.extend_from_slice(reader.read_bytes(num_bytes)?);

			size_remaining -= num_bytes;
			if size_remaining > 0 {
				current_sector = self.table.next(current_sector)?;
			}
		}
		Ok(stream)
	}
}

/// The materialized stream of the root storage, which holds the content of all short streams.
/// Short streams can only be read through one of these, so a document without one cannot serve them.
pub struct ShortStreamContainer<'a> {
	data: Vec<u8>,
	ssat: &'a AllocationTable,
	short_sector_size: usize,
}

impl<'a> ShortStreamContainer<'a> {
	pub fn new(data: Vec<u8>, ssat: &'a AllocationTable, header: &Header) -> ShortStreamContainer<'a> {
		ShortStreamContainer { data, ssat, short_sector_size: header.short_sector_size }
	}

	pub fn into_data(self) -> Vec<u8> {
		self.data
	}

	/// The short sectors inside the container, chained by the SSAT.
	pub fn address_space(&self) -> AddressSpace {
		AddressSpace::new(&self.data, 0, self.short_sector_size, self.ssat)
	}
}
