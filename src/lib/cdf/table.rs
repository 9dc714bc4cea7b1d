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
use byteorder::{ByteOrder, LittleEndian};
use tracing::{debug, trace};
use crate::error::{Error, Result};
use crate::io::ByteReader;
use super::header::HEADER_MSAT_OFFSET;
use super::structures::{Header, SecId, HEADER_MSAT_SECID_COUNT, HEADER_SIZE, SECID_SIZE};

/// A sector allocation table: `table[i]` is the sector that follows sector `i` in its chain.
/// Used for both the SAT (standard sectors) and the SSAT (short sectors).
#[derive(Debug, Clone)]
pub struct AllocationTable {
	secids: Vec<i32>,
}

impl AllocationTable {
	pub fn new(secids: Vec<i32>) -> AllocationTable {
		AllocationTable { secids }
	}

	pub fn len(&self) -> usize {
		self.secids.len()
	}

	pub fn is_empty(&self) -> bool {
		self.secids.is_empty()
	}

	/// Retrieves the sector ID that follows the given sector in its chain.
	pub fn next(&self, sector: SecId) -> Result<SecId> {
		sector.sector()
			.and_then(|index| self.secids.get(index))
			.map(|&raw| SecId::from(raw))
			.ok_or(Error::InvalidSecIdReference)
	}
}

/// Byte offset of a standard sector in the document.
pub fn sector_position(header: &Header, sector: usize) -> usize {
	sector.saturating_mul(header.sector_size).saturating_add(HEADER_SIZE)
}

/// Returns the full content of a standard sector.
pub fn read_sector<'a>(reader: &mut ByteReader<'a>, header: &Header, sector: SecId) -> Result<&'a [u8]> {
	let index = sector.sector().ok_or(Error::InvalidSecIdReference)?;
	reader.seek(sector_position(header, index));
	reader.read_bytes(header.sector_size)
}

/// Rejects sector counts that could not possibly fit into the document, before anything gets allocated for them.
fn check_sector_count(reader: &ByteReader, header: &Header, count: usize) -> Result<()> {
	if count.saturating_mul(header.sector_size) > reader.len().saturating_sub(HEADER_SIZE) {
		return Err(Error::UnexpectedEndOfStream);
	}
	Ok(())
}

fn append_secids(secids: &mut Vec<i32>, sector: &[u8]) {
	secids.extend(sector.chunks_exact(SECID_SIZE).map(LittleEndian::read_i32));
}

/// Builds the SAT.
/// The IDs of the SAT sectors (the MSAT) are taken from the end of the header first,
/// and from the chain of extended MSAT sectors after that.
pub fn build_sat(reader: &mut ByteReader, header: &Header) -> Result<AllocationTable> {
	let sat_sector_count = header.sat_sector_count as usize;
	let secids_per_sector = header.secids_per_sector();
	debug!("[build_sat] Locating {} SAT sectors ...", sat_sector_count);
	check_sector_count(reader, header, sat_sector_count)?;

	// The first 109 SAT sector IDs are listed right after the header
	let mut sat_sectors: Vec<SecId> = Vec::with_capacity(sat_sector_count);
	reader.seek(HEADER_MSAT_OFFSET);
	for _ in 0..min(sat_sector_count, HEADER_MSAT_SECID_COUNT) {
		sat_sectors.push(SecId::from(reader.read_i32()?));
	}

	// All subsequent ones are listed in the extended MSAT sectors.
	// Each of them holds `secids_per_sector - 1` IDs, followed by the ID of the next extended MSAT sector.
	if sat_sectors.len() < sat_sector_count {
		let mut current_msat_sector = header.first_msat_sector;
		for i in 0..header.msat_sector_count {
			let remaining = sat_sector_count - sat_sectors.len();
			if remaining == 0 {
				break;
			}

			trace!("[build_sat] Reading {}th extended MSAT sector {} ...", i, current_msat_sector);
			let index = current_msat_sector.sector().ok_or(Error::InvalidSecIdReference)?;
			reader.seek(sector_position(header, index));
			for _ in 0..min(remaining, secids_per_sector - 1) {
				sat_sectors.push(SecId::from(reader.read_i32()?));
			}

			if sat_sectors.len() < sat_sector_count {
				current_msat_sector = SecId::from(reader.read_i32()?);
			}
		}

		if sat_sectors.len() < sat_sector_count {
			debug!("[build_sat] Extended MSAT only lists {} of {} SAT sectors!", sat_sectors.len(), sat_sector_count);
			return Err(Error::UnexpectedEndOfStream);
		}
	}

	// Concatenate the contents of all SAT sectors
	let mut secids: Vec<i32> = Vec::with_capacity(sat_sector_count * secids_per_sector);
	for sat_sector in sat_sectors {
		trace!("[build_sat] Reading SAT sector {} ...", sat_sector);
		append_secids(&mut secids, read_sector(reader, header, sat_sector)?);
	}

	if secids.is_empty() {
		return Err(Error::EmptySatSecIdChain);
	}
	debug!("[build_sat] SAT holds {} sector IDs.", secids.len());
	Ok(AllocationTable::new(secids))
}

/// Builds the SSAT, if the document has one.
/// The SSAT sectors form an ordinary chain in the SAT.
pub fn build_ssat(reader: &mut ByteReader, header: &Header, sat: &AllocationTable) -> Result<Option<AllocationTable>> {
	let ssat_sector_count = header.ssat_sector_count as usize;
	if ssat_sector_count == 0 {
		debug!("[build_ssat] Document has no SSAT.");
		return Ok(None);
	}
	debug!("[build_ssat] Reading {} SSAT sectors ...", ssat_sector_count);
	check_sector_count(reader, header, ssat_sector_count)?;

	let mut secids: Vec<i32> = Vec::with_capacity(ssat_sector_count * header.secids_per_sector());
	let mut current_sector = header.first_ssat_sector;
	for i in 0..ssat_sector_count {
		trace!("[build_ssat] Reading SSAT sector {} ...", current_sector);
		append_secids(&mut secids, read_sector(reader, header, current_sector)?);
		if i + 1 < ssat_sector_count {
			current_sector = sat.next(current_sector)?;
		}
	}

	debug!("[build_ssat] SSAT holds {} sector IDs.", secids.len());
	Ok(Some(AllocationTable::new(secids)))
}
