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

use tracing::debug;
use crate::error::{Error, Result};
use crate::io::ByteReader;
use super::structures::{Header, SecId, HEADER_SIGNATURE};

/// Offset of the first inline MSAT entry, right after the header fields.
pub const HEADER_MSAT_OFFSET: usize = 0x4C;

const MIN_SECTOR_SHIFT: u16 = 7;
// 2^30 is far beyond any real document and still safe to shift on 32-bit targets
const MAX_SECTOR_SHIFT: u16 = 30;

/// Decodes the header fields from the beginning of the document.
/// On success, the reader is positioned at the first inline MSAT entry.
pub fn read_header(reader: &mut ByteReader) -> Result<Header> {
	debug!("[read_header] Reading compound document header ({} bytes) ...", HEADER_MSAT_OFFSET);
	reader.seek(0);

	// Signature check; a buffer too short to even hold it cannot be a compound document either
	match reader.read_bytes(HEADER_SIGNATURE.len()) {
		Ok(signature) if signature == HEADER_SIGNATURE => {},
		_ => return Err(Error::HeaderSignatureMissing),
	}

	// skip CLSID (16 bytes), minor and major version, byte order mark
	reader.skip(22);

	let sector_shift = reader.read_u16()?;
	if sector_shift < MIN_SECTOR_SHIFT {
		return Err(Error::SectorSizeTooSmall);
	}
	if sector_shift > MAX_SECTOR_SHIFT {
		return Err(Error::SectorSizeTooLarge);
	}

	let short_sector_shift = reader.read_u16()?;
	if short_sector_shift > sector_shift {
		return Err(Error::ShortSectorSizeGreaterThanStandardSectorSize);
	}

	// skip reserved (6 bytes) and number of directory sectors (4 bytes)
	reader.skip(10);

	let sat_sector_count = reader.read_u32()?;
	let first_directory_sector = SecId::from(reader.read_i32()?);
	// skip transaction signature number (4 bytes)
	reader.skip(4);
	let short_stream_threshold = reader.read_u32()?;
	let first_ssat_sector = SecId::from(reader.read_i32()?);
	let ssat_sector_count = reader.read_u32()?;
	let first_msat_sector = SecId::from(reader.read_i32()?);
	let msat_sector_count = reader.read_u32()?;

	let header = Header {
		sector_shift,
		sector_size: 1 << sector_shift,
		short_sector_shift,
		short_sector_size: 1 << short_sector_shift,
		sat_sector_count,
		first_directory_sector,
		short_stream_threshold,
		first_ssat_sector,
		ssat_sector_count,
		first_msat_sector,
		msat_sector_count,
	};
	debug!("[read_header] Sector size {}, short-sector size {}, {} SAT sectors, {} SSAT sectors, {} MSAT sectors, directory starts at {}.",
		header.sector_size, header.short_sector_size, header.sat_sector_count, header.ssat_sector_count, header.msat_sector_count, header.first_directory_sector);
	Ok(header)
}
