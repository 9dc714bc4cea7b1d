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

// Also see: [MS-CFB]: Compound File Binary File Format specifications, https://msdn.microsoft.com/en-us/library/dd942138.aspx

use std::fmt;

/// Size of the fixed header region; sector #0 starts right after it.
pub const HEADER_SIZE: usize = 0x200;
pub const HEADER_SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
/// Number of SAT sector IDs stored inline at the end of the header.
pub const HEADER_MSAT_SECID_COUNT: usize = 109;
pub const SECID_SIZE: usize = 4;
pub const DIRECTORY_ENTRY_SIZE: usize = 0x80;

const SECID_FREE: i32 = -1;
const SECID_END_OF_CHAIN: i32 = -2;
const SECID_SAT: i32 = -3;
const SECID_MSAT: i32 = -4;

/// The header of a compound document, excluding the trailing MSAT entries.
#[derive(Debug, Clone)]
pub struct Header {
	pub sector_shift: u16,
	pub sector_size: usize, // virtual field; not actually contained in the file
	pub short_sector_shift: u16,
	pub short_sector_size: usize, // virtual field; not actually contained in the file
	pub sat_sector_count: u32,
	pub first_directory_sector: SecId,
	/// Streams strictly smaller than this live in the short-stream container.
	pub short_stream_threshold: u32,
	pub first_ssat_sector: SecId,
	pub ssat_sector_count: u32,
	pub first_msat_sector: SecId,
	pub msat_sector_count: u32,
}

impl Header {
	/// Number of sector IDs that fit into one sector.
	pub fn secids_per_sector(&self) -> usize {
		self.sector_size / SECID_SIZE
	}
}

/// A sector ID as stored on disk: either a real sector index or one of the reserved markers.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SecId {
	Sector(u32),
	/// The sector is unused.
	Free,
	/// The sector is the last one of its chain.
	EndOfChain,
	/// The sector holds part of the SAT.
	Sat,
	/// The sector holds part of the extended MSAT.
	Msat,
	/// Any other negative value; never valid anywhere.
	Reserved(i32),
}

impl SecId {
	/// The sector index, if this is not a marker.
	pub fn sector(self) -> Option<usize> {
		match self {
			SecId::Sector(id) => Some(id as usize),
			_ => None,
		}
	}
}

impl From<i32> for SecId {
	fn from(raw: i32) -> SecId {
		match raw {
			SECID_FREE => SecId::Free,
			SECID_END_OF_CHAIN => SecId::EndOfChain,
			SECID_SAT => SecId::Sat,
			SECID_MSAT => SecId::Msat,
			id if id >= 0 => SecId::Sector(id as u32),
			other => SecId::Reserved(other),
		}
	}
}

impl fmt::Display for SecId {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			SecId::Sector(id) => write!(f, "#{}", id),
			SecId::Free => write!(f, "<free>"),
			SecId::EndOfChain => write!(f, "<end of chain>"),
			SecId::Sat => write!(f, "<SAT>"),
			SecId::Msat => write!(f, "<MSAT>"),
			SecId::Reserved(raw) => write!(f, "<reserved {}>", raw),
		}
	}
}
