//! Synthetic compound document writer shared by the integration tests.

#![allow(dead_code)]

use byteorder::{ByteOrder, LittleEndian};

pub const EMPTY: u8 = 0;
pub const STORAGE: u8 = 1;
pub const STREAM: u8 = 2;
pub const ROOT: u8 = 5;

pub const HEADER_SIZE: usize = 512;
pub const SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

// header field offsets
pub const SECTOR_SHIFT: usize = 30;
pub const SHORT_SECTOR_SHIFT: usize = 32;
pub const SAT_SECTOR_COUNT: usize = 44;
pub const FIRST_DIRECTORY_SECTOR: usize = 48;
pub const SHORT_STREAM_THRESHOLD: usize = 56;
pub const FIRST_SSAT_SECTOR: usize = 60;
pub const SSAT_SECTOR_COUNT: usize = 64;
pub const FIRST_MSAT_SECTOR: usize = 68;
pub const MSAT_SECTOR_COUNT: usize = 72;
pub const INLINE_MSAT: usize = 76;

// directory record field offsets
pub const NAME_LENGTH: usize = 64;
pub const ENTRY_TYPE: usize = 66;
pub const LEFT_CHILD: usize = 68;
pub const RIGHT_CHILD: usize = 72;
pub const ROOT_NODE: usize = 76;
pub const FIRST_SECTOR: usize = 116;
pub const STREAM_SIZE: usize = 120;

pub fn write_u16(data: &mut [u8], offset: usize, value: u16) {
	LittleEndian::write_u16(&mut data[offset..offset + 2], value);
}

pub fn write_u32(data: &mut [u8], offset: usize, value: u32) {
	LittleEndian::write_u32(&mut data[offset..offset + 4], value);
}

pub fn write_i32(data: &mut [u8], offset: usize, value: i32) {
	LittleEndian::write_i32(&mut data[offset..offset + 4], value);
}

/// A 512-byte header with the given geometry; everything else is left to the caller.
pub fn header(sector_shift: u16, short_sector_shift: u16) -> Vec<u8> {
	let mut data = vec![0u8; HEADER_SIZE];
	data[..8].copy_from_slice(&SIGNATURE);
	write_u16(&mut data, SECTOR_SHIFT, sector_shift);
	write_u16(&mut data, SHORT_SECTOR_SHIFT, short_sector_shift);
	write_i32(&mut data, FIRST_MSAT_SECTOR, -2);
	for slot in 0..109 {
		write_i32(&mut data, INLINE_MSAT + slot * 4, -1);
	}
	data
}

/// One 128-byte directory record.
pub fn record(name: &str, entry_type: u8, left: i32, right: i32, child: i32, first_sector: i32, size: u32) -> Vec<u8> {
	let mut data = vec![0u8; 128];
	let units: Vec<u16> = name.encode_utf16().collect();
	for (i, unit) in units.iter().enumerate() {
		write_u16(&mut data, i * 2, *unit);
	}
	let length = if units.is_empty() { 0 } else { (units.len() as u16 + 1) * 2 };
	write_u16(&mut data, NAME_LENGTH, length);
	data[ENTRY_TYPE] = entry_type;
	write_i32(&mut data, LEFT_CHILD, left);
	write_i32(&mut data, RIGHT_CHILD, right);
	write_i32(&mut data, ROOT_NODE, child);
	write_i32(&mut data, FIRST_SECTOR, first_sector);
	write_u32(&mut data, STREAM_SIZE, size);
	data
}

/// A sector full of sector IDs, padded with free markers.
pub fn secid_sector(secids: &[i32], sector_size: usize) -> Vec<u8> {
	let mut data = vec![0u8; sector_size];
	for slot in 0..sector_size / 4 {
		write_i32(&mut data, slot * 4, *secids.get(slot).unwrap_or(&-1));
	}
	data
}

pub struct Node {
	name: String,
	entry_type: u8,
	left: i32,
	right: i32,
	child: i32,
	content: Vec<u8>,
}

pub fn node(name: &str, entry_type: u8) -> Node {
	Node { name: name.to_owned(), entry_type, left: -1, right: -1, child: -1, content: Vec::new() }
}

impl Node {
	pub fn left(mut self, id: i32) -> Node {
		self.left = id;
		self
	}

	pub fn right(mut self, id: i32) -> Node {
		self.right = id;
		self
	}

	pub fn child(mut self, id: i32) -> Node {
		self.child = id;
		self
	}

	pub fn content(mut self, content: &[u8]) -> Node {
		self.content = content.to_vec();
		self
	}
}

/// Lays out a complete document: SAT sectors first, then directory, SSAT,
/// short-stream container and large streams, each as one contiguous chain.
/// The root node (#0) gets the short-stream container assigned automatically.
pub struct DocumentBuilder {
	sector_shift: u16,
	short_sector_shift: u16,
	threshold: u32,
	nodes: Vec<Node>,
}

pub struct Built {
	pub data: Vec<u8>,
	pub sector_size: usize,
	pub directory_sector: usize,
	pub ssat_sector: Option<usize>,
	pub container_sector: Option<usize>,
}

impl Built {
	/// Overwrites the SAT slot of a sector. SAT sectors are laid out from sector #0 on,
	/// so SAT slot `n` sits at `512 + 4n`.
	pub fn set_sat(&mut self, sector: usize, value: i32) {
		write_i32(&mut self.data, HEADER_SIZE + sector * 4, value);
	}

	pub fn record_offset(&self, id: usize) -> usize {
		HEADER_SIZE + self.directory_sector * self.sector_size + id * 128
	}

	pub fn set_record_i32(&mut self, id: usize, field: usize, value: i32) {
		let offset = self.record_offset(id) + field;
		write_i32(&mut self.data, offset, value);
	}

	pub fn set_record_u16(&mut self, id: usize, field: usize, value: u16) {
		let offset = self.record_offset(id) + field;
		write_u16(&mut self.data, offset, value);
	}

	pub fn set_record_u8(&mut self, id: usize, field: usize, value: u8) {
		let offset = self.record_offset(id) + field;
		self.data[offset] = value;
	}

	pub fn set_header_u32(&mut self, offset: usize, value: u32) {
		write_u32(&mut self.data, offset, value);
	}
}

fn sectors_for(len: usize, sector_size: usize) -> usize {
	(len + sector_size - 1) / sector_size
}

fn pad(data: &mut Vec<u8>, unit: usize) {
	let padded = sectors_for(data.len(), unit) * unit;
	data.resize(padded, 0);
}

impl DocumentBuilder {
	pub fn new(sector_shift: u16, short_sector_shift: u16) -> DocumentBuilder {
		DocumentBuilder { sector_shift, short_sector_shift, threshold: 4096, nodes: Vec::new() }
	}

	pub fn threshold(mut self, threshold: u32) -> DocumentBuilder {
		self.threshold = threshold;
		self
	}

	pub fn add(mut self, node: Node) -> DocumentBuilder {
		self.nodes.push(node);
		self
	}

	pub fn build(&self) -> Built {
		let sector_size = 1usize << self.sector_shift;
		let short_sector_size = 1usize << self.short_sector_shift;
		let secids_per_sector = sector_size / 4;

		// Short streams go into the container, chained through the SSAT
		let mut ssat: Vec<i32> = Vec::new();
		let mut container: Vec<u8> = Vec::new();
		let mut placements: Vec<(i32, u32)> = vec![(-2, 0); self.nodes.len()];
		let mut large: Vec<usize> = Vec::new();
		for (id, node) in self.nodes.iter().enumerate().skip(1) {
			if node.content.is_empty() {
				continue;
			}
			if (node.content.len() as u32) < self.threshold {
				let start = ssat.len();
				let count = sectors_for(node.content.len(), short_sector_size);
				for i in 0..count {
					ssat.push(if i + 1 < count { (start + i + 1) as i32 } else { -2 });
				}
				container.extend_from_slice(&node.content);
				pad(&mut container, short_sector_size);
				placements[id] = (start as i32, node.content.len() as u32);
			}
			else {
				large.push(id);
			}
		}

		// Segments of standard sectors, in layout order
		let directory_sectors = sectors_for(self.nodes.len() * 128, sector_size);
		let ssat_sectors = sectors_for(ssat.len() * 4, sector_size);
		let container_sectors = sectors_for(container.len(), sector_size);
		let mut segment_lengths = vec![directory_sectors, ssat_sectors, container_sectors];
		for &id in &large {
			segment_lengths.push(sectors_for(self.nodes[id].content.len(), sector_size));
		}
		let other_sectors: usize = segment_lengths.iter().sum();
		let mut sat_sectors = 1;
		while sat_sectors * secids_per_sector < other_sectors + sat_sectors {
			sat_sectors += 1;
		}
		assert!(sat_sectors <= 109, "builder does not write extended MSAT sectors");

		let mut sat: Vec<i32> = vec![-3; sat_sectors];
		let mut starts: Vec<usize> = Vec::new();
		for &length in &segment_lengths {
			let start = sat.len();
			starts.push(start);
			for i in 0..length {
				sat.push(if i + 1 < length { (start + i + 1) as i32 } else { -2 });
			}
		}
		let directory_sector = starts[0];
		let ssat_sector = if ssat_sectors > 0 { Some(starts[1]) } else { None };
		let container_sector = if container_sectors > 0 { Some(starts[2]) } else { None };
		for (i, &id) in large.iter().enumerate() {
			placements[id] = (starts[3 + i] as i32, self.nodes[id].content.len() as u32);
		}
		if let Some(sector) = container_sector {
			placements[0] = (sector as i32, container.len() as u32);
		}

		// Header
		let mut data = header(self.sector_shift, self.short_sector_shift);
		write_u32(&mut data, SAT_SECTOR_COUNT, sat_sectors as u32);
		write_i32(&mut data, FIRST_DIRECTORY_SECTOR, directory_sector as i32);
		write_u32(&mut data, SHORT_STREAM_THRESHOLD, self.threshold);
		write_i32(&mut data, FIRST_SSAT_SECTOR, ssat_sector.map_or(-2, |sector| sector as i32));
		write_u32(&mut data, SSAT_SECTOR_COUNT, ssat_sectors as u32);
		for sector in 0..sat_sectors {
			write_i32(&mut data, INLINE_MSAT + sector * 4, sector as i32);
		}

		// SAT
		for chunk in 0..sat_sectors {
			let from = chunk * secids_per_sector;
			let to = std::cmp::min(sat.len(), from + secids_per_sector);
			data.extend_from_slice(&secid_sector(&sat[from..to], sector_size));
		}

		// Directory
		let mut directory: Vec<u8> = Vec::new();
		for (id, node) in self.nodes.iter().enumerate() {
			let (first_sector, size) = placements[id];
			directory.extend_from_slice(&record(&node.name, node.entry_type, node.left, node.right, node.child, first_sector, size));
		}
		pad(&mut directory, sector_size);
		data.extend_from_slice(&directory);

		// SSAT
		for chunk in ssat.chunks(secids_per_sector) {
			data.extend_from_slice(&secid_sector(chunk, sector_size));
		}

		// Short-stream container
		pad(&mut container, sector_size);
		data.extend_from_slice(&container);

		// Large streams
		for &id in &large {
			let mut content = self.nodes[id].content.clone();
			pad(&mut content, sector_size);
			data.extend_from_slice(&content);
		}

		Built { data, sector_size, directory_sector, ssat_sector, container_sector }
	}
}
