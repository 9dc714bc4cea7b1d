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

use std::path::PathBuf;
use thiserror::Error as ThisError;

/// Everything that can go wrong while opening or decoding a compound document.
///
/// Decoding never returns partial results: the first error aborts the whole document.
#[derive(Debug, ThisError)]
pub enum Error {
	#[error("File '{}' does not exist.", .0.display())]
	FileDoesNotExist(PathBuf),
	#[error("The provided data stream cannot be empty.")]
	EmptyDataStream,
	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error("Invalid compound document, signature missing in header.")]
	HeaderSignatureMissing,
	#[error("Standard sector size too small. This is an indication that the compound document is invalid or corrupt.")]
	SectorSizeTooSmall,
	#[error("Standard sector size too large. This is an indication that the compound document is invalid or corrupt.")]
	SectorSizeTooLarge,
	#[error("Short-sector size cannot exceed standard sector size. This is an indication that the compound document is invalid or corrupt.")]
	ShortSectorSizeGreaterThanStandardSectorSize,
	#[error("Sector ID references a non-existent sector. This is an indication that the compound document is invalid or corrupt.")]
	InvalidSecIdReference,
	#[error("SAT sector ID chain is empty. This is an indication that the compound document is invalid or corrupt.")]
	EmptySatSecIdChain,
	#[error("Cyclic sector ID chain detected while establishing length of the directory stream. This is an indication that the compound document is invalid or corrupt.")]
	CyclicSecIdChain,
	#[error("First directory entry must be the root storage. This is an indication that the compound document is invalid or corrupt.")]
	FirstDirectoryEntryMustBeRootStorage,
	#[error("Stream requires the short-stream container stream to be read, which was not defined in the document. This is an indication that the compound document is invalid or corrupt.")]
	NoShortStreamContainerStreamDefined,
	#[error("Size of the short-stream container stream cannot be zero. This is an indication that the compound document is invalid or corrupt.")]
	ShortStreamContainerStreamSizeIsZero,
	#[error("End of data stream reached prematurely. This is an indication that the compound document is invalid or corrupt.")]
	UnexpectedEndOfStream,
	#[error("Name of directory entry exceeds 31 characters. This is an indication that the compound document is invalid or corrupt.")]
	DirectoryEntryNameTooLong,
	#[error("Directory entry has unknown type {0:#04X}. This is an indication that the compound document is invalid or corrupt.")]
	UnknownDirectoryEntryType(u8),
	#[error("Referred child directory entry #{0} does not exist. This is an indication that the compound document is invalid or corrupt.")]
	ReferredChildDirectoryEntryMissing(usize),
	#[error("Cyclic child directory entry reference detected. This is an indication that the compound document is invalid or corrupt.")]
	CyclicChildDirectoryEntryReference,
}

impl Error {
	/// Whether the error was caused by malformed or truncated document bytes,
	/// as opposed to a usage or I/O problem on the caller's side.
	pub fn is_corruption(&self) -> bool {
		match self {
			Error::FileDoesNotExist(_) | Error::EmptyDataStream | Error::Io(_) => false,
			_ => true,
		}
	}
}

pub type Result<T> = std::result::Result<T, Error>;
