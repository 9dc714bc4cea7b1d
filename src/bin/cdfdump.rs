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

use std::error::Error;
use std::fs::File;
use std::io::{stdin, stdout, Write};
use clap::{value_t, App, AppSettings, Arg, ArgGroup, ArgMatches, SubCommand};
use tracing::{info, Level};
use cdfreader::cdf::{Document, DirectoryEntry};
use cdfreader::io::read_all;

fn input_arg<'a, 'b>() -> Arg<'a, 'b> {
	Arg::with_name("input")
		.value_name("FILE")
		.help("A file in Compound File Binary Format (CFBF). If omitted, the file will be read from STDIN instead.")
		.short("i")
		.long("input")
		.required(false)
}

fn main() {
	let matches = App::new("cdfdump")
		.version("1.0")
		.author("Steve Muller <steve.muller@outlook.com>")
		.about("This utility reads a Compound File Binary Format document (also known as OLE file, COM file, or Structured Storage file) and dumps the contained streams.")
		.setting(AppSettings::SubcommandRequired)
		.arg(Arg::with_name("verbose")
			.short("v")
			.help("Increases the debug verbosity. This will print a lot of debug messages to standard error (STDERR). Can be used up to 3 times.")
			.multiple(true)
			.takes_value(false))
		.subcommand(SubCommand::with_name("list")
			.about("Lists all directory entries of the document. Each output line represents an entry, and contains the entry ID followed by its name and size.")
			.arg(input_arg())
			.arg(Arg::with_name("descendants-only")
				.long("descendants-only")
				.help("If set, only the entries reachable from the root storage are listed, in tree order.")
				.takes_value(false))
		)
		.subcommand(SubCommand::with_name("dump")
			.about("Dumps a stream from the document.")
			.arg(Arg::with_name("id")
				.value_name("ENTRYID")
				.help("The ID of the entry whose stream shall be dumped.")
				.long("id"))
			.arg(Arg::with_name("name")
				.value_name("NAME")
				.help("The name of the entry whose stream shall be dumped. If several entries share the name, the first one is dumped.")
				.long("name"))
			.group(ArgGroup::with_name("entry")
				.args(&["id", "name"])
				.required(true))
			.arg(Arg::with_name("output")
				.value_name("FILE")
				.help("The file where the stream shall be written to. If this parameter is not specified (or has the value '-'), the stream will be written to STDOUT instead.")
				.short("o")
				.long("output")
				.required(false))
			.arg(input_arg())
		)
	.get_matches();

	let level = match matches.occurrences_of("verbose") {
		0 => Level::WARN,
		1 => Level::INFO,
		2 => Level::DEBUG,
		_ => Level::TRACE,
	};
	tracing_subscriber::fmt()
		.with_max_level(level)
		.with_writer(std::io::stderr)
		.init();

	if let Err(e) = dispatch(&matches) {
		eprintln!("ERROR: {}", e);
		std::process::exit(1);
	}
}

fn dispatch(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
	match matches.subcommand() {
		("list", Some(submatches)) => dispatch_list(submatches),
		("dump", Some(submatches)) => dispatch_dump(submatches),
		_ => Err("Unrecognised subcommand".into()),
	}
}

fn load_document(matches: &ArgMatches, descendants_only: bool) -> Result<Document, Box<dyn Error>> {
	let data = match matches.value_of("input").unwrap_or("") {
		"" | "-" => read_all(stdin())?,
		inputfile => read_all(File::open(inputfile)?)?,
	};
	info!("Read {} bytes, decoding ...", data.len());
	Ok(Document::decode(&data, descendants_only)?)
}

fn dispatch_list(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
	let document = load_document(matches, matches.is_present("descendants-only"))?;
	for entry in document.entries() {
		println!("{} {}", entry.id(), entry);
	}
	Ok(())
}

fn find_entry<'d>(document: &'d Document, matches: &ArgMatches) -> Result<&'d DirectoryEntry, Box<dyn Error>> {
	if matches.is_present("id") {
		let id = value_t!(matches, "id", usize).unwrap_or_else(|e| e.exit());
		document.entry(id).ok_or_else(|| format!("Directory entry #{} does not exist.", id).into())
	}
	else {
		let name = matches.value_of("name").unwrap_or("");
		document.find(name).ok_or_else(|| format!("Directory entry '{}' does not exist.", name).into())
	}
}

fn dispatch_dump(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
	let document = load_document(matches, false)?;
	let entry = find_entry(&document, matches)?;
	info!("Dumping entry #{} ({}) ...", entry.id(), entry);

	let mut output: Box<dyn Write> = match matches.value_of("output").unwrap_or("") {
		"" | "-" => Box::new(stdout()),
		outputfile => Box::new(File::create(outputfile)?),
	};
	output.write_all(entry.stream().unwrap_or(&[]))?;
	output.flush()?;
	Ok(())
}
