use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "tabula")]
#[command(about = "Open, save and restore editor buffers with background file I/O")]
#[command(version)]
/// Command-line arguments.
pub struct Cli {
	/// Configuration file (defaults to the user config if present)
	#[arg(long, short = 'c', value_name = "PATH", global = true)]
	pub config: Option<PathBuf>,

	/// Answer every confirmation with yes instead of asking
	#[arg(long, short = 'y', global = true)]
	pub yes: bool,

	/// Verbose logging
	#[arg(long, short = 'v', global = true)]
	pub verbose: bool,

	#[command(subcommand)]
	pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
	/// Open files and print the resulting buffer table
	Open {
		/// Files to open, in order
		#[arg(required = true)]
		files: Vec<PathBuf>,

		/// Read every file inline, ignoring the background threshold
		#[arg(long)]
		sync: bool,

		/// Write the resulting session to this file
		#[arg(long, value_name = "PATH")]
		session: Option<PathBuf>,
	},
	/// Restore a session file and print the resulting buffer table
	Restore {
		/// Session file (defaults to the user session)
		session: Option<PathBuf>,
	},
	/// Print the records of a session file
	Session {
		/// Session file (defaults to the user session)
		session: Option<PathBuf>,
	},
}
