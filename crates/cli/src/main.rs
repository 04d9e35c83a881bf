//! Tabula command-line driver.

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use tabula_buffers::config::default_session_path;
use tabula_buffers::{Config, Coordinator, LifeState, MemoryEngine, OpenFlags, SessionStore};

mod cli;
mod prompt;

use cli::{Cli, Command};
use prompt::TerminalPrompter;

fn main() -> Result<()> {
	let cli = Cli::parse();
	setup_tracing(cli.verbose);

	let config = match &cli.config {
		Some(path) => Config::load(path)?,
		None => Config::load_default()?,
	};
	let mut prompter = TerminalPrompter::new(cli.yes);

	match cli.command {
		Command::Open { files, sync, session } => {
			let mut buffers = Coordinator::new(config, MemoryEngine::new());
			let flags = if sync { OpenFlags::SYNCHRONOUS } else { OpenFlags::empty() };
			for file in &files {
				if let Err(error) = buffers.open(file, flags, &mut prompter) {
					eprintln!("{error}");
				}
				let activity = buffers.background_activities().describe();
				if !activity.is_empty() {
					tracing::info!(%activity, "tabula.progress");
				}
			}
			buffers.wait_for_completion();
			print_notices(&mut buffers);
			print_table(&buffers);
			if let Some(path) = session {
				buffers.save_session_file(&path).with_context(|| format!("writing session {}", path.display()))?;
			}
		}
		Command::Restore { session } => {
			let path = session_path(session)?;
			let mut buffers = Coordinator::new(config, MemoryEngine::new());
			let restored = buffers.load_session_file(&path, &mut prompter);
			buffers.wait_for_completion();
			print_notices(&mut buffers);
			restored.with_context(|| format!("restoring session {}", path.display()))?;
			print_table(&buffers);
		}
		Command::Session { session } => {
			let path = session_path(session)?;
			let store = SessionStore::read_file(&path)?;
			for (key, value) in store.iter() {
				println!("{key}={value}");
			}
		}
	}
	Ok(())
}

fn session_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
	explicit
		.or_else(default_session_path)
		.ok_or_else(|| anyhow!("no session file given and no data directory available"))
}

fn print_notices(buffers: &mut Coordinator<MemoryEngine>) {
	for notice in buffers.take_notices() {
		eprintln!("{}", notice.message);
	}
}

fn print_table(buffers: &Coordinator<MemoryEngine>) {
	let current = buffers.current();
	for (index, record) in buffers.table().visible_records().enumerate() {
		let marker = if index == current { '*' } else { ' ' };
		let name = record.path().map_or_else(|| "(untitled)".to_owned(), |p| p.display().to_string());
		let len = record.document().and_then(|doc| buffers.engine().text(doc)).map_or(0, <[u8]>::len);
		let state = match record.life_state() {
			LifeState::Open => "",
			LifeState::Empty => " [empty]",
			LifeState::Reading => " [reading]",
			LifeState::ReadAll => " [loaded]",
		};
		println!("{marker}{index:>3} {name} ({len} bytes, {}){state}", record.encoding.as_str());
	}
}

fn setup_tracing(verbose: bool) {
	use tracing_subscriber::EnvFilter;

	let filter = EnvFilter::try_from_env("TABULA_LOG").unwrap_or_else(|_| {
		if verbose {
			EnvFilter::new("tabula_buffers=debug,info")
		} else {
			EnvFilter::new("warn")
		}
	});
	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}
