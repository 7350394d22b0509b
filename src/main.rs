mod engine;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::error;

use rusbit_wire::config::CONFIG_FILE;

#[derive(Parser)]
#[command(name = "rusbit", version, about = "BitTorrent metainfo, tracker and peer wire tool")]
pub struct Cli {
	/// Client configuration file
	#[arg(long, global = true, default_value = CONFIG_FILE)]
	pub config: PathBuf,

	#[command(subcommand)]
	pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
	/// Decode a bencoded string and print it as JSON
	Decode { value: String },
	/// Show the contents of a .torrent file
	Info { file: PathBuf },
	/// List the piece hashes of a .torrent file
	Pieces { file: PathBuf },
	/// Ask the tracker for peers
	Peers { file: PathBuf },
	/// Handshake with a peer given as ip:port
	Handshake { file: PathBuf, peer: String },
}

fn main() {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let cli = Cli::parse();
	if let Err(e) = engine::use_command(cli) {
		error!("{:#}", e);
		std::process::exit(1);
	}
}
