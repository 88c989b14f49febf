use std::path::PathBuf;

use palc::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ztempl", after_long_help = "Renders template files with #directives and ${interpolations}.")]
pub struct Cli {
	#[command(subcommand)]
	pub mode: Mode,
}

#[derive(Subcommand, Debug)]
pub enum Mode {
	/// Render a template file; trailing name=value pairs bind context variables
	File { path: PathBuf, defines: Vec<String> },
	/// Input prompt
	Repl,
}
