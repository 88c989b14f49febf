use palc::Parser;
use ztempl::cli::*;

fn main() {
	let engine = ztempl::Engine::new();

	match Cli::parse().mode {
		Mode::File { path, defines } => {
			if let Err(e) = engine.run_file(&path, &defines) {
				eprintln!("Failed run file: {e}");
			}
		}
		Mode::Repl => engine.run_prompt(),
	}
}
