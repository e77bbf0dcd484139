use anyhow::Result;
use clap::Parser;
use il2cpp_finder::cli::Cli;
use il2cpp_finder::config::{history_path, resolve_dump_path, resolve_limit, resolve_output_format};
use il2cpp_finder::load::load_dump;
use il2cpp_finder::render::banner;
use il2cpp_finder::scan::locate_dump;
use il2cpp_finder::search::SearchIndex;
use il2cpp_finder::{command, repl};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let format = resolve_output_format(&cli);
    let limit = resolve_limit(&cli);

    let dump_path = locate_dump(&resolve_dump_path(&cli))?;
    let mut dump = load_dump(&dump_path)?;
    let index = SearchIndex::new(std::mem::take(&mut dump.classes));

    if let Some(input) = cli.cmd.as_deref() {
        let output = command::run(&index, input, format, limit)?;
        print!("{output}");
        if !output.ends_with('\n') {
            println!();
        }
        return Ok(());
    }

    print!("{}", banner(&dump, &index.stats()));
    repl::run(&index, format, limit, history_path().as_deref())
}
