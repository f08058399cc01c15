//! tasklist-infra CLI — synthesize and inspect the task-list deployment plan.

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "tasklist-infra",
    version,
    about = "Declarative AWS infrastructure for the task-list platform — deterministic template synthesis, BLAKE3 plan fingerprints"
)]
struct Cli {
    #[command(subcommand)]
    command: tasklist_infra::cli::Commands,
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = tasklist_infra::cli::dispatch(cli.command) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
