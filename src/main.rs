use anyhow::Result;
use clap::{Parser, Subcommand};
use repseed::algorithm::collapse;
use repseed::store;

#[derive(Parser)]
#[command(name = "repseed")]
#[command(version = "0.1.0")]
#[command(about = "Spaced-seed repeat detection for packed DNA sequences", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect and retire sequences that repeat the reference
    Collapse(collapse::CollapseArgs),

    /// Pack FASTA text into the 2-bit binary format
    Pack(store::PackArgs),

    /// Unpack a 2-bit binary file back to FASTA
    Unpack(store::UnpackArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Collapse(args) => {
            collapse::run(args)?;
        }
        Commands::Pack(args) => {
            store::run_pack(args)?;
        }
        Commands::Unpack(args) => {
            store::run_unpack(args)?;
        }
    }
    Ok(())
}
