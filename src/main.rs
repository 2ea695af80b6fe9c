mod cli;
mod decompress;
mod download;
mod error;
mod extract;
mod header;
mod logging;
mod pipeline;
mod product;
mod raster;
mod remote;
#[cfg(test)]
mod test_utils;

use anyhow::{Error, Result};
use clap::Parser;
use cli::{command, Cli, Commands};

#[tokio::main]
async fn main() -> Result<(), Error> {
    logging::init_tracing();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Sweep {
            remote,
            pipeline,
            years,
        } => {
            let summary = command::sweep(remote, pipeline, years).await?;
            println!("Sweep complete: {}", summary);
        }
        Commands::Catalog { remote, year } => {
            for line in command::catalog(remote, year.as_deref()).await? {
                println!("{}", line);
            }
        }
        Commands::Process { pipeline } => {
            let summary = command::process(pipeline).await?;
            println!("Processing complete: {}", summary);
        }
        Commands::Products {} => {
            for line in command::products() {
                println!("{}", line);
            }
        }
    }

    Ok(())
}
