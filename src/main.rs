use anyhow::Result;
use career_mentor::cli::CliArgs;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    career_mentor::run(args).await
}
