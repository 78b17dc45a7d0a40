use clap::Parser;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Values from .env are only defaults; the real environment wins.
    let _ = dotenvy::dotenv();

    let cli = bugscan::cli::parser::Cli::parse();
    bugscan::logging::init(cli.verbose);
    bugscan::run::run(cli, None).await
}
