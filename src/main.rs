use clap::Parser;
use nbcatalog::remote::GitCli;
use nbcatalog::{Args, build_catalog};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();
    let config = args.into_config();
    let count = build_catalog(&config, &GitCli)?;

    println!(
        "Catalog saved to {} with {} notebooks",
        config.output_file.display(),
        count
    );

    Ok(())
}
