use clap::Parser;

fn main() -> anyhow::Result<()> {
    let cli = repolink::cli::Cli::parse();
    repolink::init(cli.verbose);

    repolink::cli::run(cli)
}
