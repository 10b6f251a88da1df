use clap::Parser;

fn main() -> anyhow::Result<()> {
    let cfg = oathkey::config::Config::parse();
    oathkey::run(cfg)
}
