use clap::Parser;

fn main() -> anyhow::Result<()> {
    let cfg = fidoprobe::config::Config::parse();
    fidoprobe::run(cfg)
}
