#[derive(clap::Parser, Debug, Clone)]
pub struct Config {
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
    /// hidraw path of the security key, e.g. /dev/hidraw4.
    #[arg(long)]
    pub device: Option<String>,
    /// List all FIDO devices and exit.
    #[arg(long)]
    pub list: bool,
    /// Exercise the optional WINK command.
    #[arg(long)]
    pub wink: bool,
    /// Seed for the handshake nonce generator.
    #[arg(long, default_value_t = 0)]
    pub seed: u64,
}
