use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "threadline-server", about = "Threadline engagement service")]
pub struct Args {
    /// Path to the TOML config file. Missing files fall back to defaults.
    #[arg(short, long, default_value = "config/threadline.toml")]
    pub config: String,

    /// Override `server.bind_address`.
    #[arg(long)]
    pub bind: Option<String>,

    /// Print a bearer token for the given user id and exit.
    #[arg(long, value_name = "USER_ID")]
    pub issue_token: Option<i64>,
}
