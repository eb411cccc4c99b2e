use clap::Parser;

#[derive(Parser)]
#[command(name = "chproxy")]
pub(crate) struct Cli {
    #[arg(long, default_value = "0.0.0.0")]
    pub(crate) host: String,
    #[arg(long, env = "PORT", default_value_t = 8805)]
    pub(crate) port: u16,
    /// Shared bearer secret; leave unset to accept every request.
    #[arg(long, env = "AUTH_TOKEN")]
    pub(crate) auth_token: Option<String>,
}
