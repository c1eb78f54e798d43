use clap::Parser;

/// Startup configuration for the dashboard server.
#[derive(Debug, Parser)]
#[command(name = "tidecast", about = "Stock forecast dashboard server", version)]
pub struct ServeArgs {
    /// Bind address.
    #[arg(long, env = "TIDECAST_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Bind port.
    #[arg(long, env = "TIDECAST_PORT", default_value_t = 8050)]
    pub port: u16,

    /// Fetch real history from Yahoo Finance instead of the deterministic
    /// built-in data.
    #[arg(long, env = "TIDECAST_REAL_DATA", default_value_t = false)]
    pub real_data: bool,

    /// Deadline for one provider fetch, in seconds.
    #[arg(long, default_value_t = 15)]
    pub fetch_timeout_secs: u64,

    /// Deadline for one model fit, in seconds.
    #[arg(long, default_value_t = 60)]
    pub forecast_timeout_secs: u64,
}
