use chrono_tz::Tz;
use clap::Parser;

#[derive(Debug, Parser)]
pub struct Args {
    #[arg(long, env = "TZ")]
    pub timezone: Tz,

    #[arg(long, env = "INFLUXDB_URL")]
    pub influxdb_url: String,

    #[arg(long, env = "INFLUXDB_DATABASE", default_value = "co2mon")]
    pub database: String,

    /// Optional `location` tag attached to every reading.
    #[arg(long)]
    pub location: Option<String>,

    /// Data acquisition period in seconds.
    #[arg(long, default_value_t = 20)]
    pub delay_secs: u64,

    /// Per-frame device read timeout in milliseconds.
    #[arg(long, default_value_t = 10_000)]
    pub read_timeout_millis: u64,
}
