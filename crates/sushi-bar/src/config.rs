use std::{num::NonZeroUsize, time::Duration};

use clap::Parser;

/// Seats available when no capacity is configured.
pub const DEFAULT_CAPACITY: NonZeroUsize = NonZeroUsize::new(5).unwrap();

/// Sushi bar server options. Every flag can also come from the environment.
#[derive(Parser, Debug, Clone)]
#[command(name = "sushi-bar", version, about = "Capacity-bounded sushi bar gRPC server")]
pub struct Opts {
    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: u16,

    /// Interface to bind
    #[arg(long, env = "SUSHI_BAR_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Number of seats
    #[arg(long, env = "SUSHI_BAR_CAPACITY", default_value_t = DEFAULT_CAPACITY)]
    pub capacity: NonZeroUsize,

    /// Give up on queued Enter calls after this many seconds (wait forever when unset)
    #[arg(long, env = "SUSHI_BAR_ENTER_TIMEOUT_SECS")]
    pub enter_timeout_secs: Option<u64>,
}

impl Opts {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn enter_timeout(&self) -> Option<Duration> {
        self.enter_timeout_secs.map(Duration::from_secs)
    }
}
