//! Command-line overrides layered on top of the environment/file config.

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "fleetwatch", version, about = "Container fleet monitoring and reporting")]
pub struct Cli {
    /// Run with in-memory adapters and a handful of seeded containers
    /// instead of a real index/DB/mailer/runtime.
    #[arg(long)]
    pub demo: bool,
}

impl Cli {
    /// Applies CLI flags on top of whatever `Config::from_env` already
    /// decided, CLI taking precedence (same "most specific wins" rule the
    /// teacher's env > file > default chain follows, extended one level up).
    pub fn apply(&self, mut config: crate::config::Config) -> crate::config::Config {
        if self.demo {
            config.demo = true;
        }
        config
    }
}
