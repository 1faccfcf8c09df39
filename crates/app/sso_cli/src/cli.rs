use clap::builder::NonEmptyStringValueParser;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "sso_cli", version, about = "SSO operator tools")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the bootstrap admin and demo identities
    Seed {
        /// PostgreSQL connection URL
        #[arg(long, env = "DATABASE_URL", value_parser = NonEmptyStringValueParser::new())]
        database_url: String,

        /// Password given to every seeded identity
        #[arg(long, env = "SEED_PASSWORD", default_value = "admin123")]
        password: String,

        /// bcrypt cost for the seeded password hashes
        #[arg(long, env = "BCRYPT_COST", default_value_t = 10)]
        bcrypt_cost: u32,
    },

    /// Print version information
    Version,
}
