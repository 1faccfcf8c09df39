pub mod formats;

use flexi_logger::Logger;

use crate::Error;

/// Default filter when `RUST_LOG` is unset. sqlx logs every statement at info.
const DEFAULT_FILTER: &str = "info, sqlx=warn";

pub fn init() -> Result<(), Error> {
    Logger::try_with_env_or_str(DEFAULT_FILTER)?
        .format(formats::cli_format)
        .log_to_stdout()
        .start()?;

    Ok(())
}
