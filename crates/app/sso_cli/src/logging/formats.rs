use flexi_logger::DeferredNow;
use flexi_logger::style;
use log::{Level, Record};

/// Plain message for `info`, level-prefixed and coloured otherwise.
pub fn cli_format(
    w: &mut dyn std::io::Write,
    _now: &mut DeferredNow,
    record: &Record,
) -> Result<(), std::io::Error> {
    let level = record.level();
    match level {
        Level::Info => write!(w, "{}", record.args()),
        _ => write!(
            w,
            "{} {}",
            style(level).paint(level.to_string().to_lowercase()),
            record.args()
        ),
    }
}
