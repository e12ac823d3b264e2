use std::io::Write;

use flexi_logger::{DeferredNow, Record, style};

/// `LEVEL message`, level colored.
pub fn cli_format(
    w: &mut dyn Write,
    _now: &mut DeferredNow,
    record: &Record,
) -> Result<(), std::io::Error> {
    let level = record.level();
    write!(
        w,
        "{} {}",
        style(level).paint(format!("{level:<5}")),
        record.args()
    )
}

/// Timestamp, level and target, for `--debug`.
pub fn debug_format(
    w: &mut dyn Write,
    now: &mut DeferredNow,
    record: &Record,
) -> Result<(), std::io::Error> {
    let level = record.level();
    write!(
        w,
        "{} {} [{}] {}",
        now.format("%H:%M:%S%.3f"),
        style(level).paint(format!("{level:<5}")),
        record.target(),
        record.args()
    )
}
