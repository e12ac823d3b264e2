pub mod formats;

use flexi_logger::Logger;

use crate::Error;

/// Default log spec; `RUST_LOG` overrides it.
const DEFAULT_SPEC: &str = "info,rmcp=warn";
const DEBUG_SPEC: &str = "debug,rmcp=info,hyper=info,hyper_util=info,reqwest=info";

/// Log to stderr so that stdout carries only the report.
pub fn init(debug: bool) -> Result<(), Error> {
    let logger = if debug {
        Logger::try_with_env_or_str(DEBUG_SPEC)?.format(formats::debug_format)
    } else {
        Logger::try_with_env_or_str(DEFAULT_SPEC)?.format(formats::cli_format)
    };
    logger.log_to_stderr().start()?;

    Ok(())
}
