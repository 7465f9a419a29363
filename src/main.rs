//! Binary entrypoint for the Secura relay server.

use std::process::ExitCode;

use secura_relay::start_relay;

/// Load configuration, build the summarization engines and serve until Ctrl+C.
fn main() -> ExitCode {
    start_relay::run()
}
