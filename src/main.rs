//! Binary entrypoint for the WhatsGPT service.

use std::process::ExitCode;

use whatsgpt::start_whatsgpt;

fn main() -> ExitCode {
    start_whatsgpt::run()
}
