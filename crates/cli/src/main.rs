use std::process::ExitCode;

fn main() -> ExitCode {
    salesdesk_cli::run()
}
