use std::process::ExitCode;

fn main() -> ExitCode {
    taskdesk_cli::run()
}
