use std::process::ExitCode;

fn main() -> ExitCode {
    shotbot_cli::run()
}
