use std::process::ExitCode;

fn main() -> anyhow::Result<ExitCode> {
    storemail_cli::run()
}
