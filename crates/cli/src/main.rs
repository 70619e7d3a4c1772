use std::process::ExitCode;

fn main() -> ExitCode {
    match stockwise_cli::run() {
        Ok(code) => code,
        Err(error) => {
            eprintln!("stockwise: {error:#}");
            ExitCode::FAILURE
        }
    }
}
