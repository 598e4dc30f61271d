use certifyme_rs::cli::{handle_command, Cli};
use certifyme_rs::utils::errors::Result;

/// Conventional exit status after SIGINT
const EXIT_INTERRUPTED: i32 = 130;

#[tokio::main]
async fn main() -> Result<()> {
    use clap::Parser;
    let cli = Cli::parse();

    let code = tokio::select! {
        outcome = handle_command(cli) => match outcome {
            Ok(code) => code,
            Err(e) => {
                eprintln!("Error: {e}");
                1
            }
        },
        _ = tokio::signal::ctrl_c() => {
            eprintln!("Interrupted");
            EXIT_INTERRUPTED
        }
    };

    if code != 0 {
        std::process::exit(code);
    }

    Ok(())
}
