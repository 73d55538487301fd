use hook_keeper_cli::{run_cli, CliError};
use tracing::error;

fn main() {
    if let Err(e) = run_cli() {
        error!("CLI error: {}", e);
        eprintln!("Error: {}", e);

        // Exit with appropriate code based on error type
        let exit_code = match e {
            CliError::Configuration(_) | CliError::Preset(_) => 1,
            CliError::Rejected { .. } => 2,
            CliError::Webhook(_) => 3,
            CliError::Store(_) | CliError::Lookup(_) => 4,
            CliError::InvalidArgument { .. } | CliError::Input(_) => 5,
            CliError::Output { .. } | CliError::Io(_) => 6,
        };

        std::process::exit(exit_code);
    }
}
