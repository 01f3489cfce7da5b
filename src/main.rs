//! gantry binary entry point.
use clap::Parser;
use gantry_cli::{cli, commands, logging, task};

fn main() {
    enable_ansi_support::enable_ansi_support().ok(); // best-effort; no-op on non-Windows
    let args = cli::Cli::parse();

    if let Some(shell) = args.completions {
        cli::print_completions(shell);
        return;
    }

    logging::init_subscriber(args.log);

    let session = match commands::init(None) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("\x1b[91mError: {e}\x1b[0m");
            std::process::exit(commands::init_error_code(&e).code());
        }
    };

    let invocation = args.invocation();
    let flags = task::ExecutionFlags {
        clean: args.clean,
        clean_all: args.clean_all,
        force: args.force,
        force_all: args.force_all,
    };

    let code = commands::run::run(&session, &invocation, flags);
    std::process::exit(code.code());
}
