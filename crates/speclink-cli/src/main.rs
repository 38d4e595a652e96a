use speclink_cli::{command, exit_code, init_tracing, run};
use std::io::Write;

fn main() {
    let matches = command().get_matches();
    let verbose = matches
        .subcommand()
        .map_or(matches.get_flag("verbose"), |(_, args)| args.get_flag("verbose"));
    init_tracing(verbose);

    let mut stdout = std::io::stdout().lock();
    let code = match run(&matches, &mut stdout) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error:#}");
            exit_code(&error)
        }
    };
    if let Err(error) = stdout.flush() {
        eprintln!("error: {error}");
    }
    std::process::exit(code);
}
