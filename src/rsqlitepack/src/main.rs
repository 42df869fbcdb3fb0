use clap::Parser;
use rsqlitepack::cli::Cli;

fn main() {
    let cli = Cli::parse();
    rsqlitepack::logging::init(cli.verbose);

    match rsqlitepack::pack(&cli.archive, &cli.inputs) {
        Ok(outcome) => {
            let _ = outcome.progress.report(&mut std::io::stderr());
        }
        Err(err) => {
            tracing::error!("{err}");
            eprintln!("rsqlitepack: {err}");
            std::process::exit(1);
        }
    }
}
