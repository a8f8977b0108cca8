mod commands;
mod terminal;

use commands::{CommandLine, Commands, run, trace};
use terminal::{logging, print};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands: CommandLine = CommandLine::parse_args();

    logging::init_logging(commands.verbose, commands.quiet);

    let result: anyhow::Result<()> = match commands.command {
        Commands::Run(args) => {
            print::header("starting campaign", commands.quiet);
            run::run(args, commands.quiet).await
        }
        Commands::Trace { destination, probe } => {
            print::header("starting trace", commands.quiet);
            trace::trace(destination, &probe, commands.quiet).await
        }
    };

    if commands.quiet == 0 {
        print::end_of_program();
    }
    result
}
