use super::super::args::*;
use crate::exit_codes::SUCCESS;

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Eval(args) => super::eval::run(args).await,
        Command::Batch(args) => super::batch::run(args).await,
        Command::Fixtures(args) => super::fixtures::run(args).await,
        Command::Tasks(args) => super::tasks::run(args),
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(SUCCESS)
        }
    }
}
