use anyhow::Result;
use reposcope::cli::{init_logging, parse_args, run};

fn main() -> Result<()> {
    let cli = parse_args();
    init_logging(cli.verbosity);
    run(cli)
}
