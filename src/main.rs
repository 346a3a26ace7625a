use anyhow::Result;

use counter_lib::cli::Args;
use counter_lib::{init_logging, start_service};

#[tokio::main]
async fn main() -> Result<()> {
    let args: Args = argh::from_env();
    init_logging();

    start_service(args).await
}
