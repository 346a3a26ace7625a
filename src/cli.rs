use argh::FromArgs;

use crate::settings::DEFAULT_CONFIG_PATH;

#[derive(FromArgs, Debug, PartialEq)]
/// Play the Starknet counter game from the terminal.
pub struct Args {
    /// path to the YAML config file
    #[argh(option, short = 'c', default = "DEFAULT_CONFIG_PATH.to_string()")]
    pub config: String,

    #[argh(subcommand)]
    pub command: Command,
}

#[derive(FromArgs, Debug, PartialEq)]
#[argh(subcommand)]
pub enum Command {
    Status(StatusCmd),
    History(HistoryCmd),
    Increase(IncreaseCmd),
    Reset(ResetCmd),
}

#[derive(FromArgs, Debug, PartialEq)]
/// Show the counter, the win number and the prize pool.
#[argh(subcommand, name = "status")]
pub struct StatusCmd {}

#[derive(FromArgs, Debug, PartialEq)]
/// Show recent counter activity.
#[argh(subcommand, name = "history")]
pub struct HistoryCmd {
    /// keep polling and print new activity as it arrives
    #[argh(switch, short = 'w')]
    pub watch: bool,
}

#[derive(FromArgs, Debug, PartialEq)]
/// Increment the counter, optionally sending STRK to the prize pool.
#[argh(subcommand, name = "increase")]
pub struct IncreaseCmd {
    /// STRK amount to send along with the increment
    #[argh(option)]
    pub amount: Option<String>,
}

#[derive(FromArgs, Debug, PartialEq)]
/// Reset the counter, paying the current prize pool.
#[argh(subcommand, name = "reset")]
pub struct ResetCmd {}
