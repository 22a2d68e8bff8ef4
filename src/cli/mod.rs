pub mod args;
pub mod runner;

pub use args::{
    get_log_level_from_verbose, parse_cli, BuildArgs, Cli, Commands, DeleteArgs, DeployArgs, ListArgs,
    RenameArgs,
};
pub use runner::{run, Runner};
