mod cmd {
    pub mod comment;
    pub mod sign;
}
mod util;

use std::process::ExitCode;

use argp::FromArgs;
use pr_sandbox_core::config::Config;
use tracing_subscriber::{EnvFilter, filter::LevelFilter};
use typed_path::Utf8NativePathBuf;

use crate::util::native_path;

#[derive(FromArgs, PartialEq, Eq, Debug)]
/// Operator tools for the PR sandbox webhook service.
struct TopLevel {
    #[argp(subcommand)]
    command: SubCommand,
    #[argp(option, short = 'c', from_str_fn(native_path))]
    /// configuration file (default: config.yml)
    config: Option<Utf8NativePathBuf>,
}

#[derive(FromArgs, PartialEq, Eq, Debug)]
#[argp(subcommand)]
enum SubCommand {
    Comment(cmd::comment::Args),
    Sign(cmd::sign::Args),
}

#[tokio::main]
async fn main() -> ExitCode {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();
    tracing_subscriber::fmt().with_env_filter(env_filter).with_writer(std::io::stderr).init();

    let args: TopLevel = argp::parse_args_or_exit(argp::DEFAULT);
    let config_path = args.config.unwrap_or_else(|| Utf8NativePathBuf::from("config.yml"));
    let config = match Config::load(config_path.with_platform_encoding()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed: {e:?}");
            return ExitCode::FAILURE;
        }
    };
    let result = match args.command {
        SubCommand::Comment(c_args) => cmd::comment::run(c_args, &config).await,
        SubCommand::Sign(c_args) => cmd::sign::run(c_args, &config).map(|()| ExitCode::SUCCESS),
    };
    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Failed: {e:?}");
            ExitCode::FAILURE
        }
    }
}
