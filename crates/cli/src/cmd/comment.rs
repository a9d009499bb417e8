use std::process::ExitCode;

use anyhow::{Result, bail};
use argp::FromArgs;
use pr_sandbox_core::config::Config;
use pr_sandbox_github::publish_comment;
use typed_path::Utf8NativePathBuf;

use crate::util::{native_path, read_file};

#[derive(FromArgs, PartialEq, Eq, Debug)]
/// Post a comment on a pull request as the configured GitHub App.
#[argp(subcommand, name = "comment")]
pub struct Args {
    #[argp(positional)]
    /// repository owner
    owner: String,
    #[argp(positional)]
    /// repository name
    repo: String,
    #[argp(positional)]
    /// pull request number
    number: u64,
    #[argp(option, short = 'b')]
    /// comment text
    body: Option<String>,
    #[argp(option, short = 'f', from_str_fn(native_path))]
    /// read the comment text from a file
    body_file: Option<Utf8NativePathBuf>,
}

fn comment_body(body: Option<String>, body_file: Option<&Utf8NativePathBuf>) -> Result<String> {
    match (body, body_file) {
        (Some(_), Some(_)) => bail!("--body and --body-file are mutually exclusive"),
        (Some(body), None) => Ok(body),
        (None, Some(path)) => Ok(String::from_utf8(read_file(path)?)?),
        (None, None) => bail!("One of --body or --body-file is required"),
    }
}

pub async fn run(args: Args, config: &Config) -> Result<ExitCode> {
    let body = comment_body(args.body, args.body_file.as_ref())?;
    match publish_comment(&config.github, &args.owner, &args.repo, args.number, &body).await {
        Ok(comment) => {
            println!("{}", comment.receipt());
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            println!("{}", e.body());
            Ok(ExitCode::FAILURE)
        }
    }
}
