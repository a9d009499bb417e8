use anyhow::Result;
use argp::FromArgs;
use pr_sandbox_core::config::Config;
use pr_sandbox_github::webhook::{SIGNATURE_HEADER, sign};
use typed_path::Utf8NativePathBuf;

use crate::util::{native_path, read_file};

#[derive(FromArgs, PartialEq, Eq, Debug)]
/// Print the X-Hub-Signature-256 header for a webhook payload file.
#[argp(subcommand, name = "sign")]
pub struct Args {
    #[argp(positional, from_str_fn(native_path))]
    /// payload file, signed byte for byte
    payload: Utf8NativePathBuf,
    #[argp(option, short = 's')]
    /// secret to sign with (defaults to GITHUB_WEBHOOK_SECRET)
    secret: Option<String>,
}

pub fn run(args: Args, config: &Config) -> Result<()> {
    let payload = read_file(&args.payload)?;
    let secret = args.secret.as_deref().unwrap_or(&config.github.webhook_secret);
    if secret.is_empty() {
        tracing::warn!("Signing with an empty secret; the server will reject this delivery");
    }
    println!("{}: {}", SIGNATURE_HEADER, sign(secret, &payload));
    Ok(())
}
