//! faceauth-stack: define, render and provision the face-auth infrastructure
//!
//! `synth` renders the CloudFormation template offline; `deploy` and
//! `destroy` manage the stack in an AWS account.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use faceauth_common::defaults::{DEFAULT_DEPLOY_TIMEOUT_SECS, DEFAULT_REGION};
use faceauth_stack::aws::{AwsContext, CloudFormationClient, RekognitionClient};
use faceauth_stack::provision::{DeployReport, Provisioner};
use faceauth_stack::wait::PollConfig;
use faceauth_stack::{ResourceGraphBuilder, StackContext, template};
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "faceauth-stack")]
#[command(about = "Face authentication infrastructure on AWS")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

/// Which stack to build
#[derive(clap::Args, Debug)]
struct StackArgs {
    /// Stack name (overrides stack_name from --config)
    #[arg(short, long)]
    name: Option<String>,

    /// JSON stack configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Add a mutable `faceId` custom attribute to the user pool
    #[arg(long)]
    with_face_id_attribute: bool,
}

impl StackArgs {
    fn context(&self) -> Result<StackContext> {
        StackContext::resolve(
            self.name.as_deref(),
            self.config.as_deref(),
            self.with_face_id_attribute,
        )
        .context("Invalid stack configuration")
    }
}

/// Where and how to talk to AWS
#[derive(clap::Args, Debug)]
struct AwsArgs {
    /// AWS region
    #[arg(long, env = "AWS_REGION", default_value = DEFAULT_REGION)]
    region: String,

    /// AWS profile to use (overrides AWS_PROFILE env var)
    #[arg(long)]
    aws_profile: Option<String>,

    /// Seconds to wait for the stack to settle
    #[arg(long, default_value_t = DEFAULT_DEPLOY_TIMEOUT_SECS)]
    timeout: u64,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the CloudFormation template and bootstrap plan
    Synth {
        #[command(flatten)]
        stack: StackArgs,

        /// Write the template to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Create or update the stack, then run bootstrap actions
    Deploy {
        #[command(flatten)]
        stack: StackArgs,

        #[command(flatten)]
        aws: AwsArgs,
    },

    /// Delete the stack (the face collection and user pool are kept)
    Destroy {
        /// Stack name
        #[arg(short, long)]
        name: String,

        #[command(flatten)]
        aws: AwsArgs,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&e);
        std::process::exit(1);
    }
}

/// Print error in a user-friendly way
fn print_error(e: &anyhow::Error) {
    use std::io::Write;

    let mut stderr = std::io::stderr();
    let _ = writeln!(stderr, "\n\x1b[1;31mError:\x1b[0m {e}");

    let mut source = e.source();
    while let Some(cause) = source {
        let _ = writeln!(stderr, "  \x1b[33mCaused by:\x1b[0m {cause}");
        source = cause.source();
    }
}

async fn run() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    match args.command {
        Command::Synth { stack, output } => {
            let context = stack.context()?;
            let graph = ResourceGraphBuilder::build(&context)?;
            let body = template::render_body(&context, &graph)?;

            match output {
                Some(path) => {
                    std::fs::write(&path, &body)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    info!(
                        stack = %context.name(),
                        path = %path.display(),
                        resources = graph.len(),
                        "Template written"
                    );
                }
                None => println!("{body}"),
            }
        }

        Command::Deploy { stack, aws } => {
            let context = stack.context()?;
            let graph = ResourceGraphBuilder::build(&context)?;

            if let Some(profile) = &aws.aws_profile {
                info!(profile = %profile, "Using AWS profile");
            }
            let aws_ctx = AwsContext::new(&aws.region, aws.aws_profile.as_deref()).await;
            let stacks = CloudFormationClient::from_context(&aws_ctx);
            let collections = RekognitionClient::from_context(&aws_ctx);

            info!(
                stack = %context.name(),
                region = %aws_ctx.region(),
                resources = graph.len(),
                "Deploying stack"
            );

            let report = Provisioner::new(&stacks, &collections)
                .with_poll_config(PollConfig::with_timeout(Duration::from_secs(aws.timeout)))
                .with_cancel(cancel_on_ctrl_c())
                .deploy(&context, &graph)
                .await?;
            print_report(&report);
        }

        Command::Destroy { name, aws } => {
            let context = StackContext::new(name)?;
            let aws_ctx = AwsContext::new(&aws.region, aws.aws_profile.as_deref()).await;
            let stacks = CloudFormationClient::from_context(&aws_ctx);
            let collections = RekognitionClient::from_context(&aws_ctx);

            let existed = Provisioner::new(&stacks, &collections)
                .with_poll_config(PollConfig::with_timeout(Duration::from_secs(aws.timeout)))
                .with_cancel(cancel_on_ctrl_c())
                .destroy(context.name())
                .await?;
            if !existed {
                println!("Stack {} does not exist", context.name());
            }
        }
    }

    Ok(())
}

/// Token cancelled on the first Ctrl-C
fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling wait");
            child.cancel();
        }
    });
    token
}

fn print_report(report: &DeployReport) {
    println!("Stack {} ({:?})", report.stack_name, report.change);
    for (key, value) in &report.outputs {
        println!("  {key}: {value}");
    }
    for outcome in &report.bootstrap {
        println!("  bootstrap: {outcome:?}");
    }
}
