// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! lpdc: a thin administrative client over the line-printer wire protocol
//! (spec §4.8 opcodes `\3`/`\4` status, `\5` remove, `\7` control). `lpr`,
//! `lpq`, and `lprm` front-ends are external collaborators and are not
//! implemented here (spec §1).

mod client;
mod error;
mod target;

use clap::{Parser, Subcommand};
use error::ClientError;
use lpd_adapters::Opcode;
use std::path::PathBuf;
use target::Target;

#[derive(Parser)]
#[command(name = "lpdc", version, about = "line-printer control client")]
struct Cli {
    /// Connect to this UNIX socket instead of the default.
    #[arg(long, global = true)]
    socket: Option<PathBuf>,

    /// Connect to this host instead of the UNIX socket.
    #[arg(long, global = true)]
    host: Option<String>,

    /// TCP port to connect to (default 515).
    #[arg(long, global = true)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show queue status (opcode `\3`/`\4`).
    Status {
        /// Queue name, or `all` for every queue.
        #[arg(default_value = "all")]
        queue: String,
        /// Extra arguments forwarded verbatim (e.g. job numbers, `-u user`).
        args: Vec<String>,
        /// Request the long-format report.
        #[arg(short = 'l', long)]
        long: bool,
    },
    /// Remove jobs from a queue (opcode `\5`).
    Remove {
        queue: String,
        user: String,
        /// Job numbers, usernames, or `-` for all of `user`'s own jobs.
        patterns: Vec<String>,
    },
    /// Send an administrative (LPC) command (opcode `\7`).
    Control {
        /// e.g. `enable`, `disable`, `up`, `down`, `abort`, `start`, `hold`, `release`.
        command: String,
        queue: String,
        args: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt().with_writer(std::io::stderr).with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    let target = Target::resolve(cli.socket, cli.host, cli.port);

    match run(&target, cli.command).await {
        Ok(text) => {
            print!("{text}");
            std::process::ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("lpdc: {error}");
            std::process::ExitCode::FAILURE
        }
    }
}

async fn run(target: &Target, command: Commands) -> Result<String, ClientError> {
    match command {
        Commands::Status { queue, args, long } => {
            let mut line = queue;
            for arg in args {
                line.push(' ');
                line.push_str(&arg);
            }
            let opcode = if long { Opcode::LongStatus } else { Opcode::ShortStatus };
            client::send_request(target, opcode, &line).await
        }
        Commands::Remove { queue, user, patterns } => {
            if queue.is_empty() {
                return Err(ClientError::MissingQueue);
            }
            let mut line = format!("{queue} {user}");
            for pattern in patterns {
                line.push(' ');
                line.push_str(&pattern);
            }
            client::send_request(target, Opcode::RemoveJobs, &line).await
        }
        Commands::Control { command, queue, args } => {
            let mut line = format!("{command} {queue}");
            for arg in args {
                line.push(' ');
                line.push_str(&arg);
            }
            client::send_request(target, Opcode::Control, &line).await
        }
    }
}
