use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Parser, Subcommand};
use taskdeck_shared::dashboard::TimeWindow;
use taskdeck_shared::task::TaskStatus;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "taskdeck",
    version,
    about = "Taskdeck: terminal client for the project task board",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[arg(
        long = "rc",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append,
        global = true
    )]
    pub rc_overrides: Vec<KeyVal>,

    /// Config file (defaults to $TASKDECK_CONFIG, then the user config dir).
    #[arg(long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Page to work on, by slug or page name.
    #[arg(long = "page", global = true)]
    pub page: Option<String>,

    /// API root, overriding `api.base_url`.
    #[arg(long = "api", global = true)]
    pub api: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List the page's tasks with their subtasks.
    List,
    /// Create a task, optionally with subtasks.
    Add {
        name: String,
        #[arg(long = "desc")]
        description: Option<String>,
        /// Subtask as TITLE or TITLE::DESCRIPTION; repeatable.
        #[arg(long = "sub", action = ArgAction::Append)]
        subtasks: Vec<String>,
    },
    /// Move a pending task to In progress.
    Start { id: u64 },
    /// Complete an in-progress task.
    Done { id: u64 },
    Delete { id: u64 },
    /// Subtask operations.
    Sub {
        #[command(subcommand)]
        action: SubCommand,
    },
    /// Analytics over every task.
    Dashboard {
        #[arg(long = "window")]
        window: Option<TimeWindow>,
    },
    /// Server-side task counts.
    Summary,
    /// List the known pages.
    Pages,
    /// Print the effective configuration.
    Config,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SubCommand {
    Add {
        task_id: u64,
        title: String,
        #[arg(long = "desc")]
        description: Option<String>,
    },
    /// Set a subtask's status explicitly.
    Status { id: u64, status: TaskStatus },
    /// Advance a subtask one step: Pending, In progress, Completed, Pending.
    Toggle { id: u64 },
    Delete { id: u64 },
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

impl GlobalCli {
    /// Flag values expressed as config overrides, applied after `--rc`.
    pub fn flag_overrides(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        if let Some(api) = &self.api {
            out.push(("api.base_url".to_string(), api.clone()));
        }
        if let Some(page) = &self.page {
            out.push(("page.default".to_string(), page.clone()));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_subtask_status_and_globals() {
        let cli = GlobalCli::try_parse_from([
            "taskdeck",
            "sub",
            "status",
            "7",
            "in-progress",
            "--page",
            "broker",
            "--rc",
            "color=off",
        ])
        .expect("parse");

        match cli.command {
            Some(Command::Sub {
                action: SubCommand::Status { id, status },
            }) => {
                assert_eq!(id, 7);
                assert_eq!(status, TaskStatus::InProgress);
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert_eq!(cli.rc_overrides[0].key, "color");
        assert_eq!(
            cli.flag_overrides(),
            vec![("page.default".to_string(), "broker".to_string())]
        );
    }

    #[test]
    fn add_collects_repeated_subtasks() {
        let cli = GlobalCli::try_parse_from([
            "taskdeck", "add", "Ship it", "--sub", "a", "--sub", "b::why",
        ])
        .expect("parse");
        match cli.command {
            Some(Command::Add { name, subtasks, .. }) => {
                assert_eq!(name, "Ship it");
                assert_eq!(subtasks, vec!["a", "b::why"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_window() {
        assert!(
            GlobalCli::try_parse_from(["taskdeck", "dashboard", "--window", "year"]).is_err()
        );
    }

    #[test]
    fn rc_requires_key_value() {
        assert!("color".parse::<KeyVal>().is_err());
    }
}
