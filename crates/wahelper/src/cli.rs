//! Command-line interface.

use clap::{Args, Parser, Subcommand};
use coordination::Request;

#[derive(Debug, Parser)]
#[command(name = "wahelper")]
#[command(about = "Fetch and send WhatsApp messages through a background worker")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run one request in this process (started by the caller).
    Worker(RequestArgs),

    /// Start a worker for a request, wait for it and print the status.
    Run(RequestArgs),

    /// Call a tool with JSON arguments and print its output.
    Tool {
        /// Tool name
        name: String,

        /// Arguments as a JSON object
        #[arg(long, default_value = "{}")]
        args: String,
    },

    /// Print the tool definitions.
    Tools,
}

/// Request flags shared by `worker` and `run`.
#[derive(Debug, Clone, Args)]
pub struct RequestArgs {
    /// Device phone number
    #[arg(long)]
    pub device: String,

    /// fetch_messages, send_user or send_group
    #[arg(long)]
    pub action: String,

    /// Maximum number of messages to fetch
    #[arg(long)]
    pub limit: Option<u32>,

    /// Recipient phone number (send_user)
    #[arg(long, allow_hyphen_values = true)]
    pub number: Option<String>,

    /// Group name (send_group)
    #[arg(long, allow_hyphen_values = true)]
    pub name: Option<String>,

    /// Message text, may contain HTML markup
    #[arg(long, allow_hyphen_values = true)]
    pub message: Option<String>,

    /// Comma-separated attachment paths
    #[arg(long, value_delimiter = ',')]
    pub attachments: Vec<String>,

    /// Wipe auth material and cache before connecting
    #[arg(long)]
    pub reset: bool,

    /// Fail instead of prompting for pairing
    #[arg(long)]
    pub automation: bool,
}

impl From<RequestArgs> for Request {
    fn from(args: RequestArgs) -> Self {
        Request {
            device: args.device,
            action: args.action,
            limit: args.limit,
            number: args.number,
            name: args.name,
            message: args.message,
            attachments: args.attachments.into_iter().filter(|a| !a.is_empty()).collect(),
            reset: args.reset,
            automation: args.automation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_worker(args: Vec<String>) -> Request {
        let argv = ["wahelper".to_string(), "worker".to_string()]
            .into_iter()
            .chain(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Worker(args) => args.into(),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_worker_flags_match_request_args() {
        let request = Request::send_group("491511234567", "Family, Friends", "-- <b>hi</b>, all")
            .with_attachments(vec!["/tmp/a.jpg".to_string(), "/tmp/b.pdf".to_string()])
            .with_automation(true)
            .with_reset(true);

        assert_eq!(parse_worker(request.to_args()), request);
    }

    #[test]
    fn test_fetch_flags() {
        let request = Request::fetch_messages("491511234567", Some(25));
        let parsed = parse_worker(request.to_args());
        assert_eq!(parsed, request);
        assert!(parsed.attachments.is_empty());
        assert!(!parsed.automation);
    }

    #[test]
    fn test_tool_command() {
        let cli = Cli::try_parse_from([
            "wahelper",
            "tool",
            "fetch_messages",
            "--args",
            r#"{"device":"491511234567"}"#,
        ])
        .unwrap();

        match cli.command {
            Command::Tool { name, args } => {
                assert_eq!(name, "fetch_messages");
                assert!(args.contains("491511234567"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_missing_device_is_rejected() {
        assert!(Cli::try_parse_from(["wahelper", "run", "--action=fetch_messages"]).is_err());
    }
}
