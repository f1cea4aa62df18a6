//! Command line interface built on clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use letterhub::workflow::{EscalationAction, Role, Status};

/// Order status and proofing workflow for patient letter mailings.
#[derive(Debug, Parser)]
#[command(name = "letterhub", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Directory holding the order store (overrides letterhub.toml).
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RoleArg {
    /// Back-office staff.
    Admin,
    /// Practice user who owns the order.
    User,
}

impl From<RoleArg> for Role {
    fn from(arg: RoleArg) -> Self {
        match arg {
            RoleArg::Admin => Role::Admin,
            RoleArg::User => Role::User,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a draft order.
    Create {
        #[arg(long)]
        practice: String,
        /// Customer user who owns the order.
        #[arg(long)]
        customer: String,
        #[arg(long)]
        title: String,
    },

    /// Move an order to a new status.
    Transition {
        order: String,
        /// Target status, e.g. `in-review` or `waiting-approval-rev1`.
        status: Status,
        #[arg(long)]
        actor: String,
        #[arg(long, value_enum)]
        role: RoleArg,
        #[arg(long)]
        comment: Option<String>,
    },

    /// Attach a new design proof (admin only).
    UploadProof {
        order: String,
        #[arg(long)]
        actor: String,
        #[arg(long, value_enum, default_value = "admin")]
        role: RoleArg,
        /// File-store reference of the proof.
        #[arg(long)]
        artifact: String,
        #[arg(long)]
        comment: Option<String>,
    },

    /// Act on an outstanding escalation (admin only).
    Resolve {
        order: String,
        /// RESOLVE, CONTACT_CUSTOMER or ESCALATE_TO_MANAGER.
        action: EscalationAction,
        #[arg(long)]
        actor: String,
        #[arg(long, value_enum, default_value = "admin")]
        role: RoleArg,
        #[arg(long)]
        notes: Option<String>,
    },

    /// Show current status, available transitions and history.
    Status {
        order: String,
        #[arg(long, value_enum, default_value = "user")]
        role: RoleArg,
        /// Print the view as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Show the status history of an order, oldest first.
    History {
        order: String,
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// List catalog transitions.
    Catalog {
        #[arg(long)]
        from: Option<Status>,
        #[arg(long, value_enum)]
        role: Option<RoleArg>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_transition() {
        let cli = Cli::parse_from([
            "letterhub",
            "transition",
            "o-1",
            "waiting-approval-rev1",
            "--actor",
            "cust-1",
            "--role",
            "user",
            "--comment",
            "please fix address",
        ]);
        match cli.command {
            Command::Transition {
                order,
                status,
                actor,
                role,
                comment,
            } => {
                assert_eq!(order, "o-1");
                assert_eq!(status, Status::WaitingApprovalRev1);
                assert_eq!(actor, "cust-1");
                assert_eq!(Role::from(role), Role::User);
                assert_eq!(comment.as_deref(), Some("please fix address"));
            }
            _ => panic!("expected Transition command"),
        }
    }

    #[test]
    fn cli_rejects_unknown_status() {
        let result = Cli::try_parse_from([
            "letterhub", "transition", "o-1", "shipping", "--actor", "a", "--role", "admin",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn cli_parses_resolve_and_global_flags() {
        let cli = Cli::parse_from([
            "letterhub",
            "--verbose",
            "--data-dir",
            "/tmp/lh",
            "resolve",
            "o-9",
            "contact-customer",
            "--actor",
            "admin-1",
            "--notes",
            "called office",
        ]);
        assert!(cli.verbose);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/lh")));
        assert!(matches!(
            cli.command,
            Command::Resolve {
                action: EscalationAction::ContactCustomer,
                ..
            }
        ));
    }

    #[test]
    fn overlay_commands_take_a_role() {
        let cli = Cli::parse_from([
            "letterhub", "upload-proof", "o-1", "--actor", "cust-1", "--role", "user", "--artifact", "p.pdf",
        ]);
        assert!(matches!(
            cli.command,
            Command::UploadProof {
                role: RoleArg::User,
                ..
            }
        ));

        let cli = Cli::parse_from(["letterhub", "resolve", "o-1", "resolve", "--actor", "admin-1"]);
        assert!(matches!(
            cli.command,
            Command::Resolve {
                role: RoleArg::Admin,
                ..
            }
        ));
    }

    #[test]
    fn status_role_defaults_to_user() {
        let cli = Cli::parse_from(["letterhub", "status", "o-1"]);
        assert!(matches!(
            cli.command,
            Command::Status {
                role: RoleArg::User,
                json: false,
                ..
            }
        ));
    }

    #[test]
    fn cli_verify() {
        Cli::command().debug_assert();
    }
}
