use clap::{arg, command, Parser, Subcommand};

#[derive(Parser)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
    #[arg(short, long)]
    pub configuration_file: Option<String>,
    #[arg(short, long)]
    pub verbosity: Option<log::LevelFilter>,
}

#[derive(Subcommand)]
pub enum Command {
    /// stores a session obtained from an external credential exchange
    Login {
        /// the bearer token issued by the authentication service
        #[arg(long)]
        access_token: String,
        /// optional account email to keep alongside the token
        #[arg(long)]
        email: Option<String>,
        /// optional display name to keep alongside the token
        #[arg(long)]
        first_name: Option<String>,
    },
    /// clears the stored session
    Logout,
    /// fetches the authenticated user profile
    Profile,
    /// fetches the dashboard summary
    Dashboard,
    /// lists the user's past evaluations
    Evaluations {
        /// page number, starts at 1
        #[arg(long)]
        page: Option<u32>,
        /// page size
        #[arg(long)]
        limit: Option<u32>,
        /// sort order, "asc" or "desc"
        #[arg(long)]
        order_by: Option<String>,
    },
    /// lists the available assessments catalog
    Catalog {
        /// page number, starts at 1
        #[arg(long)]
        page: Option<u32>,
        /// page size
        #[arg(long)]
        limit: Option<u32>,
        /// sort order, "asc" or "desc"
        #[arg(long)]
        order_by: Option<String>,
    },
    /// fetches one assessment by its identifier
    Assessment { id: String },
    /// starts a credit purchase checkout
    Checkout { quantity: u32 },
    /// runs a diagnostic on the stored session
    SessionDiagnostic {
        /// show the token
        #[arg(long)]
        show_token: Option<bool>,
    },
}
