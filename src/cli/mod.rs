use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::complaints::ComplaintStatus;
use crate::priority::Priority;

pub mod commands;

#[derive(Parser)]
#[command(name = "complaint-tracker")]
#[command(version)]
#[command(about = "File complaints and walk them through OPEN, IN_PROGRESS and RESOLVED")]
#[command(long_about = "complaint-tracker lets residents file complaints with photo evidence and lets \
                       administrators move them through a fixed status cycle. Get started with \
                       'complaint-tracker login' and then 'complaint-tracker submit'.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in with email and password
    Login {
        #[arg(long, help = "Account email address")]
        email: String,
        /// Password (falls back to COMPLAINT_TRACKER_PASSWORD)
        #[arg(long, env = "COMPLAINT_TRACKER_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long, env = "COMPLAINT_TRACKER_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        /// Register as an administrator
        #[arg(long, help = "Store role=admin in the account metadata")]
        admin: bool,
    },
    /// Sign out and forget the saved session
    Logout,
    /// Show who is signed in
    Whoami,
    /// File a new complaint
    Submit {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        /// Category (suggested from the text when omitted)
        #[arg(long, help = "General, Water, Electricity, Road, Sanitation, Internet")]
        category: Option<String>,
        /// Priority (suggested from the text when omitted)
        #[arg(long, help = "Low, Medium or High")]
        priority: Option<Priority>,
        /// Photo to attach as evidence
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// Suggest a category and priority for a complaint text
    Suggest {
        /// Complaint title and/or description
        text: Vec<String>,
    },
    /// List your complaints
    List {
        /// Only show complaints in this status
        #[arg(long, help = "OPEN, IN_PROGRESS or RESOLVED")]
        status: Option<ComplaintStatus>,
        /// Case-insensitive title search
        #[arg(long)]
        search: Option<String>,
    },
    /// List every complaint with statistics (administrators only)
    Admin {
        #[arg(long, help = "OPEN, IN_PROGRESS or RESOLVED")]
        status: Option<ComplaintStatus>,
        #[arg(long)]
        search: Option<String>,
    },
    /// Show one complaint and its status timeline
    Show {
        id: String,
    },
    /// Move a complaint to the next status in the cycle
    Advance {
        id: String,
    },
    /// Set a complaint to a specific status
    SetStatus {
        id: String,
        #[arg(help = "OPEN, IN_PROGRESS or RESOLVED")]
        status: ComplaintStatus,
    },
}
