use anyhow::Result;
use clap::Parser;

use complaint_tracker::cli::commands::account::{
    LoginCommand, LogoutCommand, SignupCommand, WhoamiCommand,
};
use complaint_tracker::cli::commands::list::ListCommand;
use complaint_tracker::cli::commands::show::ShowCommand;
use complaint_tracker::cli::commands::status::{AdvanceCommand, SetStatusCommand};
use complaint_tracker::cli::commands::submit::{SubmitCommand, SuggestCommand};
use complaint_tracker::cli::commands::{show_getting_started, Command};
use complaint_tracker::cli::{Cli, Commands};
use complaint_tracker::complaints::{ComplaintId, SubmissionForm};
use complaint_tracker::config::{config, ComplaintTrackerConfig};
use complaint_tracker::observability::store_metrics;
use complaint_tracker::telemetry::init_telemetry;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // A broken config still gets logging; the command reports the config error itself
    let observability = config()
        .map(|c| c.observability.clone())
        .unwrap_or_else(|_| ComplaintTrackerConfig::default().observability);
    init_telemetry(&observability)?;

    let result = tokio::runtime::Runtime::new()?.block_on(async {
        match cli.command {
            None => show_getting_started().await,
            Some(Commands::Login { email, password }) => {
                LoginCommand { email, password }.execute().await
            }
            Some(Commands::Signup {
                email,
                password,
                first_name,
                last_name,
                admin,
            }) => {
                SignupCommand {
                    email,
                    password,
                    first_name,
                    last_name,
                    admin,
                }
                .execute()
                .await
            }
            Some(Commands::Logout) => LogoutCommand.execute().await,
            Some(Commands::Whoami) => WhoamiCommand.execute().await,
            Some(Commands::Submit {
                title,
                description,
                category,
                priority,
                image,
            }) => {
                let form = SubmissionForm {
                    title,
                    description,
                    category,
                    priority,
                    image,
                };
                SubmitCommand { form }.execute().await
            }
            Some(Commands::Suggest { text }) => {
                SuggestCommand {
                    text: text.join(" "),
                }
                .execute()
                .await
            }
            Some(Commands::List { status, search }) => {
                ListCommand {
                    status,
                    search,
                    admin: false,
                }
                .execute()
                .await
            }
            Some(Commands::Admin { status, search }) => {
                ListCommand {
                    status,
                    search,
                    admin: true,
                }
                .execute()
                .await
            }
            Some(Commands::Show { id }) => {
                ShowCommand {
                    id: ComplaintId::from(id),
                }
                .execute()
                .await
            }
            Some(Commands::Advance { id }) => {
                AdvanceCommand {
                    id: ComplaintId::from(id),
                }
                .execute()
                .await
            }
            Some(Commands::SetStatus { id, status }) => {
                SetStatusCommand {
                    id: ComplaintId::from(id),
                    status,
                }
                .execute()
                .await
            }
        }
    });

    store_metrics().log_stats();
    result
}
