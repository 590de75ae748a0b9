use anyhow::Result;

use super::{print_complaint_line, report_session_error, report_store_error, AppContext, Command};
use crate::complaints::{ComplaintStatus, ComplaintView, StatusFilter};

/// Resident listing (`list`) and the admin dashboard (`admin`)
pub struct ListCommand {
    pub status: Option<ComplaintStatus>,
    pub search: Option<String>,
    pub admin: bool,
}

impl Command for ListCommand {
    async fn execute(&self) -> Result<()> {
        let ctx = AppContext::load()?;
        let session = ctx.session().await?;

        if self.admin {
            if let Err(e) = session.require_admin() {
                report_session_error(&e);
                return Err(e.into());
            }
        }

        let store = ctx.store(&session).await?;
        let mut view = if self.admin {
            ComplaintView::all()
        } else {
            ComplaintView::for_session(&session)
        };

        let loaded = async {
            view.set_filter(StatusFilter::from(self.status), store.as_ref())
                .await?;
            if let Some(search) = &self.search {
                view.set_search(search.clone(), store.as_ref()).await?;
            }
            Ok::<_, crate::store::StoreError>(())
        }
        .await;
        if let Err(e) = loaded {
            report_store_error("Could not load complaints", &e);
            return Err(e.into());
        }

        if self.admin {
            let stats = view.stats();
            println!("🗂️  ALL COMPLAINTS");
            println!(
                "   📊 Total: {} | 🔴 Open: {} | 🔵 In progress: {} | 🟢 Resolved: {}",
                stats.total, stats.open, stats.in_progress, stats.resolved
            );
        } else {
            println!("📋 MY COMPLAINTS");
        }
        println!();

        let visible = view.visible();
        if visible.is_empty() {
            if view.complaints().is_empty() {
                println!("   No complaints yet");
                println!("   💡 File one with: complaint-tracker submit --title ... --description ...");
            } else {
                println!("   Nothing matches the current filter");
            }
            return Ok(());
        }

        for complaint in &visible {
            print_complaint_line(complaint);
        }

        if visible.len() < view.complaints().len() {
            println!();
            println!(
                "   Showing {} of {} complaints",
                visible.len(),
                view.complaints().len()
            );
        }
        Ok(())
    }
}
