use anyhow::Result;

use super::{report_store_error, AppContext, Command};
use crate::complaints::ComplaintId;

pub struct ShowCommand {
    pub id: ComplaintId,
}

impl Command for ShowCommand {
    async fn execute(&self) -> Result<()> {
        let ctx = AppContext::load()?;
        let session = ctx.session().await?;
        let store = ctx.store(&session).await?;

        let complaint = match store.read_by_id(&self.id).await {
            Ok(Some(complaint)) => complaint,
            Ok(None) => {
                println!("❌ Complaint #{} not found", self.id);
                anyhow::bail!("complaint {} not found", self.id);
            }
            Err(e) => {
                report_store_error("Could not load complaint", &e);
                return Err(e.into());
            }
        };

        println!("📄 Complaint #{}: {}", complaint.id, complaint.title);
        println!("   {} Status: {}", complaint.status.emoji(), complaint.status.label());
        println!("   🏷️  Category: {}", complaint.category);
        println!("   {} Priority: {}", complaint.priority.emoji(), complaint.priority);
        if let Some(email) = &complaint.user_email {
            println!("   👤 Filed by: {email}");
        }
        if let Some(created_at) = complaint.created_at {
            println!("   🕒 Filed: {}", created_at.format("%Y-%m-%d %H:%M UTC"));
        }
        if !complaint.description.is_empty() {
            println!("   📄 Description: {}", complaint.description);
        }
        if let Some(url) = &complaint.image_url {
            println!("   🖼️  Evidence: {url}");
        }

        println!();
        println!("🕰️  STATUS TIMELINE");
        match store.status_history(&self.id).await {
            Ok(history) if history.is_empty() => println!("   No status changes yet"),
            Ok(history) => {
                for entry in history {
                    println!(
                        "   {} {} {}",
                        entry.changed_at.format("%Y-%m-%d %H:%M"),
                        entry.status.emoji(),
                        entry.status.label()
                    );
                }
            }
            // The record itself loaded; a missing timeline is not worth failing over
            Err(e) => println!("   ⚠️  Timeline unavailable: {e}"),
        }
        Ok(())
    }
}
