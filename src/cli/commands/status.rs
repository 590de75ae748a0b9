use anyhow::Result;

use super::{report_store_error, report_transition_error, AppContext, Command};
use crate::complaints::{Complaint, ComplaintId, ComplaintStatus};
use crate::workflow::{ReadbackFailure, SetStatusOutcome};

pub struct AdvanceCommand {
    pub id: ComplaintId,
}

impl Command for AdvanceCommand {
    async fn execute(&self) -> Result<()> {
        let ctx = AppContext::load()?;
        let session = ctx.session().await?;
        let engine = match ctx.engine(&session).await {
            Ok(engine) => engine,
            Err(e) => {
                report_store_error("Could not open the record store", &e);
                return Err(e.into());
            }
        };

        match engine.advance_status(&self.id).await {
            Ok(Some(advance)) if advance.affected > 0 => {
                println!(
                    "⏭️  Complaint #{}: {} {} → {} {}",
                    advance.id,
                    advance.from.emoji(),
                    advance.from.label(),
                    advance.to.emoji(),
                    advance.to.label()
                );
                Ok(())
            }
            Ok(Some(advance)) => {
                report_not_updated(&advance.id);
                Ok(())
            }
            Ok(None) => {
                println!("ℹ️  Complaint #{} not found; nothing changed", self.id);
                Ok(())
            }
            Err(e) => {
                report_transition_error(&e);
                Err(e.into())
            }
        }
    }
}

/// The row exists but the write matched nothing, usually row-level security
fn report_not_updated(id: &ComplaintId) {
    println!("⚠️  Complaint #{id} was not updated (0 rows affected)");
    println!("   💡 Status changes need an account the store lets write this row");
}

/// How a confirmed read-back relates to the status that was written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Confirmation {
    Applied,
    /// Zero rows were written, so the read-back shows the untouched record
    NotWritten,
    /// Our write landed but a later one replaced it before the read-back
    Overtaken,
}

impl Confirmation {
    fn of(target: ComplaintStatus, complaint: &Complaint, affected: u64) -> Self {
        if affected == 0 {
            Confirmation::NotWritten
        } else if complaint.status != target {
            Confirmation::Overtaken
        } else {
            Confirmation::Applied
        }
    }
}

pub struct SetStatusCommand {
    pub id: ComplaintId,
    pub status: ComplaintStatus,
}

impl Command for SetStatusCommand {
    async fn execute(&self) -> Result<()> {
        let ctx = AppContext::load()?;
        let session = ctx.session().await?;
        let engine = match ctx.engine(&session).await {
            Ok(engine) => engine,
            Err(e) => {
                report_store_error("Could not open the record store", &e);
                return Err(e.into());
            }
        };

        println!("🎯 Setting complaint #{} to {}...", self.id, self.status.label());

        match engine.set_status(&self.id, self.status).await {
            Ok(SetStatusOutcome::Confirmed { complaint, affected }) => {
                match Confirmation::of(self.status, &complaint, affected) {
                    Confirmation::NotWritten => report_not_updated(&complaint.id),
                    confirmation => {
                        println!(
                            "✅ Complaint #{} is now {} {}",
                            complaint.id,
                            complaint.status.emoji(),
                            complaint.status.label()
                        );
                        if confirmation == Confirmation::Overtaken {
                            println!("   ℹ️  Someone else changed it in the meantime; their write won");
                        }
                    }
                }
                Ok(())
            }
            Ok(SetStatusOutcome::Unconfirmed { affected, failure, .. }) => {
                match failure {
                    ReadbackFailure::NotFound if affected == 0 => {
                        println!("ℹ️  Complaint #{} not found; nothing changed", self.id);
                    }
                    failure => {
                        println!("⚠️  Update sent ({affected} row(s)) but could not be confirmed: {failure}");
                        println!("   💡 Check with 'complaint-tracker show {}'", self.id);
                    }
                }
                Ok(())
            }
            Err(e) => {
                report_transition_error(&e);
                Err(e.into())
            }
        }
    }
}
