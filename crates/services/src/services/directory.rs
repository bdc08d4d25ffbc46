//! Instance directory: the fetched list of configured instances with
//! derived status styling, plus the row-level delete and re-check
//! actions.

use std::sync::Arc;

use gateway::{
    GatewayError, InstanceApi,
    models::{Instance, InstanceStatus},
};
use tracing::warn;
use utils::msg::{Notification, Notifier};

/// Visual treatment for a row's status tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStyle {
    Success,
    Error,
    Neutral,
}

/// `online` renders as a success tag, `offline` as an error tag,
/// everything else stays neutral.
pub fn status_style(status: InstanceStatus) -> RowStyle {
    match status {
        InstanceStatus::Online => RowStyle::Success,
        InstanceStatus::Offline => RowStyle::Error,
        InstanceStatus::Unknown | InstanceStatus::Error => RowStyle::Neutral,
    }
}

pub struct Directory<A: ?Sized> {
    api: Arc<A>,
    notifier: Arc<dyn Notifier>,
    rows: Vec<Instance>,
}

impl<A: InstanceApi + ?Sized> Directory<A> {
    pub fn new(api: Arc<A>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            notifier,
            rows: Vec::new(),
        }
    }

    /// Rows in backend insertion order, as of the last refresh.
    pub fn rows(&self) -> &[Instance] {
        &self.rows
    }

    /// Re-fetch the instance list. On failure the previous rows stay in
    /// place and the error is handed back for the caller to render.
    pub async fn refresh(&mut self) -> Result<(), GatewayError> {
        self.rows = self.api.list_instances().await?;
        Ok(())
    }

    /// Delete one instance. A successful delete removes the row; a
    /// failed delete leaves it in place and surfaces one notification.
    pub async fn delete(&mut self, id: i64) -> bool {
        match self.api.delete_instance(id).await {
            Ok(()) => {
                self.rows.retain(|row| row.id != id);
                self.notifier
                    .notify(Notification::success("Instance deleted"));
                true
            }
            Err(e) => {
                warn!(instance_id = id, error = %e, "instance deletion failed");
                // An unauthorized response already went through the session
                // handler; a local notification would double-report it.
                if !e.is_unauthorized() {
                    self.notifier
                        .notify(Notification::error(format!("Failed to delete instance: {e}")));
                }
                false
            }
        }
    }

    /// Re-check one instance's reachability through the backend and fold
    /// the refreshed record back into the view.
    pub async fn check(&mut self, id: i64) -> bool {
        match self.api.check_instance(id).await {
            Ok(updated) => {
                self.notifier.notify(Notification::info(format!(
                    "{} is {}",
                    updated.name, updated.status
                )));
                match self.rows.iter_mut().find(|row| row.id == id) {
                    Some(row) => *row = updated,
                    None => self.rows.push(updated),
                }
                true
            }
            Err(e) => {
                warn!(instance_id = id, error = %e, "instance re-check failed");
                if !e.is_unauthorized() {
                    self.notifier
                        .notify(Notification::error(format!("Failed to check instance: {e}")));
                }
                false
            }
        }
    }
}
