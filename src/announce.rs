use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use log::{info, Logger};

/// Where scheduled announcements go.
pub trait Announcer: Send + Sync {
    fn announce(&self, message: String) -> BoxFuture<()>;
}

/// Writes announcements to the log.
pub struct LogAnnouncer {
    logger: Arc<Logger>,
}

impl LogAnnouncer {
    pub fn new(logger: Arc<Logger>) -> Self {
        Self { logger }
    }
}

impl Announcer for LogAnnouncer {
    fn announce(&self, message: String) -> BoxFuture<()> {
        async move {
            info!(self.logger, "Announcement"; "message" => message);
        }
        .boxed()
    }
}
