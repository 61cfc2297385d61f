//! The seam between tools and the caller side of the coordination protocol.

use async_trait::async_trait;
use coordination::{Caller, Request, StatusRecord};

/// Runs a request and returns its final status.
#[async_trait]
pub trait RequestRunner: Send + Sync {
    async fn run(&self, request: Request) -> StatusRecord;
}

#[async_trait]
impl RequestRunner for Caller {
    async fn run(&self, request: Request) -> StatusRecord {
        Caller::run(self, &request).await
    }
}
