//! Dashboard statistics
//!
//! Returned as raw JSON; chart rendering owns the shape.

use serde_json::Value;
use shared::permissions::Capability;

use super::Gateway;
use crate::error::ClientResult;
use crate::http::ApiRequest;
use crate::payload;

impl Gateway {
    /// Admin report (viewReports)
    pub async fn fetch_report(&self) -> ClientResult<Value> {
        self.guard(Capability::ViewReports)?;
        let body = self.send("fetch_report", ApiRequest::get("stats")).await?;
        Ok(payload::unwrap_data(body))
    }

    /// Platform-wide statistics (viewSuperAdminStats)
    pub async fn fetch_superadmin_stats(&self) -> ClientResult<Value> {
        self.guard(Capability::ViewSuperAdminStats)?;
        let body = self
            .send("fetch_superadmin_stats", ApiRequest::get("stats/superadmin"))
            .await?;
        Ok(payload::unwrap_data(body))
    }
}
