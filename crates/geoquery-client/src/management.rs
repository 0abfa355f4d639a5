//! Query service bookkeeping endpoints

use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt;

/// Largest page the instrumentation endpoint serves
pub const MAX_PAGE_SIZE: u32 = 500;

/// Page size used when none is given
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Selects a page of past queries
///
/// Tenant admins see every query in their tenant; other identities only see their own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstrumentationFilter {
    pub dataset_id: Option<String>,
    pub identity_id: Option<String>,
    /// Only queries created before this instant; the service defaults to now
    pub before: Option<DateTime<Utc>>,
    pub page_size: Option<u32>,
}

impl InstrumentationFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dataset(mut self, dataset_id: impl Into<String>) -> Self {
        self.dataset_id = Some(dataset_id.into());
        self
    }

    pub fn identity(mut self, identity_id: impl Into<String>) -> Self {
        self.identity_id = Some(identity_id.into());
        self
    }

    pub fn before(mut self, before: DateTime<Utc>) -> Self {
        self.before = Some(before);
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Page size actually requested, clamped to `1..=MAX_PAGE_SIZE`
    pub fn effective_page_size(&self) -> u32 {
        self.page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    pub(crate) fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::with_capacity(4);
        if let Some(identity_id) = &self.identity_id {
            params.push(("identityId", identity_id.clone()));
        }
        if let Some(dataset_id) = &self.dataset_id {
            params.push(("datasetId", dataset_id.clone()));
        }
        if let Some(before) = &self.before {
            params.push(("before", before.to_rfc3339_opts(SecondsFormat::Millis, true)));
        }
        params.push(("pageSize", self.effective_page_size().to_string()));
        params
    }
}

/// Destructive dataset operations offered by the query service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManageOperation {
    /// Remove every record from the dataset
    Truncate,
}

impl ManageOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ManageOperation::Truncate => "truncate",
        }
    }
}

impl fmt::Display for ManageOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_default_params() {
        let params = InstrumentationFilter::new().to_params();
        assert_eq!(params, vec![("pageSize", "100".to_string())]);
    }

    #[test]
    fn test_page_size_is_capped() {
        assert_eq!(InstrumentationFilter::new().page_size(2000).effective_page_size(), 500);
        assert_eq!(InstrumentationFilter::new().page_size(0).effective_page_size(), 1);
        assert_eq!(InstrumentationFilter::new().page_size(25).effective_page_size(), 25);
    }

    #[test]
    fn test_all_params() {
        let before = Utc.with_ymd_and_hms(2024, 3, 1, 8, 30, 0).unwrap();
        let params = InstrumentationFilter::new()
            .dataset("ds-1")
            .identity("user-9")
            .before(before)
            .page_size(10)
            .to_params();

        assert_eq!(
            params,
            vec![
                ("identityId", "user-9".to_string()),
                ("datasetId", "ds-1".to_string()),
                ("before", "2024-03-01T08:30:00.000Z".to_string()),
                ("pageSize", "10".to_string()),
            ]
        );
    }
}
