//! Shared query parameter types for API handlers.

use serde::Deserialize;

use fiscal_core::error::CoreError;
use fiscal_core::filter::StatusFilter;
use fiscal_core::registry::ListQuery;

/// `?search=&status=` for device and operator lists.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub search: Option<String>,
    pub status: Option<String>,
}

impl ListParams {
    /// Parse into a typed query. Unknown status values are a validation error.
    pub fn into_query<S>(self) -> Result<ListQuery<S>, CoreError>
    where
        S: std::str::FromStr<Err = CoreError>,
    {
        Ok(ListQuery {
            status: StatusFilter::parse(self.status.as_deref())?,
            search: self.search.unwrap_or_default(),
        })
    }
}

/// `?search=&role=` for the user list.
#[derive(Debug, Default, Deserialize)]
pub struct UserListParams {
    pub search: Option<String>,
    pub role: Option<String>,
}

impl UserListParams {
    pub fn into_query(self) -> Result<ListQuery<fiscal_core::roles::Role>, CoreError> {
        ListParams {
            search: self.search,
            status: self.role,
        }
        .into_query()
    }
}

/// `?limit=` for history listings.
#[derive(Debug, Deserialize)]
pub struct LimitParams {
    pub limit: Option<usize>,
}

/// `?top=` for the dashboard alert list.
#[derive(Debug, Deserialize)]
pub struct DashboardParams {
    pub top: Option<usize>,
}
