//! List request descriptor.

use std::collections::BTreeMap;
use url::form_urlencoded;

use crate::model::{Column, SortDirection};

/// Everything the list endpoint needs to produce one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub page: u32,
    pub size: u32,
    pub sort_by: Column,
    pub sort_direction: SortDirection,
    /// Only non-empty values are sent.
    pub filters: BTreeMap<Column, String>,
}

impl ListQuery {
    /// `page=..&size=..&sortBy=..&sortDirection=..` followed by one
    /// `{column}Filter` pair per active filter.
    pub fn query_string(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        serializer
            .append_pair("page", &self.page.to_string())
            .append_pair("size", &self.size.to_string())
            .append_pair("sortBy", self.sort_by.as_str())
            .append_pair("sortDirection", self.sort_direction.as_str());

        for (column, value) in &self.filters {
            if !value.is_empty() {
                serializer.append_pair(&column.filter_param(), value);
            }
        }

        serializer.finish()
    }

    pub fn path(&self) -> String {
        format!("/all?{}", self.query_string())
    }
}
