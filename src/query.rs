//! List Queries
//!
//! Paging and sort parameters for list endpoints plus the compact `qry`
//! filter language: `value.field` terms joined with `+`, range terms written
//! as `from.to.field`. Filters are built as `SearchFilter` values and only
//! turned into a string by `SearchFilter::encode`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_ROWS_PER_PAGE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    /// Table sort order: 1 ascending, -1 descending, anything else unsorted
    pub fn from_table(order: i32) -> Option<Self> {
        match order {
            1 => Some(SortOrder::Asc),
            -1 => Some(SortOrder::Desc),
            _ => None,
        }
    }
}

// ========================
// Filter language
// ========================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Exact(String),
    Range { from: String, to: String },
}

impl FilterValue {
    /// `from-to` becomes a range; anything else matches exactly
    pub fn parse(raw: &str) -> Self {
        match raw.split_once('-') {
            Some((from, to)) => FilterValue::Range {
                from: from.trim().to_string(),
                to: to.split('-').next().unwrap_or_default().trim().to_string(),
            },
            None => FilterValue::Exact(raw.to_string()),
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            FilterValue::Exact(value) => value.trim().is_empty(),
            FilterValue::Range { from, to } => from.trim().is_empty() && to.trim().is_empty(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterTerm {
    pub field: String,
    pub value: FilterValue,
}

impl FilterTerm {
    fn encode(&self) -> String {
        match &self.value {
            FilterValue::Exact(value) => format!("{}.{}", value.trim(), self.field),
            FilterValue::Range { from, to } => format!("{}.{}.{}", from, to, self.field),
        }
    }
}

/// Predefined filter picked from a table's filter menu
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOption {
    pub label: String,
    pub value: String,
    pub column: String,
}

/// Ordered set of filter terms, one per field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    terms: Vec<FilterTerm>,
}

impl SearchFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exact-match terms in iteration order
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        pairs
            .into_iter()
            .fold(Self::new(), |filter, (field, value)| filter.with(field, value))
    }

    /// Terms from selected filter options, ranges detected by `-`
    pub fn from_filter_options(options: &[FilterOption]) -> Self {
        let mut filter = Self::new();
        for option in options {
            filter.set_value(&option.column, FilterValue::parse(&option.value));
        }
        filter
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        let field = field.into();
        self.set_value(&field, FilterValue::Exact(value.into()));
        self
    }

    pub fn with_range(
        mut self,
        field: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        let field = field.into();
        self.set_value(
            &field,
            FilterValue::Range {
                from: from.into(),
                to: to.into(),
            },
        );
        self
    }

    /// Replace the term for `field` in place, or append it
    pub fn set_value(&mut self, field: &str, value: FilterValue) {
        match self.terms.iter_mut().find(|t| t.field == field) {
            Some(term) => term.value = value,
            None => self.terms.push(FilterTerm {
                field: field.to_string(),
                value,
            }),
        }
    }

    pub fn clear_field(&mut self, field: &str) {
        self.terms.retain(|t| t.field != field);
    }

    pub fn terms(&self) -> &[FilterTerm] {
        &self.terms
    }

    /// True when every term is blank
    pub fn is_empty(&self) -> bool {
        self.terms.iter().all(|t| t.value.is_blank())
    }

    /// Compact `qry` string; blank terms are skipped
    pub fn encode(&self) -> String {
        self.terms
            .iter()
            .filter(|t| !t.value.is_blank())
            .map(FilterTerm::encode)
            .collect::<Vec<_>>()
            .join("+")
    }
}

impl fmt::Display for SearchFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

// ========================
// Query parameters
// ========================

/// Parameters understood by list endpoints
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pub skip: Option<u32>,
    pub top: Option<u32>,
    pub column: Option<String>,
    pub sort: Option<SortOrder>,
    pub qry: Option<String>,
    /// Extra selector, e.g. contact category id
    pub param: Option<String>,
    pub total: bool,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, skip: u32, top: u32) -> Self {
        self.skip = Some(skip);
        self.top = Some(top);
        self
    }

    pub fn sorted_by(mut self, column: impl Into<String>, order: Option<SortOrder>) -> Self {
        self.column = Some(column.into());
        self.sort = order;
        self
    }

    /// Advanced search; an empty filter leaves `qry` untouched
    pub fn with_filter(mut self, filter: &SearchFilter) -> Self {
        let encoded = filter.encode();
        if !encoded.is_empty() {
            self.qry = Some(encoded);
        }
        self
    }

    /// Global search text, replacing any advanced filter when non-empty
    pub fn with_search(mut self, text: &str) -> Self {
        if !text.trim().is_empty() {
            self.qry = Some(text.trim().to_string());
        }
        self
    }

    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        self.param = Some(param.into());
        self
    }

    pub fn with_total(mut self) -> Self {
        self.total = true;
        self
    }

    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(param) = &self.param {
            pairs.push(("param".to_string(), param.clone()));
        }
        if let Some(sort) = self.sort {
            pairs.push(("type".to_string(), sort.as_str().to_string()));
        }
        if let Some(qry) = &self.qry {
            pairs.push(("qry".to_string(), qry.clone()));
        }
        if let Some(column) = &self.column {
            pairs.push(("column".to_string(), column.clone()));
        }
        if let Some(skip) = self.skip {
            pairs.push(("skip".to_string(), skip.to_string()));
        }
        if let Some(top) = self.top {
            pairs.push(("top".to_string(), top.to_string()));
        }
        if self.total {
            pairs.push(("total".to_string(), "1".to_string()));
        }
        pairs
    }
}

/// Paging and sort state of a data table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableState {
    #[serde(default)]
    pub first: u32,
    #[serde(default)]
    pub rows: u32,
    #[serde(default)]
    pub page: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i32>,
}

impl Default for TableState {
    fn default() -> Self {
        Self::initial(DEFAULT_ROWS_PER_PAGE)
    }
}

impl TableState {
    pub fn initial(rows_per_page: u32) -> Self {
        Self {
            first: 0,
            rows: rows_per_page,
            page: 0,
            column: None,
            sort_field: None,
            sort_order: None,
        }
    }

    /// Stored state with zero or empty fields falling back to `initial`
    pub fn or_initial(&self, initial: &TableState) -> TableState {
        TableState {
            first: if self.first > 0 { self.first } else { initial.first },
            rows: if self.rows > 0 { self.rows } else { initial.rows },
            page: if self.page > 0 { self.page } else { initial.page },
            column: self
                .column
                .clone()
                .filter(|c| !c.is_empty())
                .or_else(|| initial.column.clone()),
            sort_field: self
                .sort_field
                .clone()
                .filter(|c| !c.is_empty())
                .or_else(|| initial.sort_field.clone()),
            sort_order: self
                .sort_order
                .filter(|o| *o != 0)
                .or(initial.sort_order),
        }
    }

    pub fn to_query_params(&self) -> QueryParams {
        let mut params = QueryParams::new().page(self.first, self.rows);
        params.sort = self.sort_order.and_then(SortOrder::from_table);
        params.column = self.sort_field.clone().filter(|f| !f.is_empty());
        params
    }
}
