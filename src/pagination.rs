//! OFFSET / FETCH pagination with literal bounds.
//!
//! FileMaker won't accept bound parameters for `OFFSET` and `FETCH FIRST`, so
//! both bounds are inlined into the SQL text. They only ever come from
//! validated integers, and the sort column has to be on the caller's
//! allow-list, so nothing the caller types reaches the statement verbatim.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, warn};

use crate::store::dialect::{Dialect, SortDirection, Statement};
use crate::store::interface::Executor;
use crate::store::value::Row;

pub const DEFAULT_SORT_FIELD: &str = "id";
pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const DEFAULT_MAX_PAGE_SIZE: u64 = 500;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PageError {
    #[error("Page index must not be negative, got {0}")]
    NegativePage(i64),

    #[error("Page size must be positive, got {0}")]
    NonPositiveSize(i64),

    #[error("Parameter {name:?} must be an integer, got {value:?}")]
    NotAnInteger { name: String, value: String },

    #[error("Cannot sort by {0:?}")]
    UnknownSortField(String),

    #[error("Page {page} of size {size} is out of range")]
    OffsetOverflow { page: u64, size: u64 },
}

/// `"desc"` in any case sorts descending, anything else ascending.
pub fn parse_direction(direction: Option<&str>) -> SortDirection {
    match direction {
        Some(d) if d.trim().eq_ignore_ascii_case("desc") => SortDirection::Descending,
        _ => SortDirection::Ascending,
    }
}

fn parse_integer(name: &str, value: Option<&str>, default: i64) -> Result<i64, PageError> {
    match value.map(str::trim) {
        None | Some("") => Ok(default),
        Some(text) => text.parse::<i64>().map_err(|_| PageError::NotAnInteger {
            name: name.to_string(),
            value: text.to_string(),
        }),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    page: u64,
    size: u64,
    sort_field: String,
    direction: SortDirection,
}

impl PageRequest {
    /// Zero-based `page` of `size` rows, sorted by `id` ascending.
    pub fn new(page: i64, size: i64) -> Result<Self, PageError> {
        if page < 0 {
            return Err(PageError::NegativePage(page));
        }
        if size <= 0 {
            return Err(PageError::NonPositiveSize(size));
        }
        Ok(Self {
            page: page as u64,
            size: size as u64,
            sort_field: DEFAULT_SORT_FIELD.to_string(),
            direction: SortDirection::Ascending,
        })
    }

    /// Build a request from raw query parameters. Missing values fall back
    /// to page 0, `default_size` rows, sorted by `id` ascending.
    pub fn from_params_with_default_size(
        page: Option<&str>,
        size: Option<&str>,
        sort: Option<&str>,
        direction: Option<&str>,
        default_size: u64,
    ) -> Result<Self, PageError> {
        let default_size = i64::try_from(default_size).unwrap_or(i64::MAX);
        let request = Self::new(
            parse_integer("page", page, 0)?,
            parse_integer("size", size, default_size)?,
        )?;
        Ok(request.sorted_by(
            sort.unwrap_or(DEFAULT_SORT_FIELD),
            parse_direction(direction),
        ))
    }

    pub fn from_params(
        page: Option<&str>,
        size: Option<&str>,
        sort: Option<&str>,
        direction: Option<&str>,
    ) -> Result<Self, PageError> {
        Self::from_params_with_default_size(page, size, sort, direction, DEFAULT_PAGE_SIZE)
    }

    /// An empty field name keeps sorting by `id`.
    pub fn sorted_by(mut self, field: &str, direction: SortDirection) -> Self {
        let field = field.trim();
        self.sort_field = if field.is_empty() {
            DEFAULT_SORT_FIELD.to_string()
        } else {
            field.to_string()
        };
        self.direction = direction;
        self
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn sort_field(&self) -> &str {
        &self.sort_field
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    /// `page * size`, as long as the database can still represent it.
    pub fn offset(&self) -> Result<u64, PageError> {
        self.page
            .checked_mul(self.size)
            .filter(|offset| *offset <= i64::MAX as u64)
            .ok_or(PageError::OffsetOverflow {
                page: self.page,
                size: self.size,
            })
    }
}

/// The two statements needed for one page, plus the request they were
/// built for after clamping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagedQuery {
    pub rows: Statement<'static>,
    pub count: Statement<'static>,
    pub request: PageRequest,
}

impl PagedQuery {
    /// Render the page and count statements for `table`. The sort field has
    /// to be one of `allowed_columns` (compared case-insensitively), or the
    /// implicit `id`. Sizes above `max_size` are cut down to it.
    pub fn new(
        dialect: Dialect,
        table: &str,
        request: &PageRequest,
        allowed_columns: &[&str],
        max_size: u64,
    ) -> Result<Self, PageError> {
        let sort_field = allowed_columns
            .iter()
            .copied()
            .chain(std::iter::once(DEFAULT_SORT_FIELD))
            .find(|column| column.eq_ignore_ascii_case(&request.sort_field))
            .ok_or_else(|| PageError::UnknownSortField(request.sort_field.clone()))?;

        let mut request = request.clone();
        if request.size > max_size {
            warn!(
                "Requested page size {} exceeds maximum, using {max_size}",
                request.size
            );
            request.size = max_size;
        }
        request.sort_field = sort_field.to_string();

        let offset = request.offset()?;
        let rows = dialect.select_page(table, sort_field, request.direction, offset, request.size);
        let count = dialect.count(table);
        debug!("Page query: {rows}");

        Ok(Self {
            rows,
            count,
            request,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub content: Vec<Row>,
    pub total_elements: i64,
    pub total_pages: u64,
    pub number: u64,
    pub size: u64,
    pub number_of_elements: usize,
    pub first: bool,
    pub last: bool,
}

impl Page {
    pub fn new(content: Vec<Row>, total_elements: i64, request: &PageRequest) -> Self {
        let total_elements = total_elements.max(0);
        let total_pages = (total_elements as u64).div_ceil(request.size);
        let number = request.page;
        Self {
            number_of_elements: content.len(),
            content,
            total_elements,
            total_pages,
            number,
            size: request.size,
            first: number == 0,
            last: number + 1 >= total_pages,
        }
    }

    pub fn has_next(&self) -> bool {
        !self.last
    }

    pub fn is_last(&self) -> bool {
        self.last
    }
}

#[derive(Debug, Clone)]
pub struct LiteralPaginator {
    executor: Arc<dyn Executor>,
    default_size: u64,
    max_size: u64,
}

impl LiteralPaginator {
    pub fn new(executor: Arc<dyn Executor>) -> Self {
        Self {
            executor,
            default_size: DEFAULT_PAGE_SIZE,
            max_size: DEFAULT_MAX_PAGE_SIZE,
        }
    }

    /// Page size used when the request has none, and the largest one served.
    /// Both are at least one row.
    pub fn with_limits(mut self, default_size: u64, max_size: u64) -> Self {
        self.default_size = default_size.max(1);
        self.max_size = max_size.max(1);
        self
    }

    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    pub fn request(
        &self,
        page: Option<&str>,
        size: Option<&str>,
        sort: Option<&str>,
        direction: Option<&str>,
    ) -> Result<PageRequest, PageError> {
        PageRequest::from_params_with_default_size(page, size, sort, direction, self.default_size)
    }

    /// [`PagedQuery::new`] for the executor's dialect and the configured
    /// maximum size.
    pub fn build(
        &self,
        table: &str,
        request: &PageRequest,
        allowed_columns: &[&str],
    ) -> Result<PagedQuery, PageError> {
        PagedQuery::new(
            self.executor.dialect(),
            table,
            request,
            allowed_columns,
            self.max_size,
        )
    }

    /// Fetch one page of `table`. Invalid requests are errors; store
    /// failures are logged and come back as `Ok(None)`.
    pub async fn fetch_page(
        &self,
        table: &str,
        request: &PageRequest,
        allowed_columns: &[&str],
    ) -> Result<Option<Page>, PageError> {
        let query = self.build(table, request, allowed_columns)?;

        match self.executor.fetch_page(&query.rows, &query.count).await {
            Ok((rows, total)) => {
                debug!("Fetched {} rows of {total}", rows.len());
                Ok(Some(Page::new(rows, total, &query.request)))
            }
            Err(e) => {
                error!("Failed to fetch page {} of {table}: {e}", query.request.page);
                Ok(None)
            }
        }
    }
}
