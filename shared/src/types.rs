//! Common types used across the platform

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Fixed number of records per page on every list endpoint
pub const PAGE_SIZE: u32 = 20;

/// Pagination parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: PAGE_SIZE,
        }
    }
}

impl Pagination {
    /// Build pagination for a 1-based page number; page 0 is treated as page 1
    pub fn for_page(page: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: PAGE_SIZE,
        }
    }

    /// Row offset of the first record on this page
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.per_page)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }
}

/// Paginated response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, pagination: Pagination, total_items: u64) -> Self {
        Self {
            data,
            pagination: PaginationMeta::new(pagination, total_items),
        }
    }
}

/// Pagination metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaginationMeta {
    pub page: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub total_pages: u32,
}

impl PaginationMeta {
    pub fn new(pagination: Pagination, total_items: u64) -> Self {
        let per_page = u64::from(pagination.per_page.max(1));
        let total_pages = total_items.div_ceil(per_page);
        Self {
            page: pagination.page,
            per_page: pagination.per_page,
            total_items,
            total_pages: u32::try_from(total_pages).unwrap_or(u32::MAX),
        }
    }
}

/// Inclusive calendar date range for report queries
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Half-open UTC timestamp bounds: `[start 00:00, end + 1 day 00:00)`.
    ///
    /// `None` when the day after `end` is past the last representable date.
    pub fn bounds(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let start = self.start.and_time(NaiveTime::MIN).and_utc();
        let end = self.end.checked_add_signed(Duration::days(1))?.and_time(NaiveTime::MIN).and_utc();
        Some((start, end))
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.bounds().is_some_and(|(start, end)| at >= start && at < end)
    }

    /// Resolve report query parameters into a filter range.
    ///
    /// `total` disables date filtering. Filtering only applies when a start
    /// date is given; the end date then defaults to `today`.
    pub fn resolve(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        total: bool,
        today: NaiveDate,
    ) -> Option<Self> {
        if total {
            return None;
        }
        start.map(|start| Self::new(start, end.unwrap_or(today)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_offset() {
        assert_eq!(Pagination::for_page(None).offset(), 0);
        assert_eq!(Pagination::for_page(Some(0)).offset(), 0);
        assert_eq!(Pagination::for_page(Some(3)).offset(), 40);
        assert_eq!(Pagination::for_page(Some(3)).limit(), 20);
    }

    #[test]
    fn test_total_pages_rounds_up() {
        let meta = PaginationMeta::new(Pagination::default(), 41);
        assert_eq!(meta.total_pages, 3);
        assert_eq!(PaginationMeta::new(Pagination::default(), 0).total_pages, 0);
        assert_eq!(PaginationMeta::new(Pagination::default(), 20).total_pages, 1);
    }

    #[test]
    fn test_date_range_is_inclusive_of_end_day() {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
        );
        let last_minute = NaiveDate::from_ymd_opt(2024, 3, 31)
            .unwrap()
            .and_hms_opt(23, 59, 0)
            .unwrap()
            .and_utc();
        let next_day = NaiveDate::from_ymd_opt(2024, 4, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc();
        assert!(range.contains(last_minute));
        assert!(!range.contains(next_day));
    }

    #[test]
    fn test_last_representable_day_has_no_bounds() {
        let range = DateRange::new(NaiveDate::MIN, NaiveDate::MAX);
        assert_eq!(range.bounds(), None);
        assert!(!range.contains(Utc::now()));

        let day_before = NaiveDate::MAX.pred_opt().unwrap();
        assert!(DateRange::new(day_before, day_before).bounds().is_some());
    }

    #[test]
    fn test_resolve_report_range() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let start = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();

        assert_eq!(DateRange::resolve(Some(start), Some(end), false, today), Some(DateRange::new(start, end)));
        assert_eq!(DateRange::resolve(Some(start), None, false, today), Some(DateRange::new(start, today)));
        assert_eq!(DateRange::resolve(None, Some(end), false, today), None);
        assert_eq!(DateRange::resolve(Some(start), Some(end), true, today), None);
    }
}
