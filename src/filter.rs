use std::collections::BTreeMap;

use crate::error::{BoardError, BoardResult};
use crate::models::{
    ApplicationStatus, EmploymentType, ExperienceLevel, JobApplication, JobListing, PostingStatus,
};

/// Records that fall into one of a fixed set of categories (the filter tabs).
pub trait Categorized {
    type Category: Copy + Ord + std::fmt::Debug + 'static;

    fn categories() -> &'static [Self::Category];
    fn category(&self) -> Self::Category;
}

impl Categorized for JobApplication {
    type Category = ApplicationStatus;

    fn categories() -> &'static [ApplicationStatus] {
        &ApplicationStatus::ALL
    }

    fn category(&self) -> ApplicationStatus {
        self.status
    }
}

impl Categorized for JobListing {
    type Category = EmploymentType;

    fn categories() -> &'static [EmploymentType] {
        &EmploymentType::ALL
    }

    fn category(&self) -> EmploymentType {
        self.employment_type
    }
}

/// One of the signed-in employer's own job postings. Postings are grouped by
/// their lifecycle status instead of by employment type.
#[derive(Debug, Clone, PartialEq)]
pub struct Posting(pub JobListing);

impl Categorized for Posting {
    type Category = PostingStatus;

    fn categories() -> &'static [PostingStatus] {
        &PostingStatus::ALL
    }

    fn category(&self) -> PostingStatus {
        self.0.status
    }
}

pub trait RecordFilter<T> {
    fn matches(&self, record: &T) -> bool;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobFilter {
    pub search_text: String,
    pub location: String,
    pub employment_type: Option<EmploymentType>,
    pub experience_level: Option<ExperienceLevel>,
}

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

impl RecordFilter<JobListing> for JobFilter {
    fn matches(&self, job: &JobListing) -> bool {
        let search = self.search_text.trim().to_lowercase();
        let matches_search = search.is_empty()
            || contains_ci(&job.title, &search)
            || contains_ci(&job.company, &search)
            || contains_ci(&job.description, &search);

        let location = self.location.trim().to_lowercase();
        let matches_location = location.is_empty() || contains_ci(&job.location, &location);

        let matches_type = self.employment_type.is_none_or(|t| t == job.employment_type);
        let matches_level = self.experience_level.is_none_or(|l| l == job.experience_level);

        matches_search && matches_location && matches_type && matches_level
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostingFilter {
    /// Matched against title and description only.
    pub search_text: String,
    pub status: Option<PostingStatus>,
}

impl RecordFilter<Posting> for PostingFilter {
    fn matches(&self, posting: &Posting) -> bool {
        let job = &posting.0;
        let search = self.search_text.trim().to_lowercase();
        let matches_search =
            search.is_empty() || contains_ci(&job.title, &search) || contains_ci(&job.description, &search);
        matches_search && self.status.is_none_or(|s| s == job.status)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplicationFilter {
    pub status: Option<ApplicationStatus>,
}

impl RecordFilter<JobApplication> for ApplicationFilter {
    fn matches(&self, application: &JobApplication) -> bool {
        self.status.is_none_or(|s| s == application.status)
    }
}

/// Parse a CLI filter value where `""` and `"any"` mean no constraint.
pub fn parse_choice<T>(raw: Option<&str>) -> BoardResult<Option<T>>
where
    T: std::str::FromStr<Err = BoardError>,
{
    match raw.map(str::trim) {
        None => Ok(None),
        Some(s) if s.is_empty() || s.eq_ignore_ascii_case("any") || s.eq_ignore_ascii_case("all") => Ok(None),
        Some(s) => s.parse().map(Some),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PagedResult<T: Categorized> {
    pub page_items: Vec<T>,
    pub total_filtered_count: usize,
    pub total_pages: usize,
    /// Counts over every record passed in, not just the filtered ones.
    pub category_counts: BTreeMap<T::Category, usize>,
}

/// Count records per category. Every category is present, zero or not.
pub fn category_counts<T: Categorized>(records: &[T]) -> BTreeMap<T::Category, usize> {
    let mut counts: BTreeMap<T::Category, usize> =
        T::categories().iter().map(|c| (*c, 0)).collect();
    for record in records {
        *counts.entry(record.category()).or_insert(0) += 1;
    }
    counts
}

/// Narrow `records` with `filter` and return page `page` (1-based) of the
/// result. A page past the end is empty rather than an error; a zero page
/// or page size is rejected.
pub fn filter_and_paginate<T, F>(
    records: &[T],
    filter: &F,
    page: usize,
    page_size: usize,
) -> BoardResult<PagedResult<T>>
where
    T: Categorized + Clone,
    F: RecordFilter<T>,
{
    if page == 0 {
        return Err(BoardError::InvalidArgument("page must be at least 1".to_string()));
    }
    if page_size == 0 {
        return Err(BoardError::InvalidArgument("page size must be at least 1".to_string()));
    }

    let filtered: Vec<&T> = records.iter().filter(|r| filter.matches(r)).collect();
    let total_filtered_count = filtered.len();
    let total_pages = total_filtered_count.div_ceil(page_size);

    let start = (page - 1).saturating_mul(page_size);
    let page_items = filtered
        .into_iter()
        .skip(start)
        .take(page_size)
        .cloned()
        .collect();

    Ok(PagedResult {
        page_items,
        total_filtered_count,
        total_pages,
        category_counts: category_counts(records),
    })
}
