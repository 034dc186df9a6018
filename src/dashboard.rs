use crate::filter::category_counts;
use crate::models::{ApplicationStatus, JobApplication, JobListing, PostingStatus, User};

const RECENT_APPLICATIONS: usize = 4;
const RECOMMENDED_JOBS: usize = 3;
const TOP_APPLICANTS: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct CandidateDashboard {
    pub applications_submitted: usize,
    pub interviews: usize,
    pub matches_found: usize,
    pub recent_applications: Vec<JobApplication>,
    pub recommended_jobs: Vec<JobListing>,
    pub profile_completion: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmployerDashboard {
    pub active_jobs: usize,
    pub total_applications: usize,
    pub shortlisted: usize,
    pub filled_positions: usize,
    pub recent_applications: Vec<JobApplication>,
    pub top_applicants: Vec<JobApplication>,
    /// Statuses that occur at least once, in track order.
    pub status_breakdown: Vec<(ApplicationStatus, usize)>,
}

/// Totals shown above an employer's postings list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostingSummary {
    pub active: usize,
    pub total_applications: u64,
    pub total_views: u64,
    pub drafts: usize,
}

/// Rough completeness score shown next to the candidate's profile.
pub fn profile_completion(user: &User, has_applications: bool) -> u8 {
    let mut completion: u32 = 30;
    if !user.email.trim().is_empty() {
        completion += 20;
    }
    if !user.full_name().is_empty() {
        completion += 20;
    }
    if user.phone.as_deref().is_some_and(|p| !p.trim().is_empty()) {
        completion += 15;
    }
    if has_applications {
        completion += 15;
    }
    completion.min(100) as u8
}

pub fn candidate_dashboard(
    user: &User,
    applications: &[JobApplication],
    jobs: &[JobListing],
) -> CandidateDashboard {
    let interviews = applications
        .iter()
        .filter(|a| {
            matches!(a.status, ApplicationStatus::Interviewed | ApplicationStatus::Offered)
        })
        .count();

    CandidateDashboard {
        applications_submitted: applications.len(),
        interviews,
        matches_found: jobs.len(),
        recent_applications: applications.iter().take(RECENT_APPLICATIONS).cloned().collect(),
        recommended_jobs: jobs.iter().take(RECOMMENDED_JOBS).cloned().collect(),
        profile_completion: profile_completion(user, !applications.is_empty()),
    }
}

pub fn employer_dashboard(jobs: &[JobListing], applications: &[JobApplication]) -> EmployerDashboard {
    let count_jobs = |status: PostingStatus| jobs.iter().filter(|j| j.status == status).count();

    let mut top_applicants = applications.to_vec();
    // Stable sort keeps backend order among equal scores.
    top_applicants.sort_by(|a, b| b.match_percentage.cmp(&a.match_percentage));
    top_applicants.truncate(TOP_APPLICANTS);

    let status_breakdown = category_counts(applications)
        .into_iter()
        .filter(|(_, count)| *count > 0)
        .collect();

    EmployerDashboard {
        active_jobs: count_jobs(PostingStatus::Active),
        total_applications: applications.len(),
        shortlisted: applications
            .iter()
            .filter(|a| a.status == ApplicationStatus::Shortlisted)
            .count(),
        filled_positions: count_jobs(PostingStatus::Filled),
        recent_applications: applications.iter().take(RECENT_APPLICATIONS).cloned().collect(),
        top_applicants,
        status_breakdown,
    }
}

pub fn posting_summary(jobs: &[JobListing]) -> PostingSummary {
    PostingSummary {
        active: jobs.iter().filter(|j| j.status == PostingStatus::Active).count(),
        total_applications: jobs.iter().map(|j| u64::from(j.applications_count)).sum(),
        total_views: jobs.iter().map(|j| u64::from(j.views_count)).sum(),
        drafts: jobs.iter().filter(|j| j.status == PostingStatus::Draft).count(),
    }
}
