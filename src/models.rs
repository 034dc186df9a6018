use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::BoardError;

/// Where an application stands. The first five variants form the status
/// track in order; `Rejected` sits off the track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Reviewed,
    Shortlisted,
    Interviewed,
    Offered,
    Rejected,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 6] = [
        ApplicationStatus::Pending,
        ApplicationStatus::Reviewed,
        ApplicationStatus::Shortlisted,
        ApplicationStatus::Interviewed,
        ApplicationStatus::Offered,
        ApplicationStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Reviewed => "reviewed",
            ApplicationStatus::Shortlisted => "shortlisted",
            ApplicationStatus::Interviewed => "interviewed",
            ApplicationStatus::Offered => "offered",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "Pending",
            ApplicationStatus::Reviewed => "Reviewed",
            ApplicationStatus::Shortlisted => "Shortlisted",
            ApplicationStatus::Interviewed => "Interviewed",
            ApplicationStatus::Offered => "Offered",
            ApplicationStatus::Rejected => "Rejected",
        }
    }

    /// Position on the status track, `None` for `Rejected`.
    pub fn track_position(&self) -> Option<usize> {
        match self {
            ApplicationStatus::Pending => Some(0),
            ApplicationStatus::Reviewed => Some(1),
            ApplicationStatus::Shortlisted => Some(2),
            ApplicationStatus::Interviewed => Some(3),
            ApplicationStatus::Offered => Some(4),
            ApplicationStatus::Rejected => None,
        }
    }

    /// Backend boundary parse: a missing value is `Pending`, an unknown one
    /// is `Pending` too but gets logged since the backend broke its contract.
    pub fn lenient(raw: Option<&str>) -> Self {
        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            None => ApplicationStatus::Pending,
            Some(s) => s.parse().unwrap_or_else(|err: BoardError| {
                tracing::warn!(raw = s, %err, "treating application as pending");
                ApplicationStatus::Pending
            }),
        }
    }
}

impl FromStr for ApplicationStatus {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(ApplicationStatus::Pending),
            "reviewed" => Ok(ApplicationStatus::Reviewed),
            "shortlisted" => Ok(ApplicationStatus::Shortlisted),
            "interviewed" => Ok(ApplicationStatus::Interviewed),
            "offered" => Ok(ApplicationStatus::Offered),
            "rejected" => Ok(ApplicationStatus::Rejected),
            _ => Err(BoardError::UnrecognizedStatus(s.to_string())),
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmploymentType {
    #[default]
    FullTime,
    PartTime,
    Contract,
    Internship,
}

impl EmploymentType {
    pub const ALL: [EmploymentType; 4] = [
        EmploymentType::FullTime,
        EmploymentType::PartTime,
        EmploymentType::Contract,
        EmploymentType::Internship,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EmploymentType::FullTime => "full-time",
            EmploymentType::PartTime => "part-time",
            EmploymentType::Contract => "contract",
            EmploymentType::Internship => "internship",
        }
    }
}

impl FromStr for EmploymentType {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "full-time" => Ok(EmploymentType::FullTime),
            "part-time" => Ok(EmploymentType::PartTime),
            "contract" => Ok(EmploymentType::Contract),
            "internship" => Ok(EmploymentType::Internship),
            _ => Err(BoardError::InvalidArgument(format!(
                "unknown employment type '{}' (full-time, part-time, contract, internship)",
                s
            ))),
        }
    }
}

impl fmt::Display for EmploymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceLevel {
    Entry,
    #[default]
    Mid,
    Senior,
    Lead,
}

impl ExperienceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExperienceLevel::Entry => "entry",
            ExperienceLevel::Mid => "mid",
            ExperienceLevel::Senior => "senior",
            ExperienceLevel::Lead => "lead",
        }
    }
}

impl FromStr for ExperienceLevel {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "entry" => Ok(ExperienceLevel::Entry),
            "mid" => Ok(ExperienceLevel::Mid),
            "senior" => Ok(ExperienceLevel::Senior),
            "lead" => Ok(ExperienceLevel::Lead),
            _ => Err(BoardError::InvalidArgument(format!(
                "unknown experience level '{}' (entry, mid, senior, lead)",
                s
            ))),
        }
    }
}

impl fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostingStatus {
    #[default]
    Active,
    Closed,
    Draft,
    Filled,
}

impl PostingStatus {
    pub const ALL: [PostingStatus; 4] = [
        PostingStatus::Active,
        PostingStatus::Closed,
        PostingStatus::Draft,
        PostingStatus::Filled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PostingStatus::Active => "active",
            PostingStatus::Closed => "closed",
            PostingStatus::Draft => "draft",
            PostingStatus::Filled => "filled",
        }
    }
}

impl FromStr for PostingStatus {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(PostingStatus::Active),
            "closed" => Ok(PostingStatus::Closed),
            "draft" => Ok(PostingStatus::Draft),
            "filled" => Ok(PostingStatus::Filled),
            _ => Err(BoardError::InvalidArgument(format!(
                "unknown posting status '{}' (active, closed, draft, filled)",
                s
            ))),
        }
    }
}

impl fmt::Display for PostingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse an optional backend enum value, falling back to the type's default.
fn lenient_enum<T>(raw: Option<&str>, field: &'static str) -> T
where
    T: FromStr<Err = BoardError> + Default,
{
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => T::default(),
        Some(s) => s.parse().unwrap_or_else(|_| {
            tracing::warn!(field, raw = s, "unknown value from backend, using default");
            T::default()
        }),
    }
}

/// Backend timestamps come either as RFC 3339 or as naive ISO strings in UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobListing {
    pub id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub employment_type: EmploymentType,
    pub experience_level: ExperienceLevel,
    pub salary_range: String,
    pub description: String,
    pub requirements: Vec<String>,
    pub posted_date: Option<DateTime<Utc>>,
    pub match_percentage: u8,
    pub status: PostingStatus,
    pub applications_count: u32,
    pub views_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobApplication {
    pub id: String,
    pub job_id: String,
    pub job_title: String,
    pub company: String,
    pub location: String,
    pub salary_range: String,
    pub employment_type: String,
    pub status: ApplicationStatus,
    pub applied_date: DateTime<Utc>,
    pub updated_date: Option<DateTime<Utc>>,
    pub cover_letter: String,
    pub match_percentage: u8,
    pub candidate_name: Option<String>,
    pub candidate_email: Option<String>,
}

impl JobApplication {
    /// Last status change, or the submission time when none was recorded.
    pub fn last_changed(&self) -> DateTime<Utc> {
        self.updated_date.unwrap_or(self.applied_date)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub status: String,
    pub date: DateTime<Utc>,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Candidate,
    Employer,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default, alias = "company_name")]
    pub company: Option<String>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resume {
    pub id: String,
    pub file_name: String,
    pub file_size: Option<u64>,
    pub uploaded_at: Option<DateTime<Utc>>,
    pub is_primary: bool,
    pub skills: Vec<String>,
}

/// File types the backend's resume parser accepts.
pub const RESUME_EXTENSIONS: [&str; 4] = ["pdf", "doc", "docx", "txt"];

pub fn resume_content_type(file_name: &str) -> Option<&'static str> {
    let (_, ext) = file_name.rsplit_once('.')?;
    match ext.to_lowercase().as_str() {
        "pdf" => Some("application/pdf"),
        "doc" => Some("application/msword"),
        "docx" => Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
        "txt" => Some("text/plain"),
        _ => None,
    }
}

pub fn format_file_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;
    if bytes < KB {
        format!("{} B", bytes)
    } else if bytes < MB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: User,
    pub stored_at: DateTime<Utc>,
}

// --- Backend wire records ---

fn clip_percentage(raw: Option<f64>) -> u8 {
    raw.map(|p| p.round().clamp(0.0, 100.0) as u8).unwrap_or(0)
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiJob {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub employment_type: Option<String>,
    #[serde(default)]
    pub experience_level: Option<String>,
    #[serde(default)]
    pub salary_range: Option<String>,
    #[serde(default)]
    pub salary_min: Option<f64>,
    #[serde(default)]
    pub salary_max: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub required_skills: Option<Vec<String>>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub posted_at: Option<String>,
    #[serde(default)]
    pub match_percentage: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub applications_count: Option<u32>,
    #[serde(default)]
    pub views_count: Option<u32>,
}

impl From<ApiJob> for JobListing {
    fn from(raw: ApiJob) -> Self {
        let salary_range = match (raw.salary_range, raw.salary_min, raw.salary_max) {
            (Some(range), _, _) if !range.trim().is_empty() => range,
            (_, Some(min), Some(max)) if min > 0.0 || max > 0.0 => format!("{} - {}", min, max),
            _ => "Competitive".to_string(),
        };
        let posted_date = raw
            .created_at
            .as_deref()
            .or(raw.posted_at.as_deref())
            .and_then(parse_timestamp);

        JobListing {
            id: raw.id,
            title: raw.title.unwrap_or_default(),
            company: raw.company_name.unwrap_or_else(|| "Unknown Company".to_string()),
            location: raw.location.unwrap_or_else(|| "Remote".to_string()),
            employment_type: lenient_enum(raw.employment_type.as_deref(), "employment_type"),
            experience_level: lenient_enum(raw.experience_level.as_deref(), "experience_level"),
            salary_range,
            description: raw.description.unwrap_or_default(),
            requirements: raw.required_skills.unwrap_or_default(),
            posted_date,
            match_percentage: clip_percentage(raw.match_percentage),
            status: lenient_enum(raw.status.as_deref(), "status"),
            applications_count: raw.applications_count.unwrap_or(0),
            views_count: raw.views_count.unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiApplication {
    pub id: String,
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub salary_range: Option<String>,
    #[serde(default)]
    pub employment_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub applied_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub cover_letter: Option<String>,
    #[serde(default)]
    pub match_percentage: Option<f64>,
    /// Weighted overall score in `0..=1`, unlike `match_percentage`.
    #[serde(default)]
    pub matching_score: Option<f64>,
    #[serde(default)]
    pub candidate_name: Option<String>,
    #[serde(default)]
    pub candidate_email: Option<String>,
    #[serde(default)]
    pub candidate: Option<ApiCandidate>,
}

/// Applicant details the backend nests under employer-facing applications.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiCandidate {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl ApiApplication {
    /// `now` stands in for a submission time the backend never sent.
    pub fn into_application(self, now: DateTime<Utc>) -> JobApplication {
        let applied_date = self
            .created_at
            .as_deref()
            .or(self.applied_at.as_deref())
            .and_then(parse_timestamp)
            .unwrap_or(now);
        let updated_date = self.updated_at.as_deref().and_then(parse_timestamp);
        let (candidate_name, candidate_email) = match self.candidate {
            Some(c) => {
                let name = format!("{} {}", c.first_name, c.last_name).trim().to_string();
                ((!name.is_empty()).then_some(name), c.email)
            }
            None => (None, None),
        };
        let cover_letter = self
            .cover_letter
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| "No cover letter provided".to_string());

        JobApplication {
            id: self.id,
            job_id: self.job_id.unwrap_or_default(),
            job_title: self.job_title.unwrap_or_else(|| "Unknown Position".to_string()),
            company: self.company.unwrap_or_else(|| "Unknown Company".to_string()),
            location: self.location.unwrap_or_else(|| "Remote".to_string()),
            salary_range: self.salary_range.unwrap_or_else(|| "Not specified".to_string()),
            employment_type: self.employment_type.unwrap_or_else(|| "Full-time".to_string()),
            status: ApplicationStatus::lenient(self.status.as_deref()),
            applied_date,
            updated_date,
            cover_letter,
            match_percentage: clip_percentage(
                self.match_percentage.or(self.matching_score.map(|score| score * 100.0)),
            ),
            candidate_name: self.candidate_name.or(candidate_name),
            candidate_email: self.candidate_email.or(candidate_email),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiResumeData {
    #[serde(default)]
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiResume {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default, alias = "filename")]
    pub file_name: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default, alias = "created_at")]
    pub uploaded_at: Option<String>,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default)]
    pub parsed_data: Option<ApiResumeData>,
}

impl From<ApiResume> for Resume {
    fn from(raw: ApiResume) -> Self {
        Resume {
            id: raw.id,
            file_name: raw.file_name.unwrap_or_else(|| "resume".to_string()),
            file_size: raw.file_size,
            uploaded_at: raw.uploaded_at.as_deref().and_then(parse_timestamp),
            is_primary: raw.is_primary,
            skills: raw.parsed_data.map(|d| d.skills).unwrap_or_default(),
        }
    }
}

// --- Presentation helpers ---

/// Human label for how long ago a job was posted.
pub fn posted_label(posted: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(posted) = posted else {
        return "Recently".to_string();
    };
    let days = (now - posted).num_days();
    match days {
        i64::MIN..=0 => "Today".to_string(),
        1 => "1 day ago".to_string(),
        2..=6 => format!("{} days ago", days),
        7..=29 => format!("{} weeks ago", days / 7),
        _ => format!("{} months ago", days / 30),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchBand {
    Strong,
    Fair,
    Weak,
}

impl MatchBand {
    pub fn of(percentage: u8) -> Self {
        match percentage {
            70.. => MatchBand::Strong,
            50..=69 => MatchBand::Fair,
            _ => MatchBand::Weak,
        }
    }
}
