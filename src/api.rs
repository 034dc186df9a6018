use chrono::Utc;
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::future::Future;

use crate::error::{BoardError, BoardResult};
use crate::filter::{filter_and_paginate, ApplicationFilter, JobFilter, PagedResult};
use crate::models::{
    resume_content_type, ApiApplication, ApiJob, ApiResume, ApplicationStatus, JobApplication,
    JobListing, PostingStatus, Resume, Session, User, RESUME_EXTENSIONS,
};

// --- Data source trait ---

/// The backend system of record. Every call either resolves to plain records
/// or fails with `DataUnavailable`; nothing is retried here.
pub trait DataSource {
    fn fetch_jobs(&self) -> impl Future<Output = BoardResult<Vec<JobListing>>> + Send;
    fn fetch_job(&self, id: &str) -> impl Future<Output = BoardResult<JobListing>> + Send;
    fn fetch_my_jobs(&self) -> impl Future<Output = BoardResult<Vec<JobListing>>> + Send;
    fn fetch_applications(&self) -> impl Future<Output = BoardResult<Vec<JobApplication>>> + Send;
    fn apply(
        &self,
        job_id: &str,
        cover_letter: Option<&str>,
    ) -> impl Future<Output = BoardResult<JobApplication>> + Send;
    fn delete_job(&self, id: &str) -> impl Future<Output = BoardResult<()>> + Send;

    /// Applicants for one of the employer's postings.
    fn fetch_job_applications(
        &self,
        job_id: &str,
    ) -> impl Future<Output = BoardResult<Vec<JobApplication>>> + Send;
    fn update_application_status(
        &self,
        application_id: &str,
        status: ApplicationStatus,
        notes: Option<&str>,
    ) -> impl Future<Output = BoardResult<JobApplication>> + Send;
    fn update_job_status(
        &self,
        job_id: &str,
        status: PostingStatus,
    ) -> impl Future<Output = BoardResult<JobListing>> + Send;

    fn fetch_resumes(&self) -> impl Future<Output = BoardResult<Vec<Resume>>> + Send;
    /// Returns the id the backend assigned to the stored resume.
    fn upload_resume(
        &self,
        file_name: &str,
        content: Vec<u8>,
    ) -> impl Future<Output = BoardResult<String>> + Send;
    fn delete_resume(&self, id: &str) -> impl Future<Output = BoardResult<()>> + Send;
    fn set_primary_resume(&self, id: &str) -> impl Future<Output = BoardResult<()>> + Send;
}

pub async fn job_page<S: DataSource>(
    source: &S,
    filter: &JobFilter,
    page: usize,
    page_size: usize,
) -> BoardResult<PagedResult<JobListing>> {
    let jobs = source.fetch_jobs().await?;
    filter_and_paginate(&jobs, filter, page, page_size)
}

pub async fn application_page<S: DataSource>(
    source: &S,
    filter: &ApplicationFilter,
    page: usize,
    page_size: usize,
) -> BoardResult<PagedResult<JobApplication>> {
    let applications = source.fetch_applications().await?;
    filter_and_paginate(&applications, filter, page, page_size)
}

pub async fn applicant_page<S: DataSource>(
    source: &S,
    job_id: &str,
    filter: &ApplicationFilter,
    page: usize,
    page_size: usize,
) -> BoardResult<PagedResult<JobApplication>> {
    let mut applicants = source.fetch_job_applications(job_id).await?;
    // Stable, so backend order survives among equal scores.
    applicants.sort_by(|a, b| b.match_percentage.cmp(&a.match_percentage));
    filter_and_paginate(&applicants, filter, page, page_size)
}

/// Every application across `jobs`. The backend only lists applicants per
/// posting, and those records carry no job details, so they are filled in
/// from the posting.
pub async fn employer_applications<S: DataSource>(
    source: &S,
    jobs: &[JobListing],
) -> BoardResult<Vec<JobApplication>> {
    let mut all = Vec::new();
    for job in jobs {
        let applicants = source.fetch_job_applications(&job.id).await?;
        tracing::debug!(job = %job.id, count = applicants.len(), "fetched applicants");
        all.extend(applicants.into_iter().map(|mut app| {
            app.job_title = job.title.clone();
            app.company = job.company.clone();
            app.location = job.location.clone();
            app.employment_type = job.employment_type.to_string();
            app
        }));
    }
    Ok(all)
}

/// Check a resume file name before anything is sent to the backend.
pub fn validate_resume_name(file_name: &str) -> BoardResult<&'static str> {
    resume_content_type(file_name).ok_or_else(|| {
        BoardError::InvalidArgument(format!(
            "unsupported resume file '{}' (allowed: {})",
            file_name,
            RESUME_EXTENSIONS.join(", ")
        ))
    })
}

pub async fn find_application<S: DataSource>(source: &S, id: &str) -> BoardResult<JobApplication> {
    source
        .fetch_applications()
        .await?
        .into_iter()
        .find(|a| a.id == id)
        .ok_or_else(|| BoardError::DataUnavailable(format!("application {} not found", id)))
}

// --- Wire envelope ---

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: Option<bool>,
    data: Option<T>,
    error: Option<String>,
}

/// List payloads arrive either bare or wrapped, depending on the endpoint.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Listing<T> {
    Bare(Vec<T>),
    Items { items: Vec<T> },
    Applications { applications: Vec<T> },
    Jobs { jobs: Vec<T> },
    Resumes { resumes: Vec<T> },
}

impl<T> Listing<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Listing::Bare(v)
            | Listing::Items { items: v }
            | Listing::Applications { applications: v }
            | Listing::Jobs { jobs: v }
            | Listing::Resumes { resumes: v } => v,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Tokens {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct LoginData {
    user: User,
    tokens: Tokens,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct ApplyRequest<'a> {
    job_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    cover_letter: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct ReviewRequest<'a> {
    status: ApplicationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    employer_notes: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct JobStatusRequest {
    status: PostingStatus,
}

#[derive(Debug, Deserialize)]
struct UploadedResume {
    resume_id: String,
}

/// Decode a backend response body. Non-2xx statuses and `success: false`
/// become `DataUnavailable` carrying the backend's own error text.
fn decode_envelope<T: DeserializeOwned>(
    status: StatusCode,
    context: &str,
    body: &str,
) -> BoardResult<Option<T>> {
    if !status.is_success() {
        let reason = serde_json::from_str::<Envelope<serde_json::Value>>(body)
            .ok()
            .and_then(|e| e.error)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
        return Err(BoardError::DataUnavailable(format!(
            "{} returned {}: {}",
            context,
            status.as_u16(),
            reason
        )));
    }

    let envelope: Envelope<T> = serde_json::from_str(body).map_err(|e| {
        BoardError::DataUnavailable(format!("{} returned an unreadable body: {}", context, e))
    })?;

    if envelope.success == Some(false) {
        return Err(BoardError::DataUnavailable(format!(
            "{} failed: {}",
            context,
            envelope.error.unwrap_or_else(|| "unknown error".to_string())
        )));
    }

    Ok(envelope.data)
}

fn decode_listing<T: DeserializeOwned>(status: StatusCode, context: &str, body: &str) -> BoardResult<Vec<T>> {
    Ok(decode_envelope::<Listing<T>>(status, context, body)?
        .map(Listing::into_vec)
        .unwrap_or_default())
}

fn required<T>(data: Option<T>, context: &str) -> BoardResult<T> {
    data.ok_or_else(|| BoardError::DataUnavailable(format!("{} returned no data", context)))
}

// --- HTTP backend ---

#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpBackend {
    pub fn new(base_url: &str, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn execute(&self, builder: RequestBuilder, context: &str) -> BoardResult<(StatusCode, String)> {
        tracing::debug!(context, "backend request");
        let response = builder
            .send()
            .await
            .map_err(|e| BoardError::DataUnavailable(format!("{}: {}", context, e)))?;
        let status = response.status();
        let body = response.text().await?;
        tracing::debug!(context, status = status.as_u16(), bytes = body.len(), "backend response");
        Ok((status, body))
    }

    async fn get_listing<T: DeserializeOwned>(&self, path: &str) -> BoardResult<Vec<T>> {
        let context = format!("GET {}", path);
        let (status, body) = self.execute(self.request(Method::GET, path), &context).await?;
        decode_listing(status, &context, &body)
    }

    /// Send a request whose reply carries nothing the caller needs.
    async fn send_only(&self, method: Method, path: &str) -> BoardResult<()> {
        let context = format!("{} {}", method, path);
        let (status, body) = self.execute(self.request(method, path), &context).await?;
        decode_envelope::<serde_json::Value>(status, &context, &body)?;
        Ok(())
    }

    async fn applications_from(&self, path: &str) -> BoardResult<Vec<JobApplication>> {
        let now = Utc::now();
        Ok(self
            .get_listing::<ApiApplication>(path)
            .await?
            .into_iter()
            .map(|raw| raw.into_application(now))
            .collect())
    }

    pub async fn login(&self, email: &str, password: &str) -> BoardResult<Session> {
        let context = "POST /auth/login";
        let builder = self
            .request(Method::POST, "/auth/login")
            .json(&LoginRequest { email, password });
        let (status, body) = self.execute(builder, context).await?;
        let data: LoginData = required(decode_envelope(status, context, &body)?, context)?;
        Ok(Session {
            token: data.tokens.access_token,
            user: data.user,
            stored_at: Utc::now(),
        })
    }

    pub async fn me(&self) -> BoardResult<User> {
        let context = "GET /auth/me";
        let (status, body) = self.execute(self.request(Method::GET, "/auth/me"), context).await?;
        required(decode_envelope(status, context, &body)?, context)
    }
}

impl DataSource for HttpBackend {
    async fn fetch_jobs(&self) -> BoardResult<Vec<JobListing>> {
        let jobs = self.get_listing::<ApiJob>("/jobs").await?;
        Ok(jobs.into_iter().map(JobListing::from).collect())
    }

    async fn fetch_job(&self, id: &str) -> BoardResult<JobListing> {
        let path = format!("/jobs/{}", id);
        let context = format!("GET {}", path);
        let (status, body) = self.execute(self.request(Method::GET, &path), &context).await?;
        let raw: ApiJob = required(decode_envelope(status, &context, &body)?, &context)?;
        Ok(raw.into())
    }

    async fn fetch_my_jobs(&self) -> BoardResult<Vec<JobListing>> {
        let jobs = self.get_listing::<ApiJob>("/jobs/my-jobs").await?;
        Ok(jobs.into_iter().map(JobListing::from).collect())
    }

    async fn fetch_applications(&self) -> BoardResult<Vec<JobApplication>> {
        self.applications_from("/matching/applications").await
    }

    async fn apply(&self, job_id: &str, cover_letter: Option<&str>) -> BoardResult<JobApplication> {
        let context = "POST /matching/apply";
        let builder = self
            .request(Method::POST, "/matching/apply")
            .json(&ApplyRequest { job_id, cover_letter });
        let (status, body) = self.execute(builder, context).await?;
        let raw: ApiApplication = required(decode_envelope(status, context, &body)?, context)?;
        Ok(raw.into_application(Utc::now()))
    }

    async fn delete_job(&self, id: &str) -> BoardResult<()> {
        self.send_only(Method::DELETE, &format!("/jobs/{}", id)).await
    }

    async fn fetch_job_applications(&self, job_id: &str) -> BoardResult<Vec<JobApplication>> {
        self.applications_from(&format!("/matching/job/{}/applications", job_id))
            .await
    }

    async fn update_application_status(
        &self,
        application_id: &str,
        status: ApplicationStatus,
        notes: Option<&str>,
    ) -> BoardResult<JobApplication> {
        let path = format!("/matching/application/{}", application_id);
        let context = format!("PUT {}", path);
        let builder = self.request(Method::PUT, &path).json(&ReviewRequest {
            status,
            employer_notes: notes,
        });
        let (code, body) = self.execute(builder, &context).await?;
        let raw: ApiApplication = required(decode_envelope(code, &context, &body)?, &context)?;
        Ok(raw.into_application(Utc::now()))
    }

    async fn update_job_status(&self, job_id: &str, status: PostingStatus) -> BoardResult<JobListing> {
        let path = format!("/jobs/{}", job_id);
        let context = format!("PUT {}", path);
        let builder = self.request(Method::PUT, &path).json(&JobStatusRequest { status });
        let (code, body) = self.execute(builder, &context).await?;
        let raw: ApiJob = required(decode_envelope(code, &context, &body)?, &context)?;
        Ok(raw.into())
    }

    async fn fetch_resumes(&self) -> BoardResult<Vec<Resume>> {
        let resumes = self.get_listing::<ApiResume>("/resumes/my-resumes").await?;
        Ok(resumes.into_iter().map(Resume::from).collect())
    }

    async fn upload_resume(&self, file_name: &str, content: Vec<u8>) -> BoardResult<String> {
        let context = "POST /resumes/upload";
        let content_type = validate_resume_name(file_name)?;
        let part = Part::bytes(content)
            .file_name(file_name.to_string())
            .mime_str(content_type)?;
        let builder = self
            .request(Method::POST, "/resumes/upload")
            .multipart(Form::new().part("file", part));
        let (status, body) = self.execute(builder, context).await?;
        let uploaded: UploadedResume = required(decode_envelope(status, context, &body)?, context)?;
        Ok(uploaded.resume_id)
    }

    async fn delete_resume(&self, id: &str) -> BoardResult<()> {
        self.send_only(Method::DELETE, &format!("/resumes/{}", id)).await
    }

    async fn set_primary_resume(&self, id: &str) -> BoardResult<()> {
        self.send_only(Method::PATCH, &format!("/resumes/{}/primary", id)).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::filter::{Posting, PostingFilter};
    use crate::models::{ApplicationStatus, EmploymentType, ExperienceLevel, PostingStatus};
    use chrono::TimeZone;
    use std::sync::Mutex;

    /// In-memory backend for exercising code that talks to a `DataSource`.
    #[derive(Default)]
    pub(crate) struct StaticSource {
        pub jobs: Vec<JobListing>,
        pub applications: Vec<JobApplication>,
        pub unavailable: bool,
        pub deleted: Mutex<Vec<String>>,
        pub reviews: Mutex<Vec<(String, ApplicationStatus)>>,
        pub resumes: Mutex<Vec<Resume>>,
    }

    impl StaticSource {
        fn check(&self) -> BoardResult<()> {
            if self.unavailable {
                Err(BoardError::DataUnavailable("backend offline".to_string()))
            } else {
                Ok(())
            }
        }
    }

    impl DataSource for StaticSource {
        async fn fetch_jobs(&self) -> BoardResult<Vec<JobListing>> {
            self.check()?;
            Ok(self.jobs.clone())
        }

        async fn fetch_job(&self, id: &str) -> BoardResult<JobListing> {
            self.check()?;
            self.jobs
                .iter()
                .find(|j| j.id == id)
                .cloned()
                .ok_or_else(|| BoardError::DataUnavailable(format!("job {} not found", id)))
        }

        async fn fetch_my_jobs(&self) -> BoardResult<Vec<JobListing>> {
            self.fetch_jobs().await
        }

        async fn fetch_applications(&self) -> BoardResult<Vec<JobApplication>> {
            self.check()?;
            Ok(self.applications.clone())
        }

        async fn apply(&self, job_id: &str, cover_letter: Option<&str>) -> BoardResult<JobApplication> {
            self.check()?;
            let raw = ApiApplication {
                id: format!("app-{}", job_id),
                job_id: Some(job_id.to_string()),
                cover_letter: cover_letter.map(str::to_string),
                ..Default::default()
            };
            Ok(raw.into_application(Utc::now()))
        }

        async fn delete_job(&self, id: &str) -> BoardResult<()> {
            self.check()?;
            if let Ok(mut deleted) = self.deleted.lock() {
                deleted.push(id.to_string());
            }
            Ok(())
        }

        async fn fetch_job_applications(&self, job_id: &str) -> BoardResult<Vec<JobApplication>> {
            self.check()?;
            Ok(self.applications.iter().filter(|a| a.job_id == job_id).cloned().collect())
        }

        async fn update_application_status(
            &self,
            application_id: &str,
            status: ApplicationStatus,
            _notes: Option<&str>,
        ) -> BoardResult<JobApplication> {
            self.check()?;
            let mut application = self
                .applications
                .iter()
                .find(|a| a.id == application_id)
                .cloned()
                .ok_or_else(|| BoardError::DataUnavailable("Application not found".to_string()))?;
            application.status = status;
            application.updated_date = Some(Utc.with_ymd_and_hms(2024, 5, 20, 9, 0, 0).unwrap());
            self.reviews.lock().unwrap().push((application_id.to_string(), status));
            Ok(application)
        }

        async fn update_job_status(&self, job_id: &str, status: PostingStatus) -> BoardResult<JobListing> {
            let mut job = self.fetch_job(job_id).await?;
            job.status = status;
            Ok(job)
        }

        async fn fetch_resumes(&self) -> BoardResult<Vec<Resume>> {
            self.check()?;
            Ok(self.resumes.lock().unwrap().clone())
        }

        async fn upload_resume(&self, file_name: &str, content: Vec<u8>) -> BoardResult<String> {
            self.check()?;
            validate_resume_name(file_name)?;
            let mut resumes = self.resumes.lock().unwrap();
            let id = format!("r{}", resumes.len() + 1);
            let is_primary = resumes.is_empty();
            resumes.push(Resume {
                id: id.clone(),
                file_name: file_name.to_string(),
                file_size: Some(content.len() as u64),
                uploaded_at: None,
                is_primary,
                skills: vec![],
            });
            Ok(id)
        }

        async fn delete_resume(&self, id: &str) -> BoardResult<()> {
            self.check()?;
            let mut resumes = self.resumes.lock().unwrap();
            let before = resumes.len();
            resumes.retain(|r| r.id != id);
            if resumes.len() == before {
                return Err(BoardError::DataUnavailable("Resume not found".to_string()));
            }
            Ok(())
        }

        async fn set_primary_resume(&self, id: &str) -> BoardResult<()> {
            self.check()?;
            let mut resumes = self.resumes.lock().unwrap();
            if !resumes.iter().any(|r| r.id == id) {
                return Err(BoardError::DataUnavailable("Resume not found".to_string()));
            }
            for resume in resumes.iter_mut() {
                resume.is_primary = resume.id == id;
            }
            Ok(())
        }
    }

    pub(crate) fn listing(id: &str, title: &str, employment_type: EmploymentType) -> JobListing {
        JobListing {
            id: id.to_string(),
            title: title.to_string(),
            company: "Acme".to_string(),
            location: "Remote".to_string(),
            employment_type,
            experience_level: ExperienceLevel::Mid,
            salary_range: "Competitive".to_string(),
            description: String::new(),
            requirements: vec![],
            posted_date: None,
            match_percentage: 60,
            status: PostingStatus::Active,
            applications_count: 0,
            views_count: 0,
        }
    }

    pub(crate) fn submitted(id: &str, status: ApplicationStatus) -> JobApplication {
        JobApplication {
            id: id.to_string(),
            job_id: format!("job-{}", id),
            job_title: "Engineer".to_string(),
            company: "Acme".to_string(),
            location: "Remote".to_string(),
            salary_range: "Not specified".to_string(),
            employment_type: "Full-time".to_string(),
            status,
            applied_date: Utc.with_ymd_and_hms(2024, 4, 1, 8, 0, 0).unwrap(),
            updated_date: Some(Utc.with_ymd_and_hms(2024, 4, 9, 8, 0, 0).unwrap()),
            cover_letter: "No cover letter provided".to_string(),
            match_percentage: 0,
            candidate_name: None,
            candidate_email: None,
        }
    }

    #[test]
    fn test_decode_bare_list() {
        let body = r#"{"success": true, "data": [{"id": "j1", "title": "Rust Engineer"}]}"#;
        let jobs: Vec<ApiJob> = decode_listing(StatusCode::OK, "GET /jobs", body).unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].title.as_deref(), Some("Rust Engineer"));
    }

    #[test]
    fn test_decode_wrapped_lists() {
        let body = r#"{"success": true, "data": {"items": [{"id": "j1"}, {"id": "j2"}], "page": 1, "total": 2}}"#;
        let jobs: Vec<ApiJob> = decode_listing(StatusCode::OK, "GET /jobs", body).unwrap();
        assert_eq!(jobs.len(), 2);

        let body = r#"{"success": true, "data": {"applications": [{"id": "a1", "status": "offered"}], "count": 1}}"#;
        let apps: Vec<ApiApplication> = decode_listing(StatusCode::OK, "GET /matching/applications", body).unwrap();
        assert_eq!(apps[0].status.as_deref(), Some("offered"));
    }

    #[test]
    fn test_decode_missing_data_is_empty_list() {
        let body = r#"{"success": true}"#;
        let jobs: Vec<ApiJob> = decode_listing(StatusCode::OK, "GET /jobs", body).unwrap();
        assert!(jobs.is_empty());
    }

    #[test]
    fn test_decode_error_status_carries_backend_message() {
        let body = r#"{"success": false, "error": "Invalid email or password"}"#;
        let err = decode_envelope::<serde_json::Value>(StatusCode::UNAUTHORIZED, "POST /auth/login", body)
            .unwrap_err();
        assert_eq!(
            err,
            BoardError::DataUnavailable("POST /auth/login returned 401: Invalid email or password".to_string())
        );
    }

    #[test]
    fn test_decode_error_status_without_body() {
        let err = decode_envelope::<serde_json::Value>(StatusCode::BAD_GATEWAY, "GET /jobs", "<html>")
            .unwrap_err();
        assert!(matches!(err, BoardError::DataUnavailable(msg) if msg.contains("502")));
    }

    #[test]
    fn test_decode_garbage_body() {
        let result: BoardResult<Vec<ApiJob>> = decode_listing(StatusCode::OK, "GET /jobs", "not json");
        assert!(matches!(result, Err(BoardError::DataUnavailable(_))));
    }

    #[test]
    fn test_decode_login_payload() {
        let body = r#"{
            "success": true,
            "data": {
                "user": {"id": "u1", "email": "wanjiru@example.com", "role": "candidate",
                         "first_name": "Wanjiru", "last_name": "Kamau"},
                "tokens": {"access_token": "abc.def", "refresh_token": "ghi"}
            }
        }"#;
        let data: LoginData = required(decode_envelope(StatusCode::OK, "login", body).unwrap(), "login").unwrap();
        assert_eq!(data.tokens.access_token, "abc.def");
        assert_eq!(data.user.full_name(), "Wanjiru Kamau");
    }

    #[test]
    fn test_url_joining() {
        let backend = HttpBackend::new("http://localhost:5000/api/", None);
        assert_eq!(backend.url("/jobs"), "http://localhost:5000/api/jobs");
        assert_eq!(backend.url("jobs/my-jobs"), "http://localhost:5000/api/jobs/my-jobs");
    }

    #[tokio::test]
    async fn test_application_page_filters_after_fetch() {
        let source = StaticSource {
            applications: vec![
                submitted("a", ApplicationStatus::Pending),
                submitted("b", ApplicationStatus::Offered),
                submitted("c", ApplicationStatus::Offered),
            ],
            ..Default::default()
        };
        let filter = ApplicationFilter { status: Some(ApplicationStatus::Offered) };
        let page = application_page(&source, &filter, 1, 1).await.unwrap();
        assert_eq!(page.total_filtered_count, 2);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.page_items[0].id, "b");
        assert_eq!(page.category_counts[&ApplicationStatus::Pending], 1);
    }

    #[tokio::test]
    async fn test_job_page_uses_search() {
        let source = StaticSource {
            jobs: vec![
                listing("1", "Senior React Developer", EmploymentType::FullTime),
                listing("2", "Backend Engineer", EmploymentType::FullTime),
            ],
            ..Default::default()
        };
        let filter = JobFilter { search_text: "REACT".to_string(), ..Default::default() };
        let page = job_page(&source, &filter, 1, 6).await.unwrap();
        assert_eq!(page.page_items.len(), 1);
        assert_eq!(page.page_items[0].title, "Senior React Developer");
    }

    #[tokio::test]
    async fn test_unavailable_source_propagates() {
        let source = StaticSource { unavailable: true, ..Default::default() };
        let result = application_page(&source, &ApplicationFilter::default(), 1, 10).await;
        assert!(matches!(result, Err(BoardError::DataUnavailable(_))));
    }

    #[tokio::test]
    async fn test_apply_and_delete_through_source() {
        let source = StaticSource::default();
        let application = source.apply("j9", Some("Keen to join")).await.unwrap();
        assert_eq!(application.job_id, "j9");
        assert_eq!(application.status, ApplicationStatus::Pending);
        assert_eq!(application.cover_letter, "Keen to join");

        source.delete_job("j9").await.unwrap();
        assert_eq!(*source.deleted.lock().unwrap(), vec!["j9".to_string()]);
    }

    #[test]
    fn test_decode_missing_data_for_record_payload() {
        let data = decode_envelope::<LoginData>(StatusCode::OK, "POST /auth/login", r#"{"success": true}"#)
            .unwrap();
        assert!(data.is_none());
        assert!(matches!(
            required(data, "POST /auth/login"),
            Err(BoardError::DataUnavailable(msg)) if msg.contains("no data")
        ));
    }

    #[test]
    fn test_decode_applicants_for_job() {
        let body = r#"{"success": true, "data": {
            "job": {"id": "j4", "title": "Dispatcher"},
            "applications": [
                {"id": "a1", "job_id": "j4", "status": "pending", "matching_score": 0.91,
                 "candidate": {"first_name": "Zawadi", "last_name": "Njeri", "email": "zawadi@example.com"}}
            ],
            "count": 1
        }}"#;
        let apps: Vec<ApiApplication> =
            decode_listing(StatusCode::OK, "GET /matching/job/j4/applications", body).unwrap();
        let app = apps.into_iter().next().unwrap().into_application(Utc::now());
        assert_eq!(app.candidate_name.as_deref(), Some("Zawadi Njeri"));
        assert_eq!(app.match_percentage, 91);
    }

    #[test]
    fn test_decode_resume_listing() {
        let body = r#"{"success": true, "data": {"resumes": [
            {"_id": "r1", "filename": "cv.pdf", "created_at": "2024-04-01T12:00:00", "parsed_data": {}}
        ], "count": 1}}"#;
        let resumes: Vec<ApiResume> = decode_listing(StatusCode::OK, "GET /resumes/my-resumes", body).unwrap();
        assert_eq!(resumes.len(), 1);
        assert_eq!(resumes[0].id, "r1");
        assert_eq!(resumes[0].file_name.as_deref(), Some("cv.pdf"));
    }

    #[test]
    fn test_review_request_body() {
        let body = serde_json::to_value(ReviewRequest {
            status: ApplicationStatus::Shortlisted,
            employer_notes: None,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"status": "shortlisted"}));

        let body = serde_json::to_value(JobStatusRequest { status: PostingStatus::Closed }).unwrap();
        assert_eq!(body, serde_json::json!({"status": "closed"}));
    }

    #[test]
    fn test_validate_resume_name() {
        assert_eq!(validate_resume_name("cv.docx").unwrap(), resume_content_type("cv.docx").unwrap());
        assert!(matches!(
            validate_resume_name("portrait.jpg"),
            Err(BoardError::InvalidArgument(msg)) if msg.contains("pdf, doc, docx, txt")
        ));
    }

    #[tokio::test]
    async fn test_review_moves_application_along_timeline() {
        let source = StaticSource {
            applications: vec![submitted("a1", ApplicationStatus::Pending)],
            ..Default::default()
        };
        let before = crate::timeline::derive_timeline(&source.applications[0]);
        assert_eq!(before.len(), 1);

        let updated = source
            .update_application_status("a1", ApplicationStatus::Interviewed, Some("Strong portfolio"))
            .await
            .unwrap();
        assert_eq!(updated.status, ApplicationStatus::Interviewed);
        let after = crate::timeline::derive_timeline(&updated);
        assert_eq!(after.len(), 4);
        assert_eq!(after[3].date, Utc.with_ymd_and_hms(2024, 5, 20, 9, 0, 0).unwrap());
        assert_eq!(
            *source.reviews.lock().unwrap(),
            vec![("a1".to_string(), ApplicationStatus::Interviewed)]
        );

        assert!(source.update_application_status("missing", ApplicationStatus::Offered, None).await.is_err());
    }

    #[tokio::test]
    async fn test_applicant_page_orders_by_match() {
        let mut low = submitted("a1", ApplicationStatus::Pending);
        low.job_id = "j4".to_string();
        low.match_percentage = 40;
        let mut high = submitted("a2", ApplicationStatus::Shortlisted);
        high.job_id = "j4".to_string();
        high.match_percentage = 88;
        let other = submitted("a3", ApplicationStatus::Pending);
        let source = StaticSource {
            applications: vec![low, high, other],
            ..Default::default()
        };

        let page = applicant_page(&source, "j4", &ApplicationFilter::default(), 1, 10).await.unwrap();
        let ids: Vec<&str> = page.page_items.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["a2", "a1"]);
        assert_eq!(page.category_counts[&ApplicationStatus::Pending], 1);

        let filter = ApplicationFilter { status: Some(ApplicationStatus::Pending) };
        let page = applicant_page(&source, "j4", &filter, 1, 10).await.unwrap();
        assert_eq!(page.total_filtered_count, 1);
    }

    #[tokio::test]
    async fn test_posting_page_and_status_change() {
        let mut draft = listing("2", "Warehouse Lead", EmploymentType::FullTime);
        draft.status = PostingStatus::Draft;
        let source = StaticSource {
            jobs: vec![listing("1", "Dispatcher", EmploymentType::FullTime), draft],
            ..Default::default()
        };

        let postings: Vec<Posting> = source.fetch_my_jobs().await.unwrap().into_iter().map(Posting).collect();
        let filter = PostingFilter { status: Some(PostingStatus::Draft), ..Default::default() };
        let page = filter_and_paginate(&postings, &filter, 1, 10).unwrap();
        assert_eq!(page.page_items.len(), 1);
        assert_eq!(page.page_items[0].0.id, "2");
        assert_eq!(page.category_counts[&PostingStatus::Active], 1);

        let job = source.update_job_status("2", PostingStatus::Active).await.unwrap();
        assert_eq!(job.status, PostingStatus::Active);
    }

    #[tokio::test]
    async fn test_resume_lifecycle() {
        let source = StaticSource::default();
        let first = source.upload_resume("cv.pdf", vec![0; 2048]).await.unwrap();
        let second = source.upload_resume("cv-2024.docx", vec![0; 10]).await.unwrap();
        assert!(source.upload_resume("cv.png", vec![1]).await.is_err());

        let resumes = source.fetch_resumes().await.unwrap();
        assert_eq!(resumes.len(), 2);
        assert!(resumes.iter().find(|r| r.id == first).unwrap().is_primary);

        source.set_primary_resume(&second).await.unwrap();
        let primary: Vec<String> = source
            .fetch_resumes()
            .await
            .unwrap()
            .into_iter()
            .filter(|r| r.is_primary)
            .map(|r| r.id)
            .collect();
        assert_eq!(primary, vec![second.clone()]);

        source.delete_resume(&first).await.unwrap();
        assert!(source.delete_resume(&first).await.is_err());
        assert_eq!(source.fetch_resumes().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_employer_applications_span_postings() {
        let mut first = submitted("a1", ApplicationStatus::Pending);
        first.job_id = "1".to_string();
        let mut second = submitted("a2", ApplicationStatus::Offered);
        second.job_id = "2".to_string();
        let mut elsewhere = submitted("a3", ApplicationStatus::Pending);
        elsewhere.job_id = "9".to_string();
        let source = StaticSource {
            jobs: vec![
                listing("1", "Dispatcher", EmploymentType::FullTime),
                listing("2", "Driver", EmploymentType::Contract),
            ],
            applications: vec![first, second, elsewhere],
            ..Default::default()
        };

        let jobs = source.fetch_my_jobs().await.unwrap();
        let all = employer_applications(&source, &jobs).await.unwrap();
        let summary: Vec<(&str, &str, &str)> = all
            .iter()
            .map(|a| (a.id.as_str(), a.job_title.as_str(), a.employment_type.as_str()))
            .collect();
        assert_eq!(summary, vec![("a1", "Dispatcher", "full-time"), ("a2", "Driver", "contract")]);

        assert!(employer_applications(&source, &[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_application() {
        let source = StaticSource {
            applications: vec![submitted("x1", ApplicationStatus::Reviewed)],
            ..Default::default()
        };
        assert_eq!(find_application(&source, "x1").await.unwrap().status, ApplicationStatus::Reviewed);
        assert!(find_application(&source, "nope").await.is_err());
    }
}
