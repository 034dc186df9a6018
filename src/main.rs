mod api;
mod config;
mod dashboard;
mod error;
mod filter;
mod models;
mod session;
mod timeline;
mod tui;

use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use api::{DataSource, HttpBackend};
use config::Config;
use filter::{
    filter_and_paginate, parse_choice, ApplicationFilter, JobFilter, PagedResult, Posting,
    PostingFilter, RecordFilter,
};
use models::{
    format_file_size, posted_label, ApplicationStatus, JobApplication, MatchBand, PostingStatus,
    Resume, Role, Session,
};
use session::SessionStore;

#[derive(Parser)]
#[command(name = "jobdesk")]
#[command(about = "Job board client - browse jobs, apply, and track applications")]
struct Cli {
    /// Backend base URL (overrides JOBDESK_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Log backend traffic to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the session
    Login {
        /// Account email
        email: String,

        /// Read the password from this file instead of JOBDESK_PASSWORD or a prompt
        #[arg(long)]
        password_file: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Browse open jobs
    Jobs {
        /// Match title, company, or description
        #[arg(short, long, default_value = "")]
        search: String,

        /// Match location
        #[arg(short, long, default_value = "")]
        location: String,

        /// Employment type (full-time, part-time, contract, internship, any)
        #[arg(short = 't', long)]
        employment_type: Option<String>,

        /// Experience level (entry, mid, senior, lead, any)
        #[arg(short = 'e', long)]
        experience_level: Option<String>,

        /// Page number, starting at 1
        #[arg(short, long, default_value = "1")]
        page: usize,

        /// Jobs per page (defaults to JOBDESK_PAGE_SIZE)
        #[arg(long)]
        page_size: Option<usize>,
    },

    /// Show job details
    Job {
        /// Job ID
        id: String,
    },

    /// Apply to a job
    Apply {
        /// Job ID
        job_id: String,

        /// Cover letter text
        #[arg(short, long, conflicts_with = "cover_letter_file")]
        cover_letter: Option<String>,

        /// Read the cover letter from a file
        #[arg(long)]
        cover_letter_file: Option<PathBuf>,
    },

    /// List your applications
    Applications {
        /// Filter by status (pending, reviewed, shortlisted, interviewed, offered, rejected, any)
        #[arg(short, long)]
        status: Option<String>,

        /// Page number, starting at 1
        #[arg(short, long, default_value = "1")]
        page: usize,

        /// Applications per page (defaults to JOBDESK_APPLICATIONS_PAGE_SIZE)
        #[arg(long)]
        page_size: Option<usize>,
    },

    /// Show the status history of an application
    Timeline {
        /// Application ID
        id: String,
    },

    /// Show dashboard figures for the signed-in user
    Dashboard,

    /// Browse applications interactively
    Browse {
        /// Filter by status
        #[arg(short, long)]
        status: Option<String>,
    },

    /// Manage your job postings and review applicants (employers)
    Posting {
        #[command(subcommand)]
        command: PostingCommands,
    },

    /// Manage uploaded resumes (candidates)
    Resume {
        #[command(subcommand)]
        command: ResumeCommands,
    },
}

#[derive(Subcommand)]
enum PostingCommands {
    /// List your postings
    List {
        /// Match title or description
        #[arg(short, long, default_value = "")]
        search: String,

        /// Filter by status (active, closed, draft, filled, any)
        #[arg(short = 'S', long)]
        status: Option<String>,

        /// Page number, starting at 1
        #[arg(short, long, default_value = "1")]
        page: usize,

        /// Postings per page (defaults to JOBDESK_PAGE_SIZE)
        #[arg(long)]
        page_size: Option<usize>,
    },

    /// Change a posting's status
    Status {
        /// Job ID
        id: String,

        /// New status (active, closed, draft, filled)
        status: String,
    },

    /// List applicants for a posting, best match first
    Applicants {
        /// Job ID
        job_id: String,

        /// Filter by application status
        #[arg(short = 'S', long)]
        status: Option<String>,

        /// Page number, starting at 1
        #[arg(short, long, default_value = "1")]
        page: usize,

        /// Applicants per page (defaults to JOBDESK_APPLICATIONS_PAGE_SIZE)
        #[arg(long)]
        page_size: Option<usize>,
    },

    /// Move an application to a new status
    Review {
        /// Application ID
        application_id: String,

        /// New status (pending, reviewed, shortlisted, interviewed, offered, rejected)
        status: String,

        /// Notes kept with the application
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Delete a posting
    Delete {
        /// Job ID
        id: String,
    },
}

#[derive(Subcommand)]
enum ResumeCommands {
    /// List uploaded resumes
    List,

    /// Upload a resume (pdf, doc, docx, txt)
    Upload {
        /// Path to resume file
        file: PathBuf,
    },

    /// Delete an uploaded resume
    Delete {
        /// Resume ID
        id: String,
    },

    /// Make a resume the one sent with applications
    Primary {
        /// Resume ID
        id: String,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("jobdesk=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("jobdesk=warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn require_session(store: &SessionStore) -> Result<Session> {
    store
        .get()?
        .ok_or_else(|| anyhow!("Not signed in. Run 'jobdesk login <email>' first."))
}

fn require_employer(store: &SessionStore) -> Result<Session> {
    let session = require_session(store)?;
    if session.user.role == Role::Candidate {
        bail!("Only employers can manage job postings.");
    }
    Ok(session)
}

/// Password from a file, then JOBDESK_PASSWORD, then an unechoed prompt.
fn resolve_password(password_file: Option<&str>, from_env: Option<String>) -> Result<String> {
    if let Some(file) = password_file {
        let path = config::expand_home(file);
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read password file: {}", path.display()))?;
        let password = contents.trim_end_matches(['\r', '\n']);
        if password.is_empty() {
            bail!("Password file {} is empty", path.display());
        }
        return Ok(password.to_string());
    }
    if let Some(password) = from_env.filter(|p| !p.is_empty()) {
        return Ok(password);
    }
    tui::prompt_hidden("Password: ")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::from_env()?;
    if let Some(url) = cli.api_url {
        config.api_url = url;
    }
    tracing::debug!(api_url = %config.api_url, "configuration loaded");

    let store = SessionStore::open_at(&config.session_path)
        .with_context(|| format!("Failed to open session store at {}", config.session_path.display()))?;
    tracing::debug!(path = %store.path().display(), "session store opened");
    let backend = HttpBackend::new(&config.api_url, store.token()?);

    match cli.command {
        Commands::Login { email, password_file } => {
            let password = resolve_password(password_file.as_deref(), std::env::var("JOBDESK_PASSWORD").ok())?;
            let session = backend.login(&email, &password).await.context("Login failed")?;
            store.set(&session)?;
            println!(
                "Signed in as {} ({})",
                display_name(&session),
                role_name(session.user.role)
            );
        }

        Commands::Logout => {
            if store.clear()? {
                println!("Signed out.");
            } else {
                println!("No stored session.");
            }
        }

        Commands::Whoami => {
            let session = require_session(&store)?;
            let user = backend.me().await.context("Failed to verify session")?;
            println!("{} <{}>", user.full_name(), user.email);
            println!("Role: {}", role_name(user.role));
            if let Some(company) = &user.company {
                println!("Company: {}", company);
            }
            if let Some(location) = &user.location {
                println!("Location: {}", location);
            }
            println!("Signed in since {}", session.stored_at.format("%Y-%m-%d %H:%M UTC"));
        }

        Commands::Jobs {
            search,
            location,
            employment_type,
            experience_level,
            page,
            page_size,
        } => {
            let filter = JobFilter {
                search_text: search,
                location,
                employment_type: parse_choice(employment_type.as_deref())?,
                experience_level: parse_choice(experience_level.as_deref())?,
            };
            let page_size = page_size.unwrap_or(config.jobs_page_size);
            let result = api::job_page(&backend, &filter, page, page_size).await?;
            print_jobs(&result, page);
        }

        Commands::Job { id } => {
            let job = backend.fetch_job(&id).await?;
            println!("Job #{}", job.id);
            println!("Title: {}", job.title);
            println!("Company: {}", job.company);
            println!("Location: {}", job.location);
            println!("Type: {} / {}", job.employment_type, job.experience_level);
            println!("Status: {}", job.status.as_str());
            println!("Salary: {}", job.salary_range);
            println!("Posted: {}", posted_label(job.posted_date, Utc::now()));
            println!("Match: {}%{}", job.match_percentage, match_note(job.match_percentage));
            println!("Applications: {}  Views: {}", job.applications_count, job.views_count);
            if !job.requirements.is_empty() {
                println!("Requirements: {}", job.requirements.join(", "));
            }
            if !job.description.is_empty() {
                println!("\n--- Description ---\n{}", textwrap::fill(&job.description, 80));
            }
        }

        Commands::Apply {
            job_id,
            cover_letter,
            cover_letter_file,
        } => {
            require_session(&store)?;
            let cover_letter = match cover_letter_file {
                Some(path) => Some(
                    std::fs::read_to_string(&path)
                        .with_context(|| format!("Failed to read cover letter: {}", path.display()))?,
                ),
                None => cover_letter,
            };
            let application = backend.apply(&job_id, cover_letter.as_deref()).await?;
            println!("Applied to job #{} (application {})", job_id, application.id);
        }

        Commands::Applications { status, page, page_size } => {
            require_session(&store)?;
            let filter = ApplicationFilter {
                status: parse_choice(status.as_deref())?,
            };
            let page_size = page_size.unwrap_or(config.applications_page_size);
            let result = api::application_page(&backend, &filter, page, page_size).await?;
            print_applications(&result, filter.status, page);
        }

        Commands::Timeline { id } => {
            require_session(&store)?;
            let application = api::find_application(&backend, &id).await?;
            println!(
                "{} at {} (job #{}, {})",
                application.job_title,
                application.company,
                application.job_id,
                application.status.label()
            );
            println!();
            for event in timeline::derive_timeline(&application) {
                println!(
                    "  {:<12} {}  {}",
                    event.status,
                    event.date.format("%Y-%m-%d %H:%M"),
                    event.description
                );
            }
        }

        Commands::Dashboard => {
            let session = require_session(&store)?;
            match session.user.role {
                Role::Candidate => {
                    let applications = backend.fetch_applications().await?;
                    let jobs = backend.fetch_jobs().await?;
                    let dash = dashboard::candidate_dashboard(&session.user, &applications, &jobs);
                    print_candidate_dashboard(&dash);
                }
                Role::Employer | Role::Admin => {
                    let jobs = backend.fetch_my_jobs().await?;
                    let applications = api::employer_applications(&backend, &jobs).await?;
                    let dash = dashboard::employer_dashboard(&jobs, &applications);
                    print_employer_dashboard(&dash);
                }
            }
        }

        Commands::Browse { status } => {
            require_session(&store)?;
            let status_filter = ApplicationFilter {
                status: parse_choice(status.as_deref())?,
            };
            let applications: Vec<JobApplication> = backend
                .fetch_applications()
                .await?
                .into_iter()
                .filter(|a| status_filter.matches(a))
                .collect();
            tui::run_browse(applications)?;
        }

        Commands::Posting { command } => {
            require_employer(&store)?;
            match command {
                PostingCommands::List { search, status, page, page_size } => {
                    let filter = PostingFilter {
                        search_text: search,
                        status: parse_choice(status.as_deref())?,
                    };
                    let page_size = page_size.unwrap_or(config.jobs_page_size);
                    let jobs = backend.fetch_my_jobs().await?;
                    let summary = dashboard::posting_summary(&jobs);
                    let postings: Vec<Posting> = jobs.into_iter().map(Posting).collect();
                    let result = filter_and_paginate(&postings, &filter, page, page_size)?;
                    print_postings(&result, &summary, page);
                }

                PostingCommands::Status { id, status } => {
                    let status: PostingStatus = status.parse()?;
                    let job = backend.update_job_status(&id, status).await?;
                    println!("Job #{} ({}) is now {}.", job.id, job.title, job.status);
                }

                PostingCommands::Applicants { job_id, status, page, page_size } => {
                    let filter = ApplicationFilter {
                        status: parse_choice(status.as_deref())?,
                    };
                    let page_size = page_size.unwrap_or(config.applications_page_size);
                    let result = api::applicant_page(&backend, &job_id, &filter, page, page_size).await?;
                    print_applicants(&result, page);
                }

                PostingCommands::Review { application_id, status, notes } => {
                    let status: ApplicationStatus = status.parse()?;
                    let application = backend
                        .update_application_status(&application_id, status, notes.as_deref())
                        .await?;
                    tracing::info!(application = %application.id, status = %application.status, "application reviewed");
                    println!(
                        "Application {} is now {}.",
                        application.id,
                        application.status.label()
                    );
                }

                PostingCommands::Delete { id } => {
                    backend.delete_job(&id).await?;
                    println!("Deleted job #{}.", id);
                }
            }
        }

        Commands::Resume { command } => {
            require_session(&store)?;
            match command {
                ResumeCommands::List => {
                    let resumes = backend.fetch_resumes().await?;
                    print_resumes(&resumes);
                }

                ResumeCommands::Upload { file } => {
                    let file_name = file
                        .file_name()
                        .and_then(|n| n.to_str())
                        .ok_or_else(|| anyhow!("Not a file: {}", file.display()))?
                        .to_string();
                    api::validate_resume_name(&file_name)?;
                    let content = tokio::fs::read(&file)
                        .await
                        .with_context(|| format!("Failed to read file: {}", file.display()))?;
                    let size = content.len() as u64;
                    let id = backend.upload_resume(&file_name, content).await?;
                    println!("Uploaded {} ({}) as resume {}.", file_name, format_file_size(size), id);
                }

                ResumeCommands::Delete { id } => {
                    backend.delete_resume(&id).await?;
                    println!("Deleted resume {}.", id);
                }

                ResumeCommands::Primary { id } => {
                    backend.set_primary_resume(&id).await?;
                    println!("Resume {} is now your primary resume.", id);
                }
            }
        }
    }

    Ok(())
}

fn display_name(session: &Session) -> String {
    let name = session.user.full_name();
    if name.is_empty() {
        session.user.email.clone()
    } else {
        name
    }
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::Candidate => "candidate",
        Role::Employer => "employer",
        Role::Admin => "admin",
    }
}

fn match_note(percentage: u8) -> &'static str {
    match MatchBand::of(percentage) {
        MatchBand::Strong => " (strong)",
        MatchBand::Fair => " (fair)",
        MatchBand::Weak => "",
    }
}

fn print_counts<K: Display>(all: usize, counts: &BTreeMap<K, usize>) {
    let tabs: Vec<String> = counts.iter().map(|(k, n)| format!("{} ({})", k, n)).collect();
    println!("All ({})  {}", all, tabs.join("  "));
}

fn print_page_footer(page: usize, total_pages: usize, total: usize) {
    if total > 0 && page > total_pages {
        println!("Page {} is past the last page ({}).", page, total_pages);
    } else if total_pages > 1 {
        println!("Page {} of {} ({} matching)", page, total_pages, total);
    }
}

fn print_jobs(result: &PagedResult<models::JobListing>, page: usize) {
    let all: usize = result.category_counts.values().sum();
    print_counts(all, &result.category_counts);
    println!();

    if result.page_items.is_empty() {
        println!("No jobs found.");
    } else {
        println!(
            "{:<10} {:<30} {:<20} {:<16} {:<11} {:>6}",
            "ID", "TITLE", "COMPANY", "LOCATION", "TYPE", "MATCH"
        );
        println!("{}", "-".repeat(98));
        let now = Utc::now();
        for job in &result.page_items {
            println!(
                "{:<10} {:<30} {:<20} {:<16} {:<11} {:>5}%",
                truncate(&job.id, 10),
                truncate(&job.title, 28),
                truncate(&job.company, 18),
                truncate(&job.location, 14),
                job.employment_type,
                job.match_percentage
            );
            println!("{:<10} {} | {}", "", job.salary_range, posted_label(job.posted_date, now));
        }
    }
    print_page_footer(page, result.total_pages, result.total_filtered_count);
}

fn print_applications(
    result: &PagedResult<JobApplication>,
    status: Option<ApplicationStatus>,
    page: usize,
) {
    let all: usize = result.category_counts.values().sum();
    print_counts(all, &result.category_counts);
    println!();

    if result.page_items.is_empty() {
        match status {
            Some(s) => println!("No {} applications.", s),
            None => println!("No applications found."),
        }
    } else {
        println!(
            "{:<10} {:<12} {:<30} {:<20} {:<12}",
            "ID", "STATUS", "POSITION", "COMPANY", "APPLIED"
        );
        println!("{}", "-".repeat(88));
        for app in &result.page_items {
            println!(
                "{:<10} {:<12} {:<30} {:<20} {:<12}",
                truncate(&app.id, 10),
                app.status,
                truncate(&app.job_title, 28),
                truncate(&app.company, 18),
                app.applied_date.format("%Y-%m-%d")
            );
        }
    }
    print_page_footer(page, result.total_pages, result.total_filtered_count);
}

fn print_candidate_dashboard(dash: &dashboard::CandidateDashboard) {
    println!("Applications submitted: {}", dash.applications_submitted);
    println!("Interviews:             {}", dash.interviews);
    println!("Matches found:          {}", dash.matches_found);
    println!("Profile completion:     {}%", dash.profile_completion);

    if !dash.recent_applications.is_empty() {
        println!("\nRecent applications:");
        for app in &dash.recent_applications {
            println!("  {:<12} {} at {}", app.status, app.job_title, app.company);
        }
    }
    if !dash.recommended_jobs.is_empty() {
        println!("\nRecommended jobs:");
        for job in &dash.recommended_jobs {
            println!("  {:>3}%  {} at {} ({})", job.match_percentage, job.title, job.company, job.location);
        }
    }
}

fn print_employer_dashboard(dash: &dashboard::EmployerDashboard) {
    println!("Active jobs:        {}", dash.active_jobs);
    println!("Total applications: {}", dash.total_applications);
    println!("Shortlisted:        {}", dash.shortlisted);
    println!("Filled positions:   {}", dash.filled_positions);

    if !dash.status_breakdown.is_empty() {
        println!("\nBy status:");
        for (status, count) in &dash.status_breakdown {
            println!("  {:<12} {}", status.label(), count);
        }
    }
    if !dash.top_applicants.is_empty() {
        println!("\nTop applicants:");
        for app in &dash.top_applicants {
            println!(
                "  {:>3}%  {} <{}> for {}",
                app.match_percentage,
                app.candidate_name.as_deref().unwrap_or("Unknown Candidate"),
                app.candidate_email.as_deref().unwrap_or(""),
                app.job_title
            );
        }
    }
    if !dash.recent_applications.is_empty() {
        println!("\nRecent applications:");
        for app in &dash.recent_applications {
            println!(
                "  {:<12} {} for {}",
                app.status,
                app.candidate_name.as_deref().unwrap_or("Unknown Candidate"),
                app.job_title
            );
        }
    }
}

fn print_postings(result: &PagedResult<Posting>, summary: &dashboard::PostingSummary, page: usize) {
    println!(
        "Active: {}  Applications: {}  Views: {}  Drafts: {}",
        summary.active, summary.total_applications, summary.total_views, summary.drafts
    );
    let all: usize = result.category_counts.values().sum();
    print_counts(all, &result.category_counts);
    println!();

    if result.page_items.is_empty() {
        println!("No postings found.");
    } else {
        println!(
            "{:<10} {:<30} {:<8} {:<11} {:>6} {:>6}",
            "ID", "TITLE", "STATUS", "TYPE", "APPS", "VIEWS"
        );
        println!("{}", "-".repeat(76));
        for Posting(job) in &result.page_items {
            println!(
                "{:<10} {:<30} {:<8} {:<11} {:>6} {:>6}",
                truncate(&job.id, 10),
                truncate(&job.title, 28),
                job.status,
                job.employment_type,
                job.applications_count,
                job.views_count
            );
        }
    }
    print_page_footer(page, result.total_pages, result.total_filtered_count);
}

fn print_applicants(result: &PagedResult<JobApplication>, page: usize) {
    let all: usize = result.category_counts.values().sum();
    print_counts(all, &result.category_counts);
    println!();

    if result.page_items.is_empty() {
        println!("No applicants found.");
    } else {
        println!(
            "{:<10} {:<12} {:<24} {:<28} {:>6}",
            "ID", "STATUS", "CANDIDATE", "EMAIL", "MATCH"
        );
        println!("{}", "-".repeat(84));
        for app in &result.page_items {
            println!(
                "{:<10} {:<12} {:<24} {:<28} {:>5}%",
                truncate(&app.id, 10),
                app.status,
                truncate(app.candidate_name.as_deref().unwrap_or("Unknown Candidate"), 22),
                truncate(app.candidate_email.as_deref().unwrap_or(""), 26),
                app.match_percentage
            );
        }
    }
    print_page_footer(page, result.total_pages, result.total_filtered_count);
}

fn print_resumes(resumes: &[Resume]) {
    if resumes.is_empty() {
        println!("No resumes uploaded.");
        return;
    }
    println!("{:<26} {:<30} {:>10} {:<12}", "ID", "FILE", "SIZE", "UPLOADED");
    println!("{}", "-".repeat(82));
    for resume in resumes {
        let marker = if resume.is_primary { " *" } else { "" };
        println!(
            "{:<26} {:<30} {:>10} {:<12}{}",
            truncate(&resume.id, 26),
            truncate(&resume.file_name, 28),
            resume.file_size.map(format_file_size).unwrap_or_default(),
            resume
                .uploaded_at
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "-".to_string()),
            marker
        );
        if !resume.skills.is_empty() {
            println!("{:<26} skills: {}", "", resume.skills.join(", "));
        }
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
