use crate::models::{ApplicationStatus, JobApplication, TimelineEvent};

/// Stages after submission, in track order. A stage shows up once the
/// application has reached it or any stage after it.
const TRACK: [(ApplicationStatus, &str); 4] = [
    (
        ApplicationStatus::Reviewed,
        "Your application is under review by the hiring team",
    ),
    (
        ApplicationStatus::Shortlisted,
        "You have been shortlisted for interview",
    ),
    (ApplicationStatus::Interviewed, "Interview completed"),
    (ApplicationStatus::Offered, "Job offer extended"),
];

const APPLIED_DESCRIPTION: &str = "Application submitted successfully";
const REJECTED_DESCRIPTION: &str = "Application not selected at this time";

/// Expand an application's current status into the history shown on its
/// detail view, earliest first.
///
/// Submission is dated with the applied date; every later stage carries the
/// last-change date since that is the only other timestamp on record.
/// A rejection always yields `Applied, Rejected` and does not keep the stages
/// passed before it.
pub fn derive_timeline(application: &JobApplication) -> Vec<TimelineEvent> {
    let changed = application.last_changed();
    let mut timeline = vec![TimelineEvent {
        status: "Applied".to_string(),
        date: application.applied_date,
        description: APPLIED_DESCRIPTION.to_string(),
    }];

    match application.status.track_position() {
        Some(reached) => {
            for (stage, description) in TRACK.iter() {
                let Some(position) = stage.track_position() else { continue };
                if position > reached {
                    break;
                }
                timeline.push(TimelineEvent {
                    status: stage.label().to_string(),
                    date: changed,
                    description: description.to_string(),
                });
            }
        }
        None => timeline.push(TimelineEvent {
            status: ApplicationStatus::Rejected.label().to_string(),
            date: changed,
            description: REJECTED_DESCRIPTION.to_string(),
        }),
    }

    timeline
}
