use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use agora_types::api::{ApplyToJobRequest, Claims, CreateJobRequest};
use agora_types::codes::parse_category_slug;
use agora_types::models::NotificationKind;

use crate::auth::AppState;
use crate::{ApiError, bad_request, conflict, convert, join_error, not_found, notify, store_error};

pub async fn create_job(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateJobRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.title.trim().is_empty() {
        return Err(bad_request("job title must not be empty"));
    }
    if let Err(e) = parse_category_slug(&req.category) {
        return Err(bad_request(&e.to_string()));
    }

    let db = state.clone();
    let owner = claims.sub.to_string();
    let row = tokio::task::spawn_blocking(move || {
        db.db.create_job(&owner, req.title.trim(), &req.category, req.country.as_str())
    })
    .await
    .map_err(join_error)?
    .map_err(store_error)?;

    Ok((StatusCode::CREATED, Json(convert::job_from_row(row))))
}

enum ApplyOutcome {
    Applied(String),
    JobMissing,
    OwnJob,
    AlreadyApplied,
}

pub async fn apply_to_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ApplyToJobRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let jid = job_id.to_string();
    let applicant = claims.sub.to_string();
    let username = claims.username.clone();

    let outcome = tokio::task::spawn_blocking(move || -> anyhow::Result<ApplyOutcome> {
        let Some(job) = db.db.get_job(&jid)? else {
            return Ok(ApplyOutcome::JobMissing);
        };
        if job.owner_id == applicant {
            return Ok(ApplyOutcome::OwnJob);
        }
        if db.db.has_applied(&jid, &applicant)? {
            return Ok(ApplyOutcome::AlreadyApplied);
        }

        let application_id =
            db.db.create_job_application(&jid, &applicant, req.cover_note.as_deref())?;
        notify(
            &db.db,
            &job.owner_id,
            NotificationKind::JobApplication,
            &format!("{} applied to \"{}\"", username, job.title),
            req.cover_note.as_deref(),
            Some(&format!("/jobs/{}", jid)),
        );
        Ok(ApplyOutcome::Applied(application_id))
    })
    .await
    .map_err(join_error)?
    .map_err(store_error)?;

    match outcome {
        ApplyOutcome::Applied(application_id) => Ok((
            StatusCode::CREATED,
            Json(serde_json::json!({ "application_id": application_id })),
        )),
        ApplyOutcome::JobMissing => Err(not_found()),
        ApplyOutcome::OwnJob => Err(bad_request("you cannot apply to your own job posting")),
        ApplyOutcome::AlreadyApplied => Err(conflict("you have already applied to this job")),
    }
}
