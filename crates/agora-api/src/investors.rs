use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::warn;

use agora_db::models::{JobRow, ListingRow, ProfileRow};
use agora_match::Candidate;
use agora_types::api::{Claims, JobMatch, ListingMatch, UpsertProfileRequest};
use agora_types::codes::{CountryCode, join_code_list, parse_category_slug};

use crate::auth::AppState;
use crate::{ApiError, bad_request, convert, join_error, store_error};

/// How many recent candidates the scorer considers per request.
const MATCH_POOL: u32 = 200;

pub async fn upsert_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpsertProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Codes were validated during deserialization; only dedupe here.
    let industries = dedupe(req.industries);
    let stages = dedupe(req.stages);
    let geo_focus = dedupe(req.geo_focus);

    let db = state.clone();
    let caller = claims.sub.to_string();
    let row = tokio::task::spawn_blocking(move || {
        db.db.upsert_investor_profile(
            &caller,
            &join_code_list(&industries),
            &join_code_list(&stages),
            &join_code_list(&geo_focus),
        )
    })
    .await
    .map_err(join_error)?
    .map_err(store_error)?;

    Ok(Json(convert::profile_from_row(row)))
}

#[derive(Debug, Deserialize)]
pub struct MatchQuery {
    pub limit: Option<usize>,
}

pub async fn listing_matches(
    State(state): State<AppState>,
    Query(query): Query<MatchQuery>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = query.limit.unwrap_or(agora_match::DEFAULT_LIMIT).min(50);

    let db = state.clone();
    let caller = claims.sub.to_string();
    let (profile_row, listing_rows) = tokio::task::spawn_blocking(
        move || -> anyhow::Result<(Option<ProfileRow>, Vec<ListingRow>)> {
            let profile = db.db.get_investor_profile(&caller)?;
            let listings = db.db.list_recent_listings(MATCH_POOL)?;
            Ok((profile, listings))
        },
    )
    .await
    .map_err(join_error)?
    .map_err(store_error)?;

    let Some(profile_row) = profile_row else {
        return Err(bad_request("no investor profile on record"));
    };
    let profile = convert::profile_from_row(profile_row);

    let mut listings: Vec<Option<ListingRow>> = Vec::new();
    let mut candidates: Vec<Candidate> = Vec::new();
    for row in listing_rows {
        match candidate_from(&row.category, &row.country) {
            Ok(candidate) => {
                candidates.push(candidate);
                listings.push(Some(row));
            }
            Err(reason) => warn!("Skipping listing {}: {}", row.id, reason),
        }
    }

    let matches: Vec<ListingMatch> = agora_match::rank(&profile, &candidates, limit)
        .into_iter()
        .filter_map(|(index, score)| {
            listings[index]
                .take()
                .map(|row| ListingMatch { listing: convert::listing_from_row(row), score })
        })
        .collect();

    Ok(Json(matches))
}

pub async fn job_matches(
    State(state): State<AppState>,
    Query(query): Query<MatchQuery>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = query.limit.unwrap_or(agora_match::DEFAULT_LIMIT).min(50);

    let db = state.clone();
    let caller = claims.sub.to_string();
    let (profile_row, job_rows) = tokio::task::spawn_blocking(
        move || -> anyhow::Result<(Option<ProfileRow>, Vec<JobRow>)> {
            let profile = db.db.get_investor_profile(&caller)?;
            let jobs = db.db.list_recent_jobs(MATCH_POOL)?;
            Ok((profile, jobs))
        },
    )
    .await
    .map_err(join_error)?
    .map_err(store_error)?;

    let Some(profile_row) = profile_row else {
        return Err(bad_request("no investor profile on record"));
    };
    let profile = convert::profile_from_row(profile_row);

    let mut jobs: Vec<Option<JobRow>> = Vec::new();
    let mut candidates: Vec<Candidate> = Vec::new();
    for row in job_rows {
        match candidate_from(&row.category, &row.country) {
            Ok(candidate) => {
                candidates.push(candidate);
                jobs.push(Some(row));
            }
            Err(reason) => warn!("Skipping job {}: {}", row.id, reason),
        }
    }

    let matches: Vec<JobMatch> = agora_match::rank(&profile, &candidates, limit)
        .into_iter()
        .filter_map(|(index, score)| {
            jobs[index].take().map(|row| JobMatch { job: convert::job_from_row(row), score })
        })
        .collect();

    Ok(Json(matches))
}

/// Build a scoring candidate from stored category/country text. Stored
/// values were validated at write time, so failures only occur on
/// tampered rows; those are skipped rather than failing the request.
fn candidate_from(category: &str, country: &str) -> Result<Candidate, String> {
    let industries = parse_category_slug(category).map_err(|e| e.to_string())?;
    let country: CountryCode = country.parse().map_err(|e: agora_types::codes::UnknownCode| e.to_string())?;
    Ok(Candidate { industries, country })
}

fn dedupe<T: PartialEq>(items: Vec<T>) -> Vec<T> {
    let mut out = Vec::new();
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}
