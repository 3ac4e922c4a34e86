use crate::contact::{extract_contact, normalize_phone, ErrorBody, EventFields};
use crate::countries::CountryTable;
use crate::normalizer::Normalizer;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;
use warp::http::header::HeaderValue;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

const MAX_BODY_BYTES: u64 = 16 * 1024;

pub const SERVICE_NAME: &str = "contact-parser";

pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Debug, Clone, Deserialize)]
pub struct NormalizeRequest {
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    status: &'static str,
    error: ErrorBody,
}

fn with_table(
    table: Arc<CountryTable>,
) -> impl Filter<Extract = (Arc<CountryTable>,), Error = Infallible> + Clone {
    warp::any().map(move || table.clone())
}

fn json_body<T>() -> impl Filter<Extract = (T,), Error = Rejection> + Clone
where
    T: for<'de> Deserialize<'de> + Send,
{
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

fn status_for(success: bool) -> StatusCode {
    if success {
        StatusCode::OK
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    }
}

fn respond<T: Serialize>(body: &T, status: StatusCode) -> impl Reply {
    warp::reply::with_status(warp::reply::json(body), status)
}

/// Tags a finished reply with a fresh request id and logs its outcome.
fn with_request_id(reply: impl Reply) -> Response {
    let request_id = Uuid::new_v4();
    let mut response = reply.into_response();
    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    info!(%request_id, status = response.status().as_u16(), "request handled");
    response
}

async fn handle_contact(
    table: Arc<CountryTable>,
    event: EventFields,
) -> Result<impl Reply, Infallible> {
    let record = extract_contact(&Normalizer::new(&table), &event);

    match &record.error {
        None => debug!(channel = ?record.channel, "contact extracted"),
        Some(error) => warn!(kind = %error.kind, "contact extraction failed: {}", error.message),
    }
    Ok(respond(&record, status_for(record.is_success())))
}

async fn handle_normalize(
    table: Arc<CountryTable>,
    request: NormalizeRequest,
) -> Result<impl Reply, Infallible> {
    let raw = request.phone.unwrap_or_default();
    let report = normalize_phone(&Normalizer::new(&table), &raw);

    debug!(status = ?report.status, classification = %report.classification, "phone normalized");
    Ok(respond(&report, status_for(report.is_success())))
}

async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (code, kind, message) =
        if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
            (StatusCode::BAD_REQUEST, "bad_request", e.to_string())
        } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
            (StatusCode::PAYLOAD_TOO_LARGE, "bad_request", "request body too large".to_string())
        } else if err.find::<warp::reject::UnsupportedMediaType>().is_some() {
            (StatusCode::UNSUPPORTED_MEDIA_TYPE, "bad_request", "expected a JSON body".to_string())
        } else if let Some(e) = err.find::<warp::cors::CorsForbidden>() {
            (StatusCode::FORBIDDEN, "forbidden", e.to_string())
        } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
            (StatusCode::METHOD_NOT_ALLOWED, "method_not_allowed", "method not allowed".to_string())
        } else if err.is_not_found() {
            (StatusCode::NOT_FOUND, "not_found", "no such route".to_string())
        } else {
            warn!("unhandled rejection: {:?}", err);
            (StatusCode::INTERNAL_SERVER_ERROR, "internal", "internal error".to_string())
        };

    let body = ErrorResponse {
        status: "error",
        error: ErrorBody::new(kind, message),
    };
    Ok(warp::reply::with_status(warp::reply::json(&body), code))
}

/// All routes of the service, with CORS, JSON error replies and an
/// `x-request-id` header on every response.
pub fn routes(
    table: Arc<CountryTable>,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["content-type"])
        .allow_methods(vec!["GET", "POST", "OPTIONS"]);

    let contact_route = warp::path("contact")
        .and(warp::path::end())
        .and(warp::post())
        .and(with_table(table.clone()))
        .and(json_body::<EventFields>())
        .and_then(handle_contact);

    let normalize_route = warp::path("normalize")
        .and(warp::path::end())
        .and(warp::post())
        .and(with_table(table.clone()))
        .and(json_body::<NormalizeRequest>())
        .and_then(handle_normalize);

    let countries_route = warp::path("countries")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_table(table))
        .map(|table: Arc<CountryTable>| warp::reply::json(&*table));

    let health_route = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .map(|| {
            warp::reply::json(&json!({
                "status": "ok",
                "service": SERVICE_NAME
            }))
        });

    contact_route
        .or(normalize_route)
        .or(countries_route)
        .or(health_route)
        .with(cors)
        .recover(handle_rejection)
        .map(with_request_id)
}
