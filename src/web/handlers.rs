use askama::Template;
use axum::{
    extract::{Multipart, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use flyercal::components::flyer::request::ACCEPTED_FORMATS;
use flyercal::components::flyer::{Notification, ICS_CONTENT_TYPE, ICS_FILENAME};
use flyercal::error::Error;
use flyercal::Upload;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::web::AppState;

/// Name of the cookie carrying the session id
pub const SESSION_COOKIE: &str = "flyercal_session";

/// The single page: form, notifications and status text
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub status: String,
    pub notifications: Vec<Notification>,
    pub has_default_credential: bool,
    pub accept: String,
    pub filename: &'static str,
}

fn session_id(jar: &CookieJar) -> Option<Uuid> {
    jar.get(SESSION_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
}

fn with_session_cookie(jar: CookieJar, id: Uuid) -> CookieJar {
    jar.add(
        Cookie::build((SESSION_COOKIE, id.to_string()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Strict),
    )
}

/// Handler for the index page
pub async fn index_handler(State(state): State<AppState>, jar: CookieJar) -> Response {
    let (id, session) = state.sessions.get_or_create(session_id(&jar)).await;
    let (status, notifications) = {
        let mut session = session.lock().await;
        (session.status_text(), session.take_notifications())
    };

    let page = IndexTemplate {
        status,
        notifications,
        has_default_credential: state.pipeline.has_default_credential(),
        accept: ACCEPTED_FORMATS
            .iter()
            .map(|ext| format!(".{}", ext))
            .collect::<Vec<_>>()
            .join(","),
        filename: ICS_FILENAME,
    };

    match page.render() {
        Ok(html) => (with_session_cookie(jar, id), Html(html)).into_response(),
        Err(e) => {
            let err = Error::Template(e.to_string());
            error!("Failed to render page: {}", err);
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
        }
    }
}

/// Handler for flyer uploads
pub async fn upload_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    mut multipart: Multipart,
) -> Response {
    let (id, session) = state.sessions.get_or_create(session_id(&jar)).await;
    // Held for the whole extraction so this session's requests run one at a time
    let mut session = session.lock().await;

    let mut api_key = None;
    let mut flyer = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!("Failed to read multipart body: {}", e);
                session.notify(Notification::error(format!(
                    "Error reading the image file: {}",
                    e
                )));
                return (with_session_cookie(jar, id), Redirect::to("/")).into_response();
            }
        };

        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "api_key" => {
                if let Ok(value) = field.text().await {
                    api_key = Some(value);
                }
            }
            "flyer" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                match field.bytes().await {
                    // Browsers send an empty part when no file was chosen
                    Ok(data) if filename.is_empty() && data.is_empty() => {}
                    Ok(data) => flyer = Some(Upload::from_bytes(filename, data.to_vec())),
                    Err(e) => {
                        warn!("Failed to read uploaded flyer: {}", e);
                        session.notify(Notification::error(format!(
                            "Error reading the image file: {}",
                            e
                        )));
                        return (with_session_cookie(jar, id), Redirect::to("/"))
                            .into_response();
                    }
                }
            }
            _ => {}
        }
    }

    if session
        .upload(&state.pipeline, flyer, api_key.as_deref())
        .await
    {
        info!(session = %id, "Flyer processed");
    }

    (with_session_cookie(jar, id), Redirect::to("/")).into_response()
}

/// Handler for the calendar download
pub async fn download_handler(State(state): State<AppState>, jar: CookieJar) -> Response {
    // Only an existing session can hold extracted text
    let artifact = match state.sessions.get(session_id(&jar)).await {
        Some(session) => session.lock().await.download(),
        None => None,
    };

    match artifact {
        Some(bytes) => (
            [
                (header::CONTENT_TYPE, ICS_CONTENT_TYPE.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", ICS_FILENAME),
                ),
            ],
            bytes,
        )
            .into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

// Handler for API health check
pub async fn health_handler() -> &'static str {
    "OK"
}
