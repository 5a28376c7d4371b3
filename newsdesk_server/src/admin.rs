use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use log::info;
use newsdesk::editorial::{self, DashboardStats, PostDraft, StatusFilter};
use newsdesk::models::{Post, SiteSettings, Subscriber};
use newsdesk::settings::{self, SettingFlag};
use newsdesk::storage::{self, StoredImage};
use newsdesk::subscribers;
use serde::{Deserialize, Serialize};

use crate::middleware::Admin;
use crate::{ApiError, AppState, FILE_NAME_HEADER};

type ApiResult<T> = Result<Json<T>, ApiError>;

pub(crate) fn routes(state: &AppState) -> Router<AppState> {
    // One byte over the limit still reaches the handler, which reports it.
    let body_limit = usize::try_from(state.max_upload_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(1);
    Router::new()
        .route("/stats", get(stats))
        .route("/posts", get(list_posts).post(create_post))
        .route(
            "/posts/{id}",
            get(get_post).put(update_post).delete(destroy_post),
        )
        .route("/posts/{id}/trash", post(trash_post))
        .route("/posts/{id}/restore", post(restore_post))
        .route("/posts/{id}/publish", post(publish_post))
        .route("/posts/{id}/unpublish", post(unpublish_post))
        .route("/trash", get(list_trash))
        .route("/settings", get(get_settings).put(save_settings))
        .route("/settings/toggle/{flag}", post(toggle_setting))
        .route("/subscribers", get(list_subscribers))
        .route(
            "/uploads",
            post(upload).layer(DefaultBodyLimit::max(body_limit)),
        )
}

async fn stats(State(state): State<AppState>) -> ApiResult<DashboardStats> {
    Ok(Json(state.run(|conn| editorial::dashboard_stats(conn)).await?))
}

#[derive(Deserialize)]
struct StatusQuery {
    status: Option<String>,
}

async fn list_posts(
    State(state): State<AppState>,
    Query(q): Query<StatusQuery>,
) -> ApiResult<Vec<Post>> {
    let status = match q.status {
        Some(status) => status.parse::<StatusFilter>()?,
        None => StatusFilter::default(),
    };
    Ok(Json(
        state.run(move |conn| editorial::list_posts(conn, status)).await?,
    ))
}

async fn create_post(
    State(state): State<AppState>,
    Extension(Admin(admin)): Extension<Admin>,
    Json(draft): Json<PostDraft>,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    let author = *admin.id;
    let post = state
        .run(move |conn| editorial::create_post(conn, author, &draft))
        .await?;
    Ok((StatusCode::CREATED, Json(post)))
}

async fn get_post(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Post> {
    Ok(Json(state.run(move |conn| editorial::get_post(conn, id)).await?))
}

async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(draft): Json<PostDraft>,
) -> ApiResult<Post> {
    Ok(Json(
        state
            .run(move |conn| editorial::update_post(conn, id, &draft))
            .await?,
    ))
}

async fn destroy_post(
    State(state): State<AppState>,
    Extension(Admin(admin)): Extension<Admin>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .run(move |conn| editorial::destroy_post(conn, id))
        .await?;
    info!("{} destroyed post {id}", admin.email);
    Ok(StatusCode::NO_CONTENT)
}

async fn trash_post(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Post> {
    Ok(Json(state.run(move |conn| editorial::trash_post(conn, id)).await?))
}

async fn restore_post(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Post> {
    Ok(Json(
        state.run(move |conn| editorial::restore_post(conn, id)).await?,
    ))
}

async fn publish_post(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Post> {
    Ok(Json(
        state
            .run(move |conn| editorial::set_published(conn, id, true))
            .await?,
    ))
}

async fn unpublish_post(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Post> {
    Ok(Json(
        state
            .run(move |conn| editorial::set_published(conn, id, false))
            .await?,
    ))
}

async fn list_trash(State(state): State<AppState>) -> ApiResult<Vec<Post>> {
    Ok(Json(state.run(|conn| editorial::list_trash(conn)).await?))
}

async fn get_settings(State(state): State<AppState>) -> ApiResult<SiteSettings> {
    Ok(Json(state.run(|conn| settings::load_settings(conn)).await?))
}

async fn save_settings(
    State(state): State<AppState>,
    Json(mut body): Json<SiteSettings>,
) -> ApiResult<SiteSettings> {
    Ok(Json(
        state
            .run(move |conn| {
                settings::save_settings(conn, &mut body)?;
                Ok(body)
            })
            .await?,
    ))
}

#[derive(Serialize)]
struct FlagState {
    flag: SettingFlag,
    enabled: bool,
}

async fn toggle_setting(
    State(state): State<AppState>,
    Path(flag): Path<String>,
) -> ApiResult<FlagState> {
    let flag: SettingFlag = flag.parse()?;
    let enabled = state.run(move |conn| settings::toggle(conn, flag)).await?;
    Ok(Json(FlagState { flag, enabled }))
}

async fn list_subscribers(State(state): State<AppState>) -> ApiResult<Vec<Subscriber>> {
    Ok(Json(
        state.run(|conn| subscribers::list_subscribers(conn)).await?,
    ))
}

async fn upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<StoredImage>), ApiError> {
    let name = headers
        .get(FILE_NAME_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ApiError::bad_request(format!("missing {FILE_NAME_HEADER} header")))?
        .to_string();
    let store = state.store.clone();
    let max = state.max_upload_bytes;
    let stored = tokio::task::spawn_blocking(move || {
        storage::upload_image(store.as_ref(), &name, &body, max)
    })
    .await??;
    Ok((StatusCode::CREATED, Json(stored)))
}
