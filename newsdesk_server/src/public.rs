use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use newsdesk::engagement::{self, CommentAuthor, CommentView};
use newsdesk::frontpage::{self, ArticlePage, ArticleWithSidebar, CategoryPage, HomePage};
use newsdesk::models::{Post, Profile, Session, Subscriber};
use newsdesk::{auth, subscribers, Error};
use serde::{Deserialize, Serialize};

use crate::middleware::bearer_token;
use crate::{ApiError, AppState, VISITOR_HEADER};

type ApiResult<T> = Result<Json<T>, ApiError>;
type Created<T> = Result<(StatusCode, Json<T>), ApiError>;

pub(crate) fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/home", get(home))
        .route("/api/hero", get(hero))
        .route("/api/latest", get(latest))
        .route("/api/search", get(search))
        .route("/api/categories/{category}", get(category))
        .route("/api/categories/{category}/{slug}", get(article_by_slug))
        .route("/api/articles/{id}", get(article))
        .route(
            "/api/articles/{id}/comments",
            get(comments).post(add_comment),
        )
        .route("/api/articles/{id}/like", post(like))
        .route("/api/subscribe", post(subscribe))
}

pub(crate) fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/signup", post(sign_up))
        .route("/api/auth/login", post(sign_in))
        .route("/api/auth/logout", post(sign_out))
}

async fn home(State(state): State<AppState>) -> ApiResult<HomePage> {
    Ok(Json(state.run(|conn| frontpage::home_page(conn)).await?))
}

async fn hero(State(state): State<AppState>) -> ApiResult<Vec<Post>> {
    Ok(Json(state.run(|conn| frontpage::hero(conn)).await?))
}

#[derive(Deserialize)]
struct LatestQuery {
    limit: Option<i32>,
}

async fn latest(
    State(state): State<AppState>,
    Query(q): Query<LatestQuery>,
) -> ApiResult<Vec<Post>> {
    Ok(Json(
        state.run(move |conn| frontpage::latest(conn, q.limit)).await?,
    ))
}

#[derive(Deserialize)]
struct SearchQuery {
    #[serde(default)]
    q: String,
}

async fn search(
    State(state): State<AppState>,
    Query(q): Query<SearchQuery>,
) -> ApiResult<Vec<Post>> {
    Ok(Json(state.run(move |conn| frontpage::search(conn, &q.q)).await?))
}

async fn category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> ApiResult<CategoryPage> {
    Ok(Json(
        state
            .run(move |conn| frontpage::category_page(conn, &category))
            .await?,
    ))
}

async fn article_by_slug(
    State(state): State<AppState>,
    Path((category, slug)): Path<(String, String)>,
) -> ApiResult<ArticlePage> {
    Ok(Json(
        state
            .run(move |conn| frontpage::article_by_slug(conn, &category, &slug))
            .await?,
    ))
}

async fn article(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<ArticleWithSidebar> {
    Ok(Json(
        state.run(move |conn| frontpage::article_by_id(conn, id)).await?,
    ))
}

async fn comments(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Vec<CommentView>> {
    Ok(Json(
        state
            .run(move |conn| {
                // Only published articles expose their discussion.
                frontpage::article_by_id(conn, id)?;
                engagement::list_comments(conn, id)
            })
            .await?,
    ))
}

#[derive(Deserialize)]
struct NewComment {
    content: String,
    /// Name given by a reader who is not signed in.
    #[serde(default)]
    author: Option<String>,
}

async fn add_comment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<NewComment>,
) -> Created<CommentView> {
    let token = bearer_token(&headers);
    let comment = state
        .run(move |conn| {
            let author = match token {
                Some(token) => CommentAuthor::Member(auth::current_profile(conn, &token)?),
                None => CommentAuthor::Guest(body.author),
            };
            engagement::add_comment(conn, id, &author, &body.content)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

#[derive(Serialize)]
struct Likes {
    likes: i64,
}

async fn like(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> ApiResult<Likes> {
    let visitor = headers
        .get(VISITOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let likes = state
        .run(move |conn| engagement::like_article(&mut **conn, id, &visitor))
        .await?;
    Ok(Json(Likes { likes }))
}

#[derive(Deserialize)]
struct EmailBody {
    email: String,
}

async fn subscribe(
    State(state): State<AppState>,
    Json(body): Json<EmailBody>,
) -> Created<Subscriber> {
    let subscriber = state
        .run(move |conn| subscribers::subscribe(conn, &body.email))
        .await?;
    Ok((StatusCode::CREATED, Json(subscriber)))
}

#[derive(Deserialize)]
struct SignUp {
    email: String,
    password: String,
    #[serde(default)]
    full_name: Option<String>,
}

async fn sign_up(State(state): State<AppState>, Json(body): Json<SignUp>) -> Created<Profile> {
    let profile = state
        .run(move |conn| {
            auth::sign_up(conn, &body.email, &body.password, body.full_name.as_deref())
        })
        .await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

#[derive(Deserialize)]
struct Credentials {
    email: String,
    password: String,
}

async fn sign_in(
    State(state): State<AppState>,
    Json(body): Json<Credentials>,
) -> ApiResult<Session> {
    let ttl = state.session_ttl;
    Ok(Json(
        state
            .run(move |conn| auth::sign_in(conn, &body.email, &body.password, ttl))
            .await?,
    ))
}

async fn sign_out(State(state): State<AppState>, headers: HeaderMap) -> Result<StatusCode, ApiError> {
    let token = bearer_token(&headers).ok_or(Error::Unauthenticated)?;
    let existed = state.run(move |conn| auth::sign_out(conn, &token)).await?;
    if !existed {
        return Err(Error::Unauthenticated.into());
    }
    Ok(StatusCode::NO_CONTENT)
}
