use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Multipart, Path, Query, State},
    http::{header, HeaderMap, Method, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use gallery_shared::constants::{SESSION_COOKIE, TOKEN_TTL_SECS};
use gallery_shared::{Category, Page, UploadedFile};
use gallery_store::Image;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::auth::AuthService;
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::images::{ImageStore, ImageView};
use crate::rate_limit::{login_throttle_middleware, LoginThrottle};

#[derive(Clone)]
pub struct AppState {
    pub images: ImageStore,
    pub auth: AuthService,
    pub login_throttle: LoginThrottle,
    pub config: Arc<ServerConfig>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    let login_routes = Router::new()
        .route("/login", post(login))
        .route_layer(middleware::from_fn_with_state(
            state.login_throttle.clone(),
            login_throttle_middleware,
        ));

    let mut router = Router::new()
        .route("/health", get(health_check))
        .route("/categories", get(list_categories))
        .route("/images", get(list_images).post(create_image))
        .route(
            "/images/:id",
            get(get_image).post(update_image).delete(delete_image),
        )
        .route("/logout", post(logout))
        .merge(login_routes);

    let endpoint = format!("/{}", state.config.gallery_endpoint.trim_matches('/'));
    if endpoint == "/" {
        warn!("GALLERY_ENDPOINT is the site root, static image serving disabled");
    } else {
        router = router.nest_service(&endpoint, ServeDir::new(&state.config.image_directory));
    }

    router
        .layer(DefaultBodyLimit::max(state.config.max_upload_size))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request / response bodies
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct CategoryResponse {
    key: &'static str,
    name: &'static str,
}

#[derive(Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Serialize)]
struct LoginResponse {
    authenticated: bool,
}

#[derive(Deserialize)]
struct ListQuery {
    page: Option<usize>,
    size: Option<usize>,
    category: Option<String>,
}

/// Fields of the image upload/edit form, as sent.
#[derive(Default)]
struct ImageForm {
    title: Option<String>,
    description: Option<String>,
    category: Option<String>,
    file: Option<UploadedFile>,
}

/// An [`ImageForm`] that passed validation.
struct ValidImageForm {
    title: String,
    description: Option<String>,
    category: Category,
    file: Option<UploadedFile>,
}

impl ImageForm {
    fn validate(self) -> Result<ValidImageForm, ServerError> {
        let title = self
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ServerError::BadRequest("Missing title".to_string()))?;

        let category = self
            .category
            .filter(|c| !c.is_empty())
            .ok_or_else(|| ServerError::BadRequest("Missing category".to_string()))?
            .parse::<Category>()
            .map_err(|e| ServerError::BadRequest(e.to_string()))?;

        Ok(ValidImageForm {
            title,
            description: self.description.filter(|d| !d.trim().is_empty()),
            category,
            file: self.file,
        })
    }
}

// ---------------------------------------------------------------------------
// Public handlers
// ---------------------------------------------------------------------------

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn list_categories() -> Json<Vec<CategoryResponse>> {
    Json(
        Category::ALL
            .iter()
            .map(|c| CategoryResponse {
                key: c.as_str(),
                name: c.display_name(),
            })
            .collect(),
    )
}

async fn list_images(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<ImageView>>, ServerError> {
    let category = match query.category.as_deref() {
        None | Some("") => None,
        Some(code) => Some(
            code.parse::<Category>()
                .map_err(|e| ServerError::BadRequest(e.to_string()))?,
        ),
    };
    let page_no = query.page.unwrap_or(1);
    let page_size = query.size.unwrap_or(state.config.page_size);

    let images = state.images.clone();
    let page = blocking(move || images.list_page(page_no, page_size, category)).await?;
    Ok(Json(page))
}

async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ServerError> {
    let Json(req) = payload?;
    let auth = state.auth.clone();
    let username = req.username.clone();
    let valid = blocking(move || auth.verify_login(&req.username, &req.password)).await?;

    if !valid {
        return Err(ServerError::InvalidCredentials);
    }

    let token = state.auth.issue_session(&username);
    info!(username = %username, "User logged in");

    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .max_age(time::Duration::seconds(TOKEN_TTL_SECS))
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(state.config.mode.is_prod());

    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            authenticated: true,
        }),
    ))
}

async fn logout(jar: CookieJar) -> impl IntoResponse {
    (
        jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
        Json(LoginResponse {
            authenticated: false,
        }),
    )
}

// ---------------------------------------------------------------------------
// Authenticated handlers
// ---------------------------------------------------------------------------

async fn create_image(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ImageView>), ServerError> {
    require_session(&jar, &headers, &state)?;
    let form = read_image_form(multipart).await?.validate()?;

    let images = state.images.clone();
    let saved = blocking(move || {
        let image = Image::new(form.title, form.description, form.category);
        images.save(image, form.file.as_ref())
    })
    .await?;

    Ok((StatusCode::CREATED, Json(state.images.view(&saved))))
}

async fn get_image(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<ImageView>, ServerError> {
    require_session(&jar, &headers, &state)?;

    let images = state.images.clone();
    let image = blocking(move || images.get(id))
        .await?
        .ok_or(ServerError::ImageNotFound(id))?;

    Ok(Json(state.images.view(&image)))
}

async fn update_image(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<ImageView>, ServerError> {
    require_session(&jar, &headers, &state)?;
    let form = read_image_form(multipart).await?.validate()?;

    let images = state.images.clone();
    let saved = blocking(move || {
        let mut image = images.get(id)?.ok_or(ServerError::ImageNotFound(id))?;
        image.title = form.title;
        image.description = form.description;
        image.category = form.category;
        images.save(image, form.file.as_ref())
    })
    .await?;

    Ok(Json(state.images.view(&saved)))
}

async fn delete_image(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<ImageView>, ServerError> {
    require_session(&jar, &headers, &state)?;

    let images = state.images.clone();
    let removed = blocking(move || images.delete(id)).await?;

    Ok(Json(state.images.view(&removed)))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Username of the session carried by the `gallery` cookie or an
/// `Authorization: Bearer` header. A cookie that does not validate does not
/// hide a valid bearer token.
fn require_session(
    jar: &CookieJar,
    headers: &HeaderMap,
    state: &AppState,
) -> Result<String, ServerError> {
    let resolve = |token: &str| state.auth.resolve_session(token);

    let from_cookie = jar.get(SESSION_COOKIE).and_then(|c| resolve(c.value()));

    from_cookie
        .or_else(|| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .and_then(resolve)
        })
        .ok_or(ServerError::Unauthorized)
}

async fn read_image_form(mut multipart: Multipart) -> Result<ImageForm, ServerError> {
    let mut form = ImageForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();

        if name == "image" {
            let filename = field.file_name().unwrap_or("").to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| ServerError::BadRequest(format!("Failed to read field: {}", e)))?;
            form.file = Some(UploadedFile::new(filename, data.to_vec()));
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| ServerError::BadRequest(format!("Failed to read field: {}", e)))?;

        match name.as_str() {
            "title" => form.title = Some(value),
            "description" => form.description = Some(value),
            "category" => form.category = Some(value),
            _ => {}
        }
    }

    Ok(form)
}

/// Run blocking storage and filesystem work off the async workers.
async fn blocking<T, F>(f: F) -> Result<T, ServerError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ServerError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ServerError::Internal(format!("Blocking task failed: {e}")))?
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}
