use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer};

use crate::state::AppState;
use crate::{api, auth};

#[derive(Serialize)]
struct ApiStatus {
    status: &'static str,
    version: &'static str,
}

async fn healthz() -> Json<ApiStatus> {
    Json(ApiStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    if allowed.is_empty() {
        tracing::warn!("CORS_ORIGINS not set; cross-origin requests will be refused");
    } else {
        tracing::info!("CORS allowed origins: {:?}", allowed);
    }

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(tower_http::cors::Any)
}

/// Full HTTP surface. Served with `ConnectInfo<SocketAddr>` so the auth rate
/// limiter can key on the peer address.
pub fn build_router(state: Arc<AppState>, cors_origins: &[String]) -> Router {
    // Rate limiter for auth endpoints: bursts of 10, one token back every 6 s per IP
    let auth_governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(6)
            .burst_size(10)
            .finish()
            .expect("constant rate limiter config is valid"),
    );

    let auth_public = Router::new()
        .route("/register", post(auth::routes::register))
        .route("/login", post(auth::routes::login))
        .route("/refresh", post(auth::routes::refresh))
        .layer(GovernorLayer::new(auth_governor_conf));

    let auth_protected = Router::new()
        .route("/me", get(auth::routes::me))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::require_auth,
        ));

    let public_api = Router::new()
        .route("/follows/{user_id}/followers", get(api::follows::list_followers))
        .route("/follows/{user_id}/following", get(api::follows::list_following))
        .route("/likes/{track_id}", get(api::likes::list_track_likes))
        .route("/likes/{track_id}/count", get(api::likes::like_count))
        .route("/users/{id}/likes", get(api::likes::list_user_likes))
        .route("/comments/{id}", get(api::comments::get_comment))
        .route("/comments/track/{track_id}", get(api::comments::list_track_comments))
        .route(
            "/comments/track/{track_id}/count",
            get(api::comments::track_comment_count),
        )
        .route("/projects/{id}", get(api::projects::get_project))
        .route("/projects/{id}/tracks", get(api::projects::list_project_tracks))
        .route("/tracks/{id}", get(api::tracks::get_track));

    let viewer_aware_api = Router::new()
        .route("/users/{id}", get(api::users::get_user_profile))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::optional_auth,
        ));

    let protected_api = Router::new()
        .route(
            "/follows/{user_id}",
            post(api::follows::follow_user).delete(api::follows::unfollow_user),
        )
        .route("/follows/{user_id}/status", get(api::follows::follow_status))
        .route(
            "/likes/{track_id}",
            post(api::likes::like_track).delete(api::likes::unlike_track),
        )
        .route("/likes/{track_id}/status", get(api::likes::like_status))
        .route("/comments", post(api::comments::create_comment))
        .route(
            "/comments/{id}",
            put(api::comments::update_comment).delete(api::comments::delete_comment),
        )
        .route("/notifications", get(api::notifications::list_notifications))
        .route(
            "/notifications/unread-count",
            get(api::notifications::unread_count),
        )
        .route("/notifications/{id}/read", put(api::notifications::mark_read))
        .route("/notifications/read-all", put(api::notifications::mark_all_read))
        .route("/feed", get(api::feed::get_feed))
        .route("/search", get(api::search::search))
        .route("/search/users", get(api::search::search_users))
        .route("/search/tracks", get(api::search::search_tracks))
        .route("/search/projects", get(api::search::search_projects))
        .route(
            "/projects",
            get(api::projects::list_my_projects).post(api::projects::create_project),
        )
        .route(
            "/projects/{id}",
            put(api::projects::update_project).delete(api::projects::delete_project),
        )
        .route("/projects/{id}/tracks", post(api::projects::add_track))
        .route("/tracks/{id}", axum::routing::delete(api::tracks::delete_track))
        .route("/users/me", put(api::users::update_my_profile))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::require_auth,
        ));

    let api_routes = Router::new()
        .nest("/auth", auth_public.merge(auth_protected))
        .merge(public_api)
        .merge(viewer_aware_api)
        .merge(protected_api);

    Router::new()
        .route("/healthz", get(healthz))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origins))
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=63072000; includeSubDomains; preload"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use armed_core::Social;
    use axum::{
        body::Body,
        extract::ConnectInfo,
        http::{Request, StatusCode},
        response::Response,
    };
    use http_body_util::BodyExt;
    use sea_orm::{ConnectOptions, Database};
    use sea_orm_migration::MigratorTrait;
    use serde_json::{json, Value};
    use std::net::SocketAddr;
    use tower::ServiceExt;

    const TEST_JWT_SECRET: &str = "test-jwt-secret-for-testing-only";

    async fn test_router() -> Router {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1).min_connections(1).sqlx_logging(false);
        let db = Database::connect(opt).await.unwrap();
        armed_migration::Migrator::up(&db, None).await.unwrap();

        let state = Arc::new(AppState {
            social: Social::with_tracing(db),
            jwt_secret: TEST_JWT_SECRET.to_string(),
        });
        build_router(state, &[])
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header("Content-Type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let mut req = builder.body(body).unwrap();
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000))));
        app.clone().oneshot(req).await.unwrap()
    }

    async fn json_body(resp: Response) -> Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    /// Registers a user and returns (id, access token).
    async fn register(app: &Router, username: &str) -> (String, String) {
        let resp = send(
            app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "email": format!("{username}@example.com"),
                "password": "correct-horse",
                "username": username,
            })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body = json_body(resp).await;
        (
            body["user"]["id"].as_str().unwrap().to_string(),
            body["tokens"]["access_token"].as_str().unwrap().to_string(),
        )
    }

    async fn project_with_track(app: &Router, token: &str) -> (String, String) {
        let resp = send(
            app,
            Method::POST,
            "/api/projects",
            Some(token),
            Some(json!({ "name": "Night Session", "daw_type": "ableton" })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let project_id = json_body(resp).await["id"].as_str().unwrap().to_string();

        let resp = send(
            app,
            Method::POST,
            &format!("/api/projects/{project_id}/tracks"),
            Some(token),
            Some(json!({
                "name": "Bassline",
                "file_name": "bassline.wav",
                "file_path": "uploads/bassline.wav",
                "duration_secs": 92.5,
            })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let track_id = json_body(resp).await["id"].as_str().unwrap().to_string();
        (project_id, track_id)
    }

    #[tokio::test]
    async fn test_healthz_and_security_headers() {
        let app = test_router().await;
        let resp = send(&app, Method::GET, "/healthz", None, None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["x-content-type-options"], "nosniff");
        assert_eq!(resp.headers()["x-frame-options"], "DENY");
        assert_eq!(json_body(resp).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_register_login_and_me() {
        let app = test_router().await;
        let (id, _) = register(&app, "mia").await;

        let resp = send(
            &app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "email": "MIA@example.com", "password": "another-pass" })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let resp = send(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "mia@example.com", "password": "wrong-password" })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let resp = send(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "mia@example.com", "password": "correct-horse" })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        let access = body["tokens"]["access_token"].as_str().unwrap().to_string();
        let refresh = body["tokens"]["refresh_token"].as_str().unwrap().to_string();

        let resp = send(&app, Method::GET, "/api/auth/me", Some(&access), None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let me = json_body(resp).await;
        assert_eq!(me["id"], id.as_str());
        assert!(me.get("password_hash").is_none());

        // A refresh token is not an access token
        let resp = send(&app, Method::GET, "/api/auth/me", Some(&refresh), None).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let resp = send(
            &app,
            Method::POST,
            "/api/auth/refresh",
            None,
            Some(json!({ "refresh_token": refresh })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(json_body(resp).await["access_token"].is_string());
    }

    #[tokio::test]
    async fn test_register_rejects_short_password() {
        let app = test_router().await;
        let resp = send(
            &app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "email": "a@example.com", "password": "short" })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_protected_routes_require_token() {
        let app = test_router().await;
        for uri in [
            "/api/feed",
            "/api/notifications",
            "/api/notifications/unread-count",
            "/api/search?q=bass",
        ] {
            let resp = send(&app, Method::GET, uri, None, None).await;
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_follow_like_feed_and_notifications() {
        let app = test_router().await;
        let (artist_id, artist) = register(&app, "artist").await;
        let (_, fan) = register(&app, "fan").await;
        let (_, track_id) = project_with_track(&app, &artist).await;

        let resp = send(&app, Method::POST, &format!("/api/follows/{artist_id}"), Some(&fan), None).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let resp = send(&app, Method::POST, &format!("/api/follows/{artist_id}"), Some(&fan), None).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let resp = send(&app, Method::GET, "/api/feed?limit=10", Some(&fan), None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let feed = json_body(resp).await;
        assert_eq!(feed["total"], 1);
        assert_eq!(feed["has_more"], false);
        assert_eq!(feed["tracks"][0]["id"], track_id.as_str());
        assert_eq!(feed["tracks"][0]["project"]["user"]["id"], artist_id.as_str());
        assert_eq!(feed["tracks"][0]["is_liked"], false);

        let resp = send(&app, Method::GET, "/api/feed?offset=18446744073709551615", Some(&fan), None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let past_end = json_body(resp).await;
        assert_eq!(past_end["tracks"].as_array().unwrap().len(), 0);
        assert_eq!(past_end["total"], 1);

        let resp = send(&app, Method::POST, &format!("/api/likes/{track_id}"), Some(&fan), None).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let resp = send(&app, Method::POST, &format!("/api/likes/{track_id}"), Some(&fan), None).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let resp = send(&app, Method::GET, &format!("/api/likes/{track_id}/count"), None, None).await;
        assert_eq!(json_body(resp).await["count"], 1);

        let resp = send(&app, Method::GET, "/api/feed", Some(&fan), None).await;
        let feed = json_body(resp).await;
        assert_eq!(feed["tracks"][0]["like_count"], 1);
        assert_eq!(feed["tracks"][0]["is_liked"], true);

        // Follow + like
        let resp = send(&app, Method::GET, "/api/notifications/unread-count", Some(&artist), None).await;
        assert_eq!(json_body(resp).await["count"], 2);

        let resp = send(&app, Method::GET, "/api/notifications?unread_only=true", Some(&artist), None).await;
        let page = json_body(resp).await;
        assert_eq!(page["total"], 2);
        let like_notification = page["notifications"]
            .as_array()
            .unwrap()
            .iter()
            .find(|n| n["type"] == "LIKE")
            .unwrap();
        assert_eq!(like_notification["target"]["id"], track_id.as_str());
        let notification_id = like_notification["id"].as_str().unwrap().to_string();

        // Someone else's notification is invisible to the fan
        let uri = format!("/api/notifications/{notification_id}/read");
        let resp = send(&app, Method::PUT, &uri, Some(&fan), None).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = send(&app, Method::PUT, &uri, Some(&artist), None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json_body(resp).await["read"], true);

        let resp = send(&app, Method::PUT, "/api/notifications/read-all", Some(&artist), None).await;
        assert_eq!(json_body(resp).await["updated"], 1);
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let app = test_router().await;
        let (me_id, me) = register(&app, "solo").await;
        let (_, other) = register(&app, "other").await;
        let (project_id, track_id) = project_with_track(&app, &me).await;

        let resp = send(&app, Method::POST, &format!("/api/follows/{me_id}"), Some(&me), None).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let missing = uuid::Uuid::new_v4();
        let resp = send(&app, Method::GET, &format!("/api/tracks/{missing}"), None, None).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = send(&app, Method::DELETE, &format!("/api/projects/{project_id}"), Some(&other), None).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let resp = send(
            &app,
            Method::POST,
            "/api/comments",
            Some(&other),
            Some(json!({ "track_id": track_id, "content": "   " })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_comment_lifecycle() {
        let app = test_router().await;
        let (_, artist) = register(&app, "artist").await;
        let (_, fan) = register(&app, "fan").await;
        let (_, track_id) = project_with_track(&app, &artist).await;

        let resp = send(
            &app,
            Method::POST,
            "/api/comments",
            Some(&fan),
            Some(json!({ "track_id": track_id, "content": "  love the groove  " })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let comment = json_body(resp).await;
        assert_eq!(comment["content"], "love the groove");
        let comment_id = comment["id"].as_str().unwrap().to_string();

        let uri = format!("/api/comments/{comment_id}");
        let resp = send(&app, Method::PUT, &uri, Some(&artist), Some(json!({ "content": "mine now" }))).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let resp = send(&app, Method::PUT, &uri, Some(&fan), Some(json!({ "content": "edited" }))).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = send(&app, Method::GET, &format!("/api/comments/track/{track_id}"), None, None).await;
        let comments = json_body(resp).await;
        assert_eq!(comments[0]["content"], "edited");
        assert_eq!(comments[0]["user"]["username"], "fan");

        let resp = send(&app, Method::DELETE, &uri, Some(&fan), None).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let resp = send(&app, Method::GET, &format!("/api/comments/track/{track_id}/count"), None, None).await;
        assert_eq!(json_body(resp).await["count"], 0);
    }

    #[tokio::test]
    async fn test_profile_is_viewer_aware() {
        let app = test_router().await;
        let (artist_id, artist) = register(&app, "artist").await;
        let (_, fan) = register(&app, "fan").await;
        project_with_track(&app, &artist).await;
        send(&app, Method::POST, &format!("/api/follows/{artist_id}"), Some(&fan), None).await;

        let uri = format!("/api/users/{artist_id}");
        let anonymous = json_body(send(&app, Method::GET, &uri, None, None).await).await;
        assert_eq!(anonymous["is_following"], false);
        assert_eq!(anonymous["is_own_profile"], false);
        assert_eq!(anonymous["stats"]["followers"], 1);
        assert_eq!(anonymous["stats"]["tracks"], 1);
        assert!(anonymous["user"].get("email").is_none());

        let as_fan = json_body(send(&app, Method::GET, &uri, Some(&fan), None).await).await;
        assert_eq!(as_fan["is_following"], true);

        let as_owner = json_body(send(&app, Method::GET, &uri, Some(&artist), None).await).await;
        assert_eq!(as_owner["is_own_profile"], true);
        assert_eq!(as_owner["user"]["email"], "artist@example.com");

        let resp = send(
            &app,
            Method::PUT,
            "/api/users/me",
            Some(&fan),
            Some(json!({ "username": "artist" })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_search_routes() {
        let app = test_router().await;
        let (artist_id, artist) = register(&app, "bassface").await;
        let (_, fan) = register(&app, "fan").await;
        project_with_track(&app, &artist).await;

        let resp = send(&app, Method::GET, "/api/search?q=BASS", Some(&fan), None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let results = json_body(resp).await;
        assert_eq!(results["users"][0]["id"], artist_id.as_str());
        assert!(results["users"][0].get("email").is_none());
        assert_eq!(results["tracks"][0]["name"], "Bassline");
        assert_eq!(results["tracks"][0]["project"]["user"]["username"], "bassface");
        assert!(results["projects"].as_array().unwrap().is_empty());

        let resp = send(&app, Method::GET, "/api/search/projects?q=night&limit=5", Some(&fan), None).await;
        let projects = json_body(resp).await;
        assert_eq!(projects[0]["name"], "Night Session");
        assert_eq!(projects[0]["tracks_count"], 1);

        let resp = send(&app, Method::GET, "/api/search/tracks?q=%20%20", Some(&fan), None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(json_body(resp).await.as_array().unwrap().is_empty());

        let resp = send(&app, Method::GET, "/api/search/users", Some(&fan), None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(json_body(resp).await.as_array().unwrap().is_empty());
    }
}
