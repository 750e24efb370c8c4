//! HTTP tests for the netgo router.
//!
//! Most requests go straight into the router with `oneshot`, so no socket
//! is bound; the shutdown test at the end serves a real listener. Cookies are carried by hand: the helper keeps the `name=value`
//! pair from each `Set-Cookie` and sends it back in a `Cookie` header.

use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use axum_extra::extract::cookie::Cookie;
use netgo::{AppState, NetgoServer, ServerConfig, router};
use netgo_game::GameView;
use netgo_protocol::GameId;
use netgo_session::Credential;
use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct TestApp {
    router: Router,
    state: AppState,
}

struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Value,
}

impl TestResponse {
    fn set_cookies(&self) -> Vec<Cookie<'static>> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|v| Cookie::parse_encoded(v.to_owned()).ok())
            .collect()
    }

    fn cookie(&self, name: &str) -> Option<Cookie<'static>> {
        self.set_cookies().into_iter().find(|c| c.name() == name)
    }

    /// The `name=value` pair of the auth cookie exactly as it was sent.
    fn auth_header(&self) -> String {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with("ngo_auth="))
            .and_then(|v| v.split(';').next())
            .map(str::to_owned)
            .expect("response should set ngo_auth")
    }

    fn error_type(&self) -> &str {
        self.body["error"]["type"].as_str().unwrap_or_default()
    }
}

impl TestApp {
    fn new() -> Self {
        Self::with_config(ServerConfig {
            long_poll_timeout: Duration::from_secs(10),
            ..ServerConfig::default()
        })
    }

    fn with_config(config: ServerConfig) -> Self {
        let state = AppState::in_memory(config);
        Self {
            router: router(state.clone()),
            state,
        }
    }

    fn request(method: Method, path: &str, body: Option<Value>, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let body = match body {
            Some(value) => Body::from(value.to_string()),
            None => Body::empty(),
        };
        builder.body(body).unwrap()
    }

    async fn send(router: Router, req: Request<Body>) -> TestResponse {
        let response = router.oneshot(req).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        TestResponse {
            status,
            headers,
            body,
        }
    }

    async fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        cookie: Option<&str>,
    ) -> TestResponse {
        Self::send(self.router.clone(), Self::request(method, path, body, cookie)).await
    }

    /// Signs a new account up and returns its auth cookie pair.
    async fn signup(&self, username: &str) -> String {
        let res = self
            .call(
                Method::POST,
                "/api/accounts/signup",
                Some(json!({ "username": username, "password": "password123" })),
                None,
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "signup {username}: {}", res.body);
        res.auth_header()
    }

    /// Creates a 9x9 game with `black` holding black, returning its id.
    async fn create_game(&self, cookie: &str, black: &str, white: &str) -> u64 {
        let res = self
            .call(
                Method::POST,
                "/api/games/",
                Some(new_game(black, white)),
                Some(cookie),
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "create: {}", res.body);
        res.body["uid"].as_u64().unwrap()
    }
}

fn new_game(black: &str, white: &str) -> Value {
    json!({
        "game": {
            "BoardSize": 9,
            "PlayerColor": "black",
            "BlackPlayerName": black,
            "WhitePlayerName": white,
            "Score": { "ForfeitColor": null, "BlackPoints": 0, "WhitePoints": 0, "Komi": 6.5 }
        }
    })
}

/// A 9x9 board with one black stone at `coord`, as an update body.
fn one_stone(coord: usize) -> Value {
    let mut board = vec![0; 81];
    board[coord] = 1;
    json!({
        "game": {
            "BoardSize": 9,
            "Board": board,
            "LastMoveBlack": { "moveType": 1, "piece": 1, "coord": coord },
            "History": [{ "moveType": 1, "piece": 1, "coord": coord }],
            "PlayerColor": "black"
        }
    })
}

async fn wait_for_waiter(state: &AppState, id: u64) {
    for _ in 0..200 {
        if state.hub().pending(&GameId(id)) > 0 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("long poll never registered for game {id}");
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_signup_sets_both_cookies() {
    let app = TestApp::new();
    let res = app
        .call(
            Method::POST,
            "/api/accounts/signup",
            Some(json!({ "username": "tim", "password": "password123" })),
            None,
        )
        .await;

    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["username"], "tim");
    assert!(res.body["uid"].as_u64().is_some());

    let auth = res.cookie("ngo_auth").unwrap();
    assert_eq!(auth.http_only(), Some(true));
    assert_eq!(auth.path(), Some("/"));
    assert!(auth.value().contains("::"));

    let viewer = res.cookie("ngo_viewer_data").unwrap();
    assert_ne!(viewer.http_only(), Some(true));
    let data: Value = serde_json::from_str(viewer.value()).unwrap();
    assert_eq!(data["username"], "tim");
    assert_eq!(data["id"], res.body["uid"]);
}

#[tokio::test]
async fn test_signup_duplicate_username_conflict() {
    let app = TestApp::new();
    app.signup("tim").await;

    let res = app
        .call(
            Method::POST,
            "/api/accounts/signup",
            Some(json!({ "username": "tim", "password": "different123" })),
            None,
        )
        .await;
    assert_eq!(res.status, StatusCode::CONFLICT);
    assert_eq!(res.error_type(), "CONFLICT");
}

#[tokio::test]
async fn test_signup_invalid_body_lists_arguments() {
    let app = TestApp::new();
    let res = app
        .call(
            Method::POST,
            "/api/accounts/signup",
            Some(json!({ "username": "", "password": "short" })),
            None,
        )
        .await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.error_type(), "BADREQUEST");
    let args = res.body["invalidArgs"].as_array().unwrap();
    assert_eq!(args.len(), 2);
    assert_eq!(args[0]["field"], "Username");
    assert_eq!(args[0]["tag"], "required");
    assert_eq!(args[1]["field"], "Password");
    assert_eq!(args[1]["tag"], "gte");
    assert_eq!(args[1]["param"], "8");
}

#[tokio::test]
async fn test_signup_malformed_json_bad_request() {
    let app = TestApp::new();
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/accounts/signup")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let res = TestApp::send(app.router.clone(), req).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_signin_rotates_credential() {
    let app = TestApp::new();
    let old = app.signup("tim").await;

    let res = app
        .call(
            Method::POST,
            "/api/accounts/signin",
            Some(json!({ "username": "tim", "password": "password123" })),
            None,
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    let new = res.auth_header();
    assert_ne!(old, new);

    let res = app.call(Method::GET, "/api/games/", None, Some(&old)).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.error_type(), "AUTHORIZATION");
    assert_eq!(res.body["error"]["message"], "Provided session is invalid");
    assert_eq!(res.cookie("ngo_auth").unwrap().value(), "");
    assert!(res.cookie("ngo_viewer_data").is_some());

    let res = app.call(Method::GET, "/api/games/", None, Some(&new)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["games"], json!([]));
}

#[tokio::test]
async fn test_signin_wrong_password_not_found() {
    let app = TestApp::new();
    app.signup("tim").await;

    let res = app
        .call(
            Method::POST,
            "/api/accounts/signin",
            Some(json!({ "username": "tim", "password": "wrongpass1" })),
            None,
        )
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.error_type(), "NOTFOUND");

    let res = app
        .call(
            Method::POST,
            "/api/accounts/signin",
            Some(json!({ "username": "nobody", "password": "password123" })),
            None,
        )
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_signout_clears_cookies() {
    let app = TestApp::new();
    let cookie = app.signup("tim").await;

    let res = app
        .call(Method::POST, "/api/accounts/signout", None, Some(&cookie))
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["message"], "signed out");

    let auth = res.cookie("ngo_auth").unwrap();
    assert_eq!(auth.value(), "");
    assert_eq!(auth.max_age(), Some(time::Duration::ZERO));
    assert_eq!(res.cookie("ngo_viewer_data").unwrap().value(), "");
}

#[tokio::test]
async fn test_games_without_cookie_unauthorized() {
    let app = TestApp::new();
    for (method, path) in [
        (Method::GET, "/api/games/"),
        (Method::GET, "/api/games/1"),
        (Method::DELETE, "/api/games/1"),
        (Method::GET, "/api/games/1/long"),
    ] {
        let res = app.call(method, path, None, None).await;
        assert_eq!(res.status, StatusCode::UNAUTHORIZED, "{path}");
    }

    let res = app
        .call(Method::GET, "/api/games/", None, Some("ngo_auth=1::forged"))
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Games
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_game_lifecycle_both_players() {
    let app = TestApp::new();
    let tim = app.signup("tim").await;
    let sally = app.signup("sally").await;

    let id = app.create_game(&tim, "tim", "sally").await;

    let res = app
        .call(Method::GET, &format!("/api/games/{id}"), None, Some(&sally))
        .await;
    assert_eq!(res.status, StatusCode::OK);
    let game = &res.body["game"];
    assert_eq!(game["ID"], id.to_string());
    assert_eq!(game["PlayerColor"], "white");
    assert_eq!(game["BlackPlayerName"], "tim");
    assert_eq!(game["WhitePlayerName"], "sally");
    assert_eq!(game["Version"], 1);

    let res = app
        .call(Method::GET, "/api/games", None, Some(&tim))
        .await;
    assert_eq!(res.status, StatusCode::OK);
    let games = res.body["games"].as_array().unwrap();
    assert_eq!(games.len(), 1);
    assert_eq!(games[0]["PlayerColor"], "black");

    let res = app
        .call(
            Method::POST,
            &format!("/api/games/{id}"),
            Some(one_stone(40)),
            Some(&tim),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["game"]["Board"][40], 1);
    assert_eq!(res.body["game"]["Version"], 2);
    assert_eq!(res.body["game"]["WhitePlayerName"], "sally");

    let res = app
        .call(Method::DELETE, &format!("/api/games/{id}"), None, Some(&sally))
        .await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);

    let res = app
        .call(Method::GET, &format!("/api/games/{id}"), None, Some(&tim))
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_game_rules() {
    let app = TestApp::new();
    let tim = app.signup("tim").await;
    app.signup("sally").await;

    let res = app
        .call(Method::POST, "/api/games/", Some(new_game("tim", "tim")), Some(&tim))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app
        .call(Method::POST, "/api/games/", Some(new_game("sally", "tim")), Some(&tim))
        .await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = app
        .call(Method::POST, "/api/games/", Some(new_game("tim", "ghost")), Some(&tim))
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = app
        .call(
            Method::POST,
            "/api/games/",
            Some(json!({ "game": { "BoardSize": 7, "PlayerColor": "black" } })),
            Some(&tim),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_non_participant_forbidden() {
    let app = TestApp::new();
    let tim = app.signup("tim").await;
    app.signup("sally").await;
    let mallory = app.signup("mallory").await;
    let id = app.create_game(&tim, "tim", "sally").await;

    for (method, path, body) in [
        (Method::GET, format!("/api/games/{id}"), None),
        (Method::POST, format!("/api/games/{id}"), Some(one_stone(0))),
        (Method::DELETE, format!("/api/games/{id}"), None),
        (Method::GET, format!("/api/games/{id}/long"), None),
    ] {
        let res = app.call(method, &path, body, Some(&mallory)).await;
        assert_eq!(res.status, StatusCode::FORBIDDEN, "{path}");
        assert_eq!(res.error_type(), "FORBIDDEN");
    }

    let res = app.call(Method::GET, "/api/games/", None, Some(&mallory)).await;
    assert_eq!(res.body["games"], json!([]));
}

#[tokio::test]
async fn test_bad_game_id_bad_request() {
    let app = TestApp::new();
    let tim = app.signup("tim").await;

    let res = app
        .call(Method::GET, "/api/games/abc", None, Some(&tim))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        res.body["error"]["message"],
        "Bad request. Reason: Invalid URI parameter for game ID"
    );
}

// ---------------------------------------------------------------------------
// Long polling
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_long_poll_receives_opponent_update() {
    let app = TestApp::new();
    let tim = app.signup("tim").await;
    let sally = app.signup("sally").await;
    let id = app.create_game(&tim, "tim", "sally").await;

    let poll = tokio::spawn(TestApp::send(
        app.router.clone(),
        TestApp::request(Method::GET, &format!("/api/games/{id}/long"), None, Some(&sally)),
    ));
    wait_for_waiter(&app.state, id).await;

    let res = app
        .call(
            Method::POST,
            &format!("/api/games/{id}"),
            Some(one_stone(12)),
            Some(&tim),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);

    let res = poll.await.unwrap();
    assert_eq!(res.status, StatusCode::OK);
    let game = &res.body["game"];
    assert_eq!(game["Board"][12], 1);
    assert_eq!(game["PlayerColor"], "white");
    assert_eq!(game["Version"], 2);
    assert_eq!(app.state.hub().pending(&GameId(id)), 0);
}

#[tokio::test]
async fn test_long_poll_wakes_every_waiter() {
    let app = TestApp::new();
    let tim = app.signup("tim").await;
    let sally = app.signup("sally").await;
    let id = app.create_game(&tim, "tim", "sally").await;

    let mut polls = Vec::new();
    for cookie in [&tim, &sally, &sally] {
        polls.push(tokio::spawn(TestApp::send(
            app.router.clone(),
            TestApp::request(Method::GET, &format!("/api/games/{id}/wait"), None, Some(cookie)),
        )));
    }
    for _ in 0..200 {
        if app.state.hub().pending(&GameId(id)) == 3 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(app.state.hub().pending(&GameId(id)), 3);

    app.call(
        Method::POST,
        &format!("/api/games/{id}"),
        Some(one_stone(3)),
        Some(&tim),
    )
    .await;

    for poll in polls {
        let res = poll.await.unwrap();
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.body["game"]["Board"][3], 1);
    }
}

#[tokio::test]
async fn test_long_poll_since_older_version_returns_immediately() {
    let app = TestApp::new();
    let tim = app.signup("tim").await;
    app.signup("sally").await;
    let id = app.create_game(&tim, "tim", "sally").await;

    app.call(
        Method::POST,
        &format!("/api/games/{id}"),
        Some(one_stone(5)),
        Some(&tim),
    )
    .await;

    let res = app
        .call(
            Method::GET,
            &format!("/api/games/{id}/long?since=1"),
            None,
            Some(&tim),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["game"]["Version"], 2);
    assert_eq!(app.state.hub().pending(&GameId(id)), 0);
}

#[tokio::test]
async fn test_long_poll_timeout_gateway_timeout() {
    let app = TestApp::with_config(ServerConfig {
        long_poll_timeout: Duration::from_millis(100),
        ..ServerConfig::default()
    });
    let tim = app.signup("tim").await;
    app.signup("sally").await;
    let id = app.create_game(&tim, "tim", "sally").await;

    let res = app
        .call(Method::GET, &format!("/api/games/{id}/long"), None, Some(&tim))
        .await;
    assert_eq!(res.status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(res.error_type(), "TIMEOUT");
    assert_eq!(app.state.hub().pending(&GameId(id)), 0);
}

#[tokio::test]
async fn test_long_poll_unknown_game_not_found() {
    let app = TestApp::new();
    let tim = app.signup("tim").await;

    let res = app
        .call(Method::GET, "/api/games/999/long", None, Some(&tim))
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(app.state.hub().key_count(), 0);
}

#[tokio::test]
async fn test_long_poll_shutdown_service_unavailable() {
    let app = TestApp::with_config(ServerConfig {
        long_poll_timeout: Duration::from_secs(10),
        shutdown_grace: Duration::from_secs(3),
        ..ServerConfig::default()
    });
    let tim = app.signup("tim").await;
    app.signup("sally").await;
    let id = app.create_game(&tim, "tim", "sally").await;

    let poll = tokio::spawn(TestApp::send(
        app.router.clone(),
        TestApp::request(Method::GET, &format!("/api/games/{id}/long"), None, Some(&tim)),
    ));
    wait_for_waiter(&app.state, id).await;

    assert_eq!(app.state.hub().shutdown_all(), 1);

    let res = poll.await.unwrap();
    assert_eq!(res.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(res.error_type(), "UNAVAILABLE");
    assert_eq!(res.headers[header::RETRY_AFTER], "3");

    let res = app
        .call(Method::GET, &format!("/api/games/{id}/long"), None, Some(&tim))
        .await;
    assert_eq!(res.status, StatusCode::SERVICE_UNAVAILABLE);

    // Writes keep working while the server drains.
    let res = app
        .call(
            Method::POST,
            &format!("/api/games/{id}"),
            Some(one_stone(1)),
            Some(&tim),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
}

#[tokio::test]
async fn test_long_poll_cancelled_by_shutdown_token() {
    let app = TestApp::new();
    let tim = app.signup("tim").await;
    app.signup("sally").await;
    let id = app.create_game(&tim, "tim", "sally").await;

    let poll = tokio::spawn(TestApp::send(
        app.router.clone(),
        TestApp::request(Method::GET, &format!("/api/games/{id}/long"), None, Some(&tim)),
    ));
    wait_for_waiter(&app.state, id).await;

    app.state.shutdown.cancel();

    let res = poll.await.unwrap();
    assert_eq!(res.status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(res.headers.contains_key(header::RETRY_AFTER));
    assert_eq!(app.state.hub().pending(&GameId(id)), 0);
}

#[tokio::test]
async fn test_long_poll_abandoned_request_unsubscribes() {
    let app = TestApp::new();
    let tim = app.signup("tim").await;
    app.signup("sally").await;
    let id = app.create_game(&tim, "tim", "sally").await;

    let poll = tokio::spawn(TestApp::send(
        app.router.clone(),
        TestApp::request(Method::GET, &format!("/api/games/{id}/long"), None, Some(&tim)),
    ));
    wait_for_waiter(&app.state, id).await;

    poll.abort();
    let _ = poll.await;
    assert_eq!(app.state.hub().pending(&GameId(id)), 0);
}

// ---------------------------------------------------------------------------
// Served over a socket
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_run_shutdown_answers_open_poll_and_returns() {
    let server = NetgoServer::builder()
        .config(ServerConfig {
            long_poll_timeout: Duration::from_secs(30),
            shutdown_grace: Duration::from_secs(2),
            ..ServerConfig::default()
        })
        .bind(([127, 0, 0, 1], 0).into())
        .build()
        .await
        .unwrap();
    let addr = server.local_addr().unwrap();
    let state = server.state().clone();
    let shutdown = server.shutdown();

    let tim = state.accounts.signup("tim", "password123").await.unwrap();
    state.accounts.signup("sally", "password123").await.unwrap();
    let seat = netgo_game::Seat {
        user_id: tim.user_id,
        username: tim.username.clone(),
    };
    let view: GameView = serde_json::from_value(new_game("tim", "sally")["game"].clone()).unwrap();
    let id = state.games.create(seat, &view).await.unwrap().id;

    let running = tokio::spawn(server.run());

    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!(
        "GET /api/games/{}/long HTTP/1.1\r\nHost: {addr}\r\nCookie: ngo_auth={}\r\nConnection: close\r\n\r\n",
        id.0,
        Credential::for_session(&tim),
    );
    stream.write_all(request.as_bytes()).await.unwrap();
    wait_for_waiter(&state, id.0).await;

    shutdown.trigger();

    let mut raw = Vec::new();
    tokio::time::timeout(Duration::from_secs(2), stream.read_to_end(&mut raw))
        .await
        .expect("poll should be answered during shutdown")
        .unwrap();
    let raw = String::from_utf8_lossy(&raw);
    assert!(raw.starts_with("HTTP/1.1 503"), "{raw}");
    assert!(raw.to_ascii_lowercase().contains("retry-after: 2"), "{raw}");

    let result = tokio::time::timeout(Duration::from_secs(3), running)
        .await
        .expect("run should return within the grace period")
        .unwrap();
    assert!(result.is_ok());
    assert!(state.hub().is_closed());
    assert_eq!(state.hub().total_pending(), 0);
}
