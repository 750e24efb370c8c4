//! HTTP handlers.
//!
//! # Accounts
//!
//! ```text
//! POST /api/accounts/signup   {username, password} → 201 {uid, username} + cookies
//! POST /api/accounts/signin   {username, password} → 200 {uid, username} + cookies
//! GET  /api/accounts/signout                       → 200, cookies expired
//! ```
//!
//! # Games (all require the credential cookie)
//!
//! ```text
//! GET    /api/games/          → {games: [GameView]}
//! POST   /api/games/          {game: GameView} → 201 {uid}
//! GET    /api/games/{id}      → {game: GameView}
//! POST   /api/games/{id}      {game: GameView} → {game: GameView}, then waiters wake
//! DELETE /api/games/{id}      → 204
//! GET    /api/games/{id}/long → {game: GameView} | 504 | 503
//! ```

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum_extra::extract::cookie::CookieJar;
use netgo_game::GameView;
use netgo_hub::WaitOutcome;
use netgo_protocol::{GameId, UserId};
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::cookies;
use crate::error::{ApiError, InvalidArgument};
use crate::state::AppState;

const USERNAME_LEN: (usize, usize) = (1, 30);
const PASSWORD_LEN: (usize, usize) = (8, 30);

// ---------------------------------------------------------------------------
// Request / response bodies
// ---------------------------------------------------------------------------

/// Body of sign-up and sign-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl AccountRequest {
    /// Checks both fields, reporting every violation at once.
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut invalid = Vec::new();
        check_len("Username", &self.username, USERNAME_LEN, true, &mut invalid);
        check_len("Password", &self.password, PASSWORD_LEN, false, &mut invalid);

        if invalid.is_empty() {
            Ok(())
        } else {
            Err(ApiError::invalid_args(invalid))
        }
    }
}

fn check_len(
    field: &str,
    value: &str,
    (min, max): (usize, usize),
    echo: bool,
    out: &mut Vec<InvalidArgument>,
) {
    let len = value.chars().count();
    let (tag, param) = if len == 0 {
        ("required", String::new())
    } else if len < min {
        ("gte", min.to_string())
    } else if len > max {
        ("lte", max.to_string())
    } else {
        return;
    };

    out.push(InvalidArgument {
        field: field.to_string(),
        // Passwords are never echoed back.
        value: if echo { value.to_string() } else { String::new() },
        tag: tag.to_string(),
        param,
    });
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountResponse {
    pub uid: UserId,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameEnvelope {
    pub game: GameView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameList {
    pub games: Vec<GameView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedGame {
    pub uid: GameId,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WaitParams {
    /// The `Version` of the game the client last saw.
    pub since: Option<u64>,
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
}

fn game_id(raw: &str) -> Result<GameId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::bad_request("Invalid URI parameter for game ID"))
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<AccountRequest>, JsonRejection>,
) -> Result<(StatusCode, CookieJar, Json<AccountResponse>), ApiError> {
    let req = body(payload)?;
    req.validate()?;

    let session = state.accounts.signup(&req.username, &req.password).await?;
    let jar = cookies::issue(jar, &state.config.session, &session);

    Ok((
        StatusCode::CREATED,
        jar,
        Json(AccountResponse {
            uid: session.user_id,
            username: session.username,
        }),
    ))
}

pub async fn signin(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<AccountRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<AccountResponse>), ApiError> {
    let req = body(payload)?;
    req.validate()?;

    let session = state.accounts.signin(&req.username, &req.password).await?;
    let jar = cookies::issue(jar, &state.config.session, &session);

    Ok((
        jar,
        Json(AccountResponse {
            uid: session.user_id,
            username: session.username,
        }),
    ))
}

/// Makes the client forget its credential. The server-side token stays
/// valid until the next sign-in rotates it.
pub async fn signout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<serde_json::Value>) {
    let jar = cookies::clear(jar, &state.config.session);
    (jar, Json(serde_json::json!({ "message": "signed out" })))
}

// ---------------------------------------------------------------------------
// Games
// ---------------------------------------------------------------------------

pub async fn list_games(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<GameList>, ApiError> {
    let games = state.games.list_by_user(user.user_id()).await?;
    let games = games
        .iter()
        .map(|g| GameView::from_game(g, user.user_id()))
        .collect();
    Ok(Json(GameList { games }))
}

pub async fn create_game(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<GameEnvelope>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedGame>), ApiError> {
    let req = body(payload)?;
    let game = state.games.create(user.seat(), &req.game).await?;
    Ok((StatusCode::CREATED, Json(CreatedGame { uid: game.id })))
}

pub async fn get_game(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<GameEnvelope>, ApiError> {
    let id = game_id(&id)?;
    let game = state.games.get(user.user_id(), id).await?;
    Ok(Json(GameEnvelope {
        game: GameView::from_game(&game, user.user_id()),
    }))
}

pub async fn update_game(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<GameEnvelope>, JsonRejection>,
) -> Result<Json<GameEnvelope>, ApiError> {
    let id = game_id(&id)?;
    let req = body(payload)?;
    let game = state.games.update(user.user_id(), id, &req.game).await?;
    Ok(Json(GameEnvelope {
        game: GameView::from_game(&game, user.user_id()),
    }))
}

pub async fn delete_game(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = game_id(&id)?;
    state.games.delete(user.user_id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Long poll: answers with the next committed version of the game, 504
/// if none arrives within the configured deadline, or 503 while the
/// server shuts down.
///
/// If the client goes away, axum drops this future and the hub
/// registration goes with it.
pub async fn wait_game(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    params: Result<Query<WaitParams>, QueryRejection>,
) -> Result<Json<GameEnvelope>, ApiError> {
    let id = game_id(&id)?;
    let Query(params) = params.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;

    let cancel = state.shutdown.child_token();
    let outcome = state
        .games
        .wait_for_change(
            user.user_id(),
            id,
            params.since,
            state.config.long_poll_timeout,
            &cancel,
        )
        .await?;

    match outcome {
        WaitOutcome::Delivered(game) => Ok(Json(GameEnvelope {
            game: GameView::from_game(&game, user.user_id()),
        })),
        WaitOutcome::TimedOut => Err(ApiError::timeout()),
        WaitOutcome::Closed | WaitOutcome::Cancelled => Err(ApiError::unavailable(
            state.config.shutdown_grace.as_secs().max(1),
        )),
    }
}
