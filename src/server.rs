//! HTTP transport over the round registry.
//!
//! Every response carries the round `uuid` (null when there is none) and a
//! human readable `message`, so thin browser clients can poll a round with
//! nothing more than `GET /rounds/{id}`.

use crate::arena::{ArenaError, Invitation, MailboxView, RoundRegistry, Submission};
use crate::board::BoardSpec;
use crate::players::{AttackInstruction, DefendInstruction, PlayerKind, Role, GIVE_UP};
use crate::round::{parse_kind, RoundError, RoundId, RoundSpec};
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower::ServiceBuilder;
use tracing::{debug, info, instrument, warn};

/// Shared handler state.
pub type AppState = Arc<RoundRegistry>;

/// Body of `POST /rounds`. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateRoundRequest {
    /// Side lengths, e.g. `"[4,4]"`.
    #[serde(default)]
    pub board_shape: Option<String>,
    /// Nested layout, e.g. `"[[2,0],[0,2]]"`.
    #[serde(default)]
    pub board_tiles: Option<String>,
    /// `Random`, `Strategy`, `Manual` or `Online`.
    #[serde(default)]
    pub attacker_type: Option<String>,
    /// `Random`, `Strategy`, `Manual` or `Online`.
    #[serde(default)]
    pub defender_type: Option<String>,
    /// Role left open for a second remote player.
    #[serde(default)]
    pub unoccupied_role: Option<Role>,
}

/// Body of the attack and defend routes: `"1,3"`, `"0,-1"` or `"giveup"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveRequest {
    /// Instruction text.
    pub instruction: String,
}

/// Generic reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    /// Round the reply is about.
    pub uuid: Option<RoundId>,
    /// What happened.
    pub message: String,
}

impl Reply {
    fn new(uuid: Option<RoundId>, message: impl Into<String>) -> Self {
        Self {
            uuid,
            message: message.into(),
        }
    }
}

/// Reply to a move submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveReply {
    /// Round the move was sent to.
    pub uuid: RoundId,
    /// What happened.
    pub message: String,
    /// Whether the waiting role took the instruction.
    pub accepted: bool,
    /// Instruction as parsed, present when one was delivered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attacker_instruction: Option<AttackInstruction>,
    /// Instruction as parsed, present when one was delivered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defender_instruction: Option<DefendInstruction>,
}

/// Reply to `GET /rounds/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayReply {
    /// Always `"Current situation"`.
    pub message: String,
    /// Round state.
    #[serde(flatten)]
    pub view: MailboxView,
}

/// Reply to `GET /rounds/unoccupied`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnoccupiedReply {
    /// Always null.
    pub uuid: Option<RoundId>,
    /// What happened.
    pub message: String,
    /// One open invitation, picked at random.
    pub unoccupied: Option<Invitation>,
}

/// Handler failure rendered as a [`Reply`] with a status code.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    reply: Reply,
}

impl ApiError {
    fn not_found() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            reply: Reply::new(None, "Nothing happened"),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            reply: Reply::new(None, message),
        }
    }
}

impl From<ArenaError> for ApiError {
    fn from(error: ArenaError) -> Self {
        let status = match &error {
            ArenaError::AdmissionLimitReached { .. } | ArenaError::Closed => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ArenaError::Round { .. } => StatusCode::BAD_REQUEST,
            ArenaError::Spawn { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let message = match &error {
            ArenaError::AdmissionLimitReached { .. } => {
                "Too many players, please wait and retry later".to_string()
            }
            other => other.to_string(),
        };
        Self {
            status,
            reply: Reply::new(None, message),
        }
    }
}

impl From<RoundError> for ApiError {
    fn from(error: RoundError) -> Self {
        Self::bad_request(error.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.reply)).into_response()
    }
}

/// Builds the router with request logging.
pub fn router(registry: AppState) -> Router {
    Router::new()
        .route("/rounds", post(create_round))
        .route("/rounds/unoccupied", get(unoccupied))
        .route("/rounds/{id}", get(display))
        .route("/rounds/{id}/attack", post(attack))
        .route("/rounds/{id}/defend", post(defend))
        .route("/rounds/{id}/claim/{role}", post(claim))
        .layer(ServiceBuilder::new().map_request(|req: Request<Body>| {
            debug!(method = %req.method(), uri = %req.uri(), "Request received");
            req
        }))
        .with_state(registry)
}

/// Starts a round. Defaults: shape `[4,4]`, `Random` attacker, `Online` defender.
#[instrument(skip(registry))]
pub async fn create_round(
    State(registry): State<AppState>,
    Json(request): Json<CreateRoundRequest>,
) -> Result<Json<Reply>, ApiError> {
    let board = BoardSpec::parse(
        request.board_shape.as_deref().unwrap_or("[4,4]"),
        request.board_tiles.as_deref().unwrap_or(""),
    )
    .map_err(|e| ApiError::bad_request(e.to_string()))?;
    let attacker = match request.attacker_type.as_deref() {
        Some(name) => parse_kind(Role::Attacker, name)?,
        None => PlayerKind::Random,
    };
    let defender = match request.defender_type.as_deref() {
        Some(name) => parse_kind(Role::Defender, name)?,
        None => PlayerKind::Remote,
    };

    // Threads are spawned and the cap lock taken off the async executor.
    let spec = RoundSpec::new(board, attacker, defender);
    let invitation = request.unoccupied_role;
    let id = tokio::task::spawn_blocking(move || registry.create_round(spec, invitation))
        .await
        .map_err(|e| ArenaError::Spawn {
            reason: e.to_string(),
        })??;

    info!(round_id = %id, "Round created over HTTP");
    Ok(Json(Reply::new(Some(id), "A new game might have started")))
}

/// Picks one open invitation.
#[instrument(skip(registry))]
pub async fn unoccupied(State(registry): State<AppState>) -> Json<UnoccupiedReply> {
    Json(UnoccupiedReply {
        uuid: None,
        message: "List of unoccupied games".to_string(),
        unoccupied: registry.pick_unoccupied(),
    })
}

/// Current situation of a round.
#[instrument(skip(registry))]
pub async fn display(
    State(registry): State<AppState>,
    Path(id): Path<RoundId>,
) -> Result<Json<DisplayReply>, ApiError> {
    let view = registry.display(&id).ok_or_else(ApiError::not_found)?;
    Ok(Json(DisplayReply {
        message: "Current situation".to_string(),
        view,
    }))
}

/// Feeds the round's remote attacker.
#[instrument(skip(registry))]
pub async fn attack(
    State(registry): State<AppState>,
    Path(id): Path<RoundId>,
    Json(request): Json<MoveRequest>,
) -> Result<Json<MoveReply>, ApiError> {
    let instruction = AttackInstruction::from_text(&request.instruction);
    let submission = registry
        .submit_attack(&id, instruction.clone())
        .ok_or_else(ApiError::not_found)?;

    let accepted = submission == Submission::Accepted;
    let message = match submission {
        Submission::NotPossibleNow => "Attack is not possible now",
        Submission::Accepted if request.instruction.trim() == GIVE_UP => "Attacker surrendered",
        Submission::Accepted => "Attack instruction is sent",
    };
    if !accepted {
        warn!(round_id = %id, "Attack arrived while attacker was not waiting");
    }
    Ok(Json(MoveReply {
        uuid: id,
        message: message.to_string(),
        accepted,
        attacker_instruction: accepted.then_some(instruction),
        defender_instruction: None,
    }))
}

/// Feeds the round's remote defender.
#[instrument(skip(registry))]
pub async fn defend(
    State(registry): State<AppState>,
    Path(id): Path<RoundId>,
    Json(request): Json<MoveRequest>,
) -> Result<Json<MoveReply>, ApiError> {
    let instruction = DefendInstruction::from_text(&request.instruction);
    let submission = registry
        .submit_defend(&id, instruction.clone())
        .ok_or_else(ApiError::not_found)?;

    let accepted = submission == Submission::Accepted;
    let message = match submission {
        Submission::NotPossibleNow => "Defend is not possible now",
        Submission::Accepted if request.instruction.trim() == GIVE_UP => "Defender surrendered",
        Submission::Accepted => "Defend instruction is sent",
    };
    if !accepted {
        warn!(round_id = %id, "Defend arrived while defender was not waiting");
    }
    Ok(Json(MoveReply {
        uuid: id,
        message: message.to_string(),
        accepted,
        attacker_instruction: None,
        defender_instruction: accepted.then_some(instruction),
    }))
}

/// Takes the open role of a round.
#[instrument(skip(registry))]
pub async fn claim(
    State(registry): State<AppState>,
    Path((id, role)): Path<(RoundId, Role)>,
) -> Result<Json<Reply>, ApiError> {
    let claimed = registry.claim(&id, role).ok_or_else(ApiError::not_found)?;
    let message = if claimed {
        format!("{} role claimed", role)
    } else {
        format!("{} role is not open", role)
    };
    Ok(Json(Reply::new(Some(id), message)))
}
