//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Field names are camelCase on the wire; reference solutions never leave the server.

use serde::{Deserialize, Serialize};

use crate::domain::{Badge, BadgeTrigger, Category, Challenge, Level, Progress, User};
use crate::progress::Summary;

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    SignIn {
        id: String,
        username: String,
    },
    SignOut {
        #[serde(rename = "sessionId")]
        session_id: String,
    },
    ListChallenges {
        category: Category,
        level: Level,
        #[serde(rename = "sessionId", default)]
        session_id: Option<String>,
    },
    GetChallenge {
        #[serde(rename = "challengeId")]
        challenge_id: String,
    },
    Submit {
        #[serde(rename = "sessionId")]
        session_id: String,
        #[serde(rename = "challengeId")]
        challenge_id: String,
        code: String,
    },
    Dashboard {
        #[serde(rename = "sessionId")]
        session_id: String,
    },
    Profile {
        #[serde(rename = "sessionId")]
        session_id: String,
    },
    Badges,
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    SignedIn(SignInOut),
    SignedOut(SignOutOut),
    Challenges(ChallengeListOut),
    Challenge { challenge: ChallengeOut },
    SubmitResult(SubmitOut),
    Dashboard(DashboardOut),
    Profile(ProfileOut),
    Badges(BadgesOut),
    Error { message: String },
}

/// DTO used by both WS and HTTP for challenge delivery.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeOut {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub level: Level,
    pub initial_code: String,
    pub points: u32,
    /// Only meaningful when the request carried a session.
    pub completed: bool,
}

/// Convert full `Challenge` (internal) to the public DTO.
pub fn to_out(c: &Challenge, completed: bool) -> ChallengeOut {
    ChallengeOut {
        id: c.id.clone(),
        title: c.title.clone(),
        description: c.description.clone(),
        category: c.category,
        level: c.level,
        initial_code: c.initial_code.clone(),
        points: c.points,
        completed,
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeOut {
    pub id: String,
    pub title: String,
    pub description: String,
    pub trigger: BadgeTrigger,
    pub earned: bool,
}

pub fn badge_out(b: &Badge, earned: bool) -> BadgeOut {
    BadgeOut {
        id: b.id.clone(),
        title: b.title.clone(),
        description: b.description.clone(),
        trigger: b.trigger.clone(),
        earned,
    }
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct SignInIn {
    pub id: String,
    pub username: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInOut {
    pub session_id: String,
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub struct SessionIn {
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignOutOut {
    pub signed_out: bool,
}

#[derive(Debug, Deserialize)]
pub struct ChallengeListQuery {
    pub category: Category,
    pub level: Level,
    #[serde(rename = "sessionId", default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeListOut {
    pub category: Category,
    pub level: Level,
    pub challenges: Vec<ChallengeOut>,
}

#[derive(Debug, Deserialize)]
pub struct ChallengeQuery {
    #[serde(rename = "challengeId")]
    pub challenge_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SubmitIn {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    #[serde(rename = "challengeId")]
    pub challenge_id: String,
    pub code: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitOut {
    pub challenge_id: String,
    pub output: String,
    pub passed: bool,
    /// Points granted by this submission (0 on failure or repeat completion).
    pub points_awarded: u32,
    pub already_completed: bool,
    pub new_badges: Vec<BadgeOut>,
    pub progress: Progress,
    /// False when the progress could not be written to the store.
    pub saved: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardOut {
    pub username: String,
    pub summary: Summary,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileOut {
    pub user: User,
    pub badges: Vec<BadgeOut>,
}

#[derive(Debug, Serialize)]
pub struct BadgesOut {
    pub badges: Vec<BadgeOut>,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
