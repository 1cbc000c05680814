//! Routes for inspecting and changing the player's age.

use std::sync::PoisonError;

use ageshift_character::runtime::CharacterRuntime;
use ageshift_core::profile::{AbilityFlags, AgeProfile};
use ageshift_input::ActionMap;
use ageshift_transition::TransitionRequest;
use axum::extract::State;
use axum::{
    Json, Router,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::error::ApiError;
use crate::state::AppState;

/// One entry of the age listing.
#[derive(Debug, Serialize)]
pub struct AgeSummary {
    /// Position in progression order.
    pub index: usize,
    /// Name shown to the player.
    pub display_name: String,
    /// Age in years.
    pub age_years: u32,
    /// Abilities unlocked at this age.
    pub abilities: AbilityFlags,
}

/// Response body for GET /current.
#[derive(Debug, Serialize)]
pub struct CurrentAgeResponse {
    /// Index of the current age.
    pub index: usize,
    /// Generation of the last accepted transition.
    pub generation: u64,
    /// The current profile.
    pub profile: AgeProfile,
    /// The request that produced the current age, if any.
    pub last_request: Option<TransitionRequest>,
    /// Key of the visual asset currently shown.
    pub appearance: Option<String>,
    /// Live character parameters.
    pub character: CharacterRuntime,
    /// Input action state, if an action map is configured.
    pub actions: Option<ActionMap>,
    /// Scene content visible at the current age.
    pub visible_content: Vec<String>,
}

/// Request body for POST /transition.
#[derive(Debug, Deserialize)]
pub struct TransitionBody {
    /// Target age index.
    pub index: usize,
    /// Whether to cue the transition cutscene.
    #[serde(default)]
    pub play_cutscene: bool,
}

/// Response body returned after a transition is accepted.
#[derive(Debug, Serialize)]
pub struct TransitionResponse {
    /// Generation stamped on the transition.
    pub generation: u64,
    /// Index of the age now current.
    pub index: usize,
    /// Display name of the age now current.
    pub display_name: String,
}

/// GET /
async fn list_ages(State(state): State<AppState>) -> Json<Vec<AgeSummary>> {
    let ages = state
        .ages
        .iter()
        .enumerate()
        .map(|(index, profile)| AgeSummary {
            index,
            display_name: profile.display_name.clone(),
            age_years: profile.age_years,
            abilities: profile.abilities,
        })
        .collect();
    Json(ages)
}

/// GET /current
async fn current_age(State(state): State<AppState>) -> Json<CurrentAgeResponse> {
    let snapshot = state.coordinator.state().snapshot();
    let character = state
        .character
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();
    let actions = state
        .actions
        .as_ref()
        .map(|map| map.lock().unwrap_or_else(PoisonError::into_inner).clone());

    Json(CurrentAgeResponse {
        index: snapshot.index,
        generation: snapshot.generation.value(),
        profile: snapshot.profile,
        last_request: snapshot.last_request,
        appearance: state.appearance.current(),
        character,
        actions,
        visible_content: state.scene.visible(),
    })
}

/// POST /transition
#[instrument(skip(state, request), fields(index = request.index))]
async fn transition(
    State(state): State<AppState>,
    Json(request): Json<TransitionBody>,
) -> Result<Json<TransitionResponse>, ApiError> {
    let generation = state
        .coordinator
        .request_transition(request.index, request.play_cutscene)
        .await?;

    info!(%generation, "transition accepted");

    let profile = state.ages.checked(request.index)?;
    Ok(Json(TransitionResponse {
        generation: generation.value(),
        index: request.index,
        display_name: profile.display_name.clone(),
    }))
}

/// Returns the router for the age endpoints.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_ages))
        .route("/current", get(current_age))
        .route("/transition", post(transition))
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::wiring::testing::test_app_state;

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body_bytes).unwrap())
    }

    fn post_transition(body: &Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/transition")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_list_ages_returns_profiles_in_order() {
        let app = router().with_state(test_app_state().await);
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();

        let (status, json) = send(app, request).await;

        assert_eq!(status, StatusCode::OK);
        let ages = json.as_array().unwrap();
        assert_eq!(ages.len(), 3);
        assert_eq!(ages[0]["display_name"], "Child");
        assert_eq!(ages[2]["abilities"]["can_shoot"], true);
    }

    #[tokio::test]
    async fn test_transition_returns_200_with_generation_after_resume() {
        // Arrange
        let state = test_app_state().await;
        let app = router().with_state(state.clone());

        // Act
        let (status, json) =
            send(app, post_transition(&serde_json::json!({ "index": 2 }))).await;

        // Assert
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["generation"], 2);
        assert_eq!(json["display_name"], "Adult");
        assert!(state.character.lock().unwrap().can_shoot);
    }

    #[tokio::test]
    async fn test_transition_out_of_range_returns_400() {
        let app = router().with_state(test_app_state().await);

        let (status, json) =
            send(app, post_transition(&serde_json::json!({ "index": 7 }))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "out_of_range");
    }

    #[tokio::test]
    async fn test_current_reflects_last_transition() {
        // Arrange
        let state = test_app_state().await;
        send(
            router().with_state(state.clone()),
            post_transition(&serde_json::json!({ "index": 1, "play_cutscene": true })),
        )
        .await;
        let request = Request::builder()
            .uri("/current")
            .body(Body::empty())
            .unwrap();

        // Act
        let (status, json) = send(router().with_state(state), request).await;

        // Assert
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["index"], 1);
        assert_eq!(json["profile"]["display_name"], "Teen");
        assert_eq!(json["last_request"]["play_cutscene"], true);
        assert_eq!(json["character"]["can_dash"], true);
        assert_eq!(json["actions"]["player"]["enabled"], true);
        assert_eq!(json["actions"]["child"]["enabled"], false);
        assert_eq!(json["visible_content"], serde_json::json!(["high_ledge"]));
    }
}
