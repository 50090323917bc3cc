use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::{
    dto::{EventPayload, EventResponse, MessageResponse},
    guard::authorize_mutation,
    registration,
    repo_types::Event,
};
use crate::{
    auth::extractors::AuthUser,
    error::AppError,
    payload::Payload,
    state::AppState,
    store::EventId,
};

pub fn event_routes() -> Router<AppState> {
    Router::new()
        .route("/events", get(list_events).post(create_event))
        .route(
            "/events/:id",
            get(get_event).put(update_event).delete(delete_event),
        )
        .route(
            "/events/:id/register",
            post(register_for_event).delete(cancel_registration),
        )
}

#[instrument(skip(state))]
pub async fn list_events(State(state): State<AppState>) -> Result<Json<Vec<Event>>, AppError> {
    let events = state.store.list_events().await?;
    Ok(Json(events))
}

#[instrument(skip(state))]
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<EventId>,
) -> Result<Json<Event>, AppError> {
    let event = load_event(&state, id).await?;
    Ok(Json(event))
}

#[instrument(skip(state, payload))]
pub async fn create_event(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Payload(payload): Payload<EventPayload>,
) -> Result<(StatusCode, Json<EventResponse>), AppError> {
    if payload.user_id.is_some_and(|claimed| claimed != user_id.0) || payload.id.is_some() {
        warn!(
            %user_id,
            claimed_owner = ?payload.user_id,
            claimed_id = ?payload.id,
            "ignoring client-supplied event id/owner"
        );
    }

    let event = state
        .store
        .create_event(&payload.into_new_event(user_id))
        .await
        .map_err(|e| AppError::from_store(e, "user"))?;

    info!(event_id = %event.id, %user_id, "event created");
    Ok((
        StatusCode::CREATED,
        Json(EventResponse {
            message: "Event created successfully",
            event,
        }),
    ))
}

/// The ownership check runs before the body is inspected, so a non-owner
/// is refused whatever they send.
#[instrument(skip(state, payload))]
pub async fn update_event(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<EventId>,
    payload: Result<Payload<EventPayload>, AppError>,
) -> Result<Json<EventResponse>, AppError> {
    let existing = load_event(&state, id).await?;
    authorize_mutation(user_id, &existing)?;
    let Payload(payload) = payload?;

    let event = state
        .store
        .update_event(id, &payload.into_changes())
        .await
        .map_err(|e| AppError::from_store(e, "event"))?;

    info!(event_id = %event.id, %user_id, "event updated");
    Ok(Json(EventResponse {
        message: "Event updated successfully",
        event,
    }))
}

#[instrument(skip(state))]
pub async fn delete_event(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<EventId>,
) -> Result<Json<MessageResponse>, AppError> {
    let existing = load_event(&state, id).await?;
    authorize_mutation(user_id, &existing)?;

    state
        .store
        .delete_event(id)
        .await
        .map_err(|e| AppError::from_store(e, "event"))?;

    info!(event_id = %id, %user_id, "event deleted");
    Ok(Json(MessageResponse {
        message: "Event deleted successfully",
    }))
}

#[instrument(skip(state))]
pub async fn register_for_event(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<EventId>,
) -> Result<Json<EventResponse>, AppError> {
    let outcome = registration::register(state.store.as_ref(), id, user_id).await?;
    Ok(Json(EventResponse {
        message: "Successfully registered for event",
        event: outcome.event,
    }))
}

#[instrument(skip(state))]
pub async fn cancel_registration(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<EventId>,
) -> Result<Json<EventResponse>, AppError> {
    let outcome = registration::cancel(state.store.as_ref(), id, user_id).await?;
    Ok(Json(EventResponse {
        message: "Successfully cancelled registration for event",
        event: outcome.event,
    }))
}

async fn load_event(state: &AppState, id: EventId) -> Result<Event, AppError> {
    state
        .store
        .get_event(id)
        .await?
        .ok_or(AppError::NotFound("event"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{event_body, login, raw, send, signup};
    use axum::http::Method;
    use serde_json::json;

    fn app() -> Router {
        crate::app::build_app(AppState::fake())
    }

    #[tokio::test]
    async fn signup_login_create_end_to_end() {
        let app = app();
        let user_id = signup(&app, "Ann", "ann", "ann@x.com", "pw").await;
        let token = login(&app, "ann", "pw").await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/v1/api/events",
            Some(&token),
            Some(event_body("Launch", json!({}))),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        assert_eq!(body["message"], "Event created successfully");
        assert_eq!(body["event"]["user_id"], user_id);

        let event_id = body["event"]["id"].as_i64().unwrap();
        let (status, fetched) = send(
            &app,
            Method::GET,
            &format!("/v1/api/events/{event_id}"),
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["user_id"], user_id);
        assert_eq!(fetched["title"], "Launch");
    }

    #[tokio::test]
    async fn create_ignores_client_supplied_owner_and_id() {
        let app = app();
        let user_id = signup(&app, "Ann", "ann", "ann@x.com", "pw").await;
        let token = login(&app, "ann", "pw").await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/v1/api/events",
            Some(&token),
            Some(event_body("Mine", json!({ "user_id": 999, "id": 777 }))),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["event"]["user_id"], user_id);
        assert_ne!(body["event"]["user_id"], 999);
        assert_ne!(body["event"]["id"], 777);
    }

    #[tokio::test]
    async fn create_requires_token() {
        let app = app();
        for auth in [None, Some("garbage"), Some("Bearer ")] {
            let (status, body) = send(
                &app,
                Method::POST,
                "/v1/api/events",
                auth,
                Some(event_body("x", json!({}))),
            )
            .await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body, json!({ "message": "Unauthorized" }));
        }
    }

    #[tokio::test]
    async fn create_validates_fields() {
        let app = app();
        signup(&app, "Ann", "ann", "ann@x.com", "pw").await;
        let token = login(&app, "ann", "pw").await;

        let missing_date = json!({ "data": { "attributes": {
            "title": "t", "description": "d", "location": "l"
        }}});
        let (status, _) = send(&app, Method::POST, "/v1/api/events", Some(&token), Some(missing_date)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let blank_title = event_body(" ", json!({}));
        let (status, _) = send(&app, Method::POST, "/v1/api/events", Some(&token), Some(blank_title)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn only_owner_may_update_or_delete() {
        let app = app();
        let owner_id = signup(&app, "Ann", "ann", "ann@x.com", "pw").await;
        signup(&app, "Bob", "bob", "bob@x.com", "pw").await;
        let ann = login(&app, "ann", "pw").await;
        let bob = login(&app, "bob", "pw").await;

        let (_, created) = send(
            &app,
            Method::POST,
            "/v1/api/events",
            Some(&ann),
            Some(event_body("Ann's", json!({}))),
        )
        .await;
        let uri = format!("/v1/api/events/{}", created["event"]["id"]);

        let bodies = [
            Some(event_body("Hijacked", json!({ "user_id": owner_id }))),
            Some(json!({ "data": { "attributes": {} } })),
            None,
        ];
        for body in bodies {
            let (status, res) = send(&app, Method::PUT, &uri, Some(&bob), body).await;
            assert_eq!(status, StatusCode::FORBIDDEN);
            assert_eq!(res, json!({ "message": "Forbidden" }));
        }

        let (status, _) = send(&app, Method::DELETE, &uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (_, still_there) = send(&app, Method::GET, &uri, None, None).await;
        assert_eq!(still_there["title"], "Ann's");
    }

    #[tokio::test]
    async fn owner_updates_and_deletes() {
        let app = app();
        let owner_id = signup(&app, "Ann", "ann", "ann@x.com", "pw").await;
        let ann = login(&app, "ann", "pw").await;

        let (_, created) = send(
            &app,
            Method::POST,
            "/v1/api/events",
            Some(&ann),
            Some(event_body("Draft", json!({}))),
        )
        .await;
        let id = created["event"]["id"].clone();
        let uri = format!("/v1/api/events/{id}");

        let (status, updated) = send(
            &app,
            Method::PUT,
            &uri,
            Some(&ann),
            Some(event_body("Final", json!({ "user_id": 999, "id": 555 }))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["event"]["title"], "Final");
        assert_eq!(updated["event"]["user_id"], owner_id);
        assert_eq!(updated["event"]["id"], id);

        let (status, body) = send(&app, Method::DELETE, &uri, Some(&ann), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Event deleted successfully");

        let (status, _) = send(&app, Method::GET, &uri, None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn register_and_cancel_are_idempotent() {
        let app = app();
        signup(&app, "Ann", "ann", "ann@x.com", "pw").await;
        signup(&app, "Bob", "bob", "bob@x.com", "pw").await;
        let ann = login(&app, "ann", "pw").await;
        let bob = login(&app, "bob", "pw").await;

        let (_, created) = send(
            &app,
            Method::POST,
            "/v1/api/events",
            Some(&ann),
            Some(event_body("Open day", json!({}))),
        )
        .await;
        let uri = format!("/v1/api/events/{}/register", created["event"]["id"]);

        for _ in 0..2 {
            let (status, body) = send(&app, Method::POST, &uri, Some(&bob), None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["message"], "Successfully registered for event");
        }
        for _ in 0..2 {
            let (status, body) = send(&app, Method::DELETE, &uri, Some(&bob), None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["message"], "Successfully cancelled registration for event");
        }

        let (status, _) = send(&app, Method::POST, &uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn missing_event_is_not_found() {
        let app = app();
        signup(&app, "Ann", "ann", "ann@x.com", "pw").await;
        let ann = login(&app, "ann", "pw").await;

        let (status, body) = send(&app, Method::GET, "/v1/api/events/42", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "event not found");

        let (status, _) =
            send(&app, Method::POST, "/v1/api/events/42/register", Some(&ann), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let res = raw(&app, Method::GET, "/v1/api/events/abc", None, None).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn list_events_is_public() {
        let app = app();
        signup(&app, "Ann", "ann", "ann@x.com", "pw").await;
        let ann = login(&app, "ann", "pw").await;
        for title in ["One", "Two"] {
            send(
                &app,
                Method::POST,
                "/v1/api/events",
                Some(&ann),
                Some(event_body(title, json!({}))),
            )
            .await;
        }

        let (status, body) = send(&app, Method::GET, "/v1/api/events", None, None).await;
        assert_eq!(status, StatusCode::OK);
        let titles: Vec<_> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["title"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(titles, ["One", "Two"]);
    }
}
