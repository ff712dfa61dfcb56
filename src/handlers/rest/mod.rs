use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use axum_macros::debug_handler;
use utoipa::OpenApi;

use std::sync::Arc;

use crate::{
    dto::{CreateNoteRequest, MessageResponse, NoteResponse, UpdateNoteRequest},
    service::{NoteService, NoteServiceError},
};

#[derive(OpenApi)]
#[openapi(
    paths(create_note, update_note, delete_note, get_one_note, get_all_notes),
    components(schemas(NoteResponse, CreateNoteRequest, UpdateNoteRequest, MessageResponse)),
    tags(
        (name = "notes", description = "Notes management API")
    )
)]
pub struct ApiDoc;

/// Client errors carry the service error text; anything else is logged and
/// hidden behind a generic message.
fn error_response(e: NoteServiceError, action: &str) -> Response {
    let status = match e {
        NoteServiceError::MissingField(_) => StatusCode::BAD_REQUEST,
        NoteServiceError::NotFound => StatusCode::NOT_FOUND,
        NoteServiceError::Conflict => StatusCode::CONFLICT,
        NoteServiceError::Repository(_) => {
            tracing::error!("failed to {action}: {e}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(MessageResponse::new(format!("Failed to {action}"))),
            )
                .into_response();
        }
    };

    (status, Json(MessageResponse::new(e.to_string()))).into_response()
}

/// Extractor rejections keep axum's status and wording but use the same
/// `{"message": ...}` body as every other error.
fn rejection_response(status: StatusCode, text: String) -> Response {
    tracing::debug!("rejected request ({status}): {text}");
    (status, Json(MessageResponse::new(text))).into_response()
}

fn json_rejection(rejection: &JsonRejection) -> Response {
    rejection_response(rejection.status(), rejection.body_text())
}

fn path_rejection(rejection: &PathRejection) -> Response {
    rejection_response(rejection.status(), rejection.body_text())
}

#[debug_handler]
pub async fn openapi() -> Response {
    (StatusCode::OK, Json(ApiDoc::openapi())).into_response()
}

#[utoipa::path(
    post,
    path = "/api/notes/",
    request_body = CreateNoteRequest,
    responses(
        (status = 201, description = "Note created successfully", body = NoteResponse,
            headers(("Location" = String, description = "URL of the created note"))),
        (status = 400, description = "Required field missing", body = MessageResponse),
        (status = 409, description = "Title already taken", body = MessageResponse),
        (status = 500, description = "Internal server error", body = MessageResponse)
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn create_note(
    State(service): State<Arc<NoteService>>,
    payload: Result<Json<CreateNoteRequest>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return json_rejection(&rejection),
    };

    match service.create_note(payload).await {
        Ok(note) => (
            StatusCode::CREATED,
            [(header::LOCATION, format!("/api/notes/{}", note.id))],
            Json(note),
        )
            .into_response(),
        Err(e) => error_response(e, "create note"),
    }
}

#[utoipa::path(
    patch,
    path = "/api/notes/{id}",
    params(
        ("id" = i64, Path, description = "Note ID")
    ),
    request_body = UpdateNoteRequest,
    responses(
        (status = 200, description = "Note updated successfully", body = NoteResponse),
        (status = 404, description = "Note not found", body = MessageResponse),
        (status = 409, description = "Title already taken", body = MessageResponse),
        (status = 500, description = "Internal server error", body = MessageResponse)
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn update_note(
    State(service): State<Arc<NoteService>>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateNoteRequest>, JsonRejection>,
) -> Response {
    let Path(id) = match id {
        Ok(id) => id,
        Err(rejection) => return path_rejection(&rejection),
    };
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return json_rejection(&rejection),
    };

    match service.update_note(id, payload).await {
        Ok(note) => (StatusCode::OK, Json(note)).into_response(),
        Err(e) => error_response(e, "update note"),
    }
}

#[utoipa::path(
    delete,
    path = "/api/notes/{id}",
    params(
        ("id" = i64, Path, description = "Note ID")
    ),
    responses(
        (status = 200, description = "Note deleted, last state returned", body = NoteResponse),
        (status = 404, description = "Note not found", body = MessageResponse),
        (status = 500, description = "Internal server error", body = MessageResponse)
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn delete_note(
    State(service): State<Arc<NoteService>>,
    id: Result<Path<i64>, PathRejection>,
) -> Response {
    let Path(id) = match id {
        Ok(id) => id,
        Err(rejection) => return path_rejection(&rejection),
    };

    match service.delete_note(id).await {
        Ok(note) => (StatusCode::OK, Json(note)).into_response(),
        Err(e) => error_response(e, "delete note"),
    }
}

#[utoipa::path(
    get,
    path = "/api/notes/{id}",
    params(
        ("id" = i64, Path, description = "Note ID")
    ),
    responses(
        (status = 200, description = "Note found", body = NoteResponse),
        (status = 404, description = "Note not found", body = MessageResponse),
        (status = 500, description = "Internal server error", body = MessageResponse)
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn get_one_note(
    State(service): State<Arc<NoteService>>,
    id: Result<Path<i64>, PathRejection>,
) -> Response {
    let Path(id) = match id {
        Ok(id) => id,
        Err(rejection) => return path_rejection(&rejection),
    };

    match service.get_one_note(id).await {
        Ok(note) => (StatusCode::OK, Json(note)).into_response(),
        Err(e) => error_response(e, "get note"),
    }
}

#[utoipa::path(
    get,
    path = "/api/notes/",
    responses(
        (status = 200, description = "List of all notes", body = Vec<NoteResponse>),
        (status = 500, description = "Internal server error", body = MessageResponse)
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn get_all_notes(State(service): State<Arc<NoteService>>) -> Response {
    match service.get_all_notes().await {
        Ok(notes) => (StatusCode::OK, Json(notes)).into_response(),
        Err(e) => error_response(e, "get all notes"),
    }
}
