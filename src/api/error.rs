use rocket::http::{ContentType, Status};
use rocket::serde::json::Json;
use rocket::Request;
use serde_json::{json, Value};
use std::io::Cursor;

use crate::cache::StoreError;
use crate::images::{ComposeError, FetchError};

#[derive(Debug)]
pub enum ApiError {
    InvalidBody(String),
    MissingField(&'static str),
    FetchError(FetchError),
    ComposeError(ComposeError),
    StoreError(StoreError),
}

impl From<FetchError> for ApiError {
    fn from(error: FetchError) -> Self {
        ApiError::FetchError(error)
    }
}

impl From<ComposeError> for ApiError {
    fn from(error: ComposeError) -> Self {
        ApiError::ComposeError(error)
    }
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        ApiError::StoreError(error)
    }
}

impl ApiError {
    pub fn status(&self) -> Status {
        match self {
            ApiError::StoreError(_) => Status::NotFound,
            _ => Status::BadRequest,
        }
    }

    pub fn message(&self) -> String {
        match self {
            ApiError::InvalidBody(reason) => format!("Invalid request body: {}", reason),
            ApiError::MissingField(field) => format!("Missing required field: {}", field),
            ApiError::FetchError(error) => error.to_string(),
            ApiError::ComposeError(error) => error.to_string(),
            ApiError::StoreError(error) => error.to_string(),
        }
    }
}

impl<'r> rocket::response::Responder<'r, 'static> for ApiError {
    fn respond_to(self, req: &'r Request<'_>) -> rocket::response::Result<'static> {
        let status = self.status();
        let message = self.message();
        log::warn!("{} {} failed with {}: {}", req.method(), req.uri(), status, message);

        match self {
            ApiError::StoreError(_) => rocket::Response::build()
                .status(status)
                .header(ContentType::Plain)
                .sized_body(None, Cursor::new(message))
                .ok(),
            _ => {
                let body = json!({ "error": message }).to_string();

                rocket::Response::build()
                    .status(status)
                    .header(ContentType::JSON)
                    .sized_body(None, Cursor::new(body))
                    .ok()
            }
        }
    }
}

#[catch(400)]
pub fn bad_request(_req: &Request) -> Json<Value> {
    Json(json!({ "error": "Bad request" }))
}

#[catch(404)]
pub fn not_found(req: &Request) -> Json<Value> {
    Json(json!({ "error": format!("No route for {}", req.uri()) }))
}

#[catch(422)]
pub fn unprocessable(_req: &Request) -> Json<Value> {
    Json(json!({ "error": "Request body could not be processed" }))
}

#[catch(500)]
pub fn internal_error(_req: &Request) -> Json<Value> {
    Json(json!({ "error": "Internal server error" }))
}
