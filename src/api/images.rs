use std::convert::Infallible;
use std::io::Cursor;

use log::info;
use rocket::http::{ContentType, Header, Status};
use rocket::request::{self, FromRequest, Request};
use rocket::response::{self, Responder, Response};
use rocket::serde::json::{self, Json};
use rocket::State;
use serde::{Deserialize, Serialize};

use crate::api::ApiError;
use crate::cache::EphemeralStore;
use crate::config::AppConfig;
use crate::images::{Compositor, ImageFetcher};

#[derive(Debug, Deserialize)]
pub struct EditImageRequest {
    pub image_url: Option<String>,
    pub text: Option<String>,
    pub logo_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EditImageResponse {
    pub message: String,
    pub temp_image_url: String,
}

/// Scheme and host the client used to reach us.
pub struct RequestOrigin(String);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for RequestOrigin {
    type Error = Infallible;

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let scheme = req.headers().get_one("X-Forwarded-Proto").unwrap_or("http");
        let host = req.headers().get_one("Host").unwrap_or("localhost");
        request::Outcome::Success(RequestOrigin(format!("{}://{}", scheme, host)))
    }
}

#[get("/")]
pub fn index() -> &'static str {
    "Brandshot image editor is running!"
}

#[post("/edit_image", data = "<body>")]
pub async fn edit_image(
    body: Result<Json<EditImageRequest>, json::Error<'_>>,
    origin: RequestOrigin,
    fetcher: &State<ImageFetcher>,
    compositor: &State<Compositor>,
    store: &State<EphemeralStore>,
    config: &State<AppConfig>,
) -> Result<Json<EditImageResponse>, ApiError> {
    let body = body.map_err(|e| ApiError::InvalidBody(e.to_string()))?.into_inner();

    let image_url = body
        .image_url
        .filter(|url| !url.trim().is_empty())
        .ok_or(ApiError::MissingField("image_url"))?;
    let caption = body.text.unwrap_or_else(|| config.default_text.clone()).to_uppercase();
    let logo_url = body.logo_url.unwrap_or_else(|| config.default_logo_url.clone());

    let (source, logo) = futures::try_join!(
        fetcher.fetch_image(&image_url),
        fetcher.fetch_image(&logo_url)
    )?;

    let jpeg = compositor.compose(source, logo, caption).await?;
    let size = jpeg.len();
    let id = store.insert(jpeg);

    let temp_image_url = retrieval_url(config.public_url.as_deref(), &origin.0, &id);
    info!("Generated image {} ({} bytes) from {}", id, size, image_url);

    Ok(Json(EditImageResponse {
        message: "Image generated successfully".to_string(),
        temp_image_url,
    }))
}

fn retrieval_url(public_url: Option<&str>, origin: &str, id: &str) -> String {
    let base = public_url.unwrap_or(origin);
    format!("{}/temp_image/{}", base.trim_end_matches('/'), id)
}

#[get("/temp_image/<id>")]
pub fn temp_image(id: &str, store: &State<EphemeralStore>) -> Result<ImageResponse, ApiError> {
    let data = store.get(id)?;
    let max_age = store.remaining(id).map(|left| left.as_secs()).unwrap_or(0);

    Ok(ImageResponse { data, max_age })
}

pub struct ImageResponse {
    pub data: Vec<u8>,
    pub max_age: u64,
}

impl<'r> Responder<'r, 'static> for ImageResponse {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        let etag = format!("\"{:x}\"", md5::compute(&self.data));
        let cache_control = format!("private, max-age={}", self.max_age);

        if req.headers().get_one("If-None-Match") == Some(etag.as_str()) {
            return Response::build()
                .status(Status::NotModified)
                .header(Header::new("ETag", etag))
                .header(Header::new("Cache-Control", cache_control))
                .ok();
        }

        Response::build()
            .header(ContentType::JPEG)
            .header(Header::new("Cache-Control", cache_control))
            .header(Header::new("ETag", etag))
            .sized_body(None, Cursor::new(self.data))
            .ok()
    }
}
