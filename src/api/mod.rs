mod error;
pub mod images;

pub use error::ApiError;

pub fn catchers() -> Vec<rocket::Catcher> {
    catchers![
        error::bad_request,
        error::not_found,
        error::unprocessable,
        error::internal_error,
    ]
}
