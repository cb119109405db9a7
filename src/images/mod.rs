mod compose;
mod fetch;
pub mod layout;

pub use compose::{ComposeError, Compositor};
pub use fetch::{FetchError, ImageFetcher};
