pub mod service;

pub use service::{attach_photo, PhotoError, PhotoUpload};
