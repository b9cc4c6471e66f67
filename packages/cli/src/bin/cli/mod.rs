pub mod sessions;
pub mod timeline;
