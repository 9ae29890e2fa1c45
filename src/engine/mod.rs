pub(crate) mod backend;
pub(crate) mod ffmpeg;
pub(crate) mod libwebp;
pub(crate) mod loader;
pub(crate) mod store;
