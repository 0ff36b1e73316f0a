mod opencv_camera;
mod routes;
mod server;
mod telemetry;

pub mod app;
pub mod camera;
pub mod config;
pub mod pipeline;
pub mod snapshot;
pub mod submission;

pub use app::start_app;
