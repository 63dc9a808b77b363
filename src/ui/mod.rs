//! Terminal user interface: navigation state, forms, drawing and the event
//! loop.

mod app;
mod forms;
mod helpers;
mod screens;
mod terminal;
mod views;

pub use app::App;
pub use terminal::run_app;
