pub mod record;
pub mod setup;
pub mod ui;
