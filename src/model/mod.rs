pub mod app_state;
pub mod status;
pub mod url_classifier;
