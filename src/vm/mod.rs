pub mod bridge;
pub mod controller;
pub mod view_model;
