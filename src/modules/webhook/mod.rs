pub mod controller;
pub mod engine;
pub mod routes;
pub mod schema;
