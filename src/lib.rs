pub mod config;
pub mod modules;
pub mod services;

use modules::meeting::crud::MeetingStore;

#[derive(Clone)]
pub struct AppState {
    pub store: MeetingStore,
}
