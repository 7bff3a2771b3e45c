//! Shared application state handed to every HTTP handler.

use crate::service::Service;

#[derive(Clone)]
pub struct AppState {
    pub service: Service,
}

impl AppState {
    pub fn new(service: Service) -> Self {
        Self { service }
    }
}
