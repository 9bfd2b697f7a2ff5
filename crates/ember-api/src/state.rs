use std::sync::Arc;

use ember_gateway::Dispatcher;
use ember_rooms::Rooms;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub rooms: Rooms,
    pub dispatcher: Dispatcher,
}
