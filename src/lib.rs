pub mod activity;
pub mod api;
pub mod client;
pub mod command;
pub mod commands;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod health;
pub mod http;
pub mod model;
pub mod report;
pub mod state;
pub mod trigger;

#[cfg(test)]
mod mock;

pub mod prelude {
    pub use crate::activity::{ActivityStore, JsonActivityStore};
    pub use crate::api::ServerApi;
    pub use crate::client::{Client, ClientBuilder, Context};
    pub use crate::command::{CommandContext, CommandDescriptor, CommandHandler, Reply, Router};
    pub use crate::config::Config;
    pub use crate::dispatch::Dispatcher;
    pub use crate::error::{ClientError, CommandError};
    pub use crate::event::EventHandler;
    pub use crate::model::*;
    pub use crate::state::BotState;
}
