//! Collage - place, move and resize image layers on a fixed canvas, then
//! flatten the arrangement into one PNG.
//!
//! The crate is the layer engine only; a UI shell drives it through
//! [`commands::execute`] or directly through [`board::Board`].

pub mod assets;
pub mod board;
pub mod commands;
pub mod compositor;
pub mod config;
pub mod errors;
pub mod geometry;
pub mod interaction;
pub mod layer;

#[cfg(test)]
pub(crate) mod test_support;

pub use board::Board;
pub use config::BoardConfig;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the logging subscriber. Safe to call more than once.
pub fn init() {
    let installed = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "collage_lib=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("Collage initializing...");
    }
}
