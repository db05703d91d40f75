use tracing_error::ErrorLayer;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::Environment;

/// Initialize tracing with environment-appropriate formatting.
///
/// Production emits JSON lines for the log pipeline, development uses
/// the pretty human-readable formatter. `RUST_LOG` controls filtering,
/// defaulting to `info`.
pub fn init_tracing() {
    let environment = Environment::from_env();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if environment.is_production() {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_current_span(true))
            .with(ErrorLayer::default())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().pretty())
            .with(ErrorLayer::default())
            .init();
    }
}
