//! Tracing setup for the Lambda runtime

/// Install the global subscriber
///
/// CloudWatch timestamps every line and does not render colors, so both are
/// left out. `RUST_LOG` overrides the default `info` level.
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_ansi(false)
        .with_target(false)
        .without_time()
        .init();
}
