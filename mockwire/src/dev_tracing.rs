//! Test-time logging helpers.
//!
//! Every handshake, close frame and dispatch in `mockwire-ws` is traced.
//! Nothing is printed unless a subscriber is installed, which these helpers
//! do through `tracing-subscriber` with output captured by the test harness.

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Directive used by [`init_tracing_for_mockwire`].
pub const MOCKWIRE_DIRECTIVE: &str = "mockwire_core=trace,mockwire_ws=trace";

/// Install a fmt subscriber when `RUST_LOG` is set; otherwise do nothing.
///
/// Safe to call from every test: a second installation is ignored.
pub fn init_tracing() {
    if std::env::var_os("RUST_LOG").is_some() {
        install(EnvFilter::from_default_env());
    }
}

/// Install a fmt subscriber tracing every mockwire transition, regardless
/// of `RUST_LOG`. `RUST_LOG` directives still apply on top.
pub fn init_tracing_for_mockwire() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();
    let filter = MOCKWIRE_DIRECTIVE
        .split(',')
        .filter_map(|d| d.parse().ok())
        .fold(filter, EnvFilter::add_directive);
    install(filter);
}

fn install(filter: EnvFilter) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_test_writer()
        .try_init();
}
