//! Tracing subscriber setup for the binary.

use tracing_subscriber::EnvFilter;

/// Default filter directive for a given verbosity offset.
///
/// `0` is `info`; each step up or down moves one level, clamped to
/// `error`..`trace`.
pub fn default_directive(verbosity: i8) -> String {
    let level = match verbosity {
        i8::MIN..=-2 => "error",
        -1 => "warn",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    format!("coinsignal={level}")
}

/// Install a stderr fmt subscriber. `RUST_LOG` wins over `verbosity`.
///
/// Safe to call more than once; later calls are ignored.
pub fn init(verbosity: i8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_tracks_verbosity() {
        assert_eq!(default_directive(0), "coinsignal=info");
        assert_eq!(default_directive(-1), "coinsignal=warn");
        assert_eq!(default_directive(-5), "coinsignal=error");
        assert_eq!(default_directive(1), "coinsignal=debug");
        assert_eq!(default_directive(3), "coinsignal=trace");
    }

    #[test]
    fn init_twice_does_not_panic() {
        init(0);
        init(1);
    }
}
