use std::sync::Once;

use strata_shared::log::LevelFilter;

pub use spectral;

static LOGGER: Once = Once::new();

/// Installs a logger for the tests. It's safe to call this function from every test.
pub fn setup_logger() {
    LOGGER.call_once(|| {
        simple_logger::SimpleLogger::new()
            .with_level(LevelFilter::Trace)
            .init()
            .expect("failed to install the test logger");
    });
}
