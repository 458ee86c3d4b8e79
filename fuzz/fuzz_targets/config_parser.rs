#![no_main]

use libfuzzer_sys::fuzz_target;
use sysopt::config::OptimizerConfig;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Parse errors are fine; panics and invalid accepted configs are not
        if let Ok(config) = OptimizerConfig::from_toml_str(input) {
            assert!(config.validate().is_ok());
            assert!(config.performance_threshold >= 0.0);
            assert!(config.refresh_interval_secs > 0);
        }
    }
});
