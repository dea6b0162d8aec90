//! Fuzzes settings deserialization followed by stage configuration.
//!
//! Run with:
//!   cargo +nightly fuzz run fuzz_settings
#![no_main]
use libfuzzer_sys::fuzz_target;
use tabletfx_filters::{DeviceReport, FilterSettings, FormulaStage, TabletSpec};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(settings) = FilterSettings::from_yaml_str(text) else {
        return;
    };

    let mut stage = FormulaStage::new(TabletSpec::new(15200.0, 9500.0, 8191));
    if stage.configure(&settings).is_ok() {
        let mut report = DeviceReport::at(100.0, 200.0)
            .with_pressure(512)
            .with_tilt(10.0, -5.0);
        stage.process(&mut report);
    }
});
