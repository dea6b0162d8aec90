//! Fuzzes JSON report decoding through an extended stage.
//!
//! Run with:
//!   cargo +nightly fuzz run fuzz_report_replay
#![no_main]
use libfuzzer_sys::fuzz_target;
use tabletfx_filters::{
    Channel, DeviceReport, FilterSettings, FormulaStage, TabletSpec, VariantKind,
};

fuzz_target!(|data: &[u8]| {
    let settings = FilterSettings::for_variant(VariantKind::Extended)
        .with_formula(Channel::X, "x + (x - lx) * 0.5")
        .with_formula(Channel::Pressure, "sqrt(p - lp) * cp / mp")
        .with_formula(Channel::TiltY, "ty / 0");
    let mut stage = FormulaStage::new(TabletSpec::new(15200.0, 9500.0, 8191));
    if stage.configure(&settings).is_err() {
        return;
    }

    for line in data.split(|b| *b == b'\n') {
        if let Ok(mut report) = serde_json::from_slice::<DeviceReport>(line) {
            stage.process(&mut report);
        }
    }
});
