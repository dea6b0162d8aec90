//! Filter variants and the variables each one binds.
//!
//! A variant fixes two things: the ordered variable schema its formulas are
//! compiled against, and the channels it owns. [`FilterVariant::gather`]
//! fills a value buffer in exactly schema order, so a compiled expression
//! can be called without any name lookup.
//!
//! # Variable meanings
//!
//! | Prefix | Meaning                                | Example     |
//! |--------|----------------------------------------|-------------|
//! | none   | raw value from the current report      | `x`, `p`    |
//! | `l`    | raw value from the previous report     | `lx`, `ltx` |
//! | `m`    | device-reported maximum                | `mx`, `mp`  |
//! | `c`    | value computed for the previous report | `cx`, `cp`  |
//!
//! The multi-sample variant adds `x0 y0 … x(N-1) y(N-1)`: prior raw
//! positions, most recent first, zero until enough reports have arrived.

use crate::channel::Channel;
use crate::history::HistoryState;
use crate::report::{DeviceReport, TabletSpec};
use std::fmt;
use tabletfx_expr::VariableSchema;

/// Schema of the basic position variant.
pub const BASIC_VARIABLES: [&str; 6] = ["x", "y", "lx", "ly", "mx", "my"];

/// Schema of the extended variant.
pub const EXTENDED_VARIABLES: [&str; 18] = [
    "x", "y", "lx", "ly", "mx", "my", "p", "lp", "mp", "tx", "ty", "ltx", "lty", "d", "ld", "cx",
    "cy", "cp",
];

const POSITION_CHANNELS: [Channel; 2] = [Channel::X, Channel::Y];

/// Which variables a stage exposes and which channels it drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterVariant {
    /// Position X/Y with previous raw position
    Basic,
    /// Position, pressure and tilt with previous raw and computed values
    Extended,
    /// Position X/Y with the last `samples` raw positions
    MultiSample {
        /// Ring capacity, at least 1
        samples: usize,
    },
}

impl FilterVariant {
    /// Ordered variable schema for this variant.
    #[must_use]
    pub fn schema(&self) -> VariableSchema {
        match self {
            FilterVariant::Basic => VariableSchema::new(BASIC_VARIABLES),
            FilterVariant::Extended => VariableSchema::new(EXTENDED_VARIABLES),
            FilterVariant::MultiSample { samples } => {
                let mut names = Vec::with_capacity(4 + samples * 2);
                names.extend(["x", "y", "mx", "my"].map(String::from));
                for i in 0..*samples {
                    names.push(format!("x{i}"));
                    names.push(format!("y{i}"));
                }
                VariableSchema::new(names)
            }
        }
    }

    /// Channels this variant owns, in evaluation order.
    #[must_use]
    pub fn channels(&self) -> &'static [Channel] {
        match self {
            FilterVariant::Basic | FilterVariant::MultiSample { .. } => &POSITION_CHANNELS,
            FilterVariant::Extended => &Channel::ALL,
        }
    }

    /// Whether this variant drives `channel`.
    #[must_use]
    pub fn owns(&self, channel: Channel) -> bool {
        self.channels().contains(&channel)
    }

    /// Ring capacity the history needs for this variant.
    #[must_use]
    pub fn sample_capacity(&self) -> usize {
        match self {
            FilterVariant::MultiSample { samples } => *samples,
            _ => 0,
        }
    }

    /// Number of variables in the schema, without building it.
    #[must_use]
    pub fn arity(&self) -> usize {
        match self {
            FilterVariant::Basic => BASIC_VARIABLES.len(),
            FilterVariant::Extended => EXTENDED_VARIABLES.len(),
            FilterVariant::MultiSample { samples } => 4 + samples * 2,
        }
    }

    /// Fill `values` with this report's variables in schema order.
    ///
    /// The buffer is cleared first and reused across calls; once it has
    /// grown to [`arity`](Self::arity) no further allocation happens.
    /// Capabilities the report lacks gather as `0`.
    pub fn gather(
        &self,
        report: &DeviceReport,
        history: &HistoryState,
        spec: &TabletSpec,
        values: &mut Vec<f64>,
    ) {
        values.clear();

        let position = report.position.unwrap_or_default();
        let last = history.last_raw();

        match self {
            FilterVariant::Basic => {
                values.extend([
                    f64::from(position.x),
                    f64::from(position.y),
                    f64::from(last.position.x),
                    f64::from(last.position.y),
                    f64::from(spec.max_x),
                    f64::from(spec.max_y),
                ]);
            }
            FilterVariant::Extended => {
                let tilt = report.tilt.unwrap_or_default();
                let computed = history.last_computed();
                values.extend([
                    f64::from(position.x),
                    f64::from(position.y),
                    f64::from(last.position.x),
                    f64::from(last.position.y),
                    f64::from(spec.max_x),
                    f64::from(spec.max_y),
                    f64::from(report.pressure.unwrap_or(0)),
                    f64::from(last.pressure),
                    f64::from(spec.max_pressure),
                    f64::from(tilt.x),
                    f64::from(tilt.y),
                    f64::from(last.tilt.x),
                    f64::from(last.tilt.y),
                    f64::from(report.hover_distance.unwrap_or(0)),
                    f64::from(last.hover_distance),
                    computed.x,
                    computed.y,
                    computed.pressure,
                ]);
            }
            FilterVariant::MultiSample { samples } => {
                values.extend([
                    f64::from(position.x),
                    f64::from(position.y),
                    f64::from(spec.max_x),
                    f64::from(spec.max_y),
                ]);
                let ring = history.samples();
                for i in 0..*samples {
                    let sample = ring.get(i).unwrap_or_default();
                    values.push(f64::from(sample.x));
                    values.push(f64::from(sample.y));
                }
            }
        }
    }
}

impl fmt::Display for FilterVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterVariant::Basic => f.write_str("basic"),
            FilterVariant::Extended => f.write_str("extended"),
            FilterVariant::MultiSample { samples } => write!(f, "multi_sample({samples})"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::history::ComputedSample;

    fn spec() -> TabletSpec {
        TabletSpec::new(15200.0, 9500.0, 8191)
    }

    #[test]
    fn test_schema_matches_arity() {
        for variant in [
            FilterVariant::Basic,
            FilterVariant::Extended,
            FilterVariant::MultiSample { samples: 1 },
            FilterVariant::MultiSample { samples: 7 },
        ] {
            assert_eq!(variant.schema().len(), variant.arity(), "{variant}");
        }
    }

    #[test]
    fn test_multi_sample_schema_is_interleaved() {
        let schema = FilterVariant::MultiSample { samples: 3 }.schema();
        let names: Vec<&str> = schema.names().collect();
        assert_eq!(names, vec!["x", "y", "mx", "my", "x0", "y0", "x1", "y1", "x2", "y2"]);
    }

    #[test]
    fn test_identity_variables_are_in_schema() {
        for variant in [
            FilterVariant::Basic,
            FilterVariant::Extended,
            FilterVariant::MultiSample { samples: 4 },
        ] {
            let schema = variant.schema();
            for channel in variant.channels() {
                assert!(schema.contains(channel.identity_variable()));
            }
        }
    }

    #[test]
    fn test_basic_gather_order() {
        let mut history = HistoryState::new(0);
        history.update(&DeviceReport::at(10.0, 20.0), &ComputedSample::default());

        let mut values = Vec::new();
        FilterVariant::Basic.gather(&DeviceReport::at(30.0, 40.0), &history, &spec(), &mut values);
        assert_eq!(values, vec![30.0, 40.0, 10.0, 20.0, 15200.0, 9500.0]);
    }

    #[test]
    fn test_extended_gather_zero_fills_absent() {
        let history = HistoryState::new(0);
        let mut values = Vec::new();
        FilterVariant::Extended.gather(&DeviceReport::at(1.0, 2.0), &history, &spec(), &mut values);

        assert_eq!(values.len(), EXTENDED_VARIABLES.len());
        let schema = FilterVariant::Extended.schema();
        assert_eq!(values[schema.slot_of("p").unwrap()], 0.0);
        assert_eq!(values[schema.slot_of("tx").unwrap()], 0.0);
        assert_eq!(values[schema.slot_of("d").unwrap()], 0.0);
        assert_eq!(values[schema.slot_of("mp").unwrap()], 8191.0);
    }

    #[test]
    fn test_extended_gather_computed_slots() {
        let mut history = HistoryState::new(0);
        let computed = ComputedSample::new(11.0, 12.0, 13.0);
        history.update(&DeviceReport::at(1.0, 2.0).with_pressure(5), &computed);

        let mut values = Vec::new();
        FilterVariant::Extended.gather(&DeviceReport::at(3.0, 4.0), &history, &spec(), &mut values);
        let schema = FilterVariant::Extended.schema();
        assert_eq!(values[schema.slot_of("lx").unwrap()], 1.0);
        assert_eq!(values[schema.slot_of("lp").unwrap()], 5.0);
        assert_eq!(values[schema.slot_of("cx").unwrap()], 11.0);
        assert_eq!(values[schema.slot_of("cy").unwrap()], 12.0);
        assert_eq!(values[schema.slot_of("cp").unwrap()], 13.0);
    }

    #[test]
    fn test_extended_gather_every_slot_by_name() {
        let mut history = HistoryState::new(0);
        let previous = DeviceReport::at(1.0, 2.0)
            .with_pressure(3)
            .with_tilt(4.0, 5.0)
            .with_hover_distance(6);
        history.update(&previous, &ComputedSample::new(7.0, 8.0, 9.0));

        let current = DeviceReport::at(10.0, 20.0)
            .with_pressure(30)
            .with_tilt(40.0, 50.0)
            .with_hover_distance(60);
        let spec = TabletSpec::new(100.0, 200.0, 300);

        let mut values = Vec::new();
        FilterVariant::Extended.gather(&current, &history, &spec, &mut values);

        let expected = [
            ("x", 10.0),
            ("y", 20.0),
            ("lx", 1.0),
            ("ly", 2.0),
            ("mx", 100.0),
            ("my", 200.0),
            ("p", 30.0),
            ("lp", 3.0),
            ("mp", 300.0),
            ("tx", 40.0),
            ("ty", 50.0),
            ("ltx", 4.0),
            ("lty", 5.0),
            ("d", 60.0),
            ("ld", 6.0),
            ("cx", 7.0),
            ("cy", 8.0),
            ("cp", 9.0),
        ];
        assert_eq!(expected.len(), EXTENDED_VARIABLES.len());

        let schema = FilterVariant::Extended.schema();
        for (name, value) in expected {
            let slot = schema.slot_of(name).unwrap();
            assert_eq!(values[slot], value, "{name}");
        }
    }

    #[test]
    fn test_multi_sample_gather_most_recent_first() {
        let variant = FilterVariant::MultiSample { samples: 2 };
        let mut history = HistoryState::new(variant.sample_capacity());
        for x in [1.0, 2.0, 3.0] {
            history.update(&DeviceReport::at(x, -x), &ComputedSample::default());
        }

        let mut values = Vec::new();
        variant.gather(&DeviceReport::at(4.0, -4.0), &history, &spec(), &mut values);
        assert_eq!(values, vec![4.0, -4.0, 15200.0, 9500.0, 3.0, -3.0, 2.0, -2.0]);
    }

    #[test]
    fn test_gather_reuses_buffer() {
        let history = HistoryState::new(0);
        let mut values = vec![99.0; 40];
        FilterVariant::Basic.gather(&DeviceReport::at(1.0, 1.0), &history, &spec(), &mut values);
        assert_eq!(values.len(), 6);
    }

    #[test]
    fn test_channels_per_variant() {
        assert_eq!(FilterVariant::Basic.channels(), &[Channel::X, Channel::Y]);
        assert_eq!(FilterVariant::Extended.channels().len(), 5);
        assert!(!FilterVariant::MultiSample { samples: 2 }.owns(Channel::Pressure));
    }
}
