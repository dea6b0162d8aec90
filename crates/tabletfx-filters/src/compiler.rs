//! Settings to compiled channel set.
//!
//! [`ChannelCompiler`] validates settings, compiles one expression per owned
//! channel, and substitutes the identity formula for any channel whose
//! formula fails. The result is a complete [`CompiledChannels`] that the
//! stage swaps in as a unit.

use crate::bindings::FilterVariant;
use crate::channel::Channel;
use crate::diagnostics::Diagnostics;
use crate::error::{SettingsError, SettingsResult};
use crate::hash::settings_hash;
use crate::settings::{FilterSettings, SettingsValidator};
use tabletfx_expr::{CompiledExpression, FormulaError, VariableSchema, compile_formula};
use tracing::debug;

/// One channel's compiled formula.
#[derive(Debug, Clone)]
pub struct CompiledChannel {
    channel: Channel,
    formula: String,
    expression: CompiledExpression,
    fallback: Option<FormulaError>,
}

impl CompiledChannel {
    /// Channel this expression drives.
    #[must_use]
    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Formula text from settings, even when it was rejected.
    #[must_use]
    pub fn formula(&self) -> &str {
        &self.formula
    }

    /// The expression evaluated for this channel.
    #[must_use]
    pub fn expression(&self) -> &CompiledExpression {
        &self.expression
    }

    /// Why the configured formula was replaced by the identity, if it was.
    #[must_use]
    pub fn fallback(&self) -> Option<&FormulaError> {
        self.fallback.as_ref()
    }

    /// Whether the identity formula is standing in for the configured one.
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.fallback.is_some()
    }
}

/// Every owned channel of a variant, compiled against its schema.
#[derive(Debug, Clone)]
pub struct CompiledChannels {
    variant: FilterVariant,
    settings_hash: u64,
    channels: Vec<CompiledChannel>,
    max_stack: usize,
}

impl CompiledChannels {
    /// Variant the set was compiled for.
    #[must_use]
    pub fn variant(&self) -> FilterVariant {
        self.variant
    }

    /// Hash of the settings the set was compiled from.
    #[must_use]
    pub fn settings_hash(&self) -> u64 {
        self.settings_hash
    }

    /// Compiled channels in evaluation order.
    #[must_use]
    pub fn channels(&self) -> &[CompiledChannel] {
        &self.channels
    }

    /// Deepest evaluation stack any channel needs.
    #[must_use]
    pub fn max_stack(&self) -> usize {
        self.max_stack
    }

    /// Channels running on the identity fallback.
    pub fn fallbacks(&self) -> impl Iterator<Item = &CompiledChannel> {
        self.channels.iter().filter(|c| c.is_fallback())
    }
}

/// Compiles [`FilterSettings`] into a [`CompiledChannels`] set.
#[derive(Debug, Clone, Default)]
pub struct ChannelCompiler {
    validator: SettingsValidator,
}

impl ChannelCompiler {
    /// Create a compiler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            validator: SettingsValidator::new(),
        }
    }

    /// Compile every channel the selected variant owns.
    ///
    /// Failing formulas are reported to `diagnostics` and replaced by the
    /// channel's identity formula.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if the settings fail validation or an
    /// identity formula does not compile.
    pub fn compile(
        &self,
        settings: &FilterSettings,
        diagnostics: &dyn Diagnostics,
    ) -> SettingsResult<CompiledChannels> {
        self.validator.validate(settings)?;

        let variant = settings.variant();
        let schema = variant.schema();
        let hash = settings_hash(settings);

        debug!("Compiling {} channels for {variant}", variant.channels().len());

        let channels = variant
            .channels()
            .iter()
            .map(|&channel| {
                compile_channel(channel, settings.formula(channel), &schema, diagnostics)
            })
            .collect::<SettingsResult<Vec<_>>>()?;

        let max_stack = channels
            .iter()
            .map(|c| c.expression.max_stack())
            .max()
            .unwrap_or(0);

        debug!(
            "Compiled {variant} with {} fallback(s), hash: {hash:x}",
            channels.iter().filter(|c| c.is_fallback()).count()
        );

        Ok(CompiledChannels {
            variant,
            settings_hash: hash,
            channels,
            max_stack,
        })
    }
}

fn compile_channel(
    channel: Channel,
    formula: &str,
    schema: &VariableSchema,
    diagnostics: &dyn Diagnostics,
) -> SettingsResult<CompiledChannel> {
    match compile_formula(formula, schema) {
        Ok(expression) => Ok(CompiledChannel {
            channel,
            formula: formula.to_string(),
            expression,
            fallback: None,
        }),
        Err(rejected) => {
            diagnostics.formula_rejected(channel, formula, &rejected);
            let expression = compile_formula(channel.identity_variable(), schema)
                .map_err(|error| SettingsError::FallbackFailed { channel, error })?;
            Ok(CompiledChannel {
                channel,
                formula: formula.to_string(),
                expression,
                fallback: Some(rejected),
            })
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::diagnostics::TracingDiagnostics;
    use crate::settings::VariantKind;
    use parking_lot::Mutex;
    use tabletfx_expr::ParseError;

    #[derive(Debug, Default)]
    struct Recorder(Mutex<Vec<(Channel, String)>>);

    impl Diagnostics for Recorder {
        fn formula_rejected(&self, channel: Channel, formula: &str, _error: &FormulaError) {
            self.0.lock().push((channel, formula.to_string()));
        }
    }

    fn must<T, E: std::fmt::Debug>(r: Result<T, E>) -> T {
        match r {
            Ok(v) => v,
            Err(e) => panic!("unexpected Err: {e:?}"),
        }
    }

    #[test]
    fn test_identity_formulas_compile_for_every_variant() {
        let compiler = ChannelCompiler::new();
        for kind in [VariantKind::Basic, VariantKind::Extended, VariantKind::MultiSample] {
            let compiled = must(compiler.compile(&FilterSettings::for_variant(kind), &TracingDiagnostics));
            assert_eq!(compiled.fallbacks().count(), 0, "{kind:?}");
            assert_eq!(compiled.channels().len(), compiled.variant().channels().len());
        }
    }

    #[test]
    fn test_rejected_formula_falls_back_and_reports() {
        let recorder = Recorder::default();
        let settings = FilterSettings::default().with_formula(Channel::Y, "y + tx");
        let compiled = must(ChannelCompiler::new().compile(&settings, &recorder));

        let y = &compiled.channels()[1];
        assert_eq!(y.channel(), Channel::Y);
        assert_eq!(y.formula(), "y + tx");
        assert_eq!(y.expression().source(), "y");
        assert!(matches!(
            y.fallback(),
            Some(FormulaError::Parse(ParseError::UnknownVariable { name, .. })) if name == "tx"
        ));
        assert_eq!(*recorder.0.lock(), vec![(Channel::Y, "y + tx".to_string())]);
    }

    #[test]
    fn test_empty_formula_falls_back() {
        let settings = FilterSettings::default().with_formula(Channel::X, "   ");
        let compiled = must(ChannelCompiler::new().compile(&settings, &TracingDiagnostics));
        assert!(compiled.channels()[0].is_fallback());
    }

    #[test]
    fn test_invalid_settings_rejected_before_compiling() {
        let recorder = Recorder::default();
        let settings = FilterSettings::for_variant(VariantKind::MultiSample)
            .with_samples(0)
            .with_formula(Channel::X, "(((");
        let result = ChannelCompiler::new().compile(&settings, &recorder);
        assert!(matches!(result, Err(SettingsError::InvalidSampleCount { .. })));
        assert!(recorder.0.lock().is_empty());
    }

    #[test]
    fn test_max_stack_covers_every_channel() {
        let settings = FilterSettings::default().with_formula(Channel::Y, "y + (lx * (ly - (mx / my)))");
        let compiled = must(ChannelCompiler::new().compile(&settings, &TracingDiagnostics));
        let deepest = compiled
            .channels()
            .iter()
            .map(|c| c.expression().max_stack())
            .max()
            .unwrap();
        assert_eq!(compiled.max_stack(), deepest);
        assert!(compiled.max_stack() >= 4);
    }
}
