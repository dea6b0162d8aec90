//! Single formula evaluation command

use anyhow::Result;
use tabletfx_expr::{EvalStack, VariableSchema, compile_formula};
use tabletfx_filters::{FilterSettings, FilterVariant, SettingsValidator, VariantKind};
use tracing::debug;

use crate::commands::VariantArg;
use crate::error::CliError;
use crate::output::{self, EvalResult};

/// Compile `formula` against the variant's schema and evaluate it once.
pub fn execute(
    formula: &str,
    variant: VariantArg,
    samples: usize,
    vars: &[String],
    json: bool,
) -> Result<()> {
    let settings = FilterSettings::for_variant(VariantKind::from(variant)).with_samples(samples);
    SettingsValidator::new()
        .validate(&settings)
        .map_err(CliError::from)?;

    let variant = settings.variant();
    let schema = variant.schema();
    let values = bind_values(&schema, variant, vars)?;

    let expression = compile_formula(formula, &schema).map_err(CliError::from)?;
    debug!("Compiled {:?}", expression);

    let mut stack = EvalStack::with_capacity(expression.max_stack());
    let value = expression.call_complex(&values, &mut stack);

    output::print_eval_result(
        &EvalResult {
            success: true,
            formula: formula.to_string(),
            variant: variant.to_string(),
            result: value.re,
            imaginary: value.im,
        },
        json,
    );
    Ok(())
}

/// Build the argument array from `name=value` bindings, zero elsewhere.
fn bind_values(
    schema: &VariableSchema,
    variant: FilterVariant,
    bindings: &[String],
) -> Result<Vec<f64>, CliError> {
    let mut values = vec![0.0; schema.len()];

    for binding in bindings {
        let (name, raw) = binding
            .split_once('=')
            .ok_or_else(|| CliError::InvalidBinding(binding.clone()))?;
        let name = name.trim();
        let value: f64 = raw
            .trim()
            .parse()
            .map_err(|_parse_error| CliError::InvalidBinding(binding.clone()))?;

        let slot = schema
            .slot_of(name)
            .ok_or_else(|| CliError::UnknownVariable {
                name: name.to_string(),
                variant: variant.to_string(),
            })?;
        if let Some(target) = values.get_mut(slot) {
            *target = value;
        }
    }

    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basic() -> (VariableSchema, FilterVariant) {
        (FilterVariant::Basic.schema(), FilterVariant::Basic)
    }

    #[test]
    fn test_bind_values_sets_slots() -> Result<(), CliError> {
        let (schema, variant) = basic();
        let values = bind_values(&schema, variant, &["lx=3".into(), " mx = 100 ".into()])?;
        assert_eq!(values, vec![0.0, 0.0, 3.0, 0.0, 100.0, 0.0]);
        Ok(())
    }

    #[test]
    fn test_bind_values_rejects_malformed() {
        let (schema, variant) = basic();
        assert!(matches!(
            bind_values(&schema, variant, &["x".into()]),
            Err(CliError::InvalidBinding(_))
        ));
        assert!(matches!(
            bind_values(&schema, variant, &["x=abc".into()]),
            Err(CliError::InvalidBinding(_))
        ));
    }

    #[test]
    fn test_bind_values_rejects_unknown_name() {
        let (schema, variant) = basic();
        assert!(matches!(
            bind_values(&schema, variant, &["cx=1".into()]),
            Err(CliError::UnknownVariable { name, .. }) if name == "cx"
        ));
    }
}
