//! Single-component value evaluation.
//!
//! Given a component definition and a context of already-resolved values,
//! produces one non-negative monetary amount rounded to the minor unit.
//! Pure function of its inputs.

use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::HashMap;

use crate::error::{EngineError, EngineResult};
use crate::models::{Component, PRESENT_RATIO_SYMBOL, ValueType};

use super::formula::evaluate_formula;

/// Rounds a monetary amount to 2 decimal places, half-up.
///
/// All amounts in the engine are non-negative, so midpoint-away-from-zero
/// is exactly round-half-up at the minor-unit boundary.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Evaluates one component against the resolution context.
///
/// The context must already hold the reserved symbols (`CTC`,
/// `PRESENT_RATIO`) and every component this one references. Rules:
///
/// - `fixed`: the stored amount, pro-rated by the attendance ratio unless
///   the component is flagged non-prorated;
/// - `percentage_of`: `context[reference] * percent / 100` (the reference is
///   already prorated, so no second proration is applied);
/// - `formula`: restricted-expression evaluation over the context.
///
/// The result is rounded half-up to the minor unit before it is returned,
/// so every downstream consumer sees the same per-component figure.
///
/// # Errors
///
/// Returns `UnresolvedReference` for a missing percentage reference and
/// `FormulaEvaluation` for formula failures.
pub fn evaluate_component(
    component: &Component,
    context: &HashMap<String, Decimal>,
) -> EngineResult<Decimal> {
    let raw = match &component.value {
        ValueType::Fixed { amount } => {
            if component.prorated {
                let ratio = context
                    .get(PRESENT_RATIO_SYMBOL)
                    .copied()
                    .unwrap_or(Decimal::ONE);
                *amount * ratio
            } else {
                *amount
            }
        }
        ValueType::PercentageOf { reference, percent } => {
            let base = context.get(reference).copied().ok_or_else(|| {
                EngineError::UnresolvedReference {
                    component: component.code.clone(),
                    reference: reference.clone(),
                }
            })?;
            base * *percent / Decimal::from(100)
        }
        ValueType::Formula { expression } => {
            evaluate_formula(&component.code, expression, context)?
        }
    };

    Ok(round_money(raw.max(Decimal::ZERO)))
}
