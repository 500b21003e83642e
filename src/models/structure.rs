//! Salary structure and component definitions.
//!
//! A salary structure is an ordered list of components; each component's
//! value is either a fixed amount, a percentage of another component (or of
//! CTC), or a restricted arithmetic formula over other components.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Reserved context symbol for the employee's monthly cost-to-company.
pub const CTC_SYMBOL: &str = "CTC";

/// Reserved context symbol for the attendance-derived proration multiplier.
pub const PRESENT_RATIO_SYMBOL: &str = "PRESENT_RATIO";

/// Returns true if `symbol` is one of the reserved context symbols that a
/// component may reference without it being another component.
pub fn is_reserved_symbol(symbol: &str) -> bool {
    symbol == CTC_SYMBOL || symbol == PRESENT_RATIO_SYMBOL
}

/// Whether a component adds to or subtracts from pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    /// Adds to gross pay.
    Earning,
    /// Subtracts from gross pay.
    Deduction,
}

/// How a component's value is computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ValueType {
    /// A stored constant amount per period.
    Fixed {
        /// The monthly amount.
        amount: Decimal,
    },
    /// A percentage of another component's value, or of CTC.
    PercentageOf {
        /// The referenced component code or the reserved symbol `CTC`.
        reference: String,
        /// The percentage to apply (e.g. 40 for 40%).
        percent: Decimal,
    },
    /// A restricted arithmetic expression over context symbols.
    Formula {
        /// The expression, e.g. `min(BASIC, 15000) * 0.12`.
        expression: String,
    },
}

/// A single salary component within a structure.
///
/// # Example
///
/// ```
/// use payroll_engine::models::{Component, ComponentKind, ValueType};
/// use rust_decimal::Decimal;
///
/// let basic = Component {
///     code: "BASIC".to_string(),
///     label: "Basic Salary".to_string(),
///     kind: ComponentKind::Earning,
///     value: ValueType::PercentageOf {
///         reference: "CTC".to_string(),
///         percent: Decimal::from(40),
///     },
///     taxable: true,
///     prorated: true,
///     sequence: 1,
/// };
/// assert_eq!(basic.code, "BASIC");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    /// Unique code within the structure, uppercase `[A-Z0-9_]{1,10}`.
    pub code: String,
    /// Human-readable label shown on payslips.
    pub label: String,
    /// Earning or deduction.
    pub kind: ComponentKind,
    /// How the value is computed.
    pub value: ValueType,
    /// Whether the component is subject to income tax.
    pub taxable: bool,
    /// Whether the component is pro-rated by the attendance ratio.
    /// Only applies to fixed components; percentage and formula components
    /// inherit proration from their inputs.
    #[serde(default = "default_prorated")]
    pub prorated: bool,
    /// Display and merge ordering within the payslip.
    pub sequence: u32,
}

fn default_prorated() -> bool {
    true
}

/// A versioned salary structure definition.
///
/// Structures are replaced by version rather than mutated; once a finalized
/// payslip references a version, that version's component definitions are
/// frozen for the payslip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryStructure {
    /// Unique structure code (e.g. "STD_INDIA").
    pub code: String,
    /// Version number, incremented on replacement.
    pub version: u32,
    /// Whether the structure may be assigned to employees.
    pub is_active: bool,
    /// The components, in declaration order.
    pub components: Vec<Component>,
}

impl SalaryStructure {
    /// Validates the structure's definition invariants.
    ///
    /// Checks, in order: component code format, code uniqueness, reference
    /// resolvability, and acyclicity of the reference graph. This is the
    /// save-time gate: a structure that passes `validate` cannot produce a
    /// definition error at resolve time.
    ///
    /// # Errors
    ///
    /// Returns `InvalidComponentCode`, `DuplicateComponent`,
    /// `UnresolvedReference`, `FormulaEvaluation` (for unparseable
    /// expressions), or `CyclicStructure`.
    pub fn validate(&self) -> EngineResult<()> {
        let mut seen = std::collections::HashSet::new();
        for component in &self.components {
            if !valid_component_code(&component.code) {
                return Err(EngineError::InvalidComponentCode {
                    code: component.code.clone(),
                });
            }
            if !seen.insert(component.code.as_str()) {
                return Err(EngineError::DuplicateComponent {
                    code: component.code.clone(),
                    structure: self.code.clone(),
                });
            }
        }

        // Resolvability and acyclicity are graph properties; the ordering
        // routine performs both checks.
        crate::calculation::dependency_order(self)?;
        Ok(())
    }

    /// Looks up a component by code.
    pub fn component(&self, code: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.code == code)
    }
}

/// Component codes are uppercase alphanumeric or underscore, 1-10 chars.
fn valid_component_code(code: &str) -> bool {
    !code.is_empty()
        && code.len() <= 10
        && code
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}
