//! Pay calculation modules.
//!
//! Each module handles one stage of resolving an employee's pay:
//!
//! - [`formula`]: restricted arithmetic expression evaluation
//! - [`dependency_order`]: topological ordering of structure components
//! - [`component_value`]: single-component evaluation and money rounding
//! - [`statutory`]: provident fund, insurance, and professional tax rules
//! - [`structure_resolution`]: full per-employee resolution

pub mod component_value;
pub mod dependency_order;
pub mod formula;
pub mod statutory;
pub mod structure_resolution;

pub use component_value::{evaluate_component, round_money};
pub use dependency_order::{component_references, dependency_order};
pub use formula::{evaluate_formula, referenced_symbols};
pub use statutory::{
    StatutoryOutcome, esi_contribution, evaluate_statutory, pf_contribution, pt_amount,
};
pub use structure_resolution::resolve_pay;
