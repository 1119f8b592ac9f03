//! The component catalog and assignment book for one organization.
//!
//! The catalog is the write side of the salary structure: it validates
//! component definitions (code format, reference resolution, cycle
//! freedom) and employee assignments (percentage ranges, duplicate
//! detection) at mutation time, so the calculation pipeline can assume a
//! well-formed structure. No amount evaluation happens here.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::calculation::{FormulaAst, StructureSnapshot, resolve_order};
use crate::error::{EngineError, EngineResult};
use crate::models::{
    CTC_CODE, CalculationKind, ComponentType, EmployeeComponentAssignment,
    SalaryComponentDefinition,
};

/// The caller-supplied portion of a component definition.
///
/// The catalog assigns the id and activation flag; everything else comes
/// from the draft.
#[derive(Debug, Clone, Deserialize)]
pub struct ComponentDraft {
    /// Unique uppercase code, e.g. `BASIC` or `SPECIAL_ALLOWANCE`.
    pub code: String,
    /// Human-readable display name.
    pub name: String,
    /// Whether this pays the employee or is withheld.
    pub component_type: ComponentType,
    /// How the amount is derived.
    pub calculation: CalculationKind,
    /// Whether the amount counts toward taxable income.
    #[serde(default)]
    pub is_taxable: bool,
    /// Whether an assignment is mandatory for every evaluated employee.
    #[serde(default)]
    pub is_statutory: bool,
    /// Payslip ordering hint, also the resolver tie-break.
    #[serde(default)]
    pub display_order: u32,
}

/// The caller-supplied portion of an employee assignment.
#[derive(Debug, Clone, Deserialize)]
pub struct AssignmentDraft {
    /// Code of the component being assigned.
    pub component_code: String,
    /// Fixed amount or percentage value, per the component's kind.
    pub value: Decimal,
    /// First date the assignment applies.
    pub effective_from: NaiveDate,
    /// Permits percentage values above 100.
    #[serde(default)]
    pub allow_over_hundred: bool,
    /// Free-form annotation.
    #[serde(default)]
    pub remarks: Option<String>,
}

/// Owns component definitions and the assignment book for one
/// organization.
///
/// # Example
///
/// ```
/// use payroll_engine::catalog::{ComponentCatalog, ComponentDraft};
/// use payroll_engine::models::{CalculationKind, ComponentType};
///
/// let mut catalog = ComponentCatalog::new();
/// let id = catalog
///     .define_component(ComponentDraft {
///         code: "BASIC".to_string(),
///         name: "Basic salary".to_string(),
///         component_type: ComponentType::Earning,
///         calculation: CalculationKind::Fixed,
///         is_taxable: true,
///         is_statutory: false,
///         display_order: 1,
///     })
///     .unwrap();
/// assert_eq!(catalog.component("BASIC").unwrap().id, id);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ComponentCatalog {
    components: Vec<SalaryComponentDefinition>,
    assignments: Vec<EmployeeComponentAssignment>,
}

impl ComponentCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and registers a new component definition.
    ///
    /// # Errors
    ///
    /// `Validation` for a malformed code, duplicate code, or bad
    /// percentage base; `UnresolvedReference` for a formula naming an
    /// unknown code; `Cycle` when the definition would close a dependency
    /// loop.
    pub fn define_component(&mut self, draft: ComponentDraft) -> EngineResult<Uuid> {
        validate_code(&draft.code)?;
        if self.component(&draft.code).is_some() {
            return Err(EngineError::Validation {
                field: "code".to_string(),
                message: format!("component code {} already exists", draft.code),
            });
        }

        let definition = SalaryComponentDefinition {
            id: Uuid::new_v4(),
            code: draft.code,
            name: draft.name,
            component_type: draft.component_type,
            calculation: draft.calculation,
            is_taxable: draft.is_taxable,
            is_statutory: draft.is_statutory,
            display_order: draft.display_order,
            is_active: true,
        };
        self.validate_calculation(&definition)?;
        self.check_acyclic_with(&definition)?;

        let id = definition.id;
        self.components.push(definition);
        Ok(id)
    }

    /// Replaces an existing component's definition, keeping its id.
    ///
    /// The cycle check runs against the active set with the replacement in
    /// place, so an update cannot smuggle in a loop.
    pub fn update_component(&mut self, code: &str, draft: ComponentDraft) -> EngineResult<()> {
        validate_code(&draft.code)?;
        let existing = self
            .component(code)
            .ok_or_else(|| EngineError::ComponentNotFound {
                code: code.to_string(),
            })?;
        let id = existing.id;
        if draft.code != code && self.component(&draft.code).is_some() {
            return Err(EngineError::Validation {
                field: "code".to_string(),
                message: format!("component code {} already exists", draft.code),
            });
        }

        let replacement = SalaryComponentDefinition {
            id,
            code: draft.code,
            name: draft.name,
            component_type: draft.component_type,
            calculation: draft.calculation,
            is_taxable: draft.is_taxable,
            is_statutory: draft.is_statutory,
            display_order: draft.display_order,
            is_active: existing.is_active,
        };
        self.validate_calculation(&replacement)?;
        self.check_acyclic_with(&replacement)?;

        let slot = self
            .components
            .iter_mut()
            .find(|c| c.id == id)
            .expect("component present above");
        *slot = replacement;
        Ok(())
    }

    /// Deactivates a component, refusing while anything still depends on
    /// it.
    ///
    /// # Errors
    ///
    /// `ReferencedByActiveAssignment` when any employee still holds an
    /// active assignment of it; `ReferencedByDependentComponent` when
    /// another active component's percentage base or formula names it.
    pub fn deactivate_component(&mut self, code: &str) -> EngineResult<()> {
        let target = self
            .component(code)
            .ok_or_else(|| EngineError::ComponentNotFound {
                code: code.to_string(),
            })?;
        let target_id = target.id;

        if self
            .assignments
            .iter()
            .any(|a| a.is_active && a.component_id == target_id)
        {
            return Err(EngineError::ReferencedByActiveAssignment {
                code: code.to_string(),
            });
        }

        for other in self.components.iter().filter(|c| c.is_active && c.id != target_id) {
            let depends = match &other.calculation {
                CalculationKind::Fixed => false,
                CalculationKind::Percentage { base_component_id } => {
                    *base_component_id == target_id
                }
                CalculationKind::Formula { expression } => FormulaAst::parse(expression)
                    .map(|ast| ast.variables().contains(code))
                    .unwrap_or(false),
            };
            if depends {
                return Err(EngineError::ReferencedByDependentComponent {
                    code: code.to_string(),
                    dependent: other.code.clone(),
                });
            }
        }

        let slot = self
            .components
            .iter_mut()
            .find(|c| c.id == target_id)
            .expect("component present above");
        slot.is_active = false;
        Ok(())
    }

    /// Assigns a component to an employee.
    ///
    /// Percentage values must lie in `[0, 100]` unless the draft sets
    /// `allow_over_hundred`; negative values are never accepted. A second
    /// active assignment of the same component to the same employee is
    /// rejected.
    pub fn assign(&mut self, employee_id: &str, draft: AssignmentDraft) -> EngineResult<()> {
        let component = self
            .component(&draft.component_code)
            .ok_or_else(|| EngineError::ComponentNotFound {
                code: draft.component_code.clone(),
            })?;
        if !component.is_active {
            return Err(EngineError::Validation {
                field: "component_code".to_string(),
                message: format!("component {} is inactive", draft.component_code),
            });
        }
        validate_value(component, &draft)?;
        let component_id = component.id;

        if self
            .assignments
            .iter()
            .any(|a| a.is_active && a.employee_id == employee_id && a.component_id == component_id)
        {
            return Err(EngineError::Validation {
                field: "component_code".to_string(),
                message: format!(
                    "employee {} already has an active {} assignment",
                    employee_id, draft.component_code
                ),
            });
        }

        self.assignments.push(EmployeeComponentAssignment {
            employee_id: employee_id.to_string(),
            component_id,
            value: draft.value,
            effective_from: draft.effective_from,
            is_active: true,
            allow_over_hundred: draft.allow_over_hundred,
            remarks: draft.remarks,
        });
        Ok(())
    }

    /// Replaces the active assignment of a component for an employee.
    pub fn update_assignment(
        &mut self,
        employee_id: &str,
        draft: AssignmentDraft,
    ) -> EngineResult<()> {
        let component = self
            .component(&draft.component_code)
            .ok_or_else(|| EngineError::ComponentNotFound {
                code: draft.component_code.clone(),
            })?;
        validate_value(component, &draft)?;
        let component_id = component.id;

        let slot = self
            .assignments
            .iter_mut()
            .find(|a| {
                a.is_active && a.employee_id == employee_id && a.component_id == component_id
            })
            .ok_or_else(|| EngineError::MissingAssignment {
                component: draft.component_code.clone(),
                employee_id: employee_id.to_string(),
            })?;
        slot.value = draft.value;
        slot.effective_from = draft.effective_from;
        slot.allow_over_hundred = draft.allow_over_hundred;
        slot.remarks = draft.remarks;
        Ok(())
    }

    /// Hard-removes the active assignment of a component for an employee.
    pub fn remove_assignment(&mut self, employee_id: &str, code: &str) -> EngineResult<()> {
        let component = self
            .component(code)
            .ok_or_else(|| EngineError::ComponentNotFound {
                code: code.to_string(),
            })?;
        let component_id = component.id;
        let before = self.assignments.len();
        self.assignments
            .retain(|a| !(a.employee_id == employee_id && a.component_id == component_id));
        if self.assignments.len() == before {
            return Err(EngineError::MissingAssignment {
                component: code.to_string(),
                employee_id: employee_id.to_string(),
            });
        }
        Ok(())
    }

    /// Looks a component up by code.
    pub fn component(&self, code: &str) -> Option<&SalaryComponentDefinition> {
        self.components.iter().find(|c| c.code == code)
    }

    /// All definitions, in display order.
    pub fn components(&self) -> Vec<&SalaryComponentDefinition> {
        let mut all: Vec<_> = self.components.iter().collect();
        all.sort_by(|a, b| {
            a.display_order
                .cmp(&b.display_order)
                .then_with(|| a.code.cmp(&b.code))
        });
        all
    }

    /// A read-only snapshot of active definitions and assignments for a
    /// calculation batch.
    pub fn snapshot(&self) -> StructureSnapshot {
        let components = self
            .components
            .iter()
            .filter(|c| c.is_active)
            .cloned()
            .collect();
        let mut assignments: std::collections::HashMap<String, Vec<EmployeeComponentAssignment>> =
            std::collections::HashMap::new();
        for a in self.assignments.iter().filter(|a| a.is_active) {
            assignments
                .entry(a.employee_id.clone())
                .or_default()
                .push(a.clone());
        }
        StructureSnapshot {
            components,
            assignments,
        }
    }

    /// Checks the calculation rule's references against the active set.
    fn validate_calculation(&self, definition: &SalaryComponentDefinition) -> EngineResult<()> {
        match &definition.calculation {
            CalculationKind::Fixed => Ok(()),
            CalculationKind::Percentage { base_component_id } => {
                // A self-base passes reference validation and is reported
                // as a cycle by `check_acyclic_with`.
                if *base_component_id == definition.id {
                    return Ok(());
                }
                let base = self
                    .components
                    .iter()
                    .find(|c| c.id == *base_component_id)
                    .ok_or_else(|| EngineError::Validation {
                        field: "base_component_id".to_string(),
                        message: "percentage base does not exist".to_string(),
                    })?;
                if !base.is_active {
                    return Err(EngineError::Validation {
                        field: "base_component_id".to_string(),
                        message: format!("percentage base {} is inactive", base.code),
                    });
                }
                if !base.is_earning() {
                    return Err(EngineError::Validation {
                        field: "base_component_id".to_string(),
                        message: format!("percentage base {} is not an earning", base.code),
                    });
                }
                Ok(())
            }
            CalculationKind::Formula { expression } => {
                let ast =
                    FormulaAst::parse(expression).map_err(|e| EngineError::Validation {
                        field: "expression".to_string(),
                        message: e.to_string(),
                    })?;
                for var in ast.variables() {
                    if var == CTC_CODE || var == definition.code {
                        continue;
                    }
                    let referenced = self
                        .components
                        .iter()
                        .find(|c| c.code == var)
                        .ok_or_else(|| EngineError::UnresolvedReference {
                            code: var.clone(),
                            referenced_by: definition.code.clone(),
                        })?;
                    if !referenced.is_active {
                        return Err(EngineError::UnresolvedReference {
                            code: var.clone(),
                            referenced_by: definition.code.clone(),
                        });
                    }
                }
                Ok(())
            }
        }
    }

    /// Runs the resolver over the active set with `candidate` in place.
    ///
    /// A self-referencing candidate surfaces here as a two-node `Cycle`
    /// path of its own code.
    fn check_acyclic_with(&self, candidate: &SalaryComponentDefinition) -> EngineResult<()> {
        let mut set: Vec<SalaryComponentDefinition> = self
            .components
            .iter()
            .filter(|c| c.is_active && c.id != candidate.id)
            .cloned()
            .collect();
        set.push(candidate.clone());
        resolve_order(&set)?;
        Ok(())
    }
}

/// Codes are non-empty, uppercase-with-underscores, and never the reserved
/// `CTC` input.
fn validate_code(code: &str) -> EngineResult<()> {
    if code.is_empty() {
        return Err(EngineError::Validation {
            field: "code".to_string(),
            message: "must not be empty".to_string(),
        });
    }
    if !code.chars().all(|c| c.is_ascii_uppercase() || c == '_') {
        return Err(EngineError::Validation {
            field: "code".to_string(),
            message: format!("{code} must contain only A-Z and underscores"),
        });
    }
    if code == CTC_CODE {
        return Err(EngineError::Validation {
            field: "code".to_string(),
            message: format!("{CTC_CODE} is a reserved input name"),
        });
    }
    Ok(())
}

/// Range check for the assigned value against the component's kind.
fn validate_value(
    component: &SalaryComponentDefinition,
    draft: &AssignmentDraft,
) -> EngineResult<()> {
    if draft.value < Decimal::ZERO {
        return Err(EngineError::Validation {
            field: "value".to_string(),
            message: "must not be negative".to_string(),
        });
    }
    if matches!(component.calculation, CalculationKind::Percentage { .. })
        && draft.value > Decimal::from(100)
        && !draft.allow_over_hundred
    {
        return Err(EngineError::Validation {
            field: "value".to_string(),
            message: format!("percentage {} exceeds 100", draft.value),
        });
    }
    Ok(())
}
