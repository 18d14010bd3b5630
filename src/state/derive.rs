use crate::core::field_path::{FieldPath, IntoFieldPath};
use crate::core::value::Value;
use crate::error::WizardError;
use crate::state::store::ValueStore;

pub type DeriveFn = Box<dyn Fn(&[f64]) -> Option<f64> + Send + Sync>;

/// A field whose value is computed from other fields, e.g.
/// `amount_due = monthly_fee * number_of_months`.
///
/// The rule fires whenever one of its inputs changes and every input holds a
/// number. Its output replaces whatever the target held, including manual
/// edits.
pub struct DerivedField {
    pub target: FieldPath,
    pub inputs: Vec<FieldPath>,
    compute: DeriveFn,
}

impl DerivedField {
    pub fn new<I, P>(
        target: impl IntoFieldPath,
        inputs: I,
        compute: impl Fn(&[f64]) -> Option<f64> + Send + Sync + 'static,
    ) -> Result<Self, WizardError>
    where
        I: IntoIterator<Item = P>,
        P: IntoFieldPath,
    {
        let target = target.into_field_path()?;
        let inputs = inputs
            .into_iter()
            .map(IntoFieldPath::into_field_path)
            .collect::<Result<Vec<_>, _>>()?;
        if inputs.is_empty() {
            return Err(WizardError::EmptyDerivation(target.to_string()));
        }
        Ok(Self {
            target,
            inputs,
            compute: Box::new(compute),
        })
    }

    pub fn product<I, P>(target: impl IntoFieldPath, inputs: I) -> Result<Self, WizardError>
    where
        I: IntoIterator<Item = P>,
        P: IntoFieldPath,
    {
        Self::new(target, inputs, |values| Some(values.iter().product()))
    }

    pub fn sum<I, P>(target: impl IntoFieldPath, inputs: I) -> Result<Self, WizardError>
    where
        I: IntoIterator<Item = P>,
        P: IntoFieldPath,
    {
        Self::new(target, inputs, |values| Some(values.iter().sum()))
    }

    /// True when writing `changed` may alter one of this rule's inputs.
    pub fn depends_on(&self, changed: &FieldPath) -> bool {
        self.inputs
            .iter()
            .any(|input| input.starts_with(changed) || changed.starts_with(input))
    }

    /// `None` while any input is missing or not numeric.
    pub fn evaluate(&self, values: &ValueStore) -> Option<Value> {
        let numbers = self
            .inputs
            .iter()
            .map(|input| values.get(input).and_then(Value::coerce_number))
            .collect::<Option<Vec<f64>>>()?;
        (self.compute)(&numbers)
            .filter(|n| n.is_finite())
            .map(Value::Number)
    }
}

impl std::fmt::Debug for DerivedField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedField")
            .field("target", &self.target)
            .field("inputs", &self.inputs)
            .finish()
    }
}
