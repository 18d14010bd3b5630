use super::{WizardEngine, WizardEvent};
use crate::core::field_path::{FieldPath, IntoFieldPath};
use crate::core::value::Value;
use crate::state::form::FormState;
use crate::error::{ReferenceError, WizardError};
use crate::state::reference::{ReferenceItem, ReferenceState};
use crate::state::validation::{ValidationMode, evaluate_step};

impl WizardEngine {
    /// Records a user edit: writes the value, marks the field touched and
    /// clears its error, then refreshes dependent fields.
    pub fn update_field(
        &mut self,
        path: impl IntoFieldPath,
        value: impl Into<Value>,
    ) -> Result<Vec<WizardEvent>, WizardError> {
        let path = path.into_field_path()?;
        if !self.accepts_input() {
            log::debug!("ignoring edit of '{path}' while {:?}", self.phase);
            return Ok(Vec::new());
        }
        self.form.write(&path, value.into())?;
        self.reopen();
        self.form.touch(&path);

        let mut events = vec![WizardEvent::FieldChanged { path: path.clone() }];
        events.extend(self.clear_errors_under(&path));
        events.extend(self.propagate(vec![path]));
        Ok(events)
    }

    /// Blur handling: the field becomes touched and its own error, if any, is
    /// shown. The value is left alone.
    pub fn mark_touched(&mut self, path: impl IntoFieldPath) -> Result<Vec<WizardEvent>, WizardError> {
        let path = path.into_field_path()?;
        if !self.accepts_input() {
            return Ok(Vec::new());
        }
        self.reopen();
        self.form.touch(&path);

        let current = self.current_step();
        let owner = if current.owns_field(&path) {
            Some(current)
        } else {
            self.spec
                .step_owning(&path)
                .and_then(|id| self.spec.index_of(id.as_str()))
                .and_then(|index| self.spec.step_at(index))
        };
        let Some(step) = owner else {
            return Ok(Vec::new());
        };

        let validation = evaluate_step(step, &self.form, ValidationMode::Display);
        match validation.errors.get(&path).cloned() {
            Some(message) => {
                self.form.set_error(&path, message.clone());
                Ok(vec![WizardEvent::ErrorShown { path, message }])
            }
            None => {
                if self.form.clear_error(&path) {
                    Ok(vec![WizardEvent::ErrorCleared { path }])
                } else {
                    Ok(Vec::new())
                }
            }
        }
    }

    pub fn begin_reference_load(&mut self, source: impl Into<String>) {
        let source = source.into();
        log::debug!("loading reference data '{source}'");
        self.references.insert(source, ReferenceState::Loading);
    }

    /// Stores the outcome of a reference fetch. A failure or an empty list
    /// only means no defaults get filled in.
    pub fn apply_reference(
        &mut self,
        source: impl Into<String>,
        result: Result<Vec<ReferenceItem>, ReferenceError>,
    ) -> Vec<WizardEvent> {
        let source = source.into();
        let items = match result {
            Ok(items) => items,
            Err(err) => {
                log::warn!("reference data '{source}' unavailable: {err}");
                let message = err.to_string();
                self.references.insert(
                    source.clone(),
                    ReferenceState::Failed {
                        message: message.clone(),
                    },
                );
                return vec![WizardEvent::ReferenceFailed { source, message }];
            }
        };

        log::info!("reference data '{source}' loaded ({} items)", items.len());
        let mut events = vec![WizardEvent::ReferenceLoaded {
            source: source.clone(),
            count: items.len(),
        }];
        self.references
            .insert(source.clone(), ReferenceState::Ready(items));

        self.release_abandoned();
        if !self.accepts_input() {
            return events;
        }

        let mut changed = Vec::new();
        for binding in self.spec.reference_defaults() {
            if binding.source != source {
                continue;
            }
            let items = self
                .references
                .get(&binding.source)
                .map(ReferenceState::items)
                .unwrap_or(&[]);
            let Some(value) = binding.resolve(items, self.form.values()) else {
                continue;
            };
            if self.form.value(&binding.target) == Some(&value) {
                continue;
            }
            if !Self::write_computed(&mut self.form, &binding.target, value.clone()) {
                continue;
            }
            events.push(WizardEvent::DefaultApplied {
                source: binding.source.clone(),
                path: binding.target.clone(),
                value,
            });
            changed.push(binding.target.clone());
        }
        if !changed.is_empty() {
            events.extend(self.propagate(changed));
        }
        events
    }

    /// Re-applies every derived rule regardless of what changed.
    pub(super) fn refresh_derived(&mut self) -> Vec<WizardEvent> {
        let mut events = Vec::new();
        for rule in self.spec.derived() {
            let Some(value) = rule.evaluate(self.form.values()) else {
                continue;
            };
            if self.form.value(&rule.target) == Some(&value) {
                continue;
            }
            if !Self::write_computed(&mut self.form, &rule.target, value.clone()) {
                continue;
            }
            events.push(WizardEvent::DerivedUpdated {
                path: rule.target.clone(),
                value,
            });
        }
        events
    }

    /// Follows `changed` through selector-driven defaults and derived rules,
    /// in declaration order.
    fn propagate(&mut self, mut changed: Vec<FieldPath>) -> Vec<WizardEvent> {
        let mut events = Vec::new();

        for binding in self.spec.reference_defaults() {
            if !changed.iter().any(|path| binding.is_selected_by(path)) {
                continue;
            }
            let items = self
                .references
                .get(&binding.source)
                .map(ReferenceState::items)
                .unwrap_or(&[]);
            let Some(value) = binding.resolve(items, self.form.values()) else {
                continue;
            };
            if self.form.value(&binding.target) == Some(&value) {
                continue;
            }
            if !Self::write_computed(&mut self.form, &binding.target, value.clone()) {
                continue;
            }
            events.push(WizardEvent::DefaultApplied {
                source: binding.source.clone(),
                path: binding.target.clone(),
                value,
            });
            changed.push(binding.target.clone());
        }

        for rule in self.spec.derived() {
            if !changed.iter().any(|path| rule.depends_on(path)) {
                continue;
            }
            let Some(value) = rule.evaluate(self.form.values()) else {
                continue;
            };
            if self.form.value(&rule.target) == Some(&value) {
                continue;
            }
            log::debug!("derived '{}' = {:?}", rule.target, value);
            if !Self::write_computed(&mut self.form, &rule.target, value.clone()) {
                continue;
            }
            events.push(WizardEvent::DerivedUpdated {
                path: rule.target.clone(),
                value,
            });
            changed.push(rule.target.clone());
        }

        events
    }

    /// Writes a value the engine computed itself. A target the store refuses
    /// is logged and skipped.
    fn write_computed(form: &mut FormState, target: &FieldPath, value: Value) -> bool {
        if let Err(err) = form.write(target, value) {
            log::warn!("cannot write computed field '{target}': {err}");
            return false;
        }
        form.clear_error(target);
        true
    }

    fn clear_errors_under(&mut self, path: &FieldPath) -> Vec<WizardEvent> {
        let stale: Vec<FieldPath> = self
            .form
            .errors()
            .keys()
            .filter(|key| key.starts_with(path))
            .cloned()
            .collect();
        stale
            .into_iter()
            .filter(|key| self.form.clear_error(key))
            .map(|key| WizardEvent::ErrorCleared { path: key })
            .collect()
    }
}
