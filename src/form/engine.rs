use std::{any::Any, future::Future, panic::AssertUnwindSafe, sync::Arc, time::Duration};

use anyhow::anyhow;

use crossterm::event::KeyEvent;
use futures::FutureExt;
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use crate::{
    app::{
        FormOptions, StatusLine,
        navigation::{Control, EnterOutcome, FocusRing},
    },
    cache::{ApplyOutcome, CacheBinding},
    domain::{FieldSchema, Layout},
    schema::{RenderPlan, resolve_layout},
};

use super::{
    error::ConfigError,
    rules::{check_field, coerce_values},
    state::{FormPhase, FormState},
    validation::{AsyncOutcome, AsyncTrigger, AsyncValidator, ValidatorOrchestrator},
};

/// Answer to a non-blocking submit request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitReadiness {
    Ready,
    /// Async checks still running for these fields.
    Pending { fields: Vec<String> },
    Invalid { issues: usize },
    Closed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Submitted(Value),
    Invalid { issues: usize },
    /// The mutation rejected; the message is also the form banner.
    Failed { message: String },
    Closed,
}

type SubmitHook = Box<dyn FnMut(&Value) + Send>;

/// Schema-driven form: values, validation, focus and submission.
///
/// Async validators run as tokio tasks, so `change`, `blur`, `focus` and
/// `request_submit` must be called from within a tokio runtime once any
/// validator is registered.
pub struct FormEngine {
    schema: Arc<FieldSchema>,
    plan: RenderPlan,
    state: FormState,
    validators: ValidatorOrchestrator,
    options: FormOptions,
    focus: FocusRing,
    focused: Option<String>,
    status: StatusLine,
    cache: Option<CacheBinding>,
    on_submit: Option<SubmitHook>,
    closed: bool,
}

impl FormEngine {
    /// Resolve the layout and seed values from schema defaults.
    pub fn new(schema: FieldSchema, layout: &Layout) -> Result<Self, ConfigError> {
        let plan = resolve_layout(&schema, layout)?;
        let state = FormState::from_schema(&schema, None);
        let options = FormOptions::default();
        let focus = FocusRing::from_plan(&schema, &plan).with_submit();
        let validators =
            ValidatorOrchestrator::new(options.debounce, options.unverified_message.clone());
        Ok(Self {
            schema: Arc::new(schema),
            plan,
            state,
            validators,
            options,
            focus,
            focused: None,
            status: StatusLine::new(),
            cache: None,
            on_submit: None,
            closed: false,
        })
    }

    pub fn with_options(mut self, options: FormOptions) -> Self {
        self.validators
            .configure(options.debounce, options.unverified_message.clone());
        self.options = options;
        self
    }

    /// Seed values from an existing entity, e.g. for an edit form.
    pub fn with_initial_values(mut self, initial: &Map<String, Value>) -> Self {
        self.state = FormState::from_schema(&self.schema, Some(initial));
        self
    }

    pub fn with_async_validator(
        mut self,
        field: &str,
        validator: AsyncValidator,
    ) -> Result<Self, ConfigError> {
        if !self.schema.contains(field) {
            return Err(ConfigError::UnknownValidatorField {
                name: field.to_string(),
            });
        }
        self.validators.register(field, validator);
        Ok(self)
    }

    pub fn with_cache_binding(mut self, binding: CacheBinding) -> Self {
        self.cache = Some(binding);
        self
    }

    pub fn with_on_submit(mut self, hook: impl FnMut(&Value) + Send + 'static) -> Self {
        self.on_submit = Some(Box::new(hook));
        self
    }

    pub fn without_submit_control(mut self) -> Self {
        self.focus = FocusRing::from_plan(&self.schema, &self.plan);
        self
    }

    /// Register an extra control (button, adornment) right after `anchor`.
    pub fn with_control_after(mut self, anchor: &str, control: Control) -> Self {
        self.focus.insert_after(anchor, control);
        self
    }

    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    pub fn plan(&self) -> &RenderPlan {
        &self.plan
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn options(&self) -> &FormOptions {
        &self.options
    }

    pub fn phase(&self) -> FormPhase {
        self.state.phase
    }

    pub fn status(&self) -> &StatusLine {
        &self.status
    }

    pub fn focus_ring(&self) -> &FocusRing {
        &self.focus
    }

    pub fn focused(&self) -> Option<&str> {
        self.focused.as_deref()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn change(&mut self, field: &str, value: impl Into<String>) {
        if self.closed {
            return;
        }
        let Some(definition) = self.schema.field(field) else {
            warn!(field, "change for unknown field ignored");
            return;
        };
        if definition.disabled {
            debug!(field, "change for disabled field ignored");
            return;
        }
        let label = definition.display_label();
        if !self.state.set_value(field, value.into()) {
            return;
        }
        if matches!(
            self.state.phase,
            FormPhase::Idle | FormPhase::SubmitError | FormPhase::Success
        ) {
            self.state.phase = FormPhase::Editing;
        }

        if self.validators.has_validator(field) {
            self.validators.invalidate(field);
            self.state.pending_async.shift_remove(field);
        }
        let sync_error = self.check_sync(field);
        let valid = sync_error.is_none();
        self.state.set_error(field, sync_error);
        if valid && self.validators.trigger(field) == Some(AsyncTrigger::Change) {
            let delay = self.validators.debounce_for(field);
            self.issue_async(field, delay);
        }
        self.status.editing(&label);
        self.settle_phase();
    }

    pub fn blur(&mut self, field: &str) {
        if self.closed || !self.schema.contains(field) {
            return;
        }
        let delay = self.validators.debounce_for(field);
        self.validate_field(field, delay);
        if matches!(self.state.phase, FormPhase::Idle | FormPhase::Editing)
            && !self.state.pending_async.is_empty()
        {
            self.state.phase = FormPhase::Validating;
        }
        self.settle_phase();
    }

    /// Move focus; leaving a field counts as its blur.
    pub fn focus(&mut self, target: &str) {
        if self.closed {
            return;
        }
        let previous = self.focused.replace(target.to_string());
        if let Some(previous) = previous
            && previous != target
            && self.schema.contains(&previous)
        {
            self.blur(&previous);
        }
    }

    pub fn set_expanded(&mut self, control: &str, expanded: bool) -> bool {
        self.focus.set_expanded(control, expanded)
    }

    /// Enter-to-next-field handling for the focused control.
    pub fn handle_key(&mut self, key: &KeyEvent) -> EnterOutcome {
        if self.closed {
            return EnterOutcome::PassThrough;
        }
        let Some(current) = self.focused.clone() else {
            return EnterOutcome::PassThrough;
        };
        let outcome = self.focus.handle_enter(&current, key);
        if let EnterOutcome::MoveFocus(target) = &outcome {
            self.focus(target);
        }
        outcome
    }

    /// Commit finished async checks without waiting. Returns how many applied.
    pub fn poll(&mut self) -> usize {
        let mut applied = 0;
        while let Some(outcome) = self.validators.try_next() {
            if self.commit_async(outcome) {
                applied += 1;
            }
        }
        self.settle_phase();
        applied
    }

    /// Wait until no async check is pending.
    pub async fn settle(&mut self) {
        while !self.closed && !self.state.pending_async.is_empty() {
            match self.validators.next().await {
                Some(outcome) => {
                    self.commit_async(outcome);
                }
                None => break,
            }
        }
        self.settle_phase();
    }

    /// Validate everything and report whether a submit may proceed now.
    pub fn request_submit(&mut self) -> SubmitReadiness {
        if self.closed {
            return SubmitReadiness::Closed;
        }
        self.state.banner = None;
        self.poll();
        let names: Vec<String> = self
            .schema
            .fields()
            .map(|field| field.name.clone())
            .collect();
        for name in &names {
            self.validate_field(name, Duration::ZERO);
        }

        if !self.state.pending_async.is_empty() {
            self.state.phase = FormPhase::Validating;
            self.status.validating(self.state.pending_async.len());
            return SubmitReadiness::Pending {
                fields: self.state.pending_async.iter().cloned().collect(),
            };
        }
        self.state.phase = FormPhase::Editing;
        if self.state.errors.is_empty() {
            SubmitReadiness::Ready
        } else {
            let issues = self.state.error_count();
            self.status.issues_remaining(issues);
            SubmitReadiness::Invalid { issues }
        }
    }

    /// Validate, wait for pending checks, then run `mutation` with coerced values.
    pub async fn submit<F, Fut>(&mut self, mutation: F) -> SubmitOutcome
    where
        F: FnOnce(Map<String, Value>) -> Fut,
        Fut: Future<Output = anyhow::Result<Value>>,
    {
        match self.request_submit() {
            SubmitReadiness::Ready => {}
            SubmitReadiness::Closed => return SubmitOutcome::Closed,
            SubmitReadiness::Invalid { issues } => return SubmitOutcome::Invalid { issues },
            SubmitReadiness::Pending { .. } => {
                self.settle().await;
                if self.closed {
                    return SubmitOutcome::Closed;
                }
                if !self.state.can_submit() {
                    let issues = self.state.error_count();
                    self.status.issues_remaining(issues);
                    return SubmitOutcome::Invalid { issues };
                }
            }
        }

        let payload = match coerce_values(&self.schema, &self.state.values) {
            Ok(payload) => payload,
            Err(err) => {
                self.state.set_error(&err.field, Some(err.message));
                self.state.phase = FormPhase::Editing;
                let issues = self.state.error_count();
                self.status.issues_remaining(issues);
                return SubmitOutcome::Invalid { issues };
            }
        };

        info!(fields = payload.len(), "submitting form");
        let result = {
            let in_flight = InFlightSubmit::begin(&mut self.state, &mut self.status);
            let result = AssertUnwindSafe(mutation(payload))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| Err(anyhow!("{}", panic_message(panic.as_ref()))));
            in_flight.finish();
            result
        };

        match result {
            Ok(entity) => {
                self.state.phase = FormPhase::Success;
                if let Some(binding) = &self.cache
                    && binding.apply(&entity) == ApplyOutcome::NotCached
                {
                    debug!(key = %binding.key, "submitted entity has no cached page to patch");
                }
                if let Some(hook) = self.on_submit.as_mut() {
                    hook(&entity);
                }
                self.state.mark_clean();
                self.status.saved();
                if self.options.reset_on_success {
                    self.reset();
                    self.status.saved();
                }
                SubmitOutcome::Submitted(entity)
            }
            Err(err) => {
                let message = format!("{err:#}");
                error!(error = %message, "form submission failed");
                self.state.banner = Some(message.clone());
                self.state.phase = FormPhase::SubmitError;
                self.status.submit_failed();
                SubmitOutcome::Failed { message }
            }
        }
    }

    /// Back to schema defaults, dropping errors and async work.
    pub fn reset(&mut self) {
        self.validators.reset();
        self.state = FormState::from_schema(&self.schema, None);
        self.focused = None;
        self.status.ready();
    }

    /// Stop all async work; later events are ignored.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.validators.close();
        self.state.pending_async.clear();
        debug!("form closed");
    }

    fn check_sync(&self, field: &str) -> Option<String> {
        let definition = self.schema.field(field)?;
        check_field(
            definition,
            self.schema.pattern(field),
            self.state.value(field),
        )
    }

    /// Sync rules first; async only for values that pass them and are not yet checked.
    fn validate_field(&mut self, field: &str, delay: Duration) {
        let sync_error = self.check_sync(field);
        if sync_error.is_some() {
            if self.validators.has_validator(field) {
                self.validators.invalidate(field);
                self.state.pending_async.shift_remove(field);
            }
            self.state.set_error(field, sync_error);
            return;
        }
        if !self.validators.has_validator(field) {
            self.state.set_error(field, None);
            return;
        }
        if let Some(message) = self.validators.cached(field, self.state.value(field)) {
            self.state.set_error(field, message);
            return;
        }
        self.state.set_error(field, None);
        if !self.state.is_pending(field) {
            self.issue_async(field, delay);
        }
    }

    fn issue_async(&mut self, field: &str, delay: Duration) {
        let value = self.state.value(field).to_string();
        let values = self.state.values.clone();
        if self.validators.issue(field, value, values, delay).is_some() {
            self.state.pending_async.insert(field.to_string());
        }
    }

    fn commit_async(&mut self, outcome: AsyncOutcome) -> bool {
        let Some(resolution) = self.validators.accept(outcome) else {
            return false;
        };
        self.state.pending_async.shift_remove(&resolution.field);
        self.state.set_error(&resolution.field, resolution.message);
        true
    }

    fn settle_phase(&mut self) {
        if matches!(self.state.phase, FormPhase::Editing | FormPhase::Validating) {
            self.state.phase = if self.state.pending_async.is_empty() {
                FormPhase::Editing
            } else {
                FormPhase::Validating
            };
        }
    }
}

/// Marks the form as submitting until the mutation settles.
///
/// Dropped unfinished (the submit future was cancelled) it returns the form
/// to `Editing` so it can be edited and submitted again.
struct InFlightSubmit<'a> {
    state: &'a mut FormState,
    status: &'a mut StatusLine,
    finished: bool,
}

impl<'a> InFlightSubmit<'a> {
    fn begin(state: &'a mut FormState, status: &'a mut StatusLine) -> Self {
        state.phase = FormPhase::Submitting;
        state.submitting = true;
        status.submitting();
        Self {
            state,
            status,
            finished: false,
        }
    }

    fn finish(mut self) {
        self.finished = true;
        self.state.submitting = false;
    }
}

impl Drop for InFlightSubmit<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        warn!("form submission cancelled before the mutation settled");
        self.state.submitting = false;
        self.state.phase = FormPhase::Editing;
        self.status.submit_cancelled();
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    let detail = panic
        .downcast_ref::<&str>()
        .map(|message| message.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    format!("submission panicked: {detail}")
}

impl std::fmt::Debug for FormEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormEngine")
            .field("plan", &self.plan)
            .field("state", &self.state)
            .field("focused", &self.focused)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl Drop for FormEngine {
    fn drop(&mut self) {
        self.close();
    }
}
