use std::{collections::HashMap, fmt, future::Future, pin::Pin, sync::Arc, time::Duration};

use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, warn};

use super::state::FormValues;

pub type ValidationFuture = Pin<Box<dyn Future<Output = anyhow::Result<Option<String>>> + Send>>;

type CheckFn = dyn Fn(String, FormValues) -> ValidationFuture + Send + Sync;

/// When an async validator is issued.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AsyncTrigger {
    #[default]
    Blur,
    Change,
}

/// Server round-trip check for one field.
///
/// The check receives the field's text and a snapshot of every value. `Ok(None)`
/// accepts the value, `Ok(Some(message))` rejects it, `Err` means the check
/// itself could not run.
#[derive(Clone)]
pub struct AsyncValidator {
    check: Arc<CheckFn>,
    trigger: AsyncTrigger,
    debounce: Option<Duration>,
}

impl AsyncValidator {
    pub fn new<F, Fut>(check: F) -> Self
    where
        F: Fn(String, FormValues) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Option<String>>> + Send + 'static,
    {
        Self {
            check: Arc::new(move |value, values| Box::pin(check(value, values)) as ValidationFuture),
            trigger: AsyncTrigger::default(),
            debounce: None,
        }
    }

    pub fn on_change(mut self) -> Self {
        self.trigger = AsyncTrigger::Change;
        self
    }

    /// Overrides the form-wide debounce for this validator.
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = Some(debounce);
        self
    }

    pub fn trigger(&self) -> AsyncTrigger {
        self.trigger
    }
}

impl fmt::Debug for AsyncValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncValidator")
            .field("trigger", &self.trigger)
            .field("debounce", &self.debounce)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub(crate) struct AsyncOutcome {
    pub field: String,
    pub seq: u64,
    pub value: String,
    pub result: Result<Option<String>, String>,
}

/// An async result that is still current and must be committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Resolution {
    pub field: String,
    pub message: Option<String>,
}

#[derive(Debug, Clone)]
struct CheckedValue {
    value: String,
    message: Option<String>,
}

#[derive(Debug, Default)]
struct AsyncSlot {
    latest: u64,
    task: Option<JoinHandle<()>>,
    checked: Option<CheckedValue>,
}

impl AsyncSlot {
    fn abort(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Sends a result for its request even when the check never returns one.
struct ReportGuard {
    tx: mpsc::UnboundedSender<AsyncOutcome>,
    field: String,
    seq: u64,
    value: String,
    sent: bool,
}

impl ReportGuard {
    fn report(mut self, result: Result<Option<String>, String>) {
        self.send(result);
    }

    fn send(&mut self, result: Result<Option<String>, String>) {
        self.sent = true;
        let _ = self.tx.send(AsyncOutcome {
            field: std::mem::take(&mut self.field),
            seq: self.seq,
            value: std::mem::take(&mut self.value),
            result,
        });
    }
}

impl Drop for ReportGuard {
    fn drop(&mut self) {
        if !self.sent {
            self.send(Err("validation task ended without a result".to_string()));
        }
    }
}

/// Debounced async validation with a per-field staleness guard.
///
/// Each issued request gets the next sequence number for its field. Only the
/// outcome carrying the field's latest number is committed; anything older is
/// dropped.
pub(crate) struct ValidatorOrchestrator {
    validators: HashMap<String, AsyncValidator>,
    slots: HashMap<String, AsyncSlot>,
    debounce: Duration,
    unverified_message: String,
    tx: mpsc::UnboundedSender<AsyncOutcome>,
    rx: mpsc::UnboundedReceiver<AsyncOutcome>,
    closed: bool,
}

impl ValidatorOrchestrator {
    pub fn new(debounce: Duration, unverified_message: impl Into<String>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            validators: HashMap::new(),
            slots: HashMap::new(),
            debounce,
            unverified_message: unverified_message.into(),
            tx,
            rx,
            closed: false,
        }
    }

    pub fn configure(&mut self, debounce: Duration, unverified_message: impl Into<String>) {
        self.debounce = debounce;
        self.unverified_message = unverified_message.into();
    }

    pub fn register(&mut self, field: impl Into<String>, validator: AsyncValidator) {
        let field = field.into();
        self.slots.entry(field.clone()).or_default();
        self.validators.insert(field, validator);
    }

    pub fn has_validator(&self, field: &str) -> bool {
        self.validators.contains_key(field)
    }

    pub fn trigger(&self, field: &str) -> Option<AsyncTrigger> {
        self.validators.get(field).map(AsyncValidator::trigger)
    }

    pub fn debounce_for(&self, field: &str) -> Duration {
        self.validators
            .get(field)
            .and_then(|validator| validator.debounce)
            .unwrap_or(self.debounce)
    }

    /// Cached outcome of a completed check for exactly this value.
    pub fn cached(&self, field: &str, value: &str) -> Option<Option<String>> {
        self.slots
            .get(field)
            .and_then(|slot| slot.checked.as_ref())
            .filter(|checked| checked.value == value)
            .map(|checked| checked.message.clone())
    }

    /// Start a check after `delay`, superseding any earlier request for the field.
    pub fn issue(
        &mut self,
        field: &str,
        value: String,
        values: FormValues,
        delay: Duration,
    ) -> Option<u64> {
        if self.closed {
            return None;
        }
        let check = Arc::clone(&self.validators.get(field)?.check);
        let slot = self.slots.entry(field.to_string()).or_default();
        slot.abort();
        slot.latest += 1;
        let seq = slot.latest;
        let guard = ReportGuard {
            tx: self.tx.clone(),
            field: field.to_string(),
            seq,
            value: value.clone(),
            sent: false,
        };
        slot.task = Some(tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            let result = (*check)(value, values).await.map_err(|err| format!("{err:#}"));
            guard.report(result);
        }));
        debug!(field, seq, delay_ms = delay.as_millis() as u64, "issued async validation");
        Some(seq)
    }

    /// The field's value changed: drop its cached result and outrun any request in flight.
    pub fn invalidate(&mut self, field: &str) {
        if let Some(slot) = self.slots.get_mut(field) {
            slot.abort();
            slot.latest += 1;
            slot.checked = None;
        }
    }

    pub fn try_next(&mut self) -> Option<AsyncOutcome> {
        self.rx.try_recv().ok()
    }

    pub async fn next(&mut self) -> Option<AsyncOutcome> {
        self.rx.recv().await
    }

    /// Commit an outcome if it answers the field's latest request.
    pub fn accept(&mut self, outcome: AsyncOutcome) -> Option<Resolution> {
        if self.closed {
            return None;
        }
        let slot = self.slots.get_mut(&outcome.field)?;
        if outcome.seq != slot.latest {
            debug!(
                field = %outcome.field,
                seq = outcome.seq,
                latest = slot.latest,
                "discarding stale async validation"
            );
            return None;
        }
        slot.task = None;
        let message = match outcome.result {
            Ok(message) => {
                slot.checked = Some(CheckedValue {
                    value: outcome.value,
                    message: message.clone(),
                });
                message
            }
            Err(err) => {
                warn!(field = %outcome.field, error = %err, "async validator failed");
                slot.checked = None;
                Some(self.unverified_message.clone())
            }
        };
        Some(Resolution {
            field: outcome.field,
            message,
        })
    }

    /// Abort everything and refuse further work.
    pub fn close(&mut self) {
        self.closed = true;
        for slot in self.slots.values_mut() {
            slot.abort();
        }
        self.rx.close();
    }

    /// Abort in-flight checks and forget cached results, keeping validators.
    pub fn reset(&mut self) {
        for slot in self.slots.values_mut() {
            slot.abort();
            slot.latest += 1;
            slot.checked = None;
        }
    }
}

impl Drop for ValidatorOrchestrator {
    fn drop(&mut self) {
        for slot in self.slots.values_mut() {
            slot.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orchestrator() -> ValidatorOrchestrator {
        let mut orchestrator = ValidatorOrchestrator::new(Duration::ZERO, "could not validate");
        orchestrator.register(
            "dni",
            AsyncValidator::new(|value: String, _values| async move {
                Ok::<_, anyhow::Error>((value == "4012").then(|| "taken".to_string()))
            }),
        );
        orchestrator
    }

    fn outcome(seq: u64, value: &str, result: Result<Option<String>, String>) -> AsyncOutcome {
        AsyncOutcome {
            field: "dni".into(),
            seq,
            value: value.into(),
            result,
        }
    }

    #[tokio::test]
    async fn older_sequence_numbers_are_discarded() {
        let mut orchestrator = orchestrator();
        let first = orchestrator
            .issue("dni", "1".into(), FormValues::new(), Duration::ZERO)
            .expect("issued");
        let second = orchestrator
            .issue("dni", "12".into(), FormValues::new(), Duration::ZERO)
            .expect("issued");
        assert!(second > first);

        let stale = outcome(first, "1", Ok(Some("taken".into())));
        assert_eq!(orchestrator.accept(stale), None);

        let current = outcome(second, "12", Ok(None));
        assert_eq!(
            orchestrator.accept(current),
            Some(Resolution {
                field: "dni".into(),
                message: None
            })
        );
        assert_eq!(orchestrator.cached("dni", "12"), Some(None));
    }

    #[tokio::test]
    async fn transport_failure_commits_unverified_message() {
        let mut orchestrator = orchestrator();
        let seq = orchestrator
            .issue("dni", "4012".into(), FormValues::new(), Duration::ZERO)
            .expect("issued");
        let resolution = orchestrator
            .accept(outcome(seq, "4012", Err("connection refused".into())))
            .expect("current");
        assert_eq!(resolution.message.as_deref(), Some("could not validate"));
        assert_eq!(orchestrator.cached("dni", "4012"), None);
    }

    #[tokio::test]
    async fn invalidate_outruns_in_flight_request() {
        let mut orchestrator = orchestrator();
        let seq = orchestrator
            .issue("dni", "4012".into(), FormValues::new(), Duration::ZERO)
            .expect("issued");
        orchestrator.invalidate("dni");
        assert_eq!(
            orchestrator.accept(outcome(seq, "4012", Ok(Some("taken".into())))),
            None
        );
    }

    #[tokio::test]
    async fn closed_orchestrator_issues_nothing() {
        let mut orchestrator = orchestrator();
        orchestrator.close();
        assert_eq!(
            orchestrator.issue("dni", "1".into(), FormValues::new(), Duration::ZERO),
            None
        );
    }

    #[tokio::test]
    async fn issued_check_reports_through_channel() {
        let mut orchestrator = orchestrator();
        let seq = orchestrator
            .issue("dni", "4012".into(), FormValues::new(), Duration::ZERO)
            .expect("issued");
        let outcome = orchestrator.next().await.expect("outcome");
        assert_eq!(outcome.seq, seq);
        let resolution = orchestrator.accept(outcome).expect("current");
        assert_eq!(resolution.message.as_deref(), Some("taken"));
    }
}
