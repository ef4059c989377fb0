//! The converter event loop.
//!
//! A single task owns all converter state and handles one [`Event`] at a
//! time: user edits, debounce expiries, lookup completions and the
//! currency-list load. Lookups run as separate tasks that report back
//! through the same channel, so no state is shared and nothing is locked.
//! After every event the rendered [`ConverterView`] is republished.

use crate::core::currency::{ConversionRequest, ConversionResult, Currency, CurrencyRateProvider};
use crate::core::debounce::{DebounceScheduler, Ticket};
use crate::core::display::{Projection, project};
use crate::core::orchestrator::{ConversionOrchestrator, DebouncedAmount, Trigger};
use crate::core::state::{ConversionStateStore, ConverterState, Effect, Outcome, Side};
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone)]
pub struct ConverterSettings {
    pub debounce: Duration,
    pub first_currency: String,
    pub second_currency: String,
    pub first_amount: String,
}

impl Default for ConverterSettings {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(300),
            first_currency: "USD".to_string(),
            second_currency: "EUR".to_string(),
            first_amount: String::new(),
        }
    }
}

#[derive(Debug)]
pub enum Event {
    AmountChanged {
        source: Side,
        text: String,
    },
    CurrencyChanged {
        source: Side,
        code: String,
    },
    AmountSettled {
        ticket: Ticket<Side>,
        text: String,
    },
    ConversionFinished {
        request: ConversionRequest,
        outcome: Result<f64, String>,
    },
    CurrenciesLoaded(Result<Vec<Currency>, String>),
    Shutdown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldView {
    pub amount: String,
    pub currency: String,
}

/// Everything a renderer needs to draw the converter.
#[derive(Debug, Clone, PartialEq)]
pub struct ConverterView {
    pub first: FieldView,
    pub second: FieldView,
    pub active: Side,
    pub rate_label: Option<String>,
    /// Currency list is being fetched.
    pub loading: bool,
    pub inputs_enabled: bool,
    pub currencies: Vec<Currency>,
    /// A debounce or a lookup is outstanding.
    pub pending: bool,
    pub last_updated: Option<DateTime<Local>>,
    /// The last lookup failure, else the currency-list failure.
    pub error: Option<String>,
    /// Number of user edits handled so far.
    pub revision: u64,
}

impl ConverterView {
    pub fn field(&self, side: Side) -> &FieldView {
        match side {
            Side::First => &self.first,
            Side::Second => &self.second,
        }
    }
}

pub struct Converter {
    store: ConversionStateStore,
    debounce: DebounceScheduler<Side, Event>,
    orchestrator: ConversionOrchestrator,
    provider: Arc<dyn CurrencyRateProvider>,
    events: mpsc::UnboundedSender<Event>,
    view: watch::Sender<ConverterView>,
    currencies: Vec<Currency>,
    loading: bool,
    last_updated: Option<DateTime<Local>>,
    lookup_error: Option<String>,
    currencies_error: Option<String>,
    revision: u64,
}

impl Converter {
    /// Starts a converter task and returns the handle driving it.
    pub fn spawn(
        settings: ConverterSettings,
        provider: Arc<dyn CurrencyRateProvider>,
    ) -> ConverterHandle {
        let (events, inbox) = mpsc::unbounded_channel();
        let converter = Converter::new(settings, provider, events.clone());
        let view = converter.view.subscribe();
        let task = tokio::spawn(converter.run(inbox));
        ConverterHandle {
            events,
            view,
            sent: 0,
            task: Some(task),
        }
    }

    fn new(
        settings: ConverterSettings,
        provider: Arc<dyn CurrencyRateProvider>,
        events: mpsc::UnboundedSender<Event>,
    ) -> Self {
        let state = ConverterState::new(
            &settings.first_currency,
            &settings.second_currency,
            &settings.first_amount,
        );
        let orchestrator = ConversionOrchestrator::new(DebouncedAmount {
            source: Side::First,
            text: settings.first_amount.clone(),
        });
        let mut converter = Self {
            store: ConversionStateStore::new(state),
            debounce: DebounceScheduler::new(settings.debounce, events.clone()),
            orchestrator,
            provider,
            events,
            view: watch::Sender::new(placeholder_view()),
            currencies: Vec::new(),
            loading: true,
            last_updated: None,
            lookup_error: None,
            currencies_error: None,
            revision: 0,
        };
        converter.view.send_replace(converter.render());
        converter
    }

    async fn run(mut self, mut inbox: mpsc::UnboundedReceiver<Event>) {
        info!(
            first = %self.store.state().first_currency,
            second = %self.store.state().second_currency,
            "Converter started"
        );
        self.load_currencies();
        self.reevaluate();
        self.publish();

        while let Some(event) = inbox.recv().await {
            if self.handle(event).is_break() {
                break;
            }
            self.publish();
        }

        self.debounce.shutdown();
        info!("Converter stopped");
    }

    fn handle(&mut self, event: Event) -> ControlFlow<()> {
        match event {
            Event::AmountChanged { source, text } => {
                self.revision += 1;
                let (outcome, effects) = self.store.set_amount(source, &text);
                self.apply(outcome, effects);
            }
            Event::CurrencyChanged { source, code } => {
                self.revision += 1;
                let inactive = self.store.state().inactive();
                let committed = self.projection().amount(inactive).to_string();
                let (outcome, effects) = self.store.set_currency(source, &code, &committed);
                self.apply(outcome, effects);
            }
            Event::AmountSettled { ticket, text } => {
                if self.debounce.settle(&ticket, self.store.state().active) {
                    self.orchestrator.settle(DebouncedAmount {
                        source: ticket.key,
                        text,
                    });
                    self.reevaluate();
                }
            }
            Event::ConversionFinished { request, outcome } => match outcome {
                Ok(value) => {
                    let result = ConversionResult { request, value };
                    if self.orchestrator.accept(self.store.state(), result) {
                        self.last_updated = Some(Local::now());
                        self.lookup_error = None;
                    }
                }
                Err(e) => {
                    if self.orchestrator.reject(&request) {
                        error!(?request, error = %e, "Conversion lookup failed");
                        self.lookup_error = Some(e);
                    } else {
                        debug!(?request, error = %e, "Superseded lookup failed");
                    }
                }
            },
            Event::CurrenciesLoaded(result) => {
                self.loading = false;
                match result {
                    Ok(currencies) => {
                        debug!(count = currencies.len(), "Currency list loaded");
                        self.store
                            .set_known_codes(currencies.iter().map(|c| c.short_code.clone()));
                        self.currencies = currencies;
                    }
                    Err(e) => {
                        error!(error = %e, "Failed to load currency list");
                        self.currencies_error = Some(e);
                    }
                }
            }
            Event::Shutdown => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    fn apply(&mut self, outcome: Outcome, effects: Vec<Effect>) {
        if let Outcome::Rejected(reason) = outcome {
            warn!(%reason, "Edit rejected");
            return;
        }
        for effect in effects {
            match effect {
                Effect::Debounce { source, text } => {
                    self.debounce
                        .schedule(source, move |ticket| Event::AmountSettled { ticket, text });
                }
                Effect::Rebase { source, text } => {
                    self.debounce.cancel();
                    self.orchestrator.settle(DebouncedAmount { source, text });
                    self.reevaluate();
                }
                Effect::Reevaluate => self.reevaluate(),
            }
        }
    }

    fn reevaluate(&mut self) {
        match self.orchestrator.evaluate(self.store.state()) {
            Trigger::Idle | Trigger::Cleared => {}
            Trigger::Synthesized(result) => {
                let _ = self.events.send(Event::ConversionFinished {
                    request: result.request,
                    outcome: Ok(result.value),
                });
            }
            Trigger::Request(request) => self.request_conversion(request),
        }
    }

    fn request_conversion(&self, request: ConversionRequest) {
        debug!(?request, "Requesting conversion");
        let provider = Arc::clone(&self.provider);
        let events = self.events.clone();
        tokio::spawn(async move {
            let outcome = provider
                .convert(&request.from, &request.to, request.amount)
                .await
                .map(|quote| quote.value)
                .map_err(|e| e.to_string());
            // A closed inbox means the converter is gone; nothing to update
            let _ = events.send(Event::ConversionFinished { request, outcome });
        });
    }

    fn load_currencies(&self) {
        let provider = Arc::clone(&self.provider);
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = provider.fetch_currencies().await.map_err(|e| e.to_string());
            let _ = events.send(Event::CurrenciesLoaded(result));
        });
    }

    fn projection(&self) -> Projection {
        project(self.store.state(), self.orchestrator.derived())
    }

    fn render(&self) -> ConverterView {
        let state = self.store.state();
        let projection = self.projection();
        ConverterView {
            first: FieldView {
                amount: projection.first_amount,
                currency: state.first_currency.clone(),
            },
            second: FieldView {
                amount: projection.second_amount,
                currency: state.second_currency.clone(),
            },
            active: state.active,
            rate_label: projection.rate_label,
            loading: self.loading,
            inputs_enabled: !self.currencies.is_empty(),
            currencies: self.currencies.clone(),
            pending: self.debounce.is_pending() || self.orchestrator.is_awaiting(),
            last_updated: self.last_updated,
            error: self
                .lookup_error
                .clone()
                .or_else(|| self.currencies_error.clone()),
            revision: self.revision,
        }
    }

    fn publish(&self) {
        self.view.send_if_modified(|current| {
            let next = self.render();
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }
}

fn placeholder_view() -> ConverterView {
    let empty = FieldView {
        amount: String::new(),
        currency: String::new(),
    };
    ConverterView {
        first: empty.clone(),
        second: empty,
        active: Side::First,
        rate_label: None,
        loading: true,
        inputs_enabled: false,
        currencies: Vec::new(),
        pending: false,
        last_updated: None,
        error: None,
        revision: 0,
    }
}

/// The input surface of a running converter.
///
/// Dropping the handle stops the converter.
pub struct ConverterHandle {
    events: mpsc::UnboundedSender<Event>,
    view: watch::Receiver<ConverterView>,
    sent: u64,
    task: Option<JoinHandle<()>>,
}

impl ConverterHandle {
    pub fn on_amount_change(&mut self, source: Side, text: &str) {
        self.send(Event::AmountChanged {
            source,
            text: text.to_string(),
        });
    }

    pub fn on_currency_change(&mut self, source: Side, code: &str) {
        self.send(Event::CurrencyChanged {
            source,
            code: code.to_string(),
        });
    }

    fn send(&mut self, event: Event) {
        if self.events.send(event).is_ok() {
            self.sent += 1;
        } else {
            warn!("Converter is no longer running, edit dropped");
        }
    }

    pub fn view(&self) -> ConverterView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConverterView> {
        self.view.clone()
    }

    /// Waits until every edit sent so far has been handled and nothing is
    /// outstanding any more.
    pub async fn settled(&mut self, timeout: Duration) -> Result<ConverterView> {
        let sent = self.sent;
        let view = tokio::time::timeout(
            timeout,
            self.view
                .wait_for(|view| view.revision >= sent && !view.loading && !view.pending),
        )
        .await
        .context("Timed out waiting for the conversion")?
        .context("Converter stopped unexpectedly")?;
        Ok(view.clone())
    }

    /// Waits until the currency list has been loaded or failed.
    pub async fn loaded(&mut self, timeout: Duration) -> Result<ConverterView> {
        let view = tokio::time::timeout(timeout, self.view.wait_for(|view| !view.loading))
            .await
            .context("Timed out waiting for the currency list")?
            .context("Converter stopped unexpectedly")?;
        Ok(view.clone())
    }

    pub async fn shutdown(mut self) {
        let _ = self.events.send(Event::Shutdown);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!(error = %e, "Converter task failed");
            }
        }
    }
}

impl Drop for ConverterHandle {
    fn drop(&mut self) {
        let _ = self.events.send(Event::Shutdown);
    }
}
