pub mod auth_forms;
pub mod dashboard;
pub mod ingredients;
pub mod orders;
pub mod recipes;
pub mod reports;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{
    api_client::AdminApi,
    constants::SESSION_EXPIRED_MSG,
    errors::{ApiError, ValidationError},
    notifications::Notifier,
    session::Session,
};

/// What every page controller is built from.
#[derive(Clone)]
pub struct PageContext {
    pub api: Arc<dyn AdminApi>,
    pub session: Arc<Session>,
    pub notifier: Arc<dyn Notifier>,
}

impl PageContext {
    pub fn new(api: Arc<dyn AdminApi>, session: Arc<Session>, notifier: Arc<dyn Notifier>) -> Self {
        PageContext {
            api,
            session,
            notifier,
        }
    }

    /// A 401 ends the session; anything else gets the page's own message.
    pub fn report_failure(&self, err: &ApiError, message: &str) {
        log::error!("{}: {}", message, err);
        if err.is_unauthorized() {
            self.session.handle_unauthorized();
            self.notifier.error(SESSION_EXPIRED_MSG);
        } else {
            self.notifier.error(message);
        }
    }

    pub fn report_invalid(&self, errors: &[ValidationError]) {
        for e in errors {
            log::debug!("Validation failed on {}: {}", e.field, e.message);
            self.notifier.error(&e.message);
        }
    }

    /// Notifies the outcome of a write; true means the caller should re-fetch.
    pub fn settle(&self, result: Result<(), ApiError>, ok_message: &str, err_message: &str) -> bool {
        match result {
            Ok(()) => {
                self.notifier.success(ok_message);
                true
            }
            Err(e) => {
                self.report_failure(&e, err_message);
                false
            }
        }
    }
}

struct ViewInner<T> {
    data: T,
    loading: bool,
    mounted: bool,
    generation: u64,
}

/// Server snapshot held by a page. Every fetch takes a ticket; a result whose
/// ticket is no longer current (newer fetch started, or page unmounted) is dropped.
pub struct ViewCell<T> {
    inner: Mutex<ViewInner<T>>,
}

impl<T: Clone + Default> Default for ViewCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Default> ViewCell<T> {
    pub fn new() -> Self {
        ViewCell {
            inner: Mutex::new(ViewInner {
                data: T::default(),
                loading: true,
                mounted: false,
                generation: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ViewInner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn mount(&self) {
        self.lock().mounted = true;
    }

    pub fn unmount(&self) {
        let mut inner = self.lock();
        inner.mounted = false;
        inner.generation += 1;
    }

    pub fn is_mounted(&self) -> bool {
        self.lock().mounted
    }

    /// Starts a fetch; `None` when the page is not mounted.
    pub fn begin(&self) -> Option<u64> {
        let mut inner = self.lock();
        if !inner.mounted {
            return None;
        }
        inner.generation += 1;
        inner.loading = true;
        Some(inner.generation)
    }

    /// Applies a fetch result. `None` keeps the previous data. Returns false
    /// when the result was stale and discarded.
    pub fn finish(&self, ticket: u64, data: Option<T>) -> bool {
        let mut inner = self.lock();
        if !inner.mounted || inner.generation != ticket {
            log::debug!("Discarding stale response (ticket {}, current {})", ticket, inner.generation);
            return false;
        }
        if let Some(data) = data {
            inner.data = data;
        }
        inner.loading = false;
        true
    }

    pub fn snapshot(&self) -> T {
        self.lock().data.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.lock().loading
    }
}

/// Add/edit modal: `editing` is the id of the entity being edited, `None` when adding.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormModal<F> {
    pub open: bool,
    pub editing: Option<i64>,
    pub form: F,
}

impl<F: Default> FormModal<F> {
    pub fn open_add(&mut self) {
        self.form = F::default();
        self.editing = None;
        self.open = true;
    }

    pub fn open_edit(&mut self, id: i64, form: F) {
        self.form = form;
        self.editing = Some(id);
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }
}

pub(crate) fn lock_ui<U>(ui: &Mutex<U>) -> MutexGuard<'_, U> {
    ui.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn require(field: &'static str, value: &str, message: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ValidationError::new(field, message))
    } else {
        Ok(trimmed.to_string())
    }
}

/// Parses a non-negative quantity; accepts a decimal comma.
pub(crate) fn parse_quantity(field: &'static str, value: &str, message: &str) -> Result<f64, ValidationError> {
    match value.trim().replace(',', ".").parse::<f64>() {
        Ok(n) if n.is_finite() && n >= 0.0 => Ok(n),
        _ => Err(ValidationError::new(field, message)),
    }
}

/// Formats a quantity without a trailing `.0`.
pub fn fmt_amount(amount: f64) -> String {
    if amount.fract() == 0.0 {
        format!("{:.0}", amount)
    } else {
        format!("{}", amount)
    }
}
