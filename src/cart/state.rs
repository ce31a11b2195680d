//! Application State Management
//!
//! Holds one cart and one checkout wizard per browsing session, plus the
//! services wired to the external collaborators.

use super::{models::CartView, store::CartStore};
use crate::{
    checkout::{
        errors::CheckoutError,
        models::{CheckoutView, Confirmation},
        service::{ChatRedirect, CheckoutService},
        wizard::CheckoutWizard,
    },
    orders::{admin::OrderAdmin, models::TransitionPolicy},
    ports::Ports,
    pricing::PricingPolicy,
    products::catalog::ProductCatalog,
};
use dashmap::{DashMap, DashSet};
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tracing::debug;

// =============================================================================
// Application State
// =============================================================================

/// Shared application state that can be safely passed between threads
pub type SharedState = Arc<AppState>;

/// Everything one browsing session owns
#[derive(Debug, Clone)]
pub struct Session {
    pub cart: CartStore,
    pub wizard: CheckoutWizard,

    /// Last time a request changed this session
    pub touched: Instant,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            cart: CartStore::default(),
            wizard: CheckoutWizard::default(),
            touched: Instant::now(),
        }
    }
}

impl Session {
    pub fn cart_view(&self, pricing: &PricingPolicy) -> CartView {
        CartView {
            items: self.cart.lines().to_vec(),
            item_count: self.cart.item_count(),
            coupon: self.cart.coupon().map(|c| c.code.clone()),
            quote: self.cart.quote(pricing, self.wizard.delivery_method()),
        }
    }

    pub fn checkout_view(&self, pricing: &PricingPolicy) -> CheckoutView {
        let step = self.wizard.step();

        CheckoutView {
            step: step.number(),
            step_name: step,
            selections: self.wizard.selections().clone(),
            quote: self.cart.quote(pricing, self.wizard.delivery_method()),
        }
    }

    /// Nothing worth keeping: empty cart, wizard back at the start
    pub fn is_blank(&self) -> bool {
        self.cart.is_empty()
            && self.cart.coupon().is_none()
            && self.wizard == CheckoutWizard::default()
    }
}

/// Non-port settings the state is built with
#[derive(Debug, Clone)]
pub struct StoreSettings {
    pub pricing: PricingPolicy,
    pub transition_policy: TransitionPolicy,
    pub chat_phone: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            pricing: PricingPolicy::default(),
            transition_policy: TransitionPolicy::default(),
            chat_phone: "213550000000".to_owned(),
        }
    }
}

/// Core application state
pub struct AppState {
    /// Sessions keyed by the `cart_session` cookie.
    /// DashMap allows concurrent access without external Mutexes.
    pub sessions: DashMap<String, Session>,

    /// Sessions with an order submission in progress
    submitting: DashSet<String>,

    pub checkout: CheckoutService,
    pub orders: OrderAdmin,
    pub catalog: ProductCatalog,
}

impl AppState {
    pub fn new(ports: Ports, settings: StoreSettings) -> Self {
        let checkout = CheckoutService::new(
            ports.orders.clone(),
            ports.identity.clone(),
            ports.notifier.clone(),
            settings.pricing,
            ChatRedirect::new(settings.chat_phone),
        );
        let orders = OrderAdmin::new(ports.orders, ports.notifier, settings.transition_policy);
        let catalog = ProductCatalog::new(ports.products);

        Self {
            sessions: DashMap::new(),
            submitting: DashSet::new(),
            checkout,
            orders,
            catalog,
        }
    }

    pub fn pricing(&self) -> &PricingPolicy {
        self.checkout.pricing()
    }

    /// Runs `f` against the session, creating an empty one on first use.
    ///
    /// The map entry is locked for the duration of `f`, so `f` must not block.
    pub fn with_session<R>(&self, session_id: &str, f: impl FnOnce(&mut Session) -> R) -> R {
        let mut session = self.sessions.entry(session_id.to_owned()).or_default();
        session.touched = Instant::now();
        f(&mut session)
    }

    /// Runs `f` against the session without creating it; unknown ids see an
    /// empty session.
    pub fn peek_session<R>(&self, session_id: &str, f: impl FnOnce(&Session) -> R) -> R {
        match self.sessions.get(session_id) {
            Some(session) => f(&session),
            None => f(&Session::default()),
        }
    }

    /// Places the order for a session's cart.
    ///
    /// The session is not locked while the store call is in flight; a second
    /// submission for the same session during that time is refused. On
    /// success only the ordered lines leave the cart.
    pub async fn place_order(
        &self,
        session_id: &str,
        token: Option<&str>,
    ) -> Result<Confirmation, CheckoutError> {
        let _guard = SubmissionGuard::acquire(&self.submitting, session_id)?;

        let submission =
            self.peek_session(session_id, |s| self.checkout.prepare(&s.cart, &s.wizard))?;
        let ordered = submission.lines.clone();
        let confirmation = self.checkout.place_order(submission, token).await?;

        self.with_session(session_id, |s| {
            CheckoutService::complete(&mut s.cart, &mut s.wizard, &ordered)
        });
        let removed = self
            .sessions
            .remove_if(session_id, |_, s| s.is_blank())
            .is_some();
        debug!(session_id, session_removed = removed, "ordered lines taken out of the cart");

        Ok(confirmation)
    }

    /// Drops sessions idle for longer than `max_idle`, except those with an
    /// order submission in flight. Returns how many were dropped.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|id, s| s.touched.elapsed() < max_idle || self.submitting.contains(id));
        before.saturating_sub(self.sessions.len())
    }
}

/// Evicts idle sessions every `period` until the task is aborted.
pub fn spawn_session_sweeper(
    state: SharedState,
    period: Duration,
    max_idle: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let evicted = state.evict_idle(max_idle);
            if evicted > 0 {
                debug!(evicted, remaining = state.sessions.len(), "idle sessions evicted");
            }
        }
    })
}

/// Marks a session as submitting until dropped
struct SubmissionGuard<'a> {
    set: &'a DashSet<String>,
    session_id: String,
}

impl<'a> SubmissionGuard<'a> {
    fn acquire(set: &'a DashSet<String>, session_id: &str) -> Result<Self, CheckoutError> {
        if !set.insert(session_id.to_owned()) {
            return Err(CheckoutError::AlreadySubmitting);
        }

        Ok(Self {
            set,
            session_id: session_id.to_owned(),
        })
    }
}

impl Drop for SubmissionGuard<'_> {
    fn drop(&mut self) {
        self.set.remove(&self.session_id);
    }
}
