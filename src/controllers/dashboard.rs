//! Landing page: headline counts, latest orders and the popular drinks chart.

use std::time::Instant;

use crate::{
    data_types::{order_data_types::Order, report_data_types::DashboardSummary},
    live_updates::{parse_push_message, PushEvent},
    widgets::{self, Table},
};

use super::{PageContext, ViewCell};

const LOAD_ERR_MSG: &str = "Error al cargar el dashboard";
const EMPTY_MSG: &str = "No hay pedidos disponibles";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardData {
    pub summary: DashboardSummary,
    pub orders: Vec<Order>,
}

/// One line of the recent orders table.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRow {
    pub id: i64,
    pub user: String,
    pub drink: String,
    pub status: String,
    pub date: String,
}

impl From<&Order> for OrderRow {
    fn from(order: &Order) -> Self {
        OrderRow {
            id: order.id,
            user: order.user.clone(),
            drink: order.first_drink().to_string(),
            status: widgets::order_status_badge(&order.status).to_string(),
            date: order.created_at_local(),
        }
    }
}

pub struct DashboardController {
    ctx: PageContext,
    view: ViewCell<DashboardData>,
}

impl DashboardController {
    pub fn new(ctx: PageContext) -> Self {
        DashboardController {
            ctx,
            view: ViewCell::new(),
        }
    }

    pub async fn mount(&self) {
        self.view.mount();
        self.refresh().await;
    }

    pub fn unmount(&self) {
        self.view.unmount();
    }

    pub async fn refresh(&self) -> bool {
        let Some(ticket) = self.view.begin() else {
            return false;
        };
        let now = Instant::now();
        let fetched = tokio::try_join!(self.ctx.api.dashboard_summary(), self.ctx.api.list_orders());
        match fetched {
            Ok((summary, orders)) => {
                log::debug!("Fetched dashboard: {:.2?}", now.elapsed());
                self.view.finish(ticket, Some(DashboardData { summary, orders }))
            }
            Err(e) => {
                if self.view.finish(ticket, None) {
                    self.ctx.report_failure(&e, LOAD_ERR_MSG);
                }
                false
            }
        }
    }

    pub async fn handle_push(&self, event: PushEvent) {
        match event {
            PushEvent::OrderUpdate => {
                log::info!("Order update pushed, reloading dashboard");
                self.refresh().await;
            }
        }
    }

    pub async fn handle_push_text(&self, text: &str) {
        if let Some(event) = parse_push_message(text) {
            self.handle_push(event).await;
        }
    }

    pub fn data(&self) -> DashboardData {
        self.view.snapshot()
    }

    pub fn is_loading(&self) -> bool {
        self.view.is_loading()
    }

    pub fn order_rows(&self) -> Vec<OrderRow> {
        self.data().orders.iter().map(OrderRow::from).collect()
    }

    pub fn render(&self) -> String {
        let data = self.data();
        if self.is_loading() && data == DashboardData::default() {
            return format!("{}\n", widgets::spinner());
        }

        let mut out = format!(
            "Pedidos del día: {}\nIngredientes con stock bajo: {}\nBebidas populares: {}\n\n",
            data.summary.total_orders,
            data.summary.low_stock_count,
            data.summary.popular_drinks.len()
        );

        out += "Pedidos recientes\n";
        out += &Table::new()
            .column("ID", |r: &OrderRow| format!("#{}", r.id))
            .column("Usuario", |r| r.user.clone())
            .column("Bebida", |r| r.drink.clone())
            .column("Estado", |r| r.status.clone())
            .column("Fecha", |r| r.date.clone())
            .empty_message(EMPTY_MSG)
            .render(&self.order_rows());

        if !data.summary.popular_drinks.is_empty() {
            let bars: Vec<(String, i64)> = data
                .summary
                .popular_drinks
                .iter()
                .map(|d| (d.name.clone(), d.count))
                .collect();
            out += "\nBebidas más populares\n";
            out += &widgets::bar_chart(&bars, 30);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        constants::SESSION_EXPIRED_MSG,
        credential_store::MemoryCredentialStore,
        notifications::RecordingNotifier,
        session::{CredentialHandle, Session},
        testing::{FakeBackend, ADMIN_EMAIL, ADMIN_PASSWORD},
    };

    struct Harness {
        backend: Arc<FakeBackend>,
        notifier: Arc<RecordingNotifier>,
        session: Arc<Session>,
        page: DashboardController,
    }

    fn harness() -> Harness {
        let backend = Arc::new(FakeBackend::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let session = Arc::new(Session::new(
            backend.clone(),
            Arc::new(MemoryCredentialStore::new()),
            CredentialHandle::default(),
        ));
        let page = DashboardController::new(PageContext::new(
            backend.clone(),
            session.clone(),
            notifier.clone(),
        ));
        Harness {
            backend,
            notifier,
            session,
            page,
        }
    }

    #[tokio::test]
    async fn login_then_dashboard_shows_counts_and_labels() {
        let h = harness();
        h.session.login(ADMIN_EMAIL, ADMIN_PASSWORD, false).await.unwrap();
        h.page.mount().await;

        let data = h.page.data();
        assert_eq!(data.summary.total_orders, 2);
        assert_eq!(data.summary.low_stock_count, 1);

        let rows = h.page.order_rows();
        assert_eq!(rows[0].drink, "Mojito");
        assert!(rows[0].status.ends_with("Pendiente"));
        assert_eq!(rows[1].drink, "-");
        assert!(rows[1].status.ends_with("En preparación"));

        let out = h.page.render();
        assert!(out.contains("Pedidos del día: 2"));
        assert!(out.contains("Ingredientes con stock bajo: 1"));
        assert!(out.contains("Mojito"));
        assert!(h.notifier.errors().is_empty());
    }

    #[tokio::test]
    async fn reads_are_all_or_nothing() {
        let h = harness();
        h.backend.fail("list_orders");
        h.page.mount().await;

        assert_eq!(h.page.data(), DashboardData::default());
        assert_eq!(h.notifier.errors(), vec![LOAD_ERR_MSG]);
        assert!(!h.page.is_loading());
    }

    #[tokio::test]
    async fn order_update_reloads_both_reads() {
        let h = harness();
        h.page.mount().await;

        h.page.handle_push_text(r#"{"type":"ORDER_UPDATE"}"#).await;
        h.page.handle_push_text(r#"{"type":"OTHER"}"#).await;

        assert_eq!(h.backend.count("dashboard_summary"), 2);
        assert_eq!(h.backend.count("list_orders"), 2);
    }

    #[tokio::test]
    async fn expired_credential_logs_out() {
        let h = harness();
        h.session.login(ADMIN_EMAIL, ADMIN_PASSWORD, true).await.unwrap();
        h.backend.reject("dashboard_summary");

        h.page.mount().await;

        assert!(!h.session.is_authenticated());
        assert_eq!(h.notifier.errors(), vec![SESSION_EXPIRED_MSG]);
    }

    #[tokio::test]
    async fn unmounted_page_does_not_fetch() {
        let h = harness();
        assert!(!h.page.refresh().await);
        assert_eq!(h.backend.count("dashboard_summary"), 0);
        assert!(h.page.render().contains("Cargando..."));
    }
}
