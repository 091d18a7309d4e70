//! Orders page: live list, details modal and status modal.

use std::{sync::Mutex, time::Instant};

use crate::{
    data_types::order_data_types::{Order, OrderStatus, StatusPayload},
    live_updates::{parse_push_message, PushEvent},
    widgets::{self, SelectOption, Table},
};

use super::{fmt_amount, lock_ui, PageContext, ViewCell};

const LOAD_ERR_MSG: &str = "Error al cargar los pedidos";
const STATUS_OK_MSG: &str = "Estado del pedido actualizado correctamente";
const STATUS_ERR_MSG: &str = "Error al actualizar el estado del pedido";
const EMPTY_MSG: &str = "No hay pedidos disponibles";

#[derive(Debug, Clone, PartialEq)]
pub struct StatusModal {
    pub order_id: i64,
    pub status: OrderStatus,
}

#[derive(Default)]
struct OrdersUi {
    details: Option<i64>,
    status: Option<StatusModal>,
}

pub struct OrdersController {
    ctx: PageContext,
    view: ViewCell<Vec<Order>>,
    ui: Mutex<OrdersUi>,
}

impl OrdersController {
    pub fn new(ctx: PageContext) -> Self {
        OrdersController {
            ctx,
            view: ViewCell::new(),
            ui: Mutex::new(OrdersUi::default()),
        }
    }

    pub async fn mount(&self) {
        self.view.mount();
        self.refresh().await;
    }

    pub fn unmount(&self) {
        self.view.unmount();
    }

    /// Also bound to the manual refresh action.
    pub async fn refresh(&self) -> bool {
        let Some(ticket) = self.view.begin() else {
            return false;
        };
        let now = Instant::now();
        match self.ctx.api.list_orders().await {
            Ok(orders) => {
                log::debug!("Fetched {} orders: {:.2?}", orders.len(), now.elapsed());
                self.view.finish(ticket, Some(orders))
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
                log::info!("Order update pushed, reloading orders");
                self.refresh().await;
            }
        }
    }

    /// Raw text frame from the push channel; anything but an order update is ignored.
    pub async fn handle_push_text(&self, text: &str) {
        match parse_push_message(text) {
            Some(event) => self.handle_push(event).await,
            None => log::debug!("Ignoring push message: {}", text),
        }
    }

    pub fn orders(&self) -> Vec<Order> {
        self.view.snapshot()
    }

    pub fn is_loading(&self) -> bool {
        self.view.is_loading()
    }

    fn find(&self, id: i64) -> Option<Order> {
        self.orders().into_iter().find(|o| o.id == id)
    }

    pub fn open_details(&self, id: i64) -> bool {
        if self.find(id).is_none() {
            return false;
        }
        lock_ui(&self.ui).details = Some(id);
        true
    }

    pub fn close_details(&self) {
        lock_ui(&self.ui).details = None;
    }

    /// The order shown in the details modal, from the latest snapshot.
    pub fn details(&self) -> Option<Order> {
        let id = lock_ui(&self.ui).details?;
        self.find(id)
    }

    pub fn open_status(&self, id: i64) -> bool {
        let Some(order) = self.find(id) else {
            return false;
        };
        lock_ui(&self.ui).status = Some(StatusModal {
            order_id: order.id,
            status: order.status,
        });
        true
    }

    pub fn status_modal(&self) -> Option<StatusModal> {
        lock_ui(&self.ui).status.clone()
    }

    pub fn select_status(&self, status: OrderStatus) {
        if let Some(modal) = lock_ui(&self.ui).status.as_mut() {
            modal.status = status;
        }
    }

    pub fn close_status(&self) {
        lock_ui(&self.ui).status = None;
    }

    pub async fn submit_status(&self) -> bool {
        let Some(modal) = self.status_modal() else {
            return false;
        };
        let payload = StatusPayload {
            status: modal.status,
        };
        let result = self.ctx.api.update_order_status(modal.order_id, &payload).await;
        if !self.ctx.settle(result, STATUS_OK_MSG, STATUS_ERR_MSG) {
            return false;
        }
        self.close_status();
        self.refresh().await;
        true
    }

    pub fn status_options() -> Vec<SelectOption> {
        OrderStatus::SELECTABLE
            .iter()
            .map(|s| SelectOption::new(s.as_str(), s.label()))
            .collect()
    }

    pub fn render_status_modal(&self) -> Option<String> {
        let modal = self.status_modal()?;
        Some(widgets::render_select(
            &format!("Estado del pedido #{}", modal.order_id),
            &Self::status_options(),
            modal.status.as_str(),
        ))
    }

    pub fn render(&self) -> String {
        Table::new()
            .column("ID", |o: &Order| format!("#{}", o.id))
            .column("Usuario", |o| o.user.clone())
            .column("Bebidas", |o| o.drink_names())
            .column("Estado", |o| widgets::order_status_badge(&o.status).to_string())
            .column("Fecha", |o| o.created_at_local())
            .empty_message(EMPTY_MSG)
            .loading(self.is_loading())
            .render(&self.orders())
    }

    pub fn render_details(order: &Order) -> String {
        let mut out = format!(
            "Pedido #{}\nUsuario: {}\nEstado: {}\nFecha: {}\n",
            order.id,
            order.user,
            widgets::order_status_badge(&order.status),
            order.created_at_local()
        );
        for item in &order.items {
            out += &format!("- {}\n", item.drink);
            for ingredient in &item.ingredients {
                out += &format!(
                    "    {} {} {}\n",
                    ingredient.name,
                    fmt_amount(ingredient.amount),
                    ingredient.unit
                );
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rstest::rstest;

    use super::*;
    use crate::{
        credential_store::MemoryCredentialStore,
        notifications::RecordingNotifier,
        session::{CredentialHandle, Session},
        testing::FakeBackend,
    };

    async fn mounted(backend: &Arc<FakeBackend>, notifier: &Arc<RecordingNotifier>) -> OrdersController {
        let session = Arc::new(Session::new(
            backend.clone(),
            Arc::new(MemoryCredentialStore::new()),
            CredentialHandle::default(),
        ));
        let page = OrdersController::new(PageContext::new(backend.clone(), session, notifier.clone()));
        page.mount().await;
        page
    }

    #[rstest]
    #[case(r#"{"type":"ORDER_UPDATE"}"#, 2)]
    #[case(r#"{"type":"ORDER_UPDATE","orderId":5}"#, 2)]
    #[case(r#"{"type":"PING"}"#, 1)]
    #[case("not json", 1)]
    #[case(r#"{"kind":"ORDER_UPDATE"}"#, 1)]
    #[tokio::test]
    async fn push_messages_refetch_only_on_order_update(#[case] text: &str, #[case] fetches: usize) {
        let backend = Arc::new(FakeBackend::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let page = mounted(&backend, &notifier).await;

        page.handle_push_text(text).await;

        assert_eq!(backend.count("list_orders"), fetches);
    }

    #[tokio::test]
    async fn push_after_unmount_is_ignored() {
        let backend = Arc::new(FakeBackend::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let page = mounted(&backend, &notifier).await;
        page.unmount();

        page.handle_push(PushEvent::OrderUpdate).await;

        assert_eq!(backend.count("list_orders"), 1);
    }

    #[tokio::test]
    async fn status_modal_preselects_current_status() {
        let backend = Arc::new(FakeBackend::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let page = mounted(&backend, &notifier).await;

        assert!(page.open_status(101));
        assert_eq!(page.status_modal().unwrap().status, OrderStatus::Preparing);
        let select = page.render_status_modal().unwrap();
        assert!(select.contains("* preparing"));
        assert!(select.contains("  pending"));
    }

    #[tokio::test]
    async fn status_change_refetches_once() {
        let backend = Arc::new(FakeBackend::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let page = mounted(&backend, &notifier).await;
        page.open_status(100);
        page.select_status(OrderStatus::Completed);

        assert!(page.submit_status().await);

        assert_eq!(
            *backend.last_status_payload.lock().unwrap(),
            Some((
                100,
                StatusPayload {
                    status: OrderStatus::Completed
                }
            ))
        );
        assert_eq!(backend.count("list_orders"), 2);
        assert_eq!(notifier.successes(), vec![STATUS_OK_MSG]);
        assert_eq!(page.status_modal(), None);
    }

    #[tokio::test]
    async fn failed_status_change_keeps_modal() {
        let backend = Arc::new(FakeBackend::new());
        backend.fail("update_order_status");
        let notifier = Arc::new(RecordingNotifier::new());
        let page = mounted(&backend, &notifier).await;
        page.open_status(100);

        assert!(!page.submit_status().await);

        assert_eq!(backend.count("list_orders"), 1);
        assert_eq!(notifier.errors(), vec![STATUS_ERR_MSG]);
        assert!(page.status_modal().is_some());
    }

    #[tokio::test]
    async fn details_list_items_and_ingredients() {
        let backend = Arc::new(FakeBackend::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let page = mounted(&backend, &notifier).await;

        assert!(page.open_details(100));
        let text = OrdersController::render_details(&page.details().unwrap());
        assert!(text.contains("Pedido #100"));
        assert!(text.contains("- Mojito"));
        assert!(text.contains("Ron 50 ml"));

        page.close_details();
        assert_eq!(page.details(), None);
    }

    #[tokio::test]
    async fn empty_table_message() {
        let backend = Arc::new(FakeBackend::new());
        backend.fail("list_orders");
        let notifier = Arc::new(RecordingNotifier::new());
        let page = mounted(&backend, &notifier).await;

        assert!(page.render().contains("No hay pedidos disponibles"));
    }

    #[tokio::test]
    async fn table_uses_spanish_labels() {
        let backend = Arc::new(FakeBackend::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let page = mounted(&backend, &notifier).await;

        let out = page.render();
        assert!(out.contains("Pendiente"));
        assert!(out.contains("En preparación"));
    }
}
