//! Inventory page: list, add/edit modal, restock modal and delete confirmation.

use std::{sync::Mutex, time::Instant};

use crate::{
    data_types::inventory_data_types::{Ingredient, IngredientPayload, RestockPayload, Unit},
    errors::ValidationError,
    widgets::{self, SelectOption, Table},
};

use super::{fmt_amount, lock_ui, parse_quantity, require, FormModal, PageContext, ViewCell};

const LOAD_ERR_MSG: &str = "Error al cargar los ingredientes";
const CREATED_MSG: &str = "Ingrediente creado correctamente";
const UPDATED_MSG: &str = "Ingrediente actualizado correctamente";
const SAVE_ERR_MSG: &str = "Error al guardar el ingrediente";
const RESTOCKED_MSG: &str = "Ingrediente reabastecido correctamente";
const RESTOCK_ERR_MSG: &str = "Error al reabastecer el ingrediente";
const DELETED_MSG: &str = "Ingrediente eliminado correctamente";
const DELETE_ERR_MSG: &str = "Error al eliminar el ingrediente";
const EMPTY_MSG: &str = "No hay ingredientes disponibles";

/// Form fields are kept as typed text until submission.
#[derive(Debug, Clone, PartialEq)]
pub struct IngredientForm {
    pub name: String,
    pub current_stock: String,
    pub min_stock_level: String,
    pub unit: Unit,
    pub pump_id: String,
}

impl Default for IngredientForm {
    fn default() -> Self {
        IngredientForm {
            name: String::new(),
            current_stock: "0".to_string(),
            min_stock_level: "0".to_string(),
            unit: Unit::Ml,
            pump_id: String::new(),
        }
    }
}

impl IngredientForm {
    pub fn from_ingredient(ingredient: &Ingredient) -> Self {
        IngredientForm {
            name: ingredient.name.clone(),
            current_stock: fmt_amount(ingredient.current_stock),
            min_stock_level: fmt_amount(ingredient.min_stock_level),
            unit: ingredient.unit,
            pump_id: ingredient.pump_id.map(|id| id.to_string()).unwrap_or_default(),
        }
    }

    pub fn validate(&self) -> Result<IngredientPayload, Vec<ValidationError>> {
        let name = require("name", &self.name, "El nombre es obligatorio");
        let current_stock = parse_quantity(
            "current_stock",
            &self.current_stock,
            "El stock actual debe ser un número válido",
        );
        let min_stock_level = parse_quantity(
            "min_stock_level",
            &self.min_stock_level,
            "El stock mínimo debe ser un número válido",
        );
        let pump_id = match self.pump_id.trim() {
            "" => Ok(None),
            raw => raw
                .parse::<i64>()
                .map(Some)
                .map_err(|_| ValidationError::new("pump_id", "El ID de bomba debe ser un número entero")),
        };

        match (name, current_stock, min_stock_level, pump_id) {
            (Ok(name), Ok(current_stock), Ok(min_stock_level), Ok(pump_id)) => Ok(IngredientPayload {
                name,
                current_stock,
                min_stock_level,
                unit: self.unit,
                pump_id,
            }),
            (name, current_stock, min_stock_level, pump_id) => Err([
                name.err(),
                current_stock.err(),
                min_stock_level.err(),
                pump_id.err(),
            ]
            .into_iter()
            .flatten()
            .collect()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RestockModal {
    pub ingredient: Ingredient,
    pub amount: String,
}

#[derive(Default)]
struct IngredientsUi {
    form: FormModal<IngredientForm>,
    restock: Option<RestockModal>,
    confirm_delete: Option<i64>,
    invalid: Vec<ValidationError>,
}

pub struct IngredientsController {
    ctx: PageContext,
    view: ViewCell<Vec<Ingredient>>,
    ui: Mutex<IngredientsUi>,
}

impl IngredientsController {
    pub fn new(ctx: PageContext) -> Self {
        IngredientsController {
            ctx,
            view: ViewCell::new(),
            ui: Mutex::new(IngredientsUi::default()),
        }
    }

    pub async fn mount(&self) {
        self.view.mount();
        self.refresh().await;
    }

    pub fn unmount(&self) {
        self.view.unmount();
    }

    /// Re-fetches the list; false when it failed or the result went stale.
    pub async fn refresh(&self) -> bool {
        let Some(ticket) = self.view.begin() else {
            return false;
        };
        let now = Instant::now();
        match self.ctx.api.list_ingredients().await {
            Ok(list) => {
                log::debug!("Fetched {} ingredients: {:.2?}", list.len(), now.elapsed());
                self.view.finish(ticket, Some(list))
            }
            Err(e) => {
                if self.view.finish(ticket, None) {
                    self.ctx.report_failure(&e, LOAD_ERR_MSG);
                }
                false
            }
        }
    }

    pub fn ingredients(&self) -> Vec<Ingredient> {
        self.view.snapshot()
    }

    pub fn is_loading(&self) -> bool {
        self.view.is_loading()
    }

    fn find(&self, id: i64) -> Option<Ingredient> {
        self.ingredients().into_iter().find(|i| i.id == id)
    }

    pub fn open_add(&self) {
        let mut ui = lock_ui(&self.ui);
        ui.form.open_add();
        ui.invalid.clear();
    }

    pub fn open_edit(&self, id: i64) -> bool {
        let Some(ingredient) = self.find(id) else {
            return false;
        };
        let mut ui = lock_ui(&self.ui);
        ui.form.open_edit(id, IngredientForm::from_ingredient(&ingredient));
        ui.invalid.clear();
        true
    }

    pub fn close_form(&self) {
        lock_ui(&self.ui).form.close();
    }

    /// The open add/edit form, if any.
    pub fn form(&self) -> Option<IngredientForm> {
        let ui = lock_ui(&self.ui);
        ui.form.open.then(|| ui.form.form.clone())
    }

    pub fn update_form(&self, edit: impl FnOnce(&mut IngredientForm)) {
        edit(&mut lock_ui(&self.ui).form.form);
    }

    pub fn invalid_fields(&self) -> Vec<&'static str> {
        lock_ui(&self.ui).invalid.iter().map(|e| e.field).collect()
    }

    /// Inline errors under the fields the last submission rejected.
    pub fn render_field_errors(&self) -> String {
        lock_ui(&self.ui)
            .invalid
            .iter()
            .map(|e| widgets::field_error(e.field, &e.message) + "\n")
            .collect()
    }

    pub async fn submit_form(&self) -> bool {
        let (form, editing) = {
            let ui = lock_ui(&self.ui);
            if !ui.form.open {
                return false;
            }
            (ui.form.form.clone(), ui.form.editing)
        };

        let payload = match form.validate() {
            Ok(payload) => payload,
            Err(errors) => {
                self.ctx.report_invalid(&errors);
                lock_ui(&self.ui).invalid = errors;
                return false;
            }
        };
        lock_ui(&self.ui).invalid.clear();

        let (result, ok_message) = match editing {
            Some(id) => (self.ctx.api.update_ingredient(id, &payload).await, UPDATED_MSG),
            None => (self.ctx.api.create_ingredient(&payload).await, CREATED_MSG),
        };
        if !self.ctx.settle(result, ok_message, SAVE_ERR_MSG) {
            return false;
        }
        self.close_form();
        self.refresh().await;
        true
    }

    pub fn open_restock(&self, id: i64) -> bool {
        let Some(ingredient) = self.find(id) else {
            return false;
        };
        lock_ui(&self.ui).restock = Some(RestockModal {
            ingredient,
            amount: String::new(),
        });
        true
    }

    pub fn restock_modal(&self) -> Option<RestockModal> {
        lock_ui(&self.ui).restock.clone()
    }

    pub fn set_restock_amount(&self, amount: &str) {
        if let Some(modal) = lock_ui(&self.ui).restock.as_mut() {
            modal.amount = amount.to_string();
        }
    }

    pub fn close_restock(&self) {
        lock_ui(&self.ui).restock = None;
    }

    pub async fn submit_restock(&self) -> bool {
        let Some(modal) = self.restock_modal() else {
            return false;
        };

        let amount = match parse_quantity("amount", &modal.amount, "Ingrese una cantidad válida") {
            Ok(amount) if amount > 0.0 => amount,
            Ok(_) | Err(_) => {
                let err = ValidationError::new("amount", "Ingrese una cantidad válida");
                self.ctx.report_invalid(std::slice::from_ref(&err));
                lock_ui(&self.ui).invalid = vec![err];
                return false;
            }
        };

        let result = self
            .ctx
            .api
            .restock_ingredient(modal.ingredient.id, &RestockPayload { amount })
            .await;
        if !self.ctx.settle(result, RESTOCKED_MSG, RESTOCK_ERR_MSG) {
            return false;
        }
        self.close_restock();
        self.refresh().await;
        true
    }

    pub fn request_delete(&self, id: i64) {
        lock_ui(&self.ui).confirm_delete = Some(id);
    }

    pub fn pending_delete(&self) -> Option<i64> {
        lock_ui(&self.ui).confirm_delete
    }

    pub fn cancel_delete(&self) {
        lock_ui(&self.ui).confirm_delete = None;
    }

    pub async fn confirm_delete(&self) -> bool {
        let Some(id) = lock_ui(&self.ui).confirm_delete.take() else {
            return false;
        };
        let result = self.ctx.api.delete_ingredient(id).await;
        if !self.ctx.settle(result, DELETED_MSG, DELETE_ERR_MSG) {
            return false;
        }
        self.refresh().await;
        true
    }

    pub fn unit_options() -> Vec<SelectOption> {
        Unit::ALL
            .iter()
            .map(|unit| SelectOption::new(unit.as_str(), unit.label()))
            .collect()
    }

    pub fn render(&self) -> String {
        Table::new()
            .column("ID", |i: &Ingredient| i.id.to_string())
            .column("Nombre", |i| i.name.clone())
            .column("Stock", |i| format!("{} {}", fmt_amount(i.current_stock), i.unit))
            .column("Mínimo", |i| format!("{} {}", fmt_amount(i.min_stock_level), i.unit))
            .column("Bomba", |i| i.pump_id.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string()))
            .column("Estado", |i| widgets::stock_badge(i.stock_status()).to_string())
            .empty_message(EMPTY_MSG)
            .loading(self.is_loading())
            .render(&self.ingredients())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        credential_store::MemoryCredentialStore,
        notifications::RecordingNotifier,
        session::{CredentialHandle, Session},
        testing::FakeBackend,
    };

    struct Harness {
        backend: Arc<FakeBackend>,
        notifier: Arc<RecordingNotifier>,
        session: Arc<Session>,
        page: IngredientsController,
    }

    async fn mounted() -> Harness {
        let backend = Arc::new(FakeBackend::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let session = Arc::new(Session::new(
            backend.clone(),
            Arc::new(MemoryCredentialStore::new()),
            CredentialHandle::default(),
        ));
        let page = IngredientsController::new(PageContext::new(
            backend.clone(),
            session.clone(),
            notifier.clone(),
        ));
        page.mount().await;
        Harness {
            backend,
            notifier,
            session,
            page,
        }
    }

    #[tokio::test]
    async fn mount_loads_list() {
        let h = mounted().await;
        assert_eq!(h.backend.count("list_ingredients"), 1);
        assert_eq!(h.page.ingredients().len(), 2);
        assert!(!h.page.is_loading());
    }

    #[tokio::test]
    async fn add_resets_form_to_defaults() {
        let h = mounted().await;
        h.page.open_edit(1);
        h.page.open_add();

        assert_eq!(h.page.form(), Some(IngredientForm::default()));
    }

    #[tokio::test]
    async fn edit_prefills_from_entity() {
        let h = mounted().await;
        assert!(h.page.open_edit(1));

        let form = h.page.form().unwrap();
        assert_eq!(form.name, "Ron");
        assert_eq!(form.current_stock, "750");
        assert_eq!(form.pump_id, "1");
    }

    #[tokio::test]
    async fn successful_create_refetches_once() {
        let h = mounted().await;
        h.page.open_add();
        h.page.update_form(|f| {
            f.name = "Lima".to_string();
            f.current_stock = "20".to_string();
            f.min_stock_level = "5".to_string();
            f.unit = Unit::Unidad;
        });

        assert!(h.page.submit_form().await);

        assert_eq!(h.backend.count("create_ingredient"), 1);
        assert_eq!(h.backend.count("list_ingredients"), 2);
        assert_eq!(h.notifier.successes(), vec![CREATED_MSG]);
        assert_eq!(h.page.form(), None);
        let sent = h.backend.last_ingredient_payload.lock().unwrap().clone().unwrap();
        assert_eq!(sent.unit, Unit::Unidad);
        assert_eq!(sent.pump_id, None);
    }

    #[tokio::test]
    async fn failed_update_does_not_refetch() {
        let h = mounted().await;
        h.backend.fail("update_ingredient");
        h.page.open_edit(1);

        assert!(!h.page.submit_form().await);

        assert_eq!(h.backend.count("update_ingredient"), 1);
        assert_eq!(h.backend.count("list_ingredients"), 1);
        assert_eq!(h.notifier.errors(), vec![SAVE_ERR_MSG]);
        assert!(h.page.form().is_some());
    }

    #[tokio::test]
    async fn invalid_form_blocks_the_call() {
        let h = mounted().await;
        h.page.open_add();
        h.page.update_form(|f| f.current_stock = "mucho".to_string());

        assert!(!h.page.submit_form().await);

        assert_eq!(h.backend.count("create_ingredient"), 0);
        assert_eq!(h.page.invalid_fields(), vec!["name", "current_stock"]);
        assert_eq!(h.notifier.errors().len(), 2);
        assert!(h.page.render_field_errors().contains("current_stock: El stock actual debe ser un número válido"));
    }

    #[tokio::test]
    async fn restock_requires_positive_amount() {
        let h = mounted().await;
        assert!(h.page.open_restock(2));
        h.page.set_restock_amount("0");

        assert!(!h.page.submit_restock().await);
        assert_eq!(h.backend.count("restock_ingredient"), 0);

        h.page.set_restock_amount("250");
        assert!(h.page.submit_restock().await);
        assert_eq!(
            *h.backend.last_restock.lock().unwrap(),
            Some((2, RestockPayload { amount: 250.0 }))
        );
        assert_eq!(h.backend.count("list_ingredients"), 2);
        assert_eq!(h.page.restock_modal(), None);
    }

    #[tokio::test]
    async fn delete_waits_for_confirmation() {
        let h = mounted().await;
        h.page.request_delete(2);
        h.page.cancel_delete();
        assert!(!h.page.confirm_delete().await);
        assert_eq!(h.backend.count("delete_ingredient"), 0);

        h.page.request_delete(2);
        assert!(h.page.confirm_delete().await);
        assert_eq!(h.backend.count("delete_ingredient"), 1);
        assert_eq!(h.backend.count("list_ingredients"), 2);
        assert_eq!(h.notifier.successes(), vec![DELETED_MSG]);
    }

    #[tokio::test]
    async fn failed_load_keeps_previous_rows() {
        let h = mounted().await;
        h.backend.fail("list_ingredients");

        assert!(!h.page.refresh().await);

        assert_eq!(h.page.ingredients().len(), 2);
        assert_eq!(h.notifier.errors(), vec![LOAD_ERR_MSG]);

        h.backend.heal("list_ingredients");
        assert!(h.page.refresh().await);
    }

    #[tokio::test]
    async fn rejected_credential_ends_session() {
        let h = mounted().await;
        h.session.login(crate::testing::ADMIN_EMAIL, crate::testing::ADMIN_PASSWORD, false).await.unwrap();
        assert!(h.session.is_authenticated());
        h.backend.reject("delete_ingredient");
        h.page.request_delete(1);

        assert!(!h.page.confirm_delete().await);

        assert!(!h.session.is_authenticated());
        assert_eq!(h.session.credential_handle().get(), None);
        assert_eq!(h.notifier.errors(), vec![crate::constants::SESSION_EXPIRED_MSG]);
    }

    #[tokio::test]
    async fn empty_table_message() {
        let h = mounted().await;
        h.backend.fail("list_ingredients");
        h.page.unmount();
        let page = IngredientsController::new(PageContext::new(
            h.backend.clone(),
            h.session.clone(),
            h.notifier.clone(),
        ));
        page.mount().await;

        assert!(page.render().contains("No hay ingredientes disponibles"));
    }

    #[tokio::test]
    async fn table_shows_stock_and_badges() {
        let h = mounted().await;
        let out = h.page.render();

        assert!(out.contains("750 ml"));
        assert!(out.contains("Sin stock"));
        assert!(out.contains("Normal"));
    }
}
