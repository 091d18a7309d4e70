//! Recipes page. Drinks and the ingredient catalogue are loaded together so
//! recipe rows can show names and units.

use std::{sync::Mutex, time::Instant};

use crate::{
    data_types::{
        inventory_data_types::{Ingredient, Unit},
        recipe_data_types::{Drink, DrinkPayload, DrinkType, RecipeIngredient},
    },
    errors::ValidationError,
    widgets::{self, SelectOption, Table},
};

use super::{fmt_amount, lock_ui, parse_quantity, require, FormModal, PageContext, ViewCell};

const LOAD_ERR_MSG: &str = "Error al cargar los datos";
const CREATED_MSG: &str = "Receta creada correctamente";
const UPDATED_MSG: &str = "Receta actualizada correctamente";
const SAVE_ERR_MSG: &str = "Error al guardar la receta";
const DELETED_MSG: &str = "Receta eliminada correctamente";
const DELETE_ERR_MSG: &str = "Error al eliminar la receta";
const NO_INGREDIENTS_MSG: &str = "No hay ingredientes disponibles";
const NEED_INGREDIENT_MSG: &str = "Debe agregar al menos un ingrediente";
const EMPTY_MSG: &str = "No hay recetas disponibles";

#[derive(Debug, Clone, PartialEq)]
pub struct RecipeRow {
    pub ingredient_id: i64,
    pub name: String,
    pub unit: Option<Unit>,
    pub amount: String,
}

impl RecipeRow {
    fn for_ingredient(ingredient: &Ingredient) -> Self {
        RecipeRow {
            ingredient_id: ingredient.id,
            name: ingredient.name.clone(),
            unit: Some(ingredient.unit),
            amount: "0".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipeForm {
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub drink_type: DrinkType,
    pub rows: Vec<RecipeRow>,
}

impl RecipeForm {
    pub fn from_drink(drink: &Drink, catalogue: &[Ingredient]) -> Self {
        let rows = drink
            .ingredients
            .iter()
            .map(|ri| {
                let known = catalogue.iter().find(|i| i.id == ri.ingredient_id);
                RecipeRow {
                    ingredient_id: ri.ingredient_id,
                    name: known.map(|i| i.name.clone()).unwrap_or_default(),
                    unit: known.map(|i| i.unit),
                    amount: fmt_amount(ri.amount),
                }
            })
            .collect();

        RecipeForm {
            name: drink.name.clone(),
            description: drink.description.clone(),
            image_url: drink.image_url.clone().unwrap_or_default(),
            drink_type: drink.drink_type,
            rows,
        }
    }

    pub fn validate(&self) -> Result<DrinkPayload, Vec<ValidationError>> {
        let mut errors = Vec::new();

        let name = require("name", &self.name, "El nombre es obligatorio")
            .map_err(|e| errors.push(e))
            .ok();

        if self.rows.is_empty() {
            errors.push(ValidationError::new("ingredients", NEED_INGREDIENT_MSG));
        }

        let mut ingredients = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            match parse_quantity("ingredients", &row.amount, "La cantidad debe ser un número válido") {
                Ok(amount) => ingredients.push(RecipeIngredient {
                    ingredient_id: row.ingredient_id,
                    amount,
                }),
                Err(e) => {
                    errors.push(e);
                    break;
                }
            }
        }

        match name {
            Some(name) if errors.is_empty() => Ok(DrinkPayload {
                name,
                description: self.description.trim().to_string(),
                image_url: self.image_url.trim().to_string(),
                drink_type: self.drink_type,
                ingredients,
            }),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
struct RecipesData {
    drinks: Vec<Drink>,
    ingredients: Vec<Ingredient>,
}

#[derive(Default)]
struct RecipesUi {
    form: FormModal<RecipeForm>,
    confirm_delete: Option<i64>,
    invalid: Vec<ValidationError>,
}

pub struct RecipesController {
    ctx: PageContext,
    view: ViewCell<RecipesData>,
    ui: Mutex<RecipesUi>,
}

impl RecipesController {
    pub fn new(ctx: PageContext) -> Self {
        RecipesController {
            ctx,
            view: ViewCell::new(),
            ui: Mutex::new(RecipesUi::default()),
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
        let fetched = tokio::try_join!(self.ctx.api.list_drinks(), self.ctx.api.list_ingredients());
        match fetched {
            Ok((drinks, ingredients)) => {
                log::debug!(
                    "Fetched {} drinks and {} ingredients: {:.2?}",
                    drinks.len(),
                    ingredients.len(),
                    now.elapsed()
                );
                self.view.finish(ticket, Some(RecipesData { drinks, ingredients }))
            }
            Err(e) => {
                if self.view.finish(ticket, None) {
                    self.ctx.report_failure(&e, LOAD_ERR_MSG);
                }
                false
            }
        }
    }

    pub fn drinks(&self) -> Vec<Drink> {
        self.view.snapshot().drinks
    }

    pub fn catalogue(&self) -> Vec<Ingredient> {
        self.view.snapshot().ingredients
    }

    pub fn is_loading(&self) -> bool {
        self.view.is_loading()
    }

    pub fn open_add(&self) {
        let mut ui = lock_ui(&self.ui);
        ui.form.open_add();
        ui.invalid.clear();
    }

    pub fn open_edit(&self, id: i64) -> bool {
        let data = self.view.snapshot();
        let Some(drink) = data.drinks.iter().find(|d| d.id == id) else {
            return false;
        };
        let mut ui = lock_ui(&self.ui);
        ui.form.open_edit(id, RecipeForm::from_drink(drink, &data.ingredients));
        ui.invalid.clear();
        true
    }

    pub fn close_form(&self) {
        lock_ui(&self.ui).form.close();
    }

    pub fn form(&self) -> Option<RecipeForm> {
        let ui = lock_ui(&self.ui);
        ui.form.open.then(|| ui.form.form.clone())
    }

    pub fn update_form(&self, edit: impl FnOnce(&mut RecipeForm)) {
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

    /// Appends a row preset to the first ingredient of the catalogue.
    pub fn add_row(&self) -> bool {
        let catalogue = self.catalogue();
        let Some(first) = catalogue.first() else {
            self.ctx.notifier.error(NO_INGREDIENTS_MSG);
            return false;
        };
        lock_ui(&self.ui).form.form.rows.push(RecipeRow::for_ingredient(first));
        true
    }

    pub fn select_row_ingredient(&self, row: usize, ingredient_id: i64) -> bool {
        let catalogue = self.catalogue();
        let Some(ingredient) = catalogue.iter().find(|i| i.id == ingredient_id) else {
            return false;
        };
        let mut ui = lock_ui(&self.ui);
        match ui.form.form.rows.get_mut(row) {
            Some(slot) => {
                slot.ingredient_id = ingredient.id;
                slot.name = ingredient.name.clone();
                slot.unit = Some(ingredient.unit);
                true
            }
            None => false,
        }
    }

    pub fn set_row_amount(&self, row: usize, amount: &str) -> bool {
        match lock_ui(&self.ui).form.form.rows.get_mut(row) {
            Some(slot) => {
                slot.amount = amount.to_string();
                true
            }
            None => false,
        }
    }

    pub fn remove_row(&self, row: usize) -> bool {
        let mut ui = lock_ui(&self.ui);
        if row < ui.form.form.rows.len() {
            ui.form.form.rows.remove(row);
            true
        } else {
            false
        }
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
            Some(id) => (self.ctx.api.update_drink(id, &payload).await, UPDATED_MSG),
            None => (self.ctx.api.create_drink(&payload).await, CREATED_MSG),
        };
        if !self.ctx.settle(result, ok_message, SAVE_ERR_MSG) {
            return false;
        }
        self.close_form();
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
        let result = self.ctx.api.delete_drink(id).await;
        if !self.ctx.settle(result, DELETED_MSG, DELETE_ERR_MSG) {
            return false;
        }
        self.refresh().await;
        true
    }

    pub fn type_options() -> Vec<SelectOption> {
        [DrinkType::Standard, DrinkType::Custom]
            .iter()
            .map(|t| SelectOption::new(t.as_str(), t.label()))
            .collect()
    }

    pub fn ingredient_options(&self) -> Vec<SelectOption> {
        self.catalogue()
            .iter()
            .map(|i| SelectOption::new(i.id.to_string(), format!("{} ({})", i.name, i.unit)))
            .collect()
    }

    pub fn render(&self) -> String {
        let data = self.view.snapshot();
        let catalogue = data.ingredients;
        let describe = move |drink: &Drink| {
            drink
                .ingredients
                .iter()
                .map(|ri| match catalogue.iter().find(|i| i.id == ri.ingredient_id) {
                    Some(i) => format!("{} ({} {})", i.name, fmt_amount(ri.amount), i.unit),
                    None => format!("#{} ({})", ri.ingredient_id, fmt_amount(ri.amount)),
                })
                .collect::<Vec<_>>()
                .join(", ")
        };

        Table::new()
            .column("ID", |d: &Drink| d.id.to_string())
            .column("Nombre", |d| d.name.clone())
            .column("Tipo", |d| d.drink_type.label().to_string())
            .column("Ingredientes", describe)
            .empty_message(EMPTY_MSG)
            .loading(self.is_loading())
            .render(&data.drinks)
    }
}
