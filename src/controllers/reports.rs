//! Reports page: three report reads for a selectable year, plus the export form.

use std::{
    path::{Path, PathBuf},
    sync::Mutex,
    time::Instant,
};

use chrono::{Datelike, Local, NaiveDate};

use crate::{
    constants::REPORT_YEAR_SPAN,
    data_types::inventory_data_types::StockStatus,
    data_types::report_data_types::{
        default_export_range, ExportFormat, ExportRequest, InventoryAlert, MonthlyConsumption, PopularDrink,
        ReportType,
    },
    widgets::{self, SelectOption, Table},
};

use super::{fmt_amount, lock_ui, PageContext, ViewCell};

const LOAD_ERR_MSG: &str = "Error al cargar los datos de reportes";
const EXPORT_OK_MSG: &str = "Reporte exportado correctamente";
const EXPORT_ERR_MSG: &str = "Error al exportar el reporte";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportsData {
    pub popular_drinks: Vec<PopularDrink>,
    pub inventory_alerts: Vec<InventoryAlert>,
    pub monthly: Vec<MonthlyConsumption>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportForm {
    pub report_type: ReportType,
    pub format: ExportFormat,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl ExportForm {
    pub fn starting(today: NaiveDate) -> Self {
        let (start_date, end_date) = default_export_range(today);
        ExportForm {
            report_type: ReportType::default(),
            format: ExportFormat::default(),
            start_date,
            end_date,
        }
    }

    pub fn request(&self) -> ExportRequest {
        ExportRequest::new(self.report_type, self.format, self.start_date, self.end_date)
    }
}

struct ReportsUi {
    year: i32,
    export: Option<ExportForm>,
}

pub struct ReportsController {
    ctx: PageContext,
    view: ViewCell<ReportsData>,
    ui: Mutex<ReportsUi>,
}

/// The current year and the ones before it, newest first.
pub fn year_options(current_year: i32) -> Vec<i32> {
    (0..REPORT_YEAR_SPAN).map(|back| current_year - back).collect()
}

impl ReportsController {
    pub fn new(ctx: PageContext) -> Self {
        Self::for_year(ctx, Local::now().year())
    }

    pub fn for_year(ctx: PageContext, year: i32) -> Self {
        ReportsController {
            ctx,
            view: ViewCell::new(),
            ui: Mutex::new(ReportsUi { year, export: None }),
        }
    }

    pub async fn mount(&self) {
        self.view.mount();
        self.refresh().await;
    }

    pub fn unmount(&self) {
        self.view.unmount();
    }

    pub fn year(&self) -> i32 {
        lock_ui(&self.ui).year
    }

    /// Changing the year re-fetches; picking the same year does nothing.
    pub async fn set_year(&self, year: i32) -> bool {
        {
            let mut ui = lock_ui(&self.ui);
            if ui.year == year {
                return false;
            }
            ui.year = year;
        }
        self.refresh().await
    }

    pub async fn refresh(&self) -> bool {
        let Some(ticket) = self.view.begin() else {
            return false;
        };
        let year = self.year();
        let now = Instant::now();
        let fetched = tokio::try_join!(
            self.ctx.api.popular_drinks(),
            self.ctx.api.inventory_alerts(),
            self.ctx.api.monthly_consumption(year)
        );
        match fetched {
            Ok((popular_drinks, inventory_alerts, monthly)) => {
                log::debug!("Fetched reports for {}: {:.2?}", year, now.elapsed());
                self.view.finish(
                    ticket,
                    Some(ReportsData {
                        popular_drinks,
                        inventory_alerts,
                        monthly,
                    }),
                )
            }
            Err(e) => {
                if self.view.finish(ticket, None) {
                    self.ctx.report_failure(&e, LOAD_ERR_MSG);
                }
                false
            }
        }
    }

    pub fn data(&self) -> ReportsData {
        self.view.snapshot()
    }

    pub fn is_loading(&self) -> bool {
        self.view.is_loading()
    }

    pub fn open_export(&self, today: NaiveDate) {
        lock_ui(&self.ui).export = Some(ExportForm::starting(today));
    }

    pub fn export_form(&self) -> Option<ExportForm> {
        lock_ui(&self.ui).export.clone()
    }

    pub fn update_export(&self, edit: impl FnOnce(&mut ExportForm)) {
        if let Some(form) = lock_ui(&self.ui).export.as_mut() {
            edit(form);
        }
    }

    pub fn close_export(&self) {
        lock_ui(&self.ui).export = None;
    }

    /// Requests the export and saves it as `reporte-{type}.{format}` in `dir`.
    pub async fn submit_export(&self, dir: &Path) -> Option<PathBuf> {
        let form = self.export_form()?;
        let request = form.request();
        let now = Instant::now();

        let bytes = match self.ctx.api.export_report(&request).await {
            Ok(bytes) => bytes,
            Err(e) => {
                self.ctx.report_failure(&e, EXPORT_ERR_MSG);
                return None;
            }
        };

        let path = dir.join(request.filename());
        if let Err(e) = tokio::fs::write(&path, &bytes).await {
            log::error!("Could not write {}: {}", path.display(), e);
            self.ctx.notifier.error(EXPORT_ERR_MSG);
            return None;
        }

        log::info!("Exported {} bytes to {}: {:.2?}", bytes.len(), path.display(), now.elapsed());
        self.ctx.notifier.success(EXPORT_OK_MSG);
        self.close_export();
        Some(path)
    }

    pub fn render_year_select(&self) -> String {
        let year = self.year();
        let options: Vec<SelectOption> = year_options(Local::now().year().max(year))
            .into_iter()
            .map(|y| SelectOption::new(y.to_string(), y.to_string()))
            .collect();
        widgets::render_select("Año", &options, &year.to_string())
    }

    pub fn type_options() -> Vec<SelectOption> {
        ReportType::ALL
            .iter()
            .map(|t| SelectOption::new(t.as_str(), t.label()))
            .collect()
    }

    pub fn format_options() -> Vec<SelectOption> {
        ExportFormat::ALL
            .iter()
            .map(|f| SelectOption::new(f.as_str(), f.label()))
            .collect()
    }

    pub fn render(&self) -> String {
        let data = self.data();
        let loading = self.is_loading();

        let mut out = String::from("Bebidas populares\n");
        out += &Table::new()
            .column("Bebida", |d: &PopularDrink| d.name.clone())
            .column("Cantidad", |d| d.count.to_string())
            .loading(loading)
            .render(&data.popular_drinks);

        out += "\nAlertas de inventario\n";
        out += &Table::new()
            .column("Ingrediente", |a: &InventoryAlert| a.name.clone())
            .column("Stock", |a| format!("{} {}", fmt_amount(a.current_stock), a.unit))
            .column("Mínimo", |a| format!("{} {}", fmt_amount(a.min_stock_level), a.unit))
            .column("Estado", |a| {
                widgets::stock_badge(StockStatus::classify(a.current_stock, a.min_stock_level)).to_string()
            })
            .empty_message("No hay alertas de inventario")
            .loading(loading)
            .render(&data.inventory_alerts);

        out += &format!("\nConsumo mensual {}\n", self.year());
        if loading {
            out += &widgets::spinner();
            out.push('\n');
        } else {
            let bars: Vec<(String, i64)> = data.monthly.iter().map(|m| (m.month.clone(), m.value)).collect();
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
        credential_store::MemoryCredentialStore,
        notifications::RecordingNotifier,
        session::{CredentialHandle, Session},
        testing::FakeBackend,
    };

    fn page_on(backend: &Arc<FakeBackend>, notifier: &Arc<RecordingNotifier>) -> ReportsController {
        let session = Arc::new(Session::new(
            backend.clone(),
            Arc::new(MemoryCredentialStore::new()),
            CredentialHandle::default(),
        ));
        ReportsController::for_year(PageContext::new(backend.clone(), session, notifier.clone()), 2024)
    }

    #[test]
    fn year_select_offers_five_years() {
        assert_eq!(year_options(2024), vec![2024, 2023, 2022, 2021, 2020]);
    }

    #[tokio::test]
    async fn mount_runs_three_reads() {
        let backend = Arc::new(FakeBackend::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let page = page_on(&backend, &notifier);
        page.mount().await;

        let data = page.data();
        assert_eq!(data.popular_drinks.len(), 1);
        assert_eq!(data.inventory_alerts[0].name, "Menta");
        assert_eq!(data.monthly[0].month, "Enero");
        assert_eq!(*backend.last_year.lock().unwrap(), Some(2024));
    }

    #[tokio::test]
    async fn tables_show_counts_and_alert_badges() {
        let backend = Arc::new(FakeBackend::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let page = page_on(&backend, &notifier);
        page.mount().await;

        let out = page.render();
        assert!(out.contains("CANTIDAD"));
        assert!(out.contains("ESTADO"));
        assert!(out.contains("Sin stock"));
    }

    #[tokio::test]
    async fn year_change_refetches() {
        let backend = Arc::new(FakeBackend::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let page = page_on(&backend, &notifier);
        page.mount().await;

        assert!(!page.set_year(2024).await);
        assert!(page.set_year(2022).await);

        assert_eq!(backend.count("monthly_consumption"), 2);
        assert_eq!(*backend.last_year.lock().unwrap(), Some(2022));
    }

    #[tokio::test]
    async fn load_failure_is_reported() {
        let backend = Arc::new(FakeBackend::new());
        backend.fail("inventory_alerts");
        let notifier = Arc::new(RecordingNotifier::new());
        let page = page_on(&backend, &notifier);
        page.mount().await;

        assert_eq!(page.data(), ReportsData::default());
        assert_eq!(notifier.errors(), vec![LOAD_ERR_MSG]);
    }

    #[tokio::test]
    async fn export_writes_named_file() {
        let backend = Arc::new(FakeBackend::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let page = page_on(&backend, &notifier);
        let dir = tempfile::tempdir().unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 5, 17).unwrap();

        page.open_export(today);
        page.update_export(|f| f.format = ExportFormat::Csv);
        let path = page.submit_export(dir.path()).await.unwrap();

        assert_eq!(path, dir.path().join("reporte-popular-drinks.csv"));
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.4 fake");
        let sent = backend.last_export.lock().unwrap().clone().unwrap();
        assert_eq!(sent.start_date, "2024-05-01");
        assert_eq!(sent.end_date, "2024-05-17");
        assert_eq!(notifier.successes(), vec![EXPORT_OK_MSG]);
        assert_eq!(page.export_form(), None);
    }

    #[tokio::test]
    async fn failed_export_writes_nothing() {
        let backend = Arc::new(FakeBackend::new());
        backend.fail("export_report");
        let notifier = Arc::new(RecordingNotifier::new());
        let page = page_on(&backend, &notifier);
        let dir = tempfile::tempdir().unwrap();

        page.open_export(NaiveDate::from_ymd_opt(2024, 5, 17).unwrap());
        assert!(page.submit_export(dir.path()).await.is_none());

        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
        assert_eq!(notifier.errors(), vec![EXPORT_ERR_MSG]);
        assert!(page.export_form().is_some());
    }
}
