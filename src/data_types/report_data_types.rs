use std::{fmt, str::FromStr};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{constants::MONTH_NAMES, errors::ParseValueError};

#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    #[serde(default)]
    pub total_orders: i64,
    #[serde(default)]
    pub low_stock_count: i64,
    #[serde(default)]
    pub popular_drinks: Vec<PopularDrink>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct PopularDrink {
    pub id: i64,
    pub name: String,
    pub count: i64,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct InventoryAlert {
    pub id: i64,
    pub name: String,
    pub current_stock: f64,
    pub min_stock_level: f64,
    pub unit: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct MonthlyConsumptionRecord {
    pub month: u32,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyConsumption {
    pub month: String,
    pub value: i64,
}

impl From<MonthlyConsumptionRecord> for MonthlyConsumption {
    fn from(record: MonthlyConsumptionRecord) -> Self {
        let month = record
            .month
            .checked_sub(1)
            .and_then(|idx| MONTH_NAMES.get(idx as usize))
            .map(|name| name.to_string())
            .unwrap_or_else(|| record.month.to_string());

        MonthlyConsumption {
            month,
            value: record.count,
        }
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ReportType {
    #[default]
    PopularDrinks,
    Inventory,
    Orders,
    Monthly,
}

impl ReportType {
    pub const ALL: [ReportType; 4] = [
        ReportType::PopularDrinks,
        ReportType::Inventory,
        ReportType::Orders,
        ReportType::Monthly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::PopularDrinks => "popular-drinks",
            ReportType::Inventory => "inventory",
            ReportType::Orders => "orders",
            ReportType::Monthly => "monthly",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReportType::PopularDrinks => "Bebidas Populares",
            ReportType::Inventory => "Inventario",
            ReportType::Orders => "Pedidos",
            ReportType::Monthly => "Consumo Mensual",
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportType {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReportType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s.trim())
            .ok_or_else(|| ParseValueError {
                kind: "report type",
                value: s.to_string(),
            })
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Pdf,
    Csv,
    Excel,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [ExportFormat::Pdf, ExportFormat::Csv, ExportFormat::Excel];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Csv => "csv",
            ExportFormat::Excel => "excel",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "PDF",
            ExportFormat::Csv => "CSV",
            ExportFormat::Excel => "Excel",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExportFormat::ALL
            .into_iter()
            .find(|format| format.as_str() == s.trim())
            .ok_or_else(|| ParseValueError {
                kind: "export format",
                value: s.to_string(),
            })
    }
}

/// Body of `POST /api/reports/export`.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    #[serde(rename = "type")]
    pub report_type: ReportType,
    pub format: ExportFormat,
    pub start_date: String,
    pub end_date: String,
}

impl ExportRequest {
    pub fn new(report_type: ReportType, format: ExportFormat, start: NaiveDate, end: NaiveDate) -> Self {
        ExportRequest {
            report_type,
            format,
            start_date: start.format("%Y-%m-%d").to_string(),
            end_date: end.format("%Y-%m-%d").to_string(),
        }
    }

    pub fn filename(&self) -> String {
        format!("reporte-{}.{}", self.report_type, self.format)
    }
}

/// First day of `today`'s month through `today`.
pub fn default_export_range(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    (today.with_day(1).unwrap_or(today), today)
}
