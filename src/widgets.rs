//! Stateless text renderers used by the terminal front-end.

use std::fmt;

use crate::{
    constants::LOADING_MSG,
    data_types::{inventory_data_types::StockStatus, order_data_types::OrderStatus},
};

pub const DEFAULT_EMPTY_MSG: &str = "No hay datos disponibles";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeVariant {
    Success,
    Warning,
    Danger,
    Info,
    Default,
}

impl BadgeVariant {
    fn marker(&self) -> &'static str {
        match self {
            BadgeVariant::Success => "●",
            BadgeVariant::Warning => "▲",
            BadgeVariant::Danger => "✖",
            BadgeVariant::Info => "◆",
            BadgeVariant::Default => "○",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Badge {
    pub label: String,
    pub variant: BadgeVariant,
}

impl fmt::Display for Badge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.variant.marker(), self.label)
    }
}

pub fn stock_badge(status: StockStatus) -> Badge {
    let variant = match status {
        StockStatus::OutOfStock => BadgeVariant::Danger,
        StockStatus::Low => BadgeVariant::Warning,
        StockStatus::Normal => BadgeVariant::Success,
    };
    Badge {
        label: status.label().to_string(),
        variant,
    }
}

pub fn order_status_badge(status: &OrderStatus) -> Badge {
    let variant = match status {
        OrderStatus::Pending => BadgeVariant::Warning,
        OrderStatus::Preparing => BadgeVariant::Info,
        OrderStatus::Completed => BadgeVariant::Success,
        OrderStatus::Cancelled => BadgeVariant::Danger,
        OrderStatus::Other(_) => BadgeVariant::Default,
    };
    Badge {
        label: status.label().to_string(),
        variant,
    }
}

pub fn spinner() -> String {
    format!("⠿ {}", LOADING_MSG)
}

struct Column<'a, T> {
    header: &'a str,
    accessor: Box<dyn Fn(&T) -> String + 'a>,
}

/// Column-aligned table. Shows the spinner while loading and the empty
/// message when there are no rows.
pub struct Table<'a, T> {
    columns: Vec<Column<'a, T>>,
    empty_message: &'a str,
    loading: bool,
}

impl<'a, T> Default for Table<'a, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T> Table<'a, T> {
    pub fn new() -> Self {
        Table {
            columns: Vec::new(),
            empty_message: DEFAULT_EMPTY_MSG,
            loading: false,
        }
    }

    pub fn column(mut self, header: &'a str, accessor: impl Fn(&T) -> String + 'a) -> Self {
        self.columns.push(Column {
            header,
            accessor: Box::new(accessor),
        });
        self
    }

    pub fn empty_message(mut self, message: &'a str) -> Self {
        self.empty_message = message;
        self
    }

    pub fn loading(mut self, loading: bool) -> Self {
        self.loading = loading;
        self
    }

    pub fn render(&self, rows: &[T]) -> String {
        let headers: Vec<String> = self.columns.iter().map(|c| c.header.to_uppercase()).collect();

        if self.loading || rows.is_empty() {
            let body = if self.loading {
                spinner()
            } else {
                self.empty_message.to_string()
            };
            return format!("{}\n{}\n", headers.join("  "), body);
        }

        let cells: Vec<Vec<String>> = rows
            .iter()
            .map(|row| self.columns.iter().map(|c| (c.accessor)(row)).collect())
            .collect();

        let widths: Vec<usize> = headers
            .iter()
            .enumerate()
            .map(|(idx, header)| {
                cells
                    .iter()
                    .map(|row| display_width(&row[idx]))
                    .chain(std::iter::once(display_width(header)))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut out = String::new();
        out += &pad_row(&headers, &widths);
        out += &pad_row(
            &widths.iter().map(|w| "─".repeat(*w)).collect::<Vec<_>>(),
            &widths,
        );
        for row in &cells {
            out += &pad_row(row, &widths);
        }
        out
    }
}

fn display_width(s: &str) -> usize {
    s.chars().count()
}

fn pad_row(cells: &[String], widths: &[usize]) -> String {
    let mut line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let padding = width.saturating_sub(display_width(cell));
            format!("{}{}", cell, " ".repeat(padding))
        })
        .collect::<Vec<_>>()
        .join("  ");
    line.truncate(line.trim_end().len());
    line.push('\n');
    line
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        SelectOption {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Lists the options of a select, marking the chosen value.
pub fn render_select(label: &str, options: &[SelectOption], selected: &str) -> String {
    let mut out = format!("{}:\n", label);
    for option in options {
        let mark = if option.value == selected { "*" } else { " " };
        out += &format!(" {} {:<16} {}\n", mark, option.value, option.label);
    }
    out
}

/// Inline error under an invalid input.
pub fn field_error(label: &str, message: &str) -> String {
    format!("  ↳ {}: {}", label, message)
}

/// Horizontal bar chart; bars are scaled to `width` characters.
pub fn bar_chart(rows: &[(String, i64)], width: usize) -> String {
    let max = rows.iter().map(|(_, v)| *v).max().unwrap_or(0).max(1);
    let label_width = rows.iter().map(|(l, _)| display_width(l)).max().unwrap_or(0);

    let mut out = String::new();
    for (label, value) in rows {
        let len = (i128::from((*value).max(0)) * width as i128 / i128::from(max)) as usize;
        out += &format!(
            "{}{} │{} {}\n",
            label,
            " ".repeat(label_width - display_width(label)),
            "█".repeat(len),
            value
        );
    }
    out
}
