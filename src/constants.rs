pub const DEFAULT_API_URL: &str = "http://localhost:3000";
pub const PUSH_CHANNEL_PATH: &str = "/ws";

pub const TOKEN_DIR_NAME: &str = "bartender-admin";
pub const TOKEN_FILE_NAME: &str = "token";

pub const ME_PATH: &str = "/api/auth/admin/me";
pub const LOGIN_PATH: &str = "/api/auth/admin/login";
pub const REGISTER_PATH: &str = "/api/auth/admin/register";
pub const INGREDIENTS_PATH: &str = "/api/ingredients";
pub const DRINKS_PATH: &str = "/api/drinks";
pub const ORDERS_ADMIN_PATH: &str = "/api/orders/admin";
pub const ORDERS_PATH: &str = "/api/orders";
pub const DASHBOARD_PATH: &str = "/api/reports/dashboard";
pub const POPULAR_DRINKS_PATH: &str = "/api/reports/popular-drinks";
pub const INVENTORY_ALERTS_PATH: &str = "/api/reports/inventory-alerts";
pub const MONTHLY_CONSUMPTION_PATH: &str = "/api/reports/monthly-consumption";
pub const EXPORT_PATH: &str = "/api/reports/export";

pub const ORDER_UPDATE_EVENT: &str = "ORDER_UPDATE";

pub const LOADING_MSG: &str = "Cargando...";
pub const INVALID_CREDENTIALS_MSG: &str = "Credenciales inválidas. Por favor, intente de nuevo.";
pub const UNEXPECTED_ERROR_MSG: &str = "Ocurrió un error inesperado. Intente más tarde.";
pub const SESSION_EXPIRED_MSG: &str = "Sesión expirada. Inicie sesión nuevamente.";

pub const MONTH_NAMES: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

// years offered by the reports year select, counting back from the current one
pub const REPORT_YEAR_SPAN: i32 = 5;
