use std::{env, path::PathBuf, process::ExitCode, sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use bartender_admin::{
    api_client::ApiClient,
    config::Config,
    constants::DEFAULT_API_URL,
    controllers::{
        auth_forms::{LoginForm, RegisterForm},
        dashboard::DashboardController,
        ingredients::IngredientsController,
        orders::OrdersController,
        recipes::RecipesController,
        reports::{year_options, ReportsController},
        PageContext,
    },
    credential_store::FileCredentialStore,
    data_types::{
        inventory_data_types::Unit,
        order_data_types::OrderStatus,
        recipe_data_types::DrinkType,
        report_data_types::{ExportFormat, ReportType},
    },
    live_updates::{LiveUpdates, PushEvent, ReconnectPolicy},
    notifications::ConsoleNotifier,
    route_guard::{guard, GuardState, Page},
    session::{CredentialHandle, Session},
    widgets,
};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc::UnboundedReceiver;

/// Terminal client for the bartender administration API.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Base URL of the backend API
    #[arg(long, env = "BARTENDER_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,
    /// Push channel URL{n}[default: {api-url}/ws]
    #[arg(long, env = "BARTENDER_WS_URL")]
    ws_url: Option<String>,
    /// Where the remembered credential is kept{n}[default: <config dir>/bartender-admin/token]
    #[arg(long, env = "BARTENDER_TOKEN_FILE")]
    token_file: Option<PathBuf>,
    /// HTTP request timeout in seconds
    #[arg(long, default_value_t = 15)]
    timeout_secs: u64,
    /// First push channel reconnect delay in milliseconds
    #[arg(long, default_value_t = 1000, value_parser = clap::value_parser!(u64).range(1..))]
    reconnect_initial_ms: u64,
    /// Upper bound of the push channel reconnect delay in milliseconds
    #[arg(long, default_value_t = 30_000, value_parser = clap::value_parser!(u64).range(1..))]
    reconnect_max_ms: u64,
    /// Enable verbose logging (mostly request timings){n}[SETS env: RUST_LOG=debug]
    #[arg(short, long)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in with an administrator account
    Login {
        #[arg(short, long)]
        email: String,
        #[arg(short, long, env = "BARTENDER_PASSWORD", hide_env_values = true)]
        password: String,
        /// Keep the credential for later runs
        #[arg(short, long)]
        remember: bool,
    },
    /// Create an administrator account (the credential is always remembered)
    Register {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        email: String,
        #[arg(short, long, env = "BARTENDER_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(short, long)]
        confirm_password: String,
    },
    /// Forget the remembered credential
    Logout,
    /// Show the logged-in account
    Whoami,
    /// Summary counts, recent orders and popular drinks
    Dashboard {
        /// Keep the page open and reload on order updates
        #[arg(short, long)]
        watch: bool,
    },
    #[command(subcommand)]
    Ingredients(IngredientCmd),
    #[command(subcommand)]
    Recipes(RecipeCmd),
    #[command(subcommand)]
    Orders(OrderCmd),
    #[command(subcommand)]
    Reports(ReportCmd),
}

#[derive(Subcommand, Debug)]
enum IngredientCmd {
    List,
    Add {
        name: String,
        #[arg(long, default_value = "0")]
        stock: String,
        #[arg(long, default_value = "0")]
        min: String,
        #[arg(long, default_value_t = Unit::Ml)]
        unit: Unit,
        #[arg(long)]
        pump: Option<String>,
    },
    Edit {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        stock: Option<String>,
        #[arg(long)]
        min: Option<String>,
        #[arg(long)]
        unit: Option<Unit>,
        /// Empty string removes the pump assignment
        #[arg(long)]
        pump: Option<String>,
    },
    Restock {
        id: i64,
        amount: String,
    },
    Delete {
        id: i64,
        /// Confirm the deletion
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
enum RecipeCmd {
    List,
    Add {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        image_url: String,
        #[arg(long = "type", default_value_t = DrinkType::Standard)]
        drink_type: DrinkType,
        /// Recipe row as INGREDIENT_ID:AMOUNT, repeatable
        #[arg(short, long = "ingredient", value_parser = parse_recipe_row)]
        ingredients: Vec<(i64, String)>,
    },
    Edit {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        image_url: Option<String>,
        #[arg(long = "type")]
        drink_type: Option<DrinkType>,
        /// Replaces all rows when given; INGREDIENT_ID:AMOUNT, repeatable
        #[arg(short, long = "ingredient", value_parser = parse_recipe_row)]
        ingredients: Vec<(i64, String)>,
    },
    Delete {
        id: i64,
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
enum OrderCmd {
    List {
        #[arg(short, long)]
        watch: bool,
    },
    Show {
        id: i64,
    },
    /// Set the status: pending, preparing, completed or cancelled
    Status {
        id: i64,
        status: OrderStatus,
    },
}

#[derive(Subcommand, Debug)]
enum ReportCmd {
    Show {
        #[arg(short, long)]
        year: Option<i32>,
    },
    Export {
        /// popular-drinks, inventory, orders or monthly
        #[arg(long = "type", default_value_t = ReportType::PopularDrinks)]
        report_type: ReportType,
        /// pdf, csv or excel
        #[arg(long, default_value_t = ExportFormat::Pdf)]
        format: ExportFormat,
        /// YYYY-MM-DD [default: first day of the current month]
        #[arg(long)]
        from: Option<NaiveDate>,
        /// YYYY-MM-DD [default: today]
        #[arg(long)]
        to: Option<NaiveDate>,
        /// Directory the report is saved to
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },
}

fn parse_recipe_row(raw: &str) -> Result<(i64, String), String> {
    let (id, amount) = raw
        .split_once(':')
        .ok_or_else(|| format!("'{}' is not INGREDIENT_ID:AMOUNT", raw))?;
    let id = id
        .trim()
        .parse::<i64>()
        .map_err(|_| format!("'{}' is not an ingredient id", id))?;
    Ok((id, amount.trim().to_string()))
}

fn logger_init(verbose: bool) {
    if verbose {
        env::set_var("RUST_LOG", "debug");
    }

    pretty_env_logger::formatted_timed_builder()
        .filter_level(log::LevelFilter::Warn)
        .filter_module(
            "bartender_admin",
            if env::var(pretty_env_logger::env_logger::DEFAULT_FILTER_ENV).unwrap_or_default() == "debug" {
                log::LevelFilter::Debug
            } else {
                log::LevelFilter::Info
            },
        )
        .init();
}

struct App {
    config: Config,
    session: Arc<Session>,
    ctx: PageContext,
}

impl App {
    fn build(args: &Args) -> Result<Self> {
        if args.reconnect_max_ms < args.reconnect_initial_ms {
            bail!(
                "--reconnect-max-ms ({}) must not be below --reconnect-initial-ms ({})",
                args.reconnect_max_ms,
                args.reconnect_initial_ms
            );
        }
        let mut config = Config::new(&args.api_url).with_push_url(args.ws_url.clone());
        config.request_timeout = Duration::from_secs(args.timeout_secs);
        config.reconnect = ReconnectPolicy {
            initial: Duration::from_millis(args.reconnect_initial_ms),
            max: Duration::from_millis(args.reconnect_max_ms),
            ..ReconnectPolicy::default()
        };
        config.token_file = args.token_file.clone();

        let token_file = match &config.token_file {
            Some(path) => path.clone(),
            None => FileCredentialStore::default_path()?,
        };
        log::debug!("Credential file: {}", token_file.display());

        let credential = CredentialHandle::default();
        let client = Arc::new(ApiClient::new(config.clone(), credential.clone()).context("building HTTP client")?);
        let session = Arc::new(Session::new(
            client.clone(),
            Arc::new(FileCredentialStore::new(token_file)),
            credential,
        ));
        let ctx = PageContext::new(client, session.clone(), Arc::new(ConsoleNotifier));

        Ok(App { config, session, ctx })
    }

    /// Resolves the remembered credential; protected pages need an identity.
    async fn enter(&self, page: Page) -> Result<()> {
        self.session.init().await;
        match guard(&self.session) {
            GuardState::Render => {
                log::debug!("Entering {}", page.route());
                println!("== {} ==", page.title());
                Ok(())
            }
            GuardState::Loading => bail!("Identidad sin resolver: {}", widgets::spinner()),
            GuardState::RedirectToLogin => {
                bail!("No hay una sesión activa. Inicie sesión con `bartender-admin login`.")
            }
        }
    }

    /// Reloads the page on every pushed order update until Ctrl-C.
    async fn watch<F, Fut>(&self, on_event: F) -> Result<()>
    where
        F: Fn(PushEvent) -> Fut,
        Fut: std::future::Future<Output = ()>,
    {
        let (live, mut events): (LiveUpdates, UnboundedReceiver<PushEvent>) =
            LiveUpdates::open(self.config.push_url.clone(), self.config.reconnect);
        log::info!("Watching {} (Ctrl-C to stop)", self.config.push_url);

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => on_event(event).await,
                    None => break,
                },
                _ = tokio::signal::ctrl_c() => break,
            }
            if !self.session.is_authenticated() {
                log::warn!("Session ended while watching");
                break;
            }
        }

        live.close().await;
        Ok(())
    }
}

async fn run(args: Args) -> Result<bool> {
    let app = App::build(&args)?;

    match args.command {
        Command::Login {
            email,
            password,
            remember,
        } => {
            let form = LoginForm {
                email,
                password,
                remember,
            };
            let user = form.submit(&app.session, app.ctx.notifier.as_ref()).await;
            if let Some(user) = &user {
                println!("{} <{}> ({})", user.username, user.email, user.role);
            }
            Ok(user.is_some())
        }
        Command::Register {
            username,
            email,
            password,
            confirm_password,
        } => {
            let form = RegisterForm {
                username,
                email,
                password,
                confirm_password,
            };
            Ok(form.submit(&app.session, app.ctx.notifier.as_ref()).await.is_some())
        }
        Command::Logout => {
            app.session.logout();
            println!("Sesión cerrada");
            Ok(true)
        }
        Command::Whoami => {
            app.session.init().await;
            match app.session.identity() {
                Some(user) => {
                    println!("{} <{}> ({})", user.username, user.email, user.role);
                    Ok(true)
                }
                None => {
                    println!("No hay una sesión activa");
                    Ok(false)
                }
            }
        }
        Command::Dashboard { watch } => {
            app.enter(Page::Dashboard).await?;
            let page = DashboardController::new(app.ctx.clone());
            page.mount().await;
            print!("{}", page.render());
            if watch && Page::Dashboard.wants_live_updates() {
                let page = &page;
                app.watch(move |event| async move {
                    page.handle_push(event).await;
                    print!("{}", page.render());
                })
                .await?;
            }
            page.unmount();
            Ok(true)
        }
        Command::Ingredients(cmd) => {
            app.enter(Page::Ingredients).await?;
            let page = IngredientsController::new(app.ctx.clone());
            page.mount().await;
            let ok = run_ingredients(&page, cmd).await?;
            page.unmount();
            Ok(ok)
        }
        Command::Recipes(cmd) => {
            app.enter(Page::Recipes).await?;
            let page = RecipesController::new(app.ctx.clone());
            page.mount().await;
            let ok = run_recipes(&page, cmd).await?;
            page.unmount();
            Ok(ok)
        }
        Command::Orders(cmd) => {
            app.enter(Page::Orders).await?;
            let page = OrdersController::new(app.ctx.clone());
            page.mount().await;
            let ok = match cmd {
                OrderCmd::List { watch } => {
                    print!("{}", page.render());
                    if watch {
                        let page = &page;
                        app.watch(move |event| async move {
                            page.handle_push(event).await;
                            print!("{}", page.render());
                        })
                        .await?;
                    }
                    true
                }
                OrderCmd::Show { id } => {
                    if !page.open_details(id) {
                        bail!("No existe el pedido #{}", id);
                    }
                    if let Some(order) = page.details() {
                        print!("{}", OrdersController::render_details(&order));
                    }
                    page.close_details();
                    true
                }
                OrderCmd::Status { id, status } => {
                    if !page.open_status(id) {
                        bail!("No existe el pedido #{}", id);
                    }
                    page.select_status(status);
                    if let Some(select) = page.render_status_modal() {
                        print!("{}", select);
                    }
                    let ok = page.submit_status().await;
                    print!("{}", page.render());
                    ok
                }
            };
            page.unmount();
            Ok(ok)
        }
        Command::Reports(cmd) => {
            app.enter(Page::Reports).await?;
            let page = ReportsController::new(app.ctx.clone());
            let ok = match cmd {
                ReportCmd::Show { year } => {
                    let current = page.year();
                    if let Some(year) = year {
                        if !year_options(current).contains(&year) {
                            bail!("Año fuera de rango: {}", year);
                        }
                        page.set_year(year).await;
                    }
                    page.mount().await;
                    print!("{}", page.render_year_select());
                    print!("{}", page.render());
                    true
                }
                ReportCmd::Export {
                    report_type,
                    format,
                    from,
                    to,
                    out,
                } => {
                    page.open_export(Local::now().date_naive());
                    page.update_export(|form| {
                        form.report_type = report_type;
                        form.format = format;
                        if let Some(from) = from {
                            form.start_date = from;
                        }
                        if let Some(to) = to {
                            form.end_date = to;
                        }
                    });
                    match page.submit_export(&out).await {
                        Some(path) => {
                            println!("{}", path.display());
                            true
                        }
                        None => false,
                    }
                }
            };
            page.unmount();
            Ok(ok)
        }
    }
}

async fn run_ingredients(page: &IngredientsController, cmd: IngredientCmd) -> Result<bool> {
    let ok = match cmd {
        IngredientCmd::List => true,
        IngredientCmd::Add {
            name,
            stock,
            min,
            unit,
            pump,
        } => {
            page.open_add();
            page.update_form(|form| {
                form.name = name;
                form.current_stock = stock;
                form.min_stock_level = min;
                form.unit = unit;
                form.pump_id = pump.unwrap_or_default();
            });
            page.submit_form().await
        }
        IngredientCmd::Edit {
            id,
            name,
            stock,
            min,
            unit,
            pump,
        } => {
            if !page.open_edit(id) {
                bail!("No existe el ingrediente #{}", id);
            }
            page.update_form(|form| {
                if let Some(name) = name {
                    form.name = name;
                }
                if let Some(stock) = stock {
                    form.current_stock = stock;
                }
                if let Some(min) = min {
                    form.min_stock_level = min;
                }
                if let Some(unit) = unit {
                    form.unit = unit;
                }
                if let Some(pump) = pump {
                    form.pump_id = pump;
                }
            });
            page.submit_form().await
        }
        IngredientCmd::Restock { id, amount } => {
            if !page.open_restock(id) {
                bail!("No existe el ingrediente #{}", id);
            }
            page.set_restock_amount(&amount);
            page.submit_restock().await
        }
        IngredientCmd::Delete { id, yes } => {
            page.request_delete(id);
            if !yes {
                page.cancel_delete();
                println!("Use --yes para confirmar la eliminación del ingrediente #{}", id);
                return Ok(false);
            }
            page.confirm_delete().await
        }
    };
    print!("{}", page.render_field_errors());
    print!("{}", page.render());
    Ok(ok)
}

fn fill_rows(page: &RecipesController, rows: &[(i64, String)]) -> Result<()> {
    page.update_form(|form| form.rows.clear());
    for (idx, (ingredient_id, amount)) in rows.iter().enumerate() {
        if !page.add_row() {
            return Ok(());
        }
        if !page.select_row_ingredient(idx, *ingredient_id) {
            bail!("No existe el ingrediente #{}", ingredient_id);
        }
        page.set_row_amount(idx, amount);
    }
    Ok(())
}

async fn run_recipes(page: &RecipesController, cmd: RecipeCmd) -> Result<bool> {
    let ok = match cmd {
        RecipeCmd::List => true,
        RecipeCmd::Add {
            name,
            description,
            image_url,
            drink_type,
            ingredients,
        } => {
            page.open_add();
            page.update_form(|form| {
                form.name = name;
                form.description = description;
                form.image_url = image_url;
                form.drink_type = drink_type;
            });
            fill_rows(page, &ingredients)?;
            page.submit_form().await
        }
        RecipeCmd::Edit {
            id,
            name,
            description,
            image_url,
            drink_type,
            ingredients,
        } => {
            if !page.open_edit(id) {
                bail!("No existe la receta #{}", id);
            }
            page.update_form(|form| {
                if let Some(name) = name {
                    form.name = name;
                }
                if let Some(description) = description {
                    form.description = description;
                }
                if let Some(image_url) = image_url {
                    form.image_url = image_url;
                }
                if let Some(drink_type) = drink_type {
                    form.drink_type = drink_type;
                }
            });
            if !ingredients.is_empty() {
                fill_rows(page, &ingredients)?;
            }
            page.submit_form().await
        }
        RecipeCmd::Delete { id, yes } => {
            page.request_delete(id);
            if !yes {
                page.cancel_delete();
                println!("Use --yes para confirmar la eliminación de la receta #{}", id);
                return Ok(false);
            }
            page.confirm_delete().await
        }
    };
    print!("{}", page.render_field_errors());
    print!("{}", page.render());
    Ok(ok)
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    logger_init(args.verbose);

    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            log::error!("{:#}", e);
            eprintln!("✘ {:#}", e);
            ExitCode::FAILURE
        }
    }
}
