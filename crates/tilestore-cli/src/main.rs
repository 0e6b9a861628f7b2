// ============================================================================
// tilestore - command-line frontend for the tile/floor catalog
// ============================================================================
// Usage:
//   tilestore login --email EMAIL           Log in (password read from stdin)
//   tilestore products list [--category C]  Browse the catalog
//   tilestore wishlist convert [--exclude ID] [--notes TEXT]
//                                           Turn the wishlist into a reservation
//   tilestore reservations mine             List my reservations
//   tilestore reservations export --format xlsx
//                                           Admin export
//   tilestore notifications watch           Admin bell (Ctrl-C to stop)
// ============================================================================

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use tilestore_core::ui::forms::{LoginForm, PasswordChangeForm, RegistrationForm};
use tilestore_core::ui::reservations::ReservationBoard;
use tilestore_core::ui::selection::{convert_selection, ReservationSelection};
use tilestore_core::ui::format_timestamp;
use tilestore_core::{
    ApiClient, ClientConfig, ClientError, CreateReservationRequest, ExportFormat, ExportQuery,
    NotificationPoller, ProductInput, ProductQuery, RegisterOutcome, Reservation,
    ReservationLine, ReservationScope, ReservationState, Role, SessionContext, UserUpdate,
    WishlistItem,
};

/// Tile & floor store client
#[derive(Parser)]
#[command(name = "tilestore", version, about = "Browse the catalog and manage reservations")]
struct Cli {
    /// API base URL (default: TILESTORE_API_URL or http://localhost:8000)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Path to the session file (default: ~/.tilestore/session.redb)
    #[arg(long, global = true)]
    session_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session
    Login {
        #[arg(long)]
        email: String,
        /// Omit to read it from stdin
        #[arg(long)]
        password: Option<String>,
    },

    /// End the session (always clears local state)
    Logout,

    /// Create an account
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },

    /// Request a password reset email
    ForgotPassword {
        #[arg(long)]
        email: String,
    },

    /// Show the logged-in user
    Whoami,

    /// Change the password of the logged-in user
    ChangePassword,

    /// Catalog browsing and admin product management
    Products {
        #[command(subcommand)]
        command: ProductCommands,
    },

    /// List product categories
    Categories,

    /// List product tags
    Tags,

    /// Saved product/variant selections
    Wishlist {
        #[command(subcommand)]
        command: WishlistCommands,
    },

    /// Reservations
    Reservations {
        #[command(subcommand)]
        command: ReservationCommands,
    },

    /// Per-variant inventory
    Inventory {
        #[command(subcommand)]
        command: InventoryCommands,
    },

    /// Admin user management
    Users {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Admin notifications
    Notifications {
        #[command(subcommand)]
        command: NotificationCommands,
    },
}

#[derive(Subcommand)]
enum ProductCommands {
    List {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        limit: Option<u32>,
    },
    Search {
        term: String,
    },
    Show {
        id: String,
    },
    /// Admin: create from a JSON file
    Create {
        #[arg(long)]
        file: PathBuf,
    },
    /// Admin: replace from a JSON file
    Update {
        id: String,
        #[arg(long)]
        file: PathBuf,
    },
    /// Admin
    Delete {
        id: String,
    },
}

#[derive(Subcommand)]
enum WishlistCommands {
    List,
    Add {
        product_id: String,
        variant_id: String,
        #[arg(long, default_value = "1")]
        quantity: u32,
    },
    /// Change a quantity (clamped to stock)
    Update {
        item_id: String,
        quantity: u32,
    },
    Remove {
        item_id: String,
    },
    Clear,
    /// Reserve every available item except the excluded ones
    Convert {
        /// Item ids to leave out (repeatable)
        #[arg(long)]
        exclude: Vec<String>,
        #[arg(long)]
        notes: Option<String>,
    },
}

#[derive(Subcommand)]
enum ReservationCommands {
    Mine,
    /// Admin: all reservations
    List {
        /// pendiente, aprobada, rechazada, cancelada, expirada
        #[arg(long)]
        state: Option<String>,
    },
    Show {
        id: String,
    },
    /// Reserve variants directly: --item VARIANT_ID:QTY (repeatable)
    Create {
        #[arg(long = "item", required = true)]
        items: Vec<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    Cancel {
        id: String,
    },
    /// Admin
    Approve {
        id: String,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Admin
    Reject {
        id: String,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Admin: download as csv or xlsx
    Export {
        #[arg(long, default_value = "csv")]
        format: String,
        #[arg(long)]
        state: Option<String>,
        /// YYYY-MM-DD
        #[arg(long)]
        date_from: Option<String>,
        /// YYYY-MM-DD
        #[arg(long)]
        date_to: Option<String>,
        /// Default: reservas_<YYYYMMDD>.<ext>
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum InventoryCommands {
    Show {
        variant_id: String,
    },
    /// Admin: signed change to total stock
    Adjust {
        variant_id: String,
        #[arg(allow_negative_numbers = true)]
        delta: i64,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Admin
    Retain {
        variant_id: String,
        quantity: u32,
    },
    /// Admin
    Release {
        variant_id: String,
        quantity: u32,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    List,
    Update {
        id: String,
        /// cliente or admin
        #[arg(long)]
        role: Option<String>,
        #[arg(long)]
        active: Option<bool>,
    },
    Delete {
        id: String,
    },
}

#[derive(Subcommand)]
enum NotificationCommands {
    List,
    Read {
        id: String,
    },
    /// Poll the unread count until Ctrl-C
    Watch,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tilestore_core=info,tilestore=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        match e.downcast_ref::<ClientError>() {
            Some(ClientError::Validation(errors)) => {
                for err in errors {
                    eprintln!("✗ {}: {}", err.field, err.message);
                }
            }
            Some(client_err) => eprintln!("✗ {}", client_err.toast()),
            None => eprintln!("✗ {:#}", e),
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = ClientConfig::from_env();
    if let Some(url) = cli.api_url {
        config.api_url = url.trim_end_matches('/').to_string();
    }
    if let Some(path) = cli.session_path {
        config.session_path = Some(path);
    }

    let session = SessionContext::open(config.session_path.as_deref())?;
    let api = Arc::new(ApiClient::new(&config, session)?);

    match cli.command {
        Commands::Login { email, password } => cmd_login(&api, email, password).await,
        Commands::Logout => {
            api.logout().await?;
            println!("Sesión cerrada.");
            Ok(())
        }
        Commands::Register { name, email } => cmd_register(&api, name, email).await,
        Commands::ForgotPassword { email } => {
            let message = api.forgot_password(&email).await?;
            println!(
                "{}",
                message.unwrap_or_else(|| "Si el email existe, recibirás instrucciones.".into())
            );
            Ok(())
        }
        Commands::Whoami => cmd_whoami(&api).await,
        Commands::ChangePassword => cmd_change_password(&api).await,
        Commands::Products { command } => cmd_products(&api, command).await,
        Commands::Categories => print_names(api.categories().await?),
        Commands::Tags => print_names(api.tags().await?),
        Commands::Wishlist { command } => cmd_wishlist(&api, command).await,
        Commands::Reservations { command } => cmd_reservations(&api, command).await,
        Commands::Inventory { command } => cmd_inventory(&api, command).await,
        Commands::Users { command } => cmd_users(&api, command).await,
        Commands::Notifications { command } => cmd_notifications(api, &config, command).await,
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn read_secret(prompt: &str) -> Result<String> {
    eprint!("{}: ", prompt);
    std::io::stderr().flush()?;
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn parse_state(s: &str) -> Result<ReservationState> {
    s.parse().map_err(anyhow::Error::msg)
}

fn parse_item(raw: &str) -> Result<ReservationLine> {
    let (variant_id, quantity) = raw
        .rsplit_once(':')
        .with_context(|| format!("Invalid item '{}'. Expected VARIANT_ID:QTY", raw))?;
    let quantity = quantity
        .parse()
        .with_context(|| format!("Invalid quantity in '{}'", raw))?;
    Ok(ReservationLine {
        variant_id: variant_id.to_string(),
        quantity,
    })
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

fn print_names(names: Vec<String>) -> Result<()> {
    if names.is_empty() {
        println!("(ninguno)");
    }
    for name in names {
        println!("{}", name);
    }
    Ok(())
}

fn print_wishlist_line(item: &WishlistItem) {
    println!(
        "  {:<24}  {:<28}  {:<10}  x{:<4}  stock {}",
        item.item_id,
        truncate(&item.name, 28),
        item.size(),
        item.quantity,
        item.stock
    );
}

fn print_reservations(reservations: &[Reservation]) {
    if reservations.is_empty() {
        println!("No hay reservas.");
        return;
    }
    println!(
        "{:<24}  {:<14}  {:>6}  {:<20}  {}",
        "ID", "ESTADO", "UDS", "CREADA", "EXPIRA"
    );
    println!("{}", "-".repeat(90));
    for r in reservations {
        println!(
            "{:<24}  {:<14}  {:>6}  {:<20}  {}",
            r.id,
            format!("{} {}", r.state.icon(), r.state.label()),
            r.total_units(),
            format_timestamp(r.created_at.as_deref()),
            format_timestamp(r.expires_at.as_deref()),
        );
    }
    println!("\nTotal: {} reservas", reservations.len());
}

fn print_reservation_detail(r: &Reservation) {
    println!("Reserva {}", r.id);
    println!("Estado:   {} {}", r.state.icon(), r.state.label());
    println!("Creada:   {}", format_timestamp(r.created_at.as_deref()));
    println!("Expira:   {}", format_timestamp(r.expires_at.as_deref()));
    if let Some(notes) = &r.notes {
        println!("Notas:    {}", notes);
    }
    if let Some(notes) = &r.admin_notes {
        println!("Admin:    {}", notes);
    }
    println!();
    for item in &r.items {
        println!(
            "  {:<30}  {:<12}  x{}",
            truncate(&item.product_name, 30),
            item.variant_name,
            item.quantity
        );
    }
    if r.state.can_cancel() {
        println!("\nPuede cancelarse con: tilestore reservations cancel {}", r.id);
    }
}

// ============================================================================
// Commands
// ============================================================================

async fn cmd_login(api: &ApiClient, email: String, password: Option<String>) -> Result<()> {
    let password = match password {
        Some(p) => p,
        None => read_secret("Contraseña")?,
    };
    let session = api.login(&LoginForm { email, password }).await?;
    match &session.user {
        Some(user) => println!("Hola, {} ({})", user.name, user.role.as_str()),
        None => println!("Sesión iniciada."),
    }
    Ok(())
}

async fn cmd_register(api: &ApiClient, name: String, email: String) -> Result<()> {
    let password = read_secret("Contraseña")?;
    let confirm_password = read_secret("Repite la contraseña")?;
    let form = RegistrationForm {
        name,
        email,
        password,
        confirm_password,
    };
    match api.register(&form).await? {
        RegisterOutcome::LoggedIn(_) => println!("Cuenta creada. Sesión iniciada."),
        RegisterOutcome::Created { message } => println!(
            "{}",
            message.unwrap_or_else(|| "Cuenta creada. Ya puedes iniciar sesión.".into())
        ),
    }
    Ok(())
}

async fn cmd_whoami(api: &ApiClient) -> Result<()> {
    let user = api.me().await?;
    println!("{} <{}>", user.name, user.email);
    println!("Rol:     {}", user.role.as_str());
    println!("Activo:  {}", if user.active { "sí" } else { "no" });
    if let Some(path) = api.session().await.store_path() {
        println!("Sesión:  {}", path.display());
    }
    Ok(())
}

async fn cmd_change_password(api: &ApiClient) -> Result<()> {
    let form = PasswordChangeForm {
        current_password: read_secret("Contraseña actual")?,
        new_password: read_secret("Nueva contraseña")?,
        confirm_password: read_secret("Repite la nueva contraseña")?,
    };
    let message = api.change_password(&form).await?;
    println!("{}", message.unwrap_or_else(|| "Contraseña actualizada.".into()));
    Ok(())
}

async fn cmd_products(api: &ApiClient, command: ProductCommands) -> Result<()> {
    match command {
        ProductCommands::List {
            category,
            page,
            limit,
        } => {
            let products = api
                .list_products(&ProductQuery {
                    page,
                    limit,
                    category,
                })
                .await?;
            print_products(&products);
        }
        ProductCommands::Search { term } => {
            let products = api.search_products(&term).await?;
            print_products(&products);
        }
        ProductCommands::Show { id } => {
            let product = api.product(&id).await?;
            println!("{} ({})", product.name, product.category);
            if !product.description.is_empty() {
                println!("{}", product.description);
            }
            if !product.tags.is_empty() {
                println!("Etiquetas: {}", product.tags.join(", "));
            }
            println!();
            for variant in &product.variants {
                let badge = match api.variant_inventory(&variant.id).await {
                    Ok(record) => record.status_message(),
                    Err(e) => {
                        tracing::warn!("Inventory lookup failed for {}: {}", variant.id, e);
                        "-".to_string()
                    }
                };
                println!(
                    "  {:<24}  {:<12}  {:>10.2} €  {}",
                    variant.id, variant.size, variant.price, badge
                );
            }
        }
        ProductCommands::Create { file } => {
            let input = read_product_input(&file)?;
            let product = api.create_product(&input).await?;
            println!("✓ Producto creado: {}", product.id);
        }
        ProductCommands::Update { id, file } => {
            let input = read_product_input(&file)?;
            let product = api.update_product(&id, &input).await?;
            println!("✓ Producto actualizado: {}", product.id);
        }
        ProductCommands::Delete { id } => {
            api.delete_product(&id).await?;
            println!("✓ Producto eliminado: {}", id);
        }
    }
    Ok(())
}

fn read_product_input(path: &Path) -> Result<ProductInput> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid product JSON in {}", path.display()))
}

fn print_products(products: &[tilestore_core::Product]) {
    if products.is_empty() {
        println!("No se encontraron productos.");
        return;
    }
    println!("{:<24}  {:<32}  {:<16}  {}", "ID", "NOMBRE", "CATEGORÍA", "DESDE");
    println!("{}", "-".repeat(90));
    for p in products {
        let price = p
            .price_from()
            .map(|v| format!("{:.2} €", v))
            .unwrap_or_else(|| "-".into());
        println!(
            "{:<24}  {:<32}  {:<16}  {}",
            p.id,
            truncate(&p.name, 32),
            truncate(&p.category, 16),
            price
        );
    }
    println!("\nTotal: {} productos", products.len());
}

async fn cmd_wishlist(api: &ApiClient, command: WishlistCommands) -> Result<()> {
    match command {
        WishlistCommands::List => {
            let selection = ReservationSelection::new(api.wishlist().await?);
            let available = selection.available();
            let unavailable = selection.unavailable();
            if available.is_empty() && unavailable.is_empty() {
                println!("Tu lista de deseos está vacía.");
                return Ok(());
            }
            println!("Disponibles ({}):", available.len());
            available.into_iter().for_each(print_wishlist_line);
            if !unavailable.is_empty() {
                println!("No disponibles ({}):", unavailable.len());
                unavailable.into_iter().for_each(print_wishlist_line);
            }
        }
        WishlistCommands::Add {
            product_id,
            variant_id,
            quantity,
        } => {
            api.add_to_wishlist(&product_id, &variant_id, quantity).await?;
            println!("✓ Añadido a la lista de deseos");
        }
        WishlistCommands::Update { item_id, quantity } => {
            let items = api.wishlist().await?;
            let item = items
                .iter()
                .find(|i| i.item_id == item_id)
                .ok_or_else(|| ClientError::invalid("item_id", "El producto no está en tu lista"))?;
            let applied = api.update_wishlist_quantity(item, quantity).await?;
            if applied != quantity {
                println!("Cantidad ajustada al stock disponible: {}", applied);
            } else {
                println!("✓ Cantidad actualizada: {}", applied);
            }
        }
        WishlistCommands::Remove { item_id } => {
            api.remove_from_wishlist(&item_id).await?;
            println!("✓ Eliminado de la lista de deseos");
        }
        WishlistCommands::Clear => {
            api.clear_wishlist().await?;
            println!("✓ Lista de deseos vaciada");
        }
        WishlistCommands::Convert { exclude, notes } => {
            let mut selection = ReservationSelection::new(api.wishlist().await?);
            for id in &exclude {
                if selection.is_selected(id) {
                    selection.toggle(id);
                }
            }
            selection.set_notes(notes);

            let unavailable = selection.unavailable();
            if !unavailable.is_empty() {
                println!("Se omiten {} producto(s) no disponibles:", unavailable.len());
                unavailable.into_iter().for_each(print_wishlist_line);
            }

            let report = convert_selection(api, &selection).await?;
            for line in &report.dropped {
                let label = if line.name.is_empty() { &line.item_id } else { &line.name };
                println!("  omitido {}: {}", label, line.reason.describe());
            }
            println!(
                "✓ {}",
                report
                    .outcome
                    .message
                    .clone()
                    .unwrap_or_else(|| "Reserva creada".into())
            );
            if let Some(reservation) = &report.outcome.reservation {
                println!(
                    "Reserva {} ({} {}), {} unidades",
                    reservation.id,
                    reservation.state.icon(),
                    reservation.state.label(),
                    reservation.total_units()
                );
            }
        }
    }
    Ok(())
}

async fn cmd_reservations(api: &ApiClient, command: ReservationCommands) -> Result<()> {
    match command {
        ReservationCommands::Mine => print_reservations(&api.my_reservations().await?),
        ReservationCommands::List { state } => {
            let state = state.as_deref().map(parse_state).transpose()?;
            print_reservations(&api.list_reservations(state).await?);
        }
        ReservationCommands::Show { id } => print_reservation_detail(&api.reservation(&id).await?),
        ReservationCommands::Create { items, notes } => {
            let items = items
                .iter()
                .map(|raw| parse_item(raw))
                .collect::<Result<Vec<_>>>()?;
            let outcome = api
                .create_reservation(&CreateReservationRequest { items, notes })
                .await?;
            println!("✓ {}", outcome.message.unwrap_or_else(|| "Reserva creada".into()));
            if let Some(r) = outcome.reservation {
                println!("Reserva {} ({})", r.id, r.state.label());
            }
        }
        ReservationCommands::Cancel { id } => {
            board_action(api, ReservationScope::Mine, &id, BoardAction::Cancel).await?;
            println!("✓ Reserva {} cancelada", id);
        }
        ReservationCommands::Approve { id, notes } => {
            let scope = ReservationScope::All { state: None };
            board_action(api, scope, &id, BoardAction::Approve(notes)).await?;
            println!("✓ Reserva {} aprobada", id);
        }
        ReservationCommands::Reject { id, notes } => {
            let scope = ReservationScope::All { state: None };
            board_action(api, scope, &id, BoardAction::Reject(notes)).await?;
            println!("✓ Reserva {} rechazada", id);
        }
        ReservationCommands::Export {
            format,
            state,
            date_from,
            date_to,
            output,
        } => {
            let format: ExportFormat = format.parse().map_err(anyhow::Error::msg)?;
            let state = state.as_deref().map(parse_state).transpose()?;
            let query =
                ExportQuery::from_form(format, state, date_from.as_deref(), date_to.as_deref())?;
            let bytes = api.export_reservations(&query).await?;
            let path = output.unwrap_or_else(|| query.default_filename(Utc::now().date_naive()));
            let written = tilestore_core::export::write_export(&path, &bytes).await?;
            println!("✓ {} bytes escritos en {}", written, path.display());
        }
    }
    Ok(())
}

enum BoardAction {
    Cancel,
    Approve(Option<String>),
    Reject(Option<String>),
}

/// Load the board for `scope`, run one action through it, print the new state
async fn board_action(
    api: &ApiClient,
    scope: ReservationScope,
    id: &str,
    action: BoardAction,
) -> Result<()> {
    let board = ReservationBoard::new(scope);
    board.reload(api).await?;
    match action {
        BoardAction::Cancel => board.cancel(api, id).await?,
        BoardAction::Approve(notes) => board.approve(api, id, notes).await?,
        BoardAction::Reject(notes) => board.reject(api, id, notes).await?,
    }
    if let Some(r) = board.find(id).await {
        println!("Estado actual: {} {}", r.state.icon(), r.state.label());
    }
    Ok(())
}

async fn cmd_inventory(api: &ApiClient, command: InventoryCommands) -> Result<()> {
    let record = match command {
        InventoryCommands::Show { variant_id } => api.variant_inventory(&variant_id).await?,
        InventoryCommands::Adjust {
            variant_id,
            delta,
            reason,
        } => api.adjust_inventory(&variant_id, delta, reason).await?,
        InventoryCommands::Retain {
            variant_id,
            quantity,
        } => api.retain_inventory(&variant_id, quantity).await?,
        InventoryCommands::Release {
            variant_id,
            quantity,
        } => api.release_inventory(&variant_id, quantity).await?,
    };
    println!("Total:       {}", record.stock_total);
    println!("Retenido:    {}", record.stock_retenido);
    println!("Disponible:  {}", record.stock_disponible);
    println!("Estado:      {}", record.status_message());
    Ok(())
}

async fn cmd_users(api: &ApiClient, command: UserCommands) -> Result<()> {
    match command {
        UserCommands::List => {
            let users = api.list_users().await?;
            println!("{:<24}  {:<32}  {:<8}  {:<6}  {}", "ID", "EMAIL", "ROL", "ACTIVO", "ALTA");
            println!("{}", "-".repeat(90));
            for u in &users {
                println!(
                    "{:<24}  {:<32}  {:<8}  {:<6}  {}",
                    u.id,
                    truncate(&u.email, 32),
                    u.role.as_str(),
                    if u.active { "sí" } else { "no" },
                    format_timestamp(u.created_at.as_deref()),
                );
            }
            println!("\nTotal: {} usuarios", users.len());
        }
        UserCommands::Update { id, role, active } => {
            let role = role
                .as_deref()
                .map(|r| r.parse::<Role>().map_err(anyhow::Error::msg))
                .transpose()?;
            api.update_user(&id, &UserUpdate { role, active }).await?;
            println!("✓ Usuario {} actualizado", id);
        }
        UserCommands::Delete { id } => {
            api.delete_user(&id).await?;
            println!("✓ Usuario {} eliminado", id);
        }
    }
    Ok(())
}

async fn cmd_notifications(
    api: Arc<ApiClient>,
    config: &ClientConfig,
    command: NotificationCommands,
) -> Result<()> {
    match command {
        NotificationCommands::List => {
            let notifications = api.notifications().await?;
            if notifications.is_empty() {
                println!("Sin notificaciones.");
            }
            for n in &notifications {
                println!(
                    "{} {:<24}  {:<20}  {}",
                    if n.read { " " } else { "●" },
                    n.id,
                    format_timestamp(n.created_at.as_deref()),
                    n.message
                );
            }
        }
        NotificationCommands::Read { id } => {
            api.mark_notification_read(&id).await?;
            println!("✓ Notificación marcada como leída");
        }
        NotificationCommands::Watch => {
            // Fail fast on a missing admin session instead of warning every tick
            let initial = api.unread_count().await?;
            println!("🔔 {}", initial);

            let (poller, mut counts) =
                NotificationPoller::starting_at(api, config.notify_interval(), initial);
            let (stop, shutdown) = watch::channel(false);
            let handle = poller.spawn(shutdown);

            loop {
                tokio::select! {
                    changed = counts.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        println!("🔔 {}", *counts.borrow_and_update());
                    }
                    _ = tokio::signal::ctrl_c() => {
                        break;
                    }
                }
            }
            stop.send(true).ok();
            handle.await.context("Notification poller panicked")?;
        }
    }
    Ok(())
}
