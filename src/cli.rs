use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use crate::config::Config;
use crate::db;
use crate::error::CliError;
use crate::i18n::{self, Locale};
use crate::models::{BotType, SheerIdSettings};
use crate::navigation::{self, Sidebar};
use crate::pages::bot_detail::BotDetailPage;
use crate::pages::bots::{BotsPage, NewBotForm};
use crate::pages::commands::CommandsPage;
use crate::pages::products::{ProductForm, ProductsPage};
use crate::pages::transactions::{StatusFilter, TransactionsPage};
use crate::pages::users::UsersPage;
use crate::pages::verification::{ProxyForm, VerificationPage};
use crate::pages::verification_history::VerificationHistoryPage;
use crate::services::session::inspect_token;
use crate::services::{ApiClient, ApiResponse, LocalStorage, PollEvent, PollSchedule};

/// Bot-store admin dashboard: the `/api` proxy server plus operator commands.
#[derive(Parser)]
#[command(name = "botstore-dashboard")]
#[command(version)]
#[command(about = "Admin dashboard for Telegram store and SheerID bots", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Print `{data|error}` JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Backend API base URL, `/api` included (overrides API_BASE_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP server with the `/api` reverse proxy
    Serve,

    /// Log in and keep the access token
    Login {
        #[arg(short, long)]
        email: String,
        #[arg(short, long, env = "DASHBOARD_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create an operator account and log in
    Register {
        #[arg(short, long)]
        email: String,
        #[arg(short, long, env = "DASHBOARD_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(short, long)]
        name: String,
    },

    /// Forget the stored access token
    Logout,

    /// Show the logged-in operator
    Whoami,

    /// Print the sidebar for a dashboard path
    Nav {
        #[arg(long, default_value = navigation::DASHBOARD)]
        path: String,
        /// Fold or unfold a section (store, verification)
        #[arg(long)]
        toggle: Option<String>,
    },

    /// Manage bots
    Bots {
        #[command(subcommand)]
        action: BotCommands,
    },

    /// Manage products of a store bot
    Products {
        #[command(flatten)]
        bot: BotArg,
        #[command(subcommand)]
        action: ProductCommands,
    },

    /// List transactions of a store bot
    Transactions {
        #[command(flatten)]
        bot: BotArg,
        /// all, pending, paid, completed or cancelled
        #[arg(short, long, default_value = "all")]
        status: StatusFilter,
    },

    /// List users of a store bot
    Users {
        #[command(flatten)]
        bot: BotArg,
        /// Case-insensitive match on username or first name
        #[arg(short, long, default_value = "")]
        search: String,
    },

    /// Configure command replies of a store bot
    Commands {
        #[command(flatten)]
        bot: BotArg,
        #[command(subcommand)]
        action: CommandCommands,
    },

    /// Broadcast messages to a bot's users
    Broadcast {
        #[arg(short, long)]
        bot: i64,
        #[command(subcommand)]
        action: BroadcastCommands,
    },

    /// Submit SheerID verifications
    Verify {
        #[command(subcommand)]
        action: VerifyCommands,
    },

    /// Verification history and live status
    History {
        #[command(subcommand)]
        action: HistoryCommands,
    },

    /// Saved proxies used for verifications
    Proxies {
        #[command(subcommand)]
        action: ProxyCommands,
    },

    /// SheerID settings
    Settings {
        #[command(subcommand)]
        action: SettingsCommands,
    },
}

#[derive(Args)]
pub struct BotArg {
    /// Store bot id (defaults to the first store bot)
    #[arg(short, long)]
    pub bot: Option<i64>,
}

#[derive(Subcommand)]
pub enum BotCommands {
    /// List all bots
    List,
    /// Add a bot by its Telegram token
    Add {
        #[arg(short, long)]
        token: String,
        #[arg(short = 'k', long = "type", default_value = "store")]
        bot_type: BotType,
        #[arg(long)]
        slug: Option<String>,
        #[arg(long)]
        api_key: Option<String>,
    },
    /// Show a bot with its stats
    Show { id: i64 },
    /// Change a bot's settings
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(short = 'k', long = "type")]
        bot_type: Option<BotType>,
        /// Empty string clears the slug
        #[arg(long)]
        slug: Option<String>,
        #[arg(long)]
        api_key: Option<String>,
        #[arg(long)]
        active: Option<bool>,
    },
    /// Delete a bot
    Delete { id: i64 },
    /// Test Pakasir credentials, falling back to a bot's stored ones
    TestPakasir {
        #[arg(long)]
        bot: Option<i64>,
        #[arg(long)]
        slug: Option<String>,
        #[arg(long)]
        api_key: Option<String>,
    },
}

#[derive(Args)]
pub struct ProductFields {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub price: Option<String>,
    #[arg(long)]
    pub stock: Option<String>,
    #[arg(long)]
    pub category: Option<String>,
}

impl ProductFields {
    fn apply(self, form: &mut ProductForm) {
        let ProductFields {
            name,
            description,
            price,
            stock,
            category,
        } = self;
        let fields = [
            (name, &mut form.name),
            (description, &mut form.description),
            (price, &mut form.price),
            (stock, &mut form.stock),
            (category, &mut form.category),
        ];
        for (value, slot) in fields {
            if let Some(value) = value {
                *slot = value;
            }
        }
    }
}

#[derive(Subcommand)]
pub enum ProductCommands {
    List,
    Add {
        #[command(flatten)]
        fields: ProductFields,
    },
    Edit {
        id: i64,
        #[command(flatten)]
        fields: ProductFields,
    },
    Delete {
        id: i64,
    },
    /// Add stock items (one delivered item each)
    Stock {
        id: i64,
        #[arg(required = true)]
        items: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum CommandCommands {
    List,
    /// Save the reply text of a command
    Set { name: String, text: String },
    /// Enable or disable a command
    Toggle { name: String },
}

#[derive(Subcommand)]
pub enum BroadcastCommands {
    List,
    Send { message: String },
}

#[derive(Subcommand)]
pub enum VerifyCommands {
    /// List verification types and their cost
    Types,
    CheckLink {
        url: String,
        #[arg(short = 'k', long = "type")]
        verify_type: Option<String>,
    },
    Submit {
        url: String,
        #[arg(short = 'k', long = "type")]
        verify_type: Option<String>,
    },
    /// Current outgoing IP as seen by the backend
    Ip,
}

#[derive(Subcommand)]
pub enum HistoryCommands {
    List,
    Show {
        id: i64,
    },
    /// Follow a verification's live status until interrupted
    Watch {
        id: i64,
        #[arg(long)]
        stop_on_terminal: bool,
    },
}

#[derive(Args)]
pub struct ProxyFields {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub host: Option<String>,
    #[arg(long)]
    pub port: Option<String>,
    #[arg(long)]
    pub username: Option<String>,
    #[arg(long)]
    pub password: Option<String>,
}

impl ProxyFields {
    fn apply(self, form: &mut ProxyForm) {
        let ProxyFields {
            name,
            host,
            port,
            username,
            password,
        } = self;
        let fields = [
            (name, &mut form.name),
            (host, &mut form.host),
            (port, &mut form.port),
            (username, &mut form.username),
            (password, &mut form.password),
        ];
        for (value, slot) in fields {
            if let Some(value) = value {
                *slot = value;
            }
        }
    }
}

#[derive(Subcommand)]
pub enum ProxyCommands {
    List,
    Add {
        #[command(flatten)]
        fields: ProxyFields,
    },
    Update {
        id: i64,
        #[command(flatten)]
        fields: ProxyFields,
    },
    Delete {
        id: i64,
    },
    /// Make this the only active proxy
    Activate {
        id: i64,
    },
    Deactivate {
        id: i64,
    },
    /// Test a saved proxy
    Test {
        id: i64,
    },
    /// Test an unsaved proxy
    Check {
        #[arg(long)]
        host: String,
        #[arg(long)]
        port: u16,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        password: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum SettingsCommands {
    Show,
    Set {
        #[arg(long)]
        proxy_enabled: Option<bool>,
        #[arg(long)]
        proxy_host: Option<String>,
        #[arg(long)]
        proxy_port: Option<u16>,
        #[arg(long)]
        proxy_username: Option<String>,
        #[arg(long)]
        proxy_password: Option<String>,
        #[arg(long)]
        default_points_cost: Option<i64>,
    },
}

/// Prints page text under its breadcrumb, or the JSON envelope.
struct Output {
    json: bool,
    locale: Locale,
}

impl Output {
    fn data<T: Serialize>(&self, path: &str, data: &T, text: impl FnOnce() -> String) -> Result<(), CliError> {
        if self.json {
            let envelope = ApiResponse::from_result(Ok(data), self.locale);
            println!("{}", serde_json::to_string_pretty(&envelope)?);
        } else {
            let crumbs = navigation::breadcrumb(path);
            if !crumbs.is_empty() {
                println!("== {} ==", crumbs.join(" / "));
            }
            print!("{}", text());
        }
        Ok(())
    }

    fn message(&self, message: &str) -> Result<(), CliError> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(&json!({ "data": { "message": message } }))?);
        } else {
            println!("{message}");
        }
        Ok(())
    }
}

pub fn print_error(err: &CliError, json: bool, locale: Locale) {
    let message = err.user_message(locale);
    if json {
        let envelope = ApiResponse::<()> {
            data: None,
            error: Some(message),
        };
        if let Ok(text) = serde_json::to_string_pretty(&envelope) {
            println!("{text}");
        }
    } else {
        eprintln!("error: {message}");
    }
}

async fn client(config: &Config, api_url: Option<String>) -> Result<Arc<ApiClient>, CliError> {
    let pool = db::init_pool(&config.database_url).await?;
    let base = api_url.unwrap_or_else(|| config.api_base_url.clone());
    debug!(%base, "using backend API");
    let api = ApiClient::new(base, config.locale)
        .with_local_storage(LocalStorage::new(pool))
        .await?;
    Ok(Arc::new(api))
}

fn not_store_bot(locale: Locale, bot_id: i64) -> CliError {
    CliError::Invalid(match locale {
        Locale::Id => format!("Bot #{bot_id} bukan store bot"),
        Locale::En => format!("Bot #{bot_id} is not a store bot"),
    })
}

fn not_found(what: &str, id: i64) -> CliError {
    CliError::Invalid(format!("{what} #{id} not found"))
}

/// Runs one operator command. `Serve` is handled by the caller.
pub async fn run(cli: Cli, config: &Config) -> Result<(), CliError> {
    let locale = config.locale;
    let out = Output {
        json: cli.json,
        locale,
    };
    let api = client(config, cli.api_url).await?;

    match cli.command {
        Commands::Serve => Ok(()),

        Commands::Login { email, password } => {
            let session = api.login(&email, &password).await?;
            out.data(navigation::DASHBOARD, &session.user, || {
                format!("Masuk sebagai {}\n", session.user.email)
            })
        }
        Commands::Register {
            email,
            password,
            name,
        } => {
            let session = api.register(&email, &password, &name).await?;
            out.data(navigation::DASHBOARD, &session.user, || {
                format!("Akun {} dibuat\n", session.user.email)
            })
        }
        Commands::Logout => {
            api.logout().await;
            out.message("Logged out")
        }
        Commands::Whoami => {
            let user = api.me().await?;
            let claims = api.token().and_then(|t| inspect_token(&t).ok());
            let payload = json!({
                "user": &user,
                "token_subject": claims.as_ref().and_then(|c| c.subject()),
                "token_expires_at": claims.as_ref().and_then(|c| c.expires_at()).map(|t| t.to_rfc3339()),
            });
            out.data(navigation::DASHBOARD, &payload, || {
                let mut text = format!(
                    "{} <{}>\n",
                    user.name.as_deref().unwrap_or("-"),
                    user.email
                );
                if let Some(claims) = &claims {
                    if claims.is_expired(chrono::Utc::now()) {
                        text.push_str("token kedaluwarsa\n");
                    } else if let Some(exp) = claims.expires_at() {
                        text.push_str(&format!("token berlaku sampai {}\n", exp.to_rfc3339()));
                    }
                }
                text
            })
        }
        Commands::Nav { path, toggle } => {
            let user = api.me().await.ok().map(|u| u.email);
            let mut sidebar = Sidebar::for_path(&path);
            if let Some(key) = toggle {
                sidebar.toggle(&key);
            }
            out.data(&path, &navigation::breadcrumb(&path), || {
                sidebar.render(&path, user.as_deref())
            })
        }

        Commands::Bots { action } => run_bots(action, api, &out).await,
        Commands::Products { bot, action } => run_products(bot, action, api, &out).await,
        Commands::Transactions { bot, status } => {
            let mut page = TransactionsPage::new(api);
            page.load().await?;
            if let Some(id) = bot.bot {
                if !page.select_bot(id).await? {
                    return Err(not_store_bot(locale, id));
                }
            }
            page.set_filter(status);
            let visible: Vec<_> = page.visible().collect();
            out.data(navigation::STORE_TRANSACTIONS, &visible, || page.render())
        }
        Commands::Users { bot, search } => {
            let mut page = UsersPage::new(api);
            page.load().await?;
            if let Some(id) = bot.bot {
                if !page.select_bot(id).await? {
                    return Err(not_store_bot(locale, id));
                }
            }
            page.search = search;
            let visible: Vec<_> = page.visible().collect();
            out.data(navigation::STORE_USERS, &visible, || page.render())
        }
        Commands::Commands { bot, action } => run_commands(bot, action, api, &out).await,
        Commands::Broadcast { bot, action } => match action {
            BroadcastCommands::List => {
                let broadcasts = api.broadcasts(bot).await?;
                out.data(navigation::BOTS, &broadcasts, || {
                    broadcasts
                        .iter()
                        .map(|b| {
                            format!(
                                "#{:<5} terkirim={:<6} {:<10} {}\n",
                                b.id,
                                b.sent_count,
                                b.status.as_deref().unwrap_or("-"),
                                b.message
                            )
                        })
                        .collect()
                })
            }
            BroadcastCommands::Send { message } => {
                let broadcast = api.send_broadcast(bot, &message).await?;
                out.data(navigation::BOTS, &broadcast, || {
                    format!("Broadcast #{} terkirim ke {} user\n", broadcast.id, broadcast.sent_count)
                })
            }
        },
        Commands::Verify { action } => run_verify(action, api, &out).await,
        Commands::History { action } => run_history(action, api, config, &out).await,
        Commands::Proxies { action } => run_proxies(action, api, &out).await,
        Commands::Settings { action } => {
            let mut settings = api.sheerid_settings().await?;
            if let SettingsCommands::Set {
                proxy_enabled,
                proxy_host,
                proxy_port,
                proxy_username,
                proxy_password,
                default_points_cost,
            } = action
            {
                let update = SheerIdSettings {
                    proxy_enabled: proxy_enabled.unwrap_or(settings.proxy_enabled),
                    proxy_host: proxy_host.or(settings.proxy_host),
                    proxy_port: proxy_port.or(settings.proxy_port),
                    proxy_username: proxy_username.or(settings.proxy_username),
                    proxy_password,
                    default_points_cost: default_points_cost.unwrap_or(settings.default_points_cost),
                };
                settings = api.save_sheerid_settings(&update).await?;
                if !out.json {
                    println!("{}", i18n::settings_saved(locale));
                }
            }
            out.data(navigation::SETTINGS, &settings, || {
                format!(
                    "proxy: {} {}:{}\npoin default: {}\n",
                    if settings.proxy_enabled { "aktif" } else { "nonaktif" },
                    settings.proxy_host.as_deref().unwrap_or("-"),
                    settings.proxy_port.map(|p| p.to_string()).unwrap_or_else(|| "-".into()),
                    settings.default_points_cost,
                )
            })
        }
    }
}

async fn run_bots(action: BotCommands, api: Arc<ApiClient>, out: &Output) -> Result<(), CliError> {
    let locale = api.locale();
    match action {
        BotCommands::List => {
            let mut page = BotsPage::new(api);
            page.load().await?;
            out.data(navigation::BOTS, &page.bots, || page.render())
        }
        BotCommands::Add {
            token,
            bot_type,
            slug,
            api_key,
        } => {
            if token.trim().is_empty() {
                return Err(CliError::Invalid(i18n::required_field(locale, "Token bot")));
            }
            let mut page = BotsPage::new(api);
            page.open_form();
            page.form = Some(NewBotForm {
                telegram_token: token,
                bot_type,
                pakasir_slug: slug.unwrap_or_default(),
                pakasir_api_key: api_key.unwrap_or_default(),
            });
            page.submit().await?;
            out.data(navigation::BOTS, &page.bots, || page.render())
        }
        BotCommands::Show { id } => {
            let mut page = BotDetailPage::new(api, id);
            page.load().await?;
            out.data(navigation::BOTS, &page.bot, || page.render())
        }
        BotCommands::Update {
            id,
            name,
            bot_type,
            slug,
            api_key,
            active,
        } => {
            let mut page = BotDetailPage::new(api, id);
            page.load().await?;
            if let Some(name) = name {
                page.form.bot_name = name;
            }
            if let Some(bot_type) = bot_type {
                page.form.bot_type = bot_type;
            }
            if let Some(slug) = slug {
                page.form.pakasir_slug = slug;
            }
            if let Some(key) = api_key {
                page.form.pakasir_api_key = key;
            }
            if let Some(active) = active {
                page.form.is_active = active;
            }
            page.save().await?;
            out.data(&format!("{}/{id}", navigation::BOTS), &page.bot, || page.render())
        }
        BotCommands::Delete { id } => {
            let mut page = BotDetailPage::new(api, id);
            page.delete().await?;
            out.message(&format!("Bot #{} dihapus", page.bot_id()))
        }
        BotCommands::TestPakasir { bot, slug, api_key } => {
            let result = match bot {
                Some(id) => {
                    let mut page = BotDetailPage::new(api, id);
                    page.load().await?;
                    page.form.pakasir_slug = slug.unwrap_or_default();
                    page.form.pakasir_api_key = api_key.unwrap_or_default();
                    page.test_pakasir().await;
                    page.pakasir_test.unwrap_or_default()
                }
                None => {
                    let mut page = BotsPage::new(api);
                    page.open_form();
                    page.form = Some(NewBotForm {
                        pakasir_slug: slug.unwrap_or_default(),
                        pakasir_api_key: api_key.unwrap_or_default(),
                        ..Default::default()
                    });
                    page.test_pakasir().await;
                    page.pakasir_test.unwrap_or_default()
                }
            };
            out.data(navigation::BOTS, &result, || {
                if result.valid {
                    format!("OK {}\n", result.message.as_deref().unwrap_or_default())
                } else {
                    format!(
                        "GAGAL {}\n",
                        result
                            .error
                            .as_deref()
                            .unwrap_or_else(|| i18n::pakasir_test_failed(locale))
                    )
                }
            })
        }
    }
}

async fn run_products(
    bot: BotArg,
    action: ProductCommands,
    api: Arc<ApiClient>,
    out: &Output,
) -> Result<(), CliError> {
    let locale = api.locale();
    let mut page = ProductsPage::new(api);
    page.load().await?;
    if let Some(id) = bot.bot {
        if !page.select_bot(id).await? {
            return Err(not_store_bot(locale, id));
        }
    }

    match action {
        ProductCommands::List => {}
        ProductCommands::Add { fields } => {
            page.open_add();
            fields.apply(&mut page.form);
            page.save().await?;
        }
        ProductCommands::Edit { id, fields } => {
            if !page.open_edit(id) {
                return Err(not_found("Product", id));
            }
            fields.apply(&mut page.form);
            page.save().await?;
        }
        ProductCommands::Delete { id } => page.delete(id).await?,
        ProductCommands::Stock { id, items } => {
            let added = page.add_stock(id, &items).await?;
            if !out.json {
                println!("{added} stok ditambahkan");
            }
        }
    }
    out.data(navigation::STORE_PRODUCTS, &page.products, || page.render())
}

async fn run_commands(
    bot: BotArg,
    action: CommandCommands,
    api: Arc<ApiClient>,
    out: &Output,
) -> Result<(), CliError> {
    let locale = api.locale();
    let mut page = CommandsPage::new(api);
    page.load().await?;
    if let Some(id) = bot.bot {
        if !page.select_bot(id).await? {
            return Err(not_store_bot(locale, id));
        }
    }

    match action {
        CommandCommands::List => {}
        CommandCommands::Set { name, text } => page.save(&name, &text).await?,
        CommandCommands::Toggle { name } => {
            page.toggle(&name).await?;
        }
    }

    let effective: Vec<_> = crate::models::DEFAULT_STORE_COMMANDS
        .iter()
        .map(|c| {
            json!({
                "command_name": c.command_name,
                "response_text": page.text_of(c.command_name),
                "is_enabled": page.is_enabled(c.command_name),
            })
        })
        .collect();
    out.data(navigation::STORE_COMMANDS, &effective, || page.render())
}

async fn run_verify(action: VerifyCommands, api: Arc<ApiClient>, out: &Output) -> Result<(), CliError> {
    let locale = api.locale();
    let mut page = VerificationPage::new(api);
    page.load().await;

    match action {
        VerifyCommands::Types => out.data(navigation::VERIFICATION, &page.types, || page.render()),
        VerifyCommands::CheckLink { url, verify_type } => {
            pick_type(&mut page, verify_type)?;
            let check = page.check_link(&url).await.clone();
            out.data(navigation::VERIFICATION, &check, || {
                if check.valid {
                    "Link valid\n".to_string()
                } else {
                    format!(
                        "Link tidak valid: {}\n",
                        check.error.as_deref().unwrap_or_else(|| i18n::generic_error(locale))
                    )
                }
            })
        }
        VerifyCommands::Submit { url, verify_type } => {
            pick_type(&mut page, verify_type)?;
            let cost = page.selected_type_info().map_or(0, |t| t.cost);
            let submission = page.submit(&url).await?.clone();
            out.data(navigation::VERIFICATION, &submission, || {
                if submission.success {
                    format!(
                        "Verifikasi #{} dikirim ({} poin): {}\n",
                        submission.verification_id,
                        cost,
                        submission.message.as_deref().unwrap_or_default()
                    )
                } else {
                    format!(
                        "Gagal: {}\n",
                        submission.error.as_deref().unwrap_or_else(|| i18n::generic_error(locale))
                    )
                }
            })
        }
        VerifyCommands::Ip => {
            let ip = page.lookup_ip().await.clone();
            out.data(navigation::VERIFICATION, &ip, || page.render())
        }
    }
}

fn pick_type(page: &mut VerificationPage, verify_type: Option<String>) -> Result<(), CliError> {
    match verify_type {
        Some(t) if !page.select_type(&t) => {
            Err(CliError::Invalid(format!("unknown verification type: {t}")))
        }
        _ => Ok(()),
    }
}

async fn run_history(
    action: HistoryCommands,
    api: Arc<ApiClient>,
    config: &Config,
    out: &Output,
) -> Result<(), CliError> {
    let mut schedule = PollSchedule::every_secs(config.status_poll_secs);
    if let HistoryCommands::Watch {
        stop_on_terminal, ..
    } = &action
    {
        schedule.stop_on_terminal = *stop_on_terminal;
    }

    let mut page = VerificationHistoryPage::new(api, schedule);
    page.load().await?;

    match action {
        HistoryCommands::List => {
            out.data(navigation::VERIFICATION_HISTORY, &page.verifications, || page.render())
        }
        HistoryCommands::Show { id } => {
            if !page.open_detail(id) {
                return Err(not_found("Verification", id));
            }
            // a failed immediate check emits no status, so wait one period at most
            let first_status = async {
                while let Some(event) = page.next_event().await {
                    if matches!(event, PollEvent::Status(_)) {
                        break;
                    }
                }
            };
            let wait = schedule.tick * schedule.period;
            if tokio::time::timeout(wait, first_status).await.is_err() {
                debug!(verification_id = id, "no live status yet");
            }
            let shown = json!({
                "verification": page.selected(),
                "status": &page.last_status,
            });
            let text = page.render_detail();
            page.close_detail();
            out.data(navigation::VERIFICATION_HISTORY, &shown, || text)
        }
        HistoryCommands::Watch { id, .. } => {
            if !page.open_detail(id) {
                return Err(not_found("Verification", id));
            }
            loop {
                let event = tokio::select! {
                    event = page.next_event() => event,
                    _ = tokio::signal::ctrl_c() => None,
                };
                let Some(event) = event else {
                    break;
                };
                match &event {
                    PollEvent::Status(_) if out.json => {
                        println!("{}", serde_json::to_string(&event)?);
                    }
                    PollEvent::Status(_) => print!("{}", page.render_detail()),
                    PollEvent::Countdown(n) => debug!(remaining = n, "next status check"),
                }
            }
            page.close_detail();
            Ok(())
        }
    }
}

async fn run_proxies(action: ProxyCommands, api: Arc<ApiClient>, out: &Output) -> Result<(), CliError> {
    let locale = api.locale();
    let mut page = VerificationPage::new(api.clone());
    page.load().await;

    let invalid_proxy = || {
        CliError::Invalid(format!(
            "{}, {}, {}",
            i18n::required_field(locale, "Nama"),
            i18n::required_field(locale, "Host"),
            i18n::invalid_number(locale, "Port"),
        ))
    };

    match action {
        ProxyCommands::List => {}
        ProxyCommands::Add { fields } => {
            let mut form = ProxyForm::default();
            fields.apply(&mut form);
            if page.add_proxy(&form).await?.is_none() {
                return Err(invalid_proxy());
            }
        }
        ProxyCommands::Update { id, fields } => {
            let Some(existing) = page.proxies.iter().find(|p| p.id == id) else {
                return Err(not_found("Proxy", id));
            };
            let mut form = ProxyForm::from_proxy(existing);
            fields.apply(&mut form);
            if page.update_proxy(id, &form).await?.is_none() {
                return Err(invalid_proxy());
            }
        }
        ProxyCommands::Delete { id } => page.delete_proxy(id).await?,
        ProxyCommands::Activate { id } => page.activate_proxy(id).await?,
        ProxyCommands::Deactivate { id } => page.deactivate_proxy(id).await?,
        ProxyCommands::Test { id } => {
            let check = page.test_proxy(id).await?.clone();
            return out.data(navigation::VERIFICATION, &check, || proxy_check_text(&check, locale));
        }
        ProxyCommands::Check {
            host,
            port,
            username,
            password,
        } => {
            let check = api
                .proxy_check(&host, port, username.as_deref(), password.as_deref())
                .await?;
            return out.data(navigation::VERIFICATION, &check, || proxy_check_text(&check, locale));
        }
    }
    out.data(navigation::VERIFICATION, &page.proxies, || page.render())
}

fn proxy_check_text(check: &crate::models::ProxyCheck, locale: Locale) -> String {
    if check.success {
        format!(
            "OK {} ({}, {}) {}\n",
            check.ip.as_deref().unwrap_or("-"),
            check.city.as_deref().unwrap_or("-"),
            check.country.as_deref().unwrap_or("-"),
            check.isp.as_deref().unwrap_or_default(),
        )
    } else {
        format!(
            "GAGAL {}\n",
            check
                .error
                .as_deref()
                .or(check.message.as_deref())
                .unwrap_or_else(|| i18n::generic_error(locale))
        )
    }
}
