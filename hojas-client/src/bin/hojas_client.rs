use std::path::Path;

use clap::{Parser, Subcommand};
use common::error::HsResult;
use hojas_client::{
    app::App,
    config::{init_logging, ClientSettings},
    http::ApiClient,
    router::Navigator,
    routes::{NavigationError, NavigationTarget, Page},
    viewer::FileViewer,
};
use hojas_common::{Credentials, NuevaNotaBuena};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};

/// One line typed into the console
#[derive(Parser)]
#[command(no_binary_name = true, name = "hojas", disable_version_flag = true)]
struct Line {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start a session
    Login { email: String, password: String },
    /// End the session
    Logout,
    /// Show the current user
    Whoami,
    /// Navigate to a path
    Go { path: String },
    /// Good-conduct notes
    Notas {
        #[command(subcommand)]
        action: NotasAction,
    },
    /// Personnel roster
    Personal {
        #[arg(long)]
        refresh: bool,
    },
    /// Global configuration
    Config,
    Quit,
}

#[derive(Subcommand)]
enum NotasAction {
    List,
    /// Create a note from `--field key=value` pairs. Values that parse as JSON are sent as such.
    Create {
        #[arg(long = "field", value_parser = parse_field)]
        fields: Vec<(String, Value)>,
    },
    Pdf { id: i64 },
}

fn parse_field(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got `{raw}`"))?;
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_owned()));
    Ok((key.to_owned(), value))
}

/// Navigate to `target` and report whether the requested page is now shown. The guard may send
/// the user to the login page instead.
fn enter(app: &App<ApiClient>, target: NavigationTarget, page: Page) -> bool {
    match app.router.push(target) {
        Ok(location) if location.page == page => true,
        Ok(location) => {
            println!("Redirigido a {}", location.full_path());
            false
        }
        Err(NavigationError::Duplicated(_)) => true,
        Err(error) => {
            println!("{error}");
            false
        }
    }
}

fn print_location(app: &App<ApiClient>) {
    match app.router.current() {
        Some(location) => println!("[{}] {}", location.page, location.full_path()),
        None => println!("[sin ruta]"),
    }
}

/// Run a single console `command`. Returns false when the console should exit.
async fn run(app: &App<ApiClient>, viewer: &FileViewer, command: Command) -> HsResult<bool> {
    match command {
        Command::Login { email, password } => {
            match app.login(&Credentials { email, password }).await {
                Ok(true) => println!("Sesión iniciada"),
                Ok(false) => println!("No se pudo verificar la sesión"),
                Err(error) => {
                    let message = error.response_message().unwrap_or_else(|| error.to_string());
                    println!("{message}");
                }
            }
        }
        Command::Logout => app.logout().await,
        Command::Whoami => match app.auth.current_user() {
            Some(user) => println!("{} <{}>", user.name, user.email),
            None => println!("Sin sesión"),
        },
        Command::Go { path } => {
            if let Err(error) = app.router.push(path.into()) {
                println!("{error}");
            }
        }
        Command::Notas { action } => match action {
            NotasAction::List => {
                if enter(app, "/lista".into(), Page::ListarHojas) {
                    app.notas_buenas.fetch_notas_buenas().await;
                    let state = app.notas_buenas.state();
                    match state.status.error {
                        Some(error) => println!("{error}"),
                        None => {
                            for nota in &state.notas {
                                println!("{} {}", nota.id, Value::Object(nota.attributes.clone()));
                            }
                        }
                    }
                }
            }
            NotasAction::Create { fields } => {
                if enter(app, "/".into(), Page::CrearHoja) {
                    let nota = fields
                        .into_iter()
                        .fold(NuevaNotaBuena::new(), |nota, (key, value)| nota.with(key, value));
                    match app.notas_buenas.create_nota_buena(&nota).await {
                        Ok(nota) => println!("Nota {} creada", nota.id),
                        Err(error) => println!("{error}"),
                    }
                }
            }
            NotasAction::Pdf { id } => {
                if enter(app, "/lista".into(), Page::ListarHojas) {
                    if let Err(error) = app.notas_buenas.download_pdf(id, viewer).await {
                        println!("{error}");
                    }
                }
            }
        },
        Command::Personal { refresh } => {
            if enter(app, "/".into(), Page::CrearHoja) {
                if refresh {
                    app.personal.refresh_personal().await;
                } else {
                    app.personal.fetch_personal().await;
                }
                let state = app.personal.state();
                if let Some(error) = state.status.error {
                    println!("{error}");
                }
                for persona in &state.personal {
                    println!("{} {}", persona.id, Value::Object(persona.attributes.clone()));
                }
            }
        }
        Command::Config => {
            if enter(app, NavigationTarget::named(Page::AdminConfig), Page::AdminConfig) {
                app.configuracion.fetch_configuracion().await;
                let state = app.configuracion.state();
                match state.status.error {
                    Some(error) => println!("{error}"),
                    None => {
                        let jefe = state.jefe_rh_predeterminado_id();
                        println!("jefe_rh_predeterminado_id: {jefe:?}");
                        println!("hoja_membretada_url: {:?}", state.hoja_membretada_url());
                    }
                }
            }
        }
        Command::Quit => return Ok(false),
    }
    Ok(true)
}

#[tokio::main]
async fn main() -> HsResult<()> {
    init_logging(Path::new("hojas-client/hojas_client_log.yml"))?;

    let settings = ClientSettings::from_env()?;
    let viewer = FileViewer::new(
        settings.document_dir.clone(),
        settings.document_viewer.clone(),
    );
    let app = App::bootstrap(&settings).await?;
    if let Err(error) = app.start("/") {
        log::error!("Initial navigation failed. {error}");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print_location(&app);
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let words = line.split_whitespace().collect::<Vec<&str>>();
        if words.is_empty() {
            continue;
        }
        let command = match Line::try_parse_from(words) {
            Ok(parsed) => parsed.command,
            Err(error) => {
                println!("{error}");
                continue;
            }
        };
        if !run(&app, &viewer, command).await? {
            break;
        }
    }
    Ok(())
}
