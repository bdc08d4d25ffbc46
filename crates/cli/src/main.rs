//! `arradm`: administrative console for Sonarr instance records.

mod ui;

use std::{
    process,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use dialoguer::{Confirm, Password, theme::ColorfulTheme};
use gateway::{
    GraphqlGateway, HttpGateway, InstanceApi, RestGateway, UnauthorizedHandler,
};
use secrecy::SecretString;
use services::services::{
    directory::Directory,
    onboarding::{InstanceDraft, OnboardingForm, ProbeOutcome},
    session::SessionWorkflow,
};
use utils::{config::Config, msg::Notifier, session::SessionStore};

use crate::ui::TerminalNotifier;

#[derive(Parser)]
#[command(name = "arradm", version, about = "Manage Sonarr instance records")]
struct Cli {
    /// Backend binding used for instance operations.
    #[arg(long, value_enum, env = "ARRADM_BACKEND", default_value_t = Backend::Graphql)]
    backend: Backend,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Backend {
    Graphql,
    Rest,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in and store a session token.
    Login,
    /// Create a new account.
    Register,
    /// Destroy the stored session.
    Logout,
    /// Manage configured instances.
    #[command(subcommand)]
    Instance(InstanceCommand),
}

#[derive(Subcommand)]
enum InstanceCommand {
    /// List configured instances.
    List,
    /// Add a new instance interactively.
    Add,
    /// Probe connectivity for a URL/key pair without saving anything.
    Test,
    /// Delete an instance.
    Delete { id: i64 },
    /// Re-check one instance's reachability.
    Check { id: i64 },
}

/// Clears the session and remembers that an unauthorized response was
/// seen, so the command can route the user back to login at the end.
struct SessionWatch {
    store: SessionStore,
    tripped: AtomicBool,
}

impl SessionWatch {
    fn new(store: SessionStore) -> Self {
        Self {
            store,
            tripped: AtomicBool::new(false),
        }
    }

    fn tripped(&self) -> bool {
        self.tripped.load(Ordering::SeqCst)
    }
}

impl UnauthorizedHandler for SessionWatch {
    fn on_unauthorized(&self) {
        let _ = self.store.clear();
        self.tripped.store(true, Ordering::SeqCst);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    utils::logging::init_tracing("warn");

    let cli = Cli::parse();
    let config = Config::from_env().context("reading configuration")?;
    let _telemetry = utils::logging::init_telemetry(&config);

    let store = SessionStore::new().context("locating session storage")?;
    let watch = Arc::new(SessionWatch::new(store.clone()));
    let core = HttpGateway::new(&config, store.clone(), watch.clone())
        .context("constructing gateway")?;

    let instances: Arc<dyn InstanceApi> = match cli.backend {
        Backend::Graphql => Arc::new(GraphqlGateway::new(core.clone())),
        Backend::Rest => Arc::new(RestGateway::new(core.clone())),
    };
    // Auth rides the REST surface regardless of the instance binding.
    let auth = Arc::new(RestGateway::new(core));
    let notifier: Arc<dyn Notifier> = Arc::new(TerminalNotifier);

    // A 401 during login/register is already reported as a failed
    // attempt; the redirect hint is for expired sessions elsewhere.
    let at_login_entry = matches!(&cli.command, Command::Login | Command::Register);

    let ok = match cli.command {
        Command::Login => login(auth, store, notifier).await?,
        Command::Register => register(auth, store, notifier).await?,
        Command::Logout => {
            SessionWorkflow::new(auth, store, notifier).logout();
            true
        }
        Command::Instance(command) => run_instance(command, instances, notifier).await?,
    };

    if watch.tripped() && !at_login_entry {
        eprintln!(
            "{}",
            style("Session expired. Run `arradm login` to sign in again.").red()
        );
        process::exit(1);
    }
    if !ok {
        process::exit(1);
    }
    Ok(())
}

async fn login(
    auth: Arc<RestGateway>,
    store: SessionStore,
    notifier: Arc<dyn Notifier>,
) -> anyhow::Result<bool> {
    let (email, password) = ui::prompt_credentials()?;
    let workflow = SessionWorkflow::new(auth, store, notifier);
    let pb = ui::spinner("Signing in...");
    let landing = workflow.login(&email, SecretString::from(password)).await;
    pb.finish_and_clear();
    Ok(landing.is_some())
}

async fn register(
    auth: Arc<RestGateway>,
    store: SessionStore,
    notifier: Arc<dyn Notifier>,
) -> anyhow::Result<bool> {
    let (email, password) = ui::prompt_credentials()?;
    let confirm = Password::with_theme(&ColorfulTheme::default())
        .with_prompt("Confirm Password")
        .interact()?;
    let workflow = SessionWorkflow::new(auth, store, notifier);
    let pb = ui::spinner("Registering...");
    let landing = workflow
        .register(
            &email,
            SecretString::from(password),
            SecretString::from(confirm),
        )
        .await;
    pb.finish_and_clear();
    Ok(landing.is_some())
}

async fn run_instance(
    command: InstanceCommand,
    api: Arc<dyn InstanceApi>,
    notifier: Arc<dyn Notifier>,
) -> anyhow::Result<bool> {
    match command {
        InstanceCommand::List => {
            let mut directory = Directory::new(api, notifier);
            let pb = ui::spinner("Fetching instances...");
            let fetched = directory.refresh().await;
            pb.finish_and_clear();
            match fetched {
                Ok(()) => {
                    ui::print_instance_table(directory.rows());
                    Ok(true)
                }
                Err(e) => {
                    if !e.is_unauthorized() {
                        eprintln!("{}", style(format!("Error: {e}")).red());
                    }
                    Ok(false)
                }
            }
        }
        InstanceCommand::Add => instance_add(api, notifier).await,
        InstanceCommand::Test => instance_test(api, notifier).await,
        InstanceCommand::Delete { id } => {
            let mut directory = Directory::new(api, notifier);
            let pb = ui::spinner("Deleting instance...");
            let deleted = directory.delete(id).await;
            pb.finish_and_clear();
            Ok(deleted)
        }
        InstanceCommand::Check { id } => {
            let mut directory = Directory::new(api, notifier);
            let pb = ui::spinner("Checking instance...");
            let checked = directory.check(id).await;
            pb.finish_and_clear();
            Ok(checked)
        }
    }
}

async fn instance_add(
    api: Arc<dyn InstanceApi>,
    notifier: Arc<dyn Notifier>,
) -> anyhow::Result<bool> {
    let theme = ColorfulTheme::default();
    let mut form = OnboardingForm::new(api, notifier);
    let mut previous = InstanceDraft::default();

    loop {
        let draft = ui::prompt_draft(&previous)?;
        form.set_draft(draft);

        if Confirm::with_theme(&theme)
            .with_prompt("Test connection before creating?")
            .default(true)
            .interact()?
        {
            let pb = ui::spinner("Testing connection...");
            let probed = form.test_connection().await;
            pb.finish_and_clear();
            match probed {
                Ok(ProbeOutcome::Completed(_)) | Ok(ProbeOutcome::AlreadyRunning) => {
                    if let Some(banner) = form.banner() {
                        ui::print_banner(&banner);
                    }
                }
                Err(errors) => {
                    ui::print_field_errors(&errors);
                    previous = form.draft().clone();
                    continue;
                }
            }
        }

        // The probe is advisory; creation is offered either way.
        if !Confirm::with_theme(&theme)
            .with_prompt("Create instance?")
            .default(true)
            .interact()?
        {
            return Ok(true);
        }

        let pb = ui::spinner("Creating instance...");
        let submitted = form.submit().await;
        pb.finish_and_clear();
        match submitted {
            Ok(Some(created)) => {
                println!("Created instance {} (id {}).", created.name, created.id);
                return Ok(true);
            }
            Ok(None) => {
                previous = form.draft().clone();
                if !Confirm::with_theme(&theme)
                    .with_prompt("Creation failed. Edit the values and retry?")
                    .default(true)
                    .interact()?
                {
                    return Ok(false);
                }
            }
            Err(errors) => {
                ui::print_field_errors(&errors);
                previous = form.draft().clone();
            }
        }
    }
}

async fn instance_test(
    api: Arc<dyn InstanceApi>,
    notifier: Arc<dyn Notifier>,
) -> anyhow::Result<bool> {
    let draft = ui::prompt_draft(&InstanceDraft {
        // Only URL and key matter for a standalone probe.
        name: "-".to_string(),
        ..InstanceDraft::default()
    })?;
    let mut form = OnboardingForm::new(api, notifier);
    form.set_draft(draft);

    let pb = ui::spinner("Testing connection...");
    let probed = form.test_connection().await;
    pb.finish_and_clear();
    match probed {
        Ok(_) => {
            if let Some(banner) = form.banner() {
                ui::print_banner(&banner);
            }
            Ok(true)
        }
        Err(errors) => {
            ui::print_field_errors(&errors);
            Ok(false)
        }
    }
}
