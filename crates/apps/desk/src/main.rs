//! Desk - terminal front end for the email triage desk
//!
//! Lists assembled threads per mailbox, edits and sends AI-drafted replies,
//! and browses the CRM leads table.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use triage::{
    ActionHandler, DraftEditor, EmailId, EmailThread, InMemoryStore, InboxFeed, LeadId, LeadPatch,
    MailboxView, NewLead, NoticeBoard, RestStore, SendRequest, SendWorkflow, ServiceConfig,
    ThreadListener, TriageStore, WebhookClient, kanban, lead_threads, mailbox_counts,
    visible_leads,
};
use triage::config::SETTINGS_FILE;

mod render;

#[derive(Parser, Debug)]
#[command(name = "desk", about = "Triage inbound email and manage leads")]
struct Cli {
    /// Settings file to use instead of ~/.config/triage-desk/settings.json
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List threads of a mailbox (`/`, `/leads`, `/sent`, `/category/<c>/<s>`, ...)
    Threads {
        #[arg(default_value = "/")]
        path: String,
    },
    /// Show every email of a thread, by thread id or the id of any of its emails
    Show { id: String },
    /// Per-mailbox email counts
    Counts {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Replace the body of a draft reply
    Edit { id: String, body: String },
    /// Validate a draft reply and hand it to the send-workflow
    Send {
        id: String,
        /// Replacement body saved before sending
        #[arg(long)]
        body: Option<String>,
    },
    /// List CRM leads
    Leads {
        /// Group leads by pipeline status
        #[arg(long)]
        kanban: bool,
    },
    /// Show a lead with the threads it started
    Lead { id: String },
    /// Create a lead
    LeadAdd {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        industry: Option<String>,
    },
    /// Update notes, industry or status of a lead
    LeadNote {
        id: String,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        industry: Option<String>,
        #[arg(long)]
        status: Option<String>,
    },
    /// Refresh the inbox on the configured interval until interrupted
    Watch,
    /// Write a default settings file unless one exists
    Init,
}

/// Stand-in used when no webhook URL is configured; every dispatch fails
struct UnconfiguredWorkflow;

impl SendWorkflow for UnconfiguredWorkflow {
    fn dispatch(&self, request: &SendRequest) -> Result<()> {
        bail!(
            "no send-workflow configured for reply {}; set webhook_url or TRIAGE_WEBHOOK_URL",
            request.id
        )
    }
}

/// Prints a one-line summary after each refresh
struct SummaryListener;

impl ThreadListener for SummaryListener {
    fn threads_updated(&self, threads: &[EmailThread]) {
        let waiting = threads.iter().filter(|t| t.has_unread_replies).count();
        println!("{} threads, {} awaiting validation", threads.len(), waiting);
        for thread in threads.iter().filter(|t| t.has_unread_replies) {
            println!("{}", render::thread_line(thread));
        }
    }
}

/// Everything a command needs, wired once at startup
struct Desk {
    config: ServiceConfig,
    store: Arc<dyn TriageStore>,
    notices: Arc<NoticeBoard>,
    handler: ActionHandler,
}

impl Desk {
    fn open(config: ServiceConfig) -> Result<Self> {
        let store = open_store(&config)?;
        let notices = Arc::new(NoticeBoard::new());

        let workflow: Arc<dyn SendWorkflow> = match config.webhook() {
            Some(url) => Arc::new(WebhookClient::new(url)),
            None => Arc::new(UnconfiguredWorkflow),
        };
        let handler = ActionHandler::new(store.clone(), workflow, notices.clone());

        Ok(Self {
            config,
            store,
            notices,
            handler,
        })
    }

    fn feed(&self) -> InboxFeed {
        InboxFeed::new(
            self.store.clone(),
            self.notices.clone(),
            self.config.categories.clone(),
            self.config.refresh_interval_secs(),
        )
    }

    fn threads(&self) -> Vec<EmailThread> {
        let mut feed = self.feed();
        feed.refresh();
        feed.threads().to_vec()
    }

    fn print_notices(&self) {
        for notice in self.notices.drain() {
            eprintln!("{}", render::notice_line(&notice));
        }
    }

    fn run(&self, command: Command) -> Result<()> {
        match command {
            Command::Threads { path } => {
                let view = MailboxView::from_path(&path);
                let threads = self.threads();
                let selected = view.select(&threads);
                println!("{} ({})", view.title(), selected.len());
                for thread in selected {
                    println!("{}", render::thread_line(thread));
                }
            }
            Command::Show { id } => {
                let threads = self.threads();
                let email_id = EmailId::new(id.as_str());
                let thread = threads
                    .iter()
                    .find(|t| t.thread_id.as_str() == id || t.contains(&email_id))
                    .with_context(|| format!("Thread {} not found", id))?;
                print!("{}", render::thread_detail(thread));
            }
            Command::Counts { json } => {
                let counts = mailbox_counts(self.store.as_ref(), &self.config.categories)?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&counts)?);
                } else {
                    println!("{}", render::counts_table(&counts));
                }
            }
            Command::Edit { id, body } => {
                let updated = self.handler.update_draft(&EmailId::new(id), &body)?;
                info!("Draft {} now {} chars", updated.id, updated.body_text().len());
            }
            Command::Send { id, body } => {
                let id = EmailId::new(id);
                let draft = self
                    .store
                    .get_email(&id)?
                    .with_context(|| format!("Email {} not found", id))?;

                let mut editor = DraftEditor::new(draft);
                if let Some(body) = body {
                    editor.set_body(body);
                }
                editor.validate();
                let receipt = editor.send(&self.handler)?;
                match receipt.original_email_id {
                    Some(original) => println!("Sent {} in reply to {}", receipt.reply.id, original),
                    None => println!("Sent {}", receipt.reply.id),
                }
            }
            Command::Leads { kanban: as_board } => {
                let leads = visible_leads(self.store.list_leads()?);
                if as_board {
                    print!("{}", render::kanban_board(&kanban(&leads)));
                } else {
                    for lead in &leads {
                        println!("{}", render::lead_line(lead));
                    }
                }
            }
            Command::Lead { id } => {
                let lead = self
                    .store
                    .get_lead(&LeadId::new(id.as_str()))?
                    .filter(|l| !l.is_system())
                    .with_context(|| format!("Lead {} not found", id))?;
                let threads = self.threads();
                print!("{}", render::lead_detail(&lead, &lead_threads(&lead, &threads)));
            }
            Command::LeadAdd {
                name,
                email,
                industry,
            } => {
                if name.is_none() && email.is_none() {
                    bail!("A lead needs a name or an email address");
                }
                let lead = self.store.insert_lead(&NewLead {
                    name,
                    email,
                    industry,
                    ..Default::default()
                })?;
                println!("{}", render::lead_line(&lead));
            }
            Command::LeadNote {
                id,
                notes,
                industry,
                status,
            } => {
                let patch = LeadPatch {
                    industry,
                    notes,
                    lead_type: status,
                };
                if patch.is_empty() {
                    bail!("Nothing to update; pass --notes, --industry or --status");
                }
                let lead = self.store.update_lead(&LeadId::new(id.as_str()), &patch)?;
                println!("{}", render::lead_line(&lead));
            }
            Command::Watch => {
                let runtime = tokio::runtime::Runtime::new()?;
                runtime.block_on(self.watch())?;
            }
            Command::Init => init_settings(None)?,
        }
        Ok(())
    }

    /// Poll the storage service until Ctrl-C
    async fn watch(&self) -> Result<()> {
        let mut feed = self.feed();
        feed.subscribe(Arc::new(SummaryListener));
        let feed = Arc::new(Mutex::new(feed));

        let period = Duration::from_secs(self.config.refresh_interval_secs());
        let mut interval = tokio::time::interval(period);
        info!("Watching inbox every {}s", period.as_secs());

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let feed = feed.clone();
                    let stats = tokio::task::spawn_blocking(move || {
                        feed.lock().ok().map(|mut f| f.refresh())
                    })
                    .await?;
                    if let Some(stats) = stats {
                        info!("Refresh took {}ms", stats.duration_ms);
                    }
                    self.print_notices();
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Stopping watch");
                    return Ok(());
                }
            }
        }
    }
}

/// Storage service when credentials are set, otherwise the offline store
fn open_store(config: &ServiceConfig) -> Result<Arc<dyn TriageStore>> {
    if config.is_offline() {
        warn!("Storage service not configured; running offline");
        return match &config.seed_file {
            Some(path) => Ok(Arc::new(InMemoryStore::from_seed_file(path)?)),
            None => Ok(Arc::new(InMemoryStore::new())),
        };
    }

    let creds = config.storage().context("Storage credentials missing")?;
    info!("Using storage service at {}", creds.url);
    Ok(Arc::new(RestStore::new(&creds.url, creds.key)?))
}

fn load_config(path: Option<PathBuf>) -> Result<ServiceConfig> {
    match path {
        Some(path) => {
            let mut cfg = ServiceConfig::from_file(&path)?;
            cfg.apply_env(|name| std::env::var(name).ok());
            Ok(cfg)
        }
        None => ServiceConfig::load(),
    }
}

/// Write default settings to `path`, or to settings.json in the config directory
fn init_settings(path: Option<PathBuf>) -> Result<()> {
    match path {
        Some(path) if path.exists() => println!("Settings already at {}", path.display()),
        Some(path) => {
            ServiceConfig::default().save_to(&path)?;
            println!("Wrote default settings to {}", path.display());
        }
        None => {
            let location = config::config_path(SETTINGS_FILE)
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| SETTINGS_FILE.to_string());
            if ServiceConfig::write_default_if_missing()? {
                println!("Wrote default settings to {}", location);
            } else {
                println!("Settings already at {}", location);
            }
        }
    }
    Ok(())
}

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    // Bootstrap config directory
    if let Err(e) = config::init() {
        error!("Failed to initialize config directory: {}", e);
    }

    let cli = Cli::parse();
    if let Command::Init = cli.command {
        if let Err(e) = init_settings(cli.config) {
            error!("{:#}", e);
            std::process::exit(1);
        }
        return;
    }

    let result = load_config(cli.config).and_then(|cfg| {
        let desk = Desk::open(cfg)?;
        let result = desk.run(cli.command);
        desk.print_notices();
        result
    });

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
