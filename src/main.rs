use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};

use contactdesk_lib::{
    commands,
    model::{Contact, ContactDraft},
    search, AppError, AppResult, ErrorKind, Store, StoreConfig,
};

const EXIT_FAILURE: i32 = 1;
const EXIT_CONFIG: i32 = 2;

#[derive(Debug, Parser)]
#[command(name = "contactdesk", about = "Contact book backed by a single member table", version)]
struct Cli {
    /// JSON store configuration file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// SQLite database file (overrides the configured backend)
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create the member table if it does not exist.
    Init,
    /// Validate and insert a new contact.
    Add(ContactArgs),
    /// Replace every field of an existing contact.
    Update {
        id: i64,
        #[command(flatten)]
        fields: ContactArgs,
    },
    /// Delete a contact by id.
    Delete { id: i64 },
    /// Show one contact as JSON.
    Show { id: i64 },
    /// List contacts ordered by last name.
    List {
        /// Substring matched against first name, last name and contact.
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long)]
        json: bool,
    },
    /// Append rows from a CSV file.
    Import { file: PathBuf },
    /// Write every contact to a CSV file.
    Export { file: PathBuf },
    /// Total and per-gender counts.
    Stats {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Args)]
struct ContactArgs {
    #[arg(long, default_value = "")]
    firstname: String,
    #[arg(long, default_value = "")]
    lastname: String,
    #[arg(long, default_value = "")]
    gender: String,
    #[arg(long, default_value = "")]
    age: String,
    #[arg(long, default_value = "")]
    address: String,
    #[arg(long, default_value = "")]
    contact: String,
}

impl From<ContactArgs> for ContactDraft {
    fn from(args: ContactArgs) -> Self {
        ContactDraft {
            first_name: args.firstname,
            last_name: args.lastname,
            gender: args.gender,
            age: args.age,
            address: args.address,
            contact: args.contact,
        }
    }
}

fn main() {
    let log_guard = contactdesk_lib::logging::init();

    let cli = Cli::parse();
    let code = match handle_cli(cli) {
        Ok(code) => code,
        Err(err) => report_error(&err),
    };
    drop(log_guard);
    process::exit(code);
}

fn report_error(err: &AppError) -> i32 {
    match err.kind() {
        ErrorKind::Validation | ErrorKind::NotFound => {
            eprintln!("{}", err.message());
            EXIT_FAILURE
        }
        ErrorKind::Configuration => {
            eprintln!("Error: {err}");
            EXIT_CONFIG
        }
        _ => {
            eprintln!("Error: {err}");
            EXIT_FAILURE
        }
    }
}

fn handle_cli(cli: Cli) -> AppResult<i32> {
    let config = StoreConfig::resolve(cli.config.as_deref(), cli.db.as_deref())?;
    let store = Store::new(&config);
    tracing::debug!(target: "contactdesk", backend = config.backend.name(), "cli_start");

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        store.ensure_schema().await?;
        run_command(&store, cli.command).await
    })
}

async fn run_command(store: &Store, command: Commands) -> AppResult<i32> {
    match command {
        Commands::Init => {
            println!("Database ready: {}", store.describe());
        }
        Commands::Add(args) => {
            let id = commands::save_contact(store, &args.into()).await?;
            println!("Contact saved successfully. (id {id})");
        }
        Commands::Update { id, fields } => {
            commands::update_contact(store, id, &fields.into()).await?;
            println!("Contact updated successfully.");
        }
        Commands::Delete { id } => {
            commands::delete_contact(store, id).await?;
            println!("Contact deleted successfully.");
        }
        Commands::Show { id } => {
            let contact = commands::get_contact(store, id).await?;
            println!("{}", serde_json::to_string_pretty(&contact)?);
        }
        Commands::List { search: term, json } => {
            let contacts = commands::list_contacts(store, &term).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&contacts)?);
            } else {
                print_contacts(&contacts);
                println!("{}", search::status_line(contacts.len(), &term));
            }
        }
        Commands::Import { file } => {
            let report = commands::import_contacts(store, &file).await?;
            println!("{}", report.summary());
        }
        Commands::Export { file } => {
            let count = commands::export_contacts(store, &file).await?;
            println!("Exported {count} contacts to:\n{}", file.display());
        }
        Commands::Stats { json } => {
            let stats = commands::contact_stats(store).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print!("{}", stats.render());
            }
        }
    }
    Ok(0)
}

fn print_contacts(contacts: &[Contact]) {
    println!(
        "{:<6} {:<14} {:<14} {:<8} {:<5} {:<20} {:<14}",
        "ID", "Firstname", "Lastname", "Gender", "Age", "Address", "Contact"
    );
    for c in contacts {
        let f = &c.fields;
        println!(
            "{:<6} {:<14} {:<14} {:<8} {:<5} {:<20} {:<14}",
            c.id, f.first_name, f.last_name, f.gender, f.age, f.address, f.contact
        );
    }
}
