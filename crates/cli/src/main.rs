mod store;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;

use chaine_core::{Action, Actor, Document, LineItem, Role, Step};
use chaine_engine::{
    available_actions, check_prerequisites, BudgetLineAvailability, NoopSink, Payload,
    WorkflowEngine,
};
use chaine_storage::{MemoryState, MemoryStorage};

use store::StoreFile;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Expenditure chain workflow CLI.
#[derive(Parser)]
#[command(name = "chaine", version, about = "Expenditure chain workflow CLI")]
struct Cli {
    /// Path to the JSON store file
    #[arg(long, global = true, default_value = "chaine.json")]
    store: PathBuf,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Identity of the user running the command.
#[derive(Args)]
struct ActorArgs {
    /// Acting user id
    #[arg(long)]
    actor: String,

    /// Role held by the actor (repeatable: ADMIN, DG, DAAF, CB, ...)
    #[arg(long = "role", value_name = "ROLE")]
    roles: Vec<String>,
}

impl ActorArgs {
    fn parse(&self) -> Result<Actor, String> {
        let mut roles = Vec::with_capacity(self.roles.len());
        for name in &self.roles {
            let role = Role::parse(name).ok_or_else(|| format!("unknown role: {}", name))?;
            roles.push(role);
        }
        Ok(Actor::new(self.actor.clone(), roles))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create a draft document on a chain step
    Create {
        /// Document id
        id: String,
        /// Chain step (code or short code, e.g. EXPRESSION_BESOIN or EB)
        #[arg(long)]
        step: String,
        /// Document amount
        #[arg(long)]
        amount: Decimal,
        /// Budget line the amount draws on
        #[arg(long)]
        budget_line: String,
        /// Budget exercice (year)
        #[arg(long)]
        exercice: i32,
        /// Line item as LABEL=AMOUNT (repeatable)
        #[arg(long = "line", value_name = "LABEL=AMOUNT")]
        lines: Vec<String>,
        #[command(flatten)]
        actor: ActorArgs,
    },

    /// Submit a draft into the validation circuit
    Submit {
        id: String,
        /// Submit despite insufficient budget (where the step allows it)
        #[arg(long)]
        force_budget: bool,
        /// Justification for the budget override (>= 10 chars)
        #[arg(long)]
        justification: Option<String>,
        #[command(flatten)]
        actor: ActorArgs,
    },

    /// First-level verification of a submitted document
    Verify {
        id: String,
        /// Free-text comment recorded in the audit trail
        #[arg(long)]
        comment: Option<String>,
        #[command(flatten)]
        actor: ActorArgs,
    },

    /// Final validation of a verified document
    Validate {
        id: String,
        #[arg(long)]
        comment: Option<String>,
        #[command(flatten)]
        actor: ActorArgs,
    },

    /// Reject a document with a motif
    Reject {
        id: String,
        /// Motif for the rejection (>= 10 chars)
        #[arg(long)]
        motif: String,
        #[command(flatten)]
        actor: ActorArgs,
    },

    /// Defer a document with a motif and optional resume date
    Defer {
        id: String,
        /// Motif for the deferral (>= 10 chars)
        #[arg(long)]
        motif: String,
        /// Planned resume date (YYYY-MM-DD)
        #[arg(long)]
        resume_date: Option<String>,
        #[command(flatten)]
        actor: ActorArgs,
    },

    /// Put a deferred document back into the circuit
    Resume {
        id: String,
        #[command(flatten)]
        actor: ActorArgs,
    },

    /// Delete a draft (creator only)
    Delete {
        id: String,
        #[command(flatten)]
        actor: ActorArgs,
    },

    /// Show a document
    Show { id: String },

    /// List the actions an actor may attempt on a document
    Actions {
        id: String,
        #[command(flatten)]
        actor: ActorArgs,
    },

    /// Show the audit trail of a document
    Audit { id: String },

    /// Inspect or edit the budget ledger
    Budget {
        #[command(subcommand)]
        command: BudgetCommands,
    },
}

#[derive(Subcommand)]
enum BudgetCommands {
    /// List budget lines and their availability
    List,

    /// Create or replace a budget line
    Set {
        /// Budget line code
        code: String,
        #[arg(long, default_value = "")]
        label: String,
        /// Initial allocation for the exercice
        #[arg(long)]
        allocation: Decimal,
        /// Executed credit transfers received
        #[arg(long, default_value = "0")]
        transfers_in: Decimal,
        /// Executed credit transfers emitted
        #[arg(long, default_value = "0")]
        transfers_out: Decimal,
        /// Already committed
        #[arg(long, default_value = "0")]
        committed: Decimal,
        /// Reserved by pending engagements
        #[arg(long, default_value = "0")]
        reserved: Decimal,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Create {
            id,
            step,
            amount,
            budget_line,
            exercice,
            lines,
            actor,
        } => {
            cmd_create(
                &cli.store,
                &id,
                &step,
                amount,
                &budget_line,
                exercice,
                &lines,
                &actor,
                cli.output,
                cli.quiet,
            );
        }
        Commands::Submit {
            id,
            force_budget,
            justification,
            actor,
        } => {
            let payload = Payload {
                budget_override: force_budget,
                override_justification: justification,
                ..Payload::default()
            };
            cmd_transition(&cli.store, &id, Action::Submit, &actor, payload, cli.output, cli.quiet);
        }
        Commands::Verify { id, comment, actor } => {
            let payload = Payload {
                comment,
                ..Payload::default()
            };
            cmd_transition(&cli.store, &id, Action::Verify, &actor, payload, cli.output, cli.quiet);
        }
        Commands::Validate { id, comment, actor } => {
            let payload = Payload {
                comment,
                ..Payload::default()
            };
            cmd_transition(&cli.store, &id, Action::Validate, &actor, payload, cli.output, cli.quiet);
        }
        Commands::Reject { id, motif, actor } => {
            let payload = Payload::with_reason(motif);
            cmd_transition(&cli.store, &id, Action::Reject, &actor, payload, cli.output, cli.quiet);
        }
        Commands::Defer {
            id,
            motif,
            resume_date,
            actor,
        } => {
            let payload = Payload {
                reason: Some(motif),
                resume_date,
                ..Payload::default()
            };
            cmd_transition(&cli.store, &id, Action::Defer, &actor, payload, cli.output, cli.quiet);
        }
        Commands::Resume { id, actor } => {
            cmd_transition(
                &cli.store,
                &id,
                Action::Resume,
                &actor,
                Payload::default(),
                cli.output,
                cli.quiet,
            );
        }
        Commands::Delete { id, actor } => {
            cmd_transition(
                &cli.store,
                &id,
                Action::Delete,
                &actor,
                Payload::default(),
                cli.output,
                cli.quiet,
            );
        }
        Commands::Show { id } => {
            cmd_show(&cli.store, &id, cli.output, cli.quiet);
        }
        Commands::Actions { id, actor } => {
            cmd_actions(&cli.store, &id, &actor, cli.output, cli.quiet);
        }
        Commands::Audit { id } => {
            cmd_audit(&cli.store, &id, cli.output, cli.quiet);
        }
        Commands::Budget { command } => match command {
            BudgetCommands::List => cmd_budget_list(&cli.store, cli.output, cli.quiet),
            BudgetCommands::Set {
                code,
                label,
                allocation,
                transfers_in,
                transfers_out,
                committed,
                reserved,
            } => {
                let line = BudgetLineAvailability {
                    code: code.clone(),
                    label,
                    allocation,
                    transfers_in,
                    transfers_out,
                    committed,
                    reserved,
                };
                cmd_budget_set(&cli.store, &code, line, cli.output, cli.quiet);
            }
        },
    }
}

fn report_error(message: &str, output: OutputFormat, quiet: bool) {
    match output {
        OutputFormat::Json => {
            let err_json = serde_json::json!({ "error": message });
            eprintln!("{}", serde_json::to_string_pretty(&err_json).unwrap_or_default());
        }
        OutputFormat::Text => {
            if !quiet {
                eprintln!("error: {}", message);
            }
        }
    }
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to create tokio runtime")
}

fn load_store(path: &Path, output: OutputFormat, quiet: bool) -> StoreFile {
    match store::load(path) {
        Ok(s) => s,
        Err(e) => {
            report_error(&e, output, quiet);
            process::exit(1);
        }
    }
}

fn save_store(path: &Path, file: &StoreFile, output: OutputFormat, quiet: bool) {
    if let Err(e) = store::save(path, file) {
        report_error(&e, output, quiet);
        process::exit(1);
    }
}

fn parse_actor(args: &ActorArgs, output: OutputFormat, quiet: bool) -> Actor {
    match args.parse() {
        Ok(actor) => actor,
        Err(e) => {
            report_error(&e, output, quiet);
            process::exit(1);
        }
    }
}

/// Parse a repeatable `--line LABEL=AMOUNT` value.
fn parse_line_item(raw: &str) -> Result<LineItem, String> {
    let (label, amount) = raw
        .split_once('=')
        .ok_or_else(|| format!("invalid line item '{}': expected LABEL=AMOUNT", raw))?;
    let amount: Decimal = amount
        .parse()
        .map_err(|e| format!("invalid amount in line item '{}': {}", raw, e))?;
    Ok(LineItem::new(label, amount))
}

/// The state of the expenditure chain this document belongs to, read
/// from the store: one entry per step among the documents sharing the
/// same budget line and exercice, preferring a validated one.
fn chain_state(
    state: &MemoryState,
    budget_line_id: &str,
    exercice: i32,
) -> std::collections::BTreeMap<Step, chaine_core::Status> {
    let mut chain = std::collections::BTreeMap::new();
    for record in state.documents.values() {
        let doc = &record.document;
        if doc.budget_line_id != budget_line_id || doc.exercice != exercice {
            continue;
        }
        chain
            .entry(doc.step)
            .and_modify(|status: &mut chaine_core::Status| {
                if doc.status == chaine_core::Status::Validated {
                    *status = doc.status;
                }
            })
            .or_insert(doc.status);
    }
    chain
}

#[allow(clippy::too_many_arguments)]
fn cmd_create(
    store_path: &Path,
    id: &str,
    step: &str,
    amount: Decimal,
    budget_line: &str,
    exercice: i32,
    lines: &[String],
    actor_args: &ActorArgs,
    output: OutputFormat,
    quiet: bool,
) {
    let step = match Step::parse(step) {
        Some(s) => s,
        None => {
            report_error(&format!("unknown chain step: {}", step), output, quiet);
            process::exit(1);
        }
    };
    let actor = parse_actor(actor_args, output, quiet);
    let mut file = load_store(store_path, output, quiet);

    // Chain-order gate: the preceding step of this expenditure must be
    // validated, unless the step's waiver applies.
    let chain = chain_state(&file.workflow, budget_line, exercice);
    if let Err(e) = check_prerequisites(step, &chain, amount) {
        report_error(&e.to_string(), output, quiet);
        process::exit(1);
    }

    let mut document = Document::draft(id, step, amount, budget_line, actor.id.as_str(), exercice);
    for raw in lines {
        match parse_line_item(raw) {
            Ok(item) => document.lines.push(item),
            Err(e) => {
                report_error(&e, output, quiet);
                process::exit(1);
            }
        }
    }

    let engine = WorkflowEngine::new(
        MemoryStorage::from_state(file.workflow.clone()),
        file.budget.clone(),
        NoopSink,
    );
    let rt = runtime();
    match rt.block_on(engine.create_document(document, &actor)) {
        Ok(document) => {
            match engine.storage().export_state() {
                Ok(state) => file.workflow = state,
                Err(e) => {
                    report_error(&e.to_string(), output, quiet);
                    process::exit(1);
                }
            }
            save_store(store_path, &file, output, quiet);
            match output {
                OutputFormat::Json => print_json(&serde_json::json!({
                    "id": document.id,
                    "step": document.step,
                    "status": document.status,
                })),
                OutputFormat::Text => {
                    if !quiet {
                        println!(
                            "{}: {} created as {}",
                            document.id,
                            document.step.config().label,
                            document.status
                        );
                    }
                }
            }
        }
        Err(e) => {
            report_error(&e.to_string(), output, quiet);
            process::exit(1);
        }
    }
}

fn cmd_transition(
    store_path: &Path,
    id: &str,
    action: Action,
    actor_args: &ActorArgs,
    payload: Payload,
    output: OutputFormat,
    quiet: bool,
) {
    let actor = parse_actor(actor_args, output, quiet);
    let mut file = load_store(store_path, output, quiet);
    let engine = WorkflowEngine::new(
        MemoryStorage::from_state(file.workflow.clone()),
        file.budget.clone(),
        NoopSink,
    );
    let rt = runtime();
    match rt.block_on(engine.attempt_transition(id, action, &actor, &payload)) {
        Ok(outcome) => {
            match engine.storage().export_state() {
                Ok(state) => file.workflow = state,
                Err(e) => {
                    report_error(&e.to_string(), output, quiet);
                    process::exit(1);
                }
            }
            save_store(store_path, &file, output, quiet);
            match output {
                OutputFormat::Json => match &outcome.document {
                    Some(doc) => print_json(&serde_json::json!({
                        "id": doc.id,
                        "status": doc.status,
                        "reference": doc.reference,
                        "version": outcome.version,
                    })),
                    None => print_json(&serde_json::json!({
                        "id": id,
                        "deleted": true,
                    })),
                },
                OutputFormat::Text => {
                    if quiet {
                        return;
                    }
                    match &outcome.document {
                        Some(doc) => {
                            let reference = doc.reference.as_deref().unwrap_or("-");
                            println!(
                                "{}: {} (reference {}, version {})",
                                doc.id, doc.status, reference, outcome.version
                            );
                        }
                        None => println!("{}: deleted", id),
                    }
                }
            }
        }
        Err(e) => {
            report_error(&e.to_string(), output, quiet);
            process::exit(1);
        }
    }
}

fn cmd_show(store_path: &Path, id: &str, output: OutputFormat, quiet: bool) {
    let file = load_store(store_path, output, quiet);
    let Some(record) = file.workflow.documents.get(id) else {
        report_error(&format!("document not found: {}", id), output, quiet);
        process::exit(1);
    };
    match output {
        OutputFormat::Json => print_json(record),
        OutputFormat::Text => {
            let doc = &record.document;
            println!("id:        {}", doc.id);
            println!("step:      {}", doc.step.config().label);
            println!("status:    {}", doc.status);
            println!("reference: {}", doc.reference.as_deref().unwrap_or("-"));
            println!("amount:    {} ({})", doc.amount, doc.budget_line_id);
            println!("stage:     {}/{}", doc.current_validation_step, doc.step.config().stages);
            println!("creator:   {}", doc.created_by);
            println!("version:   {}", record.version);
            if let Some(motif) = &doc.motif {
                println!("motif:     {}", motif);
            }
        }
    }
}

fn cmd_actions(
    store_path: &Path,
    id: &str,
    actor_args: &ActorArgs,
    output: OutputFormat,
    quiet: bool,
) {
    let actor = parse_actor(actor_args, output, quiet);
    let file = load_store(store_path, output, quiet);
    let Some(record) = file.workflow.documents.get(id) else {
        report_error(&format!("document not found: {}", id), output, quiet);
        process::exit(1);
    };
    let actions = available_actions(&record.document, &actor);
    match output {
        OutputFormat::Json => print_json(&actions),
        OutputFormat::Text => {
            if actions.is_empty() {
                println!("no available actions");
            } else {
                for action in actions {
                    println!("{}", action.as_str());
                }
            }
        }
    }
}

fn cmd_audit(store_path: &Path, id: &str, output: OutputFormat, quiet: bool) {
    let file = load_store(store_path, output, quiet);
    let entries: Vec<_> = file
        .workflow
        .audit
        .iter()
        .filter(|e| e.entity_id == id)
        .collect();
    if entries.is_empty() {
        report_error(&format!("no audit trail for: {}", id), output, quiet);
        process::exit(1);
    }
    match output {
        OutputFormat::Json => print_json(&entries),
        OutputFormat::Text => {
            for entry in entries {
                let integrity = if entry.verify_integrity() {
                    ""
                } else {
                    "  [INTEGRITY FAILURE]"
                };
                let reason = entry
                    .reason
                    .as_deref()
                    .map(|r| format!("  motif: {}", r))
                    .unwrap_or_default();
                println!(
                    "{}  {}  by {}{}{}",
                    entry.timestamp,
                    entry.action.as_str(),
                    entry.actor_id,
                    reason,
                    integrity
                );
            }
        }
    }
}

fn cmd_budget_list(store_path: &Path, output: OutputFormat, quiet: bool) {
    let file = load_store(store_path, output, quiet);
    match output {
        OutputFormat::Json => print_json(&file.budget),
        OutputFormat::Text => {
            if file.budget.lines.is_empty() {
                println!("no budget lines");
                return;
            }
            for (code, line) in &file.budget.lines {
                println!(
                    "{}  allocation {}  committed {}  reserved {}  available {}",
                    code,
                    line.current_allocation(),
                    line.committed,
                    line.reserved,
                    line.available()
                );
            }
        }
    }
}

fn cmd_budget_set(
    store_path: &Path,
    code: &str,
    line: BudgetLineAvailability,
    output: OutputFormat,
    quiet: bool,
) {
    let mut file = load_store(store_path, output, quiet);
    let available = line.available();
    file.budget.insert(code, line);
    save_store(store_path, &file, output, quiet);
    match output {
        OutputFormat::Json => print_json(&serde_json::json!({
            "code": code,
            "available": available,
        })),
        OutputFormat::Text => {
            if !quiet {
                println!("{}: available {}", code, available);
            }
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    let pretty =
        serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("serialization error: {}", e));
    println!("{}", pretty);
}
