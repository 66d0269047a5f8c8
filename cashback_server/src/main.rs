use cashback_engine::SyncOutcome;
use cashback_server::{
    cli::{display_envs, Arguments, Command},
    config::ServerConfig,
    errors::ServerError,
    server::{add_user, convert_link, run_server, show_balance, sync_now},
};
use clap::Parser;
use dotenvy::dotenv;
use log::info;
use serde::Serialize;

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init();
    let args = Arguments::parse();
    if let Command::Env = args.selected_command() {
        display_envs();
        return;
    }
    let config = ServerConfig::from_env_or_default();
    if let Err(e) = run_command(args.selected_command(), args.json, config).await {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

async fn run_command(command: &Command, json: bool, config: ServerConfig) -> Result<(), ServerError> {
    match command {
        Command::Run | Command::Env => {
            info!("🚀️ Starting order sync. Syncing every {} minutes", config.sync_interval.num_minutes());
            run_server(config).await?;
            println!("Bye!");
            Ok(())
        },
        Command::SyncNow => {
            let outcome = sync_now(&config).await?;
            if json {
                let report = match outcome {
                    SyncOutcome::Completed(report) => Some(report),
                    SyncOutcome::AlreadyRunning => None,
                };
                return print_json(&report);
            }
            match outcome {
                SyncOutcome::Completed(report) => {
                    println!(
                        "Synced {} order events from {} to {}: {}",
                        report.fetched, report.window_start, report.window_end, report.summary
                    );
                },
                SyncOutcome::AlreadyRunning => println!("A sync is already running"),
            }
            Ok(())
        },
        Command::Convert { user, url } => {
            let result = convert_link(&config, user, url).await?;
            if json {
                return print_json(&result);
            }
            println!("Affiliate link: {}", result.conversion.affiliate_url);
            if let Some(meta) = &result.metadata {
                println!("Product:        {}", meta.name.as_deref().unwrap_or("Unknown"));
            }
            match result.estimated_cashback {
                Some(amount) => println!("Est. cashback:  {amount}"),
                None => println!("Est. cashback:  not available"),
            }
            Ok(())
        },
        Command::AddUser { user } => {
            add_user(&config, user).await?;
            println!("User {} registered", user.trim());
            Ok(())
        },
        Command::Balance { user } => {
            let summary = show_balance(&config, user).await?;
            if json {
                return print_json(&summary);
            }
            println!("User:      {}", summary.account.id);
            println!("Available: {}", summary.account.available_balance);
            println!("Pending:   {}", summary.account.pending_balance);
            println!(
                "Orders:    {} ({} pending, {} completed). Lifetime cashback {}",
                summary.order_count, summary.pending_orders, summary.completed_orders, summary.total_cashback
            );
            Ok(())
        },
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), ServerError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
