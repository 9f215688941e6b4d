//! `syncd handlers list` / `syncd handlers info <name>` — bootstraps the
//! application state just enough to build the handler set, then prints it
//! in the requested format and exits, without starting the HTTP server.
//! Mirrors the exit-code contract of the original's standalone CLI:
//! 0 on success, 1 if a named lookup finds nothing.

use sync_core::Settings;

use crate::app::AppState;
use crate::cli::{HandlersAction, OutputFormat};

pub async fn run(settings: Settings, action: HandlersAction, format: OutputFormat) -> anyhow::Result<i32> {
    let state = AppState::bootstrap(settings).await?;

    match action {
        HandlersAction::List => {
            let names = state.handler_names().await;
            print_list(&names, format);
            Ok(0)
        }
        HandlersAction::Info { name } => match state.find_handler(&name).await {
            Some(handler) => {
                print_info(handler.name(), handler.priority(), format);
                Ok(0)
            }
            None => {
                eprintln!("no handler named [{name}]");
                Ok(1)
            }
        },
    }
}

fn print_list(names: &[String], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(names).expect("names always serialize"));
        }
        OutputFormat::Yaml => {
            println!("{}", serde_yaml::to_string(names).expect("names always serialize"));
        }
        OutputFormat::Flat | OutputFormat::Table => {
            for name in names {
                println!("{name}");
            }
        }
    }
}

fn print_info(name: &str, priority: u32, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({"name": name, "priority": priority})
            );
        }
        OutputFormat::Yaml => {
            println!("name: {name}\npriority: {priority}");
        }
        OutputFormat::Flat => {
            println!("{name}\t{priority}");
        }
        OutputFormat::Table => {
            println!("{:<24} {:>8}", name, priority);
        }
    }
}
