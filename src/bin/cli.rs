//! DEX Dashboard CLI
//!
//! Command-line access to the persisted dashboards and API settings:
//! - List and inspect dashboards
//! - Create, rename and remove dashboards
//! - Add, move, reconfigure and remove widgets
//! - Manage the API key

use anyhow::Context;
use clap::{Parser, Subcommand};
use dex_dashboard::config::generate_default_config;
use dex_dashboard::logging::init_tracing;
use dex_dashboard::widgets::{require_widget_type, DROP_SIZE, TOOL_TYPES, WIDGET_TYPES};
use dex_dashboard::{ApiSettings, App, Config, Layout, Payload, Widget, WidgetDraft};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dex-dashboard")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Manage DEX dashboards and their widgets")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the storage data directory
    #[arg(long, global = true)]
    pub data_dir: Option<String>,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List dashboards
    List,

    /// Show the widgets of a dashboard
    Show {
        /// Dashboard id
        dashboard: String,
    },

    /// Create an empty dashboard
    AddDashboard {
        /// Title
        #[arg(default_value = "New Dashboard")]
        title: String,
    },

    /// Rename a dashboard
    Rename {
        /// Dashboard id
        dashboard: String,
        /// New title
        title: String,
    },

    /// Remove a dashboard and its widgets
    RemoveDashboard {
        /// Dashboard id
        dashboard: String,
    },

    /// Add a widget to a dashboard
    AddWidget {
        /// Dashboard id
        dashboard: String,
        /// Widget type tag (see `widget-types`)
        widget_type: String,
        /// Payload as a JSON object
        #[arg(short, long, default_value = "{}")]
        payload: String,
        #[arg(short, long, default_value = "0")]
        x: u32,
        #[arg(short, long, default_value = "0")]
        y: u32,
        /// Width (default: the widget type's default size)
        #[arg(short, long)]
        w: Option<u32>,
        /// Height (default: the widget type's default size)
        #[arg(long)]
        h: Option<u32>,
    },

    /// Move or resize a widget
    MoveWidget {
        /// Dashboard id
        dashboard: String,
        /// Widget id
        widget: String,
        #[arg(short, long)]
        x: Option<u32>,
        #[arg(short, long)]
        y: Option<u32>,
        #[arg(short, long)]
        w: Option<u32>,
        #[arg(long)]
        h: Option<u32>,
    },

    /// Replace a widget's payload
    SetPayload {
        /// Dashboard id
        dashboard: String,
        /// Widget id
        widget: String,
        /// Payload as a JSON object
        payload: String,
    },

    /// Remove a widget
    RemoveWidget {
        /// Dashboard id
        dashboard: String,
        /// Widget id
        widget: String,
    },

    /// Show or change the API key
    ApiKey {
        /// New API key
        key: Option<String>,
        /// Clear the stored key
        #[arg(long, conflicts_with = "key")]
        clear: bool,
    },

    /// List registered widget types and tools
    WidgetTypes,

    /// Print the full dashboards document
    Export,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    if let Some(data_dir) = &cli.data_dir {
        config.storage.data_dir = data_dir.clone();
    }
    init_tracing(&config.logging);

    let json = cli.format == "json";

    match &cli.command {
        Commands::Config { output } => {
            let content = generate_default_config();
            match output {
                Some(path) => {
                    std::fs::write(path, content)
                        .with_context(|| format!("writing {:?}", path))?;
                    println!("Wrote config to {:?}", path);
                }
                None => print!("{}", content),
            }
            return Ok(());
        }
        Commands::WidgetTypes => {
            print_widget_types(json)?;
            return Ok(());
        }
        _ => {}
    }

    let mut app = App::open(config)?;

    match cli.command {
        Commands::List => {
            let dashboards = app.dashboards().list_dashboards();
            if json {
                println!("{}", serde_json::to_string_pretty(&dashboards)?);
            } else if dashboards.is_empty() {
                println!("No dashboards");
            } else {
                println!("{:<38} {}", "ID", "TITLE");
                for dashboard in dashboards {
                    println!("{:<38} {}", dashboard.id, dashboard.title);
                }
            }
        }

        Commands::Show { dashboard } => {
            let summary = app.dashboards().get_dashboard(&dashboard)?;
            let widgets = app.dashboards().get_widgets(&dashboard)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&widgets)?);
            } else {
                println!("{} ({})", summary.title, summary.id);
                print_widgets(&widgets);
            }
        }

        Commands::AddDashboard { title } => {
            let id = app.dashboards_mut().add_dashboard(title)?;
            println!("{}", id);
        }

        Commands::Rename { dashboard, title } => {
            app.dashboards_mut().update_dashboard_title(&dashboard, title)?;
        }

        Commands::RemoveDashboard { dashboard } => {
            if !app.dashboards().has_dashboard(&dashboard) {
                eprintln!("No dashboard {}; nothing removed", dashboard);
            }
            app.dashboards_mut().remove_dashboard(&dashboard)?;
        }

        Commands::AddWidget {
            dashboard,
            widget_type,
            payload,
            x,
            y,
            w,
            h,
        } => {
            let payload = parse_payload(&payload)?;
            let mut layout = match require_widget_type(&widget_type) {
                Ok(registered) => {
                    let missing = registered.missing_fields(&payload);
                    if !missing.is_empty() {
                        eprintln!(
                            "Warning: payload has no {} for {}",
                            missing.join(", "),
                            registered.tag
                        );
                    }
                    registered.default_layout(x, y)
                }
                Err(e) => {
                    eprintln!("Warning: {} (stored anyway, no renderer will pick it up)", e);
                    Layout::new(x, y, DROP_SIZE.0, DROP_SIZE.1)
                }
            };
            layout.w = w.unwrap_or(layout.w);
            layout.h = h.unwrap_or(layout.h);
            let draft = WidgetDraft::new(widget_type, layout).payload(payload);
            let id = app.dashboards_mut().add_widget(&dashboard, draft)?;
            println!("{}", id);
        }

        Commands::MoveWidget {
            dashboard,
            widget,
            x,
            y,
            w,
            h,
        } => {
            let mut layouts = app.dashboards().get_layouts(&dashboard)?;
            let layout = layouts
                .iter_mut()
                .find(|layout| layout.i == widget)
                .with_context(|| format!("no widget {} on dashboard {}", widget, dashboard))?;
            layout.x = x.unwrap_or(layout.x);
            layout.y = y.unwrap_or(layout.y);
            layout.w = w.unwrap_or(layout.w);
            layout.h = h.unwrap_or(layout.h);
            app.dashboards_mut()
                .update_dashboard_layouts(&dashboard, &layouts)?;
        }

        Commands::SetPayload {
            dashboard,
            widget,
            payload,
        } => {
            let payload = parse_payload(&payload)?;
            app.dashboards_mut()
                .update_widget_payload(&dashboard, &widget, payload)?;
        }

        Commands::RemoveWidget { dashboard, widget } => {
            app.dashboards_mut().remove_widget(&dashboard, &widget)?;
        }

        Commands::ApiKey { key, clear } => {
            if clear {
                app.api_settings_mut().set(ApiSettings::default())?;
                println!("API key cleared");
            } else if let Some(key) = key {
                app.api_settings_mut().set_api_key(key)?;
                println!("API key saved");
            } else {
                match app.api_settings().get().api_key {
                    Some(key) => println!("{}", mask(&key)),
                    None => println!("No API key set"),
                }
            }
        }

        Commands::Export => {
            println!(
                "{}",
                serde_json::to_string_pretty(&app.dashboards().snapshot())?
            );
        }

        Commands::Config { .. } | Commands::WidgetTypes => {}
    }

    Ok(())
}

fn parse_payload(json: &str) -> anyhow::Result<Payload> {
    serde_json::from_str(json).with_context(|| format!("payload is not a JSON object: {}", json))
}

fn print_widgets(widgets: &[Widget]) {
    if widgets.is_empty() {
        println!("  (no widgets)");
        return;
    }
    println!(
        "  {:<38} {:<24} {:>3} {:>3} {:>3} {:>3}  {}",
        "ID", "TYPE", "X", "Y", "W", "H", "PAYLOAD"
    );
    for widget in widgets {
        println!(
            "  {:<38} {:<24} {:>3} {:>3} {:>3} {:>3}  {}",
            widget.id(),
            widget.widget_type,
            widget.layout.x,
            widget.layout.y,
            widget.layout.w,
            widget.layout.h,
            serde_json::Value::Object(widget.payload.clone())
        );
    }
}

fn print_widget_types(json: bool) -> anyhow::Result<()> {
    if json {
        let value = serde_json::json!({
            "widgets": WIDGET_TYPES,
            "tools": TOOL_TYPES,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("Widget types:");
    for widget_type in WIDGET_TYPES {
        println!(
            "  {:<24} {:<28} {}x{}  [{}]",
            widget_type.tag,
            widget_type.name,
            widget_type.default_size.0,
            widget_type.default_size.1,
            widget_type.payload_fields.join(", ")
        );
    }
    println!();
    println!("Tools:");
    for tool in TOOL_TYPES {
        println!("  {:<24} {} → {}", tool.tag, tool.name, tool.produces.join(", "));
    }
    Ok(())
}

/// Show only the last four characters of a secret
fn mask(secret: &str) -> String {
    let visible: String = secret
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("{}{}", "*".repeat(secret.chars().count().saturating_sub(4)), visible)
}
