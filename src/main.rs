use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use school_finder::config;
use school_finder::nces;
use school_finder::search::{ControllerEvent, InputAction};

const HELP: &str = "\
commands:
  d <text>   type into the district field
  s <text>   type into the school field
  pd <n>     pick district option n
  ps <n>     pick school option n
  cd | cs    clear district / school selection
  show       print both fields as JSON
  q          quit";

/// Terminal command / 终端命令
#[derive(Debug, PartialEq)]
enum Command {
    District(String),
    School(String),
    PickDistrict(usize),
    PickSchool(usize),
    ClearDistrict,
    ClearSchool,
    Show,
    Help,
    Quit,
}

fn parse_index(arg: &str) -> Result<usize, String> {
    arg.trim()
        .parse()
        .map_err(|_| format!("not an option number: {:?}", arg.trim()))
}

fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim_end_matches(['\r', '\n']);
    let (head, rest) = match line.split_once(' ') {
        Some((head, rest)) => (head, rest),
        None => (line, ""),
    };

    match head {
        "d" => Ok(Command::District(rest.to_string())),
        "s" => Ok(Command::School(rest.to_string())),
        "pd" => parse_index(rest).map(Command::PickDistrict),
        "ps" => parse_index(rest).map(Command::PickSchool),
        "cd" => Ok(Command::ClearDistrict),
        "cs" => Ok(Command::ClearSchool),
        "show" => Ok(Command::Show),
        "help" | "?" => Ok(Command::Help),
        "q" | "quit" | "exit" => Ok(Command::Quit),
        other => Err(format!("unknown command {:?} (try `help`)", other)),
    }
}

fn render_event(event: &ControllerEvent) -> String {
    match event {
        ControllerEvent::FetchStarted { controller, keyword, dependency, .. } => match dependency {
            Some(dependency) => format!("[{}] searching {:?} in {}", controller, keyword, dependency),
            None => format!("[{}] searching {:?}", controller, keyword),
        },
        ControllerEvent::ResultsChanged { controller, options } => {
            let mut out = format!("[{}] {} options", controller, options.len());
            for (i, option) in options.iter().enumerate() {
                out.push_str(&format!("\n  {:>3}  {}  ({})", i, option.label, option.value));
            }
            out
        }
        ControllerEvent::FetchFailed { controller, error } => {
            format!("[{}] search failed: {}", controller, error)
        }
        ControllerEvent::SelectionChanged { controller, value } => match value {
            Some(value) => format!("[{}] selected {} ({})", controller, value.label, value.value),
            None => format!("[{}] selection cleared", controller),
        },
        ControllerEvent::Reset { controller, .. } => format!("[{}] reset", controller),
    }
}

fn print_events(mut events: broadcast::Receiver<ControllerEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => println!("{}", render_event(&event)),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("Event printer lagged, skipped {} events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "school_finder=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("school-finder {} (built {})", env!("CARGO_PKG_VERSION"), env!("BUILD_TIME"));

    // Load configuration / 加载配置
    let app_config = config::init_config().map_err(anyhow::Error::msg)?.read().clone();
    tracing::info!(
        "Debounce {} ms, max {} results, fetch timeout {} ms",
        app_config.search.debounce_ms,
        app_config.search.max_results,
        app_config.search.fetch_timeout_ms
    );

    let finder = nces::finder_from_config(&app_config)?;
    let printers = [
        print_events(finder.district().subscribe()),
        print_events(finder.school().subscribe()),
    ];

    println!("{}", HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        match command {
            Command::District(text) => finder.district().on_input_change(&text, InputAction::InputChange),
            Command::School(text) => finder.school().on_input_change(&text, InputAction::InputChange),
            Command::PickDistrict(index) => {
                if finder.pick_district(index).is_none() {
                    println!("no district option {}", index);
                }
            }
            Command::PickSchool(index) => {
                if finder.pick_school(index).is_none() {
                    println!("no school option {}", index);
                }
            }
            Command::ClearDistrict => finder.district().on_change(None),
            Command::ClearSchool => finder.school().on_change(None),
            Command::Show => println!("{}", serde_json::to_string_pretty(&finder.snapshot())?),
            Command::Help => println!("{}", HELP),
            Command::Quit => break,
        }
    }

    finder.shutdown();
    for printer in printers {
        printer.abort();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use school_finder::models::SelectOption;

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("d Peninsula"), Ok(Command::District("Peninsula".into())));
        assert_eq!(parse_command("d"), Ok(Command::District(String::new())));
        assert_eq!(parse_command("s st. mary's high\r\n"), Ok(Command::School("st. mary's high".into())));
        assert_eq!(parse_command("pd 3"), Ok(Command::PickDistrict(3)));
        assert_eq!(parse_command("q"), Ok(Command::Quit));
        assert!(parse_command("pd x").is_err());
        assert!(parse_command("zz").is_err());
    }

    #[test]
    fn test_render_results() {
        let event = ControllerEvent::ResultsChanged {
            controller: "district".into(),
            options: vec![SelectOption { value: "LEA123".into(), label: "Peninsula Unified".into() }],
        };
        assert_eq!(render_event(&event), "[district] 1 options\n    0  Peninsula Unified  (LEA123)");
    }
}
