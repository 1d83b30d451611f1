//! Chat with the course advisor in the terminal.

#[macro_use]
extern crate tracing;

use std::env;
use std::io::Write as _;
use std::time::Duration;

use course_advisor::core::conversation::{GREETING, Role};
use course_advisor::http::AdvisorConfigBuilder;
use course_advisor::{load_context, session_builder};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tokio::io::{self, AsyncBufReadExt};
use tokio::select;
use tokio::sync::mpsc;
use tokio::time::sleep;

enum SessionEvent {
    Idle,
    Message(String),
    SessionExpired,
}

const BAR_CHAR: &str = "▎";
const SESSION_EXPIRED_NOTICE: &str =
    "Session Expired! Please log in again to continue using the service.";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut config_builder = match env::var("COURSE_ADVISOR_SERVER_URL") {
        Ok(server_url) => AdvisorConfigBuilder::with_server_url(server_url),
        Err(_) => AdvisorConfigBuilder::default(),
    };
    if let Ok(cookie) = env::var("COURSE_ADVISOR_SESSION_COOKIE") {
        config_builder = config_builder.with_session_cookie(cookie);
    }
    let context = match env::var("COURSE_ADVISOR_CONTEXT") {
        Ok(path) => match load_context(&path) {
            Ok(context) => context,
            Err(err) => {
                eprintln!("{err}");
                return;
            }
        },
        Err(_) => Default::default(),
    };

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();

    let session = session_builder(config_builder.build())
        .with_context(context)
        .on_idle({
            let event_tx = event_tx.clone();
            move || {
                event_tx.send(SessionEvent::Idle).ok();
            }
        })
        .on_message({
            let event_tx = event_tx.clone();
            move |message| {
                if message.role == Role::Bot {
                    event_tx
                        .send(SessionEvent::Message(message.text.clone()))
                        .ok();
                }
            }
        })
        .on_session_expired({
            let event_tx = event_tx.clone();
            move || {
                event_tx.send(SessionEvent::SessionExpired).ok();
            }
        })
        .build();

    print_bot_message(GREETING);

    let progress_style = match ProgressStyle::with_template("{spinner} {wide_msg}")
    {
        Ok(style) => style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        Err(err) => {
            error!("invalid progress template: {err}");
            ProgressStyle::default_spinner()
        }
    };

    'outer: loop {
        print!("> ");
        std::io::stdout().flush().ok();

        let Some(line) = read_line().await else {
            break;
        };
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            continue;
        }
        if session.send_message(line).is_err() {
            break;
        }

        let mut progress_bar = None;

        loop {
            // Create a new progress bar if it has been finished.
            progress_bar
                .get_or_insert_with(|| {
                    let progress_bar = ProgressBar::new_spinner();
                    progress_bar.set_style(progress_style.clone());
                    progress_bar.set_message("🎓 Thinking...");
                    progress_bar
                })
                .inc(1);

            let sleep = sleep(Duration::from_millis(100));
            let event = select! {
                event = event_rx.recv() => {
                    let Some(event) = event else {
                        break 'outer;
                    };
                    event
                },
                _ = sleep => {
                    continue;
                }
            };

            // Finish the progress bar before printing anything else.
            if let Some(progress_bar) = &progress_bar {
                progress_bar.finish_and_clear();
            }
            progress_bar = None;

            match event {
                SessionEvent::Message(text) => print_bot_message(&text),
                SessionEvent::SessionExpired => {
                    println!(
                        "{}{}",
                        BAR_CHAR.bright_yellow(),
                        SESSION_EXPIRED_NOTICE.bright_yellow().bold()
                    );
                }
                SessionEvent::Idle => {
                    break;
                }
            }
        }
    }

    session.shutdown();
}

fn print_bot_message(text: &str) {
    println!("{}🎓 {}", BAR_CHAR.bright_cyan(), text.bright_white());
}

async fn read_line() -> Option<String> {
    let mut stdin = io::BufReader::new(io::stdin());
    let mut line = String::new();

    match stdin.read_line(&mut line).await {
        Ok(count) => {
            if count == 0 {
                return None;
            }
            Some(line)
        }
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}
