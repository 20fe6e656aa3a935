//! Interactive console.
//!
//! The shell has two routes. `Login` prompts for credentials; `Console` reads
//! commands. Any [`AuthEvent::Unauthorized`] published by the request layer
//! moves the shell back to `Login`, however many arrive.

use std::borrow::Cow::{self, Borrowed, Owned};
use std::str::FromStr;

use anyhow::Result;
use colored::Colorize;
use opsdesk_core::config::LOGIN_ROUTE;
use opsdesk_core::request::{HttpMethod, RequestDescriptor};
use opsdesk_core::session::AuthEvent;
use opsdesk_interaction::{ApiError, Collection, Credentials, ResourceService};
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper, history::DefaultHistory};
use serde_json::Value;
use tokio::sync::broadcast::{Receiver, error::TryRecvError};

use crate::app::AppContext;
use crate::commands::{hint_for, output, session};

const COMMANDS: &[&str] = &[
    "get", "post", "put", "patch", "delete", "list", "whoami", "logout", "help", "quit",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Console,
}

impl Route {
    fn path(&self) -> &'static str {
        match self {
            Route::Login => LOGIN_ROUTE,
            Route::Console => "/",
        }
    }
}

/// A parsed console line.
#[derive(Debug, PartialEq)]
pub enum ShellCommand {
    Send {
        method: HttpMethod,
        path: String,
        body: Option<Value>,
    },
    List(Collection),
    Whoami,
    Logout,
    Help,
    Quit,
}

impl FromStr for ShellCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (head, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();

        match head.to_ascii_lowercase().as_str() {
            "quit" | "exit" => Ok(ShellCommand::Quit),
            "help" | "?" => Ok(ShellCommand::Help),
            "whoami" => Ok(ShellCommand::Whoami),
            "logout" => Ok(ShellCommand::Logout),
            "list" => rest
                .parse::<Collection>()
                .map(ShellCommand::List)
                .map_err(|_| format!("unknown collection '{}'", rest)),
            verb => {
                let method: HttpMethod = verb
                    .parse()
                    .map_err(|_| format!("unknown command '{}' (try 'help')", head))?;
                let (path, body) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
                if path.is_empty() {
                    return Err(format!("usage: {} <path> [json]", verb));
                }
                let body = match body.trim() {
                    "" => None,
                    raw => Some(
                        serde_json::from_str(raw).map_err(|e| format!("invalid JSON body: {}", e))?,
                    ),
                };
                Ok(ShellCommand::Send {
                    method,
                    path: path.to_string(),
                    body,
                })
            }
        }
    }
}

/// Completion and inline hints for the first word of a console line.
struct ShellHelper;

impl Helper for ShellHelper {}

impl Completer for ShellHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];
        if line.contains(' ') {
            return Ok((0, vec![]));
        }
        let candidates = COMMANDS
            .iter()
            .filter(|cmd| cmd.starts_with(line))
            .map(|cmd| Pair {
                display: cmd.to_string(),
                replacement: cmd.to_string(),
            })
            .collect();
        Ok((0, candidates))
    }
}

impl Hinter for ShellHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];
        if line.is_empty() || line.contains(' ') {
            return None;
        }
        COMMANDS
            .iter()
            .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
            .map(|cmd| cmd[line.len()..].to_string())
    }
}

impl Highlighter for ShellHelper {
    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Owned(hint.bright_black().to_string())
    }

    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        Borrowed(line)
    }
}

impl Validator for ShellHelper {}

/// Applies pending auth events to `route`. Returns the new route.
fn drain_events(events: &mut Receiver<AuthEvent>, mut route: Route) -> Route {
    loop {
        match events.try_recv() {
            Ok(AuthEvent::Unauthorized { method, path }) => {
                tracing::debug!("{} {} was rejected; routing to {}", method, path, Route::Login.path());
                if route != Route::Login {
                    println!("{}", "Session expired. Please log in again.".yellow());
                }
                route = Route::Login;
            }
            Ok(AuthEvent::LoggedOut) => route = Route::Login,
            Ok(AuthEvent::LoggedIn { .. }) => route = Route::Console,
            Err(TryRecvError::Lagged(skipped)) => {
                tracing::warn!("Missed {} auth events", skipped);
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return route,
        }
    }
}

pub async fn run(ctx: &AppContext) -> Result<()> {
    let mut events = ctx.client.events().subscribe();
    let mut rl: Editor<ShellHelper, DefaultHistory> = Editor::new()?;
    rl.set_helper(Some(ShellHelper));

    println!("{}", "=== opsdesk ===".bright_magenta().bold());
    println!("{}", format!("API: {}", ctx.client.base_url()).bright_black());
    println!("{}", "Type 'help' for commands, 'quit' to exit.".bright_black());
    println!();

    let mut route = if ctx.client.tokens().is_authenticated() {
        Route::Console
    } else {
        Route::Login
    };

    loop {
        route = drain_events(&mut events, route);

        let outcome = match route {
            Route::Login => login_prompt(ctx, &mut rl).await,
            Route::Console => console_prompt(ctx, &mut rl).await,
        };

        match outcome {
            Ok(true) => continue,
            Ok(false) => break,
            Err(e) => {
                eprintln!("{} {:#}", "error:".red().bold(), e);
                // A 401 is answered by the route change, not a hint.
                let unauthorized = e
                    .downcast_ref::<ApiError>()
                    .is_some_and(ApiError::is_unauthorized);
                if let Some(hint) = hint_for(&e).filter(|_| !unauthorized) {
                    eprintln!("{}", hint.bright_black());
                }
            }
        }
    }

    println!("{}", "Goodbye!".bright_green());
    Ok(())
}

/// `Ok(false)` ends the shell.
async fn login_prompt(ctx: &AppContext, rl: &mut Editor<ShellHelper, DefaultHistory>) -> Result<bool> {
    println!("{}", format!("[{}]", LOGIN_ROUTE).bright_cyan());
    let Some(username) = read_line(rl, "username: ")? else {
        return Ok(false);
    };
    let username = username.trim().to_string();
    if username.is_empty() {
        return Ok(true);
    }
    let Some(password) = read_line(rl, "password: ")? else {
        return Ok(false);
    };

    let identity = ctx.auth.login(&Credentials::new(username, password)).await?;
    println!("{}", "Logged in".green());
    session::print_identity(&identity);
    Ok(true)
}

async fn console_prompt(
    ctx: &AppContext,
    rl: &mut Editor<ShellHelper, DefaultHistory>,
) -> Result<bool> {
    let Some(line) = read_line(rl, ">> ")? else {
        return Ok(false);
    };
    if line.trim().is_empty() {
        return Ok(true);
    }
    let _ = rl.add_history_entry(line.as_str());

    let command = match line.parse::<ShellCommand>() {
        Ok(command) => command,
        Err(message) => {
            println!("{}", message.yellow());
            return Ok(true);
        }
    };

    match command {
        ShellCommand::Quit => return Ok(false),
        ShellCommand::Help => print_help(),
        ShellCommand::Whoami => session::whoami(ctx)?,
        ShellCommand::Logout => session::logout(ctx)?,
        ShellCommand::List(collection) => {
            let service = ResourceService::untyped(ctx.client.clone(), collection);
            let items = service.list_or_default().await;
            println!("{}", format!("{} {}", items.len(), collection).bright_black());
            for item in items {
                println!("{}", serde_json::to_string(&item)?);
            }
        }
        ShellCommand::Send { method, path, body } => {
            let mut descriptor = RequestDescriptor::new(method, path);
            if let Some(body) = body {
                descriptor = descriptor.with_json(body);
            }
            let response = ctx.client.execute(descriptor).await?;
            output::emit(response, None)?;
        }
    }
    Ok(true)
}

/// `None` on Ctrl-D. Ctrl-C yields an empty line.
fn read_line(rl: &mut Editor<ShellHelper, DefaultHistory>, prompt: &str) -> Result<Option<String>> {
    match rl.readline(prompt) {
        Ok(line) => Ok(Some(line)),
        Err(ReadlineError::Interrupted) => {
            println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
            Ok(Some(String::new()))
        }
        Err(ReadlineError::Eof) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn print_help() {
    let rows = [
        ("get <path>", "GET a path, e.g. get books/42"),
        ("post|put|patch <path> <json>", "send a JSON body"),
        ("delete <path>", "DELETE a record"),
        ("list <collection>", "books, employees, events, materials, quotations"),
        ("whoami", "show the current identity"),
        ("logout", "forget the session"),
        ("quit", "leave the shell"),
    ];
    for (usage, about) in rows {
        println!("  {:<30} {}", usage.bright_cyan(), about.bright_black());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opsdesk_core::session::SessionEvents;
    use serde_json::json;

    #[test]
    fn test_parse_send_with_body() {
        let command: ShellCommand = r#"post books {"title": "Dune"}"#.parse().unwrap();
        assert_eq!(
            command,
            ShellCommand::Send {
                method: HttpMethod::Post,
                path: "books".to_string(),
                body: Some(json!({"title": "Dune"})),
            }
        );
    }

    #[test]
    fn test_parse_get_and_list() {
        assert_eq!(
            "GET employees?page=2".parse::<ShellCommand>().unwrap(),
            ShellCommand::Send {
                method: HttpMethod::Get,
                path: "employees?page=2".to_string(),
                body: None,
            }
        );
        assert_eq!(
            "list quotations".parse::<ShellCommand>().unwrap(),
            ShellCommand::List(Collection::Quotations)
        );
        assert_eq!("exit".parse::<ShellCommand>().unwrap(), ShellCommand::Quit);
    }

    #[test]
    fn test_parse_errors() {
        assert!("frobnicate".parse::<ShellCommand>().is_err());
        assert!("get".parse::<ShellCommand>().is_err());
        assert!("list spaceships".parse::<ShellCommand>().is_err());
        assert!("post books {oops".parse::<ShellCommand>().is_err());
    }

    #[test]
    fn test_unauthorized_routes_to_login() {
        let events = SessionEvents::new();
        let mut rx = events.subscribe();
        events.publish(AuthEvent::Unauthorized {
            method: HttpMethod::Get,
            path: "books".to_string(),
        });
        events.publish(AuthEvent::Unauthorized {
            method: HttpMethod::Get,
            path: "events".to_string(),
        });

        assert_eq!(drain_events(&mut rx, Route::Console), Route::Login);
        assert_eq!(Route::Login.path(), "/login");
    }

    #[test]
    fn test_login_event_routes_to_console() {
        let events = SessionEvents::new();
        let mut rx = events.subscribe();
        events.publish(AuthEvent::LoggedIn { user_id: None });

        assert_eq!(drain_events(&mut rx, Route::Login), Route::Console);
        assert_eq!(drain_events(&mut rx, Route::Console), Route::Console);
    }
}
