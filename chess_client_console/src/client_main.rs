use std::fmt;
use std::io;
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::Duration;

use anyhow::Context;
use chess_client::api::{self, ApiReply};
use chess_client::client::{ClientOptions, ClientPhase, ClientState, NotableEvent};
use chess_client::coord::Point;
use chess_client::location::{DebugQuery, GameLocation};
use chess_client::piece::PromotionPiece;
use chess_client::poller::POLL_INTERVAL;
use chess_client::promotion::PromotionResolver;
use chess_client::session::{GameMode, PlayerSide};
use crossterm::style::{self, Stylize};
use crossterm::{cursor, event as term_event, execute, terminal};
use instant::Instant;
use itertools::Itertools;
use log::{info, warn};
use scopeguard::defer;
use url::Url;

use crate::client_config::ConsoleConfig;
use crate::network::HttpTransport;
use crate::tui;


const TICK_INTERVAL: Duration = Duration::from_millis(100);

pub struct ClientConfig {
    pub origin: Url,
    pub options: ClientOptions,
    pub default_mode: Option<GameMode>,
    pub default_side: Option<PlayerSide>,
}

impl ClientConfig {
    // Splits a game URL into the server origin, the game location and the debug query.
    pub fn new(url: Url, config: ConsoleConfig) -> anyhow::Result<Self> {
        let location = GameLocation::parse(url.path()).context("Parsing game location")?;
        let debug = DebugQuery::from_query(url.query().unwrap_or(""));
        let mut origin = url;
        origin.set_path("/");
        origin.set_query(None);
        origin.set_fragment(None);
        Ok(ClientConfig {
            origin,
            options: ClientOptions {
                location,
                debug,
                poll_interval: config.poll_interval.unwrap_or(POLL_INTERVAL),
            },
            default_mode: config.default_mode,
            default_side: config.default_side,
        })
    }
}

enum IncomingEvent {
    Network(ApiReply),
    Terminal(term_event::Event),
    Tick,
}

#[derive(Default)]
struct ScreenState {
    keyboard_input: String,
    game_url: Option<String>,
    message: Option<String>,
    command_error: Option<String>,
    promotion: Option<PromotionResolver>,
}

fn writeln_raw(stdout: &mut io::Stdout, v: impl fmt::Display) -> io::Result<()> {
    let s = v.to_string();
    // Note. Not using `lines()` because it removes trailing new line.
    for line in s.split('\n') {
        execute!(stdout, style::Print(line), cursor::MoveToNextLine(1), cursor::Hide)?;
    }
    Ok(())
}

fn render(
    stdout: &mut io::Stdout, app_start_time: Instant, client_state: &ClientState,
    screen: &ScreenState,
) -> io::Result<()> {
    let now = Instant::now();
    execute!(stdout, cursor::MoveTo(0, 0), terminal::Clear(terminal::ClearType::All))?;
    if client_state.session().game_started {
        let board = tui::render_board(client_state.board(), client_state.session().side);
        writeln_raw(stdout, format!("{}\n", board))?;
    }
    writeln_raw(stdout, tui::render_status(client_state.phase(), client_state.session()))?;
    if let Some(ref url) = screen.game_url {
        writeln_raw(stdout, url.as_str().with(style::Color::DarkGrey))?;
    }
    if let Some(ref resolver) = screen.promotion {
        writeln_raw(stdout, tui::promotion_prompt(resolver.side()).with(style::Color::Yellow))?;
    }
    writeln_raw(stdout, "")?;

    // Simulate cursor: real cursor blinking is broken with Show/Hide.
    let show_cursor = now.duration_since(app_start_time).as_millis() % 1000 >= 500;
    let cursor = if show_cursor { '▂' } else { ' ' };
    writeln_raw(stdout, format!("{}{}\n", screen.keyboard_input, cursor))?;

    if let Some(ref msg) = screen.message {
        writeln_raw(stdout, msg.as_str().with(style::Color::Magenta))?;
    }
    if let Some(ref err) = screen.command_error {
        writeln_raw(stdout, err.as_str().with(style::Color::Red))?;
    }
    Ok(())
}

enum CommandResult {
    Continue,
    Quit,
}

fn execute_command(
    client_state: &mut ClientState, screen: &mut ScreenState, input: &str,
) -> CommandResult {
    let input = input.trim();
    screen.command_error = None;
    if let Some(cmd) = input.strip_prefix('/') {
        let (name, arg) = cmd.split_once(' ').unwrap_or((cmd, ""));
        let result = match name {
            "quit" => return CommandResult::Quit,
            "cancel" => {
                if let Some(resolver) = screen.promotion.take() {
                    resolver.cancel();
                }
                Ok(())
            }
            "mode" => match arg.trim().parse::<GameMode>() {
                Ok(mode) => client_state.choose_mode(mode).map_err(|err| err.to_string()),
                Err(_) => Err(format!("Unknown mode: '{}'", arg)),
            },
            "side" => match arg.trim().parse::<PlayerSide>() {
                Ok(side) => client_state.choose_side(side).map_err(|err| err.to_string()),
                Err(_) => Err(format!("Unknown side: '{}'", arg)),
            },
            "rollback" => client_state.rollback().map_err(|err| err.to_string()),
            "wake" => client_state.wake().map_err(|err| err.to_string()),
            _ => Err(format!("Unknown command: '{}'", cmd)),
        };
        screen.command_error = result.err();
        return CommandResult::Continue;
    }
    if let Some(resolver) = &screen.promotion {
        let piece = input.chars().exactly_one().ok().and_then(PromotionPiece::from_algebraic_char);
        match piece {
            Some(piece) => {
                resolver.choose(piece);
                screen.promotion = None;
            }
            None => screen.command_error = Some(format!("Cannot promote to '{}'", input)),
        }
        return CommandResult::Continue;
    }
    match Point::from_algebraic(input) {
        Some(point) => {
            let outcome = client_state.handle_click(point);
            info!("Click on {}: {:?}", point, outcome);
        }
        None => screen.command_error = Some(format!("Unknown square: '{}'", input)),
    }
    CommandResult::Continue
}

fn apply_defaults(client_state: &mut ClientState, config: &ClientConfig) {
    match client_state.phase() {
        ClientPhase::ChoosingMode => {
            if let Some(mode) = config.default_mode {
                client_state.choose_mode(mode).ok();
            }
        }
        ClientPhase::ChoosingSide => {
            if let Some(side) = config.default_side {
                client_state.choose_side(side).ok();
            }
        }
        _ => {}
    }
}

pub fn run(config: ClientConfig) -> anyhow::Result<()> {
    let transport = Arc::new(HttpTransport::new(config.origin.clone()));
    let mut client_state = ClientState::new(config.options.clone());

    let mut stdout = io::stdout();
    terminal::enable_raw_mode()?;
    execute!(stdout, terminal::EnterAlternateScreen, cursor::Hide)?;
    defer! {
        execute!(io::stdout(), terminal::LeaveAlternateScreen, cursor::Show).ok();
        terminal::disable_raw_mode().ok();
    };
    let app_start_time = Instant::now();

    let (tx, rx) = mpsc::channel();
    let tx_local = tx.clone();
    let tx_tick = tx.clone();
    let tx_net = tx;
    thread::spawn(move || {
        while let Ok(ev) = term_event::read() {
            if tx_local.send(IncomingEvent::Terminal(ev)).is_err() {
                break;
            }
        }
    });
    // Stops once the loop below is gone, which also ends polling.
    thread::spawn(move || {
        loop {
            thread::sleep(TICK_INTERVAL);
            if tx_tick.send(IncomingEvent::Tick).is_err() {
                break;
            }
        }
    });

    let mut screen = ScreenState::default();
    client_state.start();
    loop {
        apply_defaults(&mut client_state, &config);
        client_state.refresh(Instant::now());
        while let Some(request) = client_state.next_outgoing_request() {
            let transport = Arc::clone(&transport);
            let tx_net = tx_net.clone();
            async_std::task::spawn(async move {
                let reply = api::execute(transport.as_ref(), request).await;
                tx_net.send(IncomingEvent::Network(reply)).ok();
            });
        }
        while let Some(event) = client_state.next_notable_event() {
            match event {
                NotableEvent::GameStarted => screen.message = None,
                NotableEvent::LocationChanged(path) => {
                    screen.game_url = config.origin.join(&path).ok().map(String::from);
                }
                NotableEvent::MoveApplied | NotableEvent::RolledBack => {}
                NotableEvent::OpponentMoved => screen.message = Some("Opponent moved".to_owned()),
                NotableEvent::PromotionRequested(resolver) => screen.promotion = Some(resolver),
                NotableEvent::Alert(message) => screen.message = Some(message),
                NotableEvent::RedirectedToNewGame => screen.game_url = None,
            }
        }
        if screen.promotion.as_ref().is_some_and(|r| !r.is_open()) {
            screen.promotion = None;
        }
        render(&mut stdout, app_start_time, &client_state, &screen)?;

        let Ok(event) = rx.recv() else {
            anyhow::bail!("Unexpected end of events stream");
        };
        match event {
            IncomingEvent::Network(reply) => {
                if let Err(err) = client_state.process_reply(reply) {
                    warn!("{}", err);
                    screen.command_error = Some(err.to_string());
                }
            }
            IncomingEvent::Terminal(term_event::Event::Key(event)) => match event.code {
                term_event::KeyCode::Char(ch) => screen.keyboard_input.push(ch),
                term_event::KeyCode::Backspace => {
                    screen.keyboard_input.pop();
                }
                term_event::KeyCode::Enter => {
                    let input = std::mem::take(&mut screen.keyboard_input);
                    match execute_command(&mut client_state, &mut screen, &input) {
                        CommandResult::Continue => {}
                        CommandResult::Quit => {
                            client_state.leave();
                            return Ok(());
                        }
                    }
                }
                _ => {}
            },
            IncomingEvent::Terminal(_) => {}
            IncomingEvent::Tick => {
                // Any event triggers `refresh` and a repaint, so no additional action is required.
            }
        }
    }
}
