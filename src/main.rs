mod clock;
mod ui;

use std::io;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use console::{Key, Term};
use stopwatch_core::Stopwatch;

use crate::clock::MonotonicClock;

const HELP_TEXT: &str = "STOPWATCH HELP\n\n\
    SPACE  Start or pause\n\
    ENTER  Start or pause\n\
    l      Record a lap (while running)\n\
    r      Reset to zero\n\
    ←/→    Switch between time and laps\n\
    ↑/↓    Scroll the lap page\n\
    ?      Toggle this help\n\
    q/ESC  Quit (asks first while running)";

// Rows around the lap table: margins, title, total and key lines.
const LAP_CHROME_ROWS: usize = 10;

#[derive(Debug, Parser)]
#[command(name = "stopwatch", version, about = "Terminal stopwatch with lap timing")]
struct Args {
    /// Redraw interval while running, in milliseconds
    #[arg(
        long,
        env = "STOPWATCH_TICK_MS",
        default_value_t = 100,
        value_parser = clap::value_parser!(u64).range(10..=1000)
    )]
    tick_ms: u64,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

#[derive(Debug)]
enum AppEvent {
    Tick,
    Key(Key),
    InputClosed,
}

#[derive(Debug)]
enum PumpCmd {
    Start(Duration),
    Stop,
    Quit,
}

#[derive(Clone, Copy, PartialEq)]
enum Page {
    Main,
    Laps,
}

struct StopwatchApp {
    term: Term,
    clock: MonotonicClock,
    stopwatch: Stopwatch,
    page: Page,
    lap_scroll: usize,
    help_visible: bool,
    confirm_quit: bool,
    tick: Duration,
    pump: Sender<PumpCmd>,
    pump_running: bool,
}

impl StopwatchApp {
    fn new(term: Term, tick: Duration, pump: Sender<PumpCmd>) -> Self {
        Self {
            term,
            clock: MonotonicClock::start(),
            stopwatch: Stopwatch::new(),
            page: Page::Main,
            lap_scroll: 0,
            help_visible: false,
            confirm_quit: false,
            tick,
            pump,
            pump_running: false,
        }
    }

    fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    fn redraw(&self) -> io::Result<()> {
        let frame = if self.help_visible {
            ui::render_help(HELP_TEXT)
        } else if self.confirm_quit {
            ui::render_confirm_quit()
        } else {
            match self.page {
                Page::Main => ui::render_main(&self.stopwatch),
                Page::Laps => {
                    ui::render_laps(&self.stopwatch, self.lap_scroll, self.visible_laps())
                }
            }
        };
        ui::draw(&self.term, &frame)
    }

    /// Lap rows that fit the current terminal height.
    fn visible_laps(&self) -> usize {
        let (rows, _) = self.term.size();
        (rows as usize).saturating_sub(LAP_CHROME_ROWS).max(3)
    }

    fn start_pump(&mut self) {
        if !self.pump_running {
            self.pump_running = true;
            self.pump.send(PumpCmd::Start(self.tick)).ok();
        }
    }

    fn stop_pump(&mut self) {
        if self.pump_running {
            self.pump_running = false;
            self.pump.send(PumpCmd::Stop).ok();
        }
    }

    fn handle_tick(&mut self) -> io::Result<()> {
        self.stopwatch.advance(self.now_ms());
        self.redraw()
    }

    /// Returns false once the app should exit.
    fn handle_key(&mut self, key: Key) -> io::Result<bool> {
        // A key press doubles as a refresh tick so the action lands on a
        // current reading.
        self.stopwatch.advance(self.now_ms());

        // If the help screen is showing, any key dismisses it
        if self.help_visible {
            self.help_visible = false;
            self.redraw()?;
            return Ok(true);
        }

        // If the confirm-quit dialog is showing
        if self.confirm_quit {
            match key {
                Key::Char('y') => return Ok(false),
                Key::Char('n') | Key::Escape => {
                    self.confirm_quit = false;
                    self.redraw()?;
                }
                _ => {}
            }
            return Ok(true);
        }

        match key {
            Key::Char(' ') | Key::Enter => {
                self.stopwatch.toggle_run();
                if self.stopwatch.is_running() {
                    self.start_pump();
                    log::debug!("running from {} ms", self.stopwatch.elapsed_ms());
                } else {
                    self.stop_pump();
                    log::debug!("paused at {} ms", self.stopwatch.elapsed_ms());
                }
                self.redraw()?;
            }
            Key::Char('l') => {
                if self.stopwatch.is_running() {
                    self.stopwatch.record_lap();
                    log::debug!(
                        "lap {} at {} ms",
                        self.stopwatch.laps().len(),
                        self.stopwatch.latest_lap_ms()
                    );
                    self.redraw()?;
                }
            }
            Key::Char('r') => {
                self.stopwatch.reset();
                self.lap_scroll = 0;
                self.stop_pump();
                log::debug!("reset");
                self.redraw()?;
            }
            Key::ArrowLeft => {
                if self.page == Page::Main {
                    self.page = Page::Laps;
                    self.lap_scroll = 0;
                    self.redraw()?;
                }
            }
            Key::ArrowRight => {
                if self.page == Page::Laps {
                    self.page = Page::Main;
                    self.redraw()?;
                }
            }
            Key::ArrowUp => {
                if self.page == Page::Laps {
                    let max = ui::max_scroll(self.stopwatch.laps().len(), self.visible_laps());
                    if self.lap_scroll < max {
                        self.lap_scroll += 1;
                        self.redraw()?;
                    }
                }
            }
            Key::ArrowDown => {
                if self.page == Page::Laps && self.lap_scroll > 0 {
                    self.lap_scroll -= 1;
                    self.redraw()?;
                }
            }
            Key::Char('?') => {
                self.help_visible = true;
                self.redraw()?;
            }
            // ^C arrives as a plain byte while the reader holds the tty raw
            Key::Char('q') | Key::Char('\u{3}') | Key::Escape => {
                if self.stopwatch.is_running() {
                    self.confirm_quit = true;
                    self.redraw()?;
                } else {
                    return Ok(false);
                }
            }
            _ => {}
        }
        Ok(true)
    }
}

/// Emits redraw ticks while the stopwatch runs. Start and stop are
/// message-driven so the thread sleeps on a blocking recv whenever the
/// display has nothing to update.
fn pump_thread(cmds: Receiver<PumpCmd>, events: Sender<AppEvent>) {
    let mut interval = Duration::from_millis(100);
    let mut running = false;

    loop {
        let cmd = if running {
            match cmds.recv_timeout(interval) {
                Ok(cmd) => Some(cmd),
                Err(RecvTimeoutError::Timeout) => {
                    if events.send(AppEvent::Tick).is_err() {
                        return;
                    }
                    None
                }
                Err(RecvTimeoutError::Disconnected) => return,
            }
        } else {
            match cmds.recv() {
                Ok(cmd) => Some(cmd),
                Err(_) => return,
            }
        };

        match cmd {
            Some(PumpCmd::Start(new_interval)) => {
                interval = new_interval;
                running = true;
            }
            Some(PumpCmd::Stop) => running = false,
            Some(PumpCmd::Quit) => return,
            None => {}
        }
    }
}

/// Forwards key presses to the event loop. After each key the reader waits
/// for an acknowledgement before touching the tty again; `read_key` flips
/// the terminal into raw mode, and quitting must not leave it there.
fn input_thread(term: Term, events: Sender<AppEvent>, ack: Receiver<bool>) {
    loop {
        let key = match term.read_key() {
            Ok(key) => key,
            // ^C surfaces as an interrupted read; route it to the quit path
            Err(err) if err.kind() == io::ErrorKind::Interrupted => Key::Escape,
            Err(err) => {
                log::error!("key input failed: {}", err);
                events.send(AppEvent::InputClosed).ok();
                return;
            }
        };
        if events.send(AppEvent::Key(key)).is_err() {
            return;
        }
        match ack.recv() {
            Ok(true) => {}
            _ => return,
        }
    }
}

fn run(app: &mut StopwatchApp, events: Receiver<AppEvent>, key_ack: Sender<bool>) -> Result<()> {
    app.redraw().context("could not draw the initial frame")?;

    loop {
        match events.recv() {
            Ok(AppEvent::Tick) => {
                app.handle_tick().context("could not redraw on a tick")?;
            }
            // The reader is released in every branch, even on error
            Ok(AppEvent::Key(key)) => match app.handle_key(key) {
                Ok(true) => {
                    key_ack.send(true).ok();
                }
                Ok(false) => {
                    key_ack.send(false).ok();
                    return Ok(());
                }
                Err(err) => {
                    key_ack.send(false).ok();
                    return Err(err).context("could not apply a key press");
                }
            },
            Ok(AppEvent::InputClosed) => {
                bail!("key input stream closed unexpectedly");
            }
            Err(_) => bail!("event channel disconnected"),
        }
    }
}

fn main() -> Result<()> {
    pretty_env_logger::init();
    let args = Args::parse();

    if args.no_color {
        colored::control::set_override(false);
    }

    let term = Term::buffered_stdout();
    if !term.is_term() {
        bail!("stopwatch needs an interactive terminal");
    }

    log::info!("starting with a {} ms tick", args.tick_ms);

    let (event_tx, event_rx) = mpsc::channel();
    let (pump_tx, pump_rx) = mpsc::channel();
    let (ack_tx, ack_rx) = mpsc::channel();

    let pump_events = event_tx.clone();
    thread::spawn(move || pump_thread(pump_rx, pump_events));

    let input_term = Term::stdout();
    thread::spawn(move || input_thread(input_term, event_tx, ack_rx));

    let mut app = StopwatchApp::new(term.clone(), Duration::from_millis(args.tick_ms), pump_tx);

    term.hide_cursor().context("could not prepare the terminal")?;

    let result = run(&mut app, event_rx, ack_tx);

    // Clean up
    app.stop_pump();
    app.pump.send(PumpCmd::Quit).ok();
    term.clear_screen().ok();
    term.show_cursor().ok();
    term.flush().ok();

    result
}
