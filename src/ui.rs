use std::io;

use colored::Colorize;
use console::Term;
use stopwatch_core::{format_duration, Stopwatch};
use tabled::{Table, Tabled};

const MAIN_KEYS: &str = "SPACE=start/pause  l=lap  r=reset  ←=laps  ?=help  q=quit";
const LAP_KEYS: &str = "↑/↓=scroll  →=back  r=reset  q=quit";

/// Table row for the lap page
#[derive(Tabled)]
struct LapRow {
    lap: usize,
    segment: String,
}

/// Push a full frame. Lines go out with explicit carriage returns because
/// the key reader holds the tty in raw mode most of the time, where a bare
/// newline does not return the cursor to column zero.
pub fn draw(term: &Term, frame: &str) -> io::Result<()> {
    term.clear_screen()?;
    term.write_str(&frame.replace('\n', "\r\n"))?;
    term.flush()
}

pub fn render_main(sw: &Stopwatch) -> String {
    let elapsed = format_duration(sw.elapsed_ms());
    let time = if sw.is_running() {
        elapsed.as_str().bold().green()
    } else if sw.elapsed_ms() > 0 {
        elapsed.as_str().bold().yellow()
    } else {
        elapsed.as_str().bold()
    };
    let status = if sw.is_running() {
        "running".green()
    } else if sw.elapsed_ms() > 0 {
        "paused".yellow()
    } else {
        "ready".dimmed()
    };

    let mut lines = Vec::new();
    lines.push(String::new());
    lines.push(format!("  {}  {}", "STOPWATCH".bold(), status));
    lines.push(String::new());
    lines.push(format!("  {}", time));
    lines.push(format!(
        "  {}",
        format!("Lap: {}", format_duration(sw.latest_lap_ms())).dimmed()
    ));
    lines.push(String::new());
    lines.push(format!("  {}", MAIN_KEYS.dimmed()));
    lines.join("\n")
}

/// Lap page: one row per recorded segment, oldest first, with the running
/// total pinned under the table. `scroll` counts entries back from the tail
/// so the latest laps stay in view by default.
pub fn render_laps(sw: &Stopwatch, scroll: usize, visible: usize) -> String {
    let laps = sw.laps();
    let (start, end) = lap_window(laps.len(), scroll, visible);

    let rows: Vec<LapRow> = laps[start..end]
        .iter()
        .enumerate()
        .map(|(i, &ms)| LapRow {
            lap: start + i + 1,
            segment: format_duration(ms),
        })
        .collect();
    let table = Table::new(rows).to_string();

    let mut lines = Vec::new();
    lines.push(String::new());
    lines.push(format!("  {} ({})", "LAP TIMES".bold(), laps.len()));
    lines.push(String::new());
    for line in table.lines() {
        lines.push(format!("  {}", line));
    }
    lines.push(String::new());
    lines.push(format!(
        "  Total: {}",
        format_duration(sw.elapsed_ms()).as_str().bold()
    ));
    lines.push(String::new());
    lines.push(format!("  {}", LAP_KEYS.dimmed()));
    lines.join("\n")
}

pub fn render_help(help_text: &str) -> String {
    let mut lines = Vec::new();
    lines.push(String::new());
    for (i, line) in help_text.lines().enumerate() {
        if i == 0 {
            lines.push(format!("  {}", line.bold()));
        } else {
            lines.push(format!("  {}", line));
        }
    }
    lines.push(String::new());
    lines.push(format!("  {}", "Press any key to close".dimmed()));
    lines.join("\n")
}

pub fn render_confirm_quit() -> String {
    let mut lines = Vec::new();
    lines.push(String::new());
    lines.push(format!("  {}", "STOPWATCH RUNNING".bold()));
    lines.push(String::new());
    lines.push("  The stopwatch is still running.".to_string());
    lines.push("  Quit anyway?".to_string());
    lines.push(String::new());
    lines.push(format!("  {}", "y = Stop & quit   n = Cancel".dimmed()));
    lines.join("\n")
}

/// Largest scroll offset that still fills the window when possible.
pub fn max_scroll(len: usize, visible: usize) -> usize {
    len.saturating_sub(visible.max(1))
}

/// Half-open index range of the visible lap slice.
fn lap_window(len: usize, scroll: usize, visible: usize) -> (usize, usize) {
    let visible = visible.max(1);
    let scroll = scroll.min(max_scroll(len, visible));
    let end = len - scroll;
    (end.saturating_sub(visible), end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() {
        colored::control::set_override(false);
    }

    fn stopwatch_with_laps(segments: &[u64]) -> Stopwatch {
        let mut sw = Stopwatch::new();
        sw.toggle_run();
        sw.advance(0);
        let mut t = 0;
        for &seg in segments {
            t += seg;
            sw.advance(t);
            sw.record_lap();
        }
        sw
    }

    #[test]
    fn main_view_shows_elapsed_and_latest_lap() {
        plain();
        let mut sw = Stopwatch::new();
        sw.toggle_run();
        sw.advance(0);
        sw.advance(1500);
        let frame = render_main(&sw);
        assert!(frame.contains("STOPWATCH"));
        assert!(frame.contains("00:00:01.50"));
        assert!(frame.contains("Lap: 00:00:00.00"));
        assert!(frame.contains("running"));
    }

    #[test]
    fn main_view_marks_paused_sessions() {
        plain();
        let mut sw = Stopwatch::new();
        sw.toggle_run();
        sw.advance(0);
        sw.advance(2000);
        sw.toggle_run();
        sw.advance(2000);
        let frame = render_main(&sw);
        assert!(frame.contains("paused"));
        assert!(frame.contains("00:00:02.00"));
    }

    #[test]
    fn fresh_main_view_reads_ready() {
        plain();
        let frame = render_main(&Stopwatch::new());
        assert!(frame.contains("ready"));
        assert!(frame.contains("00:00:00.00"));
    }

    #[test]
    fn lap_view_lists_segments_and_total() {
        plain();
        let sw = stopwatch_with_laps(&[5000, 3000]);
        let frame = render_laps(&sw, 0, 10);
        assert!(frame.contains("LAP TIMES (3)"));
        assert!(frame.contains("00:00:05.00"));
        assert!(frame.contains("00:00:03.00"));
        assert!(frame.contains("Total: 00:00:08.00"));
    }

    #[test]
    fn lap_view_keeps_the_latest_rows_when_full() {
        plain();
        let sw = stopwatch_with_laps(&[1000, 2000, 3000]);
        let frame = render_laps(&sw, 0, 2);
        assert!(frame.contains("00:00:02.00"));
        assert!(frame.contains("00:00:03.00"));
        assert!(!frame.contains("00:00:01.00"));
    }

    #[test]
    fn lap_view_scrolls_back_toward_older_rows() {
        plain();
        let sw = stopwatch_with_laps(&[1000, 2000, 3000]);
        let frame = render_laps(&sw, 2, 2);
        assert!(frame.contains("00:00:01.00"));
        assert!(!frame.contains("00:00:03.00"));
    }

    #[test]
    fn lap_numbers_stay_absolute_when_windowed() {
        plain();
        let sw = stopwatch_with_laps(&[1000, 2000, 3000]);
        let frame = render_laps(&sw, 0, 2);
        assert!(frame.contains("| 3"));
        assert!(frame.contains("| 4"));
        assert!(!frame.contains("| 1"));
    }

    #[test]
    fn lap_window_clamps_scroll_past_the_oldest_entry() {
        assert_eq!(lap_window(5, 0, 2), (3, 5));
        assert_eq!(lap_window(5, 2, 2), (1, 3));
        assert_eq!(lap_window(5, 99, 2), (0, 2));
        assert_eq!(lap_window(1, 0, 10), (0, 1));
        assert_eq!(lap_window(0, 0, 10), (0, 0));
    }

    #[test]
    fn max_scroll_never_underflows() {
        assert_eq!(max_scroll(10, 4), 6);
        assert_eq!(max_scroll(3, 10), 0);
        assert_eq!(max_scroll(0, 0), 0);
    }

    #[test]
    fn help_frame_carries_every_binding() {
        plain();
        let frame = render_help("STOPWATCH HELP\n\nl  record a lap\nr  reset");
        assert!(frame.contains("STOPWATCH HELP"));
        assert!(frame.contains("record a lap"));
        assert!(frame.contains("Press any key to close"));
    }

    #[test]
    fn confirm_frame_offers_both_answers() {
        plain();
        let frame = render_confirm_quit();
        assert!(frame.contains("still running"));
        assert!(frame.contains("y = Stop & quit"));
        assert!(frame.contains("n = Cancel"));
    }
}
