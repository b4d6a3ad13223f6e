use std::io::Write;

use crate::departure::Departure;

/// Anything that can put a station's board on screen.
pub trait Renderer {
    fn render(&mut self, station_label: &str, departures: &[Departure]);
}

/// Plain-text board, for running without display hardware.
pub struct ConsoleRenderer<W: Write> {
    out: W,
    width: usize,
}

impl ConsoleRenderer<std::io::Stdout> {
    pub fn stdout(width: usize) -> Self {
        Self::new(std::io::stdout(), width)
    }
}

impl<W: Write> ConsoleRenderer<W> {
    pub fn new(out: W, width: usize) -> Self {
        Self { out, width }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_board(&mut self, station_label: &str, departures: &[Departure]) -> std::io::Result<()> {
        let clock = chrono::Local::now().format("%H:%M:%S").to_string();
        let label_width = self.width.saturating_sub(clock.len() + 1);
        let label: String = station_label.chars().take(label_width).collect();

        writeln!(self.out)?;
        writeln!(self.out, "{:<label_width$} {}", label, clock)?;
        writeln!(self.out, "{}", "=".repeat(self.width))?;
        for (i, departure) in departures.iter().enumerate() {
            let row = if departure.is_empty_slot() {
                "-".to_string()
            } else {
                departure.format_truncated(self.width.saturating_sub(4))
            };
            writeln!(self.out, "{:>2}. {}", i + 1, row)?;
        }
        self.out.flush()
    }
}

impl<W: Write> Renderer for ConsoleRenderer<W> {
    fn render(&mut self, station_label: &str, departures: &[Departure]) {
        if let Err(e) = self.write_board(station_label, departures) {
            tracing::error!("Failed to write board: {}", e);
        }
    }
}
