//! Terminal implementations of the renderer and prompter

use log::{info, warn};
use std::io::{self, BufRead, Write};

use super::collaborators::{NoticeLevel, Prompter, Renderer, Snapshot};
use super::motion::CancellationToken;
use super::types::{CellKind, Position};

/// Draws snapshots as ASCII maps on stdout
#[derive(Debug, Default)]
pub struct TerminalRenderer {
    /// Print every frame instead of only counting them
    draw_frames: bool,
    frames: usize,
}

impl TerminalRenderer {
    pub fn new(draw_frames: bool) -> Self {
        Self {
            draw_frames,
            frames: 0,
        }
    }

    /// Frames received so far
    pub fn frames(&self) -> usize {
        self.frames
    }
}

impl Renderer for TerminalRenderer {
    fn render(&mut self, snapshot: &Snapshot<'_>) {
        self.frames += 1;
        if self.draw_frames {
            print!("{}", draw_map(snapshot));
        }
    }
}

/// Render a snapshot into a multi-line string
///
/// Facility and house blocks come from the snapshot's anchors, so the raw
/// grid only contributes roads and obstacles.
pub fn draw_map(snapshot: &Snapshot<'_>) -> String {
    let size = snapshot.grid.size();
    let mut canvas = vec![vec![CellKind::Road.glyph(); size]; size];

    let mut paint = |pos: Position, glyph: char| {
        if pos.row < size && pos.col < size {
            canvas[pos.row][pos.col] = glyph;
        }
    };

    for pos in snapshot.grid.positions() {
        if let Some(kind) = snapshot.grid.get(pos) {
            if !matches!(kind, CellKind::House | CellKind::Firetruck | CellKind::Hospital) {
                paint(pos, kind.glyph());
            }
        }
    }

    for house in snapshot.houses.iter() {
        let glyph = if Some(house.anchor) == snapshot.highlighted_house {
            '!'
        } else {
            CellKind::House.glyph()
        };
        for cell in house.anchor.block() {
            paint(cell, glyph);
        }
    }
    for cell in snapshot.station.block() {
        paint(cell, CellKind::Firetruck.glyph());
    }
    for cell in snapshot.hospital.block() {
        paint(cell, CellKind::Hospital.glyph());
    }

    for cell in snapshot.truck_trail.unwrap_or_default() {
        paint(*cell, '*');
    }
    for cell in snapshot.ambulance_trail.unwrap_or_default() {
        paint(*cell, 'o');
    }
    if let Some(truck) = snapshot.truck {
        paint(truck, '@');
    }
    if let Some(ambulance) = snapshot.ambulance {
        paint(ambulance, 'A');
    }

    let mut out = format!("\n=== Map of {} ({}x{}) ===\n", snapshot.city_name, size, size);
    out.push_str(
        "Legend: F=Fire station, +=Hospital, H=House, !=Emergency, #=Obstacle, %=Trees, \
         @=Fire truck, A=Ambulance, */o=Trail\n\n",
    );
    for row in &canvas {
        out.extend(row.iter());
        out.push('\n');
    }
    out.push('\n');
    out
}

/// Asks questions on stdin. Answering `q` ends the simulation.
#[derive(Debug)]
pub struct ConsolePrompter {
    cancel: CancellationToken,
}

impl ConsolePrompter {
    pub fn new(cancel: CancellationToken) -> Self {
        Self { cancel }
    }

    fn read_answer(&self) -> String {
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(_) => line.trim().to_lowercase(),
            Err(err) => {
                warn!("Failed to read answer: {}", err);
                String::new()
            }
        }
    }
}

impl Prompter for ConsolePrompter {
    fn notify(&mut self, level: NoticeLevel, title: &str, message: &str) {
        match level {
            NoticeLevel::Info => println!("[{}] {}", title, message),
            NoticeLevel::Error => eprintln!("[{}] {}", title, message),
        }
    }

    fn confirm_medical_emergency(&mut self) -> bool {
        print!("Is this a medical emergency? [y/n, q to end] ");
        if let Err(err) = io::stdout().flush() {
            warn!("Failed to flush prompt: {}", err);
        }
        match self.read_answer().as_str() {
            "y" | "yes" => true,
            "q" | "quit" => {
                self.cancel.cancel();
                false
            }
            _ => false,
        }
    }
}

/// Answers with a fixed choice and logs every notice
#[derive(Debug, Clone)]
pub struct ScriptedPrompter {
    medical: bool,
    notices: Vec<(NoticeLevel, String)>,
}

impl ScriptedPrompter {
    pub fn new(medical: bool) -> Self {
        Self {
            medical,
            notices: Vec::new(),
        }
    }

    pub fn notices(&self) -> &[(NoticeLevel, String)] {
        &self.notices
    }
}

impl Prompter for ScriptedPrompter {
    fn notify(&mut self, level: NoticeLevel, title: &str, message: &str) {
        info!("{}: {}", title, message);
        self.notices.push((level, message.to_string()));
    }

    fn confirm_medical_emergency(&mut self) -> bool {
        info!("Medical emergency: {}", if self.medical { "yes" } else { "no" });
        self.medical
    }
}
