use crate::model::{PetState, Stat};
use crate::toast::{Toast, ToastKind};
use crossterm::{
    cursor, execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use std::io::{self, Write};

const BG: Color = Color::Black;
const FG: Color = Color::White;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub fg: Color,
    pub bg: Color,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: FG,
            bg: BG,
        }
    }
}

pub struct CellBuffer {
    pub w: u16,
    pub h: u16,
    pub cells: Vec<Cell>,
}

impl CellBuffer {
    pub fn new(w: u16, h: u16) -> Self {
        Self {
            w,
            h,
            cells: vec![Cell::default(); (w as usize) * (h as usize)],
        }
    }

    pub fn idx(&self, x: u16, y: u16) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }

    pub fn get(&self, x: u16, y: u16) -> Option<Cell> {
        (x < self.w && y < self.h).then(|| self.cells[self.idx(x, y)])
    }

    pub fn set(&mut self, x: u16, y: u16, c: Cell) {
        if x < self.w && y < self.h {
            let i = self.idx(x, y);
            self.cells[i] = c;
        }
    }

    pub fn clear(&mut self) {
        self.cells.fill(Cell::default());
    }

    /// Text of one row with trailing blanks trimmed.
    pub fn row_text(&self, y: u16) -> String {
        let s: String = (0..self.w)
            .filter_map(|x| self.get(x, y))
            .map(|c| c.ch)
            .collect();
        s.trim_end().to_string()
    }
}

pub struct Terminal {
    out: io::Stdout,
    pub cols: u16,
    pub rows: u16,
    prev: CellBuffer,
    pub cur: CellBuffer,
}

impl Terminal {
    pub fn begin() -> anyhow::Result<Self> {
        let mut out = io::stdout();
        execute!(
            out,
            EnterAlternateScreen,
            cursor::Hide,
            DisableLineWrap,
            terminal::Clear(ClearType::All)
        )?;
        terminal::enable_raw_mode()?;

        let (cols, rows) = terminal::size()?;
        Ok(Self {
            out,
            cols,
            rows,
            prev: CellBuffer::new(cols, rows),
            cur: CellBuffer::new(cols, rows),
        })
    }

    pub fn end(&mut self) -> anyhow::Result<()> {
        queue!(
            self.out,
            ResetColor,
            Clear(ClearType::All),
            cursor::Show,
            EnableLineWrap,
            LeaveAlternateScreen
        )?;
        self.out.flush()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    pub fn resize_if_needed(&mut self) -> anyhow::Result<bool> {
        let (c, r) = terminal::size()?;
        if c == self.cols && r == self.rows {
            return Ok(false);
        }
        self.cols = c;
        self.rows = r;
        self.prev = CellBuffer::new(c, r);
        self.cur = CellBuffer::new(c, r);
        queue!(self.out, Clear(ClearType::All))?;
        Ok(true)
    }

    /// Writes only the cells that changed since the last frame.
    pub fn present(&mut self) -> anyhow::Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;

        let mut last_fg = None;
        let mut last_bg = None;
        for y in 0..self.rows {
            for x in 0..self.cols {
                let i = self.cur.idx(x, y);
                let c = self.cur.cells[i];
                if c == self.prev.cells[i] {
                    continue;
                }
                queue!(self.out, cursor::MoveTo(x, y))?;
                if last_fg != Some(c.fg) {
                    queue!(self.out, SetForegroundColor(c.fg))?;
                    last_fg = Some(c.fg);
                }
                if last_bg != Some(c.bg) {
                    queue!(self.out, SetBackgroundColor(c.bg))?;
                    last_bg = Some(c.bg);
                }
                queue!(self.out, Print(c.ch))?;
            }
        }

        queue!(self.out, ResetColor, EndSynchronizedUpdate)?;
        self.out.flush()?;
        self.prev.cells.copy_from_slice(&self.cur.cells);
        Ok(())
    }
}

/// What one frame shows. Built fresh by the app loop every frame.
pub struct View<'a> {
    pub state: &'a PetState,
    pub fainted: bool,
    pub toast: Option<&'a Toast>,
    pub help: bool,
    pub color: bool,
}

pub fn draw_text(buf: &mut CellBuffer, x: u16, y: u16, s: &str, fg: Color) {
    for (i, ch) in s.chars().enumerate() {
        let xx = x.saturating_add(i as u16);
        if xx >= buf.w || y >= buf.h {
            break;
        }
        buf.set(xx, y, Cell { ch, fg, bg: BG });
    }
}

fn draw_centered(buf: &mut CellBuffer, y: u16, s: &str, fg: Color) {
    let len = s.chars().count() as u16;
    let x = buf.w.saturating_sub(len) / 2;
    draw_text(buf, x, y, s, fg);
}

pub fn bar(value: f64, width: usize) -> String {
    let v = (value / 100.0).clamp(0.0, 1.0);
    let fill = (v * width as f64 + 0.5) as usize;
    let mut s = String::with_capacity(width + 2);
    s.push('[');
    for i in 0..width {
        s.push(if i < fill { '█' } else { '░' });
    }
    s.push(']');
    s
}

pub fn stat_color(value: f64) -> Color {
    if value > 60.0 {
        Color::Green
    } else if value > 30.0 {
        Color::Yellow
    } else {
        Color::Red
    }
}

fn toast_color(kind: ToastKind) -> Color {
    match kind {
        ToastKind::Stat(Stat::Vibe) => Color::Magenta,
        ToastKind::Stat(Stat::Fuel) => Color::Green,
        ToastKind::Stat(Stat::Battery) => Color::Blue,
        ToastKind::Plain => FG,
    }
}

pub fn blob_sprite(st: &PetState, fainted: bool) -> [&'static str; 7] {
    let eyes = if fainted {
        "   |   x   x   |   "
    } else if st.is_sleeping {
        "   |   -   -   |   "
    } else {
        "   |   o   o   |   "
    };
    let mouth = if fainted {
        "   |    ~~~    |   "
    } else if st.is_sleeping {
        "   |     o     |   "
    } else if st.vibe > 60.0 {
        "   |   \\___/   |   "
    } else {
        "   |   /---\\   |   "
    };
    [
        "      _______      ",
        "    /         \\    ",
        eyes,
        "   |     ^     |   ",
        mouth,
        "    \\_________/    ",
        "                   ",
    ]
}

fn draw_blob(buf: &mut CellBuffer, view: &View, cx: u16, cy: u16) {
    let sprite = blob_sprite(view.state, view.fainted);
    let fg = if !view.color {
        FG
    } else if view.fainted {
        Color::DarkGrey
    } else {
        Color::Cyan
    };
    let w = sprite[0].chars().count() as u16;
    let x0 = cx.saturating_sub(w / 2);
    let y0 = cy.saturating_sub(sprite.len() as u16 / 2);
    for (i, line) in sprite.iter().enumerate() {
        draw_text(buf, x0, y0 + i as u16, line, fg);
    }
    if view.state.is_sleeping {
        let zfg = if view.color { Color::Blue } else { FG };
        draw_text(buf, x0 + w, y0.saturating_sub(1), "z Z z", zfg);
    }
}

pub fn draw_center_box(buf: &mut CellBuffer, title: &str, body: &str, fg: Color) {
    let body_w = body.lines().map(|l| l.chars().count()).max().unwrap_or(0);
    let inner = body_w.max(title.chars().count()) as u16 + 2;
    let bw = (inner + 2).min(buf.w);
    let bh = (body.lines().count() as u16 + 4).min(buf.h);
    if bw < 4 || bh < 3 {
        return;
    }
    let x0 = (buf.w - bw) / 2;
    let y0 = (buf.h - bh) / 2;

    for y in y0..y0 + bh {
        for x in x0..x0 + bw {
            let top = y == y0;
            let bottom = y == y0 + bh - 1;
            let left = x == x0;
            let right = x == x0 + bw - 1;
            let ch = match (top, bottom, left, right) {
                (true, _, true, _) => '┌',
                (true, _, _, true) => '┐',
                (_, true, true, _) => '└',
                (_, true, _, true) => '┘',
                (true, _, _, _) | (_, true, _, _) => '─',
                (_, _, true, _) | (_, _, _, true) => '│',
                _ => ' ',
            };
            buf.set(x, y, Cell { ch, fg, bg: BG });
        }
    }
    draw_text(buf, x0 + 2, y0 + 1, title, fg);
    for (i, line) in body.lines().enumerate() {
        draw_text(buf, x0 + 2, y0 + 3 + i as u16, line, fg);
    }
}

const HELP_TEXT: &str = "Keep Vibe, Fuel and Battery up.\n\
F feed: +20 fuel\n\
P / space pet: +15 vibe\n\
S sleep / wake: sleeping recharges battery\n\
\n\
No feeding or petting while asleep.\n\
Keep all three at 80+ for 30s to level up.\n\
\n\
H close help | Q quit";

pub fn draw_frame(buf: &mut CellBuffer, view: &View) {
    buf.clear();
    let (w, h) = (buf.w, buf.h);
    let st = view.state;
    let paint = |c: Color| if view.color { c } else { FG };

    draw_text(buf, 1, 0, "Blobagotchi", FG);
    let level = format!("★ Level {}", st.level);
    let lx = w.saturating_sub(level.chars().count() as u16 + 1);
    draw_text(buf, lx, 0, &level, paint(Color::Yellow));

    for (i, stat) in Stat::ALL.iter().enumerate() {
        let v = st.stat(*stat);
        let y = 2 + i as u16;
        let label = format!("{:<8}{} ", stat.label(), bar(v, 20));
        draw_text(buf, 1, y, &label, FG);
        let pct = format!("{:>3}%", v.round() as i64);
        draw_text(buf, 1 + label.chars().count() as u16, y, &pct, paint(stat_color(v)));
    }

    let cy = (h / 2).max(8);
    draw_blob(buf, view, w / 2, cy);

    let status = if view.fainted {
        "Your blob fainted! Feed or let it rest to recover"
    } else if st.is_sleeping {
        "Sleeping..."
    } else {
        "Press P to pet!"
    };
    draw_centered(buf, cy + 5, status, paint(if view.fainted { Color::Red } else { FG }));

    if let Some(t) = view.toast {
        draw_centered(buf, h.saturating_sub(3), t.message, paint(toast_color(t.kind)));
    }

    let keys = if st.is_sleeping {
        "Keys: s wake | h help | q quit"
    } else {
        "Keys: f feed | p pet | s sleep | h help | q quit"
    };
    draw_text(buf, 1, h.saturating_sub(1), keys, FG);

    if view.help {
        draw_center_box(buf, "How to play", HELP_TEXT, FG);
    }
}
