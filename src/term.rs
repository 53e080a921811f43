use crossterm::{
    cursor,
    event::{DisableMouseCapture, EnableMouseCapture},
    execute, queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use sandpit::PixelBuffer;
use std::io::{self, Stdout, Write};

// Braille cell is 2x4 dots.
// (0,0)=1 (0,1)=2 (0,2)=3 (0,3)=7
// (1,0)=4 (1,1)=5 (1,2)=6 (1,3)=8
fn braille_bit(dx: usize, dy: usize) -> u8 {
    match (dx, dy) {
        (0, 0) => 0x01,
        (0, 1) => 0x02,
        (0, 2) => 0x04,
        (0, 3) => 0x40,
        (1, 0) => 0x08,
        (1, 1) => 0x10,
        (1, 2) => 0x20,
        (1, 3) => 0x80,
        _ => 0,
    }
}

fn braille_char(mask: u8) -> char {
    char::from_u32(0x2800 + mask as u32).unwrap_or(' ')
}

/// Dot resolution of a terminal of `cols` x `rows` minus the status line.
pub(crate) fn dot_size_for(cols: u16, rows: u16) -> (u32, u32) {
    (cols.max(1) as u32 * 2, rows.saturating_sub(1).max(1) as u32 * 4)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct BrailleCell {
    mask: u8,
    r: u8,
    g: u8,
    b: u8,
}

pub(crate) struct Terminal {
    out: Stdout,
    pub(crate) cols: u16,
    pub(crate) rows: u16,
    cells: Vec<BrailleCell>,
    // None forces a redraw of that cell
    prev: Vec<Option<BrailleCell>>,
    weights: Vec<[u32; 4]>,
    line: String,
    full_redraw: bool,
}

impl Terminal {
    pub(crate) fn begin() -> io::Result<Self> {
        let mut out = io::stdout();
        terminal::enable_raw_mode()?;
        execute!(
            out,
            EnterAlternateScreen,
            EnableMouseCapture,
            DisableLineWrap,
            cursor::Hide,
            Clear(ClearType::All)
        )?;
        let (cols, rows) = terminal::size()?;
        Ok(Self {
            out,
            cols,
            rows,
            cells: Vec::new(),
            prev: Vec::new(),
            weights: Vec::new(),
            line: String::new(),
            full_redraw: true,
        })
    }

    pub(crate) fn end(&mut self) -> io::Result<()> {
        execute!(
            self.out,
            ResetColor,
            EnableLineWrap,
            DisableMouseCapture,
            cursor::Show,
            LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    pub(crate) fn resize(&mut self, cols: u16, rows: u16) {
        self.cols = cols;
        self.rows = rows;
        self.full_redraw = true;
    }

    /// Terminal rows available to the field; the last row is the status line.
    pub(crate) fn field_rows(&self) -> u16 {
        self.rows.saturating_sub(1).max(1)
    }

    /// Braille dot resolution of the field area.
    pub(crate) fn dot_size(&self) -> (u32, u32) {
        dot_size_for(self.cols, self.rows)
    }

    /// Force a redraw of one cell on the next frame.
    pub(crate) fn invalidate(&mut self, col: u16, row: u16) {
        let i = row as usize * self.cols as usize + col as usize;
        if let Some(p) = self.prev.get_mut(i) {
            *p = None;
        }
    }

    fn build_cells(&mut self, buf: &PixelBuffer) {
        let cw = self.cols as usize;
        let ch = self.field_rows() as usize;
        let n = cw * ch;
        if self.cells.len() != n {
            self.cells = vec![BrailleCell::default(); n];
            self.prev = vec![None; n];
            self.weights = vec![[0; 4]; n];
            self.full_redraw = true;
        }
        self.cells.fill(BrailleCell::default());
        self.weights.fill([0; 4]);
        if n == 0 || buf.w == 0 || buf.h == 0 {
            return;
        }

        let dot_w = cw * 2;
        let dot_h = ch * 4;
        for y in 0..buf.h as usize {
            let dy = y * dot_h / buf.h as usize;
            let row = y * buf.w as usize;
            for x in 0..buf.w as usize {
                let p = buf.px[row + x];
                if p.a == 0 || (p.r | p.g | p.b) == 0 {
                    continue;
                }
                let dx = x * dot_w / buf.w as usize;
                let i = (dy / 4) * cw + dx / 2;
                self.cells[i].mask |= braille_bit(dx % 2, dy % 4);
                let a = p.a as u32;
                let w = &mut self.weights[i];
                w[0] += p.r as u32 * a;
                w[1] += p.g as u32 * a;
                w[2] += p.b as u32 * a;
                w[3] += a;
            }
        }
        for (cell, w) in self.cells.iter_mut().zip(&self.weights) {
            if w[3] > 0 {
                cell.r = (w[0] / w[3]) as u8;
                cell.g = (w[1] / w[3]) as u8;
                cell.b = (w[2] / w[3]) as u8;
            }
        }
    }

    pub(crate) fn draw(
        &mut self,
        buf: &PixelBuffer,
        status: &str,
        cursor: Option<(u16, u16)>,
        overlay: Option<&[String]>,
    ) -> io::Result<()> {
        self.build_cells(buf);

        let cw = self.cols as usize;
        let ch = self.field_rows() as usize;

        queue!(self.out, BeginSynchronizedUpdate, ResetColor)?;
        if self.full_redraw {
            queue!(self.out, Clear(ClearType::All))?;
        }

        // Diff render: only redraw rows that changed
        for y in 0..ch {
            let row = y * cw..(y + 1) * cw;
            let changed = self.full_redraw
                || self.cells[row.clone()]
                    .iter()
                    .zip(&self.prev[row.clone()])
                    .any(|(c, p)| Some(*c) != *p);
            if !changed {
                continue;
            }
            queue!(self.out, cursor::MoveTo(0, y as u16))?;
            let mut current: Option<(u8, u8, u8)> = None;
            self.line.clear();
            for c in &self.cells[row.clone()] {
                let rgb = (c.r, c.g, c.b);
                if c.mask != 0 && current != Some(rgb) {
                    if !self.line.is_empty() {
                        queue!(self.out, Print(&self.line))?;
                        self.line.clear();
                    }
                    queue!(self.out, SetForegroundColor(Color::Rgb { r: c.r, g: c.g, b: c.b }))?;
                    current = Some(rgb);
                }
                self.line.push(braille_char(c.mask));
            }
            queue!(self.out, Print(&self.line))?;
            for (p, c) in self.prev[row.clone()].iter_mut().zip(&self.cells[row]) {
                *p = Some(*c);
            }
        }

        if let Some((cx, cy)) = cursor {
            if (cx as usize) < cw && (cy as usize) < ch {
                queue!(
                    self.out,
                    cursor::MoveTo(cx, cy),
                    SetForegroundColor(Color::White),
                    Print('+')
                )?;
                self.invalidate(cx, cy);
            }
        }

        if let Some(lines) = overlay {
            self.draw_box(lines)?;
        }

        let status_row = self.field_rows();
        queue!(
            self.out,
            ResetColor,
            cursor::MoveTo(0, status_row),
            Clear(ClearType::CurrentLine),
            SetAttribute(Attribute::Reverse),
            Print(truncate(status, cw)),
            SetAttribute(Attribute::Reset),
            EndSynchronizedUpdate
        )?;
        self.out.flush()?;
        self.full_redraw = false;
        Ok(())
    }

    fn draw_box(&mut self, lines: &[String]) -> io::Result<()> {
        let w = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0) + 4;
        let h = lines.len() + 2;
        let cols = self.cols as usize;
        let rows = self.field_rows() as usize;
        if w > cols || h > rows {
            return Ok(());
        }
        let x0 = (cols - w) / 2;
        let y0 = (rows - h) / 2;

        queue!(self.out, ResetColor, SetForegroundColor(Color::White))?;
        let bar = "─".repeat(w - 2);
        queue!(self.out, cursor::MoveTo(x0 as u16, y0 as u16), Print(format!("┌{bar}┐")))?;
        for (i, l) in lines.iter().enumerate() {
            let pad = w - 4 - l.chars().count();
            queue!(
                self.out,
                cursor::MoveTo(x0 as u16, (y0 + 1 + i) as u16),
                Print(format!("│ {l}{} │", " ".repeat(pad)))
            )?;
        }
        queue!(
            self.out,
            cursor::MoveTo(x0 as u16, (y0 + h - 1) as u16),
            Print(format!("└{bar}┘"))
        )?;

        // covered rows must be repainted once the box goes away
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                self.invalidate(x as u16, y as u16);
            }
        }
        Ok(())
    }
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_line_is_taken_from_the_dot_area() {
        assert_eq!(dot_size_for(80, 25), (160, 96));
        assert_eq!(dot_size_for(0, 1), (2, 4));
    }

    #[test]
    fn braille_dots_map_to_unicode_bits() {
        assert_eq!(braille_char(0), '\u{2800}');
        let full = (0..2)
            .flat_map(|dx| (0..4).map(move |dy| braille_bit(dx, dy)))
            .fold(0u8, |m, b| m | b);
        assert_eq!(braille_char(full), '\u{28FF}');
    }

    #[test]
    fn status_text_is_cut_to_width() {
        assert_eq!(truncate("sand r3 | running", 4), "sand");
        assert_eq!(truncate("ok", 10), "ok");
    }
}
