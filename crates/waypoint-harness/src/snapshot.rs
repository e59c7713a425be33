#![forbid(unsafe_code)]

//! Text snapshots of a headless page.
//!
//! # Invariants
//!
//! 1. The grid has exactly the viewport's dimensions.
//! 2. While the overlay is visible, blank cells outside its opening are
//!    drawn as `░`; cells inside the opening are untouched.
//! 3. The live tooltip is drawn as a boxed panel next to its target, on the
//!    requested side when it fits, centered when the step is centered.
//!
//! Wide graphemes occupy two cells; a grapheme that would straddle the
//! right edge of its area is dropped.

use std::fmt;

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;
use waypoint_core::{Document, ElementId, Placement, Rect, TooltipRequest};

use crate::host::HeadlessHost;

const DIM: &str = "░";
const PANEL_MAX_WIDTH: u16 = 44;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    width: u16,
    height: u16,
    /// One entry per cell; `""` marks the continuation of a wide grapheme.
    cells: Vec<String>,
    panel: Option<Rect>,
}

impl Snapshot {
    /// Draw the page, its overlay and the live tooltip.
    pub fn capture(host: &HeadlessHost) -> Snapshot {
        let viewport = host.document.viewport();
        let mut snapshot = Snapshot {
            width: viewport.width,
            height: viewport.height,
            cells: vec![" ".to_owned(); usize::from(viewport.width) * usize::from(viewport.height)],
            panel: None,
        };

        let body = host.document.body();
        for element in host.document.query_selector_all("*") {
            if element == body {
                continue;
            }
            if let Some(bounds) = host.document.bounding_rect(element) {
                let label = host
                    .document
                    .text(element)
                    .or_else(|| host.document.tag(element))
                    .unwrap_or_default();
                snapshot.draw_box(bounds, &[label]);
            }
        }

        if host.overlay.is_visible() {
            let opening = host.overlay.opening();
            for y in 0..snapshot.height {
                for x in 0..snapshot.width {
                    if opening.is_some_and(|rect| rect.contains(x, y)) {
                        continue;
                    }
                    let index = snapshot.index(x, y);
                    if snapshot.cells[index] == " " {
                        snapshot.cells[index] = DIM.to_owned();
                    }
                }
            }
        }

        if let Some(request) = host.tooltips.current() {
            let lines = panel_lines(host, request.content);
            let target = (!request.centered)
                .then(|| host.document.bounding_rect(request.target))
                .flatten();
            let panel = snapshot.place_panel(&request, target, &lines);
            snapshot.fill(panel);
            snapshot.draw_box(panel, &lines);
            snapshot.panel = Some(panel);
        }

        snapshot
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// Where the tooltip panel was drawn.
    pub fn panel(&self) -> Option<Rect> {
        self.panel
    }

    pub fn row(&self, y: u16) -> String {
        if y >= self.height {
            return String::new();
        }
        let start = usize::from(y) * usize::from(self.width);
        self.cells[start..start + usize::from(self.width)].concat()
    }

    pub fn cell(&self, x: u16, y: u16) -> Option<&str> {
        (x < self.width && y < self.height).then(|| self.cells[self.index(x, y)].as_str())
    }

    pub fn contains(&self, needle: &str) -> bool {
        (0..self.height).any(|y| self.row(y).contains(needle))
    }

    fn index(&self, x: u16, y: u16) -> usize {
        usize::from(y) * usize::from(self.width) + usize::from(x)
    }

    fn area(&self) -> Rect {
        Rect::from_size(self.width, self.height)
    }

    fn fill(&mut self, area: Rect) {
        let Some(area) = area.intersection(&self.area()) else {
            return;
        };
        for y in area.y..area.bottom() {
            for x in area.x..area.right() {
                let index = self.index(x, y);
                self.cells[index] = " ".to_owned();
            }
        }
    }

    /// Write `text` starting at `(x, y)`, stopping at `limit` (exclusive).
    fn put_str(&mut self, x: u16, y: u16, text: &str, limit: u16) {
        if y >= self.height {
            return;
        }
        let limit = limit.min(self.width);
        let mut cursor = x;
        for grapheme in text.graphemes(true) {
            let width = UnicodeWidthStr::width(grapheme) as u16;
            if width == 0 {
                continue;
            }
            if cursor.saturating_add(width) > limit {
                break;
            }
            let index = self.index(cursor, y);
            self.cells[index] = grapheme.to_owned();
            for extra in 1..width {
                let index = self.index(cursor + extra, y);
                self.cells[index] = String::new();
            }
            cursor += width;
        }
    }

    fn put(&mut self, x: u16, y: u16, glyph: &str) {
        if x < self.width && y < self.height {
            let index = self.index(x, y);
            self.cells[index] = glyph.to_owned();
        }
    }

    /// Border around `bounds` with `lines` inside. Areas too small for a
    /// border get the first line only.
    fn draw_box(&mut self, bounds: Rect, lines: &[String]) {
        if bounds.is_empty() {
            return;
        }
        if bounds.width < 2 || bounds.height < 2 {
            if let Some(line) = lines.first() {
                self.put_str(bounds.x, bounds.y, line, bounds.right());
            }
            return;
        }
        let (left, top) = (bounds.x, bounds.y);
        let (right, bottom) = (bounds.right() - 1, bounds.bottom() - 1);
        for x in left + 1..right {
            self.put(x, top, "─");
            self.put(x, bottom, "─");
        }
        for y in top + 1..bottom {
            self.put(left, y, "│");
            self.put(right, y, "│");
        }
        self.put(left, top, "┌");
        self.put(right, top, "┐");
        self.put(left, bottom, "└");
        self.put(right, bottom, "┘");

        let inner_top = if bounds.height > 2 { top + 1 } else { top };
        for (offset, line) in lines.iter().enumerate() {
            let y = inner_top + offset as u16;
            if y >= bottom && bounds.height > 2 {
                break;
            }
            let x = if bounds.height > 2 { left + 2 } else { left + 1 };
            self.put_str(x, y, line, right.saturating_sub(1).max(x));
        }
    }

    fn place_panel(&self, request: &TooltipRequest, target: Option<Rect>, lines: &[String]) -> Rect {
        let content_width = lines
            .iter()
            .map(|line| UnicodeWidthStr::width(line.as_str()))
            .max()
            .unwrap_or(0);
        let width = (content_width as u16 + 4).min(PANEL_MAX_WIDTH).min(self.width);
        let height = (lines.len() as u16 + 2).min(self.height);

        let screen = self.area();
        let Some(target) = target else {
            return screen.centered(width, height);
        };

        let gap = 1u16;
        let below = (i32::from(target.x), i32::from(target.bottom()) + i32::from(gap));
        let above = (
            i32::from(target.x),
            i32::from(target.y) - i32::from(height) - i32::from(gap),
        );
        let right = (i32::from(target.right()) + i32::from(gap), i32::from(target.y));
        let left = (
            i32::from(target.x) - i32::from(width) - i32::from(gap),
            i32::from(target.y),
        );
        let fits = |(x, y): (i32, i32)| {
            x >= 0
                && y >= 0
                && x + i32::from(width) <= i32::from(screen.right())
                && y + i32::from(height) <= i32::from(screen.bottom())
        };

        let preferred = match request.placement.unwrap_or_default() {
            Placement::Top => [above, below, right, left],
            Placement::Bottom | Placement::Auto => [below, above, right, left],
            Placement::Left => [left, right, below, above],
            Placement::Right => [right, left, below, above],
        };
        let (x, y) = preferred
            .into_iter()
            .find(|position| fits(*position))
            .unwrap_or(preferred[0]);

        let max_x = i32::from(screen.right()) - i32::from(width);
        let max_y = i32::from(screen.bottom()) - i32::from(height);
        Rect::new(
            x.clamp(0, max_x.max(0)) as u16,
            y.clamp(0, max_y.max(0)) as u16,
            width,
            height,
        )
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.height {
            writeln!(f, "{}", self.row(y).trim_end())?;
        }
        Ok(())
    }
}

/// Text of a step's content: wrapped text lines, then one line of buttons.
fn panel_lines(host: &HeadlessHost, content: ElementId) -> Vec<String> {
    let document = &host.document;
    let inner = usize::from(PANEL_MAX_WIDTH - 4);
    let mut lines = Vec::new();
    let mut buttons = Vec::new();
    let mut stack = vec![content];
    while let Some(element) = stack.pop() {
        if let Some(text) = document.text(element) {
            if document.tag(element).as_deref() == Some("button") {
                buttons.push(format!("[{text}]"));
            } else {
                lines.extend(wrap(&text, inner));
            }
        }
        stack.extend(document.children(element).into_iter().rev());
    }
    if !buttons.is_empty() {
        lines.push(buttons.join(" "));
    }
    lines
}

/// Greedy word wrap by display width.
fn wrap(text: &str, max_width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    let mut width = 0usize;
    for word in text.split_whitespace() {
        let word_width = UnicodeWidthStr::width(word);
        if width > 0 && width + 1 + word_width > max_width {
            lines.push(std::mem::take(&mut line));
            width = 0;
        }
        if width > 0 {
            line.push(' ');
            width += 1;
        }
        line.push_str(word);
        width += word_width;
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}
