// SPDX-License-Identifier: GPL-3.0-only

//! Terminal video output
//!
//! Renders frames to the terminal using Unicode half-block characters for
//! improved vertical resolution, in true color or the 256-color palette.
//! A plain mode draws a monochrome character ramp instead.

use super::subopt::{IntCheck, OptSpec, SubOptions};
use super::types::*;
use super::VideoOutput;
use crate::constants::terminal::{EQUALIZER_MAX, EQUALIZER_MIN, EVENT_POLL_TIMEOUT, PLAIN_RAMP};
use crate::media::formats::conversions::{can_convert, luma, sample_rgb};
use crate::media::MpImage;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal, backend::CrosstermBackend, buffer::Buffer, layout::Rect, style::Color, style::Style,
    widgets::Widget,
};
use std::io::{self, IsTerminal, Stdout, stdout};
use tracing::{debug, info, warn};

pub static INFO: VoInfo = VoInfo {
    name: "true-color terminal",
    short_name: "tct",
    author: "vidout",
    comment: "Half-block rendering with 24-bit or 256 colors",
    autoprobe: true,
};

const SUBOPTS: &[OptSpec] = &[
    OptSpec::string("algo"),
    OptSpec::int("width", Some(IntCheck::Positive)),
    OptSpec::int("height", Some(IntCheck::Positive)),
    OptSpec::flag("256"),
];

/// How pixels become terminal cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderAlgo {
    /// Two pixels per cell: `▀` with the top pixel as foreground
    #[default]
    HalfBlocks,
    /// One pixel per cell, brightness picked from a character ramp
    Plain,
}

impl RenderAlgo {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "half-blocks" => Some(RenderAlgo::HalfBlocks),
            "plain" => Some(RenderAlgo::Plain),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TctSettings {
    pub algo: RenderAlgo,
    /// Output size in cells; the terminal size when unset
    pub width: Option<u16>,
    pub height: Option<u16>,
    pub palette256: bool,
}

/// Brightness and contrast, each in -100..=100
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Equalizer {
    pub brightness: i32,
    pub contrast: i32,
}

impl Equalizer {
    pub fn apply(&self, (r, g, b): (u8, u8, u8)) -> (u8, u8, u8) {
        if *self == Equalizer::default() {
            return (r, g, b);
        }
        let adjust = |v: u8| -> u8 {
            let centered = i32::from(v) - 128;
            let scaled = centered * (100 + self.contrast) / 100 + 128 + self.brightness * 255 / 100;
            scaled.clamp(0, 255) as u8
        };
        (adjust(r), adjust(g), adjust(b))
    }

    fn get(&self, name: &str) -> Option<i32> {
        match name {
            "brightness" => Some(self.brightness),
            "contrast" => Some(self.contrast),
            _ => None,
        }
    }

    fn set(&mut self, name: &str, value: i32) -> bool {
        let value = value.clamp(EQUALIZER_MIN, EQUALIZER_MAX);
        match name {
            "brightness" => self.brightness = value,
            "contrast" => self.contrast = value,
            _ => return false,
        }
        true
    }
}

pub struct TctOutput {
    settings: TctSettings,
    terminal: Option<Terminal<CrosstermBackend<Stdout>>>,
    frame: Option<MpImage>,
    osd: OsdState,
    equalizer: Equalizer,
    paused: bool,
}

impl TctOutput {
    pub fn new() -> Self {
        Self {
            settings: TctSettings::default(),
            terminal: None,
            frame: None,
            osd: OsdState::default(),
            equalizer: Equalizer::default(),
            paused: false,
        }
    }

    pub fn settings(&self) -> TctSettings {
        self.settings
    }

    fn parse_settings(subopts: &str) -> VoResult<TctSettings> {
        let opts = SubOptions::parse(subopts, SUBOPTS).map_err(|source| VoError::SubOption {
            driver: INFO.short_name,
            source,
        })?;
        let algo = match opts.string("algo") {
            Some(name) => RenderAlgo::from_name(name).ok_or_else(|| VoError::SubOption {
                driver: INFO.short_name,
                source: super::SubOptError::InvalidValue {
                    name: "algo".into(),
                    value: name.into(),
                },
            })?,
            None => RenderAlgo::default(),
        };
        let cells = |name: &str| opts.int(name).map(|v| u16::try_from(v).unwrap_or(u16::MAX));
        Ok(TctSettings {
            algo,
            width: cells("width"),
            height: cells("height"),
            palette256: opts.is_set("256"),
        })
    }

    fn open_terminal(&mut self) -> VoResult<()> {
        if self.terminal.is_some() {
            return Ok(());
        }
        enable_raw_mode()?;
        let terminal = undo_on_error(
            || {
                let mut stdout = stdout();
                execute!(stdout, EnterAlternateScreen)?;
                undo_on_error(
                    || Terminal::new(CrosstermBackend::new(stdout)),
                    || execute!(io::stdout(), LeaveAlternateScreen),
                )
            },
            disable_raw_mode,
        )?;
        self.terminal = Some(terminal);
        info!("Terminal output started");
        Ok(())
    }

    /// Status bar text: the OSD line, marked while paused
    fn status_text(&self) -> String {
        let line = self.osd.status_line();
        match (self.paused, line.is_empty()) {
            (false, _) => line,
            (true, true) => "Paused".to_string(),
            (true, false) => format!("Paused | {line}"),
        }
    }

    /// Redraw the last frame when the output is up, so state changes show while no frames arrive
    fn refresh(&mut self) -> VoResult<()> {
        if self.terminal.is_some() && self.frame.is_some() {
            self.flip_page()?;
        }
        Ok(())
    }

    fn close_terminal(&mut self) {
        let Some(mut terminal) = self.terminal.take() else {
            return;
        };
        let restore = disable_raw_mode()
            .and_then(|()| execute!(terminal.backend_mut(), LeaveAlternateScreen))
            .and_then(|()| terminal.show_cursor());
        if let Err(e) = restore {
            warn!(error = %e, "Failed to restore terminal");
        }
    }
}

/// Run `setup`; when it fails, run `undo` to roll back the step taken before it
fn undo_on_error<T>(setup: impl FnOnce() -> io::Result<T>, undo: impl FnOnce() -> io::Result<()>) -> io::Result<T> {
    setup().inspect_err(|_| {
        if let Err(e) = undo() {
            warn!(error = %e, "Failed to roll back terminal setup");
        }
    })
}

impl Default for TctOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TctOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TctOutput")
            .field("settings", &self.settings)
            .field("terminal", &self.terminal.is_some())
            .field("equalizer", &self.equalizer)
            .field("paused", &self.paused)
            .finish()
    }
}

impl VideoOutput for TctOutput {
    fn info(&self) -> &'static VoInfo {
        &INFO
    }

    fn preinit(&mut self, subopts: &str) -> VoResult<()> {
        let settings = Self::parse_settings(subopts)?;
        if !io::stdout().is_terminal() {
            return Err(VoError::NotAvailable {
                driver: INFO.short_name,
                reason: "stdout is not a terminal".into(),
            });
        }
        self.settings = settings;
        Ok(())
    }

    fn config(&mut self, cfg: &VoConfig) -> VoResult<()> {
        if !can_convert(cfg.format) {
            return Err(VoError::FormatNotSupported(cfg.format));
        }
        self.open_terminal()?;
        self.frame = Some(MpImage::new(cfg.format, cfg.width, cfg.height));
        debug!(width = cfg.width, height = cfg.height, format = %cfg.format, "tct configured");
        Ok(())
    }

    fn uninit(&mut self) {
        self.close_terminal();
        self.frame = None;
        self.osd = OsdState::default();
    }

    fn control(&mut self, req: Control<'_>) -> VoResult<ControlReply> {
        match req {
            Control::QueryFormat(format) if can_convert(format) => {
                Ok(ControlReply::Caps(VfCaps::CSP_SUPPORTED | VfCaps::OSD | VfCaps::SWSCALE))
            }
            Control::QueryFormat(_) => Ok(ControlReply::Caps(VfCaps::empty())),
            Control::DrawImage(image) => {
                let Some(frame) = self.frame.as_mut() else {
                    return Err(VoError::NotConfigured);
                };
                if image.format != frame.format || image.width != frame.width || image.height != frame.height {
                    return Ok(ControlReply::False);
                }
                frame.clone_from(image);
                Ok(ControlReply::True)
            }
            Control::Pause | Control::Resume => {
                self.paused = matches!(req, Control::Pause);
                self.refresh()?;
                Ok(ControlReply::True)
            }
            Control::GetEqualizer(name) => Ok(self.equalizer.get(name).map_or(ControlReply::NotImpl, ControlReply::Value)),
            Control::SetEqualizer(name, value) => Ok(if self.equalizer.set(name, value) {
                ControlReply::True
            } else {
                ControlReply::NotImpl
            }),
            _ => Ok(ControlReply::NotImpl),
        }
    }

    fn draw_frame(&mut self, planes: &[&[u8]]) -> VoResult<()> {
        let Some(frame) = self.frame.as_mut() else {
            return Err(VoError::NotConfigured);
        };
        let owned = planes.iter().map(|p| p.to_vec()).collect();
        *frame = MpImage::from_packed_planes(frame.format, frame.width, frame.height, owned)
            .ok_or_else(|| VoError::InvalidFrame("frame does not match the configured format".into()))?;
        Ok(())
    }

    fn draw_slice(&mut self, planes: &[&[u8]], strides: &[usize], w: u32, h: u32, x: u32, y: u32) -> VoResult<()> {
        let Some(frame) = self.frame.as_mut() else {
            return Err(VoError::NotConfigured);
        };
        frame
            .copy_slice(planes, strides, w, h, x, y)
            .map_err(|e| VoError::InvalidFrame(e.to_string()))
    }

    fn draw_osd(&mut self, osd: &OsdState) {
        self.osd.clone_from(osd);
    }

    fn flip_page(&mut self) -> VoResult<()> {
        let status = self.status_text();
        let (Some(terminal), Some(frame)) = (self.terminal.as_mut(), self.frame.as_ref()) else {
            return Err(VoError::NotConfigured);
        };
        let widget = FrameWidget {
            image: frame,
            settings: self.settings,
            equalizer: self.equalizer,
        };
        terminal.draw(|f| {
            let area = f.area();

            // Reserve bottom line for status
            let frame_area = Rect {
                height: area.height.saturating_sub(1),
                ..area
            };
            f.render_widget(&widget, frame_area);

            let status_area = Rect {
                x: area.x,
                y: area.height.saturating_sub(1),
                width: area.width,
                height: 1,
            };
            f.render_widget(StatusBar { message: &status }, status_area);
        })?;
        Ok(())
    }

    fn check_events(&mut self) -> VoResult<Vec<VoEvent>> {
        let mut events = Vec::new();
        while event::poll(EVENT_POLL_TIMEOUT)? {
            if let Some(ev) = map_event(&event::read()?) {
                events.push(ev);
            }
        }
        Ok(events)
    }
}

/// Translate a terminal event into a player event
pub fn map_event(event: &Event) -> Option<VoEvent> {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(VoEvent::Quit),
            KeyCode::Char('q') | KeyCode::Esc => Some(VoEvent::Quit),
            KeyCode::Char(' ') | KeyCode::Char('p') => Some(VoEvent::TogglePause),
            KeyCode::Char(c) => Some(VoEvent::Key(c)),
            _ => None,
        },
        Event::Resize(width, height) => Some(VoEvent::Resize {
            width: *width,
            height: *height,
        }),
        _ => None,
    }
}

/// Nearest entry of the 6x6x6 color cube of the 256-color palette
pub fn ansi256(r: u8, g: u8, b: u8) -> u8 {
    let level = |v: u8| ((u16::from(v) * 5 + 127) / 255) as u8;
    16 + 36 * level(r) + 6 * level(g) + level(b)
}

/// Widget that renders an image into the cells of an area
struct FrameWidget<'a> {
    image: &'a MpImage,
    settings: TctSettings,
    equalizer: Equalizer,
}

impl FrameWidget<'_> {
    fn color(&self, rgb: (u8, u8, u8)) -> Color {
        let (r, g, b) = self.equalizer.apply(rgb);
        if self.settings.palette256 {
            Color::Indexed(ansi256(r, g, b))
        } else {
            Color::Rgb(r, g, b)
        }
    }
}

impl Widget for &FrameWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let image = self.image;
        if image.width == 0 || image.height == 0 || area.width == 0 || area.height == 0 {
            return;
        }
        let cols = self.settings.width.map_or(area.width, |w| w.min(area.width));
        let rows = self.settings.height.map_or(area.height, |h| h.min(area.height));

        // Pixels per cell vertically
        let per_cell = match self.settings.algo {
            RenderAlgo::HalfBlocks => 2.0,
            RenderAlgo::Plain => 1.0,
        };

        // Fit while keeping the aspect ratio
        let frame_aspect = image.width as f64 / image.height as f64;
        let term_width = cols as f64;
        let term_height = rows as f64 * per_cell;
        let (display_width, display_height) = if term_width / term_height > frame_aspect {
            let h = term_height;
            ((h * frame_aspect) as u16, (h / per_cell) as u16)
        } else {
            let w = term_width;
            (w as u16, (w / frame_aspect / per_cell) as u16)
        };
        let (display_width, display_height) = (display_width.max(1), display_height.max(1));

        let x_offset = area.x + area.width.saturating_sub(display_width) / 2;
        let y_offset = area.y + area.height.saturating_sub(display_height) / 2;
        let x_scale = image.width as f64 / display_width as f64;
        let y_scale = image.height as f64 / (display_height as f64 * per_cell);

        for ty in 0..display_height {
            for tx in 0..display_width {
                let Some(cell) = buf.cell_mut((x_offset + tx, y_offset + ty)) else {
                    continue;
                };
                let src_x = (tx as f64 * x_scale) as u32;
                match self.settings.algo {
                    RenderAlgo::HalfBlocks => {
                        let src_y_top = (ty as f64 * 2.0 * y_scale) as u32;
                        let src_y_bottom = ((ty as f64 * 2.0 + 1.0) * y_scale) as u32;
                        cell.set_char('▀');
                        cell.set_fg(self.color(sample_rgb(image, src_x, src_y_top)));
                        cell.set_bg(self.color(sample_rgb(image, src_x, src_y_bottom)));
                    }
                    RenderAlgo::Plain => {
                        let (r, g, b) = self.equalizer.apply(sample_rgb(image, src_x, (ty as f64 * y_scale) as u32));
                        let idx = usize::from(luma(r, g, b)) * (PLAIN_RAMP.len() - 1) / 255;
                        cell.set_char(char::from(PLAIN_RAMP[idx]));
                    }
                }
            }
        }
    }
}

/// Status bar widget
struct StatusBar<'a> {
    message: &'a str,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(Color::DarkGray);
            }
        }
        let text: String = self.message.chars().take(area.width as usize).collect();
        buf.set_string(area.x, area.y, text, Style::default().fg(Color::White).bg(Color::DarkGray));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::ImgFmt;
    use crossterm::event::KeyEvent;

    fn solid(r: u8, g: u8, b: u8, w: u32, h: u32) -> MpImage {
        let mut image = MpImage::new(ImgFmt::RGB24, w, h);
        let stride = image.planes[0].stride;
        for y in 0..h as usize {
            for px in image.planes[0].data[y * stride..y * stride + w as usize * 3].chunks_exact_mut(3) {
                px.copy_from_slice(&[r, g, b]);
            }
        }
        image
    }

    #[test]
    fn test_suboptions() {
        let settings = TctOutput::parse_settings("algo=plain:width=40:256").unwrap();
        assert_eq!(settings.algo, RenderAlgo::Plain);
        assert_eq!(settings.width, Some(40));
        assert_eq!(settings.height, None);
        assert!(settings.palette256);
        assert!(TctOutput::parse_settings("algo=braille").is_err());
        assert!(TctOutput::parse_settings("width=0").is_err());
    }

    #[test]
    fn test_half_blocks_fill_area() {
        let image = solid(255, 0, 0, 4, 4);
        let widget = FrameWidget {
            image: &image,
            settings: TctSettings::default(),
            equalizer: Equalizer::default(),
        };
        let area = Rect::new(0, 0, 4, 2);
        let mut buf = Buffer::empty(area);
        (&widget).render(area, &mut buf);
        let cell = &buf[(0, 0)];
        assert_eq!(cell.symbol(), "▀");
        assert_eq!(cell.fg, Color::Rgb(255, 0, 0));
        assert_eq!(buf[(3, 1)].bg, Color::Rgb(255, 0, 0));
    }

    #[test]
    fn test_palette256() {
        assert_eq!(ansi256(0, 0, 0), 16);
        assert_eq!(ansi256(255, 255, 255), 231);
        assert_eq!(ansi256(255, 0, 0), 196);
    }

    #[test]
    fn test_plain_ramp() {
        let image = solid(255, 255, 255, 2, 1);
        let widget = FrameWidget {
            image: &image,
            settings: TctSettings {
                algo: RenderAlgo::Plain,
                ..TctSettings::default()
            },
            equalizer: Equalizer::default(),
        };
        let area = Rect::new(0, 0, 2, 1);
        let mut buf = Buffer::empty(area);
        (&widget).render(area, &mut buf);
        assert_eq!(buf[(0, 0)].symbol(), "@");
    }

    #[test]
    fn test_equalizer() {
        let mut tct = TctOutput::new();
        assert_eq!(tct.control(Control::SetEqualizer("brightness", 500)).unwrap(), ControlReply::True);
        assert_eq!(tct.control(Control::GetEqualizer("brightness")).unwrap(), ControlReply::Value(100));
        assert_eq!(tct.control(Control::SetEqualizer("hue", 5)).unwrap(), ControlReply::NotImpl);
        assert_eq!(tct.equalizer.apply((0, 0, 0)), (255, 255, 255));

        let contrast = Equalizer {
            brightness: 0,
            contrast: -100,
        };
        assert_eq!(contrast.apply((0, 200, 255)), (128, 128, 128));
    }

    #[test]
    fn test_key_mapping() {
        let key = |code, modifiers| Event::Key(KeyEvent::new(code, modifiers));
        assert_eq!(map_event(&key(KeyCode::Char('q'), KeyModifiers::NONE)), Some(VoEvent::Quit));
        assert_eq!(map_event(&key(KeyCode::Esc, KeyModifiers::NONE)), Some(VoEvent::Quit));
        assert_eq!(map_event(&key(KeyCode::Char('c'), KeyModifiers::CONTROL)), Some(VoEvent::Quit));
        assert_eq!(map_event(&key(KeyCode::Char(' '), KeyModifiers::NONE)), Some(VoEvent::TogglePause));
        assert_eq!(map_event(&key(KeyCode::Char('f'), KeyModifiers::NONE)), Some(VoEvent::Key('f')));
        assert_eq!(
            map_event(&Event::Resize(120, 40)),
            Some(VoEvent::Resize { width: 120, height: 40 })
        );
        assert_eq!(map_event(&key(KeyCode::F(1), KeyModifiers::NONE)), None);
    }

    #[test]
    fn test_status_bar_truncates() {
        let area = Rect::new(0, 0, 3, 1);
        let mut buf = Buffer::empty(area);
        StatusBar { message: "Paused" }.render(area, &mut buf);
        assert_eq!(buf[(2, 0)].symbol(), "u");
    }

    #[test]
    fn test_failed_setup_rolls_back() {
        let mut undone = false;
        let result: io::Result<()> = undo_on_error(
            || Err(io::Error::other("no tty")),
            || {
                undone = true;
                Ok(())
            },
        );
        assert!(result.is_err());
        assert!(undone);

        let mut undone = false;
        let value = undo_on_error(
            || Ok(7),
            || {
                undone = true;
                Ok(())
            },
        )
        .unwrap();
        assert_eq!(value, 7);
        assert!(!undone);
    }

    #[test]
    fn test_pause_marks_status() {
        let mut vo = TctOutput::new();
        vo.draw_osd(&OsdState {
            message: Some("clip 3".into()),
            progress: None,
        });
        assert_eq!(vo.status_text(), "clip 3");

        // Without a terminal there is nothing to redraw
        assert_eq!(vo.control(Control::Pause).unwrap(), ControlReply::True);
        assert_eq!(vo.status_text(), "Paused | clip 3");
        vo.draw_osd(&OsdState::default());
        assert_eq!(vo.status_text(), "Paused");

        vo.control(Control::Resume).unwrap();
        assert_eq!(vo.status_text(), "");
    }
}
