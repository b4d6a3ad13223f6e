use crate::departure::Departure;
use crate::render::Renderer;
use embedded_graphics::{
    mono_font::{ascii::FONT_4X6, MonoTextStyle},
    pixelcolor::Rgb888,
    prelude::*,
    text::Text,
};
use rpi_led_matrix::{LedCanvas, LedColor, LedMatrix, LedMatrixOptions};

pub struct DisplayConfig {
    /// Matrix width in pixels
    pub width: u32,
    /// Matrix height in pixels
    pub height: u32,
    /// Hardware mapping (e.g., "regular", "adafruit-hat", etc.)
    pub hardware_mapping: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 64,
            height: 32,
            hardware_mapping: "regular".to_string(),
        }
    }
}

// FONT_4X6 glyph size
const GLYPH_WIDTH: u32 = 4;
const LINE_HEIGHT: i32 = 6;

// NS house colours
const NS_BLUE: LedColor = LedColor { red: 0, green: 48, blue: 130 };
const NS_YELLOW: LedColor = LedColor { red: 255, green: 200, blue: 23 };
const WHITE: LedColor = LedColor { red: 255, green: 255, blue: 255 };
const DELAY_RED: LedColor = LedColor { red: 219, green: 0, blue: 41 };

/// LED matrix departure board: station header plus as many rows as fit.
pub struct LedBoard {
    matrix: LedMatrix,
    config: DisplayConfig,
}

impl LedBoard {
    pub fn new() -> Result<Self, String> {
        Self::with_config(DisplayConfig::default())
    }

    pub fn with_config(config: DisplayConfig) -> Result<Self, String> {
        let mut options = LedMatrixOptions::new();
        options.set_cols(config.width);
        options.set_rows(config.height);
        options.set_hardware_mapping(&config.hardware_mapping);

        let matrix = LedMatrix::new(Some(options), None)
            .map_err(|e| format!("Failed to initialize LED matrix: {}", e))?;

        Ok(Self { matrix, config })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    fn chars_per_line(&self) -> usize {
        (self.config.width / GLYPH_WIDTH) as usize
    }

    fn rows_available(&self) -> usize {
        // First line is the header
        (self.config.height as i32 / LINE_HEIGHT - 1).max(0) as usize
    }

    /// Draw text on the canvas with its baseline at y
    fn draw_text(&self, canvas: &mut LedCanvas, text: &str, x: i32, y: i32, color: LedColor) {
        // Convert LedColor to Rgb888 for embedded-graphics
        let rgb_color = Rgb888::new(color.red, color.green, color.blue);
        let style = MonoTextStyle::new(&FONT_4X6, rgb_color);
        let _ = Text::new(text, Point::new(x, y), style).draw(canvas);
    }
}

impl Renderer for LedBoard {
    fn render(&mut self, station_label: &str, departures: &[Departure]) {
        let mut canvas = self.matrix.offscreen_canvas();
        canvas.fill(&NS_BLUE);

        let max_chars = self.chars_per_line();
        let header: String = station_label.chars().take(max_chars).collect();
        self.draw_text(&mut canvas, &header, 0, LINE_HEIGHT - 1, WHITE);

        let rows = departures
            .iter()
            .filter(|d| !d.is_empty_slot())
            .take(self.rows_available());
        for (i, departure) in rows.enumerate() {
            let y = (i as i32 + 2) * LINE_HEIGHT - 1;
            let color = if departure.cancelled || departure.delay_minutes > 0 {
                DELAY_RED
            } else {
                NS_YELLOW
            };
            let text = departure.format_truncated(max_chars);
            self.draw_text(&mut canvas, &text, 0, y, color);
        }

        // Swap canvas to display
        let old_canvas = self.matrix.swap(canvas);
        drop(old_canvas);
    }
}
