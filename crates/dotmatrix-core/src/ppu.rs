#[cfg(feature = "ppu-trace")]
use log::trace;

use crate::{
    bus::IoBus,
    interrupts::Interrupt,
    mmu::{BGP, LCDC, LY, LYC, OBP0, OBP1, SCX, SCY, STAT, WX, WY},
};

pub const SCREEN_WIDTH: usize = 160;
pub const SCREEN_HEIGHT: usize = 144;
/// Width and height of the debug layers.
pub const MAP_SIZE: usize = 256;

// Mode timings in CPU cycles
pub const OAM_SEARCH_CYCLES: u32 = 80;
pub const VRAM_READ_CYCLES: u32 = 172;
pub const HBLANK_CYCLES: u32 = 204;
pub const LINE_CYCLES: u32 = OAM_SEARCH_CYCLES + VRAM_READ_CYCLES + HBLANK_CYCLES;

pub const VBLANK_LINES: u32 = 10;
pub const LINES_PER_FRAME: u32 = SCREEN_HEIGHT as u32 + VBLANK_LINES;
pub const CYCLES_PER_FRAME: u32 = LINE_CYCLES * LINES_PER_FRAME;

const MAX_SPRITES_PER_LINE: usize = 10;
const TOTAL_SPRITES: usize = 40;

// Offsets into VRAM
const BG_MAP_0_BASE: usize = 0x1800;
const BG_MAP_1_BASE: usize = 0x1C00;
const TILE_DATA_1_BASE: usize = 0x0800;
const TILE_COUNT: usize = 384;

// Window is hidden for WX values past the right edge.
const WINDOW_X_MAX: u8 = 166;

/// PPU modes, numbered as they appear in STAT bits 0-1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    HBlank = 0,
    VBlank = 1,
    OamSearch = 2,
    VramRead = 3,
}

impl Mode {
    /// Cycles spent in this mode for one scanline.
    pub const fn duration(self) -> u32 {
        match self {
            Mode::OamSearch => OAM_SEARCH_CYCLES,
            Mode::VramRead => VRAM_READ_CYCLES,
            Mode::HBlank => HBLANK_CYCLES,
            Mode::VBlank => LINE_CYCLES,
        }
    }
}

/// Sprite selection order when several overlap on one line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SpriteOrder {
    /// DMG: lower X wins, ties broken by OAM index.
    #[default]
    Coordinate,
    /// CGB: lower OAM index wins.
    OamIndex,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Sprite {
    pub y: i16,
    pub x: i16,
    pub tile: u8,
    pub flags: u8,
    pub oam_index: usize,
}

impl Sprite {
    fn from_oam(oam: &[u8], index: usize) -> Self {
        let base = index * 4;
        Self {
            y: oam[base] as i16 - 16,
            x: oam[base + 1] as i16 - 8,
            tile: oam[base + 2],
            flags: oam[base + 3],
            oam_index: index,
        }
    }
}

/// A grid of 2-bit colour numbers straight from tile data, paired with the
/// shades they map to through BGP/OBP0/OBP1. Both are in 0-3.
#[derive(Debug, Clone)]
pub struct Layer {
    width: usize,
    height: usize,
    indices: Vec<u8>,
    shades: Vec<u8>,
}

impl Layer {
    fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            indices: vec![0; width * height],
            shades: vec![0; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn index(&self, x: usize, y: usize) -> u8 {
        self.indices[y * self.width + x]
    }

    pub fn shade(&self, x: usize, y: usize) -> u8 {
        self.shades[y * self.width + x]
    }

    pub fn indices(&self) -> &[u8] {
        &self.indices
    }

    pub fn shades(&self) -> &[u8] {
        &self.shades
    }

    fn set(&mut self, x: usize, y: usize, index: u8, shade: u8) {
        let i = y * self.width + x;
        self.indices[i] = index;
        self.shades[i] = shade;
    }

    fn clear_row(&mut self, y: usize) {
        let row = y * self.width..(y + 1) * self.width;
        self.indices[row.clone()].fill(0);
        self.shades[row].fill(0);
    }
}

pub struct Ppu {
    mode: Mode,
    mode_clock: u32,
    line: u8,
    lcd_on: bool,
    lyc_match: bool,
    /// Window rows drawn so far this frame.
    win_line_counter: u8,
    sprite_order: SpriteOrder,
    sprites: [Sprite; TOTAL_SPRITES],
    line_sprites: [Sprite; MAX_SPRITES_PER_LINE],
    sprite_count: usize,
    /// Sprite height latched by the last OAM search.
    sprite_height: i16,
    background: Layer,
    window: Layer,
    sprite_layer: Layer,
    screen: Layer,
    background_map: Layer,
    window_map: Layer,
    tileset: Layer,
    frames: u64,
}

impl Ppu {
    pub fn new() -> Self {
        Self::with_sprite_order(SpriteOrder::default())
    }

    pub fn with_sprite_order(sprite_order: SpriteOrder) -> Self {
        Self {
            mode: Mode::OamSearch,
            mode_clock: 0,
            line: 0,
            lcd_on: true,
            lyc_match: false,
            win_line_counter: 0,
            sprite_order,
            sprites: std::array::from_fn(|i| Sprite::from_oam(&[0; TOTAL_SPRITES * 4], i)),
            line_sprites: [Sprite::default(); MAX_SPRITES_PER_LINE],
            sprite_count: 0,
            sprite_height: 8,
            background: Layer::new(SCREEN_WIDTH, SCREEN_HEIGHT),
            window: Layer::new(SCREEN_WIDTH, SCREEN_HEIGHT),
            sprite_layer: Layer::new(SCREEN_WIDTH, SCREEN_HEIGHT),
            screen: Layer::new(SCREEN_WIDTH, SCREEN_HEIGHT),
            background_map: Layer::new(MAP_SIZE, MAP_SIZE),
            window_map: Layer::new(MAP_SIZE, MAP_SIZE),
            tileset: Layer::new(MAP_SIZE, MAP_SIZE),
            frames: 0,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Cycles already spent in the current mode.
    pub fn mode_clock(&self) -> u32 {
        self.mode_clock
    }

    pub fn line(&self) -> u8 {
        self.line
    }

    /// Completed frames since power-on.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn sprites(&self) -> &[Sprite; TOTAL_SPRITES] {
        &self.sprites
    }

    pub fn screen(&self) -> &Layer {
        &self.screen
    }

    pub fn background(&self) -> &Layer {
        &self.background
    }

    pub fn window(&self) -> &Layer {
        &self.window
    }

    pub fn sprite_layer(&self) -> &Layer {
        &self.sprite_layer
    }

    pub fn background_map(&self) -> &Layer {
        &self.background_map
    }

    pub fn window_map(&self) -> &Layer {
        &self.window_map
    }

    pub fn tileset(&self) -> &Layer {
        &self.tileset
    }

    /// Advance by `cycles`. Returns true when the frame reached draw time,
    /// i.e. the PPU entered VBlank during this call.
    pub fn step(&mut self, cycles: u32, bus: &mut dyn IoBus) -> bool {
        if bus.io(LCDC) & 0x80 == 0 {
            if self.lcd_on {
                self.lcd_on = false;
                self.mode = Mode::HBlank;
                self.mode_clock = 0;
                self.line = 0;
                self.win_line_counter = 0;
                bus.set_io(LY, 0);
                self.write_stat(bus);
            }
            return false;
        }

        if !self.lcd_on {
            self.lcd_on = true;
            self.mode = Mode::OamSearch;
            self.mode_clock = 0;
            self.line = 0;
            bus.set_io(LY, 0);
            self.compare_lyc(bus);
        }

        let mut draw_time = false;
        self.mode_clock += cycles;
        while self.mode_clock >= self.mode.duration() {
            self.mode_clock -= self.mode.duration();
            match self.mode {
                Mode::OamSearch => {
                    self.oam_search(bus);
                    self.enter(Mode::VramRead, bus);
                }
                Mode::VramRead => {
                    self.render_scanline(bus);
                    self.enter(Mode::HBlank, bus);
                }
                Mode::HBlank => {
                    self.line += 1;
                    if self.line as usize == SCREEN_HEIGHT {
                        bus.request_interrupt(Interrupt::VBlank);
                        self.enter(Mode::VBlank, bus);
                        draw_time = true;
                    } else {
                        self.enter(Mode::OamSearch, bus);
                    }
                    self.sync_line(bus);
                }
                Mode::VBlank => {
                    self.line += 1;
                    if self.line as u32 == LINES_PER_FRAME {
                        self.line = 0;
                        self.win_line_counter = 0;
                        self.frames += 1;
                        self.refresh_sprites(bus);
                        self.refresh_debug_layers(bus);
                        self.enter(Mode::OamSearch, bus);
                    }
                    self.sync_line(bus);
                }
            }
        }
        self.compare_lyc(bus);
        draw_time
    }

    fn enter(&mut self, mode: Mode, bus: &mut dyn IoBus) {
        #[cfg(feature = "ppu-trace")]
        trace!("LY={} {:?} -> {:?}", self.line, self.mode, mode);

        self.mode = mode;
        let enable = match mode {
            Mode::HBlank => 0x08,
            Mode::VBlank => 0x10,
            Mode::OamSearch => 0x20,
            Mode::VramRead => 0x00,
        };
        if bus.io(STAT) & enable != 0 {
            bus.request_interrupt(Interrupt::LcdStat);
        }
        self.write_stat(bus);
    }

    fn sync_line(&mut self, bus: &mut dyn IoBus) {
        bus.set_io(LY, self.line);
        self.compare_lyc(bus);
    }

    /// Update the coincidence flag; request LCD STAT when LY starts matching
    /// LYC and STAT bit 6 is set.
    fn compare_lyc(&mut self, bus: &mut dyn IoBus) {
        let matched = self.line == bus.io(LYC);
        if matched && !self.lyc_match && bus.io(STAT) & 0x40 != 0 {
            bus.request_interrupt(Interrupt::LcdStat);
        }
        self.lyc_match = matched;
        self.write_stat(bus);
    }

    fn write_stat(&self, bus: &mut dyn IoBus) {
        let stat = bus.io(STAT) & 0x78;
        let lyc = if self.lyc_match && self.lcd_on { 0x04 } else { 0 };
        bus.set_io(STAT, stat | lyc | self.mode as u8);
    }

    /// Re-read all 40 OAM entries.
    fn refresh_sprites(&mut self, bus: &dyn IoBus) {
        let oam = bus.oam();
        for (i, sprite) in self.sprites.iter_mut().enumerate() {
            *sprite = Sprite::from_oam(oam, i);
        }
    }

    /// Collect up to 10 sprites visible on the current scanline.
    fn oam_search(&mut self, bus: &dyn IoBus) {
        let height: i16 = if bus.io(LCDC) & 0x04 != 0 { 16 } else { 8 };
        let ly = self.line as i16;
        self.sprite_height = height;
        self.sprite_count = 0;
        for sprite in &self.sprites {
            if self.sprite_count >= MAX_SPRITES_PER_LINE {
                break;
            }
            if ly >= sprite.y && ly < sprite.y + height {
                self.line_sprites[self.sprite_count] = *sprite;
                self.sprite_count += 1;
            }
        }
        let visible = &mut self.line_sprites[..self.sprite_count];
        match self.sprite_order {
            SpriteOrder::Coordinate => visible.sort_by_key(|s| (s.x, s.oam_index)),
            SpriteOrder::OamIndex => visible.sort_by_key(|s| s.oam_index),
        }
    }

    fn render_scanline(&mut self, bus: &dyn IoBus) {
        let y = self.line as usize;
        if y >= SCREEN_HEIGHT {
            return;
        }
        let lcdc = bus.io(LCDC);
        let bgp = bus.io(BGP);
        let vram = bus.vram();

        self.background.clear_row(y);
        self.window.clear_row(y);
        self.sprite_layer.clear_row(y);

        // Colour number of the winning BG/window pixel, for sprite priority.
        let mut bg_line = [0u8; SCREEN_WIDTH];

        if lcdc & 0x01 != 0 {
            let map_base = if lcdc & 0x08 != 0 {
                BG_MAP_1_BASE
            } else {
                BG_MAP_0_BASE
            };
            let scy = bus.io(SCY);
            let scx = bus.io(SCX);
            let map_y = scy.wrapping_add(self.line);
            for (x, bg) in bg_line.iter_mut().enumerate() {
                let map_x = scx.wrapping_add(x as u8);
                let id = map_pixel(vram, lcdc, map_base, map_x, map_y);
                self.background.set(x, y, id, dmg_shade(bgp, id));
                *bg = id;
            }

            let wy = bus.io(WY);
            let wx = bus.io(WX);
            if lcdc & 0x20 != 0 && self.line >= wy && wx <= WINDOW_X_MAX {
                let map_base = if lcdc & 0x40 != 0 {
                    BG_MAP_1_BASE
                } else {
                    BG_MAP_0_BASE
                };
                let start = wx.saturating_sub(7) as usize;
                let offset = 7 - wx.min(7) as usize;
                for x in start..SCREEN_WIDTH {
                    let win_x = (x - start + offset) as u8;
                    let id = map_pixel(vram, lcdc, map_base, win_x, self.win_line_counter);
                    self.window.set(x, y, id, dmg_shade(bgp, id));
                    bg_line[x] = id;
                }
                self.win_line_counter = self.win_line_counter.wrapping_add(1);
            }
        }

        for (x, &id) in bg_line.iter().enumerate() {
            self.screen.set(x, y, id, dmg_shade(bgp, id));
        }

        if lcdc & 0x02 == 0 {
            return;
        }

        // As of the OAM search, not the current LCDC.
        let height = self.sprite_height;
        let obp = [bus.io(OBP0), bus.io(OBP1)];
        let mut drawn = [false; SCREEN_WIDTH];
        for s in &self.line_sprites[..self.sprite_count] {
            let tile = if height == 16 { s.tile & 0xFE } else { s.tile };
            let mut row = self.line as i16 - s.y;
            if !(0..height).contains(&row) {
                continue;
            }
            if s.flags & 0x40 != 0 {
                row = height - 1 - row;
            }
            let addr = tile as usize * 16 + row as usize * 2;
            let palette = obp[((s.flags >> 4) & 0x01) as usize];
            for px in 0..8u8 {
                let sx = s.x + px as i16;
                if !(0..SCREEN_WIDTH as i16).contains(&sx) || drawn[sx as usize] {
                    continue;
                }
                let bit = if s.flags & 0x20 != 0 { px } else { 7 - px };
                let id = tile_row_pixel(vram, addr, bit);
                if id == 0 {
                    continue;
                }
                let sx = sx as usize;
                drawn[sx] = true;
                let shade = dmg_shade(palette, id);
                self.sprite_layer.set(sx, y, id, shade);
                if s.flags & 0x80 != 0 && bg_line[sx] != 0 {
                    continue;
                }
                self.screen.set(sx, y, id, shade);
            }
        }
    }

    /// Rebuild the 256x256 background map, window map and tileset views.
    fn refresh_debug_layers(&mut self, bus: &dyn IoBus) {
        let lcdc = bus.io(LCDC);
        let bgp = bus.io(BGP);
        let vram = bus.vram();
        let bg_base = if lcdc & 0x08 != 0 {
            BG_MAP_1_BASE
        } else {
            BG_MAP_0_BASE
        };
        let win_base = if lcdc & 0x40 != 0 {
            BG_MAP_1_BASE
        } else {
            BG_MAP_0_BASE
        };

        for y in 0..MAP_SIZE {
            for x in 0..MAP_SIZE {
                let id = map_pixel(vram, lcdc, bg_base, x as u8, y as u8);
                self.background_map.set(x, y, id, dmg_shade(bgp, id));
                let id = map_pixel(vram, lcdc, win_base, x as u8, y as u8);
                self.window_map.set(x, y, id, dmg_shade(bgp, id));
            }
        }

        // 384 tiles, 32 per row.
        for tile in 0..TILE_COUNT {
            let ox = (tile % 32) * 8;
            let oy = (tile / 32) * 8;
            for row in 0..8 {
                let addr = tile * 16 + row * 2;
                for px in 0..8u8 {
                    let id = tile_row_pixel(vram, addr, 7 - px);
                    self.tileset
                        .set(ox + px as usize, oy + row, id, dmg_shade(bgp, id));
                }
            }
        }
    }
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new()
    }
}

fn dmg_shade(palette: u8, color_id: u8) -> u8 {
    (palette >> (color_id * 2)) & 0x03
}

/// Colour number of bit `bit` (7 = leftmost) in the tile row at `addr`.
fn tile_row_pixel(vram: &[u8], addr: usize, bit: u8) -> u8 {
    let lo = vram[addr];
    let hi = vram[addr + 1];
    ((hi >> bit) & 1) << 1 | ((lo >> bit) & 1)
}

/// VRAM offset of a tile's data under LCDC bit 4: unsigned from 0x8000 or
/// signed around 0x9000.
fn tile_addr(lcdc: u8, index: u8) -> usize {
    if lcdc & 0x10 != 0 {
        index as usize * 16
    } else {
        TILE_DATA_1_BASE + ((index as i8 as i16 + 128) as usize) * 16
    }
}

/// Colour number at (`x`, `y`) of the 256x256 plane described by the tile map
/// at `map_base`.
fn map_pixel(vram: &[u8], lcdc: u8, map_base: usize, x: u8, y: u8) -> u8 {
    let tile_index = vram[map_base + (y as usize / 8) * 32 + x as usize / 8];
    let addr = tile_addr(lcdc, tile_index) + (y as usize % 8) * 2;
    tile_row_pixel(vram, addr, 7 - (x % 8))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_timing_adds_up() {
        assert_eq!(LINE_CYCLES, 456);
        assert_eq!(CYCLES_PER_FRAME, 70224);
    }

    #[test]
    fn signed_tile_addressing() {
        assert_eq!(tile_addr(0x10, 0x80), 0x0800);
        assert_eq!(tile_addr(0x00, 0x00), 0x1000);
        assert_eq!(tile_addr(0x00, 0x80), 0x0800);
        assert_eq!(tile_addr(0x00, 0xFF), 0x0FF0);
    }

    #[test]
    fn shade_lookup_uses_two_bits_per_colour() {
        assert_eq!(dmg_shade(0xE4, 0), 0);
        assert_eq!(dmg_shade(0xE4, 3), 3);
        assert_eq!(dmg_shade(0x1B, 0), 3);
    }
}
