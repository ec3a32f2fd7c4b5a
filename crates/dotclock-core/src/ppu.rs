use crate::interrupts::Interrupt;

/// Width and height of the background canvas held in the pixel buffer.
pub const CANVAS_SIZE: usize = 256;
/// Visible sub-window presented by a host.
pub const SCREEN_WIDTH: usize = 160;
pub const SCREEN_HEIGHT: usize = 144;

// Scanline timing in dots
const LINE_DOTS: u32 = 456;
const MODE2_DOTS: u32 = 80; // OAM scan
const MODE3_DOTS: u32 = 172; // Pixel transfer

// Lines 144..=153 are vertical blank
const VBLANK_START: u8 = SCREEN_HEIGHT as u8;
const LAST_LINE: u8 = 153;

// Sprite limits
const MAX_SPRITES_PER_LINE: usize = 10;
const TOTAL_SPRITES: usize = 40;
const SPRITE_HEIGHT: i16 = 8;

pub const VRAM_SIZE: usize = 0x2000;
pub const OAM_SIZE: usize = TOTAL_SPRITES * 4;

// VRAM layout, as offsets from 0x8000
const BG_MAP_0_BASE: usize = 0x1800;
const BG_MAP_1_BASE: usize = 0x1C00;
const TILE_DATA_UNSIGNED_BASE: usize = 0x0000;
const TILE_DATA_SIGNED_LOW_BASE: usize = 0x1000; // indices 0-127
const TILE_DATA_SIGNED_HIGH_BASE: usize = 0x0800; // indices 128-255

// LCDC bits
const LCDC_BG_MAP: u8 = 0x08;
const LCDC_TILE_DATA: u8 = 0x10;

// LCD modes reported in STAT bits 0-1
const MODE_HBLANK: u8 = 0;
const MODE_VBLANK: u8 = 1;
const MODE_OAM: u8 = 2;
const MODE_TRANSFER: u8 = 3;

/// Display shades in 0xAARRGGBB order, lightest first.
pub const SHADES: [u32; 4] = [0xFFFFFFFF, 0xFFAAAAAA, 0xFF555555, 0xFF000000];

/// One sprite attribute table entry (gbdev.io/pandocs/OAM.html).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Sprite {
    pub y: u8,
    pub x: u8,
    pub tile: u8,
    /// Selects OBP1 instead of OBP0.
    pub palette: bool,
    pub x_flip: bool,
    pub y_flip: bool,
    /// Background-over-object flag. Latched but not used by the renderer.
    pub priority: bool,
    /// Attribute bits 0-3 (CGB-only fields), kept so reads echo writes.
    low_bits: u8,
}

impl Sprite {
    fn flags(&self) -> u8 {
        (self.priority as u8) << 7
            | (self.y_flip as u8) << 6
            | (self.x_flip as u8) << 5
            | (self.palette as u8) << 4
            | self.low_bits
    }

    fn set_flags(&mut self, val: u8) {
        self.priority = val & 0x80 != 0;
        self.y_flip = val & 0x40 != 0;
        self.x_flip = val & 0x20 != 0;
        self.palette = val & 0x10 != 0;
        self.low_bits = val & 0x0F;
    }

    fn read_field(&self, field: usize) -> u8 {
        match field {
            0 => self.y,
            1 => self.x,
            2 => self.tile,
            _ => self.flags(),
        }
    }

    fn write_field(&mut self, field: usize, val: u8) {
        match field {
            0 => self.y = val,
            1 => self.x = val,
            2 => self.tile = val,
            _ => self.set_flags(val),
        }
    }

    /// Top line covered by this sprite (may be negative).
    fn top(&self) -> i16 {
        self.y as i16 - 16
    }

    /// Leftmost column covered by this sprite (may be negative).
    fn left(&self) -> i16 {
        self.x as i16 - 8
    }
}

pub struct Ppu {
    pub vram: [u8; VRAM_SIZE],
    pub oam: [Sprite; TOTAL_SPRITES],

    lcdc: u8,
    stat: u8,
    scy: u8,
    scx: u8,
    ly: u8,
    lyc: u8,
    pub dma: u8,
    bgp: u8,
    obp0: u8,
    obp1: u8,
    wy: u8,
    wx: u8,

    /// Dots elapsed in the current line.
    dots: u32,

    framebuffer: Vec<u32>,
    /// Indices into `oam` of the sprites selected for the line being drawn.
    line_sprites: [usize; MAX_SPRITES_PER_LINE],
    sprite_count: usize,
    /// Indicates a completed frame is available in `framebuffer`
    frame_ready: bool,
    stat_irq_line: bool,
    frame_counter: u64,
    lines_rendered: u64,
}

impl Ppu {
    pub fn new() -> Self {
        Self {
            vram: [0; VRAM_SIZE],
            oam: [Sprite::default(); TOTAL_SPRITES],
            lcdc: 0,
            stat: 0,
            scy: 0,
            scx: 0,
            ly: 0,
            lyc: 0,
            dma: 0,
            bgp: 0,
            obp0: 0,
            obp1: 0,
            wy: 0,
            wx: 0,
            dots: 0,
            framebuffer: vec![SHADES[0]; CANVAS_SIZE * CANVAS_SIZE],
            line_sprites: [0; MAX_SPRITES_PER_LINE],
            sprite_count: 0,
            frame_ready: false,
            stat_irq_line: false,
            frame_counter: 0,
            lines_rendered: 0,
        }
    }

    /// Initialize registers to the state the boot ROM leaves behind.
    pub fn apply_boot_state(&mut self) {
        self.lcdc = 0x91;
        self.bgp = 0xFC;
        self.dma = 0xFF;
    }

    pub fn ly(&self) -> u8 {
        self.ly
    }

    /// Dots elapsed in the current line.
    pub fn dots(&self) -> u32 {
        self.dots
    }

    /// Current LCD mode as reported in STAT bits 0-1.
    pub fn mode(&self) -> u8 {
        if self.ly >= VBLANK_START {
            MODE_VBLANK
        } else if self.dots < MODE2_DOTS {
            MODE_OAM
        } else if self.dots < MODE2_DOTS + MODE3_DOTS {
            MODE_TRANSFER
        } else {
            MODE_HBLANK
        }
    }

    /// Returns true if the pipeline has reached vertical blank since the
    /// flag was last cleared.
    pub fn frame_ready(&self) -> bool {
        self.frame_ready
    }

    /// Clears the frame ready flag after a frame has been consumed.
    pub fn clear_frame_flag(&mut self) {
        self.frame_ready = false;
    }

    /// Returns the number of frames that have been completed since power on.
    pub fn frames(&self) -> u64 {
        self.frame_counter
    }

    pub fn lines_rendered(&self) -> u64 {
        self.lines_rendered
    }

    /// The full 256x256 canvas, row-major. Row `n` holds the last rendering
    /// of line `n` with scrolling already applied, so the presented screen
    /// is the top-left 160x144 corner.
    pub fn framebuffer(&self) -> &[u32] {
        &self.framebuffer
    }

    pub fn oam_read(&self, offset: usize) -> u8 {
        self.oam[offset / 4].read_field(offset % 4)
    }

    pub fn oam_write(&mut self, offset: usize, val: u8) {
        self.oam[offset / 4].write_field(offset % 4, val);
    }

    pub fn read_reg(&self, addr: u16) -> u8 {
        match addr {
            0xFF40 => self.lcdc,
            0xFF41 => {
                (self.stat & 0x78) | 0x80 | self.mode() | if self.ly == self.lyc { 0x04 } else { 0 }
            }
            0xFF42 => self.scy,
            0xFF43 => self.scx,
            0xFF44 => self.ly,
            0xFF45 => self.lyc,
            0xFF46 => self.dma,
            0xFF47 => self.bgp,
            0xFF48 => self.obp0,
            0xFF49 => self.obp1,
            0xFF4A => self.wy,
            0xFF4B => self.wx,
            _ => 0xFF,
        }
    }

    pub fn write_reg(&mut self, addr: u16, val: u8) {
        match addr {
            0xFF40 => self.lcdc = val,
            0xFF41 => self.stat = val & 0x78,
            0xFF42 => self.scy = val,
            0xFF43 => self.scx = val,
            // LY is read-only
            0xFF44 => {}
            0xFF45 => self.lyc = val,
            0xFF46 => self.dma = val,
            0xFF47 => self.bgp = val,
            0xFF48 => self.obp0 = val,
            0xFF49 => self.obp1 = val,
            0xFF4A => self.wy = val,
            0xFF4B => self.wx = val,
            _ => {}
        }
    }

    #[inline(always)]
    fn shade(palette: u8, color_id: u8) -> u32 {
        SHADES[((palette >> (color_id * 2)) & 0x03) as usize]
    }

    /// 2-bit color of pixel (`px`, `py`) in the tile whose data starts at
    /// VRAM offset `addr`.
    #[inline(always)]
    fn tile_pixel(&self, addr: usize, px: u8, py: u8) -> u8 {
        let lo = self.vram[addr + py as usize * 2];
        let hi = self.vram[addr + py as usize * 2 + 1];
        let bit = 7 - px;
        ((hi >> bit) & 1) << 1 | ((lo >> bit) & 1)
    }

    fn bg_tile_addr(&self, tile_index: u8) -> usize {
        if self.lcdc & LCDC_TILE_DATA != 0 {
            TILE_DATA_UNSIGNED_BASE + tile_index as usize * 16
        } else if tile_index < 0x80 {
            TILE_DATA_SIGNED_LOW_BASE + tile_index as usize * 16
        } else {
            TILE_DATA_SIGNED_HIGH_BASE + (tile_index - 0x80) as usize * 16
        }
    }

    /// Collect up to 10 sprites covering the current line, in table order.
    fn oam_scan(&mut self) {
        let line = self.ly as i16;
        self.sprite_count = 0;
        for (i, sprite) in self.oam.iter().enumerate() {
            if self.sprite_count >= MAX_SPRITES_PER_LINE {
                break;
            }
            let top = sprite.top();
            if line >= top && line < top + SPRITE_HEIGHT {
                self.line_sprites[self.sprite_count] = i;
                self.sprite_count += 1;
            }
        }
    }

    fn render_scanline(&mut self) {
        let line = self.ly;
        let row = line as usize * CANVAS_SIZE;

        // background
        let map_base = if self.lcdc & LCDC_BG_MAP != 0 {
            BG_MAP_1_BASE
        } else {
            BG_MAP_0_BASE
        };
        let sy = line.wrapping_add(self.scy);
        let tile_row = (sy / 8) as usize;
        for x in 0..CANVAS_SIZE {
            let sx = (x as u8).wrapping_add(self.scx);
            let tile_index = self.vram[map_base + tile_row * 32 + (sx / 8) as usize];
            let color_id = self.tile_pixel(self.bg_tile_addr(tile_index), sx % 8, sy % 8);
            self.framebuffer[row + x] = Self::shade(self.bgp, color_id);
        }

        // sprites
        self.oam_scan();
        let line = line as i16;
        for x in 0..CANVAS_SIZE as i16 {
            // Lowest table index with an opaque pixel in this column wins.
            for &i in &self.line_sprites[..self.sprite_count] {
                let s = self.oam[i];
                let left = s.left();
                if x < left || x >= left + 8 {
                    continue;
                }
                let mut tx = (x - left) as u8;
                let mut ty = (line - s.top()) as u8;
                if s.x_flip {
                    tx = 7 - tx;
                }
                if s.y_flip {
                    ty = 7 - ty;
                }
                let addr = TILE_DATA_UNSIGNED_BASE + s.tile as usize * 16;
                let color_id = self.tile_pixel(addr, tx, ty);
                if color_id == 0 {
                    continue;
                }
                let palette = if s.palette { self.obp1 } else { self.obp0 };
                self.framebuffer[row + x as usize] = Self::shade(palette, color_id);
                break;
            }
        }

        self.lines_rendered += 1;
    }

    /// Advance the pipeline by `cycles` dots. Every completed line period
    /// renders the current line and moves LY on; reaching line 144 requests
    /// the VBlank interrupt.
    pub fn step(&mut self, cycles: u16, if_reg: &mut u8) {
        self.dots += cycles as u32;
        while self.dots >= LINE_DOTS {
            self.dots -= LINE_DOTS;
            self.render_scanline();
            self.ly += 1;
            if self.ly == VBLANK_START {
                self.frame_ready = true;
                self.frame_counter = self.frame_counter.wrapping_add(1);
                *if_reg |= Interrupt::VBlank.bit();
            }
            if self.ly > LAST_LINE {
                self.ly = 0;
            }
        }
        self.update_stat_irq(if_reg);
    }

    fn update_stat_irq(&mut self, if_reg: &mut u8) {
        let coincidence = self.ly == self.lyc && self.stat & 0x40 != 0;
        let mode_signal = match self.mode() {
            MODE_HBLANK => self.stat & 0x08 != 0,
            MODE_VBLANK => self.stat & 0x10 != 0,
            MODE_OAM => self.stat & 0x20 != 0,
            _ => false,
        };
        let current = coincidence || mode_signal;
        if current && !self.stat_irq_line {
            *if_reg |= Interrupt::LcdStat.bit();
        }
        self.stat_irq_line = current;
    }
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new()
    }
}
