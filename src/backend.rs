//! Graphics backend boundary.
//!
//! The engine never touches pixels. It queries bitmap sizes and issues
//! clip/clear/blit/transform calls through [`GraphicsBackend`]. The
//! [`RecordingBackend`] implementation keeps those calls in memory, which is
//! what the headless binary and the tests run against.

use glam::Vec2;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Opaque bitmap handle owned by the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bitmap(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgba(0, 0, 0, 255);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Color { r, g, b, a }
    }
}

/// Parameters of a rotated and/or scaled blit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransformBlit {
    pub rotation: f32,
    pub scale: Vec2,
    pub src_xy: Vec2,
    pub dst_xy: Vec2,
    pub antialias: bool,
}

pub trait GraphicsBackend {
    /// Bitmap standing for the output window.
    fn screen(&self) -> Bitmap;
    /// New blank bitmap of `size` pixels.
    fn bitmap_create(&mut self, size: Vec2) -> Bitmap;
    /// `None` when the bitmap is unknown to the backend.
    fn bitmap_size_get(&self, bitmap: Bitmap) -> Option<Vec2>;
    fn clip_set(&mut self, bitmap: Bitmap, position: Vec2, size: Vec2);
    fn clear(&mut self, bitmap: Bitmap, color: Color);
    fn blit(&mut self, src: Bitmap, dst: Bitmap, src_xy: Vec2, dst_xy: Vec2, size: Vec2);
    fn bitmap_transform(&mut self, src: Bitmap, dst: Bitmap, transform: TransformBlit);
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    Clip {
        target: Bitmap,
        position: Vec2,
        size: Vec2,
    },
    Clear {
        target: Bitmap,
        color: Color,
    },
    Blit {
        src: Bitmap,
        dst: Bitmap,
        src_xy: Vec2,
        dst_xy: Vec2,
        size: Vec2,
    },
    Transform {
        src: Bitmap,
        dst: Bitmap,
        transform: TransformBlit,
    },
}

/// Headless backend that records every call.
#[derive(Debug)]
pub struct RecordingBackend {
    screen: Bitmap,
    sizes: FxHashMap<Bitmap, Vec2>,
    next_id: u32,
    pub commands: Vec<DrawCommand>,
}

impl RecordingBackend {
    pub fn new(screen_size: Vec2) -> Self {
        let screen = Bitmap(0);
        let mut sizes = FxHashMap::default();
        sizes.insert(screen, screen_size);
        RecordingBackend {
            screen,
            sizes,
            next_id: 1,
            commands: Vec::new(),
        }
    }

    /// Drain recorded commands.
    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Number of blit and transform calls recorded.
    pub fn draw_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Blit { .. } | DrawCommand::Transform { .. }))
            .count()
    }
}

impl GraphicsBackend for RecordingBackend {
    fn screen(&self) -> Bitmap {
        self.screen
    }

    fn bitmap_create(&mut self, size: Vec2) -> Bitmap {
        let bitmap = Bitmap(self.next_id);
        self.next_id += 1;
        self.sizes.insert(bitmap, size);
        bitmap
    }

    fn bitmap_size_get(&self, bitmap: Bitmap) -> Option<Vec2> {
        self.sizes.get(&bitmap).copied()
    }

    fn clip_set(&mut self, bitmap: Bitmap, position: Vec2, size: Vec2) {
        self.commands.push(DrawCommand::Clip {
            target: bitmap,
            position,
            size,
        });
    }

    fn clear(&mut self, bitmap: Bitmap, color: Color) {
        self.commands.push(DrawCommand::Clear {
            target: bitmap,
            color,
        });
    }

    fn blit(&mut self, src: Bitmap, dst: Bitmap, src_xy: Vec2, dst_xy: Vec2, size: Vec2) {
        self.commands.push(DrawCommand::Blit {
            src,
            dst,
            src_xy,
            dst_xy,
            size,
        });
    }

    fn bitmap_transform(&mut self, src: Bitmap, dst: Bitmap, transform: TransformBlit) {
        self.commands
            .push(DrawCommand::Transform { src, dst, transform });
    }
}
