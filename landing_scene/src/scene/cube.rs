// scene/cube.rs - Single cube primitive: body, screen-space outline, optional face labels

use ab_glyph::{point, Font, FontRef, PxScale, ScaleFont};
use glam::{EulerRot, Quat, Vec2, Vec3};
use image::{Rgba, RgbaImage};
use log::warn;
use rand::Rng;
use std::f32::consts::{FRAC_PI_2, PI};
use std::sync::Arc;

use crate::animation::{AnimationError, Color, Result};

/// Upper bound on each rotation-speed component, radians per frame
pub const MAX_ROTATION_SPEED: f32 = 0.002;

/// Label textures are square
pub const LABEL_TEXTURE_SIZE: u32 = 256;
const LABEL_BORDER_WIDTH: u32 = 8;

/// Sans-serif face for label text
const LABEL_FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");

/// Label planes draw after the body, the outline after everything
pub const LABEL_RENDER_ORDER: i32 = 500;
pub const OUTLINE_RENDER_ORDER: i32 = 999;

/// Corner indices of each of the 12 box edges
const BOX_EDGES: [(usize, usize); 12] = [
    (0, 1), (1, 2), (2, 3), (3, 0),
    (4, 5), (5, 6), (6, 7), (7, 4),
    (0, 4), (1, 5), (2, 6), (3, 7),
];

// ============================================================================
// PARTS
// ============================================================================

/// What a cube child is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartRole {
    Body,
    Outline,
    Label,
}

#[derive(Debug, Clone)]
pub struct Body {
    pub size: f32,
    pub color: Color,
    /// Push faces back in depth so the outline never z-fights them
    pub polygon_offset: bool,
}

/// Screen-space-width line segments; width is in pixels, so the line shader
/// needs the current viewport resolution every frame
#[derive(Debug, Clone)]
pub struct Outline {
    pub segments: Vec<[Vec3; 2]>,
    pub color: Color,
    pub width: f32,
    pub resolution: Vec2,
    pub depth_test: bool,
    pub render_order: i32,
}

#[derive(Debug, Clone)]
pub struct LabelPlane {
    pub offset: Vec3,
    pub rotation: Quat,
    pub size: f32,
    pub texture: Arc<LabelTexture>,
    pub render_order: i32,
}

#[derive(Debug, Clone)]
pub enum CubePart {
    Body(Body),
    Outline(Outline),
    Label(LabelPlane),
}

impl CubePart {
    pub fn role(&self) -> PartRole {
        match self {
            CubePart::Body(_) => PartRole::Body,
            CubePart::Outline(_) => PartRole::Outline,
            CubePart::Label(_) => PartRole::Label,
        }
    }
}

/// Bordered square texture shared by the six label planes of one cube,
/// with the text drawn in black, centered on both axes.
#[derive(Debug, Clone)]
pub struct LabelTexture {
    pub text: String,
    pub font_size: f32,
    pub image: RgbaImage,
}

impl LabelTexture {
    pub fn rasterize(text: &str, font_size: f32, background: Color) -> Self {
        let size = LABEL_TEXTURE_SIZE;
        let mut image = RgbaImage::from_pixel(size, size, Rgba(background.to_rgba8()));
        let border = Rgba(Color::BLACK.to_rgba8());

        for y in 0..size {
            for x in 0..size {
                let edge_dist = x.min(y).min(size - 1 - x).min(size - 1 - y);
                if edge_dist < LABEL_BORDER_WIDTH {
                    image.put_pixel(x, y, border);
                }
            }
        }

        if !text.is_empty() && font_size > 0.0 {
            match FontRef::try_from_slice(LABEL_FONT) {
                Ok(font) => draw_text(&mut image, &font, text, font_size, Color::BLACK),
                Err(e) => warn!("Label font unusable, '{text}' drawn without glyphs: {e}"),
            }
        }

        Self {
            text: text.to_string(),
            font_size,
            image,
        }
    }
}

/// Lays `text` out on one line around the image center and blends each
/// glyph's coverage over what is already there
fn draw_text(image: &mut RgbaImage, font: &FontRef<'_>, text: &str, font_size: f32, ink: Color) {
    let scaled = font.as_scaled(PxScale::from(font_size));

    let mut caret = 0.0;
    let mut previous = None;
    let mut glyphs = Vec::with_capacity(text.len());
    for c in text.chars() {
        let id = scaled.glyph_id(c);
        if let Some(prev) = previous {
            caret += scaled.kern(prev, id);
        }
        glyphs.push((id, caret));
        caret += scaled.h_advance(id);
        previous = Some(id);
    }

    let (width, height) = image.dimensions();
    let left = (width as f32 - caret) / 2.0;
    // Baseline that puts the middle of ascent..descent on the center row
    let baseline = height as f32 / 2.0 + (scaled.ascent() + scaled.descent()) / 2.0;
    let ink = ink.to_rgba8();

    for (id, x) in glyphs {
        let glyph = id.with_scale_and_position(scaled.scale(), point(left + x, baseline));
        let Some(outlined) = font.outline_glyph(glyph) else {
            continue;
        };
        let bounds = outlined.px_bounds();
        outlined.draw(|gx, gy, coverage| {
            let px = bounds.min.x as i64 + gx as i64;
            let py = bounds.min.y as i64 + gy as i64;
            if coverage <= 0.0 || px < 0 || py < 0 || px >= width as i64 || py >= height as i64 {
                return;
            }
            let pixel = image.get_pixel_mut(px as u32, py as u32);
            let a = coverage.min(1.0);
            for (channel, target) in pixel.0.iter_mut().zip(ink).take(3) {
                *channel = (*channel as f32 * (1.0 - a) + target as f32 * a).round() as u8;
            }
        });
    }
}

// ============================================================================
// CUBE RECORD
// ============================================================================

/// One animated cube. Placement metadata is fixed at build time; the
/// transform fields are mutated by the animator every frame.
#[derive(Debug, Clone)]
pub struct CubeRecord {
    fill: Color,
    rest_position: Vec3,
    explode_direction: Vec3,
    rotation_speed: Vec2,
    is_center: bool,
    page_id: Option<String>,
    parts: Vec<CubePart>,

    /// Lazily assigned while the scene is idle
    pub idle_velocity: Option<Vec3>,
    pub position: Vec3,
    pub scale: Vec3,
    pub orientation: Quat,
}

impl CubeRecord {
    pub fn fill(&self) -> Color {
        self.fill
    }

    pub fn rest_position(&self) -> Vec3 {
        self.rest_position
    }

    pub fn explode_direction(&self) -> Vec3 {
        self.explode_direction
    }

    pub fn rotation_speed(&self) -> Vec2 {
        self.rotation_speed
    }

    pub fn is_center(&self) -> bool {
        self.is_center
    }

    pub fn page_id(&self) -> Option<&str> {
        self.page_id.as_deref()
    }

    pub fn parts(&self) -> &[CubePart] {
        &self.parts
    }

    pub fn parts_with_role(&self, role: PartRole) -> impl Iterator<Item = &CubePart> {
        self.parts.iter().filter(move |p| p.role() == role)
    }

    pub fn outline(&self) -> Option<&Outline> {
        self.parts.iter().find_map(|p| match p {
            CubePart::Outline(o) => Some(o),
            _ => None,
        })
    }

    /// Edge length of the solid body
    pub fn size(&self) -> f32 {
        self.parts
            .iter()
            .find_map(|p| match p {
                CubePart::Body(b) => Some(b.size),
                _ => None,
            })
            .unwrap_or(0.0)
    }

    /// Bind a content page; only center cubes navigate
    pub fn bind_page(&mut self, page_id: impl Into<String>) -> Result<()> {
        if !self.is_center {
            return Err(AnimationError::InvalidParameters(
                "pages can only be bound to center cubes".to_string(),
            ));
        }
        self.page_id = Some(page_id.into());
        Ok(())
    }

    pub fn set_outline_resolution(&mut self, resolution: Vec2) {
        for part in &mut self.parts {
            if let CubePart::Outline(outline) = part {
                outline.resolution = resolution;
            }
        }
    }

    /// Apply one frame of spin around the local X and Y axes
    pub fn spin(&mut self, dx: f32, dy: f32) {
        self.orientation = (self.orientation * Quat::from_euler(EulerRot::XYZ, dx, dy, 0.0)).normalize();
    }
}

// ============================================================================
// BUILDER
// ============================================================================

/// Builds cubes; colors and label are set once, placement per cube
#[derive(Debug, Clone)]
pub struct CubeBuilder {
    size: f32,
    fill: Color,
    edge_color: Color,
    edge_width: f32,
    label: Option<(String, f32)>,
    rest_position: Vec3,
    is_center: bool,
}

impl CubeBuilder {
    pub fn new(size: f32) -> Self {
        Self {
            size,
            fill: Color::BLACK,
            edge_color: Color::BLACK,
            edge_width: 2.0,
            label: None,
            rest_position: Vec3::ZERO,
            is_center: false,
        }
    }

    pub fn fill(mut self, color: Color) -> Self {
        self.fill = color;
        self
    }

    pub fn edge(mut self, color: Color, width: f32) -> Self {
        self.edge_color = color;
        self.edge_width = width;
        self
    }

    pub fn label(mut self, text: impl Into<String>, font_size: f32) -> Self {
        self.label = Some((text.into(), font_size));
        self
    }

    /// Rest position relative to the lattice center
    pub fn at(mut self, rest_position: Vec3) -> Self {
        self.rest_position = rest_position;
        self
    }

    pub fn center(mut self, is_center: bool) -> Self {
        self.is_center = is_center;
        self
    }

    pub fn build<R: Rng + ?Sized>(&self, rng: &mut R) -> CubeRecord {
        let half = self.size / 2.0;
        let mut parts = vec![CubePart::Body(Body {
            size: self.size,
            color: self.fill,
            polygon_offset: true,
        })];

        if let Some((text, font_size)) = &self.label {
            let texture = Arc::new(LabelTexture::rasterize(text, *font_size, self.fill));
            parts.extend(label_planes(half).into_iter().map(|(offset, rotation)| {
                CubePart::Label(LabelPlane {
                    offset,
                    rotation,
                    size: self.size,
                    texture: texture.clone(),
                    render_order: LABEL_RENDER_ORDER,
                })
            }));
        }

        parts.push(CubePart::Outline(Outline {
            segments: box_edges(half),
            color: self.edge_color,
            width: self.edge_width,
            resolution: Vec2::ONE,
            depth_test: false,
            render_order: OUTLINE_RENDER_ORDER,
        }));

        let rotation_speed = Vec2::new(
            rng.gen_range(-MAX_ROTATION_SPEED..=MAX_ROTATION_SPEED),
            rng.gen_range(-MAX_ROTATION_SPEED..=MAX_ROTATION_SPEED),
        );

        CubeRecord {
            fill: self.fill,
            rest_position: self.rest_position,
            explode_direction: self.rest_position.normalize_or_zero(),
            rotation_speed,
            is_center: self.is_center,
            page_id: None,
            parts,
            idle_velocity: None,
            position: self.rest_position,
            scale: Vec3::ONE,
            orientation: Quat::IDENTITY,
        }
    }
}

/// The 12 edges of an axis-aligned box as segment endpoint pairs
fn box_edges(half: f32) -> Vec<[Vec3; 2]> {
    let corners = [
        Vec3::new(-half, -half, -half),
        Vec3::new(half, -half, -half),
        Vec3::new(half, half, -half),
        Vec3::new(-half, half, -half),
        Vec3::new(-half, -half, half),
        Vec3::new(half, -half, half),
        Vec3::new(half, half, half),
        Vec3::new(-half, half, half),
    ];
    BOX_EDGES
        .iter()
        .map(|&(a, b)| [corners[a], corners[b]])
        .collect()
}

/// Offset and facing of the six label planes (+X, -X, +Y, -Y, +Z, -Z)
fn label_planes(half: f32) -> [(Vec3, Quat); 6] {
    [
        (Vec3::new(half, 0.0, 0.0), Quat::from_rotation_y(FRAC_PI_2)),
        (Vec3::new(-half, 0.0, 0.0), Quat::from_rotation_y(-FRAC_PI_2)),
        (Vec3::new(0.0, half, 0.0), Quat::from_rotation_x(-FRAC_PI_2)),
        (Vec3::new(0.0, -half, 0.0), Quat::from_rotation_x(FRAC_PI_2)),
        (Vec3::new(0.0, 0.0, half), Quat::IDENTITY),
        (Vec3::new(0.0, 0.0, -half), Quat::from_rotation_y(PI)),
    ]
}
