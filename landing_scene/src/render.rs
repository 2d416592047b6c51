// render.rs - Headless wireframe snapshot of the scene, encoded as PNG

use glam::{Affine3A, Mat4, Vec2, Vec3};
use image::{ImageFormat, Rgba, RgbaImage};
use log::debug;
use std::io::Cursor;

use crate::animation::Color;
use crate::config::Palette;
use crate::error_handling::Result;
use crate::scene::SceneBundle;

/// Draws every cube outline with depth testing off, the way the outline
/// layer renders on top of the solid bodies.
#[derive(Debug, Clone)]
pub struct WireframeRenderer {
    background: Color,
    center: Color,
}

impl WireframeRenderer {
    pub fn new(palette: &Palette) -> Self {
        Self {
            background: palette.background,
            center: palette.center,
        }
    }

    /// Rasterize the current frame at the scene's viewport size
    pub fn render(&self, scene: &SceneBundle) -> RgbaImage {
        let width = scene.viewport.width.max(1);
        let height = scene.viewport.height.max(1);
        let mut image = RgbaImage::from_pixel(width, height, Rgba(self.background.to_rgba8()));

        let view_projection = scene.camera.view_projection();
        let near = scene.camera.near;
        let mut drawn = 0usize;

        for (_, matrix) in scene.grid.iter() {
            let matrix_transform = scene.grid.matrix_transform(matrix);
            for cube in matrix.cubes() {
                let Some(outline) = cube.outline() else {
                    continue;
                };
                let model = matrix_transform
                    * Affine3A::from_scale_rotation_translation(cube.scale, cube.orientation, cube.position);
                let color = if cube.is_center() {
                    Rgba(self.center.to_rgba8())
                } else {
                    Rgba(outline.color.to_rgba8())
                };
                let brush = ((outline.width - 1.0) / 2.0).round().max(0.0) as i32;

                for [a, b] in &outline.segments {
                    let pa = project(&view_projection, &model, *a, near, &image);
                    let pb = project(&view_projection, &model, *b, near, &image);
                    if let (Some(pa), Some(pb)) = (pa, pb) {
                        draw_line(&mut image, pa, pb, color, brush);
                        drawn += 1;
                    }
                }
            }
        }

        debug!("Rasterized {} outline segments at {}x{}", drawn, width, height);
        image
    }

    /// Encode a frame as PNG in memory
    pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
        let mut png = Vec::new();
        image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
        Ok(png)
    }
}

/// Local point to pixel coordinates; `None` when behind the near plane
fn project(
    view_projection: &Mat4,
    model: &Affine3A,
    local: Vec3,
    near: f32,
    image: &RgbaImage,
) -> Option<Vec2> {
    let world = model.transform_point3(local);
    let clip = *view_projection * world.extend(1.0);
    if clip.w <= near {
        return None;
    }
    let ndc = Vec2::new(clip.x / clip.w, clip.y / clip.w);
    Some(Vec2::new(
        (ndc.x + 1.0) / 2.0 * image.width() as f32,
        (1.0 - ndc.y) / 2.0 * image.height() as f32,
    ))
}

/// Bresenham line with a square brush, clipped to the image
fn draw_line(image: &mut RgbaImage, from: Vec2, to: Vec2, color: Rgba<u8>, brush: i32) {
    // Segments far outside the frame only cost time
    let limit = 4.0 * image.width().max(image.height()) as f32;
    if from.abs().max_element() > limit || to.abs().max_element() > limit {
        return;
    }

    let (mut x0, mut y0) = (from.x.round() as i32, from.y.round() as i32);
    let (x1, y1) = (to.x.round() as i32, to.y.round() as i32);
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        stamp(image, x0, y0, color, brush);
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

fn stamp(image: &mut RgbaImage, x: i32, y: i32, color: Rgba<u8>, brush: i32) {
    for by in -brush..=brush {
        for bx in -brush..=brush {
            let (px, py) = (x + bx, y + by);
            if px >= 0 && py >= 0 && (px as u32) < image.width() && (py as u32) < image.height() {
                image.put_pixel(px as u32, py as u32, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SceneConfig;
    use crate::scene::Viewport;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn scene(width: u32, height: u32) -> (SceneConfig, SceneBundle) {
        let config = SceneConfig::default();
        let bundle =
            SceneBundle::assemble(&config, Viewport::new(width, height), &mut StdRng::seed_from_u64(2))
                .unwrap();
        (config, bundle)
    }

    #[test]
    fn test_render_matches_viewport_and_draws_edges() {
        let (config, bundle) = scene(320, 200);
        let image = WireframeRenderer::new(&config.palette).render(&bundle);
        assert_eq!(image.dimensions(), (320, 200));

        let background = Rgba(config.palette.background.to_rgba8());
        let outline = Rgba(config.palette.outline.to_rgba8());
        let center = Rgba(config.palette.center.to_rgba8());
        assert!(image.pixels().any(|p| *p == outline));
        assert!(image.pixels().any(|p| *p == center));
        assert!(image.pixels().any(|p| *p == background));
    }

    #[test]
    fn test_scene_behind_camera_draws_nothing() {
        let (config, mut bundle) = scene(64, 64);
        bundle.camera.position.z = -500.0;
        let image = WireframeRenderer::new(&config.palette).render(&bundle);
        let background = Rgba(config.palette.background.to_rgba8());
        assert!(image.pixels().all(|p| *p == background));
    }

    #[test]
    fn test_line_is_clipped_to_image() {
        let mut image = RgbaImage::new(10, 10);
        let red = Rgba([255, 0, 0, 255]);
        draw_line(&mut image, Vec2::new(-5.0, 5.0), Vec2::new(15.0, 5.0), red, 0);
        assert!((0..10).all(|x| *image.get_pixel(x, 5) == red));
        assert_eq!(*image.get_pixel(0, 4), Rgba([0, 0, 0, 0]));

        draw_line(&mut image, Vec2::new(2.0, 0.0), Vec2::new(2.0, 9.0), red, 1);
        assert_eq!(*image.get_pixel(3, 0), red);
    }

    #[test]
    fn test_png_encoding_has_signature() {
        let image = RgbaImage::new(4, 4);
        let png = WireframeRenderer::encode_png(&image).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }
}
