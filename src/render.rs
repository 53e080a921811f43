//! Rasterizes particles into an RGBA pixel buffer, one pixel per particle.

use crate::pool::ParticlePool;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Pixel {
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

/// Opaque black, what the field looks like with nothing in it.
pub const BACKGROUND: Pixel = Pixel::opaque(0, 0, 0);

pub struct PixelBuffer {
    pub w: u32,
    pub h: u32,
    pub px: Vec<Pixel>,
}

impl PixelBuffer {
    pub fn new(w: u32, h: u32) -> Self {
        Self {
            w,
            h,
            px: vec![BACKGROUND; (w as usize) * (h as usize)],
        }
    }

    #[inline]
    pub fn idx(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }

    pub fn clear(&mut self, p: Pixel) {
        self.px.fill(p);
    }

    pub fn get(&self, x: u32, y: u32) -> Option<Pixel> {
        (x < self.w && y < self.h).then(|| self.px[self.idx(x, y)])
    }

    /// Out-of-buffer writes are dropped.
    pub fn set(&mut self, x: i64, y: i64, p: Pixel) {
        if x < 0 || y < 0 || x >= self.w as i64 || y >= self.h as i64 {
            return;
        }
        let i = self.idx(x as u32, y as u32);
        self.px[i] = p;
    }

    /// Flat `[r, g, b, a, ...]` bytes, row-major.
    pub fn to_rgba_bytes(&self) -> Vec<u8> {
        self.px.iter().flat_map(|p| [p.r, p.g, p.b, p.a]).collect()
    }
}

/// Clear to background and draw every active particle. Reads the pool only.
pub fn rasterize(pool: &ParticlePool, buf: &mut PixelBuffer) {
    buf.clear(BACKGROUND);
    for (_, p) in pool.iter() {
        if !(p.x.is_finite() && p.y.is_finite()) {
            continue;
        }
        let c = p.color();
        let a = (p.life.clamp(0.0, 1.0) * 255.0).floor() as u8;
        buf.set(
            p.x.floor() as i64,
            p.y.floor() as i64,
            Pixel {
                r: c.r,
                g: c.g,
                b: c.b,
                a,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Material;

    fn put(pool: &mut ParticlePool, m: Material, x: f32, y: f32, life: f32) {
        let s = pool.acquire().unwrap();
        let p = pool.get_mut(s).unwrap();
        p.material = m;
        p.x = x;
        p.y = y;
        p.life = life;
    }

    #[test]
    fn empty_field_is_background() {
        let pool = ParticlePool::new(4);
        let mut buf = PixelBuffer::new(4, 3);
        buf.clear(Pixel::opaque(9, 9, 9));
        rasterize(&pool, &mut buf);
        assert!(buf.px.iter().all(|&p| p == BACKGROUND));
    }

    #[test]
    fn particle_lands_on_floored_pixel_with_life_alpha() {
        let mut pool = ParticlePool::new(4);
        put(&mut pool, Material::Water, 2.7, 1.2, 1.0);
        put(&mut pool, Material::Fire, 0.5, 0.5, 0.5);
        let mut buf = PixelBuffer::new(4, 3);
        rasterize(&pool, &mut buf);
        let c = Material::Water.color();
        assert_eq!(buf.get(2, 1), Some(Pixel::opaque(c.r, c.g, c.b)));
        assert_eq!(buf.get(0, 0).unwrap().a, 127);
    }

    #[test]
    fn out_of_bounds_particles_are_skipped() {
        let mut pool = ParticlePool::new(4);
        put(&mut pool, Material::Sand, -1.0, 0.0, 1.0);
        put(&mut pool, Material::Sand, 4.0, 0.0, 1.0);
        put(&mut pool, Material::Sand, 0.0, 3.5, 1.0);
        let mut buf = PixelBuffer::new(4, 3);
        rasterize(&pool, &mut buf);
        assert!(buf.px.iter().all(|&p| p == BACKGROUND));
    }

    #[test]
    fn rgba_bytes_are_row_major() {
        let mut buf = PixelBuffer::new(2, 1);
        buf.set(1, 0, Pixel::opaque(1, 2, 3));
        assert_eq!(buf.to_rgba_bytes(), vec![0, 0, 0, 255, 1, 2, 3, 255]);
    }
}
