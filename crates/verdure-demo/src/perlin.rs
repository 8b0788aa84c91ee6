use noise::{Fbm, MultiFractal, NoiseFn, Perlin};
use verdure_terrain::{FbmParams, HeightField, NoiseSource};

/// Perlin fBm height source, normalised to [0, 1].
pub struct PerlinNoise;

impl NoiseSource for PerlinNoise {
    fn generate_noise_map(&self, width: u32, height: u32, params: &FbmParams) -> HeightField {
        let seed = if params.use_random_seed {
            rand::random()
        } else {
            params.seed
        };
        log::debug!("Generating {}x{} Perlin terrain (seed {})", width, height, seed);

        let fbm: Fbm<Perlin> = Fbm::new(seed)
            .set_octaves(params.octaves.max(1) as usize)
            .set_persistence(params.persistence as f64)
            .set_lacunarity(params.lacunarity as f64)
            .set_frequency(1.0);

        let scale = params.scale.max(1e-4) as f64;
        let offset = params.offset();
        // Scale around the centre so zooming does not drift the terrain.
        let half_w = width as f64 * 0.5;
        let half_h = height as f64 * 0.5;

        let raw = HeightField::from_fn(width, height, |x, z| {
            let sx = (x as f64 - half_w + offset.x as f64) / scale;
            let sz = (z as f64 - half_h + offset.y as f64) / scale;
            fbm.get([sx, sz]) as f32
        });

        match raw.range() {
            Some((lo, hi)) if hi > lo => {
                HeightField::from_fn(width, height, |x, z| (raw.get(x, z) - lo) / (hi - lo))
            }
            _ => HeightField::new(width, height),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_is_normalised() {
        let params = FbmParams::new(7).with_scale(20.0);
        let field = PerlinNoise.generate_noise_map(33, 17, &params);
        let (lo, hi) = field.range().unwrap();
        assert!(lo >= 0.0 && hi <= 1.0);
        assert_eq!(lo, 0.0);
        assert!((hi - 1.0).abs() < 1e-6);
    }

    #[test]
    fn fixed_seed_repeats() {
        let params = FbmParams::new(3);
        assert_eq!(
            PerlinNoise.generate_noise_map(16, 16, &params),
            PerlinNoise.generate_noise_map(16, 16, &params)
        );
    }
}
