// Copyright @yucwang 2023

use super::constants::{ INV_PI, PI, Float, Vector2f, Vector3f };

pub fn sample_uniform_disk_concentric(u: &Vector2f) -> Vector2f {
    let r1: Float = 2.0 * u.x - 1.0;
    let r2: Float = 2.0 * u.y - 1.0;

    let phi: Float;
    let r:   Float;

    if r1 == 0. && r2 == 0. {
        r = 0.0;
        phi = 0.0;
    } else if r1 * r1 > r2 * r2 {
        r = r1;
        phi = (PI / 4.0) * (r2 / r1);
    } else {
        r = r2;
        phi = (PI / 2.0) - (r1 / r2) * (PI / 4.0);
    }

    let (sin_phi, cos_phi) = phi.sin_cos();

    Vector2f::new(r * cos_phi, r * sin_phi)
}

pub fn sample_cosine_hemisphere(u: &Vector2f) -> Vector3f {
    let p = sample_uniform_disk_concentric(u);
    let z = (1. - p.x * p.x - p.y * p.y).max(0.0).sqrt();

    Vector3f::new(p.x, p.y, z)
}

pub fn sample_cosine_hemisphere_pdf(cos_theta: Float) -> Float {
    cos_theta.max(0.0) * INV_PI
}

/// Uniform barycentrics `(b0, b1, b2)` over a triangle.
pub fn square_to_triangle(u: &Vector2f) -> Vector3f {
    let su0 = u.x.sqrt();
    let b1 = 1.0 - su0;
    let b2 = u.y * su0;

    Vector3f::new(1.0 - b1 - b2, b1, b2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_hemisphere_is_upper_unit() {
        for i in 0..16 {
            for j in 0..16 {
                let u = Vector2f::new(i as Float / 16.0, j as Float / 16.0);
                let w = sample_cosine_hemisphere(&u);
                assert!(w.z >= 0.0);
                assert!((w.norm() - 1.0).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn test_square_to_triangle_barycentrics() {
        let b = square_to_triangle(&Vector2f::new(0.3, 0.7));
        assert!((b.x + b.y + b.z - 1.0).abs() < 1e-6);
        assert!(b.iter().all(|c| *c >= 0.0));
    }
}
