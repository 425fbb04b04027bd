//! Normal vector encodings.
//!
//! Encoders map a unit normal to stored components in -1..1; those are
//! biased into bytes with `c * 0.5 + 0.5`. The compressed encodings only
//! store X and Y.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use glam::DVec3;
use texpack_spec::NormalEncoding;

use crate::error::TextureError;

const EPSILON: f64 = 1e-12;

fn unsupported(encoding: NormalEncoding) -> TextureError {
    TextureError::UnsupportedEncoding(format!("{:?} normal encoding", encoding).to_lowercase())
}

/// Unit XY direction and its length; zero direction for vertical normals.
fn direction(n: DVec3) -> (f64, f64, f64) {
    let len = n.x.hypot(n.y);
    if len < EPSILON {
        (0.0, 0.0, 0.0)
    } else {
        (n.x / len, n.y / len, len)
    }
}

/// Whether only X and Y carry information.
pub fn is_compressed(encoding: NormalEncoding) -> bool {
    matches!(
        encoding,
        NormalEncoding::CompressedProject | NormalEncoding::CompressedAngle | NormalEncoding::UniformAngle
    )
}

pub fn encode_normal(n: DVec3, encoding: NormalEncoding) -> Result<DVec3, TextureError> {
    let n = n.normalize_or_zero();
    match encoding {
        NormalEncoding::Standard => Ok(n),
        NormalEncoding::CompressedProject => {
            let m = n.x.abs().max(n.y.abs());
            if m < EPSILON {
                return Ok(DVec3::ZERO);
            }
            let len = n.x.hypot(n.y);
            Ok(DVec3::new(n.x * len / m, n.y * len / m, 0.0))
        }
        NormalEncoding::CompressedAngle => {
            let (dx, dy, _) = direction(n);
            let a = n.z.clamp(0.0, 1.0).acos() / FRAC_PI_2;
            Ok(DVec3::new(dx * a, dy * a, 0.0))
        }
        NormalEncoding::UniformAngle => {
            let (dx, dy, _) = direction(n);
            let a = n.z.clamp(0.0, 1.0).acos() / FRAC_PI_2;
            let w = a.atan() / FRAC_PI_4;
            Ok(DVec3::new(dx * w, dy * w, 0.0))
        }
        NormalEncoding::Octahedron => Err(unsupported(encoding)),
    }
}

pub fn decode_normal(stored: DVec3, encoding: NormalEncoding) -> Result<DVec3, TextureError> {
    match encoding {
        NormalEncoding::Standard => Ok(stored.normalize_or_zero()),
        NormalEncoding::CompressedProject => {
            let m = stored.x.abs().max(stored.y.abs()).min(1.0);
            let (dx, dy, len) = direction(stored);
            if len < EPSILON {
                return Ok(DVec3::Z);
            }
            let z = (1.0 - m * m).max(0.0).sqrt();
            Ok(DVec3::new(dx * m, dy * m, z))
        }
        NormalEncoding::CompressedAngle | NormalEncoding::UniformAngle => {
            let (dx, dy, len) = direction(stored);
            let a = if encoding == NormalEncoding::UniformAngle {
                (len.min(1.0) * FRAC_PI_4).tan()
            } else {
                len.min(1.0)
            };
            let theta = a * FRAC_PI_2;
            Ok(DVec3::new(dx * theta.sin(), dy * theta.sin(), theta.cos()))
        }
        NormalEncoding::Octahedron => Err(unsupported(encoding)),
    }
}

/// Stored components to bytes.
pub fn pack(stored: DVec3) -> [u8; 3] {
    let b = |c: f64| ((c * 0.5 + 0.5) * 255.0).round().clamp(0.0, 255.0) as u8;
    [b(stored.x), b(stored.y), b(stored.z)]
}

/// Bytes to stored components.
pub fn unpack(bytes: [u8; 3]) -> DVec3 {
    let c = |b: u8| f64::from(b) / 255.0 * 2.0 - 1.0;
    DVec3::new(c(bytes[0]), c(bytes[1]), c(bytes[2]))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUPPORTED: [NormalEncoding; 4] = [
        NormalEncoding::Standard,
        NormalEncoding::CompressedProject,
        NormalEncoding::CompressedAngle,
        NormalEncoding::UniformAngle,
    ];

    fn samples() -> Vec<DVec3> {
        vec![
            DVec3::Z,
            DVec3::new(0.6, 0.0, 0.8),
            DVec3::new(0.5, 0.5, 0.5f64.sqrt()),
            DVec3::new(-0.2, 0.4, 0.8).normalize(),
            DVec3::new(0.0, -0.9, 0.1).normalize(),
        ]
    }

    #[test]
    fn every_supported_encoding_round_trips() {
        for encoding in SUPPORTED {
            for n in samples() {
                let back = decode_normal(encode_normal(n, encoding).unwrap(), encoding).unwrap();
                assert!((back - n).length() < 1e-9, "{:?}: {:?} -> {:?}", encoding, n, back);
            }
        }
    }

    #[test]
    fn project_stretches_onto_the_square() {
        let stored = encode_normal(DVec3::new(0.5, 0.5, 0.5f64.sqrt()), NormalEncoding::CompressedProject)
            .unwrap();
        assert!((stored.x - 0.5f64.sqrt()).abs() < 1e-12);
        assert!((stored.y - 0.5f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn flat_normal_packs_to_the_middle() {
        assert_eq!(pack(DVec3::Z), [128, 128, 255]);
        for encoding in &SUPPORTED[1..] {
            assert!(is_compressed(*encoding));
            let stored = encode_normal(DVec3::Z, *encoding).unwrap();
            assert_eq!(pack(stored), [128, 128, 128]);
        }
    }

    #[test]
    fn uniform_angle_warps_mid_angles_up() {
        let n = DVec3::new(0.5f64.sqrt(), 0.0, 0.5f64.sqrt());
        let angle = encode_normal(n, NormalEncoding::CompressedAngle).unwrap();
        let uniform = encode_normal(n, NormalEncoding::UniformAngle).unwrap();
        assert!((angle.x - 0.5).abs() < 1e-12);
        assert!(uniform.x > angle.x);
    }

    #[test]
    fn octahedron_is_unsupported() {
        assert!(matches!(
            encode_normal(DVec3::Z, NormalEncoding::Octahedron),
            Err(TextureError::UnsupportedEncoding(_))
        ));
        assert!(decode_normal(DVec3::Z, NormalEncoding::Octahedron).is_err());
    }

    #[test]
    fn unpack_inverts_pack_within_a_byte() {
        let v = DVec3::new(-0.3, 0.7, 0.2);
        let back = unpack(pack(v));
        assert!((back - v).length() < 2.0 / 255.0);
    }
}
