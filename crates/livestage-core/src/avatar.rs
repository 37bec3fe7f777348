//! Avatars: performers and audience members
//!
//! Both kinds share the same joint tree. The `is_performer` flag picks the
//! animation policy the choreography engine applies and whether the avatar
//! casts a floor reflection.

use glam::{EulerRot, Mat4, Quat, Vec3};
use palette::{FromColor, Hsl, Srgb};
use rand::Rng;

use crate::skeleton::{JointId, Skeleton};

/// Emissive colors of the seven-member ensemble, by slot
pub const PERFORMER_COLORS: [u32; 7] = [
    0xffffff, 0xff00ff, 0x00ffff, 0xffff00, 0x00ff00, 0xff0088, 0x0088ff,
];

/// Uniform scale applied to performer root joints
pub const PERFORMER_SCALE: f32 = 3.0;

/// Opacity of the floor reflection
pub const REFLECTION_OPACITY: f32 = 0.2;

/// Convert a `0xRRGGBB` literal to a color
pub fn color_from_hex(rgb: u32) -> Srgb {
    Srgb::new(
        ((rgb >> 16) & 0xff) as u8,
        ((rgb >> 8) & 0xff) as u8,
        (rgb & 0xff) as u8,
    )
    .into_format()
}

/// Fully saturated color from a hue in `[0, 1)`
pub fn color_from_hue(hue: f32, lightness: f32) -> Srgb {
    Srgb::from_color(Hsl::new(hue * 360.0, 1.0, lightness))
}

/// Floor-mirrored copy of a performer's root transform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reflection {
    /// Root translation with y negated
    pub translation: Vec3,
    /// Root rotation (Euler XYZ), unchanged
    pub rotation: Vec3,
    /// Root scale with y negated
    pub scale: Vec3,
    /// Render opacity
    pub opacity: f32,
}

impl Reflection {
    /// World matrix of the mirrored root
    pub fn matrix(&self) -> Mat4 {
        let rotation = Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        );
        Mat4::from_scale_rotation_translation(self.scale, rotation, self.translation)
    }
}

/// One animated figure
#[derive(Debug, Clone)]
pub struct Avatar {
    skeleton: Skeleton,
    is_performer: bool,
    /// Random phase for desynchronized idle motion, in `[0, 2π)`
    pub phase_offset: f32,
    /// Small constant phase jitter so unison is not pixel-identical
    pub timing_variation: f32,
    /// Position in the canon wave; the ensemble slot for performers
    pub canon_rank: usize,
    /// Breathing phase offset, in `[0, 10)`
    pub vibe_offset: f32,
    /// Body color
    pub color: Srgb,
}

impl Avatar {
    /// Create a performer for an ensemble slot
    pub fn performer<R: Rng + ?Sized>(slot: usize, rng: &mut R) -> Self {
        let color = color_from_hex(PERFORMER_COLORS[slot % PERFORMER_COLORS.len()]);
        let mut avatar = Self::with_random_offsets(true, slot, color, rng);
        avatar.skeleton.joint_mut(JointId::Root).scale = Vec3::splat(PERFORMER_SCALE);
        avatar
    }

    /// Create an audience member standing at `position`
    pub fn audience<R: Rng + ?Sized>(position: Vec3, rng: &mut R) -> Self {
        let color = color_from_hue(rng.random::<f32>(), 0.5);
        let mut avatar = Self::with_random_offsets(false, 0, color, rng);
        avatar.set_position(position);
        avatar
    }

    fn with_random_offsets<R: Rng + ?Sized>(
        is_performer: bool,
        canon_rank: usize,
        color: Srgb,
        rng: &mut R,
    ) -> Self {
        Self {
            skeleton: Skeleton::humanoid(),
            is_performer,
            phase_offset: rng.random::<f32>() * std::f32::consts::TAU,
            timing_variation: (rng.random::<f32>() - 0.5) * 0.05,
            canon_rank,
            vibe_offset: rng.random::<f32>() * 10.0,
            color,
        }
    }

    /// Whether the performer policy applies
    pub fn is_performer(&self) -> bool {
        self.is_performer
    }

    /// Joint tree
    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    /// Mutable joint tree
    pub fn skeleton_mut(&mut self) -> &mut Skeleton {
        &mut self.skeleton
    }

    /// Root position in world space
    pub fn position(&self) -> Vec3 {
        self.skeleton.joint(JointId::Root).translation
    }

    /// Move the root
    pub fn set_position(&mut self, position: Vec3) {
        self.skeleton.joint_mut(JointId::Root).translation = position;
    }

    /// Floor reflection; `None` for audience members
    pub fn reflection(&self) -> Option<Reflection> {
        if !self.is_performer {
            return None;
        }
        let root = self.skeleton.joint(JointId::Root);
        Some(Reflection {
            translation: root.translation * Vec3::new(1.0, -1.0, 1.0),
            rotation: root.rotation,
            scale: root.scale * Vec3::new(1.0, -1.0, 1.0),
            opacity: REFLECTION_OPACITY,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_performer_setup() {
        let mut rng = StdRng::seed_from_u64(7);
        let avatar = Avatar::performer(2, &mut rng);
        assert!(avatar.is_performer());
        assert_eq!(avatar.canon_rank, 2);
        assert_eq!(avatar.skeleton().joint(JointId::Root).scale, Vec3::splat(3.0));
        assert!(avatar.timing_variation.abs() <= 0.025);
        assert!((0.0..10.0).contains(&avatar.vibe_offset));
        assert_eq!(avatar.color, color_from_hex(0x00ffff));
    }

    #[test]
    fn test_audience_has_no_reflection() {
        let mut rng = StdRng::seed_from_u64(7);
        let avatar = Avatar::audience(Vec3::new(10.0, 0.0, 80.0), &mut rng);
        assert!(!avatar.is_performer());
        assert_eq!(avatar.position(), Vec3::new(10.0, 0.0, 80.0));
        assert!(avatar.reflection().is_none());
    }

    #[test]
    fn test_reflection_mirrors_root() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut avatar = Avatar::performer(0, &mut rng);
        avatar.set_position(Vec3::new(4.0, 11.5, -2.0));

        let reflection = avatar.reflection().unwrap();
        assert_eq!(reflection.translation, Vec3::new(4.0, -11.5, -2.0));
        assert_eq!(reflection.scale, Vec3::new(3.0, -3.0, 3.0));
        assert_eq!(reflection.opacity, REFLECTION_OPACITY);

        // Points above the root land below the floor
        let head = reflection.matrix().transform_point3(Vec3::new(0.0, 1.0, 0.0));
        assert!((head.y - (-14.5)).abs() < 1e-4);
    }

    #[test]
    fn test_hex_colors() {
        let white = color_from_hex(0xffffff);
        assert_eq!(white, Srgb::new(1.0, 1.0, 1.0));
        let magenta = color_from_hex(0xff00ff);
        assert_eq!(magenta.green, 0.0);
    }
}
