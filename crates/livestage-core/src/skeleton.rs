//! Skeletal joint hierarchy
//!
//! A skeleton is an explicit tree of joints stored parent-first. Each joint
//! only knows its transform relative to its parent; world transforms are
//! composed top-down on demand.

use glam::{EulerRot, Mat4, Quat, Vec3};

/// Joints of the humanoid rig
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JointId {
    /// Whole-body placement on the floor
    Root,
    /// Hips
    Pelvis,
    /// Lower back
    Spine,
    /// Chest
    Torso,
    /// Neck/head pivot
    Head,
    /// Left shoulder
    LeftArmRoot,
    /// Left elbow
    LeftArmMid,
    /// Right shoulder
    RightArmRoot,
    /// Right elbow
    RightArmMid,
    /// Left hip joint
    LeftLegRoot,
    /// Left knee
    LeftLegMid,
    /// Right hip joint
    RightLegRoot,
    /// Right knee
    RightLegMid,
}

impl JointId {
    /// Every joint in parent-first order
    pub const ALL: [JointId; 13] = [
        JointId::Root,
        JointId::Pelvis,
        JointId::Spine,
        JointId::Torso,
        JointId::Head,
        JointId::LeftArmRoot,
        JointId::LeftArmMid,
        JointId::RightArmRoot,
        JointId::RightArmMid,
        JointId::LeftLegRoot,
        JointId::LeftLegMid,
        JointId::RightLegRoot,
        JointId::RightLegMid,
    ];

    /// Parent joint, `None` for the root
    pub fn parent(self) -> Option<JointId> {
        use JointId::*;
        match self {
            Root => None,
            Pelvis => Some(Root),
            Spine => Some(Pelvis),
            Torso => Some(Spine),
            Head | LeftArmRoot | RightArmRoot => Some(Torso),
            LeftArmMid => Some(LeftArmRoot),
            RightArmMid => Some(RightArmRoot),
            LeftLegRoot | RightLegRoot => Some(Pelvis),
            LeftLegMid => Some(LeftLegRoot),
            RightLegMid => Some(RightLegRoot),
        }
    }

    fn index(self) -> usize {
        self as usize
    }

    /// Rest-pose offset from the parent joint
    fn rest_translation(self) -> Vec3 {
        use JointId::*;
        match self {
            Root | Torso => Vec3::ZERO,
            Pelvis => Vec3::new(0.0, 0.8, 0.0),
            Spine => Vec3::new(0.0, 0.4, 0.0),
            Head => Vec3::new(0.0, 1.0, 0.0),
            LeftArmRoot => Vec3::new(-0.9, 0.7, 0.0),
            RightArmRoot => Vec3::new(0.9, 0.7, 0.0),
            LeftLegRoot => Vec3::new(-0.45, 0.0, 0.0),
            RightLegRoot => Vec3::new(0.45, 0.0, 0.0),
            LeftArmMid | RightArmMid | LeftLegMid | RightLegMid => Vec3::new(0.0, -0.75, 0.0),
        }
    }
}

/// Transform relative to the parent joint
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointTransform {
    /// Offset from the parent
    pub translation: Vec3,
    /// Euler rotation in radians, applied X then Y then Z
    pub rotation: Vec3,
    /// Per-axis scale
    pub scale: Vec3,
}

impl Default for JointTransform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl JointTransform {
    /// Transform at an offset with no rotation
    pub fn at(translation: Vec3) -> Self {
        Self {
            translation,
            ..Default::default()
        }
    }

    /// Local matrix
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

/// Humanoid joint tree with a fixed size
#[derive(Debug, Clone, PartialEq)]
pub struct Skeleton {
    joints: [JointTransform; 13],
}

impl Skeleton {
    /// Skeleton in its rest pose
    pub fn humanoid() -> Self {
        let mut joints = [JointTransform::default(); 13];
        for id in JointId::ALL {
            joints[id.index()] = JointTransform::at(id.rest_translation());
        }
        Self { joints }
    }

    /// Number of joints; fixed for the lifetime of the skeleton
    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    /// Local transform of a joint
    pub fn joint(&self, id: JointId) -> &JointTransform {
        &self.joints[id.index()]
    }

    /// Mutable local transform of a joint
    pub fn joint_mut(&mut self, id: JointId) -> &mut JointTransform {
        &mut self.joints[id.index()]
    }

    /// Rest-pose offset of a joint
    pub fn rest_translation(id: JointId) -> Vec3 {
        id.rest_translation()
    }

    /// World matrices for every joint, in [`JointId::ALL`] order
    pub fn world_transforms(&self) -> Vec<Mat4> {
        let mut world: Vec<Mat4> = Vec::with_capacity(self.joints.len());
        for id in JointId::ALL {
            let local = self.joints[id.index()].matrix();
            let matrix = match id.parent() {
                Some(parent) => world[parent.index()] * local,
                None => local,
            };
            world.push(matrix);
        }
        world
    }

    /// World position of one joint
    pub fn world_position(&self, id: JointId) -> Vec3 {
        self.world_transforms()[id.index()].w_axis.truncate()
    }
}

impl Default for Skeleton {
    fn default() -> Self {
        Self::humanoid()
    }
}
