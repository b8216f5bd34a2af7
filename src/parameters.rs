//! Defines the Denavit-Hartenberg chain data structure

pub mod dh_kinematics {
    use crate::kinematic_traits::Pose;
    use crate::parameter_error::ParameterError;
    use crate::utils::deg;

    /// One link of the chain in the standard Denavit-Hartenberg convention.
    /// The transform of the link is `Rz(theta + angle_offset) * Tz(offset) * Tx(length) * Rx(twist)`.
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct DhLink {
        /// Link twist (alpha), rotation about the new x axis, radians.
        pub twist: f64,

        /// Link length (a), translation along the new x axis.
        pub length: f64,

        /// Link offset (d), translation along the previous z axis.
        pub offset: f64,

        /// Constant added to the joint angle (theta offset), radians.
        pub angle_offset: f64,

        /// Lower joint limit, radians. Both limits at zero mean the joint is unbounded.
        pub lower: f64,

        /// Upper joint limit, radians.
        pub upper: f64,
    }

    impl DhLink {
        /// Unbounded link with the given twist, length, offset and angle offset.
        pub const fn new(twist: f64, length: f64, offset: f64, angle_offset: f64) -> Self {
            DhLink { twist, length, offset, angle_offset, lower: 0.0, upper: 0.0 }
        }

        pub const fn with_limits(self, lower: f64, upper: f64) -> Self {
            DhLink { lower, upper, ..self }
        }

        /// The (0, 0) limit pair is the "unbounded" sentinel.
        pub fn is_bounded(&self) -> bool {
            !(self.lower == 0.0 && self.upper == 0.0)
        }

        /// Clamps the joint angle into the limits, unless the joint is unbounded.
        pub fn clamp(&self, angle: f64) -> f64 {
            if self.is_bounded() {
                angle.clamp(self.lower, self.upper)
            } else {
                angle
            }
        }
    }

    /// Kinematic chain of N revolute joints, described by N + 1 links.
    /// Link 0 is the fixed transform from the world (or base) to the first joint and has no
    /// joint variable; links 1..=N each belong to one revolute joint.
    #[derive(Debug, Clone, PartialEq)]
    pub struct Parameters {
        pub links: Vec<DhLink>,

        /// Optional placement of the chain in the world, applied before link 0.
        pub base: Option<Pose>,
    }

    impl Parameters {
        /// Builds and validates the chain.
        pub fn new(links: Vec<DhLink>, base: Option<Pose>) -> Result<Self, ParameterError> {
            let parameters = Parameters { links, base };
            parameters.validate()?;
            Ok(parameters)
        }

        /// Builds the chain from the flat configuration table: N + 1 tuples of
        /// (twist, length, offset, angle offset) and N + 1 (lower, upper) limit pairs.
        pub fn from_table(dh: &[[f64; 4]], limits: &[(f64, f64)], base: Option<Pose>)
                          -> Result<Self, ParameterError> {
            if limits.len() != dh.len() {
                return Err(ParameterError::InvalidLength { expected: dh.len(), found: limits.len() });
            }
            let links = dh.iter().zip(limits)
                .map(|(&[twist, length, offset, angle_offset], &(lower, upper))| {
                    DhLink::new(twist, length, offset, angle_offset).with_limits(lower, upper)
                })
                .collect();
            Parameters::new(links, base)
        }

        /// Number of revolute joints (N).
        pub fn dof(&self) -> usize {
            self.links.len().saturating_sub(1)
        }

        /// Clamps every joint angle into its limits. `joints` must have length N.
        pub fn clamp(&self, joints: &mut [f64]) {
            for (angle, link) in joints.iter_mut().zip(&self.links[1..]) {
                *angle = link.clamp(*angle);
            }
        }

        pub fn validate(&self) -> Result<(), ParameterError> {
            if self.links.len() < 2 {
                return Err(ParameterError::KinematicsConfigurationError(format!(
                    "chain needs the fixed base link and at least one joint, got {} links",
                    self.links.len()
                )));
            }
            for (i, link) in self.links.iter().enumerate() {
                let values = [link.twist, link.length, link.offset, link.angle_offset, link.lower, link.upper];
                if values.iter().any(|v| !v.is_finite()) {
                    return Err(ParameterError::KinematicsConfigurationError(format!(
                        "link {} has non-finite parameters: {:?}", i, link
                    )));
                }
                if link.is_bounded() && link.lower > link.upper {
                    return Err(ParameterError::InvalidLimits { link: i, lower: link.lower, upper: link.upper });
                }
            }
            Ok(())
        }

        /// Convert to string yaml representation (quick viewing, etc).
        /// The output can be read back with `Parameters::from_yaml_str`.
        pub fn to_yaml(&self) -> String {
            let mut yaml = String::from("dh_kinematics_links:\n");
            for link in &self.links {
                yaml.push_str(&format!(
                    "  - [{}, {}, {}, {}]\n",
                    deg(&link.twist), link.length, link.offset, deg(&link.angle_offset)
                ));
            }
            yaml.push_str("dh_kinematics_limits:\n");
            for link in &self.links {
                yaml.push_str(&format!("  - [{}, {}]\n", deg(&link.lower), deg(&link.upper)));
            }
            if let Some(base) = &self.base {
                let t = base.translation.vector;
                let (roll, pitch, yaw) = base.rotation.euler_angles();
                yaml.push_str(&format!(
                    "dh_kinematics_base:\n  translation: [{}, {}, {}]\n  rotation: [{}, {}, {}]\n",
                    t.x, t.y, t.z, deg(&roll), deg(&pitch), deg(&yaw)
                ));
            }
            yaml
        }
    }
}

#[cfg(test)]
mod tests {
    use super::dh_kinematics::*;
    use crate::parameter_error::ParameterError;

    #[test]
    fn test_unbounded_sentinel() {
        let link = DhLink::new(0.0, 1.0, 0.0, 0.0);
        assert!(!link.is_bounded());
        assert_eq!(link.clamp(12.5), 12.5);

        let bounded = link.with_limits(-1.0, 1.0);
        assert_eq!(bounded.clamp(12.5), 1.0);
        assert_eq!(bounded.clamp(-3.0), -1.0);

        // Only one bound at zero still counts as bounded
        let half = link.with_limits(0.0, 0.5);
        assert_eq!(half.clamp(-0.2), 0.0);
    }

    #[test]
    fn test_from_table() {
        let chain = Parameters::from_table(
            &[[0.0; 4], [0.0, 1.0, 0.0, 0.0], [0.0, 1.0, 0.0, 0.0]],
            &[(0.0, 0.0), (-1.0, 1.0), (0.0, 0.0)],
            None,
        ).expect("valid table");
        assert_eq!(chain.dof(), 2);
        let mut joints = [2.0, 2.0];
        chain.clamp(&mut joints);
        assert_eq!(joints, [1.0, 2.0]);
    }

    #[test]
    fn test_table_length_mismatch() {
        let result = Parameters::from_table(&[[0.0; 4], [0.0; 4]], &[(0.0, 0.0)], None);
        assert!(matches!(result, Err(ParameterError::InvalidLength { expected: 2, found: 1 })));
    }

    #[test]
    fn test_rejects_inverted_limits() {
        let result = Parameters::new(
            vec![DhLink::new(0.0, 0.0, 0.0, 0.0), DhLink::new(0.0, 1.0, 0.0, 0.0).with_limits(1.0, -1.0)],
            None,
        );
        assert!(matches!(result, Err(ParameterError::InvalidLimits { link: 1, .. })));
    }

    #[test]
    fn test_rejects_chain_without_joints() {
        let result = Parameters::new(vec![DhLink::new(0.0, 0.0, 0.0, 0.0)], None);
        assert!(matches!(result, Err(ParameterError::KinematicsConfigurationError(_))));
    }
}
