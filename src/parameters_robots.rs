//! Hardcoded DH parameters for a few robots

pub mod dh_kinematics {
    use crate::parameters::dh_kinematics::{DhLink, Parameters};
    use std::f64::consts::{FRAC_PI_2, PI};

    /// Fixed link 0 that does not move the first joint away from the world origin.
    const WORLD_ORIGIN: DhLink = DhLink::new(0.0, 0.0, 0.0, 0.0);

    #[allow(dead_code)]
    impl Parameters {
        /// Two revolute joints about z, both links 1 m long. Moves in the XY plane and is
        /// handy for checking the solvers by hand.
        pub fn planar_two_link() -> Self {
            Parameters {
                links: vec![
                    WORLD_ORIGIN,
                    DhLink::new(0.0, 1.0, 0.0, 0.0),
                    DhLink::new(0.0, 1.0, 0.0, 0.0),
                ],
                base: None,
            }
        }

        /// Planar chain of revolute joints about z, one per given link length.
        pub fn planar(lengths: &[f64]) -> Self {
            let mut links = vec![WORLD_ORIGIN];
            links.extend(lengths.iter().map(|&a| DhLink::new(0.0, a, 0.0, 0.0)));
            Parameters { links, base: None }
        }

        // Universal Robots UR5, standard DH table as published by the manufacturer.
        pub fn ur5() -> Self {
            let limit = 2.0 * PI;
            Parameters {
                links: vec![
                    WORLD_ORIGIN,
                    DhLink::new(FRAC_PI_2, 0.0, 0.089159, 0.0).with_limits(-limit, limit),
                    DhLink::new(0.0, -0.425, 0.0, 0.0).with_limits(-limit, limit),
                    DhLink::new(0.0, -0.39225, 0.0, 0.0).with_limits(-limit, limit),
                    DhLink::new(FRAC_PI_2, 0.0, 0.10915, 0.0).with_limits(-limit, limit),
                    DhLink::new(-FRAC_PI_2, 0.0, 0.09465, 0.0).with_limits(-limit, limit),
                    DhLink::new(0.0, 0.0, 0.0823, 0.0).with_limits(-limit, limit),
                ],
                base: None,
            }
        }

        // Unimation PUMA 560 standing on its 0.6718 m pedestal (link 0).
        pub fn puma560() -> Self {
            Parameters {
                links: vec![
                    DhLink::new(0.0, 0.0, 0.6718, 0.0),
                    DhLink::new(FRAC_PI_2, 0.0, 0.0, 0.0)
                        .with_limits((-160.0f64).to_radians(), 160.0f64.to_radians()),
                    DhLink::new(0.0, 0.4318, 0.0, 0.0)
                        .with_limits((-225.0f64).to_radians(), 45.0f64.to_radians()),
                    DhLink::new(-FRAC_PI_2, 0.0203, 0.15005, 0.0)
                        .with_limits((-45.0f64).to_radians(), 225.0f64.to_radians()),
                    DhLink::new(FRAC_PI_2, 0.0, 0.4318, 0.0)
                        .with_limits((-110.0f64).to_radians(), 170.0f64.to_radians()),
                    DhLink::new(-FRAC_PI_2, 0.0, 0.0, 0.0)
                        .with_limits((-100.0f64).to_radians(), 100.0f64.to_radians()),
                    DhLink::new(0.0, 0.0, 0.0, 0.0)
                        .with_limits((-266.0f64).to_radians(), 266.0f64.to_radians()),
                ],
                base: None,
            }
        }

        /// Looks up a preset by name, as used on the command line.
        pub fn preset(name: &str) -> Option<Self> {
            match name {
                "planar_two_link" | "planar" => Some(Self::planar_two_link()),
                "ur5" => Some(Self::ur5()),
                "puma560" | "puma" => Some(Self::puma560()),
                _ => None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::parameters::dh_kinematics::Parameters;

    #[test]
    fn test_presets_are_valid() {
        for name in ["planar", "ur5", "puma560"] {
            let parameters = Parameters::preset(name).expect("known preset");
            parameters.validate().expect("preset must validate");
        }
        assert_eq!(Parameters::ur5().dof(), 6);
        assert_eq!(Parameters::puma560().dof(), 6);
        assert_eq!(Parameters::planar(&[1.0, 0.5, 0.25]).dof(), 3);
        assert!(Parameters::preset("r2d2").is_none());
    }
}
