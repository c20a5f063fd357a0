//! Per-sample output handed to plotting / rendering
//!
//! One row per trajectory sample:
//! `t, theta, theta_dot, phi, phi_dot, xA, yA, vxA, vyA, axA, ayA, NAx, NAy`

use std::io::{self, Write};

use super::kinematics::EngagementKinematics;
use super::params::Parameters;
use super::reactions::reaction_at_sample;
use super::states::{NVec2, Sample, State};

pub const CSV_HEADER: &str = "t,theta,theta_dot,phi,phi_dot,xA,yA,vxA,vyA,axA,ayA,NAx,NAy";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleReport {
    pub t: f64,
    pub state: State,
    pub kinematics: EngagementKinematics,
    pub reaction: NVec2,
}

impl SampleReport {
    pub fn from_sample(p: &Parameters, sample: &Sample) -> Self {
        Self {
            t: sample.t,
            state: sample.state,
            kinematics: EngagementKinematics::at(p, sample),
            reaction: reaction_at_sample(p, sample),
        }
    }
}

/// Write the header and one line per report
pub fn write_csv<W: Write>(reports: &[SampleReport], mut out: W) -> io::Result<()> {
    writeln!(out, "{CSV_HEADER}")?;
    for r in reports {
        let s = &r.state;
        let k = &r.kinematics;
        writeln!(
            out,
            "{},{},{},{},{},{},{},{},{},{},{},{},{}",
            r.t,
            s.theta,
            s.theta_dot,
            s.phi,
            s.phi_dot,
            k.position.x,
            k.position.y,
            k.velocity.x,
            k.velocity.y,
            k.acceleration.x,
            k.acceleration.y,
            r.reaction.x,
            r.reaction.y
        )?;
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::states::Accelerations;

    #[test]
    fn csv_has_one_row_per_sample() {
        let p = Parameters::reference();
        let reports: Vec<SampleReport> = (0..3)
            .map(|i| {
                let sample = Sample {
                    t: i as f64,
                    state: State::new(0.0, 0.0, 0.1 * i as f64, 1.0),
                    accel: Accelerations::default(),
                };
                SampleReport::from_sample(&p, &sample)
            })
            .collect();

        let mut buf = Vec::new();
        write_csv(&reports, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], CSV_HEADER);
        assert!(lines[1..].iter().all(|l| l.split(',').count() == 13));
        assert!(lines[3].starts_with("2,"));
    }
}
