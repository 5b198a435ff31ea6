use {
    crate::enumerate::ElementCount,
    nanoserde::{DeBin, DeJson, SerBin, SerJson},
    std::{fmt, time::Duration},
};

#[derive(SerBin, DeBin, SerJson, DeJson, Clone, Copy, PartialEq, Eq, Debug)]
pub struct SizeCounts {
    pub size: u64,
    pub fixed: u64,
    pub free_rotation: u64,
    pub free_reflection: u64,
}

/// Final per-size counts of one enumeration run.
#[derive(SerBin, DeBin, SerJson, DeJson, Clone, PartialEq, Eq, Debug)]
pub struct Results {
    pub dimension: u8,
    pub counts: Vec<SizeCounts>,
}

impl Results {
    pub fn from_counts(dimension: u8, counts: &ElementCount) -> Self {
        Self {
            dimension,
            counts: (1..=counts.max_size())
                .map(|size| (size, counts.get(size)))
                .map(|(size, t)| SizeCounts {
                    size: size as u64,
                    fixed: t.fixed,
                    free_rotation: t.rotation,
                    free_reflection: t.reflection,
                })
                .collect(),
        }
    }

    pub fn total_fixed(&self) -> u64 {
        self.counts.iter().map(|c| c.fixed).sum()
    }

    pub fn total_free(&self) -> u64 {
        self.counts.iter().map(|c| c.free_rotation).sum()
    }

    /// (fixed shapes / s, free shapes / s)
    pub fn average_rate(&self, time: Duration) -> (f64, f64) {
        let secs = time.as_secs_f64();
        if secs == 0.0 {
            return (0.0, 0.0);
        }
        (
            self.total_fixed() as f64 / secs,
            self.total_free() as f64 / secs,
        )
    }
}

impl fmt::Display for Results {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (fixed, rotation, reflection) = if self.dimension == 2 {
            ("fixed", "one-sided", "free")
        } else {
            ("fixed", "free", "free w/ reflection")
        };

        writeln!(f, "{:>4} {:>20} {:>20} {:>20}", "n", fixed, rotation, reflection)?;
        for c in &self.counts {
            writeln!(
                f,
                "{:>4} {:>20} {:>20} {:>20}",
                c.size, c.fixed, c.free_rotation, c.free_reflection
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use {super::*, crate::canonical::Verdict};

    fn sample() -> Results {
        let mut counts = ElementCount::new(3);
        counts.record(0, Verdict::Reflection);
        counts.record(1, Verdict::Reflection);
        counts.record(1, Verdict::NotCanonical);
        counts.record(2, Verdict::Rotation);
        Results::from_counts(3, &counts)
    }

    #[test]
    fn test_from_counts() {
        let results = sample();

        assert_eq!(results.counts.len(), 3);
        assert_eq!(
            results.counts[1],
            SizeCounts {
                size: 2,
                fixed: 2,
                free_rotation: 1,
                free_reflection: 1
            }
        );
        assert_eq!(results.total_fixed(), 4);
        assert_eq!(results.total_free(), 3);
    }

    #[test]
    fn test_serialization() {
        let results = sample();

        let bin = results.serialize_bin();
        assert_eq!(Results::deserialize_bin(&bin).unwrap(), results);

        let json = results.serialize_json();
        assert_eq!(Results::deserialize_json(&json).unwrap(), results);
    }

    #[test]
    fn test_display() {
        let table = sample().to_string();
        let lines: Vec<_> = table.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("free w/ reflection"));
        assert!(lines[3].trim_start().starts_with('3'));
    }

    #[test]
    fn test_average_rate() {
        let results = sample();
        assert_eq!(results.average_rate(Duration::from_secs(2)), (2.0, 1.5));
        assert_eq!(results.average_rate(Duration::ZERO), (0.0, 0.0));
    }
}
